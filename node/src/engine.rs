//! The guardian engine: async driver around the round manager.
//!
//! The engine owns the registry and the round manager behind tokio locks,
//! runs one window timer per open round, keeps the gateway off the async
//! threads with `spawn_blocking`, and anchors agreed results on chain.
//!
//! Lock order is `rounds` → `timers` → `anchors`. The registry lock is never
//! held together with any of them.

use crate::{NodeConfig, NodeError, NodeMetrics, ShutdownController};
use guardian_committee::CommitteeSelection;
use guardian_consensus::{ConsensusError, ConsensusResult, EventListener, FailureReason, RoundManager};
use guardian_registry::{fetch_snapshot, OracleGateway, OracleRegistry, OracleUpdate, RegistrySnapshot};
use guardian_types::{Clock, DataHash, OracleAddress, RoundId, Seed, Signature};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex, RwLock};
use tokio::task::JoinHandle;

/// Cheap to clone; all clones drive the same engine.
#[derive(Clone)]
pub struct GuardianEngine {
    inner: Arc<Inner>,
}

struct Inner {
    config: NodeConfig,
    gateway: Arc<dyn OracleGateway>,
    clock: Arc<dyn Clock>,
    registry: RwLock<OracleRegistry>,
    rounds: Mutex<RoundManager>,
    /// Window timer per open round.
    timers: Mutex<HashMap<RoundId, JoinHandle<()>>>,
    /// In-flight anchoring tasks.
    anchors: Mutex<Vec<JoinHandle<()>>>,
    open_rounds: watch::Sender<usize>,
    metrics: Arc<NodeMetrics>,
    shutdown: ShutdownController,
}

impl GuardianEngine {
    /// Build an engine with an empty registry. Call
    /// [`refresh_registry`](Self::refresh_registry) before starting rounds.
    pub fn new(
        config: NodeConfig,
        gateway: Arc<dyn OracleGateway>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, NodeError> {
        config.validate()?;
        let metrics = Arc::new(NodeMetrics::new()?);

        let mut manager =
            RoundManager::new(config.params.clone())?.with_max_open_rounds(config.max_open_rounds);
        let recorder = Arc::clone(&metrics);
        manager.subscribe(Box::new(move |event| recorder.record_event(event)));

        let (open_rounds, _) = watch::channel(0);
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                gateway,
                clock,
                registry: RwLock::new(OracleRegistry::new()),
                rounds: Mutex::new(manager),
                timers: Mutex::new(HashMap::new()),
                anchors: Mutex::new(Vec::new()),
                open_rounds,
                metrics,
                shutdown: ShutdownController::new(),
            }),
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.inner.config
    }

    pub fn metrics(&self) -> &NodeMetrics {
        &self.inner.metrics
    }

    /// Register a consensus event listener. Listeners run under the round
    /// lock and must not call back into the engine.
    pub async fn subscribe(&self, listener: EventListener) {
        self.inner.rounds.lock().await.subscribe(listener);
    }

    /// Fires once [`shutdown`](Self::shutdown) begins.
    pub fn shutdown_signal(&self) -> broadcast::Receiver<()> {
        self.inner.shutdown.subscribe()
    }

    // ── Registry ─────────────────────────────────────────────────────────

    /// Reload the pool from the gateway. On failure the previous snapshot
    /// stays in place. Returns the number of eligible oracles.
    pub async fn refresh_registry(&self) -> Result<usize, NodeError> {
        let version = self.inner.registry.read().await.next_version();
        let gateway = Arc::clone(&self.inner.gateway);
        let now = self.inner.clock.now();
        let fetched =
            tokio::task::spawn_blocking(move || fetch_snapshot(gateway.as_ref(), version, now)).await?;

        match fetched {
            Ok(snapshot) => {
                let oracles = self.inner.registry.write().await.install(snapshot);
                self.inner.metrics.registry_oracles.set(oracles as i64);
                Ok(oracles)
            }
            Err(e) => {
                self.inner.metrics.refresh_failures.inc();
                let kept = self.inner.registry.read().await.snapshot();
                tracing::warn!(
                    error = %e,
                    kept_version = kept.version(),
                    kept_oracles = kept.len(),
                    "registry refresh failed, keeping last snapshot"
                );
                Err(e.into())
            }
        }
    }

    /// [`refresh_registry`](Self::refresh_registry) with exponential backoff
    /// on retryable failures.
    pub async fn refresh_registry_with_retry(&self) -> Result<usize, NodeError> {
        let retries = self.inner.config.refresh_retries;
        let mut backoff = self.inner.config.refresh_backoff();
        let mut attempt = 0;
        loop {
            match self.refresh_registry().await {
                Ok(oracles) => return Ok(oracles),
                Err(NodeError::Registry(e)) if e.is_retryable() && attempt < retries => {
                    attempt += 1;
                    tracing::debug!(
                        attempt,
                        retries,
                        backoff_ms = backoff.as_millis() as u64,
                        "retrying registry refresh"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Apply a single gateway-reported change. Rounds already open keep the
    /// snapshot they started with.
    pub async fn apply_update(&self, update: OracleUpdate) -> Result<(), NodeError> {
        let now = self.inner.clock.now();
        let mut registry = self.inner.registry.write().await;
        registry.apply_update(update, now)?;
        self.inner.metrics.registry_oracles.set(registry.len() as i64);
        Ok(())
    }

    pub async fn registry_snapshot(&self) -> Arc<RegistrySnapshot> {
        self.inner.registry.read().await.snapshot()
    }

    // ── Rounds ───────────────────────────────────────────────────────────

    /// Open a round seeded with the gateway's latest block hash.
    pub async fn start_round(&self) -> Result<RoundId, NodeError> {
        if !self.inner.rounds.lock().await.is_accepting() {
            return Err(ConsensusError::ShuttingDown.into());
        }
        let gateway = Arc::clone(&self.inner.gateway);
        let seed = tokio::task::spawn_blocking(move || gateway.latest_block_hash()).await??;
        self.start_round_with_seed(seed).await
    }

    /// Open a round over the current snapshot and arm its window timer.
    pub async fn start_round_with_seed(&self, external_seed: Seed) -> Result<RoundId, NodeError> {
        let snapshot = self.inner.registry.read().await.snapshot();
        let now = self.inner.clock.now();

        let mut rounds = self.inner.rounds.lock().await;
        let round_id = rounds.start_round(snapshot, external_seed, now)?;

        // The timer needs the round lock to act, so it cannot run before
        // its handle is stored below.
        let window = std::time::Duration::from_secs(rounds.params().round.submission_window_secs);
        let engine = self.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            engine.on_window_closed(round_id).await;
        });
        self.inner.timers.lock().await.insert(round_id, timer);
        self.publish_open(&rounds);
        Ok(round_id)
    }

    /// Route a signed submission. Returns the result if it finalized the round.
    pub async fn submit(
        &self,
        round_id: RoundId,
        oracle: OracleAddress,
        data_hash: DataHash,
        signature: Signature,
    ) -> Result<Option<ConsensusResult>, NodeError> {
        let now = self.inner.clock.now();
        let mut rounds = self.inner.rounds.lock().await;
        let finalized = match rounds.submit(round_id, oracle, data_hash, signature, now) {
            Ok(finalized) => finalized,
            Err(e) => {
                self.inner.metrics.submissions_rejected.inc();
                if matches!(e, ConsensusError::RoundAlreadyFinalized(_)) {
                    self.close_late_round(&rounds, round_id).await;
                }
                return Err(e.into());
            }
        };

        if let Some(result) = &finalized {
            if let Some(timer) = self.inner.timers.lock().await.remove(&round_id) {
                timer.abort();
            }
            self.observe_finalized(result);
            self.publish_open(&rounds);
        }
        drop(rounds);

        if let Some(result) = &finalized {
            self.anchor(result).await;
        }
        Ok(finalized)
    }

    /// A submission past the deadline finalizes its round before the window
    /// timer fires; retire the timer in its place.
    async fn close_late_round(&self, rounds: &RoundManager, round_id: RoundId) {
        let Some(timer) = self.inner.timers.lock().await.remove(&round_id) else {
            return;
        };
        timer.abort();
        if let Some(result) = rounds.result(round_id) {
            self.observe_finalized(result);
        }
        self.publish_open(rounds);
    }

    async fn on_window_closed(&self, round_id: RoundId) {
        let now = self.inner.clock.now();
        let mut rounds = self.inner.rounds.lock().await;
        // Dropping our own handle detaches it; the task is already finishing.
        self.inner.timers.lock().await.remove(&round_id);

        match rounds.finalize_round(round_id, FailureReason::WindowExpired, now) {
            Ok(Some(result)) => {
                self.observe_finalized(&result);
                self.publish_open(&rounds);
                drop(rounds);
                self.anchor(&result).await;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(round_id = %round_id, error = %e, "window closed on a round that is gone");
            }
        }
    }

    /// Post an agreed hash to the gateway in the background. Failures are
    /// logged and counted; the local result stands either way.
    async fn anchor(&self, result: &ConsensusResult) {
        let (Some(data_hash), Some(weight)) = (result.consensus_hash, result.consensus_weight)
        else {
            return;
        };
        let round_id = result.round_id;
        let gateway = Arc::clone(&self.inner.gateway);
        let metrics = Arc::clone(&self.inner.metrics);

        let task = tokio::spawn(async move {
            let outcome = tokio::task::spawn_blocking(move || {
                gateway.submit_consensus_result(round_id, data_hash, weight)
            })
            .await;
            match outcome {
                Ok(Ok(())) => {
                    tracing::info!(round_id = %round_id, data_hash = %data_hash, "consensus result anchored");
                }
                Ok(Err(e)) => {
                    metrics.anchor_failures.inc();
                    tracing::warn!(round_id = %round_id, error = %e, "gateway rejected consensus result");
                }
                Err(e) => {
                    metrics.anchor_failures.inc();
                    tracing::warn!(round_id = %round_id, error = %e, "anchoring task failed");
                }
            }
        });

        let mut anchors = self.inner.anchors.lock().await;
        anchors.retain(|task| !task.is_finished());
        anchors.push(task);
    }

    fn observe_finalized(&self, result: &ConsensusResult) {
        self.inner
            .metrics
            .round_participation
            .observe(result.submissions.len() as f64);
    }

    fn publish_open(&self, rounds: &RoundManager) {
        let open = rounds.open_round_count();
        self.inner.open_rounds.send_replace(open);
        self.inner.metrics.open_rounds.set(open as i64);
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub async fn open_rounds(&self) -> Vec<RoundId> {
        self.inner.rounds.lock().await.open_rounds()
    }

    pub async fn result(&self, round_id: RoundId) -> Option<ConsensusResult> {
        self.inner.rounds.lock().await.result(round_id).cloned()
    }

    pub async fn selection(&self, round_id: RoundId) -> Option<CommitteeSelection> {
        self.inner.rounds.lock().await.selection(round_id).cloned()
    }

    /// Check a selection against the current snapshot.
    pub async fn verify_selection(&self, selection: &CommitteeSelection) -> bool {
        let snapshot = self.registry_snapshot().await;
        self.inner
            .rounds
            .lock()
            .await
            .verify_selection(selection, &snapshot)
    }

    /// Window timers still armed.
    pub async fn pending_timers(&self) -> usize {
        self.inner.timers.lock().await.len()
    }

    // ── Housekeeping ─────────────────────────────────────────────────────

    /// Drop finalized rounds and selections past the retention period.
    pub async fn cleanup(&self) -> usize {
        let cutoff = self
            .inner
            .clock
            .now()
            .saturating_sub_secs(self.inner.config.params.round.retention_secs);
        let removed = self.inner.rounds.lock().await.cleanup(cutoff);
        if removed > 0 {
            tracing::debug!(removed, "retention cleanup");
        }
        removed
    }

    /// Periodic registry refresh and cleanup until shutdown.
    pub fn spawn_maintenance(&self) -> JoinHandle<()> {
        let engine = self.clone();
        let mut shutdown = self.inner.shutdown.subscribe();
        let period = self.inner.config.refresh_interval();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = engine.refresh_registry_with_retry().await {
                            tracing::warn!(error = %e, "scheduled registry refresh failed");
                        }
                        engine.cleanup().await;
                    }
                }
            }
            tracing::debug!("maintenance loop stopped");
        })
    }

    /// Stop accepting rounds, give open rounds the grace period to close,
    /// then force-finalize whatever is left. Returns the forced results.
    pub async fn shutdown(&self) -> Vec<ConsensusResult> {
        tracing::info!("guardian engine stopping");
        self.inner.shutdown.shutdown();
        self.inner.rounds.lock().await.stop_accepting();

        let grace = self.inner.config.shutdown_grace();
        let mut open = self.inner.open_rounds.subscribe();
        let drained = tokio::time::timeout(grace, open.wait_for(|n| *n == 0))
            .await
            .map(|r| r.is_ok());
        if !matches!(drained, Ok(true)) {
            tracing::warn!(grace_secs = grace.as_secs(), "grace period elapsed, force-finalizing open rounds");
        }

        let now = self.inner.clock.now();
        let forced = {
            let mut rounds = self.inner.rounds.lock().await;
            let forced = rounds.finalize_all(FailureReason::ShutDown, now);
            for result in &forced {
                self.observe_finalized(result);
            }
            self.publish_open(&rounds);

            for (_, timer) in self.inner.timers.lock().await.drain() {
                timer.abort();
            }
            forced
        };

        let anchors: Vec<JoinHandle<()>> = self.inner.anchors.lock().await.drain(..).collect();
        let pending = anchors.len();
        let wait_all = async {
            for task in anchors {
                let _ = task.await;
            }
        };
        if tokio::time::timeout(grace, wait_all).await.is_err() {
            tracing::warn!(pending, "anchoring still in flight at shutdown");
        }

        tracing::info!(forced = forced.len(), "guardian engine stopped");
        forced
    }
}

impl std::fmt::Debug for GuardianEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardianEngine")
            .field("config", &self.inner.config)
            .field("metrics", &self.inner.metrics)
            .finish_non_exhaustive()
    }
}
