//! Nullable gateway: an in-memory oracle contract.

use guardian_registry::{GatewayError, OracleGateway, OracleStatus};
use guardian_types::{DataHash, OracleAddress, Reputation, RoundId, Seed, Stake, Weight};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// A result the engine anchored through [`OracleGateway::submit_consensus_result`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnchoredResult {
    pub round_id: RoundId,
    pub data_hash: DataHash,
    pub weight: Weight,
}

/// In-memory gateway.
///
/// Oracles are listed in insertion order. The gateway can be taken down
/// entirely or made to fail a fixed number of upcoming calls, which is how
/// tests exercise refresh retries.
#[derive(Debug, Default)]
pub struct NullGateway {
    oracles: Mutex<Vec<(OracleAddress, OracleStatus)>>,
    block_hash: Mutex<Seed>,
    anchored: Mutex<Vec<AnchoredResult>>,
    unavailable: AtomicBool,
    fail_next: AtomicUsize,
    calls: AtomicUsize,
}

impl NullGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an active, unslashed oracle (or replace an existing entry).
    pub fn add_oracle(&self, address: OracleAddress, stake: Stake, reputation: Reputation) {
        self.set_status(
            address,
            OracleStatus {
                stake,
                reputation_bps: reputation.bps(),
                is_active: true,
                is_slashed: false,
            },
        );
    }

    pub fn set_status(&self, address: OracleAddress, status: OracleStatus) {
        let mut oracles = lock(&self.oracles);
        match oracles.iter_mut().find(|(a, _)| *a == address) {
            Some(entry) => entry.1 = status,
            None => oracles.push((address, status)),
        }
    }

    pub fn slash(&self, address: &OracleAddress) {
        if let Some(entry) = lock(&self.oracles).iter_mut().find(|(a, _)| a == address) {
            entry.1.is_slashed = true;
        }
    }

    pub fn set_block_hash(&self, seed: Seed) {
        *lock(&self.block_hash) = seed;
    }

    /// Fail every call until set back to `false`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Fail the next `n` calls, then recover.
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// Results anchored so far, in order.
    pub fn anchored(&self) -> Vec<AnchoredResult> {
        lock(&self.anchored).clone()
    }

    /// Total gateway calls, failed ones included.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("null gateway is down".into()));
        }
        let failing = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(GatewayError::Unavailable("null gateway scripted failure".into()));
        }
        Ok(())
    }
}

// a panicked test thread must not cascade into every later assertion
fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl OracleGateway for NullGateway {
    fn active_oracle_count(&self) -> Result<usize, GatewayError> {
        self.check()?;
        Ok(lock(&self.oracles).len())
    }

    fn oracle_at(&self, index: usize) -> Result<OracleAddress, GatewayError> {
        self.check()?;
        lock(&self.oracles)
            .get(index)
            .map(|(a, _)| *a)
            .ok_or(GatewayError::IndexOutOfRange(index))
    }

    fn oracle_info(&self, address: &OracleAddress) -> Result<OracleStatus, GatewayError> {
        self.check()?;
        lock(&self.oracles)
            .iter()
            .find(|(a, _)| a == address)
            .map(|(_, s)| *s)
            .ok_or(GatewayError::UnknownOracle(*address))
    }

    fn latest_block_hash(&self) -> Result<Seed, GatewayError> {
        self.check()?;
        Ok(*lock(&self.block_hash))
    }

    fn submit_consensus_result(
        &self,
        round_id: RoundId,
        data_hash: DataHash,
        weight: Weight,
    ) -> Result<(), GatewayError> {
        self.check()?;
        lock(&self.anchored).push(AnchoredResult {
            round_id,
            data_hash,
            weight,
        });
        Ok(())
    }
}
