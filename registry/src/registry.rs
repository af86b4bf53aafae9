//! Owner of the current pool snapshot.

use crate::{OracleGateway, OracleInfo, OracleUpdate, RegistryError, RegistrySnapshot};
use guardian_types::{OracleAddress, Reputation, Timestamp, Weight};
use std::sync::Arc;

/// Read the full pool from the gateway into a fresh snapshot.
///
/// Entries with an out-of-range reputation are skipped with a warning rather
/// than failing the whole load.
pub fn fetch_snapshot(
    gateway: &dyn OracleGateway,
    version: u64,
    now: Timestamp,
) -> Result<RegistrySnapshot, RegistryError> {
    let count = gateway.active_oracle_count()?;
    let mut oracles = Vec::with_capacity(count);
    for index in 0..count {
        let address = gateway.oracle_at(index)?;
        let status = gateway.oracle_info(&address)?;
        let reputation = match Reputation::new(status.reputation_bps) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(oracle = %address, error = %e, "skipping oracle with invalid reputation");
                continue;
            }
        };
        oracles.push(
            OracleInfo::new(address, status.stake, reputation)
                .with_flags(status.is_active, status.is_slashed),
        );
    }
    Ok(RegistrySnapshot::from_oracles(oracles, version, now)?)
}

/// Holds the current [`RegistrySnapshot`].
///
/// Readers get an `Arc` to the snapshot and keep it as long as they need;
/// loads and updates never mutate a snapshot in place.
#[derive(Clone, Debug, Default)]
pub struct OracleRegistry {
    snapshot: Arc<RegistrySnapshot>,
}

impl OracleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot (e.g. one restored from disk).
    pub fn from_snapshot(snapshot: RegistrySnapshot) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
        }
    }

    /// Replace the pool with the gateway's current state.
    ///
    /// On gateway failure the previous snapshot is kept and
    /// [`RegistryError::GatewayUnavailable`] is returned so the caller can
    /// retry. Returns the number of eligible oracles on success.
    pub fn load(&mut self, gateway: &dyn OracleGateway, now: Timestamp) -> Result<usize, RegistryError> {
        match fetch_snapshot(gateway, self.next_version(), now) {
            Ok(snapshot) => Ok(self.install(snapshot)),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    kept_version = self.snapshot.version(),
                    kept_oracles = self.snapshot.len(),
                    "registry load failed, keeping last snapshot"
                );
                Err(e)
            }
        }
    }

    /// Swap in a snapshot produced elsewhere (e.g. by [`fetch_snapshot`] on a
    /// blocking thread). Returns the number of eligible oracles.
    pub fn install(&mut self, snapshot: RegistrySnapshot) -> usize {
        let len = snapshot.len();
        tracing::info!(
            version = snapshot.version(),
            oracles = len,
            total_weight = %snapshot.total_weight(),
            "registry snapshot installed"
        );
        self.snapshot = Arc::new(snapshot);
        len
    }

    /// Apply one gateway-reported change, copy-on-write.
    ///
    /// Deactivation and slashing remove the oracle from the pool. Updating an
    /// oracle that is not in the pool (other than by `Upsert`) is
    /// [`RegistryError::OracleNotFound`].
    pub fn apply_update(&mut self, update: OracleUpdate, now: Timestamp) -> Result<(), RegistryError> {
        let mut entries = self.snapshot.to_entries();
        let position = entries.iter().position(|o| o.address() == update.address());

        match (&update, position) {
            (OracleUpdate::Upsert { address, stake, reputation }, Some(i)) => {
                entries[i] = OracleInfo::new(*address, *stake, *reputation);
            }
            (OracleUpdate::Upsert { address, stake, reputation }, None) => {
                entries.push(OracleInfo::new(*address, *stake, *reputation));
            }
            (OracleUpdate::StakeChanged { stake, .. }, Some(i)) => entries[i].set_stake(*stake),
            (OracleUpdate::ReputationChanged { reputation, .. }, Some(i)) => {
                entries[i].set_reputation(*reputation)
            }
            (OracleUpdate::Deactivated(_), Some(i)) => entries[i].deactivate(),
            (OracleUpdate::Slashed(_), Some(i)) => entries[i].slash(),
            (_, None) => return Err(RegistryError::OracleNotFound(*update.address())),
        }

        let snapshot = RegistrySnapshot::from_oracles(entries, self.next_version(), now)?;
        tracing::debug!(oracle = %update.address(), version = snapshot.version(), "registry update applied");
        self.snapshot = Arc::new(snapshot);
        Ok(())
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn total_weight(&self) -> Weight {
        self.snapshot.total_weight()
    }

    pub fn get(&self, address: &OracleAddress) -> Result<OracleInfo, RegistryError> {
        self.snapshot
            .get(address)
            .cloned()
            .ok_or(RegistryError::OracleNotFound(*address))
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    pub fn next_version(&self) -> u64 {
        self.snapshot.version() + 1
    }
}
