//! Immutable, eligible-only view of the oracle pool.

use crate::OracleInfo;
use guardian_types::stake::checked_sum;
use guardian_types::{OracleAddress, Stake, Timestamp, TypesError, Weight};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One consistent view of the pool.
///
/// Only eligible (active, unslashed) oracles are kept. Entries are ordered by
/// address, which is the order committee sampling walks them in. Totals are
/// computed once with checked arithmetic at construction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SnapshotFields", into = "SnapshotFields")]
pub struct RegistrySnapshot {
    oracles: BTreeMap<OracleAddress, OracleInfo>,
    total_stake: Stake,
    total_weight: Weight,
    version: u64,
    loaded_at: Timestamp,
}

impl RegistrySnapshot {
    /// Build a snapshot, dropping ineligible oracles. A later duplicate
    /// address replaces an earlier one.
    pub fn from_oracles<I>(oracles: I, version: u64, loaded_at: Timestamp) -> Result<Self, TypesError>
    where
        I: IntoIterator<Item = OracleInfo>,
    {
        let oracles: BTreeMap<OracleAddress, OracleInfo> = oracles
            .into_iter()
            .filter(OracleInfo::is_eligible)
            .map(|o| (*o.address(), o))
            .collect();
        let total_stake = checked_sum(oracles.values().map(OracleInfo::stake))?;
        let total_weight = checked_sum(oracles.values().map(OracleInfo::weight))?;
        Ok(Self {
            oracles,
            total_stake,
            total_weight,
            version,
            loaded_at,
        })
    }

    pub fn get(&self, address: &OracleAddress) -> Option<&OracleInfo> {
        self.oracles.get(address)
    }

    pub fn contains(&self, address: &OracleAddress) -> bool {
        self.oracles.contains_key(address)
    }

    /// Eligible oracles in address order.
    pub fn iter(&self) -> impl Iterator<Item = &OracleInfo> {
        self.oracles.values()
    }

    pub fn len(&self) -> usize {
        self.oracles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.oracles.is_empty()
    }

    pub fn total_stake(&self) -> Stake {
        self.total_stake
    }

    pub fn total_weight(&self) -> Weight {
        self.total_weight
    }

    /// Monotonic counter bumped by every load or update.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn loaded_at(&self) -> Timestamp {
        self.loaded_at
    }

    /// All entries, for copy-on-write updates.
    pub(crate) fn to_entries(&self) -> Vec<OracleInfo> {
        self.oracles.values().cloned().collect()
    }
}

#[derive(Serialize, Deserialize)]
struct SnapshotFields {
    #[serde(default)]
    version: u64,
    #[serde(default)]
    loaded_at: Timestamp,
    oracles: Vec<OracleInfo>,
}

impl TryFrom<SnapshotFields> for RegistrySnapshot {
    type Error = TypesError;

    fn try_from(f: SnapshotFields) -> Result<Self, Self::Error> {
        RegistrySnapshot::from_oracles(f.oracles, f.version, f.loaded_at)
    }
}

impl From<RegistrySnapshot> for SnapshotFields {
    fn from(s: RegistrySnapshot) -> Self {
        SnapshotFields {
            version: s.version,
            loaded_at: s.loaded_at,
            oracles: s.oracles.into_values().collect(),
        }
    }
}
