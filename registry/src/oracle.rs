//! Per-oracle record.

use guardian_types::{OracleAddress, Reputation, Stake, Weight};
use serde::{Deserialize, Serialize};

/// A pool participant.
///
/// `weight` is derived from `stake` and `reputation` and cannot be set on its
/// own: every mutator recomputes it, and deserialization ignores any stored
/// value and recomputes it from the inputs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OracleFields", into = "OracleFields")]
pub struct OracleInfo {
    address: OracleAddress,
    stake: Stake,
    reputation: Reputation,
    weight: Weight,
    is_active: bool,
    is_slashed: bool,
}

impl OracleInfo {
    /// A new active, unslashed oracle.
    pub fn new(address: OracleAddress, stake: Stake, reputation: Reputation) -> Self {
        Self {
            address,
            stake,
            reputation,
            weight: reputation.weight_of(stake),
            is_active: true,
            is_slashed: false,
        }
    }

    pub fn with_flags(mut self, is_active: bool, is_slashed: bool) -> Self {
        self.is_active = is_active;
        self.is_slashed = is_slashed;
        self
    }

    pub fn address(&self) -> &OracleAddress {
        &self.address
    }

    pub fn stake(&self) -> Stake {
        self.stake
    }

    pub fn reputation(&self) -> Reputation {
        self.reputation
    }

    pub fn weight(&self) -> Weight {
        self.weight
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_slashed(&self) -> bool {
        self.is_slashed
    }

    /// Active and not slashed.
    pub fn is_eligible(&self) -> bool {
        self.is_active && !self.is_slashed
    }

    pub fn set_stake(&mut self, stake: Stake) {
        self.stake = stake;
        self.weight = self.reputation.weight_of(stake);
    }

    pub fn set_reputation(&mut self, reputation: Reputation) {
        self.reputation = reputation;
        self.weight = reputation.weight_of(self.stake);
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    pub fn slash(&mut self) {
        self.is_slashed = true;
    }
}

/// A single change reported by the gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OracleUpdate {
    /// Create or fully replace an oracle entry (active, unslashed).
    Upsert {
        address: OracleAddress,
        stake: Stake,
        reputation: Reputation,
    },
    StakeChanged {
        address: OracleAddress,
        stake: Stake,
    },
    ReputationChanged {
        address: OracleAddress,
        reputation: Reputation,
    },
    Deactivated(OracleAddress),
    Slashed(OracleAddress),
}

impl OracleUpdate {
    pub fn address(&self) -> &OracleAddress {
        match self {
            OracleUpdate::Upsert { address, .. }
            | OracleUpdate::StakeChanged { address, .. }
            | OracleUpdate::ReputationChanged { address, .. } => address,
            OracleUpdate::Deactivated(address) | OracleUpdate::Slashed(address) => address,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct OracleFields {
    address: OracleAddress,
    stake: Stake,
    reputation: Reputation,
    #[serde(default)]
    weight: Weight,
    #[serde(default = "default_true")]
    is_active: bool,
    #[serde(default)]
    is_slashed: bool,
}

fn default_true() -> bool {
    true
}

impl From<OracleFields> for OracleInfo {
    fn from(f: OracleFields) -> Self {
        OracleInfo::new(f.address, f.stake, f.reputation).with_flags(f.is_active, f.is_slashed)
    }
}

impl From<OracleInfo> for OracleFields {
    fn from(o: OracleInfo) -> Self {
        OracleFields {
            address: o.address,
            stake: o.stake,
            reputation: o.reputation,
            weight: o.weight,
            is_active: o.is_active,
            is_slashed: o.is_slashed,
        }
    }
}
