//! Round identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonically increasing identifier of a consensus round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundId(u64);

impl RoundId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    /// The following round id (saturating at `u64::MAX`).
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Big-endian encoding used inside hashes and signed messages.
    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// How many rounds `self` lies after `earlier` (0 if it does not).
    pub fn distance_from(&self, earlier: RoundId) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for RoundId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}
