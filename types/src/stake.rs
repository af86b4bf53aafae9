//! Stake, reputation and voting-weight arithmetic.
//!
//! Stake and weight are raw `u128` amounts. Every operation here is either
//! exact and overflow-free by construction, or checked and fails with
//! [`TypesError::StakeOverflow`]; nothing wraps silently.

use crate::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Staked value of an oracle, in raw units.
pub type Stake = u128;

/// Voting weight (`stake * reputation / 10_000`), in raw units.
pub type Weight = u128;

/// Basis-point denominator shared by reputation and thresholds.
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Reputation score in basis points, `0..=10_000`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Reputation(u16);

impl Reputation {
    pub const MAX: Self = Self(10_000);
    pub const ZERO: Self = Self(0);

    pub fn new(bps: u32) -> Result<Self, TypesError> {
        if bps as u128 > BPS_DENOMINATOR {
            return Err(TypesError::ReputationOutOfRange(bps));
        }
        Ok(Self(bps as u16))
    }

    pub fn bps(&self) -> u32 {
        self.0 as u32
    }

    /// `stake * self / 10_000`, rounded down.
    ///
    /// Split as `q * rep + r * rep / 10_000` with `stake = q * 10_000 + r`,
    /// which is exact and cannot overflow because `rep <= 10_000`.
    pub fn weight_of(&self, stake: Stake) -> Weight {
        let rep = self.0 as u128;
        let q = stake / BPS_DENOMINATOR;
        let r = stake % BPS_DENOMINATOR;
        q * rep + (r * rep) / BPS_DENOMINATOR
    }
}

impl TryFrom<u32> for Reputation {
    type Error = TypesError;

    fn try_from(bps: u32) -> Result<Self, Self::Error> {
        Self::new(bps)
    }
}

impl From<Reputation> for u32 {
    fn from(rep: Reputation) -> Self {
        rep.bps()
    }
}

impl fmt::Display for Reputation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bps", self.0)
    }
}

/// Sum amounts, failing on overflow.
pub fn checked_sum<I: IntoIterator<Item = u128>>(amounts: I) -> Result<u128, TypesError> {
    amounts
        .into_iter()
        .try_fold(0u128, |acc, x| acc.checked_add(x))
        .ok_or(TypesError::StakeOverflow)
}

/// Smallest weight that satisfies `weight / total >= bps / 10_000`.
///
/// This is `ceil(total * bps / 10_000)`, computed without overflow for any
/// `total` and `bps <= 10_000`. Rounding up keeps the effective quorum at or
/// above the configured fraction for small totals (e.g. total 10 at 6700 bps
/// needs 7, not 6).
pub fn threshold_weight(total: Weight, bps: u32) -> Weight {
    let bps = (bps as u128).min(BPS_DENOMINATOR);
    let q = total / BPS_DENOMINATOR;
    let r = total % BPS_DENOMINATOR;
    q * bps + (r * bps).div_ceil(BPS_DENOMINATOR)
}
