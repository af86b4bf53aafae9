//! Consensus parameters shared by the committee selector and the round manager.
//!
//! Loaded from the node's TOML config; every field has a serde default so a
//! partial `[params]` table is valid. [`ConsensusParams::validate`] must pass
//! before the parameters are handed to an engine.

use crate::TypesError;
use serde::{Deserialize, Serialize};

/// Smallest committee able to tolerate one Byzantine member (`3f + 1`, `f = 1`).
pub const MIN_BFT_COMMITTEE: usize = 4;

/// How the committee sampler weights each draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionWeighting {
    /// Probability proportional to stake.
    #[default]
    Stake,
    /// Every eligible oracle equally likely.
    Uniform,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitteeParams {
    pub min_committee_size: usize,
    pub max_committee_size: usize,
    /// Size the weighted sampler aims for. May sit below the minimum, in which
    /// case the selector tops up with uniform draws.
    pub target_committee_size: usize,
    /// An oracle selected in round `r` is ineligible for rounds
    /// `r + 1 ..= r + cooldown_periods`. Zero disables rotation.
    pub cooldown_periods: u64,
    pub weighting: SelectionWeighting,
}

impl Default for CommitteeParams {
    fn default() -> Self {
        Self {
            min_committee_size: MIN_BFT_COMMITTEE,
            max_committee_size: 15,
            target_committee_size: 10,
            cooldown_periods: 1,
            weighting: SelectionWeighting::Stake,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundParams {
    /// Fraction of the round's total weight a single hash needs, in basis points.
    pub consensus_threshold_bps: u32,
    /// Submissions required before any tally is attempted.
    pub min_oracles: usize,
    pub submission_window_secs: u64,
    /// How long finalized rounds and selections are kept before `cleanup`.
    pub retention_secs: u64,
    /// Restrict voting to a freshly selected committee per round.
    pub committee_restricted: bool,
}

impl Default for RoundParams {
    fn default() -> Self {
        Self {
            consensus_threshold_bps: 6_700,
            min_oracles: 3,
            submission_window_secs: 30,
            retention_secs: 24 * 60 * 60,
            committee_restricted: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusParams {
    pub committee: CommitteeParams,
    pub round: RoundParams,
}

impl CommitteeParams {
    pub fn validate(&self) -> Result<(), TypesError> {
        if self.min_committee_size < MIN_BFT_COMMITTEE {
            return Err(TypesError::InvalidParams(format!(
                "min_committee_size {} is below {MIN_BFT_COMMITTEE}",
                self.min_committee_size
            )));
        }
        if self.max_committee_size < self.min_committee_size {
            return Err(TypesError::InvalidParams(format!(
                "max_committee_size {} is below min_committee_size {}",
                self.max_committee_size, self.min_committee_size
            )));
        }
        if self.target_committee_size == 0 || self.target_committee_size > self.max_committee_size {
            return Err(TypesError::InvalidParams(format!(
                "target_committee_size {} must be in 1..={}",
                self.target_committee_size, self.max_committee_size
            )));
        }
        Ok(())
    }

    /// Whether `size` lies within `[min_committee_size, max_committee_size]`.
    pub fn size_in_bounds(&self, size: usize) -> bool {
        (self.min_committee_size..=self.max_committee_size).contains(&size)
    }
}

impl RoundParams {
    /// A threshold at or below 5000 bps is refused: two distinct hashes could
    /// then both reach it in one round.
    pub fn validate(&self) -> Result<(), TypesError> {
        if self.consensus_threshold_bps <= 5_000 {
            return Err(TypesError::InvalidParams(format!(
                "consensus_threshold_bps {} must exceed 5000",
                self.consensus_threshold_bps
            )));
        }
        if self.consensus_threshold_bps > 10_000 {
            return Err(TypesError::InvalidParams(format!(
                "consensus_threshold_bps {} exceeds 10000",
                self.consensus_threshold_bps
            )));
        }
        if self.min_oracles == 0 {
            return Err(TypesError::InvalidParams("min_oracles must be at least 1".into()));
        }
        if self.submission_window_secs == 0 {
            return Err(TypesError::InvalidParams(
                "submission_window_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl ConsensusParams {
    /// Check both parameter groups, and that a committee-restricted round
    /// can collect `min_oracles` reports from its largest committee.
    pub fn validate(&self) -> Result<(), TypesError> {
        self.committee.validate()?;
        self.round.validate()?;
        if self.round.committee_restricted
            && self.round.min_oracles > self.committee.max_committee_size
        {
            return Err(TypesError::InvalidParams(format!(
                "min_oracles {} exceeds max_committee_size {}",
                self.round.min_oracles, self.committee.max_committee_size
            )));
        }
        Ok(())
    }
}
