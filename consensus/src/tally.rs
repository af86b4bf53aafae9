//! Weighted tally per distinct data hash.

use crate::{ConsensusError, OracleSubmission};
use guardian_types::{DataHash, Weight};
use std::collections::BTreeMap;

/// Accumulated weight behind each reported hash.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    weights: BTreeMap<DataHash, Weight>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tally a set of submissions from scratch.
    pub fn from_submissions<'a, I>(submissions: I) -> Result<Self, ConsensusError>
    where
        I: IntoIterator<Item = &'a OracleSubmission>,
    {
        let mut tally = Self::new();
        for s in submissions {
            tally.add(s.data_hash, s.weight)?;
        }
        Ok(tally)
    }

    pub fn add(&mut self, data_hash: DataHash, weight: Weight) -> Result<(), ConsensusError> {
        let entry = self.weights.entry(data_hash).or_insert(0);
        *entry = entry.checked_add(weight).ok_or(ConsensusError::StakeOverflow)?;
        Ok(())
    }

    pub fn weight_of(&self, data_hash: &DataHash) -> Weight {
        self.weights.get(data_hash).copied().unwrap_or(0)
    }

    /// The hash with the most weight. Ties go to the numerically smallest
    /// hash so every observer picks the same leader.
    pub fn leading(&self) -> Option<(DataHash, Weight)> {
        let mut best: Option<(DataHash, Weight)> = None;
        for (hash, weight) in &self.weights {
            match best {
                Some((_, w)) if *weight <= w => {}
                _ => best = Some((*hash, *weight)),
            }
        }
        best
    }

    /// Number of distinct hashes reported.
    pub fn distinct(&self) -> usize {
        self.weights.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DataHash, &Weight)> {
        self.weights.iter()
    }
}

/// Recompute `(leading_hash, leading_weight)` from a round's submissions.
///
/// An empty round yields `(None, 0)`.
pub fn recompute_tally(
    submissions: &[OracleSubmission],
) -> Result<(Option<DataHash>, Weight), ConsensusError> {
    let tally = Tally::from_submissions(submissions)?;
    Ok(match tally.leading() {
        Some((hash, weight)) => (Some(hash), weight),
        None => (None, 0),
    })
}
