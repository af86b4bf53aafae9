//! The draw chain used by committee sampling.

use crate::{reduce_be_mod, VrfError};
use guardian_crypto::blake2b_256;
use guardian_types::Seed;

/// A deterministic sequence of 256-bit values: `v_0 = round_seed`,
/// `v_{n+1} = H(v_n)`.
///
/// Every draw reads the current value; the sampler calls [`advance`] after
/// each pick, so a draw that selects nobody does not consume randomness.
///
/// [`advance`]: DrawChain::advance
#[derive(Clone, Debug)]
pub struct DrawChain {
    current: [u8; 32],
    steps: u64,
}

impl DrawChain {
    pub fn new(round_seed: &Seed) -> Self {
        Self {
            current: *round_seed.as_bytes(),
            steps: 0,
        }
    }

    pub fn value(&self) -> &[u8; 32] {
        &self.current
    }

    /// Number of times the chain has been advanced.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Replace the current value with its hash.
    pub fn advance(&mut self) {
        self.current = blake2b_256(&self.current);
        self.steps += 1;
    }

    /// `current mod bound`.
    pub fn draw_below(&self, bound: u128) -> Result<u128, VrfError> {
        reduce_be_mod(&self.current, bound)
    }

    /// `current mod count`, as an index.
    pub fn draw_index(&self, count: usize) -> Result<usize, VrfError> {
        // A result below `count` always fits back into usize.
        self.draw_below(count as u128).map(|i| i as usize)
    }
}
