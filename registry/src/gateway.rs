//! Interface to the external state source.
//!
//! The gateway persists stake and reputation on chain and anchors finalized
//! results. It is consumed, never implemented, by this workspace (apart from
//! the in-memory test double in `guardian-nullables`). Calls are blocking and
//! may perform network I/O; async callers run them on a blocking thread.

use crate::GatewayError;
use guardian_types::{DataHash, OracleAddress, RoundId, Seed, Stake, Weight};

/// On-chain status of one oracle as reported by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OracleStatus {
    pub stake: Stake,
    /// Raw basis-point value; validated by the registry.
    pub reputation_bps: u32,
    pub is_active: bool,
    pub is_slashed: bool,
}

pub trait OracleGateway: Send + Sync {
    /// Number of oracles the gateway currently indexes.
    fn active_oracle_count(&self) -> Result<usize, GatewayError>;

    /// Address at `index` in `0..active_oracle_count()`.
    fn oracle_at(&self, index: usize) -> Result<OracleAddress, GatewayError>;

    fn oracle_info(&self, address: &OracleAddress) -> Result<OracleStatus, GatewayError>;

    /// A recent block hash, used as the unpredictable external seed.
    fn latest_block_hash(&self) -> Result<Seed, GatewayError>;

    /// Anchor a finalized consensus result. Fire-and-forget from the engine's
    /// point of view.
    fn submit_consensus_result(
        &self,
        round_id: RoundId,
        consensus_hash: DataHash,
        weight: Weight,
    ) -> Result<(), GatewayError>;
}
