//! Exact modular reduction of 256-bit hash values.
//!
//! A draw is `seed_value mod n` where `seed_value` is the full 256-bit hash
//! read as a big-endian unsigned integer and `n` is a `u128` (a stake total
//! or a pool size). Truncating the hash to 128 bits first would give a
//! different, implementation-specific answer, so the reduction is done over
//! all 256 bits.

use crate::VrfError;
use num_bigint::BigUint;

/// Reduce a big-endian 256-bit value modulo `modulus`.
pub fn reduce_be_mod(value: &[u8; 32], modulus: u128) -> Result<u128, VrfError> {
    if modulus == 0 {
        return Err(VrfError::ZeroModulus);
    }
    let remainder = BigUint::from_bytes_be(value) % BigUint::from(modulus);
    // Below a u128 modulus: at most two little-endian u64 digits.
    Ok(remainder
        .to_u64_digits()
        .iter()
        .rev()
        .fold(0u128, |acc, digit| (acc << 64) | u128::from(*digit)))
}
