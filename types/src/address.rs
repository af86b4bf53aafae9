//! Oracle address type with `orc_` prefix.

use crate::keys::PublicKey;
use crate::TypesError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Stable identity of a pool participant.
///
/// The address is the oracle's Ed25519 public key, so a submission signature
/// can be checked against the address alone. Ordering is byte-wise and is the
/// iteration order used by committee sampling.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OracleAddress([u8; 32]);

impl OracleAddress {
    /// The textual prefix of every oracle address.
    pub const PREFIX: &'static str = "orc_";

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self(public_key.0)
    }

    pub fn as_public_key(&self) -> PublicKey {
        PublicKey(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for OracleAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, hex::encode(&self.0[..6]))
    }
}

impl fmt::Display for OracleAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, hex::encode(self.0))
    }
}

impl FromStr for OracleAddress {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| TypesError::InvalidAddress(format!("missing {} prefix", Self::PREFIX)))?;
        let bytes = hex::decode(body).map_err(|e| TypesError::InvalidAddress(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| TypesError::InvalidAddress("expected 32 key bytes".into()))?;
        Ok(Self(arr))
    }
}

impl Serialize for OracleAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OracleAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_parse_round_trip() {
        let addr = OracleAddress::new([7u8; 32]);
        let text = addr.to_string();
        assert!(text.starts_with("orc_"));
        assert_eq!(text.parse::<OracleAddress>().unwrap(), addr);
    }

    #[test]
    fn missing_prefix_rejected() {
        let err = "07".repeat(32).parse::<OracleAddress>().unwrap_err();
        assert!(matches!(err, TypesError::InvalidAddress(_)));
    }

    #[test]
    fn short_key_rejected() {
        assert!("orc_0707".parse::<OracleAddress>().is_err());
    }

    #[test]
    fn ordering_is_bytewise() {
        let mut low = [0u8; 32];
        low[31] = 1;
        let mut high = [0u8; 32];
        high[0] = 1;
        assert!(OracleAddress::new(low) < OracleAddress::new(high));
    }
}
