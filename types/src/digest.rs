//! TSS digests and recoverable 65-byte ECDSA signatures.

use crate::error::TypesError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// The payload co-signers actually sign for one outbound nonce.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest(Vec<u8>);

impl Digest {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn from_hex(s: &str) -> Result<Self, TypesError> {
        hex::decode(s)
            .map(Self)
            .map_err(|e| TypesError::InvalidHex(e.to_string()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        if hex.len() > 8 {
            write!(f, "Digest({}\u{2026})", &hex[..8])
        } else {
            write!(f, "Digest({hex})")
        }
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A 65-byte `[R || S || V]` TSS signature.
///
/// The all-zero value is the "no signature yet" marker.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature65(pub [u8; 65]);

impl Signature65 {
    pub const EMPTY: Self = Self([0u8; 65]);

    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; 65]
    }

    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }
}

impl Default for Signature65 {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl TryFrom<&[u8]> for Signature65 {
    type Error = TypesError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; 65] = bytes
            .try_into()
            .map_err(|_| TypesError::InvalidSignatureLength(bytes.len()))?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Signature65 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "Signature65(empty)");
        }
        write!(f, "Signature65({}\u{2026})", hex::encode(&self.0[..4]))
    }
}

impl Serialize for Signature65 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Signature65 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        Signature65::try_from(bytes.as_slice()).map_err(serde::de::Error::custom)
    }
}
