//! TSS group public key identity.

use std::fmt;

/// The TSS group key as seen by this client.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TssPubKey {
    /// Bech32 encoding of the compressed group key; the signature cache key.
    pub bech32: String,
    /// Address controlled by the key on external chains.
    pub address: String,
}

impl TssPubKey {
    pub fn new(bech32: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            bech32: bech32.into(),
            address: address.into(),
        }
    }
}

impl fmt::Display for TssPubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.bech32)
    }
}
