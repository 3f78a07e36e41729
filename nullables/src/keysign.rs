//! Nullable keysign backend: deterministic signatures, recorded calls.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use xchain_tss::{KeysignBackend, TssError, TssPubKey};
use xchain_types::{ChainId, Digest, Signature65};

/// Arguments of one recorded keysign round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeysignCall {
    pub digests: Vec<Digest>,
    pub keysign_height: u64,
    pub nonce: u64,
    pub chain_id: ChainId,
}

/// Signs every digest with a value derived only from the digest bytes.
pub struct NullKeysign {
    pubkey: TssPubKey,
    paused: AtomicBool,
    calls: Mutex<Vec<KeysignCall>>,
}

impl NullKeysign {
    pub fn new() -> Self {
        Self {
            pubkey: TssPubKey::new("zetapub1nulltss", "0x70e967acfcc17c3941e87562161406d41676fd83"),
            paused: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// While paused every keysign round fails.
    pub fn pause(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<KeysignCall> {
        self.calls.lock().clone()
    }

    /// The signature this backend produces for `digest`.
    pub fn signature_for(digest: &Digest) -> Signature65 {
        let bytes = digest.as_bytes();
        let mut sig = [0u8; 65];
        for (i, b) in sig.iter_mut().take(64).enumerate() {
            let d = if bytes.is_empty() { 0 } else { bytes[i % bytes.len()] };
            *b = d ^ (i as u8);
        }
        sig[64] = 27;
        Signature65(sig)
    }
}

impl Default for NullKeysign {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeysignBackend for NullKeysign {
    fn pubkey(&self) -> &TssPubKey {
        &self.pubkey
    }

    async fn keysign(
        &self,
        digests: &[Digest],
        keysign_height: u64,
        nonce: u64,
        chain_id: ChainId,
    ) -> Result<Vec<Signature65>, TssError> {
        self.calls.lock().push(KeysignCall {
            digests: digests.to_vec(),
            keysign_height,
            nonce,
            chain_id,
        });
        if self.paused.load(Ordering::SeqCst) {
            return Err(TssError::Keysign("keysign paused".into()));
        }
        Ok(digests.iter().map(Self::signature_for).collect())
    }
}
