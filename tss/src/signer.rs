//! TSS signer contracts and the cache-fronted signer.

use crate::{SignatureCache, TssError, TssPubKey};
use async_trait::async_trait;
use xchain_types::{ChainId, Digest, Signature65};

/// The keysign protocol itself: all co-signers sign `digests` together at
/// the virtual `keysign_height`. Returns one signature per digest, in order.
#[async_trait]
pub trait KeysignBackend: Send + Sync {
    fn pubkey(&self) -> &TssPubKey;

    async fn keysign(
        &self,
        digests: &[Digest],
        keysign_height: u64,
        nonce: u64,
        chain_id: ChainId,
    ) -> Result<Vec<Signature65>, TssError>;
}

/// Signer consumed by the batch signer.
#[async_trait]
pub trait TssSigner: Send + Sync {
    fn pubkey(&self) -> &TssPubKey;

    /// Sign `digests` as one batch. `nonce` is the highest nonce in the batch.
    async fn sign_batch(
        &self,
        digests: &[Digest],
        keysign_height: u64,
        nonce: u64,
        chain_id: ChainId,
    ) -> Result<Vec<Signature65>, TssError>;

    /// True if a valid signature is already held for every digest.
    fn is_signature_cached(&self, chain_id: ChainId, digests: &[Digest]) -> bool;
}

/// A [`TssSigner`] that answers from its [`SignatureCache`] when it can and
/// records every fresh keysign result.
pub struct CachedTssSigner<B> {
    backend: B,
    cache: SignatureCache,
}

impl<B: KeysignBackend> CachedTssSigner<B> {
    pub fn new(backend: B, cache: SignatureCache) -> Self {
        Self { backend, cache }
    }

    pub fn cache(&self) -> &SignatureCache {
        &self.cache
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[async_trait]
impl<B: KeysignBackend> TssSigner for CachedTssSigner<B> {
    fn pubkey(&self) -> &TssPubKey {
        self.backend.pubkey()
    }

    async fn sign_batch(
        &self,
        digests: &[Digest],
        keysign_height: u64,
        nonce: u64,
        chain_id: ChainId,
    ) -> Result<Vec<Signature65>, TssError> {
        let pubkey = self.backend.pubkey();
        if let Some(signatures) = self.cache.get_batch(pubkey, digests) {
            tracing::debug!(chain = %chain_id, nonce, count = digests.len(), "batch signatures served from cache");
            return Ok(signatures);
        }

        let signatures = self
            .backend
            .keysign(digests, keysign_height, nonce, chain_id)
            .await?;
        self.cache.add_batch(pubkey, digests, &signatures)?;

        tracing::info!(
            chain = %chain_id,
            nonce,
            keysign_height,
            count = signatures.len(),
            "keysign batch completed"
        );
        Ok(signatures)
    }

    fn is_signature_cached(&self, _chain_id: ChainId, digests: &[Digest]) -> bool {
        self.cache.get_batch(self.backend.pubkey(), digests).is_some()
    }
}
