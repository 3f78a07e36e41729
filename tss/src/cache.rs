//! Size-bounded, time-bounded TSS signature cache.
//!
//! Entries are keyed by `(pubkey bech32, digest hex)`. Capacity is enforced by
//! LRU eviction; expiry is checked lazily on read. An entry added at `t0` is a
//! hit strictly before `t0 + ttl` and is evicted by the first read at or after
//! it, so a zero TTL turns every read into a miss.

use crate::{TssError, TssPubKey};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use xchain_types::{Digest, Signature65, Timestamp};
use xchain_utils::Clock;

type CacheKey = (String, String);

#[derive(Clone, Copy, Debug)]
struct CacheEntry {
    signature: Signature65,
    added_at: Timestamp,
}

pub struct SignatureCache {
    entries: Mutex<LruCache<CacheKey, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl SignatureCache {
    pub fn new(size: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Result<Self, TssError> {
        let capacity = NonZeroUsize::new(size).ok_or(TssError::InvalidCacheSize)?;
        Ok(Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
            clock,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key(pubkey: &TssPubKey, digest: &Digest) -> CacheKey {
        (pubkey.bech32.clone(), digest.to_hex())
    }

    pub fn add(&self, pubkey: &TssPubKey, digest: &Digest, signature: Signature65) {
        let entry = CacheEntry {
            signature,
            added_at: self.clock.now(),
        };
        self.entries.lock().put(Self::key(pubkey, digest), entry);
    }

    pub fn get(&self, pubkey: &TssPubKey, digest: &Digest) -> Option<Signature65> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        self.lookup(&mut entries, &Self::key(pubkey, digest), now)
    }

    /// Add `signatures[i]` under `digests[i]` for every `i`.
    pub fn add_batch(
        &self,
        pubkey: &TssPubKey,
        digests: &[Digest],
        signatures: &[Signature65],
    ) -> Result<(), TssError> {
        if digests.len() != signatures.len() {
            return Err(TssError::LengthMismatch {
                digests: digests.len(),
                signatures: signatures.len(),
            });
        }
        let added_at = self.clock.now();
        let mut entries = self.entries.lock();
        for (digest, signature) in digests.iter().zip(signatures) {
            entries.put(
                Self::key(pubkey, digest),
                CacheEntry {
                    signature: *signature,
                    added_at,
                },
            );
        }
        Ok(())
    }

    /// Signatures for every digest, in order, or `None` if any one of them is
    /// missing or expired. An empty request is also `None`.
    pub fn get_batch(&self, pubkey: &TssPubKey, digests: &[Digest]) -> Option<Vec<Signature65>> {
        if digests.is_empty() {
            return None;
        }
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let mut signatures = Vec::with_capacity(digests.len());
        for digest in digests {
            signatures.push(self.lookup(&mut entries, &Self::key(pubkey, digest), now)?);
        }
        Some(signatures)
    }

    fn lookup(
        &self,
        entries: &mut LruCache<CacheKey, CacheEntry>,
        key: &CacheKey,
        now: Timestamp,
    ) -> Option<Signature65> {
        let entry = *entries.get(key)?;
        if entry.added_at.has_expired(self.ttl, now) {
            entries.pop(key);
            tracing::trace!(digest = %key.1, "signature cache entry expired");
            return None;
        }
        Some(entry.signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xchain_nullables::NullClock;

    fn setup(size: usize, ttl: Duration) -> (SignatureCache, Arc<NullClock>) {
        let clock = Arc::new(NullClock::new(Timestamp::from_millis(1_000)));
        let cache = SignatureCache::new(size, ttl, clock.clone()).unwrap();
        (cache, clock)
    }

    fn pk() -> TssPubKey {
        TssPubKey::new("zetapub1test", "0xtss")
    }

    fn digest(n: u8) -> Digest {
        Digest::new(vec![n; 32])
    }

    fn sig(n: u8) -> Signature65 {
        Signature65([n; 65])
    }

    #[test]
    fn zero_size_is_rejected() {
        let clock = Arc::new(NullClock::from_secs(0));
        assert_eq!(
            SignatureCache::new(0, Duration::from_secs(1), clock).err(),
            Some(TssError::InvalidCacheSize)
        );
    }

    #[test]
    fn entry_lives_until_ttl() {
        let (cache, clock) = setup(10, Duration::from_secs(60));
        cache.add(&pk(), &digest(1), sig(1));

        clock.advance(Duration::from_millis(59_999));
        assert_eq!(cache.get(&pk(), &digest(1)), Some(sig(1)));

        clock.advance(Duration::from_millis(1));
        assert_eq!(cache.get(&pk(), &digest(1)), None);
        assert!(cache.is_empty(), "expired entry evicted on read");
    }

    #[test]
    fn zero_ttl_disables_cache() {
        let (cache, _clock) = setup(10, Duration::ZERO);
        cache.add(&pk(), &digest(1), sig(1));
        assert_eq!(cache.get(&pk(), &digest(1)), None);
    }

    #[test]
    fn keys_are_scoped_by_pubkey() {
        let (cache, _clock) = setup(10, Duration::from_secs(60));
        cache.add(&pk(), &digest(1), sig(1));
        let other = TssPubKey::new("zetapub1other", "0xother");
        assert_eq!(cache.get(&other, &digest(1)), None);
    }

    #[test]
    fn lru_capacity_evicts_oldest() {
        let (cache, _clock) = setup(2, Duration::from_secs(60));
        cache.add(&pk(), &digest(1), sig(1));
        cache.add(&pk(), &digest(2), sig(2));
        cache.add(&pk(), &digest(3), sig(3));
        assert_eq!(cache.get(&pk(), &digest(1)), None);
        assert_eq!(cache.get(&pk(), &digest(3)), Some(sig(3)));
    }

    #[test]
    fn add_batch_length_mismatch() {
        let (cache, _clock) = setup(10, Duration::from_secs(60));
        let err = cache
            .add_batch(&pk(), &[digest(1), digest(2)], &[sig(1)])
            .unwrap_err();
        assert_eq!(
            err,
            TssError::LengthMismatch {
                digests: 2,
                signatures: 1
            }
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn get_batch_is_all_or_nothing() {
        let (cache, _clock) = setup(10, Duration::from_secs(60));
        let digests: Vec<_> = (0..4).map(digest).collect();
        let sigs: Vec<_> = (0..4).map(sig).collect();
        cache.add_batch(&pk(), &digests[..3], &sigs[..3]).unwrap();

        assert_eq!(cache.get_batch(&pk(), &digests), None);
        assert_eq!(cache.get_batch(&pk(), &digests[..3]), Some(sigs[..3].to_vec()));

        cache.add(&pk(), &digests[3], sigs[3]);
        assert_eq!(cache.get_batch(&pk(), &digests), Some(sigs));
    }

    #[test]
    fn get_batch_misses_when_one_entry_expired() {
        let (cache, clock) = setup(10, Duration::from_secs(10));
        cache.add(&pk(), &digest(0), sig(0));
        clock.advance(Duration::from_secs(5));
        cache.add(&pk(), &digest(1), sig(1));
        clock.advance(Duration::from_secs(5));

        assert_eq!(cache.get_batch(&pk(), &[digest(0), digest(1)]), None);
        assert_eq!(cache.get(&pk(), &digest(1)), Some(sig(1)));
    }

    #[test]
    fn empty_batch_request_misses() {
        let (cache, _clock) = setup(10, Duration::from_secs(10));
        assert_eq!(cache.get_batch(&pk(), &[]), None);
    }
}
