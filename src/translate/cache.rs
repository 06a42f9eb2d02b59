//! In-memory LRU response cache with TTL.
//! Key: blake3 hash of (src_lang | tgt_lang | text), where text longer than
//! `MAX_KEY_TEXT_CHARS` is cut and marked first.
//! Defaults: 1000 entries, 24 hours from insertion.

use std::borrow::Cow;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use tracing::debug;

use super::LanguagePair;

pub const DEFAULT_CAPACITY: usize = 1000;
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 3600);

/// Longest source text, in characters, that enters a key unchanged.
pub const MAX_KEY_TEXT_CHARS: usize = 10_000;
const TRUNCATION_MARKER: &str = "...";

type CacheKey = [u8; 32];

struct CacheEntry {
    translated_text: String,
    inserted_at: Instant,
}

pub struct ResponseCache {
    inner: Mutex<LruCache<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN), DEFAULT_TTL)
    }
}

impl ResponseCache {
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Text as it participates in the key: unchanged, or its first
    /// `MAX_KEY_TEXT_CHARS` characters followed by a marker.
    pub fn key_text(text: &str) -> Cow<'_, str> {
        match text.char_indices().nth(MAX_KEY_TEXT_CHARS) {
            Some((cut, _)) => Cow::Owned(format!("{}{}", &text[..cut], TRUNCATION_MARKER)),
            None => Cow::Borrowed(text),
        }
    }

    fn compute_key(pair: &LanguagePair, text: &str) -> CacheKey {
        let mut hasher = blake3::Hasher::new();
        hasher.update(pair.source().as_bytes());
        hasher.update(b"|");
        hasher.update(pair.target().as_bytes());
        hasher.update(b"|");
        hasher.update(Self::key_text(text).as_bytes());
        *hasher.finalize().as_bytes()
    }

    /// Cached translation, or `None` if absent or expired.
    pub fn get(&self, pair: &LanguagePair, text: &str) -> Option<String> {
        let key = Self::compute_key(pair, text);
        let mut cache = self.inner.lock();
        if let Some(entry) = cache.get(&key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.translated_text.clone());
            }
            cache.pop(&key);
            debug!(%pair, "cache entry expired");
        }
        None
    }

    /// Store a translation. Empty translations are ignored.
    pub fn put(&self, pair: &LanguagePair, text: &str, translated_text: &str) {
        if translated_text.is_empty() {
            return;
        }
        let key = Self::compute_key(pair, text);
        self.inner.lock().put(
            key,
            CacheEntry {
                translated_text: translated_text.to_string(),
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        let mut cache = self.inner.lock();
        let dropped = cache.len();
        cache.clear();
        debug!(dropped, "cache cleared");
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
