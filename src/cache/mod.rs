//! In-memory result cache with TTL expiry, tag invalidation and an LRU cap.

pub mod fingerprint;

pub use fingerprint::{analysis_key, build_key, fingerprint};

use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use lru::LruCache;
use serde::Serialize;

use crate::config::CacheSettings;
use crate::models::AnalysisResult;

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "sensory_pulse::cache";

use crate::log_debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

struct CacheEntry {
    value: AnalysisResult,
    tags: BTreeSet<String>,
    expires_at: Instant,
}

struct CacheInner {
    entries: LruCache<String, CacheEntry>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl CacheInner {
    /// Pop every entry matching `predicate`, returning how many went.
    fn remove_where(&mut self, predicate: impl Fn(&CacheEntry) -> bool) -> usize {
        let doomed: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| predicate(entry))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            self.entries.pop(key);
        }
        doomed.len()
    }
}

/// Shared by `Arc` between hosts. Each operation holds the lock for its whole
/// duration.
pub struct AnalysisCache {
    inner: Mutex<CacheInner>,
    ttl: Duration,
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::from_settings(&CacheSettings::default())
    }
}

impl AnalysisCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(CacheInner {
                entries: LruCache::new(capacity),
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
            ttl,
        }
    }

    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(Duration::from_secs(settings.ttl_secs), settings.max_entries)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &str) -> Option<AnalysisResult> {
        self.get_at(key, Instant::now())
    }

    /// Lookup as of `now`. An expired entry is removed and counts as a miss.
    pub fn get_at(&self, key: &str, now: Instant) -> Option<AnalysisResult> {
        let mut inner = self.lock();

        if let Some(entry) = inner.entries.get(key) {
            if entry.expires_at > now {
                let value = entry.value.clone();
                inner.hits += 1;
                return Some(value);
            }
            inner.entries.pop(key);
            log_debug!("dropped expired entry {key}");
        }
        inner.misses += 1;
        None
    }

    pub fn set<I, S>(&self, key: impl Into<String>, value: AnalysisResult, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_at(key, value, tags, Instant::now());
    }

    /// Insert or overwrite as of `now`, evicting the least recently used
    /// entry when a new key would exceed the cap.
    pub fn set_at<I, S>(&self, key: impl Into<String>, value: AnalysisResult, tags: I, now: Instant)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = key.into();
        let entry = CacheEntry {
            value,
            tags: tags.into_iter().map(Into::into).collect(),
            expires_at: now + self.ttl,
        };

        let mut inner = self.lock();
        if let Some((displaced, _)) = inner.entries.push(key.clone(), entry) {
            if displaced != key {
                inner.evictions += 1;
                log_debug!("evicted least recently used entry {displaced}");
            }
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.has_at(key, Instant::now())
    }

    /// Presence check that neither refreshes recency nor counts as a hit.
    pub fn has_at(&self, key: &str, now: Instant) -> bool {
        let mut inner = self.lock();
        match inner.entries.peek(key).map(|entry| entry.expires_at > now) {
            Some(true) => true,
            Some(false) => {
                inner.entries.pop(key);
                false
            }
            None => false,
        }
    }

    /// Remove every entry carrying `tag`, expired or not. Returns how many
    /// were removed.
    pub fn invalidate_by_tag(&self, tag: &str) -> usize {
        let removed = self.lock().remove_where(|entry| entry.tags.contains(tag));
        log_debug!("invalidated {removed} entries tagged {tag}");
        removed
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn prune_expired(&self) -> usize {
        self.prune_expired_at(Instant::now())
    }

    pub fn prune_expired_at(&self, now: Instant) -> usize {
        self.lock().remove_where(|entry| entry.expires_at <= now)
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            entries: inner.entries.len(),
        }
    }

    /// A panic while holding the lock cannot leave the map half-updated, so a
    /// poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
