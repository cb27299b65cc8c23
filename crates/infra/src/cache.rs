//! Result caching backed by moka
//!
//! Two caches live here. `AvailabilityCache` implements the engine's slot
//! result port and is keyed by request fingerprint. `BusySnapshotCache`
//! holds short-lived per-credential busy intervals so overlapping requests
//! for the same window do not refetch from the provider.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use moka::sync::Cache;
use serde::Serialize;
use slotwise_core::{RequestFingerprint, SlotResultCache};
use slotwise_domain::{AvailabilityResponse, BusyInterval, CacheConfig};
use tracing::{debug, info, trace};

/// Point-in-time counters, exposed through the health endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheStats {
    pub entries: u64,
    pub hits: usize,
    pub misses: usize,
}

impl CacheStats {
    /// Hit rate in `[0, 1]`; 0 when nothing has been looked up yet.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

/// Slot result cache keyed by request fingerprint.
pub struct AvailabilityCache {
    entries: Cache<RequestFingerprint, AvailabilityResponse>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl AvailabilityCache {
    pub fn new(config: &CacheConfig) -> Self {
        info!(
            ttl_secs = config.slot_ttl_secs,
            max_entries = config.max_entries,
            "initializing slot result cache"
        );
        Self {
            entries: Cache::builder()
                .time_to_live(Duration::from_secs(config.slot_ttl_secs))
                .max_capacity(config.max_entries)
                .build(),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Counter snapshot. Flushes pending maintenance first so the entry
    /// count reflects completed insertions and evictions.
    pub fn stats(&self) -> CacheStats {
        self.entries.run_pending_tasks();
        CacheStats {
            entries: self.entries.entry_count(),
            hits: self.hits.load(Ordering::SeqCst),
            misses: self.misses.load(Ordering::SeqCst),
        }
    }
}

impl SlotResultCache for AvailabilityCache {
    fn get(&self, fingerprint: &RequestFingerprint) -> Option<AvailabilityResponse> {
        match self.entries.get(fingerprint) {
            Some(response) => {
                self.hits.fetch_add(1, Ordering::SeqCst);
                trace!(slots = response.slots.len(), "slot cache hit");
                Some(response)
            }
            None => {
                self.misses.fetch_add(1, Ordering::SeqCst);
                trace!("slot cache miss");
                None
            }
        }
    }

    fn put(&self, fingerprint: &RequestFingerprint, response: AvailabilityResponse) {
        debug!(slots = response.slots.len(), "caching slot result");
        self.entries.insert(fingerprint.clone(), response);
    }
}

/// Short-lived busy-interval snapshots keyed by credential digest and window.
pub struct BusySnapshotCache {
    entries: Cache<String, Vec<BusyInterval>>,
}

impl BusySnapshotCache {
    pub fn new(config: &CacheConfig) -> Self {
        info!(
            ttl_secs = config.busy_ttl_secs,
            max_entries = config.max_entries,
            "initializing busy snapshot cache"
        );
        Self {
            entries: Cache::builder()
                .time_to_live(Duration::from_secs(config.busy_ttl_secs))
                .max_capacity(config.max_entries)
                .build(),
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<BusyInterval>> {
        self.entries.get(key)
    }

    pub fn put(&self, key: String, intervals: Vec<BusyInterval>) {
        self.entries.insert(key, intervals);
    }
}
