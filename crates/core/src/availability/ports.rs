//! Availability port interfaces

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use slotwise_domain::{AvailabilityResponse, BusyInterval, CalendarCredential};

use super::fingerprint::RequestFingerprint;

/// Outcome of reading one participant's calendar.
///
/// `ok = false` means "this participant could not be read" (timeout, auth
/// failure, malformed payload, or quota denial); the intervals are then
/// empty and the engine degrades instead of aborting.
#[derive(Debug, Clone)]
pub struct BusyFetch {
    pub intervals: Vec<BusyInterval>,
    pub ok: bool,
}

impl BusyFetch {
    #[must_use]
    pub fn success(intervals: Vec<BusyInterval>) -> Self {
        Self { intervals, ok: true }
    }

    #[must_use]
    pub fn unreadable() -> Self {
        Self { intervals: Vec::new(), ok: false }
    }
}

/// Trait for fetching busy intervals from heterogeneous calendar backends
///
/// Implementations own provider detection, the per-call timeout budget, and
/// quota admission; they never propagate an error across this boundary.
#[async_trait]
pub trait BusyIntervalSource: Send + Sync {
    async fn fetch_busy(
        &self,
        credential: &CalendarCredential,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> BusyFetch;
}

/// Short-TTL memoization of computed availability results
///
/// Keyed by the normalized request fingerprint; lookups and stores are
/// in-memory and must never block on I/O.
pub trait SlotResultCache: Send + Sync {
    fn get(&self, fingerprint: &RequestFingerprint) -> Option<AvailabilityResponse>;
    fn put(&self, fingerprint: &RequestFingerprint, response: AvailabilityResponse);
}
