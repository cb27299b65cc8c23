//! Request fingerprinting for the result cache
//!
//! The fingerprint covers the normalized request shape only, never raw
//! credentials: structurally identical requests from different callers hash
//! to the same key, which is what makes the cache worth having.

use chrono::Timelike;
use sha2::{Digest, Sha256};
use slotwise_domain::AvailabilityRequest;

/// Stable hash of a request's normalized shape, used as a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestFingerprint(String);

impl RequestFingerprint {
    /// Hashes participant count, window, duration, working hours, and the
    /// multi-day / weekend flags. `include_weekends` is the effective value
    /// after applying the policy default.
    #[must_use]
    pub fn of(request: &AvailabilityRequest, include_weekends: bool) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(request.participant_credentials.len().to_le_bytes());
        hasher.update(request.window_start.timestamp().to_le_bytes());
        hasher.update(request.window_end.timestamp().to_le_bytes());
        hasher.update(request.slot_duration_minutes.to_le_bytes());
        hasher.update(request.day_window_start.num_seconds_from_midnight().to_le_bytes());
        hasher.update(request.day_window_end.num_seconds_from_midnight().to_le_bytes());
        hasher.update([u8::from(request.is_multi_day), u8::from(include_weekends)]);
        Self(hex::encode(hasher.finalize()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
