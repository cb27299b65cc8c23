//! Availability request, busy-interval, and candidate-slot types
//!
//! Everything the availability engine consumes or produces. All timestamps
//! are UTC; day windows are naive wall-clock bounds applied per date.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    MAX_PARTICIPANTS, MAX_SLOT_DURATION_MINUTES, MIN_SLOT_DURATION_MINUTES,
};
use crate::errors::{Result, SlotwiseError};
use crate::impl_status_conversions;

/// Calendar backend a credential or busy interval belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Google,
    Microsoft,
}

impl_status_conversions!(ProviderKind {
    Google => "google",
    Microsoft => "microsoft",
});

/// Per-participant calendar credential.
///
/// The token is opaque to the engine; provider resolution happens at the
/// adapter boundary. Debug output redacts the token so request logging can
/// never leak it.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct CalendarCredential {
    pub access_token: String,
    pub provider_hint: Option<ProviderKind>,
    pub email: Option<String>,
}

impl std::fmt::Debug for CalendarCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalendarCredential")
            .field("access_token", &"<redacted>")
            .field("provider_hint", &self.provider_hint)
            .field("email", &self.email)
            .finish()
    }
}

/// A time range during which a participant is unavailable.
///
/// Half-open interval `[start, end)`, immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub source_participant_index: usize,
    pub provider_kind: ProviderKind,
}

impl BusyInterval {
    /// Builds an interval, discarding empty or inverted ranges.
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        source_participant_index: usize,
        provider_kind: ProviderKind,
    ) -> Option<Self> {
        if end <= start {
            return None;
        }
        Some(Self { start, end, source_participant_index, provider_kind })
    }

    /// Half-open overlap test against a candidate range.
    ///
    /// A candidate conflicts iff `slot_start < self.end && slot_end > self.start`.
    /// Slots that end exactly at `start` or begin exactly at `end` do not
    /// conflict.
    #[must_use]
    pub fn overlaps(&self, slot_start: DateTime<Utc>, slot_end: DateTime<Utc>) -> bool {
        slot_start < self.end && slot_end > self.start
    }
}

/// Availability computation request.
#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityRequest {
    pub participant_credentials: Vec<CalendarCredential>,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub slot_duration_minutes: i64,
    pub day_window_start: NaiveTime,
    pub day_window_end: NaiveTime,
    pub is_multi_day: bool,
    /// Per-request override of the configured weekend policy.
    pub include_weekends: Option<bool>,
}

impl AvailabilityRequest {
    /// Rejects malformed requests before any external call is made.
    pub fn validate(&self) -> Result<()> {
        if self.participant_credentials.is_empty() {
            return Err(SlotwiseError::NoParticipants);
        }
        if self.participant_credentials.len() > MAX_PARTICIPANTS {
            return Err(SlotwiseError::TooManyParticipants(self.participant_credentials.len()));
        }
        if self.slot_duration_minutes < MIN_SLOT_DURATION_MINUTES
            || self.slot_duration_minutes > MAX_SLOT_DURATION_MINUTES
        {
            return Err(SlotwiseError::InvalidDuration(self.slot_duration_minutes));
        }
        if self.window_start >= self.window_end {
            return Err(SlotwiseError::InvalidRequest(
                "window start must precede window end".to_string(),
            ));
        }
        if self.day_window_start >= self.day_window_end {
            return Err(SlotwiseError::InvalidRequest(
                "day window start must precede day window end".to_string(),
            ));
        }
        Ok(())
    }

    /// Minutes available inside one working day.
    #[must_use]
    pub fn daily_capacity_minutes(&self) -> i64 {
        (self.day_window_end - self.day_window_start).num_minutes()
    }

    /// Request override wins over the configured default.
    #[must_use]
    pub fn weekends_included(&self, policy_default: bool) -> bool {
        self.include_weekends.unwrap_or(policy_default)
    }
}

/// A conflict-free time range satisfying the requested duration.
///
/// Produced, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub date: NaiveDate,
    pub weekday: String,
}

impl CandidateSlot {
    /// Derives date and weekday label from the start timestamp.
    #[must_use]
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let date = start.date_naive();
        let weekday = start.weekday().to_string();
        Self { start, end, date, weekday }
    }
}

/// Degradation and provenance details returned with every result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityMetadata {
    pub successful_calendars: usize,
    pub total_participants: usize,
    pub busy_events_considered: usize,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub cached: bool,
}

/// Computed slots plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub slots: Vec<CandidateSlot>,
    pub metadata: AvailabilityMetadata,
}
