//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Availability request bounds
pub const MAX_PARTICIPANTS: usize = 50;
pub const MIN_SLOT_DURATION_MINUTES: i64 = 15;
pub const MAX_SLOT_DURATION_MINUTES: i64 = 480;

// Slot generation
pub const SLOT_GRANULARITY_MINUTES: i64 = 15;
pub const MAX_CANDIDATE_SLOTS: usize = 100;

// Provider fetch behaviour
pub const PROVIDER_FETCH_TIMEOUT_SECS: u64 = 10;
pub const FETCH_STAGGER_MS: u64 = 150;

// Result cache TTLs
pub const SLOT_RESULT_TTL_SECS: u64 = 180;
pub const BUSY_SNAPSHOT_TTL_SECS: u64 = 420;
pub const CACHE_MAX_ENTRIES: u64 = 2048;

// Daily external-call quotas
pub const READ_QUOTA_CEILING: u64 = 50_000;
pub const WRITE_QUOTA_CEILING: u64 = 20_000;
pub const QUOTA_WARN_RATIO: f64 = 0.8;

// Group coordination
pub const INVITATION_TTL_DAYS: i64 = 14;
pub const DEFAULT_SWEEP_CRON: &str = "0 0 * * * *";

// HTTP server
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
