//! # Slotwise Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The availability engine and slot generation
//! - The group coordination state machine
//! - Quota admission control
//! - Port/adapter interfaces (traits)
//!
//! ## Architecture Principles
//! - Only depends on `slotwise-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod availability;
pub mod coordination;
pub mod quota;
pub mod time;

// Re-export specific items to avoid ambiguity
pub use availability::engine::AvailabilityEngine;
pub use availability::fingerprint::RequestFingerprint;
pub use availability::ports::{BusyFetch, BusyIntervalSource, SlotResultCache};
pub use coordination::coordinator::{GroupCoordinator, SweepTotals};
pub use coordination::ports::{FinalizeHook, GroupStore, Notifier};
pub use quota::{OpKind, QuotaGuard, QuotaUsage};
pub use time::{Clock, MockClock, SystemClock};
