//! # Slotwise Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - Calendar provider HTTP clients (Google, Microsoft)
//! - The busy-interval source adapter with quota and snapshot caching
//! - Slot result cache backed by moka
//! - In-memory group store
//! - Notification, finalize-hook, and sweep-scheduler adapters
//!
//! ## Architecture
//! - Implements traits defined in `slotwise-core`
//! - Depends on `slotwise-domain` and `slotwise-core`
//! - Contains all "impure" code (I/O, clocks, caches)

pub mod cache;
pub mod config;
pub mod errors;
pub mod hooks;
pub mod notify;
pub mod providers;
pub mod scheduling;
pub mod store;

// Re-export commonly used items
pub use cache::{AvailabilityCache, BusySnapshotCache, CacheStats};
pub use errors::InfraError;
pub use hooks::LoggingFinalizeHook;
pub use notify::LogNotifier;
pub use providers::CalendarBusySource;
pub use scheduling::{SchedulerError, SweepScheduler, SweepSchedulerConfig};
pub use store::MemoryGroupStore;
