//! Daily admission control for external reads and writes
//!
//! External calendar APIs and the storage layer impose hard daily quotas
//! whose violation degrades service for every user, so admission is checked
//! before every external call. The guard keeps two counters that reset on
//! the UTC calendar-day boundary; crossing a hard ceiling flips a
//! maintenance flag that denies that op kind until the next reset.
//!
//! The guard is an explicit injected instance shared via `Arc`, never
//! ambient global state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Serialize;
use slotwise_domain::QuotaConfig;
use tracing::{debug, warn};

use crate::time::{Clock, SystemClock};

const MILLIS_PER_DAY: u64 = 86_400_000;

/// Kind of external operation subject to admission control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Read,
    Write,
}

impl OpKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

/// Point-in-time view of quota state, surfaced by the health endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct QuotaUsage {
    pub reads: u64,
    pub writes: u64,
    pub read_ceiling: u64,
    pub write_ceiling: u64,
    pub read_maintenance: bool,
    pub write_maintenance: bool,
}

/// Daily read/write quota guard with atomic counters.
pub struct QuotaGuard<C: Clock = SystemClock> {
    config: QuotaConfig,
    clock: C,
    day_index: AtomicU64,
    reads: AtomicU64,
    writes: AtomicU64,
    read_maintenance: AtomicBool,
    write_maintenance: AtomicBool,
    read_warned: AtomicBool,
    write_warned: AtomicBool,
}

impl QuotaGuard<SystemClock> {
    #[must_use]
    pub fn new(config: QuotaConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> QuotaGuard<C> {
    pub fn with_clock(config: QuotaConfig, clock: C) -> Self {
        let day_index = AtomicU64::new(clock.millis_since_epoch() / MILLIS_PER_DAY);
        Self {
            config,
            clock,
            day_index,
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            read_maintenance: AtomicBool::new(false),
            write_maintenance: AtomicBool::new(false),
            read_warned: AtomicBool::new(false),
            write_warned: AtomicBool::new(false),
        }
    }

    /// Admits or denies one external operation of the given kind.
    ///
    /// Denial is terminal for the day: once the ceiling is reached the op
    /// kind stays in maintenance until the next day boundary.
    pub fn admit(&self, op: OpKind) -> bool {
        self.roll_day_if_needed();

        let (counter, ceiling) = match op {
            OpKind::Read => (&self.reads, self.config.read_ceiling),
            OpKind::Write => (&self.writes, self.config.write_ceiling),
        };

        let mut current = counter.load(Ordering::Acquire);
        loop {
            if current >= ceiling {
                if !self.maintenance_flag(op).swap(true, Ordering::AcqRel) {
                    warn!(
                        op = op.label(),
                        ceiling, "quota ceiling reached, entering maintenance for this op kind"
                    );
                }
                return false;
            }
            match counter.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        let used = current + 1;
        let warn_threshold = (ceiling as f64 * self.config.warn_ratio) as u64;
        if used >= warn_threshold && !self.warned_flag(op).swap(true, Ordering::AcqRel) {
            warn!(op = op.label(), used, ceiling, "quota usage crossed warn threshold");
        }
        true
    }

    /// True once the ceiling for the op kind has been crossed today.
    pub fn maintenance_active(&self, op: OpKind) -> bool {
        self.roll_day_if_needed();
        self.maintenance_flag(op).load(Ordering::Acquire)
    }

    /// Process-wide maintenance indicator: any op kind exhausted.
    pub fn any_maintenance(&self) -> bool {
        self.maintenance_active(OpKind::Read) || self.maintenance_active(OpKind::Write)
    }

    /// Snapshot for observability endpoints.
    pub fn usage(&self) -> QuotaUsage {
        self.roll_day_if_needed();
        QuotaUsage {
            reads: self.reads.load(Ordering::Acquire),
            writes: self.writes.load(Ordering::Acquire),
            read_ceiling: self.config.read_ceiling,
            write_ceiling: self.config.write_ceiling,
            read_maintenance: self.read_maintenance.load(Ordering::Acquire),
            write_maintenance: self.write_maintenance.load(Ordering::Acquire),
        }
    }

    fn maintenance_flag(&self, op: OpKind) -> &AtomicBool {
        match op {
            OpKind::Read => &self.read_maintenance,
            OpKind::Write => &self.write_maintenance,
        }
    }

    fn warned_flag(&self, op: OpKind) -> &AtomicBool {
        match op {
            OpKind::Read => &self.read_warned,
            OpKind::Write => &self.write_warned,
        }
    }

    // Counters are approximate for the single instant of the boundary swap;
    // admissions racing the reset land in one day or the other, never lost.
    fn roll_day_if_needed(&self) {
        let today = self.clock.millis_since_epoch() / MILLIS_PER_DAY;
        let seen = self.day_index.load(Ordering::Acquire);
        if today != seen
            && self
                .day_index
                .compare_exchange(seen, today, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        {
            self.reads.store(0, Ordering::Release);
            self.writes.store(0, Ordering::Release);
            self.read_maintenance.store(false, Ordering::Release);
            self.write_maintenance.store(false, Ordering::Release);
            self.read_warned.store(false, Ordering::Release);
            self.write_warned.store(false, Ordering::Release);
            debug!(day = today, "quota counters reset for new day");
        }
    }
}
