//! Application context - dependency injection container

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use slotwise_core::{AvailabilityEngine, GroupCoordinator, QuotaGuard};
use slotwise_domain::{Config, CoordinationConfig, Result, SlotwiseError};
use slotwise_infra::{
    AvailabilityCache, CalendarBusySource, LogNotifier, LoggingFinalizeHook, MemoryGroupStore,
    SchedulerError, SweepScheduler, SweepSchedulerConfig,
};

/// Application context - holds every wired service behind the routes.
///
/// One instance is built at startup and shared through the router state.
/// Concrete infra types stay visible here (cache, store) because the health
/// endpoint reads their counters; the engine and coordinator only ever see
/// the port trait objects.
pub struct AppContext {
    pub config: Config,
    pub quota: Arc<QuotaGuard>,
    pub slot_cache: Arc<AvailabilityCache>,
    pub engine: Arc<AvailabilityEngine>,
    pub store: Arc<MemoryGroupStore>,
    pub coordinator: Arc<GroupCoordinator>,

    // Expiry sweeper, present when enabled in config. Stopped on shutdown.
    sweeper: Option<Mutex<SweepScheduler>>,
}

impl AppContext {
    /// Build a context from the probed configuration (file + env overrides).
    pub async fn new() -> Result<Self> {
        let config = slotwise_infra::config::load()?;
        Self::new_with_config(config).await
    }

    /// Build a context from an explicit configuration.
    ///
    /// Starts the expiry sweeper when `coordination.sweep_enabled` is set;
    /// a sweeper that cannot start fails the whole context (fail-fast
    /// initialization).
    pub async fn new_with_config(config: Config) -> Result<Self> {
        let quota = Arc::new(QuotaGuard::new(config.quota.clone()));
        let slot_cache = Arc::new(AvailabilityCache::new(&config.cache));

        let source = Arc::new(CalendarBusySource::new(Arc::clone(&quota), &config));
        let engine = Arc::new(AvailabilityEngine::new(
            source,
            Arc::clone(&slot_cache),
            Arc::clone(&quota),
            config.engine.clone(),
        ));

        let store = Arc::new(MemoryGroupStore::new());
        let coordinator = Arc::new(GroupCoordinator::new(
            Arc::clone(&store),
            Arc::new(LogNotifier),
            Arc::new(LoggingFinalizeHook),
            Arc::clone(&quota),
            config.coordination.clone(),
        ));

        let sweeper = if config.coordination.sweep_enabled {
            let scheduler =
                create_sweep_scheduler(Arc::clone(&coordinator), &config.coordination).await?;
            Some(Mutex::new(scheduler))
        } else {
            None
        };

        Ok(Self { config, quota, slot_cache, engine, store, coordinator, sweeper })
    }

    /// Stop the expiry sweeper. Safe to call more than once; a context built
    /// with sweeping disabled returns immediately.
    pub async fn shutdown(&self) -> Result<()> {
        if let Some(sweeper) = &self.sweeper {
            let mut guard = sweeper.lock().await;
            match guard.stop().await {
                Ok(()) | Err(SchedulerError::NotRunning) => {}
                Err(err) => {
                    tracing::error!(error = %err, "failed to stop SweepScheduler");
                    return Err(SlotwiseError::Internal(format!(
                        "failed to stop SweepScheduler: {err}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Whether the expiry sweeper was wired at construction.
    pub fn sweeping(&self) -> bool {
        self.sweeper.is_some()
    }
}

async fn create_sweep_scheduler(
    coordinator: Arc<GroupCoordinator>,
    config: &CoordinationConfig,
) -> Result<SweepScheduler> {
    let mut scheduler =
        SweepScheduler::with_config(SweepSchedulerConfig::from(config), coordinator);

    // Start the scheduler with timeout (fail-fast initialization)
    let start_timeout = Duration::from_secs(10);
    tokio::time::timeout(start_timeout, scheduler.start())
        .await
        .map_err(|_| {
            tracing::error!(timeout_secs = 10, "SweepScheduler start timed out");
            SlotwiseError::Internal("SweepScheduler start timed out after 10s".into())
        })?
        .map_err(|err| {
            tracing::error!(error = %err, "failed to start SweepScheduler");
            SlotwiseError::Internal(format!("failed to start SweepScheduler: {err}"))
        })?;

    Ok(scheduler)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> Config {
        let mut config = Config::default();
        config.coordination.sweep_enabled = false;
        config
    }

    #[tokio::test]
    async fn context_without_sweeper_shuts_down_immediately() {
        let ctx = AppContext::new_with_config(quiet_config()).await.unwrap();
        assert!(!ctx.sweeping());
        ctx.shutdown().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn context_starts_and_stops_the_sweeper() {
        let ctx = AppContext::new_with_config(Config::default()).await.unwrap();
        assert!(ctx.sweeping());
        ctx.shutdown().await.unwrap();
        // Second shutdown hits the NotRunning branch and stays quiet.
        ctx.shutdown().await.unwrap();
    }
}
