//! Expiry sweep scheduler
//!
//! Cron-driven scheduler that periodically asks the coordinator to retire
//! expired invitations and prune abandoned groups. Join handles are tracked,
//! cancellation is explicit, and every asynchronous operation is wrapped in
//! a timeout.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use slotwise_core::GroupCoordinator;
use slotwise_domain::CoordinationConfig;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Configuration for the sweep scheduler.
#[derive(Debug, Clone)]
pub struct SweepSchedulerConfig {
    /// Cron expression describing the execution schedule.
    pub cron_expression: String,
    /// Timeout applied to a single sweep execution.
    pub job_timeout: Duration,
    /// Timeout for starting the underlying scheduler.
    pub start_timeout: Duration,
    /// Timeout for stopping the scheduler.
    pub stop_timeout: Duration,
    /// Timeout for awaiting the monitor task join handle.
    pub join_timeout: Duration,
}

impl Default for SweepSchedulerConfig {
    fn default() -> Self {
        Self {
            cron_expression: "0 0 * * * *".into(), // top of every hour
            job_timeout: Duration::from_secs(300),
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
            join_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&CoordinationConfig> for SweepSchedulerConfig {
    fn from(config: &CoordinationConfig) -> Self {
        Self { cron_expression: config.sweep_cron.clone(), ..Default::default() }
    }
}

/// Expiry sweep scheduler with explicit lifecycle management.
pub struct SweepScheduler {
    scheduler: Option<JobScheduler>,
    config: SweepSchedulerConfig,
    monitor_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
    coordinator: Arc<GroupCoordinator>,
}

impl SweepScheduler {
    /// Create a scheduler with the default timeouts.
    pub fn new(cron_expression: String, coordinator: Arc<GroupCoordinator>) -> Self {
        let config = SweepSchedulerConfig { cron_expression, ..Default::default() };
        Self::with_config(config, coordinator)
    }

    /// Create a scheduler with a custom configuration.
    pub fn with_config(config: SweepSchedulerConfig, coordinator: Arc<GroupCoordinator>) -> Self {
        Self {
            scheduler: None,
            config,
            monitor_handle: None,
            cancellation: CancellationToken::new(),
            coordinator,
        }
    }

    /// Start the scheduler, spawning the monitoring task.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.cancellation = CancellationToken::new();

        let scheduler_instance = self.build_scheduler().await?;
        let start_timeout = self.config.start_timeout;

        tokio::time::timeout(start_timeout, scheduler_instance.start())
            .await
            .map_err(|_| SchedulerError::Timeout { seconds: start_timeout.as_secs() })?
            .map_err(|e| SchedulerError::StartFailed(e.to_string()))?;

        self.scheduler = Some(scheduler_instance);

        let cancel = self.cancellation.clone();
        let handle = tokio::spawn(async move {
            Self::monitor_task(cancel).await;
        });

        self.monitor_handle = Some(handle);
        info!(cron = %self.config.cron_expression, "Sweep scheduler started");
        Ok(())
    }

    /// Stop the scheduler and wait for the monitor task to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        self.cancellation.cancel();

        let mut scheduler = match self.scheduler.take() {
            Some(scheduler) => scheduler,
            None => return Err(SchedulerError::NotRunning),
        };

        let stop_timeout = self.config.stop_timeout;
        tokio::time::timeout(stop_timeout, async move { scheduler.shutdown().await })
            .await
            .map_err(|_| SchedulerError::Timeout { seconds: stop_timeout.as_secs() })?
            .map_err(|e| SchedulerError::StopFailed(e.to_string()))?;

        if let Some(handle) = self.monitor_handle.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|_| SchedulerError::Timeout { seconds: join_timeout.as_secs() })?
                .map_err(|e| SchedulerError::TaskJoinFailed(e.to_string()))?;
        }

        info!("Sweep scheduler stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    /// Returns true when a scheduler instance is active.
    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    async fn build_scheduler(&self) -> SchedulerResult<JobScheduler> {
        let scheduler =
            JobScheduler::new().await.map_err(|e| SchedulerError::CreationFailed(e.to_string()))?;

        let cron_expr = self.config.cron_expression.clone();
        let coordinator = self.coordinator.clone();
        let job_timeout = self.config.job_timeout;

        let job_definition = Job::new_async(cron_expr.as_str(), move |_id, _lock| {
            let coordinator = coordinator.clone();

            Box::pin(async move {
                let started = Instant::now();

                match tokio::time::timeout(job_timeout, coordinator.sweep_expired(Utc::now()))
                    .await
                {
                    Ok(Ok(totals)) => {
                        debug!(
                            groups_examined = totals.groups_examined,
                            invitations_removed = totals.invitations_removed,
                            memberships_removed = totals.memberships_removed,
                            groups_pruned = totals.groups_pruned,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "Expiry sweep finished"
                        );
                    }
                    Ok(Err(err)) => {
                        error!(error = ?err, "Expiry sweep failed");
                    }
                    Err(_) => {
                        warn!(timeout_secs = job_timeout.as_secs(), "Expiry sweep timed out");
                    }
                }
            })
        })
        .map_err(|e| SchedulerError::JobRegistrationFailed(e.to_string()))?;

        let job_id = job_definition.guid();
        scheduler
            .add(job_definition)
            .await
            .map_err(|e| SchedulerError::JobRegistrationFailed(e.to_string()))?;

        debug!(cron = %self.config.cron_expression, job_id = %job_id, "Registered sweep job");
        Ok(scheduler)
    }

    async fn monitor_task(cancel: CancellationToken) {
        cancel.cancelled().await;
        debug!("Sweep scheduler monitor cancelled");
    }
}

impl Drop for SweepScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("SweepScheduler dropped while running; cancelling tasks");
            self.cancellation.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use slotwise_core::QuotaGuard;
    use slotwise_domain::QuotaConfig;

    use crate::hooks::LoggingFinalizeHook;
    use crate::notify::LogNotifier;
    use crate::store::MemoryGroupStore;

    use super::*;

    fn coordinator() -> Arc<GroupCoordinator> {
        let quota = Arc::new(QuotaGuard::new(QuotaConfig::default()));
        Arc::new(GroupCoordinator::new(
            Arc::new(MemoryGroupStore::new()),
            Arc::new(LogNotifier),
            Arc::new(LoggingFinalizeHook),
            quota,
            CoordinationConfig::default(),
        ))
    }

    fn fast_config() -> SweepSchedulerConfig {
        SweepSchedulerConfig {
            cron_expression: "* * * * * *".into(), // every second
            job_timeout: Duration::from_secs(2),
            ..Default::default()
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn lifecycle_runs_successfully() {
        let mut scheduler = SweepScheduler::with_config(fast_config(), coordinator());

        scheduler.start().await.expect("start succeeds");
        assert!(scheduler.is_running());
        tokio::time::sleep(Duration::from_millis(1200)).await;
        scheduler.stop().await.expect("stop succeeds");

        assert!(!scheduler.is_running());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn double_start_is_rejected() {
        let mut scheduler = SweepScheduler::with_config(fast_config(), coordinator());

        scheduler.start().await.expect("first start");
        let err = scheduler.start().await.expect_err("second start fails");
        assert!(matches!(err, SchedulerError::AlreadyRunning));
        scheduler.stop().await.expect("stop succeeds");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stop_without_start_is_rejected() {
        let mut scheduler = SweepScheduler::with_config(fast_config(), coordinator());
        let err = scheduler.stop().await.expect_err("stop fails");
        assert!(matches!(err, SchedulerError::NotRunning));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn restart_after_stop_succeeds() {
        let mut scheduler = SweepScheduler::with_config(fast_config(), coordinator());

        scheduler.start().await.expect("start succeeds");
        scheduler.stop().await.expect("stop succeeds");
        assert!(!scheduler.is_running());

        scheduler.start().await.expect("start again");
        scheduler.stop().await.expect("stop again");
    }
}
