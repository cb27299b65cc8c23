//! Busy-interval source adapter with quota admission and snapshot caching

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use sha2::{Digest, Sha256};
use slotwise_core::{BusyFetch, BusyIntervalSource, OpKind, QuotaGuard};
use slotwise_domain::{CalendarCredential, Config, ProviderKind};
use tracing::{debug, warn};

use crate::cache::BusySnapshotCache;
use crate::providers::detect::detect_provider;
use crate::providers::google::GoogleBusyClient;
use crate::providers::microsoft::MicrosoftBusyClient;

/// Fetches busy intervals from whichever backend a credential resolves to.
///
/// Every network call passes quota admission first; identical recent windows
/// are served from the snapshot cache without consuming quota. Provider
/// failures and timeouts surface as unreadable fetches rather than errors,
/// so one participant cannot sink the whole request.
pub struct CalendarBusySource {
    google: GoogleBusyClient,
    microsoft: MicrosoftBusyClient,
    snapshots: BusySnapshotCache,
    quota: Arc<QuotaGuard>,
    fetch_timeout: Duration,
}

impl CalendarBusySource {
    pub fn new(quota: Arc<QuotaGuard>, config: &Config) -> Self {
        let client = Client::new();
        Self {
            google: GoogleBusyClient::new(client.clone()),
            microsoft: MicrosoftBusyClient::new(client),
            snapshots: BusySnapshotCache::new(&config.cache),
            quota,
            fetch_timeout: Duration::from_secs(config.engine.fetch_timeout_secs),
        }
    }

    /// Points both provider clients at custom API bases, used by tests that
    /// run against a local mock server.
    pub fn with_base_urls(
        quota: Arc<QuotaGuard>,
        config: &Config,
        google_base: impl Into<String>,
        microsoft_base: impl Into<String>,
    ) -> Self {
        let client = Client::new();
        Self {
            google: GoogleBusyClient::with_base_url(client.clone(), google_base),
            microsoft: MicrosoftBusyClient::with_base_url(client, microsoft_base),
            snapshots: BusySnapshotCache::new(&config.cache),
            quota,
            fetch_timeout: Duration::from_secs(config.engine.fetch_timeout_secs),
        }
    }

    /// Snapshot key from the token digest and window bounds. The raw token
    /// never leaves the hasher.
    fn snapshot_key(
        credential: &CalendarCredential,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> String {
        let mut hasher = Sha256::new();
        hasher.update(credential.access_token.as_bytes());
        let digest = hasher.finalize();
        format!(
            "{}:{}:{}",
            hex::encode(&digest[..8]),
            window_start.timestamp(),
            window_end.timestamp()
        )
    }
}

#[async_trait]
impl BusyIntervalSource for CalendarBusySource {
    async fn fetch_busy(
        &self,
        credential: &CalendarCredential,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> BusyFetch {
        let key = Self::snapshot_key(credential, window_start, window_end);
        if let Some(intervals) = self.snapshots.get(&key) {
            debug!(intervals = intervals.len(), "busy snapshot hit");
            return BusyFetch::success(intervals);
        }

        if !self.quota.admit(OpKind::Read) {
            warn!("read quota exhausted, reporting calendar unreadable");
            return BusyFetch::unreadable();
        }

        let provider = detect_provider(credential);
        let call = async {
            match provider {
                ProviderKind::Google => {
                    self.google.fetch_busy(credential, window_start, window_end).await
                }
                ProviderKind::Microsoft => {
                    self.microsoft.fetch_busy(credential, window_start, window_end).await
                }
            }
        };

        match tokio::time::timeout(self.fetch_timeout, call).await {
            Ok(Ok(intervals)) => {
                debug!(provider = %provider, intervals = intervals.len(), "busy fetch succeeded");
                self.snapshots.put(key, intervals.clone());
                BusyFetch::success(intervals)
            }
            Ok(Err(err)) => {
                warn!(provider = %provider, error = %err, "busy fetch failed");
                BusyFetch::unreadable()
            }
            Err(_) => {
                warn!(
                    provider = %provider,
                    timeout_secs = self.fetch_timeout.as_secs(),
                    "busy fetch timed out"
                );
                BusyFetch::unreadable()
            }
        }
    }
}
