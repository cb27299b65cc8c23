//! Availability engine
//!
//! Orchestrates one `compute_availability` pass: validation, cache lookup,
//! quota gate, staggered concurrent busy fetches, pooling, and candidate
//! generation. Provider access goes through the [`BusyIntervalSource`] port;
//! the engine never sees HTTP.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use slotwise_domain::{
    AvailabilityMetadata, AvailabilityRequest, AvailabilityResponse, BusyInterval, EngineConfig,
    Result, SlotwiseError,
};

use crate::availability::fingerprint::RequestFingerprint;
use crate::availability::ports::{BusyIntervalSource, SlotResultCache};
use crate::availability::slots;
use crate::quota::{OpKind, QuotaGuard};

pub struct AvailabilityEngine {
    source: Arc<dyn BusyIntervalSource>,
    cache: Arc<dyn SlotResultCache>,
    quota: Arc<QuotaGuard>,
    settings: EngineConfig,
}

impl AvailabilityEngine {
    pub fn new(
        source: Arc<dyn BusyIntervalSource>,
        cache: Arc<dyn SlotResultCache>,
        quota: Arc<QuotaGuard>,
        settings: EngineConfig,
    ) -> Self {
        Self { source, cache, quota, settings }
    }

    /// Computes conflict-free candidate slots for every participant.
    ///
    /// Degrades rather than fails: unreadable calendars are skipped and
    /// reported through the response metadata. Only zero readable calendars
    /// or an exhausted read quota abort the request.
    #[instrument(skip(self, request), fields(participants = request.participant_credentials.len()))]
    pub async fn compute_availability(
        &self,
        request: &AvailabilityRequest,
    ) -> Result<AvailabilityResponse> {
        request.validate()?;
        let include_weekends = request.weekends_included(self.settings.include_weekends);
        let fingerprint = RequestFingerprint::of(request, include_weekends);

        if let Some(mut hit) = self.cache.get(&fingerprint) {
            debug!(fingerprint = %fingerprint, "serving availability from cache");
            hit.metadata.cached = true;
            return Ok(hit);
        }

        // Fail fast before fanning out; individual fetches re-check on
        // their own admissions.
        if self.quota.maintenance_active(OpKind::Read) {
            return Err(SlotwiseError::QuotaExhausted(
                "daily read ceiling reached".to_string(),
            ));
        }

        let (pool, successful) = self.fetch_all(request).await;
        if successful == 0 {
            warn!(
                participants = request.participant_credentials.len(),
                "no participant calendar could be read"
            );
            return Err(SlotwiseError::AllProvidersFailed);
        }

        let mut pool = pool;
        pool.sort_by_key(|interval| interval.start);

        let candidates = slots::generate_candidates(request, &pool, include_weekends);
        debug!(
            slots = candidates.len(),
            busy = pool.len(),
            successful,
            "availability computed"
        );

        let response = AvailabilityResponse {
            slots: candidates,
            metadata: AvailabilityMetadata {
                successful_calendars: successful,
                total_participants: request.participant_credentials.len(),
                busy_events_considered: pool.len(),
                window_start: request.window_start,
                window_end: request.window_end,
                cached: false,
            },
        };
        self.cache.put(&fingerprint, response.clone());
        Ok(response)
    }

    /// Fans out one fetch per participant, staggered to avoid a thundering
    /// herd against provider endpoints. Returns the pooled intervals tagged
    /// with their participant index plus the readable-calendar count.
    async fn fetch_all(&self, request: &AvailabilityRequest) -> (Vec<BusyInterval>, usize) {
        let stagger = std::time::Duration::from_millis(self.settings.fetch_stagger_ms);
        let mut tasks = JoinSet::new();

        for (index, credential) in request.participant_credentials.iter().enumerate() {
            let source = Arc::clone(&self.source);
            let credential = credential.clone();
            let window_start = request.window_start;
            let window_end = request.window_end;
            tasks.spawn(async move {
                tokio::time::sleep(stagger * index as u32).await;
                let fetch = source.fetch_busy(&credential, window_start, window_end).await;
                (index, fetch)
            });
        }

        let mut pool = Vec::new();
        let mut successful = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, fetch)) if fetch.ok => {
                    successful += 1;
                    pool.extend(fetch.intervals.into_iter().map(|mut interval| {
                        interval.source_participant_index = index;
                        interval
                    }));
                }
                Ok((index, _)) => {
                    warn!(participant = index, "participant calendar unreadable, degrading");
                }
                Err(error) => {
                    warn!(%error, "busy fetch task failed");
                }
            }
        }
        (pool, successful)
    }
}
