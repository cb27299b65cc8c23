//! Liveness and usage reporting

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use slotwise_core::{GroupStore, QuotaUsage};
use slotwise_infra::CacheStats;

use crate::context::AppContext;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuotaDto {
    reads: u64,
    writes: u64,
    read_ceiling: u64,
    write_ceiling: u64,
    read_maintenance: bool,
    write_maintenance: bool,
}

impl From<QuotaUsage> for QuotaDto {
    fn from(usage: QuotaUsage) -> Self {
        Self {
            reads: usage.reads,
            writes: usage.writes,
            read_ceiling: usage.read_ceiling,
            write_ceiling: usage.write_ceiling,
            read_maintenance: usage.read_maintenance,
            write_maintenance: usage.write_maintenance,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CacheDto {
    entries: u64,
    hits: usize,
    misses: usize,
    hit_rate: f64,
}

impl From<CacheStats> for CacheDto {
    fn from(stats: CacheStats) -> Self {
        Self {
            entries: stats.entries,
            hits: stats.hits,
            misses: stats.misses,
            hit_rate: stats.hit_rate(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    groups: usize,
    quota: QuotaDto,
    cache: CacheDto,
}

async fn health(State(ctx): State<Arc<AppContext>>) -> Result<Json<HealthResponse>, ApiError> {
    let quota = ctx.quota.usage();
    let status = if quota.read_maintenance || quota.write_maintenance { "degraded" } else { "ok" };
    let groups = ctx.store.list_ids().await?.len();
    Ok(Json(HealthResponse {
        status,
        groups,
        quota: quota.into(),
        cache: ctx.slot_cache.stats().into(),
    }))
}

pub fn router() -> Router<Arc<AppContext>> {
    Router::new().route("/health", get(health))
}
