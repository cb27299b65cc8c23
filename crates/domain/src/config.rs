//! Configuration management

use serde::{Deserialize, Serialize};

use crate::constants;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub quota: QuotaConfig,
    pub cache: CacheConfig,
    pub coordination: CoordinationConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

/// Availability engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub fetch_timeout_secs: u64,
    pub fetch_stagger_ms: u64,
    /// Policy default; requests may override per call.
    pub include_weekends: bool,
}

/// Daily quota ceilings for external reads and writes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    pub read_ceiling: u64,
    pub write_ceiling: u64,
    pub warn_ratio: f64,
}

/// Result cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub slot_ttl_secs: u64,
    pub busy_ttl_secs: u64,
    pub max_entries: u64,
}

/// Group coordination configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinationConfig {
    pub invitation_ttl_days: i64,
    pub sweep_cron: String,
    pub sweep_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: constants::DEFAULT_BIND_ADDR.to_string() }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: constants::PROVIDER_FETCH_TIMEOUT_SECS,
            fetch_stagger_ms: constants::FETCH_STAGGER_MS,
            include_weekends: false,
        }
    }
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            read_ceiling: constants::READ_QUOTA_CEILING,
            write_ceiling: constants::WRITE_QUOTA_CEILING,
            warn_ratio: constants::QUOTA_WARN_RATIO,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            slot_ttl_secs: constants::SLOT_RESULT_TTL_SECS,
            busy_ttl_secs: constants::BUSY_SNAPSHOT_TTL_SECS,
            max_entries: constants::CACHE_MAX_ENTRIES,
        }
    }
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        Self {
            invitation_ttl_days: constants::INVITATION_TTL_DAYS,
            sweep_cron: constants::DEFAULT_SWEEP_CRON.to_string(),
            sweep_enabled: true,
        }
    }
}
