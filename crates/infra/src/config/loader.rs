//! Configuration loader
//!
//! Every setting has a default, so loading never requires a file. The loader
//! starts from defaults, layers an optional config file over them, and
//! finally applies `SLOTWISE_*` environment overrides on top.
//!
//! ## Environment Variables
//! - `SLOTWISE_BIND_ADDR`: HTTP listen address
//! - `SLOTWISE_FETCH_TIMEOUT_SECS`: Per-provider busy fetch timeout
//! - `SLOTWISE_FETCH_STAGGER_MS`: Delay between successive provider fetches
//! - `SLOTWISE_INCLUDE_WEEKENDS`: Default weekend policy (true/false)
//! - `SLOTWISE_READ_QUOTA_CEILING`: Daily read admission ceiling
//! - `SLOTWISE_WRITE_QUOTA_CEILING`: Daily write admission ceiling
//! - `SLOTWISE_SLOT_TTL_SECS`: Slot result cache TTL
//! - `SLOTWISE_BUSY_TTL_SECS`: Busy snapshot cache TTL
//! - `SLOTWISE_CACHE_MAX_ENTRIES`: Cache capacity
//! - `SLOTWISE_INVITATION_TTL_DAYS`: Invitation expiry in days
//! - `SLOTWISE_SWEEP_CRON`: Cron expression for the expiry sweep
//! - `SLOTWISE_SWEEP_ENABLED`: Whether the sweep scheduler runs (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./slotwise.json` or `./slotwise.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use slotwise_domain::{Config, Result, SlotwiseError};

/// Load configuration: defaults, then file (if one is found), then
/// environment overrides.
///
/// # Errors
/// Returns `SlotwiseError::Config` if:
/// - A config file was found but cannot be read or parsed
/// - An environment override holds an unparseable value
pub fn load() -> Result<Config> {
    let mut config = match probe_config_paths() {
        Some(path) => load_from_file(Some(path))?,
        None => {
            tracing::debug!("No config file found, starting from defaults");
            Config::default()
        }
    };
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `SlotwiseError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SlotwiseError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SlotwiseError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SlotwiseError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `SlotwiseError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SlotwiseError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SlotwiseError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(SlotwiseError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Apply `SLOTWISE_*` environment overrides to a loaded configuration.
///
/// Unset variables leave the current value in place.
///
/// # Errors
/// Returns `SlotwiseError::Config` when a set variable fails to parse.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    env_parse("SLOTWISE_BIND_ADDR", &mut config.server.bind_addr)?;

    env_parse("SLOTWISE_FETCH_TIMEOUT_SECS", &mut config.engine.fetch_timeout_secs)?;
    env_parse("SLOTWISE_FETCH_STAGGER_MS", &mut config.engine.fetch_stagger_ms)?;
    config.engine.include_weekends =
        env_bool("SLOTWISE_INCLUDE_WEEKENDS", config.engine.include_weekends);

    env_parse("SLOTWISE_READ_QUOTA_CEILING", &mut config.quota.read_ceiling)?;
    env_parse("SLOTWISE_WRITE_QUOTA_CEILING", &mut config.quota.write_ceiling)?;

    env_parse("SLOTWISE_SLOT_TTL_SECS", &mut config.cache.slot_ttl_secs)?;
    env_parse("SLOTWISE_BUSY_TTL_SECS", &mut config.cache.busy_ttl_secs)?;
    env_parse("SLOTWISE_CACHE_MAX_ENTRIES", &mut config.cache.max_entries)?;

    env_parse("SLOTWISE_INVITATION_TTL_DAYS", &mut config.coordination.invitation_ttl_days)?;
    env_parse("SLOTWISE_SWEEP_CRON", &mut config.coordination.sweep_cron)?;
    config.coordination.sweep_enabled =
        env_bool("SLOTWISE_SWEEP_ENABLED", config.coordination.sweep_enabled);

    Ok(())
}

/// Probe multiple paths for configuration files
///
/// Searches for config files in the following locations (in order):
/// 1. Current working directory (`./config.{json,toml}`,
///    `./slotwise.{json,toml}`)
/// 2. Parent directories (up to 2 levels)
/// 3. Relative to executable location
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    // Try current working directory
    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("slotwise.json"),
            cwd.join("slotwise.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
            cwd.join("../../config.json"),
            cwd.join("../../config.toml"),
        ]);
    }

    // Try relative to executable
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("slotwise.json"),
                exe_dir.join("slotwise.toml"),
            ]);
        }
    }

    // Return first existing candidate
    candidates.into_iter().find(|path| path.exists())
}

/// Override `target` with a parsed environment value when the variable is
/// set.
///
/// # Errors
/// Returns `SlotwiseError::Config` if the value fails to parse.
fn env_parse<T>(key: &str, target: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Ok(raw) = std::env::var(key) {
        *target =
            raw.parse::<T>().map_err(|e| SlotwiseError::Config(format!("Invalid {key}: {e}")))?;
    }
    Ok(())
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
///
/// # Returns
/// The parsed boolean value, or `default` if not set.
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
