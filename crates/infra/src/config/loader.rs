//! Configuration loader
//!
//! Loads the session client configuration from environment variables or
//! files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `DEALROOM_API_BASE_URL` is unset or a value is invalid, falls back
//!    to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `DEALROOM_API_BASE_URL`: Portal API base URL (required)
//! - `DEALROOM_API_TIMEOUT_MS`: Request timeout in milliseconds
//! - `DEALROOM_REFRESH_PATH`: Identity-provider refresh endpoint
//! - `DEALROOM_SIGN_OUT_PATH`: Identity-provider sign-out endpoint
//! - `DEALROOM_REFRESH_TIMEOUT_MS`: Bound on a single refresh call
//! - `DEALROOM_MARKER_PREFIX` / `DEALROOM_MARKER_SUFFIX`: Session marker
//!   naming convention
//! - `DEALROOM_COOKIE_DOMAIN`: Overrides the derived cookie domain
//! - `DEALROOM_PRODUCTION_DOMAIN` / `DEALROOM_LOCAL_DEV_DOMAIN`: Extra
//!   domains cleared on teardown
//! - `DEALROOM_REFRESH_MAX_ATTEMPTS`: Refresh attempts per cycle
//! - `DEALROOM_REFRESH_BASE_DELAY_MS`: Backoff before the second attempt
//! - `DEALROOM_LOG_FILTER`: Default `tracing` filter directive
//!
//! Unset optional variables keep their defaults.
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./dealroom.json` or `./dealroom.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use dealroom_domain::{ClientConfig, DealroomError, Result};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables, then from a config
/// file. The result is validated either way.
///
/// # Errors
/// Returns `DealroomError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - The loaded configuration fails validation
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `DealroomError::Config` if `DEALROOM_API_BASE_URL` is missing, a
/// numeric variable does not parse, or validation fails.
pub fn load_from_env() -> Result<ClientConfig> {
    let mut config = ClientConfig::default();

    config.api.base_url = env_var("DEALROOM_API_BASE_URL")?;
    if let Some(timeout) = env_parse("DEALROOM_API_TIMEOUT_MS")? {
        config.api.timeout_ms = timeout;
    }

    let session = &mut config.session;
    if let Some(path) = env_opt("DEALROOM_REFRESH_PATH") {
        session.refresh_path = path;
    }
    if let Some(path) = env_opt("DEALROOM_SIGN_OUT_PATH") {
        session.sign_out_path = Some(path);
    }
    if let Some(timeout) = env_parse("DEALROOM_REFRESH_TIMEOUT_MS")? {
        session.refresh_timeout_ms = timeout;
    }
    if let Some(prefix) = env_opt("DEALROOM_MARKER_PREFIX") {
        session.marker_prefix = prefix;
    }
    if let Some(suffix) = env_opt("DEALROOM_MARKER_SUFFIX") {
        session.marker_suffix = suffix;
    }
    if let Some(domain) = env_opt("DEALROOM_COOKIE_DOMAIN") {
        session.cookie_domain = Some(domain);
    }
    if let Some(domain) = env_opt("DEALROOM_PRODUCTION_DOMAIN") {
        session.production_domain = Some(domain);
    }
    if let Some(domain) = env_opt("DEALROOM_LOCAL_DEV_DOMAIN") {
        session.local_dev_domain = Some(domain);
    }

    if let Some(attempts) = env_parse("DEALROOM_REFRESH_MAX_ATTEMPTS")? {
        config.retry.max_attempts = attempts;
    }
    if let Some(delay) = env_parse("DEALROOM_REFRESH_BASE_DELAY_MS")? {
        config.retry.base_delay_ms = delay;
    }

    if let Some(filter) = env_opt("DEALROOM_LOG_FILTER") {
        config.log_filter = filter;
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `DealroomError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - The loaded configuration fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(DealroomError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            DealroomError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| DealroomError::Config(format!("Failed to read config file: {}", e)))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| DealroomError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| DealroomError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(DealroomError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("dealroom.json"),
        dir.join("dealroom.toml"),
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
    ]
}

/// Get required environment variable
///
/// # Errors
/// Returns `DealroomError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        DealroomError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Optional environment variable; empty values count as unset.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse an optional environment variable
///
/// # Errors
/// Returns `DealroomError::Config` if the variable is set but does not parse.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| DealroomError::Config(format!("Invalid value for {}: {}", key, e)))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use parking_lot::Mutex;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Mutex<()> = parking_lot::const_mutex(());

    const ALL_VARS: &[&str] = &[
        "DEALROOM_API_BASE_URL",
        "DEALROOM_API_TIMEOUT_MS",
        "DEALROOM_REFRESH_PATH",
        "DEALROOM_SIGN_OUT_PATH",
        "DEALROOM_REFRESH_TIMEOUT_MS",
        "DEALROOM_MARKER_PREFIX",
        "DEALROOM_MARKER_SUFFIX",
        "DEALROOM_COOKIE_DOMAIN",
        "DEALROOM_PRODUCTION_DOMAIN",
        "DEALROOM_LOCAL_DEV_DOMAIN",
        "DEALROOM_REFRESH_MAX_ATTEMPTS",
        "DEALROOM_REFRESH_BASE_DELAY_MS",
        "DEALROOM_LOG_FILTER",
    ];

    fn clear_env() {
        for key in ALL_VARS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock();
        clear_env();

        std::env::set_var("DEALROOM_API_BASE_URL", "https://api.staging.dealroom.app");
        std::env::set_var("DEALROOM_API_TIMEOUT_MS", "5000");
        std::env::set_var("DEALROOM_SIGN_OUT_PATH", "/auth/v1/logout");
        std::env::set_var("DEALROOM_REFRESH_TIMEOUT_MS", "2500");
        std::env::set_var("DEALROOM_COOKIE_DOMAIN", ".staging.dealroom.app");
        std::env::set_var("DEALROOM_REFRESH_MAX_ATTEMPTS", "5");
        std::env::set_var("DEALROOM_REFRESH_BASE_DELAY_MS", "250");
        std::env::set_var("DEALROOM_LOG_FILTER", "dealroom_core=debug");

        let result = load_from_env();
        clear_env();

        let config = result.expect("config from env");
        assert_eq!(config.api.base_url, "https://api.staging.dealroom.app");
        assert_eq!(config.api.timeout_ms, 5000);
        assert_eq!(config.session.sign_out_path.as_deref(), Some("/auth/v1/logout"));
        assert_eq!(config.session.refresh_timeout_ms, 2500);
        assert_eq!(config.session.cookie_domain.as_deref(), Some(".staging.dealroom.app"));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, 250);
        assert_eq!(config.log_filter, "dealroom_core=debug");
        // unset variables keep defaults
        assert_eq!(config.session.marker_prefix, "sb-");
    }

    #[test]
    fn test_load_from_env_missing_base_url() {
        let _guard = ENV_LOCK.lock();
        clear_env();

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, DealroomError::Config(ref msg) if msg.contains("DEALROOM_API_BASE_URL")));
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock();
        clear_env();

        std::env::set_var("DEALROOM_API_BASE_URL", "https://api.dealroom.app");
        std::env::set_var("DEALROOM_REFRESH_MAX_ATTEMPTS", "three");

        let result = load_from_env();
        clear_env();

        assert!(matches!(result, Err(DealroomError::Config(ref msg)) if msg.contains("DEALROOM_REFRESH_MAX_ATTEMPTS")));
    }

    #[test]
    fn test_load_from_env_rejects_zero_attempts() {
        let _guard = ENV_LOCK.lock();
        clear_env();

        std::env::set_var("DEALROOM_API_BASE_URL", "https://api.dealroom.app");
        std::env::set_var("DEALROOM_REFRESH_MAX_ATTEMPTS", "0");

        let result = load_from_env();
        clear_env();

        assert!(matches!(result, Err(DealroomError::Config(_))));
    }

    #[test]
    fn test_parse_config_rejects_unknown_extension() {
        let err = parse_config("", Path::new("dealroom.yaml")).unwrap_err();
        assert!(err.to_string().contains("Unsupported config format"));
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"{ not json").unwrap();
        let path = temp_file.path().with_extension("json");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let result = load_from_file(Some(path.clone()));
        std::fs::remove_file(path).ok();

        assert!(matches!(result, Err(DealroomError::Config(ref msg)) if msg.contains("Invalid JSON")));
    }

    #[test]
    fn test_load_from_file_missing() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/dealroom.toml")));
        assert!(matches!(result, Err(DealroomError::Config(ref msg)) if msg.contains("not found")));
    }
}
