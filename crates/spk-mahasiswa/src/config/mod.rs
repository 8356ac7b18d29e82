use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::workflows::saw::ScoreScope;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub model: ModelConfig,
    pub storage: StorageConfig,
    pub criteria: CriteriaServiceConfig,
    pub saw: SawConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&var_or("APP_ENV", "development"));

        let host = var_or("APP_HOST", "127.0.0.1");
        let port = var_or("APP_PORT", "5000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = var_or("APP_LOG_LEVEL", "info");

        let data_dir = PathBuf::from(var_or("SPK_DATA_DIR", "data"));
        let scaler_path = PathBuf::from(var_or("SPK_SCALER_PATH", "data/scaler.json"));
        let model_path = PathBuf::from(var_or("SPK_MODEL_PATH", "data/kmeans_model.json"));

        let base_url = var_or("SPK_CRITERIA_BASE_URL", "http://127.0.0.1:8000/api");
        let api_token = env::var("SPK_CRITERIA_API_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());
        let timeout_secs = var_or("SPK_HTTP_TIMEOUT_SECS", "10")
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(ConfigError::InvalidTimeout)?;

        let raw_scope = var_or("SPK_SAW_SCORE_SCOPE", "criteria");
        let score_scope = ScoreScope::parse(&raw_scope)
            .ok_or(ConfigError::InvalidScoreScope { value: raw_scope })?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            model: ModelConfig {
                scaler_path,
                model_path,
            },
            storage: StorageConfig { data_dir },
            criteria: CriteriaServiceConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                api_token,
                timeout: Duration::from_secs(timeout_secs),
            },
            saw: SawConfig { score_scope },
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Locations of the fitted scaler and clustering artifacts.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub scaler_path: PathBuf,
    pub model_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

/// Connection settings for the service owning criteria definitions and result storage.
#[derive(Debug, Clone)]
pub struct CriteriaServiceConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct SawConfig {
    pub score_scope: ScoreScope,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTimeout,
    InvalidScoreScope { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTimeout => {
                write!(f, "SPK_HTTP_TIMEOUT_SECS must be a positive number of seconds")
            }
            ConfigError::InvalidScoreScope { value } => write!(
                f,
                "SPK_SAW_SCORE_SCOPE must be 'criteria' or 'row' (got '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidTimeout
            | ConfigError::InvalidScoreScope { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "SPK_DATA_DIR",
            "SPK_SCALER_PATH",
            "SPK_MODEL_PATH",
            "SPK_CRITERIA_BASE_URL",
            "SPK_CRITERIA_API_TOKEN",
            "SPK_HTTP_TIMEOUT_SECS",
            "SPK_SAW_SCORE_SCOPE",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.storage.data_dir, PathBuf::from("data"));
        assert_eq!(config.criteria.base_url, "http://127.0.0.1:8000/api");
        assert_eq!(config.criteria.timeout, Duration::from_secs(10));
        assert!(config.criteria.api_token.is_none());
        assert_eq!(config.saw.score_scope, ScoreScope::Criteria);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 5000));
    }

    #[test]
    fn rejects_zero_timeout() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SPK_HTTP_TIMEOUT_SECS", "0");
        let error = AppConfig::load().expect_err("zero timeout rejected");
        assert!(matches!(error, ConfigError::InvalidTimeout));
        reset_env();
    }

    #[test]
    fn parses_row_score_scope_and_trims_base_url() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SPK_SAW_SCORE_SCOPE", "row");
        env::set_var("SPK_CRITERIA_BASE_URL", "https://spk.example.ac.id/api/");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.saw.score_scope, ScoreScope::Row);
        assert_eq!(config.criteria.base_url, "https://spk.example.ac.id/api");

        env::set_var("SPK_SAW_SCORE_SCOPE", "everything");
        let error = AppConfig::load().expect_err("unknown scope rejected");
        assert!(matches!(error, ConfigError::InvalidScoreScope { .. }));
        reset_env();
    }
}
