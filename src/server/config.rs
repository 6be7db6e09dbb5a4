use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default)]
    pub telegram_bot_token: Option<String>,

    #[serde(default = "default_telegram_api_url")]
    pub telegram_api_url: String,

    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,

    #[serde(default = "default_sweep_concurrency")]
    pub sweep_concurrency: usize,

    #[serde(default = "default_liveness_timeout_ms")]
    pub liveness_timeout_ms: u64,

    #[serde(default = "default_statistics_timeout_ms")]
    pub statistics_timeout_ms: u64,

    #[serde(default = "default_telegram_timeout_seconds")]
    pub telegram_timeout_seconds: u64,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    database_url: Option<String>,
    bind_address: Option<String>,
    telegram_bot_token: Option<String>,
    telegram_api_url: Option<String>,
    sweep_interval_seconds: Option<u64>,
    sweep_concurrency: Option<usize>,
    liveness_timeout_ms: Option<u64>,
    statistics_timeout_ms: Option<u64>,
    telegram_timeout_seconds: Option<u64>,
    log_dir: Option<String>,
}

fn default_database_url() -> String {
    "sqlite://data/bazar_monitoring.db?mode=rwc".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_sweep_interval_seconds() -> u64 {
    300
}

fn default_sweep_concurrency() -> usize {
    4
}

fn default_liveness_timeout_ms() -> u64 {
    2000
}

fn default_statistics_timeout_ms() -> u64 {
    3000
}

fn default_telegram_timeout_seconds() -> u64 {
    10
}

fn default_log_dir() -> String {
    "logs".to_string()
}

/// Blank values count as unset.
fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl PartialServerConfig {
    fn from_env() -> Result<Self, String> {
        envy::from_env::<PartialServerConfig>()
            .map_err(|e| format!("Failed to parse config from environment: {e}"))
    }

    fn from_file(config_path: Option<&str>) -> Result<Self, String> {
        let Some(path_str) = config_path else {
            return Ok(PartialServerConfig::default());
        };
        let path = Path::new(path_str);
        if !path.exists() {
            return Ok(PartialServerConfig::default());
        }
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
        toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse TOML from config file at {path:?}: {e}"))
    }
}

impl ServerConfig {
    /// Loads the configuration: defaults, overlaid by the optional TOML file, overlaid by
    /// environment variables (including those from a `.env` file).
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();
        let file_config = PartialServerConfig::from_file(config_path)?;
        let env_config = PartialServerConfig::from_env()?;
        Self::merge(env_config, file_config)
    }

    fn merge(
        env_config: PartialServerConfig,
        file_config: PartialServerConfig,
    ) -> Result<Self, String> {
        let config = ServerConfig {
            database_url: non_empty(env_config.database_url)
                .or(non_empty(file_config.database_url))
                .unwrap_or_else(default_database_url),
            bind_address: non_empty(env_config.bind_address)
                .or(non_empty(file_config.bind_address))
                .unwrap_or_else(default_bind_address),
            telegram_bot_token: non_empty(env_config.telegram_bot_token)
                .or(non_empty(file_config.telegram_bot_token)),
            telegram_api_url: non_empty(env_config.telegram_api_url)
                .or(non_empty(file_config.telegram_api_url))
                .unwrap_or_else(default_telegram_api_url),
            sweep_interval_seconds: env_config
                .sweep_interval_seconds
                .or(file_config.sweep_interval_seconds)
                .unwrap_or_else(default_sweep_interval_seconds),
            sweep_concurrency: env_config
                .sweep_concurrency
                .or(file_config.sweep_concurrency)
                .unwrap_or_else(default_sweep_concurrency),
            liveness_timeout_ms: env_config
                .liveness_timeout_ms
                .or(file_config.liveness_timeout_ms)
                .unwrap_or_else(default_liveness_timeout_ms),
            statistics_timeout_ms: env_config
                .statistics_timeout_ms
                .or(file_config.statistics_timeout_ms)
                .unwrap_or_else(default_statistics_timeout_ms),
            telegram_timeout_seconds: env_config
                .telegram_timeout_seconds
                .or(file_config.telegram_timeout_seconds)
                .unwrap_or_else(default_telegram_timeout_seconds),
            log_dir: non_empty(env_config.log_dir)
                .or(non_empty(file_config.log_dir))
                .unwrap_or_else(default_log_dir),
        };

        if config.sweep_interval_seconds == 0 {
            return Err("SWEEP_INTERVAL_SECONDS must be greater than zero".to_string());
        }
        if config.sweep_concurrency == 0 {
            return Err("SWEEP_CONCURRENCY must be greater than zero".to_string());
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_vars(vars: &[(&str, &str)]) -> Result<PartialServerConfig, envy::Error> {
        envy::from_iter::<_, PartialServerConfig>(
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())),
        )
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = ServerConfig::merge(
            PartialServerConfig::default(),
            PartialServerConfig::default(),
        )
        .unwrap();
        assert_eq!(config.database_url, "sqlite://data/bazar_monitoring.db?mode=rwc");
        assert_eq!(config.bind_address, "0.0.0.0:5000");
        assert_eq!(config.telegram_bot_token, None);
        assert_eq!(config.sweep_interval_seconds, 300);
        assert_eq!(config.liveness_timeout_ms, 2000);
        assert_eq!(config.statistics_timeout_ms, 3000);
    }

    #[test]
    fn environment_overrides_file() {
        let file: PartialServerConfig = toml::from_str(
            r#"
            bind_address = "127.0.0.1:8000"
            sweep_interval_seconds = 60
            telegram_bot_token = "from-file"
            "#,
        )
        .unwrap();
        let env = from_vars(&[
            ("TELEGRAM_BOT_TOKEN", "from-env"),
            ("SWEEP_CONCURRENCY", "8"),
            ("BIND_ADDRESS", "  "),
        ])
        .unwrap();

        let config = ServerConfig::merge(env, file).unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:8000");
        assert_eq!(config.sweep_interval_seconds, 60);
        assert_eq!(config.sweep_concurrency, 8);
        assert_eq!(config.telegram_bot_token.as_deref(), Some("from-env"));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        assert!(from_vars(&[("SWEEP_INTERVAL_SECONDS", "soon")]).is_err());

        let env = from_vars(&[("SWEEP_INTERVAL_SECONDS", "0")]).unwrap();
        assert!(ServerConfig::merge(env, PartialServerConfig::default()).is_err());

        let env = from_vars(&[("SWEEP_CONCURRENCY", "0")]).unwrap();
        assert!(ServerConfig::merge(env, PartialServerConfig::default()).is_err());
    }
}
