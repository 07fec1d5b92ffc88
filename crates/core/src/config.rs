use serde::Deserialize;

/// Root application configuration. Loaded from an optional
/// `config/recycle-rewards.toml` file, then environment variables with the
/// prefix `RECYCLE_REWARDS__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub rewards: RewardsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default functions
fn default_node_id() -> String {
    "rewards-01".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_enabled() -> bool {
    true
}
fn default_metrics_port() -> u16 {
    9091
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            port: default_metrics_port(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            rewards: RewardsConfig::default(),
        }
    }
}

// ─── Rewards Config ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct RewardsConfig {
    /// Offset from UTC, in minutes, at which calendar months begin.
    /// `0` means month boundaries are UTC midnight.
    #[serde(default)]
    pub month_boundary_offset_minutes: i32,
    /// JSON file replacing the built-in tier table.
    #[serde(default)]
    pub tier_table_path: Option<String>,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            month_boundary_offset_minutes: 0,
            tier_table_path: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional config file and environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/recycle-rewards").required(false))
            .add_source(
                config::Environment::with_prefix("RECYCLE_REWARDS")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api.http_port, 8080);
        assert_eq!(config.metrics.port, 9091);
        assert_eq!(config.rewards.month_boundary_offset_minutes, 0);
        assert!(config.rewards.tier_table_path.is_none());
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"rewards":{"month_boundary_offset_minutes":-180}}"#).unwrap();
        assert_eq!(config.rewards.month_boundary_offset_minutes, -180);
        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.node_id, "rewards-01");
    }

    #[test]
    fn test_malformed_values_are_errors() {
        let result = config::Config::builder()
            .set_override("rewards.month_boundary_offset_minutes", "abc")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize::<AppConfig>();
        assert!(result.is_err());

        let result = serde_json::from_str::<AppConfig>(r#"{"api":{"http_port":"eighty"}}"#);
        assert!(result.is_err());
    }
}
