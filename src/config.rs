use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    /// PostgreSQL connection URL; the in-memory store is used when unset.
    #[serde(default)]
    pub postgres_url: Option<String>,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LedgerConfig {
    /// Conflict retries per mutation unit before LEDGER_CONFLICT surfaces.
    pub max_retries: u32,
    /// Ledger history page size served by the gateway.
    pub history_limit: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            history_limit: 50,
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));
        serde_yaml::from_str(&content).expect("Failed to parse config yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.history_limit, 50);
    }

    #[test]
    fn test_parse_minimal_yaml() {
        let yaml = r#"
log_level: info
log_dir: ./logs
log_file: ledgerd.log
use_json: false
rotation: daily
gateway:
  host: 127.0.0.1
  port: 8080
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.postgres_url.is_none());
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.ledger.max_retries, 3);
    }
}
