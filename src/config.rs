//! Configuration management for Toolgate
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//! Precedence, lowest to highest: built-in defaults, YAML file,
//! environment variables, command-line flags.

use crate::auth::{BoundSessionPolicy, DEFAULT_AUTH_WINDOW_MINUTES};
use crate::error::{Result, ToolgateError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for Toolgate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener and public URL settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Authentication window and session policy
    #[serde(default)]
    pub auth: AuthConfig,

    /// Canned data location and allowed identities
    #[serde(default)]
    pub data: DataConfig,

    /// Tools advertised by `tools/list` and accepted by `tools/call`
    #[serde(default = "default_tools")]
    pub tools: Vec<ToolDefinition>,

    /// Logging output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the listener binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Host name used when building login URLs
    #[serde(default = "default_public_host")]
    pub public_host: String,

    /// Port for both the listener and login URLs
    #[serde(default = "default_port")]
    pub port: u16,

    /// Server name reported in `initialize`
    #[serde(default = "default_server_name")]
    pub name: String,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_public_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_server_name() -> String {
    "toolgate".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            public_host: default_public_host(),
            port: default_port(),
            name: default_server_name(),
        }
    }
}

/// Authentication policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Minutes a login stays valid
    #[serde(default = "default_window_minutes")]
    pub window_minutes: i64,

    /// Whether bound sessions are re-checked against the window
    #[serde(default)]
    pub bound_session_policy: BoundSessionPolicy,
}

/// Longest accepted auth window, in minutes (one year).
pub const MAX_AUTH_WINDOW_MINUTES: i64 = 525_600;

fn default_window_minutes() -> i64 {
    DEFAULT_AUTH_WINDOW_MINUTES
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            window_minutes: default_window_minutes(),
            bound_session_policy: BoundSessionPolicy::default(),
        }
    }
}

impl AuthConfig {
    /// The auth window as a duration.
    ///
    /// Out-of-range values are clamped to `1..=MAX_AUTH_WINDOW_MINUTES`;
    /// [`Config::validate`] rejects them before this is reached.
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.window_minutes.clamp(1, MAX_AUTH_WINDOW_MINUTES))
    }
}

/// Canned data and allowlist configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory with one subdirectory of `<tool>.json` files per identity
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,

    /// Permitted identities; when empty, the subdirectories of `dir` are used
    #[serde(default)]
    pub allowed_identities: Vec<String>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("test_data_dir")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            allowed_identities: Vec::new(),
        }
    }
}

/// A tool exposed through the gate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolDefinition {
    /// Tool name; also the canned response file stem
    pub name: String,

    /// Description shown to the calling agent
    #[serde(default)]
    pub description: String,
}

impl ToolDefinition {
    fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

fn default_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            "fetch_net_worth",
            "Calculate comprehensive net worth using actual data from connected assets and liabilities",
        ),
        ToolDefinition::new(
            "fetch_credit_report",
            "Retrieve comprehensive credit report including scores, active loans, and payment history",
        ),
        ToolDefinition::new(
            "fetch_epf_details",
            "Retrieve detailed EPF (Employee Provident Fund) account information",
        ),
        ToolDefinition::new(
            "fetch_mf_transactions",
            "Retrieve mutual fund transaction history for portfolio analysis",
        ),
        ToolDefinition::new(
            "fetch_bank_transactions",
            "Retrieve detailed bank transactions for each connected bank account",
        ),
        ToolDefinition::new(
            "fetch_stock_transactions",
            "Retrieve detailed Indian stock transactions for connected accounts",
        ),
    ]
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,

    /// Also append logs to this file
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "toolgate=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default_config()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn default_config() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            data: DataConfig::default(),
            tools: default_tools(),
            logging: LoggingConfig::default(),
        }
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ToolgateError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ToolgateError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(host) = std::env::var("TOOLGATE_BIND_ADDRESS") {
            self.server.bind_address = host;
        }

        if let Ok(host) = std::env::var("TOOLGATE_PUBLIC_HOST") {
            self.server.public_host = host;
        }

        // `PORT` is honoured for compatibility with hosting platforms; the
        // namespaced variable wins when both are set.
        for var in ["PORT", "TOOLGATE_PORT"] {
            if let Ok(port) = std::env::var(var) {
                if let Ok(value) = port.parse() {
                    self.server.port = value;
                } else {
                    tracing::warn!("Invalid {}: {}", var, port);
                }
            }
        }

        if let Ok(window) = std::env::var("TOOLGATE_AUTH_WINDOW_MINUTES") {
            if let Ok(value) = window.parse() {
                self.auth.window_minutes = value;
            } else {
                tracing::warn!("Invalid TOOLGATE_AUTH_WINDOW_MINUTES: {}", window);
            }
        }

        if let Ok(policy) = std::env::var("TOOLGATE_BOUND_SESSION_POLICY") {
            match policy.parse() {
                Ok(value) => self.auth.bound_session_policy = value,
                Err(e) => tracing::warn!("Invalid TOOLGATE_BOUND_SESSION_POLICY: {}", e),
            }
        }

        if let Ok(dir) = std::env::var("TOOLGATE_DATA_DIR") {
            self.data.dir = PathBuf::from(dir);
        }

        if let Ok(ids) = std::env::var("TOOLGATE_ALLOWED_IDENTITIES") {
            self.data.allowed_identities = ids
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(level) = std::env::var("TOOLGATE_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(json_logs) = std::env::var("TOOLGATE_JSON_LOGS") {
            match json_logs.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.logging.json = true,
                "0" | "false" | "no" => self.logging.json = false,
                _ => tracing::warn!("Invalid TOOLGATE_JSON_LOGS: {}", json_logs),
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            self.logging.level = "toolgate=debug".to_string();
        }

        if let crate::cli::Commands::Serve {
            bind_address,
            port,
            data_dir,
            json_logs,
        } = &cli.command
        {
            if let Some(addr) = bind_address {
                self.server.bind_address = addr.clone();
            }
            if let Some(port) = port {
                self.server.port = *port;
            }
            if let Some(dir) = data_dir {
                self.data.dir = dir.clone();
            }
            if *json_logs {
                self.logging.json = true;
            }
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(
                ToolgateError::Config("server.port must be greater than 0".to_string()).into(),
            );
        }

        if self.server.public_host.trim().is_empty() {
            return Err(
                ToolgateError::Config("server.public_host cannot be empty".to_string()).into(),
            );
        }

        if self.auth.window_minutes <= 0 {
            return Err(ToolgateError::Config(
                "auth.window_minutes must be greater than 0".to_string(),
            )
            .into());
        }

        if self.auth.window_minutes > MAX_AUTH_WINDOW_MINUTES {
            return Err(ToolgateError::Config(format!(
                "auth.window_minutes must be at most {}",
                MAX_AUTH_WINDOW_MINUTES
            ))
            .into());
        }

        if self.tools.is_empty() {
            return Err(ToolgateError::Config(
                "at least one tool must be configured".to_string(),
            )
            .into());
        }

        let mut seen = std::collections::HashSet::new();
        for tool in &self.tools {
            if tool.name.trim().is_empty() {
                return Err(
                    ToolgateError::Config("tool name cannot be empty".to_string()).into(),
                );
            }
            if !seen.insert(tool.name.as_str()) {
                return Err(
                    ToolgateError::Config(format!("duplicate tool name: {}", tool.name)).into(),
                );
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::test_utils::assert_error_contains;
    use serial_test::serial;

    fn serve_cli() -> Cli {
        Cli {
            config: None,
            verbose: false,
            command: Commands::Serve {
                bind_address: None,
                port: None,
                data_dir: None,
                json_logs: false,
            },
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default_config();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.public_host, "localhost");
        assert_eq!(config.auth.window_minutes, 30);
        assert_eq!(config.auth.bound_session_policy, BoundSessionPolicy::Revalidate);
        assert_eq!(config.data.dir, PathBuf::from("test_data_dir"));
        assert_eq!(config.tools.len(), 6);
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default_config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_port() {
        let mut config = Config::default_config();
        config.server.port = 0;
        assert_error_contains(config.validate(), "server.port must be greater than 0");
    }

    #[test]
    fn test_config_validation_zero_window() {
        let mut config = Config::default_config();
        config.auth.window_minutes = 0;
        assert_error_contains(config.validate(), "auth.window_minutes must be greater than 0");
    }

    #[test]
    fn test_config_validation_window_upper_bound() {
        let mut config = Config::default_config();
        config.auth.window_minutes = MAX_AUTH_WINDOW_MINUTES;
        assert!(config.validate().is_ok());

        config.auth.window_minutes = MAX_AUTH_WINDOW_MINUTES + 1;
        assert_error_contains(config.validate(), "auth.window_minutes must be at most");

        config.auth.window_minutes = i64::MAX / 1000;
        assert_error_contains(config.validate(), "auth.window_minutes must be at most");
    }

    #[test]
    fn test_window_never_panics_on_out_of_range_values() {
        let mut auth = AuthConfig::default();
        auth.window_minutes = i64::MAX / 1000;
        assert_eq!(auth.window(), chrono::Duration::minutes(MAX_AUTH_WINDOW_MINUTES));

        auth.window_minutes = -5;
        assert_eq!(auth.window(), chrono::Duration::minutes(1));
    }

    #[test]
    #[serial]
    fn test_oversized_env_window_is_rejected_by_validate() {
        std::env::set_var("TOOLGATE_AUTH_WINDOW_MINUTES", "153722867280913");
        let mut config = Config::default_config();
        config.apply_env_vars();
        std::env::remove_var("TOOLGATE_AUTH_WINDOW_MINUTES");

        assert_eq!(config.auth.window_minutes, 153_722_867_280_913);
        assert_error_contains(config.validate(), "auth.window_minutes must be at most");
    }

    #[test]
    fn test_config_validation_duplicate_tool() {
        let mut config = Config::default_config();
        config.tools.push(config.tools[0].clone());
        assert_error_contains(config.validate(), "duplicate tool name: fetch_net_worth");
    }

    #[test]
    fn test_config_validation_no_tools() {
        let mut config = Config::default_config();
        config.tools.clear();
        assert_error_contains(config.validate(), "at least one tool must be configured");
    }

    #[test]
    fn test_config_validation_empty_public_host() {
        let mut config = Config::default_config();
        config.server.public_host = "  ".to_string();
        assert_error_contains(config.validate(), "server.public_host cannot be empty");
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
server:
  port: 9090
auth:
  window_minutes: 10
  bound_session_policy: sticky
data:
  dir: /srv/canned
  allowed_identities: ["+1111", "+2222"]
tools:
  - name: fetch_net_worth
    description: Net worth
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.public_host, "localhost");
        assert_eq!(config.auth.window(), chrono::Duration::minutes(10));
        assert_eq!(config.auth.bound_session_policy, BoundSessionPolicy::Sticky);
        assert_eq!(config.data.allowed_identities.len(), 2);
        assert_eq!(config.tools.len(), 1);
        assert_eq!(config.logging.level, "toolgate=info");
    }

    #[test]
    fn test_empty_yaml_uses_default_tools() {
        let config: Config = serde_yaml::from_str("server:\n  port: 8081\n").unwrap();
        assert_eq!(config.tools.len(), 6);
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_defaults() {
        let config = Config::load("nonexistent.yaml", &serve_cli()).unwrap();
        assert_eq!(config.auth.window_minutes, 30);
    }

    #[test]
    #[serial]
    fn test_cli_overrides_take_precedence() {
        let cli = Cli {
            config: None,
            verbose: true,
            command: Commands::Serve {
                bind_address: Some("0.0.0.0".to_string()),
                port: Some(7000),
                data_dir: Some(PathBuf::from("/tmp/data")),
                json_logs: true,
            },
        };
        let config = Config::load("nonexistent.yaml", &cli).unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.data.dir, PathBuf::from("/tmp/data"));
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "toolgate=debug");
    }

    #[test]
    #[serial]
    fn test_apply_env_vars_overrides_fields() {
        std::env::remove_var("PORT");
        std::env::set_var("TOOLGATE_PORT", "9191");
        std::env::set_var("TOOLGATE_AUTH_WINDOW_MINUTES", "5");
        std::env::set_var("TOOLGATE_BOUND_SESSION_POLICY", "sticky");
        std::env::set_var("TOOLGATE_ALLOWED_IDENTITIES", "+1111, +2222,,");
        std::env::set_var("TOOLGATE_JSON_LOGS", "true");

        let mut config = Config::default_config();
        config.apply_env_vars();

        std::env::remove_var("TOOLGATE_PORT");
        std::env::remove_var("TOOLGATE_AUTH_WINDOW_MINUTES");
        std::env::remove_var("TOOLGATE_BOUND_SESSION_POLICY");
        std::env::remove_var("TOOLGATE_ALLOWED_IDENTITIES");
        std::env::remove_var("TOOLGATE_JSON_LOGS");

        assert_eq!(config.server.port, 9191);
        assert_eq!(config.auth.window_minutes, 5);
        assert_eq!(config.auth.bound_session_policy, BoundSessionPolicy::Sticky);
        assert_eq!(config.data.allowed_identities, vec!["+1111", "+2222"]);
        assert!(config.logging.json);
    }

    #[test]
    #[serial]
    fn test_invalid_env_values_are_ignored() {
        std::env::remove_var("PORT");
        std::env::set_var("TOOLGATE_PORT", "not-a-port");
        std::env::set_var("TOOLGATE_BOUND_SESSION_POLICY", "forever");

        let mut config = Config::default_config();
        config.apply_env_vars();

        std::env::remove_var("TOOLGATE_PORT");
        std::env::remove_var("TOOLGATE_BOUND_SESSION_POLICY");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.bound_session_policy, BoundSessionPolicy::Revalidate);
    }
}
