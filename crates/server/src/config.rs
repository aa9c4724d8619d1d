use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use ssemcp_core::weather::{
    WeatherClient, WeatherHistory, DEFAULT_BASE_URL, DEFAULT_HISTORY_LIMIT,
};
use ssemcp_mcp::protocol::ServerInfo;
use ssemcp_mcp::tools::{PingTool, ToolRegistry, WeatherTool};
use ssemcp_mcp::{McpServer, SseConfig, SseTransport};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8001;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_SERVER_NAME: &str = "generic-mcp";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid PORT value {value:?}: {reason}")]
    InvalidPort { value: String, reason: String },

    #[error("Server name must be kebab-case, got {0:?}")]
    InvalidServerName(String),

    #[error("Route path must start with '/', got {0:?}")]
    InvalidPath(String),

    #[error("SSE and message endpoints must differ, both are {0:?}")]
    ConflictingPaths(String),

    #[error("Invalid weather base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Weather history limit must be at least 1")]
    InvalidHistoryLimit,

    #[error("Weather request timeout must be at least 1 second")]
    InvalidTimeout,
}

/// Pick the listening port: explicit flag, then the `PORT` variable, then 8001
pub fn resolve_port(flag: Option<u16>, env_value: Option<&str>) -> Result<u16, ConfigError> {
    if let Some(port) = flag {
        return Ok(port);
    }

    match env_value {
        Some(value) => value
            .trim()
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidPort {
                value: value.to_string(),
                reason: e.to_string(),
            }),
        None => Ok(DEFAULT_PORT),
    }
}

/// Lowercase ASCII words joined by single hyphens, e.g. `generic-mcp`
pub fn validate_server_name(name: &str) -> Result<(), ConfigError> {
    let valid = !name.is_empty()
        && name.split('-').all(|word| {
            !word.is_empty()
                && word
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        });

    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidServerName(name.to_string()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub weather: WeatherConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    /// Human-readable name reported by the ping tool
    #[serde(default = "default_display_name")]
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default = "default_sse_path")]
    pub sse_path: String,

    #[serde(default = "default_message_path")]
    pub message_path: String,

    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,

    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_weather_base_url")]
    pub base_url: String,

    #[serde(default = "default_weather_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_true")]
    pub record_history: bool,

    #[serde(default = "default_history_dir")]
    pub history_dir: String,

    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_display_name() -> String {
    "Generic MCP Server".to_string()
}

fn default_sse_path() -> String {
    ssemcp_mcp::transport::sse::DEFAULT_SSE_PATH.to_string()
}

fn default_message_path() -> String {
    ssemcp_mcp::transport::sse::DEFAULT_MESSAGE_PATH.to_string()
}

fn default_keep_alive_secs() -> u64 {
    ssemcp_mcp::transport::sse::DEFAULT_KEEP_ALIVE.as_secs()
}

fn default_channel_capacity() -> usize {
    ssemcp_mcp::transport::sse::DEFAULT_CHANNEL_CAPACITY
}

fn default_true() -> bool {
    true
}

fn default_weather_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_weather_timeout_secs() -> u64 {
    10
}

fn default_history_dir() -> String {
    "weather".to_string()
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            display_name: default_display_name(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            sse_path: default_sse_path(),
            message_path: default_message_path(),
            keep_alive_secs: default_keep_alive_secs(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_weather_base_url(),
            timeout_secs: default_weather_timeout_secs(),
            record_history: true,
            history_dir: default_history_dir(),
            history_limit: default_history_limit(),
        }
    }
}

impl ServerConfig {
    pub fn load(config_path: &Path) -> Result<Self> {
        // Load config file if it exists, otherwise use defaults
        let config: Self = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .context("Failed to read configuration file")?;
            toml::from_str(&content).context("Failed to parse configuration file")?
        } else {
            tracing::info!("Configuration file not found, using defaults");
            Self::default()
        };

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for path in [&self.transport.sse_path, &self.transport.message_path] {
            if !path.starts_with('/') {
                return Err(ConfigError::InvalidPath(path.clone()));
            }
        }

        if self.transport.sse_path == self.transport.message_path {
            return Err(ConfigError::ConflictingPaths(self.transport.sse_path.clone()));
        }

        if self.weather.enabled {
            self.weather_base_url()?;

            if self.weather.timeout_secs == 0 {
                return Err(ConfigError::InvalidTimeout);
            }

            if self.weather.record_history && self.weather.history_limit == 0 {
                return Err(ConfigError::InvalidHistoryLimit);
            }
        }

        Ok(())
    }

    pub fn sse_config(&self) -> SseConfig {
        SseConfig {
            sse_path: self.transport.sse_path.clone(),
            message_path: self.transport.message_path.clone(),
            keep_alive: Duration::from_secs(self.transport.keep_alive_secs.max(1)),
            channel_capacity: self.transport.channel_capacity,
        }
    }

    /// Get the weather history directory
    pub fn history_path(&self) -> PathBuf {
        PathBuf::from(&self.weather.history_dir)
    }

    fn weather_base_url(&self) -> Result<url::Url, ConfigError> {
        url::Url::parse(&self.weather.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.weather.base_url.clone(),
            reason: e.to_string(),
        })
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub name: String,
    pub server: Arc<McpServer>,
    pub transport: Arc<SseTransport>,
}

impl AppState {
    pub fn new(name: &str, config: &ServerConfig) -> Result<Self> {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(PingTool::new(config.server.display_name.clone())));

        if config.weather.enabled {
            let client = WeatherClient::new(
                config.weather_base_url()?,
                Duration::from_secs(config.weather.timeout_secs),
            )
            .context("Failed to create weather client")?;

            let mut tool = WeatherTool::new(client);
            if config.weather.record_history {
                tool = tool.with_history(Arc::new(WeatherHistory::new(
                    config.history_path(),
                    config.weather.history_limit,
                )));
            }
            registry.register(Arc::new(tool));
        }

        tracing::info!("Registered {} tools", registry.len());

        let server = Arc::new(McpServer::new(ServerInfo::new(name), registry));
        let transport = Arc::new(SseTransport::new(server.clone(), config.sse_config()));

        Ok(Self {
            name: name.to_string(),
            server,
            transport,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_port_defaults_to_8001() {
        assert_eq!(resolve_port(None, None).unwrap(), 8001);
    }

    #[test]
    fn test_port_from_env() {
        assert_eq!(resolve_port(None, Some("9000")).unwrap(), 9000);
        assert_eq!(resolve_port(None, Some(" 10000 ")).unwrap(), 10000);
    }

    #[test]
    fn test_port_flag_wins() {
        assert_eq!(resolve_port(Some(7000), Some("9000")).unwrap(), 7000);
    }

    #[test]
    fn test_invalid_port_env() {
        assert!(matches!(
            resolve_port(None, Some("eighty")),
            Err(ConfigError::InvalidPort { .. })
        ));
        assert!(resolve_port(None, Some("70000")).is_err());
    }

    #[test]
    fn test_server_name_kebab_case() {
        assert!(validate_server_name("generic-mcp").is_ok());
        assert!(validate_server_name("weather").is_ok());
        assert!(validate_server_name("mcp-2").is_ok());

        assert!(validate_server_name("").is_err());
        assert!(validate_server_name("Generic-MCP").is_err());
        assert!(validate_server_name("generic_mcp").is_err());
        assert!(validate_server_name("-mcp").is_err());
        assert!(validate_server_name("generic--mcp").is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ServerConfig::load(&temp_dir.path().join("missing.toml")).unwrap();

        assert_eq!(config.transport.sse_path, "/sse");
        assert_eq!(config.transport.message_path, "/messages/");
        assert_eq!(config.weather.history_limit, 100);
        assert!(config.weather.enabled);
    }

    #[test]
    fn test_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ssemcp.toml");
        std::fs::write(
            &path,
            r#"
[server]
display_name = "Weather Server"

[weather]
history_limit = 10
"#,
        )
        .unwrap();

        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.server.display_name, "Weather Server");
        assert_eq!(config.weather.history_limit, 10);
        assert_eq!(config.weather.base_url, "https://wttr.in");
        assert_eq!(config.transport.keep_alive_secs, 15);
    }

    #[test]
    fn test_invalid_paths_rejected() {
        let mut config = ServerConfig::default();
        config.transport.sse_path = "sse".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPath(_))));

        let mut config = ServerConfig::default();
        config.transport.message_path = "/sse".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ConflictingPaths(_))
        ));
    }

    #[test]
    fn test_zero_weather_limits_rejected() {
        let mut config = ServerConfig::default();
        config.weather.history_limit = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidHistoryLimit)
        ));

        let mut config = ServerConfig::default();
        config.weather.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTimeout)));

        // Only checked while the weather tool is on
        config.weather.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_history_limit_in_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ssemcp.toml");
        std::fs::write(&path, "[weather]\nhistory_limit = 0\n").unwrap();

        let err = ServerConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("history limit"));
    }

    #[test]
    fn test_app_state_registers_tools() {
        let state = AppState::new("generic-mcp", &ServerConfig::default()).unwrap();
        let registry = state.server.registry();
        assert!(registry.contains("ping"));
        assert!(registry.contains("get_current_weather"));
        assert_eq!(state.server.info().name, "generic-mcp");

        let mut config = ServerConfig::default();
        config.weather.enabled = false;
        let state = AppState::new("generic-mcp", &config).unwrap();
        assert_eq!(state.server.registry().len(), 1);
    }
}
