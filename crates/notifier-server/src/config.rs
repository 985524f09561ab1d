//! Server configuration loading from file and environment variables.

use notifier_publish::{BatchStrategy, ParseBatchStrategyError, TransportConfig};
use notifier_signing::Credentials;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// GraphQL endpoint settings.
    #[serde(default)]
    pub appsync: AppSyncConfig,

    /// Signing credentials. Usually injected through the environment.
    #[serde(default)]
    pub credentials: Option<Credentials>,

    /// Batch processing settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Where the `publish` mutation is sent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppSyncConfig {
    /// Absolute GraphQL endpoint URL.
    #[serde(default)]
    pub url: String,

    /// Region used in the signing scope.
    #[serde(default)]
    pub region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub strategy: BatchStrategy,

    /// Per-request timeout for the outbound call, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "notifier_publish=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_timeout_secs() -> u64 {
    notifier_publish::DEFAULT_TIMEOUT.as_secs()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            strategy: BatchStrategy::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// `NOTIFIER_STRATEGY` named an unknown strategy.
    #[error(transparent)]
    Strategy(#[from] ParseBatchStrategyError),

    /// `appsync.url` is not an absolute URL with a host.
    #[error("invalid appsync.url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// `appsync.region` is empty.
    #[error("appsync.region must not be empty")]
    MissingRegion,
}

impl Config {
    /// Validates the endpoint settings and builds the transport configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` or `ConfigError::MissingRegion`.
    pub fn transport_config(&self) -> Result<TransportConfig, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidUrl {
            url: self.appsync.url.clone(),
            reason,
        };

        let endpoint = Url::parse(self.appsync.url.trim()).map_err(|e| invalid(e.to_string()))?;
        if endpoint.host_str().map_or(true, str::is_empty) {
            return Err(invalid("missing host".to_string()));
        }

        let region = self.appsync.region.trim();
        if region.is_empty() {
            return Err(ConfigError::MissingRegion);
        }

        let mut transport = TransportConfig::new(endpoint, region);
        transport.timeout = Duration::from_secs(self.pipeline.timeout_secs);
        Ok(transport)
    }

    /// Checks everything the server needs before it can start.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.transport_config().map(|_| ())
    }
}

/// Loads configuration from a TOML file, falling back to defaults, then
/// applies overrides from the process environment.
///
/// Environment variable overrides:
/// - `APPSYNC_URL` overrides `appsync.url`
/// - `REGION` (or `AWS_REGION`) overrides `appsync.region`
/// - `AWS_ACCESS_KEY_ID` + `AWS_SECRET_ACCESS_KEY` replace `credentials`
/// - `AWS_SESSION_TOKEN` attaches a session token to the credentials
/// - `NOTIFIER_HOST` / `NOTIFIER_PORT` override `server.host` / `server.port`
/// - `NOTIFIER_STRATEGY` overrides `pipeline.strategy` (`all` or `first-only`)
/// - `NOTIFIER_TIMEOUT_SECS` overrides `pipeline.timeout_secs`
/// - `NOTIFIER_LOG_LEVEL` overrides `logging.level`
/// - `NOTIFIER_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed,
/// or if an override cannot be applied.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    load_config_with(path, |name| std::env::var(name).ok())
}

/// Like [`load_config`], but reads overrides through `lookup` instead of
/// the process environment.
pub fn load_config_with(
    path: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_overrides(&mut config, lookup)?;
    Ok(config)
}

/// Applies environment-style overrides read through `lookup`.
///
/// Blank values are treated as unset. A host, port or timeout that does not
/// parse is ignored.
pub fn apply_overrides(
    config: &mut Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

    if let Some(url) = var("APPSYNC_URL") {
        config.appsync.url = url;
    }
    if let Some(region) = var("REGION").or_else(|| var("AWS_REGION")) {
        config.appsync.region = region;
    }

    if let (Some(key), Some(secret)) = (var("AWS_ACCESS_KEY_ID"), var("AWS_SECRET_ACCESS_KEY")) {
        config.credentials = Some(Credentials::new(key, secret));
    }
    if let Some(token) = var("AWS_SESSION_TOKEN") {
        config.credentials = config
            .credentials
            .take()
            .map(|creds| creds.with_session_token(token));
    }

    if let Some(host) = var("NOTIFIER_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = var("NOTIFIER_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(strategy) = var("NOTIFIER_STRATEGY") {
        config.pipeline.strategy = strategy.parse()?;
    }
    if let Some(timeout) = var("NOTIFIER_TIMEOUT_SECS") {
        if let Ok(parsed) = timeout.parse() {
            config.pipeline.timeout_secs = parsed;
        }
    }
    if let Some(level) = var("NOTIFIER_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("NOTIFIER_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    Ok(())
}
