//! Configuration management

use std::{env, fmt, path::Path, str::FromStr, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Environment variable holding the shared operator secret.
pub const API_KEY_ENV: &str = "GATE_API_KEY";

/// Fallback operator key used when no key is configured.
///
/// Acceptable only for demo deployments. Startup logs a warning whenever
/// this value is in use.
pub const DEFAULT_API_KEY: &str = "demo-key-change-me";

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Environment files to load before resolving the API key.
    /// Loaded in order, later files override earlier. Missing files are
    /// skipped.
    pub env_files: Vec<String>,
    /// Server configuration
    pub server: ServerConfig,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// Streaming configuration (broadcast variant)
    pub streaming: StreamingConfig,
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        // Load from file if provided
        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        // Merge environment variables (GATE_ prefix)
        figment = figment.merge(Env::prefixed("GATE_").split("__"));

        let config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        // Load env files into the process environment before the API key
        // is resolved.
        config.load_env_files();

        Ok(config)
    }

    /// Load environment files into the process environment.
    /// Files that don't exist are silently skipped.
    fn load_env_files(&self) {
        for path_str in &self.env_files {
            let path = Path::new(path_str);
            if path.exists() {
                match dotenvy::from_path(path) {
                    Ok(()) => {
                        tracing::info!("Loaded env file: {path_str}");
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load env file {path_str}: {e}");
                    }
                }
            } else {
                tracing::debug!("Env file not found (skipped): {path_str}");
            }
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Endpoint variant to expose
    pub variant: Variant,
    /// Directory served under /static; its index.html is the landing page
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            variant: Variant::Broadcast,
            static_dir: "static".to_string(),
        }
    }
}

/// Which endpoint set a process exposes.
///
/// The two variants are independent: `broadcast` pushes events to connected
/// clients over a live stream, `poll` keeps a shared state record that
/// clients read repeatedly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Push-based: clients hold a live event stream fed by broadcasts.
    Broadcast,
    /// Pull-based: clients poll a shared status record.
    Poll,
}

impl Variant {
    /// Lowercase name as used in config files and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Broadcast => "broadcast",
            Self::Poll => "poll",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "broadcast" => Ok(Self::Broadcast),
            "poll" => Ok(Self::Poll),
            other => Err(format!(
                "Unknown variant '{other}' (expected 'broadcast' or 'poll')"
            )),
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared operator key. The `GATE_API_KEY` environment variable takes
    /// precedence; when neither is set the insecure demo default applies.
    pub api_key: Option<String>,
}

impl AuthConfig {
    /// Resolve the operator key: environment, then config file, then the
    /// demo default.
    #[must_use]
    pub fn resolve_api_key(&self) -> String {
        self.resolve_with(env::var(API_KEY_ENV).ok())
    }

    fn resolve_with(&self, env_value: Option<String>) -> String {
        env_value
            .or_else(|| self.api_key.clone())
            .unwrap_or_else(|| DEFAULT_API_KEY.to_string())
    }
}

/// Streaming configuration for the broadcast variant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Idle interval after which a keepalive event is sent to a subscriber
    #[serde(with = "humantime_serde")]
    pub keep_alive_interval: Duration,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            keep_alive_interval: Duration::from_secs(30),
        }
    }
}
