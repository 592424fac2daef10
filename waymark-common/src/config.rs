//! Configuration loading and backend endpoint resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Compiled default backend endpoint
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8081";

/// Environment variable overriding the backend endpoint
pub const ENV_API_URL: &str = "WAYMARK_API_URL";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Optional TOML configuration file contents
///
/// All fields are optional; a missing file or missing field falls through
/// to the next resolution tier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Backend base URL, e.g. `http://127.0.0.1:8081`
    pub api_url: Option<String>,
    /// Per-request timeout in seconds
    pub request_timeout_secs: Option<u64>,
}

impl TomlConfig {
    /// Parse a config file at an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))
    }

    /// Load from the default platform location, degrading to defaults
    ///
    /// A missing or unreadable file is not fatal: the resolver has lower
    /// tiers to fall through to.
    pub fn load_default_location() -> Self {
        let Some(path) = default_config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("ignoring config file: {}", e);
                Self::default()
            }
        }
    }
}

/// Default configuration file path for the platform
///
/// `~/.config/waymark/config.toml` on Linux, the platform equivalent
/// elsewhere.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("waymark").join("config.toml"))
}

/// Resolved client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, no trailing slash
    pub api_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
}

/// Backend endpoint resolution following priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable (`WAYMARK_API_URL`)
/// 3. TOML config file
/// 4. Compiled default (fallback)
pub struct EndpointResolver {
    cli_url: Option<String>,
}

impl EndpointResolver {
    pub fn new(cli_url: Option<String>) -> Self {
        Self { cli_url }
    }

    /// Resolve the backend endpoint and request timeout
    pub fn resolve(&self) -> ClientConfig {
        let toml_config = TomlConfig::load_default_location();
        self.resolve_with(&toml_config)
    }

    /// Resolution against an already-loaded TOML config
    pub fn resolve_with(&self, toml_config: &TomlConfig) -> ClientConfig {
        // Priority 1: Command-line argument
        let api_url = if let Some(url) = &self.cli_url {
            tracing::info!(url = %url, "API endpoint from command line");
            url.clone()
        // Priority 2: Environment variable
        } else if let Ok(url) = std::env::var(ENV_API_URL) {
            tracing::info!(url = %url, "API endpoint from {}", ENV_API_URL);
            url
        // Priority 3: TOML config file
        } else if let Some(url) = &toml_config.api_url {
            tracing::info!(url = %url, "API endpoint from config file");
            url.clone()
        // Priority 4: Compiled default
        } else {
            DEFAULT_API_URL.to_string()
        };

        let timeout_secs = toml_config
            .request_timeout_secs
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        ClientConfig {
            api_url: api_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(timeout_secs),
        }
    }
}
