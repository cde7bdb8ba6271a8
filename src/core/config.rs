//! Provider configuration
//!
//! Configuration is read from TOML. Every key is optional; a missing file
//! or an empty document yields [`ProviderConfig::default`]. The default
//! location is `<config_dir>/Courier/courier.toml`.
//!
//! ```toml
//! provider_name = "courier"
//! auto_create_destinations = false
//! queues = ["LoanRequestQ", "LoanResponseQ"]
//! topics = ["RateTopic"]
//! request_timeout_ms = 30000
//! max_durable_backlog = 10000
//!
//! [aliases]
//! "jms/LoanRequest" = "LoanRequestQ"
//!
//! [logging]
//! level = "info"
//! format = "text"
//! ```

use crate::correlation::CorrelationStrategy;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Log backend settings, see [`crate::core::logging::init_from_config`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file: Option<String>,
    pub color: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            file: None,
            color: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Name reported through provider metadata
    pub provider_name: String,
    /// Create queues and topics on first reference instead of failing with `NameNotFound`
    pub auto_create_destinations: bool,
    /// Queues declared at startup
    pub queues: Vec<String>,
    /// Topics declared at startup
    pub topics: Vec<String>,
    /// Lookup names mapped onto physical destination names
    pub aliases: HashMap<String, String>,
    /// Default reply wait for request/reply calls
    pub request_timeout_ms: u64,
    /// How long shutdown waits for listener tasks to finish their current message
    pub shutdown_grace_ms: u64,
    /// Upper bound on each durable subscription backlog; oldest messages are evicted
    pub max_durable_backlog: Option<usize>,
    /// Push a message back to its mailbox when a listener fails on it
    pub redeliver_on_listener_failure: bool,
    /// Redelivery attempts after the first failed delivery
    pub max_redeliveries: u32,
    pub correlation_strategy: CorrelationStrategy,
    /// Directory for the JSON lines message store; no persistence when unset
    pub store_dir: Option<PathBuf>,
    pub logging: LoggingConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_name: "courier".to_string(),
            auto_create_destinations: true,
            queues: Vec::new(),
            topics: Vec::new(),
            aliases: HashMap::new(),
            request_timeout_ms: 30_000,
            shutdown_grace_ms: 5_000,
            max_durable_backlog: None,
            redeliver_on_listener_failure: false,
            max_redeliveries: 3,
            correlation_strategy: CorrelationStrategy::default(),
            store_dir: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl ProviderConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file; the file must exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loading provider configuration from {}", path.display());
        Self::from_toml_str(&contents)
    }

    /// Default configuration file location for this platform
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("Courier").join("courier.toml"))
    }

    /// Load the configuration from the default location, or defaults if absent
    pub fn discover() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                log::debug!("No provider configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Reject configurations that cannot describe a consistent registry
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "provider_name must not be empty".to_string(),
            });
        }

        let mut seen = std::collections::HashSet::new();
        for name in self.queues.iter().chain(self.topics.iter()) {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    message: "destination names must not be empty".to_string(),
                });
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::Invalid {
                    message: format!("destination '{}' is declared more than once", name),
                });
            }
        }

        for (alias, target) in &self.aliases {
            if seen.contains(alias.as_str()) {
                return Err(ConfigError::Invalid {
                    message: format!("alias '{}' shadows a declared destination", alias),
                });
            }
            if target.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    message: format!("alias '{}' has an empty target", alias),
                });
            }
        }

        if self.max_durable_backlog == Some(0) {
            return Err(ConfigError::Invalid {
                message: "max_durable_backlog must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}
