//! Configuration file parsing for the server.
//!
//! Settings come from an optional TOML file, then environment overrides,
//! then command-line overrides. The model credential is required: a missing
//! key stops the server at startup instead of failing the first request.

use kaiva_extractor::ExtractorConfig;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable holding the OpenAI key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable overriding `address:port`
pub const BIND_ENV: &str = "KAIVA_BIND";

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// Field present but unusable
    #[error("Invalid configuration value for {field}: {reason}")]
    Invalid {
        /// Offending field
        field: String,
        /// What is wrong with it
        reason: String,
    },
}

/// API key that never appears in `Debug` output
#[derive(Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key itself, for handing to the provider
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// First six characters, safe to log
    pub fn prefix(&self) -> String {
        self.0.chars().take(6).collect()
    }

    fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({}...)", self.prefix())
    }
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Bind port (e.g., 8000)
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,

    /// OpenAI API key; `OPENAI_API_KEY` takes precedence
    #[serde(default)]
    pub openai_api_key: ApiKey,

    /// API root for chat completions
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    /// Chat model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,

    /// Model request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Directory for generated spreadsheets
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    /// Origins allowed by CORS; `"*"` allows any origin without credentials
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Largest accepted upload body in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Extraction pipeline settings
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_bind_port() -> u16 {
    8000
}

fn default_openai_base_url() -> String {
    kaiva_llm::openai::DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    kaiva_llm::openai::DEFAULT_MODEL.to_string()
}

fn default_request_timeout() -> u64 {
    kaiva_llm::openai::DEFAULT_TIMEOUT_SECS
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("abstracts")
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "https://kaiva.ai".to_string(),
    ]
}

/// Default upload limit: 10 MiB
fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            bind_port: default_bind_port(),
            openai_api_key: ApiKey::default(),
            openai_base_url: default_openai_base_url(),
            model: default_model(),
            temperature: 0.0,
            request_timeout_secs: default_request_timeout(),
            artifact_dir: default_artifact_dir(),
            allowed_origins: default_allowed_origins(),
            max_upload_bytes: default_max_upload_bytes(),
            extractor: ExtractorConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Load from an optional file and apply the process environment
    ///
    /// Not validated: callers apply command-line overrides first.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.openai_api_key = ApiKey::new(key);
        }
        if let Some(bind) = lookup(BIND_ENV) {
            self.set_bind(&bind)?;
        }
        Ok(())
    }

    /// Override address and port from `address:port`
    pub fn set_bind(&mut self, bind: &str) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::Invalid {
            field: "bind".to_string(),
            reason: format!("{} ({})", reason, bind),
        };

        let (address, port) = bind
            .rsplit_once(':')
            .ok_or_else(|| invalid("expected address:port"))?;
        if address.is_empty() {
            return Err(invalid("empty address"));
        }
        let port = port.parse::<u16>().map_err(|_| invalid("port is not a number"))?;

        self.bind_address = address.to_string();
        self.bind_port = port;
        Ok(())
    }

    /// Check that the configuration can start a server
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.openai_api_key.is_blank() {
            return Err(ConfigError::MissingField(format!(
                "openai_api_key (or {} environment variable)",
                API_KEY_ENV
            )));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "max_upload_bytes".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_secs".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        self.extractor
            .validate()
            .map_err(|reason| ConfigError::Invalid {
                field: "extractor".to_string(),
                reason,
            })
    }

    /// Create a default configuration for testing
    pub fn default_test_config() -> Self {
        Self {
            openai_api_key: ApiKey::new("sk-test-key-do-not-use"),
            ..Self::default()
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}
