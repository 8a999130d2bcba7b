//! Configuration and the session secret
//!
//! Both are loaded once at startup and never re-read. The secret is
//! injected into the token signer; rotating the secret file and restarting
//! invalidates every token issued under the previous secret.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{CredentialConfig, PasswordScheme};
use crate::observability::Severity;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config or secret file could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for [`WikiConfig`]
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiConfig {
    /// Data directory (required)
    pub data_dir: String,

    /// Secret file, relative to `data_dir` unless absolute
    #[serde(default = "default_secret_file")]
    pub secret_file: String,

    /// Scheme for newly registered users
    #[serde(default)]
    pub password_scheme: PasswordScheme,

    /// Salt length for the salted SHA-256 scheme
    #[serde(default = "default_salt_length")]
    pub salt_length: usize,

    /// Compare-and-set attempts per append before `VersionConflict`
    #[serde(default = "default_max_append_retries")]
    pub max_append_retries: u32,

    /// Titles that can never be edited
    #[serde(default = "default_locked_pages")]
    pub locked_pages: Vec<String>,

    /// Minimum log severity
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_secret_file() -> String {
    "authentication.txt".to_string()
}
fn default_salt_length() -> usize {
    5
}
fn default_max_append_retries() -> u32 {
    8
}
fn default_locked_pages() -> Vec<String> {
    ["/login", "/logout", "/signup", "/_pagehistory", "/_history"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl WikiConfig {
    /// Configuration with defaults for everything but the data directory
    pub fn new(data_dir: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            secret_file: default_secret_file(),
            password_scheme: PasswordScheme::default(),
            salt_length: default_salt_length(),
            max_append_retries: default_max_append_retries(),
            locked_pages: default_locked_pages(),
            log_level: default_log_level(),
        }
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: WikiConfig = serde_json::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(ConfigError::Invalid("data_dir must not be empty".to_string()));
        }

        if self.secret_file.trim().is_empty() {
            return Err(ConfigError::Invalid("secret_file must not be empty".to_string()));
        }

        if self.salt_length == 0 {
            return Err(ConfigError::Invalid("salt_length must be > 0".to_string()));
        }

        if self.max_append_retries == 0 {
            return Err(ConfigError::Invalid("max_append_retries must be > 0".to_string()));
        }

        self.log_severity()?;

        Ok(())
    }

    /// Get data directory as Path
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    /// Resolved path of the secret file
    pub fn secret_path(&self) -> PathBuf {
        let secret = Path::new(&self.secret_file);
        if secret.is_absolute() {
            secret.to_path_buf()
        } else {
            self.data_path().join(secret)
        }
    }

    /// Parsed minimum log severity
    pub fn log_severity(&self) -> ConfigResult<Severity> {
        self.log_level.parse().map_err(ConfigError::Invalid)
    }

    /// Credential settings derived from this configuration
    pub fn credential_config(&self) -> CredentialConfig {
        CredentialConfig {
            scheme: self.password_scheme,
            salt_length: self.salt_length,
        }
    }
}

/// Process-wide signing secret.
///
/// Immutable once loaded. `Debug` never prints the key material.
#[derive(Clone)]
pub struct Secret {
    bytes: Vec<u8>,
}

impl Secret {
    /// Wrap raw key material. Empty secrets are rejected.
    pub fn new(bytes: impl Into<Vec<u8>>) -> ConfigResult<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(ConfigError::Invalid("secret must not be empty".to_string()));
        }
        Ok(Self { bytes })
    }

    /// Read the secret file once.
    ///
    /// Trailing whitespace (such as the newline an editor appends) is
    /// not part of the secret.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let end = content
            .iter()
            .rposition(|b| !b.is_ascii_whitespace())
            .map_or(0, |i| i + 1);

        Self::new(&content[..end])
    }

    /// Generate fresh key material: 32 random bytes, hex-encoded.
    pub fn generate() -> String {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Raw key material
    pub fn expose(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret([REDACTED; {} bytes])", self.bytes.len())
    }
}
