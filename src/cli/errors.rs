//! CLI errors
//!
//! Any of these ends the process with exit code 1. Failures of individual
//! requests inside `start` are reported on stdout and never become a
//! `CliError`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::errors::WikiError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("already initialized: {} exists", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("not initialized: {} is missing, run 'wikistore init' first", .0.display())]
    NotInitialized(PathBuf),

    #[error("store failed to open: {0}")]
    BootFailed(#[from] WikiError),
}

impl CliError {
    /// Stable code string reported on exit
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "WIKI_CLI_CONFIG_ERROR",
            CliError::Io(_) | CliError::Json(_) => "WIKI_CLI_IO_ERROR",
            CliError::AlreadyInitialized(_) => "WIKI_CLI_ALREADY_INITIALIZED",
            CliError::NotInitialized(_) => "WIKI_CLI_NOT_INITIALIZED",
            CliError::BootFailed(_) => "WIKI_CLI_BOOT_FAILED",
        }
    }
}

/// Result type for CLI commands
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_initialized_names_secret_path() {
        let err = CliError::NotInitialized(PathBuf::from("/srv/wiki/authentication.txt"));
        assert_eq!(err.code(), "WIKI_CLI_NOT_INITIALIZED");
        assert!(err.to_string().contains("/srv/wiki/authentication.txt"));
    }

    #[test]
    fn test_conversions() {
        let err: CliError = ConfigError::Invalid("salt_length must be > 0".into()).into();
        assert_eq!(err.code(), "WIKI_CLI_CONFIG_ERROR");

        let err: CliError = WikiError::Storage("corrupt".into()).into();
        assert_eq!(err.code(), "WIKI_CLI_BOOT_FAILED");
    }
}
