//! Storage error types
//!
//! | Code                          | Severity |
//! |-------------------------------|----------|
//! | `WIKI_STORAGE_IO_ERROR`       | ERROR    |
//! | `WIKI_STORAGE_ENCODE_FAILED`  | ERROR    |
//! | `WIKI_STORAGE_LOCKED`         | ERROR    |
//! | `WIKI_STORAGE_POISONED`       | FATAL    |
//! | `WIKI_DATA_CORRUPTION`        | FATAL    |
//!
//! A FATAL error means a journal can no longer be trusted: the store must
//! not open on top of it, or must be reopened before it writes again.

use std::fmt;
use std::io;

/// How bad a storage failure is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    /// Reading, writing or syncing a journal file failed
    Io,
    /// A record could not be serialized
    EncodeFailed,
    /// The journal is already owned by another open store
    Locked,
    /// A failed append could not be rolled back
    Poisoned,
    /// A journal line failed its checksum, did not decode, or broke an
    /// ordering rule during replay
    Corruption,
}

impl StorageErrorCode {
    /// Stable code string
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorCode::Io => "WIKI_STORAGE_IO_ERROR",
            StorageErrorCode::EncodeFailed => "WIKI_STORAGE_ENCODE_FAILED",
            StorageErrorCode::Locked => "WIKI_STORAGE_LOCKED",
            StorageErrorCode::Poisoned => "WIKI_STORAGE_POISONED",
            StorageErrorCode::Corruption => "WIKI_DATA_CORRUPTION",
        }
    }

    /// Severity of every error carrying this code
    pub fn severity(&self) -> Severity {
        match self {
            StorageErrorCode::Corruption | StorageErrorCode::Poisoned => Severity::Fatal,
            StorageErrorCode::Io | StorageErrorCode::EncodeFailed | StorageErrorCode::Locked => {
                Severity::Error
            }
        }
    }
}

/// A failed journal operation.
///
/// Corruption found while replaying carries the 1-based line number.
#[derive(Debug)]
pub struct StorageError {
    code: StorageErrorCode,
    message: String,
    line: Option<usize>,
    source: Option<io::Error>,
}

impl StorageError {
    fn new(code: StorageErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            line: None,
            source: None,
        }
    }

    /// I/O failure on a journal file
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            source: Some(source),
            ..Self::new(StorageErrorCode::Io, message)
        }
    }

    /// Record could not be encoded
    pub fn encode_failed(message: impl Into<String>) -> Self {
        Self::new(StorageErrorCode::EncodeFailed, message)
    }

    /// Journal is owned by another store
    pub fn locked(message: impl Into<String>) -> Self {
        Self::new(StorageErrorCode::Locked, message)
    }

    /// Journal refuses writes until reopened
    pub fn poisoned(message: impl Into<String>) -> Self {
        Self::new(StorageErrorCode::Poisoned, message)
    }

    /// Journal content is inconsistent
    pub fn corruption(message: impl Into<String>) -> Self {
        Self::new(StorageErrorCode::Corruption, message)
    }

    /// Journal line `line` is damaged
    pub fn corrupt_line(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line: Some(line),
            ..Self::corruption(reason)
        }
    }

    /// Error code
    pub fn code(&self) -> StorageErrorCode {
        self.code
    }

    /// Severity of the error code
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Offending journal line, if known
    pub fn line(&self) -> Option<usize> {
        self.line
    }

    /// True when the journal can no longer be trusted
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity(), self.code.code(), self.message)?;
        if let Some(line) = self.line {
            write!(f, " at line {}", line)?;
        }
        if let Some(source) = &self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
