//! # Wiki Errors
//!
//! Error taxonomy shared by the credential store, token signer,
//! version store and history log.

use thiserror::Error;

use crate::storage::{StorageError, StorageErrorCode};

/// Result type for wiki operations
pub type WikiResult<T> = Result<T, WikiError>;

/// Typed failures reported by the core.
///
/// Lookup misses are not errors; they are returned as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WikiError {
    // ==================
    // Credential Errors
    // ==================

    /// A user with this name is already registered
    #[error("User already exists")]
    DuplicateUser,

    /// Unknown user or wrong password (deliberately indistinguishable)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Password hashing failed
    #[error("Internal error: password hashing failed")]
    HashingFailed,

    // ==================
    // Session Errors
    // ==================

    /// Token is malformed or its MAC does not match
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Value cannot be signed because it contains the token separator
    #[error("Value cannot be signed: {0}")]
    MalformedValue(String),

    /// Operation requires a valid session
    #[error("Authentication required")]
    AuthenticationRequired,

    // ==================
    // Page Errors
    // ==================

    /// The history log has no entries
    #[error("History is empty")]
    EmptyHistory,

    /// Concurrent appends kept colliding until retries ran out
    #[error("Version conflict on '{title}' after {attempts} attempts")]
    VersionConflict { title: String, attempts: u32 },

    /// Title is on the locked page list
    #[error("Page is locked: {0}")]
    PageLocked(String),

    // ==================
    // Internal Errors
    // ==================

    /// Storage operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// A journal failed verification; the store must not be used
    #[error("Data corruption: {0}")]
    DataCorruption(String),

    /// Another open store already owns the data directory
    #[error("Store is locked: {0}")]
    StoreLocked(String),
}

impl WikiError {
    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            WikiError::DuplicateUser => "WIKI_DUPLICATE_USER",
            WikiError::InvalidCredentials => "WIKI_INVALID_CREDENTIALS",
            WikiError::HashingFailed => "WIKI_HASHING_FAILED",
            WikiError::InvalidSignature => "WIKI_INVALID_SIGNATURE",
            WikiError::MalformedValue(_) => "WIKI_MALFORMED_VALUE",
            WikiError::AuthenticationRequired => "WIKI_AUTHENTICATION_REQUIRED",
            WikiError::EmptyHistory => "WIKI_EMPTY_HISTORY",
            WikiError::VersionConflict { .. } => "WIKI_VERSION_CONFLICT",
            WikiError::PageLocked(_) => "WIKI_PAGE_LOCKED",
            WikiError::Storage(_) => "WIKI_STORAGE_ERROR",
            WikiError::DataCorruption(_) => "WIKI_DATA_CORRUPTION",
            WikiError::StoreLocked(_) => "WIKI_STORE_LOCKED",
        }
    }

    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            WikiError::MalformedValue(_) => 400,

            // 401 Unauthorized
            WikiError::InvalidCredentials => 401,
            WikiError::InvalidSignature => 401,
            WikiError::AuthenticationRequired => 401,

            // 403 Forbidden
            WikiError::PageLocked(_) => 403,

            // 404 Not Found
            WikiError::EmptyHistory => 404,

            // 409 Conflict
            WikiError::DuplicateUser => 409,
            WikiError::VersionConflict { .. } => 409,

            // 500 Internal Server Error
            WikiError::HashingFailed => 500,
            WikiError::Storage(_) => 500,
            WikiError::DataCorruption(_) => 500,

            // 503 Service Unavailable
            WikiError::StoreLocked(_) => 503,
        }
    }

    /// Returns whether this error should be logged at warn level
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

/// Error for a poisoned repository or title lock
pub(crate) fn lock_poisoned() -> WikiError {
    WikiError::Storage("Lock poisoned".to_string())
}

impl From<StorageError> for WikiError {
    fn from(e: StorageError) -> Self {
        match e.code() {
            StorageErrorCode::Corruption => WikiError::DataCorruption(e.to_string()),
            StorageErrorCode::Locked => WikiError::StoreLocked(e.to_string()),
            StorageErrorCode::Io
            | StorageErrorCode::EncodeFailed
            | StorageErrorCode::Poisoned => WikiError::Storage(e.to_string()),
        }
    }
}
