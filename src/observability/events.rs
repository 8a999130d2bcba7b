//! Observable events
//!
//! Events are explicit and typed. Names are stable and appear verbatim
//! in the `event` field of every log line.

use std::fmt;

/// Observable events in the wiki store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Configuration loaded and validated
    ConfigLoaded,
    /// Session secret loaded
    SecretLoaded,
    /// Journals replayed, store ready
    StoreOpened,
    /// Journal corruption detected on open (FATAL)
    StoreCorrupted,
    /// Data directory already owned by another store
    StoreLocked,
    /// JSON-lines serving loop started
    ServeStart,
    /// JSON-lines serving loop finished
    ServeStop,

    // Credentials
    /// New user registered
    UserRegistered,
    /// Registration rejected: name taken
    RegistrationRejected,
    /// Login succeeded
    LoginSucceeded,
    /// Login rejected
    LoginRejected,

    // Sessions
    /// Token failed verification
    SignatureRejected,

    // Pages
    /// New page version appended
    VersionAppended,
    /// Compare-and-set on the expected version lost; retrying
    VersionConflictRetry,
    /// Retries exhausted
    VersionConflictExhausted,
    /// Edit rejected for a locked title
    EditRejectedLocked,

    // History
    /// Page view recorded
    ViewRecorded,
}

impl Event {
    /// Returns the event name
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SecretLoaded => "SECRET_LOADED",
            Event::StoreOpened => "STORE_OPENED",
            Event::StoreCorrupted => "STORE_CORRUPTED",
            Event::StoreLocked => "STORE_LOCKED",
            Event::ServeStart => "SERVE_START",
            Event::ServeStop => "SERVE_STOP",
            Event::UserRegistered => "USER_REGISTERED",
            Event::RegistrationRejected => "REGISTRATION_REJECTED",
            Event::LoginSucceeded => "LOGIN_SUCCEEDED",
            Event::LoginRejected => "LOGIN_REJECTED",
            Event::SignatureRejected => "SIGNATURE_REJECTED",
            Event::VersionAppended => "VERSION_APPENDED",
            Event::VersionConflictRetry => "VERSION_CONFLICT_RETRY",
            Event::VersionConflictExhausted => "VERSION_CONFLICT_EXHAUSTED",
            Event::EditRejectedLocked => "EDIT_REJECTED_LOCKED",
            Event::ViewRecorded => "VIEW_RECORDED",
        }
    }

    /// Default severity for this event
    pub fn severity(&self) -> super::Severity {
        use super::Severity;
        match self {
            Event::StoreCorrupted => Severity::Fatal,
            Event::VersionConflictExhausted | Event::StoreLocked => Severity::Error,
            Event::RegistrationRejected
            | Event::LoginRejected
            | Event::SignatureRejected
            | Event::VersionConflictRetry
            | Event::EditRejectedLocked => Severity::Warn,
            Event::ViewRecorded => Severity::Trace,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
