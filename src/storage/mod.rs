//! Durable storage primitives
//!
//! Each entity collection is persisted as its own append-only journal:
//!
//! ```text
//! <data_dir>/
//! ├── users.log
//! ├── pages.log
//! └── history.log
//! ```
//!
//! Journals are replayed into memory on open; there are no in-place updates.

mod checksum;
mod errors;
mod journal;

pub use checksum::{line_prefix, matches_prefix, parse_prefix};
pub use errors::{Severity, StorageError, StorageErrorCode, StorageResult};
pub use journal::Journal;

#[cfg(test)]
pub(crate) use journal::Fault;

/// Journal file for user records
pub const USERS_JOURNAL: &str = "users.log";

/// Journal file for page versions
pub const PAGES_JOURNAL: &str = "pages.log";

/// Journal file for history entries
pub const HISTORY_JOURNAL: &str = "history.log";
