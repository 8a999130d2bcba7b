//! Pages and page-view history
//!
//! This module provides:
//! - `PageVersion` - Immutable page revision
//! - `VersionStore` - Per-title version chains with linearized appends
//! - `HistoryLog` - Append-only page-view log
//! - Repository traits with in-memory and journal-backed implementations

mod history;
mod repository;
mod version;
mod version_store;

pub use history::{
    FileHistoryRepository, HistoryEntry, HistoryLog, HistoryRepository,
    InMemoryHistoryRepository,
};
pub use repository::{FilePageRepository, InMemoryPageRepository, PageRepository};
pub use version::PageVersion;
pub use version_store::{VersionStore, DEFAULT_MAX_APPEND_RETRIES};
