//! PageVersion - Immutable page revision
//!
//! - A version is the full content of a page at one point in its history
//! - Numbered consecutively from 1 within its title
//! - Once created, never changes; edits create new versions
//!
//! All fields are private to enforce immutability.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single immutable page version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageVersion {
    title: String,
    version: u64,
    content: String,
    created: DateTime<Utc>,
    last_modified: DateTime<Utc>,
}

impl PageVersion {
    /// Creates version `version` of `title`, timestamped now.
    pub fn new(title: impl Into<String>, version: u64, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            title: title.into(),
            version,
            content: content.into(),
            created: now,
            last_modified: now,
        }
    }

    /// Returns the page title.
    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the version number (1-based).
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the page content.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns when this version was created.
    #[inline]
    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// Returns the last-modified time; always equal to `created`.
    #[inline]
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    /// Link to the editor for this page.
    pub fn edit_link(&self) -> String {
        format!("/_edit{}", self.title)
    }
}
