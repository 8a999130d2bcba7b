//! HistoryLog - Append-only log of page views
//!
//! One entry per successful view, no uniqueness. Entries are ordered by
//! `added`; entries with equal timestamps are ordered by arrival.

use std::path::Path;
use std::sync::{Mutex, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{lock_poisoned, WikiError, WikiResult};
use crate::observability::{log_event_with_fields, Event};
use crate::storage::{Journal, HISTORY_JOURNAL};

/// A single page-view event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub title: String,
    pub added: DateTime<Utc>,
}

impl HistoryEntry {
    /// An entry for `title` stamped now
    pub fn now(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            added: Utc::now(),
        }
    }
}

/// History repository trait
pub trait HistoryRepository: Send + Sync {
    /// Append an entry
    fn append(&self, entry: &HistoryEntry) -> WikiResult<()>;

    /// Entry with the latest timestamp (latest arrival on ties)
    fn latest(&self) -> WikiResult<Option<HistoryEntry>>;

    /// All entries, most recent first
    fn newest_first(&self) -> WikiResult<Vec<HistoryEntry>>;

    /// Number of entries
    fn len(&self) -> WikiResult<usize>;
}

fn latest_of(entries: &[HistoryEntry]) -> Option<HistoryEntry> {
    // max_by_key keeps the last of equal maxima
    entries.iter().max_by_key(|e| e.added).cloned()
}

fn newest_first_of(entries: &[HistoryEntry]) -> Vec<HistoryEntry> {
    let mut sorted: Vec<_> = entries.iter().rev().cloned().collect();
    // stable: equal timestamps stay latest-arrival first
    sorted.sort_by(|a, b| b.added.cmp(&a.added));
    sorted
}

/// In-memory history repository, entries in arrival order
#[derive(Debug, Default)]
pub struct InMemoryHistoryRepository {
    entries: RwLock<Vec<HistoryEntry>>,
}

impl InMemoryHistoryRepository {
    /// An empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryRepository for InMemoryHistoryRepository {
    fn append(&self, entry: &HistoryEntry) -> WikiResult<()> {
        let mut entries = self.entries.write().map_err(|_| lock_poisoned())?;
        entries.push(entry.clone());
        Ok(())
    }

    fn latest(&self) -> WikiResult<Option<HistoryEntry>> {
        let entries = self.entries.read().map_err(|_| lock_poisoned())?;
        Ok(latest_of(&entries))
    }

    fn newest_first(&self) -> WikiResult<Vec<HistoryEntry>> {
        let entries = self.entries.read().map_err(|_| lock_poisoned())?;
        Ok(newest_first_of(&entries))
    }

    fn len(&self) -> WikiResult<usize> {
        let entries = self.entries.read().map_err(|_| lock_poisoned())?;
        Ok(entries.len())
    }
}

/// Journal-backed history repository
pub struct FileHistoryRepository {
    index: InMemoryHistoryRepository,
    journal: Mutex<Journal<HistoryEntry>>,
}

impl FileHistoryRepository {
    /// Opens `<data_dir>/history.log`, replaying every entry.
    pub fn open(data_dir: &Path) -> WikiResult<Self> {
        let (journal, entries) = Journal::open(data_dir.join(HISTORY_JOURNAL))?;
        Ok(Self {
            index: InMemoryHistoryRepository {
                entries: RwLock::new(entries),
            },
            journal: Mutex::new(journal),
        })
    }
}

impl HistoryRepository for FileHistoryRepository {
    fn append(&self, entry: &HistoryEntry) -> WikiResult<()> {
        let mut journal = self.journal.lock().map_err(|_| lock_poisoned())?;
        journal.append(entry)?;
        self.index.append(entry)
    }

    fn latest(&self) -> WikiResult<Option<HistoryEntry>> {
        self.index.latest()
    }

    fn newest_first(&self) -> WikiResult<Vec<HistoryEntry>> {
        self.index.newest_first()
    }

    fn len(&self) -> WikiResult<usize> {
        self.index.len()
    }
}

/// Page-view history
pub struct HistoryLog<R: HistoryRepository> {
    repository: R,
}

impl<R: HistoryRepository> HistoryLog<R> {
    /// A log over `repository`.
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Record a view of `title` at the current time.
    pub fn record_view(&self, title: &str) -> WikiResult<()> {
        self.repository.append(&HistoryEntry::now(title))?;
        log_event_with_fields(Event::ViewRecorded, &[("title", title)]);
        Ok(())
    }

    /// Title of the most recent view.
    pub fn most_recent(&self) -> WikiResult<String> {
        self.repository
            .latest()?
            .map(|entry| entry.title)
            .ok_or(WikiError::EmptyHistory)
    }

    /// Every entry, most recent first.
    pub fn dump(&self) -> WikiResult<Vec<HistoryEntry>> {
        self.repository.newest_first()
    }

    /// Number of recorded views
    pub fn len(&self) -> WikiResult<usize> {
        self.repository.len()
    }

    /// Returns true if nothing has been viewed yet
    pub fn is_empty(&self) -> WikiResult<bool> {
        Ok(self.repository.len()? == 0)
    }
}
