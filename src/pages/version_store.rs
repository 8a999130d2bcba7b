//! VersionStore - Append-only version chains per title
//!
//! Version numbers for a title are exactly 1..N with no gaps or duplicates.
//!
//! `append_version` is linearized per title in two layers:
//! 1. a per-title critical section serializes read-latest / compute-next /
//!    write within this process
//! 2. the repository write is a compare-and-set against the version read in
//!    step 1, so a writer that reaches the same repository without going
//!    through this store's lock loses the race instead of overwriting
//!
//! Other processes cannot share the backing store: file repositories hold an
//! exclusive lock on their journal, and a second open fails with
//! `StoreLocked`.
//!
//! A lost compare-and-set is retried a bounded number of times before
//! `VersionConflict` is surfaced.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::repository::PageRepository;
use super::PageVersion;
use crate::errors::{lock_poisoned, WikiError, WikiResult};
use crate::observability::{log_event_with_fields, Event};

/// Default compare-and-set attempts per append
pub const DEFAULT_MAX_APPEND_RETRIES: u32 = 8;

/// Versioned page store
pub struct VersionStore<R: PageRepository> {
    repository: R,
    title_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    max_retries: u32,
}

impl<R: PageRepository> VersionStore<R> {
    /// A store with the default retry budget.
    pub fn new(repository: R) -> Self {
        Self::with_max_retries(repository, DEFAULT_MAX_APPEND_RETRIES)
    }

    /// A store that gives up after `max_retries` lost compare-and-sets.
    ///
    /// Zero is treated as one attempt.
    pub fn with_max_retries(repository: R, max_retries: u32) -> Self {
        Self {
            repository,
            title_locks: Mutex::new(HashMap::new()),
            max_retries: max_retries.max(1),
        }
    }

    /// Highest-numbered version of `title`, if any.
    pub fn latest(&self, title: &str) -> WikiResult<Option<PageVersion>> {
        self.repository.latest(title)
    }

    /// Exact version lookup.
    pub fn get_version(&self, title: &str, version: u64) -> WikiResult<Option<PageVersion>> {
        self.repository.find(title, version)
    }

    /// Every version of `title`, ascending. Empty for unknown titles.
    pub fn list_versions(&self, title: &str) -> WikiResult<Vec<PageVersion>> {
        self.repository.list(title)
    }

    /// Append `content` as the next version of `title`.
    pub fn append_version(&self, title: &str, content: &str) -> WikiResult<PageVersion> {
        let lock = self.title_lock(title)?;
        let _guard = lock.lock().map_err(|_| lock_poisoned())?;

        for attempt in 1..=self.max_retries {
            let expected = self.repository.latest(title)?.map(|p| p.version());
            let next = expected.map_or(1, |v| v + 1);
            let page = PageVersion::new(title, next, content);

            if self.repository.append_if_latest(&page, expected)? {
                log_event_with_fields(
                    Event::VersionAppended,
                    &[("title", title), ("version", &next.to_string())],
                );
                return Ok(page);
            }

            log_event_with_fields(
                Event::VersionConflictRetry,
                &[
                    ("attempt", &attempt.to_string()),
                    ("title", title),
                    ("version", &next.to_string()),
                ],
            );
        }

        log_event_with_fields(
            Event::VersionConflictExhausted,
            &[("attempts", &self.max_retries.to_string()), ("title", title)],
        );
        Err(WikiError::VersionConflict {
            title: title.to_string(),
            attempts: self.max_retries,
        })
    }

    /// The critical section for `title`, created on first use.
    ///
    /// Entries live as long as the store; titles are never deleted.
    fn title_lock(&self, title: &str) -> WikiResult<Arc<Mutex<()>>> {
        let mut locks = self.title_locks.lock().map_err(|_| lock_poisoned())?;
        Ok(Arc::clone(locks.entry(title.to_string()).or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::InMemoryPageRepository;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Loses the first `failures` compare-and-sets, as if another
    /// writer kept winning the race.
    struct ContendedRepository {
        inner: InMemoryPageRepository,
        failures: AtomicU32,
    }

    impl ContendedRepository {
        fn failing(failures: u32) -> Self {
            Self {
                inner: InMemoryPageRepository::new(),
                failures: AtomicU32::new(failures),
            }
        }
    }

    impl PageRepository for ContendedRepository {
        fn find(&self, title: &str, version: u64) -> WikiResult<Option<PageVersion>> {
            self.inner.find(title, version)
        }

        fn latest(&self, title: &str) -> WikiResult<Option<PageVersion>> {
            self.inner.latest(title)
        }

        fn list(&self, title: &str) -> WikiResult<Vec<PageVersion>> {
            self.inner.list(title)
        }

        fn append_if_latest(&self, page: &PageVersion, expected: Option<u64>) -> WikiResult<bool> {
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Ok(false);
            }
            self.inner.append_if_latest(page, expected)
        }
    }

    #[test]
    fn test_first_version_is_one() {
        let store = VersionStore::new(InMemoryPageRepository::new());
        let page = store.append_version("/Home", "hello").unwrap();

        assert_eq!(page.version(), 1);
        assert_eq!(page.title(), "/Home");
        assert_eq!(page.content(), "hello");
    }

    #[test]
    fn test_versions_are_consecutive() {
        let store = VersionStore::new(InMemoryPageRepository::new());
        for i in 1..=5 {
            assert_eq!(store.append_version("/Home", &format!("v{}", i)).unwrap().version(), i);
        }

        let versions: Vec<_> = store
            .list_versions("/Home")
            .unwrap()
            .iter()
            .map(|p| p.version())
            .collect();
        assert_eq!(versions, vec![1, 2, 3, 4, 5]);
        assert_eq!(store.latest("/Home").unwrap().unwrap().content(), "v5");
        assert_eq!(store.get_version("/Home", 3).unwrap().unwrap().content(), "v3");
    }

    #[test]
    fn test_unknown_title_is_absent_not_error() {
        let store = VersionStore::new(InMemoryPageRepository::new());
        assert!(store.latest("/Nope").unwrap().is_none());
        assert!(store.get_version("/Nope", 1).unwrap().is_none());
        assert!(store.list_versions("/Nope").unwrap().is_empty());
    }

    #[test]
    fn test_lost_race_is_retried() {
        let store = VersionStore::with_max_retries(ContendedRepository::failing(3), 4);
        let page = store.append_version("/Home", "hello").unwrap();

        assert_eq!(page.version(), 1);
        assert_eq!(store.list_versions("/Home").unwrap().len(), 1);
    }

    #[test]
    fn test_exhausted_retries_surface_conflict() {
        let store = VersionStore::with_max_retries(ContendedRepository::failing(10), 3);
        let result = store.append_version("/Home", "hello");

        assert_eq!(
            result,
            Err(WikiError::VersionConflict {
                title: "/Home".to_string(),
                attempts: 3,
            })
        );
        assert!(store.latest("/Home").unwrap().is_none());

        // Contention cleared: the next append succeeds
        let store = VersionStore::with_max_retries(ContendedRepository::failing(0), 3);
        assert!(store.append_version("/Home", "hello").is_ok());
    }

    #[test]
    fn test_zero_retries_still_attempts_once() {
        let store = VersionStore::with_max_retries(InMemoryPageRepository::new(), 0);
        assert_eq!(store.append_version("/Home", "x").unwrap().version(), 1);
    }
}
