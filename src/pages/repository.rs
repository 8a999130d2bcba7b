//! Page version repositories
//!
//! Storage contract for version chains:
//! - `(title, version)` is unique
//! - a title's versions are kept ordered by version number
//! - the only write is a compare-and-set append against the expected
//!   current latest version, so a stale writer can never overwrite or
//!   duplicate a version

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, RwLock};

use crate::errors::{lock_poisoned, WikiResult};
use crate::storage::{Journal, StorageError, PAGES_JOURNAL};

use super::PageVersion;

/// Page repository trait
pub trait PageRepository: Send + Sync {
    /// Exact version lookup
    fn find(&self, title: &str, version: u64) -> WikiResult<Option<PageVersion>>;

    /// Highest-numbered version of `title`
    fn latest(&self, title: &str) -> WikiResult<Option<PageVersion>>;

    /// All versions of `title`, ascending
    fn list(&self, title: &str) -> WikiResult<Vec<PageVersion>>;

    /// Store `page` only if the latest version of its title is still
    /// `expected` (`None` meaning the title has no versions) and `page`
    /// is numbered `expected + 1`.
    ///
    /// Returns `false` without writing when the expectation is stale.
    fn append_if_latest(&self, page: &PageVersion, expected: Option<u64>) -> WikiResult<bool>;
}

/// Ordered version chains keyed by title.
///
/// `chains[title][i]` holds version `i + 1`.
#[derive(Debug, Default)]
struct Chains {
    chains: HashMap<String, Vec<PageVersion>>,
}

impl Chains {
    fn latest_number(&self, title: &str) -> Option<u64> {
        self.chains
            .get(title)
            .and_then(|chain| chain.last())
            .map(PageVersion::version)
    }

    fn accepts(&self, page: &PageVersion, expected: Option<u64>) -> bool {
        self.latest_number(page.title()) == expected
            && page.version() == expected.map_or(1, |v| v + 1)
    }

    fn push(&mut self, page: PageVersion) {
        self.chains
            .entry(page.title().to_string())
            .or_default()
            .push(page);
    }
}

/// In-memory page repository
#[derive(Debug, Default)]
pub struct InMemoryPageRepository {
    pages: RwLock<Chains>,
}

impl InMemoryPageRepository {
    /// An empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of titles with at least one version
    pub fn title_count(&self) -> WikiResult<usize> {
        let pages = self.pages.read().map_err(|_| lock_poisoned())?;
        Ok(pages.chains.len())
    }

    fn accepts(&self, page: &PageVersion, expected: Option<u64>) -> WikiResult<bool> {
        let pages = self.pages.read().map_err(|_| lock_poisoned())?;
        Ok(pages.accepts(page, expected))
    }
}

impl PageRepository for InMemoryPageRepository {
    fn find(&self, title: &str, version: u64) -> WikiResult<Option<PageVersion>> {
        if version == 0 {
            return Ok(None);
        }
        let pages = self.pages.read().map_err(|_| lock_poisoned())?;
        Ok(pages
            .chains
            .get(title)
            .and_then(|chain| chain.get((version - 1) as usize))
            .cloned())
    }

    fn latest(&self, title: &str) -> WikiResult<Option<PageVersion>> {
        let pages = self.pages.read().map_err(|_| lock_poisoned())?;
        Ok(pages.chains.get(title).and_then(|chain| chain.last()).cloned())
    }

    fn list(&self, title: &str) -> WikiResult<Vec<PageVersion>> {
        let pages = self.pages.read().map_err(|_| lock_poisoned())?;
        Ok(pages.chains.get(title).cloned().unwrap_or_default())
    }

    fn append_if_latest(&self, page: &PageVersion, expected: Option<u64>) -> WikiResult<bool> {
        let mut pages = self.pages.write().map_err(|_| lock_poisoned())?;
        if !pages.accepts(page, expected) {
            return Ok(false);
        }
        pages.push(page.clone());
        Ok(true)
    }
}

/// Journal-backed page repository.
///
/// Reads are served from memory; an append holds the journal lock across
/// the expectation check, the durable write and the in-memory insert.
pub struct FilePageRepository {
    index: InMemoryPageRepository,
    journal: Mutex<Journal<PageVersion>>,
}

impl FilePageRepository {
    /// Opens `<data_dir>/pages.log`, replaying every version chain.
    ///
    /// A journal whose versions are not consecutive per title is corrupt.
    pub fn open(data_dir: &Path) -> WikiResult<Self> {
        let (journal, pages) = Journal::<PageVersion>::open(data_dir.join(PAGES_JOURNAL))?;
        let index = InMemoryPageRepository::new();

        for page in &pages {
            let expected = page.version().checked_sub(1).filter(|v| *v > 0);
            if !index.append_if_latest(page, expected)? {
                return Err(StorageError::corruption(format!(
                    "version {} of '{}' out of sequence in {}",
                    page.version(),
                    page.title(),
                    PAGES_JOURNAL
                ))
                .into());
            }
        }

        Ok(Self {
            index,
            journal: Mutex::new(journal),
        })
    }

    /// Number of titles with at least one version
    pub fn title_count(&self) -> WikiResult<usize> {
        self.index.title_count()
    }
}

impl PageRepository for FilePageRepository {
    fn find(&self, title: &str, version: u64) -> WikiResult<Option<PageVersion>> {
        self.index.find(title, version)
    }

    fn latest(&self, title: &str) -> WikiResult<Option<PageVersion>> {
        self.index.latest(title)
    }

    fn list(&self, title: &str) -> WikiResult<Vec<PageVersion>> {
        self.index.list(title)
    }

    fn append_if_latest(&self, page: &PageVersion, expected: Option<u64>) -> WikiResult<bool> {
        let mut journal = self.journal.lock().map_err(|_| lock_poisoned())?;

        if !self.index.accepts(page, expected)? {
            return Ok(false);
        }

        journal.append(page)?;
        self.index.append_if_latest(page, expected)
    }
}
