//! # Wiki
//!
//! Composes the credential store, token signer, version store and history
//! log into the request-level flows a web layer needs: signup and login
//! issuing session tokens, authenticated edits, and views that are
//! recorded in the history log.

use std::path::Path;

use uuid::Uuid;

use crate::auth::{
    CredentialStore, FileUserRepository, InMemoryUserRepository, TokenSigner, User,
    UserRepository,
};
use crate::config::{Secret, WikiConfig};
use crate::errors::{WikiError, WikiResult};
use crate::observability::{log_event_with_fields, Event};
use crate::pages::{
    FileHistoryRepository, FilePageRepository, HistoryEntry, HistoryLog, HistoryRepository,
    InMemoryHistoryRepository, InMemoryPageRepository, PageRepository, PageVersion,
    VersionStore,
};

/// Wiki backed by the on-disk journals
pub type FileWiki = Wiki<FilePageRepository, FileHistoryRepository, FileUserRepository>;

/// Wiki held entirely in memory
pub type MemoryWiki = Wiki<InMemoryPageRepository, InMemoryHistoryRepository, InMemoryUserRepository>;

/// The wiki core
pub struct Wiki<P: PageRepository, H: HistoryRepository, U: UserRepository> {
    pages: VersionStore<P>,
    history: HistoryLog<H>,
    credentials: CredentialStore<U>,
    signer: TokenSigner,
    locked_pages: Vec<String>,
}

impl<P, H, U> Wiki<P, H, U>
where
    P: PageRepository,
    H: HistoryRepository,
    U: UserRepository,
{
    /// Assemble a wiki from already-constructed components.
    pub fn from_parts(
        pages: VersionStore<P>,
        history: HistoryLog<H>,
        credentials: CredentialStore<U>,
        signer: TokenSigner,
        locked_pages: Vec<String>,
    ) -> Self {
        Self {
            pages,
            history,
            credentials,
            signer,
            locked_pages,
        }
    }

    // ==================
    // Sessions
    // ==================

    /// Register a user and issue a session token for them.
    pub fn signup(
        &self,
        name: &str,
        password: &str,
        email: Option<&str>,
    ) -> WikiResult<(User, String)> {
        let user = self.credentials.register(name, password, email)?;
        let token = self.issue_token(&user)?;
        Ok((user, token))
    }

    /// Check credentials and issue a session token.
    pub fn login(&self, name: &str, password: &str) -> WikiResult<(User, String)> {
        let user = self.credentials.login(name, password)?;
        let token = self.issue_token(&user)?;
        Ok((user, token))
    }

    fn issue_token(&self, user: &User) -> WikiResult<String> {
        self.signer.sign(&user.id.to_string())
    }

    /// Resolve a session token to its user.
    ///
    /// A forged token fails with `InvalidSignature`; a genuine token for a
    /// user that does not exist here yields `None`.
    pub fn authenticate(&self, token: &str) -> WikiResult<Option<User>> {
        let value = self.signer.verify(token)?;
        match Uuid::parse_str(&value) {
            Ok(id) => self.credentials.by_id(id),
            Err(_) => Ok(None),
        }
    }

    // ==================
    // Pages
    // ==================

    /// Latest version of `title`, recording the view.
    pub fn view(&self, title: &str) -> WikiResult<Option<PageVersion>> {
        self.history.record_view(title)?;
        self.pages.latest(title)
    }

    /// A specific version of `title`, recording the view.
    pub fn view_version(&self, title: &str, version: u64) -> WikiResult<Option<PageVersion>> {
        self.history.record_view(title)?;
        self.pages.get_version(title, version)
    }

    /// Save `content` as the next version of `title` on behalf of the
    /// session holder.
    pub fn edit(&self, token: &str, title: &str, content: &str) -> WikiResult<PageVersion> {
        let user = self
            .authenticate(token)?
            .ok_or(WikiError::AuthenticationRequired)?;

        if self.is_locked(title) {
            log_event_with_fields(
                Event::EditRejectedLocked,
                &[("title", title), ("user", &user.name)],
            );
            return Err(WikiError::PageLocked(title.to_string()));
        }

        self.pages.append_version(title, content)
    }

    /// Every version of `title`, ascending.
    pub fn page_history(&self, title: &str) -> WikiResult<Vec<PageVersion>> {
        self.pages.list_versions(title)
    }

    /// True if `title` is on the locked page list
    pub fn is_locked(&self, title: &str) -> bool {
        self.locked_pages.iter().any(|locked| locked == title)
    }

    // ==================
    // History
    // ==================

    /// Every recorded view, most recent first.
    pub fn recent_views(&self) -> WikiResult<Vec<HistoryEntry>> {
        self.history.dump()
    }

    /// Title of the most recently viewed page.
    pub fn last_visited(&self) -> WikiResult<String> {
        self.history.most_recent()
    }

    // ==================
    // Components
    // ==================

    /// The signer that issues and checks session tokens.
    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }
}

impl MemoryWiki {
    /// An in-memory wiki using the settings in `config` and `secret`.
    pub fn in_memory(config: &WikiConfig, secret: &Secret) -> WikiResult<Self> {
        Ok(Self::from_parts(
            VersionStore::with_max_retries(InMemoryPageRepository::new(), config.max_append_retries),
            HistoryLog::new(InMemoryHistoryRepository::new()),
            CredentialStore::new(config.credential_config(), InMemoryUserRepository::new()),
            TokenSigner::new(secret)?,
            config.locked_pages.clone(),
        ))
    }
}

impl FileWiki {
    /// Open the journals under `data_dir`.
    pub fn open(data_dir: &Path, config: &WikiConfig, secret: &Secret) -> WikiResult<Self> {
        let pages = FilePageRepository::open(data_dir)?;
        let history = FileHistoryRepository::open(data_dir)?;
        let users = FileUserRepository::open(data_dir)?;

        let titles = pages.title_count()?.to_string();
        let views = history.len()?.to_string();
        let user_count = users.count()?.to_string();
        log_event_with_fields(
            Event::StoreOpened,
            &[
                ("data_dir", &data_dir.display().to_string()),
                ("titles", &titles),
                ("users", &user_count),
                ("views", &views),
            ],
        );

        Ok(Self::from_parts(
            VersionStore::with_max_retries(pages, config.max_append_retries),
            HistoryLog::new(history),
            CredentialStore::new(config.credential_config(), users),
            TokenSigner::new(secret)?,
            config.locked_pages.clone(),
        ))
    }
}
