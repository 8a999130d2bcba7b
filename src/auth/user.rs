//! # User Directory
//!
//! User model and repositories. A user is created once at registration
//! and never updated afterwards.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, RwLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{lock_poisoned, WikiResult};
use crate::storage::{Journal, StorageError, USERS_JOURNAL};

/// User model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,

    /// Unique login name
    pub name: String,

    /// Salt and hash, opaque outside the credential store
    pub pw_hash: String,

    /// Optional contact address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl User {
    /// Public view of this user, without the password hash
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// User fields that are safe to hand back to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// User repository trait
///
/// Names carry a unique index; `insert_if_absent` is the only write.
pub trait UserRepository: Send + Sync {
    /// Find a user by their ID
    fn find_by_id(&self, id: Uuid) -> WikiResult<Option<User>>;

    /// Find a user by their name
    fn find_by_name(&self, name: &str) -> WikiResult<Option<User>>;

    /// Store the user unless the name is taken.
    ///
    /// Returns `false` without writing anything if the name already exists.
    fn insert_if_absent(&self, user: &User) -> WikiResult<bool>;

    /// Number of registered users
    fn count(&self) -> WikiResult<usize>;
}

#[derive(Debug, Default)]
struct UserIndex {
    by_name: HashMap<String, User>,
    name_by_id: HashMap<Uuid, String>,
}

impl UserIndex {
    fn insert_if_absent(&mut self, user: &User) -> bool {
        if self.by_name.contains_key(&user.name) || self.name_by_id.contains_key(&user.id) {
            return false;
        }
        self.name_by_id.insert(user.id, user.name.clone());
        self.by_name.insert(user.name.clone(), user.clone());
        true
    }
}

/// In-memory user repository
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<UserIndex>,
}

impl InMemoryUserRepository {
    /// An empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for InMemoryUserRepository {
    fn find_by_id(&self, id: Uuid) -> WikiResult<Option<User>> {
        let users = self.users.read().map_err(|_| lock_poisoned())?;
        Ok(users
            .name_by_id
            .get(&id)
            .and_then(|name| users.by_name.get(name))
            .cloned())
    }

    fn find_by_name(&self, name: &str) -> WikiResult<Option<User>> {
        let users = self.users.read().map_err(|_| lock_poisoned())?;
        Ok(users.by_name.get(name).cloned())
    }

    fn insert_if_absent(&self, user: &User) -> WikiResult<bool> {
        let mut users = self.users.write().map_err(|_| lock_poisoned())?;
        Ok(users.insert_if_absent(user))
    }

    fn count(&self) -> WikiResult<usize> {
        let users = self.users.read().map_err(|_| lock_poisoned())?;
        Ok(users.by_name.len())
    }
}

/// Journal-backed user repository.
///
/// Reads are served from memory; writes hold the journal lock across the
/// uniqueness check, the durable append and the in-memory insert.
pub struct FileUserRepository {
    index: InMemoryUserRepository,
    journal: Mutex<Journal<User>>,
}

impl FileUserRepository {
    /// Opens `<data_dir>/users.log`, replaying every registered user.
    pub fn open(data_dir: &Path) -> WikiResult<Self> {
        let (journal, users) = Journal::open(data_dir.join(USERS_JOURNAL))?;
        let index = InMemoryUserRepository::new();

        for user in &users {
            if !index.insert_if_absent(user)? {
                return Err(StorageError::corruption(format!(
                    "duplicate user '{}' in {}",
                    user.name, USERS_JOURNAL
                ))
                .into());
            }
        }

        Ok(Self {
            index,
            journal: Mutex::new(journal),
        })
    }
}

impl UserRepository for FileUserRepository {
    fn find_by_id(&self, id: Uuid) -> WikiResult<Option<User>> {
        self.index.find_by_id(id)
    }

    fn find_by_name(&self, name: &str) -> WikiResult<Option<User>> {
        self.index.find_by_name(name)
    }

    fn insert_if_absent(&self, user: &User) -> WikiResult<bool> {
        let mut journal = self.journal.lock().map_err(|_| lock_poisoned())?;

        if self.index.find_by_name(&user.name)?.is_some()
            || self.index.find_by_id(user.id)?.is_some()
        {
            return Ok(false);
        }

        journal.append(user)?;
        self.index.insert_if_absent(user)
    }

    fn count(&self) -> WikiResult<usize> {
        self.index.count()
    }
}
