//! # Credential Store
//!
//! Registration and login over a [`UserRepository`].
//!
//! Registration is a single insert-if-absent, so two concurrent signups
//! for one name can never both succeed.

use uuid::Uuid;

use super::crypto::{hash_password, verify_password, PasswordScheme, DEFAULT_SALT_LENGTH};
use super::user::{User, UserRepository};
use crate::errors::{WikiError, WikiResult};
use crate::observability::{log_event_with_fields, Event};

/// Credential store configuration
#[derive(Debug, Clone)]
pub struct CredentialConfig {
    /// Scheme for newly registered users
    pub scheme: PasswordScheme,

    /// Salt length for the salted SHA-256 scheme
    pub salt_length: usize,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            scheme: PasswordScheme::Sha256Salted,
            salt_length: DEFAULT_SALT_LENGTH,
        }
    }
}

/// Salted-hash registration and login
pub struct CredentialStore<R: UserRepository> {
    config: CredentialConfig,
    repository: R,
}

impl<R: UserRepository> CredentialStore<R> {
    /// A store that hashes and verifies passwords per `config`.
    pub fn new(config: CredentialConfig, repository: R) -> Self {
        Self { config, repository }
    }

    /// Register a new user.
    ///
    /// Fails with `DuplicateUser` if the name is taken; the existing
    /// user's record is left untouched.
    pub fn register(&self, name: &str, password: &str, email: Option<&str>) -> WikiResult<User> {
        // Cheap early exit; the insert below is the authoritative check
        if self.repository.find_by_name(name)?.is_some() {
            log_event_with_fields(Event::RegistrationRejected, &[("name", name)]);
            return Err(WikiError::DuplicateUser);
        }

        let pw_hash = hash_password(self.config.scheme, name, password, self.config.salt_length)?;
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            pw_hash,
            email: email.map(str::to_string),
        };

        if !self.repository.insert_if_absent(&user)? {
            log_event_with_fields(Event::RegistrationRejected, &[("name", name)]);
            return Err(WikiError::DuplicateUser);
        }

        let id = user.id.to_string();
        log_event_with_fields(Event::UserRegistered, &[("name", name), ("user_id", &id)]);
        Ok(user)
    }

    /// Check a name and password.
    ///
    /// Unknown names and wrong passwords both fail with `InvalidCredentials`.
    pub fn login(&self, name: &str, password: &str) -> WikiResult<User> {
        let user = match self.repository.find_by_name(name)? {
            Some(user) if verify_password(name, password, &user.pw_hash) => user,
            _ => {
                log_event_with_fields(Event::LoginRejected, &[("name", name)]);
                return Err(WikiError::InvalidCredentials);
            }
        };

        let id = user.id.to_string();
        log_event_with_fields(Event::LoginSucceeded, &[("name", name), ("user_id", &id)]);
        Ok(user)
    }

    /// Look up a user by ID
    pub fn by_id(&self, id: Uuid) -> WikiResult<Option<User>> {
        self.repository.find_by_id(id)
    }

    /// Look up a user by name
    pub fn by_name(&self, name: &str) -> WikiResult<Option<User>> {
        self.repository.find_by_name(name)
    }

    /// Number of registered users
    pub fn user_count(&self) -> WikiResult<usize> {
        self.repository.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::crypto::scheme_of;
    use crate::auth::InMemoryUserRepository;

    fn create_store() -> CredentialStore<InMemoryUserRepository> {
        CredentialStore::new(CredentialConfig::default(), InMemoryUserRepository::new())
    }

    #[test]
    fn test_register_stores_salted_hash() {
        let store = create_store();
        let user = store.register("alice", "secret123", None).unwrap();

        let (salt, digest) = user.pw_hash.split_once(',').unwrap();
        assert_eq!(salt.len(), DEFAULT_SALT_LENGTH);
        assert_eq!(digest.len(), 64);
        assert!(!user.pw_hash.contains("secret123"));
    }

    #[test]
    fn test_register_then_login() {
        let store = create_store();
        let registered = store
            .register("alice", "secret123", Some("alice@example.com"))
            .unwrap();

        let logged_in = store.login("alice", "secret123").unwrap();
        assert_eq!(logged_in.id, registered.id);
        assert_eq!(logged_in.email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn test_wrong_password_rejected() {
        let store = create_store();
        store.register("alice", "secret123", None).unwrap();

        assert_eq!(store.login("alice", "secret124"), Err(WikiError::InvalidCredentials));
        assert_eq!(store.login("alice", ""), Err(WikiError::InvalidCredentials));
    }

    #[test]
    fn test_unknown_user_rejected() {
        let store = create_store();
        assert_eq!(store.login("nobody", "secret123"), Err(WikiError::InvalidCredentials));
    }

    #[test]
    fn test_duplicate_registration_keeps_original() {
        let store = create_store();
        let original = store.register("alice", "secret123", None).unwrap();

        let result = store.register("alice", "other-password", None);
        assert_eq!(result, Err(WikiError::DuplicateUser));

        let stored = store.by_name("alice").unwrap().unwrap();
        assert_eq!(stored.pw_hash, original.pw_hash);
        assert!(store.login("alice", "secret123").is_ok());
        assert!(store.login("alice", "other-password").is_err());
    }

    #[test]
    fn test_lookups() {
        let store = create_store();
        let alice = store.register("alice", "secret123", None).unwrap();

        assert_eq!(store.by_id(alice.id).unwrap(), Some(alice.clone()));
        assert_eq!(store.by_name("alice").unwrap(), Some(alice));
        assert!(store.by_id(Uuid::new_v4()).unwrap().is_none());
        assert!(store.by_name("bob").unwrap().is_none());
    }

    #[test]
    fn test_argon2_scheme_and_legacy_hashes_coexist() {
        let repo = InMemoryUserRepository::new();
        let legacy = CredentialStore::new(CredentialConfig::default(), repo);
        legacy.register("alice", "secret123", None).unwrap();

        // Same repository, switched scheme
        let upgraded = CredentialStore::new(
            CredentialConfig {
                scheme: PasswordScheme::Argon2id,
                ..Default::default()
            },
            legacy.repository,
        );
        let bob = upgraded.register("bob", "hunter22", None).unwrap();

        assert_eq!(scheme_of(&bob.pw_hash), PasswordScheme::Argon2id);
        assert!(upgraded.login("alice", "secret123").is_ok());
        assert!(upgraded.login("bob", "hunter22").is_ok());
        assert!(upgraded.login("bob", "secret123").is_err());
    }
}
