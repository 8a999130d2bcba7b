//! # Auth Module
//!
//! User registration and login with salted password hashes, and
//! tamper-evident session tokens signed with the process secret.

pub mod credentials;
pub mod crypto;
pub mod signer;
pub mod user;

pub use credentials::{CredentialConfig, CredentialStore};
pub use crypto::PasswordScheme;
pub use signer::{TokenSigner, TOKEN_SEPARATOR};
pub use user::{FileUserRepository, InMemoryUserRepository, User, UserProfile, UserRepository};
