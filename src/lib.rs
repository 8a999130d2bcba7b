//! wikistore - versioned wiki pages with salted credentials and signed sessions
//!
//! Core components:
//! - `auth::TokenSigner` - HMAC-signed session tokens
//! - `auth::CredentialStore` - salted-hash registration and login
//! - `pages::VersionStore` - append-only version chains per title
//! - `pages::HistoryLog` - append-only page-view log
//!
//! `wiki::Wiki` composes them into request-level flows.

pub mod auth;
pub mod cli;
pub mod config;
pub mod errors;
pub mod observability;
pub mod pages;
pub mod storage;
pub mod wiki;

pub use config::{Secret, WikiConfig};
pub use errors::{WikiError, WikiResult};
pub use wiki::{FileWiki, MemoryWiki, Wiki};
