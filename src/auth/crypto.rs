//! # Cryptographic Utilities
//!
//! Salted password hashing and constant-time comparison.
//!
//! Two stored formats are understood:
//! - `salt,hexdigest` where `hexdigest = sha256(name || password || salt)`
//! - an Argon2id PHC string (`$argon2id$...`)
//!
//! Verification picks the scheme from the stored value, so hashes written
//! under either scheme keep verifying after the configured scheme changes.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::errors::{WikiError, WikiResult};

/// Separates the salt from the hex digest in the salted SHA-256 format
pub const SALT_DELIMITER: char = ',';

/// Default salt length for the salted SHA-256 format
pub const DEFAULT_SALT_LENGTH: usize = 5;

const SALT_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

const ARGON2_PREFIX: &str = "$argon2";

/// Hashing scheme used for newly registered users
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PasswordScheme {
    /// Single SHA-256 pass over `name || password || salt`
    #[default]
    #[serde(rename = "sha256")]
    Sha256Salted,
    /// Argon2id with a random salt, stored as a PHC string
    #[serde(rename = "argon2id")]
    Argon2id,
}

/// Generate a random salt of ASCII letters.
///
/// Letters only, so the salt can never contain [`SALT_DELIMITER`].
pub fn make_salt(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| SALT_ALPHABET[rng.gen_range(0..SALT_ALPHABET.len())] as char)
        .collect()
}

/// Compute `salt,hexdigest` for the given name, password and salt.
pub fn salted_sha256(name: &str, password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    format!("{}{}{}", salt, SALT_DELIMITER, hex::encode(hasher.finalize()))
}

/// Hash a password for storage under the given scheme.
pub fn hash_password(
    scheme: PasswordScheme,
    name: &str,
    password: &str,
    salt_length: usize,
) -> WikiResult<String> {
    match scheme {
        PasswordScheme::Sha256Salted => {
            Ok(salted_sha256(name, password, &make_salt(salt_length)))
        }
        PasswordScheme::Argon2id => {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|_| WikiError::HashingFailed)
        }
    }
}

/// Verify a password against its stored hash.
///
/// Malformed stored values never verify.
pub fn verify_password(name: &str, password: &str, stored: &str) -> bool {
    if stored.starts_with(ARGON2_PREFIX) {
        return match PasswordHash::new(stored) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        };
    }

    let salt = match stored.split_once(SALT_DELIMITER) {
        Some((salt, _)) => salt,
        None => return false,
    };
    constant_time_str_eq(&salted_sha256(name, password, salt), stored)
}

/// Returns the scheme a stored hash was written with.
pub fn scheme_of(stored: &str) -> PasswordScheme {
    if stored.starts_with(ARGON2_PREFIX) {
        PasswordScheme::Argon2id
    } else {
        PasswordScheme::Sha256Salted
    }
}

/// Constant-time comparison of two byte slices
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Constant-time comparison of two strings
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}
