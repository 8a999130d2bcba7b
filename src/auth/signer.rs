//! # Session Token Signing
//!
//! Wire format: `<value>|<lowercase hex HMAC-SHA256(secret, value)>`.
//!
//! Tokens carry no expiry. Clearing the client's copy is the only
//! revocation path, and rotating the secret invalidates every token.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::crypto::constant_time_str_eq;
use crate::config::Secret;
use crate::errors::{WikiError, WikiResult};
use crate::observability::{log_event, Event};

type HmacSha256 = Hmac<Sha256>;

/// Separates the signed value from its MAC
pub const TOKEN_SEPARATOR: char = '|';

/// Signs and verifies session values with the process secret.
///
/// Holds only an immutable keyed MAC state, so it can be shared freely
/// between threads.
#[derive(Clone)]
pub struct TokenSigner {
    mac: HmacSha256,
}

impl TokenSigner {
    /// A signer keyed by `secret`.
    pub fn new(secret: &Secret) -> WikiResult<Self> {
        let mac = HmacSha256::new_from_slice(secret.expose())
            .map_err(|_| WikiError::MalformedValue("unusable signing secret".to_string()))?;
        Ok(Self { mac })
    }

    fn mac_hex(&self, value: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(value.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Sign a value.
    ///
    /// Values containing the separator cannot round-trip through
    /// [`verify`](Self::verify) and are rejected.
    pub fn sign(&self, value: &str) -> WikiResult<String> {
        if value.contains(TOKEN_SEPARATOR) {
            return Err(WikiError::MalformedValue(format!(
                "value must not contain '{}'",
                TOKEN_SEPARATOR
            )));
        }
        Ok(format!("{}{}{}", value, TOKEN_SEPARATOR, self.mac_hex(value)))
    }

    /// Verify a token and return the value it carries.
    pub fn verify(&self, token: &str) -> WikiResult<String> {
        let verified = token
            .split_once(TOKEN_SEPARATOR)
            .filter(|(value, mac)| constant_time_str_eq(&self.mac_hex(value), mac))
            .map(|(value, _)| value.to_string());

        verified.ok_or_else(|| {
            log_event(Event::SignatureRejected);
            WikiError::InvalidSignature
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer(secret: &str) -> TokenSigner {
        TokenSigner::new(&Secret::new(secret).unwrap()).unwrap()
    }

    #[test]
    fn test_token_format() {
        let token = signer("s3cret").sign("42").unwrap();
        let (value, mac) = token.split_once('|').unwrap();

        assert_eq!(value, "42");
        assert_eq!(mac.len(), 64);
        assert!(mac.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_known_hmac_vector() {
        // RFC 4231 test case 2
        let signer = signer("Jefe");
        let token = signer.sign("what do ya want for nothing?").unwrap();
        assert!(token.ends_with(
            "|5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        ));
    }

    #[test]
    fn test_sign_verify_round_trip() {
        let signer = signer("s3cret");
        for value in ["", "1", "alice", "0b7c2a4e-9a3f-4f4e-8d1f-3c6b2b7f9e10", "ünïcødé"] {
            let token = signer.sign(value).unwrap();
            assert_eq!(signer.verify(&token).unwrap(), value);
        }
    }

    #[test]
    fn test_any_flipped_character_rejected() {
        let signer = signer("s3cret");
        let token = signer.sign("user-17").unwrap();

        for i in 0..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[i] = if bytes[i] == b'x' { b'y' } else { b'x' };
            let tampered = String::from_utf8(bytes).unwrap();
            assert_eq!(
                signer.verify(&tampered),
                Err(WikiError::InvalidSignature),
                "tampered position {} accepted",
                i
            );
        }
    }

    #[test]
    fn test_uppercase_mac_rejected() {
        let signer = signer("s3cret");
        let token = signer.sign("alice").unwrap();
        assert_eq!(signer.verify(&token.to_uppercase()), Err(WikiError::InvalidSignature));
    }

    #[test]
    fn test_missing_separator_rejected() {
        let signer = signer("s3cret");
        assert_eq!(signer.verify("alice"), Err(WikiError::InvalidSignature));
        assert_eq!(signer.verify(""), Err(WikiError::InvalidSignature));
        assert_eq!(signer.verify("alice|"), Err(WikiError::InvalidSignature));
    }

    #[test]
    fn test_separator_in_value_rejected() {
        let result = signer("s3cret").sign("a|b");
        assert!(matches!(result, Err(WikiError::MalformedValue(_))));
    }

    #[test]
    fn test_rotated_secret_invalidates_tokens() {
        let token = signer("old-secret").sign("alice").unwrap();
        assert_eq!(signer("new-secret").verify(&token), Err(WikiError::InvalidSignature));
    }
}
