//! CRC32 line prefixes for journal records
//!
//! A prefix is exactly eight lowercase hex digits. Uppercase or short
//! prefixes never come from `line_prefix`, so they are rejected on replay.

use crc32fast::Hasher;

/// Width of the hex prefix
pub const PREFIX_LEN: usize = 8;

fn crc32(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Hex prefix written in front of `json`
pub fn line_prefix(json: &str) -> String {
    format!("{:0width$x}", crc32(json.as_bytes()), width = PREFIX_LEN)
}

/// Parse a prefix field. `None` if it is not eight lowercase hex digits.
pub fn parse_prefix(field: &str) -> Option<u32> {
    let well_formed = field.len() == PREFIX_LEN
        && field
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if !well_formed {
        return None;
    }
    u32::from_str_radix(field, 16).ok()
}

/// True if `json` hashes to `expected`
pub fn matches_prefix(json: &str, expected: u32) -> bool {
    crc32(json.as_bytes()) == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_is_fixed_width_lowercase() {
        // crc32("") is zero
        assert_eq!(line_prefix(""), "00000000");

        let prefix = line_prefix(r#"{"title":"/Home","version":1}"#);
        assert_eq!(prefix.len(), PREFIX_LEN);
        assert_eq!(prefix, prefix.to_lowercase());
    }

    #[test]
    fn test_prefix_detects_edit() {
        let json = r#"{"title":"/Home","content":"hello"}"#;
        let expected = parse_prefix(&line_prefix(json)).unwrap();

        assert!(matches_prefix(json, expected));
        assert!(!matches_prefix(&json.replace("hello", "hellp"), expected));
    }

    #[test]
    fn test_parse_prefix_rejects_malformed() {
        assert_eq!(parse_prefix("0000000a"), Some(10));
        assert!(parse_prefix("0000000A").is_none());
        assert!(parse_prefix("abc").is_none());
        assert!(parse_prefix("+0000000").is_none());
        assert!(parse_prefix("0000000g").is_none());
    }
}
