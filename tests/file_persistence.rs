//! File Persistence Tests
//!
//! Tests that journal-backed state survives reopen, that a torn final
//! line is discarded, that corruption refuses to open, and that a data
//! directory has a single owner.

use std::fs::{self, OpenOptions};
use std::io::Write;

use tempfile::TempDir;
use wikistore::{FileWiki, Secret, WikiConfig, WikiError};

fn open(dir: &TempDir) -> Result<FileWiki, WikiError> {
    let config = WikiConfig::new(dir.path().display().to_string());
    let secret = Secret::new("persistence-secret").unwrap();
    FileWiki::open(dir.path(), &config, &secret)
}

#[test]
fn test_state_survives_reopen() {
    let dir = TempDir::new().unwrap();

    let token = {
        let wiki = open(&dir).unwrap();
        let (_, token) = wiki.signup("alice", "secret123", None).unwrap();
        wiki.edit(&token, "/Home", "one").unwrap();
        wiki.edit(&token, "/Home", "two").unwrap();
        wiki.view("/Home").unwrap();
        token
    };

    let wiki = open(&dir).unwrap();
    assert!(wiki.authenticate(&token).unwrap().is_some());
    assert!(wiki.login("alice", "secret123").is_ok());
    assert_eq!(wiki.view_version("/Home", 1).unwrap().unwrap().content(), "one");
    assert_eq!(wiki.last_visited().unwrap(), "/Home");

    // Chain continues where it left off
    assert_eq!(wiki.edit(&token, "/Home", "three").unwrap().version(), 3);
    assert_eq!(
        wiki.signup("alice", "again", None).unwrap_err(),
        WikiError::DuplicateUser
    );
}

#[test]
fn test_torn_tail_is_discarded() {
    let dir = TempDir::new().unwrap();
    {
        let wiki = open(&dir).unwrap();
        let (_, token) = wiki.signup("alice", "secret123", None).unwrap();
        wiki.edit(&token, "/Home", "one").unwrap();
    }

    // Simulate a crash mid-append: partial line, no newline
    let mut file = OpenOptions::new()
        .append(true)
        .open(dir.path().join("pages.log"))
        .unwrap();
    file.write_all(b"0badc0de {\"title\":\"/Home\",\"ver").unwrap();
    drop(file);

    let wiki = open(&dir).unwrap();
    assert_eq!(wiki.page_history("/Home").unwrap().len(), 1);

    let (_, token) = wiki.login("alice", "secret123").unwrap();
    assert_eq!(wiki.edit(&token, "/Home", "two").unwrap().version(), 2);
}

#[test]
fn test_corrupted_record_fails_open() {
    let dir = TempDir::new().unwrap();
    {
        let wiki = open(&dir).unwrap();
        let (_, token) = wiki.signup("alice", "secret123", None).unwrap();
        wiki.edit(&token, "/Home", "one").unwrap();
        wiki.edit(&token, "/Home", "two").unwrap();
    }

    let path = dir.path().join("pages.log");
    let text = fs::read_to_string(&path).unwrap();
    fs::write(&path, text.replacen("one", "0ne", 1)).unwrap();

    match open(&dir) {
        Err(WikiError::DataCorruption(message)) => assert!(message.contains("checksum")),
        Err(other) => panic!("unexpected error {:?}", other),
        Ok(_) => panic!("corrupted journal opened"),
    }
}

#[test]
fn test_second_open_is_rejected() {
    let dir = TempDir::new().unwrap();
    let first = open(&dir).unwrap();
    let (_, token) = first.signup("alice", "secret123", None).unwrap();
    first.edit(&token, "/Home", "one").unwrap();

    match open(&dir) {
        Err(WikiError::StoreLocked(message)) => assert!(message.contains("WIKI_STORAGE_LOCKED")),
        Err(other) => panic!("unexpected error {:?}", other),
        Ok(_) => panic!("two stores opened the same data directory"),
    }

    // The owner keeps a gap-free chain
    assert_eq!(first.edit(&token, "/Home", "two").unwrap().version(), 2);
    drop(first);

    let wiki = open(&dir).unwrap();
    let versions: Vec<_> = wiki
        .page_history("/Home")
        .unwrap()
        .iter()
        .map(|p| p.version())
        .collect();
    assert_eq!(versions, vec![1, 2]);
}
