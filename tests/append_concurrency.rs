//! Concurrent Append Tests
//!
//! Concurrent appends to one title must produce exactly the versions
//! 1..=N with no gaps or duplicates, regardless of interleaving.

use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::thread;

use tempfile::TempDir;
use wikistore::pages::{InMemoryPageRepository, VersionStore};
use wikistore::{FileWiki, Secret, WikiConfig};

const WRITERS: usize = 16;

fn run_writers<F>(append: F) -> Vec<u64>
where
    F: Fn(usize) -> u64 + Send + Sync + 'static,
{
    let append = Arc::new(append);
    let barrier = Arc::new(Barrier::new(WRITERS));

    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let append = Arc::clone(&append);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                append(i)
            })
        })
        .collect();

    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

fn assert_exactly_one_to_n(versions: &[u64]) {
    let unique: BTreeSet<u64> = versions.iter().copied().collect();
    assert_eq!(unique.len(), WRITERS, "duplicate versions: {:?}", versions);
    assert_eq!(
        unique.into_iter().collect::<Vec<_>>(),
        (1..=WRITERS as u64).collect::<Vec<_>>()
    );
}

#[test]
fn test_concurrent_appends_in_memory() {
    let store = Arc::new(VersionStore::new(InMemoryPageRepository::new()));

    let writer = Arc::clone(&store);
    let versions = run_writers(move |i| {
        writer
            .append_version("/Busy", &format!("writer {}", i))
            .unwrap()
            .version()
    });

    assert_exactly_one_to_n(&versions);
    assert_eq!(store.list_versions("/Busy").unwrap().len(), WRITERS);
}

#[test]
fn test_concurrent_edits_through_file_wiki() {
    let dir = TempDir::new().unwrap();
    let config = WikiConfig::new(dir.path().display().to_string());
    let secret = Secret::new("concurrency-secret").unwrap();

    let wiki = Arc::new(FileWiki::open(dir.path(), &config, &secret).unwrap());
    let (_, token) = wiki.signup("alice", "secret123", None).unwrap();

    let writer = Arc::clone(&wiki);
    let versions = run_writers(move |i| {
        writer
            .edit(&token, "/Busy", &format!("writer {}", i))
            .unwrap()
            .version()
    });
    assert_exactly_one_to_n(&versions);

    // The journal holds the same contiguous chain
    drop(wiki);
    let reopened = FileWiki::open(dir.path(), &config, &secret).unwrap();
    let chain: Vec<u64> = reopened
        .page_history("/Busy")
        .unwrap()
        .iter()
        .map(|p| p.version())
        .collect();
    assert_eq!(chain, (1..=WRITERS as u64).collect::<Vec<_>>());
}

#[test]
fn test_concurrent_appends_to_different_titles() {
    let store = Arc::new(VersionStore::new(InMemoryPageRepository::new()));

    let writer = Arc::clone(&store);
    let versions = run_writers(move |i| {
        writer
            .append_version(&format!("/Page{}", i % 2), "x")
            .unwrap()
            .version()
    });

    assert_eq!(versions.len(), WRITERS);
    for title in ["/Page0", "/Page1"] {
        let chain: Vec<u64> = store
            .list_versions(title)
            .unwrap()
            .iter()
            .map(|p| p.version())
            .collect();
        assert_eq!(chain, (1..=(WRITERS / 2) as u64).collect::<Vec<_>>());
    }
}
