//! Append-only JSON-lines journal
//!
//! Line format:
//!
//! ```text
//! <crc32 as 8 lowercase hex digits> <json record>\n
//! ```
//!
//! The checksum covers the JSON bytes only. Records are never rewritten;
//! every append is written with a single `write_all` on the file and
//! synced before it returns.
//!
//! A failed append leaves no trace: the file is cut back to its length
//! before the append. If that cut fails too, the journal is poisoned and
//! refuses further appends until it is reopened, which discards any torn
//! tail.
//!
//! A journal file has one owner. `open` takes an exclusive advisory lock
//! that lives as long as the `Journal`; a second open of the same file,
//! from this process or another, fails with `WIKI_STORAGE_LOCKED`.
//!
//! On open the journal is replayed in file order:
//! - a final line without a trailing newline is a torn write and is cut off
//! - any other malformed line, checksum mismatch or undecodable record is
//!   fatal corruption

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::marker::PhantomData;
use std::path::Path;

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::checksum::{line_prefix, matches_prefix, parse_prefix};
use super::errors::{StorageError, StorageResult};

/// An append-only journal of `T` records.
pub struct Journal<T> {
    file: File,
    /// Length of the intact, synced prefix
    len: u64,
    poisoned: bool,
    #[cfg(test)]
    fault: Option<Fault>,
    _record: PhantomData<fn(T)>,
}

impl<T: Serialize + DeserializeOwned> Journal<T> {
    /// Opens or creates the journal, locks it and replays every intact
    /// record.
    ///
    /// Creates parent directories if needed.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<(Self, Vec<T>)> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    StorageError::io(
                        format!("Failed to create directory: {}", parent.display()),
                        e,
                    )
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                StorageError::io(format!("Failed to open journal: {}", path.display()), e)
            })?;

        file.try_lock_exclusive().map_err(|e| {
            if e.kind() == fs2::lock_contended_error().kind() {
                StorageError::locked(format!("{} is held by another store", path.display()))
            } else {
                StorageError::io(format!("Failed to lock journal: {}", path.display()), e)
            }
        })?;

        let mut bytes = Vec::new();
        (&file).read_to_end(&mut bytes).map_err(|e| {
            StorageError::io(format!("Failed to read journal: {}", path.display()), e)
        })?;

        let (records, valid_len) = Self::replay(&bytes)?;

        if (bytes.len() as u64) > valid_len {
            file.set_len(valid_len)
                .and_then(|_| file.sync_all())
                .map_err(|e| StorageError::io("Failed to truncate torn journal tail", e))?;
        }

        let journal = Self {
            file,
            len: valid_len,
            poisoned: false,
            #[cfg(test)]
            fault: None,
            _record: PhantomData,
        };

        Ok((journal, records))
    }

    /// Decodes every complete line, returning the records and the byte
    /// length of the intact prefix.
    fn replay(bytes: &[u8]) -> StorageResult<(Vec<T>, u64)> {
        let mut records = Vec::new();
        let mut valid_len = 0usize;

        for (index, line) in bytes.split_inclusive(|b| *b == b'\n').enumerate() {
            let Some(body) = line.strip_suffix(b"\n") else {
                // torn tail
                break;
            };
            records.push(Self::decode_line(body, index + 1)?);
            valid_len += line.len();
        }

        Ok((records, valid_len as u64))
    }

    fn decode_line(line: &[u8], line_no: usize) -> StorageResult<T> {
        let text = std::str::from_utf8(line)
            .map_err(|_| StorageError::corrupt_line(line_no, "journal line is not UTF-8"))?;

        let (crc_hex, json) = text
            .split_once(' ')
            .ok_or_else(|| StorageError::corrupt_line(line_no, "missing checksum field"))?;

        let expected = parse_prefix(crc_hex)
            .ok_or_else(|| StorageError::corrupt_line(line_no, "unparseable checksum"))?;

        if !matches_prefix(json, expected) {
            return Err(StorageError::corrupt_line(line_no, "checksum mismatch"));
        }

        serde_json::from_str(json).map_err(|e| {
            StorageError::corrupt_line(line_no, format!("undecodable record: {}", e))
        })
    }

    /// Appends one record and syncs it to disk.
    ///
    /// On error nothing of the record remains in the file.
    pub fn append(&mut self, record: &T) -> StorageResult<()> {
        if self.poisoned {
            return Err(StorageError::poisoned(
                "journal rejected append after a failed rollback; reopen to recover",
            ));
        }

        let json = serde_json::to_string(record).map_err(|e| {
            StorageError::encode_failed(format!("Failed to encode record: {}", e))
        })?;
        let line = format!("{} {}\n", line_prefix(&json), json);

        if let Err(e) = self.write_synced(line.as_bytes()) {
            if self.roll_back().is_err() {
                self.poisoned = true;
            }
            return Err(StorageError::io("Failed to append journal record", e));
        }

        self.len += line.len() as u64;
        Ok(())
    }

    fn write_synced(&mut self, line: &[u8]) -> io::Result<()> {
        self.injected_write_failure(line)?;
        (&self.file).write_all(line)?;
        self.file.sync_data()
    }

    /// Cuts the file back to the last synced record.
    fn roll_back(&mut self) -> io::Result<()> {
        self.injected_rollback_failure()?;
        self.file.set_len(self.len)?;
        self.file.sync_all()
    }
}

#[cfg(not(test))]
impl<T> Journal<T> {
    fn injected_write_failure(&self, _line: &[u8]) -> io::Result<()> {
        Ok(())
    }

    fn injected_rollback_failure(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Failure injected into the next appends of a test journal
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub(crate) struct Fault {
    /// Bytes of the line that reach the file before the write fails
    pub write_bytes: usize,
    /// Whether cutting the file back fails as well
    pub rollback_fails: bool,
}

#[cfg(test)]
impl<T> Journal<T> {
    /// Make every following append fail as described, or heal with `None`.
    pub(crate) fn inject_fault(&mut self, fault: Option<Fault>) {
        self.fault = fault;
    }

    fn injected_write_failure(&self, line: &[u8]) -> io::Result<()> {
        match self.fault {
            Some(fault) => {
                (&self.file).write_all(&line[..fault.write_bytes.min(line.len())])?;
                Err(io::Error::new(io::ErrorKind::Other, "injected write failure"))
            }
            None => Ok(()),
        }
    }

    fn injected_rollback_failure(&self) -> io::Result<()> {
        match self.fault {
            Some(fault) if fault.rollback_fails => Err(io::Error::new(
                io::ErrorKind::Other,
                "injected rollback failure",
            )),
            _ => Ok(()),
        }
    }
}
