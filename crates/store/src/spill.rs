//! Disk-backed spill store for per-case accumulation.
//!
//! During ingestion the assembler cannot hold an arbitrarily large log in
//! memory, so per-case entries are spilled to disk as they arrive. The store
//! is append-only: one framed record per entry, indexed in memory by case id.
//! Appending is O(1) amortized regardless of how many entries a case has
//! already accumulated.
//!
//! ## Record format
//!
//! ```text
//! [key_len: u32 LE][key bytes][blob_len: u32 LE][blob bytes][crc32(blob): u32 LE]
//! ```
//!
//! The checksum covers the blob only; a mismatch on read surfaces as a
//! serialization error for that record.
//!
//! ## Lifecycle
//!
//! Created on demand inside a fresh temporary directory; dropping the store
//! deletes the directory and everything in it.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use caselog_core::{Error, Result};
use parking_lot::Mutex;
use tempfile::TempDir;
use tracing::debug;

/// Temporary per-case accumulation store.
///
/// Implementations accumulate opaque blobs under a case id and read them
/// back in append order. All storage is released when the value drops.
pub trait SpillStore {
    /// Append one blob under `case_id`.
    fn append(&mut self, case_id: &str, blob: &[u8]) -> Result<()>;

    /// Read every blob accumulated under `case_id`, in append order.
    /// Unknown case ids yield an empty list.
    fn read(&self, case_id: &str) -> Result<Vec<Vec<u8>>>;

    /// All case ids with at least one accumulated blob.
    fn case_ids(&self) -> Vec<String>;

    /// Number of distinct cases accumulated.
    fn case_count(&self) -> usize;
}

/// Location of one blob inside the log file.
#[derive(Debug, Clone, Copy)]
struct Segment {
    offset: u64,
    len: u32,
}

/// Append-only, disk-backed [`SpillStore`].
///
/// A single log file inside a [`TempDir`] holds every record; an in-memory
/// index maps each case id to the offsets of its blobs.
pub struct SpillLog {
    writer: File,
    reader: Mutex<File>,
    index: BTreeMap<String, Vec<Segment>>,
    tail: u64,
    _dir: TempDir,
}

impl SpillLog {
    /// Create a spill log in the system temporary directory.
    pub fn new() -> Result<Self> {
        Self::in_dir(std::env::temp_dir())
    }

    /// Create a spill log under `base`, in its own fresh subdirectory.
    pub fn in_dir(base: impl AsRef<Path>) -> Result<Self> {
        let dir = TempDir::new_in(base)?;
        let path = dir.path().join("spill.log");
        let writer = OpenOptions::new().create(true).append(true).open(&path)?;
        let reader = File::open(&path)?;
        debug!(path = %path.display(), "spill log created");
        Ok(SpillLog {
            writer,
            reader: Mutex::new(reader),
            index: BTreeMap::new(),
            tail: 0,
            _dir: dir,
        })
    }

    /// Total number of records appended so far.
    pub fn record_count(&self) -> usize {
        self.index.values().map(Vec::len).sum()
    }
}

impl SpillStore for SpillLog {
    fn append(&mut self, case_id: &str, blob: &[u8]) -> Result<()> {
        let key = case_id.as_bytes();
        self.writer.write_u32::<LittleEndian>(key.len() as u32)?;
        self.writer.write_all(key)?;
        self.writer.write_u32::<LittleEndian>(blob.len() as u32)?;
        self.writer.write_all(blob)?;
        self.writer.write_u32::<LittleEndian>(crc32fast::hash(blob))?;

        let blob_offset = self.tail + 4 + key.len() as u64 + 4;
        self.tail = blob_offset + blob.len() as u64 + 4;
        self.index
            .entry(case_id.to_string())
            .or_default()
            .push(Segment {
                offset: blob_offset,
                len: blob.len() as u32,
            });
        Ok(())
    }

    fn read(&self, case_id: &str) -> Result<Vec<Vec<u8>>> {
        let Some(segments) = self.index.get(case_id) else {
            return Ok(Vec::new());
        };

        let mut reader = self.reader.lock();
        let mut blobs = Vec::with_capacity(segments.len());
        for segment in segments {
            reader.seek(SeekFrom::Start(segment.offset))?;
            let mut blob = vec![0u8; segment.len as usize];
            reader.read_exact(&mut blob)?;
            let stored_crc = reader.read_u32::<LittleEndian>()?;
            if stored_crc != crc32fast::hash(&blob) {
                return Err(Error::Serialization(format!(
                    "spill record for case {case_id} failed checksum"
                )));
            }
            blobs.push(blob);
        }
        Ok(blobs)
    }

    fn case_ids(&self) -> Vec<String> {
        self.index.keys().cloned().collect()
    }

    fn case_count(&self) -> usize {
        self.index.len()
    }
}

/// In-memory [`SpillStore`], for tests and small logs.
#[derive(Default)]
pub struct MemorySpill {
    cases: BTreeMap<String, Vec<Vec<u8>>>,
}

impl MemorySpill {
    /// Create an empty in-memory spill store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpillStore for MemorySpill {
    fn append(&mut self, case_id: &str, blob: &[u8]) -> Result<()> {
        self.cases
            .entry(case_id.to_string())
            .or_default()
            .push(blob.to_vec());
        Ok(())
    }

    fn read(&self, case_id: &str) -> Result<Vec<Vec<u8>>> {
        Ok(self.cases.get(case_id).cloned().unwrap_or_default())
    }

    fn case_ids(&self) -> Vec<String> {
        self.cases.keys().cloned().collect()
    }

    fn case_count(&self) -> usize {
        self.cases.len()
    }
}
