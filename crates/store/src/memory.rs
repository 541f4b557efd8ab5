//! In-memory reference implementation of the document store.
//!
//! Documents live in a `BTreeMap` behind a `parking_lot::RwLock`. Queries
//! snapshot the matching documents in key order at open time, so a cursor is
//! unaffected by writes that happen while it is being drained. Each cursor
//! carries a scroll id for log correlation and a keep-alive deadline after
//! which further pages fail.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use caselog_core::{Error, Result};
use parking_lot::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::document::{Cursor, DocumentStore, Predicate, StoredDocument};

/// In-memory [`DocumentStore`].
#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<BTreeMap<String, serde_json::Value>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    /// Whether the store holds no documents.
    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    /// Fetch one document body by id.
    pub fn get(&self, id: &str) -> Option<serde_json::Value> {
        self.docs.read().get(id).cloned()
    }
}

impl DocumentStore for MemoryStore {
    fn bulk_write(&self, batch: &[StoredDocument]) -> Result<()> {
        let mut docs = self.docs.write();
        for doc in batch {
            docs.insert(doc.id.clone(), doc.body.clone());
        }
        Ok(())
    }

    fn query(
        &self,
        predicate: &Predicate,
        page_size: usize,
        keep_alive: Duration,
    ) -> Result<Box<dyn Cursor>> {
        let matched: Vec<StoredDocument> = self
            .docs
            .read()
            .iter()
            .filter(|(_, body)| predicate.matches(body))
            .map(|(id, body)| StoredDocument::new(id.clone(), body.clone()))
            .collect();

        let scroll_id = Uuid::new_v4();
        info!(scroll = %scroll_id, hits = matched.len(), "opened instance cursor");
        Ok(Box::new(MemoryCursor {
            scroll_id,
            remaining: matched.into_iter(),
            page_size: page_size.max(1),
            deadline: Instant::now() + keep_alive,
        }))
    }
}

struct MemoryCursor {
    scroll_id: Uuid,
    remaining: std::vec::IntoIter<StoredDocument>,
    page_size: usize,
    deadline: Instant,
}

impl Cursor for MemoryCursor {
    fn next_page(&mut self) -> Result<Vec<StoredDocument>> {
        if Instant::now() > self.deadline {
            return Err(Error::CursorExpired(self.scroll_id.to_string()));
        }
        Ok(self.remaining.by_ref().take(self.page_size).collect())
    }
}
