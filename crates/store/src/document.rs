//! Document store contract and store-side predicates.
//!
//! Finished instances are durable JSON documents keyed by case id. The
//! pipeline only assumes the narrow contract defined here: idempotent bulk
//! writes, and predicate queries answered through a paginated cursor. The
//! backing engine (and its transport) is a collaborator, not part of this
//! workspace; [`crate::MemoryStore`] is the in-process reference.

use std::time::Duration;

use chrono::{DateTime, Utc};
use caselog_core::Result;
use serde::{Deserialize, Serialize};

/// A document together with its store key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Store key (the instance's case id)
    pub id: String,
    /// Document body
    pub body: serde_json::Value,
}

impl StoredDocument {
    /// Create a document.
    pub fn new(id: impl Into<String>, body: serde_json::Value) -> Self {
        StoredDocument {
            id: id.into(),
            body,
        }
    }
}

/// Queryable instance fields.
///
/// Both are epoch-millisecond integers in the document body; `end` is
/// absent on cases that never completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    /// The instance's start timestamp
    Start,
    /// The instance's end timestamp
    End,
}

impl Field {
    /// Name of the document field.
    pub fn name(&self) -> &'static str {
        match self {
            Field::Start => "start",
            Field::End => "end",
        }
    }
}

/// A store-side selection predicate over instance documents.
///
/// This is the whole predicate language the query engine needs: inclusive
/// range clauses on the timestamp fields, an absent-field test, and the two
/// boolean combinators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Field value within `[from, to]`; open ends are unbounded.
    /// Documents lacking the field never match.
    Range {
        /// Field to compare
        field: Field,
        /// Inclusive lower bound, epoch milliseconds
        from: Option<i64>,
        /// Inclusive upper bound, epoch milliseconds
        to: Option<i64>,
    },
    /// Field absent (or null) in the document.
    Missing(Field),
    /// Every sub-predicate matches.
    And(Vec<Predicate>),
    /// At least one sub-predicate matches.
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Range clause from instants, converting to epoch milliseconds.
    pub fn range(field: Field, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Predicate::Range {
            field,
            from: from.map(|t| t.timestamp_millis()),
            to: to.map(|t| t.timestamp_millis()),
        }
    }

    /// Evaluate against a document body.
    ///
    /// Store implementations that hold documents in process can use this
    /// directly; remote stores translate the predicate to their own query
    /// language instead.
    pub fn matches(&self, doc: &serde_json::Value) -> bool {
        match self {
            Predicate::Range { field, from, to } => {
                match doc.get(field.name()).and_then(serde_json::Value::as_i64) {
                    Some(v) => from.map_or(true, |lo| lo <= v) && to.map_or(true, |hi| v <= hi),
                    None => false,
                }
            }
            Predicate::Missing(field) => doc
                .get(field.name())
                .map_or(true, serde_json::Value::is_null),
            Predicate::And(ps) => ps.iter().all(|p| p.matches(doc)),
            Predicate::Or(ps) => ps.iter().any(|p| p.matches(doc)),
        }
    }
}

/// Paginated retrieval handle for one query.
///
/// `next_page` returns at most the page size requested at query time; an
/// empty page means the cursor is exhausted and stays exhausted.
pub trait Cursor: Send {
    /// Fetch the next page of matching documents.
    fn next_page(&mut self) -> Result<Vec<StoredDocument>>;
}

/// The durable document store the pipeline writes to and queries.
pub trait DocumentStore: Send + Sync {
    /// Write a batch of documents. Writing an existing id overwrites the
    /// stored document; re-running an ingest is idempotent per case.
    fn bulk_write(&self, batch: &[StoredDocument]) -> Result<()>;

    /// Open a cursor over every document matching `predicate`.
    ///
    /// The cursor serves pages of `page_size` documents and is valid for
    /// `keep_alive` from the moment it is opened.
    fn query(
        &self,
        predicate: &Predicate,
        page_size: usize,
        keep_alive: Duration,
    ) -> Result<Box<dyn Cursor>>;
}
