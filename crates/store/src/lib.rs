//! Storage layer for caselog.
//!
//! Two unrelated storage concerns live here, split the same way the rest of
//! the pipeline consumes them:
//!
//! - [`spill`]: a temporary, disk-backed, append-only store used to
//!   accumulate per-case entries while a log is being ingested. Strictly
//!   scoped to one assembly run; all files are deleted when it drops.
//! - [`document`]: the contract of the durable, searchable document store
//!   that holds finished instances, together with the predicate language
//!   the query engine compiles into. [`memory`] provides the in-process
//!   reference implementation.

#![warn(missing_docs)]

pub mod document;
pub mod memory;
pub mod spill;

pub use document::{Cursor, DocumentStore, Field, Predicate, StoredDocument};
pub use memory::MemoryStore;
pub use spill::{MemorySpill, SpillLog, SpillStore};
