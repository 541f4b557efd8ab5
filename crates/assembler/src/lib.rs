//! Trace assembly: from a raw entry stream to persisted instances.
//!
//! [`TraceAssembler`] consumes a push-based log source through a bounded
//! channel, spills per-case entries to disk as they arrive, and once the
//! source is exhausted finalizes every case into a [`caselog_core::LogInstance`]
//! handed to the [`BulkWriter`], which batches and retries writes into the
//! document store.
//!
//! No error in this pipeline escalates to the process: entries that fail to
//! encode are dropped with a warning, batches that exhaust their retries are
//! reported and dropped, and finalization failures follow the configured
//! [`FinalizePolicy`]. The worst case is incomplete data plus log output.

#![warn(missing_docs)]

mod assembler;
mod bulk;

pub use assembler::{FinalizePolicy, TraceAssembler};
pub use bulk::{BulkWriter, BulkWriterConfig};
