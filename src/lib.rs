//! # caselog
//!
//! Case-trace assembly, interval querying, and measure composition over
//! process event logs.
//!
//! A raw, possibly out-of-order stream of log entries is assembled into
//! per-case instances, persisted durably to a searchable document store,
//! and later replayed through time-interval-scoped queries. Alongside the
//! pipeline, declarative measure-definition trees compose into mirrored
//! trees of computation units for downstream evaluation.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use caselog::prelude::*;
//! use chrono::DateTime;
//! use serde_json::json;
//!
//! # fn main() -> caselog::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let log = CaseLog::new(store);
//!
//! // Assemble a log into per-case instances.
//! let ts = |ms| DateTime::from_timestamp_millis(ms).unwrap();
//! let source = VecLogSource::new(vec![
//!     LogEntry::new("order-7", ts(10), json!("created")),
//!     LogEntry::new("order-7", ts(40), json!("END")),
//! ]);
//! log.load_log(source, &PayloadEquals::new(json!("END")))?;
//!
//! // Replay every case active in a window.
//! let interval = TimeInterval::new(ts(0), ts(100));
//! let mut replay = log.create(interval, IntervalCondition::Active);
//! replay.register_listener(Box::new(|entry| println!("{}", entry.case_id)));
//! replay.process_log();
//! # Ok(())
//! # }
//! ```
//!
//! ## Components
//!
//! - [`TraceAssembler`] / [`BulkWriter`]: stream assembly and the batching,
//!   retrying write path
//! - [`IntervalLogSource`]: interval-scoped instance replay
//! - [`InstanceComputers`] / [`InstanceMeasures`]: measure-tree composition
//! - [`MemoryStore`]: in-process reference document store

#![warn(missing_docs)]

mod facade;
pub mod prelude;

pub use crate::facade::CaseLog;

pub use caselog_assembler::{BulkWriter, BulkWriterConfig, FinalizePolicy, TraceAssembler};
pub use caselog_core::{
    EndMatcher, Error, IntervalCondition, LogEntry, LogInstance, LogListener, LogSource,
    NeverEnds, PayloadEquals, Result, TimeInterval, VecLogSource,
};
pub use caselog_measures::{
    compose, AggregatedMeasure, BaseMeasure, ComposedNode, ComposedSet, DerivedMeasure,
    InstanceComputer, InstanceComputers, InstanceFilter, InstanceMeasures, MeasureDefinition,
};
pub use caselog_query::{interval_predicate, Hits, IntervalLogSource};
pub use caselog_store::{
    Cursor, DocumentStore, Field, MemorySpill, MemoryStore, Predicate, SpillLog, SpillStore,
    StoredDocument,
};
