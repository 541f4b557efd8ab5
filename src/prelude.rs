//! Convenience re-exports for common usage.
//!
//! ```
//! use caselog::prelude::*;
//! ```

pub use crate::CaseLog;

pub use caselog_assembler::{BulkWriterConfig, FinalizePolicy};
pub use caselog_core::{
    EndMatcher, IntervalCondition, LogEntry, LogInstance, LogSource, NeverEnds, PayloadEquals,
    TimeInterval, VecLogSource,
};
pub use caselog_measures::{
    AggregatedMeasure, BaseMeasure, DerivedMeasure, InstanceComputers, InstanceFilter,
    InstanceMeasures, MeasureDefinition,
};
pub use caselog_store::MemoryStore;
