//! Performance-measure definitions and their structural composition.
//!
//! A [`MeasureDefinition`] is a declarative tree: base measures at the
//! leaves, composed upwards through aggregation (with optional filter,
//! reference point, and grouping) and derivation from named sub-measures.
//! The compositor rewrites such a tree into a structurally identical
//! [`ComposedNode`] tree whose leaves are produced by a caller-supplied
//! function; two ready-made traversals exist, one yielding per-instance
//! computation units ([`InstanceComputers`]) and one mirroring the raw
//! definitions ([`InstanceMeasures`]).

#![warn(missing_docs)]

mod compose;
mod computer;
mod definition;

pub use compose::{compose, ComposedNode, ComposedSet};
pub use computer::{InstanceComputer, InstanceComputers, InstanceFilter, InstanceMeasures};
pub use definition::{AggregatedMeasure, BaseMeasure, DerivedMeasure, MeasureDefinition};
