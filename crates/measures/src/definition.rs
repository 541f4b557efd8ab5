//! The measure-definition tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A declarative performance-measure definition.
///
/// Every definition carries an identifier, unique within the set of
/// definitions composed together; it becomes the top-level key of the
/// composed tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MeasureDefinition {
    /// A single-instance measure; the leaf of every tree.
    Base(BaseMeasure),
    /// An aggregation over a base measure, optionally filtered, anchored to
    /// a reference point, and grouped.
    Aggregated(AggregatedMeasure),
    /// A measure derived from named sub-measures.
    Derived(DerivedMeasure),
}

impl MeasureDefinition {
    /// The definition's identifier.
    pub fn id(&self) -> &str {
        match self {
            MeasureDefinition::Base(m) => &m.id,
            MeasureDefinition::Aggregated(m) => &m.id,
            MeasureDefinition::Derived(m) => &m.id,
        }
    }
}

/// Leaf measure evaluated against a single instance.
///
/// The configuration is opaque here; only the evaluation engine interprets
/// it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseMeasure {
    /// Unique identifier
    pub id: String,
    /// Opaque measure configuration
    #[serde(default)]
    pub config: serde_json::Value,
}

impl BaseMeasure {
    /// Create a base measure with an empty configuration.
    pub fn new(id: impl Into<String>) -> Self {
        BaseMeasure {
            id: id.into(),
            config: serde_json::Value::Null,
        }
    }

    /// Attach a configuration value.
    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }
}

impl From<BaseMeasure> for MeasureDefinition {
    fn from(m: BaseMeasure) -> Self {
        MeasureDefinition::Base(m)
    }
}

/// Aggregation of a base measure across instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedMeasure {
    /// Unique identifier
    pub id: String,
    /// The measure being aggregated
    pub base: Box<MeasureDefinition>,
    /// Optional filter restricting which instances contribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Box<MeasureDefinition>>,
    /// Optional reference point anchoring the aggregation period
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_point: Option<Box<MeasureDefinition>>,
    /// Grouping measures, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grouped_by: Vec<MeasureDefinition>,
}

impl AggregatedMeasure {
    /// Aggregate `base` under identifier `id`.
    pub fn new(id: impl Into<String>, base: MeasureDefinition) -> Self {
        AggregatedMeasure {
            id: id.into(),
            base: Box::new(base),
            filter: None,
            reference_point: None,
            grouped_by: Vec::new(),
        }
    }

    /// Restrict contributing instances with a filter measure.
    pub fn with_filter(mut self, filter: MeasureDefinition) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Anchor the aggregation period to a reference point measure.
    pub fn with_reference_point(mut self, reference_point: MeasureDefinition) -> Self {
        self.reference_point = Some(Box::new(reference_point));
        self
    }

    /// Group the aggregation by the given measures, in order.
    pub fn with_grouped_by(mut self, grouped_by: Vec<MeasureDefinition>) -> Self {
        self.grouped_by = grouped_by;
        self
    }
}

impl From<AggregatedMeasure> for MeasureDefinition {
    fn from(m: AggregatedMeasure) -> Self {
        MeasureDefinition::Aggregated(m)
    }
}

/// Measure derived from named sub-measures.
///
/// Keys of `used` are caller-defined names, reused verbatim as keys of the
/// composed tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMeasure {
    /// Unique identifier
    pub id: String,
    /// Named sub-measures this measure is computed from
    pub used: BTreeMap<String, MeasureDefinition>,
}

impl DerivedMeasure {
    /// Create a derived measure with no sub-measures yet.
    pub fn new(id: impl Into<String>) -> Self {
        DerivedMeasure {
            id: id.into(),
            used: BTreeMap::new(),
        }
    }

    /// Bind a sub-measure under `name`.
    pub fn using(mut self, name: impl Into<String>, measure: MeasureDefinition) -> Self {
        self.used.insert(name.into(), measure);
        self
    }
}

impl From<DerivedMeasure> for MeasureDefinition {
    fn from(m: DerivedMeasure) -> Self {
        MeasureDefinition::Derived(m)
    }
}
