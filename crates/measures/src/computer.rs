//! The two ready-made composition traversals.
//!
//! [`InstanceComputers`] turns definitions into per-instance computation
//! units, each bound to the definition it evaluates and to the selection
//! filter of the surrounding evaluation; the evaluation engine consuming
//! the units lives outside this workspace. [`InstanceMeasures`] mirrors the
//! raw definitions instead, for introspection and serialization.

use caselog_core::{IntervalCondition, TimeInterval};

use crate::compose::{ComposedNode, ComposedSet};
use crate::definition::MeasureDefinition;

/// Selection filter handed to every computation unit: which instances
/// participate in the evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceFilter {
    /// Interval the evaluation is scoped to
    pub interval: TimeInterval,
    /// How instances must relate to the interval
    pub condition: IntervalCondition,
}

impl InstanceFilter {
    /// Create a filter.
    pub fn new(interval: TimeInterval, condition: IntervalCondition) -> Self {
        InstanceFilter {
            interval,
            condition,
        }
    }
}

/// A per-instance computation unit: one base definition plus the selection
/// filter it will be evaluated under.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceComputer {
    /// The definition this unit computes
    pub definition: MeasureDefinition,
    /// The instance-selection filter in force
    pub filter: InstanceFilter,
}

/// Definitions composed into computation units.
pub struct InstanceComputers {
    filter: InstanceFilter,
    set: ComposedSet<InstanceComputer>,
}

impl InstanceComputers {
    /// Create an empty collection whose units share `filter`.
    pub fn new(filter: InstanceFilter) -> Self {
        InstanceComputers {
            filter,
            set: ComposedSet::new(),
        }
    }

    /// Compose `definition` into computation units, keyed by its id.
    pub fn add_definition(&mut self, definition: &MeasureDefinition) {
        let filter = self.filter;
        self.set.insert_with(definition, &mut |def| InstanceComputer {
            definition: def.clone(),
            filter,
        });
    }

    /// Compose several definitions.
    pub fn add_definitions<'a>(&mut self, definitions: impl IntoIterator<Item = &'a MeasureDefinition>) {
        for definition in definitions {
            self.add_definition(definition);
        }
    }

    /// The composed tree of one definition.
    pub fn get(&self, id: &str) -> Option<&ComposedNode<InstanceComputer>> {
        self.set.get(id)
    }

    /// The full composed structure.
    pub fn computers(&self) -> &ComposedSet<InstanceComputer> {
        &self.set
    }

    /// Every computation unit across all definitions, order unspecified.
    pub fn list_computers(&self) -> Vec<&InstanceComputer> {
        self.set.flatten()
    }
}

/// Definitions composed into a mirror of themselves.
#[derive(Default)]
pub struct InstanceMeasures {
    set: ComposedSet<MeasureDefinition>,
}

impl InstanceMeasures {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compose `definition` into its raw-definition mirror, keyed by its id.
    pub fn add_definition(&mut self, definition: &MeasureDefinition) {
        self.set.insert_with(definition, &mut MeasureDefinition::clone);
    }

    /// Compose several definitions.
    pub fn add_definitions<'a>(&mut self, definitions: impl IntoIterator<Item = &'a MeasureDefinition>) {
        for definition in definitions {
            self.add_definition(definition);
        }
    }

    /// The composed tree of one definition.
    pub fn get(&self, id: &str) -> Option<&ComposedNode<MeasureDefinition>> {
        self.set.get(id)
    }

    /// The full composed structure.
    pub fn definitions(&self) -> &ComposedSet<MeasureDefinition> {
        &self.set
    }

    /// Every leaf definition across all trees, order unspecified.
    pub fn list_definitions(&self) -> Vec<&MeasureDefinition> {
        self.set.flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{AggregatedMeasure, BaseMeasure, DerivedMeasure};
    use chrono::DateTime;
    use std::collections::BTreeSet;

    fn filter() -> InstanceFilter {
        let begin = DateTime::from_timestamp_millis(0).unwrap();
        let end = DateTime::from_timestamp_millis(1_000).unwrap();
        InstanceFilter::new(TimeInterval::new(begin, end), IntervalCondition::Active)
    }

    fn base(id: &str) -> MeasureDefinition {
        BaseMeasure::new(id).into()
    }

    #[test]
    fn test_computers_bind_definition_and_filter() {
        let mut computers = InstanceComputers::new(filter());
        computers.add_definition(&base("duration"));

        let unit = computers
            .get("duration")
            .and_then(ComposedNode::as_leaf)
            .expect("base definition composes to one unit");
        assert_eq!(unit.definition.id(), "duration");
        assert_eq!(unit.filter, filter());
    }

    #[test]
    fn test_list_computers_reaches_nested_units() {
        let def: MeasureDefinition = AggregatedMeasure::new("agg", base("B"))
            .with_filter(base("F"))
            .with_grouped_by(vec![base("G1"), base("G2")])
            .into();

        let mut computers = InstanceComputers::new(filter());
        computers.add_definition(&def);

        let ids: BTreeSet<&str> = computers
            .list_computers()
            .into_iter()
            .map(|unit| unit.definition.id())
            .collect();
        assert_eq!(ids, BTreeSet::from(["B", "F", "G1", "G2"]));
    }

    #[test]
    fn test_measures_mirror_raw_definitions() {
        let def: MeasureDefinition = DerivedMeasure::new("ratio")
            .using("num", base("N"))
            .using("den", base("D"))
            .into();

        let mut measures = InstanceMeasures::new();
        measures.add_definitions([&def]);

        let map = measures.get("ratio").and_then(ComposedNode::as_map).unwrap();
        assert_eq!(map["num"].as_leaf(), Some(&base("N")));

        let ids: BTreeSet<&str> = measures
            .list_definitions()
            .into_iter()
            .map(MeasureDefinition::id)
            .collect();
        assert_eq!(ids, BTreeSet::from(["N", "D"]));
    }
}
