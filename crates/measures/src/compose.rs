//! Recursive composition of definition trees.
//!
//! One recursion serves every traversal flavor: the shape of the output
//! tree is fixed by the definition, and only the leaf-producing function
//! varies. Keys follow the definition's structure:
//!
//! - aggregated: `from`, optionally `filter` and `referencePoint`, and
//!   `groupedBy-1` .. `groupedBy-k` when grouping is present
//! - derived: the `used` map's own keys
//! - a set of definitions composed together: each definition's `id`

use std::collections::BTreeMap;

use crate::definition::MeasureDefinition;

/// A node of the composed tree: either a leaf value or a nested mapping
/// mirroring one level of the definition's structure.
#[derive(Debug, Clone, PartialEq)]
pub enum ComposedNode<T> {
    /// Leaf value produced from a base definition
    Leaf(T),
    /// Nested composition
    Map(BTreeMap<String, ComposedNode<T>>),
}

impl<T> ComposedNode<T> {
    /// The leaf value, if this node is a leaf.
    pub fn as_leaf(&self) -> Option<&T> {
        match self {
            ComposedNode::Leaf(value) => Some(value),
            ComposedNode::Map(_) => None,
        }
    }

    /// The nested mapping, if this node is one.
    pub fn as_map(&self) -> Option<&BTreeMap<String, ComposedNode<T>>> {
        match self {
            ComposedNode::Leaf(_) => None,
            ComposedNode::Map(map) => Some(map),
        }
    }

    /// Collect every leaf value beneath this node, at any depth.
    ///
    /// The order of the returned list is unspecified; consumers must not
    /// rely on it.
    pub fn flatten(&self) -> Vec<&T> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves<'a>(&'a self, leaves: &mut Vec<&'a T>) {
        match self {
            ComposedNode::Leaf(value) => leaves.push(value),
            ComposedNode::Map(map) => {
                for node in map.values() {
                    node.collect_leaves(leaves);
                }
            }
        }
    }
}

/// Rewrite one definition into its mirrored composed tree.
///
/// `leaf` is invoked once per base definition encountered, in traversal
/// order, and produces the leaf values of the output tree.
pub fn compose<T>(
    definition: &MeasureDefinition,
    leaf: &mut dyn FnMut(&MeasureDefinition) -> T,
) -> ComposedNode<T> {
    match definition {
        MeasureDefinition::Base(_) => ComposedNode::Leaf(leaf(definition)),
        MeasureDefinition::Aggregated(agg) => {
            let mut map = BTreeMap::new();
            map.insert("from".to_string(), compose(&agg.base, leaf));
            if let Some(filter) = &agg.filter {
                map.insert("filter".to_string(), compose(filter, leaf));
            }
            if let Some(reference_point) = &agg.reference_point {
                map.insert("referencePoint".to_string(), compose(reference_point, leaf));
            }
            for (n, grouping) in agg.grouped_by.iter().enumerate() {
                map.insert(format!("groupedBy-{}", n + 1), compose(grouping, leaf));
            }
            ComposedNode::Map(map)
        }
        MeasureDefinition::Derived(derived) => ComposedNode::Map(
            derived
                .used
                .iter()
                .map(|(name, used)| (name.clone(), compose(used, leaf)))
                .collect(),
        ),
    }
}

/// Several independent definitions composed into one structure, keyed by
/// each definition's `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedSet<T> {
    nodes: BTreeMap<String, ComposedNode<T>>,
}

impl<T> ComposedSet<T> {
    /// Create an empty set.
    pub fn new() -> Self {
        ComposedSet {
            nodes: BTreeMap::new(),
        }
    }

    /// Compose `definition` and insert its tree under the definition's id.
    pub fn insert_with(
        &mut self,
        definition: &MeasureDefinition,
        leaf: &mut dyn FnMut(&MeasureDefinition) -> T,
    ) {
        self.nodes
            .insert(definition.id().to_string(), compose(definition, leaf));
    }

    /// The composed tree of one definition.
    pub fn get(&self, id: &str) -> Option<&ComposedNode<T>> {
        self.nodes.get(id)
    }

    /// Number of top-level definitions composed.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate the top-level (id, tree) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ComposedNode<T>)> {
        self.nodes.iter()
    }

    /// Collect every leaf value across all composed definitions.
    ///
    /// Ordering is unspecified, as with [`ComposedNode::flatten`].
    pub fn flatten(&self) -> Vec<&T> {
        let mut leaves = Vec::new();
        for node in self.nodes.values() {
            node.collect_leaves(&mut leaves);
        }
        leaves
    }
}

impl<T> Default for ComposedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{AggregatedMeasure, BaseMeasure, DerivedMeasure};
    use std::collections::BTreeSet;

    fn base(id: &str) -> MeasureDefinition {
        BaseMeasure::new(id).into()
    }

    /// Leaf function recording the id of the definition it was given.
    fn ids(def: &MeasureDefinition) -> String {
        def.id().to_string()
    }

    #[test]
    fn test_base_composes_to_leaf() {
        let node = compose(&base("b"), &mut ids);
        assert_eq!(node.as_leaf(), Some(&"b".to_string()));
    }

    #[test]
    fn test_aggregated_keys() {
        let def: MeasureDefinition = AggregatedMeasure::new("agg", base("B"))
            .with_filter(base("F"))
            .with_grouped_by(vec![base("G1"), base("G2")])
            .into();

        let node = compose(&def, &mut ids);
        let map = node.as_map().expect("aggregated composes to a map");
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["filter", "from", "groupedBy-1", "groupedBy-2"]);
        assert_eq!(map["from"].as_leaf(), Some(&"B".to_string()));
        assert_eq!(map["filter"].as_leaf(), Some(&"F".to_string()));
        assert_eq!(map["groupedBy-1"].as_leaf(), Some(&"G1".to_string()));
        assert_eq!(map["groupedBy-2"].as_leaf(), Some(&"G2".to_string()));
    }

    #[test]
    fn test_optional_keys_absent_when_unset() {
        let def: MeasureDefinition = AggregatedMeasure::new("agg", base("B")).into();
        let node = compose(&def, &mut ids);
        let map = node.as_map().unwrap();
        assert_eq!(map.len(), 1, "only `from` without filter/grouping");
        assert!(map.contains_key("from"));
    }

    #[test]
    fn test_reference_point_key() {
        let def: MeasureDefinition = AggregatedMeasure::new("agg", base("B"))
            .with_reference_point(base("R"))
            .into();
        let node = compose(&def, &mut ids);
        let map = node.as_map().unwrap();
        assert_eq!(map["referencePoint"].as_leaf(), Some(&"R".to_string()));
    }

    #[test]
    fn test_derived_uses_caller_keys() {
        let def: MeasureDefinition = DerivedMeasure::new("d")
            .using("numerator", base("N"))
            .using("denominator", base("D"))
            .into();
        let node = compose(&def, &mut ids);
        let map = node.as_map().unwrap();
        assert_eq!(map["numerator"].as_leaf(), Some(&"N".to_string()));
        assert_eq!(map["denominator"].as_leaf(), Some(&"D".to_string()));
    }

    #[test]
    fn test_nested_recursion_mirrors_structure() {
        // A derived measure whose sub-measure is itself aggregated.
        let inner: MeasureDefinition = AggregatedMeasure::new("inner", base("B"))
            .with_grouped_by(vec![base("G")])
            .into();
        let def: MeasureDefinition = DerivedMeasure::new("d").using("agg", inner).into();

        let node = compose(&def, &mut ids);
        let inner_map = node.as_map().unwrap()["agg"]
            .as_map()
            .expect("nested aggregation stays a map");
        assert_eq!(inner_map["from"].as_leaf(), Some(&"B".to_string()));
        assert_eq!(inner_map["groupedBy-1"].as_leaf(), Some(&"G".to_string()));
    }

    #[test]
    fn test_flatten_collects_all_leaves() {
        let def: MeasureDefinition = AggregatedMeasure::new("agg", base("B"))
            .with_filter(base("F"))
            .with_grouped_by(vec![base("G1"), base("G2")])
            .into();

        let mut set = ComposedSet::new();
        set.insert_with(&def, &mut ids);

        let leaves: BTreeSet<String> = set.flatten().into_iter().cloned().collect();
        let expected: BTreeSet<String> = ["B", "F", "G1", "G2"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(leaves, expected);
    }

    #[test]
    fn test_set_keys_by_definition_id() {
        let mut set = ComposedSet::new();
        let two: MeasureDefinition = DerivedMeasure::new("two").using("x", base("X")).into();
        set.insert_with(&base("one"), &mut ids);
        set.insert_with(&two, &mut ids);

        assert_eq!(set.len(), 2);
        assert!(set.get("one").unwrap().as_leaf().is_some());
        assert!(set.get("two").unwrap().as_map().is_some());
        assert!(set.get("three").is_none());
    }
}
