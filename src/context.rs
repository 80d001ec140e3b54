//! Context resolution for cross-tree constraints.
//!
//! The *context* of a tree node is its nearest cardinality node, looking at
//! the node itself first and then upwards. Features without one live in the
//! [`Context::Root`] context, which has a single, unrepeated instance.
//!
//! Constraints are bucketed by the *set* of contexts of the features they
//! reference:
//!
//! - `{}` or `{Root}`: [`Scope::Plain`], emitted verbatim;
//! - `{Node(c)}`: [`Scope::Local`], instantiated once per clone of `c`;
//! - anything larger: [`Scope::Global`], spanning independent contexts.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use log::debug;

use crate::model::{Constraint, FeatureModel};
use crate::types::{FeatureId, NodeId};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Context {
    Root,
    Node(NodeId),
}

impl Context {
    pub fn node(self) -> Option<NodeId> {
        match self {
            Context::Root => None,
            Context::Node(n) => Some(n),
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Context::Root => write!(f, "root"),
            Context::Node(n) => write!(f, "{}", n),
        }
    }
}

pub type ContextSet = BTreeSet<Context>;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Scope {
    Plain,
    Local(NodeId),
    Global,
}

/// Nearest cardinality node at or above `node`.
pub fn next_cardinality_ancestor(model: &FeatureModel, node: NodeId) -> Option<NodeId> {
    if model.is_cardinality_node(node) {
        return Some(node);
    }
    model.ancestors(node).find(|&a| model.is_cardinality_node(a))
}

/// Context of a feature's tree placement. Features that are declared but not
/// placed in the tree belong to [`Context::Root`].
pub fn feature_context(model: &FeatureModel, feature: FeatureId) -> Context {
    model
        .feature_node(feature)
        .and_then(|node| next_cardinality_ancestor(model, node))
        .map_or(Context::Root, Context::Node)
}

pub fn constraint_contexts(model: &FeatureModel, constraint: &Constraint) -> ContextSet {
    constraint
        .referenced_features()
        .iter()
        .map(|&f| feature_context(model, f))
        .collect()
}

pub fn classify(contexts: &ContextSet) -> Scope {
    let mut nodes = contexts.iter().filter_map(|c| c.node());
    match nodes.next() {
        None => Scope::Plain,
        Some(node) if contexts.len() == 1 => Scope::Local(node),
        Some(_) => Scope::Global,
    }
}

/// Cross-tree constraints (as indices into [`FeatureModel::constraints`])
/// grouped by their context set.
#[derive(Debug, Clone, Default)]
pub struct ConstraintBuckets {
    /// Constraints not involving any cardinality node.
    pub plain: Vec<usize>,
    pub buckets: BTreeMap<ContextSet, Vec<usize>>,
}

pub fn bucket_constraints(model: &FeatureModel) -> ConstraintBuckets {
    let mut result = ConstraintBuckets::default();
    for (i, constraint) in model.constraints().iter().enumerate() {
        let contexts = constraint_contexts(model, constraint);
        match classify(&contexts) {
            Scope::Plain => result.plain.push(i),
            _ => result.buckets.entry(contexts).or_default().push(i),
        }
    }
    for (contexts, indices) in &result.buckets {
        debug!(
            "context bucket {{{}}}: {:?} constraints {:?}",
            contexts.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(", "),
            classify(contexts),
            indices
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::formula::Formula;

    fn lit(name: &str) -> Formula {
        Formula::literal(name)
    }

    // root -> A[0..2] -> B -> C[0..2] -> D, root -> F
    fn sample() -> (FeatureModel, [NodeId; 6]) {
        let mut model = FeatureModel::new();
        let root = model.add_root_feature("root");
        let a = model.add_child_feature(root, "A");
        model.set_feature_cardinality(a, 0, 2);
        let b = model.add_child_feature(a, "B");
        let c = model.add_child_feature(b, "C");
        model.set_feature_cardinality(c, 0, 2);
        let d = model.add_child_feature(c, "D");
        let f = model.add_child_feature(root, "F");
        (model, [root, a, b, c, d, f])
    }

    #[test]
    fn test_next_cardinality_ancestor() {
        let (model, [root, a, b, c, d, f]) = sample();
        assert_eq!(next_cardinality_ancestor(&model, root), None);
        assert_eq!(next_cardinality_ancestor(&model, a), Some(a));
        assert_eq!(next_cardinality_ancestor(&model, b), Some(a));
        assert_eq!(next_cardinality_ancestor(&model, c), Some(c));
        assert_eq!(next_cardinality_ancestor(&model, d), Some(c));
        assert_eq!(next_cardinality_ancestor(&model, f), None);
    }

    #[test]
    fn test_classify() {
        let (_, [_, a, _, c, _, _]) = sample();
        assert_eq!(classify(&ContextSet::new()), Scope::Plain);
        assert_eq!(classify(&ContextSet::from([Context::Root])), Scope::Plain);
        assert_eq!(classify(&ContextSet::from([Context::Node(a)])), Scope::Local(a));
        assert_eq!(
            classify(&ContextSet::from([Context::Node(a), Context::Node(c)])),
            Scope::Global
        );
        assert_eq!(classify(&ContextSet::from([Context::Root, Context::Node(a)])), Scope::Global);
    }

    #[test]
    fn test_buckets_are_keyed_by_set() {
        let (mut model, [_, a, _, c, _, _]) = sample();
        let p = model.add_constraint(Formula::implies(lit("F"), lit("root"))).unwrap();
        let l = model.add_constraint(Formula::implies(lit("B"), lit("A"))).unwrap();
        let g1 = model.add_constraint(Formula::implies(lit("B"), lit("D"))).unwrap();
        let g2 = model.add_constraint(Formula::implies(lit("C"), lit("A"))).unwrap();

        let buckets = bucket_constraints(&model);
        assert_eq!(buckets.plain, vec![p]);
        assert_eq!(buckets.buckets.len(), 2);
        assert_eq!(buckets.buckets[&ContextSet::from([Context::Node(a)])], vec![l]);
        assert_eq!(
            buckets.buckets[&ContextSet::from([Context::Node(c), Context::Node(a)])],
            vec![g1, g2]
        );
    }

    #[test]
    fn test_unplaced_feature_is_root_context() {
        let (mut model, _) = sample();
        let loose = model.add_feature("Loose");
        assert_eq!(feature_context(&model, loose), Context::Root);
    }
}
