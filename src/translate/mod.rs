//! Tree-to-formula translation.
//!
//! Two translators share the output type [`TreeTranslation`]:
//!
//! | Mode | Cardinality node `A[lo..hi]` | Children of `A` | Cross-tree constraints |
//! |------|------------------------------|-----------------|------------------------|
//! | [`full`] | unrolled into clones `A_1..A_hi`, each with its own subtree | qualified per clone (`B.A_1`) | rewritten per context, see [`crate::contextual`] |
//! | [`simple`] | erased; stands as `A_1 \| .. \| A_hi` wherever referenced | shared, unqualified (`B`) | raw `A` replaced by the clone disjunction |
//!
//! The full translator also returns a [`Bookkeeping`] arena recording every
//! generated node instance. It lives only as long as one compile call and is
//! what context resolution reads from.

use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::formula::{Formula, Variable};
use crate::types::{FeatureId, InstanceId, NodeId};

pub mod full;
pub mod simple;

/// Tree-derived conjuncts and the variables introduced for tree nodes.
#[derive(Debug, Clone, Default)]
pub struct TreeTranslation {
    pub conjuncts: Vec<Formula>,
    pub variables: BTreeSet<Variable>,
}

/// One occurrence of a tree node in the unrolled tree.
///
/// An ordinary node below a repeated subtree has one instance per clone of
/// that subtree; a cardinality node has one instance per index.
#[derive(Debug, Clone)]
pub struct Instance {
    pub node: NodeId,
    pub feature: FeatureId,
    pub parent: Option<InstanceId>,
    /// Generated, context-qualified name, e.g. `C_1.B.A_2`.
    pub identifier: String,
    /// Clone index in `1..=upper`, for instances of cardinality nodes.
    pub index: Option<u32>,
    pub term: Formula,
}

/// Call-scoped record of all instances produced by the full translator.
#[derive(Debug, Clone, Default)]
pub struct Bookkeeping {
    instances: Vec<Instance>,
    children: Vec<Vec<InstanceId>>,
    by_node: HashMap<NodeId, Vec<InstanceId>>,
}

impl Bookkeeping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new instance, linking it below its parent instance.
    pub fn push(&mut self, instance: Instance) -> InstanceId {
        let id = InstanceId::new(self.instances.len());
        if let Some(parent) = instance.parent {
            self.children[parent.index()].push(id);
        }
        self.by_node.entry(instance.node).or_default().push(id);
        self.instances.push(instance);
        self.children.push(Vec::new());
        id
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn instance(&self, id: InstanceId) -> &Instance {
        &self.instances[id.index()]
    }

    pub fn children(&self, id: InstanceId) -> &[InstanceId] {
        &self.children[id.index()]
    }

    /// All instances of `node`, in creation order.
    pub fn instances_of_node(&self, node: NodeId) -> &[InstanceId] {
        self.by_node.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Instances of `feature` in the unrolled subtree rooted at `start`
    /// (including `start` itself), in breadth-first order.
    pub fn find_under(&self, start: InstanceId, feature: FeatureId) -> Vec<InstanceId> {
        let mut found = Vec::new();
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            if self.instance(current).feature == feature {
                found.push(current);
            }
            queue.extend(self.children(current).iter().copied());
        }
        found
    }

    pub fn terms(&self, ids: &[InstanceId]) -> Vec<Formula> {
        ids.iter().map(|&id| self.instance(id).term.clone()).collect()
    }
}
