//! Feature models: typed features placed in a tree of groups, plus cross-tree
//! constraints.
//!
//! All entities are stored in flat arenas owned by [`FeatureModel`] and
//! addressed through [`FeatureId`] and [`NodeId`] handles. A model is built once
//! through the mutating methods below and then only read by the compiler, so it
//! can be shared between concurrent compile calls.
//!
//! ```
//! use featlogic::model::{FeatureModel, GroupKind};
//!
//! let mut model = FeatureModel::new();
//! let root = model.add_root_feature("root");
//! model.make_mandatory(root);
//!
//! let slot = model.add_child_feature(root, "Slot");
//! model.set_feature_cardinality(slot, 0, 4);
//! model.set_group_kind(slot, GroupKind::Alternative);
//! model.add_child_feature(slot, "Ssd");
//! model.add_child_feature(slot, "Hdd");
//!
//! assert!(model.is_cardinality_node(slot));
//! assert!(model.has_cardinality_feature());
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::{Error, Result};
use crate::formula::Formula;
use crate::types::{FeatureId, GroupId, NodeId};

/// Declared type of a feature.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum FeatureType {
    Boolean,
    Integer,
    Float,
    Text,
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureType::Boolean => write!(f, "boolean"),
            FeatureType::Integer => write!(f, "integer"),
            FeatureType::Float => write!(f, "float"),
            FeatureType::Text => write!(f, "text"),
        }
    }
}

/// Value of a feature attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Feature {
    id: FeatureId,
    name: String,
    ty: FeatureType,
    attributes: BTreeMap<String, AttributeValue>,
}

impl Feature {
    pub fn id(&self) -> FeatureId {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn ty(&self) -> FeatureType {
        self.ty
    }
    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }
}

/// Repetition bounds of a tree node.
///
/// An upper bound of 1 is an ordinary node; anything above makes the node a
/// cardinality node whose subtree is unrolled into `upper` numbered clones.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Cardinality {
    pub lower: u32,
    pub upper: u32,
}

impl Cardinality {
    /// Creates new bounds.
    ///
    /// # Panics
    ///
    /// Panics if `upper == 0` or `lower > upper`.
    pub fn new(lower: u32, upper: u32) -> Self {
        assert!(upper >= 1, "Feature cardinality upper bound must be >= 1");
        assert!(lower <= upper, "Feature cardinality lower bound exceeds upper bound");
        Self { lower, upper }
    }

    pub fn is_repeatable(self) -> bool {
        self.upper > 1
    }
}

impl Default for Cardinality {
    fn default() -> Self {
        Self { lower: 0, upper: 1 }
    }
}

/// Combination rule of a group of sibling nodes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum GroupKind {
    /// Every child is selected independently.
    And,
    /// At least one child is selected.
    Or,
    /// Exactly one child is selected.
    Alternative,
    /// Between `lower` and `upper` children are selected; `None` is unbounded.
    Cardinality { lower: u32, upper: Option<u32> },
}

/// One placement of a feature in the feature tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    id: NodeId,
    feature: FeatureId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    groups: Vec<GroupKind>,
    parent_group: GroupId,
    cardinality: Cardinality,
    mandatory: bool,
}

impl TreeNode {
    pub fn id(&self) -> NodeId {
        self.id
    }
    pub fn feature(&self) -> FeatureId {
        self.feature
    }
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
    /// Child groups, indexed by [`GroupId`].
    pub fn groups(&self) -> &[GroupKind] {
        &self.groups
    }
    /// The group of the parent this node belongs to.
    pub fn parent_group(&self) -> GroupId {
        self.parent_group
    }
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }
    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// A cross-tree constraint: a formula over feature names.
#[derive(Debug, Clone)]
pub struct Constraint {
    formula: Formula,
    referenced: Vec<FeatureId>,
}

impl Constraint {
    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    /// Features named in the formula, in order of first occurrence.
    pub fn referenced_features(&self) -> &[FeatureId] {
        &self.referenced
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeatureModel {
    features: Vec<Feature>,
    nodes: Vec<TreeNode>,
    roots: Vec<NodeId>,
    constraints: Vec<Constraint>,
    by_name: HashMap<String, FeatureId>,
    placement: HashMap<FeatureId, NodeId>,
}

impl FeatureModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a boolean feature.
    pub fn add_feature(&mut self, name: impl Into<String>) -> FeatureId {
        self.add_typed_feature(name, FeatureType::Boolean)
    }

    /// Declares a feature of the given type.
    ///
    /// # Panics
    ///
    /// Panics if a feature with the same name already exists.
    pub fn add_typed_feature(&mut self, name: impl Into<String>, ty: FeatureType) -> FeatureId {
        let name = name.into();
        assert!(!self.by_name.contains_key(&name), "Duplicate feature name '{}'", name);
        let id = FeatureId::new(self.features.len());
        self.by_name.insert(name.clone(), id);
        self.features.push(Feature {
            id,
            name,
            ty,
            attributes: BTreeMap::new(),
        });
        id
    }

    pub fn set_attribute(&mut self, feature: FeatureId, name: impl Into<String>, value: AttributeValue) {
        self.features[feature.index()].attributes.insert(name.into(), value);
    }

    fn alloc_node(&mut self, feature: FeatureId, parent: Option<NodeId>) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(TreeNode {
            id,
            feature,
            parent,
            children: Vec::new(),
            groups: vec![GroupKind::And],
            parent_group: GroupId::default(),
            cardinality: Cardinality::default(),
            mandatory: false,
        });
        self.placement.entry(feature).or_insert(id);
        id
    }

    /// Places `feature` as a new tree root.
    pub fn add_root(&mut self, feature: FeatureId) -> NodeId {
        let id = self.alloc_node(feature, None);
        self.roots.push(id);
        id
    }

    /// Places `feature` below `parent`, as a member of the parent's group `0`.
    pub fn add_child(&mut self, parent: NodeId, feature: FeatureId) -> NodeId {
        let id = self.alloc_node(feature, Some(parent));
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Declares a boolean feature and places it as a new root.
    pub fn add_root_feature(&mut self, name: impl Into<String>) -> NodeId {
        let feature = self.add_feature(name);
        self.add_root(feature)
    }

    /// Declares a boolean feature and places it below `parent`.
    pub fn add_child_feature(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        let feature = self.add_feature(name);
        self.add_child(parent, feature)
    }

    pub fn set_feature_cardinality(&mut self, node: NodeId, lower: u32, upper: u32) {
        self.nodes[node.index()].cardinality = Cardinality::new(lower, upper);
    }

    pub fn make_mandatory(&mut self, node: NodeId) {
        self.nodes[node.index()].mandatory = true;
    }

    pub fn make_optional(&mut self, node: NodeId) {
        self.nodes[node.index()].mandatory = false;
    }

    /// Changes the kind of the node's default group `0`.
    pub fn set_group_kind(&mut self, node: NodeId, kind: GroupKind) {
        self.set_kind_of_group(node, GroupId::default(), kind);
    }

    /// Changes the kind of an existing group.
    ///
    /// # Panics
    ///
    /// Panics if the node has no such group.
    pub fn set_kind_of_group(&mut self, node: NodeId, group: GroupId, kind: GroupKind) {
        let groups = &mut self.nodes[node.index()].groups;
        assert!(group.index() < groups.len(), "Node {} has no group {}", node, group);
        groups[group.index()] = kind;
    }

    /// Adds another child group to `node` and returns its id.
    pub fn add_group(&mut self, node: NodeId, kind: GroupKind) -> GroupId {
        let groups = &mut self.nodes[node.index()].groups;
        groups.push(kind);
        GroupId::new(groups.len() - 1)
    }

    /// Moves `child` into the parent's group `group`.
    ///
    /// # Panics
    ///
    /// Panics if `child` is a root or the parent has no such group.
    pub fn set_parent_group(&mut self, child: NodeId, group: GroupId) {
        let Some(parent) = self.nodes[child.index()].parent else {
            panic!("Root node {} has no parent group", child);
        };
        assert!(
            group.index() < self.nodes[parent.index()].groups.len(),
            "Node {} has no group {}",
            parent,
            group
        );
        self.nodes[child.index()].parent_group = group;
    }

    /// Adds a cross-tree constraint. Every literal or variable name in the
    /// formula must be a declared feature, except inside attribute aggregates.
    /// Numeric features may only appear inside comparisons.
    pub fn add_constraint(&mut self, formula: Formula) -> Result<usize> {
        let mut referenced = Vec::new();
        for name in formula.names() {
            let id = self
                .feature_by_name(&name)
                .ok_or_else(|| Error::UnknownFeature { name: name.clone() })?;
            let ty = self.feature(id).ty();
            if matches!(ty, FeatureType::Integer | FeatureType::Float) && formula.contains(&Formula::literal(&name)) {
                return Err(Error::NonBooleanLiteral { name, ty });
            }
            referenced.push(id);
        }
        self.constraints.push(Constraint { formula, referenced });
        Ok(self.constraints.len() - 1)
    }
}

impl FeatureModel {
    pub fn features(&self) -> &[Feature] {
        &self.features
    }
    pub fn feature(&self, id: FeatureId) -> &Feature {
        &self.features[id.index()]
    }
    pub fn feature_by_name(&self, name: &str) -> Option<FeatureId> {
        self.by_name.get(name).copied()
    }
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.index()]
    }
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.node(node).children
    }
    /// Feature wrapped by `node`.
    pub fn node_feature(&self, node: NodeId) -> &Feature {
        self.feature(self.node(node).feature)
    }

    /// The tree placement of a feature (its first one, if placed several times).
    pub fn feature_node(&self, feature: FeatureId) -> Option<NodeId> {
        self.placement.get(&feature).copied()
    }

    /// Whether `node` is unrolled into clones: its upper bound exceeds 1 and it
    /// is not a root. Roots are never repeated.
    pub fn is_cardinality_node(&self, node: NodeId) -> bool {
        let n = self.node(node);
        n.parent.is_some() && n.cardinality.is_repeatable()
    }

    /// Whether some strict ancestor of `node` is a cardinality node.
    pub fn cardinality_feature_above(&self, node: NodeId) -> bool {
        self.ancestors(node).any(|a| self.is_cardinality_node(a))
    }

    pub fn has_cardinality_feature(&self) -> bool {
        (0..self.nodes.len()).any(|i| self.is_cardinality_node(NodeId::new(i)))
    }

    /// Strict ancestors of `node`, nearest first.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(node), move |&n| self.parent(n))
    }

    /// Whether `ancestor` lies strictly above `node`.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|a| a == ancestor)
    }

    /// All nodes in depth-first pre-order, root by root.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            order.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        order
    }
}
