//! Type-safe handles into the feature model and into translation state.
//!
//! Features, tree nodes and generated instances all live in flat arenas and are
//! referred to by index. The newtypes below keep these indices apart at compile
//! time, so a node index can never be used where a feature index is expected.
use std::fmt;

/// Index of a feature in a [`FeatureModel`][crate::model::FeatureModel].
///
/// A feature is the named, typed entity. It may be placed in the tree by a
/// [`NodeId`], but its identity does not depend on that placement.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FeatureId(usize);

impl FeatureId {
    pub fn new(index: usize) -> Self {
        FeatureId(index)
    }

    /// Returns the raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// Index of a tree node (one placement of a feature) in a feature model.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn new(index: usize) -> Self {
        NodeId(index)
    }

    /// Returns the raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Identifier of a child group, unique among the groups of one node.
///
/// Group `0` always exists: every node starts out with a single AND group.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct GroupId(usize);

impl GroupId {
    pub fn new(index: usize) -> Self {
        GroupId(index)
    }

    /// Returns the raw group index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Index of a generated instance (a plain node occurrence or a numbered clone)
/// in the call-scoped translation state.
///
/// Instances exist only for the duration of one compile call.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct InstanceId(usize);

impl InstanceId {
    pub fn new(index: usize) -> Self {
        InstanceId(index)
    }

    /// Returns the raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.0)
    }
}
