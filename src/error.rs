//! Errors raised while building a feature model or compiling it into a formula.
//!
//! Compilation is all-or-nothing: any error aborts the whole call and no
//! partial formula is returned.

use thiserror::Error;

use crate::model::FeatureType;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The declared type of a feature has no rule for building its atomic formula.
    #[error("feature '{feature}' has type {ty}, which has no literal representation")]
    UnsupportedFeatureType { feature: String, ty: FeatureType },

    /// An attribute aggregate (sum/average) appears in a model that also
    /// contains a cardinality feature.
    #[error("constraint '{constraint}' uses an attribute aggregate, which cannot be combined with cardinality features")]
    AggregateCardinalityConflict { constraint: String },

    /// A feature referenced by a cross-tree constraint has no instance under
    /// the clone the constraint is being rewritten for.
    #[error("no instance of feature '{feature}' found in context '{context}'")]
    MissingContextualInstance { feature: String, context: String },

    /// A constraint compares the value of a numeric feature in a context where
    /// that feature has several instances, so the value is not a single variable.
    #[error("feature '{feature}' has several instances in context '{context}', its value is ambiguous")]
    AmbiguousFeatureValue { feature: String, context: String },

    /// A constraint uses a numeric feature as a boolean literal.
    #[error("feature '{name}' has type {ty} and cannot be used as a boolean literal")]
    NonBooleanLiteral { name: String, ty: FeatureType },

    /// A cross-tree constraint names a feature that the model does not declare.
    #[error("unknown feature '{name}'")]
    UnknownFeature { name: String },

    /// The model has no feature tree to translate.
    #[error("feature model has no root")]
    NoRoot,
}

pub type Result<T> = std::result::Result<T, Error>;
