//! Atomic formulas for features.
//!
//! A feature occurrence becomes a boolean literal, or a "selected" predicate
//! `x != 0` for numeric features. The identifier may differ from the feature's
//! declared name: clones and features inside repeated subtrees get qualified
//! identifiers such as `B.A_1`.

use crate::error::{Error, Result};
use crate::formula::{Formula, Term, Value, VarType, Variable};
use crate::model::{Feature, FeatureType};

fn var_type(feature: &Feature) -> Result<VarType> {
    match feature.ty() {
        FeatureType::Boolean => Ok(VarType::Boolean),
        FeatureType::Integer => Ok(VarType::Integer),
        FeatureType::Float => Ok(VarType::Float),
        ty @ FeatureType::Text => Err(Error::UnsupportedFeatureType {
            feature: feature.name().to_string(),
            ty,
        }),
    }
}

/// The variable standing for `feature` under the given identifier.
pub fn feature_variable(feature: &Feature, identifier: &str) -> Result<Variable> {
    Ok(Variable::new(identifier, var_type(feature)?))
}

/// The atomic formula that holds iff `feature` is selected under `identifier`.
pub fn feature_formula(feature: &Feature, identifier: &str) -> Result<Formula> {
    let var = feature_variable(feature, identifier)?;
    let formula = match var.ty {
        VarType::Boolean => Formula::Literal(var.name),
        VarType::Integer => Formula::not_equal(Term::Variable(var), Term::Constant(Value::Integer(0))),
        VarType::Float => Formula::not_equal(Term::Variable(var), Term::Constant(Value::Float(0.0))),
    };
    Ok(formula)
}

/// The atomic formula of `feature` under its own declared name.
pub fn plain_feature_formula(feature: &Feature) -> Result<Formula> {
    feature_formula(feature, feature.name())
}
