//! Simple translation: a cardinality node is never a logical parent.
//!
//! A cardinality node `A[lo..hi]` is represented everywhere by the
//! disjunction `A_1 | .. | A_hi` of unqualified clone literals: as the parent
//! term of its children, as a member of its parent's groups, as the term its
//! own groups are encoded for, and inside cross-tree constraints. Its children
//! are not replicated. The raw variable `A` is not reported as used, so a
//! constraint comparing the value of a numeric cardinality feature is an error.

use log::debug;

use crate::error::{Error, Result};
use crate::formula::Formula;
use crate::groups::{encode_groups, GroupMember};
use crate::literal::{feature_formula, feature_variable, plain_feature_formula};
use crate::model::FeatureModel;
use crate::translate::TreeTranslation;
use crate::types::NodeId;

/// Translates the tree and rewrites all cross-tree constraints of `model`.
///
/// The returned conjuncts contain the tree-derived implications followed by
/// every cross-tree constraint with cardinality features replaced.
pub fn translate(model: &FeatureModel) -> Result<TreeTranslation> {
    let mut output = TreeTranslation::default();
    let mut replacements: Vec<(Formula, Formula)> = Vec::new();
    let mut replaced: Vec<&str> = Vec::new();

    for node in model.preorder() {
        let n = model.node(node);
        let feature = model.node_feature(node);

        if n.is_root() {
            output.variables.insert(feature_variable(feature, feature.name())?);
            if n.is_mandatory() {
                output.conjuncts.push(plain_feature_formula(feature)?);
            }
        } else if model.is_cardinality_node(node) {
            let parent_term = parent_term(model, node)?;
            let clones = clone_terms(model, node)?;
            for (i, clone) in clones.iter().enumerate() {
                output.conjuncts.push(Formula::implies(clone.clone(), parent_term.clone()));
                if i > 0 {
                    output.conjuncts.push(Formula::implies(clone.clone(), clones[i - 1].clone()));
                }
            }
            for i in 1..=n.cardinality().upper {
                output
                    .variables
                    .insert(feature_variable(feature, &clone_identifier(feature.name(), i))?);
            }
            if n.cardinality().lower > 0 {
                let at_least = Formula::at_least(n.cardinality().lower, clones.clone());
                output.conjuncts.push(Formula::implies(parent_term, at_least));
            }
            replacements.push((plain_feature_formula(feature)?, Formula::or(clones)));
            replaced.push(feature.name());
        } else {
            output.variables.insert(feature_variable(feature, feature.name())?);
            let term = plain_feature_formula(feature)?;
            output.conjuncts.push(Formula::implies(term, parent_term(model, node)?));
        }

        let mut members = Vec::with_capacity(n.children().len());
        for &child in n.children() {
            members.push(GroupMember {
                term: node_term(model, child)?,
                group: model.node(child).parent_group(),
                mandatory: model.node(child).is_mandatory(),
            });
        }
        encode_groups(&node_term(model, node)?, n.groups(), &members, &mut output.conjuncts);
    }

    let lookup = |f: &Formula| {
        replacements
            .iter()
            .find(|(target, _)| target == f)
            .map(|(_, replacement)| replacement.clone())
    };
    for constraint in model.constraints() {
        let rewritten = constraint.formula().substitute(&lookup);
        if let Some(name) = replaced.iter().find(|name| rewritten.mentions_variable(name)) {
            return Err(Error::AmbiguousFeatureValue {
                feature: name.to_string(),
                context: "model".to_string(),
            });
        }
        debug!("cross-tree constraint {} => {}", constraint.formula(), rewritten);
        output.conjuncts.push(rewritten);
    }

    debug!(
        "simple translation: {} conjuncts, {} cardinality features replaced",
        output.conjuncts.len(),
        replacements.len()
    );
    Ok(output)
}

fn clone_identifier(name: &str, index: u32) -> String {
    format!("{}_{}", name, index)
}

fn clone_terms(model: &FeatureModel, node: NodeId) -> Result<Vec<Formula>> {
    let feature = model.node_feature(node);
    (1..=model.node(node).cardinality().upper)
        .map(|i| feature_formula(feature, &clone_identifier(feature.name(), i)))
        .collect()
}

/// Term standing for `node`: its literal, or its clone disjunction.
fn node_term(model: &FeatureModel, node: NodeId) -> Result<Formula> {
    if model.is_cardinality_node(node) {
        Ok(Formula::or(clone_terms(model, node)?))
    } else {
        plain_feature_formula(model.node_feature(node))
    }
}

fn parent_term(model: &FeatureModel, node: NodeId) -> Result<Formula> {
    match model.parent(node) {
        Some(parent) => node_term(model, parent),
        None => Ok(Formula::True),
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::formula::{Comparison, Term, Value, VarType, Variable};
    use crate::model::{FeatureType, GroupKind};

    fn lit(name: &str) -> Formula {
        Formula::literal(name)
    }

    fn implies(a: &str, b: &str) -> Formula {
        Formula::implies(lit(a), lit(b))
    }

    fn a_clones() -> Formula {
        Formula::or(vec![lit("A_1"), lit("A_2")])
    }

    #[test]
    fn test_nested_cardinalities() {
        let mut model = FeatureModel::new();
        let root = model.add_root_feature("root");
        model.make_mandatory(root);
        let a = model.add_child_feature(root, "A");
        model.set_feature_cardinality(a, 0, 2);
        let b = model.add_child_feature(a, "B");
        model.set_feature_cardinality(b, 0, 2);

        let tree = translate(&model).unwrap();
        assert_eq!(
            tree.conjuncts,
            vec![
                lit("root"),
                implies("A_1", "root"),
                implies("A_2", "root"),
                implies("A_2", "A_1"),
                Formula::implies(lit("B_1"), a_clones()),
                Formula::implies(lit("B_2"), a_clones()),
                implies("B_2", "B_1"),
            ]
        );
    }

    #[test]
    fn test_children_of_cardinality_node() {
        let mut model = FeatureModel::new();
        let root = model.add_root_feature("root");
        model.make_mandatory(root);
        let a = model.add_child_feature(root, "A");
        model.set_feature_cardinality(a, 0, 2);
        model.set_group_kind(a, GroupKind::Alternative);
        model.add_child_feature(a, "B");
        model.add_child_feature(a, "C");

        let tree = translate(&model).unwrap();
        assert_eq!(
            tree.conjuncts,
            vec![
                lit("root"),
                implies("A_1", "root"),
                implies("A_2", "root"),
                implies("A_2", "A_1"),
                Formula::implies(a_clones(), Formula::choose(1, vec![lit("B"), lit("C")])),
                Formula::implies(lit("B"), a_clones()),
                Formula::implies(lit("C"), a_clones()),
            ]
        );
    }

    #[test]
    fn test_constraints_are_rewritten() {
        let mut model = FeatureModel::new();
        let root = model.add_root_feature("root");
        model.make_mandatory(root);
        let a = model.add_child_feature(root, "A");
        model.set_feature_cardinality(a, 1, 2);
        model.add_child_feature(a, "B");
        model.add_constraint(implies("A", "B")).unwrap();
        model.add_constraint(implies("B", "root")).unwrap();

        let tree = translate(&model).unwrap();
        assert!(tree
            .conjuncts
            .contains(&Formula::implies(lit("root"), Formula::at_least(1, vec![lit("A_1"), lit("A_2")]))));
        assert!(tree.conjuncts.contains(&Formula::implies(a_clones(), lit("B"))));
        assert!(tree.conjuncts.contains(&implies("B", "root")));
        assert!(!tree.conjuncts.iter().any(|f| f.contains(&lit("A"))));
    }

    #[test]
    fn test_raw_cardinality_variable_dropped() {
        let mut model = FeatureModel::new();
        let root = model.add_root_feature("root");
        let a = model.add_child_feature(root, "A");
        model.set_feature_cardinality(a, 0, 3);
        model.add_child_feature(a, "B");

        let tree = translate(&model).unwrap();
        let expected: Vec<Variable> = ["A_1", "A_2", "A_3", "B", "root"]
            .into_iter()
            .map(Variable::boolean)
            .collect();
        assert_eq!(tree.variables.into_iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_value_of_numeric_cardinality_feature_rejected() {
        let mut model = FeatureModel::new();
        let root = model.add_root_feature("root");
        let n = model.add_typed_feature("n", FeatureType::Integer);
        let n = model.add_child(root, n);
        model.set_feature_cardinality(n, 0, 2);
        let big = Formula::compare(
            Comparison::Greater,
            Term::Variable(Variable::new("n", VarType::Integer)),
            Term::Constant(Value::Integer(5)),
        );
        model.add_constraint(Formula::implies(lit("root"), big)).unwrap();

        assert_eq!(
            translate(&model).unwrap_err(),
            Error::AmbiguousFeatureValue {
                feature: "n".to_string(),
                context: "model".to_string(),
            }
        );
    }
}
