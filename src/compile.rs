//! Compiling a feature model into one formula.
//!
//! [`Compiler::compile`] is a pure function of the model and its
//! [`CompileConfig`]: all working state (clones, generated identifiers,
//! bookkeeping) is local to the call and the model is only read. A model may
//! therefore be compiled from several threads at once, as long as nobody
//! mutates it meanwhile.
//!
//! ```
//! use featlogic::compile::{CompileConfig, Compiler, TranslationMode};
//! use featlogic::formula::Formula;
//! use featlogic::model::FeatureModel;
//!
//! let mut model = FeatureModel::new();
//! let root = model.add_root_feature("root");
//! model.make_mandatory(root);
//! let a = model.add_child_feature(root, "A");
//! model.set_feature_cardinality(a, 0, 2);
//!
//! let compiler = Compiler::new(CompileConfig::default().with_mode(TranslationMode::Full));
//! let compiled = compiler.compile(&model).unwrap();
//! assert_eq!(compiled.formula.to_string(), "(root & (A_1 => root) & (A_2 => root) & (A_2 => A_1))");
//! ```

use std::collections::BTreeSet;
use std::fmt;

use log::info;

use crate::context::bucket_constraints;
use crate::contextual;
use crate::error::{Error, Result};
use crate::formula::{Formula, Variable};
use crate::literal::feature_variable;
use crate::model::FeatureModel;
use crate::translate::{full, simple};

/// How cardinality nodes are translated.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum TranslationMode {
    /// Unroll every cardinality node into clones with their own subtrees, and
    /// rewrite cross-tree constraints per context.
    #[default]
    Full,
    /// Represent a cardinality node by the disjunction of its clone literals.
    Simple,
}

impl fmt::Display for TranslationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationMode::Full => write!(f, "full"),
            TranslationMode::Simple => write!(f, "simple"),
        }
    }
}

/// What to do when a contextual rewrite finds no instance of a feature.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum MissingInstancePolicy {
    /// Abort with [`Error::MissingContextualInstance`].
    #[default]
    Fail,
    /// Log a warning and keep the feature's own term.
    FallBackToFeature,
}

/// Configuration for [`Compiler`].
///
/// Use `CompileConfig::default()` for full translation that fails on missing
/// contextual instances.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct CompileConfig {
    pub mode: TranslationMode,
    pub missing_instance: MissingInstancePolicy,
}

impl CompileConfig {
    pub fn with_mode(mut self, mode: TranslationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_missing_instance(mut self, policy: MissingInstancePolicy) -> Self {
        self.missing_instance = policy;
        self
    }
}

/// Result of a compile call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFormula {
    /// Conjunction of all [`conjuncts`][Self::conjuncts].
    pub formula: Formula,
    pub conjuncts: Vec<Formula>,
    /// Typed free variables used by the formula and by every generated node instance.
    pub variables: BTreeSet<Variable>,
}

impl CompiledFormula {
    pub fn has_conjunct(&self, conjunct: &Formula) -> bool {
        self.conjuncts.contains(conjunct)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Compiler {
    config: CompileConfig,
}

impl Compiler {
    pub fn new(config: CompileConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompileConfig {
        &self.config
    }

    pub fn compile(&self, model: &FeatureModel) -> Result<CompiledFormula> {
        check(model)?;

        let (conjuncts, mut variables) = match self.config.mode {
            TranslationMode::Full => {
                let (tree, book) = full::translate(model)?;
                let buckets = bucket_constraints(model);
                let mut conjuncts = tree.conjuncts;
                conjuncts.extend(buckets.plain.iter().map(|&i| model.constraints()[i].formula().clone()));
                conjuncts.extend(contextual::generate(model, &book, &buckets, self.config.missing_instance)?);
                (conjuncts, tree.variables)
            }
            TranslationMode::Simple => {
                let tree = simple::translate(model)?;
                (tree.conjuncts, tree.variables)
            }
        };

        for conjunct in &conjuncts {
            variables.extend(conjunct.variables());
        }

        info!(
            "compiled {} features ({} mode): {} conjuncts, {} variables",
            model.features().len(),
            self.config.mode,
            conjuncts.len(),
            variables.len()
        );

        Ok(CompiledFormula {
            formula: Formula::and(conjuncts.clone()),
            conjuncts,
            variables,
        })
    }
}

/// Compiles `model` with default settings and the given translation mode.
pub fn compile(model: &FeatureModel, mode: TranslationMode) -> Result<CompiledFormula> {
    Compiler::new(CompileConfig::default().with_mode(mode)).compile(model)
}

/// Rejects models that no translation mode can handle, before any traversal.
fn check(model: &FeatureModel) -> Result<()> {
    if model.roots().is_empty() {
        return Err(Error::NoRoot);
    }
    let has_cardinality = model.has_cardinality_feature();
    for constraint in model.constraints() {
        if has_cardinality && constraint.formula().contains_aggregate() {
            return Err(Error::AggregateCardinalityConflict {
                constraint: constraint.formula().to_string(),
            });
        }
        for &feature in constraint.referenced_features() {
            let feature = model.feature(feature);
            feature_variable(feature, feature.name())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::formula::{Aggregate, Comparison, Term, Value};
    use crate::model::FeatureType;

    fn lit(name: &str) -> Formula {
        Formula::literal(name)
    }

    #[test]
    fn test_config_builders() {
        let config = CompileConfig::default();
        assert_eq!(config.mode, TranslationMode::Full);
        assert_eq!(config.missing_instance, MissingInstancePolicy::Fail);

        let config = config
            .with_mode(TranslationMode::Simple)
            .with_missing_instance(MissingInstancePolicy::FallBackToFeature);
        assert_eq!(Compiler::new(config).config().mode, TranslationMode::Simple);
    }

    #[test]
    fn test_no_root() {
        let model = FeatureModel::new();
        assert_eq!(Compiler::default().compile(&model), Err(Error::NoRoot));
    }

    #[test]
    fn test_formula_is_conjunction() {
        let mut model = FeatureModel::new();
        let root = model.add_root_feature("root");
        model.make_mandatory(root);
        model.add_child_feature(root, "A");
        model.add_constraint(Formula::implies(lit("A"), lit("root"))).unwrap();

        let compiled = compile(&model, TranslationMode::Full).unwrap();
        assert_eq!(compiled.formula, Formula::and(compiled.conjuncts.clone()));
        assert_eq!(
            compiled.conjuncts,
            vec![lit("root"), Formula::implies(lit("A"), lit("root")), Formula::implies(lit("A"), lit("root"))]
        );
        assert_eq!(compiled.variables.len(), 2);
    }

    #[test]
    fn test_aggregate_with_cardinality_rejected() {
        let mut model = FeatureModel::new();
        let root = model.add_root_feature("root");
        let a = model.add_child_feature(root, "A");
        let budget = Formula::compare(
            Comparison::LessEqual,
            Term::Aggregate(Aggregate::Sum("cost".to_string())),
            Term::Constant(Value::Integer(100)),
        );
        model.add_constraint(budget.clone()).unwrap();

        // Fine without cardinality nodes.
        assert!(compile(&model, TranslationMode::Simple).is_ok());

        model.set_feature_cardinality(a, 0, 2);
        for mode in [TranslationMode::Full, TranslationMode::Simple] {
            assert_eq!(
                compile(&model, mode),
                Err(Error::AggregateCardinalityConflict {
                    constraint: budget.to_string(),
                })
            );
        }
    }

    #[test]
    fn test_text_feature_in_constraint_rejected() {
        let mut model = FeatureModel::new();
        model.add_root_feature("root");
        model.add_typed_feature("label", FeatureType::Text);
        model.add_constraint(Formula::implies(lit("label"), lit("root"))).unwrap();

        let err = compile(&model, TranslationMode::Full).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFeatureType { .. }));
    }
}
