//! Contextual clone constraints.
//!
//! Rewrites each bucketed cross-tree constraint once per clone of each of its
//! contexts. For a clone `K` of context `C`, a referenced feature `X` is
//! replaced by:
//!
//! | Context of `X` | Replacement |
//! |----------------|-------------|
//! | `C` | the instance of `X` under `K` |
//! | a cardinality node inside `C`'s subtree | `or` of all instances of `X` under `K` |
//! | anything else | `or` of all instances of `X` in the model |
//!
//! and the rewritten copy is guarded as `K => copy`. Constraints spanning
//! several contexts also get one unguarded existence constraint in which every
//! feature is replaced by the last rule.
//!
//! A numeric feature compared by value (`n > 5`) is renamed to its instance
//! variable when the replacement is a single instance. With several instances
//! the value is ambiguous and the rewrite fails with
//! [`Error::AmbiguousFeatureValue`].
//!
//! ```
//! use featlogic::compile::{compile, TranslationMode};
//! use featlogic::formula::Formula;
//! use featlogic::model::FeatureModel;
//!
//! let mut model = FeatureModel::new();
//! let root = model.add_root_feature("root");
//! let a = model.add_child_feature(root, "A");
//! model.set_feature_cardinality(a, 0, 2);
//! model.add_child_feature(root, "F");
//! model.add_constraint(Formula::implies(Formula::literal("F"), Formula::literal("A"))).unwrap();
//!
//! let compiled = compile(&model, TranslationMode::Full).unwrap();
//! let existence = Formula::implies(
//!     Formula::literal("F"),
//!     Formula::or(vec![Formula::literal("A_1"), Formula::literal("A_2")]),
//! );
//! assert!(compiled.conjuncts.contains(&existence));
//! ```

use log::{debug, warn};

use crate::compile::MissingInstancePolicy;
use crate::context::{classify, feature_context, Context, ConstraintBuckets, Scope};
use crate::error::{Error, Result};
use crate::formula::{Formula, Variable};
use crate::literal::plain_feature_formula;
use crate::model::{Constraint, FeatureModel};
use crate::translate::Bookkeeping;
use crate::types::{FeatureId, InstanceId, NodeId};

/// Generates the context-qualified copies of all bucketed constraints.
pub fn generate(
    model: &FeatureModel,
    book: &Bookkeeping,
    buckets: &ConstraintBuckets,
    policy: MissingInstancePolicy,
) -> Result<Vec<Formula>> {
    let generator = Generator { model, book, policy };
    let mut out = Vec::new();

    for (contexts, indices) in &buckets.buckets {
        let constraints: Vec<&Constraint> = indices.iter().map(|&i| &model.constraints()[i]).collect();

        for context in contexts.iter().filter_map(|c| c.node()) {
            for &clone in book.instances_of_node(context) {
                let guard = &book.instance(clone).term;
                for constraint in &constraints {
                    let rewritten = generator.rewrite_in_context(constraint, context, clone)?;
                    out.push(Formula::implies(guard.clone(), rewritten));
                }
            }
        }

        if classify(contexts) == Scope::Global {
            for constraint in &constraints {
                let existence = generator.rewrite_independent(constraint)?;
                debug!("existence constraint: {}", existence);
                out.push(existence);
            }
        }
    }

    Ok(out)
}

struct Generator<'a> {
    model: &'a FeatureModel,
    book: &'a Bookkeeping,
    policy: MissingInstancePolicy,
}

/// What a referenced feature stands for in one rewritten copy.
#[derive(Debug, Clone, PartialEq)]
enum Resolution {
    Instances(Vec<InstanceId>),
    /// The feature under its own name.
    Feature,
}

impl Generator<'_> {
    fn rewrite_in_context(&self, constraint: &Constraint, context: NodeId, clone: InstanceId) -> Result<Formula> {
        let label = &self.book.instance(clone).identifier;
        self.rewrite(constraint, label, |feature| self.contextual_replacement(feature, context, clone))
    }

    fn rewrite_independent(&self, constraint: &Constraint) -> Result<Formula> {
        self.rewrite(constraint, "model", |feature| self.independent_replacement(feature))
    }

    /// Replaces each feature term of `constraint` by what `resolve` finds for
    /// it, then renames numeric variables compared outside that term.
    fn rewrite<F>(&self, constraint: &Constraint, label: &str, resolve: F) -> Result<Formula>
    where
        F: Fn(FeatureId) -> Result<Resolution>,
    {
        let mut resolved = Vec::with_capacity(constraint.referenced_features().len());
        let mut pairs = Vec::with_capacity(constraint.referenced_features().len());
        for &feature in constraint.referenced_features() {
            let resolution = resolve(feature)?;
            let target = plain_feature_formula(self.model.feature(feature))?;
            pairs.push((target, self.replacement_formula(feature, &resolution)?));
            resolved.push((feature, resolution));
        }
        let rewritten = substitute_all(constraint.formula(), &pairs);

        let mut renames: Vec<(&str, &str)> = Vec::new();
        for (feature, resolution) in &resolved {
            let name = self.model.feature(*feature).name();
            let Resolution::Instances(found) = resolution else {
                continue;
            };
            if !rewritten.mentions_variable(name) {
                continue;
            }
            match found.as_slice() {
                [single] => renames.push((name, self.book.instance(*single).identifier.as_str())),
                _ => {
                    return Err(Error::AmbiguousFeatureValue {
                        feature: name.to_string(),
                        context: label.to_string(),
                    })
                }
            }
        }
        if renames.is_empty() {
            return Ok(rewritten);
        }
        Ok(rewritten.rename_variables(&|v: &Variable| {
            renames
                .iter()
                .find(|(from, _)| v.name == *from)
                .map(|(_, to)| Variable::new(*to, v.ty))
        }))
    }

    fn replacement_formula(&self, feature: FeatureId, resolution: &Resolution) -> Result<Formula> {
        match resolution {
            Resolution::Instances(found) => Ok(Formula::disjunction(self.book.terms(found))),
            Resolution::Feature => plain_feature_formula(self.model.feature(feature)),
        }
    }

    fn contextual_replacement(&self, feature: FeatureId, context: NodeId, clone: InstanceId) -> Result<Resolution> {
        match feature_context(self.model, feature) {
            Context::Node(own) if own == context || self.model.is_ancestor(context, own) => {
                let found = self.book.find_under(clone, feature);
                if found.is_empty() {
                    return self.missing(feature, &self.book.instance(clone).identifier);
                }
                Ok(Resolution::Instances(found))
            }
            _ => self.independent_replacement(feature),
        }
    }

    fn independent_replacement(&self, feature: FeatureId) -> Result<Resolution> {
        let Some(node) = self.model.feature_node(feature) else {
            // Not placed in the tree: a free variable under its own name.
            return Ok(Resolution::Feature);
        };
        let instances = self.book.instances_of_node(node);
        if instances.is_empty() {
            return self.missing(feature, "model");
        }
        Ok(Resolution::Instances(instances.to_vec()))
    }

    fn missing(&self, feature: FeatureId, context: &str) -> Result<Resolution> {
        let feature = self.model.feature(feature);
        match self.policy {
            MissingInstancePolicy::Fail => Err(Error::MissingContextualInstance {
                feature: feature.name().to_string(),
                context: context.to_string(),
            }),
            MissingInstancePolicy::FallBackToFeature => {
                warn!("no instance of {} in {}, keeping the feature term", feature.name(), context);
                Ok(Resolution::Feature)
            }
        }
    }
}

fn substitute_all(formula: &Formula, pairs: &[(Formula, Formula)]) -> Formula {
    formula.substitute(&|f: &Formula| {
        pairs
            .iter()
            .find(|(target, _)| target == f)
            .map(|(_, replacement)| replacement.clone())
    })
}
