//! Full translation: cardinality nodes are unrolled into numbered clones.
//!
//! Naming of generated identifiers, for a node `X` with parent instance `P`:
//!
//! - ordinary node: `X`, or `X.P` if some strict ancestor is a cardinality node;
//! - cardinality node, clone `i`: `X_i`, or `X_i.P` under the same condition.
//!
//! So `C` below `B` below the first clone of `A` is `C.B.A_1`, and the second
//! clone of a repeatable `C` there is `C_2.B.A_1`.
//!
//! For each clone `X_i` the translator emits `X_i => P` and, for `i > 1`, the
//! chain link `X_i => X_{i-1}`, so selected clones always form a prefix
//! `X_1..X_k`. A positive lower bound adds `P => atleast_lo(X_1..X_hi)`.

use log::{debug, trace};

use crate::error::Result;
use crate::formula::Formula;
use crate::groups::{encode_groups, GroupMember};
use crate::literal::{feature_formula, feature_variable};
use crate::model::FeatureModel;
use crate::translate::{Bookkeeping, Instance, TreeTranslation};
use crate::types::{InstanceId, NodeId};

/// Translates the whole feature tree, unrolling every cardinality node.
pub fn translate(model: &FeatureModel) -> Result<(TreeTranslation, Bookkeeping)> {
    let mut translator = FullTranslator {
        model,
        output: TreeTranslation::default(),
        book: Bookkeeping::new(),
    };
    for &root in model.roots() {
        translator.translate_root(root)?;
    }
    debug!(
        "full translation: {} conjuncts, {} instances",
        translator.output.conjuncts.len(),
        translator.book.len()
    );
    Ok((translator.output, translator.book))
}

struct FullTranslator<'a> {
    model: &'a FeatureModel,
    output: TreeTranslation,
    book: Bookkeeping,
}

impl FullTranslator<'_> {
    fn translate_root(&mut self, root: NodeId) -> Result<()> {
        let name = self.model.node_feature(root).name().to_string();
        let id = self.spawn(root, None, name, None)?;
        if self.model.node(root).is_mandatory() {
            let term = self.book.instance(id).term.clone();
            self.output.conjuncts.push(term);
        }
        self.encode_instance_groups(id)?;
        self.add_child_constraints(id)
    }

    /// Identifier of `child` (or of its clone `index`) below `parent_identifier`.
    fn identifier(&self, parent_identifier: &str, child: NodeId, index: Option<u32>) -> String {
        let name = self.model.node_feature(child).name();
        let base = match index {
            Some(i) => format!("{}_{}", name, i),
            None => name.to_string(),
        };
        if self.model.cardinality_feature_above(child) {
            format!("{}.{}", base, parent_identifier)
        } else {
            base
        }
    }

    fn spawn(
        &mut self,
        node: NodeId,
        parent: Option<InstanceId>,
        identifier: String,
        index: Option<u32>,
    ) -> Result<InstanceId> {
        let feature = self.model.node_feature(node);
        let term = feature_formula(feature, &identifier)?;
        self.output.variables.insert(feature_variable(feature, &identifier)?);
        trace!("instance {} of node {}", identifier, node);
        Ok(self.book.push(Instance {
            node,
            feature: feature.id(),
            parent,
            identifier,
            index,
            term,
        }))
    }

    /// The term standing for `child` inside the groups of the instance named
    /// `parent_identifier`: the disjunction of its clones for a cardinality node.
    fn member_term(&self, parent_identifier: &str, child: NodeId) -> Result<Formula> {
        let feature = self.model.node_feature(child);
        if self.model.is_cardinality_node(child) {
            let upper = self.model.node(child).cardinality().upper;
            let clones = (1..=upper)
                .map(|i| feature_formula(feature, &self.identifier(parent_identifier, child, Some(i))))
                .collect::<Result<Vec<_>>>()?;
            Ok(Formula::or(clones))
        } else {
            feature_formula(feature, &self.identifier(parent_identifier, child, None))
        }
    }

    fn encode_instance_groups(&mut self, id: InstanceId) -> Result<()> {
        let instance = self.book.instance(id);
        let node = self.model.node(instance.node);
        let mut members = Vec::with_capacity(node.children().len());
        for &child in node.children() {
            let child_node = self.model.node(child);
            members.push(GroupMember {
                term: self.member_term(&instance.identifier, child)?,
                group: child_node.parent_group(),
                mandatory: child_node.is_mandatory(),
            });
        }
        encode_groups(&instance.term, node.groups(), &members, &mut self.output.conjuncts);
        Ok(())
    }

    fn add_child_constraints(&mut self, parent: InstanceId) -> Result<()> {
        let (parent_node, parent_identifier, parent_term) = {
            let p = self.book.instance(parent);
            (p.node, p.identifier.clone(), p.term.clone())
        };

        let model = self.model;
        for &child in model.children(parent_node) {
            if model.is_cardinality_node(child) {
                let cardinality = model.node(child).cardinality();
                let mut clones: Vec<Formula> = Vec::with_capacity(cardinality.upper as usize);

                for i in 1..=cardinality.upper {
                    let identifier = self.identifier(&parent_identifier, child, Some(i));
                    let id = self.spawn(child, Some(parent), identifier, Some(i))?;
                    let term = self.book.instance(id).term.clone();

                    self.output.conjuncts.push(Formula::implies(term.clone(), parent_term.clone()));
                    if let Some(previous) = clones.last() {
                        self.output.conjuncts.push(Formula::implies(term.clone(), previous.clone()));
                    }
                    self.encode_instance_groups(id)?;
                    clones.push(term);

                    self.add_child_constraints(id)?;
                }

                if cardinality.lower > 0 {
                    let at_least = Formula::at_least(cardinality.lower, clones);
                    self.output.conjuncts.push(Formula::implies(parent_term.clone(), at_least));
                }
            } else {
                let identifier = self.identifier(&parent_identifier, child, None);
                let id = self.spawn(child, Some(parent), identifier, None)?;
                let term = self.book.instance(id).term.clone();

                self.output.conjuncts.push(Formula::implies(term, parent_term.clone()));
                self.encode_instance_groups(id)?;
                self.add_child_constraints(id)?;
            }
        }
        Ok(())
    }
}
