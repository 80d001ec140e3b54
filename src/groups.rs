//! Group constraint encoding.
//!
//! For a parent term `P` and its children partitioned into groups, emits the
//! implications that encode mandatory children and the and/or/alternative/
//! cardinality group rules:
//!
//! | Group | Emitted |
//! |---|---|
//! | AND | nothing at group level; `P => C` for each mandatory child `C` |
//! | OR | `P => or(C..)` |
//! | ALTERNATIVE | `P => choose1(C..)` |
//! | CARDINALITY `lo>0, hi` | `P => between_lo..hi(C..)` |
//! | CARDINALITY `lo>0, *` | `P => atleast_lo(C..)` |
//! | CARDINALITY `0, hi` | `P => atmost_hi(C..)` |
//! | CARDINALITY `0, *` | nothing |
//!
//! The cardinality row is picked by which bounds are finite: an unbounded
//! upper limit never yields an `atmost`, and a zero lower limit never yields
//! the tautology `atleast_0`.

use log::debug;

use crate::formula::Formula;
use crate::model::GroupKind;
use crate::types::GroupId;

/// A child as seen by its parent's group encoding.
#[derive(Debug, Clone)]
pub struct GroupMember {
    /// Term standing for the child in its parent's context.
    pub term: Formula,
    pub group: GroupId,
    pub mandatory: bool,
}

/// Group-level constraint for one non-empty group, if its kind needs one.
pub fn encode_group(kind: GroupKind, parent: &Formula, terms: Vec<Formula>) -> Option<Formula> {
    let rule = match kind {
        GroupKind::And => return None,
        GroupKind::Or => Formula::or(terms),
        GroupKind::Alternative => Formula::choose(1, terms),
        GroupKind::Cardinality { lower, upper } => match (lower, upper) {
            (0, None) => return None,
            (0, Some(hi)) => Formula::at_most(hi, terms),
            (lo, Some(hi)) => Formula::between(lo, hi, terms),
            (lo, None) => Formula::at_least(lo, terms),
        },
    };
    Some(Formula::implies(parent.clone(), rule))
}

/// Encodes all groups of a node with term `parent` into `out`.
///
/// Mandatory implications are emitted only for members of AND groups; in every
/// other group the group rule already decides which children are selected.
pub fn encode_groups(parent: &Formula, groups: &[GroupKind], members: &[GroupMember], out: &mut Vec<Formula>) {
    let mut partition: Vec<Vec<Formula>> = vec![Vec::new(); groups.len()];

    for member in members {
        let kind = groups.get(member.group.index()).copied();
        if member.mandatory && kind == Some(GroupKind::And) {
            out.push(Formula::implies(parent.clone(), member.term.clone()));
        }
        match partition.get_mut(member.group.index()) {
            Some(terms) => terms.push(member.term.clone()),
            None => debug!("member {} refers to missing group {}", member.term, member.group),
        }
    }

    for (kind, terms) in groups.iter().zip(partition) {
        if terms.is_empty() {
            continue;
        }
        if let Some(constraint) = encode_group(*kind, parent, terms) {
            debug!("group constraint: {}", constraint);
            out.push(constraint);
        }
    }
}
