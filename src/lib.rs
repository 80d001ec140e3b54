//! # featlogic: Feature Models to Logic Formulas
//!
//! **`featlogic`** compiles cardinality-based **feature models** into a single logic formula
//! whose satisfying assignments are exactly the valid configurations of the model.
//!
//! ## What is a feature model?
//!
//! A feature model is a tree of named features. The children of a feature are organized into
//! *groups* with a combination rule (and, or, alternative, or a bounded cardinality), and each
//! tree node carries a *feature cardinality* `[lo..hi]`: a node with `hi > 1` may be selected
//! several times, each time with its own copy of the subtree below it.
//! Cross-tree constraints relate features regardless of their position in the tree.
//!
//! ## Key Features
//!
//! - **Group encoding**: and/or/alternative/cardinality groups become implications over
//!   `Or`, `Choose`, `Between`, `AtLeast` and `AtMost` connectives.
//! - **Cardinality unrolling**: a repeatable feature `A[0..3]` becomes clones `A_1`, `A_2`, `A_3`
//!   with symmetry breaking (`A_2 => A_1`, `A_3 => A_2`), and its subtree gets context-qualified
//!   names such as `B.A_2`.
//! - **Contextual constraints**: cross-tree constraints are rewritten per clone of the
//!   repeated subtrees they talk about.
//! - **Two translation modes**: [`Full`][crate::compile::TranslationMode::Full] unrolling and a
//!   coarser [`Simple`][crate::compile::TranslationMode::Simple] mode.
//!
//! ## Basic Usage
//!
//! ```rust
//! use featlogic::compile::{compile, TranslationMode};
//! use featlogic::formula::Formula;
//! use featlogic::model::{FeatureModel, GroupKind};
//!
//! // 1. Build a model: a mandatory root with a repeatable child A[0..2]
//! let mut model = FeatureModel::new();
//! let root = model.add_root_feature("root");
//! model.make_mandatory(root);
//! let a = model.add_child_feature(root, "A");
//! model.set_feature_cardinality(a, 0, 2);
//!
//! // 2. Every clone of A chooses exactly one of B and C
//! model.set_group_kind(a, GroupKind::Alternative);
//! model.add_child_feature(a, "B");
//! model.add_child_feature(a, "C");
//!
//! // 3. Compile
//! let compiled = compile(&model, TranslationMode::Full).unwrap();
//!
//! // 4. Inspect
//! let choice = Formula::implies(
//!     Formula::literal("A_2"),
//!     Formula::choose(1, vec![Formula::literal("B.A_2"), Formula::literal("C.A_2")]),
//! );
//! assert!(compiled.has_conjunct(&choice));
//! assert!(compiled.has_conjunct(&Formula::implies(Formula::literal("A_2"), Formula::literal("A_1"))));
//! ```
//!
//! ## Core Components
//!
//! - **[`model`]**: The feature model: features, tree nodes, groups, cardinalities and constraints.
//! - **[`formula`]**: The formula AST produced by the compiler, with substitution and printing.
//! - **[`compile`]**: The [`Compiler`][crate::compile::Compiler] entry point and its configuration.
//! - **[`translate`]**, **[`context`]**, **[`contextual`]**: The translation passes.

pub mod compile;
pub mod context;
pub mod contextual;
pub mod error;
pub mod eval;
pub mod formula;
pub mod groups;
pub mod literal;
pub mod model;
pub mod translate;
pub mod types;
