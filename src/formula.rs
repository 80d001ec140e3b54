//! Formula AST produced by the compiler.
//!
//! The tree is deliberately small: propositional connectives, the cardinality
//! connectives that group and feature-cardinality encodings need (`Choose`,
//! `AtLeast`, `AtMost`, `Between`), and comparisons over typed terms for
//! numeric features. Attribute aggregates appear only as opaque terms.
//!
//! ```
//! use featlogic::formula::Formula;
//!
//! let f = Formula::implies(Formula::literal("B"), Formula::literal("A"));
//! assert_eq!(f.to_string(), "(B => A)");
//!
//! let g = f.replace(
//!     &Formula::literal("A"),
//!     &Formula::or(vec![Formula::literal("A_1"), Formula::literal("A_2")]),
//! );
//! assert_eq!(g.to_string(), "(B => (A_1 | A_2))");
//! ```

use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Sort of a free variable.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum VarType {
    Boolean,
    Integer,
    Float,
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarType::Boolean => write!(f, "bool"),
            VarType::Integer => write!(f, "int"),
            VarType::Float => write!(f, "float"),
        }
    }
}

/// A typed free variable.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Variable {
    pub name: String,
    pub ty: VarType,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: VarType) -> Self {
        Self { name: name.into(), ty }
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, VarType::Boolean)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.ty)
    }
}

/// A constant value.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Integer(i64),
    Float(f64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
        }
    }
}

/// Aggregate over a named attribute of all features carrying it.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Aggregate {
    Sum(String),
    Average(String),
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregate::Sum(attribute) => write!(f, "sum({})", attribute),
            Aggregate::Average(attribute) => write!(f, "avg({})", attribute),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Comparison {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Comparison::Equal => "==",
            Comparison::NotEqual => "!=",
            Comparison::Less => "<",
            Comparison::LessEqual => "<=",
            Comparison::Greater => ">",
            Comparison::GreaterEqual => ">=",
        };
        f.write_str(op)
    }
}

/// A term appearing on either side of a [`Comparison`].
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Variable(Variable),
    Constant(Value),
    Aggregate(Aggregate),
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Variable(v) => write!(f, "{}", v.name),
            Term::Constant(c) => write!(f, "{}", c),
            Term::Aggregate(a) => write!(f, "{}", a),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Formula {
    True,
    False,
    /// Positive boolean literal.
    Literal(String),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
    Implies(Box<Formula>, Box<Formula>),
    BiImplies(Box<Formula>, Box<Formula>),
    /// Exactly `k` operands hold.
    Choose(u32, Vec<Formula>),
    /// At least `k` operands hold.
    AtLeast(u32, Vec<Formula>),
    /// At most `k` operands hold.
    AtMost(u32, Vec<Formula>),
    /// Between `lo` and `hi` operands (inclusive) hold.
    Between(u32, u32, Vec<Formula>),
    Compare(Comparison, Term, Term),
}

impl Formula {
    pub fn literal(name: impl Into<String>) -> Self {
        Formula::Literal(name.into())
    }

    pub fn not(value: Self) -> Self {
        match value {
            Formula::Not(inner) => *inner,
            _ => Formula::Not(Box::new(value)),
        }
    }

    pub fn and(operands: Vec<Self>) -> Self {
        Formula::And(operands)
    }

    pub fn or(operands: Vec<Self>) -> Self {
        Formula::Or(operands)
    }

    /// Disjunction that collapses a single operand to itself.
    ///
    /// An empty disjunction is `False`.
    pub fn disjunction(mut operands: Vec<Self>) -> Self {
        match operands.len() {
            0 => Formula::False,
            1 => operands.remove(0),
            _ => Formula::Or(operands),
        }
    }

    pub fn implies(lhs: Self, rhs: Self) -> Self {
        Formula::Implies(Box::new(lhs), Box::new(rhs))
    }

    pub fn bi_implies(lhs: Self, rhs: Self) -> Self {
        Formula::BiImplies(Box::new(lhs), Box::new(rhs))
    }

    pub fn choose(k: u32, operands: Vec<Self>) -> Self {
        Formula::Choose(k, operands)
    }

    pub fn at_least(k: u32, operands: Vec<Self>) -> Self {
        Formula::AtLeast(k, operands)
    }

    pub fn at_most(k: u32, operands: Vec<Self>) -> Self {
        Formula::AtMost(k, operands)
    }

    pub fn between(lo: u32, hi: u32, operands: Vec<Self>) -> Self {
        Formula::Between(lo, hi, operands)
    }

    pub fn compare(op: Comparison, lhs: Term, rhs: Term) -> Self {
        Formula::Compare(op, lhs, rhs)
    }

    pub fn not_equal(lhs: Term, rhs: Term) -> Self {
        Formula::Compare(Comparison::NotEqual, lhs, rhs)
    }
}

impl Formula {
    /// Direct sub-formulas, in order.
    pub fn operands(&self) -> Vec<&Formula> {
        match self {
            Formula::True | Formula::False | Formula::Literal(_) | Formula::Compare(..) => vec![],
            Formula::Not(a) => vec![a.as_ref()],
            Formula::Implies(a, b) | Formula::BiImplies(a, b) => vec![a.as_ref(), b.as_ref()],
            Formula::And(xs)
            | Formula::Or(xs)
            | Formula::Choose(_, xs)
            | Formula::AtLeast(_, xs)
            | Formula::AtMost(_, xs)
            | Formula::Between(_, _, xs) => xs.iter().collect(),
        }
    }

    /// Rebuilds this node with every direct sub-formula mapped through `f`.
    #[inline]
    pub fn fmap<F>(&self, mut f: F) -> Formula
    where
        F: FnMut(&Formula) -> Formula,
    {
        match self {
            Formula::True | Formula::False | Formula::Literal(_) | Formula::Compare(..) => self.clone(),
            Formula::Not(a) => Formula::Not(Box::new(f(a.as_ref()))),
            Formula::And(xs) => Formula::And(xs.iter().map(f).collect()),
            Formula::Or(xs) => Formula::Or(xs.iter().map(f).collect()),
            Formula::Implies(a, b) => Formula::Implies(Box::new(f(a.as_ref())), Box::new(f(b.as_ref()))),
            Formula::BiImplies(a, b) => Formula::BiImplies(Box::new(f(a.as_ref())), Box::new(f(b.as_ref()))),
            Formula::Choose(k, xs) => Formula::Choose(*k, xs.iter().map(f).collect()),
            Formula::AtLeast(k, xs) => Formula::AtLeast(*k, xs.iter().map(f).collect()),
            Formula::AtMost(k, xs) => Formula::AtMost(*k, xs.iter().map(f).collect()),
            Formula::Between(lo, hi, xs) => Formula::Between(*lo, *hi, xs.iter().map(f).collect()),
        }
    }

    /// Simultaneous structural substitution.
    ///
    /// Each sub-formula is offered to `lookup` top-down; where it returns a
    /// replacement, that whole sub-formula is replaced and not descended into.
    /// Replacements are never re-examined, so substituting several targets at
    /// once cannot cascade.
    pub fn substitute<F>(&self, lookup: &F) -> Formula
    where
        F: Fn(&Formula) -> Option<Formula>,
    {
        match lookup(self) {
            Some(replacement) => replacement,
            None => self.fmap(|child| child.substitute(lookup)),
        }
    }

    /// Replaces every occurrence of `target` by `replacement`.
    pub fn replace(&self, target: &Formula, replacement: &Formula) -> Formula {
        self.substitute(&|f: &Formula| (f == target).then(|| replacement.clone()))
    }

    /// Whether `target` occurs anywhere in this formula (including the root).
    pub fn contains(&self, target: &Formula) -> bool {
        self == target || self.operands().into_iter().any(|f| f.contains(target))
    }

    /// Renames the variables inside comparisons.
    ///
    /// `rename` returns the new variable, or `None` to keep the old one.
    /// Boolean literals are left alone.
    pub fn rename_variables<F>(&self, rename: &F) -> Formula
    where
        F: Fn(&Variable) -> Option<Variable>,
    {
        match self {
            Formula::Compare(op, lhs, rhs) => {
                let term = |t: &Term| match t {
                    Term::Variable(v) => rename(v).map_or_else(|| t.clone(), Term::Variable),
                    _ => t.clone(),
                };
                Formula::Compare(*op, term(lhs), term(rhs))
            }
            _ => self.fmap(|child| child.rename_variables(rename)),
        }
    }

    /// Whether a comparison somewhere in this formula uses the variable `name`.
    pub fn mentions_variable(&self, name: &str) -> bool {
        let mut found = false;
        self.visit(&mut |f| {
            if let Formula::Compare(_, lhs, rhs) = f {
                found |= [lhs, rhs]
                    .into_iter()
                    .any(|t| matches!(t, Term::Variable(v) if v.name == name));
            }
        });
        found
    }

    /// Names of all literals and variables, in order of first occurrence.
    pub fn names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        self.visit(&mut |f| match f {
            Formula::Literal(name) => {
                if seen.insert(name.clone()) {
                    names.push(name.clone());
                }
            }
            Formula::Compare(_, lhs, rhs) => {
                for term in [lhs, rhs] {
                    if let Term::Variable(v) = term {
                        if seen.insert(v.name.clone()) {
                            names.push(v.name.clone());
                        }
                    }
                }
            }
            _ => {}
        });
        names
    }

    /// Typed free variables of this formula.
    pub fn variables(&self) -> BTreeSet<Variable> {
        let mut vars = BTreeSet::new();
        self.visit(&mut |f| match f {
            Formula::Literal(name) => {
                vars.insert(Variable::boolean(name.clone()));
            }
            Formula::Compare(_, lhs, rhs) => {
                for term in [lhs, rhs] {
                    if let Term::Variable(v) = term {
                        vars.insert(v.clone());
                    }
                }
            }
            _ => {}
        });
        vars
    }

    /// Whether an attribute aggregate occurs anywhere in this formula.
    pub fn contains_aggregate(&self) -> bool {
        let mut found = false;
        self.visit(&mut |f| {
            if let Formula::Compare(_, lhs, rhs) = f {
                found |= matches!(lhs, Term::Aggregate(_)) || matches!(rhs, Term::Aggregate(_));
            }
        });
        found
    }

    fn visit<F>(&self, f: &mut F)
    where
        F: FnMut(&Formula),
    {
        f(self);
        for child in self.operands() {
            child.visit(f);
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, operands: &[Formula], sep: &str) -> fmt::Result {
    for (i, x) in operands.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", x)?;
    }
    Ok(())
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::True => write!(f, "true"),
            Formula::False => write!(f, "false"),
            Formula::Literal(name) => write!(f, "{}", name),
            Formula::Not(a) => write!(f, "!{}", a),
            Formula::And(xs) if xs.is_empty() => write!(f, "true"),
            Formula::Or(xs) if xs.is_empty() => write!(f, "false"),
            Formula::And(xs) => {
                f.write_str("(")?;
                write_list(f, xs, " & ")?;
                f.write_str(")")
            }
            Formula::Or(xs) => {
                f.write_str("(")?;
                write_list(f, xs, " | ")?;
                f.write_str(")")
            }
            Formula::Implies(a, b) => write!(f, "({} => {})", a, b),
            Formula::BiImplies(a, b) => write!(f, "({} <=> {})", a, b),
            Formula::Choose(k, xs) => {
                write!(f, "choose{}(", k)?;
                write_list(f, xs, ", ")?;
                f.write_str(")")
            }
            Formula::AtLeast(k, xs) => {
                write!(f, "atleast{}(", k)?;
                write_list(f, xs, ", ")?;
                f.write_str(")")
            }
            Formula::AtMost(k, xs) => {
                write!(f, "atmost{}(", k)?;
                write_list(f, xs, ", ")?;
                f.write_str(")")
            }
            Formula::Between(lo, hi, xs) => {
                write!(f, "between{}..{}(", lo, hi)?;
                write_list(f, xs, ", ")?;
                f.write_str(")")
            }
            Formula::Compare(op, lhs, rhs) => write!(f, "({} {} {})", lhs, op, rhs),
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn lit(name: &str) -> Formula {
        Formula::literal(name)
    }

    #[test]
    fn test_double_negation_collapses() {
        let f = Formula::not(Formula::not(lit("a")));
        assert_eq!(f, lit("a"));
    }

    #[test]
    fn test_disjunction_collapses_singleton() {
        assert_eq!(Formula::disjunction(vec![lit("a")]), lit("a"));
        assert_eq!(Formula::disjunction(vec![]), Formula::False);
        assert_eq!(
            Formula::disjunction(vec![lit("a"), lit("b")]),
            Formula::or(vec![lit("a"), lit("b")])
        );
    }

    #[test]
    fn test_replace_everywhere() {
        let f = Formula::and(vec![
            Formula::implies(lit("a"), lit("b")),
            Formula::not(lit("a")),
            Formula::choose(1, vec![lit("a"), lit("c")]),
        ]);
        let g = f.replace(&lit("a"), &lit("x"));
        assert_eq!(
            g,
            Formula::and(vec![
                Formula::implies(lit("x"), lit("b")),
                Formula::not(lit("x")),
                Formula::choose(1, vec![lit("x"), lit("c")]),
            ])
        );
        assert!(!g.contains(&lit("a")));
    }

    #[test]
    fn test_substitute_does_not_cascade() {
        // a -> b and b -> c at once: the "b" introduced for "a" must stay.
        let f = Formula::implies(lit("a"), lit("b"));
        let g = f.substitute(&|f: &Formula| match f {
            Formula::Literal(n) if n == "a" => Some(lit("b")),
            Formula::Literal(n) if n == "b" => Some(lit("c")),
            _ => None,
        });
        assert_eq!(g, Formula::implies(lit("b"), lit("c")));
    }

    #[test]
    fn test_replace_compound_target() {
        let x = Variable::new("x", VarType::Integer);
        let target = Formula::not_equal(Term::Variable(x.clone()), Term::Constant(Value::Integer(0)));
        let f = Formula::implies(target.clone(), lit("root"));
        let g = f.replace(&target, &lit("y"));
        assert_eq!(g, Formula::implies(lit("y"), lit("root")));
    }

    #[test]
    fn test_rename_variables_in_comparisons() {
        let n = Variable::new("n", VarType::Integer);
        let big = Formula::compare(
            Comparison::Greater,
            Term::Variable(n.clone()),
            Term::Constant(Value::Integer(5)),
        );
        let f = Formula::implies(lit("n"), big);
        assert!(f.mentions_variable("n"));
        assert!(!f.mentions_variable("m"));

        let g = f.rename_variables(&|v: &Variable| (v.name == "n").then(|| Variable::new("n.A_1", v.ty)));
        assert_eq!(g.to_string(), "(n => (n.A_1 > 5))");
        assert!(!g.mentions_variable("n"));
    }

    #[test]
    fn test_names_in_order() {
        let x = Variable::new("x", VarType::Float);
        let f = Formula::and(vec![
            Formula::implies(lit("b"), lit("a")),
            Formula::not_equal(Term::Variable(x), Term::Constant(Value::Float(0.0))),
            lit("b"),
        ]);
        assert_eq!(f.names(), vec!["b", "a", "x"]);
    }

    #[test]
    fn test_variables_are_typed() {
        let x = Variable::new("x", VarType::Integer);
        let f = Formula::implies(
            Formula::not_equal(Term::Variable(x.clone()), Term::Constant(Value::Integer(0))),
            lit("root"),
        );
        let vars = f.variables();
        assert_eq!(vars.len(), 2);
        assert!(vars.contains(&x));
        assert!(vars.contains(&Variable::boolean("root")));
    }

    #[test]
    fn test_contains_aggregate() {
        let f = Formula::implies(
            lit("a"),
            Formula::compare(
                Comparison::Less,
                Term::Aggregate(Aggregate::Sum("cost".to_string())),
                Term::Constant(Value::Integer(100)),
            ),
        );
        assert!(f.contains_aggregate());
        assert!(!lit("a").contains_aggregate());
    }

    #[test]
    fn test_display() {
        let f = Formula::and(vec![
            lit("root"),
            Formula::implies(lit("root"), Formula::choose(1, vec![lit("A"), lit("B")])),
            Formula::implies(lit("root"), Formula::between(2, 3, vec![lit("A"), lit("B"), lit("C")])),
            Formula::not(Formula::or(vec![lit("A"), lit("B")])),
            Formula::not_equal(
                Term::Variable(Variable::new("size", VarType::Float)),
                Term::Constant(Value::Float(0.0)),
            ),
        ]);
        assert_eq!(
            f.to_string(),
            "(root & (root => choose1(A, B)) & (root => between2..3(A, B, C)) & !(A | B) & (size != 0.0))"
        );
    }
}
