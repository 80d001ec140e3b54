//! Evaluation of formulas under a concrete assignment.
//!
//! Evaluation is partial: a formula that mentions an unassigned variable, or
//! that contains an attribute aggregate, has no value and evaluates to `None`.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::formula::{Comparison, Formula, Term, Value};

/// Values of named variables. Boolean literals look up [`Value::Bool`].
pub type Assignment = HashMap<String, Value>;

/// Builds a boolean assignment over `variables` where exactly `selected` are true.
pub fn boolean_assignment<'a, I, S>(variables: I, selected: S) -> Assignment
where
    I: IntoIterator<Item = &'a str>,
    S: IntoIterator<Item = &'a str>,
{
    let mut assignment: Assignment = variables
        .into_iter()
        .map(|name| (name.to_string(), Value::Bool(false)))
        .collect();
    for name in selected {
        assignment.insert(name.to_string(), Value::Bool(true));
    }
    assignment
}

pub trait Eval {
    type Output;

    fn eval(&self, assignment: &Assignment) -> Option<Self::Output>;
}

impl Eval for Term {
    type Output = Value;

    fn eval(&self, assignment: &Assignment) -> Option<Value> {
        match self {
            Term::Variable(v) => assignment.get(&v.name).copied(),
            Term::Constant(c) => Some(*c),
            Term::Aggregate(_) => None,
        }
    }
}

fn compare_values(lhs: Value, rhs: Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(&b)),
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(&b)),
        (Value::Integer(a), Value::Float(b)) => (a as f64).partial_cmp(&b),
        (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(b as f64)),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(&b),
        _ => None,
    }
}

fn count_true(operands: &[Formula], assignment: &Assignment) -> Option<u32> {
    let mut count = 0;
    for f in operands {
        if f.eval(assignment)? {
            count += 1;
        }
    }
    Some(count)
}

impl Eval for Formula {
    type Output = bool;

    fn eval(&self, assignment: &Assignment) -> Option<bool> {
        let value = match self {
            Formula::True => true,
            Formula::False => false,
            Formula::Literal(name) => match assignment.get(name)? {
                Value::Bool(b) => *b,
                _ => return None,
            },
            Formula::Not(a) => !a.eval(assignment)?,
            Formula::And(xs) => {
                let mut all = true;
                for x in xs {
                    all &= x.eval(assignment)?;
                }
                all
            }
            Formula::Or(xs) => {
                let mut any = false;
                for x in xs {
                    any |= x.eval(assignment)?;
                }
                any
            }
            Formula::Implies(a, b) => !a.eval(assignment)? || b.eval(assignment)?,
            Formula::BiImplies(a, b) => a.eval(assignment)? == b.eval(assignment)?,
            Formula::Choose(k, xs) => count_true(xs, assignment)? == *k,
            Formula::AtLeast(k, xs) => count_true(xs, assignment)? >= *k,
            Formula::AtMost(k, xs) => count_true(xs, assignment)? <= *k,
            Formula::Between(lo, hi, xs) => {
                let n = count_true(xs, assignment)?;
                *lo <= n && n <= *hi
            }
            Formula::Compare(op, lhs, rhs) => {
                let ord = compare_values(lhs.eval(assignment)?, rhs.eval(assignment)?)?;
                match op {
                    Comparison::Equal => ord == Ordering::Equal,
                    Comparison::NotEqual => ord != Ordering::Equal,
                    Comparison::Less => ord == Ordering::Less,
                    Comparison::LessEqual => ord != Ordering::Greater,
                    Comparison::Greater => ord == Ordering::Greater,
                    Comparison::GreaterEqual => ord != Ordering::Less,
                }
            }
        };
        Some(value)
    }
}

impl Formula {
    /// Evaluates this formula, see [`Eval`].
    pub fn evaluate(&self, assignment: &Assignment) -> Option<bool> {
        self.eval(assignment)
    }
}
