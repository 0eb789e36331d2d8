//! This module defines [Clause] and the literals of clause bodies.

use std::fmt::{self, Display};

use itertools::Itertools;

use stratalog_ram::operator::ComparisonOp;

use super::term::Term;

/// A predicate applied to argument terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Atom {
    /// Name of the relation.
    pub relation: String,
    /// One term per column.
    pub terms: Vec<Term>,
}

impl Atom {
    /// Create an atom.
    pub fn new(relation: impl Into<String>, terms: Vec<Term>) -> Self {
        Self {
            relation: relation.into(),
            terms,
        }
    }
}

/// A comparison between two terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constraint {
    /// The comparison operator.
    pub op: ComparisonOp,
    /// Left comparand.
    pub lhs: Term,
    /// Right comparand.
    pub rhs: Term,
}

/// A body literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    /// A positive atom; binds a tuple.
    Atom(Atom),
    /// A negated atom; tests for absence.
    Negation(Atom),
    /// A comparison between ground terms.
    Constraint(Constraint),
}

/// A rule `head :- body.`; a fact is a clause with an empty body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Clause {
    /// The derived atom.
    pub head: Atom,
    /// Body literals in their evaluation order, as fixed by the planner
    /// upstream; the translator does not re-plan.
    pub body: Vec<Literal>,
}

impl Clause {
    /// Create a fact.
    pub fn fact(head: Atom) -> Self {
        Self {
            head,
            body: Vec::new(),
        }
    }

    /// Create a rule.
    pub fn rule(head: Atom, body: Vec<Literal>) -> Self {
        Self { head, body }
    }

    /// The positive body atoms in body order.
    pub fn positive_atoms(&self) -> impl Iterator<Item = &Atom> {
        self.body.iter().filter_map(|literal| match literal {
            Literal::Atom(atom) => Some(atom),
            _ => None,
        })
    }
}

impl Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.relation, self.terms.iter().format(", "))
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.body.is_empty() {
            write!(f, "{}.", self.head)
        } else {
            write!(f, "{} :- {}.", self.head, self.body.iter().format(", "))
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Atom(atom) => write!(f, "{atom}"),
            Literal::Negation(atom) => write!(f, "!{atom}"),
            Literal::Constraint(constraint) => write!(
                f,
                "{} {} {}",
                constraint.lhs,
                constraint.op.symbol(),
                constraint.rhs
            ),
        }
    }
}
