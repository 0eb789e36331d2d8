//! This module defines [Term], the arguments of atoms and constraints.

use std::fmt::{self, Display};

use itertools::Itertools;

use stratalog_ram::operator::{AggregateFunction, IntrinsicOp};
use stratalog_ram::Domain;

use super::clause::Literal;

/// An argument position in an atom, constraint or head.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// A named variable.
    Variable(String),
    /// The anonymous variable `_`.
    UnnamedVariable,
    /// A number literal.
    NumberConstant(Domain),
    /// A string literal; interned into the symbol table during lowering.
    StringConstant(String),
    /// An n-ary functor application.
    Functor {
        /// The applied operator.
        op: IntrinsicOp,
        /// Argument terms.
        args: Vec<Term>,
    },
    /// A record initializer; constructs or destructs depending on position.
    Record(Vec<Term>),
    /// An aggregate over a sub-body.
    Aggregator(Box<Aggregate>),
    /// Reference to a subroutine parameter (provenance subproofs only).
    SubroutineArgument(usize),
    /// The global counter.
    Counter,
}

impl Term {
    /// Shorthand for a named variable.
    pub fn var(name: impl Into<String>) -> Self {
        Term::Variable(name.into())
    }

    /// Shorthand for a number literal.
    pub fn number(value: Domain) -> Self {
        Term::NumberConstant(value)
    }
}

/// An aggregate term: a function folded over the matches of a sub-body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Aggregate {
    /// The fold function.
    pub function: AggregateFunction,
    /// The aggregated expression; `None` when counting.
    pub target: Option<Term>,
    /// The aggregated sub-body. The translator requires exactly one
    /// positive atom here.
    pub body: Vec<Literal>,
}

impl Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Variable(name) => f.write_str(name),
            Term::UnnamedVariable => f.write_str("_"),
            Term::NumberConstant(value) => write!(f, "{value}"),
            Term::StringConstant(symbol) => write!(f, "\"{symbol}\""),
            Term::Functor { op, args } => {
                write!(f, "{}({})", op.symbol(), args.iter().format(", "))
            }
            Term::Record(args) => write!(f, "[{}]", args.iter().format(", ")),
            Term::Aggregator(aggregate) => write!(f, "{aggregate}"),
            Term::SubroutineArgument(number) => write!(f, "arg({number})"),
            Term::Counter => f.write_str("$"),
        }
    }
}

impl Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.function.keyword().to_lowercase())?;
        if let Some(target) = &self.target {
            write!(f, " {target}")?;
        }
        write!(f, " : {}", self.body.iter().format(", "))
    }
}
