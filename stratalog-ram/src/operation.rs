//! This module defines [Operation], the nodes of a RAM loop nest.

use std::fmt::{self, Display};

use itertools::Itertools;

use crate::{
    condition::{map_pattern, Condition},
    node::NodeMapper,
    operator::AggregateFunction,
    relation::Relation,
    value::{PatternDisplay, Value},
    TupleId,
};

/// A node in a loop nest. Searches bind a tuple identifier for their
/// nested operation; [Operation::Project] and [Operation::Return] terminate
/// a nest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    /// For each tuple of `relation`, bind it to `level` and run `nested`.
    Scan {
        /// The scanned relation.
        relation: Relation,
        /// Tuple identifier introduced by this scan.
        level: TupleId,
        /// Operation executed per tuple.
        nested: Box<Operation>,
    },
    /// As [Operation::Scan], restricted to tuples matching the concrete
    /// slots of `pattern`.
    IndexScan {
        /// The scanned relation.
        relation: Relation,
        /// Tuple identifier introduced by this scan.
        level: TupleId,
        /// One slot per column; `None` slots are unconstrained.
        pattern: Vec<Option<Value>>,
        /// Operation executed per matching tuple.
        nested: Box<Operation>,
    },
    /// Run `nested` once, for the first tuple satisfying `condition`;
    /// a no-op if none does.
    Choice {
        /// The searched relation.
        relation: Relation,
        /// Tuple identifier introduced by this search.
        level: TupleId,
        /// Acceptance condition for the witness tuple.
        condition: Condition,
        /// Operation executed for the single witness.
        nested: Box<Operation>,
    },
    /// Index-filtered variant of [Operation::Choice].
    IndexChoice {
        /// The searched relation.
        relation: Relation,
        /// Tuple identifier introduced by this search.
        level: TupleId,
        /// One slot per column; `None` slots are unconstrained.
        pattern: Vec<Option<Value>>,
        /// Acceptance condition for the witness tuple.
        condition: Condition,
        /// Operation executed for the single witness.
        nested: Box<Operation>,
    },
    /// Unpack the record referenced by `reference` into a fresh tuple of
    /// `arity` columns bound to `level`.
    Lookup {
        /// Tuple identifier introduced for the unpacked record.
        level: TupleId,
        /// Value holding the record reference.
        reference: Value,
        /// Number of components of the record.
        arity: usize,
        /// Operation executed with the unpacked tuple in scope.
        nested: Box<Operation>,
    },
    /// Compute an aggregate over the matching tuples of a source relation
    /// and bind the result as column 0 of the tuple at `level`.
    Aggregate {
        /// The aggregate function.
        function: AggregateFunction,
        /// Aggregated expression; `None` for counting.
        value: Option<Value>,
        /// Source relation whose tuples are aggregated.
        relation: Relation,
        /// One slot per source column; `None` slots are unconstrained.
        pattern: Vec<Option<Value>>,
        /// Tuple identifier naming both the scanned source tuple (inside
        /// `value`) and the bound result (outside).
        level: TupleId,
        /// Operation executed with the result in scope.
        nested: Box<Operation>,
    },
    /// Run `nested` iff `condition` holds in the current environment.
    Filter {
        /// The guarding condition.
        condition: Condition,
        /// Operation executed when the condition holds.
        nested: Box<Operation>,
    },
    /// Insert the tuple built from `values` into `relation`.
    Project {
        /// Target relation.
        relation: Relation,
        /// One value per column.
        values: Vec<Value>,
    },
    /// Terminate a subroutine with a result row; `None` slots are
    /// unbound outputs.
    Return {
        /// The returned row.
        values: Vec<Option<Value>>,
    },
}

impl Operation {
    /// The tuple identifier this operation introduces, if it is a binder.
    pub fn binds(&self) -> Option<TupleId> {
        match self {
            Operation::Scan { level, .. }
            | Operation::IndexScan { level, .. }
            | Operation::Choice { level, .. }
            | Operation::IndexChoice { level, .. }
            | Operation::Lookup { level, .. }
            | Operation::Aggregate { level, .. } => Some(*level),
            Operation::Filter { .. } | Operation::Project { .. } | Operation::Return { .. } => None,
        }
    }

    /// The operation nested inside this one, if any.
    pub fn nested(&self) -> Option<&Operation> {
        match self {
            Operation::Scan { nested, .. }
            | Operation::IndexScan { nested, .. }
            | Operation::Choice { nested, .. }
            | Operation::IndexChoice { nested, .. }
            | Operation::Lookup { nested, .. }
            | Operation::Aggregate { nested, .. }
            | Operation::Filter { nested, .. } => Some(nested),
            Operation::Project { .. } | Operation::Return { .. } => None,
        }
    }

    /// Rebuild this operation with its nested operation passed through `f`.
    pub fn map_nested(self, f: impl FnOnce(Operation) -> Operation) -> Self {
        match self {
            Operation::Scan {
                relation,
                level,
                nested,
            } => Operation::Scan {
                relation,
                level,
                nested: Box::new(f(*nested)),
            },
            Operation::IndexScan {
                relation,
                level,
                pattern,
                nested,
            } => Operation::IndexScan {
                relation,
                level,
                pattern,
                nested: Box::new(f(*nested)),
            },
            Operation::Choice {
                relation,
                level,
                condition,
                nested,
            } => Operation::Choice {
                relation,
                level,
                condition,
                nested: Box::new(f(*nested)),
            },
            Operation::IndexChoice {
                relation,
                level,
                pattern,
                condition,
                nested,
            } => Operation::IndexChoice {
                relation,
                level,
                pattern,
                condition,
                nested: Box::new(f(*nested)),
            },
            Operation::Lookup {
                level,
                reference,
                arity,
                nested,
            } => Operation::Lookup {
                level,
                reference,
                arity,
                nested: Box::new(f(*nested)),
            },
            Operation::Aggregate {
                function,
                value,
                relation,
                pattern,
                level,
                nested,
            } => Operation::Aggregate {
                function,
                value,
                relation,
                pattern,
                level,
                nested: Box::new(f(*nested)),
            },
            Operation::Filter { condition, nested } => Operation::Filter {
                condition,
                nested: Box::new(f(*nested)),
            },
            terminal @ (Operation::Project { .. } | Operation::Return { .. }) => terminal,
        }
    }

    /// Direct value children in a stable order.
    pub fn values(&self) -> Vec<&Value> {
        match self {
            Operation::Scan { .. } | Operation::Choice { .. } | Operation::Filter { .. } => {
                Vec::new()
            }
            Operation::IndexScan { pattern, .. } | Operation::IndexChoice { pattern, .. } => {
                pattern.iter().flatten().collect()
            }
            Operation::Lookup { reference, .. } => vec![reference],
            Operation::Aggregate { value, pattern, .. } => {
                value.iter().chain(pattern.iter().flatten()).collect()
            }
            Operation::Project { values, .. } => values.iter().collect(),
            Operation::Return { values } => values.iter().flatten().collect(),
        }
    }

    /// Direct condition children.
    pub fn conditions(&self) -> Vec<&Condition> {
        match self {
            Operation::Choice { condition, .. }
            | Operation::IndexChoice { condition, .. }
            | Operation::Filter { condition, .. } => vec![condition],
            _ => Vec::new(),
        }
    }

    /// Pass each owned child through `mapper`, storing the result back.
    pub fn apply<M: NodeMapper + ?Sized>(self, mapper: &mut M) -> Self {
        match self {
            Operation::Scan {
                relation,
                level,
                nested,
            } => Operation::Scan {
                relation,
                level,
                nested: Box::new(mapper.map_operation(*nested)),
            },
            Operation::IndexScan {
                relation,
                level,
                pattern,
                nested,
            } => Operation::IndexScan {
                relation,
                level,
                pattern: map_pattern(pattern, mapper),
                nested: Box::new(mapper.map_operation(*nested)),
            },
            Operation::Choice {
                relation,
                level,
                condition,
                nested,
            } => Operation::Choice {
                relation,
                level,
                condition: mapper.map_condition(condition),
                nested: Box::new(mapper.map_operation(*nested)),
            },
            Operation::IndexChoice {
                relation,
                level,
                pattern,
                condition,
                nested,
            } => Operation::IndexChoice {
                relation,
                level,
                pattern: map_pattern(pattern, mapper),
                condition: mapper.map_condition(condition),
                nested: Box::new(mapper.map_operation(*nested)),
            },
            Operation::Lookup {
                level,
                reference,
                arity,
                nested,
            } => Operation::Lookup {
                level,
                reference: mapper.map_value(reference),
                arity,
                nested: Box::new(mapper.map_operation(*nested)),
            },
            Operation::Aggregate {
                function,
                value,
                relation,
                pattern,
                level,
                nested,
            } => Operation::Aggregate {
                function,
                value: value.map(|v| mapper.map_value(v)),
                relation,
                pattern: map_pattern(pattern, mapper),
                level,
                nested: Box::new(mapper.map_operation(*nested)),
            },
            Operation::Filter { condition, nested } => Operation::Filter {
                condition: mapper.map_condition(condition),
                nested: Box::new(mapper.map_operation(*nested)),
            },
            Operation::Project { relation, values } => Operation::Project {
                relation,
                values: values.into_iter().map(|v| mapper.map_value(v)).collect(),
            },
            Operation::Return { values } => Operation::Return {
                values: map_pattern(values, mapper),
            },
        }
    }

    /// Whether any value in this subtree reads the tuple bound to `level`.
    pub fn references_level(&self, level: TupleId) -> bool {
        self.values().iter().any(|v| v.references_level(level))
            || self
                .conditions()
                .iter()
                .any(|c| c.references_level(level))
            || self
                .nested()
                .is_some_and(|nested| nested.references_level(level))
    }

    pub(crate) fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = "\t".repeat(indent);
        match self {
            Operation::Scan {
                relation,
                level,
                nested,
            } => {
                writeln!(f, "{pad}FOR t{level} IN {}", relation.name())?;
                nested.fmt_indented(f, indent + 1)
            }
            Operation::IndexScan {
                relation,
                level,
                pattern,
                nested,
            } => {
                writeln!(
                    f,
                    "{pad}SEARCH {} AS t{level} ON INDEX {}",
                    relation.name(),
                    PatternDisplay(pattern)
                )?;
                nested.fmt_indented(f, indent + 1)
            }
            Operation::Choice {
                relation,
                level,
                condition,
                nested,
            } => {
                writeln!(
                    f,
                    "{pad}CHOICE {} AS t{level} WHERE {condition}",
                    relation.name()
                )?;
                nested.fmt_indented(f, indent + 1)
            }
            Operation::IndexChoice {
                relation,
                level,
                pattern,
                condition,
                nested,
            } => {
                writeln!(
                    f,
                    "{pad}CHOICE {} AS t{level} ON INDEX {} WHERE {condition}",
                    relation.name(),
                    PatternDisplay(pattern)
                )?;
                nested.fmt_indented(f, indent + 1)
            }
            Operation::Lookup {
                level,
                reference,
                arity,
                nested,
            } => {
                writeln!(f, "{pad}UNPACK {reference} ARITY {arity} INTO t{level}")?;
                nested.fmt_indented(f, indent + 1)
            }
            Operation::Aggregate {
                function,
                value,
                relation,
                pattern,
                level,
                nested,
            } => {
                write!(f, "{pad}{function} ")?;
                if let Some(value) = value {
                    write!(f, "{value} ")?;
                }
                writeln!(
                    f,
                    "AS t{level}.0 IN t{level} ∈ {}{}",
                    relation.name(),
                    PatternDisplay(pattern)
                )?;
                nested.fmt_indented(f, indent + 1)
            }
            Operation::Filter { condition, nested } => {
                writeln!(f, "{pad}IF {condition}")?;
                nested.fmt_indented(f, indent + 1)
            }
            Operation::Project { relation, values } => {
                writeln!(
                    f,
                    "{pad}PROJECT ({}) INTO {}",
                    values.iter().format(", "),
                    relation.name()
                )
            }
            Operation::Return { values } => {
                writeln!(
                    f,
                    "{pad}RETURN ({})",
                    values.iter().format_with(", ", |slot, g| match slot {
                        Some(value) => g(value),
                        None => g(&"_"),
                    })
                )
            }
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
