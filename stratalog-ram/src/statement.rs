//! This module defines [Statement], the outer control structure of a RAM
//! program.

use std::{
    fmt::{self, Display},
    path::{Path, PathBuf},
};

use crate::{condition::Condition, node::NodeMapper, operation::Operation, relation::Relation};

/// Where a [Statement::Load] or [Statement::Store] reads or writes its
/// relation. The file name is the relation name plus the extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IoDirectives {
    directory: PathBuf,
    extension: String,
}

impl IoDirectives {
    /// Create directives rooted at `directory` with the given file
    /// `extension` (including the leading dot).
    pub fn new(directory: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            extension: extension.into(),
        }
    }

    /// The directory files live in.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The file extension, including the leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Full path for the file backing `relation`.
    pub fn file_for(&self, relation: &Relation) -> PathBuf {
        self.directory
            .join(format!("{}{}", relation.name(), self.extension))
    }
}

/// Outer control structure of a RAM program.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Statement {
    /// Execute sub-statements in order.
    Sequence(Vec<Statement>),
    /// Execute sub-statements in any order, possibly concurrently. Arms
    /// must write to disjoint relations.
    Parallel(Vec<Statement>),
    /// Execute the body until an [Statement::Exit] inside it fires.
    Loop(Box<Statement>),
    /// Leave the innermost enclosing loop iff the condition holds.
    Exit(Condition),
    /// Time the nested statement under the given label.
    LogTimer {
        /// Label the measurement is reported under.
        label: String,
        /// The timed statement.
        nested: Box<Statement>,
    },
    /// Bring a relation into existence.
    Create(Relation),
    /// Read a relation's tuples from its backing file.
    Load {
        /// The loaded relation.
        relation: Relation,
        /// Where to read from.
        directives: IoDirectives,
    },
    /// Write a relation's tuples to its backing file.
    Store {
        /// The stored relation.
        relation: Relation,
        /// Where to write to.
        directives: IoDirectives,
    },
    /// Add all tuples of `source` to `target`.
    Merge {
        /// Relation receiving the tuples.
        target: Relation,
        /// Relation the tuples are read from.
        source: Relation,
    },
    /// Exchange the contents of two relations of equal shape.
    Swap(Relation, Relation),
    /// Remove all tuples of a relation, keeping the relation itself.
    Clear(Relation),
    /// Remove a relation entirely.
    Drop(Relation),
    /// Emit the current tuple count of a relation.
    PrintSize(Relation),
    /// The statements for one strongly connected component.
    Stratum {
        /// Position in the topological order.
        index: usize,
        /// Statements of the stratum.
        body: Box<Statement>,
    },
    /// A top-level loop nest.
    Query(Operation),
}

impl Statement {
    /// Pass each owned child through `mapper`, storing the result back.
    pub fn apply<M: NodeMapper + ?Sized>(self, mapper: &mut M) -> Self {
        match self {
            Statement::Sequence(statements) => Statement::Sequence(
                statements
                    .into_iter()
                    .map(|s| mapper.map_statement(s))
                    .collect(),
            ),
            Statement::Parallel(statements) => Statement::Parallel(
                statements
                    .into_iter()
                    .map(|s| mapper.map_statement(s))
                    .collect(),
            ),
            Statement::Loop(body) => Statement::Loop(Box::new(mapper.map_statement(*body))),
            Statement::Exit(condition) => Statement::Exit(mapper.map_condition(condition)),
            Statement::LogTimer { label, nested } => Statement::LogTimer {
                label,
                nested: Box::new(mapper.map_statement(*nested)),
            },
            Statement::Stratum { index, body } => Statement::Stratum {
                index,
                body: Box::new(mapper.map_statement(*body)),
            },
            Statement::Query(operation) => Statement::Query(mapper.map_operation(operation)),
            leaf @ (Statement::Create(_)
            | Statement::Load { .. }
            | Statement::Store { .. }
            | Statement::Merge { .. }
            | Statement::Swap(_, _)
            | Statement::Clear(_)
            | Statement::Drop(_)
            | Statement::PrintSize(_)) => leaf,
        }
    }

    /// Direct statement children in a stable order.
    pub fn children(&self) -> Vec<&Statement> {
        match self {
            Statement::Sequence(statements) | Statement::Parallel(statements) => {
                statements.iter().collect()
            }
            Statement::Loop(body) | Statement::Stratum { body, .. } => vec![body],
            Statement::LogTimer { nested, .. } => vec![nested],
            _ => Vec::new(),
        }
    }

    pub(crate) fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = "\t".repeat(indent);
        match self {
            Statement::Sequence(statements) => {
                for statement in statements {
                    statement.fmt_indented(f, indent)?;
                }
                Ok(())
            }
            Statement::Parallel(statements) => {
                writeln!(f, "{pad}PARALLEL")?;
                for statement in statements {
                    statement.fmt_indented(f, indent + 1)?;
                }
                writeln!(f, "{pad}END PARALLEL")
            }
            Statement::Loop(body) => {
                writeln!(f, "{pad}LOOP")?;
                body.fmt_indented(f, indent + 1)?;
                writeln!(f, "{pad}END LOOP")
            }
            Statement::Exit(condition) => writeln!(f, "{pad}EXIT {condition}"),
            Statement::LogTimer { label, nested } => {
                writeln!(f, "{pad}START_TIMER \"{label}\"")?;
                nested.fmt_indented(f, indent + 1)?;
                writeln!(f, "{pad}END_TIMER")
            }
            Statement::Create(relation) => writeln!(f, "{pad}CREATE {relation}"),
            Statement::Load {
                relation,
                directives,
            } => writeln!(
                f,
                "{pad}LOAD {} FROM \"{}\"",
                relation.name(),
                directives.file_for(relation).display()
            ),
            Statement::Store {
                relation,
                directives,
            } => writeln!(
                f,
                "{pad}STORE {} TO \"{}\"",
                relation.name(),
                directives.file_for(relation).display()
            ),
            Statement::Merge { target, source } => {
                writeln!(f, "{pad}MERGE {} INTO {}", source.name(), target.name())
            }
            Statement::Swap(left, right) => {
                writeln!(f, "{pad}SWAP ({}, {})", left.name(), right.name())
            }
            Statement::Clear(relation) => writeln!(f, "{pad}CLEAR {}", relation.name()),
            Statement::Drop(relation) => writeln!(f, "{pad}DROP {}", relation.name()),
            Statement::PrintSize(relation) => writeln!(f, "{pad}PRINTSIZE {}", relation.name()),
            Statement::Stratum { index, body } => {
                writeln!(f, "{pad}BEGIN STRATUM {index}")?;
                body.fmt_indented(f, indent + 1)?;
                writeln!(f, "{pad}END STRATUM {index}")
            }
            Statement::Query(operation) => {
                writeln!(f, "{pad}QUERY")?;
                operation.fmt_indented(f, indent + 1)
            }
        }
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
