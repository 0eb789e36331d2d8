//! This module defines [Program], a complete RAM program.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use crate::{operation::Operation, statement::Statement};

/// A complete RAM program: the main statement (a sequence of strata) plus
/// the named subroutines emitted for provenance subproofs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    main: Statement,
    subroutines: BTreeMap<String, Operation>,
}

impl Program {
    /// Create a program from its main statement.
    pub fn new(main: Statement) -> Self {
        Self {
            main,
            subroutines: BTreeMap::new(),
        }
    }

    /// The main statement.
    pub fn main(&self) -> &Statement {
        &self.main
    }

    /// Mutable access to the main statement.
    pub fn main_mut(&mut self) -> &mut Statement {
        &mut self.main
    }

    /// Register a named subroutine.
    pub fn add_subroutine(&mut self, label: impl Into<String>, body: Operation) {
        self.subroutines.insert(label.into(), body);
    }

    /// The named subroutines, ordered by label.
    pub fn subroutines(&self) -> impl Iterator<Item = (&str, &Operation)> {
        self.subroutines
            .iter()
            .map(|(label, body)| (label.as_str(), body))
    }

    /// Look up a subroutine by label.
    pub fn subroutine(&self, label: &str) -> Option<&Operation> {
        self.subroutines.get(label)
    }

    /// Visit the root operation of every query in the main statement.
    /// Subroutines are not visited; transformers rewrite the main program
    /// only.
    pub fn for_each_query_mut(&mut self, f: &mut impl FnMut(&mut Operation)) {
        Self::visit_statement(&mut self.main, f);
    }

    fn visit_statement(statement: &mut Statement, f: &mut impl FnMut(&mut Operation)) {
        match statement {
            Statement::Sequence(statements) | Statement::Parallel(statements) => {
                for statement in statements {
                    Self::visit_statement(statement, f);
                }
            }
            Statement::Loop(body) | Statement::Stratum { body, .. } => {
                Self::visit_statement(body, f)
            }
            Statement::LogTimer { nested, .. } => Self::visit_statement(nested, f),
            Statement::Query(operation) => f(operation),
            _ => {}
        }
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.main)?;
        for (label, body) in &self.subroutines {
            writeln!(f, "SUBROUTINE {label}")?;
            body.fmt_indented(f, 1)?;
        }
        Ok(())
    }
}
