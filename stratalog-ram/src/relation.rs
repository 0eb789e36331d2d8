//! This module defines [Relation], the descriptor RAM nodes use to refer
//! to a stored relation.

use std::fmt::{self, Display};

use itertools::Itertools;

/// Kind of values stored in a relation column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Plain domain numbers.
    Number,
    /// Domain numbers that index the symbol table.
    Symbol,
}

impl Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::Number => f.write_str("number"),
            AttributeKind::Symbol => f.write_str("symbol"),
        }
    }
}

/// A named, typed column of a relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    name: String,
    kind: AttributeKind,
}

impl Attribute {
    /// Create a new [Attribute].
    pub fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Name of the column.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of the column.
    pub fn kind(&self) -> AttributeKind {
        self.kind
    }
}

impl Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.kind)
    }
}

/// Descriptor of a stored relation.
///
/// RAM nodes do not share ownership of relations; every node that mentions
/// a relation holds its own copy of the descriptor. Two descriptors denote
/// the same relation iff they are structurally equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Relation {
    name: String,
    attributes: Vec<Attribute>,
}

impl Relation {
    /// Create a new [Relation] descriptor.
    pub fn new(name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }

    /// Name under which the relation is stored.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of columns.
    pub fn arity(&self) -> usize {
        self.attributes.len()
    }

    /// The typed columns of the relation.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Descriptor of the same shape under a prefixed name, as used for the
    /// `delta_` and `new_` auxiliaries of semi-naive evaluation.
    pub fn prefixed(&self, prefix: &str) -> Self {
        Self {
            name: format!("{prefix}{}", self.name),
            attributes: self.attributes.clone(),
        }
    }
}

impl Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.attributes.iter().format(", "))
    }
}
