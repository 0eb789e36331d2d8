//! This module defines [Program], the root of the input model.

use super::{clause::Clause, relation::Relation};

/// A semantically analyzed Datalog program: relation declarations plus
/// clauses. Declaration order is preserved and determines tie-breaks in
/// the analyses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    relations: Vec<Relation>,
    clauses: Vec<Clause>,
}

impl Program {
    /// Create an empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a relation declaration.
    pub fn add_relation(&mut self, relation: Relation) -> &mut Self {
        self.relations.push(relation);
        self
    }

    /// Add a clause.
    pub fn add_clause(&mut self, clause: Clause) -> &mut Self {
        self.clauses.push(clause);
        self
    }

    /// All declared relations in declaration order.
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// All clauses in declaration order.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Position of a relation in declaration order.
    pub fn relation_index(&self, name: &str) -> Option<usize> {
        self.relations
            .iter()
            .position(|relation| relation.name() == name)
    }

    /// Look up a relation declaration by name.
    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations
            .iter()
            .find(|relation| relation.name() == name)
    }

    /// The clauses whose head derives `relation`, in declaration order,
    /// paired with their global clause index.
    pub fn clauses_for<'a>(&'a self, relation: &'a str) -> impl Iterator<Item = (usize, &'a Clause)> {
        self.clauses
            .iter()
            .enumerate()
            .filter(move |(_, clause)| clause.head.relation == relation)
    }
}
