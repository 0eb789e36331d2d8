//! The input model: a semantically analyzed Datalog program.
//!
//! Parsing and semantic analysis live upstream; this module only defines
//! the shapes the translator consumes. Operator vocabulary (intrinsic
//! functors, comparison operators, aggregate functions) is shared with the
//! machine layer.

pub mod clause;
pub mod program;
pub mod relation;
pub mod term;

pub use clause::{Atom, Clause, Constraint, Literal};
pub use program::Program;
pub use relation::Relation;
pub use term::{Aggregate, Term};
