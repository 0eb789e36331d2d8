//! Error-handling module for the crate.

use thiserror::Error;

/// Errors raised while lowering a program to RAM. Every variant is an
/// invariant the semantic analysis upstream was supposed to establish;
/// any of them aborts the affected translation unit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    /// A variable was referenced before any body literal bound it.
    #[error("variable `{0}` is not grounded")]
    UngroundedVariable(String),
    /// An aggregate value was referenced without a recorded result location.
    #[error("aggregate result in `{0}` has no recorded location")]
    UndefinedAggregate(String),
    /// A record value was referenced without a recorded definition point.
    #[error("record `{0}` has no recorded definition point")]
    UndefinedRecord(String),
    /// An intrinsic operator was applied to the wrong number of arguments.
    #[error("operator `{op}` expects {expected} arguments, found {found}")]
    OperatorArity {
        /// Symbol of the offending operator.
        op: String,
        /// Number of arguments the operator takes.
        expected: usize,
        /// Number of arguments that were supplied.
        found: usize,
    },
    /// An atom does not match the arity of its relation.
    #[error("relation `{relation}` has arity {expected}, atom supplies {found} arguments")]
    AtomArity {
        /// Name of the relation.
        relation: String,
        /// Declared arity.
        expected: usize,
        /// Number of arguments in the atom.
        found: usize,
    },
    /// An atom refers to a relation the program does not declare.
    #[error("unknown relation `{0}`")]
    UnknownRelation(String),
    /// A relation attribute uses a type the environment does not know.
    #[error("unknown type `{0}`")]
    UnknownType(String),
    /// The AST contains a shape this translator does not support.
    #[error("unsupported construct: {0}")]
    Unsupported(&'static str),
}
