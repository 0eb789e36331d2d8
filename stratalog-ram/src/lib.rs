//! The relational algebra machine (RAM) layer of stratalog.
//!
//! This crate defines the tree IR that the stratalog translator emits:
//! pure [values][value::Value], boolean [conditions][condition::Condition],
//! loop-nest [operations][operation::Operation] and outer control
//! [statements][statement::Statement], together with the structural
//! analyses over that IR and the transformation pipeline that rewrites
//! naive loop nests into indexed, filtered, short-circuited form.

#![deny(missing_debug_implementations, trivial_casts, trivial_numeric_casts)]
#![warn(missing_docs, unused_import_braces, unused_qualifications)]

pub mod analysis;
pub mod condition;
pub mod node;
pub mod operation;
pub mod operator;
pub mod program;
pub mod relation;
pub mod statement;
pub mod transform;
pub mod value;

/// The domain RAM programs compute over. Symbols are interned into this
/// domain by the translator; the machine only ever sees numbers.
pub type Domain = i64;

/// Identifier of the loop that binds a tuple; `ElementAccess(t, i)` refers
/// to column `i` of the tuple bound by the loop with identifier `t`.
pub type TupleId = usize;

/// Bitmask over the columns of a search pattern; bit `i` is set iff column
/// `i` is constrained to a concrete value.
pub type SearchColumns = u64;
