//! The stratalog compiler middle end.
//!
//! This crate lowers a semantically analyzed Datalog program into a
//! relational algebra machine program (see the [stratalog_ram] crate) and
//! carries the program analyses the lowering consumes: the SCC graph over
//! relations, its topological order, recursive-clause marking and the
//! relation-expiry schedule.
//!
//! Parsing and semantic analysis happen upstream; executing the emitted
//! machine program happens downstream. The entry point here is
//! [translation::translate_unit].

#![deny(missing_debug_implementations, trivial_casts, trivial_numeric_casts)]
#![warn(missing_docs, unused_import_braces, unused_qualifications)]

/// The crate defining the machine IR this compiler targets.
pub extern crate stratalog_ram as ram;

pub mod analysis;
pub mod ast;
pub mod config;
pub mod error;
pub mod report;
pub mod symbols;
pub mod translation;
