//! Structural analyses over the RAM tree.
//!
//! Analyses are pure functions from a subtree to a derived fact; they
//! never mutate the tree and return defined results for any structurally
//! valid input. Transformers re-request them after each rewrite.

pub mod constant;
pub mod index_keys;
pub mod levels;

pub use constant::is_constant;
pub use index_keys::index_scan_keys;
pub use levels::{condition_level, value_level};
