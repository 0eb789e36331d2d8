//! Program analyses consumed by the translator.
//!
//! The translator consumes these results verbatim; it never recomputes
//! them. All of them are cheap, deterministic functions of the program.

pub mod recursive_clauses;
pub mod scc_graph;
pub mod schedule;
pub mod type_env;

pub use recursive_clauses::RecursiveClauses;
pub use scc_graph::SccGraph;
pub use schedule::RelationSchedule;
pub use type_env::TypeEnvironment;

use crate::ast::Program;

/// The bundle of analysis results one translation consumes.
#[derive(Debug)]
pub struct ProgramAnalyses {
    /// Type environment for attribute declarations.
    pub type_env: TypeEnvironment,
    /// SCC graph over the program's relations, topologically ordered.
    pub scc_graph: SccGraph,
    /// Which clauses recurse through their own component.
    pub recursive_clauses: RecursiveClauses,
    /// When relations can be dropped.
    pub schedule: RelationSchedule,
}

impl ProgramAnalyses {
    /// Run all analyses over `program`.
    pub fn compute(program: &Program) -> Self {
        let type_env = TypeEnvironment::default();
        let scc_graph = SccGraph::build(program);
        let recursive_clauses = RecursiveClauses::compute(program, &scc_graph);
        let schedule = RelationSchedule::compute(program, &scc_graph);

        Self {
            type_env,
            scc_graph,
            recursive_clauses,
            schedule,
        }
    }
}
