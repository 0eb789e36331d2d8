//! The RAM transformation pipeline.
//!
//! Each transformer exposes a stable name and rewrites a [Program] in
//! place, reporting whether it changed anything. The [Pipeline] applies a
//! fixed sequence of transformers and iterates the sequence to a fixpoint,
//! bounded by a safety limit.

pub mod choices;
pub mod create_indices;
pub mod existence_checks;
pub mod level_conditions;

pub use choices::SearchesToChoicesTransformer;
pub use create_indices::CreateIndicesTransformer;
pub use existence_checks::ConvertExistenceChecksTransformer;
pub use level_conditions::LevelConditionsTransformer;

use crate::program::Program;

/// An analysis-driven rewrite over a RAM program.
pub trait Transformer {
    /// Stable name of the transformer, for logs and reports.
    fn name(&self) -> &'static str;

    /// Rewrite `program` in place; `true` iff the program was modified.
    fn transform(&self, program: &mut Program) -> bool;
}

/// Safety bound on fixpoint iteration; reaching it is a warning, not an
/// error, and the last stable tree is retained.
pub const ITERATION_LIMIT: usize = 16;

/// A fixed sequence of transformers applied repeatedly until none of them
/// reports a modification.
pub struct Pipeline {
    transformers: Vec<Box<dyn Transformer>>,
    iteration_limit: usize,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field(
                "transformers",
                &self
                    .transformers
                    .iter()
                    .map(|t| t.name())
                    .collect::<Vec<_>>(),
            )
            .field("iteration_limit", &self.iteration_limit)
            .finish()
    }
}

impl Pipeline {
    /// Create a pipeline over the given transformers.
    pub fn new(transformers: Vec<Box<dyn Transformer>>) -> Self {
        Self {
            transformers,
            iteration_limit: ITERATION_LIMIT,
        }
    }

    /// The standard optimization sequence: condition hoisting, index
    /// introduction, existence-check conversion, scan-to-choice narrowing.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(LevelConditionsTransformer),
            Box::new(CreateIndicesTransformer),
            Box::new(ConvertExistenceChecksTransformer),
            Box::new(SearchesToChoicesTransformer),
        ])
    }

    /// Run the sequence to fixpoint; returns the number of iterations
    /// executed.
    pub fn optimize(&self, program: &mut Program) -> usize {
        for iteration in 0..self.iteration_limit {
            let mut modified = false;
            for transformer in &self.transformers {
                let changed = transformer.transform(program);
                log::debug!(
                    "iteration {iteration}: {} {}",
                    transformer.name(),
                    if changed { "modified" } else { "unchanged" }
                );
                modified |= changed;
            }

            if !modified {
                return iteration + 1;
            }
        }

        log::warn!(
            "RAM optimization did not reach a fixpoint within {} iterations",
            self.iteration_limit
        );
        self.iteration_limit
    }
}

#[cfg(test)]
mod test {
    use crate::program::Program;
    use crate::statement::Statement;

    use super::{Pipeline, Transformer};

    struct Stubborn;

    impl Transformer for Stubborn {
        fn name(&self) -> &'static str {
            "Stubborn"
        }

        fn transform(&self, _program: &mut Program) -> bool {
            true
        }
    }

    #[test_log::test]
    fn empty_program_converges_immediately() {
        let mut program = Program::new(Statement::Sequence(vec![]));
        assert_eq!(Pipeline::standard().optimize(&mut program), 1);
    }

    #[test_log::test]
    fn stubborn_transformer_hits_the_bound() {
        let mut program = Program::new(Statement::Sequence(vec![]));
        let pipeline = Pipeline::new(vec![Box::new(Stubborn)]);
        assert_eq!(pipeline.optimize(&mut program), super::ITERATION_LIMIT);
    }
}
