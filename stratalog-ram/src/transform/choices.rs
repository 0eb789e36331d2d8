//! Scan-to-choice narrowing: searches that only ever test their bound
//! tuple commit to a single witness instead of enumerating all matches.

use crate::{
    operation::Operation,
    program::Program,
    transform::Transformer,
};

/// Rewrites `Scan(R, t, Filter(cond, nested))` into
/// `Choice(R, t, cond, nested)` (and the index-scan form into
/// `IndexChoice`) when `cond` reads `t` but nothing below the filter does.
/// The filter's acceptance is then the only use of the scan, so any single
/// satisfying tuple is as good as all of them.
#[derive(Debug, Clone, Copy)]
pub struct SearchesToChoicesTransformer;

impl Transformer for SearchesToChoicesTransformer {
    fn name(&self) -> &'static str {
        "SearchesToChoices"
    }

    fn transform(&self, program: &mut Program) -> bool {
        let mut modified = false;
        program.for_each_query_mut(&mut |operation| {
            let rewritten = rewrite(operation.clone());
            if rewritten != *operation {
                *operation = rewritten;
                modified = true;
            }
        });
        modified
    }
}

fn rewrite(operation: Operation) -> Operation {
    let operation = match operation {
        Operation::Scan {
            relation,
            level,
            nested,
        } => match *nested {
            Operation::Filter { condition, nested }
                if condition.references_level(level) && !nested.references_level(level) =>
            {
                Operation::Choice {
                    relation,
                    level,
                    condition,
                    nested,
                }
            }
            other => Operation::Scan {
                relation,
                level,
                nested: Box::new(other),
            },
        },
        Operation::IndexScan {
            relation,
            level,
            pattern,
            nested,
        } => match *nested {
            Operation::Filter { condition, nested }
                if condition.references_level(level) && !nested.references_level(level) =>
            {
                Operation::IndexChoice {
                    relation,
                    level,
                    pattern,
                    condition,
                    nested,
                }
            }
            other => Operation::IndexScan {
                relation,
                level,
                pattern,
                nested: Box::new(other),
            },
        },
        other => other,
    };
    operation.map_nested(rewrite)
}
