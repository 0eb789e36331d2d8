//! Existence-check conversion: scans whose bound tuple is never read are
//! replaced by a filter on tuple existence, eliminating the enumeration.

use crate::{
    condition::Condition,
    operation::Operation,
    program::Program,
    transform::Transformer,
};

/// Rewrites `Scan(R, t, nested)` and `IndexScan(R, t, pattern, nested)`
/// into `Filter(ExistenceCheck(R, pattern), nested)` when nothing below
/// the search reads `t`. For a plain scan the pattern is all wildcards,
/// which is this condition vocabulary's spelling of "R is not empty".
#[derive(Debug, Clone, Copy)]
pub struct ConvertExistenceChecksTransformer;

impl Transformer for ConvertExistenceChecksTransformer {
    fn name(&self) -> &'static str {
        "ConvertExistenceChecks"
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
        } => {
            if nested.references_level(level) {
                Operation::Scan {
                    relation,
                    level,
                    nested,
                }
            } else {
                let pattern = vec![None; relation.arity()];
                Operation::Filter {
                    condition: Condition::ExistenceCheck { relation, pattern },
                    nested,
                }
            }
        }
        Operation::IndexScan {
            relation,
            level,
            pattern,
            nested,
        } => {
            if nested.references_level(level) {
                Operation::IndexScan {
                    relation,
                    level,
                    pattern,
                    nested,
                }
            } else {
                Operation::Filter {
                    condition: Condition::ExistenceCheck { relation, pattern },
                    nested,
                }
            }
        }
        other => other,
    };
    operation.map_nested(rewrite)
}
