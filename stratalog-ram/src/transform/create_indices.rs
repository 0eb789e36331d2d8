//! Index introduction: turn filtered scans whose conditions pin columns
//! to earlier-computable values into index scans.

use crate::{
    analysis::{index_scan_keys, is_constant, value_level},
    condition::Condition,
    operation::Operation,
    operator::ComparisonOp,
    program::Program,
    relation::Relation,
    transform::Transformer,
    value::Value,
    TupleId,
};

/// Rewrites `Scan(R, t, Filter(cond, nested))` into
/// `IndexScan(R, t, pattern, ...)` whenever `cond` contains equalities of
/// the form `t.c = E` with `E` computable before the scan. Consumed
/// equalities leave the residual condition; if two equalities pin the same
/// column, the first one wins and the others stay residual.
#[derive(Debug, Clone, Copy)]
pub struct CreateIndicesTransformer;

impl Transformer for CreateIndicesTransformer {
    fn name(&self) -> &'static str {
        "CreateIndices"
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
            Operation::Filter { condition, nested } => {
                index_scan(relation, level, condition, nested)
            }
            other => Operation::Scan {
                relation,
                level,
                nested: Box::new(other),
            },
        },
        other => other,
    };
    operation.map_nested(rewrite)
}

fn index_scan(
    relation: Relation,
    level: TupleId,
    condition: Condition,
    nested: Box<Operation>,
) -> Operation {
    let mut pattern: Vec<Option<Value>> = vec![None; relation.arity()];
    let mut residual = Vec::new();

    for conjunct in condition.conjuncts() {
        match index_element(&conjunct, level) {
            Some((column, value)) if pattern[column].is_none() => pattern[column] = Some(value),
            _ => residual.push(conjunct),
        }
    }

    if index_scan_keys(&pattern) == 0 {
        return Operation::Scan {
            relation,
            level,
            nested: Box::new(Operation::Filter {
                condition: Condition::fold(residual).expect("scan had a non-empty condition"),
                nested,
            }),
        };
    }

    let nested = match Condition::fold(residual) {
        Some(residual) => Box::new(Operation::Filter {
            condition: residual,
            nested,
        }),
        None => nested,
    };
    Operation::IndexScan {
        relation,
        level,
        pattern,
        nested,
    }
}

/// If `conjunct` is an equality pinning a column of the tuple at `level`
/// to a value computable before the scan, return that column and value.
fn index_element(conjunct: &Condition, level: TupleId) -> Option<(usize, Value)> {
    let Condition::Comparison {
        op: ComparisonOp::Equal,
        lhs,
        rhs,
    } = conjunct
    else {
        return None;
    };

    if let Some(column) = scan_column(lhs, level) {
        if available_before(rhs, level) {
            return Some((column, rhs.clone()));
        }
    }
    if let Some(column) = scan_column(rhs, level) {
        if available_before(lhs, level) {
            return Some((column, lhs.clone()));
        }
    }
    None
}

fn scan_column(value: &Value, level: TupleId) -> Option<usize> {
    match value {
        Value::ElementAccess {
            level: own, column, ..
        } if *own == level => Some(*column),
        _ => None,
    }
}

fn available_before(value: &Value, level: TupleId) -> bool {
    is_constant(value) || value_level(value).map_or(true, |l| l < level)
}

#[cfg(test)]
mod test {
    use crate::condition::{equals, Condition};
    use crate::operator::ComparisonOp;
    use crate::program::Program;
    use crate::relation::{Attribute, AttributeKind, Relation};
    use crate::statement::Statement;
    use crate::transform::Transformer;
    use crate::value::{access, Value};

    use super::CreateIndicesTransformer;
    use crate::operation::Operation;

    fn rel(name: &str, arity: usize) -> Relation {
        Relation::new(
            name,
            (0..arity)
                .map(|i| Attribute::new(format!("x{i}"), AttributeKind::Number))
                .collect(),
        )
    }

    fn query(operation: Operation) -> Program {
        Program::new(Statement::Sequence(vec![Statement::Query(operation)]))
    }

    fn project() -> Operation {
        Operation::Project {
            relation: rel("c", 2),
            values: vec![access(0, 0), access(1, 1)],
        }
    }

    #[test]
    fn join_equality_becomes_index_pattern() {
        let naive = Operation::Scan {
            relation: rel("a", 2),
            level: 0,
            nested: Box::new(Operation::Scan {
                relation: rel("b", 2),
                level: 1,
                nested: Box::new(Operation::Filter {
                    condition: equals(access(0, 1), access(1, 0)),
                    nested: Box::new(project()),
                }),
            }),
        };

        let mut program = query(naive);
        assert!(CreateIndicesTransformer.transform(&mut program));

        let expected = query(Operation::Scan {
            relation: rel("a", 2),
            level: 0,
            nested: Box::new(Operation::IndexScan {
                relation: rel("b", 2),
                level: 1,
                pattern: vec![Some(access(0, 1)), None],
                nested: Box::new(project()),
            }),
        });
        assert_eq!(program, expected);

        assert!(!CreateIndicesTransformer.transform(&mut program));
    }

    #[test]
    fn non_equalities_stay_as_residual_filter() {
        let naive = Operation::Scan {
            relation: rel("b", 2),
            level: 0,
            nested: Box::new(Operation::Filter {
                condition: equals(access(0, 0), Value::Number(3)).and(Condition::Comparison {
                    op: ComparisonOp::Less,
                    lhs: access(0, 1),
                    rhs: Value::Number(9),
                }),
                nested: Box::new(Operation::Project {
                    relation: rel("p", 1),
                    values: vec![access(0, 1)],
                }),
            }),
        };

        let mut program = query(naive);
        assert!(CreateIndicesTransformer.transform(&mut program));

        let expected = query(Operation::IndexScan {
            relation: rel("b", 2),
            level: 0,
            pattern: vec![Some(Value::Number(3)), None],
            nested: Box::new(Operation::Filter {
                condition: Condition::Comparison {
                    op: ComparisonOp::Less,
                    lhs: access(0, 1),
                    rhs: Value::Number(9),
                },
                nested: Box::new(Operation::Project {
                    relation: rel("p", 1),
                    values: vec![access(0, 1)],
                }),
            }),
        });
        assert_eq!(program, expected);
    }

    #[test]
    fn duplicate_column_keeps_first_equality() {
        let naive = Operation::Scan {
            relation: rel("b", 1),
            level: 0,
            nested: Box::new(Operation::Filter {
                condition: equals(access(0, 0), Value::Number(1))
                    .and(equals(access(0, 0), Value::Number(2))),
                nested: Box::new(Operation::Project {
                    relation: rel("p", 1),
                    values: vec![access(0, 0)],
                }),
            }),
        };

        let mut program = query(naive);
        assert!(CreateIndicesTransformer.transform(&mut program));

        let expected = query(Operation::IndexScan {
            relation: rel("b", 1),
            level: 0,
            pattern: vec![Some(Value::Number(1))],
            nested: Box::new(Operation::Filter {
                condition: equals(access(0, 0), Value::Number(2)),
                nested: Box::new(Operation::Project {
                    relation: rel("p", 1),
                    values: vec![access(0, 0)],
                }),
            }),
        });
        assert_eq!(program, expected);
    }

    #[test]
    fn equality_on_the_scanned_level_itself_is_not_indexable() {
        // t0.0 = t0.1 compares two columns of the scanned tuple.
        let naive = Operation::Scan {
            relation: rel("b", 2),
            level: 0,
            nested: Box::new(Operation::Filter {
                condition: equals(access(0, 0), access(0, 1)),
                nested: Box::new(Operation::Project {
                    relation: rel("p", 1),
                    values: vec![access(0, 0)],
                }),
            }),
        };

        let mut program = query(naive.clone());
        assert!(!CreateIndicesTransformer.transform(&mut program));
        assert_eq!(program, query(naive));
    }
}
