//! Condition hoisting: move every filter conjunct to the shallowest loop
//! level at which all of its inputs are ground.

use std::collections::BTreeMap;

use crate::{
    analysis::condition_level,
    condition::Condition,
    operation::Operation,
    program::Program,
    transform::Transformer,
    TupleId,
};

/// Splits top-level conjunctions and re-places each conjunct immediately
/// inside the search that introduces the deepest tuple it depends on;
/// tuple-free conjuncts move in front of the whole loop nest.
#[derive(Debug, Clone, Copy)]
pub struct LevelConditionsTransformer;

impl Transformer for LevelConditionsTransformer {
    fn name(&self) -> &'static str {
        "LevelConditions"
    }

    fn transform(&self, program: &mut Program) -> bool {
        let mut modified = false;
        program.for_each_query_mut(&mut |operation| {
            let hoisted = hoist(operation.clone());
            if hoisted != *operation {
                *operation = hoisted;
                modified = true;
            }
        });
        modified
    }
}

fn hoist(root: Operation) -> Operation {
    let mut conjuncts = Vec::new();
    let stripped = strip_filters(root, &mut conjuncts);

    // Group conjuncts by target level, keeping their collection order
    // within each group.
    let mut by_level: BTreeMap<TupleId, Vec<Condition>> = BTreeMap::new();
    let mut unleveled = Vec::new();
    for conjunct in conjuncts {
        match condition_level(&conjunct) {
            Some(level) => by_level.entry(level).or_default().push(conjunct),
            None => unleveled.push(conjunct),
        }
    }

    let placed = place(stripped, &mut by_level);

    // Any group without a matching binder is kept at the front; with
    // groundedness intact this only ever holds tuple-free conjuncts.
    let leftover = by_level.into_values().flatten();
    match Condition::fold(unleveled.into_iter().chain(leftover)) {
        Some(condition) => Operation::Filter {
            condition,
            nested: Box::new(placed),
        },
        None => placed,
    }
}

/// Remove every filter from the nest, collecting its conjuncts in
/// pre-order.
fn strip_filters(operation: Operation, out: &mut Vec<Condition>) -> Operation {
    match operation {
        Operation::Filter { condition, nested } => {
            out.extend(condition.conjuncts());
            strip_filters(*nested, out)
        }
        other => other.map_nested(|nested| strip_filters(nested, out)),
    }
}

/// Re-insert each group of conjuncts immediately inside the binder that
/// introduces its level.
fn place(operation: Operation, by_level: &mut BTreeMap<TupleId, Vec<Condition>>) -> Operation {
    let binder = operation.binds();
    let operation = operation.map_nested(|nested| place(nested, by_level));

    match binder.and_then(|level| by_level.remove(&level)) {
        Some(conjuncts) => operation.map_nested(|nested| Operation::Filter {
            condition: Condition::fold(conjuncts).expect("groups are non-empty"),
            nested: Box::new(nested),
        }),
        None => operation,
    }
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

    use super::LevelConditionsTransformer;
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

    fn greater_ten(level: usize) -> Condition {
        Condition::Comparison {
            op: ComparisonOp::Greater,
            lhs: access(level, 0),
            rhs: Value::Number(10),
        }
    }

    #[test]
    fn conjunct_moves_to_its_own_level() {
        // FOR t0 IN a; FOR t1 IN b; IF t0.0 > 10 and t0.1 = t1.0; PROJECT
        let naive = Operation::Scan {
            relation: rel("a", 2),
            level: 0,
            nested: Box::new(Operation::Scan {
                relation: rel("b", 2),
                level: 1,
                nested: Box::new(Operation::Filter {
                    condition: greater_ten(0).and(equals(access(0, 1), access(1, 0))),
                    nested: Box::new(Operation::Project {
                        relation: rel("c", 1),
                        values: vec![access(1, 1)],
                    }),
                }),
            }),
        };

        let mut program = query(naive);
        assert!(LevelConditionsTransformer.transform(&mut program));

        let expected = query(Operation::Scan {
            relation: rel("a", 2),
            level: 0,
            nested: Box::new(Operation::Filter {
                condition: greater_ten(0),
                nested: Box::new(Operation::Scan {
                    relation: rel("b", 2),
                    level: 1,
                    nested: Box::new(Operation::Filter {
                        condition: equals(access(0, 1), access(1, 0)),
                        nested: Box::new(Operation::Project {
                            relation: rel("c", 1),
                            values: vec![access(1, 1)],
                        }),
                    }),
                }),
            }),
        });
        assert_eq!(program, expected);

        // The second application finds everything already in place.
        assert!(!LevelConditionsTransformer.transform(&mut program));
    }

    #[test]
    fn conjuncts_at_the_deepest_level_stay_put() {
        let naive = Operation::Scan {
            relation: rel("a", 1),
            level: 0,
            nested: Box::new(Operation::Filter {
                condition: Condition::NotExistenceCheck {
                    relation: rel("b", 1),
                    pattern: vec![Some(access(0, 0))],
                }
                .and(greater_ten(0)),
                nested: Box::new(Operation::Project {
                    relation: rel("p", 1),
                    values: vec![access(0, 0)],
                }),
            }),
        };

        let mut program = query(naive.clone());
        assert!(!LevelConditionsTransformer.transform(&mut program));
        assert_eq!(program, query(naive));
    }

    #[test]
    fn tuple_free_conjunct_moves_in_front_of_the_nest() {
        let naive = Operation::Scan {
            relation: rel("a", 1),
            level: 0,
            nested: Box::new(Operation::Filter {
                condition: Condition::Empty(rel("b", 1)),
                nested: Box::new(Operation::Project {
                    relation: rel("p", 1),
                    values: vec![access(0, 0)],
                }),
            }),
        };

        let mut program = query(naive);
        assert!(LevelConditionsTransformer.transform(&mut program));

        let expected = query(Operation::Filter {
            condition: Condition::Empty(rel("b", 1)),
            nested: Box::new(Operation::Scan {
                relation: rel("a", 1),
                level: 0,
                nested: Box::new(Operation::Project {
                    relation: rel("p", 1),
                    values: vec![access(0, 0)],
                }),
            }),
        });
        assert_eq!(program, expected);
    }
}
