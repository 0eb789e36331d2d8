//! End-to-end lowering scenarios: literal programs in, expected RAM
//! skeletons out.

use stratalog::ast::{Aggregate, Atom, Clause, Constraint, Literal, Program, Relation, Term};
use stratalog::config::Config;
use stratalog::ram::condition::{equals, Condition};
use stratalog::ram::operation::Operation;
use stratalog::ram::operator::{AggregateFunction, ComparisonOp};
use stratalog::ram::relation::{Attribute, AttributeKind, Relation as RamRelation};
use stratalog::ram::statement::{IoDirectives, Statement};
use stratalog::ram::value::{access, Value};
use stratalog::translation::{translate_unit, AstTranslationUnit};

fn translate(program: Program, config: &Config) -> stratalog::ram::program::Program {
    let unit = translate_unit(AstTranslationUnit::new(program), config);
    assert!(!unit.errors.has_errors(), "{}", unit.errors);
    unit.program.expect("translation should succeed")
}

fn queries(program: &stratalog::ram::program::Program) -> Vec<Operation> {
    let mut queries = Vec::new();
    program
        .clone()
        .for_each_query_mut(&mut |operation| queries.push(operation.clone()));
    queries
}

fn ram(name: &str, attributes: &[&str]) -> RamRelation {
    RamRelation::new(
        name,
        attributes
            .iter()
            .map(|attribute| Attribute::new(*attribute, AttributeKind::Number))
            .collect(),
    )
}

/// Named element access, as the translator emits for variable positions.
fn va(level: usize, column: usize, name: &str) -> Value {
    Value::ElementAccess {
        level,
        column,
        name: Some(name.to_string()),
    }
}

#[test_log::test]
fn empty_program_yields_empty_sequence() {
    let program = translate(Program::new(), &Config::default());
    assert_eq!(program.main(), &Statement::Sequence(vec![]));
    assert_eq!(program.subroutines().count(), 0);
}

#[test_log::test]
fn single_fact_stratum() {
    let mut program = Program::new();
    program
        .add_relation(Relation::numeric("A", &["x"]).output())
        .add_clause(Clause::fact(Atom::new("A", vec![Term::number(1)])));

    let translated = translate(program, &Config::default());

    let a = ram("A", &["x"]);
    let expected = Statement::Sequence(vec![Statement::Stratum {
        index: 0,
        body: Box::new(Statement::Sequence(vec![
            Statement::Create(a.clone()),
            Statement::Query(Operation::Project {
                relation: a.clone(),
                values: vec![Value::Number(1)],
            }),
            Statement::Store {
                relation: a.clone(),
                directives: IoDirectives::new(".", ".csv"),
            },
            Statement::Drop(a),
        ])),
    }]);
    assert_eq!(translated.main(), &expected);
}

#[test_log::test]
fn join_lowers_to_nested_scans_with_equality_filter() {
    // C(x, z) :- A(x, y), B(y, z).
    let mut program = Program::new();
    program
        .add_relation(Relation::numeric("A", &["x", "y"]).input())
        .add_relation(Relation::numeric("B", &["y", "z"]).input())
        .add_relation(Relation::numeric("C", &["x", "z"]).output())
        .add_clause(Clause::rule(
            Atom::new("C", vec![Term::var("x"), Term::var("z")]),
            vec![
                Literal::Atom(Atom::new("A", vec![Term::var("x"), Term::var("y")])),
                Literal::Atom(Atom::new("B", vec![Term::var("y"), Term::var("z")])),
            ],
        ));

    let translated = translate(program, &Config::default());
    let queries = queries(&translated);
    assert_eq!(queries.len(), 1);

    let expected = Operation::Scan {
        relation: ram("A", &["x", "y"]),
        level: 0,
        nested: Box::new(Operation::Scan {
            relation: ram("B", &["y", "z"]),
            level: 1,
            nested: Box::new(Operation::Filter {
                condition: equals(va(0, 1, "y"), va(1, 0, "y")),
                nested: Box::new(Operation::Project {
                    relation: ram("C", &["x", "z"]),
                    values: vec![va(0, 0, "x"), va(1, 1, "z")],
                }),
            }),
        }),
    };
    assert_eq!(queries[0], expected);
}

#[test_log::test]
fn negation_and_constant_filter_share_the_only_level() {
    // P(x) :- A(x), !B(x), x > 10.
    let mut program = Program::new();
    program
        .add_relation(Relation::numeric("A", &["x"]).input())
        .add_relation(Relation::numeric("B", &["x"]).input())
        .add_relation(Relation::numeric("P", &["x"]).output())
        .add_clause(Clause::rule(
            Atom::new("P", vec![Term::var("x")]),
            vec![
                Literal::Atom(Atom::new("A", vec![Term::var("x")])),
                Literal::Negation(Atom::new("B", vec![Term::var("x")])),
                Literal::Constraint(Constraint {
                    op: ComparisonOp::Greater,
                    lhs: Term::var("x"),
                    rhs: Term::number(10),
                }),
            ],
        ));

    let translated = translate(program, &Config::default());
    let queries = queries(&translated);
    assert_eq!(queries.len(), 1);

    let not_in_b = Condition::NotExistenceCheck {
        relation: ram("B", &["x"]),
        pattern: vec![Some(va(0, 0, "x"))],
    };
    let above_ten = Condition::Comparison {
        op: ComparisonOp::Greater,
        lhs: va(0, 0, "x"),
        rhs: Value::Number(10),
    };
    let expected = Operation::Scan {
        relation: ram("A", &["x"]),
        level: 0,
        nested: Box::new(Operation::Filter {
            condition: not_in_b.and(above_ten),
            nested: Box::new(Operation::Project {
                relation: ram("P", &["x"]),
                values: vec![va(0, 0, "x")],
            }),
        }),
    };
    assert_eq!(queries[0], expected);
}

#[test_log::test]
fn recursive_reachability_uses_semi_naive_loop() {
    // R(x, y) :- E(x, y).  R(x, y) :- E(x, z), R(z, y).
    let mut program = Program::new();
    program
        .add_relation(Relation::numeric("E", &["x", "y"]).input())
        .add_relation(Relation::numeric("R", &["x", "y"]).output())
        .add_clause(Clause::rule(
            Atom::new("R", vec![Term::var("x"), Term::var("y")]),
            vec![Literal::Atom(Atom::new(
                "E",
                vec![Term::var("x"), Term::var("y")],
            ))],
        ))
        .add_clause(Clause::rule(
            Atom::new("R", vec![Term::var("x"), Term::var("y")]),
            vec![
                Literal::Atom(Atom::new("E", vec![Term::var("x"), Term::var("z")])),
                Literal::Atom(Atom::new("R", vec![Term::var("z"), Term::var("y")])),
            ],
        ));

    let translated = translate(program, &Config::default());

    let e = ram("E", &["x", "y"]);
    let r = ram("R", &["x", "y"]);
    let delta = r.prefixed("delta_");
    let new = r.prefixed("new_");

    let base = Operation::Scan {
        relation: e.clone(),
        level: 0,
        nested: Box::new(Operation::Project {
            relation: r.clone(),
            values: vec![va(0, 0, "x"), va(0, 1, "y")],
        }),
    };
    let delta_arm = Operation::Scan {
        relation: e.clone(),
        level: 0,
        nested: Box::new(Operation::Scan {
            relation: delta.clone(),
            level: 1,
            nested: Box::new(Operation::Filter {
                condition: equals(va(0, 1, "z"), va(1, 0, "z")),
                nested: Box::new(Operation::Filter {
                    condition: Condition::NotExistenceCheck {
                        relation: r.clone(),
                        pattern: vec![Some(va(0, 0, "x")), Some(va(1, 1, "y"))],
                    },
                    nested: Box::new(Operation::Project {
                        relation: new.clone(),
                        values: vec![va(0, 0, "x"), va(1, 1, "y")],
                    }),
                }),
            }),
        }),
    };

    let expected = Statement::Stratum {
        index: 1,
        body: Box::new(Statement::Sequence(vec![
            Statement::Create(r.clone()),
            Statement::Create(delta.clone()),
            Statement::Create(new.clone()),
            Statement::Query(base),
            Statement::Merge {
                target: delta.clone(),
                source: r.clone(),
            },
            Statement::Loop(Box::new(Statement::Sequence(vec![
                Statement::Parallel(vec![Statement::Query(delta_arm)]),
                Statement::Exit(Condition::Empty(new.clone())),
                Statement::Swap(delta.clone(), new.clone()),
                Statement::Merge {
                    target: r.clone(),
                    source: delta.clone(),
                },
                Statement::Clear(new.clone()),
            ]))),
            Statement::Store {
                relation: r.clone(),
                directives: IoDirectives::new(".", ".csv"),
            },
            Statement::Drop(e),
            Statement::Drop(r),
        ])),
    };

    let Statement::Sequence(strata) = translated.main() else {
        panic!("main statement should be a sequence");
    };
    assert_eq!(strata.len(), 2);
    assert_eq!(strata[1], expected);
}

#[test_log::test]
fn records_pack_in_heads_and_unpack_in_bodies() {
    // Pairs(p) with p = [x, y] constructed; Left destructs it again.
    let mut program = Program::new();
    program
        .add_relation(Relation::numeric("A", &["x", "y"]).input())
        .add_relation(Relation::numeric("Pairs", &["p"]))
        .add_relation(Relation::numeric("Left", &["x"]).output())
        .add_clause(Clause::rule(
            Atom::new(
                "Pairs",
                vec![Term::Record(vec![Term::var("x"), Term::var("y")])],
            ),
            vec![Literal::Atom(Atom::new(
                "A",
                vec![Term::var("x"), Term::var("y")],
            ))],
        ))
        .add_clause(Clause::rule(
            Atom::new("Left", vec![Term::var("x")]),
            vec![Literal::Atom(Atom::new(
                "Pairs",
                vec![Term::Record(vec![Term::var("x"), Term::UnnamedVariable])],
            ))],
        ));

    let translated = translate(program, &Config::default());
    let queries = queries(&translated);
    assert_eq!(queries.len(), 2);

    let pack = Operation::Scan {
        relation: ram("A", &["x", "y"]),
        level: 0,
        nested: Box::new(Operation::Project {
            relation: ram("Pairs", &["p"]),
            values: vec![Value::Pack {
                args: vec![Some(va(0, 0, "x")), Some(va(0, 1, "y"))],
            }],
        }),
    };
    assert_eq!(queries[0], pack);

    let unpack = Operation::Scan {
        relation: ram("Pairs", &["p"]),
        level: 0,
        nested: Box::new(Operation::Lookup {
            level: 1,
            reference: access(0, 0),
            arity: 2,
            nested: Box::new(Operation::Project {
                relation: ram("Left", &["x"]),
                values: vec![va(1, 0, "x")],
            }),
        }),
    };
    assert_eq!(queries[1], unpack);
}

#[test_log::test]
fn body_aggregate_binds_a_synthetic_tuple() {
    // Cheapest(x) :- Cost(x), x <= min v : Cost(v).
    let minimum = Term::Aggregator(Box::new(Aggregate {
        function: AggregateFunction::Min,
        target: Some(Term::var("v")),
        body: vec![Literal::Atom(Atom::new("Cost", vec![Term::var("v")]))],
    }));

    let mut program = Program::new();
    program
        .add_relation(Relation::numeric("Cost", &["c"]).input())
        .add_relation(Relation::numeric("Cheapest", &["c"]).output())
        .add_clause(Clause::rule(
            Atom::new("Cheapest", vec![Term::var("x")]),
            vec![
                Literal::Atom(Atom::new("Cost", vec![Term::var("x")])),
                Literal::Constraint(Constraint {
                    op: ComparisonOp::LessEqual,
                    lhs: Term::var("x"),
                    rhs: minimum,
                }),
            ],
        ));

    let translated = translate(program, &Config::default());
    let queries = queries(&translated);
    assert_eq!(queries.len(), 1);

    let cost = ram("Cost", &["c"]);
    let expected = Operation::Scan {
        relation: cost.clone(),
        level: 0,
        nested: Box::new(Operation::Aggregate {
            function: AggregateFunction::Min,
            value: Some(va(1, 0, "v")),
            relation: cost,
            pattern: vec![None],
            level: 1,
            nested: Box::new(Operation::Filter {
                condition: Condition::Comparison {
                    op: ComparisonOp::LessEqual,
                    lhs: va(0, 0, "x"),
                    rhs: access(1, 0),
                },
                nested: Box::new(Operation::Project {
                    relation: ram("Cheapest", &["c"]),
                    values: vec![va(0, 0, "x")],
                }),
            }),
        }),
    };
    assert_eq!(queries[0], expected);
}

#[test_log::test]
fn provenance_emits_subproof_subroutines() {
    // P(x) :- A(x).
    let mut program = Program::new();
    program
        .add_relation(Relation::numeric("A", &["x"]).input())
        .add_relation(Relation::numeric("P", &["x"]).output())
        .add_clause(Clause::rule(
            Atom::new("P", vec![Term::var("x")]),
            vec![Literal::Atom(Atom::new("A", vec![Term::var("x")]))],
        ));

    let config = Config {
        provenance: true,
        ..Config::default()
    };
    let translated = translate(program, &config);

    let expected = Operation::Scan {
        relation: ram("A", &["x"]),
        level: 0,
        nested: Box::new(Operation::Filter {
            condition: equals(va(0, 0, "x"), Value::Argument(0)),
            nested: Box::new(Operation::Return {
                values: vec![Some(access(0, 0))],
            }),
        }),
    };
    assert_eq!(translated.subroutine("P_1_subproof"), Some(&expected));

    // Provenance keeps intermediates alive: nothing is dropped.
    let mut drops = 0;
    count_drops(translated.main(), &mut drops);
    assert_eq!(drops, 0);
}

fn count_drops(statement: &Statement, drops: &mut usize) {
    if matches!(statement, Statement::Drop(_)) {
        *drops += 1;
    }
    for child in statement.children() {
        count_drops(child, drops);
    }
}

/// Every element access in an emitted query must sit inside the search
/// that introduces its tuple identifier.
#[test_log::test]
fn emitted_queries_are_grounded() {
    let minimum = Term::Aggregator(Box::new(Aggregate {
        function: AggregateFunction::Min,
        target: Some(Term::var("v")),
        body: vec![Literal::Atom(Atom::new("E", vec![Term::var("v"), Term::UnnamedVariable]))],
    }));

    let mut program = Program::new();
    program
        .add_relation(Relation::numeric("E", &["x", "y"]).input())
        .add_relation(Relation::numeric("R", &["x", "y"]).output())
        .add_relation(Relation::numeric("Low", &["x"]).output())
        .add_clause(Clause::rule(
            Atom::new("R", vec![Term::var("x"), Term::var("y")]),
            vec![Literal::Atom(Atom::new(
                "E",
                vec![Term::var("x"), Term::var("y")],
            ))],
        ))
        .add_clause(Clause::rule(
            Atom::new("R", vec![Term::var("x"), Term::var("y")]),
            vec![
                Literal::Atom(Atom::new("E", vec![Term::var("x"), Term::var("z")])),
                Literal::Atom(Atom::new("R", vec![Term::var("z"), Term::var("y")])),
            ],
        ))
        .add_clause(Clause::rule(
            Atom::new("Low", vec![Term::var("x")]),
            vec![
                Literal::Atom(Atom::new("R", vec![Term::var("x"), Term::UnnamedVariable])),
                Literal::Constraint(Constraint {
                    op: ComparisonOp::LessEqual,
                    lhs: Term::var("x"),
                    rhs: minimum,
                }),
            ],
        ));

    let translated = translate(program, &Config::default());
    for query in queries(&translated) {
        let mut bound = Vec::new();
        assert_grounded(&query, &mut bound);
    }
}

fn assert_grounded(operation: &Operation, bound: &mut Vec<usize>) {
    if let Some(level) = operation.binds() {
        bound.push(level);
    }
    for value in operation.values() {
        assert_value_grounded(value, bound);
    }
    for condition in operation.conditions() {
        assert_condition_grounded(condition, bound);
    }
    if let Some(nested) = operation.nested() {
        assert_grounded(nested, bound);
    }
    if operation.binds().is_some() {
        bound.pop();
    }
}

fn assert_condition_grounded(condition: &Condition, bound: &[usize]) {
    for value in condition.values() {
        assert_value_grounded(value, bound);
    }
    for child in condition.children() {
        assert_condition_grounded(child, bound);
    }
}

fn assert_value_grounded(value: &Value, bound: &[usize]) {
    if let Value::ElementAccess { level, .. } = value {
        assert!(bound.contains(level), "t{level} referenced outside its scan");
    }
    for child in value.children() {
        assert_value_grounded(child, bound);
    }
}

#[test_log::test]
fn ungrounded_variable_surfaces_in_the_error_report() {
    // P(x) :- !B(x).  No binder grounds x.
    let mut program = Program::new();
    program
        .add_relation(Relation::numeric("B", &["x"]).input())
        .add_relation(Relation::numeric("P", &["x"]).output())
        .add_clause(Clause::rule(
            Atom::new("P", vec![Term::var("x")]),
            vec![Literal::Negation(Atom::new("B", vec![Term::var("x")]))],
        ));

    let unit = translate_unit(AstTranslationUnit::new(program), &Config::default());
    assert!(unit.program.is_none());
    assert!(unit.errors.has_errors());
    assert!(unit
        .errors
        .diagnostics()
        .iter()
        .any(|diagnostic| diagnostic.message().contains("not grounded")));
}

#[test_log::test]
fn string_constants_are_interned_into_the_symbol_table() {
    // P(x) :- A(x, "label").
    let mut program = Program::new();
    program
        .add_relation(Relation::new(
            "A",
            vec![
                ("x".to_string(), "number".to_string()),
                ("tag".to_string(), "symbol".to_string()),
            ],
        ))
        .add_relation(Relation::numeric("P", &["x"]).output())
        .add_clause(Clause::rule(
            Atom::new("P", vec![Term::var("x")]),
            vec![Literal::Atom(Atom::new(
                "A",
                vec![Term::var("x"), Term::StringConstant("label".to_string())],
            ))],
        ));

    let unit = translate_unit(AstTranslationUnit::new(program), &Config::default());
    assert!(!unit.errors.has_errors(), "{}", unit.errors);
    assert_eq!(unit.symbols.len(), 1);
    assert_eq!(unit.symbols.resolve(0), Some("label"));
}

#[test_log::test]
fn debug_report_carries_the_ram_dump() {
    let mut program = Program::new();
    program
        .add_relation(Relation::numeric("A", &["x"]).output())
        .add_clause(Clause::fact(Atom::new("A", vec![Term::number(1)])));

    let path = std::env::temp_dir().join("stratalog-debug-report.txt");
    let config = Config {
        debug_report: Some(path.clone()),
        ..Config::default()
    };
    let unit = translate_unit(AstTranslationUnit::new(program), &config);

    let section = unit.debug.section("ram-program").expect("section exists");
    assert!(section.contains("PROJECT (number(1)) INTO A"));
    assert!(path.exists());
    let _ = std::fs::remove_file(path);
}
