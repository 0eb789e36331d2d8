//! Per-stratum lowering of a whole program.
//!
//! Components are visited in topological order; each one contributes a
//! stratum with a fixed phase order: create, load, body, print-size,
//! store, drop. Recursive components evaluate semi-naively through their
//! `delta_`/`new_` auxiliaries.

use std::collections::HashMap;

use stratalog_ram::{
    condition::Condition,
    program::Program as RamProgram,
    relation::Relation as RamRelation,
    statement::{IoDirectives, Statement},
};

use crate::{
    analysis::ProgramAnalyses, ast::Program, config::Config, error::TranslationError,
    symbols::SymbolTable,
};

use super::{
    clause::{ClauseTranslator, Emission},
    provenance, ram_relation,
};

const DELTA_PREFIX: &str = "delta_";
const NEW_PREFIX: &str = "new_";

/// Translate `program` into a RAM program.
pub(crate) fn translate_program(
    program: &Program,
    analyses: &ProgramAnalyses,
    symbols: &mut SymbolTable,
    config: &Config,
) -> Result<RamProgram, TranslationError> {
    // Plain descriptors for every declared relation; semi-naive variants
    // derive their prefixed versions from these.
    let mut catalog = HashMap::new();
    for relation in program.relations() {
        catalog.insert(
            relation.name().to_owned(),
            ram_relation(relation, &analyses.type_env)?,
        );
    }

    let mut strata = Vec::new();
    for scc in analyses.scc_graph.topological_order() {
        let stratum = translate_stratum(scc, program, analyses, symbols, config, &catalog)?;
        strata.push(Statement::Stratum {
            index: scc,
            body: Box::new(Statement::Sequence(stratum)),
        });
    }

    let mut main = Statement::Sequence(strata);
    if config.profile {
        main = Statement::LogTimer {
            label: "runtime".to_string(),
            nested: Box::new(main),
        };
    }

    let mut ram_program = RamProgram::new(main);
    if config.provenance {
        provenance::add_subproof_subroutines(&mut ram_program, program, symbols, &catalog)?;
    }
    Ok(ram_program)
}

fn translate_stratum(
    scc: usize,
    program: &Program,
    analyses: &ProgramAnalyses,
    symbols: &mut SymbolTable,
    config: &Config,
    catalog: &HashMap<String, RamRelation>,
) -> Result<Vec<Statement>, TranslationError> {
    let scc_graph = &analyses.scc_graph;
    let internals = scc_graph.internal_relations(scc);
    let recursive = scc_graph.is_recursive(scc);

    let declared = |index: usize| &program.relations()[index];
    let ram = |index: usize| ram_of(catalog, program, index);

    let mut statements = Vec::new();

    // Create internal relations, with semi-naive auxiliaries when the
    // component iterates.
    for &relation in internals {
        statements.push(Statement::Create(ram(relation).clone()));
        if recursive {
            statements.push(Statement::Create(ram(relation).prefixed(DELTA_PREFIX)));
            statements.push(Statement::Create(ram(relation).prefixed(NEW_PREFIX)));
        }
    }

    // Load internal inputs from the facts directory.
    for &relation in internals {
        if declared(relation).is_input() {
            statements.push(Statement::Load {
                relation: ram(relation).clone(),
                directives: IoDirectives::new(&config.fact_dir, ".facts"),
            });
        }
    }

    // With a communication engine, external predecessors are staged in
    // the output directory.
    if config.engine {
        for relation in scc_graph.external_output_predecessors(scc) {
            statements.push(Statement::Load {
                relation: ram(relation).clone(),
                directives: IoDirectives::new(&config.output_dir, ".csv"),
            });
        }
        for relation in scc_graph.external_non_output_predecessors(scc) {
            statements.push(Statement::Load {
                relation: ram(relation).clone(),
                directives: IoDirectives::new(&config.output_dir, ".facts"),
            });
        }
    }

    // The component body.
    if recursive {
        statements.extend(translate_recursive(
            internals, program, analyses, symbols, catalog,
        )?);
    } else {
        statements.extend(translate_non_recursive(
            internals[0],
            program,
            symbols,
            catalog,
        )?);
    }

    for &relation in internals {
        if declared(relation).is_printsize() {
            statements.push(Statement::PrintSize(ram(relation).clone()));
        }
    }

    if config.engine {
        for relation in scc_graph.internal_non_outputs_with_external_successors(scc) {
            statements.push(Statement::Store {
                relation: ram(relation).clone(),
                directives: IoDirectives::new(&config.output_dir, ".facts"),
            });
        }
    }

    for &relation in internals {
        if declared(relation).is_output() {
            statements.push(Statement::Store {
                relation: ram(relation).clone(),
                directives: IoDirectives::new(&config.output_dir, ".csv"),
            });
        }
    }

    // Provenance keeps every intermediate alive for later subproofs.
    if !config.provenance {
        if config.engine {
            for &relation in internals {
                statements.push(Statement::Drop(ram(relation).clone()));
            }
            for relation in scc_graph.external_output_predecessors(scc) {
                statements.push(Statement::Drop(ram(relation).clone()));
            }
            for relation in scc_graph.external_non_output_predecessors(scc) {
                statements.push(Statement::Drop(ram(relation).clone()));
            }
        } else {
            for &relation in analyses.schedule.expired_at(scc) {
                statements.push(Statement::Drop(ram(relation).clone()));
            }
        }
    }

    Ok(statements)
}

/// Lower every clause of a non-recursive relation, in declaration order.
fn translate_non_recursive(
    relation: usize,
    program: &Program,
    symbols: &mut SymbolTable,
    catalog: &HashMap<String, RamRelation>,
) -> Result<Vec<Statement>, TranslationError> {
    let name = program.relations()[relation].name();
    let target = catalog
        .get(name)
        .expect("catalog covers every declared relation")
        .clone();

    let mut statements = Vec::new();
    for (_, clause) in program.clauses_for(name) {
        let atom_relations = resolve_atoms(clause.positive_atoms(), catalog, &HashMap::new())?;
        let mut translator = ClauseTranslator::new(symbols, catalog);
        let operation = translator.translate(
            clause,
            &atom_relations,
            Emission::Project {
                target: target.clone(),
                guard_against: None,
            },
        )?;
        log::debug!("lowered {clause}");
        statements.push(Statement::Query(operation));
    }
    Ok(statements)
}

/// Semi-naive evaluation of a recursive component: seed the relations and
/// their deltas with the base cases, then iterate delta-joined variants of
/// every recursive clause until nothing new is derived.
fn translate_recursive(
    internals: &[usize],
    program: &Program,
    analyses: &ProgramAnalyses,
    symbols: &mut SymbolTable,
    catalog: &HashMap<String, RamRelation>,
) -> Result<Vec<Statement>, TranslationError> {
    let in_component = |name: &str| {
        program
            .relation_index(name)
            .is_some_and(|index| internals.contains(&index))
    };

    let mut statements = Vec::new();

    // Base cases go into the relation itself and seed the delta.
    for &relation in internals {
        let name = program.relations()[relation].name();
        let target = catalog
            .get(name)
            .expect("catalog covers every declared relation")
            .clone();

        for (clause_index, clause) in program.clauses_for(name) {
            if analyses.recursive_clauses.is_recursive(clause_index) {
                continue;
            }
            let atom_relations = resolve_atoms(clause.positive_atoms(), catalog, &HashMap::new())?;
            let mut translator = ClauseTranslator::new(symbols, catalog);
            let operation = translator.translate(
                clause,
                &atom_relations,
                Emission::Project {
                    target: target.clone(),
                    guard_against: None,
                },
            )?;
            log::debug!("lowered base case {clause}");
            statements.push(Statement::Query(operation));
        }

        statements.push(Statement::Merge {
            target: target.prefixed(DELTA_PREFIX),
            source: target,
        });
    }

    // One parallel arm per relation; each arm runs the delta variants of
    // that relation's recursive clauses and is the only writer of its
    // `new_` auxiliary.
    let mut arms = Vec::new();
    for &relation in internals {
        let name = program.relations()[relation].name();
        let target = catalog
            .get(name)
            .expect("catalog covers every declared relation")
            .clone();

        let mut variants = Vec::new();
        for (clause_index, clause) in program.clauses_for(name) {
            if !analyses.recursive_clauses.is_recursive(clause_index) {
                continue;
            }

            let delta_positions: Vec<usize> = clause
                .positive_atoms()
                .enumerate()
                .filter(|(_, atom)| in_component(&atom.relation))
                .map(|(position, _)| position)
                .collect();

            for &delta_position in &delta_positions {
                let overrides: HashMap<usize, RamRelation> = {
                    let atom = clause
                        .positive_atoms()
                        .nth(delta_position)
                        .expect("position was enumerated above");
                    let plain = catalog
                        .get(&atom.relation)
                        .ok_or_else(|| TranslationError::UnknownRelation(atom.relation.clone()))?;
                    HashMap::from([(delta_position, plain.prefixed(DELTA_PREFIX))])
                };

                let atom_relations = resolve_atoms(clause.positive_atoms(), catalog, &overrides)?;
                let mut translator = ClauseTranslator::new(symbols, catalog);
                let operation = translator.translate(
                    clause,
                    &atom_relations,
                    Emission::Project {
                        target: target.prefixed(NEW_PREFIX),
                        guard_against: Some(target.clone()),
                    },
                )?;
                log::debug!("lowered delta variant {delta_position} of {clause}");
                variants.push(Statement::Query(operation));
            }
        }

        match variants.len() {
            0 => {}
            1 => arms.push(variants.pop().expect("length was checked")),
            _ => arms.push(Statement::Sequence(variants)),
        }
    }

    let mut loop_body = vec![Statement::Parallel(arms)];

    // Terminate in the iteration that derives nothing new.
    let exit = Condition::fold(internals.iter().map(|&relation| {
        Condition::Empty(
            catalog
                .get(program.relations()[relation].name())
                .expect("catalog covers every declared relation")
                .prefixed(NEW_PREFIX),
        )
    }))
    .expect("recursive components are non-empty");
    loop_body.push(Statement::Exit(exit));

    for &relation in internals {
        let plain = catalog
            .get(program.relations()[relation].name())
            .expect("catalog covers every declared relation")
            .clone();
        loop_body.push(Statement::Swap(
            plain.prefixed(DELTA_PREFIX),
            plain.prefixed(NEW_PREFIX),
        ));
        loop_body.push(Statement::Merge {
            target: plain.clone(),
            source: plain.prefixed(DELTA_PREFIX),
        });
        loop_body.push(Statement::Clear(plain.prefixed(NEW_PREFIX)));
    }

    statements.push(Statement::Loop(Box::new(Statement::Sequence(loop_body))));
    Ok(statements)
}

/// The catalog descriptor of the relation at `index` in declaration
/// order.
fn ram_of<'c>(
    catalog: &'c HashMap<String, RamRelation>,
    program: &Program,
    index: usize,
) -> &'c RamRelation {
    catalog
        .get(program.relations()[index].name())
        .expect("catalog covers every declared relation")
}

/// Resolve the relation each positive atom reads from, applying the
/// per-position overrides of semi-naive variants.
pub(crate) fn resolve_atoms<'a>(
    atoms: impl Iterator<Item = &'a crate::ast::Atom>,
    catalog: &HashMap<String, RamRelation>,
    overrides: &HashMap<usize, RamRelation>,
) -> Result<Vec<RamRelation>, TranslationError> {
    atoms
        .enumerate()
        .map(|(position, atom)| match overrides.get(&position) {
            Some(relation) => Ok(relation.clone()),
            None => catalog
                .get(&atom.relation)
                .cloned()
                .ok_or_else(|| TranslationError::UnknownRelation(atom.relation.clone())),
        })
        .collect()
}

