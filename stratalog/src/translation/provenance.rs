//! Subproof subroutines for provenance.
//!
//! For every clause with a non-empty body, a subroutine re-derives the
//! clause with each head column equated to a subroutine parameter and
//! returns the witnessing body tuples. The downstream machine invokes the
//! subroutine with a derived tuple to obtain one proof step.

use std::collections::HashMap;

use stratalog_ram::{program::Program as RamProgram, relation::Relation as RamRelation};

use crate::{ast::Program, error::TranslationError, symbols::SymbolTable};

use super::{
    clause::{ClauseTranslator, Emission},
    program::resolve_atoms,
};

/// Register a `<relation>_<clause>_subproof` subroutine for every
/// non-fact clause of `program`. Clauses are numbered from 1 within their
/// relation.
pub(crate) fn add_subproof_subroutines(
    ram_program: &mut RamProgram,
    program: &Program,
    symbols: &mut SymbolTable,
    catalog: &HashMap<String, RamRelation>,
) -> Result<(), TranslationError> {
    for relation in program.relations() {
        for (number, (_, clause)) in program.clauses_for(relation.name()).enumerate() {
            if clause.body.is_empty() {
                continue;
            }

            let atom_relations = resolve_atoms(clause.positive_atoms(), catalog, &HashMap::new())?;
            let mut translator = ClauseTranslator::new(symbols, catalog);
            let operation = translator.translate(clause, &atom_relations, Emission::Return)?;

            let label = format!("{}_{}_subproof", relation.name(), number + 1);
            log::debug!("added subroutine {label} for {clause}");
            ram_program.add_subroutine(label, operation);
        }
    }
    Ok(())
}
