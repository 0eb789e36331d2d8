//! Lowering from the analyzed AST to a RAM program.
//!
//! [translate_unit] is the entry point: it runs the program analyses,
//! lowers every stratum in topological order and hands back a translation
//! unit carrying the machine program next to the symbol table and the
//! reports. Failures surface as error-report diagnostics; the returned
//! unit then carries no program.

pub(crate) mod clause;
pub(crate) mod program;
pub(crate) mod provenance;
pub(crate) mod value_index;

use std::time::Instant;

use stratalog_ram::relation::{Attribute, Relation as RamRelation};

use crate::{
    analysis::{ProgramAnalyses, TypeEnvironment},
    ast,
    config::Config,
    error::TranslationError,
    report::{DebugReport, ErrorReport},
    symbols::SymbolTable,
};

/// The analyzed input of a translation: the program plus the side
/// services shared across compiler phases.
#[derive(Debug, Default)]
pub struct AstTranslationUnit {
    /// The semantically analyzed program.
    pub program: ast::Program,
    /// Symbol table; appended to while lowering string constants.
    pub symbols: SymbolTable,
    /// Error report; appended to, never truncated.
    pub errors: ErrorReport,
    /// Debug report; flushed once at the end of translation.
    pub debug: DebugReport,
}

impl AstTranslationUnit {
    /// Wrap a program with fresh side services.
    pub fn new(program: ast::Program) -> Self {
        Self {
            program,
            ..Self::default()
        }
    }
}

/// The output of a translation. `program` is `None` when any translator
/// invariant fired; the diagnostics then say why.
#[derive(Debug)]
pub struct RamTranslationUnit {
    /// The lowered machine program, if translation succeeded.
    pub program: Option<stratalog_ram::program::Program>,
    /// Symbol table, possibly extended during lowering.
    pub symbols: SymbolTable,
    /// Error report, possibly extended during lowering.
    pub errors: ErrorReport,
    /// Debug report, possibly extended with a "ram-program" section.
    pub debug: DebugReport,
}

/// Translate a unit under the given configuration.
pub fn translate_unit(unit: AstTranslationUnit, config: &Config) -> RamTranslationUnit {
    let started = Instant::now();

    let AstTranslationUnit {
        program,
        mut symbols,
        mut errors,
        mut debug,
    } = unit;

    let analyses = ProgramAnalyses::compute(&program);
    let ram_program = match program::translate_program(&program, &analyses, &mut symbols, config) {
        Ok(ram_program) => Some(ram_program),
        Err(error) => {
            log::error!("translation failed: {error}");
            errors.error(error.to_string());
            None
        }
    };

    if let Some(path) = &config.debug_report {
        if let Some(ram_program) = &ram_program {
            debug.add_section(
                "ram-program",
                format!("RAM Program ({:.3}s)", started.elapsed().as_secs_f64()),
                ram_program.to_string(),
            );
        }
        if !debug.is_empty() {
            if let Err(error) = debug.write_to(path) {
                log::error!("failed to write debug report to {}: {error}", path.display());
            }
        }
    }

    RamTranslationUnit {
        program: ram_program,
        symbols,
        errors,
        debug,
    }
}

/// Build the RAM descriptor for a declared relation, resolving its
/// attribute types through the environment.
pub(crate) fn ram_relation(
    relation: &ast::Relation,
    type_env: &TypeEnvironment,
) -> Result<RamRelation, TranslationError> {
    let attributes = relation
        .attributes()
        .iter()
        .map(|(name, type_name)| Ok(Attribute::new(name, type_env.resolve(type_name)?)))
        .collect::<Result<Vec<_>, TranslationError>>()?;
    Ok(RamRelation::new(relation.name(), attributes))
}
