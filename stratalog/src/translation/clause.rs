//! Lowering of a single clause into a loop nest.
//!
//! Each positive body atom becomes a scan at its own level, in body
//! order; record destructors and aggregates follow as deeper binders.
//! Conditions are placed at the deepest level where all their operands
//! are ground, negations after all binders, and the head projection (or
//! subroutine return) sits innermost.

use std::collections::HashMap;

use stratalog_ram::{
    analysis::condition_level,
    condition::{equals, Condition},
    operation::Operation,
    relation::Relation as RamRelation,
    value::Value,
    TupleId,
};

use crate::{
    ast::{Aggregate, Atom, Clause, Literal, Term},
    error::TranslationError,
    symbols::SymbolTable,
};

use super::value_index::{Location, ValueIndex};

/// How the innermost operation of a lowered clause is emitted.
#[derive(Debug)]
pub(crate) enum Emission {
    /// Project the head arguments into `target`; with `guard_against`
    /// set, only tuples absent from that relation are inserted.
    Project {
        target: RamRelation,
        guard_against: Option<RamRelation>,
    },
    /// Equate head arguments with subroutine parameters and return the
    /// witnessing body tuples.
    Return,
}

/// A binder introduced below the atom scans, as discovered during
/// indexing; aggregates still carry their AST until the index is complete.
enum Generator {
    Unpack {
        level: TupleId,
        reference: Location,
        arity: usize,
    },
    Aggregate {
        level: TupleId,
        aggregate: Aggregate,
    },
}

/// A binder with all of its values translated.
enum BuiltGenerator {
    Unpack {
        level: TupleId,
        reference: Value,
        arity: usize,
    },
    Aggregate {
        level: TupleId,
        function: stratalog_ram::operator::AggregateFunction,
        value: Option<Value>,
        relation: RamRelation,
        pattern: Vec<Option<Value>>,
    },
}

impl BuiltGenerator {
    fn level(&self) -> TupleId {
        match self {
            BuiltGenerator::Unpack { level, .. } | BuiltGenerator::Aggregate { level, .. } => {
                *level
            }
        }
    }
}

pub(crate) struct ClauseTranslator<'a> {
    symbols: &'a mut SymbolTable,
    catalog: &'a HashMap<String, RamRelation>,
}

impl<'a> ClauseTranslator<'a> {
    pub fn new(symbols: &'a mut SymbolTable, catalog: &'a HashMap<String, RamRelation>) -> Self {
        Self { symbols, catalog }
    }

    /// Lower `clause` into a loop nest. `atom_relations` gives the
    /// relation each positive body atom reads from, in body order;
    /// semi-naive variants substitute delta relations here.
    pub fn translate(
        &mut self,
        clause: &Clause,
        atom_relations: &[RamRelation],
        emission: Emission,
    ) -> Result<Operation, TranslationError> {
        let atoms: Vec<&Atom> = clause.positive_atoms().collect();
        debug_assert_eq!(atoms.len(), atom_relations.len());

        for (atom, relation) in atoms.iter().zip(atom_relations) {
            if atom.terms.len() != relation.arity() {
                return Err(TranslationError::AtomArity {
                    relation: relation.name().to_owned(),
                    expected: relation.arity(),
                    found: atom.terms.len(),
                });
            }
        }

        // Index every binding position: atom arguments first, then the
        // records and aggregates discovered below them.
        let mut index = ValueIndex::new();
        let mut next_level = atoms.len();
        let mut generators = Vec::new();

        for (level, atom) in atoms.iter().enumerate() {
            for (column, term) in atom.terms.iter().enumerate() {
                self.index_argument(
                    term,
                    Location::new(level, column),
                    &mut index,
                    &mut next_level,
                    &mut generators,
                )?;
            }
        }
        for literal in &clause.body {
            if let Literal::Constraint(constraint) = literal {
                self.discover_aggregates(
                    &constraint.lhs,
                    &mut index,
                    &mut next_level,
                    &mut generators,
                )?;
                self.discover_aggregates(
                    &constraint.rhs,
                    &mut index,
                    &mut next_level,
                    &mut generators,
                )?;
            }
        }
        for term in &clause.head.terms {
            self.discover_aggregates(term, &mut index, &mut next_level, &mut generators)?;
        }

        // Collect conditions in body order, each with its placement level.
        let deepest = next_level.checked_sub(1);
        let mut conditions: Vec<(Option<TupleId>, Condition)> = Vec::new();
        let mut atom_level = 0;
        for literal in &clause.body {
            match literal {
                Literal::Atom(atom) => {
                    self.binder_conditions(&atom.terms, atom_level, &index, &mut conditions)?;
                    atom_level += 1;
                }
                Literal::Negation(atom) => {
                    let relation = self.relation(&atom.relation)?.clone();
                    if atom.terms.len() != relation.arity() {
                        return Err(TranslationError::AtomArity {
                            relation: relation.name().to_owned(),
                            expected: relation.arity(),
                            found: atom.terms.len(),
                        });
                    }
                    let pattern = self.translate_pattern(&atom.terms, &index)?;
                    conditions.push((deepest, Condition::NotExistenceCheck { relation, pattern }));
                }
                Literal::Constraint(constraint) => {
                    let condition = Condition::Comparison {
                        op: constraint.op,
                        lhs: self.translate_term(&constraint.lhs, &index)?,
                        rhs: self.translate_term(&constraint.rhs, &index)?,
                    };
                    conditions.push((condition_level(&condition), condition));
                }
            }
        }

        // Translate generators now that the index is complete.
        let generators = generators
            .into_iter()
            .map(|generator| self.build_generator(generator, &index))
            .collect::<Result<Vec<_>, _>>()?;

        // Head values and the innermost operation.
        let head_values = clause
            .head
            .terms
            .iter()
            .map(|term| self.translate_term(term, &index))
            .collect::<Result<Vec<_>, _>>()?;

        let innermost = match emission {
            Emission::Project {
                target,
                guard_against,
            } => {
                if head_values.len() != target.arity() {
                    return Err(TranslationError::AtomArity {
                        relation: target.name().to_owned(),
                        expected: target.arity(),
                        found: head_values.len(),
                    });
                }
                let guard = guard_against.map(|existing| Condition::NotExistenceCheck {
                    relation: existing,
                    pattern: head_values.iter().cloned().map(Some).collect(),
                });
                let project = Operation::Project {
                    relation: target,
                    values: head_values,
                };
                match guard {
                    Some(condition) => Operation::Filter {
                        condition,
                        nested: Box::new(project),
                    },
                    None => project,
                }
            }
            Emission::Return => {
                for (number, value) in head_values.iter().enumerate() {
                    let condition = equals(value.clone(), Value::Argument(number));
                    conditions.push((condition_level(&condition), condition));
                }
                let values = atom_relations
                    .iter()
                    .enumerate()
                    .flat_map(|(level, relation)| {
                        (0..relation.arity())
                            .map(move |column| Some(Location::new(level, column).access()))
                    })
                    .collect();
                Operation::Return { values }
            }
        };

        // Assemble the nest from the inside out.
        let mut groups: HashMap<TupleId, Vec<Condition>> = HashMap::new();
        let mut outer = Vec::new();
        for (placement, condition) in conditions {
            match placement {
                Some(level) => groups.entry(level).or_default().push(condition),
                None => outer.push(condition),
            }
        }

        let mut current = innermost;
        for generator in generators.into_iter().rev() {
            current = wrap_filter(groups.remove(&generator.level()), current);
            current = match generator {
                BuiltGenerator::Unpack {
                    level,
                    reference,
                    arity,
                } => Operation::Lookup {
                    level,
                    reference,
                    arity,
                    nested: Box::new(current),
                },
                BuiltGenerator::Aggregate {
                    level,
                    function,
                    value,
                    relation,
                    pattern,
                } => Operation::Aggregate {
                    function,
                    value,
                    relation,
                    pattern,
                    level,
                    nested: Box::new(current),
                },
            };
        }
        current = wrap_binders(atom_relations, current, &mut groups);

        // Conditions with no level and any group left without a binder
        // guard the whole nest.
        let leftover = {
            let mut levels: Vec<TupleId> = groups.keys().copied().collect();
            levels.sort_unstable();
            levels
                .into_iter()
                .flat_map(|level| groups.remove(&level).expect("key was just listed"))
        };
        let front: Vec<Condition> = outer.into_iter().chain(leftover).collect();
        Ok(wrap_filter(Some(front), current))
    }
}

fn wrap_filter(conditions: Option<Vec<Condition>>, nested: Operation) -> Operation {
    match conditions.and_then(Condition::fold) {
        Some(condition) => Operation::Filter {
            condition,
            nested: Box::new(nested),
        },
        None => nested,
    }
}

/// Wrap the atom scans around `current`, innermost first, inserting each
/// level's conditions immediately inside its scan.
fn wrap_binders(
    atom_relations: &[RamRelation],
    mut current: Operation,
    groups: &mut HashMap<TupleId, Vec<Condition>>,
) -> Operation {
    for (level, relation) in atom_relations.iter().enumerate().rev() {
        current = wrap_filter(groups.remove(&level), current);
        current = Operation::Scan {
            relation: relation.clone(),
            level,
            nested: Box::new(current),
        };
    }
    current
}

impl ClauseTranslator<'_> {
    fn relation(&self, name: &str) -> Result<&RamRelation, TranslationError> {
        self.catalog
            .get(name)
            .ok_or_else(|| TranslationError::UnknownRelation(name.to_owned()))
    }

    /// Record the binding positions below one atom argument.
    fn index_argument(
        &mut self,
        term: &Term,
        location: Location,
        index: &mut ValueIndex,
        next_level: &mut TupleId,
        generators: &mut Vec<Generator>,
    ) -> Result<(), TranslationError> {
        match term {
            Term::Variable(name) => {
                index.add_variable(name, Location::named(location.level, location.column, name));
                Ok(())
            }
            Term::UnnamedVariable
            | Term::NumberConstant(_)
            | Term::StringConstant(_)
            | Term::SubroutineArgument(_)
            | Term::Counter => Ok(()),
            Term::Record(components) => {
                let unpack = *next_level;
                *next_level += 1;
                index.define_record(term.clone(), location.clone(), unpack);
                generators.push(Generator::Unpack {
                    level: unpack,
                    reference: location,
                    arity: components.len(),
                });
                for (column, component) in components.iter().enumerate() {
                    self.index_argument(
                        component,
                        Location::new(unpack, column),
                        index,
                        next_level,
                        generators,
                    )?;
                }
                Ok(())
            }
            Term::Functor { .. } | Term::Aggregator(_) => {
                self.discover_aggregates(term, index, next_level, generators)
            }
        }
    }

    /// Assign a level to every aggregate below `term` and bind the free
    /// variables of its source atom.
    fn discover_aggregates(
        &mut self,
        term: &Term,
        index: &mut ValueIndex,
        next_level: &mut TupleId,
        generators: &mut Vec<Generator>,
    ) -> Result<(), TranslationError> {
        match term {
            Term::Aggregator(aggregate) => {
                let level = *next_level;
                *next_level += 1;
                index.define_aggregate(term.clone(), Location::new(level, 0));

                let source = aggregate_source(aggregate)?;
                for (column, argument) in source.terms.iter().enumerate() {
                    if let Term::Variable(name) = argument {
                        if !index.is_defined(name) {
                            index.add_variable(name, Location::named(level, column, name));
                        }
                    }
                }
                if let Some(target) = &aggregate.target {
                    if contains_aggregator(target) {
                        return Err(TranslationError::Unsupported("nested aggregates"));
                    }
                }

                generators.push(Generator::Aggregate {
                    level,
                    aggregate: (**aggregate).clone(),
                });
                Ok(())
            }
            Term::Functor { args, .. } | Term::Record(args) => {
                for arg in args {
                    self.discover_aggregates(arg, index, next_level, generators)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Conditions induced by the argument positions of one binder: a scan
    /// level or an unpacked record.
    fn binder_conditions(
        &mut self,
        terms: &[Term],
        level: TupleId,
        index: &ValueIndex,
        conditions: &mut Vec<(Option<TupleId>, Condition)>,
    ) -> Result<(), TranslationError> {
        for (column, term) in terms.iter().enumerate() {
            let location = Location::new(level, column);
            match term {
                Term::Variable(name) => {
                    let definition = index.definition(name)?;
                    let here = Location::named(level, column, name);
                    if here != *definition {
                        let condition = equals(definition.access(), here.access());
                        conditions.push((condition_level(&condition), condition));
                    }
                }
                Term::UnnamedVariable => {}
                Term::NumberConstant(value) => {
                    let condition = equals(location.access(), Value::Number(*value));
                    conditions.push((Some(level), condition));
                }
                Term::StringConstant(symbol) => {
                    let condition =
                        equals(location.access(), Value::Number(self.symbols.intern(symbol)));
                    conditions.push((Some(level), condition));
                }
                Term::Record(components) => {
                    let (_, unpack) = index.record(term)?.clone();
                    self.binder_conditions(components, unpack, index, conditions)?;
                }
                other => {
                    let value = self.translate_term(other, index)?;
                    let condition = equals(location.access(), value);
                    conditions.push((condition_level(&condition), condition));
                }
            }
        }
        Ok(())
    }

    /// Rebuild a discovered generator with its values translated against
    /// the completed index.
    fn build_generator(
        &mut self,
        generator: Generator,
        index: &ValueIndex,
    ) -> Result<BuiltGenerator, TranslationError> {
        match generator {
            Generator::Unpack {
                level,
                reference,
                arity,
            } => Ok(BuiltGenerator::Unpack {
                level,
                reference: reference.access(),
                arity,
            }),
            Generator::Aggregate { level, aggregate } => {
                let source = aggregate_source(&aggregate)?;
                let relation = self.relation(&source.relation)?.clone();
                if source.terms.len() != relation.arity() {
                    return Err(TranslationError::AtomArity {
                        relation: relation.name().to_owned(),
                        expected: relation.arity(),
                        found: source.terms.len(),
                    });
                }

                let mut pattern = Vec::with_capacity(source.terms.len());
                for (column, argument) in source.terms.iter().enumerate() {
                    let slot = match argument {
                        Term::UnnamedVariable => None,
                        Term::Variable(name) => {
                            let definition = index.definition(name)?;
                            if definition.level == level && definition.column == column {
                                // Bound by this aggregate's own scan.
                                None
                            } else if definition.level == level {
                                return Err(TranslationError::Unsupported(
                                    "repeated variables in aggregate patterns",
                                ));
                            } else {
                                Some(definition.access())
                            }
                        }
                        Term::NumberConstant(value) => Some(Value::Number(*value)),
                        Term::StringConstant(symbol) => {
                            Some(Value::Number(self.symbols.intern(symbol)))
                        }
                        _ => {
                            return Err(TranslationError::Unsupported(
                                "complex terms in aggregate patterns",
                            ))
                        }
                    };
                    pattern.push(slot);
                }

                use stratalog_ram::operator::AggregateFunction;
                let value = match (aggregate.function, &aggregate.target) {
                    (AggregateFunction::Count, _) => None,
                    (_, Some(target)) => Some(self.translate_term(target, index)?),
                    (_, None) => {
                        return Err(TranslationError::Unsupported(
                            "aggregate without a target expression",
                        ))
                    }
                };

                Ok(BuiltGenerator::Aggregate {
                    level,
                    function: aggregate.function,
                    value,
                    relation,
                    pattern,
                })
            }
        }
    }

    /// Translate a negation pattern; unnamed variables become wildcards.
    fn translate_pattern(
        &mut self,
        terms: &[Term],
        index: &ValueIndex,
    ) -> Result<Vec<Option<Value>>, TranslationError> {
        terms
            .iter()
            .map(|term| match term {
                Term::UnnamedVariable => Ok(None),
                other => self.translate_term(other, index).map(Some),
            })
            .collect()
    }

    /// Translate a term in value position.
    pub(crate) fn translate_term(
        &mut self,
        term: &Term,
        index: &ValueIndex,
    ) -> Result<Value, TranslationError> {
        match term {
            Term::Variable(name) => Ok(index.definition(name)?.access()),
            Term::UnnamedVariable => Err(TranslationError::Unsupported(
                "unnamed variable in value position",
            )),
            Term::NumberConstant(value) => Ok(Value::Number(*value)),
            Term::StringConstant(symbol) => Ok(Value::Number(self.symbols.intern(symbol))),
            Term::Functor { op, args } => {
                if args.len() != op.arity() {
                    return Err(TranslationError::OperatorArity {
                        op: op.symbol().to_owned(),
                        expected: op.arity(),
                        found: args.len(),
                    });
                }
                let args = args
                    .iter()
                    .map(|arg| self.translate_term(arg, index))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Intrinsic { op: *op, args })
            }
            Term::Record(args) => {
                let args = args
                    .iter()
                    .map(|arg| match arg {
                        Term::UnnamedVariable => Ok(None),
                        other => self.translate_term(other, index).map(Some),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Pack { args })
            }
            Term::Aggregator(_) => Ok(index.aggregate(term)?.access()),
            Term::SubroutineArgument(number) => Ok(Value::Argument(*number)),
            Term::Counter => Ok(Value::AutoIncrement),
        }
    }
}

/// The single positive atom an aggregate ranges over.
fn aggregate_source(aggregate: &Aggregate) -> Result<&Atom, TranslationError> {
    match aggregate.body.as_slice() {
        [Literal::Atom(atom)] => Ok(atom),
        _ => Err(TranslationError::Unsupported(
            "aggregate bodies must consist of a single positive atom",
        )),
    }
}

fn contains_aggregator(term: &Term) -> bool {
    match term {
        Term::Aggregator(_) => true,
        Term::Functor { args, .. } | Term::Record(args) => args.iter().any(contains_aggregator),
        _ => false,
    }
}
