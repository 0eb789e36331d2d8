//! This module defines [Condition], the boolean expressions guarding loop
//! nests.

use std::fmt::{self, Display};

use crate::{
    node::NodeMapper,
    operator::ComparisonOp,
    relation::Relation,
    value::{PatternDisplay, Value},
    TupleId,
};

/// A boolean expression over [Value]s.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Condition {
    /// Conjunction of two conditions. The tree shape carries no
    /// short-circuit ordering guarantee.
    Conjunction(Box<Condition>, Box<Condition>),
    /// Binary comparison of two values.
    Comparison {
        /// The comparison operator.
        op: ComparisonOp,
        /// Left comparand.
        lhs: Value,
        /// Right comparand.
        rhs: Value,
    },
    /// True iff some tuple of `relation` matches every concrete slot of
    /// `pattern`. The pattern length equals the relation arity.
    ExistenceCheck {
        /// The checked relation.
        relation: Relation,
        /// One slot per column; `None` slots are unconstrained.
        pattern: Vec<Option<Value>>,
    },
    /// Negation of [Condition::ExistenceCheck].
    NotExistenceCheck {
        /// The checked relation.
        relation: Relation,
        /// One slot per column; `None` slots are unconstrained.
        pattern: Vec<Option<Value>>,
    },
    /// True iff `relation` holds no tuples.
    Empty(Relation),
}

impl Condition {
    /// Conjoin two conditions.
    pub fn and(self, other: Condition) -> Condition {
        Condition::Conjunction(Box::new(self), Box::new(other))
    }

    /// Fold a sequence of conjuncts back into a left-leaning conjunction
    /// tree; `None` if the sequence is empty.
    pub fn fold(conjuncts: impl IntoIterator<Item = Condition>) -> Option<Condition> {
        conjuncts.into_iter().reduce(Condition::and)
    }

    /// Split a condition into its top-level conjuncts, left to right.
    pub fn conjuncts(self) -> Vec<Condition> {
        match self {
            Condition::Conjunction(lhs, rhs) => {
                let mut conjuncts = lhs.conjuncts();
                conjuncts.extend(rhs.conjuncts());
                conjuncts
            }
            other => vec![other],
        }
    }

    /// Direct value children in a stable order.
    pub fn values(&self) -> Vec<&Value> {
        match self {
            Condition::Conjunction(_, _) | Condition::Empty(_) => Vec::new(),
            Condition::Comparison { lhs, rhs, .. } => vec![lhs, rhs],
            Condition::ExistenceCheck { pattern, .. }
            | Condition::NotExistenceCheck { pattern, .. } => pattern.iter().flatten().collect(),
        }
    }

    /// Direct condition children.
    pub fn children(&self) -> Vec<&Condition> {
        match self {
            Condition::Conjunction(lhs, rhs) => vec![lhs, rhs],
            _ => Vec::new(),
        }
    }

    /// Pass each owned child through `mapper`, storing the result back.
    pub fn apply<M: NodeMapper + ?Sized>(self, mapper: &mut M) -> Self {
        match self {
            Condition::Conjunction(lhs, rhs) => Condition::Conjunction(
                Box::new(mapper.map_condition(*lhs)),
                Box::new(mapper.map_condition(*rhs)),
            ),
            Condition::Comparison { op, lhs, rhs } => Condition::Comparison {
                op,
                lhs: mapper.map_value(lhs),
                rhs: mapper.map_value(rhs),
            },
            Condition::ExistenceCheck { relation, pattern } => Condition::ExistenceCheck {
                relation,
                pattern: map_pattern(pattern, mapper),
            },
            Condition::NotExistenceCheck { relation, pattern } => Condition::NotExistenceCheck {
                relation,
                pattern: map_pattern(pattern, mapper),
            },
            empty @ Condition::Empty(_) => empty,
        }
    }

    /// Whether any value below the condition reads the tuple bound to
    /// `level`.
    pub fn references_level(&self, level: TupleId) -> bool {
        self.values().iter().any(|v| v.references_level(level))
            || self.children().iter().any(|c| c.references_level(level))
    }
}

pub(crate) fn map_pattern<M: NodeMapper + ?Sized>(
    pattern: Vec<Option<Value>>,
    mapper: &mut M,
) -> Vec<Option<Value>> {
    pattern
        .into_iter()
        .map(|slot| slot.map(|value| mapper.map_value(value)))
        .collect()
}

impl Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Conjunction(lhs, rhs) => write!(f, "{lhs} and {rhs}"),
            Condition::Comparison { op, lhs, rhs } => write!(f, "{lhs} {op} {rhs}"),
            Condition::ExistenceCheck { relation, pattern } => {
                write!(f, "{} ∈ {}", PatternDisplay(pattern), relation.name())
            }
            Condition::NotExistenceCheck { relation, pattern } => {
                write!(f, "{} ∉ {}", PatternDisplay(pattern), relation.name())
            }
            Condition::Empty(relation) => write!(f, "({} = ∅)", relation.name()),
        }
    }
}

/// Shorthand for an equality comparison.
pub fn equals(lhs: Value, rhs: Value) -> Condition {
    Condition::Comparison {
        op: ComparisonOp::Equal,
        lhs,
        rhs,
    }
}

#[cfg(test)]
mod test {
    use crate::operator::ComparisonOp;
    use crate::relation::{Attribute, AttributeKind, Relation};
    use crate::value::{access, Value};

    use super::{equals, Condition};

    fn rel() -> Relation {
        Relation::new(
            "edge",
            vec![
                Attribute::new("x", AttributeKind::Number),
                Attribute::new("y", AttributeKind::Number),
            ],
        )
    }

    #[test]
    fn split_and_fold_round_trip() {
        let a = equals(access(0, 0), Value::Number(1));
        let b = Condition::Comparison {
            op: ComparisonOp::Greater,
            lhs: access(1, 0),
            rhs: Value::Number(10),
        };
        let c = Condition::Empty(rel());

        let folded = Condition::fold([a.clone(), b.clone(), c.clone()]).expect("non-empty");
        assert_eq!(folded.clone().conjuncts(), vec![a, b, c]);
        assert_eq!(
            Condition::fold(folded.clone().conjuncts()).expect("non-empty"),
            folded
        );
    }

    #[test]
    fn display_infix() {
        let cond = equals(access(0, 1), access(1, 0));
        assert_eq!(cond.to_string(), "env(t0, i1) = env(t1, i0)");

        let exists = Condition::ExistenceCheck {
            relation: rel(),
            pattern: vec![Some(access(0, 0)), None],
        };
        assert_eq!(exists.to_string(), "(env(t0, i0),_) ∈ edge");
    }

    #[test]
    fn level_references() {
        let cond = equals(access(0, 1), access(1, 0)).and(Condition::Empty(rel()));
        assert!(cond.references_level(1));
        assert!(!cond.references_level(2));
    }
}
