//! This module defines [Value], the pure expressions evaluated inside a
//! loop nest.

use std::fmt::{self, Display};

use itertools::Itertools;

use crate::{node::NodeMapper, operator::IntrinsicOp, Domain, TupleId};

/// A pure expression evaluated in the tuple environment of a loop nest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// A constant of the machine domain.
    Number(Domain),
    /// Column `column` of the tuple bound to `level` by an enclosing search.
    ElementAccess {
        /// Identifier of the loop that bound the tuple.
        level: TupleId,
        /// Column within the tuple.
        column: usize,
        /// Source-level attribute name, if one is known.
        name: Option<String>,
    },
    /// An n-ary built-in operator applied to argument values.
    Intrinsic {
        /// The operator.
        op: IntrinsicOp,
        /// Argument values; the length matches the operator arity.
        args: Vec<Value>,
    },
    /// Record construction; `None` slots are unnamed fields.
    Pack {
        /// Component values of the record.
        args: Vec<Option<Value>>,
    },
    /// Reference to a subroutine parameter (provenance subproofs only).
    Argument(usize),
    /// A monotonically increasing counter.
    AutoIncrement,
}

impl Value {
    /// Direct child values in a stable order.
    pub fn children(&self) -> Vec<&Value> {
        match self {
            Value::Number(_) | Value::ElementAccess { .. } | Value::Argument(_) => Vec::new(),
            Value::AutoIncrement => Vec::new(),
            Value::Intrinsic { args, .. } => args.iter().collect(),
            Value::Pack { args } => args.iter().flatten().collect(),
        }
    }

    /// Pass each owned child through `mapper`, storing the result back.
    pub fn apply<M: NodeMapper + ?Sized>(self, mapper: &mut M) -> Self {
        match self {
            leaf @ (Value::Number(_)
            | Value::ElementAccess { .. }
            | Value::Argument(_)
            | Value::AutoIncrement) => leaf,
            Value::Intrinsic { op, args } => Value::Intrinsic {
                op,
                args: args.into_iter().map(|arg| mapper.map_value(arg)).collect(),
            },
            Value::Pack { args } => Value::Pack {
                args: args
                    .into_iter()
                    .map(|arg| arg.map(|value| mapper.map_value(value)))
                    .collect(),
            },
        }
    }

    /// Whether the value or any descendant reads the tuple bound to `level`.
    pub fn references_level(&self, level: TupleId) -> bool {
        match self {
            Value::ElementAccess { level: own, .. } => *own == level,
            other => other.children().iter().any(|v| v.references_level(level)),
        }
    }
}

/// Prints a search pattern as `(v, _, w)`, spelling wildcard slots `_`.
pub(crate) struct PatternDisplay<'a>(pub &'a [Option<Value>]);

impl Display for PatternDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({})",
            self.0
                .iter()
                .format_with(",", |slot, g| match slot {
                    Some(value) => g(value),
                    None => g(&"_"),
                })
        )
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(constant) => write!(f, "number({constant})"),
            Value::ElementAccess {
                level,
                column,
                name,
            } => match name {
                Some(name) => write!(f, "t{level}.{name}"),
                None => write!(f, "env(t{level}, i{column})"),
            },
            Value::Intrinsic { op, args } => {
                write!(f, "{}({})", op.symbol(), args.iter().format(","))
            }
            Value::Pack { args } => write!(
                f,
                "[{}]",
                args.iter().format_with(",", |slot, g| match slot {
                    Some(value) => g(value),
                    None => g(&"_"),
                })
            ),
            Value::Argument(number) => write!(f, "arg({number})"),
            Value::AutoIncrement => f.write_str("autoinc()"),
        }
    }
}

/// Shorthand for an unnamed [`Value::ElementAccess`].
pub fn access(level: TupleId, column: usize) -> Value {
    Value::ElementAccess {
        level,
        column,
        name: None,
    }
}

#[cfg(test)]
pub(crate) mod test {
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    use crate::node::{Identity, NodeMapper};
    use crate::operator::IntrinsicOp;

    use super::{access, Value};

    impl Arbitrary for Value {
        fn arbitrary(g: &mut Gen) -> Self {
            // Bias towards leaves so generated trees stay small.
            match u8::arbitrary(g) % 8 {
                0 | 1 | 2 => Value::Number(i64::arbitrary(g) % 1000),
                3 | 4 => access(usize::arbitrary(g) % 4, usize::arbitrary(g) % 4),
                5 => Value::Argument(usize::arbitrary(g) % 4),
                6 => Value::Intrinsic {
                    op: *g
                        .choose(&[IntrinsicOp::Add, IntrinsicOp::Neg, IntrinsicOp::Cat])
                        .expect("choices are non-empty"),
                    args: vec![Value::arbitrary(g), Value::arbitrary(g)],
                },
                _ => Value::Pack {
                    args: vec![None, Some(Value::arbitrary(g))],
                },
            }
        }
    }

    #[quickcheck]
    fn clone_is_structurally_equal(value: Value) -> bool {
        value.clone() == value
    }

    #[quickcheck]
    fn identity_mapper_preserves_structure(value: Value) -> bool {
        let copy = value.clone();
        Identity.map_value(value) == copy
    }

    #[test]
    fn display_forms() {
        assert_eq!(Value::Number(42).to_string(), "number(42)");
        assert_eq!(access(0, 2).to_string(), "env(t0, i2)");
        let sum = Value::Intrinsic {
            op: IntrinsicOp::Add,
            args: vec![access(0, 0), Value::Number(1)],
        };
        assert_eq!(sum.to_string(), "+(env(t0, i0),number(1))");
        let record = Value::Pack {
            args: vec![Some(access(1, 0)), None],
        };
        assert_eq!(record.to_string(), "[env(t1, i0),_]");
    }

    #[test]
    fn level_references() {
        let sum = Value::Intrinsic {
            op: IntrinsicOp::Add,
            args: vec![access(2, 0), Value::Number(1)],
        };
        assert!(sum.references_level(2));
        assert!(!sum.references_level(0));
    }
}
