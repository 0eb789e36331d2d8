//! This module defines the operator vocabulary of the machine: intrinsic
//! functors, comparison operators and aggregate functions.
#![allow(missing_docs)]

use std::fmt::{self, Display};

use enum_assoc::Assoc;
use strum_macros::EnumIter;

/// Built-in n-ary operators usable inside [`Value::Intrinsic`][crate::value::Value].
#[derive(Assoc, EnumIter, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[func(pub fn symbol(&self) -> &'static str)]
#[func(pub fn arity(&self) -> usize)]
pub enum IntrinsicOp {
    /// Ordinal number of a string
    #[assoc(symbol = "ord")]
    #[assoc(arity = 1)]
    Ord,
    /// Length of a string
    #[assoc(symbol = "strlen")]
    #[assoc(arity = 1)]
    Strlen,
    /// Numeric negation
    #[assoc(symbol = "-")]
    #[assoc(arity = 1)]
    Neg,
    /// Bitwise negation
    #[assoc(symbol = "bnot")]
    #[assoc(arity = 1)]
    Bnot,
    /// Logical negation
    #[assoc(symbol = "lnot")]
    #[assoc(arity = 1)]
    Lnot,
    /// Addition
    #[assoc(symbol = "+")]
    #[assoc(arity = 2)]
    Add,
    /// Subtraction
    #[assoc(symbol = "-")]
    #[assoc(arity = 2)]
    Sub,
    /// Multiplication
    #[assoc(symbol = "*")]
    #[assoc(arity = 2)]
    Mul,
    /// Division
    #[assoc(symbol = "/")]
    #[assoc(arity = 2)]
    Div,
    /// Exponentiation
    #[assoc(symbol = "^")]
    #[assoc(arity = 2)]
    Exp,
    /// Modulus
    #[assoc(symbol = "%")]
    #[assoc(arity = 2)]
    Mod,
    /// Bitwise and
    #[assoc(symbol = "band")]
    #[assoc(arity = 2)]
    Band,
    /// Bitwise or
    #[assoc(symbol = "bor")]
    #[assoc(arity = 2)]
    Bor,
    /// Bitwise exclusive or
    #[assoc(symbol = "bxor")]
    #[assoc(arity = 2)]
    Bxor,
    /// Logical and
    #[assoc(symbol = "land")]
    #[assoc(arity = 2)]
    Land,
    /// Logical or
    #[assoc(symbol = "lor")]
    #[assoc(arity = 2)]
    Lor,
    /// Maximum of two numbers
    #[assoc(symbol = "max")]
    #[assoc(arity = 2)]
    Max,
    /// Minimum of two numbers
    #[assoc(symbol = "min")]
    #[assoc(arity = 2)]
    Min,
    /// String concatenation
    #[assoc(symbol = "cat")]
    #[assoc(arity = 2)]
    Cat,
    /// Substring extraction
    #[assoc(symbol = "substr")]
    #[assoc(arity = 3)]
    Substr,
}

impl Display for IntrinsicOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Binary comparison operators over domain numbers.
#[derive(Assoc, EnumIter, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[func(pub fn symbol(&self) -> &'static str)]
pub enum ComparisonOp {
    #[assoc(symbol = "=")]
    Equal,
    #[assoc(symbol = "!=")]
    NotEqual,
    #[assoc(symbol = "<")]
    Less,
    #[assoc(symbol = "<=")]
    LessEqual,
    #[assoc(symbol = ">")]
    Greater,
    #[assoc(symbol = ">=")]
    GreaterEqual,
}

impl Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Aggregation functions supported by [`Operation::Aggregate`][crate::operation::Operation].
#[derive(Assoc, EnumIter, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[func(pub fn keyword(&self) -> &'static str)]
pub enum AggregateFunction {
    #[assoc(keyword = "MIN")]
    Min,
    #[assoc(keyword = "MAX")]
    Max,
    #[assoc(keyword = "COUNT")]
    Count,
    #[assoc(keyword = "SUM")]
    Sum,
}

impl Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[cfg(test)]
mod test {
    use strum::IntoEnumIterator;

    use super::IntrinsicOp;

    #[test]
    fn arities_are_sane() {
        for op in IntrinsicOp::iter() {
            assert!((1..=3).contains(&op.arity()), "{op:?}");
            assert!(!op.symbol().is_empty());
        }
    }
}
