//! Nesting-level analysis for values and conditions.

use crate::{condition::Condition, value::Value, TupleId};

/// The deepest tuple identifier referenced inside `value`, or `None` if
/// the value is tuple-free. A value is computable at any loop level at or
/// below its result.
pub fn value_level(value: &Value) -> Option<TupleId> {
    match value {
        Value::ElementAccess { level, .. } => Some(*level),
        other => other
            .children()
            .into_iter()
            .filter_map(value_level)
            .max(),
    }
}

/// The deepest tuple identifier `condition` depends on, over all
/// comparands and existence patterns. A condition can be placed
/// immediately inside the search that introduces this identifier.
pub fn condition_level(condition: &Condition) -> Option<TupleId> {
    let own = condition.values().into_iter().filter_map(value_level).max();
    let nested = condition
        .children()
        .into_iter()
        .filter_map(condition_level)
        .max();
    own.max(nested)
}

#[cfg(test)]
mod test {
    use quickcheck_macros::quickcheck;

    use crate::condition::equals;
    use crate::operator::IntrinsicOp;
    use crate::value::{access, Value};

    use super::{condition_level, value_level};

    #[test]
    fn deepest_access_wins() {
        let value = Value::Intrinsic {
            op: IntrinsicOp::Add,
            args: vec![access(0, 0), access(3, 1)],
        };
        assert_eq!(value_level(&value), Some(3));
        assert_eq!(value_level(&Value::Number(5)), None);
    }

    #[test]
    fn condition_takes_max_over_comparands() {
        let condition = equals(access(1, 0), access(2, 1)).and(equals(access(0, 0), access(0, 1)));
        assert_eq!(condition_level(&condition), Some(2));
    }

    // A value occurring in a condition never exceeds the condition's level.
    #[quickcheck]
    fn monotone_in_comparands(lhs: Value, rhs: Value) -> bool {
        let condition = equals(lhs.clone(), rhs.clone());
        let level = condition_level(&condition);
        value_level(&lhs) <= level && value_level(&rhs) <= level
    }
}
