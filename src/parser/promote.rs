//! Binary and unary operator type tables
//!
//! The promotion table is process-wide read-only state, keyed by
//! `(category, left, right)` and built once at startup. Combinations absent
//! from the table are parse-time type errors, never runtime failures.
//!
//! Arithmetic deliberately does not widen equal operand kinds: `Byte add
//! Byte` stays `Edm.Byte` even though it may truncate, because v2 clients
//! depend on the exact echoed type. Mixed kinds take the higher rank of the
//! numeric tower.

use crate::ast::{OperatorCategory, UnaryOperator};
use crate::edm::EdmSimpleType;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::edm::EdmSimpleType::{
    Binary, Boolean, Byte, DateTime, DateTimeOffset, Decimal, Double, Guid, Int16, Int32, Int64,
    Null, SByte, Single, String, Time,
};

const NUMERICS: [EdmSimpleType; 8] = [SByte, Byte, Int16, Int32, Int64, Single, Double, Decimal];

const EQUALITY_KINDS: [EdmSimpleType; 15] = [
    Binary,
    Boolean,
    Byte,
    DateTime,
    DateTimeOffset,
    Decimal,
    Double,
    Guid,
    Int16,
    Int32,
    Int64,
    SByte,
    Single,
    String,
    Time,
];

const ORDERED_NON_NUMERIC: [EdmSimpleType; 4] = [String, DateTime, DateTimeOffset, Time];

type Key = (OperatorCategory, EdmSimpleType, EdmSimpleType);

/// The `(category, left, right) -> result` table.
static PROMOTION_TABLE: Lazy<FxHashMap<Key, EdmSimpleType>> = Lazy::new(|| {
    let mut map = FxHashMap::default();

    map.insert((OperatorCategory::Logical, Boolean, Boolean), Boolean);

    for kind in EQUALITY_KINDS {
        map.insert((OperatorCategory::Equality, kind, kind), Boolean);
        map.insert((OperatorCategory::Equality, kind, Null), Boolean);
        map.insert((OperatorCategory::Equality, Null, kind), Boolean);
    }
    map.insert((OperatorCategory::Equality, Null, Null), Boolean);

    for left in NUMERICS {
        for right in NUMERICS {
            map.insert((OperatorCategory::Equality, left, right), Boolean);
            map.insert((OperatorCategory::Relational, left, right), Boolean);

            // Equal kinds keep their kind; mixed kinds take the higher rank.
            let result = if left.numeric_rank() >= right.numeric_rank() {
                left
            } else {
                right
            };
            map.insert((OperatorCategory::Arithmetic, left, right), result);
        }
    }

    for kind in ORDERED_NON_NUMERIC {
        map.insert((OperatorCategory::Relational, kind, kind), Boolean);
    }

    map
});

/// Result type of a binary operator over the given operand kinds, or `None`
/// when the combination is not registered.
pub fn binary_result(
    category: OperatorCategory,
    left: EdmSimpleType,
    right: EdmSimpleType,
) -> Option<EdmSimpleType> {
    PROMOTION_TABLE.get(&(category, left, right)).copied()
}

/// Result type of a unary operator, or `None` when undefined: `not` needs
/// Boolean, `-` needs a numeric and keeps its kind.
pub fn unary_result(operator: UnaryOperator, operand: EdmSimpleType) -> Option<EdmSimpleType> {
    match operator {
        UnaryOperator::Not => (operand == Boolean).then_some(Boolean),
        UnaryOperator::Minus => operand.is_numeric().then_some(operand),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_add_byte_stays_byte() {
        assert_eq!(
            binary_result(OperatorCategory::Arithmetic, Byte, Byte),
            Some(Byte)
        );
    }

    #[test]
    fn mixed_arithmetic_takes_the_higher_rank() {
        assert_eq!(
            binary_result(OperatorCategory::Arithmetic, Int32, Int64),
            Some(Int64)
        );
        assert_eq!(
            binary_result(OperatorCategory::Arithmetic, Decimal, Double),
            Some(Decimal)
        );
        assert_eq!(
            binary_result(OperatorCategory::Arithmetic, Byte, Single),
            Some(Single)
        );
    }

    #[test]
    fn comparisons_yield_boolean() {
        assert_eq!(
            binary_result(OperatorCategory::Relational, Int32, Decimal),
            Some(Boolean)
        );
        assert_eq!(
            binary_result(OperatorCategory::Equality, String, String),
            Some(Boolean)
        );
        assert_eq!(
            binary_result(OperatorCategory::Equality, String, Null),
            Some(Boolean)
        );
    }

    #[test]
    fn unregistered_combinations_are_absent() {
        assert_eq!(
            binary_result(OperatorCategory::Arithmetic, String, String),
            None
        );
        assert_eq!(
            binary_result(OperatorCategory::Relational, Boolean, Boolean),
            None
        );
        assert_eq!(
            binary_result(OperatorCategory::Logical, String, String),
            None
        );
        assert_eq!(
            binary_result(OperatorCategory::Relational, String, Null),
            None
        );
    }

    #[test]
    fn unary_table() {
        assert_eq!(
            unary_result(UnaryOperator::Not, Boolean),
            Some(Boolean)
        );
        assert_eq!(unary_result(UnaryOperator::Not, Int32), None);
        assert_eq!(unary_result(UnaryOperator::Minus, Int32), Some(Int32));
        assert_eq!(unary_result(UnaryOperator::Minus, String), None);
    }
}
