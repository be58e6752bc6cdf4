//! Built-in method signatures
//!
//! Process-wide read-only table, built once at startup. Each entry fixes the
//! arity range, the per-parameter type constraints, and how the result type
//! is derived. Parameter checking allows implicit numeric promotion and
//! nothing else.

use crate::ast::MethodOperator;
use crate::edm::EdmSimpleType;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

/// Constraint one method parameter places on its argument's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeConstraint {
    /// `Edm.String`.
    Text,
    /// An integral numeric type, promotable to `Edm.Int32`.
    Integral,
    /// Any numeric type.
    Numeric,
    /// `Edm.DateTime` or `Edm.DateTimeOffset`.
    Date,
    /// `Edm.DateTime`, `Edm.DateTimeOffset` or `Edm.Time`.
    Clock,
    /// A string literal naming an EDM type (`isof`/`cast`).
    TypeName,
}

impl TypeConstraint {
    /// Whether an argument of `kind` satisfies this constraint.
    pub fn accepts(&self, kind: EdmSimpleType) -> bool {
        match self {
            TypeConstraint::Text | TypeConstraint::TypeName => kind == EdmSimpleType::String,
            TypeConstraint::Integral => kind.is_promotable_to(EdmSimpleType::Int32),
            TypeConstraint::Numeric => kind.is_numeric(),
            TypeConstraint::Date => {
                matches!(kind, EdmSimpleType::DateTime | EdmSimpleType::DateTimeOffset)
            }
            TypeConstraint::Clock => matches!(
                kind,
                EdmSimpleType::DateTime | EdmSimpleType::DateTimeOffset | EdmSimpleType::Time
            ),
        }
    }

    /// Human description for parameter-type diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            TypeConstraint::Text => "Edm.String",
            TypeConstraint::Integral => "an integral numeric type",
            TypeConstraint::Numeric => "a numeric type",
            TypeConstraint::Date => "Edm.DateTime or Edm.DateTimeOffset",
            TypeConstraint::Clock => "Edm.DateTime, Edm.DateTimeOffset or Edm.Time",
            TypeConstraint::TypeName => "a type name string",
        }
    }
}

/// How a method's result type is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultRule {
    /// Always the given kind.
    Fixed(EdmSimpleType),
    /// Decimal input stays Decimal, everything else becomes Double
    /// (`round`/`floor`/`ceiling`).
    FractionalOfFirst,
    /// The type named by the trailing type-name argument (`cast`).
    CastTarget,
}

/// One entry of the method table.
#[derive(Debug, Clone)]
pub struct MethodSignature {
    /// The method identifier.
    pub method: MethodOperator,
    /// Minimum parameter count.
    pub min_arity: usize,
    /// Maximum parameter count, `None` for variadic (`concat`).
    pub max_arity: Option<usize>,
    /// Per-parameter constraints; extra variadic parameters repeat the
    /// last constraint.
    pub parameters: &'static [TypeConstraint],
    /// Result type derivation.
    pub result: ResultRule,
}

impl MethodSignature {
    /// The constraint applying to the parameter at `index`.
    pub fn constraint(&self, index: usize) -> TypeConstraint {
        let clamped = index.min(self.parameters.len().saturating_sub(1));
        self.parameters[clamped]
    }

    /// Whether `count` parameters satisfy the arity range.
    pub fn accepts_arity(&self, count: usize) -> bool {
        count >= self.min_arity && self.max_arity.is_none_or(|max| count <= max)
    }

    /// Human description of the arity range ("2", "2 to 3", "at least 2").
    pub fn describe_arity(&self) -> String {
        match self.max_arity {
            Some(max) if max == self.min_arity => format!("{max}"),
            Some(max) => format!("{} to {max}", self.min_arity),
            None => format!("at least {}", self.min_arity),
        }
    }
}

const TEXT: TypeConstraint = TypeConstraint::Text;
const INTEGRAL: TypeConstraint = TypeConstraint::Integral;
const NUMERIC: TypeConstraint = TypeConstraint::Numeric;
const DATE: TypeConstraint = TypeConstraint::Date;
const CLOCK: TypeConstraint = TypeConstraint::Clock;
const TYPE_NAME: TypeConstraint = TypeConstraint::TypeName;

/// The static method table, keyed by the name as written in URIs.
pub static METHOD_TABLE: Lazy<FxHashMap<&'static str, MethodSignature>> = Lazy::new(|| {
    use EdmSimpleType::{Boolean, Int32, String};
    use MethodOperator::*;
    use ResultRule::{CastTarget, Fixed, FractionalOfFirst};

    let entries = [
        MethodSignature {
            method: SubstringOf,
            min_arity: 2,
            max_arity: Some(2),
            parameters: &[TEXT, TEXT],
            result: Fixed(Boolean),
        },
        MethodSignature {
            method: EndsWith,
            min_arity: 2,
            max_arity: Some(2),
            parameters: &[TEXT, TEXT],
            result: Fixed(Boolean),
        },
        MethodSignature {
            method: StartsWith,
            min_arity: 2,
            max_arity: Some(2),
            parameters: &[TEXT, TEXT],
            result: Fixed(Boolean),
        },
        MethodSignature {
            method: Length,
            min_arity: 1,
            max_arity: Some(1),
            parameters: &[TEXT],
            result: Fixed(Int32),
        },
        MethodSignature {
            method: IndexOf,
            min_arity: 2,
            max_arity: Some(2),
            parameters: &[TEXT, TEXT],
            result: Fixed(Int32),
        },
        MethodSignature {
            method: Replace,
            min_arity: 3,
            max_arity: Some(3),
            parameters: &[TEXT, TEXT, TEXT],
            result: Fixed(String),
        },
        MethodSignature {
            method: Substring,
            min_arity: 2,
            max_arity: Some(3),
            parameters: &[TEXT, INTEGRAL, INTEGRAL],
            result: Fixed(String),
        },
        MethodSignature {
            method: ToLower,
            min_arity: 1,
            max_arity: Some(1),
            parameters: &[TEXT],
            result: Fixed(String),
        },
        MethodSignature {
            method: ToUpper,
            min_arity: 1,
            max_arity: Some(1),
            parameters: &[TEXT],
            result: Fixed(String),
        },
        MethodSignature {
            method: Trim,
            min_arity: 1,
            max_arity: Some(1),
            parameters: &[TEXT],
            result: Fixed(String),
        },
        MethodSignature {
            method: Concat,
            min_arity: 2,
            max_arity: None,
            parameters: &[TEXT, TEXT],
            result: Fixed(String),
        },
        MethodSignature {
            method: Year,
            min_arity: 1,
            max_arity: Some(1),
            parameters: &[DATE],
            result: Fixed(Int32),
        },
        MethodSignature {
            method: Month,
            min_arity: 1,
            max_arity: Some(1),
            parameters: &[DATE],
            result: Fixed(Int32),
        },
        MethodSignature {
            method: Day,
            min_arity: 1,
            max_arity: Some(1),
            parameters: &[DATE],
            result: Fixed(Int32),
        },
        MethodSignature {
            method: Hour,
            min_arity: 1,
            max_arity: Some(1),
            parameters: &[CLOCK],
            result: Fixed(Int32),
        },
        MethodSignature {
            method: Minute,
            min_arity: 1,
            max_arity: Some(1),
            parameters: &[CLOCK],
            result: Fixed(Int32),
        },
        MethodSignature {
            method: Second,
            min_arity: 1,
            max_arity: Some(1),
            parameters: &[CLOCK],
            result: Fixed(Int32),
        },
        MethodSignature {
            method: Round,
            min_arity: 1,
            max_arity: Some(1),
            parameters: &[NUMERIC],
            result: FractionalOfFirst,
        },
        MethodSignature {
            method: Floor,
            min_arity: 1,
            max_arity: Some(1),
            parameters: &[NUMERIC],
            result: FractionalOfFirst,
        },
        MethodSignature {
            method: Ceiling,
            min_arity: 1,
            max_arity: Some(1),
            parameters: &[NUMERIC],
            result: FractionalOfFirst,
        },
        MethodSignature {
            method: IsOf,
            min_arity: 1,
            max_arity: Some(2),
            parameters: &[TYPE_NAME],
            result: Fixed(Boolean),
        },
        MethodSignature {
            method: Cast,
            min_arity: 1,
            max_arity: Some(2),
            parameters: &[TYPE_NAME],
            result: CastTarget,
        },
    ];

    let mut map = FxHashMap::default();
    for entry in entries {
        map.insert(entry.method.as_str(), entry);
    }
    map
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_the_v2_method_set() {
        for name in [
            "substringof",
            "endswith",
            "startswith",
            "length",
            "indexof",
            "replace",
            "substring",
            "tolower",
            "toupper",
            "trim",
            "concat",
            "year",
            "month",
            "day",
            "hour",
            "minute",
            "second",
            "round",
            "floor",
            "ceiling",
            "isof",
            "cast",
        ] {
            assert!(METHOD_TABLE.contains_key(name), "missing {name}");
        }
        assert!(!METHOD_TABLE.contains_key("exists"));
    }

    #[test]
    fn substring_arity_range() {
        let sig = &METHOD_TABLE["substring"];
        assert!(!sig.accepts_arity(1));
        assert!(sig.accepts_arity(2));
        assert!(sig.accepts_arity(3));
        assert!(!sig.accepts_arity(4));
        assert_eq!(sig.describe_arity(), "2 to 3");
    }

    #[test]
    fn integral_constraint_allows_promotion() {
        assert!(TypeConstraint::Integral.accepts(EdmSimpleType::Byte));
        assert!(TypeConstraint::Integral.accepts(EdmSimpleType::Int32));
        assert!(!TypeConstraint::Integral.accepts(EdmSimpleType::Int64));
        assert!(!TypeConstraint::Integral.accepts(EdmSimpleType::String));
    }
}
