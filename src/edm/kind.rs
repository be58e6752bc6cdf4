//! OData v2 primitive type kinds
//!
//! The closed set of `Edm.*` simple types plus `Null`, which the literal
//! parser assigns to the bare `null` keyword. Promotion follows the OData v2
//! rules; the numeric ranks drive both implicit method-parameter promotion
//! and the binary-operator result table.

use serde::Serialize;
use std::fmt;

/// An OData v2 primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EdmSimpleType {
    /// Edm.Binary
    Binary,
    /// Edm.Boolean
    Boolean,
    /// Edm.Byte
    Byte,
    /// Edm.DateTime
    DateTime,
    /// Edm.DateTimeOffset
    DateTimeOffset,
    /// Edm.Decimal
    Decimal,
    /// Edm.Double
    Double,
    /// Edm.Guid
    Guid,
    /// Edm.Int16
    Int16,
    /// Edm.Int32
    Int32,
    /// Edm.Int64
    Int64,
    /// Edm.SByte
    SByte,
    /// Edm.Single
    Single,
    /// Edm.String
    String,
    /// Edm.Time
    Time,
    /// The type of the `null` literal; promotable to every other kind
    Null,
}

/// All kinds in declaration order.
#[cfg(test)]
const ALL_SIMPLE_TYPES: [EdmSimpleType; 16] = [
    EdmSimpleType::Binary,
    EdmSimpleType::Boolean,
    EdmSimpleType::Byte,
    EdmSimpleType::DateTime,
    EdmSimpleType::DateTimeOffset,
    EdmSimpleType::Decimal,
    EdmSimpleType::Double,
    EdmSimpleType::Guid,
    EdmSimpleType::Int16,
    EdmSimpleType::Int32,
    EdmSimpleType::Int64,
    EdmSimpleType::SByte,
    EdmSimpleType::Single,
    EdmSimpleType::String,
    EdmSimpleType::Time,
    EdmSimpleType::Null,
];

impl EdmSimpleType {
    /// The qualified `Edm.*` name of this kind (`"Null"` for the null type).
    pub fn name(&self) -> &'static str {
        match self {
            EdmSimpleType::Binary => "Edm.Binary",
            EdmSimpleType::Boolean => "Edm.Boolean",
            EdmSimpleType::Byte => "Edm.Byte",
            EdmSimpleType::DateTime => "Edm.DateTime",
            EdmSimpleType::DateTimeOffset => "Edm.DateTimeOffset",
            EdmSimpleType::Decimal => "Edm.Decimal",
            EdmSimpleType::Double => "Edm.Double",
            EdmSimpleType::Guid => "Edm.Guid",
            EdmSimpleType::Int16 => "Edm.Int16",
            EdmSimpleType::Int32 => "Edm.Int32",
            EdmSimpleType::Int64 => "Edm.Int64",
            EdmSimpleType::SByte => "Edm.SByte",
            EdmSimpleType::Single => "Edm.Single",
            EdmSimpleType::String => "Edm.String",
            EdmSimpleType::Time => "Edm.Time",
            EdmSimpleType::Null => "Null",
        }
    }

    /// Resolve a qualified `Edm.*` name back to a kind.
    ///
    /// `Null` is intentionally not addressable by name; it exists only for
    /// the `null` literal.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Edm.Binary" => Some(EdmSimpleType::Binary),
            "Edm.Boolean" => Some(EdmSimpleType::Boolean),
            "Edm.Byte" => Some(EdmSimpleType::Byte),
            "Edm.DateTime" => Some(EdmSimpleType::DateTime),
            "Edm.DateTimeOffset" => Some(EdmSimpleType::DateTimeOffset),
            "Edm.Decimal" => Some(EdmSimpleType::Decimal),
            "Edm.Double" => Some(EdmSimpleType::Double),
            "Edm.Guid" => Some(EdmSimpleType::Guid),
            "Edm.Int16" => Some(EdmSimpleType::Int16),
            "Edm.Int32" => Some(EdmSimpleType::Int32),
            "Edm.Int64" => Some(EdmSimpleType::Int64),
            "Edm.SByte" => Some(EdmSimpleType::SByte),
            "Edm.Single" => Some(EdmSimpleType::Single),
            "Edm.String" => Some(EdmSimpleType::String),
            "Edm.Time" => Some(EdmSimpleType::Time),
            _ => None,
        }
    }

    /// Whether this kind is one of the numeric types.
    pub fn is_numeric(&self) -> bool {
        self.numeric_rank().is_some()
    }

    /// Whether this kind is an integral numeric type.
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            EdmSimpleType::SByte
                | EdmSimpleType::Byte
                | EdmSimpleType::Int16
                | EdmSimpleType::Int32
                | EdmSimpleType::Int64
        )
    }

    /// Promotion rank within the numeric tower, `None` for non-numerics.
    ///
    /// SByte < Byte < Int16 < Int32 < Int64 < Single < Double < Decimal.
    /// The rank decides the result kind of mixed-type arithmetic; equal
    /// kinds keep their kind (Byte add Byte stays Byte, as OData v2
    /// requires for exact type echoing).
    pub(crate) fn numeric_rank(&self) -> Option<u8> {
        match self {
            EdmSimpleType::SByte => Some(0),
            EdmSimpleType::Byte => Some(1),
            EdmSimpleType::Int16 => Some(2),
            EdmSimpleType::Int32 => Some(3),
            EdmSimpleType::Int64 => Some(4),
            EdmSimpleType::Single => Some(5),
            EdmSimpleType::Double => Some(6),
            EdmSimpleType::Decimal => Some(7),
            _ => None,
        }
    }

    /// Whether a value of this kind is implicitly assignable where `target`
    /// is expected. Equal kinds always are; `Null` promotes to everything;
    /// numerics promote upward through the rank order.
    pub fn is_promotable_to(&self, target: EdmSimpleType) -> bool {
        if *self == target || *self == EdmSimpleType::Null {
            return true;
        }
        match (self.numeric_rank(), target.numeric_rank()) {
            (Some(from), Some(to)) => from <= to,
            _ => false,
        }
    }

    /// Whether `lt`/`le`/`gt`/`ge` are defined for this kind.
    pub fn supports_ordering(&self) -> bool {
        self.is_numeric()
            || matches!(
                self,
                EdmSimpleType::String
                    | EdmSimpleType::DateTime
                    | EdmSimpleType::DateTimeOffset
                    | EdmSimpleType::Time
            )
    }
}

impl fmt::Display for EdmSimpleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_round_trip() {
        for kind in ALL_SIMPLE_TYPES {
            if kind == EdmSimpleType::Null {
                continue;
            }
            assert_eq!(EdmSimpleType::from_name(kind.name()), Some(kind));
        }
        assert_eq!(EdmSimpleType::from_name("Null"), None);
        assert_eq!(EdmSimpleType::from_name("Edm.Bogus"), None);
    }

    #[test]
    fn numeric_promotion_is_upward_only() {
        assert!(EdmSimpleType::Byte.is_promotable_to(EdmSimpleType::Int32));
        assert!(EdmSimpleType::Int32.is_promotable_to(EdmSimpleType::Int64));
        assert!(EdmSimpleType::Int64.is_promotable_to(EdmSimpleType::Decimal));
        assert!(!EdmSimpleType::Int64.is_promotable_to(EdmSimpleType::Int32));
        assert!(!EdmSimpleType::String.is_promotable_to(EdmSimpleType::Int32));
    }

    #[test]
    fn null_promotes_to_everything() {
        for kind in ALL_SIMPLE_TYPES {
            assert!(EdmSimpleType::Null.is_promotable_to(kind));
        }
    }
}
