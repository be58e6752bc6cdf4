//! Literal classification into EDM simple types
//!
//! One ordered rule table evaluated without exception-driven fallback: each
//! candidate form has a validation predicate, the first match wins, and an
//! exhausted table yields a typed error. The suffix and magnitude rules are
//! interop-critical (clients echo the inferred type back) and follow the
//! OData v2 ABNF exactly:
//!
//! - quoted text → `Edm.String`
//! - `true`/`false` → `Edm.Boolean`, `null` → the null type
//! - `datetime'...'`, `datetimeoffset'...'`, `time'...'`, `guid'...'`,
//!   `binary'...'`/`X'...'` → their prefixed kinds, bodies validated
//! - unsuffixed integer fitting Int32 → `Edm.Int32`; fitting only Int64 →
//!   `Edm.Int64`; beyond Int64 → illegal
//! - suffix `L` → `Edm.Int64`, `M` → `Edm.Decimal`, `D` → `Edm.Double`,
//!   `F` → `Edm.Single`
//! - decimal point or exponent without suffix → `Edm.Double`

use super::error::IllegalLiteralError;
use super::tokenizer::Token;
use crate::ast::LiteralValue;
use crate::edm::EdmSimpleType;
use chrono::{DateTime, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

/// `Edm.Time` carries an ISO 8601 duration in v2 (`time'PT13H20M'`).
static TIME_DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^P(?:\d+D)?(?:T(?:\d+H)?(?:\d+M)?(?:\d+(?:\.\d+)?S)?)?$").expect("valid pattern")
});

/// A literal classified by the ordered rule table.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLiteral {
    /// The inferred simple type.
    pub edm_type: EdmSimpleType,
    /// The parsed value.
    pub value: LiteralValue,
}

/// Classify a literal token. Inference is context-free and idempotent: the
/// same text always yields the same `(type, value)` pair.
pub fn parse_literal_token(token: &Token<'_>) -> Result<ParsedLiteral, IllegalLiteralError> {
    parse_literal(token.text, token.offset)
}

/// Classify raw literal text located at `position` in its source string.
pub fn parse_literal(text: &str, position: usize) -> Result<ParsedLiteral, IllegalLiteralError> {
    match text {
        "null" => {
            return Ok(ParsedLiteral {
                edm_type: EdmSimpleType::Null,
                value: LiteralValue::Null,
            });
        }
        "true" => {
            return Ok(ParsedLiteral {
                edm_type: EdmSimpleType::Boolean,
                value: LiteralValue::Boolean(true),
            });
        }
        "false" => {
            return Ok(ParsedLiteral {
                edm_type: EdmSimpleType::Boolean,
                value: LiteralValue::Boolean(false),
            });
        }
        _ => {}
    }

    if text.starts_with('\'') {
        let body = quoted_body(text, "Edm.String", position)?;
        return Ok(ParsedLiteral {
            edm_type: EdmSimpleType::String,
            value: LiteralValue::String(unescape_quotes(body)),
        });
    }

    if let Some(rest) = text.strip_prefix("datetimeoffset") {
        let body = quoted_body(rest, "Edm.DateTimeOffset", position)?;
        let parsed = DateTime::parse_from_rfc3339(body).map_err(|_| {
            IllegalLiteralError::MalformedTypedLiteral {
                literal: text.to_string(),
                expected: "Edm.DateTimeOffset",
                position,
            }
        })?;
        return Ok(ParsedLiteral {
            edm_type: EdmSimpleType::DateTimeOffset,
            value: LiteralValue::DateTimeOffset(parsed),
        });
    }

    if let Some(rest) = text.strip_prefix("datetime") {
        let body = quoted_body(rest, "Edm.DateTime", position)?;
        let parsed = parse_datetime_body(body).ok_or_else(|| {
            IllegalLiteralError::MalformedTypedLiteral {
                literal: text.to_string(),
                expected: "Edm.DateTime",
                position,
            }
        })?;
        return Ok(ParsedLiteral {
            edm_type: EdmSimpleType::DateTime,
            value: LiteralValue::DateTime(parsed),
        });
    }

    if let Some(rest) = text.strip_prefix("time") {
        let body = quoted_body(rest, "Edm.Time", position)?;
        if body.len() < 2 || !TIME_DURATION.is_match(body) {
            return Err(IllegalLiteralError::MalformedTypedLiteral {
                literal: text.to_string(),
                expected: "Edm.Time",
                position,
            });
        }
        return Ok(ParsedLiteral {
            edm_type: EdmSimpleType::Time,
            value: LiteralValue::Time(body.to_string()),
        });
    }

    if let Some(rest) = text.strip_prefix("guid") {
        let body = quoted_body(rest, "Edm.Guid", position)?;
        let parsed =
            Uuid::parse_str(body).map_err(|_| IllegalLiteralError::MalformedTypedLiteral {
                literal: text.to_string(),
                expected: "Edm.Guid",
                position,
            })?;
        return Ok(ParsedLiteral {
            edm_type: EdmSimpleType::Guid,
            value: LiteralValue::Guid(parsed),
        });
    }

    let binary_body = text
        .strip_prefix("binary")
        .or_else(|| text.strip_prefix('X'));
    if let Some(rest) = binary_body {
        let body = quoted_body(rest, "Edm.Binary", position)?;
        let bytes = hex::decode(body).map_err(|_| IllegalLiteralError::MalformedTypedLiteral {
            literal: text.to_string(),
            expected: "Edm.Binary",
            position,
        })?;
        return Ok(ParsedLiteral {
            edm_type: EdmSimpleType::Binary,
            value: LiteralValue::Binary(bytes),
        });
    }

    if text
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '-')
    {
        return parse_number(text, position);
    }

    Err(IllegalLiteralError::UnknownLiteralForm {
        literal: text.to_string(),
        position,
    })
}

fn quoted_body<'a>(
    quoted: &'a str,
    expected: &'static str,
    position: usize,
) -> Result<&'a str, IllegalLiteralError> {
    quoted
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .ok_or_else(|| IllegalLiteralError::MalformedTypedLiteral {
            literal: quoted.to_string(),
            expected,
            position,
        })
}

fn unescape_quotes(body: &str) -> String {
    body.replace("''", "'")
}

/// `Edm.DateTime` body: `yyyy-MM-ddTHH:mm[:ss[.fffffff]]`, no offset.
fn parse_datetime_body(body: &str) -> Option<NaiveDateTime> {
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(body, format) {
            return Some(parsed);
        }
    }
    None
}

fn parse_number(text: &str, position: usize) -> Result<ParsedLiteral, IllegalLiteralError> {
    let malformed = || IllegalLiteralError::MalformedNumber {
        literal: text.to_string(),
        position,
    };

    let (body, suffix) = match text.chars().last() {
        Some(c @ ('l' | 'L' | 'm' | 'M' | 'd' | 'D' | 'f' | 'F')) => {
            (&text[..text.len() - 1], Some(c.to_ascii_uppercase()))
        }
        _ => (text, None),
    };
    if body.is_empty() || body == "-" {
        return Err(malformed());
    }
    let fractional = body.contains('.') || body.contains('e') || body.contains('E');

    match suffix {
        Some('L') => {
            if fractional {
                return Err(malformed());
            }
            let value = i64::from_str(body).map_err(|_| malformed())?;
            Ok(ParsedLiteral {
                edm_type: EdmSimpleType::Int64,
                value: LiteralValue::Int64(value),
            })
        }
        Some('M') => {
            let value = Decimal::from_str(body).map_err(|_| malformed())?;
            Ok(ParsedLiteral {
                edm_type: EdmSimpleType::Decimal,
                value: LiteralValue::Decimal(value),
            })
        }
        Some('D') => {
            let value = f64::from_str(body).map_err(|_| malformed())?;
            Ok(ParsedLiteral {
                edm_type: EdmSimpleType::Double,
                value: LiteralValue::Double(value),
            })
        }
        Some('F') => {
            let value = f32::from_str(body).map_err(|_| malformed())?;
            Ok(ParsedLiteral {
                edm_type: EdmSimpleType::Single,
                value: LiteralValue::Single(value),
            })
        }
        _ => {
            if fractional {
                let value = f64::from_str(body).map_err(|_| malformed())?;
                return Ok(ParsedLiteral {
                    edm_type: EdmSimpleType::Double,
                    value: LiteralValue::Double(value),
                });
            }
            match i64::from_str(body) {
                Ok(value) => {
                    if let Ok(narrow) = i32::try_from(value) {
                        Ok(ParsedLiteral {
                            edm_type: EdmSimpleType::Int32,
                            value: LiteralValue::Int32(narrow),
                        })
                    } else {
                        Ok(ParsedLiteral {
                            edm_type: EdmSimpleType::Int64,
                            value: LiteralValue::Int64(value),
                        })
                    }
                }
                Err(_) => Err(IllegalLiteralError::IntegerOutOfRange {
                    literal: text.to_string(),
                    position,
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn infer(text: &str) -> EdmSimpleType {
        parse_literal(text, 0).unwrap().edm_type
    }

    #[rstest]
    #[case("5", EdmSimpleType::Int32)]
    #[case("-5", EdmSimpleType::Int32)]
    #[case("2147483647", EdmSimpleType::Int32)]
    #[case("2147483648", EdmSimpleType::Int64)]
    #[case("-2147483649", EdmSimpleType::Int64)]
    #[case("3L", EdmSimpleType::Int64)]
    #[case("1.5", EdmSimpleType::Double)]
    #[case("1e3", EdmSimpleType::Double)]
    #[case("2.5d", EdmSimpleType::Double)]
    #[case("2.5f", EdmSimpleType::Single)]
    #[case("2.5m", EdmSimpleType::Decimal)]
    #[case("'abc'", EdmSimpleType::String)]
    #[case("true", EdmSimpleType::Boolean)]
    #[case("null", EdmSimpleType::Null)]
    #[case("datetime'2024-06-01T08:30'", EdmSimpleType::DateTime)]
    #[case(
        "datetimeoffset'2024-06-01T08:30:00+02:00'",
        EdmSimpleType::DateTimeOffset
    )]
    #[case("time'PT13H20M'", EdmSimpleType::Time)]
    #[case("guid'12345678-1234-1234-1234-123456789abc'", EdmSimpleType::Guid)]
    #[case("X'1F'", EdmSimpleType::Binary)]
    #[case("binary'00ff'", EdmSimpleType::Binary)]
    fn suffix_and_magnitude_table(#[case] text: &str, #[case] expected: EdmSimpleType) {
        assert_eq!(infer(text), expected);
    }

    #[test]
    fn string_escape_is_resolved() {
        let parsed = parse_literal("'O''Neil'", 0).unwrap();
        assert_eq!(parsed.value, LiteralValue::String("O'Neil".to_string()));
    }

    #[test]
    fn integer_beyond_int64_is_illegal() {
        let err = parse_literal("9223372036854775808", 3).unwrap_err();
        assert!(matches!(
            err,
            IllegalLiteralError::IntegerOutOfRange { position: 3, .. }
        ));
    }

    #[test]
    fn malformed_datetime_is_illegal() {
        let err = parse_literal("datetime'not-a-date'", 0).unwrap_err();
        assert!(matches!(
            err,
            IllegalLiteralError::MalformedTypedLiteral {
                expected: "Edm.DateTime",
                ..
            }
        ));
    }

    #[test]
    fn malformed_guid_and_binary_are_illegal() {
        assert!(parse_literal("guid'zz'", 0).is_err());
        assert!(parse_literal("X'0g'", 0).is_err());
        assert!(parse_literal("time'X'", 0).is_err());
    }

    #[test]
    fn inference_is_idempotent() {
        for text in ["5", "2.5m", "'x'", "datetime'2024-06-01T08:30'"] {
            let a = parse_literal(text, 0).unwrap();
            let b = parse_literal(text, 17).unwrap();
            assert_eq!(a.edm_type, b.edm_type);
            assert_eq!(a.value, b.value);
        }
    }
}
