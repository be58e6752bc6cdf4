//! Expression parse errors
//!
//! The parser never recovers internally: every failure surfaces as one of
//! these typed errors for the HTTP layer to map onto a 400 response with an
//! OData error document. Byte positions refer to the raw query-option
//! string as handed to the parser.

use thiserror::Error;

/// Result alias for tokenizing and expression parsing.
pub type ParseResult<T> = Result<T, ExpressionParserError>;

/// A literal token that matches no EDM simple type's syntax rules.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IllegalLiteralError {
    /// Numeric text that fails suffix/magnitude validation.
    #[error("'{literal}' is not a valid numeric literal")]
    MalformedNumber {
        /// The offending source text.
        literal: String,
        /// Byte offset of the literal.
        position: usize,
    },

    /// Unsuffixed integer outside the Int64 range.
    #[error("integer literal '{literal}' exceeds the Int64 range")]
    IntegerOutOfRange {
        /// The offending source text.
        literal: String,
        /// Byte offset of the literal.
        position: usize,
    },

    /// A typed literal whose body fails its type-specific validation.
    #[error("'{literal}' is not a valid {expected} literal")]
    MalformedTypedLiteral {
        /// The offending source text.
        literal: String,
        /// The EDM type name the prefix promised.
        expected: &'static str,
        /// Byte offset of the literal.
        position: usize,
    },

    /// Literal text matching no known EDM simple type at all.
    #[error("'{literal}' matches no EDM simple type")]
    UnknownLiteralForm {
        /// The offending source text.
        literal: String,
        /// Byte offset of the literal.
        position: usize,
    },
}

impl IllegalLiteralError {
    /// Byte offset of the offending literal.
    pub fn position(&self) -> usize {
        match self {
            IllegalLiteralError::MalformedNumber { position, .. }
            | IllegalLiteralError::IntegerOutOfRange { position, .. }
            | IllegalLiteralError::MalformedTypedLiteral { position, .. }
            | IllegalLiteralError::UnknownLiteralForm { position, .. } => *position,
        }
    }
}

/// Structural or type failure while parsing `$filter` / `$orderby`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionParserError {
    /// String or typed literal without its closing quote.
    #[error("unterminated literal starting at position {position}")]
    UnterminatedLiteral {
        /// Byte offset where the literal starts.
        position: usize,
    },

    /// A character outside every token class.
    #[error("unrecognized character '{character}' at position {position}")]
    UnrecognizedCharacter {
        /// The character.
        character: char,
        /// Its byte offset.
        position: usize,
    },

    /// A well-formed token in a position the grammar does not allow.
    #[error("unexpected '{token}' at position {position}")]
    UnexpectedToken {
        /// The token text.
        token: String,
        /// Its byte offset.
        position: usize,
    },

    /// Input ended where the grammar required more.
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// An opening parenthesis without its match.
    #[error("unbalanced parentheses at position {position}")]
    UnbalancedParentheses {
        /// Byte offset of the unmatched parenthesis.
        position: usize,
    },

    /// An identifier called like a method but absent from the method table.
    #[error("unknown method '{name}' at position {position}")]
    UnknownMethod {
        /// The identifier.
        name: String,
        /// Its byte offset.
        position: usize,
    },

    /// A method invoked with the wrong number of parameters.
    #[error("method '{method}' expects {expected} parameter(s), got {actual}")]
    MethodArity {
        /// The method name.
        method: &'static str,
        /// Human-readable expected count ("2" or "2 to 3").
        expected: String,
        /// The number of parameters supplied.
        actual: usize,
    },

    /// A method parameter of an unacceptable type.
    #[error("parameter {index} of '{method}' must be {expected}, got {actual}")]
    MethodParameterType {
        /// The method name.
        method: &'static str,
        /// 1-based parameter index.
        index: usize,
        /// Description of the accepted types.
        expected: &'static str,
        /// The type that was supplied.
        actual: String,
    },

    /// `isof`/`cast` with a type-name argument that names no EDM type.
    #[error("'{name}' is not a recognized type name at position {position}")]
    UnknownTypeName {
        /// The type name as written.
        name: String,
        /// Its byte offset.
        position: usize,
    },

    /// An identifier that resolves to nothing on the enclosing type.
    #[error("property '{name}' not found on type '{on_type}'")]
    UnresolvableProperty {
        /// The identifier as written.
        name: String,
        /// Qualified name of the type it was resolved against.
        on_type: String,
        /// Its byte offset.
        position: usize,
    },

    /// A collection-valued navigation used inside an expression.
    #[error("navigation '{name}' is collection-valued and cannot be used in an expression")]
    CollectionNavigation {
        /// The navigation property name.
        name: String,
        /// Its byte offset.
        position: usize,
    },

    /// A `/` segment applied to a primitive-typed expression.
    #[error("cannot access member '{name}' of primitive type {on_type}")]
    MemberOnPrimitive {
        /// The attempted member name.
        name: String,
        /// The primitive type it was applied to.
        on_type: String,
        /// Its byte offset.
        position: usize,
    },

    /// Operand types absent from the binary promotion table.
    #[error("operator '{operator}' cannot be applied to types {left} and {right}")]
    IncompatibleOperandTypes {
        /// The operator keyword.
        operator: &'static str,
        /// Left operand type name.
        left: String,
        /// Right operand type name.
        right: String,
        /// Byte offset of the operator.
        position: usize,
    },

    /// Operand type absent from the unary table.
    #[error("operator '{operator}' cannot be applied to type {operand}")]
    IncompatibleUnaryOperandType {
        /// The operator keyword.
        operator: &'static str,
        /// Operand type name.
        operand: String,
        /// Byte offset of the operator.
        position: usize,
    },

    /// An `$orderby` term of entity or complex type.
    #[error("orderby term at position {position} must be of a primitive type, got {actual}")]
    UnorderableTerm {
        /// The term's type name.
        actual: String,
        /// Byte offset of the term.
        position: usize,
    },

    /// Parenthesis/method nesting beyond the configured limit.
    #[error("expression nesting exceeds the limit of {limit}")]
    NestingTooDeep {
        /// The configured depth limit.
        limit: usize,
    },

    /// Input longer than the configured cap, rejected before lexing.
    #[error("expression length {length} exceeds the limit of {limit}")]
    InputTooLong {
        /// Input length in bytes.
        length: usize,
        /// The configured cap.
        limit: usize,
    },

    /// A literal token whose text validates against no EDM simple type.
    #[error(transparent)]
    IllegalLiteral(#[from] IllegalLiteralError),
}
