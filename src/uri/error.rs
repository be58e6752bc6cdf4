//! URI resolution errors
//!
//! Two families, kept distinct because the consuming HTTP layer maps them
//! to different status codes: [`UriSyntaxError`] is a malformed request
//! (400), [`UriNotMatchingError`] is well-formed but resolves to nothing in
//! the model (404).

use crate::parser::{ExpressionParserError, IllegalLiteralError};
use thiserror::Error;

/// Result alias for URI resolution.
pub type UriResult<T> = Result<T, UriError>;

/// Malformed request path or query options.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UriSyntaxError {
    /// A path segment that fits no segment form.
    #[error("malformed path segment '{segment}'")]
    MalformedSegment {
        /// The segment as received.
        segment: String,
    },

    /// A segment in a position the path grammar does not allow.
    #[error("segment '{segment}' is not allowed after {after}")]
    SegmentNotAllowed {
        /// The offending segment.
        segment: String,
        /// What the path had already resolved to.
        after: &'static str,
    },

    /// A key predicate with broken structure.
    #[error("malformed key predicate '{predicate}': {reason}")]
    MalformedKeyPredicate {
        /// The predicate text, parentheses stripped.
        predicate: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A key literal failing its type validation.
    #[error("invalid key literal: {source}")]
    KeyLiteral {
        /// The underlying literal error.
        #[source]
        source: IllegalLiteralError,
    },

    /// A key predicate naming the same property twice.
    #[error("duplicate key property '{property}' in key predicate")]
    DuplicateKeyProperty {
        /// The repeated property name.
        property: String,
    },

    /// A key predicate not covering the key exactly.
    #[error("key predicate for '{entity_type}' must name {expected} key properties, got {actual}")]
    KeyPredicateCount {
        /// The entity type.
        entity_type: String,
        /// Number of declared key properties.
        expected: usize,
        /// Number supplied.
        actual: usize,
    },

    /// An unnamed key value against a compound key.
    #[error("unnamed key value is ambiguous: '{entity_type}' has {count} key properties")]
    UnnamedCompoundKey {
        /// The entity type.
        entity_type: String,
        /// Number of declared key properties.
        count: usize,
    },

    /// A key predicate naming a property outside the key.
    #[error("'{property}' is not a key property of '{entity_type}'")]
    NotAKeyProperty {
        /// The named property.
        property: String,
        /// The entity type.
        entity_type: String,
    },

    /// A key literal whose type does not match the key property.
    #[error("key property '{property}' expects {expected}, got {actual}")]
    KeyPredicateType {
        /// The key property.
        property: String,
        /// Its declared type.
        expected: String,
        /// The supplied literal's type.
        actual: String,
    },

    /// A `$`-option this grammar does not know.
    #[error("unknown system query option '{option}'")]
    UnknownSystemOption {
        /// The option name as received.
        option: String,
    },

    /// A system query option supplied twice.
    #[error("duplicate system query option '{option}'")]
    DuplicateSystemOption {
        /// The option name.
        option: String,
    },

    /// A system query option with an unusable value.
    #[error("invalid value '{value}' for {option}: {reason}")]
    InvalidOptionValue {
        /// The option name.
        option: &'static str,
        /// The value as received.
        value: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A system query option on a target that cannot carry it.
    #[error("query option {option} is not applicable to this resource")]
    OptionNotApplicable {
        /// The option name.
        option: &'static str,
    },

    /// A structurally invalid `$select` or `$expand` path.
    #[error("invalid {option} path '{path}': {reason}")]
    InvalidPath {
        /// `$select` or `$expand`.
        option: &'static str,
        /// The path item as received.
        path: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A `$filter`/`$orderby` value that failed expression parsing.
    #[error("invalid {option}: {source}")]
    Expression {
        /// The option name.
        option: &'static str,
        /// The underlying parser error.
        #[source]
        source: ExpressionParserError,
    },
}

/// Well-formed request resolving to nothing in the model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UriNotMatchingError {
    /// First segment matching neither an entity set nor a function import.
    #[error("'{name}' is not an entity set or function import")]
    UnknownResource {
        /// The segment as received.
        name: String,
    },

    /// A segment matching no property or navigation of the current type.
    #[error("property '{name}' not found on type '{entity_type}'")]
    PropertyNotFound {
        /// The segment as received.
        name: String,
        /// The type it was resolved against.
        entity_type: String,
    },

    /// A navigation segment required (after `$links`) but absent.
    #[error("navigation property '{name}' not found on type '{entity_type}'")]
    NavigationNotFound {
        /// The segment as received.
        name: String,
        /// The type it was resolved against.
        entity_type: String,
    },
}

/// Any URI resolution failure, tagged with its HTTP mapping.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UriError {
    /// Malformed request (HTTP 400).
    #[error(transparent)]
    Syntax(#[from] UriSyntaxError),

    /// Nothing matches (HTTP 404).
    #[error(transparent)]
    NotMatching(#[from] UriNotMatchingError),
}

impl UriError {
    /// The HTTP status code the consuming layer should respond with.
    pub fn http_status(&self) -> u16 {
        match self {
            UriError::Syntax(_) => 400,
            UriError::NotMatching(_) => 404,
        }
    }
}
