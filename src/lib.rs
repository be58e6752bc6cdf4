//! OData v2 URI and query expression parsing
//!
//! Turns a resource path plus `$filter`/`$orderby`/`$select`/`$expand`
//! query options into a validated, typed representation: an expression
//! tree with an EDM type on every node, and a [`UriInfo`] aggregate
//! describing what the path resolved to. Consumers evaluate or render the
//! trees through the [`ast::ExpressionVisitor`] protocol.
//!
//! Parsing is synchronous, CPU-bound and side-effect-free; the
//! [`edm::EntityDataModel`] handed in is read-only and may be shared by
//! concurrent parses.

pub mod ast;
pub mod debug;
pub mod edm;
pub mod parser;
pub mod uri;

// Re-export the main entry points and the types they hand back.
pub use ast::{
    BinaryOperator, CommonExpression, ExpressionRenderer, ExpressionVisitor, FilterExpression,
    LiteralValue, MethodOperator, OrderByExpression, SortOrder, UnaryOperator,
};
pub use edm::{EdmSimpleType, EdmType, EntityDataModel, ModelBuilder};
pub use parser::{
    ExpressionParserError, IllegalLiteralError, ParserLimits, parse_filter, parse_order_by,
};
pub use uri::{UriError, UriInfo, UriKind, UriParser};
