//! Expression node model
//!
//! Nodes are built once during the parse of a single request and are
//! immutable afterwards, with one documented exception: the EDM type
//! annotation sits behind a `RefCell` so evaluators can override the
//! computed type without rebuilding the tree ([`CommonExpression::set_edm_type`]
//! is the sole mutation path). Trees are per-request and traversed on one
//! thread; they are intentionally not `Sync`.

use super::operator::{BinaryOperator, MethodOperator, SortOrder, UnaryOperator};
use super::visitor::{ExpressionVisitor, walk_expression, walk_filter, walk_order_by};
use crate::edm::{EdmSimpleType, EdmType, NavigationProperty, Property};
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use smallvec::SmallVec;
use std::cell::RefCell;
use std::sync::Arc;
use uuid::Uuid;

/// A parsed literal value together with its primitive kind.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// The `null` keyword.
    Null,
    /// `true` / `false`.
    Boolean(bool),
    /// Unsuffixed integer fitting `i32`.
    Int32(i32),
    /// `L`-suffixed integer, or an unsuffixed one exceeding `i32`.
    Int64(i64),
    /// `f`-suffixed floating point.
    Single(f32),
    /// `d`-suffixed or unsuffixed fractional number.
    Double(f64),
    /// `M`-suffixed exact decimal.
    Decimal(Decimal),
    /// Quoted string with `''` escapes resolved.
    String(String),
    /// `datetime'...'`.
    DateTime(NaiveDateTime),
    /// `datetimeoffset'...'`.
    DateTimeOffset(DateTime<FixedOffset>),
    /// `time'...'` ISO 8601 duration, kept as validated text.
    Time(String),
    /// `guid'...'`.
    Guid(Uuid),
    /// `binary'...'` / `X'...'` decoded bytes.
    Binary(Vec<u8>),
}

impl LiteralValue {
    /// The primitive kind this value belongs to.
    pub fn edm_type(&self) -> EdmSimpleType {
        match self {
            LiteralValue::Null => EdmSimpleType::Null,
            LiteralValue::Boolean(_) => EdmSimpleType::Boolean,
            LiteralValue::Int32(_) => EdmSimpleType::Int32,
            LiteralValue::Int64(_) => EdmSimpleType::Int64,
            LiteralValue::Single(_) => EdmSimpleType::Single,
            LiteralValue::Double(_) => EdmSimpleType::Double,
            LiteralValue::Decimal(_) => EdmSimpleType::Decimal,
            LiteralValue::String(_) => EdmSimpleType::String,
            LiteralValue::DateTime(_) => EdmSimpleType::DateTime,
            LiteralValue::DateTimeOffset(_) => EdmSimpleType::DateTimeOffset,
            LiteralValue::Time(_) => EdmSimpleType::Time,
            LiteralValue::Guid(_) => EdmSimpleType::Guid,
            LiteralValue::Binary(_) => EdmSimpleType::Binary,
        }
    }
}

/// Discriminant of an expression node, used in diagnostics and debug output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub enum ExpressionKind {
    Literal,
    Property,
    Member,
    Unary,
    Binary,
    Method,
}

/// What a property segment resolved to on its parent type.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedProperty {
    /// A structural (simple or complex) property.
    Structural(Arc<Property>),
    /// A to-one navigation property.
    Navigation(Arc<NavigationProperty>),
}

/// A typed literal node.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralExpression {
    value: LiteralValue,
    edm_type: RefCell<EdmType>,
    uri_literal: String,
}

impl LiteralExpression {
    pub(crate) fn new(value: LiteralValue, uri_literal: String) -> Self {
        let kind = value.edm_type();
        Self {
            value,
            edm_type: RefCell::new(EdmType::Simple(kind)),
            uri_literal,
        }
    }

    /// The parsed value.
    pub fn value(&self) -> &LiteralValue {
        &self.value
    }

    /// The EDM type annotation of this node.
    pub fn edm_type(&self) -> EdmType {
        self.edm_type.borrow().clone()
    }

    /// The exact source substring this node was parsed from.
    pub fn uri_literal(&self) -> &str {
        &self.uri_literal
    }
}

/// A resolved reference to a property (or to-one navigation) of the
/// enclosing type.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyExpression {
    name: String,
    resolved: ResolvedProperty,
    edm_type: RefCell<EdmType>,
    uri_literal: String,
}

impl PropertyExpression {
    pub(crate) fn new(
        name: String,
        resolved: ResolvedProperty,
        edm_type: EdmType,
        uri_literal: String,
    ) -> Self {
        Self {
            name,
            resolved,
            edm_type: RefCell::new(edm_type),
            uri_literal,
        }
    }

    /// The property name as written in the URI.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resolution handle.
    pub fn resolved(&self) -> &ResolvedProperty {
        &self.resolved
    }

    /// The structural property handle, if this is not a navigation segment.
    pub fn property(&self) -> Option<&Arc<Property>> {
        match &self.resolved {
            ResolvedProperty::Structural(p) => Some(p),
            ResolvedProperty::Navigation(_) => None,
        }
    }

    /// The navigation handle, if this segment is a navigation property.
    pub fn navigation(&self) -> Option<&Arc<NavigationProperty>> {
        match &self.resolved {
            ResolvedProperty::Navigation(n) => Some(n),
            ResolvedProperty::Structural(_) => None,
        }
    }

    /// The EDM type annotation of this node.
    pub fn edm_type(&self) -> EdmType {
        self.edm_type.borrow().clone()
    }

    /// The exact source substring this node was parsed from.
    pub fn uri_literal(&self) -> &str {
        &self.uri_literal
    }
}

/// A `source/path` access chain segment.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpression {
    source: Box<CommonExpression>,
    path: Box<CommonExpression>,
    edm_type: RefCell<EdmType>,
    uri_literal: String,
}

impl MemberExpression {
    pub(crate) fn new(
        source: CommonExpression,
        path: CommonExpression,
        edm_type: EdmType,
        uri_literal: String,
    ) -> Self {
        Self {
            source: Box::new(source),
            path: Box::new(path),
            edm_type: RefCell::new(edm_type),
            uri_literal,
        }
    }

    /// The expression left of the `/`.
    pub fn source(&self) -> &CommonExpression {
        &self.source
    }

    /// The resolved segment right of the `/`.
    pub fn path(&self) -> &CommonExpression {
        &self.path
    }

    /// The EDM type annotation of this node.
    pub fn edm_type(&self) -> EdmType {
        self.edm_type.borrow().clone()
    }

    /// The exact source substring this node was parsed from.
    pub fn uri_literal(&self) -> &str {
        &self.uri_literal
    }
}

/// A unary operator application.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpression {
    operator: UnaryOperator,
    operand: Box<CommonExpression>,
    edm_type: RefCell<EdmType>,
    uri_literal: String,
}

impl UnaryExpression {
    pub(crate) fn new(
        operator: UnaryOperator,
        operand: CommonExpression,
        edm_type: EdmType,
        uri_literal: String,
    ) -> Self {
        Self {
            operator,
            operand: Box::new(operand),
            edm_type: RefCell::new(edm_type),
            uri_literal,
        }
    }

    /// The operator.
    pub fn operator(&self) -> UnaryOperator {
        self.operator
    }

    /// The operand.
    pub fn operand(&self) -> &CommonExpression {
        &self.operand
    }

    /// The EDM type annotation of this node.
    pub fn edm_type(&self) -> EdmType {
        self.edm_type.borrow().clone()
    }

    /// The exact source substring this node was parsed from.
    pub fn uri_literal(&self) -> &str {
        &self.uri_literal
    }
}

/// A binary operator application.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    operator: BinaryOperator,
    left: Box<CommonExpression>,
    right: Box<CommonExpression>,
    edm_type: RefCell<EdmType>,
    uri_literal: String,
}

impl BinaryExpression {
    pub(crate) fn new(
        operator: BinaryOperator,
        left: CommonExpression,
        right: CommonExpression,
        edm_type: EdmType,
        uri_literal: String,
    ) -> Self {
        Self {
            operator,
            left: Box::new(left),
            right: Box::new(right),
            edm_type: RefCell::new(edm_type),
            uri_literal,
        }
    }

    /// The operator.
    pub fn operator(&self) -> BinaryOperator {
        self.operator
    }

    /// The left operand.
    pub fn left(&self) -> &CommonExpression {
        &self.left
    }

    /// The right operand.
    pub fn right(&self) -> &CommonExpression {
        &self.right
    }

    /// The EDM type annotation of this node.
    pub fn edm_type(&self) -> EdmType {
        self.edm_type.borrow().clone()
    }

    /// The exact source substring this node was parsed from.
    pub fn uri_literal(&self) -> &str {
        &self.uri_literal
    }
}

/// A built-in method call with validated arity and parameter types.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodExpression {
    method: MethodOperator,
    parameters: SmallVec<[CommonExpression; 2]>,
    edm_type: RefCell<EdmType>,
    uri_literal: String,
}

impl MethodExpression {
    pub(crate) fn new(
        method: MethodOperator,
        parameters: SmallVec<[CommonExpression; 2]>,
        edm_type: EdmType,
        uri_literal: String,
    ) -> Self {
        Self {
            method,
            parameters,
            edm_type: RefCell::new(edm_type),
            uri_literal,
        }
    }

    /// The method identifier.
    pub fn method(&self) -> MethodOperator {
        self.method
    }

    /// The ordered parameter expressions.
    pub fn parameters(&self) -> &[CommonExpression] {
        &self.parameters
    }

    /// The EDM type annotation of this node.
    pub fn edm_type(&self) -> EdmType {
        self.edm_type.borrow().clone()
    }

    /// The exact source substring this node was parsed from.
    pub fn uri_literal(&self) -> &str {
        &self.uri_literal
    }
}

/// A `$filter` / `$orderby` expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum CommonExpression {
    /// Typed literal.
    Literal(LiteralExpression),
    /// Resolved property reference.
    Property(PropertyExpression),
    /// `a/b` access chain.
    Member(MemberExpression),
    /// `not x`, `-x`.
    Unary(UnaryExpression),
    /// `x op y`.
    Binary(BinaryExpression),
    /// `method(p, ...)`.
    Method(MethodExpression),
}

impl CommonExpression {
    /// The node discriminant.
    pub fn kind(&self) -> ExpressionKind {
        match self {
            CommonExpression::Literal(_) => ExpressionKind::Literal,
            CommonExpression::Property(_) => ExpressionKind::Property,
            CommonExpression::Member(_) => ExpressionKind::Member,
            CommonExpression::Unary(_) => ExpressionKind::Unary,
            CommonExpression::Binary(_) => ExpressionKind::Binary,
            CommonExpression::Method(_) => ExpressionKind::Method,
        }
    }

    fn edm_type_cell(&self) -> &RefCell<EdmType> {
        match self {
            CommonExpression::Literal(e) => &e.edm_type,
            CommonExpression::Property(e) => &e.edm_type,
            CommonExpression::Member(e) => &e.edm_type,
            CommonExpression::Unary(e) => &e.edm_type,
            CommonExpression::Binary(e) => &e.edm_type,
            CommonExpression::Method(e) => &e.edm_type,
        }
    }

    /// The EDM type annotation; always set after a successful parse.
    pub fn edm_type(&self) -> EdmType {
        self.edm_type_cell().borrow().clone()
    }

    /// Override the EDM type annotation.
    ///
    /// The single sanctioned mutation of an otherwise-immutable tree, kept
    /// for evaluators that annotate computed or promoted types after the
    /// parse.
    pub fn set_edm_type(&self, edm_type: EdmType) {
        *self.edm_type_cell().borrow_mut() = edm_type;
    }

    /// The exact source substring this node was parsed from.
    pub fn uri_literal(&self) -> &str {
        match self {
            CommonExpression::Literal(e) => &e.uri_literal,
            CommonExpression::Property(e) => &e.uri_literal,
            CommonExpression::Member(e) => &e.uri_literal,
            CommonExpression::Unary(e) => &e.uri_literal,
            CommonExpression::Binary(e) => &e.uri_literal,
            CommonExpression::Method(e) => &e.uri_literal,
        }
    }

    /// Dispatch this node (post-order) through a visitor.
    pub fn accept<V: ExpressionVisitor>(&self, visitor: &mut V) -> V::Output {
        walk_expression(visitor, self)
    }
}

/// One `$orderby` term: an expression plus its sort direction.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderExpression {
    expression: CommonExpression,
    direction: SortOrder,
    uri_literal: String,
}

impl OrderExpression {
    pub(crate) fn new(
        expression: CommonExpression,
        direction: SortOrder,
        uri_literal: String,
    ) -> Self {
        Self {
            expression,
            direction,
            uri_literal,
        }
    }

    /// The sort expression.
    pub fn expression(&self) -> &CommonExpression {
        &self.expression
    }

    /// The sort direction (`asc` when omitted in the source).
    pub fn direction(&self) -> SortOrder {
        self.direction
    }

    /// The exact source substring of this term.
    pub fn uri_literal(&self) -> &str {
        &self.uri_literal
    }
}

/// A parsed `$filter` option: the root expression plus the original text.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpression {
    expression: CommonExpression,
    text: String,
}

impl FilterExpression {
    pub(crate) fn new(expression: CommonExpression, text: String) -> Self {
        Self { expression, text }
    }

    /// The root of the expression tree.
    pub fn expression(&self) -> &CommonExpression {
        &self.expression
    }

    /// The raw `$filter` string as received.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Dispatch the tree through a visitor, finishing with
    /// [`ExpressionVisitor::visit_filter`].
    pub fn accept<V: ExpressionVisitor>(&self, visitor: &mut V) -> V::Output {
        walk_filter(visitor, self)
    }
}

/// A parsed `$orderby` option: the ordered terms plus the original text.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpression {
    orders: Vec<OrderExpression>,
    text: String,
}

impl OrderByExpression {
    pub(crate) fn new(orders: Vec<OrderExpression>, text: String) -> Self {
        Self { orders, text }
    }

    /// The terms, leftmost (highest priority) first.
    pub fn orders(&self) -> &[OrderExpression] {
        &self.orders
    }

    /// The raw `$orderby` string as received.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Dispatch every term through a visitor, finishing with
    /// [`ExpressionVisitor::visit_order_by`].
    pub fn accept<V: ExpressionVisitor>(&self, visitor: &mut V) -> V::Output {
        walk_order_by(visitor, self)
    }
}
