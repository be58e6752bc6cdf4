//! Visitor protocol for expression trees
//!
//! Double dispatch without reflection: the tree is a closed sum type and the
//! walk functions match on it exhaustively, so adding a node variant breaks
//! every visitor at compile time instead of at runtime.
//!
//! Traversal is a fixed post-order walk: every `visit_*` method receives
//! the node together with the already-computed results of its children.
//! A traversal is synchronous and single-threaded; visitors may carry
//! accumulator state for one traversal but the contract requires none
//! across separate trees.

use super::expression::{
    BinaryExpression, CommonExpression, FilterExpression, LiteralExpression, MemberExpression,
    MethodExpression, OrderByExpression, OrderExpression, PropertyExpression, UnaryExpression,
};

/// Bottom-up evaluator/renderer over an expression tree.
pub trait ExpressionVisitor {
    /// Result type threaded through the traversal.
    type Output;

    /// Visit a literal node.
    fn visit_literal(&mut self, expr: &LiteralExpression) -> Self::Output;

    /// Visit a property reference.
    fn visit_property(&mut self, expr: &PropertyExpression) -> Self::Output;

    /// Visit a member access; `source` and `path` are the child results.
    fn visit_member(
        &mut self,
        expr: &MemberExpression,
        source: Self::Output,
        path: Self::Output,
    ) -> Self::Output;

    /// Visit a unary operation over its operand's result.
    fn visit_unary(&mut self, expr: &UnaryExpression, operand: Self::Output) -> Self::Output;

    /// Visit a binary operation over its operands' results.
    fn visit_binary(
        &mut self,
        expr: &BinaryExpression,
        left: Self::Output,
        right: Self::Output,
    ) -> Self::Output;

    /// Visit a method call over its parameters' results.
    fn visit_method(
        &mut self,
        expr: &MethodExpression,
        parameters: Vec<Self::Output>,
    ) -> Self::Output;

    /// Visit one `$orderby` term over its expression's result.
    fn visit_order(&mut self, expr: &OrderExpression, expression: Self::Output) -> Self::Output;

    /// Visit the `$filter` root over the tree's result.
    fn visit_filter(&mut self, filter: &FilterExpression, expression: Self::Output)
    -> Self::Output;

    /// Visit the `$orderby` root over all term results.
    fn visit_order_by(
        &mut self,
        order_by: &OrderByExpression,
        orders: Vec<Self::Output>,
    ) -> Self::Output;
}

/// Post-order walk of a single expression node.
pub fn walk_expression<V: ExpressionVisitor>(
    visitor: &mut V,
    expr: &CommonExpression,
) -> V::Output {
    match expr {
        CommonExpression::Literal(e) => visitor.visit_literal(e),
        CommonExpression::Property(e) => visitor.visit_property(e),
        CommonExpression::Member(e) => {
            let source = walk_expression(visitor, e.source());
            let path = walk_expression(visitor, e.path());
            visitor.visit_member(e, source, path)
        }
        CommonExpression::Unary(e) => {
            let operand = walk_expression(visitor, e.operand());
            visitor.visit_unary(e, operand)
        }
        CommonExpression::Binary(e) => {
            let left = walk_expression(visitor, e.left());
            let right = walk_expression(visitor, e.right());
            visitor.visit_binary(e, left, right)
        }
        CommonExpression::Method(e) => {
            let parameters = e
                .parameters()
                .iter()
                .map(|p| walk_expression(visitor, p))
                .collect();
            visitor.visit_method(e, parameters)
        }
    }
}

/// Walk a filter root: the tree first, then [`ExpressionVisitor::visit_filter`].
pub fn walk_filter<V: ExpressionVisitor>(visitor: &mut V, filter: &FilterExpression) -> V::Output {
    let expression = walk_expression(visitor, filter.expression());
    visitor.visit_filter(filter, expression)
}

/// Walk an orderby root: each term (expression, then
/// [`ExpressionVisitor::visit_order`]) in source order, then
/// [`ExpressionVisitor::visit_order_by`].
pub fn walk_order_by<V: ExpressionVisitor>(
    visitor: &mut V,
    order_by: &OrderByExpression,
) -> V::Output {
    let orders = order_by
        .orders()
        .iter()
        .map(|order| {
            let expression = walk_expression(visitor, order.expression());
            visitor.visit_order(order, expression)
        })
        .collect();
    visitor.visit_order_by(order_by, orders)
}
