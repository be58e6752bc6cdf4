//! Canonical text rendering of expression trees
//!
//! Re-renders a parsed tree into filter syntax with explicit parentheses,
//! so the output reparses to a structurally identical tree regardless of
//! how the original spelled its precedence.

use super::expression::{
    BinaryExpression, FilterExpression, LiteralExpression, MemberExpression, MethodExpression,
    OrderByExpression, OrderExpression, PropertyExpression, UnaryExpression,
};
use super::operator::UnaryOperator;
use super::visitor::ExpressionVisitor;

/// Renders expressions back to canonical URI text.
#[derive(Debug, Default)]
pub struct ExpressionRenderer;

impl ExpressionVisitor for ExpressionRenderer {
    type Output = String;

    fn visit_literal(&mut self, expr: &LiteralExpression) -> String {
        expr.uri_literal().to_string()
    }

    fn visit_property(&mut self, expr: &PropertyExpression) -> String {
        expr.name().to_string()
    }

    fn visit_member(&mut self, _expr: &MemberExpression, source: String, path: String) -> String {
        format!("{source}/{path}")
    }

    fn visit_unary(&mut self, expr: &UnaryExpression, operand: String) -> String {
        match expr.operator() {
            UnaryOperator::Not => format!("(not {operand})"),
            // Wrapped so a rendered "-5" cannot re-lex as a negative literal.
            UnaryOperator::Minus => format!("(-({operand}))"),
        }
    }

    fn visit_binary(&mut self, expr: &BinaryExpression, left: String, right: String) -> String {
        format!("({left} {} {right})", expr.operator())
    }

    fn visit_method(&mut self, expr: &MethodExpression, parameters: Vec<String>) -> String {
        format!("{}({})", expr.method(), parameters.join(","))
    }

    fn visit_order(&mut self, expr: &OrderExpression, expression: String) -> String {
        format!("{expression} {}", expr.direction())
    }

    fn visit_filter(&mut self, _filter: &FilterExpression, expression: String) -> String {
        expression
    }

    fn visit_order_by(&mut self, _order_by: &OrderByExpression, orders: Vec<String>) -> String {
        orders.join(",")
    }
}
