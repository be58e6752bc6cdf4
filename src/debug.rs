//! Best-effort JSON diagnostics for a resolved request
//!
//! Renders a [`UriInfo`] into a JSON block for debug endpoints. Rendering
//! is deliberately forgiving: a section that fails to serialize is logged
//! and degraded to `null` so the rest of the diagnostic payload survives.
//! This is the one place in the crate where an error is swallowed instead
//! of propagated.

use crate::ast::{
    BinaryExpression, ExpressionVisitor, FilterExpression, LiteralExpression, MemberExpression,
    MethodExpression, OrderByExpression, OrderExpression, PropertyExpression, UnaryExpression,
};
use crate::uri::UriInfo;
use serde_json::{Value, json};

/// JSON diagnostic rendering of a resolved request.
#[derive(Debug)]
pub struct DebugInfo;

impl DebugInfo {
    /// Render the aggregate. Each section is rendered independently and
    /// degrades to `null` on failure.
    pub fn from_uri_info(info: &UriInfo) -> Value {
        let filter = info
            .filter()
            .map(|f| best_effort("filter", || render_filter(f)))
            .unwrap_or(Value::Null);
        let order_by = info
            .order_by()
            .map(|o| best_effort("orderby", || render_order_by(o)))
            .unwrap_or(Value::Null);
        let expand: Vec<Value> = info
            .expand()
            .iter()
            .map(|path| {
                Value::Array(
                    path.iter()
                        .map(|nav| Value::String(nav.name.clone()))
                        .collect(),
                )
            })
            .collect();
        let select: Vec<Value> = info
            .select()
            .iter()
            .map(|item| {
                let mut path: Vec<String> =
                    item.navigation.iter().map(|nav| nav.name.clone()).collect();
                if let Some(property) = &item.property {
                    path.push(property.name.clone());
                }
                if item.star {
                    path.push("*".to_string());
                }
                Value::String(path.join("/"))
            })
            .collect();

        json!({
            "kind": info.kind(),
            "startEntitySet": info.start_entity_set().map(|s| s.name.clone()),
            "targetEntitySet": info.target_entity_set().map(|s| s.name.clone()),
            "targetEntityType": info.target_entity_type().map(|t| t.qualified_name()),
            "keyPredicates": info
                .key_predicates()
                .iter()
                .map(|key| json!({
                    "property": key.property.name,
                    "value": format!("{:?}", key.value),
                }))
                .collect::<Vec<_>>(),
            "navigation": info
                .navigation_segments()
                .iter()
                .map(|segment| segment.navigation.name.clone())
                .collect::<Vec<_>>(),
            "filter": filter,
            "orderby": order_by,
            "select": select,
            "expand": expand,
            "top": info.top(),
            "skip": info.skip(),
            "count": info.count(),
            "value": info.value(),
        })
    }
}

/// Run one rendering section; on failure log and degrade to `null`.
fn best_effort(section: &str, render: impl FnOnce() -> Result<Value, serde_json::Error>) -> Value {
    match render() {
        Ok(value) => value,
        Err(error) => {
            log::debug!("debug rendering of {section} degraded: {error}");
            Value::Null
        }
    }
}

fn render_filter(filter: &FilterExpression) -> Result<Value, serde_json::Error> {
    let mut renderer = JsonRenderer;
    Ok(json!({
        "text": filter.text(),
        "expression": filter.accept(&mut renderer),
    }))
}

fn render_order_by(order_by: &OrderByExpression) -> Result<Value, serde_json::Error> {
    let mut renderer = JsonRenderer;
    Ok(json!({
        "text": order_by.text(),
        "orders": order_by.accept(&mut renderer),
    }))
}

/// Structure-preserving JSON rendering of an expression tree.
#[derive(Debug, Default)]
pub struct JsonRenderer;

impl ExpressionVisitor for JsonRenderer {
    type Output = Value;

    fn visit_literal(&mut self, expr: &LiteralExpression) -> Value {
        json!({
            "nodeType": "literal",
            "type": expr.value().edm_type().name(),
            "value": expr.uri_literal(),
        })
    }

    fn visit_property(&mut self, expr: &PropertyExpression) -> Value {
        json!({
            "nodeType": "property",
            "name": expr.name(),
        })
    }

    fn visit_member(&mut self, expr: &MemberExpression, source: Value, path: Value) -> Value {
        json!({
            "nodeType": "member",
            "type": expr.edm_type().type_name(),
            "source": source,
            "path": path,
        })
    }

    fn visit_unary(&mut self, expr: &UnaryExpression, operand: Value) -> Value {
        json!({
            "nodeType": "unary",
            "operator": expr.operator().as_str(),
            "operand": operand,
        })
    }

    fn visit_binary(&mut self, expr: &BinaryExpression, left: Value, right: Value) -> Value {
        json!({
            "nodeType": "binary",
            "operator": expr.operator().as_str(),
            "type": expr.edm_type().type_name(),
            "left": left,
            "right": right,
        })
    }

    fn visit_method(&mut self, expr: &MethodExpression, parameters: Vec<Value>) -> Value {
        json!({
            "nodeType": "method",
            "operator": expr.method().as_str(),
            "parameters": parameters,
        })
    }

    fn visit_order(&mut self, expr: &OrderExpression, expression: Value) -> Value {
        json!({
            "nodeType": "order",
            "sortorder": expr.direction().as_str(),
            "expression": expression,
        })
    }

    fn visit_filter(&mut self, _filter: &FilterExpression, expression: Value) -> Value {
        expression
    }

    fn visit_order_by(&mut self, _order_by: &OrderByExpression, orders: Vec<Value>) -> Value {
        Value::Array(orders)
    }
}
