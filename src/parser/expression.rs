//! Recursive-descent parser for `$filter` and `$orderby`
//!
//! Leveled descent in precedence order: `or` → `and` → comparison →
//! additive → multiplicative → unary → member chains → primary. Each
//! binary level loops left-associatively at its own precedence and defers
//! to the next-tighter level for operands.
//!
//! Property and member chains resolve against the entity data model as
//! they parse; every constructed node carries a non-null EDM type or the
//! parse fails. Nesting depth and input length are bounded up front so
//! pathological inputs fail typed instead of exhausting the call stack.

use super::error::{ExpressionParserError, ParseResult};
use super::literal::parse_literal_token;
use super::method::{METHOD_TABLE, MethodSignature, ResultRule};
use super::promote::{binary_result, unary_result};
use super::tokenizer::{Token, TokenKind, Tokenizer};
use super::ParserLimits;
use crate::ast::{
    BinaryExpression, BinaryOperator, CommonExpression, FilterExpression, LiteralExpression,
    LiteralValue, MemberExpression, MethodExpression, MethodOperator, OrderByExpression,
    OrderExpression, PropertyExpression, ResolvedProperty, SortOrder, UnaryExpression,
    UnaryOperator,
};
use crate::edm::{EdmSimpleType, EdmType, EntityDataModel, EntityType, PropertyKind};
use smallvec::SmallVec;
use std::sync::Arc;

/// Parse a `$filter` value against the target entity type.
pub fn parse_filter(
    text: &str,
    target: &Arc<EntityType>,
    model: &dyn EntityDataModel,
    limits: &ParserLimits,
) -> ParseResult<FilterExpression> {
    log::trace!("parsing $filter against {}", target.qualified_name());
    let mut parser = ExpressionParser::new(text, target, model, limits)?;
    let expression = parser.parse_expression()?;
    parser.expect_end()?;
    Ok(FilterExpression::new(expression, text.to_string()))
}

/// Parse an `$orderby` value against the target entity type.
pub fn parse_order_by(
    text: &str,
    target: &Arc<EntityType>,
    model: &dyn EntityDataModel,
    limits: &ParserLimits,
) -> ParseResult<OrderByExpression> {
    log::trace!("parsing $orderby against {}", target.qualified_name());
    let mut parser = ExpressionParser::new(text, target, model, limits)?;
    let mut orders = Vec::new();
    loop {
        let start = parser.current_offset();
        let expression = parser.parse_expression()?;
        if expression.edm_type().simple().is_none() {
            return Err(ExpressionParserError::UnorderableTerm {
                actual: expression.edm_type().type_name(),
                position: start,
            });
        }
        let direction = parser.take_sort_direction();
        let uri_literal = parser.source_since(start);
        orders.push(OrderExpression::new(expression, direction, uri_literal));
        match parser.current().copied() {
            Some(token) if token.kind == TokenKind::Comma => parser.advance(),
            Some(token) => {
                return Err(ExpressionParserError::UnexpectedToken {
                    token: token.text.to_string(),
                    position: token.offset,
                });
            }
            None => break,
        }
    }
    Ok(OrderByExpression::new(orders, text.to_string()))
}

struct ExpressionParser<'a> {
    input: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
    target: Arc<EntityType>,
    model: &'a dyn EntityDataModel,
    limits: &'a ParserLimits,
    depth: usize,
}

impl<'a> ExpressionParser<'a> {
    fn new(
        input: &'a str,
        target: &Arc<EntityType>,
        model: &'a dyn EntityDataModel,
        limits: &'a ParserLimits,
    ) -> ParseResult<Self> {
        if input.len() > limits.max_input_length {
            return Err(ExpressionParserError::InputTooLong {
                length: input.len(),
                limit: limits.max_input_length,
            });
        }
        let tokens = Tokenizer::new(input).tokenize_all()?;
        Ok(Self {
            input,
            tokens,
            pos: 0,
            target: Arc::clone(target),
            model,
            limits,
            depth: 0,
        })
    }

    #[inline]
    fn current(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    #[inline]
    fn advance(&mut self) {
        self.pos += 1;
    }

    /// Offset of the current token, or end of input when exhausted.
    fn current_offset(&self) -> usize {
        self.current().map_or(self.input.len(), |t| t.offset)
    }

    /// The exact source text from `start` through the last consumed token.
    fn source_since(&self, start: usize) -> String {
        let end = self
            .pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(start, |t| t.end());
        self.input[start..end].to_string()
    }

    fn expect_end(&self) -> ParseResult<()> {
        match self.current() {
            None => Ok(()),
            Some(token) => Err(ExpressionParserError::UnexpectedToken {
                token: token.text.to_string(),
                position: token.offset,
            }),
        }
    }

    /// Entry point for one (sub-)expression; owns the nesting-depth guard.
    fn parse_expression(&mut self) -> ParseResult<CommonExpression> {
        if self.depth >= self.limits.max_depth {
            return Err(ExpressionParserError::NestingTooDeep {
                limit: self.limits.max_depth,
            });
        }
        self.depth += 1;
        let result = self.parse_or();
        self.depth -= 1;
        result
    }

    fn peek_operator(&self, allowed: &[BinaryOperator]) -> Option<(BinaryOperator, usize)> {
        match self.current() {
            Some(Token {
                kind: TokenKind::BinaryOp(op),
                offset,
                ..
            }) if allowed.contains(op) => Some((*op, *offset)),
            _ => None,
        }
    }

    fn parse_or(&mut self) -> ParseResult<CommonExpression> {
        let start = self.current_offset();
        let mut left = self.parse_and()?;
        while let Some((op, op_offset)) = self.peek_operator(&[BinaryOperator::Or]) {
            self.advance();
            let right = self.parse_and()?;
            left = self.new_binary(op, left, right, start, op_offset)?;
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<CommonExpression> {
        let start = self.current_offset();
        let mut left = self.parse_comparison()?;
        while let Some((op, op_offset)) = self.peek_operator(&[BinaryOperator::And]) {
            self.advance();
            let right = self.parse_comparison()?;
            left = self.new_binary(op, left, right, start, op_offset)?;
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> ParseResult<CommonExpression> {
        const OPS: [BinaryOperator; 6] = [
            BinaryOperator::Eq,
            BinaryOperator::Ne,
            BinaryOperator::Lt,
            BinaryOperator::Le,
            BinaryOperator::Gt,
            BinaryOperator::Ge,
        ];
        let start = self.current_offset();
        let mut left = self.parse_additive()?;
        while let Some((op, op_offset)) = self.peek_operator(&OPS) {
            self.advance();
            let right = self.parse_additive()?;
            left = self.new_binary(op, left, right, start, op_offset)?;
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseResult<CommonExpression> {
        const OPS: [BinaryOperator; 2] = [BinaryOperator::Add, BinaryOperator::Sub];
        let start = self.current_offset();
        let mut left = self.parse_multiplicative()?;
        while let Some((op, op_offset)) = self.peek_operator(&OPS) {
            self.advance();
            let right = self.parse_multiplicative()?;
            left = self.new_binary(op, left, right, start, op_offset)?;
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<CommonExpression> {
        const OPS: [BinaryOperator; 3] = [
            BinaryOperator::Mul,
            BinaryOperator::Div,
            BinaryOperator::Mod,
        ];
        let start = self.current_offset();
        let mut left = self.parse_unary()?;
        while let Some((op, op_offset)) = self.peek_operator(&OPS) {
            self.advance();
            let right = self.parse_unary()?;
            left = self.new_binary(op, left, right, start, op_offset)?;
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<CommonExpression> {
        let operator = match self.current() {
            Some(token) if token.kind == TokenKind::Not => Some((UnaryOperator::Not, *token)),
            Some(token) if token.kind == TokenKind::Minus => Some((UnaryOperator::Minus, *token)),
            _ => None,
        };
        let Some((operator, token)) = operator else {
            return self.parse_postfix();
        };
        self.advance();

        if self.depth >= self.limits.max_depth {
            return Err(ExpressionParserError::NestingTooDeep {
                limit: self.limits.max_depth,
            });
        }
        self.depth += 1;
        let operand = self.parse_unary();
        self.depth -= 1;
        let operand = operand?;

        let operand_type = operand.edm_type();
        let result = operand_type
            .simple()
            .and_then(|kind| unary_result(operator, kind))
            .ok_or_else(|| ExpressionParserError::IncompatibleUnaryOperandType {
                operator: operator.as_str(),
                operand: operand_type.type_name(),
                position: token.offset,
            })?;
        let uri_literal = self.source_since(token.offset);
        Ok(CommonExpression::Unary(UnaryExpression::new(
            operator,
            operand,
            EdmType::Simple(result),
            uri_literal,
        )))
    }

    /// Primary expression plus any trailing `/`-qualified member segments.
    fn parse_postfix(&mut self) -> ParseResult<CommonExpression> {
        let start = self.current_offset();
        let mut expr = self.parse_primary()?;
        while self.current().is_some_and(|t| t.kind == TokenKind::Slash) {
            self.advance();
            let segment_token = match self.current() {
                Some(token) if token.kind == TokenKind::Identifier => *token,
                Some(token) => {
                    return Err(ExpressionParserError::UnexpectedToken {
                        token: token.text.to_string(),
                        position: token.offset,
                    });
                }
                None => return Err(ExpressionParserError::UnexpectedEnd),
            };
            self.advance();
            let segment = self.resolve_segment(&expr.edm_type(), &segment_token)?;
            let member_type = segment.edm_type();
            let uri_literal = self.source_since(start);
            expr = CommonExpression::Member(MemberExpression::new(
                expr,
                segment,
                member_type,
                uri_literal,
            ));
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> ParseResult<CommonExpression> {
        let token = match self.current() {
            Some(token) => *token,
            None => return Err(ExpressionParserError::UnexpectedEnd),
        };
        match token.kind {
            TokenKind::Literal => {
                self.advance();
                let parsed = parse_literal_token(&token)?;
                Ok(CommonExpression::Literal(LiteralExpression::new(
                    parsed.value,
                    token.text.to_string(),
                )))
            }
            TokenKind::OpenParen => {
                self.advance();
                let inner = self.parse_expression()?;
                match self.current().copied() {
                    Some(close) if close.kind == TokenKind::CloseParen => {
                        self.advance();
                        Ok(inner)
                    }
                    _ => Err(ExpressionParserError::UnbalancedParentheses {
                        position: token.offset,
                    }),
                }
            }
            TokenKind::Identifier => {
                self.advance();
                if self.current().is_some_and(|t| t.kind == TokenKind::OpenParen) {
                    self.parse_method(&token)
                } else {
                    let target = Arc::clone(&self.target);
                    self.resolve_on_entity(&target, &token)
                }
            }
            _ => Err(ExpressionParserError::UnexpectedToken {
                token: token.text.to_string(),
                position: token.offset,
            }),
        }
    }

    /// Resolve one member-chain segment against the type to its left.
    fn resolve_segment(
        &self,
        source_type: &EdmType,
        token: &Token<'a>,
    ) -> ParseResult<CommonExpression> {
        match source_type {
            EdmType::Entity(et) => {
                let et = Arc::clone(et);
                self.resolve_on_entity(&et, token)
            }
            EdmType::Complex(ct) => match ct.property(token.text) {
                Some(property) => {
                    let edm_type = property_type(&property.kind);
                    Ok(CommonExpression::Property(PropertyExpression::new(
                        token.text.to_string(),
                        ResolvedProperty::Structural(property),
                        edm_type,
                        token.text.to_string(),
                    )))
                }
                None => Err(ExpressionParserError::UnresolvableProperty {
                    name: token.text.to_string(),
                    on_type: ct.qualified_name(),
                    position: token.offset,
                }),
            },
            EdmType::Simple(kind) => Err(ExpressionParserError::MemberOnPrimitive {
                name: token.text.to_string(),
                on_type: kind.name().to_string(),
                position: token.offset,
            }),
        }
    }

    /// Resolve an identifier as a structural property or to-one navigation
    /// of an entity type.
    fn resolve_on_entity(
        &self,
        entity_type: &Arc<EntityType>,
        token: &Token<'a>,
    ) -> ParseResult<CommonExpression> {
        if let Some(property) = entity_type.property(token.text) {
            let edm_type = property_type(&property.kind);
            return Ok(CommonExpression::Property(PropertyExpression::new(
                token.text.to_string(),
                ResolvedProperty::Structural(property),
                edm_type,
                token.text.to_string(),
            )));
        }
        if let Some(navigation) = entity_type.navigation(token.text) {
            if navigation.to_many {
                return Err(ExpressionParserError::CollectionNavigation {
                    name: token.text.to_string(),
                    position: token.offset,
                });
            }
            let related = self
                .model
                .entity_set(&navigation.target_set)
                .and_then(|set| self.model.entity_type_of(&set))
                .ok_or_else(|| ExpressionParserError::UnresolvableProperty {
                    name: token.text.to_string(),
                    on_type: entity_type.qualified_name(),
                    position: token.offset,
                })?;
            return Ok(CommonExpression::Property(PropertyExpression::new(
                token.text.to_string(),
                ResolvedProperty::Navigation(navigation),
                EdmType::Entity(related),
                token.text.to_string(),
            )));
        }
        Err(ExpressionParserError::UnresolvableProperty {
            name: token.text.to_string(),
            on_type: entity_type.qualified_name(),
            position: token.offset,
        })
    }

    fn parse_method(&mut self, name_token: &Token<'a>) -> ParseResult<CommonExpression> {
        let signature = METHOD_TABLE.get(name_token.text).ok_or_else(|| {
            ExpressionParserError::UnknownMethod {
                name: name_token.text.to_string(),
                position: name_token.offset,
            }
        })?;

        let open_offset = match self.current() {
            Some(token) if token.kind == TokenKind::OpenParen => token.offset,
            _ => return Err(ExpressionParserError::UnexpectedEnd),
        };
        self.advance();

        let mut parameters: SmallVec<[CommonExpression; 2]> = SmallVec::new();
        if self.current().is_some_and(|t| t.kind == TokenKind::CloseParen) {
            self.advance();
        } else {
            loop {
                parameters.push(self.parse_expression()?);
                match self.current().copied() {
                    Some(token) if token.kind == TokenKind::Comma => self.advance(),
                    Some(token) if token.kind == TokenKind::CloseParen => {
                        self.advance();
                        break;
                    }
                    Some(token) => {
                        return Err(ExpressionParserError::UnexpectedToken {
                            token: token.text.to_string(),
                            position: token.offset,
                        });
                    }
                    None => {
                        return Err(ExpressionParserError::UnbalancedParentheses {
                            position: open_offset,
                        });
                    }
                }
            }
        }

        if !signature.accepts_arity(parameters.len()) {
            return Err(ExpressionParserError::MethodArity {
                method: signature.method.as_str(),
                expected: signature.describe_arity(),
                actual: parameters.len(),
            });
        }

        let result_type = self.method_result_type(signature, &parameters, name_token.offset)?;
        let uri_literal = self.source_since(name_token.offset);
        Ok(CommonExpression::Method(MethodExpression::new(
            signature.method,
            parameters,
            result_type,
            uri_literal,
        )))
    }

    /// Validate parameter types and derive the result type.
    fn method_result_type(
        &self,
        signature: &MethodSignature,
        parameters: &[CommonExpression],
        method_offset: usize,
    ) -> ParseResult<EdmType> {
        // isof/cast carry their type name as the trailing string literal;
        // any leading parameter is an unconstrained expression.
        if matches!(
            signature.method,
            MethodOperator::IsOf | MethodOperator::Cast
        ) {
            let Some(last) = parameters.last() else {
                return Err(ExpressionParserError::MethodArity {
                    method: signature.method.as_str(),
                    expected: signature.describe_arity(),
                    actual: 0,
                });
            };
            let type_name = match last {
                CommonExpression::Literal(lit) => match lit.value() {
                    LiteralValue::String(s) => Some(s.clone()),
                    _ => None,
                },
                _ => None,
            };
            let type_name =
                type_name.ok_or_else(|| ExpressionParserError::MethodParameterType {
                    method: signature.method.as_str(),
                    index: parameters.len(),
                    expected: "a type name string",
                    actual: last.edm_type().type_name(),
                })?;
            let named = EdmSimpleType::from_name(&type_name).ok_or_else(|| {
                ExpressionParserError::UnknownTypeName {
                    name: type_name,
                    position: method_offset,
                }
            })?;
            return Ok(match signature.result {
                ResultRule::CastTarget => EdmType::Simple(named),
                _ => EdmType::Simple(EdmSimpleType::Boolean),
            });
        }

        for (index, parameter) in parameters.iter().enumerate() {
            let constraint = signature.constraint(index);
            let parameter_type = parameter.edm_type();
            let accepted = parameter_type
                .simple()
                .is_some_and(|kind| constraint.accepts(kind));
            if !accepted {
                return Err(ExpressionParserError::MethodParameterType {
                    method: signature.method.as_str(),
                    index: index + 1,
                    expected: constraint.describe(),
                    actual: parameter_type.type_name(),
                });
            }
        }

        Ok(match signature.result {
            ResultRule::Fixed(kind) => EdmType::Simple(kind),
            ResultRule::FractionalOfFirst => {
                let kind = match parameters.first().and_then(|p| p.edm_type().simple()) {
                    Some(EdmSimpleType::Decimal) => EdmSimpleType::Decimal,
                    _ => EdmSimpleType::Double,
                };
                EdmType::Simple(kind)
            }
            ResultRule::CastTarget => unreachable!("cast handled above"),
        })
    }

    fn new_binary(
        &self,
        operator: BinaryOperator,
        left: CommonExpression,
        right: CommonExpression,
        start: usize,
        operator_offset: usize,
    ) -> ParseResult<CommonExpression> {
        let left_type = left.edm_type();
        let right_type = right.edm_type();
        let result = match (left_type.simple(), right_type.simple()) {
            (Some(l), Some(r)) => binary_result(operator.category(), l, r),
            _ => None,
        }
        .ok_or_else(|| ExpressionParserError::IncompatibleOperandTypes {
            operator: operator.as_str(),
            left: left_type.type_name(),
            right: right_type.type_name(),
            position: operator_offset,
        })?;
        let uri_literal = self.source_since(start);
        Ok(CommonExpression::Binary(BinaryExpression::new(
            operator,
            left,
            right,
            EdmType::Simple(result),
            uri_literal,
        )))
    }

    /// Consume a trailing `asc`/`desc` keyword if present (orderby only;
    /// the words are not reserved and stay usable as property names).
    fn take_sort_direction(&mut self) -> SortOrder {
        let direction = match self.current() {
            Some(token) if token.kind == TokenKind::Identifier => match token.text {
                "asc" => Some(SortOrder::Asc),
                "desc" => Some(SortOrder::Desc),
                _ => None,
            },
            _ => None,
        };
        match direction {
            Some(direction) => {
                self.advance();
                direction
            }
            None => SortOrder::Asc,
        }
    }
}

fn property_type(kind: &PropertyKind) -> EdmType {
    match kind {
        PropertyKind::Simple(simple) => EdmType::Simple(*simple),
        PropertyKind::Complex(complex) => EdmType::Complex(Arc::clone(complex)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edm::{InMemoryModel, ModelBuilder, TypeRef};
    use pretty_assertions::assert_eq;

    fn model() -> Arc<InMemoryModel> {
        ModelBuilder::new("Test")
            .complex_type(
                "Address",
                vec![
                    ("Street", TypeRef::Simple(EdmSimpleType::String)),
                    ("City", TypeRef::Simple(EdmSimpleType::String)),
                ],
            )
            .entity_type(
                "Order",
                vec!["OrderId"],
                vec![
                    ("OrderId", TypeRef::Simple(EdmSimpleType::Int32)),
                    ("Total", TypeRef::Simple(EdmSimpleType::Decimal)),
                ],
                Vec::<(&str, &str, bool)>::new(),
            )
            .entity_type(
                "Employee",
                vec!["EmployeeId"],
                vec![
                    ("EmployeeId", TypeRef::Simple(EdmSimpleType::Int32)),
                    ("Name", TypeRef::Simple(EdmSimpleType::String)),
                    ("Age", TypeRef::Simple(EdmSimpleType::Byte)),
                    ("Price", TypeRef::Simple(EdmSimpleType::Decimal)),
                    ("HireDate", TypeRef::Simple(EdmSimpleType::DateTime)),
                    ("Location", TypeRef::Complex("Address".to_string())),
                ],
                vec![
                    ("Orders", "Orders", true),
                    ("Manager", "Employees", false),
                ],
            )
            .entity_set("Employees", "Employee")
            .entity_set("Orders", "Order")
            .build()
            .unwrap()
    }

    fn employee(model: &Arc<InMemoryModel>) -> Arc<EntityType> {
        model.entity_type("Test.Employee").unwrap()
    }

    fn filter(text: &str) -> ParseResult<FilterExpression> {
        let model = model();
        let target = employee(&model);
        parse_filter(text, &target, model.as_ref(), &ParserLimits::default())
    }

    fn order_by(text: &str) -> ParseResult<OrderByExpression> {
        let model = model();
        let target = employee(&model);
        parse_order_by(text, &target, model.as_ref(), &ParserLimits::default())
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let parsed = filter("EmployeeId eq 1 or Age eq 2 and Price eq 3").unwrap();
        let CommonExpression::Binary(root) = parsed.expression() else {
            panic!("expected binary root");
        };
        assert_eq!(root.operator(), BinaryOperator::Or);
        let CommonExpression::Binary(right) = root.right() else {
            panic!("expected binary right");
        };
        assert_eq!(right.operator(), BinaryOperator::And);
    }

    #[test]
    fn comparison_chain_types_to_boolean() {
        let parsed = filter("Price gt 10 and Price lt 100").unwrap();
        assert_eq!(
            parsed.expression().edm_type(),
            EdmType::Simple(EdmSimpleType::Boolean)
        );
        let CommonExpression::Binary(root) = parsed.expression() else {
            panic!("expected binary root");
        };
        let CommonExpression::Binary(left) = root.left() else {
            panic!("expected binary left");
        };
        assert_eq!(left.operator(), BinaryOperator::Gt);
        let CommonExpression::Literal(ten) = left.right() else {
            panic!("expected literal");
        };
        assert_eq!(ten.value(), &LiteralValue::Int32(10));
    }

    #[test]
    fn byte_arithmetic_keeps_its_kind() {
        let parsed = filter("Age add Age eq 4").unwrap();
        let CommonExpression::Binary(root) = parsed.expression() else {
            panic!("expected binary root");
        };
        assert_eq!(
            root.left().edm_type(),
            EdmType::Simple(EdmSimpleType::Byte)
        );
    }

    #[test]
    fn uri_literal_preserves_source_spans() {
        let parsed = filter("Price  gt  10").unwrap();
        assert_eq!(parsed.expression().uri_literal(), "Price  gt  10");
        let CommonExpression::Binary(root) = parsed.expression() else {
            panic!("expected binary root");
        };
        assert_eq!(root.left().uri_literal(), "Price");
        assert_eq!(root.right().uri_literal(), "10");
    }

    #[test]
    fn member_chain_resolves_through_complex_and_navigation() {
        let parsed = filter("Location/City eq 'Rome'").unwrap();
        let CommonExpression::Binary(root) = parsed.expression() else {
            panic!("expected binary root");
        };
        let CommonExpression::Member(member) = root.left() else {
            panic!("expected member");
        };
        assert_eq!(
            member.source().edm_type().type_name(),
            "Test.Address"
        );
        assert_eq!(
            root.left().edm_type(),
            EdmType::Simple(EdmSimpleType::String)
        );

        let parsed = filter("Manager/Name eq 'x'").unwrap();
        let CommonExpression::Binary(root) = parsed.expression() else {
            panic!("expected binary root");
        };
        let CommonExpression::Member(member) = root.left() else {
            panic!("expected member");
        };
        assert_eq!(member.uri_literal(), "Manager/Name");
    }

    #[test]
    fn unresolved_navigation_names_the_segment() {
        let err = filter("NonExistentNav/Name eq 'x'").unwrap_err();
        assert_eq!(
            err,
            ExpressionParserError::UnresolvableProperty {
                name: "NonExistentNav".to_string(),
                on_type: "Test.Employee".to_string(),
                position: 0,
            }
        );
    }

    #[test]
    fn collection_navigation_is_rejected_in_expressions() {
        let err = filter("Orders/OrderId eq 1").unwrap_err();
        assert!(matches!(
            err,
            ExpressionParserError::CollectionNavigation { ref name, .. } if name == "Orders"
        ));
    }

    #[test]
    fn member_on_primitive_is_rejected() {
        let err = filter("Name/Length eq 1").unwrap_err();
        assert!(matches!(
            err,
            ExpressionParserError::MemberOnPrimitive { .. }
        ));
    }

    #[test]
    fn startswith_arity_and_parameter_types() {
        let err = filter("startswith(Name)").unwrap_err();
        assert_eq!(
            err,
            ExpressionParserError::MethodArity {
                method: "startswith",
                expected: "2".to_string(),
                actual: 1,
            }
        );

        let err = filter("startswith(Name,1)").unwrap_err();
        assert_eq!(
            err,
            ExpressionParserError::MethodParameterType {
                method: "startswith",
                index: 2,
                expected: "Edm.String",
                actual: "Edm.Int32".to_string(),
            }
        );

        let parsed = filter("startswith(Name,'A')").unwrap();
        assert_eq!(
            parsed.expression().edm_type(),
            EdmType::Simple(EdmSimpleType::Boolean)
        );
    }

    #[test]
    fn substring_accepts_two_or_three_parameters() {
        assert!(filter("substring(Name,1) eq 'a'").is_ok());
        assert!(filter("substring(Name,1,2) eq 'a'").is_ok());
        assert!(matches!(
            filter("substring(Name,1,2,3) eq 'a'").unwrap_err(),
            ExpressionParserError::MethodArity { .. }
        ));
    }

    #[test]
    fn unknown_method_is_a_typed_error() {
        let err = filter("frobnicate(Name)").unwrap_err();
        assert!(matches!(
            err,
            ExpressionParserError::UnknownMethod { ref name, .. } if name == "frobnicate"
        ));
    }

    #[test]
    fn year_requires_a_date() {
        assert!(filter("year(HireDate) eq 2024").is_ok());
        assert!(matches!(
            filter("year(Name) eq 2024").unwrap_err(),
            ExpressionParserError::MethodParameterType { .. }
        ));
    }

    #[test]
    fn round_result_follows_input_kind() {
        let parsed = filter("round(Price) eq 10m").unwrap();
        let CommonExpression::Binary(root) = parsed.expression() else {
            panic!("expected binary root");
        };
        assert_eq!(
            root.left().edm_type(),
            EdmType::Simple(EdmSimpleType::Decimal)
        );
    }

    #[test]
    fn cast_takes_the_named_type() {
        let parsed = filter("cast(EmployeeId,'Edm.Int64') eq 5L").unwrap();
        let CommonExpression::Binary(root) = parsed.expression() else {
            panic!("expected binary root");
        };
        assert_eq!(
            root.left().edm_type(),
            EdmType::Simple(EdmSimpleType::Int64)
        );

        assert!(matches!(
            filter("cast(EmployeeId,'Edm.Bogus') eq 5").unwrap_err(),
            ExpressionParserError::UnknownTypeName { .. }
        ));
        assert!(filter("isof('Edm.Int32')").is_ok());
    }

    #[test]
    fn incompatible_operands_fail_typed() {
        let err = filter("Name add 1").unwrap_err();
        assert!(matches!(
            err,
            ExpressionParserError::IncompatibleOperandTypes {
                operator: "add",
                ..
            }
        ));

        let err = filter("Location eq 'x'").unwrap_err();
        assert!(matches!(
            err,
            ExpressionParserError::IncompatibleOperandTypes { .. }
        ));
    }

    #[test]
    fn null_compares_with_eq_but_not_lt() {
        assert!(filter("Name eq null").is_ok());
        assert!(matches!(
            filter("Name lt null").unwrap_err(),
            ExpressionParserError::IncompatibleOperandTypes { .. }
        ));
    }

    #[test]
    fn not_and_minus_type_check() {
        assert!(filter("not (Price gt 10)").is_ok());
        assert!(matches!(
            filter("not Name").unwrap_err(),
            ExpressionParserError::IncompatibleUnaryOperandType { .. }
        ));
        assert!(filter("-Price eq -5").is_ok());
    }

    #[test]
    fn unbalanced_parentheses_are_reported() {
        let err = filter("(Price gt 10").unwrap_err();
        assert_eq!(
            err,
            ExpressionParserError::UnbalancedParentheses { position: 0 }
        );
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        assert!(matches!(
            filter("Price gt 10 Name").unwrap_err(),
            ExpressionParserError::UnexpectedToken { .. }
        ));
    }

    #[test]
    fn nesting_depth_is_guarded() {
        let limits = ParserLimits {
            max_depth: 8,
            ..ParserLimits::default()
        };
        let model = model();
        let target = employee(&model);
        let deep = format!("{}Price gt 10{}", "(".repeat(40), ")".repeat(40));
        let err = parse_filter(&deep, &target, model.as_ref(), &limits).unwrap_err();
        assert_eq!(err, ExpressionParserError::NestingTooDeep { limit: 8 });
    }

    #[test]
    fn orderby_terms_and_directions() {
        let parsed = order_by("Name desc,EmployeeId asc").unwrap();
        let orders = parsed.orders();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].direction(), SortOrder::Desc);
        assert_eq!(orders[0].uri_literal(), "Name desc");
        assert_eq!(orders[1].direction(), SortOrder::Asc);

        let parsed = order_by("Name").unwrap();
        assert_eq!(parsed.orders()[0].direction(), SortOrder::Asc);
    }

    #[test]
    fn orderby_rejects_non_primitive_terms() {
        assert!(matches!(
            order_by("Location").unwrap_err(),
            ExpressionParserError::UnorderableTerm { .. }
        ));
    }

    #[test]
    fn orderby_accepts_computed_terms() {
        let parsed = order_by("Price mul 2 desc").unwrap();
        assert_eq!(parsed.orders()[0].direction(), SortOrder::Desc);
    }
}
