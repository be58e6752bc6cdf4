//! Operator and method identifiers

use serde::Serialize;
use std::fmt;

/// Binary operators of the `$filter` grammar, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOperator {
    /// Logical `or`
    Or,
    /// Logical `and`
    And,
    /// Equality `eq`
    Eq,
    /// Inequality `ne`
    Ne,
    /// Less than `lt`
    Lt,
    /// Less than or equal `le`
    Le,
    /// Greater than `gt`
    Gt,
    /// Greater than or equal `ge`
    Ge,
    /// Addition `add`
    Add,
    /// Subtraction `sub`
    Sub,
    /// Multiplication `mul`
    Mul,
    /// Division `div`
    Div,
    /// Modulo `mod`
    Mod,
}

/// Operator families driving the type-promotion table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OperatorCategory {
    /// `and`, `or`: Boolean operands, Boolean result
    Logical,
    /// `eq`, `ne`: defined for every kind, Boolean result
    Equality,
    /// `lt`, `le`, `gt`, `ge`: ordered kinds only, Boolean result
    Relational,
    /// `add` .. `mod`: numeric operands, promoted numeric result
    Arithmetic,
}

impl BinaryOperator {
    /// The keyword as written in a URI.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Or => "or",
            BinaryOperator::And => "and",
            BinaryOperator::Eq => "eq",
            BinaryOperator::Ne => "ne",
            BinaryOperator::Lt => "lt",
            BinaryOperator::Le => "le",
            BinaryOperator::Gt => "gt",
            BinaryOperator::Ge => "ge",
            BinaryOperator::Add => "add",
            BinaryOperator::Sub => "sub",
            BinaryOperator::Mul => "mul",
            BinaryOperator::Div => "div",
            BinaryOperator::Mod => "mod",
        }
    }

    /// Which promotion-table family the operator belongs to.
    pub fn category(&self) -> OperatorCategory {
        match self {
            BinaryOperator::And | BinaryOperator::Or => OperatorCategory::Logical,
            BinaryOperator::Eq | BinaryOperator::Ne => OperatorCategory::Equality,
            BinaryOperator::Lt | BinaryOperator::Le | BinaryOperator::Gt | BinaryOperator::Ge => {
                OperatorCategory::Relational
            }
            BinaryOperator::Add
            | BinaryOperator::Sub
            | BinaryOperator::Mul
            | BinaryOperator::Div
            | BinaryOperator::Mod => OperatorCategory::Arithmetic,
        }
    }

    /// Resolve an operator keyword to its operator.
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "or" => Some(BinaryOperator::Or),
            "and" => Some(BinaryOperator::And),
            "eq" => Some(BinaryOperator::Eq),
            "ne" => Some(BinaryOperator::Ne),
            "lt" => Some(BinaryOperator::Lt),
            "le" => Some(BinaryOperator::Le),
            "gt" => Some(BinaryOperator::Gt),
            "ge" => Some(BinaryOperator::Ge),
            "add" => Some(BinaryOperator::Add),
            "sub" => Some(BinaryOperator::Sub),
            "mul" => Some(BinaryOperator::Mul),
            "div" => Some(BinaryOperator::Div),
            "mod" => Some(BinaryOperator::Mod),
            _ => None,
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unary operators: logical negation and arithmetic minus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnaryOperator {
    /// `not`
    Not,
    /// `-`
    Minus,
}

impl UnaryOperator {
    /// The operator as written in a URI.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "not",
            UnaryOperator::Minus => "-",
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The built-in method set of the v2 expression grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[allow(missing_docs)]
pub enum MethodOperator {
    SubstringOf,
    EndsWith,
    StartsWith,
    Length,
    IndexOf,
    Replace,
    Substring,
    ToLower,
    ToUpper,
    Trim,
    Concat,
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Round,
    Floor,
    Ceiling,
    IsOf,
    Cast,
}

impl MethodOperator {
    /// The method name as written in a URI.
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodOperator::SubstringOf => "substringof",
            MethodOperator::EndsWith => "endswith",
            MethodOperator::StartsWith => "startswith",
            MethodOperator::Length => "length",
            MethodOperator::IndexOf => "indexof",
            MethodOperator::Replace => "replace",
            MethodOperator::Substring => "substring",
            MethodOperator::ToLower => "tolower",
            MethodOperator::ToUpper => "toupper",
            MethodOperator::Trim => "trim",
            MethodOperator::Concat => "concat",
            MethodOperator::Year => "year",
            MethodOperator::Month => "month",
            MethodOperator::Day => "day",
            MethodOperator::Hour => "hour",
            MethodOperator::Minute => "minute",
            MethodOperator::Second => "second",
            MethodOperator::Round => "round",
            MethodOperator::Floor => "floor",
            MethodOperator::Ceiling => "ceiling",
            MethodOperator::IsOf => "isof",
            MethodOperator::Cast => "cast",
        }
    }
}

impl fmt::Display for MethodOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction of one `$orderby` term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SortOrder {
    /// Ascending, the default when no direction is written.
    Asc,
    /// Descending.
    Desc,
}

impl SortOrder {
    /// The direction keyword as written in a URI.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
