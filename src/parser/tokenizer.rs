//! Tokenizer for `$filter` / `$orderby` strings
//!
//! A single pass over the raw bytes. Every token keeps the exact source
//! slice and its byte offset so nodes can expose the substring they were
//! parsed from. Whitespace only separates tokens and is never emitted.

use super::error::{ExpressionParserError, ParseResult};
use crate::ast::BinaryOperator;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

/// Token classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
    /// `,`
    Comma,
    /// `/` between member segments
    Slash,
    /// Property, navigation or method name; may carry `.` qualification
    Identifier,
    /// One of the binary operator keywords
    BinaryOp(BinaryOperator),
    /// The `not` keyword
    Not,
    /// A `-` not attached to a numeric literal
    Minus,
    /// Any literal form; classified later by the literal parser
    Literal,
}

/// One lexed token: kind, exact source text, byte offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'input> {
    /// Classification.
    pub kind: TokenKind,
    /// The exact source slice, quotes and type prefixes included.
    pub text: &'input str,
    /// Byte offset of the first character.
    pub offset: usize,
}

impl<'input> Token<'input> {
    /// Byte offset one past the last character.
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }
}

/// Keyword table: operator keywords plus the keyword literals.
static KEYWORD_TABLE: Lazy<FxHashMap<&'static str, TokenKind>> = Lazy::new(|| {
    let mut map = FxHashMap::default();
    for op in [
        BinaryOperator::Or,
        BinaryOperator::And,
        BinaryOperator::Eq,
        BinaryOperator::Ne,
        BinaryOperator::Lt,
        BinaryOperator::Le,
        BinaryOperator::Gt,
        BinaryOperator::Ge,
        BinaryOperator::Add,
        BinaryOperator::Sub,
        BinaryOperator::Mul,
        BinaryOperator::Div,
        BinaryOperator::Mod,
    ] {
        map.insert(op.as_str(), TokenKind::BinaryOp(op));
    }
    map.insert("not", TokenKind::Not);
    map.insert("true", TokenKind::Literal);
    map.insert("false", TokenKind::Literal);
    map.insert("null", TokenKind::Literal);
    map
});

/// Identifier prefixes announcing a quoted typed literal.
const TYPED_LITERAL_PREFIXES: [&str; 6] = [
    "datetimeoffset",
    "datetime",
    "time",
    "guid",
    "binary",
    "X",
];

/// Tokenizer over a query-option string.
pub struct Tokenizer<'input> {
    input: &'input str,
    bytes: &'input [u8],
    pos: usize,
    end: usize,
}

impl<'input> Tokenizer<'input> {
    /// Create a tokenizer over the raw (percent-decoded) option value.
    pub fn new(input: &'input str) -> Self {
        let bytes = input.as_bytes();
        Self {
            input,
            bytes,
            pos: 0,
            end: bytes.len(),
        }
    }

    #[inline(always)]
    fn slice(&self, start: usize, end: usize) -> &'input str {
        &self.input[start..end]
    }

    #[inline(always)]
    fn is_id_start(ch: u8) -> bool {
        matches!(ch, b'A'..=b'Z' | b'a'..=b'z' | b'_')
    }

    #[inline(always)]
    fn is_id_continue(ch: u8) -> bool {
        // '.' stays inside the token so qualified names survive lexing;
        // the parser re-splits them where the grammar cares.
        matches!(ch, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'.')
    }

    #[inline(always)]
    fn skip_whitespace(&mut self) {
        while self.pos < self.end {
            match self.bytes[self.pos] {
                b' ' | b'\t' | b'\r' | b'\n' => self.pos += 1,
                _ => break,
            }
        }
    }

    /// Consume a quoted body starting at the opening quote, honoring the
    /// `''` escape. Returns the position one past the closing quote.
    fn scan_quoted(&mut self, literal_start: usize) -> ParseResult<()> {
        debug_assert_eq!(self.bytes[self.pos], b'\'');
        self.pos += 1;
        while self.pos < self.end {
            if self.bytes[self.pos] == b'\'' {
                if self.pos + 1 < self.end && self.bytes[self.pos + 1] == b'\'' {
                    self.pos += 2;
                    continue;
                }
                self.pos += 1;
                return Ok(());
            }
            self.pos += 1;
        }
        Err(ExpressionParserError::UnterminatedLiteral {
            position: literal_start,
        })
    }

    /// Consume a number: digits, optional fraction, optional exponent,
    /// optional single type-suffix letter. Validation happens later in the
    /// literal parser; the tokenizer only fixes the token boundary.
    fn scan_number(&mut self) {
        while self.pos < self.end && self.bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        if self.pos + 1 < self.end
            && self.bytes[self.pos] == b'.'
            && self.bytes[self.pos + 1].is_ascii_digit()
        {
            self.pos += 1;
            while self.pos < self.end && self.bytes[self.pos].is_ascii_digit() {
                self.pos += 1;
            }
        }
        if self.pos < self.end && matches!(self.bytes[self.pos], b'e' | b'E') {
            let mut ahead = self.pos + 1;
            if ahead < self.end && matches!(self.bytes[ahead], b'+' | b'-') {
                ahead += 1;
            }
            if ahead < self.end && self.bytes[ahead].is_ascii_digit() {
                self.pos = ahead;
                while self.pos < self.end && self.bytes[self.pos].is_ascii_digit() {
                    self.pos += 1;
                }
            }
        }
        if self.pos < self.end
            && matches!(
                self.bytes[self.pos],
                b'l' | b'L' | b'm' | b'M' | b'd' | b'D' | b'f' | b'F'
            )
        {
            self.pos += 1;
        }
    }

    /// Lex the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> ParseResult<Option<Token<'input>>> {
        self.skip_whitespace();
        if self.pos >= self.end {
            return Ok(None);
        }

        let start = self.pos;
        let kind = match self.bytes[self.pos] {
            b'(' => {
                self.pos += 1;
                TokenKind::OpenParen
            }
            b')' => {
                self.pos += 1;
                TokenKind::CloseParen
            }
            b',' => {
                self.pos += 1;
                TokenKind::Comma
            }
            b'/' => {
                self.pos += 1;
                TokenKind::Slash
            }
            b'\'' => {
                self.scan_quoted(start)?;
                TokenKind::Literal
            }
            b'-' => {
                // A minus glued to a digit belongs to the numeric literal;
                // anywhere else it is the unary operator.
                if self.pos + 1 < self.end && self.bytes[self.pos + 1].is_ascii_digit() {
                    self.pos += 1;
                    self.scan_number();
                    TokenKind::Literal
                } else {
                    self.pos += 1;
                    TokenKind::Minus
                }
            }
            b'0'..=b'9' => {
                self.scan_number();
                TokenKind::Literal
            }
            ch if Self::is_id_start(ch) => {
                while self.pos < self.end && Self::is_id_continue(self.bytes[self.pos]) {
                    self.pos += 1;
                }
                let word = self.slice(start, self.pos);
                if self.pos < self.end && self.bytes[self.pos] == b'\'' {
                    if TYPED_LITERAL_PREFIXES.contains(&word) {
                        self.scan_quoted(start)?;
                        TokenKind::Literal
                    } else {
                        return Err(ExpressionParserError::UnexpectedToken {
                            token: format!("{word}'"),
                            position: start,
                        });
                    }
                } else {
                    KEYWORD_TABLE
                        .get(word)
                        .copied()
                        .unwrap_or(TokenKind::Identifier)
                }
            }
            ch => {
                return Err(ExpressionParserError::UnrecognizedCharacter {
                    character: self.input[start..].chars().next().unwrap_or(ch as char),
                    position: start,
                });
            }
        };

        Ok(Some(Token {
            kind,
            text: self.slice(start, self.pos),
            offset: start,
        }))
    }

    /// Lex the whole input into a token vector.
    pub fn tokenize_all(&mut self) -> ParseResult<Vec<Token<'input>>> {
        let mut tokens = Vec::with_capacity(16);
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }
}

/// Tokenize a query-option string.
pub fn tokenize(input: &str) -> ParseResult<Vec<Token<'_>>> {
    Tokenizer::new(input).tokenize_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_operators_and_identifiers() {
        let tokens = tokenize("Price gt 10 and Name eq 'x'").unwrap();
        assert_eq!(tokens.len(), 7);
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].text, "Price");
        assert_eq!(tokens[1].kind, TokenKind::BinaryOp(BinaryOperator::Gt));
        assert_eq!(tokens[2].kind, TokenKind::Literal);
        assert_eq!(tokens[3].kind, TokenKind::BinaryOp(BinaryOperator::And));
        assert_eq!(tokens[6].text, "'x'");
        assert_eq!(tokens[6].offset, 24);
    }

    #[test]
    fn lexes_string_escapes() {
        let tokens = tokenize("'O''Neil'").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "'O''Neil'");
    }

    #[test]
    fn unterminated_string_fails_with_position() {
        let err = tokenize("Name eq 'abc").unwrap_err();
        assert_eq!(
            err,
            ExpressionParserError::UnterminatedLiteral { position: 8 }
        );
    }

    #[test]
    fn lexes_typed_literals_as_single_tokens() {
        let tokens = tokenize("datetime'2024-01-01T00:00' guid'x' X'1F' binary'00'").unwrap();
        assert_eq!(tokens.len(), 4);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Literal));
        assert_eq!(tokens[0].text, "datetime'2024-01-01T00:00'");
    }

    #[test]
    fn lexes_numeric_suffixes_and_negatives() {
        let tokens = tokenize("5 2.5 1.5m 3L 2d 1f -7").unwrap();
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Literal));
        assert_eq!(tokens[6].text, "-7");
    }

    #[test]
    fn minus_before_identifier_is_unary() {
        assert_eq!(
            kinds("-Price"),
            vec![TokenKind::Minus, TokenKind::Identifier]
        );
    }

    #[test]
    fn keyword_literals() {
        assert_eq!(
            kinds("true false null"),
            vec![TokenKind::Literal, TokenKind::Literal, TokenKind::Literal]
        );
    }

    #[test]
    fn unknown_character_fails() {
        let err = tokenize("Price # 1").unwrap_err();
        assert_eq!(
            err,
            ExpressionParserError::UnrecognizedCharacter {
                character: '#',
                position: 6
            }
        );
    }

    #[test]
    fn unknown_quoted_prefix_fails() {
        assert!(tokenize("bogus'abc'").is_err());
    }
}
