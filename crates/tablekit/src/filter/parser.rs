//! Recursive-descent parser producing a filter [`Expr`].
//!
//! Precedence, lowest first: `||`, `&&`, `!`, comparisons, unary minus.
//! Comparisons do not chain: `a < b < c` is rejected.
//!
//! `&&` and `||` chains become one n-ary node, so only parentheses, `!` and
//! unary minus deepen the tree. Those are capped at [`MAX_NESTING`] levels.

use crate::error::FilterError;
use crate::record::Value;

use super::lexer::{Token, TokenKind};

/// Deepest allowed nesting of parentheses, `!` and unary minus.
pub const MAX_NESTING: usize = 64;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// A known column, read from the record.
    Column(String),
    /// An identifier that is not a column. Fails when evaluated.
    Unknown(String),
    Not(Box<Expr>),
    Neg(Box<Expr>),
    /// Two or more terms that must all hold.
    And(Vec<Expr>),
    /// Two or more terms of which one must hold.
    Or(Vec<Expr>),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
}

/// Parse a token stream. `is_column` decides which identifiers resolve.
pub fn parse<F>(tokens: &[Token], is_column: F) -> Result<Expr, FilterError>
where
    F: Fn(&str) -> bool,
{
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        is_column,
    };
    let expr = parser.or()?;
    match parser.peek() {
        TokenKind::Eof => Ok(expr),
        _ => Err(parser.unexpected("end of expression")),
    }
}

struct Parser<'a, F> {
    tokens: &'a [Token],
    pos: usize,
    /// Open parentheses, `!` and unary minus around the current position.
    depth: usize,
    is_column: F,
}

impl<F> Parser<'_, F>
where
    F: Fn(&str) -> bool,
{
    fn peek(&self) -> &TokenKind {
        self.tokens
            .get(self.pos)
            .map_or(&TokenKind::Eof, |token| &token.kind)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(0, |token| token.span.start)
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        kind
    }

    fn unexpected(&self, expected: &str) -> FilterError {
        FilterError::new(
            self.offset(),
            format!("expected {expected}, found {}", self.peek().describe()),
        )
    }

    /// Step one nesting level in, failing past [`MAX_NESTING`].
    fn descend(&mut self, offset: usize) -> Result<(), FilterError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(FilterError::new(offset, "expression nested too deeply"));
        }
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }

    fn or(&mut self) -> Result<Expr, FilterError> {
        let first = self.and()?;
        if *self.peek() != TokenKind::Or {
            return Ok(first);
        }
        let mut terms = vec![first];
        while *self.peek() == TokenKind::Or {
            self.advance();
            terms.push(self.and()?);
        }
        Ok(Expr::Or(terms))
    }

    fn and(&mut self) -> Result<Expr, FilterError> {
        let first = self.not()?;
        if *self.peek() != TokenKind::And {
            return Ok(first);
        }
        let mut terms = vec![first];
        while *self.peek() == TokenKind::And {
            self.advance();
            terms.push(self.not()?);
        }
        Ok(Expr::And(terms))
    }

    fn not(&mut self) -> Result<Expr, FilterError> {
        if *self.peek() == TokenKind::Not {
            self.descend(self.offset())?;
            self.advance();
            let inner = self.not()?;
            self.ascend();
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, FilterError> {
        let lhs = self.unary()?;
        let Some(op) = compare_op(self.peek()) else {
            return Ok(lhs);
        };
        self.advance();
        let rhs = self.unary()?;
        if compare_op(self.peek()).is_some() {
            return Err(FilterError::new(
                self.offset(),
                "comparisons cannot be chained",
            ));
        }
        Ok(Expr::Compare(op, Box::new(lhs), Box::new(rhs)))
    }

    fn unary(&mut self) -> Result<Expr, FilterError> {
        if *self.peek() == TokenKind::Minus {
            self.descend(self.offset())?;
            self.advance();
            let inner = self.unary()?;
            self.ascend();
            return Ok(match inner {
                Expr::Literal(Value::Int(i)) => Expr::Literal(Value::Int(-i)),
                Expr::Literal(Value::Float(f)) => Expr::Literal(Value::Float(-f)),
                other => Expr::Neg(Box::new(other)),
            });
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, FilterError> {
        let offset = self.offset();
        match self.advance() {
            TokenKind::Int(i) => Ok(Expr::Literal(Value::Int(i))),
            TokenKind::Float(f) => Ok(Expr::Literal(Value::Float(f))),
            TokenKind::Str(s) => Ok(Expr::Literal(Value::Str(s))),
            TokenKind::True => Ok(Expr::Literal(Value::Bool(true))),
            TokenKind::False => Ok(Expr::Literal(Value::Bool(false))),
            TokenKind::Null => Ok(Expr::Literal(Value::Null)),
            TokenKind::Ident(name) => Ok(if (self.is_column)(&name) {
                Expr::Column(name)
            } else {
                Expr::Unknown(name)
            }),
            TokenKind::LParen => {
                self.descend(offset)?;
                let inner = self.or()?;
                if *self.peek() != TokenKind::RParen {
                    return Err(self.unexpected("')'"));
                }
                self.advance();
                self.ascend();
                Ok(inner)
            }
            other => Err(FilterError::new(
                offset,
                format!("expected a value, found {}", other.describe()),
            )),
        }
    }
}

fn compare_op(kind: &TokenKind) -> Option<CompareOp> {
    Some(match kind {
        TokenKind::Eq => CompareOp::Eq,
        TokenKind::Ne => CompareOp::Ne,
        TokenKind::Lt => CompareOp::Lt,
        TokenKind::Le => CompareOp::Le,
        TokenKind::Gt => CompareOp::Gt,
        TokenKind::Ge => CompareOp::Ge,
        _ => return None,
    })
}
