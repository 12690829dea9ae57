use serde_json::Value;

use super::FilterError;
use super::lexer::{Token, TokenKind};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    /// Flat n-ary chains keep long `a or b or ...` lists from nesting.
    Or(Vec<Expr>),
    And(Vec<Expr>),
    Not(Box<Expr>),
    Compare {
        left: Operand,
        op: CompareOp,
        right: Operand,
    },
    Truthy(Operand),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
    /// Literal scalars and `[..]` lists, stored as JSON.
    Literal(Value),
    Path(Vec<Segment>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Segment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
    StartsWith,
    EndsWith,
    In,
}

/// Deepest allowed nesting of parentheses and `not`.
pub(crate) const MAX_DEPTH: usize = 128;

pub(crate) fn parse(tokens: &[Token]) -> Result<Expr, FilterError> {
    if tokens.is_empty() {
        return Err(FilterError::Empty);
    }

    let mut parser = Parser {
        tokens,
        cursor: 0,
        depth: 0,
    };
    let expr = parser.or()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(unexpected(token)),
    }
}

fn unexpected(token: &Token) -> FilterError {
    FilterError::UnexpectedToken {
        found: token.kind.to_string(),
        pos: token.pos,
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    cursor: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.cursor)
    }

    fn next(&mut self) -> Result<&'a Token, FilterError> {
        let token = self.peek().ok_or(FilterError::UnexpectedEnd)?;
        self.cursor += 1;
        Ok(token)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek().is_some_and(|t| &t.kind == kind) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), FilterError> {
        let token = self.next()?;
        if &token.kind == kind {
            Ok(())
        } else {
            Err(unexpected(token))
        }
    }

    fn or(&mut self) -> Result<Expr, FilterError> {
        let mut terms = vec![self.and()?];
        while self.eat(&TokenKind::Or) {
            terms.push(self.and()?);
        }
        Ok(match terms.len() {
            1 => terms.remove(0),
            _ => Expr::Or(terms),
        })
    }

    fn and(&mut self) -> Result<Expr, FilterError> {
        let mut terms = vec![self.unary()?];
        while self.eat(&TokenKind::And) {
            terms.push(self.unary()?);
        }
        Ok(match terms.len() {
            1 => terms.remove(0),
            _ => Expr::And(terms),
        })
    }

    fn unary(&mut self) -> Result<Expr, FilterError> {
        if self.peek().is_some_and(|t| t.kind == TokenKind::Not) {
            self.descend()?;
            self.cursor += 1;
            let inner = self.unary();
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, FilterError> {
        if self.peek().is_some_and(|t| t.kind == TokenKind::LParen) {
            self.descend()?;
            self.cursor += 1;
            let inner = self.or();
            self.depth -= 1;
            let inner = inner?;
            self.expect(&TokenKind::RParen)?;
            return Ok(inner);
        }
        self.comparison()
    }

    /// Enter one nesting level at the current token.
    fn descend(&mut self) -> Result<(), FilterError> {
        if self.depth >= MAX_DEPTH {
            let pos = self.peek().map_or(0, |t| t.pos);
            return Err(FilterError::TooDeep { pos });
        }
        self.depth += 1;
        Ok(())
    }

    fn comparison(&mut self) -> Result<Expr, FilterError> {
        let left = self.operand()?;

        let op = match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Eq) => CompareOp::Eq,
            Some(TokenKind::Ne) => CompareOp::Ne,
            Some(TokenKind::Lt) => CompareOp::Lt,
            Some(TokenKind::Le) => CompareOp::Le,
            Some(TokenKind::Gt) => CompareOp::Gt,
            Some(TokenKind::Ge) => CompareOp::Ge,
            Some(TokenKind::Contains) => CompareOp::Contains,
            Some(TokenKind::StartsWith) => CompareOp::StartsWith,
            Some(TokenKind::EndsWith) => CompareOp::EndsWith,
            Some(TokenKind::In) => CompareOp::In,
            _ => return Ok(Expr::Truthy(left)),
        };
        self.cursor += 1;

        let right = self.operand()?;
        Ok(Expr::Compare { left, op, right })
    }

    fn operand(&mut self) -> Result<Operand, FilterError> {
        let token = self.next()?;
        match &token.kind {
            TokenKind::Ident(name) => self.path(name.clone()),
            TokenKind::LBracket => self.list(),
            _ => literal(token).map(Operand::Literal),
        }
    }

    fn path(&mut self, head: String) -> Result<Operand, FilterError> {
        let mut segments = vec![Segment::Key(head)];
        loop {
            if self.eat(&TokenKind::Dot) {
                let token = self.next()?;
                match &token.kind {
                    TokenKind::Ident(name) => segments.push(Segment::Key(name.clone())),
                    _ => return Err(unexpected(token)),
                }
            } else if self.eat(&TokenKind::LBracket) {
                let token = self.next()?;
                match token.kind {
                    TokenKind::Number(n) if n >= 0.0 && n.fract() == 0.0 => {
                        segments.push(Segment::Index(n as usize))
                    }
                    TokenKind::Str(ref key) => segments.push(Segment::Key(key.clone())),
                    _ => return Err(unexpected(token)),
                }
                self.expect(&TokenKind::RBracket)?;
            } else {
                return Ok(Operand::Path(segments));
            }
        }
    }

    fn list(&mut self) -> Result<Operand, FilterError> {
        let mut items = Vec::new();
        if self.eat(&TokenKind::RBracket) {
            return Ok(Operand::Literal(Value::Array(items)));
        }
        loop {
            let token = self.next()?;
            items.push(literal(token)?);
            if self.eat(&TokenKind::Comma) {
                continue;
            }
            self.expect(&TokenKind::RBracket)?;
            return Ok(Operand::Literal(Value::Array(items)));
        }
    }
}

fn literal(token: &Token) -> Result<Value, FilterError> {
    match &token.kind {
        TokenKind::Str(s) => Ok(Value::String(s.clone())),
        TokenKind::Number(n) => Ok(number_value(*n)),
        TokenKind::True => Ok(Value::Bool(true)),
        TokenKind::False => Ok(Value::Bool(false)),
        TokenKind::Null => Ok(Value::Null),
        _ => Err(unexpected(token)),
    }
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}
