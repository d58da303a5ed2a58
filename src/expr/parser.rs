//! Recursive-descent parser for potential expressions.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('-' | '+') unary | power
//! power   := primary ('**' unary)?
//! primary := NUMBER | IDENT | IDENT '(' expr ')' | '(' expr ')'
//! ```
//!
//! `**` is right-associative and binds tighter than a leading minus, so
//! `-x**2` reads as `-(x**2)` while `r**-6` is still accepted.

use super::ParseError;
use super::ast::{BinaryOp, Expr, Function, constant};
use super::lexer::{Spanned, Token};

pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Spanned>, source_len: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            end: source_len,
        }
    }

    pub fn parse(mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expr()?;
        if let Some(tok) = self.tokens.get(self.pos) {
            return Err(ParseError::UnexpectedToken {
                found: describe(&tok.token),
                offset: tok.offset,
            });
        }
        Ok(expr)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |s| s.offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).map(|s| s.token.clone());
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        let offset = self.offset();
        match self.advance() {
            Some(tok) if tok == expected => Ok(()),
            Some(tok) => Err(ParseError::UnexpectedToken {
                found: describe(&tok),
                offset,
            }),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_term()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                let inner = self.parse_unary()?;
                Ok(match inner {
                    Expr::Number(v) => Expr::Number(-v),
                    other => Expr::Neg(Box::new(other)),
                })
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_primary()?;
        if matches!(self.peek(), Some(Token::Power)) {
            self.pos += 1;
            let exponent = self.parse_unary()?;
            return Ok(Expr::binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let offset = self.offset();
        match self.advance() {
            Some(Token::Number(v)) => Ok(Expr::Number(v)),
            Some(Token::Ident(name)) => {
                if matches!(self.peek(), Some(Token::LParen)) {
                    let func = Function::from_name(&name)
                        .ok_or(ParseError::UnknownFunction { name, offset })?;
                    self.pos += 1;
                    let arg = self.parse_expr()?;
                    self.expect(Token::RParen)?;
                    return Ok(Expr::Call {
                        func,
                        arg: Box::new(arg),
                    });
                }
                if constant(&name).is_some() {
                    return Ok(Expr::Constant("pi"));
                }
                Ok(Expr::Symbol(name))
            }
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(tok) => Err(ParseError::UnexpectedToken {
                found: describe(&tok),
                offset,
            }),
            None => Err(ParseError::UnexpectedEnd),
        }
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(v) => format!("number {v}"),
        Token::Ident(name) => format!("identifier '{name}'"),
        Token::Plus => "'+'".to_string(),
        Token::Minus => "'-'".to_string(),
        Token::Star => "'*'".to_string(),
        Token::Slash => "'/'".to_string(),
        Token::Power => "'**'".to_string(),
        Token::LParen => "'('".to_string(),
        Token::RParen => "')'".to_string(),
    }
}
