// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Expression parsing using precedence climbing.

use molten_ast::span::Span;
use molten_ast::*;
use molten_lexer::TokenKind;

use crate::{ParseError, ParseResult, Parser};

/// Operator precedence levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Precedence {
    /// No precedence (lowest).
    None = 0,
    /// Additive precedence (`+`, `-`).
    Term = 1,
    /// Multiplicative precedence (`*`, `/`).
    Factor = 2,
    /// Prefix operator precedence (`-`, `+`, `++`, `await`).
    Unary = 3,
    /// Call and postfix precedence (`()`, `++`).
    Call = 4,
}

impl<'src> Parser<'src> {
    /// Parse an expression.
    pub(crate) fn parse_expr(&mut self, file: &mut SourceFile) -> ParseResult<ExprId> {
        self.parse_expr_prec(file, Precedence::None)
    }

    /// Parse an expression with a minimum precedence.
    fn parse_expr_prec(
        &mut self,
        file: &mut SourceFile,
        min_prec: Precedence,
    ) -> ParseResult<ExprId> {
        let mut lhs = self.parse_prefix(file)?;

        loop {
            let prec = self.current_precedence();
            if prec <= min_prec {
                break;
            }
            lhs = self.parse_infix(file, lhs, prec)?;
        }

        Ok(lhs)
    }

    /// Precedence of the upcoming infix or postfix operator.
    fn current_precedence(&mut self) -> Precedence {
        match self.peek().kind {
            TokenKind::Plus | TokenKind::Minus => Precedence::Term,
            TokenKind::Star | TokenKind::Slash => Precedence::Factor,
            TokenKind::PlusPlus | TokenKind::LParen => Precedence::Call,
            _ => Precedence::None,
        }
    }

    /// Parse a prefix expression (primary or unary).
    fn parse_prefix(&mut self, file: &mut SourceFile) -> ParseResult<ExprId> {
        let token = self.peek().clone();

        match token.kind {
            TokenKind::Minus | TokenKind::Plus => {
                self.advance();
                let op = if matches!(token.kind, TokenKind::Minus) {
                    UnaryOp::Neg
                } else {
                    UnaryOp::Plus
                };
                let operand = self.parse_expr_prec(file, Precedence::Unary)?;
                let span = token.span.cover(file.exprs[operand].span);
                Ok(file.exprs.alloc(Expr {
                    span,
                    kind: ExprKind::Unary { op, operand },
                }))
            }

            TokenKind::PlusPlus => {
                self.advance();
                let operand = self.parse_expr_prec(file, Precedence::Unary)?;
                let span = token.span.cover(file.exprs[operand].span);
                Ok(file.exprs.alloc(Expr {
                    span,
                    kind: ExprKind::PreIncr(operand),
                }))
            }

            TokenKind::Await => {
                self.advance();
                let operand = self.parse_expr_prec(file, Precedence::Unary)?;
                let span = token.span.cover(file.exprs[operand].span);
                Ok(file.exprs.alloc(Expr {
                    span,
                    kind: ExprKind::Await(operand),
                }))
            }

            _ => self.parse_primary(file),
        }
    }

    /// Parse an infix or postfix continuation of `lhs`.
    fn parse_infix(
        &mut self,
        file: &mut SourceFile,
        lhs: ExprId,
        prec: Precedence,
    ) -> ParseResult<ExprId> {
        let token = self.advance();

        match token.kind {
            TokenKind::Plus | TokenKind::Minus | TokenKind::Star | TokenKind::Slash => {
                let op = match token.kind {
                    TokenKind::Plus => BinaryOp::Add,
                    TokenKind::Minus => BinaryOp::Sub,
                    TokenKind::Star => BinaryOp::Mul,
                    _ => BinaryOp::Div,
                };
                let rhs = self.parse_expr_prec(file, prec)?;
                let span = file.exprs[lhs].span.cover(file.exprs[rhs].span);
                Ok(file.exprs.alloc(Expr {
                    span,
                    kind: ExprKind::Binary { op, lhs, rhs },
                }))
            }

            TokenKind::PlusPlus => {
                let span = file.exprs[lhs].span.cover(token.span);
                Ok(file.exprs.alloc(Expr {
                    span,
                    kind: ExprKind::PostIncr(lhs),
                }))
            }

            TokenKind::LParen => self.parse_call(file, lhs, token.span),

            _ => Err(ParseError::unexpected_token(token, "an operator")),
        }
    }

    /// Parse a call's argument list. The opening paren is already consumed.
    fn parse_call(
        &mut self,
        file: &mut SourceFile,
        callee: ExprId,
        lparen: Span,
    ) -> ParseResult<ExprId> {
        if !matches!(
            file.exprs[callee].kind,
            ExprKind::Ident(_) | ExprKind::SelfAccess(_)
        ) {
            return Err(ParseError::custom(
                lparen,
                "call target must be a simple name",
            ));
        }

        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_expr(file)?);
                if !self.check(TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
        }
        let end = self.expect(TokenKind::RParen)?;
        let span = file.exprs[callee].span.cover(end);

        Ok(file.exprs.alloc(Expr {
            span,
            kind: ExprKind::Call { callee, args },
        }))
    }

    /// Parse a primary expression.
    fn parse_primary(&mut self, file: &mut SourceFile) -> ParseResult<ExprId> {
        let token = self.advance();

        let kind = match token.kind {
            TokenKind::Number(n) => ExprKind::Number(n),
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::Ident(name) => ExprKind::Ident(name),

            TokenKind::SelfKw => {
                self.expect(TokenKind::Dot)?;
                let name = self.expect_ident()?;
                let span = token.span.cover(self.last_span);
                return Ok(file.exprs.alloc(Expr {
                    span,
                    kind: ExprKind::SelfAccess(name),
                }));
            }

            TokenKind::LParen => {
                let inner = self.parse_expr(file)?;
                self.expect(TokenKind::RParen)?;
                return Ok(inner);
            }

            TokenKind::Eof => return Err(ParseError::UnexpectedEof { span: token.span }),
            _ => return Err(ParseError::unexpected_token(token, "an expression")),
        };

        Ok(file.exprs.alloc(Expr {
            span: token.span,
            kind,
        }))
    }
}
