// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Parser for the Molten hot-reload DSL.
//!
//! A hand-written recursive descent parser over the token stream. The
//! grammar is deliberately small: one class declaration whose members are
//! methods (plus fields, parsed only so validation can reject them by
//! name), with the statement and expression subset the native lowering
//! supports. Full source spans are preserved for diagnostics.

mod error;
mod expr;

use molten_ast::span::Span;
use molten_ast::*;
use molten_lexer::{Lexer, Token, TokenKind};
use smol_str::SmolStr;

pub use error::{ParseError, ParseResult};

/// Parse a complete source file.
pub fn parse(source: &str) -> (SourceFile, Vec<ParseError>) {
    Parser::new(source).parse_file()
}

/// Parser for Molten source code.
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    errors: Vec<ParseError>,
    last_span: Span,
}

impl<'src> Parser<'src> {
    /// Create a new parser for the given source.
    pub fn new(source: &'src str) -> Self {
        Self {
            lexer: Lexer::new(source),
            errors: Vec::new(),
            last_span: Span::point(0),
        }
    }

    /// Parse a complete source file.
    pub fn parse_file(mut self) -> (SourceFile, Vec<ParseError>) {
        let mut file = SourceFile::new();

        while !self.is_eof() {
            match self.parse_class(&mut file) {
                Ok(class) => file.items.push(Item::Class(class)),
                Err(e) => {
                    self.errors.push(e);
                    self.recover_to_class();
                }
            }
        }

        (file, self.errors)
    }

    /// Parse a class declaration: `class Name extends Base { members }`.
    fn parse_class(&mut self, file: &mut SourceFile) -> ParseResult<ClassDecl> {
        let start = self.expect(TokenKind::Class)?;
        let name = self.expect_ident()?;
        self.expect(TokenKind::Extends)?;
        let base = self.expect_ident()?;

        self.expect(TokenKind::LBrace)?;
        let mut members = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_eof() {
            members.push(self.parse_member(file)?);
        }
        let end = self.expect(TokenKind::RBrace)?;

        Ok(ClassDecl {
            span: start.cover(end),
            name,
            base,
            members,
        })
    }

    /// Parse a class member: an (optionally annotated) method, or a field.
    fn parse_member(&mut self, file: &mut SourceFile) -> ParseResult<ClassMember> {
        let annotations = self.parse_annotations()?;

        let is_async = if self.check(TokenKind::Async) {
            self.advance();
            true
        } else {
            false
        };

        let name_token = self.peek().clone();
        let name = self.expect_ident()?;

        if self.check(TokenKind::LParen) {
            let method = self.parse_method_rest(file, name, name_token.span, annotations, is_async)?;
            return Ok(ClassMember::Method(method));
        }

        if !annotations.is_empty() || is_async {
            return Err(ParseError::unexpected_token(
                self.peek().clone(),
                "a method parameter list",
            ));
        }

        // Field declaration: `name [: type] [= expr] ;`
        if self.check(TokenKind::Colon) {
            self.advance();
            self.parse_type()?;
        }
        if self.check(TokenKind::Eq) {
            self.advance();
            self.parse_expr(file)?;
        }
        let end = self.expect(TokenKind::Semi)?;

        Ok(ClassMember::Field(FieldDecl {
            span: name_token.span.cover(end),
            name,
        }))
    }

    /// Parse the annotations preceding a member.
    fn parse_annotations(&mut self) -> ParseResult<Vec<Annotation>> {
        let mut annotations = Vec::new();

        loop {
            let token = self.peek().clone();
            match token.kind {
                TokenKind::AtHotreload => {
                    self.advance();
                    annotations.push(Annotation {
                        span: token.span,
                        name: SmolStr::new("hotreload"),
                    });
                }
                TokenKind::At => {
                    self.advance();
                    let name = self.expect_ident()?;
                    annotations.push(Annotation {
                        span: token.span.cover(self.last_span),
                        name,
                    });
                }
                _ => break,
            }
        }

        Ok(annotations)
    }

    /// Parse a method after its name: parameters, return type, body.
    fn parse_method_rest(
        &mut self,
        file: &mut SourceFile,
        name: Ident,
        name_span: Span,
        annotations: Vec<Annotation>,
        is_async: bool,
    ) -> ParseResult<MethodDecl> {
        self.expect(TokenKind::LParen)?;
        let params = self.parse_params()?;
        self.expect(TokenKind::RParen)?;

        self.expect(TokenKind::Colon)?;
        let return_type = self.parse_type()?;

        let body = self.parse_block(file)?;
        let span = name_span.cover(body.span);

        Ok(MethodDecl {
            span,
            name,
            annotations,
            is_async,
            params,
            return_type,
            body,
        })
    }

    /// Parse a comma-separated parameter list (without parentheses).
    fn parse_params(&mut self) -> ParseResult<Vec<Param>> {
        let mut params = Vec::new();

        if self.check(TokenKind::RParen) {
            return Ok(params);
        }

        loop {
            let name_token = self.peek().clone();
            let name = self.expect_ident()?;
            self.expect(TokenKind::Colon)?;
            let ty = self.parse_type()?;
            params.push(Param {
                span: name_token.span.cover(ty.span),
                name,
                ty,
            });

            if !self.check(TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        Ok(params)
    }

    /// Parse a type annotation.
    fn parse_type(&mut self) -> ParseResult<TypeAnn> {
        let token = self.peek().clone();
        let name = self.expect_ident()?;
        let mut span = token.span;

        // `Promise<number>` is the only generic form the grammar admits.
        if self.check(TokenKind::Lt) {
            self.advance();
            let arg = self.expect_ident()?;
            let end = self.expect(TokenKind::Gt)?;
            span = span.cover(end);

            let kind = if name == "Promise" && arg == "number" {
                TypeKind::PromiseNumber
            } else {
                TypeKind::Named(name)
            };
            return Ok(TypeAnn { span, kind });
        }

        let kind = if name == "number" {
            TypeKind::Number
        } else {
            TypeKind::Named(name)
        };
        Ok(TypeAnn { span, kind })
    }

    /// Parse a braced statement block.
    fn parse_block(&mut self, file: &mut SourceFile) -> ParseResult<Block> {
        let start = self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();

        while !self.check(TokenKind::RBrace) && !self.is_eof() {
            stmts.push(self.parse_stmt(file)?);
        }
        let end = self.expect(TokenKind::RBrace)?;

        Ok(Block {
            span: start.cover(end),
            stmts,
        })
    }

    /// Parse a single statement.
    fn parse_stmt(&mut self, file: &mut SourceFile) -> ParseResult<StmtId> {
        let token = self.peek().clone();

        match token.kind {
            TokenKind::LBrace => {
                let block = self.parse_block(file)?;
                let span = block.span;
                Ok(file.stmts.alloc(Stmt {
                    span,
                    kind: StmtKind::Block(block),
                }))
            }
            TokenKind::While => self.parse_while(file),
            TokenKind::For => self.parse_for(file),
            TokenKind::Let => {
                let stmt = self.parse_let(file)?;
                self.expect(TokenKind::Semi)?;
                Ok(stmt)
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.check(TokenKind::Semi) {
                    None
                } else {
                    Some(self.parse_expr(file)?)
                };
                let end = self.expect(TokenKind::Semi)?;
                Ok(file.stmts.alloc(Stmt {
                    span: token.span.cover(end),
                    kind: StmtKind::Return { value },
                }))
            }
            _ => {
                let expr = self.parse_expr(file)?;
                let end = self.expect(TokenKind::Semi)?;
                let span = file.exprs[expr].span.cover(end);
                Ok(file.stmts.alloc(Stmt {
                    span,
                    kind: StmtKind::Expr(expr),
                }))
            }
        }
    }

    /// Parse a loop body: a block, or a single statement wrapped in one.
    fn parse_loop_body(&mut self, file: &mut SourceFile) -> ParseResult<Block> {
        if self.check(TokenKind::LBrace) {
            return self.parse_block(file);
        }
        let stmt = self.parse_stmt(file)?;
        let span = file.stmts[stmt].span;
        Ok(Block {
            span,
            stmts: vec![stmt],
        })
    }

    /// Parse a while loop.
    fn parse_while(&mut self, file: &mut SourceFile) -> ParseResult<StmtId> {
        let start = self.expect(TokenKind::While)?;
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr(file)?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_loop_body(file)?;
        let span = start.cover(body.span);

        Ok(file.stmts.alloc(Stmt {
            span,
            kind: StmtKind::While { cond, body },
        }))
    }

    /// Parse a for loop. All three header slots are optional.
    fn parse_for(&mut self, file: &mut SourceFile) -> ParseResult<StmtId> {
        let start = self.expect(TokenKind::For)?;
        self.expect(TokenKind::LParen)?;

        let init = if self.check(TokenKind::Semi) {
            None
        } else if self.check(TokenKind::Let) {
            Some(self.parse_let(file)?)
        } else {
            let expr = self.parse_expr(file)?;
            let span = file.exprs[expr].span;
            Some(file.stmts.alloc(Stmt {
                span,
                kind: StmtKind::Expr(expr),
            }))
        };
        self.expect(TokenKind::Semi)?;

        let cond = if self.check(TokenKind::Semi) {
            None
        } else {
            Some(self.parse_expr(file)?)
        };
        self.expect(TokenKind::Semi)?;

        let update = if self.check(TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expr(file)?)
        };
        self.expect(TokenKind::RParen)?;

        let body = self.parse_loop_body(file)?;
        let span = start.cover(body.span);

        Ok(file.stmts.alloc(Stmt {
            span,
            kind: StmtKind::For {
                init,
                cond,
                update,
                body,
            },
        }))
    }

    /// Parse a let declaration without its trailing semicolon.
    fn parse_let(&mut self, file: &mut SourceFile) -> ParseResult<StmtId> {
        let start = self.expect(TokenKind::Let)?;
        let name = self.expect_ident()?;

        let ty = if self.check(TokenKind::Colon) {
            self.advance();
            Some(self.parse_type()?)
        } else {
            None
        };

        let init = if self.check(TokenKind::Eq) {
            self.advance();
            Some(self.parse_expr(file)?)
        } else {
            None
        };

        let span = start.cover(self.last_span);
        Ok(file.stmts.alloc(Stmt {
            span,
            kind: StmtKind::Let { name, ty, init },
        }))
    }

    // === Token helpers ===

    /// Peek at the next token without consuming it.
    fn peek(&mut self) -> &Token {
        self.lexer.peek()
    }

    /// Consume and return the next token.
    fn advance(&mut self) -> Token {
        let token = self.lexer.next();
        self.last_span = token.span;
        token
    }

    /// Check whether the next token has the given kind.
    fn check(&mut self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Consume the next token, requiring the given kind.
    fn expect(&mut self, kind: TokenKind) -> ParseResult<Span> {
        let token = self.peek().clone();
        if token.kind == kind {
            self.advance();
            Ok(token.span)
        } else {
            Err(ParseError::expected_token(kind, token))
        }
    }

    /// Consume the next token, requiring an identifier, and return its text.
    fn expect_ident(&mut self) -> ParseResult<Ident> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(ParseError::expected_identifier(token)),
        }
    }

    /// Check if we've reached the end of input.
    fn is_eof(&mut self) -> bool {
        self.lexer.is_eof()
    }

    /// Skip tokens until the next class declaration or EOF.
    fn recover_to_class(&mut self) {
        while !self.is_eof() && !self.check(TokenKind::Class) {
            self.advance();
        }
    }
}
