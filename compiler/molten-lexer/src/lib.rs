// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Lexer for the Molten hot-reload DSL.
//!
//! Converts a source string into a stream of tokens. The DSL is a small
//! class-based language, so the token set covers:
//!
//! - The class/method keywords (`class`, `extends`, `async`, ...)
//! - Decimal numeric literals
//! - ASCII identifiers (reloadable method names become C symbols, so
//!   identifiers are deliberately not Unicode)
//! - The reload marker annotation `@hotreload` and the bare `@` sigil
//!   for everything else the validator must reject by name
//! - Operators and punctuation, including `++` for loop counters

use molten_ast::span::Span;
use logos::Logos;
use smol_str::SmolStr;

/// A token with its span in the source.
#[derive(Debug, Clone)]
pub struct Token {
    /// The kind of this token.
    pub kind: TokenKind,
    /// The source span of this token.
    pub span: Span,
}

impl Token {
    /// Create a new token with the given kind and span.
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Token kinds produced by the lexer.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*[^/])*\*/")]
pub enum TokenKind {
    // === Keywords ===
    /// The `class` keyword opening the program class.
    #[token("class")]
    Class,
    /// The `extends` keyword naming the base class.
    #[token("extends")]
    Extends,
    /// The `async` method modifier.
    #[token("async")]
    Async,
    /// The `await` keyword.
    #[token("await")]
    Await,
    /// The `let` keyword for variable declarations.
    #[token("let")]
    Let,
    /// The `return` keyword.
    #[token("return")]
    Return,
    /// The `while` keyword.
    #[token("while")]
    While,
    /// The `for` keyword.
    #[token("for")]
    For,
    /// The `self` keyword for member access inside methods.
    #[token("self")]
    SelfKw,
    /// The `true` boolean literal.
    #[token("true")]
    True,
    /// The `false` boolean literal.
    #[token("false")]
    False,

    // === Annotations ===
    /// The `@hotreload` reload marker.
    #[token("@hotreload")]
    AtHotreload,
    /// A bare `@` sigil. Any annotation other than `@hotreload` lexes as
    /// `@` + identifier and is rejected by the validator.
    #[token("@")]
    At,

    // === Literals ===
    /// Decimal integer literal.
    #[regex(r"[0-9][0-9_]*", |lex| parse_int(lex.slice()))]
    Number(i64),

    // === Identifiers ===
    /// An ASCII identifier.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| SmolStr::new(lex.slice()))]
    Ident(SmolStr),

    // === Operators ===
    /// The `++` increment operator.
    #[token("++")]
    PlusPlus,
    /// The `+` operator.
    #[token("+")]
    Plus,
    /// The `-` operator.
    #[token("-")]
    Minus,
    /// The `*` operator.
    #[token("*")]
    Star,
    /// The `/` operator.
    #[token("/")]
    Slash,
    /// The `=` initializer sign.
    #[token("=")]
    Eq,

    // === Punctuation ===
    /// The `:` type annotation separator.
    #[token(":")]
    Colon,
    /// The `;` statement terminator.
    #[token(";")]
    Semi,
    /// The `,` separator.
    #[token(",")]
    Comma,
    /// The `.` member access operator.
    #[token(".")]
    Dot,
    /// The `<` of a generic type argument (`Promise<number>`).
    #[token("<")]
    Lt,
    /// The `>` of a generic type argument.
    #[token(">")]
    Gt,

    // === Delimiters ===
    /// The `(` opening parenthesis.
    #[token("(")]
    LParen,
    /// The `)` closing parenthesis.
    #[token(")")]
    RParen,
    /// The `{` opening brace.
    #[token("{")]
    LBrace,
    /// The `}` closing brace.
    #[token("}")]
    RBrace,

    // === Special ===
    /// End of file
    Eof,

    /// Error token
    Error,
}

/// Parses a decimal integer string slice, removing underscores.
fn parse_int(s: &str) -> i64 {
    s.replace('_', "").parse().unwrap_or(0)
}

/// Lexer for Molten source code.
///
/// Wraps the `logos::Lexer` and provides peeking, advancing, and EOF
/// checks for the recursive-descent parser.
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, TokenKind>,
    peeked: Option<Token>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source.
    pub fn new(source: &'src str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            peeked: None,
        }
    }

    /// Get the next token.
    pub fn next(&mut self) -> Token {
        if let Some(token) = self.peeked.take() {
            return token;
        }

        match self.inner.next() {
            Some(Ok(kind)) => Token::new(kind, Span::from_range(self.inner.span())),
            Some(Err(())) => Token::new(TokenKind::Error, Span::from_range(self.inner.span())),
            None => Token::new(TokenKind::Eof, Span::point(self.inner.span().end as u32)),
        }
    }

    /// Peek at the next token without consuming it.
    pub fn peek(&mut self) -> &Token {
        if self.peeked.is_none() {
            self.peeked = Some(self.next());
        }
        self.peeked.as_ref().unwrap()
    }

    /// Check if we've reached the end of input.
    pub fn is_eof(&mut self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    /// Get the source string.
    pub fn source(&self) -> &'src str {
        self.inner.source()
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = Lexer::next(self);
        if matches!(token.kind, TokenKind::Eof) {
            None
        } else {
            Some(token)
        }
    }
}
