// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Validation error types.

use molten_ast::span::Span;
use thiserror::Error;

/// A validation error. Each names the offending construct so the driver
/// can point at it.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("expected exactly one program class, found {found}")]
    ProgramClassCount { span: Span, found: usize },

    #[error("program class must extend HotReloadProgram, found base {base}")]
    WrongBaseClass { span: Span, base: String },

    #[error("field declarations are not supported: {name}")]
    FieldNotSupported { span: Span, name: String },

    #[error("unsupported annotation @{name}")]
    UnsupportedAnnotation { span: Span, name: String },

    #[error("method {name} carries more than one annotation")]
    MultipleAnnotations { span: Span, name: String },

    #[error("duplicate method name {name}")]
    DuplicateMethod { span: Span, name: String },

    #[error("program must declare a main method")]
    MissingMain { span: Span },

    #[error("main must not take parameters")]
    MainWithParams { span: Span },

    #[error("main cannot be marked @hotreload")]
    MainMarkedReloadable { span: Span },

    #[error("unsupported type {name}; only number is supported")]
    UnsupportedType { span: Span, name: String },

    #[error("Promise<number> is only supported as a return type")]
    PromiseOutsideReturn { span: Span },

    #[error("self may only reference program methods; {name} is not one")]
    UnknownSelfMember { span: Span, name: String },
}

impl ValidateError {
    /// Get the span of this error.
    pub fn span(&self) -> Span {
        match self {
            Self::ProgramClassCount { span, .. } => *span,
            Self::WrongBaseClass { span, .. } => *span,
            Self::FieldNotSupported { span, .. } => *span,
            Self::UnsupportedAnnotation { span, .. } => *span,
            Self::MultipleAnnotations { span, .. } => *span,
            Self::DuplicateMethod { span, .. } => *span,
            Self::MissingMain { span } => *span,
            Self::MainWithParams { span } => *span,
            Self::MainMarkedReloadable { span } => *span,
            Self::UnsupportedType { span, .. } => *span,
            Self::PromiseOutsideReturn { span } => *span,
            Self::UnknownSelfMember { span, .. } => *span,
        }
    }

    /// Format this error with line:column information from source.
    pub fn format_with_source(&self, source: &str) -> String {
        format!("{}: {}", self.span().locate(source), self)
    }
}
