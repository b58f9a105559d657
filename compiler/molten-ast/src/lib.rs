// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Abstract Syntax Tree definitions for the Molten hot-reload DSL.
//!
//! A Molten source file is a single class extending `HotReloadProgram`
//! whose members are methods, optionally annotated `@hotreload`. The AST
//! preserves source locations for error reporting and keeps statements
//! and expressions in arenas so later stages can walk them by id.

pub mod span;

use la_arena::{Arena, Idx};
use smol_str::SmolStr;
use span::Span;

/// Interned string type for identifiers.
pub type Ident = SmolStr;

/// Index into the expression arena.
pub type ExprId = Idx<Expr>;

/// Index into the statement arena.
pub type StmtId = Idx<Stmt>;

/// A complete Molten source file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Top-level items. A valid program has exactly one class declaration.
    pub items: Vec<Item>,
    /// Expression arena for this file.
    pub exprs: Arena<Expr>,
    /// Statement arena for this file.
    pub stmts: Arena<Stmt>,
}

impl SourceFile {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            exprs: Arena::new(),
            stmts: Arena::new(),
        }
    }
}

impl Default for SourceFile {
    fn default() -> Self {
        Self::new()
    }
}

/// Top-level item in a source file.
#[derive(Debug, Clone)]
pub enum Item {
    /// A class declaration.
    Class(ClassDecl),
}

/// A class declaration: `class Name extends Base { members }`.
#[derive(Debug, Clone)]
pub struct ClassDecl {
    /// Source location of the whole declaration.
    pub span: Span,
    /// Name of the class.
    pub name: Ident,
    /// Name of the base class. Validation requires `HotReloadProgram`.
    pub base: Ident,
    /// Class members in source order.
    pub members: Vec<ClassMember>,
}

/// A member of a class body.
///
/// Field declarations are representable so validation can point at them;
/// the accepted subset admits methods only.
#[derive(Debug, Clone)]
pub enum ClassMember {
    /// A method declaration.
    Method(MethodDecl),
    /// A field declaration (rejected during validation).
    Field(FieldDecl),
}

/// An annotation attached to a method (`@hotreload`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Source location of the annotation.
    pub span: Span,
    /// Annotation name without the `@` sigil.
    pub name: Ident,
}

/// A method declaration inside the program class.
#[derive(Debug, Clone)]
pub struct MethodDecl {
    /// Source location of the whole method.
    pub span: Span,
    /// Method name. Doubles as the external symbol for reloadable methods.
    pub name: Ident,
    /// Annotations in source order.
    pub annotations: Vec<Annotation>,
    /// Whether the method is declared `async`.
    pub is_async: bool,
    /// Parameters in source order.
    pub params: Vec<Param>,
    /// Declared return type.
    pub return_type: TypeAnn,
    /// Method body.
    pub body: Block,
}

/// A field declaration (`name: type = init;`). Never admitted; kept so the
/// validator can name the construct in its diagnostic.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    /// Source location of the field.
    pub span: Span,
    /// Field name.
    pub name: Ident,
}

/// A typed parameter.
#[derive(Debug, Clone)]
pub struct Param {
    /// Source location of the parameter.
    pub span: Span,
    /// Parameter name.
    pub name: Ident,
    /// Declared type.
    pub ty: TypeAnn,
}

/// A type annotation as written in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAnn {
    /// Source location of the annotation.
    pub span: Span,
    /// The named type.
    pub kind: TypeKind,
}

/// The written form of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// `number`
    Number,
    /// `Promise<number>` — treated as `number` for return positions.
    PromiseNumber,
    /// Any other named type; rejected during validation.
    Named(Ident),
}

/// A `{ ... }` statement block.
#[derive(Debug, Clone)]
pub struct Block {
    /// Source location of the block including braces.
    pub span: Span,
    /// Statements in source order.
    pub stmts: Vec<StmtId>,
}

/// A statement with its source location.
#[derive(Debug, Clone)]
pub struct Stmt {
    /// Source location of the statement.
    pub span: Span,
    /// The statement itself.
    pub kind: StmtKind,
}

/// Statement forms in the admitted subset.
#[derive(Debug, Clone)]
pub enum StmtKind {
    /// A nested block.
    Block(Block),
    /// `while (cond) body`
    While { cond: ExprId, body: Block },
    /// `for (init; cond; update) body` — every slot optional.
    For {
        init: Option<StmtId>,
        cond: Option<ExprId>,
        update: Option<ExprId>,
        body: Block,
    },
    /// `let name[: type] [= init];`
    Let {
        name: Ident,
        ty: Option<TypeAnn>,
        init: Option<ExprId>,
    },
    /// `return [value];`
    Return { value: Option<ExprId> },
    /// An expression in statement position.
    Expr(ExprId),
}

/// An expression with its source location.
#[derive(Debug, Clone)]
pub struct Expr {
    /// Source location of the expression.
    pub span: Span,
    /// The expression itself.
    pub kind: ExprKind,
}

/// Expression forms in the admitted subset.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Numeric literal.
    Number(i64),
    /// Boolean literal.
    Bool(bool),
    /// A bare identifier.
    Ident(Ident),
    /// `self.name` — rewritten to `Ident(name)` during validation.
    SelfAccess(Ident),
    /// A call. The callee is an identifier or a `self.` access.
    Call { callee: ExprId, args: Vec<ExprId> },
    /// Binary arithmetic.
    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    /// Unary `+` or `-`.
    Unary { op: UnaryOp, operand: ExprId },
    /// Prefix `++x`.
    PreIncr(ExprId),
    /// Postfix `x++`.
    PostIncr(ExprId),
    /// `await expr` — unwraps to its operand during lowering.
    Await(ExprId),
}

/// Binary operators in the admitted subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    /// The operator as written in both the DSL and the lowered output.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

/// Unary operators in the admitted subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `+x`
    Plus,
}

impl UnaryOp {
    /// The operator as written in both the DSL and the lowered output.
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
        }
    }
}
