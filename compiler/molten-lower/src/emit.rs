// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Statement and expression emission into C++ text.

use molten_ast::*;
use molten_validate::Method;
use rustc_hash::FxHashSet;

/// Emits method bodies as C++.
///
/// Calls to reloadable functions are rewritten to go through their reload
/// cell (`name.get()(args...)`); everything else lowers to a direct call.
/// Inside a function's own translation unit a recursive call stays direct,
/// since the cell lives in the executable, not in the object.
pub(crate) struct Emitter<'a> {
    file: &'a SourceFile,
    reloadable: &'a FxHashSet<Ident>,
    current_unit: Option<&'a str>,
    out: String,
    indent: usize,
}

impl<'a> Emitter<'a> {
    pub(crate) fn new(
        file: &'a SourceFile,
        reloadable: &'a FxHashSet<Ident>,
        current_unit: Option<&'a str>,
    ) -> Self {
        Self {
            file,
            reloadable,
            current_unit,
            out: String::new(),
            indent: 0,
        }
    }

    pub(crate) fn finish(self) -> String {
        self.out
    }

    /// Emit a full function definition for a method.
    pub(crate) fn emit_function(&mut self, method: &Method, linkage: &str) {
        let params = method
            .params
            .iter()
            .map(|p| format!("int {}", p.name))
            .collect::<Vec<_>>()
            .join(", ");

        self.line(&format!("{linkage}int {}({params}) {{", method.name));
        self.indent += 1;
        for &stmt in &method.body.stmts {
            self.emit_stmt(stmt);
        }
        self.indent -= 1;
        self.line("}");
    }

    fn emit_block(&mut self, block: &Block) {
        self.push_str(" {\n");
        self.indent += 1;
        for &stmt in &block.stmts {
            self.emit_stmt(stmt);
        }
        self.indent -= 1;
        self.write_indent();
        self.push_str("}\n");
    }

    fn emit_stmt(&mut self, id: StmtId) {
        // Cloned so the arena borrow does not pin `self` across output writes.
        let stmt = self.file.stmts[id].clone();
        match &stmt.kind {
            StmtKind::Block(block) => {
                // A bare block still opens its own scope.
                self.line("{");
                self.indent += 1;
                for &inner in &block.stmts {
                    self.emit_stmt(inner);
                }
                self.indent -= 1;
                self.line("}");
            }
            StmtKind::While { cond, body } => {
                let cond_text = self.expr(*cond);
                self.write_indent();
                self.push_str(&format!("while ({cond_text})"));
                self.emit_block(body);
            }
            StmtKind::For {
                init,
                cond,
                update,
                body,
            } => {
                let init_text = init.map(|s| self.stmt_fragment(s)).unwrap_or_default();
                let cond_text = cond.map(|e| self.expr(e)).unwrap_or_default();
                let update_text = update.map(|e| self.expr(e)).unwrap_or_default();

                self.write_indent();
                if cond_text.is_empty() {
                    self.push_str(&format!("for ({init_text};;{update_sep}{update_text})",
                        update_sep = if update_text.is_empty() { "" } else { " " }));
                } else {
                    self.push_str(&format!(
                        "for ({init_text}; {cond_text};{update_sep}{update_text})",
                        update_sep = if update_text.is_empty() { "" } else { " " }
                    ));
                }
                self.emit_block(body);
            }
            StmtKind::Let { name, ty, init } => {
                let text = self.let_fragment(name, ty.as_ref(), *init);
                self.line(&format!("{text};"));
            }
            StmtKind::Return { value } => match value {
                Some(expr) => {
                    let text = self.expr(*expr);
                    self.line(&format!("return {text};"));
                }
                None => self.line("return;"),
            },
            StmtKind::Expr(expr) => {
                let text = self.expr(*expr);
                self.line(&format!("{text};"));
            }
        }
    }

    /// A statement rendered without indentation, newline, or trailing
    /// semicolon, for use in a for-loop header.
    fn stmt_fragment(&self, id: StmtId) -> String {
        let stmt = &self.file.stmts[id];
        match &stmt.kind {
            StmtKind::Let { name, ty, init } => self.let_fragment(name, ty.as_ref(), *init),
            StmtKind::Expr(expr) => self.expr(*expr),
            // The parser only puts declarations and expressions here.
            _ => String::new(),
        }
    }

    /// A let declaration without its trailing semicolon.
    ///
    /// `auto` is used only when the declaration has an initializer but no
    /// explicit annotation; parameters and returns are always `int`.
    fn let_fragment(&self, name: &Ident, ty: Option<&TypeAnn>, init: Option<ExprId>) -> String {
        let lowered_ty = match (ty, init) {
            (None, Some(_)) => "auto",
            _ => "int",
        };
        match init {
            Some(expr) => format!("{lowered_ty} {name} = {}", self.expr(expr)),
            None => format!("{lowered_ty} {name}"),
        }
    }

    /// Render an expression as C++ text.
    fn expr(&self, id: ExprId) -> String {
        let expr = &self.file.exprs[id];
        match &expr.kind {
            ExprKind::Number(n) => n.to_string(),
            ExprKind::Bool(b) => b.to_string(),
            ExprKind::Ident(name) | ExprKind::SelfAccess(name) => name.to_string(),
            ExprKind::Call { callee, args } => {
                let name = match &self.file.exprs[*callee].kind {
                    ExprKind::Ident(name) | ExprKind::SelfAccess(name) => name.clone(),
                    // The parser restricts call targets to simple names.
                    _ => Ident::new(""),
                };
                let args = args
                    .iter()
                    .map(|&a| self.expr(a))
                    .collect::<Vec<_>>()
                    .join(", ");

                if self.reloadable.contains(&name) && self.current_unit != Some(name.as_str()) {
                    format!("{name}.get()({args})")
                } else {
                    format!("{name}({args})")
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                format!("({} {} {})", self.expr(*lhs), op.symbol(), self.expr(*rhs))
            }
            ExprKind::Unary { op, operand } => {
                format!("({}{})", op.symbol(), self.expr(*operand))
            }
            ExprKind::PreIncr(operand) => format!("(++{})", self.expr(*operand)),
            ExprKind::PostIncr(operand) => format!("({}++)", self.expr(*operand)),
            // Sleeps are thread-blocking host calls; awaiting is unwrapping.
            ExprKind::Await(operand) => self.expr(*operand),
        }
    }

    fn line(&mut self, text: &str) {
        self.write_indent();
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn write_indent(&mut self) {
        self.out.push_str(&" ".repeat(self.indent * 2));
    }

    fn push_str(&mut self, text: &str) {
        self.out.push_str(text);
    }
}
