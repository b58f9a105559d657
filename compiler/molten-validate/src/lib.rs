// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Validation for the Molten hot-reload DSL.
//!
//! Enforces the admitted subset over the parsed AST and classifies the
//! program's methods:
//!
//! - exactly one class, extending `HotReloadProgram`, methods only;
//! - every parameter and return type in the supported set (`number`,
//!   plus `Promise<number>` in return position);
//! - at most one annotation per method, and only `@hotreload`;
//! - exactly one `main`, parameterless and not reloadable;
//! - `self.name` references expanded to plain identifiers.
//!
//! The output [`Program`] is the validated model the lowerer consumes.

mod error;

use molten_ast::span::Span;
use molten_ast::*;
use rustc_hash::FxHashSet;

pub use error::ValidateError;

/// How a method participates in the generated program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// The entry point. Lowered into the main translation unit.
    Main,
    /// Reloadable: lowered into its own translation unit behind a cell.
    Hotreload,
    /// Everything else: lowered as a free function in the main unit.
    Static,
}

/// A validated method record.
#[derive(Debug, Clone)]
pub struct Method {
    /// Source location of the method.
    pub span: Span,
    /// Method name. For reloadable methods this is the external symbol.
    pub name: Ident,
    /// Classification of the method.
    pub kind: MethodKind,
    /// Parameters in source order.
    pub params: Vec<Param>,
    /// Declared return type (`Promise<number>` already admitted here).
    pub return_type: TypeAnn,
    /// Method body, referencing the program's arenas.
    pub body: Block,
}

impl Method {
    /// Whether this method is hot-reloadable.
    pub fn reloadable(&self) -> bool {
        self.kind == MethodKind::Hotreload
    }
}

/// A validated program: the class name, its classified methods in source
/// order, and the arenas their bodies live in.
#[derive(Debug, Clone)]
pub struct Program {
    /// Name of the program class.
    pub class_name: Ident,
    /// Methods in source order.
    pub methods: Vec<Method>,
    /// The underlying file, with `self.` accesses already expanded.
    pub file: SourceFile,
}

impl Program {
    /// The program's reloadable methods, in source order.
    pub fn reloadable_methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter().filter(|m| m.reloadable())
    }
}

/// Validate a parsed source file into a [`Program`].
///
/// All detectable violations are collected before failing, so a driver
/// diagnostic can show everything wrong with an edit at once.
pub fn validate(mut file: SourceFile) -> Result<Program, Vec<ValidateError>> {
    let mut errors = Vec::new();

    let class = match file.items.as_slice() {
        [Item::Class(class)] => class.clone(),
        items => {
            let span = items
                .get(1)
                .map(|Item::Class(c)| c.span)
                .unwrap_or(Span::point(0));
            return Err(vec![ValidateError::ProgramClassCount {
                span,
                found: items.len(),
            }]);
        }
    };

    if class.base != "HotReloadProgram" {
        errors.push(ValidateError::WrongBaseClass {
            span: class.span,
            base: class.base.to_string(),
        });
    }

    let mut methods = Vec::new();
    let mut seen = FxHashSet::default();

    for member in &class.members {
        let decl = match member {
            ClassMember::Method(decl) => decl,
            ClassMember::Field(field) => {
                errors.push(ValidateError::FieldNotSupported {
                    span: field.span,
                    name: field.name.to_string(),
                });
                continue;
            }
        };

        if !seen.insert(decl.name.clone()) {
            errors.push(ValidateError::DuplicateMethod {
                span: decl.span,
                name: decl.name.to_string(),
            });
            continue;
        }

        let reloadable = check_annotations(decl, &mut errors);
        check_types(decl, &mut errors);

        let kind = if decl.name == "main" {
            if !decl.params.is_empty() {
                errors.push(ValidateError::MainWithParams { span: decl.span });
            }
            if reloadable {
                errors.push(ValidateError::MainMarkedReloadable { span: decl.span });
            }
            MethodKind::Main
        } else if reloadable {
            MethodKind::Hotreload
        } else {
            MethodKind::Static
        };

        methods.push(Method {
            span: decl.span,
            name: decl.name.clone(),
            kind,
            params: decl.params.clone(),
            return_type: decl.return_type.clone(),
            body: decl.body.clone(),
        });
    }

    if !methods.iter().any(|m| m.kind == MethodKind::Main) {
        errors.push(ValidateError::MissingMain { span: class.span });
    }

    expand_self_accesses(&mut file, &seen, &mut errors);

    if errors.is_empty() {
        Ok(Program {
            class_name: class.name,
            methods,
            file,
        })
    } else {
        Err(errors)
    }
}

/// Check a method's annotations; returns whether it is reloadable.
fn check_annotations(decl: &MethodDecl, errors: &mut Vec<ValidateError>) -> bool {
    if decl.annotations.len() > 1 {
        errors.push(ValidateError::MultipleAnnotations {
            span: decl.span,
            name: decl.name.to_string(),
        });
    }

    match decl.annotations.first() {
        Some(ann) if ann.name == "hotreload" => true,
        Some(ann) => {
            errors.push(ValidateError::UnsupportedAnnotation {
                span: ann.span,
                name: ann.name.to_string(),
            });
            false
        }
        None => false,
    }
}

/// Check parameter and return types against the supported set.
fn check_types(decl: &MethodDecl, errors: &mut Vec<ValidateError>) {
    for param in &decl.params {
        match &param.ty.kind {
            TypeKind::Number => {}
            TypeKind::PromiseNumber => {
                errors.push(ValidateError::PromiseOutsideReturn { span: param.ty.span });
            }
            TypeKind::Named(name) => {
                errors.push(ValidateError::UnsupportedType {
                    span: param.ty.span,
                    name: name.to_string(),
                });
            }
        }
    }

    if let TypeKind::Named(name) = &decl.return_type.kind {
        errors.push(ValidateError::UnsupportedType {
            span: decl.return_type.span,
            name: name.to_string(),
        });
    }
}

/// Rewrite every `self.name` to a plain identifier, requiring that `name`
/// is a method of the class.
fn expand_self_accesses(
    file: &mut SourceFile,
    method_names: &FxHashSet<Ident>,
    errors: &mut Vec<ValidateError>,
) {
    let ids: Vec<ExprId> = file.exprs.iter().map(|(id, _)| id).collect();

    for id in ids {
        let ExprKind::SelfAccess(name) = &file.exprs[id].kind else {
            continue;
        };
        let name = name.clone();
        let span = file.exprs[id].span;

        if method_names.contains(&name) {
            file.exprs[id].kind = ExprKind::Ident(name);
        } else {
            errors.push(ValidateError::UnknownSelfMember {
                span,
                name: name.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validated(source: &str) -> Program {
        let (file, errors) = molten_parser::parse(source);
        assert!(errors.is_empty(), "parse errors: {errors:?}");
        validate(file).expect("program should validate")
    }

    fn validation_errors(source: &str) -> Vec<ValidateError> {
        let (file, errors) = molten_parser::parse(source);
        assert!(errors.is_empty(), "parse errors: {errors:?}");
        validate(file).expect_err("program should not validate")
    }

    const COUNTER: &str = r#"
        class Counter extends HotReloadProgram {
            @hotreload
            scale(a: number): number { return a * 1; }

            @hotreload
            shift(a: number): number { return a + 0; }

            helper(a: number): number { return a; }

            async main(): Promise<number> {
                let i = 0;
                while (true) {
                    print(self.shift(self.scale(i)));
                    await sleep_seconds(1);
                    i++;
                }
                return 0;
            }
        }
    "#;

    #[test]
    fn test_classification() {
        let program = validated(COUNTER);
        assert_eq!(program.class_name.as_str(), "Counter");

        let kinds: Vec<_> = program.methods.iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            [
                MethodKind::Hotreload,
                MethodKind::Hotreload,
                MethodKind::Static,
                MethodKind::Main
            ]
        );
        assert_eq!(program.reloadable_methods().count(), 2);
    }

    #[test]
    fn test_self_accesses_expanded() {
        let program = validated(COUNTER);
        let has_self = program
            .file
            .exprs
            .iter()
            .any(|(_, e)| matches!(e.kind, ExprKind::SelfAccess(_)));
        assert!(!has_self, "self accesses should be rewritten");
    }

    #[test]
    fn test_field_rejected() {
        let errors = validation_errors(
            r#"
            class P extends HotReloadProgram {
                counter: number = 0;
                main(): number { return 0; }
            }
            "#,
        );
        assert!(matches!(
            errors[0],
            ValidateError::FieldNotSupported { .. }
        ));
        assert!(errors[0].to_string().contains("field"));
    }

    #[test]
    fn test_wrong_base_rejected() {
        let errors = validation_errors(
            r#"
            class P extends Object {
                main(): number { return 0; }
            }
            "#,
        );
        assert!(matches!(errors[0], ValidateError::WrongBaseClass { .. }));
    }

    #[test]
    fn test_unknown_annotation_rejected() {
        let errors = validation_errors(
            r#"
            class P extends HotReloadProgram {
                @deprecated
                f(a: number): number { return a; }
                main(): number { return 0; }
            }
            "#,
        );
        assert!(matches!(
            errors[0],
            ValidateError::UnsupportedAnnotation { .. }
        ));
    }

    #[test]
    fn test_main_with_params_rejected() {
        let errors = validation_errors(
            r#"
            class P extends HotReloadProgram {
                main(a: number): number { return a; }
            }
            "#,
        );
        assert!(matches!(errors[0], ValidateError::MainWithParams { .. }));
    }

    #[test]
    fn test_main_hotreload_rejected() {
        let errors = validation_errors(
            r#"
            class P extends HotReloadProgram {
                @hotreload
                main(): number { return 0; }
            }
            "#,
        );
        assert!(matches!(
            errors[0],
            ValidateError::MainMarkedReloadable { .. }
        ));
    }

    #[test]
    fn test_missing_main_rejected() {
        let errors = validation_errors(
            r#"
            class P extends HotReloadProgram {
                f(a: number): number { return a; }
            }
            "#,
        );
        assert!(matches!(errors[0], ValidateError::MissingMain { .. }));
    }

    #[test]
    fn test_unsupported_type_rejected() {
        let errors = validation_errors(
            r#"
            class P extends HotReloadProgram {
                f(a: string): number { return 0; }
                main(): number { return 0; }
            }
            "#,
        );
        assert!(matches!(errors[0], ValidateError::UnsupportedType { .. }));
    }

    #[test]
    fn test_promise_param_rejected() {
        let errors = validation_errors(
            r#"
            class P extends HotReloadProgram {
                f(a: Promise<number>): number { return 0; }
                main(): number { return 0; }
            }
            "#,
        );
        assert!(matches!(
            errors[0],
            ValidateError::PromiseOutsideReturn { .. }
        ));
    }

    #[test]
    fn test_unknown_self_member_rejected() {
        let errors = validation_errors(
            r#"
            class P extends HotReloadProgram {
                main(): number { return self.missing(); }
            }
            "#,
        );
        assert!(matches!(
            errors[0],
            ValidateError::UnknownSelfMember { .. }
        ));
    }

    #[test]
    fn test_duplicate_method_rejected() {
        let errors = validation_errors(
            r#"
            class P extends HotReloadProgram {
                f(a: number): number { return 0; }
                f(a: number): number { return 1; }
                main(): number { return 0; }
            }
            "#,
        );
        assert!(matches!(errors[0], ValidateError::DuplicateMethod { .. }));
    }
}
