// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! C++ emission for validated Molten programs.
//!
//! The lowerer produces two kinds of translation unit:
//!
//! - one **per-function unit** for every `@hotreload` method: the runtime
//!   prelude, declarations for the rest of the program, and a single
//!   `extern "C"` function named after the method;
//! - the **main unit**: runtime prelude and host support, forward
//!   declarations, the non-reloadable methods as free functions in source
//!   order, one `HotReload` cell per reloadable method in source order
//!   bound to its file quadruple, and `main` last.
//!
//! Emission is deterministic: re-lowering an unchanged program yields
//! byte-identical output.

mod emit;

use molten_ast::Ident;
use molten_hotreload::{UnitPaths, HOST_SUPPORT, RUNTIME_PRELUDE};
use molten_validate::{Method, MethodKind, Program};
use rustc_hash::{FxHashMap, FxHashSet};
use sha2::{Digest, Sha256};
use thiserror::Error;

use emit::Emitter;

/// Marker line at the top of every generated unit.
const GENERATED_HEADER: &str = "// Generated by molten. Edit the DSL source, not this file.\n";

/// A lowering error.
#[derive(Debug, Error)]
pub enum LowerError {
    #[error("no artifact paths allocated for reloadable function {name}")]
    MissingUnitPaths { name: String },
}

/// One lowered reloadable function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoweredUnit {
    /// Function name; also the external symbol in the shared object.
    pub name: Ident,
    /// Canonical signature string, e.g. `int(int)`. A reload that changes
    /// this is rejected.
    pub signature: String,
    /// sha256 of the emitted function definition. A reload rebuilds the
    /// unit only when this moves.
    pub body_hash: String,
    /// Complete translation unit source.
    pub source: String,
}

/// Canonical C++ signature for a method: return and parameter types only.
pub fn signature_of(method: &Method) -> String {
    let params = method
        .params
        .iter()
        .map(|_| "int")
        .collect::<Vec<_>>()
        .join(", ");
    format!("int({params})")
}

/// Lower every reloadable method into its own translation unit.
///
/// Unit sources are path-independent, so the watcher can re-lower and
/// diff without touching the artifact directory.
pub fn lower_units(program: &Program) -> Vec<LoweredUnit> {
    let reloadable = reloadable_names(program);

    program
        .reloadable_methods()
        .map(|method| {
            let mut emitter = Emitter::new(&program.file, &reloadable, Some(method.name.as_str()));
            emitter.emit_function(method, "extern \"C\" ");
            let definition = emitter.finish();

            let mut source = String::new();
            source.push_str(GENERATED_HEADER);
            source.push_str(RUNTIME_PRELUDE);
            source.push('\n');
            push_program_decls(&mut source, program, Some(method.name.as_str()));
            source.push('\n');
            source.push_str(&definition);

            LoweredUnit {
                name: method.name.clone(),
                signature: signature_of(method),
                body_hash: content_hash(&definition),
                source,
            }
        })
        .collect()
}

/// Lower the main translation unit, wiring each reload cell to its paths.
pub fn lower_main(
    program: &Program,
    paths: &FxHashMap<Ident, UnitPaths>,
) -> Result<String, LowerError> {
    let reloadable = reloadable_names(program);

    let mut source = String::new();
    source.push_str(GENERATED_HEADER);
    source.push_str(RUNTIME_PRELUDE);
    source.push('\n');
    source.push_str(HOST_SUPPORT);
    source.push('\n');
    push_program_decls(&mut source, program, None);
    source.push('\n');

    // Non-reloadable methods as free functions, in source order.
    for method in &program.methods {
        if method.kind != MethodKind::Static {
            continue;
        }
        let mut emitter = Emitter::new(&program.file, &reloadable, None);
        emitter.emit_function(method, "");
        source.push_str(&emitter.finish());
        source.push('\n');
    }

    // Reload cells, in source order.
    for method in program.reloadable_methods() {
        let unit_paths =
            paths
                .get(&method.name)
                .ok_or_else(|| LowerError::MissingUnitPaths {
                    name: method.name.to_string(),
                })?;
        source.push_str(&format!(
            "HotReload<{sig}> {name}(\"{name}\", {lib}, {copy}, {lock});\n",
            sig = signature_of(method),
            name = method.name,
            lib = c_string(&unit_paths.lib.display().to_string()),
            copy = c_string(&unit_paths.copy.display().to_string()),
            lock = c_string(&unit_paths.lock.display().to_string()),
        ));
    }
    source.push('\n');

    // Entry point last.
    let main = program
        .methods
        .iter()
        .find(|m| m.kind == MethodKind::Main)
        .expect("validated programs always carry main");
    let mut emitter = Emitter::new(&program.file, &reloadable, None);
    emitter.emit_function(main, "");
    source.push_str(&emitter.finish());

    Ok(source)
}

/// Forward declarations shared by every unit: free-function prototypes
/// for the non-reloadable methods and `extern` declarations for the
/// reload cells. The executable exports both (it links `-rdynamic`), so
/// shared objects resolve them at `dlopen` time. `exclude` drops a unit's
/// own name, which would otherwise collide with its `extern "C"` symbol.
fn push_program_decls(out: &mut String, program: &Program, exclude: Option<&str>) {
    for method in &program.methods {
        match method.kind {
            MethodKind::Static => {
                let params = method
                    .params
                    .iter()
                    .map(|_| "int")
                    .collect::<Vec<_>>()
                    .join(", ");
                out.push_str(&format!("int {}({params});\n", method.name));
            }
            MethodKind::Hotreload => {
                if Some(method.name.as_str()) == exclude {
                    continue;
                }
                out.push_str(&format!(
                    "extern HotReload<{sig}> {name};\n",
                    sig = signature_of(method),
                    name = method.name,
                ));
            }
            MethodKind::Main => {}
        }
    }
}

fn reloadable_names(program: &Program) -> FxHashSet<Ident> {
    program
        .reloadable_methods()
        .map(|m| m.name.clone())
        .collect()
}

/// Hex sha256 of emitted text.
fn content_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// Render a path as a quoted C string literal.
fn c_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}
