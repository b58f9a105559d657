// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Reload reconciliation.
//!
//! On every source change the front-end and lowerer run again, and the
//! fresh unit map is diffed against what the running binary was built
//! with. The diff enforces the reload policy:
//!
//! - a deleted reloadable function blocks the whole pass;
//! - a changed signature blocks the whole pass;
//! - a new reloadable function is warned about and skipped;
//! - an unchanged signature with a changed body triggers a rebuild of
//!   exactly that unit.
//!
//! Nothing here is ever fatal: on any failure the old state stays live
//! and the watcher keeps running.

use std::path::PathBuf;

use molten_ast::Ident;
use molten_lower::LoweredUnit;
use rustc_hash::FxHashMap;
use tracing::{error, info, warn};

use crate::artifacts::ArtifactSpace;
use crate::pipeline;
use crate::toolchain::Toolchain;

/// What the running binary currently has for one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownPatch {
    /// Canonical signature the unit was built with.
    pub signature: String,
    /// Hash of the body behind the live shared object.
    pub body_hash: String,
}

/// A policy violation that blocks a reload pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadBlock {
    /// A known reloadable function is missing from the new program.
    Deleted(Ident),
    /// A known reloadable function changed its signature.
    SignatureChanged {
        name: Ident,
        from: String,
        to: String,
    },
}

impl std::fmt::Display for ReloadBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deleted(name) => {
                write!(f, "deletion of hotreload function {name} is unsupported")
            }
            Self::SignatureChanged { name, from, to } => write!(
                f,
                "signature change of hotreload function {name} is unsupported ({from} -> {to})"
            ),
        }
    }
}

/// The outcome of diffing a fresh unit map against the known state.
#[derive(Debug, Default)]
pub struct ReloadPlan {
    /// Violations; any entry blocks the whole pass.
    pub violations: Vec<ReloadBlock>,
    /// Units whose body changed under an unchanged signature.
    pub stale: Vec<Ident>,
    /// Reloadable functions that did not exist at initial compile.
    pub additions: Vec<Ident>,
}

impl ReloadPlan {
    /// Whether any rebuild may proceed.
    pub fn blocked(&self) -> bool {
        !self.violations.is_empty()
    }
}

/// Diff freshly lowered units against the known patch state.
pub fn plan(known: &FxHashMap<Ident, KnownPatch>, units: &[LoweredUnit]) -> ReloadPlan {
    let mut out = ReloadPlan::default();

    for name in known.keys() {
        if !units.iter().any(|u| &u.name == name) {
            out.violations.push(ReloadBlock::Deleted(name.clone()));
        }
    }

    for unit in units {
        match known.get(&unit.name) {
            None => out.additions.push(unit.name.clone()),
            Some(patch) if patch.signature != unit.signature => {
                out.violations.push(ReloadBlock::SignatureChanged {
                    name: unit.name.clone(),
                    from: patch.signature.clone(),
                    to: unit.signature.clone(),
                });
            }
            Some(patch) if patch.body_hash != unit.body_hash => {
                out.stale.push(unit.name.clone());
            }
            Some(_) => {}
        }
    }

    out
}

/// Watches over the known patch state and drives rebuilds.
pub struct Reconciler {
    source: PathBuf,
    known: FxHashMap<Ident, KnownPatch>,
}

impl Reconciler {
    /// Track the units the initial build was made from.
    pub fn new(source: PathBuf, units: &[LoweredUnit]) -> Self {
        let known = units
            .iter()
            .map(|u| {
                (
                    u.name.clone(),
                    KnownPatch {
                        signature: u.signature.clone(),
                        body_hash: u.body_hash.clone(),
                    },
                )
            })
            .collect();
        Self { source, known }
    }

    /// The current known patch state.
    pub fn known(&self) -> &FxHashMap<Ident, KnownPatch> {
        &self.known
    }

    /// Handle one debounced source change.
    pub fn on_change(&mut self, artifacts: &ArtifactSpace, toolchain: &Toolchain) {
        info!("source changed, re-checking {}", self.source.display());

        let text = match std::fs::read_to_string(&self.source) {
            Ok(text) => text,
            Err(err) => {
                warn!("could not re-read source, keeping old state: {err}");
                return;
            }
        };

        let program = match pipeline::analyze(&text) {
            Ok(program) => program,
            Err(diagnostics) => {
                for diagnostic in &diagnostics {
                    warn!("{diagnostic}");
                }
                warn!("edit rejected, keeping old state");
                return;
            }
        };

        let units = molten_lower::lower_units(&program);
        let plan = plan(&self.known, &units);

        if plan.blocked() {
            for violation in &plan.violations {
                warn!("{violation}");
            }
            warn!("reload blocked, keeping old state");
            return;
        }

        for name in &plan.additions {
            warn!("addition of hotreload function {name} is unsupported, ignoring");
        }

        for name in &plan.stale {
            let unit = units
                .iter()
                .find(|u| &u.name == name)
                .expect("stale names come from the unit list");
            let Some(paths) = artifacts.paths_for(name.as_str()) else {
                warn!("no artifact paths for {name}, ignoring");
                continue;
            };

            match toolchain.build_shared_object(&unit.source, paths) {
                Ok(()) => {
                    info!("rebuilt {name}");
                    self.known.insert(
                        name.clone(),
                        KnownPatch {
                            signature: unit.signature.clone(),
                            body_hash: unit.body_hash.clone(),
                        },
                    );
                }
                Err(err) => {
                    error!("rebuild of {name} failed: {err}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{stub_compiler, test_dir, STUB_COPY};
    use std::fs;

    fn unit(name: &str, signature: &str, body_hash: &str) -> LoweredUnit {
        LoweredUnit {
            name: Ident::new(name),
            signature: signature.to_string(),
            body_hash: body_hash.to_string(),
            source: format!("// {name}"),
        }
    }

    fn known_of(units: &[LoweredUnit]) -> FxHashMap<Ident, KnownPatch> {
        units
            .iter()
            .map(|u| {
                (
                    u.name.clone(),
                    KnownPatch {
                        signature: u.signature.clone(),
                        body_hash: u.body_hash.clone(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_unchanged_program_plans_nothing() {
        let units = [unit("shift", "int(int)", "h1")];
        let plan = plan(&known_of(&units), &units);
        assert!(!plan.blocked());
        assert!(plan.stale.is_empty());
        assert!(plan.additions.is_empty());
    }

    #[test]
    fn test_body_change_is_stale() {
        let known = known_of(&[unit("shift", "int(int)", "h1")]);
        let plan = plan(&known, &[unit("shift", "int(int)", "h2")]);
        assert!(!plan.blocked());
        assert_eq!(plan.stale, [Ident::new("shift")]);
    }

    #[test]
    fn test_deletion_blocks() {
        let known = known_of(&[unit("shift", "int(int)", "h1")]);
        let plan = plan(&known, &[]);
        assert!(plan.blocked());
        assert_eq!(plan.violations, [ReloadBlock::Deleted(Ident::new("shift"))]);
    }

    #[test]
    fn test_signature_change_blocks() {
        let known = known_of(&[unit("shift", "int(int)", "h1")]);
        let plan = plan(&known, &[unit("shift", "int(int, int)", "h1")]);
        assert!(plan.blocked());
        assert!(matches!(
            plan.violations[0],
            ReloadBlock::SignatureChanged { .. }
        ));
    }

    #[test]
    fn test_addition_is_ignored_not_blocking() {
        let known = known_of(&[unit("shift", "int(int)", "h1")]);
        let plan = plan(
            &known,
            &[unit("shift", "int(int)", "h1"), unit("extra", "int(int)", "h9")],
        );
        assert!(!plan.blocked());
        assert!(plan.stale.is_empty());
        assert_eq!(plan.additions, [Ident::new("extra")]);
    }

    #[test]
    fn test_signature_change_blocks_other_rebuilds() {
        // One method's signature changed, another's body changed: the
        // whole pass stops so nothing half-applies.
        let known = known_of(&[
            unit("scale", "int(int)", "h1"),
            unit("shift", "int(int)", "h2"),
        ]);
        let plan = plan(
            &known,
            &[
                unit("scale", "int(int, int)", "h1"),
                unit("shift", "int(int)", "h3"),
            ],
        );
        assert!(plan.blocked());
        // stale is computed but the caller must not act on it when blocked.
        assert_eq!(plan.stale, [Ident::new("shift")]);
    }

    const PROGRAM_V1: &str = r#"
        class Counter extends HotReloadProgram {
            @hotreload
            shift(a: number): number { return a + 0; }

            main(): number { return self.shift(1); }
        }
    "#;

    fn reconciler_fixture(tag: &str) -> (Reconciler, ArtifactSpace, Toolchain, std::path::PathBuf) {
        let dir = test_dir(tag);
        let source_path = dir.join("program.mlt");
        fs::write(&source_path, PROGRAM_V1).unwrap();

        let program = pipeline::analyze(PROGRAM_V1).expect("analyze");
        let units = molten_lower::lower_units(&program);

        let artifacts =
            ArtifactSpace::create(units.iter().map(|u| u.name.clone())).expect("artifacts");
        let compiler = stub_compiler(&dir, STUB_COPY);
        let toolchain = Toolchain::new(compiler.display().to_string());

        (
            Reconciler::new(source_path.clone(), &units),
            artifacts,
            toolchain,
            source_path,
        )
    }

    #[test]
    fn test_on_change_rebuilds_changed_body() {
        let (mut reconciler, artifacts, toolchain, source_path) =
            reconciler_fixture("rebuild");
        let before = reconciler.known().get("shift").unwrap().clone();

        fs::write(&source_path, PROGRAM_V1.replace("a + 0", "a + 10")).unwrap();
        reconciler.on_change(&artifacts, &toolchain);

        let after = reconciler.known().get("shift").unwrap().clone();
        assert_ne!(before.body_hash, after.body_hash);

        let paths = artifacts.paths_for("shift").unwrap();
        assert!(paths.lib.exists(), "rebuild must publish the lib");
        assert!(!paths.lock.exists());
        let lib = fs::read_to_string(&paths.lib).unwrap();
        assert!(lib.contains("return (a + 10);"));
    }

    #[test]
    fn test_on_change_rejects_signature_change() {
        let (mut reconciler, artifacts, toolchain, source_path) = reconciler_fixture("sig");
        let before = reconciler.known().clone();

        fs::write(
            &source_path,
            PROGRAM_V1
                .replace("shift(a: number)", "shift(a: number, b: number)")
                .replace("self.shift(1)", "self.shift(1, 2)"),
        )
        .unwrap();
        reconciler.on_change(&artifacts, &toolchain);

        assert_eq!(&before, reconciler.known(), "state must not move");
        assert!(
            !artifacts.paths_for("shift").unwrap().lib.exists(),
            "no rebuild may happen"
        );
    }

    #[test]
    fn test_on_change_keeps_state_on_parse_error() {
        let (mut reconciler, artifacts, toolchain, source_path) = reconciler_fixture("parse");
        let before = reconciler.known().clone();

        fs::write(&source_path, "class Broken {{{{").unwrap();
        reconciler.on_change(&artifacts, &toolchain);

        assert_eq!(&before, reconciler.known());
    }

    #[test]
    fn test_on_change_survives_compiler_failure() {
        let (mut reconciler, artifacts, _toolchain, source_path) = reconciler_fixture("ccfail");
        let before = reconciler.known().clone();

        let failing = stub_compiler(
            source_path.parent().unwrap(),
            "echo 'unknown symbol' >&2\nexit 1",
        );
        let toolchain = Toolchain::new(failing.display().to_string());

        fs::write(&source_path, PROGRAM_V1.replace("a + 0", "a + 10")).unwrap();
        reconciler.on_change(&artifacts, &toolchain);

        assert_eq!(
            &before,
            reconciler.known(),
            "failed rebuild must not advance the known hash"
        );
        assert!(!artifacts.paths_for("shift").unwrap().lock.exists());
    }
}
