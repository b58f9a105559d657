// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Per-run artifact allocation.
//!
//! Every run gets a fresh `molten-<run-id>` directory under the system
//! temp dir holding the generated main unit, the built executable, and
//! one `{src, lib, copy, lock}` quadruple per reloadable function.
//! Basenames are stable for the lifetime of the process; the directory
//! is fresh across runs, which also guarantees a crashed prior run's
//! stale lockfiles are never observed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use molten_ast::Ident;
use molten_hotreload::UnitPaths;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

/// The per-run artifact directory and its allocated paths.
#[derive(Debug)]
pub struct ArtifactSpace {
    root: PathBuf,
    main_src: PathBuf,
    main_exe: PathBuf,
    units: FxHashMap<Ident, UnitPaths>,
}

impl ArtifactSpace {
    /// Create the run directory and allocate paths for each unit name.
    pub fn create(unit_names: impl IntoIterator<Item = Ident>) -> io::Result<Self> {
        let run_id = molten_runid::RunId::fresh();
        let root = std::env::temp_dir().join(format!("molten-{run_id}"));
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "created artifact directory");

        let units = unit_names
            .into_iter()
            .map(|name| {
                let paths = UnitPaths::for_unit(&root, name.as_str());
                (name, paths)
            })
            .collect();

        Ok(Self {
            main_src: root.join("main.src"),
            main_exe: root.join("main.exe"),
            root,
            units,
        })
    }

    /// The run directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the generated main translation unit.
    pub fn main_src(&self) -> &Path {
        &self.main_src
    }

    /// Path of the built executable.
    pub fn main_exe(&self) -> &Path {
        &self.main_exe
    }

    /// The file quadruple for a unit, if one was allocated.
    pub fn paths_for(&self, name: &str) -> Option<&UnitPaths> {
        self.units.get(name)
    }

    /// All allocated unit paths, keyed by unit name.
    pub fn unit_paths(&self) -> &FxHashMap<Ident, UnitPaths> {
        &self.units
    }
}

impl Drop for ArtifactSpace {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_dir_all(&self.root) {
            warn!(
                root = %self.root.display(),
                "failed to remove artifact directory: {err}"
            );
        }
    }
}
