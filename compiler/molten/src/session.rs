// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! The driver session: build, launch, watch, reconcile.
//!
//! A session compiles the program once (fatal on any failure), launches
//! the generated executable attached to the terminal, then loops between
//! polling the child and handling debounced source changes. Reload-time
//! failures are never fatal; the session ends when the program exits and
//! its exit code is propagated.

use std::path::Path;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use miette::{miette, Context, IntoDiagnostic};
use tracing::{debug, error, info, warn};

use crate::artifacts::ArtifactSpace;
use crate::pipeline;
use crate::reconcile::Reconciler;
use crate::toolchain::Toolchain;
use crate::watch::SourceWatcher;

/// Run a program under the native backend. Returns the program's exit code.
pub fn run(source_path: &Path, show_generated: bool) -> miette::Result<i32> {
    let source = std::fs::read_to_string(source_path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", source_path.display()))?;

    let program = match pipeline::analyze(&source) {
        Ok(program) => program,
        Err(diagnostics) => {
            for diagnostic in &diagnostics {
                error!("{diagnostic}");
            }
            return Err(miette!(
                "{} is not a valid program ({} errors)",
                source_path.display(),
                diagnostics.len()
            ));
        }
    };

    let units = molten_lower::lower_units(&program);
    let artifacts = ArtifactSpace::create(units.iter().map(|u| u.name.clone()))
        .into_diagnostic()
        .wrap_err("failed to allocate the artifact directory")?;

    let main_source = molten_lower::lower_main(&program, artifacts.unit_paths())
        .into_diagnostic()?;

    if show_generated {
        eprintln!("{main_source}");
    }

    let toolchain = Toolchain::from_env();
    if !toolchain.is_available() {
        return Err(miette!(
            "C++ toolchain '{}' is not available; point CXX at a working compiler",
            toolchain.compiler()
        ));
    }
    info!(
        compiler = toolchain.compiler(),
        artifacts = %artifacts.root().display(),
        "building {} ({} hotreload units)",
        program.class_name,
        units.len()
    );

    for unit in &units {
        let paths = artifacts
            .paths_for(unit.name.as_str())
            .expect("paths were allocated for every unit");
        toolchain
            .build_shared_object(&unit.source, paths)
            .into_diagnostic()
            .wrap_err_with(|| format!("initial build of {} failed", unit.name))?;
    }

    std::fs::write(artifacts.main_src(), &main_source)
        .into_diagnostic()
        .wrap_err("failed to write the main translation unit")?;
    toolchain
        .build_executable(artifacts.main_src(), artifacts.main_exe())
        .into_diagnostic()
        .wrap_err("initial build of the program failed")?;

    info!("launching {}", artifacts.main_exe().display());
    let mut child = molten_process::spawn_attached(artifacts.main_exe(), &[])
        .map_err(|message| miette!("{message}"))?;

    let mut reconciler = Reconciler::new(source_path.to_path_buf(), &units);
    debug!("tracking {} hotreload units", reconciler.known().len());
    let mut watch_rx = match SourceWatcher::default().watch(source_path.to_path_buf()) {
        Ok(rx) => Some(rx),
        Err(err) => {
            warn!("file watching unavailable, live edits are disabled: {err}");
            None
        }
    };

    loop {
        if let Some(status) = child.try_wait().into_diagnostic()? {
            let code = status.code().unwrap_or(1);
            info!("program exited with status {code}");
            return Ok(code);
        }

        let disconnected = if let Some(rx) = &watch_rx {
            match rx.recv_timeout(Duration::from_millis(200)) {
                Ok(_) => {
                    reconciler.on_change(&artifacts, &toolchain);
                    false
                }
                Err(RecvTimeoutError::Timeout) => false,
                Err(RecvTimeoutError::Disconnected) => true,
            }
        } else {
            std::thread::sleep(Duration::from_millis(200));
            false
        };

        if disconnected {
            warn!("file watcher stopped, live edits are disabled");
            watch_rx = None;
        }
    }
}
