// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Native toolchain invocation.
//!
//! Wraps the external C++ compiler resolved from `CXX` (default `c++`).
//! Shared objects are produced under the lockfile protocol: the lock is
//! created exclusively before the compiler runs and removed only after
//! the finished object has been renamed over the unit's `lib` path, so
//! the running binary never observes a half-written object.

use std::fs;
use std::path::Path;
use std::time::Duration;

use molten_hotreload::{LockGuard, UnitPaths};
use thiserror::Error;
use tracing::debug;

/// A toolchain invocation error.
#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("failed to invoke {compiler}: {message}")]
    Invoke { compiler: String, message: String },

    #[error("compilation failed (exit {status})\n{diagnostics}")]
    Compile { status: i32, diagnostics: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The external native toolchain.
#[derive(Debug, Clone)]
pub struct Toolchain {
    compiler: String,
    hold: Duration,
}

impl Toolchain {
    /// Resolve the toolchain from the environment: `CXX` (default `c++`)
    /// and the `MOLTEN_BUILD_HOLD_MS` lockfile-race test hook.
    pub fn from_env() -> Self {
        Self::new(molten_env::cxx()).with_hold(molten_env::build_hold())
    }

    /// A toolchain around a specific compiler executable.
    pub fn new(compiler: impl Into<String>) -> Self {
        Self {
            compiler: compiler.into(),
            hold: Duration::ZERO,
        }
    }

    /// Hold the lockfile for this long after a successful build.
    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    /// The compiler executable this toolchain invokes.
    pub fn compiler(&self) -> &str {
        &self.compiler
    }

    /// Whether the compiler executable responds at all.
    pub fn is_available(&self) -> bool {
        molten_process::responds(&self.compiler, Duration::from_secs(10))
    }

    /// Build the main translation unit into an executable.
    pub fn build_executable(&self, main_src: &Path, out_exe: &Path) -> Result<(), ToolchainError> {
        debug!(src = %main_src.display(), exe = %out_exe.display(), "building executable");
        self.invoke(&[
            "-std=c++17",
            "-x",
            "c++",
            &main_src.display().to_string(),
            "-o",
            &out_exe.display().to_string(),
            "-ldl",
            "-rdynamic",
        ])
    }

    /// Build one per-function translation unit into its shared object,
    /// under the lockfile protocol.
    pub fn build_shared_object(
        &self,
        source: &str,
        paths: &UnitPaths,
    ) -> Result<(), ToolchainError> {
        let lock = LockGuard::acquire(&paths.lock)?;
        fs::write(&paths.src, source)?;

        // Compile into a staging path, then rename over lib so its mtime
        // reflects a completed build.
        let staging = staging_path(paths);
        let result = self.invoke(&[
            "-std=c++17",
            "-x",
            "c++",
            "-shared",
            "-fPIC",
            &paths.src.display().to_string(),
            "-o",
            &staging.display().to_string(),
        ]);

        if let Err(err) = result {
            let _ = fs::remove_file(&staging);
            // Dropping the guard removes the lock; lib is untouched.
            drop(lock);
            return Err(err);
        }

        fs::rename(&staging, &paths.lib)?;

        if !self.hold.is_zero() {
            // Lockfile-race test hook: lib is fresh but still locked.
            std::thread::sleep(self.hold);
        }

        lock.release()?;
        Ok(())
    }

    fn invoke(&self, args: &[&str]) -> Result<(), ToolchainError> {
        let output = molten_process::capture(&self.compiler, args).map_err(|message| {
            ToolchainError::Invoke {
                compiler: self.compiler.clone(),
                message,
            }
        })?;

        if output.status != 0 {
            return Err(ToolchainError::Compile {
                status: output.status,
                diagnostics: output.stderr,
            });
        }
        Ok(())
    }
}

fn staging_path(paths: &UnitPaths) -> std::path::PathBuf {
    let mut staging = paths.lib.clone().into_os_string();
    staging.push(".new");
    staging.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{stub_compiler, test_dir, STUB_COPY};

    #[test]
    fn test_shared_object_build_publishes_and_unlocks() {
        let dir = test_dir("toolchain_ok");
        let compiler = stub_compiler(&dir, STUB_COPY);
        let paths = UnitPaths::for_unit(&dir, "shift");

        let toolchain = Toolchain::new(compiler.display().to_string());
        toolchain
            .build_shared_object("body-v1", &paths)
            .expect("build should succeed");

        assert_eq!(fs::read_to_string(&paths.lib).unwrap(), "body-v1");
        assert!(paths.src.exists());
        assert!(!paths.lock.exists(), "lock must be gone after a build");
        assert!(
            !staging_path(&paths).exists(),
            "staging file must be renamed away"
        );

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_failed_build_leaves_lib_untouched_and_unlocks() {
        let dir = test_dir("toolchain_fail");
        let paths = UnitPaths::for_unit(&dir, "shift");
        fs::write(&paths.lib, "previous-good").unwrap();

        let compiler = stub_compiler(&dir, "echo 'stub: no such symbol' >&2\nexit 1");
        let toolchain = Toolchain::new(compiler.display().to_string());

        let err = toolchain
            .build_shared_object("body-v2", &paths)
            .expect_err("build should fail");

        match err {
            ToolchainError::Compile {
                status,
                diagnostics,
            } => {
                assert_eq!(status, 1);
                assert!(diagnostics.contains("no such symbol"));
            }
            other => panic!("expected compile error, got {other:?}"),
        }

        assert_eq!(fs::read_to_string(&paths.lib).unwrap(), "previous-good");
        assert!(!paths.lock.exists(), "lock must be removed on failure");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_held_lock_rejects_build() {
        let dir = test_dir("toolchain_locked");
        let compiler = stub_compiler(&dir, STUB_COPY);
        let paths = UnitPaths::for_unit(&dir, "shift");
        fs::write(&paths.lock, "").unwrap();

        let toolchain = Toolchain::new(compiler.display().to_string());
        let err = toolchain
            .build_shared_object("body", &paths)
            .expect_err("held lock must fail the build");

        assert!(matches!(err, ToolchainError::Io(_)));
        assert!(paths.lock.exists(), "foreign lock must not be removed");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_hold_keeps_lock_while_lib_is_fresh() {
        let dir = test_dir("toolchain_hold");
        let compiler = stub_compiler(&dir, STUB_COPY);
        let paths = UnitPaths::for_unit(&dir, "shift");

        let toolchain = Toolchain::new(compiler.display().to_string())
            .with_hold(Duration::from_millis(300));

        let builder = {
            let toolchain = toolchain.clone();
            let paths = paths.clone();
            std::thread::spawn(move || toolchain.build_shared_object("held", &paths))
        };

        // Wait for lib to be published, then observe the lock still held.
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !paths.lib.exists() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(paths.lib.exists(), "lib should appear during the hold");
        assert!(paths.lock.exists(), "lock should still be held");

        builder.join().unwrap().expect("build should succeed");
        assert!(!paths.lock.exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_compiler_is_invoke_error() {
        let dir = test_dir("toolchain_missing");
        let paths = UnitPaths::for_unit(&dir, "shift");

        let toolchain = Toolchain::new("/nonexistent/molten-cc");
        let err = toolchain
            .build_shared_object("body", &paths)
            .expect_err("missing compiler must fail");
        assert!(matches!(err, ToolchainError::Invoke { .. }));
        assert!(!paths.lock.exists());

        let _ = fs::remove_dir_all(&dir);
    }
}
