// SPDX-License-Identifier: PMPL-1.0-or-later

//! Process execution for the Molten driver.
//!
//! The driver runs exactly two kinds of child process: short toolchain
//! invocations whose diagnostics it captures, and the generated program
//! itself, which owns the terminal until it exits. [`capture`] and
//! [`responds`] cover the former, [`spawn_attached`] the latter.

use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// Status and diagnostics of a finished toolchain invocation.
///
/// stdout is discarded: compilers report through stderr, and the driver
/// never reads anything else from them.
#[derive(Debug, Clone)]
pub struct Captured {
    pub status: i32,
    pub stderr: String,
}

/// Run a command to completion, capturing its diagnostics stream.
pub fn capture(program: &str, args: &[&str]) -> Result<Captured, String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|err| format!("could not run '{program}': {err}"))?;

    Ok(Captured {
        status: output.status.code().unwrap_or(-1),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Whether `program --version` exits zero within the deadline.
///
/// This is the driver's toolchain probe before the first real build; a
/// hung or missing compiler reads as not responding.
pub fn responds(program: &str, deadline: Duration) -> bool {
    let spawned = Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    let Ok(mut child) = spawned else {
        return false;
    };

    let give_up = Instant::now() + deadline;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return status.success(),
            Ok(None) if Instant::now() < give_up => {
                std::thread::sleep(Duration::from_millis(25));
            }
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return false;
            }
        }
    }
}

/// Spawn a long-running child that inherits the driver's stdio.
///
/// The caller owns the [`Child`] and is expected to poll `try_wait`
/// while doing other work (the driver does so between watch events).
pub fn spawn_attached(program: &Path, args: &[&str]) -> Result<Child, String> {
    Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|err| format!("failed to launch '{}': {}", program.display(), err))
}
