// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Hot-reload protocol shared by the driver and generated binaries.
//!
//! A reloadable function is backed by four files:
//!
//! - `src`: the per-function translation unit the driver regenerates
//! - `lib`: the shared object the compiler produces (rename-published)
//! - `copy`: the consumer's private copy, the one actually `dlopen`ed
//! - `lock`: present exactly while a build is in flight
//!
//! The producer (driver) writes `lib` and `lock`; the consumer (the
//! running binary) writes `copy`. The only cross-process synchronization
//! is the lockfile plus same-directory rename/unlink ordering.
//!
//! This crate carries both halves: [`UnitPaths`]/[`LockGuard`] for the
//! producer, and the embedded C++ runtime sources (`HotReload<T>` and the
//! host API) that the lowerer prepends to generated translation units for
//! the consumer.

mod lock;

use std::path::{Path, PathBuf};

pub use lock::LockGuard;

/// C++ runtime prelude: the `HotReload<T>` cell and host API declarations.
/// Prepended to every generated translation unit.
pub const RUNTIME_PRELUDE: &str = include_str!("hotreload.hh");

/// Host API implementations. Emitted into the main translation unit only.
pub const HOST_SUPPORT: &str = include_str!("host.cc");

/// The on-disk file quadruple backing one reloadable function.
///
/// All four live in the driver's per-run directory and keep stable names
/// for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitPaths {
    /// Per-function translation unit source.
    pub src: PathBuf,
    /// Shared object kept hot by the driver.
    pub lib: PathBuf,
    /// Consumer-owned copy the object is loaded from.
    pub copy: PathBuf,
    /// Marker present while a build is in flight.
    pub lock: PathBuf,
}

impl UnitPaths {
    /// Allocate the path quadruple for a unit inside `dir`.
    pub fn for_unit(dir: &Path, name: &str) -> Self {
        Self {
            src: dir.join(format!("{name}.src")),
            lib: dir.join(format!("{name}.lib")),
            copy: dir.join(format!("{name}.copy")),
            lock: dir.join(format!("{name}.lock")),
        }
    }
}
