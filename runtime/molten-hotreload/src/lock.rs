// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Producer-side lockfile handling.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Exclusive ownership of a unit's lockfile.
///
/// The lockfile exists exactly while a shared object is mid-build: the
/// consumer treats its presence as "stale data, do not load". Acquisition
/// fails if the file already exists. The guard removes the file on
/// [`release`](LockGuard::release), and on drop if the caller bailed out
/// early (compiler failure, panic), so a failed build never wedges a unit.
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
    released: bool,
}

impl LockGuard {
    /// Create the lockfile exclusively. Fails with `AlreadyExists` if a
    /// build is already in flight for this unit.
    pub fn acquire(path: &Path) -> io::Result<Self> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            released: false,
        })
    }

    /// Remove the lockfile, publishing whatever is at the unit's `lib`
    /// path to the consumer.
    pub fn release(mut self) -> io::Result<()> {
        self.released = true;
        fs::remove_file(&self.path)
    }

    /// The lockfile path this guard owns.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if !self.released {
            let _ = fs::remove_file(&self.path);
        }
    }
}
