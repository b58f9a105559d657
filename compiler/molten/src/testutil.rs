// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Shared helpers for driver unit tests.

use std::fs;
use std::path::{Path, PathBuf};

/// A stand-in compiler: a shell script that copies its input to its `-o`
/// target (or runs an arbitrary body), so the lockfile protocol and the
/// reconciler can be tested without a real toolchain.
pub(crate) fn stub_compiler(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("stubcc");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write stub");
    let mut perms = fs::metadata(&path).expect("stat stub").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod stub");
    path
}

/// Stub body that copies the source argument to the value following `-o`.
pub(crate) const STUB_COPY: &str = r#"
out=""
src=""
prev=""
for arg in "$@"; do
  if [ "$prev" = "-o" ]; then out="$arg"; fi
  case "$arg" in
    -*) ;;
    *) if [ "$prev" != "-o" ]; then src="$arg"; fi ;;
  esac
  prev="$arg"
done
cp "$src" "$out"
"#;

/// A fresh per-test temp directory.
pub(crate) fn test_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("molten_test_{}_{}", tag, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create test dir");
    dir
}
