// SPDX-License-Identifier: PMPL-1.0-or-later

//! The driver's environment surface.
//!
//! Three variables steer a run: `CXX` picks the native toolchain,
//! `MOLTEN_LOG` feeds the tracing filter (read directly by the
//! subscriber in `main`), and `MOLTEN_BUILD_HOLD_MS` keeps the lockfile
//! held after a successful shared-object build, for exercising the
//! lockfile race.

use std::time::Duration;

/// The C++ compiler to invoke: `$CXX`, or `c++` when unset or blank.
pub fn cxx() -> String {
    match std::env::var("CXX") {
        Ok(value) if !value.trim().is_empty() => value,
        _ => "c++".to_string(),
    }
}

/// How long `build_shared_object` holds the lockfile after publishing a
/// fresh object (`MOLTEN_BUILD_HOLD_MS`). Unset, blank, or unparsable
/// values mean no hold.
pub fn build_hold() -> Duration {
    let millis = std::env::var("MOLTEN_BUILD_HOLD_MS")
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .unwrap_or(0);
    Duration::from_millis(millis)
}
