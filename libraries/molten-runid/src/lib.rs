// SPDX-License-Identifier: PMPL-1.0-or-later

//! Run identifiers for per-run artifact directories.
//!
//! Each driver run names its artifact directory `molten-<run id>`. A
//! fresh id per run is also what keeps a crashed run's stale lockfiles
//! from ever being observed: a new run never looks inside an old
//! directory. Ids only need to be unique across runs on one machine, so
//! 64 bits of OS entropy (with a clock/pid mix as fallback) is plenty.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A random run identifier, rendered as 16 hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(u64);

impl RunId {
    /// Draw a fresh identifier.
    pub fn fresh() -> Self {
        Self(os_entropy().unwrap_or_else(fallback_entropy))
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(unix)]
fn os_entropy() -> Option<u64> {
    use std::io::Read;

    let mut bytes = [0u8; 8];
    let mut urandom = std::fs::File::open("/dev/urandom").ok()?;
    urandom.read_exact(&mut bytes).ok()?;
    Some(u64::from_le_bytes(bytes))
}

#[cfg(not(unix))]
fn os_entropy() -> Option<u64> {
    None
}

/// Clock, pid, and a process-local sequence number, stirred through a
/// splitmix-style finalizer so adjacent seeds land far apart.
fn fallback_entropy() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    let seed = nanos
        ^ (u64::from(std::process::id()) << 32)
        ^ SEQUENCE.fetch_add(1, Ordering::Relaxed);

    let mut mixed = seed;
    mixed = (mixed ^ (mixed >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    mixed = (mixed ^ (mixed >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    mixed ^ (mixed >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_sixteen_hex_digits() {
        let text = RunId::fresh().to_string();
        assert_eq!(text.len(), 16);
        assert!(text.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fresh_ids_differ() {
        assert_ne!(RunId::fresh(), RunId::fresh());
    }

    #[test]
    fn test_fallback_entropy_varies() {
        assert_ne!(fallback_entropy(), fallback_entropy());
    }
}
