//! Modification-time comparisons for build caching.
//!
//! All comparisons return `mtime(a) - mtime(b)` in whole seconds: positive
//! when `a` is newer. Anything that prevents a comparison (a missing file,
//! unreadable metadata, a platform without mtimes) yields `0`, the same as
//! equal times, so callers fall back to rebuilding.

use std::fs::Metadata;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Compare two paths.
pub fn compare_paths(a: impl AsRef<Path>, b: impl AsRef<Path>) -> i64 {
    compare_metadata(std::fs::metadata(a).ok(), std::fs::metadata(b).ok())
}

/// Returns `true` only if `artifact` is strictly newer than `source`.
pub fn is_fresh(source: impl AsRef<Path>, artifact: impl AsRef<Path>) -> bool {
    compare_paths(artifact, source) > 0
}

fn compare_metadata(a: Option<Metadata>, b: Option<Metadata>) -> i64 {
    match (a.as_ref().and_then(mtime_secs), b.as_ref().and_then(mtime_secs)) {
        (Some(a), Some(b)) => a.saturating_sub(b),
        _ => 0,
    }
}

/// Seconds since the Unix epoch, negative before it.
fn mtime_secs(meta: &Metadata) -> Option<i64> {
    let modified = meta.modified().ok()?;
    match modified.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_secs()).ok(),
        Err(before) => i64::try_from(before.duration().as_secs()).ok().map(|s| -s),
    }
}
