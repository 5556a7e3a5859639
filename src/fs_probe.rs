//! The two filesystem operations the core needs: canonical-path resolution relative to a working
//! directory, and a combined existence + last-write-time query. A forced "old" or "new" file
//! (see `Engine::force_old`/`force_new`) overrides the real timestamp at lookup time rather than
//! mutating a target's record directly.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Result of probing a path: whether the filesystem object exists, and if so, its last-write
/// time expressed as seconds since the epoch (monotonic enough for staleness comparisons).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProbeResult {
    pub exists: bool,
    pub modified_time: u64,
}

/// Resolve `name` against `dir`, producing a canonical-ish absolute path.
///
/// Access-denied and not-found are not distinguished here; both are simply treated as absent,
/// by not canonicalizing through the filesystem at all. We join-and-lexically-normalize rather
/// than calling
/// `fs::canonicalize`, because the latter fails outright for paths that don't yet exist (a very
/// common case for build targets that haven't been produced yet).
pub fn resolve_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = Path::new(name);
    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        dir.join(candidate)
    };
    lexical_normalize(&joined)
}

/// Collapse `.`/`..` components without touching the filesystem.
fn lexical_normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Probe a path's existence and mtime. Never errors: a failed probe (permission denied, missing
/// file) is simply reported as `exists: false`.
pub fn probe(path: &Path) -> ProbeResult {
    match std::fs::metadata(path) {
        Ok(metadata) => match metadata.modified() {
            Ok(modified) => ProbeResult {
                exists: true,
                modified_time: to_epoch_seconds(modified),
            },
            Err(_) => ProbeResult {
                exists: true,
                modified_time: 0,
            },
        },
        Err(_) => ProbeResult::default(),
    }
}

pub(crate) fn to_epoch_seconds(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
