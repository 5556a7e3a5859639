//! The `Engine` arena: owns every `Target`, `Dependency`, `Scope`, and `InferenceRule`, indexed
//! by the small-integer ids in `ids.rs`. This replaces the original's intrusive doubly-linked
//! lists with the arena-plus-index scheme the design notes sanction.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;

use crate::dependency::Dependency;
use crate::fs_probe::{self, ProbeResult};
use crate::ids::{ScopeId, TargetId};
use crate::scope::{InferenceRule, Scope};
use crate::target::Target;

/// Owns the whole build graph for one run. A fresh `Engine` always starts with a single root
/// scope rooted at the given working directory.
#[derive(Debug)]
pub struct Engine {
    pub(crate) targets: Vec<Target>,
    pub(crate) target_table: HashMap<String, TargetId>,
    pub(crate) target_order: Vec<TargetId>,

    pub(crate) dependencies: Vec<Dependency>,

    pub(crate) scopes: Vec<Scope>,
    pub(crate) inference_rules: Vec<InferenceRule>,

    root_scope: ScopeId,

    /// Paths forced to read as pre-existing and arbitrarily old, per `-o/--old-file`.
    forced_old: HashSet<PathBuf>,
    /// Paths forced to read as just-touched, per `-n/--new-file`.
    forced_new: HashSet<PathBuf>,

    /// Scheduling queues. A `TargetId` appears in at most one of these at a time.
    pub targets_ready: VecDeque<TargetId>,
    pub targets_waiting: VecDeque<TargetId>,
}

impl Engine {
    /// Construct a new engine rooted at `working_dir`, with its root scope already open.
    pub fn new(working_dir: PathBuf) -> Self {
        let mut engine = Self {
            targets: Vec::new(),
            target_table: HashMap::new(),
            target_order: Vec::new(),
            dependencies: Vec::new(),
            scopes: Vec::new(),
            inference_rules: Vec::new(),
            root_scope: ScopeId(0),
            forced_old: HashSet::new(),
            forced_new: HashSet::new(),
            targets_ready: VecDeque::new(),
            targets_waiting: VecDeque::new(),
        };
        engine.root_scope = engine.open_scope(working_dir, None);
        engine
    }

    pub fn root_scope(&self) -> ScopeId {
        self.root_scope
    }

    /// `-o/--old-file`: pin `path` to read as existing with `modified_time = 0`, so it never
    /// looks newer than anything that depends on it. Must be called before the target is first
    /// interned; re-pinning an already-interned target is a caller error we simply ignore,
    /// matching `rule_map.rs`'s `get_mtime`, which only consults the override at lookup time.
    pub fn force_old(&mut self, path: PathBuf) {
        self.forced_new.remove(&path);
        self.forced_old.insert(path);
    }

    /// `-n/--new-file`: pin `path` to read as existing with the current time, so it always looks
    /// newer than anything that depends on it.
    pub fn force_new(&mut self, path: PathBuf) {
        self.forced_old.remove(&path);
        self.forced_new.insert(path);
    }

    /// As `force_old`, but resolves `name` against `scope`'s directory first; for use by callers
    /// (e.g. the CLI's `-o FILE`) that only have a raw, possibly-relative name.
    pub fn force_old_named(&mut self, scope: ScopeId, name: &str) {
        let dir = self.scope(scope).directory.clone();
        self.force_old(fs_probe::resolve_path(&dir, name));
    }

    /// As `force_new`, but resolves `name` against `scope`'s directory first.
    pub fn force_new_named(&mut self, scope: ScopeId, name: &str) {
        let dir = self.scope(scope).directory.clone();
        self.force_new(fs_probe::resolve_path(&dir, name));
    }

    /// Apply any `force_old`/`force_new` override recorded for `path` on top of a real probe.
    pub(crate) fn apply_forced_mtime(&self, path: &std::path::Path, probe: ProbeResult) -> ProbeResult {
        if self.forced_old.contains(path) {
            ProbeResult {
                exists: true,
                modified_time: 0,
            }
        } else if self.forced_new.contains(path) {
            ProbeResult {
                exists: true,
                modified_time: fs_probe::to_epoch_seconds(std::time::SystemTime::now()),
            }
        } else {
            probe
        }
    }
}
