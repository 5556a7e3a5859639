//! The interned path store and target table, plus the `Target` record itself.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::context::Context;
use crate::error::{ErrorKind, MakeError};
use crate::fs_probe;
use crate::ids::{InferenceRuleId, ScopeId, TargetId};
use crate::{Dependency, DependencyId};

/// One compiled command line, ready to hand to a runner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecCmd {
    pub cmd: String,
    pub display_cmd: bool,
    pub ignore_errors: bool,
}

/// Tri-state replacement for the original's single `dependencies_evaluated` boolean flag. The
/// original only distinguished "not yet evaluated" from "evaluated", so a target reached while
/// still being evaluated (a true dependency cycle) silently short-circuited. The `InProgress`
/// state lets the scheduler report `ErrorKind::DependencyCycle` instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepState {
    Unvisited,
    InProgress,
    Done,
}

/// A buildable artifact, keyed by its canonical path.
#[derive(Debug)]
pub struct Target {
    pub key: PathBuf,
    pub file_exists: bool,
    pub modified_time: u64,
    pub recipe: String,
    pub explicit_recipe_found: bool,
    pub inference_pseudo: bool,
    pub scope: Option<ScopeId>,
    pub inference_rule: Option<InferenceRuleId>,
    pub inference_parent: Option<TargetId>,
    pub parent_deps: Vec<DependencyId>,
    pub child_deps: Vec<DependencyId>,
    pub exec_cmds: Vec<ExecCmd>,
    pub dep_state: DepState,
    pub rebuild_required: bool,
    pub executed: bool,
    pub parents_to_build: u32,
    /// `false` once `deactivate_target` has run; a deactivated target may still be named by an
    /// `InferenceRule` as its carrier, so the arena slot is retained.
    pub active: bool,
}

impl Target {
    fn new(key: PathBuf, probe: fs_probe::ProbeResult) -> Self {
        Self {
            key,
            file_exists: probe.exists,
            modified_time: probe.modified_time,
            recipe: String::new(),
            explicit_recipe_found: false,
            inference_pseudo: false,
            scope: None,
            inference_rule: None,
            inference_parent: None,
            parent_deps: Vec::new(),
            child_deps: Vec::new(),
            exec_cmds: Vec::new(),
            dep_state: DepState::Unvisited,
            rebuild_required: false,
            executed: false,
            parents_to_build: 0,
            active: true,
        }
    }
}

/// Case-folding used for the target table key. The original folds case "on platforms where the
/// filesystem is" case-insensitive; we key that off `cfg!(windows)` rather than guessing at
/// runtime, since that's the only portable signal available without touching the filesystem.
fn table_key(path: &Path) -> String {
    let s = path.to_string_lossy();
    if cfg!(windows) {
        s.to_lowercase()
    } else {
        s.into_owned()
    }
}

impl crate::Engine {
    /// Resolve `raw_name` against `scope`'s directory, returning the
    /// existing target if interned, or allocating and probing a new one.
    pub fn lookup_or_create(
        &mut self,
        scope: ScopeId,
        raw_name: &str,
    ) -> Result<TargetId, MakeError> {
        let dir = self.scope(scope).directory.clone();
        let full_path = fs_probe::resolve_path(&dir, raw_name);
        if full_path.as_os_str().is_empty() {
            return Err(MakeError::new(
                ErrorKind::PathResolution,
                format!("could not resolve target name '{}'", raw_name),
                Context::new(),
            ));
        }

        let key = table_key(&full_path);
        if let Some(&id) = self.target_table.get(&key) {
            return Ok(id);
        }

        let probe = fs_probe::probe(&full_path);
        let probe = self.apply_forced_mtime(&full_path, probe);
        let mut target = Target::new(full_path, probe);
        target.scope = Some(scope);

        let id = TargetId(self.targets.len() as u32);
        self.targets.push(target);
        self.target_table.insert(key, id);
        self.target_order.push(id);

        Ok(id)
    }

    /// External interface: `declare_target(scope, name)`.
    pub fn declare_target(&mut self, scope: ScopeId, name: &str) -> Result<TargetId, MakeError> {
        self.lookup_or_create(scope, name)
    }

    /// External interface: `set_recipe(target, text)`. Sets `explicit_recipe_found = true`
    /// regardless of whether `text` is empty, and appends to any previously set recipe text
    /// (a target may accumulate recipe lines across several parser calls).
    pub fn set_recipe(&mut self, target: TargetId, text: &str) {
        let t = self.target_mut(target);
        t.explicit_recipe_found = true;
        if !text.is_empty() {
            if !t.recipe.is_empty() {
                t.recipe.push('\n');
            }
            t.recipe.push_str(text);
        }
    }

    pub fn target(&self, id: TargetId) -> &Target {
        &self.targets[id.index()]
    }

    pub fn target_mut(&mut self, id: TargetId) -> &mut Target {
        &mut self.targets[id.index()]
    }

    /// Default-target selection: the first target in insertion order that is not an inference
    /// pseudo-target.
    pub fn default_target(&self) -> Option<TargetId> {
        self.target_order
            .iter()
            .copied()
            .find(|&id| !self.target(id).inference_pseudo)
    }

    /// Remove a target from the table and insertion list. It is NOT freed here;
    /// an `InferenceRule` may still name it as a carrier (the arena slot is retained, matching
    /// the "arena-allocated nodes keyed by small integer indices" alternative in the design
    /// notes).
    pub fn deactivate_target(&mut self, id: TargetId) {
        debug_assert!(self.target(id).parent_deps.is_empty());
        debug_assert!(self.target(id).child_deps.is_empty());

        let key = table_key(&self.target(id).key.clone());
        self.target_table.remove(&key);
        self.target_order.retain(|&t| t != id);
        self.target_mut(id).active = false;
    }

    /// Teardown: deactivate every target, after first removing all dependency edges so the
    /// debug assertions in `deactivate_target` hold.
    pub fn delete_all_targets(&mut self) {
        let ids: Vec<TargetId> = self.target_order.clone();
        for id in ids {
            let parent_edges: Vec<DependencyId> = self.target(id).parent_deps.clone();
            let child_edges: Vec<DependencyId> = self.target(id).child_deps.clone();
            for dep_id in parent_edges.into_iter().chain(child_edges) {
                self.delete_dependency(dep_id);
            }
        }
        let ids: Vec<TargetId> = self.target_order.clone();
        for id in ids {
            self.deactivate_target(id);
        }
    }
}

// Re-exported so `dependency.rs` can remove an edge's id from the owning endpoints without a
// circular module dependency.
impl crate::Engine {
    pub(crate) fn remove_edge_from_target(&mut self, target: TargetId, dep: DependencyId) {
        let t = self.target_mut(target);
        t.parent_deps.retain(|&d| d != dep);
        t.child_deps.retain(|&d| d != dep);
    }
}

#[allow(unused)]
fn _assert_dependency_shape(_d: &Dependency) {}

#[cfg(test)]
mod tests {
    use crate::Engine;
    use std::path::PathBuf;

    #[test]
    fn test_lookup_or_create_interns_once() {
        let mut engine = Engine::new(PathBuf::from("/project"));
        let root = engine.root_scope();
        let a = engine.lookup_or_create(root, "a.obj").unwrap();
        let b = engine.lookup_or_create(root, "a.obj").unwrap();
        assert_eq!(a, b);
        assert_eq!(engine.target(a).key, PathBuf::from("/project/a.obj"));
    }

    #[test]
    fn test_lookup_or_create_absolute_and_relative_match() {
        let mut engine = Engine::new(PathBuf::from("/project"));
        let root = engine.root_scope();
        let a = engine.lookup_or_create(root, "a.obj").unwrap();
        let b = engine.lookup_or_create(root, "/project/a.obj").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_default_target_skips_inference_pseudo() {
        let mut engine = Engine::new(PathBuf::from("/project"));
        let root = engine.root_scope();
        let carrier = engine.declare_target(root, ".c.obj").unwrap();
        engine.target_mut(carrier).inference_pseudo = true;
        let real = engine.declare_target(root, "a.obj").unwrap();
        assert_eq!(engine.default_target(), Some(real));
    }

    #[test]
    fn test_set_recipe_marks_explicit_even_when_empty() {
        let mut engine = Engine::new(PathBuf::from("/project"));
        let root = engine.root_scope();
        let t = engine.declare_target(root, "all").unwrap();
        engine.set_recipe(t, "");
        assert!(engine.target(t).explicit_recipe_found);
        assert_eq!(engine.target(t).recipe, "");
    }
}
