//! The scope tree and per-scope inference-rule lists, plus the inference-rule registry
//! operations.

use std::collections::VecDeque;
use std::path::PathBuf;

use crate::ids::{InferenceRuleId, ScopeId, TargetId};

/// A lexical region (typically a directory) carrying its own inference rules, nested within a
/// parent scope.
#[derive(Debug)]
pub struct Scope {
    pub directory: PathBuf,
    pub parent: Option<ScopeId>,
    /// Most-recently-defined rule first; searched front-to-back so newer rules shadow older ones
    /// within this scope.
    pub inference_rules: Vec<InferenceRuleId>,
    /// Targets whose inference rule has not yet been resolved, drained on scope close.
    pub pending: VecDeque<TargetId>,
    pub closed: bool,
}

/// `(source_ext -> target_ext)` with an associated recipe on a carrier pseudo-target.
#[derive(Debug)]
pub struct InferenceRule {
    pub source_ext: String,
    pub target_ext: String,
    pub carrier_target: TargetId,
    pub scope: ScopeId,
    pub ref_count: u32,
}

impl crate::Engine {
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    /// External interface: `open_scope(dir)`.
    pub fn open_scope(&mut self, directory: PathBuf, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            directory,
            parent,
            inference_rules: Vec::new(),
            pending: VecDeque::new(),
            closed: false,
        });
        id
    }

    /// External interface: `close_scope(scope)`. Drains the scope's pending-inference-rule list
    /// via `find_rules_for_scope` (defined in `inference.rs`).
    pub fn close_scope(&mut self, scope: ScopeId) -> Result<(), crate::error::MakeError> {
        self.find_rules_for_scope(scope)?;
        self.scope_mut(scope).closed = true;
        Ok(())
    }

    pub fn inference_rule(&self, id: InferenceRuleId) -> &InferenceRule {
        &self.inference_rules[id.index()]
    }

    pub fn inference_rule_mut(&mut self, id: InferenceRuleId) -> &mut InferenceRule {
        &mut self.inference_rules[id.index()]
    }

    /// `create_rule` / external interface `declare_inference_rule`: prepend the new rule so
    /// later definitions shadow earlier ones within the same scope.
    pub fn create_rule(
        &mut self,
        scope: ScopeId,
        source_ext: &str,
        target_ext: &str,
        carrier_target: TargetId,
    ) -> InferenceRuleId {
        self.target_mut(carrier_target).inference_pseudo = true;

        let id = InferenceRuleId(self.inference_rules.len() as u32);
        self.inference_rules.push(InferenceRule {
            source_ext: source_ext.to_string(),
            target_ext: target_ext.to_string(),
            carrier_target,
            scope,
            ref_count: 1,
        });

        // Prepend: newest-first within the scope.
        self.scope_mut(scope).inference_rules.insert(0, id);
        id
    }

    pub fn declare_inference_rule(
        &mut self,
        scope: ScopeId,
        source_ext: &str,
        target_ext: &str,
        carrier_target: TargetId,
    ) -> InferenceRuleId {
        self.create_rule(scope, source_ext, target_ext, carrier_target)
    }

    pub fn reference_inference_rule(&mut self, id: InferenceRuleId) {
        self.inference_rule_mut(id).ref_count += 1;
    }

    /// `next_rule`: walk `top_scope` first, then each ancestor scope, preserving intra-scope
    /// order. Enumeration resumes from the scope and position of `prev`.
    pub fn next_rule(
        &self,
        top_scope: ScopeId,
        prev: Option<InferenceRuleId>,
    ) -> Option<InferenceRuleId> {
        let (mut current_scope, mut position) = match prev {
            None => (top_scope, 0usize),
            Some(prev_id) => {
                let prev_scope = self.inference_rule(prev_id).scope;
                let idx = self
                    .scope(prev_scope)
                    .inference_rules
                    .iter()
                    .position(|&r| r == prev_id)
                    .expect("previously yielded rule must still be in its scope's list");
                (prev_scope, idx + 1)
            }
        };

        loop {
            let scope = self.scope(current_scope);
            if let Some(&id) = scope.inference_rules.get(position) {
                return Some(id);
            }
            match scope.parent {
                Some(parent) => {
                    current_scope = parent;
                    position = 0;
                }
                None => return None,
            }
        }
    }

    /// `next_rule_for_target_ext`: same walk, filtered by case-insensitive equality on the
    /// target extension.
    pub fn next_rule_for_target_ext(
        &self,
        top_scope: ScopeId,
        target_ext: &str,
        prev: Option<InferenceRuleId>,
    ) -> Option<InferenceRuleId> {
        let mut cursor = self.next_rule(top_scope, prev);
        while let Some(id) = cursor {
            if self
                .inference_rule(id)
                .target_ext
                .eq_ignore_ascii_case(target_ext)
            {
                return Some(id);
            }
            cursor = self.next_rule(top_scope, Some(id));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::Engine;
    use std::path::PathBuf;

    #[test]
    fn test_scope_override_newest_wins_within_scope() {
        let mut engine = Engine::new(PathBuf::from("/p"));
        let root = engine.root_scope();
        let carrier_old = engine.declare_target(root, ".c.obj").unwrap();
        engine.create_rule(root, ".c", ".obj", carrier_old);
        let carrier_new = engine.declare_target(root, ".c.obj.2").unwrap();
        let newest = engine.create_rule(root, ".c", ".obj", carrier_new);

        let found = engine.next_rule_for_target_ext(root, ".obj", None).unwrap();
        assert_eq!(found, newest);
    }

    #[test]
    fn test_child_scope_searched_before_parent() {
        let mut engine = Engine::new(PathBuf::from("/p"));
        let root = engine.root_scope();
        let parent_carrier = engine.declare_target(root, ".c.obj.parent").unwrap();
        engine.create_rule(root, ".c", ".obj", parent_carrier);

        let child = engine.open_scope(PathBuf::from("/p/child"), Some(root));
        let child_carrier = engine.declare_target(child, ".c.obj.child").unwrap();
        let child_rule = engine.create_rule(child, ".c", ".obj", child_carrier);

        let found = engine.next_rule_for_target_ext(child, ".obj", None).unwrap();
        assert_eq!(found, child_rule);
    }
}
