//! The inference resolver: matches a target with no explicit recipe against the scope tree's
//! inference rules, directly or through one intermediate extension.

use crate::fs_probe;
use crate::ids::{InferenceRuleId, ScopeId, TargetId};

/// Split a canonical path into `(stem_with_trailing_dot, extension_without_dot)` by scanning
/// right to left for the first `.` that appears before any path separator. Returns `None` when
/// there is no extension to match against (no dot, or a separator reached first) -- in both
/// cases the resolver is a documented no-op.
fn split_target_ext(key: &std::path::Path) -> Option<(String, String)> {
    let s = key.to_string_lossy();
    let mut dot_index = None;
    for (idx, ch) in s.char_indices().rev() {
        if ch == '.' {
            dot_index = Some(idx);
            break;
        }
        if std::path::is_separator(ch) {
            return None;
        }
    }
    let dot_index = dot_index?;
    let ext = &s[dot_index + 1..];
    if ext.is_empty() {
        return None;
    }
    Some((s[..=dot_index].to_string(), ext.to_string()))
}

impl crate::Engine {
    /// `would_target_benefit_from_inference_rule`: true iff `target` has neither an explicit
    /// recipe nor an already-resolved inference rule.
    pub fn would_target_benefit_from_inference_rule(&self, target: TargetId) -> bool {
        let t = self.target(target);
        t.recipe.is_empty() && t.inference_rule.is_none()
    }

    /// `mark_target_inference_rule_needed_if_needed`: (re)queue `target` on `scope`'s pending
    /// list if it could still benefit from an inference rule. Idempotent: first removes any
    /// stale membership, so a target is never queued twice.
    pub fn mark_target_inference_rule_needed_if_needed(&mut self, scope: ScopeId, target: TargetId) {
        self.scope_mut(scope).pending.retain(|&t| t != target);
        if self.would_target_benefit_from_inference_rule(target) {
            self.scope_mut(scope).pending.push_back(target);
        }
    }

    /// `assign_rule`: bind `rule` to `target`, interning `source_path` as its inference parent.
    fn assign_rule(
        &mut self,
        scope: ScopeId,
        target: TargetId,
        rule: InferenceRuleId,
        source_path: &str,
    ) -> Result<(), crate::error::MakeError> {
        let parent = self.lookup_or_create(scope, source_path)?;
        self.reference_inference_rule(rule);
        let t = self.target_mut(target);
        t.inference_parent = Some(parent);
        t.inference_rule = Some(rule);
        if t.scope.is_none() {
            t.scope = Some(scope);
        }
        Ok(())
    }

    /// Precondition: `target.recipe` is empty and `target.inference_rule` is unset; calling
    /// this redundantly is a harmless no-op rather than an error.
    pub fn find_inference_rule_for_target(
        &mut self,
        scope: ScopeId,
        target: TargetId,
    ) -> Result<(), crate::error::MakeError> {
        if !self.target(target).recipe.is_empty() || self.target(target).inference_rule.is_some() {
            return Ok(());
        }

        let (stem, target_ext) = match split_target_ext(&self.target(target).key) {
            Some(pair) => pair,
            None => return Ok(()),
        };

        // First pass (depth 1): any rule producing `target_ext` whose source file exists.
        let mut found_any_rule = false;
        let mut cursor = self.next_rule_for_target_ext(scope, &target_ext, None);
        while let Some(rule_id) = cursor {
            found_any_rule = true;
            let candidate = format!("{}{}", stem, self.inference_rule(rule_id).source_ext);
            if fs_probe::probe(std::path::Path::new(&candidate)).exists {
                self.assign_rule(scope, target, rule_id, &candidate)?;
                return Ok(());
            }
            cursor = self.next_rule_for_target_ext(scope, &target_ext, Some(rule_id));
        }

        if !found_any_rule {
            return Ok(());
        }

        // Second pass (depth 2): chain through an intermediate extension.
        let mut outer_cursor = self.next_rule_for_target_ext(scope, &target_ext, None);
        while let Some(outer_id) = outer_cursor {
            let outer_source_ext = self.inference_rule(outer_id).source_ext.clone();
            let mut inner_cursor = self.next_rule_for_target_ext(scope, &outer_source_ext, None);
            while let Some(inner_id) = inner_cursor {
                let candidate = format!("{}{}", stem, self.inference_rule(inner_id).source_ext);
                if fs_probe::probe(std::path::Path::new(&candidate)).exists {
                    let outer_path = format!("{}{}", stem, outer_source_ext);
                    self.assign_rule(scope, target, outer_id, &outer_path)?;
                    let intermediate = self
                        .target(target)
                        .inference_parent
                        .expect("assign_rule always sets inference_parent");
                    self.assign_rule(scope, intermediate, inner_id, &candidate)?;
                    return Ok(());
                }
                inner_cursor = self.next_rule_for_target_ext(scope, &outer_source_ext, Some(inner_id));
            }
            if self.target(target).inference_rule.is_some() {
                break;
            }
            outer_cursor = self.next_rule_for_target_ext(scope, &target_ext, Some(outer_id));
        }

        Ok(())
    }

    /// `find_rules_for_scope`, run on scope close. Idempotent: a target that no longer benefits
    /// (e.g. a later rule in the same scope supplied an explicit recipe) is skipped.
    pub fn find_rules_for_scope(&mut self, scope: ScopeId) -> Result<(), crate::error::MakeError> {
        loop {
            let target = match self.scope_mut(scope).pending.pop_front() {
                Some(t) => t,
                None => break,
            };
            if !self.would_target_benefit_from_inference_rule(target) {
                continue;
            }
            self.find_inference_rule_for_target(scope, target)?;
        }
        Ok(())
    }
}
