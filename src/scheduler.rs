//! The scheduler: walks the dependency graph depth-first, deciding which targets are stale and
//! queuing them for the runner.
//!
//! A single boolean "evaluated" flag can't distinguish "still being evaluated" (a real cycle)
//! from "not yet evaluated", so staleness tracking uses `DepState`'s three states instead: a
//! target reached while still `InProgress` reports `ErrorKind::DependencyCycle` instead of
//! silently short-circuiting.

use crate::context::Context;
use crate::error::{ErrorKind, MakeError};
use crate::ids::TargetId;
use crate::target::DepState;

impl crate::Engine {
    /// `determine_dependencies`: pick the first non-pseudo target in insertion order and walk it.
    pub fn determine_dependencies(&mut self) -> Result<(), MakeError> {
        let target = self.default_target().ok_or_else(|| {
            MakeError::new(
                ErrorKind::NoDefaultTarget,
                "no target to make",
                Context::new(),
            )
        })?;
        self.determine_dependencies_for_target(target)
    }

    /// `determine_dependencies_for_target`, recursive depth-first staleness evaluation.
    pub fn determine_dependencies_for_target(&mut self, t: TargetId) -> Result<(), MakeError> {
        self.determine_dependencies_for_target_impl(t, false)
    }

    /// As `determine_dependencies_for_target`, but every buildable target along the walk is
    /// unconditionally marked for rebuild regardless of staleness. Backs the CLI's `-B`/
    /// `--always-make`, which has no counterpart in the normal staleness walk.
    pub fn force_dependencies_for_target(&mut self, t: TargetId) -> Result<(), MakeError> {
        self.determine_dependencies_for_target_impl(t, true)
    }

    fn determine_dependencies_for_target_impl(&mut self, t: TargetId, force: bool) -> Result<(), MakeError> {
        match self.target(t).dep_state {
            DepState::Done => return Ok(()),
            DepState::InProgress => {
                return Err(MakeError::new(
                    ErrorKind::DependencyCycle,
                    format!("dependency cycle detected at {}", self.target(t).key.display()),
                    Context::new(),
                ));
            }
            DepState::Unvisited => {}
        }
        self.target_mut(t).dep_state = DepState::InProgress;

        // A target requested directly (a CLI target, or one named in a test) may never have
        // passed through the parser's `mark_target_inference_rule_needed_if_needed` /
        // `find_rules_for_scope` path, so its inference rule (if any) may still be unresolved.
        // Resolve it now, before deciding whether to synthesize the inference-source edge below.
        if self.would_target_benefit_from_inference_rule(t) {
            let scope = self.target(t).scope.unwrap_or_else(|| self.root_scope());
            self.find_inference_rule_for_target(scope, t)?;
        }

        // Synthesize the inference-source -> target edge for a target that has no prerequisites
        // of its own, no explicit recipe, but does have an inference source. Done at entry (not
        // just for parents reached inside the loop below) so a target the walk is entered on
        // directly -- not just one reached as someone else's prerequisite -- still gets its
        // inference source linked in before we look at its prerequisites.
        if self.target(t).parent_deps.is_empty()
            && !self.target(t).explicit_recipe_found
            && self.target(t).inference_parent.is_some()
        {
            let source = self.target(t).inference_parent.expect("checked is_some above");
            self.create_parent_child_dependency(source, t);
        }

        let mut needs_rebuild = force;
        let parent_deps = self.target(t).parent_deps.clone();
        for dep_id in parent_deps {
            let p = self.dependency(dep_id).parent;

            self.determine_dependencies_for_target_impl(p, force)?;

            if self.target(p).rebuild_required {
                self.target_mut(t).parents_to_build += 1;
                needs_rebuild = true;
            }
            if self.target(p).file_exists
                && self.target(t).file_exists
                && self.target(p).modified_time > self.target(t).modified_time
            {
                needs_rebuild = true;
            }
        }

        self.target_mut(t).dep_state = DepState::Done;
        if !self.target(t).file_exists {
            needs_rebuild = true;
        }
        if needs_rebuild && !self.target(t).rebuild_required {
            self.mark_for_rebuild(t)?;
        }

        Ok(())
    }

    /// `mark_for_rebuild`: compile the recipe and place `t` on the ready or waiting queue.
    pub fn mark_for_rebuild(&mut self, t: TargetId) -> Result<(), MakeError> {
        let buildable = self.target(t).explicit_recipe_found || self.target(t).inference_rule.is_some();
        if !buildable {
            return Err(MakeError::new(
                ErrorKind::NoBuildableRecipe,
                format!("don't know how to make {}", self.target(t).key.display()),
                Context::new(),
            ));
        }

        self.generate_exec_script(t)?;
        self.target_mut(t).rebuild_required = true;

        if self.target(t).parents_to_build == 0 {
            self.targets_ready.push_back(t);
        } else {
            self.targets_waiting.push_back(t);
        }

        Ok(())
    }

    /// Execution-side contract: the runner calls this once `t`'s commands have run,
    /// marking it executed and promoting any child whose last pending prerequisite just finished.
    pub fn complete_target(&mut self, t: TargetId) {
        self.target_mut(t).executed = true;

        let children = self.target(t).child_deps.clone();
        for dep_id in children {
            let c = self.dependency(dep_id).child;
            if !self.target(c).rebuild_required {
                continue;
            }
            self.target_mut(c).parents_to_build -= 1;
            if self.target(c).parents_to_build == 0 {
                if let Some(pos) = self.targets_waiting.iter().position(|&x| x == c) {
                    self.targets_waiting.remove(pos);
                    self.targets_ready.push_back(c);
                }
            }
        }
    }
}
