//! Dependency edges: each one links a prerequisite to the target that depends on it.

use crate::ids::{DependencyId, TargetId};

/// A directed edge: `parent` is a prerequisite of `child`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dependency {
    pub parent: TargetId,
    pub child: TargetId,
}

impl crate::Engine {
    /// `create_parent_child_dependency`: link `parent` as a prerequisite of `child`, recording
    /// the edge on both endpoints so either side can enumerate it in O(its own degree).
    pub fn create_parent_child_dependency(&mut self, parent: TargetId, child: TargetId) -> DependencyId {
        let id = DependencyId(self.dependencies.len() as u32);
        self.dependencies.push(Dependency { parent, child });

        self.target_mut(parent).child_deps.push(id);
        self.target_mut(child).parent_deps.push(id);

        id
    }

    /// External interface: `add_prerequisite(parent, child)`.
    pub fn add_prerequisite(&mut self, parent: TargetId, child: TargetId) -> DependencyId {
        self.create_parent_child_dependency(parent, child)
    }

    pub fn dependency(&self, id: DependencyId) -> Dependency {
        self.dependencies[id.index()]
    }

    /// Tear down a single edge, unlinking it from both endpoints.
    pub fn delete_dependency(&mut self, id: DependencyId) {
        let dep = self.dependency(id);
        self.remove_edge_from_target(dep.parent, id);
        self.remove_edge_from_target(dep.child, id);
    }

    /// Prerequisites of `target`, i.e. the targets that must be up to date first.
    pub fn prerequisites_of(&self, target: TargetId) -> impl Iterator<Item = TargetId> + '_ {
        self.target(target)
            .parent_deps
            .iter()
            .map(move |&dep_id| self.dependency(dep_id).parent)
    }

    /// Dependents of `target`, i.e. the targets that name it as a prerequisite.
    pub fn dependents_of(&self, target: TargetId) -> impl Iterator<Item = TargetId> + '_ {
        self.target(target)
            .child_deps
            .iter()
            .map(move |&dep_id| self.dependency(dep_id).child)
    }
}
