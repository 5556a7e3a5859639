//! Small-integer-index handles into the engine's arenas.
//!
//! The original source models `Target`/`Dependency`/`InferenceRule` as intrusively linked,
//! reference-counted nodes carved out of slab allocators. Rust models the same shared, cyclic
//! graph (a `Target` can be named by an `InferenceRule` as its carrier even after the `Target`
//! is deactivated) more naturally as arenas of owned values addressed by these newtype indices,
//! which is the alternative the design notes explicitly sanction.

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub(crate) u32);

        impl $name {
            pub(crate) fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_id!(TargetId);
define_id!(DependencyId);
define_id!(InferenceRuleId);
define_id!(ScopeId);
