//! # rmake
//!
//! The build-graph engine at the heart of a small, make-compatible build tool: target interning,
//! dependency edges, scoped inference-rule resolution, automatic variable expansion, recipe
//! compilation, and staleness-driven scheduling.
//!
//! Parsing a makefile and running compiled commands are deliberately outside this crate's core;
//! see [`parser`] and [`runner`] for the minimal ambient collaborators that exercise it.

mod auto_vars;
mod context;
mod dependency;
mod engine;
mod error;
mod fs_probe;
mod ids;
mod inference;
pub mod parser;
mod recipe;
pub mod runner;
mod scheduler;
mod scope;
mod target;

pub use context::Context;
pub use dependency::Dependency;
pub use engine::Engine;
pub use error::{log_error, log_info, log_warn, ErrorKind, MakeError};
pub use ids::{DependencyId, InferenceRuleId, ScopeId, TargetId};
pub use scope::{InferenceRule, Scope};
pub use target::{DepState, ExecCmd, Target};
