//! Use case layer: application workflows and orchestration.

pub mod avatar_cache;
pub mod bootstrap;
pub mod context;
pub mod conversation_view_model;
pub mod projector;

/// Returns the usecases module name for smoke checks.
pub fn module_name() -> &'static str {
    "usecases"
}
