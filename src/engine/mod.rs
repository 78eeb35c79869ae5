//! Engine integration layer: contracts towards the SIP engine, the core
//! thread, and the fixture-backed in-memory engine.

pub mod contracts;
pub mod core_thread;
pub mod fixture;
pub mod memory;

/// Returns the engine module name for smoke checks.
pub fn module_name() -> &'static str {
    "engine"
}
