//! Domain layer: addresses, identities, history entries and the published
//! conversation snapshot.

pub mod address;
pub mod avatar;
pub mod composing;
pub mod contact;
pub mod conversation_state;
pub mod event_log;

/// Returns the domain module name for smoke checks.
pub fn module_name() -> &'static str {
    "domain"
}
