//! Authentication gate and role-based permissions.
//!
//! # Responsibility
//! - Verify credential pairs through a pluggable directory.
//! - Keep the active session in its own slot.
//! - Decide which actions each role may take on each resource.
//!
//! # Invariants
//! - A failed login never writes a session.
//! - Permission checks are pure functions of `(role, action, resource)`.

pub mod directory;
pub mod gate;
pub mod permission;
pub mod session;
