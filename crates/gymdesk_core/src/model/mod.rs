//! Schema-less document model shared by every collection.
//!
//! # Invariants
//! - `id`, `createdAt` and `updatedAt` are owned by the store; callers can
//!   never set them through field maps.
//! - Two documents in one collection may carry entirely different fields.

pub mod document;
pub mod collections;
