//! Shared value types for the bodyspace simulation server.
//!
//! # Invariants
//! - Object ids are client-assigned and never reused for a different body.
//! - `Pose::default()` is the world origin with identity rotation.

pub mod types;

pub use types::{BodyState, ObjectId, Pose, Velocities};
