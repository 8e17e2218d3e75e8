//! World registry and physics-engine adapter.
//!
//! The [`WorldStore`] owns every live body: the rapier sets holding the
//! actual rigid bodies plus a registry mapping client-assigned ids to
//! handles and per-object overrides. All access is serialized by the
//! simulation loop that owns the store; nothing here takes locks.
//!
//! # Invariants
//! - Ids are unique; a create against an existing id fails without
//!   mutating anything.
//! - Engine handles never escape the store.
//! - The per-tick pass never fails the loop: a body with a broken state is
//!   recovered in place and logged, not reported.

pub mod engine;
pub mod guard;
pub mod shape;
pub mod store;

pub use engine::EngineWorld;
pub use shape::{Material, MaterialParams, ShapeDesc, ShapeSpec};
pub use store::{BodyAccess, CreateParams, KinematicUpdate, StepReport, WorldStore};

use bodyspace_common::ObjectId;

/// Hard ceiling on angular speed, applied every tick regardless of tuning.
pub const MAX_ANGULAR_SPEED: f32 = 40.0;

/// Largest elapsed time a single tick is allowed to integrate.
pub const MAX_FRAME_DT: f32 = 1.0 / 30.0;

/// Smallest elapsed time fed to the engine, to avoid zero-step calls.
pub const MIN_FRAME_DT: f32 = 0.001;

/// Upper bound on inner sub-steps per tick.
pub const MAX_SUBSTEPS: u32 = 10;

/// Errors from world-store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("object `{0}` not found")]
    NotFound(ObjectId),
    #[error("object `{0}` already exists")]
    AlreadyExists(ObjectId),
    #[error("invalid shape: {0}")]
    InvalidShape(String),
    #[error("object `{0}` is static")]
    StaticBody(ObjectId),
    #[error("object `{0}` is not a sphere")]
    ShapeMismatch(ObjectId),
}
