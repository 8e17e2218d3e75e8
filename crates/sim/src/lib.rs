//! The background simulation loop.
//!
//! The loop is a single-writer actor: it exclusively owns the
//! [`WorldStore`](bodyspace_world::WorldStore) and serializes every access
//! through an mpsc channel.
//! Request handlers and the config-sync task talk to it via cloned
//! [`SimHandle`]s; nothing shares the world's memory.
//!
//! # Invariants
//! - The shutdown flag is observed at the top of every iteration; the
//!   owner joins the thread before the world's resources are considered
//!   released.
//! - A single object's bad state never terminates the loop.

mod handle;
mod r#loop;

pub use bodyspace_world::CreateParams;
pub use handle::SimHandle;
pub use r#loop::SimLoop;

use std::sync::mpsc::Sender;

use bodyspace_common::{BodyState, ObjectId};
use bodyspace_world::{KinematicUpdate, StepReport, WorldError};
use nalgebra::Vector3;

/// Where the loop currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LoopPhase {
    Idle = 0,
    Running = 1,
    Stopping = 2,
    Stopped = 3,
}

impl LoopPhase {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => LoopPhase::Idle,
            1 => LoopPhase::Running,
            2 => LoopPhase::Stopping,
            _ => LoopPhase::Stopped,
        }
    }
}

/// Errors surfaced by [`SimHandle`] calls.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// The loop thread has exited; no further requests can be served.
    #[error("simulation loop is not running")]
    LoopGone,
    #[error(transparent)]
    World(#[from] WorldError),
}

/// One request into the loop, carrying its own reply channel.
pub enum SimRequest {
    Create {
        params: CreateParams,
        reply: Sender<Result<(), WorldError>>,
    },
    Destroy {
        id: ObjectId,
        reply: Sender<Result<(), WorldError>>,
    },
    Impulse {
        id: ObjectId,
        impulse: Vector3<f32>,
        point: Option<Vector3<f32>>,
        reply: Sender<Result<(), WorldError>>,
    },
    Torque {
        id: ObjectId,
        torque: Vector3<f32>,
        reply: Sender<Result<(), WorldError>>,
    },
    SetMass {
        id: ObjectId,
        mass: f32,
        reply: Sender<Result<(), WorldError>>,
    },
    SetRadius {
        id: ObjectId,
        radius: f32,
        reply: Sender<Result<(), WorldError>>,
    },
    Update {
        id: ObjectId,
        update: KinematicUpdate,
        reply: Sender<Result<(), WorldError>>,
    },
    State {
        id: ObjectId,
        reply: Sender<Result<BodyState, WorldError>>,
    },
    /// Manual advance with an optional explicit time step; replies with
    /// the full world snapshot.
    Step {
        dt: Option<f32>,
        reply: Sender<(StepReport, Vec<(ObjectId, BodyState)>)>,
    },
    /// Re-read the active config and propagate it to every live body.
    ApplyConfig {
        reply: Sender<usize>,
    },
}
