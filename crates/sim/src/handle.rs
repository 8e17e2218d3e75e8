//! Caller-side handle to the simulation loop.

use std::sync::mpsc::{self, Sender};

use bodyspace_common::{BodyState, ObjectId};
use bodyspace_world::{CreateParams, KinematicUpdate, StepReport, WorldError};
use nalgebra::Vector3;

use crate::{SimError, SimRequest};

/// Cloneable sender half of the loop's command channel.
///
/// Every method performs one request/reply round trip. A dead loop is
/// reported as [`SimError::LoopGone`], never as a panic.
#[derive(Clone)]
pub struct SimHandle {
    pub(crate) tx: Sender<SimRequest>,
}

impl SimHandle {
    fn call<T>(&self, build: impl FnOnce(Sender<T>) -> SimRequest) -> Result<T, SimError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(build(reply_tx))
            .map_err(|_| SimError::LoopGone)?;
        reply_rx.recv().map_err(|_| SimError::LoopGone)
    }

    fn call_world<T>(
        &self,
        build: impl FnOnce(Sender<Result<T, WorldError>>) -> SimRequest,
    ) -> Result<T, SimError> {
        self.call(build)?.map_err(SimError::from)
    }

    pub fn create_object(&self, params: CreateParams) -> Result<(), SimError> {
        self.call_world(|reply| SimRequest::Create { params, reply })
    }

    pub fn destroy_object(&self, id: ObjectId) -> Result<(), SimError> {
        self.call_world(|reply| SimRequest::Destroy { id, reply })
    }

    pub fn apply_impulse(
        &self,
        id: ObjectId,
        impulse: Vector3<f32>,
        point: Option<Vector3<f32>>,
    ) -> Result<(), SimError> {
        self.call_world(|reply| SimRequest::Impulse {
            id,
            impulse,
            point,
            reply,
        })
    }

    pub fn apply_torque(&self, id: ObjectId, torque: Vector3<f32>) -> Result<(), SimError> {
        self.call_world(|reply| SimRequest::Torque { id, torque, reply })
    }

    pub fn set_mass(&self, id: ObjectId, mass: f32) -> Result<(), SimError> {
        self.call_world(|reply| SimRequest::SetMass { id, mass, reply })
    }

    pub fn set_radius(&self, id: ObjectId, radius: f32) -> Result<(), SimError> {
        self.call_world(|reply| SimRequest::SetRadius { id, radius, reply })
    }

    pub fn update_object(&self, id: ObjectId, update: KinematicUpdate) -> Result<(), SimError> {
        self.call_world(|reply| SimRequest::Update { id, update, reply })
    }

    pub fn object_state(&self, id: ObjectId) -> Result<BodyState, SimError> {
        self.call_world(|reply| SimRequest::State { id, reply })
    }

    /// One manual advance; replies with the tick report and the state of
    /// every object.
    pub fn step(
        &self,
        dt: Option<f32>,
    ) -> Result<(StepReport, Vec<(ObjectId, BodyState)>), SimError> {
        self.call(|reply| SimRequest::Step { dt, reply })
    }

    /// Propagate the currently-installed config to all live bodies.
    /// Returns the number of bodies touched.
    pub fn apply_config(&self) -> Result<usize, SimError> {
        self.call(|reply| SimRequest::ApplyConfig { reply })
    }
}
