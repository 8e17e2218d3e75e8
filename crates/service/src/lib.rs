//! The command service: one typed request/response pair per remote
//! operation.
//!
//! Handlers run concurrently with the simulation loop and talk to it over
//! its channel. Every operation returns a status plus an optional
//! human-readable message; no error path panics or propagates an `Err`
//! across this boundary.

mod messages;

pub use messages::*;

use bodyspace_common::ObjectId;
use bodyspace_config::ConfigStore;
use bodyspace_sim::{CreateParams, SimError, SimHandle};
use bodyspace_world::{KinematicUpdate, WorldError, guard};

/// Per-operation result code, mirrored onto the wire as a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Status {
    Ok,
    NotFound,
    AlreadyExists,
    InvalidShape,
    StaticObject,
    InvalidConfig,
    Error,
}

impl Status {
    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Status::Ok => "OK",
            Status::NotFound => "NOT_FOUND",
            Status::AlreadyExists => "ALREADY_EXISTS",
            Status::InvalidShape => "INVALID_SHAPE",
            Status::StaticObject => "STATIC_OBJECT",
            Status::InvalidConfig => "INVALID_CONFIG",
            Status::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// The command surface. Cheap to clone; handlers for concurrent requests
/// each hold their own copy.
#[derive(Clone)]
pub struct CommandService {
    sim: SimHandle,
    configs: ConfigStore,
}

impl CommandService {
    pub fn new(sim: SimHandle, configs: ConfigStore) -> Self {
        Self { sim, configs }
    }

    pub fn create_object(&self, request: CreateObjectRequest) -> StatusResponse {
        let Some(shape) = request.shape else {
            return StatusResponse::failed(Status::InvalidShape, "missing shape descriptor");
        };
        let params = CreateParams {
            id: ObjectId::from(request.id),
            spec: shape,
            pose: bodyspace_common::Pose {
                position: request.position,
                rotation: request.rotation,
            },
            velocities: bodyspace_common::Velocities {
                linear: request.linear_velocity.unwrap_or_default(),
                angular: request.angular_velocity.unwrap_or_default(),
            },
            mass: request.mass,
            max_speed: request.max_speed,
        };
        StatusResponse::from_result(self.sim.create_object(params))
    }

    pub fn destroy_object(&self, request: DestroyObjectRequest) -> StatusResponse {
        StatusResponse::from_result(self.sim.destroy_object(ObjectId::from(request.id)))
    }

    pub fn apply_impulse(&self, request: ApplyImpulseRequest) -> StatusResponse {
        // Pre-emptive clamp here; the store re-checks defensively.
        let cap = self.configs.snapshot().max_impulse_magnitude;
        let impulse = guard::clamp_magnitude(request.impulse, cap);
        StatusResponse::from_result(self.sim.apply_impulse(
            ObjectId::from(request.id),
            impulse,
            request.point,
        ))
    }

    pub fn apply_torque(&self, request: ApplyTorqueRequest) -> StatusResponse {
        StatusResponse::from_result(
            self.sim
                .apply_torque(ObjectId::from(request.id), request.torque),
        )
    }

    pub fn update_object_mass(&self, request: UpdateObjectMassRequest) -> StatusResponse {
        StatusResponse::from_result(self.sim.set_mass(ObjectId::from(request.id), request.mass))
    }

    pub fn update_object_radius(&self, request: UpdateObjectRadiusRequest) -> StatusResponse {
        StatusResponse::from_result(
            self.sim
                .set_radius(ObjectId::from(request.id), request.radius),
        )
    }

    pub fn get_object_state(&self, request: GetObjectStateRequest) -> GetObjectStateResponse {
        match self.sim.object_state(ObjectId::from(request.id)) {
            Ok(state) => GetObjectStateResponse {
                response: StatusResponse::ok(),
                state: Some(state),
            },
            Err(err) => GetObjectStateResponse {
                response: StatusResponse::from_error(err),
                state: None,
            },
        }
    }

    pub fn update_object(&self, request: UpdateObjectRequest) -> StatusResponse {
        let update = KinematicUpdate {
            position: request.position,
            rotation: request.rotation,
            linear_velocity: request.linear_velocity,
            angular_velocity: request.angular_velocity,
        };
        StatusResponse::from_result(self.sim.update_object(ObjectId::from(request.id), update))
    }

    pub fn step_simulation(&self, request: StepSimulationRequest) -> StepSimulationResponse {
        // Best-effort: a nonsensical dt falls back to the configured step.
        let dt = request.dt.filter(|dt| dt.is_finite() && *dt > 0.0);
        match self.sim.step(dt) {
            Ok((_, states)) => StepSimulationResponse {
                response: StatusResponse::ok(),
                states: states
                    .into_iter()
                    .map(|(id, state)| ObjectSnapshot {
                        id: id.to_string(),
                        state,
                    })
                    .collect(),
            },
            Err(err) => StepSimulationResponse {
                response: StatusResponse::from_error(err),
                states: Vec::new(),
            },
        }
    }

    pub fn get_physics_config(&self) -> PhysicsConfigResponse {
        PhysicsConfigResponse {
            response: StatusResponse::ok(),
            config: Some(self.configs.snapshot()),
        }
    }

    /// Atomically replace the active config, then propagate the changed
    /// per-material fields to all live bodies in a single pass.
    pub fn set_physics_config(&self, request: SetPhysicsConfigRequest) -> StatusResponse {
        let config = match request.config.normalized() {
            Ok(config) => config,
            Err(err) => {
                return StatusResponse::failed(Status::InvalidConfig, err.to_string());
            }
        };
        self.configs.replace(config);
        match self.sim.apply_config() {
            Ok(touched) => {
                tracing::info!(touched, "config replaced and propagated");
                StatusResponse::ok()
            }
            Err(err) => StatusResponse::from_error(err),
        }
    }
}

impl StatusResponse {
    pub(crate) fn ok() -> Self {
        Self {
            status: Status::Ok,
            message: None,
        }
    }

    pub(crate) fn failed(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
        }
    }

    pub(crate) fn from_result(result: Result<(), SimError>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(err) => Self::from_error(err),
        }
    }

    pub(crate) fn from_error(err: SimError) -> Self {
        let status = match &err {
            SimError::World(WorldError::NotFound(_)) => Status::NotFound,
            SimError::World(WorldError::AlreadyExists(_)) => Status::AlreadyExists,
            SimError::World(WorldError::InvalidShape(_)) => Status::InvalidShape,
            SimError::World(WorldError::ShapeMismatch(_)) => Status::InvalidShape,
            SimError::World(WorldError::StaticBody(_)) => Status::StaticObject,
            SimError::LoopGone => Status::Error,
        };
        Self::failed(status, err.to_string())
    }
}
