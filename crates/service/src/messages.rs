//! Request and response messages, one pair per operation. These mirror
//! the wire schema field-for-field; the transport encodes them however it
//! likes.

use bodyspace_common::BodyState;
use bodyspace_config::SimConfig;
use bodyspace_world::ShapeSpec;
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::Status;

/// Status plus optional human-readable message, carried by every response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: Status,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateObjectRequest {
    pub id: String,
    pub shape: Option<ShapeSpec>,
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub linear_velocity: Option<Vector3<f32>>,
    pub angular_velocity: Option<Vector3<f32>>,
    /// Overrides the descriptor's mass when set.
    pub mass: Option<f32>,
    /// Per-object linear speed cap.
    pub max_speed: Option<f32>,
}

impl CreateObjectRequest {
    /// A request with everything optional left unset.
    pub fn new(id: impl Into<String>, shape: ShapeSpec, position: Vector3<f32>) -> Self {
        Self {
            id: id.into(),
            shape: Some(shape),
            position,
            rotation: UnitQuaternion::identity(),
            linear_velocity: None,
            angular_velocity: None,
            mass: None,
            max_speed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestroyObjectRequest {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyImpulseRequest {
    pub id: String,
    pub impulse: Vector3<f32>,
    /// World-space application point; center of mass when unset.
    pub point: Option<Vector3<f32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyTorqueRequest {
    pub id: String,
    pub torque: Vector3<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateObjectMassRequest {
    pub id: String,
    pub mass: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateObjectRadiusRequest {
    pub id: String,
    pub radius: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetObjectStateRequest {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetObjectStateResponse {
    pub response: StatusResponse,
    pub state: Option<BodyState>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateObjectRequest {
    pub id: String,
    pub position: Option<Vector3<f32>>,
    pub rotation: Option<UnitQuaternion<f32>>,
    pub linear_velocity: Option<Vector3<f32>>,
    pub angular_velocity: Option<Vector3<f32>>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StepSimulationRequest {
    /// Explicit time step; the configured fixed step when unset. Clamped
    /// to the same frame ceiling as the background tick.
    pub dt: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    pub id: String,
    pub state: BodyState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSimulationResponse {
    pub response: StatusResponse,
    pub states: Vec<ObjectSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetPhysicsConfigRequest {
    pub config: SimConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfigResponse {
    pub response: StatusResponse,
    pub config: Option<SimConfig>,
}
