//! Simulation tuning parameters and the shared config store.
//!
//! # Invariants
//! - Every field of [`SimConfig`] has a defined default, so the server is
//!   fully operational even when the external authority is unreachable.
//! - Readers always observe a whole-record snapshot, never a torn mix of
//!   old and new fields.

mod store;

pub use store::ConfigStore;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Error raised when an incoming config record cannot be installed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config field `{0}` is not a finite number")]
    NonFinite(&'static str),
    #[error("config step rate must be positive, got {0}")]
    ZeroStepRate(u32),
}

/// The flat record of simulation-wide tuning parameters.
///
/// The field set mirrors the authority's wire record one-to-one; replacing
/// the whole record is the only supported mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Baseline impulse strength used by movement helpers.
    pub base_impulse: f32,
    /// Upper bound for helper-computed impulse strength.
    pub max_impulse: f32,
    /// Distance falloff multiplier for helper-computed impulses.
    pub distance_multiplier: f32,
    /// Global multiplier applied to helper-computed impulses.
    pub impulse_multiplier: f32,
    /// Global linear speed cap, applied every tick unless a body carries
    /// its own override.
    pub max_speed: f32,
    /// Hard cap on the magnitude of any single applied impulse.
    pub max_impulse_magnitude: f32,
    /// Default restitution for bodies whose descriptor leaves it unset.
    pub restitution: f32,
    /// Restitution applied to terrain colliders.
    pub terrain_restitution: f32,
    /// Restitution applied to dynamic bodies on config propagation.
    pub object_restitution: f32,
    /// Default surface friction.
    pub friction: f32,
    /// Default rolling resistance (folded into angular damping).
    pub rolling_friction: f32,
    /// Per-tick linear velocity decay.
    pub linear_damping: f32,
    /// Per-tick angular velocity decay.
    pub angular_damping: f32,
    /// Continuous collision detection motion threshold, as a factor of the
    /// body radius.
    pub ccd_motion_threshold_factor: f32,
    /// Continuous collision detection swept-sphere radius, as a factor of
    /// the body radius.
    pub ccd_swept_sphere_radius_factor: f32,
    /// Minimum speed factor preserved when an impulse is scaled down.
    pub min_speed_factor: f32,
    /// Background tick rate in Hz.
    pub step_rate: u32,
    /// World gravity vector.
    pub gravity: Vector3<f32>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            base_impulse: 50.0,
            max_impulse: 120.0,
            distance_multiplier: 0.5,
            impulse_multiplier: 0.8,
            max_speed: 150.0,
            max_impulse_magnitude: 2000.0,
            restitution: 0.7,
            terrain_restitution: 0.6,
            object_restitution: 0.98,
            friction: 0.2,
            rolling_friction: 0.05,
            linear_damping: 0.0,
            angular_damping: 0.0,
            ccd_motion_threshold_factor: 0.7,
            ccd_swept_sphere_radius_factor: 0.6,
            min_speed_factor: 0.3,
            step_rate: 120,
            gravity: Vector3::new(0.0, -9.81, 0.0),
        }
    }
}

impl SimConfig {
    /// The fixed inner integration step derived from the tick rate.
    pub fn fixed_dt(&self) -> f32 {
        1.0 / self.step_rate.max(1) as f32
    }

    /// The target wall-clock interval between background ticks.
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f32(self.fixed_dt())
    }

    /// Validate an incoming record and fill degenerate fields from the
    /// defaults.
    ///
    /// Non-finite scalars are rejected outright; zero or negative caps
    /// (which would freeze the world) are replaced by their defaults in one
    /// place rather than at each consumer.
    pub fn normalized(mut self) -> Result<Self, ConfigError> {
        for (name, value) in self.named_fields() {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite(name));
            }
        }
        if !self.gravity.iter().all(|c| c.is_finite()) {
            return Err(ConfigError::NonFinite("gravity"));
        }
        if self.step_rate == 0 {
            return Err(ConfigError::ZeroStepRate(self.step_rate));
        }

        let defaults = Self::default();
        if self.max_speed <= 0.0 {
            self.max_speed = defaults.max_speed;
        }
        if self.max_impulse_magnitude <= 0.0 {
            self.max_impulse_magnitude = defaults.max_impulse_magnitude;
        }
        if self.max_impulse <= 0.0 {
            self.max_impulse = defaults.max_impulse;
        }
        Ok(self)
    }

    fn named_fields(&self) -> [(&'static str, f32); 16] {
        [
            ("base_impulse", self.base_impulse),
            ("max_impulse", self.max_impulse),
            ("distance_multiplier", self.distance_multiplier),
            ("impulse_multiplier", self.impulse_multiplier),
            ("max_speed", self.max_speed),
            ("max_impulse_magnitude", self.max_impulse_magnitude),
            ("restitution", self.restitution),
            ("terrain_restitution", self.terrain_restitution),
            ("object_restitution", self.object_restitution),
            ("friction", self.friction),
            ("rolling_friction", self.rolling_friction),
            ("linear_damping", self.linear_damping),
            ("angular_damping", self.angular_damping),
            (
                "ccd_motion_threshold_factor",
                self.ccd_motion_threshold_factor,
            ),
            (
                "ccd_swept_sphere_radius_factor",
                self.ccd_swept_sphere_radius_factor,
            ),
            ("min_speed_factor", self.min_speed_factor),
        ]
    }
}
