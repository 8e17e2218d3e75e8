//! Thin adapter over rapier: given a shape, mass, and pose, produce a
//! body; given a world, advance it by dt with bounded sub-steps. Nothing
//! outside this module touches the pipeline structures.

use bodyspace_common::{BodyState, Pose, Velocities};
use nalgebra::{DMatrix, Translation3, Vector3};
use rapier3d::prelude::*;

use crate::shape::ShapeDesc;
use crate::{MAX_FRAME_DT, MIN_FRAME_DT};

/// The rapier structures backing the simulated world.
pub struct EngineWorld {
    pipeline: PhysicsPipeline,
    params: IntegrationParameters,
    islands: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
}

impl Default for EngineWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineWorld {
    pub fn new() -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            params: IntegrationParameters::default(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
        }
    }

    /// Insert a body built from a normalized descriptor.
    ///
    /// Static descriptors (terrain, massless shapes) become fixed bodies:
    /// no gravity, no velocity, locked factors by construction.
    pub fn insert(
        &mut self,
        desc: &ShapeDesc,
        pose: Pose,
        velocities: Velocities,
        ccd_prediction: f32,
        terrain_restitution: f32,
        terrain_friction: f32,
    ) -> (RigidBodyHandle, ColliderHandle) {
        let iso = Isometry::from_parts(Translation3::from(pose.position), pose.rotation);

        let body = if desc.is_static() {
            RigidBodyBuilder::fixed().pose(iso).build()
        } else {
            let material = match desc {
                ShapeDesc::Sphere { material, .. } | ShapeDesc::Box { material, .. } => *material,
                ShapeDesc::Terrain { .. } => unreachable!("terrain is static"),
            };
            let mut builder = RigidBodyBuilder::dynamic()
                .pose(iso)
                .linvel(velocities.linear)
                .angvel(velocities.angular)
                .linear_damping(material.linear_damping)
                // Rolling resistance folds into angular damping; rapier has
                // no per-collider rolling friction.
                .angular_damping(material.angular_damping + material.rolling_friction);
            if ccd_prediction > 0.0 {
                builder = builder.ccd_enabled(true).soft_ccd_prediction(ccd_prediction);
            }
            builder.build()
        };
        let body_handle = self.bodies.insert(body);

        let collider = build_collider(desc, terrain_restitution, terrain_friction);
        let collider_handle =
            self.colliders
                .insert_with_parent(collider, body_handle, &mut self.bodies);
        (body_handle, collider_handle)
    }

    /// Remove a body and its attached collider.
    pub fn remove(&mut self, handle: RigidBodyHandle) {
        self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Advance the world by `elapsed` seconds of wall time using a fixed
    /// inner time step and a bounded sub-step count. Returns the number of
    /// sub-steps taken.
    pub fn advance(
        &mut self,
        elapsed: f32,
        fixed_dt: f32,
        max_substeps: u32,
        gravity: Vector3<f32>,
    ) -> u32 {
        let elapsed = elapsed.clamp(MIN_FRAME_DT, MAX_FRAME_DT);
        let substeps = ((elapsed / fixed_dt).ceil() as u32).clamp(1, max_substeps);
        self.params.dt = fixed_dt;
        for _ in 0..substeps {
            self.pipeline.step(
                &gravity,
                &self.params,
                &mut self.islands,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.bodies,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                &mut self.ccd_solver,
                &(),
                &(),
            );
        }
        substeps
    }

    /// Snapshot one body's kinematic state.
    pub fn state_of(&self, handle: RigidBodyHandle) -> Option<BodyState> {
        self.bodies.get(handle).map(|body| BodyState {
            position: *body.translation(),
            rotation: *body.rotation(),
            linear_velocity: *body.linvel(),
            angular_velocity: *body.angvel(),
        })
    }
}

fn build_collider(desc: &ShapeDesc, terrain_restitution: f32, terrain_friction: f32) -> Collider {
    match desc {
        ShapeDesc::Sphere {
            radius,
            mass,
            material,
        } => ColliderBuilder::ball(*radius)
            .restitution(material.restitution)
            .friction(material.friction)
            .mass(*mass)
            .build(),
        ShapeDesc::Box {
            width,
            height,
            depth,
            mass,
            material,
        } => ColliderBuilder::cuboid(width / 2.0, height / 2.0, depth / 2.0)
            .restitution(material.restitution)
            .friction(material.friction)
            .mass(*mass)
            .build(),
        ShapeDesc::Terrain {
            width,
            depth,
            heightmap,
            scale,
            ..
        } => {
            let (w, d) = (*width as usize, *depth as usize);
            // Row r spans z, column c spans x; row-major samples.
            let heights = DMatrix::from_fn(d, w, |r, c| heightmap[r * w + c]);
            let extents = Vector3::new(
                (w - 1) as f32 * scale.x,
                scale.y,
                (d - 1) as f32 * scale.z,
            );
            ColliderBuilder::heightfield(heights, extents)
                .restitution(terrain_restitution)
                .friction(terrain_friction)
                .build()
        }
    }
}
