//! The registry of live objects and the per-tick safety pass.

use std::collections::BTreeMap;

use bodyspace_common::{BodyState, ObjectId, Pose, Velocities};
use bodyspace_config::SimConfig;
use nalgebra::{Point3, UnitQuaternion, Vector3};
use rapier3d::prelude::{Collider, ColliderHandle, RigidBody, RigidBodyHandle, SharedShape};

use crate::engine::EngineWorld;
use crate::shape::{ShapeDesc, ShapeSpec};
use crate::{MAX_ANGULAR_SPEED, MAX_SUBSTEPS, WorldError, guard};

/// Registry entry: the normalized descriptor, the engine handles, and the
/// per-object overrides.
struct PhysicsObject {
    desc: ShapeDesc,
    body: RigidBodyHandle,
    collider: ColliderHandle,
    max_speed: Option<f32>,
}

/// Exclusive view of one object, valid for the duration of a
/// [`WorldStore::with_object`] call.
pub struct BodyAccess<'a> {
    pub desc: &'a mut ShapeDesc,
    pub max_speed: &'a mut Option<f32>,
    pub body: &'a mut RigidBody,
    pub collider: &'a mut Collider,
}

/// Optional per-field kinematic update; only present fields are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KinematicUpdate {
    pub position: Option<Vector3<f32>>,
    pub rotation: Option<UnitQuaternion<f32>>,
    pub linear_velocity: Option<Vector3<f32>>,
    pub angular_velocity: Option<Vector3<f32>>,
}

/// Everything needed to create one object.
#[derive(Debug, Clone)]
pub struct CreateParams {
    pub id: ObjectId,
    pub spec: ShapeSpec,
    pub pose: Pose,
    pub velocities: Velocities,
    /// Overrides the descriptor's mass when set.
    pub mass: Option<f32>,
    /// Per-object linear speed cap; the global cap applies when unset.
    pub max_speed: Option<f32>,
}

impl CreateParams {
    pub fn new(id: impl Into<ObjectId>, spec: ShapeSpec) -> Self {
        Self {
            id: id.into(),
            spec,
            pose: Pose::default(),
            velocities: Velocities::default(),
            mass: None,
            max_speed: None,
        }
    }

    pub fn at(mut self, position: Vector3<f32>) -> Self {
        self.pose.position = position;
        self
    }
}

/// What one tick did, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub substeps: u32,
    pub speed_clamped: usize,
    pub recovered: usize,
}

/// The world registry. Owned exclusively by the simulation loop; all
/// synchronization happens in the channel that feeds it.
#[derive(Default)]
pub struct WorldStore {
    engine: EngineWorld,
    objects: BTreeMap<ObjectId, PhysicsObject>,
}

impl WorldStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    /// Create a new object from an already client-shaped descriptor.
    ///
    /// The descriptor is normalized against `config` exactly once here.
    /// Static descriptors ignore the initial velocities.
    pub fn create(&mut self, params: CreateParams, config: &SimConfig) -> Result<(), WorldError> {
        let CreateParams {
            id,
            spec,
            pose,
            velocities,
            mass,
            max_speed,
        } = params;
        if self.objects.contains_key(&id) {
            return Err(WorldError::AlreadyExists(id));
        }
        let spec = match mass {
            Some(mass) => spec.with_mass(mass),
            None => spec,
        };
        let desc = spec.normalize(config)?;
        let velocities = if desc.is_static() {
            Velocities::default()
        } else {
            velocities
        };
        let ccd_prediction = desc
            .ccd_radius()
            .map(|r| r * config.ccd_motion_threshold_factor)
            .unwrap_or(0.0);
        let (body, collider) = self.engine.insert(
            &desc,
            pose,
            velocities,
            ccd_prediction,
            config.terrain_restitution,
            config.friction,
        );
        tracing::debug!(%id, static_body = desc.is_static(), "object created");
        self.objects.insert(
            id,
            PhysicsObject {
                desc,
                body,
                collider,
                max_speed,
            },
        );
        Ok(())
    }

    /// Run `f` with exclusive access to one object.
    pub fn with_object<R>(
        &mut self,
        id: &ObjectId,
        f: impl FnOnce(BodyAccess<'_>) -> R,
    ) -> Result<R, WorldError> {
        let obj = self
            .objects
            .get_mut(id)
            .ok_or_else(|| WorldError::NotFound(id.clone()))?;
        let body = self
            .engine
            .bodies
            .get_mut(obj.body)
            .ok_or_else(|| WorldError::NotFound(id.clone()))?;
        let collider = self
            .engine
            .colliders
            .get_mut(obj.collider)
            .ok_or_else(|| WorldError::NotFound(id.clone()))?;
        Ok(f(BodyAccess {
            desc: &mut obj.desc,
            max_speed: &mut obj.max_speed,
            body,
            collider,
        }))
    }

    /// Visit every object's current state.
    pub fn for_each(&self, mut f: impl FnMut(&ObjectId, BodyState)) {
        for (id, obj) in &self.objects {
            if let Some(state) = self.engine.state_of(obj.body) {
                f(id, state);
            }
        }
    }

    /// Snapshot the full world, in id order.
    pub fn states(&self) -> Vec<(ObjectId, BodyState)> {
        let mut out = Vec::with_capacity(self.objects.len());
        self.for_each(|id, state| out.push((id.clone(), state)));
        out
    }

    pub fn state(&self, id: &ObjectId) -> Result<BodyState, WorldError> {
        let obj = self
            .objects
            .get(id)
            .ok_or_else(|| WorldError::NotFound(id.clone()))?;
        self.engine
            .state_of(obj.body)
            .ok_or_else(|| WorldError::NotFound(id.clone()))
    }

    /// Apply an impulse, defensively re-clamped to `cap`, at the center of
    /// mass or at a world-space point.
    pub fn apply_impulse(
        &mut self,
        id: &ObjectId,
        impulse: Vector3<f32>,
        point: Option<Vector3<f32>>,
        cap: f32,
    ) -> Result<(), WorldError> {
        self.with_object(id, |access| {
            let impulse = guard::clamp_magnitude(impulse, cap);
            match point {
                Some(p) => access
                    .body
                    .apply_impulse_at_point(impulse, Point3::from(p), true),
                None => access.body.apply_impulse(impulse, true),
            }
        })
    }

    /// Apply an instantaneous torque. Deliberately unclamped.
    pub fn apply_torque(&mut self, id: &ObjectId, torque: Vector3<f32>) -> Result<(), WorldError> {
        self.with_object(id, |access| {
            access.body.apply_torque_impulse(torque, true);
        })
    }

    /// Give the body a new mass, recomputing inertia from its current
    /// collider shape. A non-positive mass would turn the body static,
    /// which is not a supported transition.
    pub fn set_mass(&mut self, id: &ObjectId, mass: f32) -> Result<(), WorldError> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(WorldError::InvalidShape(format!(
                "mass {mass} is not a positive finite number"
            )));
        }
        self.with_object(id, |access| {
            if access.body.is_fixed() {
                return Err(WorldError::StaticBody(id.clone()));
            }
            access.collider.set_mass(mass);
            match access.desc {
                ShapeDesc::Sphere { mass: m, .. } | ShapeDesc::Box { mass: m, .. } => *m = mass,
                ShapeDesc::Terrain { .. } => {}
            }
            access.body.wake_up(true);
            Ok(())
        })?
    }

    /// Swap a sphere's collision shape for one with a new radius,
    /// recomputing inertia while preserving the current mass.
    pub fn set_radius(&mut self, id: &ObjectId, radius: f32) -> Result<(), WorldError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(WorldError::InvalidShape(format!(
                "radius {radius} is not a positive finite number"
            )));
        }
        self.with_object(id, |access| {
            let ShapeDesc::Sphere { radius: r, mass, .. } = access.desc else {
                return Err(WorldError::ShapeMismatch(id.clone()));
            };
            access.collider.set_shape(SharedShape::ball(radius));
            access.collider.set_mass(*mass);
            *r = radius;
            access.body.wake_up(true);
            Ok(())
        })?
    }

    /// Apply only the fields present in the update, leaving the rest
    /// untouched, and wake the body.
    pub fn update_kinematics(
        &mut self,
        id: &ObjectId,
        update: KinematicUpdate,
    ) -> Result<(), WorldError> {
        self.with_object(id, |access| {
            if let Some(p) = update.position {
                access.body.set_translation(p, true);
            }
            if let Some(r) = update.rotation {
                access.body.set_rotation(r, true);
            }
            if let Some(v) = update.linear_velocity {
                access.body.set_linvel(v, true);
            }
            if let Some(w) = update.angular_velocity {
                access.body.set_angvel(w, true);
            }
            access.body.wake_up(true);
        })
    }

    /// Remove one object immediately, releasing its engine resources.
    pub fn destroy(&mut self, id: &ObjectId) -> Result<(), WorldError> {
        let obj = self
            .objects
            .remove(id)
            .ok_or_else(|| WorldError::NotFound(id.clone()))?;
        self.engine.remove(obj.body);
        tracing::debug!(%id, "object destroyed");
        Ok(())
    }

    /// Drop every object. Shutdown path.
    pub fn remove_all(&mut self) {
        let handles: Vec<_> = self.objects.values().map(|o| o.body).collect();
        for handle in handles {
            self.engine.remove(handle);
        }
        self.objects.clear();
    }

    /// Propagate a freshly-installed config to every live body in one
    /// pass: material fields, CCD thresholds, and max-speed override
    /// reconciliation. Returns the number of bodies touched.
    pub fn apply_config(&mut self, config: &SimConfig) -> usize {
        let mut touched = 0;
        for obj in self.objects.values_mut() {
            let Some(body) = self.engine.bodies.get_mut(obj.body) else {
                continue;
            };
            let Some(collider) = self.engine.colliders.get_mut(obj.collider) else {
                continue;
            };
            if obj.desc.is_terrain() {
                collider.set_restitution(config.terrain_restitution);
                collider.set_friction(config.friction);
            } else {
                collider.set_restitution(config.object_restitution);
                collider.set_friction(config.friction);
                if !body.is_fixed() {
                    body.set_linear_damping(config.linear_damping);
                    body.set_angular_damping(config.angular_damping + config.rolling_friction);
                    if let Some(radius) = obj.desc.ccd_radius() {
                        body.enable_ccd(true);
                        body.set_soft_ccd_prediction(radius * config.ccd_motion_threshold_factor);
                    }
                }
            }
            // An override above the new global cap would defeat it.
            if let Some(limit) = obj.max_speed {
                obj.max_speed = Some(limit.min(config.max_speed));
            }
            touched += 1;
        }
        touched
    }

    /// Advance the world by `elapsed` seconds and run the safety pass.
    ///
    /// Poisoned state is recovered both before stepping (so the solver
    /// never integrates non-finite numbers) and after, which is where
    /// blow-ups produced by the step itself are caught.
    pub fn advance(&mut self, elapsed: f32, config: &SimConfig) -> StepReport {
        let _span = tracing::debug_span!("tick", elapsed).entered();
        let mut recovered = self.sanitize_pass();
        let substeps =
            self.engine
                .advance(elapsed, config.fixed_dt(), MAX_SUBSTEPS, config.gravity);
        let mut speed_clamped = 0;
        for obj in self.objects.values() {
            let Some(body) = self.engine.bodies.get_mut(obj.body) else {
                continue;
            };
            if body.is_fixed() {
                continue;
            }
            let limit = obj.max_speed.unwrap_or(config.max_speed);
            let linvel = *body.linvel();
            let clamped = guard::clamp_speed(linvel, limit);
            if clamped != linvel {
                body.set_linvel(clamped, true);
                speed_clamped += 1;
            }
            let angvel = *body.angvel();
            let capped = guard::clamp_magnitude(angvel, MAX_ANGULAR_SPEED);
            if capped != angvel {
                body.set_angvel(capped, true);
            }
        }
        recovered += self.sanitize_pass();
        StepReport {
            substeps,
            speed_clamped,
            recovered,
        }
    }

    fn sanitize_pass(&mut self) -> usize {
        let mut recovered = 0;
        for (id, obj) in &self.objects {
            let Some(body) = self.engine.bodies.get_mut(obj.body) else {
                continue;
            };
            if body.is_fixed() {
                continue;
            }
            let pose = Pose {
                position: *body.translation(),
                rotation: *body.rotation(),
            };
            let vels = Velocities {
                linear: *body.linvel(),
                angular: *body.angvel(),
            };
            let (pose, vels, hit) = guard::sanitize(pose, vels);
            if hit {
                body.set_translation(pose.position, true);
                body.set_rotation(pose.rotation, true);
                body.set_linvel(vels.linear, true);
                body.set_angvel(vels.angular, true);
                body.reset_forces(true);
                body.reset_torques(true);
                tracing::warn!(%id, "recovered object from non-finite state");
                recovered += 1;
            }
        }
        recovered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::MaterialParams;
    use approx::assert_relative_eq;

    fn cfg() -> SimConfig {
        SimConfig::default()
    }

    fn sphere(radius: f32, mass: f32) -> ShapeSpec {
        ShapeSpec::Sphere {
            radius,
            mass,
            material: MaterialParams::default(),
        }
    }

    fn dead_sphere(radius: f32, mass: f32) -> ShapeSpec {
        // Zero restitution and some damping so settling tests converge.
        ShapeSpec::Sphere {
            radius,
            mass,
            material: MaterialParams {
                restitution: Some(0.0),
                linear_damping: Some(0.05),
                ..MaterialParams::default()
            },
        }
    }

    fn flat_terrain(width: u32, depth: u32) -> ShapeSpec {
        ShapeSpec::Terrain {
            width,
            depth,
            heightmap: vec![0.0; (width * depth) as usize],
            scale: Vector3::new(1.0, 1.0, 1.0),
            min_height: None,
            max_height: None,
        }
    }

    fn create_simple(store: &mut WorldStore, id: &str, spec: ShapeSpec, pos: Vector3<f32>) {
        store
            .create(CreateParams::new(id, spec).at(pos), &cfg())
            .unwrap();
    }

    #[test]
    fn duplicate_create_fails_and_preserves_original() {
        let mut store = WorldStore::new();
        create_simple(&mut store, "s1", sphere(1.0, 1.0), Vector3::new(0.0, 7.0, 0.0));
        let before = store.state(&ObjectId::from("s1")).unwrap();

        let err = store
            .create(
                CreateParams::new("s1", sphere(9.0, 9.0)).at(Vector3::new(100.0, 100.0, 100.0)),
                &cfg(),
            )
            .unwrap_err();
        assert_eq!(err, WorldError::AlreadyExists(ObjectId::from("s1")));
        assert_eq!(store.len(), 1);
        assert_eq!(store.state(&ObjectId::from("s1")).unwrap(), before);
    }

    #[test]
    fn sphere_falls_under_gravity() {
        let mut store = WorldStore::new();
        create_simple(&mut store, "s1", sphere(1.0, 1.0), Vector3::new(0.0, 10.0, 0.0));
        for _ in 0..60 {
            store.advance(1.0 / 60.0, &cfg());
        }
        let state = store.state(&ObjectId::from("s1")).unwrap();
        assert!(state.position.y < 10.0, "sphere did not fall: {state:?}");
        assert!(state.linear_velocity.y < 0.0);
    }

    #[test]
    fn sphere_settles_on_flat_terrain() {
        let mut store = WorldStore::new();
        create_simple(&mut store, "t1", flat_terrain(4, 4), Vector3::zeros());
        create_simple(
            &mut store,
            "s2",
            dead_sphere(0.5, 1.0),
            Vector3::new(0.0, 2.0, 0.0),
        );
        for _ in 0..360 {
            store.advance(1.0 / 60.0, &cfg());
        }
        let state = store.state(&ObjectId::from("s2")).unwrap();
        assert!(
            state.position.y > 0.2 && state.position.y < 1.0,
            "sphere did not settle on the surface: {state:?}"
        );
        assert!(state.linear_velocity.norm() < 0.5);
    }

    #[test]
    fn speed_is_clamped_to_global_cap() {
        let mut store = WorldStore::new();
        create_simple(&mut store, "s1", sphere(1.0, 1.0), Vector3::zeros());
        store
            .update_kinematics(
                &ObjectId::from("s1"),
                KinematicUpdate {
                    linear_velocity: Some(Vector3::new(10_000.0, 0.0, 0.0)),
                    ..KinematicUpdate::default()
                },
            )
            .unwrap();
        let report = store.advance(1.0 / 60.0, &cfg());
        assert!(report.speed_clamped >= 1);
        let state = store.state(&ObjectId::from("s1")).unwrap();
        assert!(state.linear_velocity.norm() <= cfg().max_speed * 1.001);
        // Direction preserved.
        assert!(state.linear_velocity.x > 0.0);
    }

    #[test]
    fn per_object_override_beats_global_cap() {
        let mut store = WorldStore::new();
        store
            .create(
                CreateParams {
                    max_speed: Some(5.0),
                    ..CreateParams::new("slow", sphere(1.0, 1.0))
                },
                &cfg(),
            )
            .unwrap();
        store
            .update_kinematics(
                &ObjectId::from("slow"),
                KinematicUpdate {
                    linear_velocity: Some(Vector3::new(50.0, 0.0, 0.0)),
                    ..KinematicUpdate::default()
                },
            )
            .unwrap();
        store.advance(1.0 / 60.0, &cfg());
        let state = store.state(&ObjectId::from("slow")).unwrap();
        assert!(state.linear_velocity.norm() <= 5.001);
    }

    #[test]
    fn impulse_is_clamped_preserving_direction() {
        let mut store = WorldStore::new();
        create_simple(&mut store, "s1", sphere(1.0, 1.0), Vector3::zeros());
        let cap = cfg().max_impulse_magnitude;
        store
            .apply_impulse(
                &ObjectId::from("s1"),
                Vector3::new(0.0, 10.0 * cap, 0.0),
                None,
                cap,
            )
            .unwrap();
        let state = store.state(&ObjectId::from("s1")).unwrap();
        // mass 1.0, so delta-v equals the applied impulse magnitude
        assert_relative_eq!(state.linear_velocity.norm(), cap, epsilon = cap * 1e-3);
        assert_relative_eq!(state.linear_velocity.x, 0.0, epsilon = 1e-3);
        assert!(state.linear_velocity.y > 0.0);
    }

    #[test]
    fn impulse_on_unknown_id_is_not_found_and_touches_nothing() {
        let mut store = WorldStore::new();
        create_simple(&mut store, "bystander", sphere(1.0, 1.0), Vector3::zeros());
        let before = store.state(&ObjectId::from("bystander")).unwrap();
        let err = store
            .apply_impulse(&ObjectId::from("ghost"), Vector3::new(1.0, 0.0, 0.0), None, 10.0)
            .unwrap_err();
        assert_eq!(err, WorldError::NotFound(ObjectId::from("ghost")));
        assert_eq!(store.state(&ObjectId::from("bystander")).unwrap(), before);
    }

    #[test]
    fn non_finite_position_is_recovered_on_next_tick() {
        let mut store = WorldStore::new();
        create_simple(&mut store, "s1", sphere(1.0, 1.0), Vector3::new(0.0, 5.0, 0.0));
        store
            .update_kinematics(
                &ObjectId::from("s1"),
                KinematicUpdate {
                    position: Some(Vector3::new(f32::NAN, f32::INFINITY, 0.0)),
                    linear_velocity: Some(Vector3::new(f32::NAN, 0.0, 0.0)),
                    ..KinematicUpdate::default()
                },
            )
            .unwrap();
        let report = store.advance(1.0 / 60.0, &cfg());
        assert!(report.recovered >= 1);
        let state = store.state(&ObjectId::from("s1")).unwrap();
        assert!(state.is_finite());
        // Reset lands at the origin; one tick of gravity may have moved it
        // slightly down already.
        assert!(state.position.norm() < 1.0);

        for _ in 0..10 {
            store.advance(1.0 / 60.0, &cfg());
        }
        assert!(store.state(&ObjectId::from("s1")).unwrap().is_finite());
    }

    #[test]
    fn mass_update_rejects_static_bodies() {
        let mut store = WorldStore::new();
        create_simple(&mut store, "wall", sphere(1.0, 0.0), Vector3::zeros());
        let err = store.set_mass(&ObjectId::from("wall"), 2.0).unwrap_err();
        assert_eq!(err, WorldError::StaticBody(ObjectId::from("wall")));
    }

    #[test]
    fn mass_update_changes_descriptor_and_wakes_body() {
        let mut store = WorldStore::new();
        create_simple(&mut store, "s1", sphere(1.0, 1.0), Vector3::zeros());
        store.set_mass(&ObjectId::from("s1"), 4.0).unwrap();
        store
            .with_object(&ObjectId::from("s1"), |access| {
                assert_eq!(access.desc.mass(), 4.0);
                assert_relative_eq!(access.body.mass(), 4.0, epsilon = 1e-4);
            })
            .unwrap();
    }

    #[test]
    fn radius_update_requires_sphere() {
        let mut store = WorldStore::new();
        create_simple(
            &mut store,
            "crate",
            ShapeSpec::Box {
                width: 1.0,
                height: 1.0,
                depth: 1.0,
                mass: 1.0,
                material: MaterialParams::default(),
            },
            Vector3::zeros(),
        );
        let err = store.set_radius(&ObjectId::from("crate"), 2.0).unwrap_err();
        assert_eq!(err, WorldError::ShapeMismatch(ObjectId::from("crate")));
    }

    #[test]
    fn radius_update_preserves_mass() {
        let mut store = WorldStore::new();
        create_simple(&mut store, "s1", sphere(1.0, 3.0), Vector3::zeros());
        store.set_radius(&ObjectId::from("s1"), 2.5).unwrap();
        store
            .with_object(&ObjectId::from("s1"), |access| {
                assert!(matches!(access.desc, ShapeDesc::Sphere { radius, .. } if *radius == 2.5));
                assert_relative_eq!(access.body.mass(), 3.0, epsilon = 1e-4);
            })
            .unwrap();
    }

    #[test]
    fn kinematic_update_applies_only_present_fields() {
        let mut store = WorldStore::new();
        create_simple(&mut store, "s1", sphere(1.0, 1.0), Vector3::new(1.0, 2.0, 3.0));
        store
            .update_kinematics(
                &ObjectId::from("s1"),
                KinematicUpdate {
                    linear_velocity: Some(Vector3::new(0.0, 4.0, 0.0)),
                    ..KinematicUpdate::default()
                },
            )
            .unwrap();
        let state = store.state(&ObjectId::from("s1")).unwrap();
        assert_eq!(state.position, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(state.linear_velocity, Vector3::new(0.0, 4.0, 0.0));
    }

    #[test]
    fn destroy_removes_exactly_one_object() {
        let mut store = WorldStore::new();
        create_simple(&mut store, "a", sphere(1.0, 1.0), Vector3::zeros());
        create_simple(&mut store, "b", sphere(1.0, 1.0), Vector3::new(5.0, 0.0, 0.0));
        store.destroy(&ObjectId::from("a")).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.state(&ObjectId::from("a")).is_err());
        assert!(store.state(&ObjectId::from("b")).is_ok());

        let err = store.destroy(&ObjectId::from("a")).unwrap_err();
        assert_eq!(err, WorldError::NotFound(ObjectId::from("a")));
    }

    #[test]
    fn remove_all_clears_world() {
        let mut store = WorldStore::new();
        create_simple(&mut store, "a", sphere(1.0, 1.0), Vector3::zeros());
        create_simple(&mut store, "t", flat_terrain(4, 4), Vector3::zeros());
        store.remove_all();
        assert!(store.is_empty());
    }

    #[test]
    fn apply_config_updates_materials_and_overrides() {
        let mut store = WorldStore::new();
        create_simple(&mut store, "t1", flat_terrain(4, 4), Vector3::zeros());
        store
            .create(
                CreateParams {
                    max_speed: Some(200.0),
                    ..CreateParams::new("s1", sphere(1.0, 1.0))
                },
                &cfg(),
            )
            .unwrap();

        let mut new_cfg = cfg();
        new_cfg.terrain_restitution = 0.1;
        new_cfg.object_restitution = 0.2;
        new_cfg.friction = 0.33;
        new_cfg.linear_damping = 0.4;
        new_cfg.max_speed = 100.0;
        let touched = store.apply_config(&new_cfg);
        assert_eq!(touched, 2);

        store
            .with_object(&ObjectId::from("t1"), |access| {
                assert_relative_eq!(access.collider.restitution(), 0.1);
                assert_relative_eq!(access.collider.friction(), 0.33);
            })
            .unwrap();
        store
            .with_object(&ObjectId::from("s1"), |access| {
                assert_relative_eq!(access.collider.restitution(), 0.2);
                assert_relative_eq!(access.body.linear_damping(), 0.4);
                // Override above the new cap is pulled down to it.
                assert_eq!(*access.max_speed, Some(100.0));
            })
            .unwrap();
    }

    #[test]
    fn states_lists_everything_in_id_order() {
        let mut store = WorldStore::new();
        create_simple(&mut store, "b", sphere(1.0, 1.0), Vector3::zeros());
        create_simple(&mut store, "a", sphere(1.0, 1.0), Vector3::new(1.0, 0.0, 0.0));
        let ids: Vec<String> = store
            .states()
            .into_iter()
            .map(|(id, _)| id.to_string())
            .collect();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }
}
