//! The loop thread: serve requests, advance, clamp, sanitize, pace.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use bodyspace_config::ConfigStore;
use bodyspace_world::WorldStore;

use crate::{LoopPhase, SimHandle, SimRequest};

/// Interval of the periodic world-size heartbeat log.
const HEARTBEAT: Duration = Duration::from_secs(1);

/// Owner of the background simulation thread.
///
/// Dropping the owner (or calling [`SimLoop::shutdown`]) raises the
/// shutdown flag and joins the thread, guaranteeing the world's engine
/// resources are released before the owner proceeds.
pub struct SimLoop {
    handle: SimHandle,
    shutdown: Arc<AtomicBool>,
    phase: Arc<AtomicU8>,
    thread: Option<JoinHandle<()>>,
}

impl SimLoop {
    /// Start the loop, taking exclusive ownership of the world.
    pub fn spawn(store: WorldStore, configs: ConfigStore) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        let phase = Arc::new(AtomicU8::new(LoopPhase::Idle as u8));
        let thread = std::thread::Builder::new().name("bodyspace-sim".into()).spawn({
            let shutdown = Arc::clone(&shutdown);
            let phase = Arc::clone(&phase);
            move || run(store, configs, rx, shutdown, phase)
        })?;
        Ok(Self {
            handle: SimHandle { tx },
            shutdown,
            phase,
            thread: Some(thread),
        })
    }

    /// A cloneable handle for submitting requests.
    pub fn handle(&self) -> SimHandle {
        self.handle.clone()
    }

    pub fn phase(&self) -> LoopPhase {
        LoopPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Cooperative shutdown: raise the flag and join the thread.
    pub fn shutdown(self) {
        // Drop does the work; this name just marks the intent at call sites.
    }

    fn stop_and_join(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for SimLoop {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn run(
    mut store: WorldStore,
    configs: ConfigStore,
    rx: Receiver<SimRequest>,
    shutdown: Arc<AtomicBool>,
    phase: Arc<AtomicU8>,
) {
    phase.store(LoopPhase::Running as u8, Ordering::Release);
    tracing::info!("simulation loop started");

    let mut last = Instant::now();
    let mut last_heartbeat = Instant::now();
    while !shutdown.load(Ordering::Acquire) {
        let config = configs.snapshot();
        let deadline = last + config.frame_interval();

        // Serve requests for the remainder of the frame so commands are
        // handled promptly without disturbing the tick cadence.
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            match rx.recv_timeout(deadline - now) {
                Ok(request) => serve(&mut store, &configs, request),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    // Every handle is gone; keep ticking until shutdown.
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if !remaining.is_zero() {
                        std::thread::sleep(remaining);
                    }
                    break;
                }
            }
        }

        let now = Instant::now();
        let elapsed = (now - last).as_secs_f32();
        last = now;
        let report = store.advance(elapsed, &config);

        if last_heartbeat.elapsed() >= HEARTBEAT {
            last_heartbeat = now;
            tracing::debug!(
                objects = store.len(),
                substeps = report.substeps,
                clamped = report.speed_clamped,
                "tick heartbeat"
            );
        }
    }

    phase.store(LoopPhase::Stopping as u8, Ordering::Release);
    store.remove_all();
    phase.store(LoopPhase::Stopped as u8, Ordering::Release);
    tracing::info!("simulation loop stopped");
}

fn serve(store: &mut WorldStore, configs: &ConfigStore, request: SimRequest) {
    // A requester that hung up is not an error worth failing the loop for;
    // replies are sent best-effort.
    match request {
        SimRequest::Create { params, reply } => {
            let config = configs.snapshot();
            let _ = reply.send(store.create(params, &config));
        }
        SimRequest::Destroy { id, reply } => {
            let _ = reply.send(store.destroy(&id));
        }
        SimRequest::Impulse {
            id,
            impulse,
            point,
            reply,
        } => {
            let cap = configs.snapshot().max_impulse_magnitude;
            let _ = reply.send(store.apply_impulse(&id, impulse, point, cap));
        }
        SimRequest::Torque { id, torque, reply } => {
            let _ = reply.send(store.apply_torque(&id, torque));
        }
        SimRequest::SetMass { id, mass, reply } => {
            let _ = reply.send(store.set_mass(&id, mass));
        }
        SimRequest::SetRadius { id, radius, reply } => {
            let _ = reply.send(store.set_radius(&id, radius));
        }
        SimRequest::Update { id, update, reply } => {
            let _ = reply.send(store.update_kinematics(&id, update));
        }
        SimRequest::State { id, reply } => {
            let _ = reply.send(store.state(&id));
        }
        SimRequest::Step { dt, reply } => {
            let config = configs.snapshot();
            let elapsed = dt.unwrap_or_else(|| config.fixed_dt());
            let report = store.advance(elapsed, &config);
            let _ = reply.send((report, store.states()));
        }
        SimRequest::ApplyConfig { reply } => {
            let config = configs.snapshot();
            let _ = reply.send(store.apply_config(&config));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CreateParams, SimError};
    use bodyspace_common::ObjectId;
    use bodyspace_world::{MaterialParams, ShapeSpec, WorldError};
    use nalgebra::Vector3;

    fn sphere(radius: f32, mass: f32) -> ShapeSpec {
        ShapeSpec::Sphere {
            radius,
            mass,
            material: MaterialParams::default(),
        }
    }

    fn started() -> SimLoop {
        SimLoop::spawn(WorldStore::new(), ConfigStore::default()).unwrap()
    }

    #[test]
    fn loop_reports_running_phase() {
        let sim = started();
        // The thread flips to Running almost immediately after spawn.
        for _ in 0..100 {
            if sim.phase() == LoopPhase::Running {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(sim.phase(), LoopPhase::Running);
    }

    #[test]
    fn background_ticking_advances_the_world() {
        let sim = started();
        let handle = sim.handle();
        handle
            .create_object(
                CreateParams::new("faller", sphere(1.0, 1.0))
                    .at(Vector3::new(0.0, 50.0, 0.0)),
            )
            .unwrap();
        std::thread::sleep(Duration::from_millis(250));
        let state = handle.object_state(ObjectId::from("faller")).unwrap();
        assert!(state.position.y < 50.0, "loop did not tick: {state:?}");
        assert!(state.linear_velocity.y < 0.0);
    }

    #[test]
    fn manual_step_returns_full_snapshot() {
        let sim = started();
        let handle = sim.handle();
        handle
            .create_object(CreateParams::new("a", sphere(1.0, 1.0)))
            .unwrap();
        handle
            .create_object(CreateParams::new("b", sphere(1.0, 0.0)))
            .unwrap();
        let (report, states) = handle.step(Some(1.0 / 60.0)).unwrap();
        assert!(report.substeps >= 1);
        assert_eq!(states.len(), 2);
    }

    #[test]
    fn unknown_object_surfaces_world_error() {
        let sim = started();
        let handle = sim.handle();
        let err = handle
            .apply_impulse(ObjectId::from("ghost"), Vector3::new(1.0, 0.0, 0.0), None)
            .unwrap_err();
        assert!(matches!(
            err,
            SimError::World(WorldError::NotFound(id)) if id == ObjectId::from("ghost")
        ));
    }

    #[test]
    fn shutdown_joins_and_kills_the_channel() {
        let sim = started();
        let handle = sim.handle();
        handle
            .create_object(CreateParams::new("a", sphere(1.0, 1.0)))
            .unwrap();
        sim.shutdown();
        let err = handle.object_state(ObjectId::from("a")).unwrap_err();
        assert!(matches!(err, SimError::LoopGone));
    }

    #[test]
    fn drop_is_equivalent_to_shutdown() {
        let handle = {
            let sim = started();
            sim.handle()
        };
        assert!(matches!(
            handle.step(None).unwrap_err(),
            SimError::LoopGone
        ));
    }
}
