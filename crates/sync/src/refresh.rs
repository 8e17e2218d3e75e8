//! The periodic refresh task.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use bodyspace_config::ConfigStore;
use bodyspace_sim::SimHandle;

use crate::ConfigAuthority;

/// Owner of the background refresh thread.
///
/// Each cycle fetches the authority's record with a bounded timeout; on
/// success the record atomically replaces the active config and the live
/// world is told to re-apply it (which also reconciles per-object
/// max-speed overrides). Failures are logged and skipped.
pub struct ConfigSync {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl ConfigSync {
    pub fn spawn(
        authority: Arc<dyn ConfigAuthority>,
        configs: ConfigStore,
        sim: SimHandle,
        interval: Duration,
        timeout: Duration,
    ) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel();
        let thread = std::thread::Builder::new()
            .name("bodyspace-sync".into())
            .spawn(move || run(authority, configs, sim, interval, timeout, stop_rx))?;
        Ok(Self {
            stop: Some(stop_tx),
            thread: Some(thread),
        })
    }

    /// Cooperative shutdown: signal the thread and join it.
    pub fn shutdown(self) {
        // Drop does the work; this name just marks the intent at call sites.
    }

    fn stop_and_join(&mut self) {
        self.stop.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for ConfigSync {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn run(
    authority: Arc<dyn ConfigAuthority>,
    configs: ConfigStore,
    sim: SimHandle,
    interval: Duration,
    timeout: Duration,
    stop: Receiver<()>,
) {
    tracing::info!(authority = %authority.describe(), ?interval, "config sync started");
    loop {
        match stop.recv_timeout(interval) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
        match authority.fetch(timeout) {
            Ok(config) => {
                configs.replace(config);
                match sim.apply_config() {
                    Ok(touched) => {
                        tracing::debug!(touched, "refreshed config from authority");
                    }
                    Err(_) => {
                        tracing::warn!("simulation loop is gone, stopping config sync");
                        break;
                    }
                }
            }
            Err(err) => {
                tracing::warn!(%err, "config refresh failed, keeping current config");
            }
        }
    }
    tracing::info!("config sync stopped");
}
