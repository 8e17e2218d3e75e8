use std::sync::Arc;

use parking_lot::RwLock;

use crate::SimConfig;

/// Shared handle to the active simulation config.
///
/// Reads clone the whole record out under a read lock, so a reader can
/// never observe a mix of old and new fields; writes replace the record
/// wholesale. Cloning the store clones the handle, not the config.
#[derive(Clone)]
pub struct ConfigStore {
    inner: Arc<RwLock<SimConfig>>,
}

impl ConfigStore {
    pub fn new(config: SimConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// A consistent snapshot of the active config.
    pub fn snapshot(&self) -> SimConfig {
        self.inner.read().clone()
    }

    /// Atomically replace the active config, returning the previous record.
    pub fn replace(&self, config: SimConfig) -> SimConfig {
        std::mem::replace(&mut *self.inner.write(), config)
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}
