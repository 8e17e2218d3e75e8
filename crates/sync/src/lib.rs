//! Configuration synchronization with the external authority.
//!
//! At startup the server pulls the tuning record once with a bounded
//! timeout and falls back to the built-in defaults when the authority is
//! unreachable; either way it comes up fully operational. A background
//! task then refreshes the record on an interval and propagates changes
//! to the live world. Refresh failures are logged and skipped, never
//! escalated.

mod authority;
mod refresh;

pub use authority::{ConfigAuthority, TcpAuthority};
pub use refresh::ConfigSync;

use std::time::Duration;

use bodyspace_config::{ConfigError, ConfigStore, SimConfig};

/// Default authority endpoint.
pub const DEFAULT_AUTHORITY_ADDR: &str = "localhost:8080";

/// Timeout for the one-shot startup fetch.
pub const STARTUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Interval between periodic refresh fetches.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// Errors from one authority fetch. All of these are recoverable: the
/// caller keeps its current config (or the defaults) and tries again
/// later.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("authority i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("authority record could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("authority record is invalid: {0}")]
    Invalid(#[from] ConfigError),
}

/// One-shot startup fetch. Installs the authority's record on success;
/// installs the defaults and logs the fallback otherwise. Returns whether
/// the authority was reachable.
pub fn bootstrap(
    authority: &dyn ConfigAuthority,
    configs: &ConfigStore,
    timeout: Duration,
) -> bool {
    match authority.fetch(timeout) {
        Ok(config) => {
            configs.replace(config);
            tracing::info!(authority = %authority.describe(), "installed config from authority");
            true
        }
        Err(err) => {
            configs.replace(SimConfig::default());
            tracing::warn!(
                authority = %authority.describe(),
                %err,
                "authority unreachable at startup, falling back to defaults"
            );
            false
        }
    }
}
