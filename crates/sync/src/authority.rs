//! The authority client: where tuning records come from.

use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use bodyspace_config::SimConfig;

use crate::SyncError;

/// Source of truth for tuning parameters.
///
/// Implementations must return an already-normalized record and must
/// respect the timeout; a slow authority is reported as an error, not
/// waited on.
pub trait ConfigAuthority: Send + Sync + 'static {
    fn fetch(&self, timeout: Duration) -> Result<SimConfig, SyncError>;

    /// Short label for log lines.
    fn describe(&self) -> String;
}

/// Fetches the config record as one JSON document over a short-lived TCP
/// connection. The field names mirror the authority's wire record, so the
/// original backend remains a valid endpoint.
pub struct TcpAuthority {
    addr: String,
}

impl TcpAuthority {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

impl ConfigAuthority for TcpAuthority {
    fn fetch(&self, timeout: Duration) -> Result<SimConfig, SyncError> {
        let addr = self
            .addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("`{}` resolved to no addresses", self.addr),
                )
            })?;
        let mut stream = TcpStream::connect_timeout(&addr, timeout)?;
        stream.set_read_timeout(Some(timeout))?;
        let mut body = String::new();
        stream.read_to_string(&mut body)?;
        let config: SimConfig = serde_json::from_str(&body)?;
        Ok(config.normalized()?)
    }

    fn describe(&self) -> String {
        self.addr.clone()
    }
}
