//! Free-port discovery for server tasks.
//!
//! Dev servers get a port resolved before they are spawned. The probe binds
//! a throwaway listener, releases it, and hands the port number to the spawn
//! path; the gap between release and the server's own bind is a known,
//! accepted race.

use thiserror::Error;
use tokio::net::TcpListener;

/// First port probed when a server task does not configure one.
pub const DEFAULT_BASE_PORT: u16 = 3000;
/// Probe attempts before a scan gives up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 15;

/// The probe range was exhausted without finding a free port.
#[derive(Debug, Error)]
#[error("no free port after {attempts} attempts starting at {start}")]
pub struct NoPortAvailable {
    pub start: u16,
    pub attempts: u32,
}

/// Finds the first port at or above `start` that accepts a local bind.
///
/// Each call probes independently, so concurrent scans for unrelated tasks
/// never share state; they may hand out the same port, which the losing
/// server reports as a bind failure.
pub async fn find_available_port(start: u16, max_attempts: u32) -> Result<u16, NoPortAvailable> {
    for offset in 0..max_attempts {
        let Some(port) = (offset as u16).checked_add(start) else {
            break;
        };
        match TcpListener::bind(("127.0.0.1", port)).await {
            Ok(listener) => {
                drop(listener);
                return Ok(port);
            }
            Err(err) => {
                tracing::trace!(port, %err, "port probe failed");
            }
        }
    }
    Err(NoPortAvailable {
        start,
        attempts: max_attempts,
    })
}
