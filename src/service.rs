// Transport bootstrap.
//
// Optionally launches the local API service the client talks to and keeps
// it alive for the whole run. The guard stops the service exactly once,
// through `ServiceGuard::close` or on drop.

use crate::error::ServiceError;
use crate::ui::Pause;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tracing::{info, warn};

pub struct ServiceGuard {
    child: Option<Child>,
    command: String,
}

impl ServiceGuard {
    /// A guard that owns nothing, for runs against an already running API.
    pub fn detached() -> Self {
        ServiceGuard {
            child: None,
            command: String::new(),
        }
    }

    /// Spawn `command` (whitespace separated program and arguments) and
    /// wait `warmup` for it to come up. No health check is made.
    pub fn start(
        command: Option<&str>,
        warmup: Duration,
        pause: &mut impl Pause,
    ) -> Result<Self, ServiceError> {
        let Some(command) = command else {
            return Ok(Self::detached());
        };
        let mut parts = command.split_whitespace();
        let program = parts.next().ok_or(ServiceError::EmptyCommand)?;

        let child = Command::new(program)
            .args(parts)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|source| ServiceError::Spawn {
                command: command.to_string(),
                source,
            })?;
        info!(pid = child.id(), command, "API service started");

        let guard = ServiceGuard {
            child: Some(child),
            command: command.to_string(),
        };
        if !warmup.is_zero() {
            pause.pause(warmup, "Waiting for the API service");
        }
        Ok(guard)
    }

    #[cfg(test)]
    fn is_running(&self) -> bool {
        self.child.is_some()
    }

    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        if let Err(e) = child.kill() {
            // Already exited on its own.
            warn!(command = %self.command, "could not stop API service: {e}");
        }
        match child.wait() {
            Ok(status) => info!(%status, "API service stopped"),
            Err(e) => warn!("waiting for API service failed: {e}"),
        }
    }
}

impl Drop for ServiceGuard {
    fn drop(&mut self) {
        self.shutdown();
    }
}
