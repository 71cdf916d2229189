//! Read path: keep accessory state in step with the device.

use crate::attributes::{AttributeKey, Policies, ProjectionError};
use crate::gateway::{Gateway, GatewayError};
use crate::models::accessory::Value;
use crate::models::device::Snapshot;
use crate::state::AccessoryState;
use chrono::Utc;
use core::fmt;
use log::{debug, error, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub enum SyncError {
    /// Device unreachable or answered with something undecodable.
    Gateway(GatewayError),
    /// The gateway broke its contract by omitting a settings field.
    Projection(ProjectionError),
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Gateway(e) => write!(f, "gateway: {}", e),
            SyncError::Projection(e) => write!(f, "gateway contract violation: {}", e),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SyncError::Gateway(e) => Some(e),
            SyncError::Projection(e) => Some(e),
        }
    }
}

impl From<GatewayError> for SyncError {
    fn from(value: GatewayError) -> Self {
        SyncError::Gateway(value)
    }
}

impl From<ProjectionError> for SyncError {
    fn from(value: ProjectionError) -> Self {
        SyncError::Projection(value)
    }
}

pub fn fetch_snapshot(gateway: &dyn Gateway) -> Result<Snapshot, GatewayError> {
    let readings = gateway.fetch_readings()?;
    let settings = gateway.fetch_settings()?;
    Ok(Snapshot { readings, settings })
}

/// Project a snapshot onto every characteristic of the accessory. Fails as a whole if
/// any characteristic cannot be projected.
pub fn project(
    state: &AccessoryState,
    snapshot: &Snapshot,
    policies: &Policies,
) -> Result<Vec<(AttributeKey, Value)>, ProjectionError> {
    state
        .attributes()
        .map(|attr| (attr.project)(snapshot, policies).map(|v| (attr.key, v)))
        .collect()
}

/// One fetch-project-apply cycle. State is only touched once everything succeeded.
pub fn sync_once(gateway: &dyn Gateway, state: &AccessoryState, policies: &Policies) -> Result<usize, SyncError> {
    let snapshot = fetch_snapshot(gateway)?;
    let values = project(state, &snapshot, policies)?;
    state.apply(&values, Utc::now());
    Ok(values.len())
}

pub struct PollLoop {
    gateway: Arc<dyn Gateway>,
    state: Arc<AccessoryState>,
    policies: Policies,
    interval: Duration,
}

impl PollLoop {
    pub fn new(gateway: Arc<dyn Gateway>, state: Arc<AccessoryState>, policies: Policies, interval: Duration) -> Self {
        PollLoop {
            gateway,
            state,
            policies,
            interval,
        }
    }

    /// Run one cycle followed by its pause. A successful cycle sleeps for what is left of
    /// the interval; a failed one is logged and sleeps a full interval before the caller
    /// starts over.
    pub fn step(&self, sleep: &mut dyn FnMut(Duration)) -> Result<usize, SyncError> {
        let tick_start = Instant::now();
        match sync_once(self.gateway.as_ref(), &self.state, &self.policies) {
            Ok(updated) => {
                debug!("Synced {} characteristic(s) of {}", updated, self.state.name());
                // Maintain steady cadence
                let elapsed = tick_start.elapsed();
                if elapsed < self.interval {
                    sleep(self.interval - elapsed);
                }
                Ok(updated)
            }
            Err(e) => {
                match &e {
                    SyncError::Gateway(_) => warn!("Sync with device failed: {}", e),
                    SyncError::Projection(_) => error!("Sync with device failed: {}", e),
                }
                sleep(self.interval);
                Err(e)
            }
        }
    }

    /// Poll forever. There is no backoff and no failure budget: a long outage is retried
    /// every interval until the device answers again.
    pub fn run_forever(&self) {
        let mut sleep = |d: Duration| thread::sleep(d);
        let mut consecutive_failures: u64 = 0;
        loop {
            match self.step(&mut sleep) {
                Ok(_) => {
                    if consecutive_failures > 0 {
                        warn!("Sync with device recovered after {} failed attempt(s)", consecutive_failures);
                    }
                    consecutive_failures = 0;
                }
                Err(_) => consecutive_failures += 1,
            }
        }
    }

    pub fn spawn(self) -> Result<thread::JoinHandle<()>, String> {
        thread::Builder::new()
            .name("poll".to_string())
            .spawn(move || self.run_forever())
            .map_err(|e| format!("spawning poll thread failed: {}", e))
    }
}
