//! Device gateway seam.
//!
//! The controller's register encoding lives behind this trait. The bridge only needs a
//! readings snapshot, a settings snapshot and a way to push a sparse settings patch.

use crate::models::device::{Readings, Settings};
use std::sync::{Mutex, PoisonError};

#[derive(Debug)]
pub enum GatewayError {
    Transport(String),
    Http { status: http::StatusCode, message: String },
    /// Response body did not match the expected shape; carries the JSON path.
    Decode(String),
    Unavailable(String),
}

impl core::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            GatewayError::Transport(s) => write!(f, "transport error: {}", s),
            GatewayError::Http { status, message } => write!(f, "http {}: {}", status, message),
            GatewayError::Decode(s) => write!(f, "decode error: {}", s),
            GatewayError::Unavailable(s) => write!(f, "device unavailable: {}", s),
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<ureq::Error> for GatewayError {
    fn from(value: ureq::Error) -> Self {
        GatewayError::Transport(value.to_string())
    }
}

impl From<serde_path_to_error::Error<serde_json::Error>> for GatewayError {
    fn from(value: serde_path_to_error::Error<serde_json::Error>) -> Self {
        GatewayError::Decode(value.to_string())
    }
}

pub trait Gateway: Send + Sync {
    fn fetch_readings(&self) -> Result<Readings, GatewayError>;
    fn fetch_settings(&self) -> Result<Settings, GatewayError>;
    /// Apply `patch`; fields absent from it are left as they are on the device.
    fn send_settings(&self, patch: &Settings) -> Result<(), GatewayError>;
}

/// Runs every call of the inner gateway under one lock, for non-reentrant transports.
pub struct Serialized<G> {
    inner: G,
    lock: Mutex<()>,
}

impl<G: Gateway> Serialized<G> {
    pub fn new(inner: G) -> Self {
        Serialized {
            inner,
            lock: Mutex::new(()),
        }
    }

    fn exclusive<T>(&self, call: impl FnOnce(&G) -> T) -> T {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        call(&self.inner)
    }
}

impl<G: Gateway> Gateway for Serialized<G> {
    fn fetch_readings(&self) -> Result<Readings, GatewayError> {
        self.exclusive(|g| g.fetch_readings())
    }

    fn fetch_settings(&self) -> Result<Settings, GatewayError> {
        self.exclusive(|g| g.fetch_settings())
    }

    fn send_settings(&self, patch: &Settings) -> Result<(), GatewayError> {
        self.exclusive(|g| g.send_settings(patch))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingGateway;
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    /// Records how many calls were ever in flight at the same time.
    #[derive(Default)]
    struct OverlapGateway {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl OverlapGateway {
        fn enter(&self) {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl Gateway for OverlapGateway {
        fn fetch_readings(&self) -> Result<Readings, GatewayError> {
            self.enter();
            Err(GatewayError::Unavailable("readings not simulated".into()))
        }

        fn fetch_settings(&self) -> Result<Settings, GatewayError> {
            self.enter();
            Ok(Settings::default())
        }

        fn send_settings(&self, _patch: &Settings) -> Result<(), GatewayError> {
            self.enter();
            Ok(())
        }
    }

    fn hammer<G: Gateway + 'static>(gw: Arc<G>) {
        let threads = 6;
        let barrier = Arc::new(Barrier::new(threads));
        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let gw = Arc::clone(&gw);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    match i % 3 {
                        0 => drop(gw.fetch_readings()),
                        1 => drop(gw.fetch_settings()),
                        _ => drop(gw.send_settings(&Settings::default())),
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread");
        }
    }

    #[test]
    fn serialized_never_overlaps_calls() {
        let gw = Arc::new(Serialized::new(OverlapGateway::default()));
        hammer(Arc::clone(&gw));
        assert_eq!(gw.inner.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unwrapped_gateway_does_overlap() {
        let gw = Arc::new(OverlapGateway::default());
        hammer(Arc::clone(&gw));
        assert!(gw.max_in_flight.load(Ordering::SeqCst) > 1);
    }

    #[test]
    fn serialized_passes_calls_through() {
        let gw = Serialized::new(RecordingGateway::from_fixtures());
        let patch = Settings {
            desired_room_temperature: Some(230),
            ..Settings::default()
        };
        gw.send_settings(&patch).expect("send");
        assert_eq!(gw.fetch_settings().expect("fetch").desired_room_temperature, Some(230));
        assert_eq!(gw.fetch_readings().expect("fetch").room_temperature, 214);
        assert_eq!(gw.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn serialized_is_shareable_across_threads() {
        let gw = Arc::new(Serialized::new(RecordingGateway::from_fixtures()));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let gw = Arc::clone(&gw);
                thread::spawn(move || {
                    let patch = Settings {
                        desired_dhw_temperature: Some(400 + i),
                        ..Settings::default()
                    };
                    gw.send_settings(&patch).expect("send");
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread");
        }
        assert_eq!(gw.inner.sent().len(), 8);
    }

    #[test]
    fn decode_errors_keep_the_path() {
        let body = r#"{"outdoorTemperature": 10, "roomTemperature": "warm"}"#;
        let de = &mut serde_json::Deserializer::from_str(body);
        let err: GatewayError = serde_path_to_error::deserialize::<_, Readings>(de).unwrap_err().into();
        assert!(err.to_string().contains("roomTemperature"), "{}", err);
    }
}
