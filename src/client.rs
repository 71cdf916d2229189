//! Blocking HTTP gateway for the ventilation/heating controller.
//!
//! - Uses `ureq` (no async), one agent shared by every caller.
//! - `GET {base}/readings` and `GET {base}/settings` return JSON snapshots.
//! - `PUT {base}/settings` takes a sparse JSON patch; keys that are absent are untouched.

use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::gateway::{Gateway, GatewayError};
use crate::models::device::{Readings, Settings};

pub struct HttpGateway {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        HttpGateway {
            agent: config.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let mut res = self
            .agent
            .get(&self.url(path))
            .header("Accept", "application/json")
            .call()?;
        let body = res.body_mut().read_to_string()?;
        check_status(res.status(), &body)?;
        decode(&body)
    }

    fn put_json(&self, path: &str, payload: &Settings) -> Result<(), GatewayError> {
        let mut res = self
            .agent
            .put(&self.url(path))
            .header("Accept", "application/json")
            .send_json(payload)?;
        let body = res
            .body_mut()
            .read_to_string()
            .unwrap_or_else(|_| String::from("<no body>"));
        check_status(res.status(), &body)
    }
}

fn check_status(status: http::StatusCode, body: &str) -> Result<(), GatewayError> {
    if status.is_success() {
        Ok(())
    } else {
        let message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("<no body>").to_string()
        } else {
            body.trim().to_string()
        };
        Err(GatewayError::Http { status, message })
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, GatewayError> {
    let de = &mut serde_json::Deserializer::from_str(body);
    Ok(serde_path_to_error::deserialize(de)?)
}

impl Gateway for HttpGateway {
    fn fetch_readings(&self) -> Result<Readings, GatewayError> {
        self.get_json("/readings")
    }

    fn fetch_settings(&self) -> Result<Settings, GatewayError> {
        self.get_json("/settings")
    }

    fn send_settings(&self, patch: &Settings) -> Result<(), GatewayError> {
        self.put_json("/settings", patch)
    }
}
