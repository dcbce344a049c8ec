//! Blocking HTTP client for the bridge's light state endpoint.
//!
//! - Uses `ureq` (no async) with a single global timeout per request.
//! - Only `PUT /api/<user>/lights/<id>/state` is implemented; discovery,
//!   pairing and retries are left to other tools.
//! - The bridge answers 200 even for rejected writes, so the response body is
//!   inspected for `error` entries.

use crate::models::state::{DeviceId, FieldMap};
use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug)]
pub enum BridgeError {
    Transport(String),
    Timeout,
    Http { status: u16, message: String },
    Json(serde_json::Error),
    Api { kind: i64, address: String, description: String },
}

impl core::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BridgeError::Transport(s) => write!(f, "transport error: {}", s),
            BridgeError::Timeout => write!(f, "request timed out"),
            BridgeError::Http { status, message } => write!(f, "http {}: {}", status, message),
            BridgeError::Json(e) => write!(f, "json error: {}", e),
            BridgeError::Api {
                kind,
                address,
                description,
            } => write!(f, "bridge error {} at {}: {}", kind, address, description),
        }
    }
}

impl std::error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BridgeError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(value: serde_json::Error) -> Self {
        BridgeError::Json(value)
    }
}

impl From<ureq::Error> for BridgeError {
    fn from(value: ureq::Error) -> Self {
        match value {
            ureq::Error::StatusCode(status) => BridgeError::Http {
                status,
                message: "request rejected".to_string(),
            },
            ureq::Error::Timeout(_) => BridgeError::Timeout,
            ureq::Error::Json(e) => BridgeError::Json(e),
            other => BridgeError::Transport(other.to_string()),
        }
    }
}

/// Delivery of device commands. Implementations own their timeout and retry policy.
pub trait DeviceTransport {
    fn send(&self, device_id: &DeviceId, fields: &FieldMap) -> Result<(), BridgeError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum BridgeResult {
    Success(Value),
    Error(BridgeApiError),
}

#[derive(Debug, Deserialize)]
struct BridgeApiError {
    #[serde(rename = "type")]
    kind: i64,
    #[serde(default)]
    address: String,
    #[serde(default)]
    description: String,
}

pub struct BridgeClient {
    agent: ureq::Agent,
    base_url: String,
}

impl BridgeClient {
    pub fn new(authority: &http::uri::Authority, username: &str, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        BridgeClient {
            agent,
            base_url: format!("http://{}/api/{}", authority, username),
        }
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn put_json(&self, path: &str, body: &FieldMap) -> Result<Vec<BridgeResult>, BridgeError> {
        let url = self.url(path);
        let mut resp = self
            .agent
            .put(&url)
            .header("Accept", "application/json")
            .send_json(body)?;
        let text = resp.body_mut().read_to_string()?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl DeviceTransport for BridgeClient {
    fn send(&self, device_id: &DeviceId, fields: &FieldMap) -> Result<(), BridgeError> {
        info!("Sending light state to {}: {}", device_id, fields);
        let results = self.put_json(&format!("/lights/{}/state", device_id.0), fields)?;
        check_results(results)
    }
}

fn check_results(results: Vec<BridgeResult>) -> Result<(), BridgeError> {
    for result in results {
        match result {
            BridgeResult::Success(v) => debug!("Bridge accepted {}", v),
            BridgeResult::Error(e) => {
                return Err(BridgeError::Api {
                    kind: e.kind,
                    address: e.address,
                    description: e.description,
                });
            }
        }
    }
    Ok(())
}

/// Transport used when no bridge is configured: commands are only logged.
#[derive(Debug, Default)]
pub struct DryRunTransport;

impl DeviceTransport for DryRunTransport {
    fn send(&self, device_id: &DeviceId, fields: &FieldMap) -> Result<(), BridgeError> {
        info!("Dry run, not sending to {}: {}", device_id, fields);
        Ok(())
    }
}
