//! Minimal runtime configuration helpers.
//! Without `HUE_IP` the service runs in dry-run mode and only logs commands.

use crate::services::transition::DEFAULT_TRANSITION_MS;
use http::uri::Authority;
use std::time::Duration;

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Host (and optional port) of the bridge.
    pub authority: Authority,
    /// Whitelisted API user on the bridge.
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bridge: Option<BridgeConfig>,
    pub request_timeout: Duration,
    /// Transition length used when a luminaire update does not specify one.
    pub default_transition_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bridge = match non_empty("HUE_IP") {
            Some(host) => {
                let authority = host
                    .parse::<Authority>()
                    .map_err(|e| format!("HUE_IP is not a valid host[:port] ({}): {}", host, e))?;
                let username = non_empty("HUE_USERNAME")
                    .or_else(|| non_empty("USERNAME"))
                    .ok_or_else(|| "HUE_IP is set but HUE_USERNAME (or USERNAME) is missing".to_string())?;
                Some(BridgeConfig { authority, username })
            }
            None => None,
        };

        let request_timeout_ms = parse_u64(non_empty("REQUEST_TIMEOUT_MS"), "REQUEST_TIMEOUT_MS")?
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);
        let default_transition_ms =
            parse_u64(non_empty("DEFAULT_TRANSITION_MS"), "DEFAULT_TRANSITION_MS")?.unwrap_or(DEFAULT_TRANSITION_MS);

        Ok(Config {
            bridge,
            request_timeout: Duration::from_millis(request_timeout_ms),
            default_transition_ms,
        })
    }
}

fn parse_u64(value: Option<String>, key: &str) -> Result<Option<u64>, String> {
    value
        .map(|v| v.parse::<u64>().map_err(|_| format!("{} must be a non-negative integer, got {:?}", key, v)))
        .transpose()
}
