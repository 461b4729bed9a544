// Transport configuration
//
// Timeouts are signed milliseconds as in JDI connector arguments: zero or
// negative waits indefinitely.

use crate::protocol::{TransportError, TransportResult, DEFAULT_HOST, DEFAULT_LISTEN_PORT};
use crate::timeout;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Host used when an address is a bare port
    pub default_host: String,
    /// Port used when listening without an address
    pub default_listen_port: u16,
    pub attach_timeout_ms: i64,
    pub handshake_timeout_ms: i64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            default_host: DEFAULT_HOST.to_string(),
            default_listen_port: DEFAULT_LISTEN_PORT,
            attach_timeout_ms: 0,
            handshake_timeout_ms: 0,
        }
    }
}

impl TransportConfig {
    pub fn from_json_str(json: &str) -> TransportResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| TransportError::Config(format!("Invalid transport config: {}", e)))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> TransportResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn attach_timeout(&self) -> Duration {
        timeout::from_millis(self.attach_timeout_ms)
    }

    pub fn handshake_timeout(&self) -> Duration {
        timeout::from_millis(self.handshake_timeout_ms)
    }
}
