// Listen endpoint tracking
//
// A service instance listens on at most one endpoint at a time. The key handed
// out by start_listening is the only way to reach the bound listener again.

use std::fmt;
use tokio::net::TcpListener;
use tracing::{debug, warn};

/// Opaque handle identifying a bound listen endpoint as `host:port`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListenKey {
    address: String,
}

impl ListenKey {
    pub(crate) fn new(host: &str, port: u16) -> Self {
        Self {
            address: format!("{}:{}", host, port),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Port component of the address
    pub fn port(&self) -> Option<u16> {
        self.address
            .rsplit_once(':')
            .and_then(|(_, port)| port.parse().ok())
    }
}

impl fmt::Display for ListenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

#[derive(Debug, Default)]
pub struct ListenRegistry {
    active: Option<(ListenKey, TcpListener)>,
}

impl ListenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `listener` under `key`, closing any previous listener
    pub fn insert(&mut self, key: ListenKey, listener: TcpListener) {
        if let Some((old, _)) = self.active.replace((key, listener)) {
            warn!("Replacing active listener on {}", old);
        }
    }

    pub fn get(&self, key: &ListenKey) -> Option<&TcpListener> {
        match &self.active {
            Some((active, listener)) if active == key => Some(listener),
            _ => None,
        }
    }

    /// Stop tracking `key`; dropping the listener closes the socket
    pub fn remove(&mut self, key: &ListenKey) -> bool {
        if self.get(key).is_none() {
            return false;
        }
        self.active = None;
        debug!("Stopped listening on {}", key);
        true
    }

    pub fn clear(&mut self) {
        if let Some((key, _)) = self.active.take() {
            debug!("Stopped listening on {}", key);
        }
    }

    pub fn active_key(&self) -> Option<&ListenKey> {
        self.active.as_ref().map(|(key, _)| key)
    }
}
