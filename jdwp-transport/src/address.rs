// Transport address parsing
//
// ADDRESS := PORT | HOST ":" PORT

use std::fmt;
use std::num::ParseIntError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AddressError {
    #[error("invalid port {port:?}: {source}")]
    InvalidPort {
        port: String,
        #[source]
        source: ParseIntError,
    },

    #[error("empty host in {0:?}")]
    EmptyHost(String),

    #[error("host must not contain ':' in {0:?}")]
    TooManyColons(String),
}

/// A parsed `host:port` pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    pub host: String,
    pub port: u16,
}

impl Address {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse `"host:port"` or a bare `"port"`, filling in `default_host` for the latter
    pub fn parse(address: &str, default_host: &str) -> Result<Self, AddressError> {
        let (host, port) = match address.split_once(':') {
            Some((host, port)) => {
                if port.contains(':') {
                    return Err(AddressError::TooManyColons(address.to_string()));
                }
                if host.is_empty() {
                    return Err(AddressError::EmptyHost(address.to_string()));
                }
                (host, port)
            }
            None => (default_host, address),
        };

        let port = port.parse::<u16>().map_err(|source| AddressError::InvalidPort {
            port: port.to_string(),
            source,
        })?;

        Ok(Self::new(host, port))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
