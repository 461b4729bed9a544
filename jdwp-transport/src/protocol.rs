// JDWP transport protocol definitions and error types
//
// Reference: https://docs.oracle.com/javase/8/docs/technotes/guides/jpda/jdwp-spec.html
//
// Only the handshake is handled at this layer. Command/reply packet framing is
// built on top of an established connection.

use crate::address::AddressError;
use std::time::Duration;
use thiserror::Error;

pub type TransportResult<T> = Result<T, TransportError>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid handshake")]
    InvalidHandshake,

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Timed out after {0:?} waiting for a connection")]
    ConnectTimeout(Duration),

    #[error("Handshake did not complete within {0:?}")]
    HandshakeTimeout(Duration),

    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] AddressError),

    #[error("Not listening on {0}")]
    NotListening(String),
}

impl TransportError {
    /// True for both connect and handshake timeouts
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            TransportError::ConnectTimeout(_) | TransportError::HandshakeTimeout(_)
        )
    }
}

// JDWP handshake string, sent and expected verbatim with no length prefix
pub const JDWP_HANDSHAKE: &[u8] = b"JDWP-Handshake";

// Used by start_listening when no address is supplied
pub const DEFAULT_LISTEN_PORT: u16 = 8888;

pub const DEFAULT_HOST: &str = "localhost";
