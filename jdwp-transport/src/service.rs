// JDWP transport service
//
// Attach to a listening VM, or listen and accept one, and hand back a
// connection once the handshake has been verified.

use crate::address::Address;
use crate::config::TransportConfig;
use crate::connection::SocketConnection;
use crate::coordinator::perform_handshake;
use crate::listen::{ListenKey, ListenRegistry};
use crate::protocol::{TransportError, TransportResult};
use crate::timeout;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

/// What timeout and connection semantics a transport supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub supports_accept_timeout: bool,
    pub supports_attach_timeout: bool,
    pub supports_handshake_timeout: bool,
    pub supports_multiple_connections: bool,
}

pub const SOCKET_CAPABILITIES: Capabilities = Capabilities {
    supports_accept_timeout: false,
    supports_attach_timeout: false,
    supports_handshake_timeout: false,
    supports_multiple_connections: false,
};

/// A transport between a debugger and a target VM.
///
/// Implementations hold per-session state and are driven through `&mut self`,
/// so calls on one instance are serialized. Use separate instances for
/// concurrent sessions.
///
/// Timeouts of `Duration::ZERO` wait indefinitely. A timeout stops the caller
/// waiting and closes the socket; it is not a hard cancellation of the
/// underlying system call.
#[allow(async_fn_in_trait)]
pub trait TransportService {
    type Connection;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn capabilities(&self) -> Capabilities;

    /// Connect to `address` (`"host:port"` or `"port"`) and perform the handshake
    async fn attach(
        &mut self,
        address: &str,
        attach_timeout: Duration,
        handshake_timeout: Duration,
    ) -> TransportResult<Self::Connection>;

    /// Bind a listen endpoint. `None` listens on the default port.
    async fn start_listening(&mut self, address: Option<&str>) -> TransportResult<ListenKey>;

    /// Wait for a peer on `key` and perform the handshake
    async fn accept(
        &mut self,
        key: &ListenKey,
        accept_timeout: Duration,
        handshake_timeout: Duration,
    ) -> TransportResult<Self::Connection>;

    /// Close the endpoint for `key`. Never fails.
    fn stop_listening(&mut self, key: &ListenKey);

    /// Tear down any held socket so the instance can be reused
    async fn close(&mut self);
}

/// TCP socket implementation of [`TransportService`]
#[derive(Debug, Default)]
pub struct SocketTransportService {
    config: TransportConfig,
    connection: Option<SocketConnection>,
    listeners: ListenRegistry,
}

impl SocketTransportService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TransportConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Connection produced by the last successful attach or accept
    pub fn connection(&self) -> Option<&SocketConnection> {
        self.connection.as_ref()
    }

    pub fn listen_key(&self) -> Option<&ListenKey> {
        self.listeners.active_key()
    }

    /// Parse `address` with the configured default host
    pub fn parse_address(&self, address: &str) -> TransportResult<Address> {
        Ok(Address::parse(address, &self.config.default_host)?)
    }

    /// Connect to `host:port` and perform the handshake
    pub async fn attach_to(
        &mut self,
        host: &str,
        port: u16,
        attach_timeout: Duration,
        handshake_timeout: Duration,
    ) -> TransportResult<SocketConnection> {
        info!("Attaching to JDWP at {}:{}", host, port);
        self.connection = None;

        let stream = await_connection(TcpStream::connect((host, port)), attach_timeout).await?;

        self.establish(stream, handshake_timeout).await
    }

    /// Listen on the configured default port
    pub async fn start_listening_default(&mut self) -> TransportResult<ListenKey> {
        self.start_listening(None).await
    }

    async fn establish(
        &mut self,
        stream: TcpStream,
        handshake_timeout: Duration,
    ) -> TransportResult<SocketConnection> {
        let (reader, writer) = stream.into_split();
        let (reader, writer) = perform_handshake(reader, writer, handshake_timeout).await?;

        let connection = SocketConnection::new(reader, writer)?;
        self.connection = Some(connection.clone());
        Ok(connection)
    }
}

/// Await a connect or accept, failing with `ConnectTimeout` past `limit`
async fn await_connection<F, T>(pending: F, limit: Duration) -> TransportResult<T>
where
    F: Future<Output = io::Result<T>>,
{
    match timeout::effective(limit) {
        None => Ok(pending.await?),
        Some(limit) => match tokio::time::timeout(limit, pending).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                warn!("No connection within {:?}", limit);
                Err(TransportError::ConnectTimeout(limit))
            }
        },
    }
}

impl TransportService for SocketTransportService {
    type Connection = SocketConnection;

    fn name(&self) -> &'static str {
        "jdwp-transport_SocketTransportService"
    }

    fn description(&self) -> &'static str {
        "jdwp-transport: Socket Implementation of TransportService"
    }

    fn capabilities(&self) -> Capabilities {
        SOCKET_CAPABILITIES
    }

    async fn attach(
        &mut self,
        address: &str,
        attach_timeout: Duration,
        handshake_timeout: Duration,
    ) -> TransportResult<SocketConnection> {
        let addr = self.parse_address(address)?;
        self.attach_to(&addr.host, addr.port, attach_timeout, handshake_timeout)
            .await
    }

    async fn start_listening(&mut self, address: Option<&str>) -> TransportResult<ListenKey> {
        let addr = match address {
            Some(address) => self.parse_address(address)?,
            None => Address::new(
                self.config.default_host.as_str(),
                self.config.default_listen_port,
            ),
        };

        let listener = TcpListener::bind((addr.host.as_str(), addr.port)).await?;
        // Port 0 asks for an ephemeral port; the key carries the real one
        let port = listener.local_addr()?.port();
        let key = ListenKey::new(&addr.host, port);

        info!("Listening for JDWP on {}", key);
        self.listeners.insert(key.clone(), listener);
        Ok(key)
    }

    async fn accept(
        &mut self,
        key: &ListenKey,
        accept_timeout: Duration,
        handshake_timeout: Duration,
    ) -> TransportResult<SocketConnection> {
        self.connection = None;

        let listener = self
            .listeners
            .get(key)
            .ok_or_else(|| TransportError::NotListening(key.to_string()))?;

        info!("Waiting for JDWP connection on {}", key);
        let (stream, peer) = await_connection(listener.accept(), accept_timeout).await?;

        info!("Accepted connection from {}", peer);
        self.establish(stream, handshake_timeout).await
    }

    fn stop_listening(&mut self, key: &ListenKey) {
        if !self.listeners.remove(key) {
            debug!("stop_listening: {} is not active", key);
        }
    }

    async fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close().await;
        }
        self.listeners.clear();
    }
}
