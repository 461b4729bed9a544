// Probe execution
//
// Runs one attach or listen/accept cycle and summarizes the connection.

use crate::cli::{resolve_timeout, Cli, Command};
use anyhow::{Context, Result};
use jdwp_transport::{Capabilities, SocketConnection, SocketTransportService, TransportService};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Attach,
    Listen,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub mode: Mode,
    pub address: String,
    pub peer: String,
    pub local: String,
    pub transport: String,
    pub capabilities: Capabilities,
}

impl ProbeReport {
    fn new(
        mode: Mode,
        address: String,
        connection: &SocketConnection,
        service: &SocketTransportService,
    ) -> Self {
        Self {
            mode,
            address,
            peer: connection.peer_addr().to_string(),
            local: connection.local_addr().to_string(),
            transport: service.name().to_string(),
            capabilities: service.capabilities(),
        }
    }
}

pub async fn run(cli: Cli) -> Result<ProbeReport> {
    let config = cli.load_config()?;
    let mut service = SocketTransportService::with_config(config.clone());

    match cli.command {
        Command::Attach {
            address,
            attach_timeout,
            handshake_timeout,
        } => {
            let connection = service
                .attach(
                    &address,
                    resolve_timeout(attach_timeout, config.attach_timeout()),
                    resolve_timeout(handshake_timeout, config.handshake_timeout()),
                )
                .await
                .with_context(|| format!("failed to attach to {}", address))?;

            info!("Attached to {}", connection.peer_addr());
            let report = ProbeReport::new(Mode::Attach, address, &connection, &service);
            service.close().await;
            Ok(report)
        }
        Command::Listen {
            address,
            accept_timeout,
            handshake_timeout,
        } => {
            let key = service
                .start_listening(address.as_deref())
                .await
                .context("failed to start listening")?;

            let accepted = service
                .accept(
                    &key,
                    resolve_timeout(accept_timeout, config.attach_timeout()),
                    resolve_timeout(handshake_timeout, config.handshake_timeout()),
                )
                .await;
            service.stop_listening(&key);
            let connection =
                accepted.with_context(|| format!("failed to accept on {}", key))?;

            info!("Accepted {}", connection.peer_addr());
            let report =
                ProbeReport::new(Mode::Listen, key.address().to_string(), &connection, &service);
            service.close().await;
            Ok(report)
        }
    }
}
