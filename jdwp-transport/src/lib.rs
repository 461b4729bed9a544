// JDWP transport library
//
// Establishes a debugging connection between a debugger and a target VM:
// - Attach to a listening VM, or listen and accept one
// - Timed JDWP handshake
// - Raw byte connection for packet traffic layered above

pub mod address;
pub mod config;
pub mod connection;
pub mod coordinator;
pub mod handshake;
pub mod listen;
pub mod protocol;
pub mod service;
pub mod timeout;

pub use address::{Address, AddressError};
pub use config::TransportConfig;
pub use connection::SocketConnection;
pub use listen::ListenKey;
pub use protocol::{TransportError, TransportResult, JDWP_HANDSHAKE};
pub use service::{Capabilities, SocketTransportService, TransportService};
