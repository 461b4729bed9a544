// JDWP socket connection
//
// Raw byte transport over a socket that has completed the handshake. Packet
// framing is layered on top by the caller.

use crate::protocol::{TransportError, TransportResult};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info};

/// Handle to an established connection.
///
/// Clones share the same socket. `close` is idempotent and may be called while
/// another task is blocked in `read` or `write_all`; the blocked call then
/// fails with `ConnectionClosed`.
#[derive(Debug, Clone)]
pub struct SocketConnection {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    reader: Mutex<Option<OwnedReadHalf>>,
    writer: Mutex<Option<OwnedWriteHalf>>,
    closed: watch::Sender<bool>,
    peer_addr: SocketAddr,
    local_addr: SocketAddr,
}

impl SocketConnection {
    /// Wrap the halves of a socket whose handshake has been verified
    pub(crate) fn new(reader: OwnedReadHalf, writer: OwnedWriteHalf) -> TransportResult<Self> {
        let peer_addr = reader.peer_addr()?;
        let local_addr = reader.local_addr()?;
        let (closed, _) = watch::channel(false);

        debug!("Connection established {} -> {}", local_addr, peer_addr);

        Ok(Self {
            inner: Arc::new(Inner {
                reader: Mutex::new(Some(reader)),
                writer: Mutex::new(Some(writer)),
                closed,
                peer_addr,
                local_addr,
            }),
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.inner.peer_addr
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.inner.local_addr
    }

    pub fn is_open(&self) -> bool {
        !*self.inner.closed.borrow()
    }

    /// Read available bytes into `buf`. Returns 0 at end of stream.
    pub async fn read(&self, buf: &mut [u8]) -> TransportResult<usize> {
        let closed = self.closed_signal()?;

        tokio::select! {
            biased;
            _ = wait_closed(closed) => Err(TransportError::ConnectionClosed),
            result = self.read_locked(buf) => result,
        }
    }

    /// Write all of `buf` and flush
    pub async fn write_all(&self, buf: &[u8]) -> TransportResult<()> {
        let closed = self.closed_signal()?;

        tokio::select! {
            biased;
            _ = wait_closed(closed) => Err(TransportError::ConnectionClosed),
            result = self.write_locked(buf) => result,
        }
    }

    /// Shut down both directions. Later calls are no-ops.
    pub async fn close(&self) {
        if self.inner.closed.send_replace(true) {
            return;
        }

        // In-flight reads and writes see the signal and release their locks
        if let Some(mut writer) = self.inner.writer.lock().await.take() {
            if let Err(e) = writer.shutdown().await {
                debug!("Ignoring error shutting down {}: {}", self.inner.peer_addr, e);
            }
        }
        self.inner.reader.lock().await.take();

        info!("Closed connection to {}", self.inner.peer_addr);
    }

    async fn read_locked(&self, buf: &mut [u8]) -> TransportResult<usize> {
        let mut guard = self.inner.reader.lock().await;
        let reader = guard.as_mut().ok_or(TransportError::ConnectionClosed)?;
        Ok(reader.read(buf).await?)
    }

    async fn write_locked(&self, buf: &[u8]) -> TransportResult<()> {
        let mut guard = self.inner.writer.lock().await;
        let writer = guard.as_mut().ok_or(TransportError::ConnectionClosed)?;
        writer.write_all(buf).await?;
        writer.flush().await?;
        Ok(())
    }

    fn closed_signal(&self) -> TransportResult<watch::Receiver<bool>> {
        let rx = self.inner.closed.subscribe();
        if *rx.borrow() {
            return Err(TransportError::ConnectionClosed);
        }
        Ok(rx)
    }
}

async fn wait_closed(mut rx: watch::Receiver<bool>) {
    // The sender lives as long as the connection, so an error also means closed
    let _ = rx.wait_for(|closed| *closed).await;
}
