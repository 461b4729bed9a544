// Timed handshake
//
// A blocking read on an established stream has no timeout of its own, so the
// handshake runs on its own task and the caller waits on the join handle with
// a deadline.

use crate::handshake::{read_handshake, write_handshake};
use crate::protocol::{TransportError, TransportResult};
use crate::timeout;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

/// Run write-then-read handshake on `reader`/`writer`, bounded by `handshake_timeout`.
///
/// The handshake task owns both halves and returns them when it finishes. On
/// timeout the task is aborted and joined, so both halves are dropped (closed)
/// before `HandshakeTimeout` is returned. An error the task observed first is
/// returned in preference to the timeout. Dropping the returned future also
/// aborts the task, so the halves never outlive the caller's wait.
pub async fn perform_handshake<R, W>(
    reader: R,
    writer: W,
    handshake_timeout: Duration,
) -> TransportResult<(R, W)>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    debug!("Performing JDWP handshake (timeout {:?})", handshake_timeout);

    let mut handle = tokio::spawn(handshake_task(reader, writer));
    let _guard = AbortOnDrop(handle.abort_handle());

    let joined = match timeout::effective(handshake_timeout) {
        None => (&mut handle).await,
        // timeout() polls the handle before the timer, so a completed
        // handshake wins a tie with the deadline
        Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => return Err(cancel(handle, limit).await),
        },
    };

    match joined {
        Ok(Ok(halves)) => {
            info!("JDWP handshake successful");
            Ok(halves)
        }
        Ok(Err(e)) => {
            warn!("JDWP handshake failed: {}", e);
            Err(e)
        }
        Err(e) => Err(TransportError::Io(io::Error::from(e))),
    }
}

async fn handshake_task<R, W>(mut reader: R, mut writer: W) -> TransportResult<(R, W)>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    write_handshake(&mut writer).await?;
    read_handshake(&mut reader).await?;
    Ok((reader, writer))
}

// Aborting a finished task is a no-op
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn cancel<R, W>(
    handle: JoinHandle<TransportResult<(R, W)>>,
    limit: Duration,
) -> TransportError {
    handle.abort();
    match handle.await {
        // Finished between the deadline and the abort: its error is more specific
        Ok(Err(e)) => e,
        // Finished successfully after all; the halves drop here
        Ok(Ok(_)) | Err(_) => {
            warn!("JDWP handshake timed out after {:?}", limit);
            TransportError::HandshakeTimeout(limit)
        }
    }
}
