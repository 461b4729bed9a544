// JDWP handshake codec
//
// Both sides write the handshake string and then expect the identical bytes back.

use crate::protocol::{TransportError, TransportResult, JDWP_HANDSHAKE};
use bytes::BytesMut;
use std::io::ErrorKind;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

/// Write the handshake bytes in a single operation
pub async fn write_handshake<W>(writer: &mut W) -> TransportResult<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(JDWP_HANDSHAKE).await?;
    writer.flush().await?;
    debug!("Sent JDWP handshake");
    Ok(())
}

/// Read exactly `JDWP_HANDSHAKE.len()` bytes and verify them.
///
/// End of stream before the full handshake is `ConnectionClosed`, a complete
/// but different sequence is `InvalidHandshake`.
pub async fn read_handshake<R>(reader: &mut R) -> TransportResult<()>
where
    R: AsyncRead + Unpin,
{
    let mut buf = BytesMut::zeroed(JDWP_HANDSHAKE.len());

    match reader.read_exact(&mut buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
            debug!("Peer closed stream during handshake");
            return Err(TransportError::ConnectionClosed);
        }
        Err(e) => return Err(TransportError::Io(e)),
    }

    if &buf[..] != JDWP_HANDSHAKE {
        warn!("Invalid handshake response: {:?}", &buf[..]);
        return Err(TransportError::InvalidHandshake);
    }

    debug!("Received JDWP handshake");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_handshake_bytes() {
        let mut out = Vec::new();
        write_handshake(&mut out).await.unwrap();
        assert_eq!(out, b"JDWP-Handshake");
    }

    #[tokio::test]
    async fn test_read_valid_handshake() {
        let mut input: &[u8] = b"JDWP-Handshake";
        read_handshake(&mut input).await.unwrap();
    }

    #[tokio::test]
    async fn test_read_leaves_trailing_bytes() {
        let mut input: &[u8] = b"JDWP-Handshake\x00\x00\x00\x0b";
        read_handshake(&mut input).await.unwrap();
        assert_eq!(input, &[0, 0, 0, 11]);
    }

    #[tokio::test]
    async fn test_any_single_byte_difference_is_rejected() {
        for i in 0..JDWP_HANDSHAKE.len() {
            let mut bytes = JDWP_HANDSHAKE.to_vec();
            bytes[i] ^= 0x20;
            let mut input: &[u8] = &bytes;
            let err = read_handshake(&mut input).await.unwrap_err();
            assert!(
                matches!(err, TransportError::InvalidHandshake),
                "byte {i}: {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_short_read_is_closed_connection() {
        for len in 0..JDWP_HANDSHAKE.len() {
            let mut input: &[u8] = &JDWP_HANDSHAKE[..len];
            let err = read_handshake(&mut input).await.unwrap_err();
            assert!(
                matches!(err, TransportError::ConnectionClosed),
                "len {len}: {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_short_garbage_is_closed_connection() {
        let mut input: &[u8] = b"HTTP/1.1";
        let err = read_handshake(&mut input).await.unwrap_err();
        assert!(matches!(err, TransportError::ConnectionClosed));
    }

    #[tokio::test]
    async fn test_write_to_closed_pipe_fails() {
        let (mut local, remote) = tokio::io::duplex(64);
        drop(remote);
        let err = write_handshake(&mut local).await.unwrap_err();
        assert!(matches!(err, TransportError::Io(_)));
    }
}
