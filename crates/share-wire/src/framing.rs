// SPDX-License-Identifier: MIT

//! Length-prefixed JSON framing for the command channel socket.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload. The exact
//! encoding is an implementation choice (spec §6.4); this one is chosen for
//! readability during development and matches how the rest of this
//! workspace's ancestry frames IPC messages.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum single-message size accepted on the wire: guards against a
/// corrupt length prefix turning into an unbounded allocation.
const MAX_MESSAGE_LEN: u32 = 64 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connection closed")]
    ConnectionClosed,
    #[error("timed out")]
    Timeout,
    #[error("message exceeds maximum size")]
    MessageTooLarge,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode/decode error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Serialize `value` to JSON with no length prefix.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(value)?)
}

/// Deserialize `bytes` as JSON.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Write a length-prefixed message: 4-byte big-endian length, then `payload`.
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), ProtocolError> {
    let len = u32::try_from(payload.len()).map_err(|_| ProtocolError::MessageTooLarge)?;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read a length-prefixed message written by [`write_message`].
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed)
        }
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_MESSAGE_LEN {
        return Err(ProtocolError::MessageTooLarge);
    }
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

/// Read and decode one value, with a timeout.
pub async fn read_value<R: AsyncRead + Unpin, T: DeserializeOwned>(
    reader: &mut R,
    timeout: std::time::Duration,
) -> Result<T, ProtocolError> {
    let bytes = tokio::time::timeout(timeout, read_message(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    decode(&bytes)
}

/// Encode and write one value, with a timeout.
pub async fn write_value<W: AsyncWrite + Unpin, T: Serialize>(
    writer: &mut W,
    value: &T,
    timeout: std::time::Duration,
) -> Result<(), ProtocolError> {
    let bytes = encode(value)?;
    tokio::time::timeout(timeout, write_message(writer, &bytes))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn encode_returns_json_without_length_prefix() {
        let encoded = encode(&42u32).expect("encode failed");
        let json_str = std::str::from_utf8(&encoded).expect("should be valid UTF-8");
        assert_eq!(json_str, "42");
    }

    #[tokio::test]
    async fn read_write_message_roundtrip() {
        let original = b"hello world";

        let mut buffer = Vec::new();
        write_message(&mut buffer, original).await.expect("write failed");
        assert_eq!(buffer.len(), 4 + original.len());

        let mut cursor = std::io::Cursor::new(buffer);
        let read_back = read_message(&mut cursor).await.expect("read failed");
        assert_eq!(read_back, original);
    }

    #[tokio::test]
    async fn write_message_adds_length_prefix() {
        let data = b"test data";
        let mut buffer = Vec::new();
        write_message(&mut buffer, data).await.expect("write failed");

        let len = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;
        assert_eq!(len, data.len());
        assert_eq!(&buffer[4..], data);
    }

    #[tokio::test]
    async fn read_message_on_empty_stream_is_connection_closed() {
        let mut cursor = std::io::Cursor::new(Vec::<u8>::new());
        let err = read_message(&mut cursor).await.unwrap_err();
        assert!(matches!(err, ProtocolError::ConnectionClosed));
    }

    #[tokio::test]
    async fn read_value_times_out_on_silent_stream() {
        let (_client, mut server) = tokio::io::duplex(64);
        let err = read_value::<_, u32>(&mut server, Duration::from_millis(10)).await.unwrap_err();
        assert!(matches!(err, ProtocolError::Timeout));
    }

    #[tokio::test]
    async fn value_roundtrips_through_the_wire() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        let cmd = crate::Command {
            sequence_number: 1,
            reply_id: Some(crate::ReplyId(9)),
            kind: crate::CommandKind::Clear,
        };
        write_value(&mut client, &cmd, Duration::from_secs(1)).await.unwrap();
        let back: crate::Command = read_value(&mut server, Duration::from_secs(1)).await.unwrap();
        assert_eq!(back.sequence_number, 1);
    }
}
