//! Protocol Module
//!
//! Defines the IPC protocol for the keybox service: request/response types and the
//! length-prefixed framing (4-byte little-endian length, then UTF-8 JSON).

use crate::error::PipelineStage;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Refuse frames larger than this; a keybox is a few kilobytes
pub const MAX_FRAME_LEN: u32 = 1024 * 1024;

/// Request types from external applications
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Request {
    GenerateKeybox,
    ProbeToolkit,
    SocketTest,
}

/// Response types sent back to clients
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Response {
    KeyboxGenerated {
        device_id: String,
        keybox: String,
    },
    ToolkitStatus {
        available: bool,
        message: String,
    },
    SocketTestResponse {
        message: String,
    },
    Error {
        stage: PipelineStage,
        message: String,
    },
}

/// Serialize a value to a length-prefixed byte array
///
/// # Returns
/// * `Result<(u32, Vec<u8>)>` - Tuple of (length, bytes) where bytes includes 4-byte length prefix
///
/// # Example
/// ```no_run
/// use keybox_gen::protocol::{encode_frame, Request};
///
/// let (size, bytes) = encode_frame(&Request::SocketTest)?;
/// // bytes = [4-byte length] + [JSON data]
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn encode_frame<T: Serialize>(value: &T) -> Result<(u32, Vec<u8>)> {
    let json = serde_json::to_string(value).context("Failed to serialize message to JSON")?;

    let json_bytes = json.as_bytes();
    let length = u32::try_from(json_bytes.len()).context("Message too large to frame")?;

    let mut buffer = Vec::with_capacity(4 + json_bytes.len());
    buffer.extend_from_slice(&length.to_le_bytes());
    buffer.extend_from_slice(json_bytes);

    Ok((length, buffer))
}

/// Deserialize the JSON body of a frame (without its length prefix)
pub fn decode_body<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T> {
    let json_str = std::str::from_utf8(bytes).context("Failed to decode frame bytes as UTF-8")?;

    serde_json::from_str(json_str).context("Failed to deserialize JSON frame")
}

/// Write one framed message
pub fn write_frame<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<()> {
    let (_, bytes) = encode_frame(value)?;
    writer.write_all(&bytes).context("Failed to write frame")?;
    writer.flush().context("Failed to flush frame")?;
    Ok(())
}

/// Read one framed message
pub fn read_frame<R: Read, T: for<'de> Deserialize<'de>>(reader: &mut R) -> Result<T> {
    let mut len_buf = [0u8; 4];
    reader
        .read_exact(&mut len_buf)
        .context("Failed to read frame length")?;
    let length = u32::from_le_bytes(len_buf);
    if length > MAX_FRAME_LEN {
        bail!("Frame of {} bytes exceeds the {} byte limit", length, MAX_FRAME_LEN);
    }

    let mut buf = vec![0u8; length as usize];
    reader
        .read_exact(&mut buf)
        .context("Failed to read frame body")?;
    decode_body(&buf)
}
