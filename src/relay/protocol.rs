//! Relay wire format and validation — functional core.
//!
//! This is the only place inbound frames are checked. Anything that leaves
//! `parse_frame` as a `RelayMessage` is safe to hand to the controller:
//! the payload is non-empty and the size has been defaulted.

use crate::config::DEFAULT_SIZE;
use crate::overlay::{EncodedBitmap, Size};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frame as sent by the producer, before validation.
///
/// Fields are loosely typed on purpose: a bad `width` falls back to the
/// default instead of discarding the whole image.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum InboundMessage {
    Image {
        #[serde(default)]
        data: Option<Value>,
        #[serde(default)]
        width: Option<Value>,
        #[serde(default)]
        height: Option<Value>,
    },
    #[serde(other)]
    Unknown,
}

/// Validated inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayMessage {
    Image(ImageFrame),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageFrame {
    pub payload: EncodedBitmap,
    pub size: Size,
}

/// Server → client frames.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OutboundMessage {
    Connected { port: u16 },
}

impl OutboundMessage {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Parses one text frame.
///
/// `Ok(None)` means a well-formed message of a type this server ignores.
pub fn parse_frame(text: &str) -> Result<Option<RelayMessage>, ProtocolError> {
    let message: InboundMessage = serde_json::from_str(text)?;

    match message {
        InboundMessage::Image {
            data,
            width,
            height,
        } => {
            let payload = match data {
                Some(Value::String(s)) if !s.is_empty() => EncodedBitmap::from(s),
                _ => return Err(ProtocolError::MissingPayload),
            };
            let width = dimension_or(width.as_ref(), DEFAULT_SIZE.0);
            let height = dimension_or(height.as_ref(), DEFAULT_SIZE.1);
            let size = Size::new(width, height).unwrap_or_default();
            Ok(Some(RelayMessage::Image(ImageFrame { payload, size })))
        }
        InboundMessage::Unknown => Ok(None),
    }
}

/// Binary frames carry the same JSON as text frames.
pub fn parse_binary_frame(bytes: &[u8]) -> Result<Option<RelayMessage>, ProtocolError> {
    let text = std::str::from_utf8(bytes).map_err(|_| ProtocolError::NotUtf8)?;
    parse_frame(text)
}

/// Positive numbers are rounded to whole pixels; anything else yields `default`.
fn dimension_or(value: Option<&Value>, default: u32) -> u32 {
    value
        .and_then(Value::as_f64)
        .filter(|n| n.is_finite() && *n >= 1.0)
        .map(|n| n.round().min(u32::MAX as f64) as u32)
        .unwrap_or(default)
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Malformed relay message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Binary frame is not valid UTF-8")]
    NotUtf8,

    #[error("Image message has no payload")]
    MissingPayload,
}
