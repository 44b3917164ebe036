//! Relay domain — receives images from the design-tool plugin.
//!
//! `protocol` is pure parsing and validation; `server` is the socket.

pub mod protocol;
mod server;

pub use protocol::{ImageFrame, OutboundMessage, ProtocolError, RelayMessage};
pub use server::{RelayError, RelayServer};
