//! Session error types

use divo_transport::{OutOfRangeError, PacketError, ParseError, TransportError};
use thiserror::Error;

/// Errors from device operations
#[derive(Error, Debug)]
pub enum DeviceError {
    /// Transport layer error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Response frame could not be parsed
    #[error("Packet error: {0}")]
    Packet(#[from] PacketError),

    /// Response payload could not be decoded
    #[error("Payload error: {0}")]
    Payload(#[from] ParseError),

    /// Refused to send a malformed frame
    #[error("tried to send invalid packet")]
    InvalidPacket,

    /// A response-expecting command got no frame back
    #[error("expected a reply to command {cmd}")]
    NoReply { cmd: u8 },

    /// Invalid parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Device returned unexpected response
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl From<OutOfRangeError> for DeviceError {
    fn from(e: OutOfRangeError) -> Self {
        Self::InvalidParameter(e.to_string())
    }
}
