//! Transport and packet error types

use thiserror::Error;

use crate::command::ParseError;

/// Errors that can occur while talking to the transport collaborator
#[derive(Error, Debug)]
pub enum TransportError {
    /// `write`/`read` attempted before `connect()` completed
    #[error("Not connected")]
    NotConnected,

    #[error("Short write: expected {expected} bytes, wrote {written}")]
    ShortWrite { expected: usize, written: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised while parsing a single frame
///
/// Every variant is fatal to that one parse attempt and never retried.
/// `ChecksumMismatch` signals corrupted data; all other variants signal a
/// structurally malformed frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    #[error("packet incomplete")]
    Incomplete,

    #[error("START_OF_PACKET value wrong: {value}")]
    BadStartMarker { value: u8 },

    #[error("END_OF_PACKET value wrong: {value}")]
    BadEndMarker { value: u8 },

    #[error("MAGIC_CHECK value wrong: {value}")]
    BadMagicCheck { value: u8 },

    #[error("MAGIC_UNK1 value wrong: {value}")]
    BadMagicUnknown { value: u8 },

    /// Declared size cannot even cover the fixed bytes it must account for
    #[error("declared size {size} too small")]
    InvalidSize { size: u16 },

    #[error("checksum wrong, got: {got:04x} wanted: {wanted:04x}")]
    ChecksumMismatch { got: u16, wanted: u16 },
}

impl PacketError {
    /// True for data corruption, false for structural malformation
    pub fn is_checksum(&self) -> bool {
        matches!(self, Self::ChecksumMismatch { .. })
    }
}

/// Frame + payload decoding in one step
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error(transparent)]
    Packet(#[from] PacketError),

    #[error(transparent)]
    Payload(#[from] ParseError),
}

/// Errors from the palette image encoder
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("cannot encode an empty colour sequence")]
    EmptyImage,

    #[error("pixel count mismatch: expected {expected}, got {got}")]
    SizeMismatch { expected: usize, got: usize },
}
