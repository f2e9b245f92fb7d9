//! Wire protocol for Divoom Pixoo/Timebox LED matrix displays
//!
//! This crate covers everything between a structured command and the bytes
//! on the serial link:
//!
//! - Checksum and frame build/parse (`protocol`, `frame`)
//! - Command catalog, typed commands and payload decoders (`command`)
//! - Command id → decoder lookup (`dispatch`)
//! - Palette + bit-packed image codec (`image`)
//!
//! The physical link (Bluetooth RFCOMM or otherwise) is a [`Transport`]
//! collaborator; [`MemoryTransport`] scripts one for tests and
//! [`PrinterTransport`] logs the traffic of another.

pub mod command;
pub mod dispatch;
pub mod error;
pub mod frame;
pub mod image;
pub mod memory;
pub mod printer;
pub mod protocol;

pub use command::{
    ActivatedModes,
    // Inbound payloads
    BoxImage,
    BoxMode,
    GetBoxMode,
    LightMode,
    OutOfRangeError,
    ParseError,
    PixooCommand,
    QueryBoxMode,
    Rgb,
    SendAppNewestTime,
    // Settings
    SetBoxImage,
    SetBrightness,
    SetGame,
    SetLightModeClock,
    SetLightModeLight,
    SetLightModeTemperature,
    SetLightModeVj,
    SetMusicVisualizer,
    SetScore,
    SetSleepColor,
    SetSystemColor,
    SetTime,
    TimeType,
    WeatherType,
};
pub use dispatch::{
    decode_packet, decode_response_packet, parse_command, parse_response, ParsedCommand,
    ParsedResponse,
};
pub use error::{DecodeError, ImageError, PacketError, TransportError};
pub use frame::Packet;
pub use image::{
    bits_per_pixel, decode_pixels, encode_colors, image_packet, DecodedImage, EncodedImage,
    Palette, PixelGrid,
};
pub use memory::MemoryTransport;
pub use printer::{OutputFormat, PacketFilter, PrinterConfig, PrinterTransport};

use std::sync::Arc;

/// Byte-stream link to the device
///
/// Implementations are blocking. Timeouts are owned by the implementation:
/// `read` returns fewer bytes than requested (possibly none) when it gives
/// up waiting.
pub trait Transport: Send + Sync {
    /// Open the link
    fn connect(&self) -> Result<(), TransportError>;

    /// Discard any pending inbound bytes
    fn flush(&self) -> Result<(), TransportError>;

    /// Write raw bytes, returning how many were written
    fn write(&self, data: &[u8]) -> Result<usize, TransportError>;

    /// Read up to `count` bytes
    fn read(&self, count: usize) -> Result<Vec<u8>, TransportError>;
}

/// Type alias for a shared transport
pub type BoxedTransport = Arc<dyn Transport>;

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn connect(&self) -> Result<(), TransportError> {
        (**self).connect()
    }

    fn flush(&self) -> Result<(), TransportError> {
        (**self).flush()
    }

    fn write(&self, data: &[u8]) -> Result<usize, TransportError> {
        (**self).write(data)
    }

    fn read(&self, count: usize) -> Result<Vec<u8>, TransportError> {
        (**self).read(count)
    }
}
