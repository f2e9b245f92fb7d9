//! Divoom Pixoo/Timebox toolkit
//!
//! Ties the protocol crate (`divo-transport`) and the session crate
//! (`divo-device`) together with a configuration file, logging setup and
//! capture analysis for reverse engineering the official app's traffic.

pub mod capture;
pub mod config;
pub mod helpers;
pub mod logging;

pub use capture::{decode_direct, decode_packets, Capture, CaptureError};
pub use config::{ConfigError, DivoConfig, LoggingConfig};
pub use helpers::{chunks, clean_unhexlify, HexError};
pub use logging::init_logging;

pub use divo_device::{DeviceError, Pixoo, Response, SessionOptions};
pub use divo_transport as transport;
