//! High-level session interface for Divoom Pixoo/Timebox displays
//!
//! [`Pixoo`] runs the strictly sequential write-then-read cycle on top of
//! any [`Transport`]: one command in flight, one blocking read for the
//! 3-byte frame prefix, one for the rest of the frame.

pub mod error;

pub use error::DeviceError;

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use tracing::{debug, error};

use divo_transport::command::{
    ActivatedModes, GetBoxMode, PixooCommand, QueryBoxMode, Rgb, SendAppNewestTime, SetBoxImage,
    SetBrightness, SetGame, SetLightModeClock, SetLightModeLight, SetLightModeTemperature,
    SetLightModeVj, SetMusicVisualizer, SetScore, SetSleepColor, SetSystemColor, SetTime,
    TimeType,
};
use divo_transport::dispatch::{self, ParsedResponse};
use divo_transport::image::PixelGrid;
use divo_transport::protocol::{cmd, END_OF_PACKET, RESPONSE_PREFIX_LEN, START_OF_PACKET};
use divo_transport::{frame, Transport, TransportError};

/// Session behaviour switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Refuse to send frames that fail `frame::is_valid`
    pub validate_outgoing: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            validate_outgoing: true,
        }
    }
}

/// A response frame received from the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub cmd: u8,
    pub payload: Vec<u8>,
    /// Structured payload, if a decoder exists for `cmd`
    pub parsed: Option<ParsedResponse>,
}

impl Response {
    pub fn name(&self) -> &'static str {
        cmd::name(self.cmd)
    }
}

/// Session with one display
pub struct Pixoo {
    transport: Arc<dyn Transport>,
    options: SessionOptions,
}

impl Pixoo {
    /// Connect the transport and drop anything it buffered
    pub fn new(transport: Arc<dyn Transport>) -> Result<Self, DeviceError> {
        Self::with_options(transport, SessionOptions::default())
    }

    pub fn with_options(
        transport: Arc<dyn Transport>,
        options: SessionOptions,
    ) -> Result<Self, DeviceError> {
        transport.connect()?;
        transport.flush()?;
        Ok(Self { transport, options })
    }

    /// Get the underlying transport
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    /// Send a raw command frame and receive its response
    ///
    /// Returns `None` for commands the device never answers, and when the
    /// response could not be read (logged).
    pub fn write(&self, packet: &[u8]) -> Result<Option<Response>, DeviceError> {
        if self.options.validate_outgoing && !frame::is_valid(packet) {
            return Err(DeviceError::InvalidPacket);
        }
        let id = *packet.get(3).ok_or(DeviceError::InvalidPacket)?;

        let written = self.transport.write(packet)?;
        if written != packet.len() {
            return Err(TransportError::ShortWrite {
                expected: packet.len(),
                written,
            }
            .into());
        }
        debug!("sending {:02x?}", packet);

        if !cmd::expects_response(id) {
            return Ok(None);
        }
        self.read_response()
    }

    fn read_response(&self) -> Result<Option<Response>, DeviceError> {
        let head = self.transport.read(RESPONSE_PREFIX_LEN)?;
        if head.len() != RESPONSE_PREFIX_LEN {
            error!(
                "didn't receive enough data for response, only: {:02x?}",
                head
            );
            return Ok(None);
        }
        if head[0] != START_OF_PACKET {
            error!("received garbage: {:02x?}", head);
            return Ok(None);
        }

        let Some(size) = frame::declared_size(&head) else {
            return Ok(None);
        };
        debug!("receiving payload with length {}", size);

        let wanted = usize::from(size) + 1;
        let rest = self.transport.read(wanted)?;
        match rest.last() {
            None => {
                error!("rest empty");
                return Ok(None);
            }
            Some(_) if rest.len() != wanted => {
                error!("short read: wanted {} bytes, got {:02x?}", wanted, rest);
                return Ok(None);
            }
            Some(&last) if last != END_OF_PACKET => {
                error!("end marker not present: rest={:02x?}", rest);
                return Ok(None);
            }
            Some(_) => {}
        }

        let mut raw = head;
        raw.extend_from_slice(&rest);
        debug!("received {:02x?}", raw);

        let packet = frame::parse_response(&raw)?;
        // Most replies are bare acknowledgements without a decoder
        let parsed = if dispatch::has_response_parser(packet.cmd) {
            dispatch::parse_response(packet.cmd, packet.payload)?
        } else {
            debug!("reply {} carries {} undecoded bytes", packet.name(), packet.payload.len());
            None
        };
        Ok(Some(Response {
            cmd: packet.cmd,
            payload: packet.payload.to_vec(),
            parsed,
        }))
    }

    /// Frame and send a command
    ///
    /// With `need_response`, a missing reply frame is an error. A reply
    /// without a structured decoder still counts as a reply.
    pub fn write_command(
        &self,
        id: u8,
        data: &[u8],
        need_response: bool,
    ) -> Result<Option<Response>, DeviceError> {
        let response = self.write(&frame::build(id, data))?;
        if need_response && response.is_none() {
            return Err(DeviceError::NoReply { cmd: id });
        }
        Ok(response)
    }

    /// Send a typed command and require a reply
    pub fn send<C: PixooCommand>(&self, command: &C) -> Result<Response, DeviceError> {
        self.write_command(C::CMD, &command.to_data(), true)?
            .ok_or(DeviceError::NoReply { cmd: C::CMD })
    }

    /// Send a typed command the device never answers
    fn send_only<C: PixooCommand>(&self, command: &C) -> Result<(), DeviceError> {
        self.write_command(C::CMD, &command.to_data(), false)?;
        Ok(())
    }

    // === Settings ===

    pub fn set_brightness(&self, percent: u8) -> Result<Response, DeviceError> {
        self.send(&SetBrightness::new(percent)?)
    }

    /// Set the clock; `None` uses the local time
    pub fn set_time(&self, ts: Option<NaiveDateTime>) -> Result<Response, DeviceError> {
        let ts = ts.unwrap_or_else(|| Local::now().naive_local());
        self.send(&SetTime(ts))
    }

    pub fn set_system_color(&self, color: Rgb) -> Result<Response, DeviceError> {
        self.send(&SetSystemColor(color))
    }

    pub fn set_sleep_color(&self, color: Rgb) -> Result<(), DeviceError> {
        self.send_only(&SetSleepColor(color))
    }

    pub fn send_app_newest_time(&self, value: Option<bool>) -> Result<(), DeviceError> {
        self.send_only(&SendAppNewestTime(value))
    }

    pub fn set_game(&self, enable: bool, game: u8) -> Result<Response, DeviceError> {
        self.send(&SetGame::new(enable, game)?)
    }

    // === Display modes ===

    pub fn set_score(&self, blue: u16, red: u16) -> Result<Response, DeviceError> {
        self.send(&SetScore { blue, red })
    }

    pub fn set_music_visualizer(&self, visualizer: u8) -> Result<Response, DeviceError> {
        self.send(&SetMusicVisualizer::new(visualizer)?)
    }

    pub fn get_box_mode(&self) -> Result<GetBoxMode, DeviceError> {
        let response = self.send(&QueryBoxMode)?;
        match response.parsed {
            Some(ParsedResponse::GetBoxMode(mode)) => Ok(mode),
            None => Err(DeviceError::UnexpectedResponse(format!(
                "expected GET_BOX_MODE reply, got {} ({})",
                cmd::name(response.cmd),
                response.cmd
            ))),
        }
    }

    pub fn set_light_mode_clock(
        &self,
        time_type: TimeType,
        color: Rgb,
        modes: Option<ActivatedModes>,
    ) -> Result<Response, DeviceError> {
        self.send(&SetLightModeClock {
            time_type,
            color,
            modes: modes.unwrap_or_default(),
        })
    }

    /// Switch to the temperature view using the settings of `box_mode`
    pub fn set_light_mode_temperature(
        &self,
        box_mode: &GetBoxMode,
    ) -> Result<Response, DeviceError> {
        self.send(&SetLightModeTemperature::from(box_mode))
    }

    pub fn set_light_mode_light(
        &self,
        color: Rgb,
        modes: Option<ActivatedModes>,
    ) -> Result<Response, DeviceError> {
        self.send(&SetLightModeLight {
            color,
            modes: modes.unwrap_or_default(),
        })
    }

    pub fn set_light_mode_vj(&self, pattern: u8) -> Result<Response, DeviceError> {
        self.send(&SetLightModeVj::new(pattern)?)
    }

    // === Images ===

    /// Palette-encode a grid and show it
    pub fn set_image(&self, grid: &PixelGrid) -> Result<Response, DeviceError> {
        self.send(&SetBoxImage::from_grid(grid))
    }
}
