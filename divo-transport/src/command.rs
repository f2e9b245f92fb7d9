//! Type-safe command builders and payload decoders
//!
//! Outbound commands implement [`PixooCommand`] and validate their ranges at
//! construction time. Inbound payloads (`SET_BOX_COLOR`, `SET_MUL_BOX_COLOR`
//! captured from the official app, `GET_BOX_MODE` responses from the device)
//! decode into immutable records.

use std::fmt;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::frame;
use crate::image::{EncodedImage, Palette, PixelGrid};
use crate::protocol::cmd;

// =============================================================================
// Errors
// =============================================================================

/// Parse error for payloads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    TooShort { expected: usize, got: usize },
    InvalidValue { field: &'static str, value: u8 },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { expected, got } => {
                write!(
                    f,
                    "payload too short: expected {} bytes, got {}",
                    expected, got
                )
            }
            Self::InvalidValue { field, value } => {
                write!(f, "Invalid value for {}: 0x{:02X}", field, value)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// A command argument outside the range the firmware accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutOfRangeError {
    pub field: &'static str,
    pub value: u8,
    pub max: u8,
}

impl fmt::Display for OutOfRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} out of range (max {})",
            self.field, self.value, self.max
        )
    }
}

impl std::error::Error for OutOfRangeError {}

fn check_range(field: &'static str, value: u8, max: u8) -> Result<u8, OutOfRangeError> {
    if value > max {
        return Err(OutOfRangeError { field, value, max });
    }
    Ok(value)
}

// =============================================================================
// Core Trait
// =============================================================================

/// A command that can be serialized to a wire frame
pub trait PixooCommand {
    /// Command byte (e.g., 116 for SET_SYSTEM_BRIGHTNESS)
    const CMD: u8;

    /// Serialize to payload bytes (excluding framing and command byte)
    fn to_data(&self) -> Vec<u8>;

    /// Build the complete command frame
    fn build(&self) -> Vec<u8> {
        frame::build(Self::CMD, &self.to_data())
    }
}

// =============================================================================
// Colors and modes
// =============================================================================

/// RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// From a packed `0xRRGGBB` value; bits above 24 are ignored
    pub const fn from_packed(value: u32) -> Self {
        Self::new((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    pub const fn to_packed(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    pub const fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const RED: Self = Self::new(255, 0, 0);
    pub const GREEN: Self = Self::new(0, 255, 0);
    pub const BLUE: Self = Self::new(0, 0, 255);
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Top-level display mode (`SET_BOX_MODE` byte 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum BoxMode {
    Env = 0,
    Light = 1,
    Hot = 2,
    Special = 3,
    Music = 4,
    UserDefine = 5,
    /// Blue/red score board
    Watch = 6,
    /// Accepted by the firmware but has no visible effect
    Score = 7,
}

impl BoxMode {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Env),
            1 => Some(Self::Light),
            2 => Some(Self::Hot),
            3 => Some(Self::Special),
            4 => Some(Self::Music),
            5 => Some(Self::UserDefine),
            6 => Some(Self::Watch),
            7 => Some(Self::Score),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum LightMode {
    Clock = 0,
    Temperature = 1,
    Color = 2,
    Special = 3,
    Sound = 4,
    User = 5,
}

impl LightMode {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Clock),
            1 => Some(Self::Temperature),
            2 => Some(Self::Color),
            3 => Some(Self::Special),
            4 => Some(Self::Sound),
            5 => Some(Self::User),
            _ => None,
        }
    }
}

/// Clock layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum TimeType {
    /// Fullscreen
    Big = 0,
    Rainbow = 1,
    /// Boxed
    Border = 2,
    /// Analog square
    Analog = 3,
    /// Fullscreen negative
    BigInv = 4,
    AnalogRound = 5,
    /// Widescreen
    Small = 6,
}

impl TimeType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Big),
            1 => Some(Self::Rainbow),
            2 => Some(Self::Border),
            3 => Some(Self::Analog),
            4 => Some(Self::BigInv),
            5 => Some(Self::AnalogRound),
            6 => Some(Self::Small),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum WeatherType {
    Clear = 1,
    Cloudy = 3,
    Thunderstorm = 5,
    Rain = 6,
    Snow = 8,
    Fog = 9,
}

impl WeatherType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Clear),
            3 => Some(Self::Cloudy),
            5 => Some(Self::Thunderstorm),
            6 => Some(Self::Rain),
            8 => Some(Self::Snow),
            9 => Some(Self::Fog),
            _ => None,
        }
    }
}

/// Which overlays are shown alongside the clock/light modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivatedModes {
    pub clock: bool,
    pub weather: bool,
    pub temperature: bool,
    pub date: bool,
}

impl Default for ActivatedModes {
    fn default() -> Self {
        Self {
            clock: true,
            weather: false,
            temperature: false,
            date: false,
        }
    }
}

impl ActivatedModes {
    fn to_bytes(self) -> [u8; 4] {
        [
            u8::from(self.clock),
            u8::from(self.weather),
            u8::from(self.temperature),
            u8::from(self.date),
        ]
    }
}

// =============================================================================
// Simple Settings
// =============================================================================

/// Maximum brightness percentage
pub const BRIGHTNESS_MAX: u8 = 100;
/// Highest music visualizer id
pub const VISUALIZER_MAX: u8 = 11;
/// Highest built-in game id
pub const GAME_MAX: u8 = 8;
/// Highest VJ effect pattern id
pub const VJ_PATTERN_MAX: u8 = 15;

/// SET_SYSTEM_BRIGHTNESS command (116)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetBrightness {
    percent: u8,
}

impl SetBrightness {
    pub fn new(percent: u8) -> Result<Self, OutOfRangeError> {
        Ok(Self {
            percent: check_range("brightness", percent, BRIGHTNESS_MAX)?,
        })
    }
}

impl PixooCommand for SetBrightness {
    const CMD: u8 = cmd::SET_SYSTEM_BRIGHTNESS;

    fn to_data(&self) -> Vec<u8> {
        vec![self.percent]
    }
}

/// SET_SYSTEM_COLOR command (36)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetSystemColor(pub Rgb);

impl PixooCommand for SetSystemColor {
    const CMD: u8 = cmd::SET_SYSTEM_COLOR;

    fn to_data(&self) -> Vec<u8> {
        self.0.to_bytes().to_vec()
    }
}

/// SET_SLEEP_COLOR command (173), never answered by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetSleepColor(pub Rgb);

impl PixooCommand for SetSleepColor {
    const CMD: u8 = cmd::SET_SLEEP_COLOR;

    fn to_data(&self) -> Vec<u8> {
        self.0.to_bytes().to_vec()
    }
}

/// SET_TIME command (24)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetTime(pub NaiveDateTime);

impl PixooCommand for SetTime {
    const CMD: u8 = cmd::SET_TIME;

    fn to_data(&self) -> Vec<u8> {
        let ts = &self.0;
        let year = ts.year();
        vec![
            year.rem_euclid(100) as u8,
            year.div_euclid(100) as u8,
            ts.month() as u8,
            ts.day() as u8,
            ts.hour() as u8,
            ts.minute() as u8,
            ts.second() as u8,
            // 0 = Sunday .. 6 = Saturday
            ts.weekday().num_days_from_sunday() as u8,
        ]
    }
}

/// SET_GAME command (160)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetGame {
    enable: bool,
    game: u8,
}

impl SetGame {
    pub fn new(enable: bool, game: u8) -> Result<Self, OutOfRangeError> {
        Ok(Self {
            enable,
            game: check_range("game", game, GAME_MAX)?,
        })
    }
}

impl PixooCommand for SetGame {
    const CMD: u8 = cmd::SET_GAME;

    fn to_data(&self) -> Vec<u8> {
        vec![u8::from(self.enable), self.game]
    }
}

/// SEND_APP_NEWEST_TIME command (38), never answered by the device
///
/// `None` sends the "unset" marker 0xFF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendAppNewestTime(pub Option<bool>);

impl PixooCommand for SendAppNewestTime {
    const CMD: u8 = cmd::SEND_APP_NEWEST_TIME;

    fn to_data(&self) -> Vec<u8> {
        match self.0 {
            None => vec![0xFF],
            Some(value) => vec![u8::from(value)],
        }
    }
}

// =============================================================================
// Box Mode Commands (SET_BOX_MODE)
// =============================================================================

/// Score board: shows `blue` and `red` side by side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetScore {
    pub blue: u16,
    pub red: u16,
}

impl PixooCommand for SetScore {
    const CMD: u8 = cmd::SET_BOX_MODE;

    fn to_data(&self) -> Vec<u8> {
        let [red_lo, red_hi] = self.red.to_le_bytes();
        let [blue_lo, blue_hi] = self.blue.to_le_bytes();
        vec![
            BoxMode::Watch as u8,
            0,
            red_lo,
            red_hi,
            blue_lo,
            blue_hi,
            0,
            0,
            0,
            0,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetMusicVisualizer {
    visualizer: u8,
}

impl SetMusicVisualizer {
    pub fn new(visualizer: u8) -> Result<Self, OutOfRangeError> {
        Ok(Self {
            visualizer: check_range("visualizer id", visualizer, VISUALIZER_MAX)?,
        })
    }
}

impl PixooCommand for SetMusicVisualizer {
    const CMD: u8 = cmd::SET_BOX_MODE;

    fn to_data(&self) -> Vec<u8> {
        let mut data = vec![BoxMode::Music as u8, self.visualizer];
        data.resize(10, 0);
        data
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetLightModeClock {
    pub time_type: TimeType,
    pub color: Rgb,
    pub modes: ActivatedModes,
}

impl PixooCommand for SetLightModeClock {
    const CMD: u8 = cmd::SET_BOX_MODE;

    fn to_data(&self) -> Vec<u8> {
        let mut data = vec![BoxMode::Env as u8, 1, self.time_type as u8];
        data.extend_from_slice(&self.modes.to_bytes());
        data.extend_from_slice(&self.color.to_bytes());
        data
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetLightModeLight {
    pub color: Rgb,
    pub modes: ActivatedModes,
}

impl PixooCommand for SetLightModeLight {
    const CMD: u8 = cmd::SET_BOX_MODE;

    fn to_data(&self) -> Vec<u8> {
        let mut data = vec![BoxMode::Light as u8];
        data.extend_from_slice(&self.color.to_bytes());
        // Fixed level byte and padding observed in app captures
        data.extend_from_slice(&[0x14, 0]);
        data.extend_from_slice(&self.modes.to_bytes());
        data
    }
}

/// Temperature view, reusing the temperature settings of a [`GetBoxMode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetLightModeTemperature {
    pub temp_type: u8,
    pub color: Rgb,
}

impl From<&GetBoxMode> for SetLightModeTemperature {
    fn from(mode: &GetBoxMode) -> Self {
        Self {
            temp_type: mode.temp_type,
            color: mode.temp,
        }
    }
}

impl PixooCommand for SetLightModeTemperature {
    const CMD: u8 = cmd::SET_BOX_MODE;

    fn to_data(&self) -> Vec<u8> {
        let mut data = vec![LightMode::Temperature as u8, self.temp_type];
        data.extend_from_slice(&self.color.to_bytes());
        data.push(0);
        data
    }
}

/// VJ effects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetLightModeVj {
    pattern: u8,
}

impl SetLightModeVj {
    pub fn new(pattern: u8) -> Result<Self, OutOfRangeError> {
        Ok(Self {
            pattern: check_range("pattern id", pattern, VJ_PATTERN_MAX)?,
        })
    }
}

impl PixooCommand for SetLightModeVj {
    const CMD: u8 = cmd::SET_BOX_MODE;

    fn to_data(&self) -> Vec<u8> {
        vec![BoxMode::Special as u8, self.pattern]
    }
}

/// GET_BOX_MODE query (no data)
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryBoxMode;

impl PixooCommand for QueryBoxMode {
    const CMD: u8 = cmd::GET_BOX_MODE;

    fn to_data(&self) -> Vec<u8> {
        vec![]
    }
}

// =============================================================================
// Images (SET_BOX_COLOR / SET_MUL_BOX_COLOR)
// =============================================================================

/// Opaque header preceding the palette table in a single-image SET_BOX_COLOR
pub const SET_BOX_COLOR_HEADER: [u8; 10] = [0x00, 0x0A, 0x0A, 0x04, 0xAA, 0x2D, 0x00, 0x00, 0x00, 0x00];
/// Header length of the single-image payload
pub const SET_BOX_COLOR_HEADER_LEN: usize = SET_BOX_COLOR_HEADER.len();
/// Header length of the multi-frame payload
pub const SET_MUL_BOX_COLOR_HEADER_LEN: usize = 9;

/// Show a palette-encoded image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetBoxImage(pub EncodedImage);

impl SetBoxImage {
    /// Palette-encode a pixel grid
    pub fn from_grid(grid: &PixelGrid) -> Self {
        Self(EncodedImage::from_grid(grid))
    }
}

impl PixooCommand for SetBoxImage {
    const CMD: u8 = cmd::SET_BOX_COLOR;

    fn to_data(&self) -> Vec<u8> {
        let mut data = SET_BOX_COLOR_HEADER.to_vec();
        data.extend_from_slice(&self.0.to_payload());
        data
    }
}

/// Decoded SET_BOX_COLOR / SET_MUL_BOX_COLOR payload
///
/// Layout: `header ‖ palette_len:u8 ‖ palette (3 × palette_len) ‖ image`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoxImage {
    /// Opaque header bytes, kept for inspection
    pub header: Vec<u8>,
    pub palette: Palette,
    /// Bit-packed palette index stream
    pub image: Vec<u8>,
}

impl BoxImage {
    fn decode(data: &[u8], header_len: usize) -> Result<Self, ParseError> {
        let palette_len = *data.get(header_len).ok_or(ParseError::TooShort {
            expected: header_len + 1,
            got: data.len(),
        })? as usize;

        let palette_start = header_len + 1;
        let image_start = palette_start + 3 * palette_len;
        if data.len() < image_start {
            return Err(ParseError::TooShort {
                expected: image_start,
                got: data.len(),
            });
        }

        Ok(Self {
            header: data[..header_len].to_vec(),
            palette: Palette::from_bytes(&data[palette_start..image_start]),
            image: data[image_start..].to_vec(),
        })
    }

    /// Decode a single-image payload (10-byte header)
    pub fn decode_single(data: &[u8]) -> Result<Self, ParseError> {
        Self::decode(data, SET_BOX_COLOR_HEADER_LEN)
    }

    /// Decode a multi-frame payload (9-byte header)
    pub fn decode_multi(data: &[u8]) -> Result<Self, ParseError> {
        Self::decode(data, SET_MUL_BOX_COLOR_HEADER_LEN)
    }

    /// Unpack the index stream against the palette
    pub fn to_grid(&self) -> PixelGrid {
        crate::image::decode_pixels(&self.palette, &self.image)
    }
}

// =============================================================================
// GET_BOX_MODE response
// =============================================================================

/// Wire layout of the 16 fixed-offset GET_BOX_MODE fields
#[derive(Debug, Clone, Copy, IntoBytes, FromBytes, KnownLayout, Immutable)]
#[repr(C)]
struct BoxModeWire {
    mode: u8,
    temp_type: u8,
    light_mode: u8,
    light_r: u8,
    light_g: u8,
    light_b: u8,
    level: u8,
    music_type: u8,
    sys_light: u8,
    time_type: u8,
    time_r: u8,
    time_g: u8,
    time_b: u8,
    temp_r: u8,
    temp_g: u8,
    temp_b: u8,
}

/// GET_BOX_MODE response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GetBoxMode {
    pub mode: u8,
    pub temp_type: u8,
    pub light_mode: u8,
    pub light: Rgb,
    pub level: u8,
    pub music_type: u8,
    pub sys_light: u8,
    pub time_type: u8,
    pub time: Rgb,
    pub temp: Rgb,
    /// Complete payload, including bytes past the known fields
    pub raw: Vec<u8>,
}

impl GetBoxMode {
    /// Number of fixed fields at the start of the payload
    pub const MIN_LEN: usize = std::mem::size_of::<BoxModeWire>();

    pub fn from_data(data: &[u8]) -> Result<Self, ParseError> {
        let (wire, _) = BoxModeWire::read_from_prefix(data).map_err(|_| ParseError::TooShort {
            expected: Self::MIN_LEN,
            got: data.len(),
        })?;

        Ok(Self {
            mode: wire.mode,
            temp_type: wire.temp_type,
            light_mode: wire.light_mode,
            light: Rgb::new(wire.light_r, wire.light_g, wire.light_b),
            level: wire.level,
            music_type: wire.music_type,
            sys_light: wire.sys_light,
            time_type: wire.time_type,
            time: Rgb::new(wire.time_r, wire.time_g, wire.time_b),
            temp: Rgb::new(wire.temp_r, wire.temp_g, wire.temp_b),
            raw: data.to_vec(),
        })
    }

    pub fn box_mode(&self) -> Option<BoxMode> {
        BoxMode::from_u8(self.mode)
    }

    pub fn light_mode(&self) -> Option<LightMode> {
        LightMode::from_u8(self.light_mode)
    }

    pub fn time_type(&self) -> Option<TimeType> {
        TimeType::from_u8(self.time_type)
    }
}

impl fmt::Display for GetBoxMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GetBoxMode<mode={} temp_type={} light_mode={} light={} level={} time_type={} time={} temp={}>",
            self.mode,
            self.temp_type,
            self.light_mode,
            self.light,
            self.level,
            self.time_type,
            self.time,
            self.temp
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_set_brightness() {
        let cmd = SetBrightness::new(23).unwrap();
        assert_eq!(cmd.to_data(), vec![23]);
        assert_eq!(cmd.build(), [0x01, 0x04, 0x00, 0x74, 0x17, 0x8F, 0x00, 0x02]);

        let err = SetBrightness::new(101).unwrap_err();
        assert_eq!(err.to_string(), "brightness 101 out of range (max 100)");
    }

    #[test]
    fn test_set_score() {
        let data = SetScore { blue: 23, red: 0x0142 }.to_data();
        assert_eq!(data, vec![6, 0, 0x42, 0x01, 23, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_set_music_visualizer() {
        let data = SetMusicVisualizer::new(3).unwrap().to_data();
        assert_eq!(data, vec![4, 3, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert!(SetMusicVisualizer::new(12).is_err());
    }

    #[test]
    fn test_set_time() {
        // 2021-03-14 was a Sunday
        let ts = NaiveDate::from_ymd_opt(2021, 3, 14)
            .unwrap()
            .and_hms_opt(15, 9, 26)
            .unwrap();
        assert_eq!(SetTime(ts).to_data(), vec![21, 20, 3, 14, 15, 9, 26, 0]);

        let saturday = NaiveDate::from_ymd_opt(1999, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        assert_eq!(SetTime(saturday).to_data(), vec![99, 19, 12, 31, 23, 59, 59, 5]);
    }

    #[test]
    fn test_set_game() {
        assert_eq!(SetGame::new(true, 8).unwrap().to_data(), vec![1, 8]);
        assert_eq!(SetGame::new(false, 0).unwrap().to_data(), vec![0, 0]);
        assert!(SetGame::new(true, 9).is_err());
    }

    #[test]
    fn test_colors() {
        let color = Rgb::new(255, 100, 100);
        assert_eq!(SetSystemColor(color).to_data(), vec![255, 100, 100]);
        assert_eq!(SetSleepColor(Rgb::RED).build()[3], cmd::SET_SLEEP_COLOR);
        assert_eq!(Rgb::from_packed(0x12_34_56), Rgb::new(0x12, 0x34, 0x56));
        assert_eq!(Rgb::new(0x12, 0x34, 0x56).to_packed(), 0x12_34_56);
        assert_eq!(Rgb::from_packed(0xFF_00_00_01), Rgb::new(0, 0, 1));
    }

    #[test]
    fn test_send_app_newest_time() {
        assert_eq!(SendAppNewestTime(None).to_data(), vec![0xFF]);
        assert_eq!(SendAppNewestTime(Some(true)).to_data(), vec![1]);
        assert_eq!(SendAppNewestTime(Some(false)).to_data(), vec![0]);
    }

    #[test]
    fn test_light_mode_clock() {
        let cmd = SetLightModeClock {
            time_type: TimeType::Analog,
            color: Rgb::new(10, 20, 30),
            modes: ActivatedModes::default(),
        };
        assert_eq!(cmd.to_data(), vec![0, 1, 3, 1, 0, 0, 0, 10, 20, 30]);
    }

    #[test]
    fn test_light_mode_light() {
        let cmd = SetLightModeLight {
            color: Rgb::new(10, 20, 30),
            modes: ActivatedModes {
                clock: false,
                weather: true,
                temperature: false,
                date: true,
            },
        };
        assert_eq!(cmd.to_data(), vec![1, 10, 20, 30, 0x14, 0, 0, 1, 0, 1]);
    }

    #[test]
    fn test_light_mode_vj() {
        assert_eq!(SetLightModeVj::new(15).unwrap().to_data(), vec![3, 15]);
        assert!(SetLightModeVj::new(16).is_err());
    }

    #[test]
    fn test_query_box_mode() {
        assert_eq!(
            QueryBoxMode.build(),
            [0x01, 0x03, 0x00, 0x46, 0x49, 0x00, 0x02]
        );
    }

    #[test]
    fn test_get_box_mode_parse() {
        let data: Vec<u8> = (0..18).collect();
        let mode = GetBoxMode::from_data(&data).unwrap();
        assert_eq!(mode.mode, 0);
        assert_eq!(mode.temp_type, 1);
        assert_eq!(mode.light_mode, 2);
        assert_eq!(mode.light, Rgb::new(3, 4, 5));
        assert_eq!(mode.level, 6);
        assert_eq!(mode.music_type, 7);
        assert_eq!(mode.sys_light, 8);
        assert_eq!(mode.time_type, 9);
        assert_eq!(mode.time, Rgb::new(10, 11, 12));
        assert_eq!(mode.temp, Rgb::new(13, 14, 15));
        assert_eq!(mode.raw.len(), 18);
        assert_eq!(mode.box_mode(), Some(BoxMode::Env));
        assert_eq!(mode.light_mode(), Some(LightMode::Color));
        assert_eq!(mode.time_type(), None);
    }

    #[test]
    fn test_get_box_mode_too_short() {
        let err = GetBoxMode::from_data(&[0u8; 15]).unwrap_err();
        assert_eq!(
            err,
            ParseError::TooShort {
                expected: 16,
                got: 15
            }
        );
        assert!(err.to_string().starts_with("payload too short"));
    }

    #[test]
    fn test_temperature_from_box_mode() {
        let mut data = vec![0u8; 16];
        data[1] = 1;
        data[13..16].copy_from_slice(&[200, 100, 50]);
        let mode = GetBoxMode::from_data(&data).unwrap();
        let cmd = SetLightModeTemperature::from(&mode);
        assert_eq!(cmd.to_data(), vec![1, 1, 200, 100, 50, 0]);
    }

    #[test]
    fn test_box_image_decode_single() {
        // header ‖ 2 colors ‖ image
        let mut data = vec![0x00, 0x0A, 0x0A, 0x04, 0xAA, 0x7F, 0x00, 0xF4, 0x01, 0x00];
        data.push(2);
        data.extend_from_slice(&[0xFF, 0x00, 0x00, 0x00, 0x00, 0xFF]);
        data.extend_from_slice(&[0x55, 0xAA]);

        let image = BoxImage::decode_single(&data).unwrap();
        assert_eq!(image.header.len(), 10);
        assert_eq!(image.palette.colors(), &[Rgb::RED, Rgb::BLUE]);
        assert_eq!(image.image, vec![0x55, 0xAA]);
    }

    #[test]
    fn test_box_image_decode_multi() {
        let mut data = vec![0x2C, 0x01, 0x00, 0xAA, 0xA2, 0x00, 0x1B, 0x01, 0x00];
        data.push(1);
        data.extend_from_slice(&[1, 2, 3]);
        data.push(0x00);

        let image = BoxImage::decode_multi(&data).unwrap();
        assert_eq!(image.header.len(), 9);
        assert_eq!(image.palette.colors(), &[Rgb::new(1, 2, 3)]);
        assert_eq!(image.image, vec![0x00]);
    }

    #[test]
    fn test_box_image_truncated() {
        assert_eq!(
            BoxImage::decode_single(&[0u8; 10]),
            Err(ParseError::TooShort {
                expected: 11,
                got: 10
            })
        );

        let mut data = vec![0u8; 10];
        data.push(2);
        data.extend_from_slice(&[1, 2, 3, 4]);
        assert_eq!(
            BoxImage::decode_single(&data),
            Err(ParseError::TooShort {
                expected: 17,
                got: 15
            })
        );
    }

    #[test]
    fn test_set_box_image_layout() {
        let grid = PixelGrid::filled(Rgb::BLACK);
        let data = SetBoxImage::from_grid(&grid).to_data();
        assert_eq!(&data[..10], &SET_BOX_COLOR_HEADER);
        // palette table: 1 entry, black
        assert_eq!(&data[10..14], &[1, 0, 0, 0]);
        // 256 pixels at 1 bit each
        assert_eq!(data.len(), 14 + 32);
        assert!(data[14..].iter().all(|&b| b == 0));

        let decoded = BoxImage::decode_single(&data).unwrap();
        assert_eq!(decoded.to_grid(), grid);
    }
}
