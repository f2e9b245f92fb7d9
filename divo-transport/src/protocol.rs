//! Protocol constants and utilities for Divoom Pixoo/Timebox communication

use crate::error::PacketError;

/// Frame start marker
pub const START_OF_PACKET: u8 = 0x01;
/// Frame end marker
pub const END_OF_PACKET: u8 = 0x02;

/// Response frames carry this byte in front of the real command id
pub const MAGIC_CHECK: u8 = 0x04;
/// Response frames carry this byte right after the real command id
pub const MAGIC_UNKNOWN: u8 = 0x55;

/// Bytes the `size` field accounts for besides the payload
///
/// Command frames: command id + 2 checksum bytes.
/// Response frames: magic check + command id + magic unknown.
pub const SIZE_OVERHEAD: usize = 3;

/// Start marker + size field + command id
pub const HEADER_LEN: usize = 4;

/// Start marker + 2-byte size field, read first when waiting for a reply
pub const RESPONSE_PREFIX_LEN: usize = 3;

/// Pixoo display dimensions
pub mod display {
    pub const WIDTH: usize = 16;
    pub const HEIGHT: usize = 16;
    pub const PIXEL_COUNT: usize = WIDTH * HEIGHT;
}

/// Protocol commands
pub mod cmd {
    pub const SET_TIME: u8 = 24;
    pub const SET_SYSTEM_COLOR: u8 = 36;
    pub const SEND_APP_NEWEST_TIME: u8 = 38;
    pub const SET_24_HOUR: u8 = 45;
    pub const LIGHT_CURRENT_LEVEL: u8 = 49;
    pub const SET_BOX_COLOR: u8 = 68;
    pub const SET_BOX_MODE: u8 = 69;
    pub const GET_BOX_MODE: u8 = 70;
    pub const SET_MUL_BOX_COLOR: u8 = 73;
    pub const SET_CLIMATE: u8 = 95;
    pub const SET_SYSTEM_BRIGHTNESS: u8 = 116;
    pub const SET_GAME: u8 = 160;
    pub const SET_SLEEP_COLOR: u8 = 173;
    pub const SET_USER_GIF: u8 = 177;

    /// The device never answers these; callers must skip the post-send read
    pub const WITHOUT_RESPONSE: &[u8] = &[SEND_APP_NEWEST_TIME, SET_SLEEP_COLOR];

    /// Every command id in the catalog
    pub const ALL: &[u8] = &[
        SET_TIME,
        SET_SYSTEM_COLOR,
        SEND_APP_NEWEST_TIME,
        SET_24_HOUR,
        LIGHT_CURRENT_LEVEL,
        SET_BOX_COLOR,
        SET_BOX_MODE,
        GET_BOX_MODE,
        SET_MUL_BOX_COLOR,
        SET_CLIMATE,
        SET_SYSTEM_BRIGHTNESS,
        SET_GAME,
        SET_SLEEP_COLOR,
        SET_USER_GIF,
    ];

    /// Get human-readable name for command byte
    pub fn name(cmd: u8) -> &'static str {
        match cmd {
            SET_TIME => "SET_TIME",
            SET_SYSTEM_COLOR => "SET_SYSTEM_COLOR",
            SEND_APP_NEWEST_TIME => "SEND_APP_NEWEST_TIME",
            SET_24_HOUR => "SET_24_HOUR",
            LIGHT_CURRENT_LEVEL => "LIGHT_CURRENT_LEVEL",
            SET_BOX_COLOR => "SET_BOX_COLOR",
            SET_BOX_MODE => "SET_BOX_MODE",
            GET_BOX_MODE => "GET_BOX_MODE",
            SET_MUL_BOX_COLOR => "SET_MUL_BOX_COLOR",
            SET_CLIMATE => "SET_CLIMATE",
            SET_SYSTEM_BRIGHTNESS => "SET_SYSTEM_BRIGHTNESS",
            SET_GAME => "SET_GAME",
            SET_SLEEP_COLOR => "SET_SLEEP_COLOR",
            SET_USER_GIF => "SET_USER_GIF",
            _ => "UNKNOWN",
        }
    }

    /// Look up a command id by its catalog name (case-insensitive)
    pub fn from_name(name: &str) -> Option<u8> {
        ALL.iter()
            .copied()
            .find(|&id| self::name(id).eq_ignore_ascii_case(name))
    }

    /// Whether the device sends a response frame after this command
    pub fn expects_response(cmd: u8) -> bool {
        !WITHOUT_RESPONSE.contains(&cmd)
    }
}

/// Additive 16-bit checksum: sum of all bytes, mod 65536
pub fn calculate_checksum(data: &[u8]) -> u16 {
    data.iter()
        .fold(0u16, |sum, &b| sum.wrapping_add(u16::from(b)))
}

/// Check `data` against a checksum read off the wire
pub fn validate_checksum(data: &[u8], expected: u16) -> Result<(), PacketError> {
    let wanted = calculate_checksum(data);
    if wanted != expected {
        return Err(PacketError::ChecksumMismatch {
            got: expected,
            wanted,
        });
    }
    Ok(())
}

/// Lowercase hex without separators, as frames are logged and captured
pub fn hexlify(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02x}", b)).collect()
}
