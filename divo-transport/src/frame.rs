//! Packet framing for the Divoom serial protocol
//!
//! Command frame (host → device):
//! ```text
//! ┌──────┬─────────┬─────────┬─────┬─────────────┬────────┬────────┬──────┐
//! │ 0x01 │ size_lo │ size_hi │ cmd │ payload ... │ chk_lo │ chk_hi │ 0x02 │
//! └──────┴─────────┴─────────┴─────┴─────────────┴────────┴────────┴──────┘
//! ```
//! Response frame (device → host), no checksum field:
//! ```text
//! ┌──────┬─────────┬─────────┬──────┬─────┬──────┬─────────────┬──────┐
//! │ 0x01 │ size_lo │ size_hi │ 0x04 │ cmd │ 0x55 │ payload ... │ 0x02 │
//! └──────┴─────────┴─────────┴──────┴─────┴──────┴─────────────┴──────┘
//! ```
//! In both shapes `size = len(payload) + 3`. The command-frame checksum is
//! the additive sum of every byte from `size_lo` through the last payload
//! byte.

use tracing::warn;

use crate::error::PacketError;
use crate::protocol::{
    self, cmd, END_OF_PACKET, HEADER_LEN, MAGIC_CHECK, MAGIC_UNKNOWN, SIZE_OVERHEAD,
    START_OF_PACKET,
};

/// Largest payload whose size still fits the 16-bit size field
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize - SIZE_OVERHEAD;

/// Command id and payload of a parsed frame, borrowed from the wire buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet<'a> {
    pub cmd: u8,
    pub payload: &'a [u8],
}

impl Packet<'_> {
    /// Catalog name of the command id ("UNKNOWN" if not in the catalog)
    pub fn name(&self) -> &'static str {
        cmd::name(self.cmd)
    }
}

fn size_field(payload_len: usize) -> [u8; 2] {
    // Callers clamp to MAX_PAYLOAD_LEN, so this cannot truncate
    ((payload_len + SIZE_OVERHEAD) as u16).to_le_bytes()
}

fn clamp_payload(cmd: u8, payload: &[u8]) -> &[u8] {
    if payload.len() > MAX_PAYLOAD_LEN {
        warn!(
            "payload for cmd {} ({}) truncated from {} to {} bytes",
            cmd,
            cmd::name(cmd),
            payload.len(),
            MAX_PAYLOAD_LEN
        );
        &payload[..MAX_PAYLOAD_LEN]
    } else {
        payload
    }
}

/// Build a command frame
///
/// Single-byte commands pass `&[value]`, payload-less commands pass `&[]`.
pub fn build(cmd: u8, payload: &[u8]) -> Vec<u8> {
    let payload = clamp_payload(cmd, payload);
    let mut packet = Vec::with_capacity(HEADER_LEN + payload.len() + 3);
    packet.push(START_OF_PACKET);
    packet.extend_from_slice(&size_field(payload.len()));
    packet.push(cmd);
    packet.extend_from_slice(payload);

    let checksum = protocol::calculate_checksum(&packet[1..]);
    packet.extend_from_slice(&checksum.to_le_bytes());
    packet.push(END_OF_PACKET);
    packet
}

/// Build a response frame, as the device would send it
pub fn build_response(cmd: u8, payload: &[u8]) -> Vec<u8> {
    let payload = clamp_payload(cmd, payload);
    let mut packet = Vec::with_capacity(HEADER_LEN + payload.len() + 3);
    packet.push(START_OF_PACKET);
    packet.extend_from_slice(&size_field(payload.len()));
    packet.extend_from_slice(&[MAGIC_CHECK, cmd, MAGIC_UNKNOWN]);
    packet.extend_from_slice(payload);
    packet.push(END_OF_PACKET);
    packet
}

/// Size field of a frame prefix (start marker + 2 size bytes)
pub fn declared_size(prefix: &[u8]) -> Option<u16> {
    match prefix {
        [_, lo, hi, ..] => Some(u16::from_le_bytes([*lo, *hi])),
        _ => None,
    }
}

/// Locate the end marker of a frame, checking every required index is in bounds
///
/// `min_len` is the number of leading bytes the frame shape reads
/// unconditionally.
fn end_index(packet: &[u8], min_len: usize) -> Result<usize, PacketError> {
    if packet.len() < min_len {
        return Err(PacketError::Incomplete);
    }
    let size = declared_size(packet).ok_or(PacketError::Incomplete)?;
    if usize::from(size) < SIZE_OVERHEAD {
        return Err(PacketError::InvalidSize { size });
    }
    let end = 3 + usize::from(size);
    if packet.len() <= end {
        return Err(PacketError::Incomplete);
    }
    Ok(end)
}

fn check_markers(packet: &[u8], end: usize) -> Result<(), PacketError> {
    if packet[0] != START_OF_PACKET {
        return Err(PacketError::BadStartMarker { value: packet[0] });
    }
    if packet[end] != END_OF_PACKET {
        return Err(PacketError::BadEndMarker { value: packet[end] });
    }
    Ok(())
}

/// Parse a command frame
///
/// Bytes after the end marker are ignored.
pub fn parse(packet: &[u8]) -> Result<Packet<'_>, PacketError> {
    let end = end_index(packet, HEADER_LEN)?;
    check_markers(packet, end)?;

    let checksum = u16::from_le_bytes([packet[end - 2], packet[end - 1]]);
    protocol::validate_checksum(&packet[1..end - 2], checksum)?;

    Ok(Packet {
        cmd: packet[3],
        payload: &packet[HEADER_LEN..end - 2],
    })
}

/// Parse a response frame
pub fn parse_response(packet: &[u8]) -> Result<Packet<'_>, PacketError> {
    let end = end_index(packet, HEADER_LEN + 2)?;
    check_markers(packet, end)?;

    if packet[3] != MAGIC_CHECK {
        return Err(PacketError::BadMagicCheck { value: packet[3] });
    }
    if packet[5] != MAGIC_UNKNOWN {
        return Err(PacketError::BadMagicUnknown { value: packet[5] });
    }

    Ok(Packet {
        cmd: packet[4],
        payload: &packet[6..end],
    })
}

/// Whether `packet` is a well-formed command frame
pub fn is_valid(packet: &[u8]) -> bool {
    parse(packet).is_ok()
}

/// Whether `packet` is a well-formed response frame
pub fn is_valid_response(packet: &[u8]) -> bool {
    parse_response(packet).is_ok()
}
