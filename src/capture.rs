//! Decode captured app → device traffic back into palette and image
//!
//! Input is hex, as copied from a Bluetooth HCI snoop log.

use thiserror::Error;
use tracing::debug;

use divo_transport::command::BoxImage;
use divo_transport::dispatch::{self, ParsedCommand};
use divo_transport::image::DecodedImage;
use divo_transport::protocol::cmd;
use divo_transport::{frame, DecodeError};

use crate::helpers::{clean_unhexlify, HexError};

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("invalid hex: {0}")]
    Hex(#[from] HexError),

    #[error("no packets given")]
    NoPackets,

    #[error("invalid hex in packet no. {index}: {source}")]
    PacketHex { index: usize, source: HexError },

    #[error("couldn't parse packet no. {index}: {source}")]
    Packet { index: usize, source: DecodeError },

    #[error("couldn't parse packet no. {index}: no parser for {name} ({cmd})")]
    NoParser {
        index: usize,
        cmd: u8,
        name: &'static str,
    },
}

/// Image carried by a capture, with the raw frames it came from
#[derive(Debug, Clone)]
pub struct Capture {
    pub frames: Vec<Vec<u8>>,
    /// Command id of the first frame
    pub cmd: u8,
    pub payload: BoxImage,
    pub decoded: DecodedImage,
}

/// Decode a raw palette (RGB triples, no count byte) and index stream
pub fn decode_direct(palette_hex: &str, payload_hex: &str) -> Result<DecodedImage, CaptureError> {
    let palette = clean_unhexlify(palette_hex)?;
    let payload = clean_unhexlify(payload_hex)?;
    Ok(DecodedImage::decode(&palette, &payload))
}

/// Parse captured command frames, one per string, and decode the image of the first
pub fn decode_packets<S: AsRef<str>>(packets: &[S]) -> Result<Capture, CaptureError> {
    let frames = packets
        .iter()
        .enumerate()
        .map(|(index, hex)| {
            clean_unhexlify(hex.as_ref()).map_err(|source| CaptureError::PacketHex { index, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut commands = Vec::with_capacity(frames.len());
    for (index, raw) in frames.iter().enumerate() {
        let packet = frame::parse(raw).map_err(|e| CaptureError::Packet {
            index,
            source: e.into(),
        })?;
        debug!("packet {}: {} with {} bytes", index, packet.name(), packet.payload.len());

        if !dispatch::has_command_parser(packet.cmd) {
            return Err(CaptureError::NoParser {
                index,
                cmd: packet.cmd,
                name: cmd::name(packet.cmd),
            });
        }
        let command = dispatch::parse_command(packet.cmd, packet.payload)
            .map_err(|e| CaptureError::Packet {
                index,
                source: e.into(),
            })?
            .ok_or(CaptureError::NoParser {
                index,
                cmd: packet.cmd,
                name: cmd::name(packet.cmd),
            })?;
        commands.push((packet.cmd, command));
    }

    let (first_cmd, first) = commands.into_iter().next().ok_or(CaptureError::NoPackets)?;
    let payload = match first {
        ParsedCommand::SetBoxColor(image) | ParsedCommand::SetMulBoxColor(image) => image,
    };

    let decoded = DecodedImage {
        palette: payload.palette.clone(),
        image: payload.to_grid(),
    };
    Ok(Capture {
        frames,
        cmd: first_cmd,
        payload,
        decoded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::hexlify;
    use divo_transport::command::{ParseError, Rgb};
    use divo_transport::PacketError;

    #[test]
    fn test_decode_direct() {
        let decoded = decode_direct("ff0000 0000ff", "02").unwrap();
        assert_eq!(decoded.palette.colors(), &[Rgb::RED, Rgb::BLUE]);
        assert_eq!(decoded.image.get(0, 0), Some(Rgb::RED));
        assert_eq!(decoded.image.get(1, 0), Some(Rgb::BLUE));

        assert!(matches!(
            decode_direct("ff00", "0"),
            Err(CaptureError::Hex(HexError::OddLength { len: 1 }))
        ));
    }

    #[test]
    fn test_no_packets() {
        let empty: [&str; 0] = [];
        assert!(matches!(decode_packets(&empty), Err(CaptureError::NoPackets)));
    }

    #[test]
    fn test_unparsed_packet_is_named() {
        // SET_SYSTEM_BRIGHTNESS has no structured command parser
        let err = decode_packets(&["01040074178f0002"]).unwrap_err();
        assert!(matches!(err, CaptureError::NoParser { index: 0, cmd: 0x74, .. }));
        assert_eq!(
            err.to_string(),
            "couldn't parse packet no. 0: no parser for SET_SYSTEM_BRIGHTNESS (116)"
        );
    }

    #[test]
    fn test_truncated_image_payload_is_named() {
        let raw = frame::build(cmd::SET_BOX_COLOR, &[0, 0, 0]);
        let err = decode_packets(&[hexlify(&raw)]).unwrap_err();
        match err {
            CaptureError::Packet {
                index: 0,
                source: DecodeError::Payload(e),
            } => assert_eq!(e, ParseError::TooShort { expected: 11, got: 3 }),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_corrupt_packet_is_named() {
        let err = decode_packets(&["01040074178f0002", "01040074178e0002"]).unwrap_err();
        // first packet fails before the second is looked at
        assert!(matches!(err, CaptureError::NoParser { index: 0, .. }));

        let err = decode_packets(&["01040074178e0002"]).unwrap_err();
        match err {
            CaptureError::Packet {
                index: 0,
                source: DecodeError::Packet(e),
            } => assert_eq!(
                e,
                PacketError::ChecksumMismatch {
                    got: 0x008e,
                    wanted: 0x008f
                }
            ),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
