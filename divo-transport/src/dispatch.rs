//! Command id → payload codec lookup
//!
//! Unknown ids are not a protocol fault: the device and the official app
//! use plenty of undocumented commands. They are logged and yield `None`.

use serde::Serialize;
use tracing::warn;

use crate::command::{BoxImage, GetBoxMode, ParseError};
use crate::error::DecodeError;
use crate::frame::{self, Packet};
use crate::protocol::cmd;

/// Structured payload of a host → device command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParsedCommand {
    SetBoxColor(BoxImage),
    SetMulBoxColor(BoxImage),
}

/// Structured payload of a device → host response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParsedResponse {
    GetBoxMode(GetBoxMode),
}

type Codec<T> = fn(&[u8]) -> Result<T, ParseError>;

fn set_box_color(data: &[u8]) -> Result<ParsedCommand, ParseError> {
    BoxImage::decode_single(data).map(ParsedCommand::SetBoxColor)
}

fn set_mul_box_color(data: &[u8]) -> Result<ParsedCommand, ParseError> {
    BoxImage::decode_multi(data).map(ParsedCommand::SetMulBoxColor)
}

fn get_box_mode(data: &[u8]) -> Result<ParsedResponse, ParseError> {
    GetBoxMode::from_data(data).map(ParsedResponse::GetBoxMode)
}

const COMMAND_CODECS: &[(u8, Codec<ParsedCommand>)] = &[
    (cmd::SET_BOX_COLOR, set_box_color),
    (cmd::SET_MUL_BOX_COLOR, set_mul_box_color),
];

const RESPONSE_CODECS: &[(u8, Codec<ParsedResponse>)] = &[(cmd::GET_BOX_MODE, get_box_mode)];

fn lookup<T>(table: &[(u8, Codec<T>)], id: u8) -> Option<Codec<T>> {
    table
        .iter()
        .find(|(entry, _)| *entry == id)
        .map(|(_, codec)| *codec)
}

/// Whether a structured command parser exists for `id`
pub fn has_command_parser(id: u8) -> bool {
    lookup(COMMAND_CODECS, id).is_some()
}

/// Whether a structured response parser exists for `id`
pub fn has_response_parser(id: u8) -> bool {
    lookup(RESPONSE_CODECS, id).is_some()
}

/// Decode a command payload; `Ok(None)` if no parser exists for `id`
pub fn parse_command(id: u8, data: &[u8]) -> Result<Option<ParsedCommand>, ParseError> {
    match lookup(COMMAND_CODECS, id) {
        Some(codec) => codec(data).map(Some),
        None => {
            warn!("parse command not implemented {} ({})", cmd::name(id), id);
            Ok(None)
        }
    }
}

/// Decode a response payload; `Ok(None)` if no parser exists for `id`
pub fn parse_response(id: u8, data: &[u8]) -> Result<Option<ParsedResponse>, ParseError> {
    match lookup(RESPONSE_CODECS, id) {
        Some(codec) => codec(data).map(Some),
        None => {
            warn!("parse response not implemented {} ({})", cmd::name(id), id);
            Ok(None)
        }
    }
}

/// Parse a command frame and its payload in one step
pub fn decode_packet(packet: &[u8]) -> Result<(Packet<'_>, Option<ParsedCommand>), DecodeError> {
    let parsed = frame::parse(packet)?;
    let command = parse_command(parsed.cmd, parsed.payload)?;
    Ok((parsed, command))
}

/// Parse a response frame and its payload in one step
pub fn decode_response_packet(
    packet: &[u8],
) -> Result<(Packet<'_>, Option<ParsedResponse>), DecodeError> {
    let parsed = frame::parse_response(packet)?;
    let response = parse_response(parsed.cmd, parsed.payload)?;
    Ok((parsed, response))
}
