//! PrinterTransport middleware for monitoring transport traffic
//!
//! Wraps any Transport implementation and logs every command frame written
//! and every response frame read, decoded through the dispatcher.
//!
//! # Example
//!
//! ```ignore
//! use divo_transport::{MemoryTransport, PrinterConfig, PacketFilter, PrinterTransport};
//!
//! let config = PrinterConfig::default().with_hex(true);
//! let monitored = PrinterTransport::wrap(Arc::new(MemoryTransport::new()), config);
//! // Now all frames will be logged
//! ```

use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, warn};

use crate::dispatch::{self, ParsedCommand, ParsedResponse};
use crate::error::{DecodeError, TransportError};
use crate::frame;
use crate::protocol::{cmd, hexlify, END_OF_PACKET, RESPONSE_PREFIX_LEN, START_OF_PACKET};
use crate::Transport;

/// Output format for the printer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Packet filter for selective display
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PacketFilter {
    #[default]
    All,
    Commands,
    Responses,
    Cmd(u8),
}

impl FromStr for PacketFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" | "" => Ok(Self::All),
            "commands" | "cmd" | "cmds" => Ok(Self::Commands),
            "responses" | "response" | "rsp" => Ok(Self::Responses),
            s if s.starts_with("cmd=") || s.starts_with("0x") => {
                let hex_str = s.strip_prefix("cmd=").unwrap_or(s);
                let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
                u8::from_str_radix(hex_str, 16)
                    .map(Self::Cmd)
                    .map_err(|e| format!("Invalid command byte: {}", e))
            }
            s => cmd::from_name(s)
                .map(Self::Cmd)
                .ok_or_else(|| format!("Unknown filter: {}", s)),
        }
    }
}

/// Configuration for the PrinterTransport
#[derive(Debug, Clone, Default)]
pub struct PrinterConfig {
    /// Show raw hex dump alongside decoded output
    pub show_hex: bool,
    /// Filter for selective display
    pub filter: PacketFilter,
    /// Output format
    pub format: OutputFormat,
}

impl PrinterConfig {
    /// Create config with hex output setting
    pub fn with_hex(mut self, show: bool) -> Self {
        self.show_hex = show;
        self
    }

    /// Create config with filter
    pub fn with_filter(mut self, filter: PacketFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Create config with output format
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Direction {
    Cmd,
    Rsp,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Parsed {
    Command(ParsedCommand),
    Response(ParsedResponse),
}

/// One decoded frame, as emitted in JSON output
#[derive(Debug, Serialize)]
struct PrintedFrame<'a> {
    dir: Direction,
    cmd: u8,
    name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    hex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parsed: Option<Parsed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

/// Transport middleware that logs all frames
pub struct PrinterTransport {
    inner: Arc<dyn Transport>,
    config: PrinterConfig,
    /// Response bytes read so far that do not form a complete frame yet
    rx: Mutex<Vec<u8>>,
}

impl PrinterTransport {
    pub fn new(transport: Arc<dyn Transport>, config: PrinterConfig) -> Self {
        Self {
            inner: transport,
            config,
            rx: Mutex::new(Vec::new()),
        }
    }

    /// Wrap a transport with printing middleware
    pub fn wrap(transport: Arc<dyn Transport>, config: PrinterConfig) -> Arc<dyn Transport> {
        Arc::new(Self::new(transport, config))
    }

    fn should_show(&self, dir: Direction, id: u8) -> bool {
        match &self.config.filter {
            PacketFilter::All => true,
            PacketFilter::Commands => dir == Direction::Cmd,
            PacketFilter::Responses => dir == Direction::Rsp,
            PacketFilter::Cmd(c) => *c == id,
        }
    }

    /// Render one frame; `None` if the filter hides it
    fn render(
        &self,
        dir: Direction,
        id: u8,
        raw: &[u8],
        parsed: Result<Option<Parsed>, DecodeError>,
    ) -> Option<String> {
        if !self.should_show(dir, id) {
            return None;
        }
        let hex_dump = self.config.show_hex.then(|| hexlify(raw));
        let (parsed, error) = match parsed {
            Ok(p) => (p, None),
            Err(e) => (None, Some(e.to_string())),
        };

        match self.config.format {
            OutputFormat::Json => {
                let line = PrintedFrame {
                    dir,
                    cmd: id,
                    name: cmd::name(id),
                    hex: hex_dump,
                    parsed,
                    error: error.as_deref(),
                };
                match serde_json::to_string(&line) {
                    Ok(json) => Some(json),
                    Err(e) => {
                        warn!("failed to serialize frame: {}", e);
                        None
                    }
                }
            }
            OutputFormat::Text => {
                let arrow = match dir {
                    Direction::Cmd => ">>> CMD",
                    Direction::Rsp => "<<< RSP",
                };
                let mut line = format!("{}  0x{:02x} {}", arrow, id, cmd::name(id));
                match (&parsed, &error) {
                    (_, Some(e)) => line.push_str(&format!("  error: {}", e)),
                    (Some(Parsed::Command(c)), None) => line.push_str(&format!("  {:?}", c)),
                    (Some(Parsed::Response(r)), None) => line.push_str(&format!("  {:?}", r)),
                    (None, None) => {}
                }
                if let Some(h) = hex_dump {
                    line.push_str(&format!("\n    HEX  {}", h));
                }
                Some(line)
            }
        }
    }

    fn print_command(&self, data: &[u8]) {
        let Some(&id) = data.get(3) else {
            warn!("short write of {} bytes", data.len());
            return;
        };
        let parsed = dispatch::decode_packet(data).map(|(_, c)| c.map(Parsed::Command));
        if let Some(line) = self.render(Direction::Cmd, id, data, parsed) {
            info!("{}", line);
        }
    }

    fn print_response(&self, raw: &[u8]) {
        let id = raw.get(4).copied().unwrap_or(0);
        let parsed =
            dispatch::decode_response_packet(raw).map(|(_, r)| r.map(Parsed::Response));
        if let Some(line) = self.render(Direction::Rsp, id, raw, parsed) {
            info!("{}", line);
        }
    }

    /// Accumulate read chunks and log each response frame once complete
    fn collect_response(&self, chunk: &[u8]) {
        let mut rx = self.rx.lock();
        rx.extend_from_slice(chunk);

        loop {
            if rx.is_empty() {
                return;
            }
            if rx[0] != START_OF_PACKET {
                warn!("discarding {} unframed bytes: {}", rx.len(), hexlify(&rx));
                rx.clear();
                return;
            }
            let Some(size) = frame::declared_size(&rx) else {
                return;
            };
            let end = RESPONSE_PREFIX_LEN + usize::from(size);
            if rx.len() <= end {
                return;
            }
            let raw: Vec<u8> = rx.drain(..=end).collect();
            if raw[end] != END_OF_PACKET {
                warn!("response without end marker: {}", hexlify(&raw));
                continue;
            }
            self.print_response(&raw);
        }
    }
}

impl Transport for PrinterTransport {
    fn connect(&self) -> Result<(), TransportError> {
        self.inner.connect()
    }

    fn flush(&self) -> Result<(), TransportError> {
        self.rx.lock().clear();
        self.inner.flush()
    }

    fn write(&self, data: &[u8]) -> Result<usize, TransportError> {
        self.print_command(data);
        self.inner.write(data)
    }

    fn read(&self, count: usize) -> Result<Vec<u8>, TransportError> {
        let result = self.inner.read(count)?;
        self.collect_response(&result);
        Ok(result)
    }
}
