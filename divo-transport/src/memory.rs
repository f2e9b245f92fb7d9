//! Scripted in-memory transport
//!
//! Stands in for the serial link in tests and offline tools: inbound bytes
//! are queued up front, outbound writes are recorded.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::TransportError;
use crate::frame;
use crate::Transport;

#[derive(Default)]
struct State {
    connected: bool,
    inbound: VecDeque<u8>,
    written: Vec<Vec<u8>>,
    flushed: usize,
}

/// Transport backed by a byte queue
#[derive(Default)]
pub struct MemoryTransport {
    state: Mutex<State>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue raw bytes for the next reads
    pub fn push_inbound(&self, data: &[u8]) {
        self.state.lock().inbound.extend(data);
    }

    /// Queue a response frame, as the device would send it
    pub fn push_response(&self, cmd: u8, payload: &[u8]) {
        self.push_inbound(&frame::build_response(cmd, payload));
    }

    /// Every buffer passed to `write`, in order
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.state.lock().written.clone()
    }

    /// Most recent write
    pub fn last_written(&self) -> Option<Vec<u8>> {
        self.state.lock().written.last().cloned()
    }

    /// Bytes still waiting to be read
    pub fn pending(&self) -> usize {
        self.state.lock().inbound.len()
    }

    /// Number of `flush` calls so far
    pub fn flush_count(&self) -> usize {
        self.state.lock().flushed
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }
}

impl Transport for MemoryTransport {
    fn connect(&self) -> Result<(), TransportError> {
        self.state.lock().connected = true;
        Ok(())
    }

    fn flush(&self) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if !state.connected {
            return Err(TransportError::NotConnected);
        }
        if !state.inbound.is_empty() {
            debug!("flush discarded {} bytes", state.inbound.len());
        }
        state.inbound.clear();
        state.flushed += 1;
        Ok(())
    }

    fn write(&self, data: &[u8]) -> Result<usize, TransportError> {
        let mut state = self.state.lock();
        if !state.connected {
            return Err(TransportError::NotConnected);
        }
        state.written.push(data.to_vec());
        Ok(data.len())
    }

    fn read(&self, count: usize) -> Result<Vec<u8>, TransportError> {
        let mut state = self.state.lock();
        if !state.connected {
            return Err(TransportError::NotConnected);
        }
        let n = count.min(state.inbound.len());
        Ok(state.inbound.drain(..n).collect())
    }
}
