//! Fixed-capacity packet buffer.

use std::fmt;

use crate::error::StubError;

/// Default capacity of receive and send buffers, matching the packet size
/// advertised to the debugger.
pub const DEFAULT_PACKET_SIZE: usize = 4096;

/// A byte buffer that never grows past the capacity it was created with.
///
/// One buffer is allocated for receiving and one for sending; both are
/// reused for every packet.
#[derive(Debug, Clone)]
pub struct PacketBuffer {
    data: Vec<u8>,
    capacity: usize,
}

impl PacketBuffer {
    /// Allocate an empty buffer holding at most `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Maximum number of bytes the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of bytes currently held.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Free space left before the buffer is exhausted.
    pub fn remaining(&self) -> usize {
        self.capacity - self.data.len()
    }

    /// The bytes currently held.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Drop the contents, keeping the allocation.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Append one byte.
    pub fn push(&mut self, byte: u8) -> Result<(), StubError> {
        if self.data.len() >= self.capacity {
            return Err(self.exhausted());
        }
        self.data.push(byte);
        Ok(())
    }

    /// Append a run of bytes; nothing is written if they do not all fit.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<(), StubError> {
        if bytes.len() > self.remaining() {
            return Err(self.exhausted());
        }
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    fn exhausted(&self) -> StubError {
        StubError::BufferExhausted {
            capacity: self.capacity,
        }
    }
}

impl Default for PacketBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_PACKET_SIZE)
    }
}

impl fmt::Write for PacketBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.extend_from_slice(s.as_bytes()).map_err(|_| fmt::Error)
    }
}
