//! trapstub-proto — GDB remote serial protocol plumbing.
//!
//! This crate holds the leaves of the debug stub: hex/checksum codec,
//! fixed-capacity packet buffers, the byte channel abstraction, and the
//! acknowledged packet transport built on top of it.

pub mod buffer;
pub mod channel;
pub mod codec;
pub mod error;
pub mod transport;

// Re-export key types for convenience.
pub use buffer::{PacketBuffer, DEFAULT_PACKET_SIZE};
pub use channel::{ByteChannel, ScriptedChannel, StreamChannel};
pub use error::{ChannelError, StubError};
pub use transport::{PacketTransport, DEFAULT_MAX_RETRIES};
