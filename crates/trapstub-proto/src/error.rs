//! Stub error types.

use thiserror::Error;

/// Failures reported by a [`ByteChannel`](crate::channel::ByteChannel).
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The underlying device or stream failed.
    #[error("channel I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The remote side went away (end of stream).
    #[error("channel closed by peer")]
    Closed,
}

/// Errors from packet transport and command handling.
#[derive(Debug, Error)]
pub enum StubError {
    /// The byte channel failed while reading or writing.
    #[error("byte channel failure: {0}")]
    Channel(#[from] ChannelError),

    /// A received frame did not match its checksum trailer.
    ///
    /// Handled inside the transport by NACKing the frame; never returned.
    #[error("checksum mismatch: frame carried {received:02x}, computed {computed:02x}")]
    ChecksumMismatch {
        /// Checksum sent by the peer, if its digits were valid hex.
        received: u8,
        /// Checksum computed over the received payload.
        computed: u8,
    },

    /// The bounded retry budget for a send or resync ran out.
    #[error("retry limit exceeded after {attempts} attempts")]
    RetryLimitExceeded {
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    /// A packet did not fit the fixed buffer capacity.
    #[error("packet exceeds buffer capacity of {capacity} bytes")]
    BufferExhausted {
        /// Capacity of the buffer that overflowed.
        capacity: usize,
    },

    /// Malformed command arguments or hex text.
    #[error("protocol syntax error: {0}")]
    Syntax(String),
}

impl StubError {
    /// Whether the error is handled locally rather than ending a session.
    ///
    /// Checksum mismatches are retried by the transport and syntax errors
    /// turn into an empty reply; everything else aborts the exchange.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StubError::ChecksumMismatch { .. } | StubError::Syntax(_)
        )
    }
}
