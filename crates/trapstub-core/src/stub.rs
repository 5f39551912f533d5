//! The stub: long-lived owner of the channel, packet buffers and target
//! description; entry point for every trap.

use trapstub_proto::{
    ByteChannel, PacketBuffer, PacketTransport, StubError, DEFAULT_MAX_RETRIES,
    DEFAULT_PACKET_SIZE,
};

use crate::session::Session;
use crate::state::{DebugState, ResumeAction};
use crate::target::TargetDescription;
use crate::xfer::XferEncoding;

/// Tunables fixed when the stub is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubOptions {
    /// Retransmissions (and frame restarts) tolerated per packet.
    pub max_retries: u32,
    /// Capacity of the receive and send buffers.
    pub packet_size: usize,
    /// How `qXfer` page data is encoded.
    pub xfer_encoding: XferEncoding,
}

impl Default for StubOptions {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            packet_size: DEFAULT_PACKET_SIZE,
            xfer_encoding: XferEncoding::Raw,
        }
    }
}

/// A GDB remote stub bound to one byte channel.
///
/// Traps are not re-entrant: `trap` takes `&mut self`, so a session must
/// finish before the next one starts.
#[derive(Debug)]
pub struct Stub<C> {
    transport: PacketTransport<C>,
    rx: PacketBuffer,
    tx: PacketBuffer,
    target: TargetDescription,
    options: StubOptions,
    initialized: bool,
    attached: bool,
}

impl<C: ByteChannel> Stub<C> {
    /// Build a stub; the channel is not touched until [`Stub::init`].
    pub fn new(channel: C, target: TargetDescription, options: StubOptions) -> Self {
        Self {
            transport: PacketTransport::new(channel, options.max_retries),
            rx: PacketBuffer::new(options.packet_size),
            tx: PacketBuffer::new(options.packet_size),
            target,
            options,
            initialized: false,
            attached: false,
        }
    }

    /// Set up the byte channel. Traps taken before this resume at once.
    pub fn init(&mut self) -> Result<(), StubError> {
        if self.initialized {
            return Ok(());
        }
        self.transport.channel_mut().init()?;
        self.initialized = true;
        tracing::info!(
            packet_size = self.options.packet_size,
            max_retries = self.options.max_retries,
            target_len = self.target.len(),
            "debug stub initialized"
        );
        Ok(())
    }

    /// Whether [`Stub::init`] has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether a debugger session has been entered at least once.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Return a reference to the underlying channel.
    pub fn channel(&self) -> &C {
        self.transport.channel()
    }

    /// Return a mutable reference to the underlying channel.
    pub fn channel_mut(&mut self) -> &mut C {
        self.transport.channel_mut()
    }

    /// Handle one trap: talk to the debugger until it resumes the target.
    ///
    /// Without a prior [`Stub::init`] this resolves to
    /// [`ResumeAction::Continue`] without any I/O.
    pub fn trap<const N: usize>(
        &mut self,
        state: &mut DebugState<N>,
    ) -> Result<ResumeAction, StubError> {
        if !self.initialized {
            tracing::debug!(signal = %state.signal, "trap before stub init, continuing");
            state.resume = Some(ResumeAction::Continue);
            return Ok(ResumeAction::Continue);
        }

        if !self.attached {
            self.attached = true;
            tracing::info!("debugger session attached");
        }

        Session::new(
            &mut self.transport,
            &mut self.rx,
            &mut self.tx,
            state,
            &self.target,
            &self.options,
        )
        .run()
    }
}
