//! Per-trap debug session state machine.

use std::fmt::Write;

use trapstub_proto::{ByteChannel, PacketBuffer, PacketTransport, StubError};

use crate::dispatcher;
use crate::state::{DebugState, ResumeAction};
use crate::stub::StubOptions;
use crate::target::TargetDescription;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Trap taken; the stop reply has not been acknowledged yet.
    Stopped,
    /// Waiting for the debugger's next command.
    AwaitingCommand,
    /// A resume decision was made; the session is over.
    Resolved(ResumeAction),
}

/// What command handlers can reach while a session runs.
pub struct Context<'s, C, const N: usize> {
    pub(crate) transport: &'s mut PacketTransport<C>,
    pub(crate) tx: &'s mut PacketBuffer,
    pub(crate) state: &'s mut DebugState<N>,
    pub(crate) target: &'s TargetDescription,
    pub(crate) options: &'s StubOptions,
}

impl<C: ByteChannel, const N: usize> Context<'_, C, N> {
    /// Send a payload as is.
    pub fn reply(&mut self, payload: &[u8]) -> Result<(), StubError> {
        self.transport.send_packet(payload)?;
        Ok(())
    }

    /// Send the protocol's "unsupported" answer.
    pub fn reply_empty(&mut self) -> Result<(), StubError> {
        self.reply(b"")
    }

    /// Send the payload currently staged in the send buffer.
    pub fn send_staged(&mut self) -> Result<(), StubError> {
        self.transport.send_packet(self.tx.as_slice())?;
        Ok(())
    }

    /// Send `S<hh>` for the current trap signal.
    pub fn send_stop_reply(&mut self) -> Result<(), StubError> {
        let signal = self.state.signal;
        let capacity = self.tx.capacity();
        self.tx.clear();
        write!(self.tx, "S{:02x}", signal.0)
            .map_err(|_| StubError::BufferExhausted { capacity })?;
        self.send_staged()
    }
}

/// One trap's conversation with the debugger.
///
/// Borrows the stub's transport and buffers for its lifetime; only one
/// session can exist at a time.
pub struct Session<'s, C, const N: usize> {
    ctx: Context<'s, C, N>,
    rx: &'s mut PacketBuffer,
    phase: SessionState,
}

impl<'s, C: ByteChannel, const N: usize> Session<'s, C, N> {
    /// Create a session in the [`Stopped`](SessionState::Stopped) state.
    pub fn new(
        transport: &'s mut PacketTransport<C>,
        rx: &'s mut PacketBuffer,
        tx: &'s mut PacketBuffer,
        state: &'s mut DebugState<N>,
        target: &'s TargetDescription,
        options: &'s StubOptions,
    ) -> Self {
        Self {
            ctx: Context {
                transport,
                tx,
                state,
                target,
                options,
            },
            rx,
            phase: SessionState::Stopped,
        }
    }

    /// Return the current session state.
    pub fn state(&self) -> SessionState {
        self.phase
    }

    /// Report the stop, then serve commands until one resumes the target.
    ///
    /// The decision is also recorded in the debug state. Any transport
    /// failure ends the session with that error.
    pub fn run(&mut self) -> Result<ResumeAction, StubError> {
        self.ctx.send_stop_reply()?;

        loop {
            self.phase = SessionState::AwaitingCommand;
            self.ctx.transport.recv_packet(self.rx)?;
            if self.rx.is_empty() {
                continue;
            }

            if let Some(action) = dispatcher::dispatch(&mut self.ctx, self.rx.as_slice())? {
                tracing::debug!(?action, "session resolved");
                self.ctx.state.resume = Some(action);
                self.phase = SessionState::Resolved(action);
                return Ok(action);
            }
        }
    }
}
