//! trapstub-arch — glue between a CPU trap frame and the debug stub.
//!
//! An architecture implements [`CpuContext`] for its saved trap frame;
//! [`handle_trap`] copies the registers into a [`DebugState`], runs the
//! stub and writes the (possibly single-stepping) registers back.

pub mod x86_64;

use thiserror::Error;
use trapstub_core::{DebugState, RegisterFile, ResumeAction, Signal, Stub};
use trapstub_proto::ByteChannel;

/// Errors raised by the trap adapter itself.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArchError {
    /// The trap number has no debug signal on this architecture; the
    /// caller's trap routing is misconfigured.
    #[error("trap {0} is not routed to the debug stub")]
    UnsupportedTrap(u32),
}

/// A saved CPU context with `N` debugger-visible registers.
pub trait CpuContext<const N: usize> {
    /// Copy the trap frame into a register file, in debugger order.
    fn save(&self) -> RegisterFile<N>;

    /// Write a register file back into the trap frame.
    fn restore(&mut self, registers: &RegisterFile<N>);

    /// The signal reported for a hardware trap, or `None` if the trap is not
    /// a debug event.
    fn signal_for_trap(trapnr: u32) -> Option<Signal>;

    /// Set or clear the hardware single-step flag.
    fn set_single_step(registers: &mut RegisterFile<N>, enabled: bool);

    /// The instruction pointer held in `registers`.
    fn program_counter(registers: &RegisterFile<N>) -> u64;
}

/// Serve one debug trap.
///
/// A session that fails (lost debugger, broken channel) is logged and the
/// target resumes with [`ResumeAction::Continue`]. Trap numbers the
/// architecture does not route to the debugger are rejected before the
/// stub sees them.
pub fn handle_trap<C, X, const N: usize>(
    stub: &mut Stub<C>,
    trapnr: u32,
    ctx: &mut X,
) -> Result<ResumeAction, ArchError>
where
    C: ByteChannel,
    X: CpuContext<N>,
{
    let signal = X::signal_for_trap(trapnr).ok_or(ArchError::UnsupportedTrap(trapnr))?;

    let mut state = DebugState::new(ctx.save(), signal);
    tracing::debug!(
        trapnr,
        %signal,
        pc = format_args!("{:#x}", X::program_counter(&state.registers)),
        "debug trap"
    );

    let action = match stub.trap(&mut state) {
        Ok(action) => action,
        Err(err) => {
            tracing::error!(%err, "debug session failed, resuming target");
            ResumeAction::Continue
        }
    };

    X::set_single_step(&mut state.registers, action == ResumeAction::SingleStep);
    ctx.restore(&state.registers);
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arch_error_display() {
        assert_eq!(
            ArchError::UnsupportedTrap(14).to_string(),
            "trap 14 is not routed to the debug stub"
        );
    }
}
