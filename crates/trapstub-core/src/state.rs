//! Per-trap debug state.

use std::fmt;

/// Trap cause reported to the debugger in stop replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signal(pub u8);

impl Signal {
    /// Trace/breakpoint trap (`SIGTRAP`).
    pub const TRAP: Signal = Signal(5);
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Signal::TRAP => write!(f, "SIGTRAP"),
            Signal(n) => write!(f, "signal {n}"),
        }
    }
}

/// How the debuggee resumes once the session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeAction {
    /// Run freely until the next trap.
    Continue,
    /// Execute one instruction, then trap again.
    SingleStep,
}

/// Fixed-size register values indexed by an architecture's register
/// enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterFile<const N: usize> {
    values: [u64; N],
}

impl<const N: usize> RegisterFile<N> {
    /// Number of registers on this architecture.
    pub const LEN: usize = N;

    /// A register file with every value zeroed.
    pub fn new() -> Self {
        Self { values: [0; N] }
    }

    /// Read a register.
    pub fn get(&self, reg: impl Into<usize>) -> u64 {
        self.values[reg.into()]
    }

    /// Write a register.
    pub fn set(&mut self, reg: impl Into<usize>, value: u64) {
        self.values[reg.into()] = value;
    }

    /// All values in architecture order.
    pub fn as_slice(&self) -> &[u64] {
        &self.values
    }
}

impl<const N: usize> Default for RegisterFile<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything one trap hands to the stub: registers, the trap signal, and
/// the resume decision once a command makes it.
#[derive(Debug, Clone)]
pub struct DebugState<const N: usize> {
    /// Registers captured from the CPU context.
    pub registers: RegisterFile<N>,
    /// Why execution stopped.
    pub signal: Signal,
    /// Set when the debugger resolves the session.
    pub resume: Option<ResumeAction>,
}

impl<const N: usize> DebugState<N> {
    /// State for a fresh trap; no resume decision yet.
    pub fn new(registers: RegisterFile<N>, signal: Signal) -> Self {
        Self {
            registers,
            signal,
            resume: None,
        }
    }
}
