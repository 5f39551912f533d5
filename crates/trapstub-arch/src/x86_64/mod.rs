//! x86-64 trap adapter.

use trapstub_core::{RegisterFile, ResumeAction, Signal, Stub, TargetDescription};
use trapstub_proto::ByteChannel;

use crate::{ArchError, CpuContext};

/// Number of registers in the debugger's amd64 core set.
pub const NUM_REGS: usize = 24;

/// `#DB`, raised after a single step or a hardware breakpoint.
pub const TRAP_DEBUG: u32 = 1;
/// `#BP`, raised by `int3`.
pub const TRAP_BREAKPOINT: u32 = 3;

/// Trap flag in RFLAGS.
pub const EFLAGS_TF: u64 = 1 << 8;

/// Target description served to the debugger.
pub static TARGET_XML: &[u8] = include_bytes!("target.xml");

/// The built-in x86-64 target description.
pub fn target_description() -> TargetDescription {
    TargetDescription::from_static(TARGET_XML)
}

/// Registers in GDB's amd64 numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Reg {
    Rax,
    Rbx,
    Rcx,
    Rdx,
    Rsi,
    Rdi,
    Rbp,
    Rsp,
    R8,
    R9,
    R10,
    R11,
    R12,
    R13,
    R14,
    R15,
    Rip,
    Eflags,
    Cs,
    Ss,
    Ds,
    Es,
    Fs,
    Gs,
}

impl From<Reg> for usize {
    fn from(reg: Reg) -> usize {
        reg as usize
    }
}

/// Register file for x86-64.
pub type Registers = RegisterFile<NUM_REGS>;

/// General-purpose state saved by the trap entry path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrapFrame {
    pub rax: u64,
    pub rbx: u64,
    pub rcx: u64,
    pub rdx: u64,
    pub rsi: u64,
    pub rdi: u64,
    pub rbp: u64,
    pub rsp: u64,
    pub r8: u64,
    pub r9: u64,
    pub r10: u64,
    pub r11: u64,
    pub r12: u64,
    pub r13: u64,
    pub r14: u64,
    pub r15: u64,
    pub rip: u64,
    pub eflags: u64,
    pub cs: u64,
    pub ss: u64,
    pub ds: u64,
    pub es: u64,
    pub fs: u64,
    pub gs: u64,
}

impl TrapFrame {
    fn slots(&self) -> [(Reg, u64); NUM_REGS] {
        [
            (Reg::Rax, self.rax),
            (Reg::Rbx, self.rbx),
            (Reg::Rcx, self.rcx),
            (Reg::Rdx, self.rdx),
            (Reg::Rsi, self.rsi),
            (Reg::Rdi, self.rdi),
            (Reg::Rbp, self.rbp),
            (Reg::Rsp, self.rsp),
            (Reg::R8, self.r8),
            (Reg::R9, self.r9),
            (Reg::R10, self.r10),
            (Reg::R11, self.r11),
            (Reg::R12, self.r12),
            (Reg::R13, self.r13),
            (Reg::R14, self.r14),
            (Reg::R15, self.r15),
            (Reg::Rip, self.rip),
            (Reg::Eflags, self.eflags),
            (Reg::Cs, self.cs),
            (Reg::Ss, self.ss),
            (Reg::Ds, self.ds),
            (Reg::Es, self.es),
            (Reg::Fs, self.fs),
            (Reg::Gs, self.gs),
        ]
    }

    fn slot_mut(&mut self, reg: Reg) -> &mut u64 {
        match reg {
            Reg::Rax => &mut self.rax,
            Reg::Rbx => &mut self.rbx,
            Reg::Rcx => &mut self.rcx,
            Reg::Rdx => &mut self.rdx,
            Reg::Rsi => &mut self.rsi,
            Reg::Rdi => &mut self.rdi,
            Reg::Rbp => &mut self.rbp,
            Reg::Rsp => &mut self.rsp,
            Reg::R8 => &mut self.r8,
            Reg::R9 => &mut self.r9,
            Reg::R10 => &mut self.r10,
            Reg::R11 => &mut self.r11,
            Reg::R12 => &mut self.r12,
            Reg::R13 => &mut self.r13,
            Reg::R14 => &mut self.r14,
            Reg::R15 => &mut self.r15,
            Reg::Rip => &mut self.rip,
            Reg::Eflags => &mut self.eflags,
            Reg::Cs => &mut self.cs,
            Reg::Ss => &mut self.ss,
            Reg::Ds => &mut self.ds,
            Reg::Es => &mut self.es,
            Reg::Fs => &mut self.fs,
            Reg::Gs => &mut self.gs,
        }
    }
}

impl CpuContext<NUM_REGS> for TrapFrame {
    fn save(&self) -> Registers {
        let mut registers = Registers::new();
        for (reg, value) in self.slots() {
            registers.set(reg, value);
        }
        registers
    }

    fn restore(&mut self, registers: &Registers) {
        for (reg, _) in self.slots() {
            *self.slot_mut(reg) = registers.get(reg);
        }
    }

    fn signal_for_trap(trapnr: u32) -> Option<Signal> {
        match trapnr {
            TRAP_DEBUG | TRAP_BREAKPOINT => Some(Signal::TRAP),
            _ => None,
        }
    }

    fn set_single_step(registers: &mut Registers, enabled: bool) {
        let eflags = registers.get(Reg::Eflags);
        let eflags = if enabled {
            eflags | EFLAGS_TF
        } else {
            eflags & !EFLAGS_TF
        };
        registers.set(Reg::Eflags, eflags);
    }

    fn program_counter(registers: &Registers) -> u64 {
        registers.get(Reg::Rip)
    }
}

/// Serve a debug trap taken with `frame` saved.
pub fn handle_trap<C: ByteChannel>(
    stub: &mut Stub<C>,
    trapnr: u32,
    frame: &mut TrapFrame,
) -> Result<ResumeAction, ArchError> {
    crate::handle_trap::<C, TrapFrame, NUM_REGS>(stub, trapnr, frame)
}
