//! A toy x86-64 CPU to debug over the wire.
//!
//! Instructions are one byte long, so `rip - base` indexes the program.
//! The machine traps with `#BP` before the first instruction and on every
//! `int3`, and with `#DB` after each instruction executed with TF set.

use trapstub_arch::x86_64::{self, Reg, TrapFrame, EFLAGS_TF, TRAP_BREAKPOINT, TRAP_DEBUG};
use trapstub_arch::{ArchError, CpuContext};
use trapstub_core::{ResumeAction, Stub};
use trapstub_proto::ByteChannel;

/// Load address of the program.
pub const BASE: u64 = 0x0040_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insn {
    Nop,
    /// `add reg, imm`
    Add(Reg, u64),
    /// `int3`
    Breakpoint,
}

/// Counters reported when the program runs off its end.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub executed: usize,
    pub traps: usize,
    pub steps: usize,
}

#[derive(Debug)]
pub struct Machine {
    frame: TrapFrame,
    program: Vec<Insn>,
}

impl Machine {
    pub fn new(program: Vec<Insn>) -> Self {
        let frame = TrapFrame {
            rip: BASE,
            rsp: 0x7fff_f000,
            eflags: 0x202,
            cs: 0x33,
            ss: 0x2b,
            ..TrapFrame::default()
        };
        Self { frame, program }
    }

    /// Sum 1..=4 into `rax`, with a breakpoint half way.
    pub fn demo() -> Self {
        Self::new(vec![
            Insn::Add(Reg::Rax, 1),
            Insn::Add(Reg::Rax, 2),
            Insn::Breakpoint,
            Insn::Add(Reg::Rax, 3),
            Insn::Nop,
            Insn::Add(Reg::Rax, 4),
        ])
    }

    pub fn frame(&self) -> &TrapFrame {
        &self.frame
    }

    /// Run until the program counter leaves the program.
    pub fn run<C: ByteChannel>(&mut self, stub: &mut Stub<C>) -> Result<RunSummary, ArchError> {
        let mut summary = RunSummary::default();
        self.trap(stub, TRAP_BREAKPOINT, &mut summary)?;

        while let Some(insn) = self.fetch() {
            self.execute(insn);
            summary.executed += 1;

            if insn == Insn::Breakpoint {
                self.trap(stub, TRAP_BREAKPOINT, &mut summary)?;
            } else if self.frame.eflags & EFLAGS_TF != 0 {
                self.trap(stub, TRAP_DEBUG, &mut summary)?;
            }
        }

        tracing::info!(
            executed = summary.executed,
            traps = summary.traps,
            steps = summary.steps,
            rax = self.frame.rax,
            "program finished"
        );
        Ok(summary)
    }

    fn trap<C: ByteChannel>(
        &mut self,
        stub: &mut Stub<C>,
        trapnr: u32,
        summary: &mut RunSummary,
    ) -> Result<(), ArchError> {
        summary.traps += 1;
        if x86_64::handle_trap(stub, trapnr, &mut self.frame)? == ResumeAction::SingleStep {
            summary.steps += 1;
        }
        Ok(())
    }

    fn fetch(&self) -> Option<Insn> {
        let index = self.frame.rip.checked_sub(BASE)?;
        self.program.get(usize::try_from(index).ok()?).copied()
    }

    fn execute(&mut self, insn: Insn) {
        let mut regs = self.frame.save();
        if let Insn::Add(reg, imm) = insn {
            regs.set(reg, regs.get(reg).wrapping_add(imm));
        }
        regs.set(Reg::Rip, regs.get(Reg::Rip) + 1);
        self.frame.restore(&regs);
    }
}
