//! trapstub-core — the GDB stub protocol engine.
//!
//! A trap hands the [`Stub`] a [`DebugState`]; the stub reports the stop to
//! the debugger, serves its queries and returns the [`ResumeAction`] it
//! picked. Supported packets: `?`, `c`, `s`, `qSupported` and
//! `qXfer:features:read`.

pub mod capabilities;
pub mod dispatcher;
pub mod session;
pub mod state;
pub mod stub;
pub mod target;
pub mod xfer;

// Re-export key types for convenience.
pub use session::{Session, SessionState};
pub use state::{DebugState, RegisterFile, ResumeAction, Signal};
pub use stub::{Stub, StubOptions};
pub use target::TargetDescription;
pub use xfer::XferEncoding;
