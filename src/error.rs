//! Runtime error types.
//!
//! Mirrors the split the evaluator's specification draws between *ordinary
//! computed values* (never an `Err`) and *fatal conditions* (always an
//! `Err`, always terminal). [`Fault`] enumerates the fatal conditions that
//! can be diagnosed locally, from inside a single opcode's implementation.
//! [`Halt`] covers the remaining unspecified failures — I/O and allocation —
//! that the runtime bridge can report. [`VmError`] is what actually leaves
//! the evaluator.

use std::io;
use thiserror::Error;

/// A fatal condition raised while decoding or executing a single
/// instruction. Every variant here corresponds to one of the fatal
/// conditions enumerated for error handling: unknown opcodes, arithmetic
/// traps, and stack discipline violations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Fault {
    /// `(h, l)` did not name any instruction in any group, or `l` was out of
    /// range within its group.
    #[error("unknown opcode {h:#x}-{l:#x} at ip={ip:#x}")]
    UnknownOpcode { h: u8, l: u8, ip: usize },

    /// A `BINOP` division or modulo with a zero divisor.
    #[error("division or modulo by zero at ip={ip:#x}")]
    DivisionByZero { ip: usize },

    /// A push would exceed the operand stack's fixed capacity.
    #[error("operand stack overflow (capacity {capacity}) at ip={ip:#x}")]
    StackOverflow { capacity: usize, ip: usize },

    /// A pop or peek was attempted on an empty operand stack.
    #[error("operand stack underflow at ip={ip:#x}")]
    StackUnderflow { ip: usize },

    /// The code region ended mid-instruction (a truncated immediate or a
    /// fetch past the end of the code region).
    #[error("unexpected end of code region at ip={ip:#x}")]
    TruncatedCode { ip: usize },

    /// A location kind byte for `LD`/`LDA`/`ST`/`CLOSURE` capture did not
    /// name `Global`, `Local`, `Arg`, or `Captured`.
    #[error("invalid location kind {kind} at ip={ip:#x}")]
    InvalidLocationKind { kind: u8, ip: usize },

    /// An opcode that requires an unboxed integer (a jump condition, or an
    /// element index) found a heap reference or reference descriptor
    /// instead.
    #[error("expected an unboxed integer at ip={ip:#x}")]
    ExpectedUnboxedValue { ip: usize },

    /// An index into globals/locals/args/captured was out of bounds for the
    /// current frame.
    #[error("slot index {index} out of range (len {len}) at ip={ip:#x}")]
    SlotOutOfRange { index: usize, len: usize, ip: usize },

    /// `CALLC` found a non-closure value under the call-site arguments.
    #[error("CALLC target is not a closure at ip={ip:#x}")]
    NotAClosure { ip: usize },

    /// `ELEM`/`STA`/`LLENGTH`/`LSTRING` found an unboxed integer where a
    /// heap object (string, array, sexp, or closure) was required.
    #[error("expected a heap object at ip={ip:#x}")]
    NotAHeapObject { ip: usize },

    /// `END` executed with no enclosing frame left to restore and the
    /// instruction stream continued past the bottom frame's own `END`.
    #[error("no caller frame to return to at ip={ip:#x}")]
    NoCallerFrame { ip: usize },

    /// A string-table immediate named an offset that is not a valid NUL-
    /// terminated string boundary in the image's string table.
    #[error("bad string-table offset {offset} at ip={ip:#x}")]
    BadStringOffset { offset: u32, ip: usize },
}

/// An unspecified failure surfaced by the runtime bridge: I/O, or an
/// allocation the heap could not satisfy. These are never recoverable at
/// the language level.
#[derive(Debug, Error)]
pub enum Halt {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("allocation failed: {0}")]
    AllocationFailed(String),
}

/// Top-level error type for anything that can stop the evaluator.
#[derive(Debug, Error)]
pub enum VmError {
    #[error(transparent)]
    Fault(#[from] Fault),

    #[error(transparent)]
    Halt(#[from] Halt),

    /// Failure to load the bytecode image itself (file open/read, or a
    /// malformed header).
    #[error("failed to load bytecode image: {0}")]
    Image(#[from] crate::image::ImageError),
}

impl VmError {
    /// Render the diagnostic the CLI prints to standard error on a fatal
    /// exit, per the external interface's contract that fatal conditions
    /// terminate with a diagnostic on standard error.
    pub fn diagnostic(&self) -> String {
        format!("{self}")
    }
}
