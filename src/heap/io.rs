//! `read`/`write` primitives.
//!
//! Observable I/O is modeled behind a small trait so tests can substitute a
//! buffer-backed implementation instead of real stdin/stdout, the way the
//! teacher crate substitutes `MemoryStorage` for on-chain storage in tests.

use crate::error::Halt;
use crate::value::Value;
use std::io::{self, BufRead, Write};

/// The two observable effects the evaluator can perform, per the
/// concurrency model: ordering of effects is exactly the order in which
/// `LREAD`/`LWRITE` execute, and both are treated as straight-line calls
/// that complete before the next opcode runs.
pub trait VmIo: std::fmt::Debug + std::any::Any {
    /// Read one whitespace-delimited signed integer from the input stream.
    fn read(&mut self) -> Result<Value, Halt>;

    /// Write one integer to the output stream, followed by a newline, as
    /// the surface language's `write` builtin does. Returns the written
    /// value back, since `write` is an expression in the source language
    /// and must leave a result on the operand stack.
    fn write(&mut self, v: Value) -> Result<Value, Halt>;

    /// Downcasting hook so tests can recover a concrete `BufferIo` after a
    /// run to inspect what was written.
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Real stdin/stdout-backed I/O, used by the CLI.
#[derive(Debug, Default)]
pub struct StdIo;

impl VmIo for StdIo {
    fn read(&mut self) -> Result<Value, Halt> {
        let stdin = io::stdin();
        let mut line = String::new();
        stdin.lock().read_line(&mut line).map_err(Halt::Io)?;
        let n: i32 = line
            .trim()
            .parse()
            .map_err(|_| Halt::AllocationFailed(format!("expected an integer on stdin, got {line:?}")))?;
        Ok(Value::boxed(n))
    }

    fn write(&mut self, v: Value) -> Result<Value, Halt> {
        let n = v.unbox();
        let stdout = io::stdout();
        writeln!(stdout.lock(), "{n}").map_err(Halt::Io)?;
        Ok(v)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// In-memory I/O for tests: reads from a preloaded queue of integers,
/// writes into a growable buffer.
#[derive(Debug, Default)]
pub struct BufferIo {
    pub input: std::collections::VecDeque<i32>,
    pub output: Vec<i32>,
}

impl BufferIo {
    pub fn with_input(values: impl IntoIterator<Item = i32>) -> Self {
        BufferIo { input: values.into_iter().collect(), output: Vec::new() }
    }
}

impl VmIo for BufferIo {
    fn read(&mut self) -> Result<Value, Halt> {
        let n = self
            .input
            .pop_front()
            .ok_or_else(|| Halt::AllocationFailed("read() past end of input buffer".to_string()))?;
        Ok(Value::boxed(n))
    }

    fn write(&mut self, v: Value) -> Result<Value, Halt> {
        self.output.push(v.unbox());
        Ok(v)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
