//! The evaluator: fetch-decode-dispatch loop, frame stack, globals, and the
//! glue between them and the runtime bridge.

pub mod binop;
pub mod builder;
pub mod builtin;
pub mod calls;
pub mod frame;
pub mod misc;
pub mod patt;

use crate::consts::DEFAULT_STACK_CAPACITY;
use crate::error::{Fault, VmError};
use crate::heap::Heap;
use crate::image::BytecodeImage;
use crate::opcode::Cursor;
use crate::stack::Stack;
use crate::state::{ExecuteState, ProgramState};
use crate::value::Value;
use frame::{CallKind, Frame, LocationKind};
use tracing::{debug, trace};

/// Owns every piece of mutable evaluator state: the operand stack, the
/// frame stack, the global array, the runtime bridge, and the call-kind
/// discriminator `BEGIN` reads.
pub struct Evaluator {
    image: BytecodeImage,
    stack: Stack,
    frames: Vec<Frame>,
    globals: Vec<Value>,
    heap: Heap,
    ip: usize,
    last_call: CallKind,
}

impl Evaluator {
    pub fn new(image: BytecodeImage, heap: Heap, stack_capacity: usize) -> Evaluator {
        let globals = vec![Value::boxed(0); image.global_area_size()];
        let ip = image.entry_offset();
        Evaluator {
            image,
            stack: Stack::with_capacity(stack_capacity),
            frames: vec![Frame::entry()],
            globals,
            heap,
            ip,
            last_call: CallKind::Call,
        }
    }

    pub fn with_default_capacity(image: BytecodeImage, heap: Heap) -> Evaluator {
        Evaluator::new(image, heap, DEFAULT_STACK_CAPACITY)
    }

    /// Access the runtime bridge, e.g. to inspect I/O after a run in tests.
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Run to completion. Returns the terminal state, or the first fatal
    /// condition encountered.
    #[tracing::instrument(name = "run", skip(self))]
    pub fn run(&mut self) -> Result<ProgramState, VmError> {
        loop {
            if self.execute()? == ExecuteState::Halted {
                return Ok(ProgramState::Halted);
            }
        }
    }

    /// Fetch, decode, and dispatch exactly one instruction.
    #[tracing::instrument(name = "execute", skip(self), fields(ip = self.ip))]
    pub fn execute(&mut self) -> Result<ExecuteState, VmError> {
        let (h, l) = self.fetch_opcode()?;
        trace!(h, l, "dispatch");
        match h {
            0 => Ok(self.exec_binop(l)?),
            1 => self.exec_misc(l),
            2 => Ok(self.exec_ld(l)?),
            3 => Ok(self.exec_lda(l)?),
            4 => Ok(self.exec_st(l)?),
            5 => self.exec_control(l),
            6 => Ok(self.exec_patt(l)?),
            7 => self.exec_builtin(l),
            15 => {
                debug!("stop");
                Ok(ExecuteState::Halted)
            }
            _ => Err(Fault::UnknownOpcode { h, l, ip: self.ip }.into()),
        }
    }

    fn fetch_opcode(&mut self) -> Result<(u8, u8), Fault> {
        let mut c = Cursor::new(self.image.code(), self.ip);
        let pair = c.opcode()?;
        self.ip = c.ip;
        Ok(pair)
    }

    fn fetch_i32(&mut self) -> Result<i32, Fault> {
        let mut c = Cursor::new(self.image.code(), self.ip);
        let v = c.i32()?;
        self.ip = c.ip;
        Ok(v)
    }

    fn fetch_byte(&mut self) -> Result<u8, Fault> {
        let mut c = Cursor::new(self.image.code(), self.ip);
        let v = c.byte()?;
        self.ip = c.ip;
        Ok(v)
    }

    fn fetch_str(&mut self) -> Result<String, Fault> {
        let offset = self.fetch_i32()? as u32;
        self.image
            .string_at(offset)
            .map(str::to_string)
            .map_err(|_| Fault::BadStringOffset { offset, ip: self.ip })
    }

    fn jump(&mut self, label: u32) {
        self.ip = label as usize;
    }

    fn current_frame(&self) -> &Frame {
        self.frames.last().expect("frame stack is never empty while running")
    }

    fn current_frame_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("frame stack is never empty while running")
    }

    /// Read the Value held at `(kind, index)`, per `LD`'s contract.
    fn location_get(&self, kind: LocationKind, index: usize) -> Result<Value, Fault> {
        match kind {
            LocationKind::Global => {
                self.globals.get(index).copied().ok_or(Fault::SlotOutOfRange { index, len: self.globals.len(), ip: self.ip })
            }
            other => self.current_frame().slot(other, index, self.ip),
        }
    }

    /// Write `value` into `(kind, index)`, per `ST`'s and the `LDA`
    /// reference-descriptor write-through contract.
    fn location_set(&mut self, kind: LocationKind, index: usize, value: Value) -> Result<(), Fault> {
        match kind {
            LocationKind::Global => {
                let len = self.globals.len();
                let slot = self.globals.get_mut(index).ok_or(Fault::SlotOutOfRange { index, len, ip: self.ip })?;
                *slot = value;
                Ok(())
            }
            other => {
                let ip = self.ip;
                self.current_frame_mut().set_slot(other, index, value, ip)
            }
        }
    }
}
