//! Group 5 — conditional jumps, call/return prologues, closure
//! construction, and the two call opcodes.

use super::frame::{CallKind, Frame, LocationKind};
use super::Evaluator;
use crate::error::{Fault, VmError};
use crate::state::ExecuteState;
use crate::value::Value;
use tracing::debug;

impl Evaluator {
    pub(super) fn exec_control(&mut self, l: u8) -> Result<ExecuteState, VmError> {
        let ip = self.ip;
        match l {
            0 => {
                let label = self.fetch_i32()? as u32;
                let z = self.stack.pop(ip)?.try_unbox().ok_or(Fault::ExpectedUnboxedValue { ip })?;
                if z == 0 {
                    self.jump(label);
                }
            }
            1 => {
                let label = self.fetch_i32()? as u32;
                let z = self.stack.pop(ip)?.try_unbox().ok_or(Fault::ExpectedUnboxedValue { ip })?;
                if z != 0 {
                    self.jump(label);
                }
            }
            2 => self.exec_begin(ip)?,
            3 => self.exec_cbegin()?,
            4 => self.exec_closure(ip)?,
            5 => self.exec_callc(ip)?,
            6 => self.exec_call()?,
            7 => {
                let name = self.fetch_str()?;
                let nargs = self.fetch_i32()?;
                let hash = crate::heap::Heap::tag_hash(&name);
                let p = self.stack.pop(ip)?;
                let matched = self.heap.tag_patt(p, hash, nargs);
                self.stack.push(matched, ip)?;
            }
            8 => {
                let n = self.fetch_i32()?;
                let p = self.stack.pop(ip)?;
                let matched = self.heap.array_patt(p, n);
                self.stack.push(matched, ip)?;
            }
            10 => {
                self.fetch_i32()?;
            }
            _ => return Err(Fault::UnknownOpcode { h: 5, l, ip }.into()),
        }
        Ok(ExecuteState::Proceed)
    }

    /// Ordinary-call prologue: if this frame has a caller, its arguments
    /// are still sitting on the operand stack (pushed left-to-right by the
    /// call site) and must be popped rightmost-first into `args`. The
    /// bottom frame never has arguments to collect this way.
    fn exec_begin(&mut self, ip: usize) -> Result<(), Fault> {
        let nargs = self.fetch_i32()? as usize;
        let nlocals = self.fetch_i32()? as usize;
        if self.last_call != CallKind::Callc {
            let mut args = vec![Value::boxed(0); nargs];
            if self.frames.len() > 1 {
                for i in (0..nargs).rev() {
                    args[i] = self.stack.pop(ip)?;
                }
            }
            self.current_frame_mut().args = args;
        }
        self.current_frame_mut().locals = vec![Value::boxed(0); nlocals];
        debug!(nargs, nlocals, "begin");
        Ok(())
    }

    /// Closure-call prologue: `args` and `captured` were already installed
    /// by `CALLC`. `CBEGIN` still encodes `nargs nlocals` like `BEGIN`
    /// does, so `nargs` must be read and discarded to keep `ip` aligned,
    /// even though it plays no part here.
    fn exec_cbegin(&mut self) -> Result<(), Fault> {
        let _nargs = self.fetch_i32()?;
        let nlocals = self.fetch_i32()? as usize;
        self.current_frame_mut().locals = vec![Value::boxed(0); nlocals];
        debug!(nlocals, "cbegin");
        Ok(())
    }

    /// Capture `nargs` values from the *currently executing* frame (the
    /// closure's defining frame) and allocate a closure object over them.
    fn exec_closure(&mut self, ip: usize) -> Result<(), Fault> {
        let entry = self.fetch_i32()? as usize;
        let nargs = self.fetch_i32()? as usize;
        let mut captured = Vec::with_capacity(nargs);
        for _ in 0..nargs {
            let kind_byte = self.fetch_byte()?;
            let kind = LocationKind::from_byte(kind_byte, ip)?;
            let index = self.fetch_i32()? as usize;
            captured.push(self.location_get(kind, index)?);
        }
        let v = self.heap.make_closure(entry, &captured);
        self.stack.push(v, ip)?;
        Ok(())
    }

    fn exec_callc(&mut self, ip: usize) -> Result<(), VmError> {
        let nargs = self.fetch_i32()? as usize;
        let mut args = vec![Value::boxed(0); nargs];
        for i in (0..nargs).rev() {
            args[i] = self.stack.pop(ip)?;
        }
        let closure = self.stack.pop(ip)?;
        let (entry, captured) = match self.heap.object(closure) {
            Some(crate::heap::HeapObject::Closure { entry, captured }) => (*entry, captured.clone()),
            _ => return Err(Fault::NotAClosure { ip }.into()),
        };
        let return_ip = self.ip;
        self.frames.push(Frame { args, locals: Vec::new(), captured, return_ip: Some(return_ip) });
        self.last_call = CallKind::Callc;
        self.jump(entry as u32);
        debug!(entry, nargs, depth = self.frames.len(), "callc");
        Ok(())
    }

    fn exec_call(&mut self) -> Result<(), Fault> {
        let label = self.fetch_i32()? as u32;
        let _nargs = self.fetch_i32()?;
        let return_ip = self.ip;
        self.frames.push(Frame { args: Vec::new(), locals: Vec::new(), captured: Vec::new(), return_ip: Some(return_ip) });
        self.last_call = CallKind::Call;
        self.jump(label);
        debug!(label, depth = self.frames.len(), "call");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::heap::{BufferIo, Heap};
    use crate::image::BytecodeImage;
    use crate::interpreter::frame::CallKind;
    use crate::interpreter::Evaluator;
    use crate::value::Value;

    fn image_with_code(code: &[u8]) -> BytecodeImage {
        let mut bytes = vec![0u8; 12];
        bytes.extend_from_slice(code);
        BytecodeImage::parse(&bytes).unwrap()
    }

    fn eval_with(code: &[u8]) -> Evaluator {
        let image = image_with_code(code);
        let heap = Heap::new(Box::new(BufferIo::default()));
        Evaluator::new(image, heap, 64)
    }

    #[test]
    fn begin_pops_args_for_a_non_bottom_frame() {
        // nargs=2, nlocals=1
        let mut ev = eval_with(&[2, 0, 0, 0, 1, 0, 0, 0]);
        ev.frames.push(crate::interpreter::frame::Frame::entry());
        ev.stack.push(Value::boxed(10), 0).unwrap();
        ev.stack.push(Value::boxed(20), 0).unwrap();
        ev.exec_control(2).unwrap();
        assert_eq!(ev.current_frame().args, vec![Value::boxed(10), Value::boxed(20)]);
        assert_eq!(ev.current_frame().locals, vec![Value::boxed(0)]);
        assert_eq!(ev.stack.len(), 0);
    }

    #[test]
    fn cbegin_does_not_touch_preexisting_args() {
        // nargs=1 (unused, just kept for ip alignment), nlocals=3
        let mut ev = eval_with(&[1, 0, 0, 0, 3, 0, 0, 0]);
        ev.current_frame_mut().args = vec![Value::boxed(1), Value::boxed(2)];
        ev.last_call = CallKind::Callc;
        ev.exec_control(3).unwrap();
        assert_eq!(ev.current_frame().args, vec![Value::boxed(1), Value::boxed(2)]);
        assert_eq!(ev.current_frame().locals, vec![Value::boxed(0); 3]);
    }

    #[test]
    fn call_then_end_restores_caller_ip() {
        // CALL label=9, nargs=0; at offset 9: END
        let mut code = vec![5 << 4 | 6];
        code.extend_from_slice(&9i32.to_le_bytes());
        code.extend_from_slice(&0i32.to_le_bytes());
        while code.len() < 9 {
            code.push(0);
        }
        code.push(1 << 4 | 6); // END
        let mut ev = eval_with(&code);
        ev.execute().unwrap(); // CALL
        assert_eq!(ev.frames.len(), 2);
        let state = ev.execute().unwrap(); // END
        assert_eq!(ev.frames.len(), 1);
        assert_eq!(state, crate::state::ExecuteState::Proceed);
    }
}
