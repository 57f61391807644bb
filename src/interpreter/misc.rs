//! Group 1 (value/control misc), and the `LD`/`LDA`/`ST` location-access
//! groups (2/3/4), which share the same four-way location-kind addressing.

use super::Evaluator;
use crate::error::{Fault, VmError};
use crate::state::ExecuteState;
use crate::value::Value;
use tracing::debug;

use super::frame::LocationKind;

impl Evaluator {
    pub(super) fn exec_misc(&mut self, l: u8) -> Result<ExecuteState, VmError> {
        let ip = self.ip;
        match l {
            0 => {
                let value = self.fetch_i32()?;
                self.stack.push(Value::boxed(value), ip)?;
            }
            1 => {
                let s = self.fetch_str()?;
                let v = self.heap.make_string(&s);
                self.stack.push(v, ip)?;
            }
            2 => {
                let name = self.fetch_str()?;
                let n = self.fetch_i32()? as usize;
                let hash = crate::heap::Heap::tag_hash(&name);
                let mut args = vec![Value::boxed(0); n];
                for i in (0..n).rev() {
                    args[i] = self.stack.pop(ip)?;
                }
                let v = self.heap.make_sexp(hash, &args);
                self.stack.push(v, ip)?;
            }
            4 => {
                let v = self.stack.pop(ip)?;
                let i = self.stack.pop(ip)?;
                let x = self.stack.pop(ip)?;
                let result = if let Value::Ref { kind, index } = x {
                    self.location_set(kind, index, v)?;
                    v
                } else {
                    self.heap.sta(v, i, x, ip)?
                };
                self.stack.push(result, ip)?;
            }
            5 => {
                let label = self.fetch_i32()? as u32;
                self.jump(label);
            }
            6 => {
                if self.frames.len() == 1 {
                    debug!("end at bottom frame");
                    return Ok(ExecuteState::Halted);
                }
                let caller = self.frames.pop().ok_or(Fault::NoCallerFrame { ip })?;
                let return_ip = caller.return_ip.ok_or(Fault::NoCallerFrame { ip })?;
                self.ip = return_ip;
                debug!(depth = self.frames.len(), "end: popped frame");
            }
            8 => {
                self.stack.pop(ip)?;
            }
            9 => {
                let top = self.stack.top(ip)?;
                self.stack.push(top, ip)?;
            }
            11 => {
                let i = self.stack.pop(ip)?;
                let s = self.stack.pop(ip)?;
                let v = self.heap.elem(s, i, ip)?;
                self.stack.push(v, ip)?;
            }
            _ => return Err(Fault::UnknownOpcode { h: 1, l, ip }.into()),
        }
        Ok(ExecuteState::Proceed)
    }

    pub(super) fn exec_ld(&mut self, l: u8) -> Result<ExecuteState, Fault> {
        let ip = self.ip;
        let kind = LocationKind::from_byte(l, ip)?;
        let index = self.fetch_i32()? as usize;
        let value = self.location_get(kind, index)?;
        self.stack.push(value, ip)?;
        Ok(ExecuteState::Proceed)
    }

    /// `LDA`: pushes the same reference descriptor twice, per the doubled-
    /// push contract the original's raw-address trick relies on.
    pub(super) fn exec_lda(&mut self, l: u8) -> Result<ExecuteState, Fault> {
        let ip = self.ip;
        let kind = LocationKind::from_byte(l, ip)?;
        let index = self.fetch_i32()? as usize;
        let descriptor = Value::Ref { kind, index };
        self.stack.push(descriptor, ip)?;
        self.stack.push(descriptor, ip)?;
        Ok(ExecuteState::Proceed)
    }

    pub(super) fn exec_st(&mut self, l: u8) -> Result<ExecuteState, Fault> {
        let ip = self.ip;
        let kind = LocationKind::from_byte(l, ip)?;
        let index = self.fetch_i32()? as usize;
        let value = self.stack.top(ip)?;
        self.location_set(kind, index, value)?;
        Ok(ExecuteState::Proceed)
    }
}

#[cfg(test)]
mod tests {
    use crate::heap::{BufferIo, Heap};
    use crate::image::BytecodeImage;
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
    fn dup_then_drop_is_a_stack_no_op() {
        let mut ev = eval_with(&[]);
        ev.stack.push(Value::boxed(9), 0).unwrap();
        ev.exec_misc(9).unwrap();
        ev.exec_misc(8).unwrap();
        assert_eq!(ev.stack.len(), 1);
        assert_eq!(ev.stack.pop(0).unwrap(), Value::boxed(9));
    }

    #[test]
    fn const_pushes_boxed_immediate() {
        let mut ev = eval_with(&[5, 0, 0, 0]);
        ev.exec_misc(0).unwrap();
        assert_eq!(ev.stack.pop(0).unwrap(), Value::boxed(5));
    }

    #[test]
    fn ld_global_reads_the_global_slot() {
        let mut ev = eval_with(&[3, 0, 0, 0]);
        ev.globals = vec![Value::boxed(77)];
        ev.exec_ld(0).unwrap();
        assert_eq!(ev.stack.pop(0).unwrap(), Value::boxed(77));
    }

    #[test]
    fn lda_then_sta_writes_through_to_the_global() {
        let mut ev = eval_with(&[0, 0, 0, 0]);
        ev.globals = vec![Value::boxed(1)];
        ev.exec_lda(0).unwrap();
        ev.stack.push(Value::boxed(42), 0).unwrap();
        ev.exec_misc(4).unwrap();
        assert_eq!(ev.globals[0], Value::boxed(42));
        assert_eq!(ev.stack.pop(0).unwrap(), Value::boxed(42));
    }
}
