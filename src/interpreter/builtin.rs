//! Group 7 — the built-in surface-language primitives: I/O, length,
//! string coercion, and the array constructor.

use super::Evaluator;
use crate::error::{Fault, VmError};
use crate::state::ExecuteState;
use crate::value::Value;

impl Evaluator {
    pub(super) fn exec_builtin(&mut self, l: u8) -> Result<ExecuteState, VmError> {
        let ip = self.ip;
        match l {
            0 => {
                let v = self.heap.io_mut().read()?;
                self.stack.push(v, ip)?;
            }
            1 => {
                let v = self.stack.pop(ip)?;
                let result = self.heap.io_mut().write(v)?;
                self.stack.push(result, ip)?;
            }
            2 => {
                let s = self.stack.pop(ip)?;
                let len = self.heap.length(s, ip)?;
                self.stack.push(len, ip)?;
            }
            3 => {
                let o = self.stack.pop(ip)?;
                let s = self.heap.string(o);
                self.stack.push(s, ip)?;
            }
            4 => {
                let n = self.fetch_i32()? as usize;
                let mut args = vec![Value::boxed(0); n];
                for i in (0..n).rev() {
                    args[i] = self.stack.pop(ip)?;
                }
                let arr = self.heap.make_array(&args);
                self.stack.push(arr, ip)?;
            }
            _ => return Err(Fault::UnknownOpcode { h: 7, l, ip }.into()),
        }
        Ok(ExecuteState::Proceed)
    }
}

#[cfg(test)]
mod tests {
    use crate::heap::{BufferIo, Heap};
    use crate::image::BytecodeImage;
    use crate::interpreter::Evaluator;
    use crate::value::Value;

    fn eval_with() -> Evaluator {
        let image = BytecodeImage::parse(&[0u8; 12]).unwrap();
        let heap = Heap::new(Box::new(BufferIo::with_input([42])));
        Evaluator::new(image, heap, 64)
    }

    #[test]
    fn lread_then_lwrite_echoes_the_input() {
        let mut ev = eval_with();
        ev.exec_builtin(0).unwrap();
        assert_eq!(ev.stack.top(0).unwrap(), Value::boxed(42));
        ev.exec_builtin(1).unwrap();
        assert_eq!(ev.stack.pop(0).unwrap(), Value::boxed(42));
    }

    #[test]
    fn barray_collects_in_source_order() {
        // BARRAY n=3 expects the count immediate in the code stream.
        let mut bytes = vec![0u8; 12];
        bytes.extend_from_slice(&3i32.to_le_bytes());
        let image = BytecodeImage::parse(&bytes).unwrap();
        let heap = Heap::new(Box::new(BufferIo::default()));
        let mut ev = Evaluator::new(image, heap, 64);
        ev.stack.push(Value::boxed(1), 0).unwrap();
        ev.stack.push(Value::boxed(2), 0).unwrap();
        ev.stack.push(Value::boxed(3), 0).unwrap();
        ev.exec_builtin(4).unwrap();
        let arr = ev.stack.pop(0).unwrap();
        let len = ev.heap.length(arr, 0).unwrap();
        assert_eq!(len, Value::boxed(3));
        assert_eq!(ev.heap.elem(arr, Value::boxed(0), 0).unwrap(), Value::boxed(1));
        assert_eq!(ev.heap.elem(arr, Value::boxed(2), 0).unwrap(), Value::boxed(3));
    }
}
