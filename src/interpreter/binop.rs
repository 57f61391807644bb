//! Group 0 — arithmetic and comparison `BINOP`.

use super::Evaluator;
use crate::error::Fault;
use crate::value::Value;

impl Evaluator {
    pub(super) fn exec_binop(&mut self, l: u8) -> Result<crate::state::ExecuteState, Fault> {
        let ip = self.ip;
        let rhs = self.stack.pop(ip)?.unbox();
        let lhs = self.stack.pop(ip)?.unbox();
        let result = match l {
            1 => lhs.wrapping_add(rhs),
            2 => lhs.wrapping_sub(rhs),
            3 => lhs.wrapping_mul(rhs),
            4 => {
                if rhs == 0 {
                    return Err(Fault::DivisionByZero { ip });
                }
                lhs.wrapping_div(rhs)
            }
            5 => {
                if rhs == 0 {
                    return Err(Fault::DivisionByZero { ip });
                }
                lhs.wrapping_rem(rhs)
            }
            6 => (lhs < rhs) as i32,
            7 => (lhs <= rhs) as i32,
            8 => (lhs > rhs) as i32,
            9 => (lhs >= rhs) as i32,
            10 => (lhs == rhs) as i32,
            11 => (lhs != rhs) as i32,
            12 => (lhs != 0 && rhs != 0) as i32,
            13 => (lhs != 0 || rhs != 0) as i32,
            _ => return Err(Fault::UnknownOpcode { h: 0, l, ip }),
        };
        self.stack.push(Value::boxed(result), ip)?;
        Ok(crate::state::ExecuteState::Proceed)
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
    fn add_boxes_the_sum() {
        let mut ev = eval_with(&[]);
        ev.stack.push(Value::boxed(2), 0).unwrap();
        ev.stack.push(Value::boxed(3), 0).unwrap();
        ev.exec_binop(1).unwrap();
        assert_eq!(ev.stack.pop(0).unwrap(), Value::boxed(5));
    }

    #[test]
    fn division_by_zero_faults() {
        let mut ev = eval_with(&[]);
        ev.stack.push(Value::boxed(1), 0).unwrap();
        ev.stack.push(Value::boxed(0), 0).unwrap();
        assert!(ev.exec_binop(4).is_err());
    }

    #[test]
    fn comparisons_yield_boxed_booleans() {
        let mut ev = eval_with(&[]);
        ev.stack.push(Value::boxed(1), 0).unwrap();
        ev.stack.push(Value::boxed(2), 0).unwrap();
        ev.exec_binop(6).unwrap();
        assert_eq!(ev.stack.pop(0).unwrap(), Value::boxed(1));
    }
}
