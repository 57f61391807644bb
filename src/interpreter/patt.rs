//! Group 6 — pattern-match primitives. Each variant pops one or two
//! values and pushes a boxed boolean computed by the runtime bridge.

use super::Evaluator;
use crate::error::Fault;
use crate::state::ExecuteState;

impl Evaluator {
    pub(super) fn exec_patt(&mut self, l: u8) -> Result<ExecuteState, Fault> {
        let ip = self.ip;
        let result = match l {
            0 => {
                let x = self.stack.pop(ip)?;
                let y = self.stack.pop(ip)?;
                self.heap.string_patt(x, y)
            }
            1 => {
                let x = self.stack.pop(ip)?;
                self.heap.string_tag_patt(x)
            }
            2 => {
                let x = self.stack.pop(ip)?;
                self.heap.array_tag_patt(x)
            }
            3 => {
                let x = self.stack.pop(ip)?;
                self.heap.sexp_tag_patt(x)
            }
            4 => {
                let x = self.stack.pop(ip)?;
                self.heap.boxed_patt(x)
            }
            5 => {
                let x = self.stack.pop(ip)?;
                self.heap.unboxed_patt(x)
            }
            6 => {
                let x = self.stack.pop(ip)?;
                self.heap.closure_tag_patt(x)
            }
            _ => return Err(Fault::UnknownOpcode { h: 6, l, ip }),
        };
        self.stack.push(result, ip)?;
        Ok(ExecuteState::Proceed)
    }
}
