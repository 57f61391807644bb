//! Builder pattern implementation for [`Evaluator`].
//!
//! Follows the recommended non-consuming builder:
//! <https://doc.rust-lang.org/1.5.0/style/ownership/builders.html#non-consuming-builders-preferred>

use super::Evaluator;
use crate::consts::DEFAULT_STACK_CAPACITY;
use crate::heap::{Heap, StdIo, VmIo};
use crate::image::BytecodeImage;

pub struct EvaluatorBuilder {
    stack_capacity: usize,
    io: Box<dyn VmIo>,
}

impl EvaluatorBuilder {
    pub fn new() -> EvaluatorBuilder {
        EvaluatorBuilder { stack_capacity: DEFAULT_STACK_CAPACITY, io: Box::new(StdIo) }
    }

    pub fn with_stack_capacity(mut self, capacity: usize) -> Self {
        self.stack_capacity = capacity;
        self
    }

    pub fn with_io(mut self, io: Box<dyn VmIo>) -> Self {
        self.io = io;
        self
    }

    pub fn build(self, image: BytecodeImage) -> Evaluator {
        Evaluator::new(image, Heap::new(self.io), self.stack_capacity)
    }
}

impl Default for EvaluatorBuilder {
    fn default() -> Self {
        EvaluatorBuilder::new()
    }
}
