//! VM-wide constants.

/// Default fixed capacity of the operand stack, in slots. Matches the
/// source interpreter's `STACK_CAPACITY`.
pub const DEFAULT_STACK_CAPACITY: usize = 10_000;
