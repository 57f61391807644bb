//! Instruction decoding: a byte cursor over a code region plus the
//! immediate-operand readers every opcode group needs.

use crate::error::Fault;

/// A forward-only cursor over a code region, tracking the instruction
/// pointer the way the source's raw `char* ip` does.
pub struct Cursor<'c> {
    code: &'c [u8],
    pub ip: usize,
}

impl<'c> Cursor<'c> {
    pub fn new(code: &'c [u8], ip: usize) -> Cursor<'c> {
        Cursor { code, ip }
    }

    /// Fetch one byte and advance. This is also how an opcode's own first
    /// byte (the `h`/`l` nibble pair) is read.
    pub fn byte(&mut self) -> Result<u8, Fault> {
        let b = *self.code.get(self.ip).ok_or(Fault::TruncatedCode { ip: self.ip })?;
        self.ip += 1;
        Ok(b)
    }

    /// A little-endian 4-byte signed immediate, as every `INT` macro
    /// expansion in the source reads.
    pub fn i32(&mut self) -> Result<i32, Fault> {
        let start = self.ip;
        let bytes = self.code.get(start..start + 4).ok_or(Fault::TruncatedCode { ip: start })?;
        self.ip += 4;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Decode one opcode byte into its `(h, l)` nibble pair.
    pub fn opcode(&mut self) -> Result<(u8, u8), Fault> {
        let x = self.byte()?;
        Ok((x >> 4, x & 0x0f))
    }
}
