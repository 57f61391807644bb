//! Activation records (frames) and the location-kind addressing scheme
//! that `LD`/`LDA`/`ST`/`CLOSURE` all share.

use crate::error::Fault;
use crate::value::Value;

/// The four addressable storage classes a `LD`/`LDA`/`ST` location byte can
/// name. `Captured` corresponds to the source's `Access` — the tuple of
/// values a closure captured at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::FromRepr)]
#[repr(u8)]
pub enum LocationKind {
    Global = 0,
    Local = 1,
    Arg = 2,
    Captured = 3,
}

impl LocationKind {
    pub fn from_byte(b: u8, ip: usize) -> Result<LocationKind, Fault> {
        LocationKind::from_repr(b).ok_or(Fault::InvalidLocationKind { kind: b, ip })
    }
}

/// Distinguishes the two call conventions so `BEGIN` knows whether its
/// arguments are still sitting on the operand stack (an ordinary `CALL`) or
/// were already consumed and installed by `CALLC`. Mirrors the source's
/// `lastCall` scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Call,
    Callc,
}

/// One activation record. `args` and `locals` are resized in place by
/// `BEGIN`/`CBEGIN`; `captured` is fixed at construction (empty for
/// ordinary calls, the closure's capture tuple for `CALLC`).
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub args: Vec<Value>,
    pub locals: Vec<Value>,
    pub captured: Vec<Value>,
    /// Code offset to resume the caller at, once this frame's `END` runs.
    /// `None` only for the bottommost (entry) frame.
    pub return_ip: Option<usize>,
}

impl Frame {
    pub fn entry() -> Frame {
        Frame::default()
    }

    pub fn slot(&self, kind: LocationKind, index: usize, ip: usize) -> Result<Value, Fault> {
        let (slots, name_len) = match kind {
            LocationKind::Local => (&self.locals, self.locals.len()),
            LocationKind::Arg => (&self.args, self.args.len()),
            LocationKind::Captured => (&self.captured, self.captured.len()),
            LocationKind::Global => unreachable!("globals are not addressed through a frame"),
        };
        slots.get(index).copied().ok_or(Fault::SlotOutOfRange { index, len: name_len, ip })
    }

    pub fn set_slot(&mut self, kind: LocationKind, index: usize, value: Value, ip: usize) -> Result<(), Fault> {
        let slots = match kind {
            LocationKind::Local => &mut self.locals,
            LocationKind::Arg => &mut self.args,
            LocationKind::Captured => &mut self.captured,
            LocationKind::Global => unreachable!("globals are not addressed through a frame"),
        };
        let len = slots.len();
        let slot = slots.get_mut(index).ok_or(Fault::SlotOutOfRange { index, len, ip })?;
        *slot = value;
        Ok(())
    }
}
