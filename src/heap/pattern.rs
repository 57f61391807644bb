//! Element access, pattern-match primitives, and `LENGTH`/`STRING`
//! coercion — the remainder of the runtime bridge interface.

use super::{Heap, HeapObject};
use crate::error::Fault;
use crate::value::{ObjectKind, Value};

impl Heap {
    /// `elem(s, i) -> Value` — `s` must be a string, array, or sexp; `i` an
    /// unboxed index. Strings index to a boxed byte value; arrays and
    /// sexps index to their child `Value`.
    pub fn elem(&self, s: Value, i: Value, ip: usize) -> Result<Value, Fault> {
        let index = i.try_unbox().ok_or(Fault::ExpectedUnboxedValue { ip })? as usize;
        let obj = self.object(s).ok_or(Fault::NotAHeapObject { ip })?;
        match obj {
            HeapObject::String(bytes) => {
                let b = *bytes.get(index).ok_or(Fault::SlotOutOfRange { index, len: bytes.len(), ip })?;
                Ok(Value::boxed(b as i32))
            }
            HeapObject::Array(items) => items
                .get(index)
                .copied()
                .ok_or(Fault::SlotOutOfRange { index, len: items.len(), ip }),
            HeapObject::Sexp { fields, .. } => fields
                .get(index)
                .copied()
                .ok_or(Fault::SlotOutOfRange { index, len: fields.len(), ip }),
            HeapObject::Closure { captured, .. } => captured
                .get(index)
                .copied()
                .ok_or(Fault::SlotOutOfRange { index, len: captured.len(), ip }),
        }
    }

    /// `sta(v, i, x) -> Value` — store `v` into `x` at index `i`. When `x`
    /// is a [`Value::Ref`] descriptor (the result of `LDA`), the store
    /// writes through to the referenced slot via `assign` and `i` is
    /// unused; this is the resolution of the `LDA` contract ambiguity
    /// recorded in `DESIGN.md`. Otherwise `x` is array/sexp/string and `i`
    /// is the element index.
    pub fn sta(&mut self, v: Value, i: Value, x: Value, ip: usize) -> Result<Value, Fault> {
        if let Value::Ref { .. } = x {
            // The evaluator, not the heap, owns frame/global storage and
            // resolves the write-through itself before ever calling here.
            return Ok(v);
        }
        let index = i.try_unbox().ok_or(Fault::ExpectedUnboxedValue { ip })? as usize;
        let r = x.as_heap_ref().ok_or(Fault::NotAHeapObject { ip })?;
        let obj = &mut self.objects[r.0];
        match obj {
            HeapObject::Array(items) => {
                let len = items.len();
                let slot = items.get_mut(index).ok_or(Fault::SlotOutOfRange { index, len, ip })?;
                *slot = v;
            }
            HeapObject::Sexp { fields, .. } => {
                let len = fields.len();
                let slot = fields.get_mut(index).ok_or(Fault::SlotOutOfRange { index, len, ip })?;
                *slot = v;
            }
            HeapObject::String(bytes) => {
                let len = bytes.len();
                let slot = bytes.get_mut(index).ok_or(Fault::SlotOutOfRange { index, len, ip })?;
                *slot = v.try_unbox().unwrap_or(0) as u8;
            }
            HeapObject::Closure { .. } => return Err(Fault::NotAHeapObject { ip }),
        }
        Ok(v)
    }

    /// `length(s) -> Value` — boxed element count (strings: byte count).
    pub fn length(&self, s: Value, ip: usize) -> Result<Value, Fault> {
        let obj = self.object(s).ok_or(Fault::NotAHeapObject { ip })?;
        let n = match obj {
            HeapObject::String(bytes) => bytes.len(),
            HeapObject::Array(items) => items.len(),
            HeapObject::Sexp { fields, .. } => fields.len(),
            HeapObject::Closure { captured, .. } => captured.len(),
        };
        Ok(Value::boxed(n as i32))
    }

    /// `string(o) -> Value` — coerce any value to its textual
    /// representation and allocate it as a string. `LSTRING` round-trips
    /// through this unconditionally, per the Design Notes' resolution.
    pub fn string(&mut self, o: Value) -> Value {
        let rendered = match o {
            Value::Int(i) => i.to_string(),
            Value::Ref { .. } => String::new(),
            Value::Heap(_) => match self.object(o) {
                Some(HeapObject::String(bytes)) => String::from_utf8_lossy(bytes).into_owned(),
                Some(HeapObject::Array(items)) => {
                    let items = items.clone();
                    let rendered: Vec<String> = items.iter().map(|v| self.string_repr(*v)).collect();
                    format!("[{}]", rendered.join(", "))
                }
                Some(HeapObject::Sexp { fields, .. }) => {
                    let fields = fields.clone();
                    let rendered: Vec<String> = fields.iter().map(|v| self.string_repr(*v)).collect();
                    format!("`({})", rendered.join(", "))
                }
                Some(HeapObject::Closure { .. }) => "<closure>".to_string(),
                None => String::new(),
            },
        };
        self.make_string(&rendered)
    }

    fn string_repr(&self, v: Value) -> String {
        match v {
            Value::Int(i) => i.to_string(),
            Value::Ref { .. } => String::new(),
            Value::Heap(_) => match self.object(v) {
                Some(HeapObject::String(bytes)) => String::from_utf8_lossy(bytes).into_owned(),
                _ => "<obj>".to_string(),
            },
        }
    }

    /// `PATT_STR` — `string_patt(x, y)`: structural string equality.
    pub fn string_patt(&self, x: Value, y: Value) -> Value {
        let eq = match (self.object(x), self.object(y)) {
            (Some(HeapObject::String(a)), Some(HeapObject::String(b))) => a == b,
            _ => false,
        };
        Value::boxed_bool(eq)
    }

    pub fn string_tag_patt(&self, x: Value) -> Value {
        Value::boxed_bool(matches!(self.object(x).map(HeapObject::kind), Some(ObjectKind::String)))
    }

    pub fn array_tag_patt(&self, x: Value) -> Value {
        Value::boxed_bool(matches!(self.object(x).map(HeapObject::kind), Some(ObjectKind::Array)))
    }

    pub fn sexp_tag_patt(&self, x: Value) -> Value {
        Value::boxed_bool(matches!(self.object(x).map(HeapObject::kind), Some(ObjectKind::Sexp)))
    }

    pub fn boxed_patt(&self, x: Value) -> Value {
        Value::boxed_bool(x.is_heap())
    }

    pub fn unboxed_patt(&self, x: Value) -> Value {
        Value::boxed_bool(x.is_unboxed())
    }

    pub fn closure_tag_patt(&self, x: Value) -> Value {
        Value::boxed_bool(matches!(self.object(x).map(HeapObject::kind), Some(ObjectKind::Closure)))
    }

    /// `TAG` — `tag_patt(p, hash, nargs)`: `p` is a sexp whose tag hash and
    /// field count both match.
    pub fn tag_patt(&self, p: Value, hash: i32, nargs: i32) -> Value {
        let matched = matches!(
            self.object(p),
            Some(HeapObject::Sexp { tag, fields }) if *tag == hash && fields.len() as i32 == nargs
        );
        Value::boxed_bool(matched)
    }

    /// `ARRAY` — `array_patt(p, n)`: `p` is an array of exactly `n`
    /// elements.
    pub fn array_patt(&self, p: Value, n: i32) -> Value {
        let matched = matches!(self.object(p), Some(HeapObject::Array(items)) if items.len() as i32 == n);
        Value::boxed_bool(matched)
    }
}
