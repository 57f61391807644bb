//! The runtime bridge: heap object construction, element access, pattern
//! primitives, length/string coercion, and I/O.
//!
//! The specification treats all of this as an external collaborator,
//! described only by its interface. This module supplies one concrete,
//! non-moving implementation of that interface so the evaluator can
//! actually run to completion (see `SPEC_FULL.md` §1 and `DESIGN.md` for the
//! rationale). Because objects here are stored as an arena of tagged Rust
//! enums rather than a packed byte layout behind a raw pointer, there is no
//! header to decode and no GC root-scanning is strictly required for
//! correctness — but the hook points the concurrency model calls for
//! (`pre_alloc`/`post_alloc`, stack-as-root-range) are kept as real,
//! zero-cost call sites so a future moving collector slots in here without
//! touching the evaluator.

mod io;
mod pattern;

pub use io::{BufferIo, StdIo, VmIo};

use crate::value::{HeapRef, ObjectKind, Value};
use tracing::trace;

/// A single heap object's payload. The discriminant corresponds to the
/// source's 3-bit header tag (`STRING`/`ARRAY`/`SEXP`/`CLOSURE`).
#[derive(Debug, Clone)]
pub enum HeapObject {
    String(Vec<u8>),
    Array(Vec<Value>),
    /// `tag` is the constructor's name hash; `fields` is the sexp's
    /// children, in source order.
    Sexp { tag: i32, fields: Vec<Value> },
    /// `entry` is the byte offset of the closure's code in the image's code
    /// region; `captured` is the tuple of captured values, in capture
    /// order.
    Closure { entry: usize, captured: Vec<Value> },
}

impl HeapObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            HeapObject::String(_) => ObjectKind::String,
            HeapObject::Array(_) => ObjectKind::Array,
            HeapObject::Sexp { .. } => ObjectKind::Sexp,
            HeapObject::Closure { .. } => ObjectKind::Closure,
        }
    }
}

/// Bump-allocated object arena. Objects are appended and never reclaimed or
/// moved, so a [`HeapRef`] is stable for the lifetime of the [`Heap`].
#[derive(Debug)]
pub struct Heap {
    objects: Vec<HeapObject>,
    io: Box<dyn VmIo>,
}

impl Heap {
    pub fn new(io: Box<dyn VmIo>) -> Self {
        Heap { objects: Vec::new(), io }
    }

    fn pre_alloc(&self) {
        trace!("pre_alloc");
    }

    fn post_alloc(&self, r: HeapRef) {
        trace!(index = r.0, "post_alloc");
    }

    fn alloc(&mut self, object: HeapObject) -> Value {
        self.pre_alloc();
        let index = self.objects.len();
        self.objects.push(object);
        let r = HeapRef(index);
        self.post_alloc(r);
        Value::Heap(r)
    }

    fn get(&self, r: HeapRef) -> &HeapObject {
        &self.objects[r.0]
    }

    pub fn object(&self, v: Value) -> Option<&HeapObject> {
        v.as_heap_ref().map(|r| self.get(r))
    }

    /// `make_string(&str) -> Value`
    pub fn make_string(&mut self, s: &str) -> Value {
        self.alloc(HeapObject::String(s.as_bytes().to_vec()))
    }

    /// `make_array(n, &[Value]) -> Value`
    pub fn make_array(&mut self, values: &[Value]) -> Value {
        self.alloc(HeapObject::Array(values.to_vec()))
    }

    /// `make_sexp(n, &[Value; n+1]) -> Value` — `fields` excludes the tag
    /// hash, which is passed separately.
    pub fn make_sexp(&mut self, tag: i32, fields: &[Value]) -> Value {
        self.alloc(HeapObject::Sexp { tag, fields: fields.to_vec() })
    }

    /// `make_closure(n, entry, &[Value]) -> Value`
    pub fn make_closure(&mut self, entry: usize, captured: &[Value]) -> Value {
        self.alloc(HeapObject::Closure { entry, captured: captured.to_vec() })
    }

    /// `tag_hash(&str) -> i32` — a deterministic 31-bit hash of a
    /// constructor name. Any deterministic function suffices: the only
    /// contract is that equal names hash equal and the result fits an
    /// unboxed integer.
    pub fn tag_hash(name: &str) -> i32 {
        let mut h: u32 = 2166136261;
        for b in name.as_bytes() {
            h ^= *b as u32;
            h = h.wrapping_mul(16777619);
        }
        (h & 0x7fff_ffff) as i32
    }

    pub fn io_mut(&mut self) -> &mut dyn VmIo {
        self.io.as_mut()
    }

    pub fn io_ref(&self) -> &dyn VmIo {
        self.io.as_ref()
    }
}
