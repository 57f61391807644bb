//! A hand-rolled bytecode assembler for integration tests.
//!
//! There is no Lama compiler in this workspace to produce real `.bc` files,
//! so these tests build images directly: one method per opcode, plus a
//! label/patch mechanism for forward jumps (a function's `CALL`/`CLOSURE`
//! target is usually emitted before the function's own code exists yet).

use lama_vm::interpreter::frame::LocationKind;
use std::collections::HashMap;

pub struct Asm {
    code: Vec<u8>,
    strings: Vec<u8>,
    string_offsets: HashMap<String, u32>,
    labels: HashMap<String, i32>,
    patches: Vec<(usize, String)>,
}

impl Asm {
    pub fn new() -> Asm {
        Asm {
            code: Vec::new(),
            strings: vec![0], // offset 0 is reserved for the empty string
            string_offsets: HashMap::new(),
            labels: HashMap::new(),
            patches: Vec::new(),
        }
    }

    /// Record the current code offset under `name`, resolved by `build`.
    pub fn mark(&mut self, name: &str) -> &mut Self {
        self.labels.insert(name.to_string(), self.code.len() as i32);
        self
    }

    fn op(&mut self, h: u8, l: u8) -> &mut Self {
        self.code.push((h << 4) | l);
        self
    }

    fn imm(&mut self, v: i32) -> &mut Self {
        self.code.extend_from_slice(&v.to_le_bytes());
        self
    }

    fn byte(&mut self, b: u8) -> &mut Self {
        self.code.push(b);
        self
    }

    fn imm_label(&mut self, name: &str) -> &mut Self {
        self.patches.push((self.code.len(), name.to_string()));
        self.imm(0)
    }

    /// Intern a string and return its string-table offset.
    pub fn string(&mut self, s: &str) -> u32 {
        if let Some(&off) = self.string_offsets.get(s) {
            return off;
        }
        let off = self.strings.len() as u32;
        self.strings.extend_from_slice(s.as_bytes());
        self.strings.push(0);
        self.string_offsets.insert(s.to_string(), off);
        off
    }

    pub fn const_(&mut self, n: i32) -> &mut Self {
        self.op(1, 0).imm(n)
    }

    pub fn str_(&mut self, s: &str) -> &mut Self {
        let off = self.string(s);
        self.op(1, 1).imm(off as i32)
    }

    pub fn sexp(&mut self, tag: &str, n: i32) -> &mut Self {
        let off = self.string(tag);
        self.op(1, 2).imm(off as i32).imm(n)
    }

    pub fn sta(&mut self) -> &mut Self {
        self.op(1, 4)
    }

    pub fn jmp(&mut self, label: &str) -> &mut Self {
        self.op(1, 5);
        self.imm_label(label)
    }

    pub fn end(&mut self) -> &mut Self {
        self.op(1, 6)
    }

    pub fn drop_(&mut self) -> &mut Self {
        self.op(1, 8)
    }

    pub fn dup(&mut self) -> &mut Self {
        self.op(1, 9)
    }

    pub fn elem(&mut self) -> &mut Self {
        self.op(1, 11)
    }

    pub fn binop(&mut self, l: u8) -> &mut Self {
        self.op(0, l)
    }

    pub fn ld(&mut self, kind: LocationKind, index: i32) -> &mut Self {
        self.op(2, kind as u8).imm(index)
    }

    pub fn lda(&mut self, kind: LocationKind, index: i32) -> &mut Self {
        self.op(3, kind as u8).imm(index)
    }

    pub fn st(&mut self, kind: LocationKind, index: i32) -> &mut Self {
        self.op(4, kind as u8).imm(index)
    }

    pub fn cjmpz(&mut self, label: &str) -> &mut Self {
        self.op(5, 0);
        self.imm_label(label)
    }

    pub fn cjmpnz(&mut self, label: &str) -> &mut Self {
        self.op(5, 1);
        self.imm_label(label)
    }

    pub fn begin(&mut self, nargs: i32, nlocals: i32) -> &mut Self {
        self.op(5, 2).imm(nargs).imm(nlocals)
    }

    pub fn cbegin(&mut self, nargs: i32, nlocals: i32) -> &mut Self {
        self.op(5, 3).imm(nargs).imm(nlocals)
    }

    pub fn closure(&mut self, entry_label: &str, captures: &[(LocationKind, i32)]) -> &mut Self {
        self.op(5, 4);
        self.imm_label(entry_label);
        self.imm(captures.len() as i32);
        for (kind, index) in captures {
            self.byte(*kind as u8).imm(*index);
        }
        self
    }

    pub fn callc(&mut self, nargs: i32) -> &mut Self {
        self.op(5, 5).imm(nargs)
    }

    pub fn call(&mut self, label: &str, nargs: i32) -> &mut Self {
        self.op(5, 6);
        self.imm_label(label);
        self.imm(nargs)
    }

    pub fn tag(&mut self, name: &str, nargs: i32) -> &mut Self {
        let off = self.string(name);
        self.op(5, 7).imm(off as i32).imm(nargs)
    }

    pub fn array_patt_len(&mut self, n: i32) -> &mut Self {
        self.op(5, 8).imm(n)
    }

    pub fn lread(&mut self) -> &mut Self {
        self.op(7, 0)
    }

    pub fn lwrite(&mut self) -> &mut Self {
        self.op(7, 1)
    }

    pub fn llength(&mut self) -> &mut Self {
        self.op(7, 2)
    }

    pub fn lstring(&mut self) -> &mut Self {
        self.op(7, 3)
    }

    pub fn barray(&mut self, n: i32) -> &mut Self {
        self.op(7, 4).imm(n)
    }

    pub fn stop(&mut self) -> &mut Self {
        self.op(15, 0)
    }

    /// Assemble the final image bytes: header, empty public-symbol table
    /// (entry offset 0), string table, code region.
    pub fn build(mut self, global_area_size: u32) -> lama_vm::image::BytecodeImage {
        for (pos, name) in &self.patches {
            let target = *self
                .labels
                .get(name)
                .unwrap_or_else(|| panic!("undefined label {name:?}"));
            self.code[*pos..*pos + 4].copy_from_slice(&target.to_le_bytes());
        }

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(self.strings.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&global_area_size.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes()); // no public symbols table entries
        bytes.extend_from_slice(&self.strings);
        bytes.extend_from_slice(&self.code);
        lama_vm::image::BytecodeImage::parse(&bytes).expect("assembled image parses")
    }
}
