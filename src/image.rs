//! Bytecode image loading.
//!
//! The specification leaves the bytecode file format external, described
//! only by what the evaluator needs to read out of it. This module
//! implements that reader against the on-disk layout the source toolchain
//! actually emits, so the evaluator has something concrete to run against:
//! a 12-byte header (`stringtab_size`, `global_area_size`,
//! `public_symbols_number`, all little-endian `i32`), followed by the
//! public-symbols table (pairs of `(name_offset, code_offset)` ints),
//! followed by the string table, followed by the code region running to
//! the end of the file.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to read bytecode file: {0}")]
    Io(#[from] std::io::Error),

    #[error("file is {len} bytes, shorter than the 12-byte header")]
    TruncatedHeader { len: usize },

    #[error("file is {len} bytes, too short for a {want}-byte public symbols table")]
    TruncatedPublicTable { len: usize, want: usize },

    #[error("file is {len} bytes, too short for a {want}-byte string table")]
    TruncatedStringTable { len: usize, want: usize },

    #[error("string table offset {offset} is not a valid string boundary (table is {size} bytes)")]
    BadStringOffset { offset: usize, size: usize },
}

/// A loaded, immutable bytecode image: the public symbol table, string
/// table, and code region, plus the declared size of the global area.
#[derive(Debug)]
pub struct BytecodeImage {
    code: Vec<u8>,
    strings: Vec<u8>,
    publics: Vec<(u32, u32)>,
    global_area_size: usize,
}

impl BytecodeImage {
    /// Parse a complete bytecode file already read into memory.
    pub fn parse(bytes: &[u8]) -> Result<BytecodeImage, ImageError> {
        if bytes.len() < 12 {
            return Err(ImageError::TruncatedHeader { len: bytes.len() });
        }
        let stringtab_size = read_u32(bytes, 0) as usize;
        let global_area_size = read_u32(bytes, 4) as usize;
        let public_symbols_number = read_u32(bytes, 8) as usize;

        let public_table_bytes = public_symbols_number * 2 * 4;
        let after_header = &bytes[12..];
        if after_header.len() < public_table_bytes {
            return Err(ImageError::TruncatedPublicTable { len: bytes.len(), want: public_table_bytes + 12 });
        }
        let mut publics = Vec::with_capacity(public_symbols_number);
        for i in 0..public_symbols_number {
            let name_off = read_u32(after_header, i * 8);
            let code_off = read_u32(after_header, i * 8 + 4);
            publics.push((name_off, code_off));
        }

        let after_publics = &after_header[public_table_bytes..];
        if after_publics.len() < stringtab_size {
            return Err(ImageError::TruncatedStringTable {
                len: bytes.len(),
                want: public_table_bytes + 12 + stringtab_size,
            });
        }
        let strings = after_publics[..stringtab_size].to_vec();
        let code = after_publics[stringtab_size..].to_vec();

        Ok(BytecodeImage { code, strings, publics, global_area_size })
    }

    /// Read a NUL-terminated string out of the string table at byte
    /// `offset`, matching `get_string`'s pointer-arithmetic contract.
    pub fn string_at(&self, offset: u32) -> Result<&str, ImageError> {
        let offset = offset as usize;
        let bytes = self.strings.get(offset..).ok_or(ImageError::BadStringOffset { offset, size: self.strings.len() })?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        std::str::from_utf8(&bytes[..end]).map_err(|_| ImageError::BadStringOffset { offset, size: self.strings.len() })
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn global_area_size(&self) -> usize {
        self.global_area_size
    }

    /// Entry code offset of the public symbol declared first in the
    /// table — by convention, and in every image this toolchain emits,
    /// the program's top-level entry point.
    pub fn entry_offset(&self) -> usize {
        self.publics.first().map(|(_, off)| *off as usize).unwrap_or(0)
    }

    pub fn public_symbols(&self) -> impl Iterator<Item = (&str, usize)> {
        self.publics.iter().filter_map(move |(name, off)| {
            self.string_at(*name).ok().map(|s| (s, *off as usize))
        })
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
