//! Sequential read cursor over a bit sequence.

use std::collections::HashMap;

use crate::bits::Bits;
use crate::bits_mut::BitsMut;
use crate::codec::{Kind, Value};
use crate::errors::{BitsError, CompileError, PackError, ReadError};
use crate::format::{Format, Program};
use crate::search::FindOpts;
use crate::slice::{AsBits, BitSlice};

/// A bit sequence with a read position.
///
/// `read*` consumes, `peek*` restores the position, and a multi-token read
/// is atomic: on failure the position is exactly what it was before the
/// call. The position never takes part in equality.
///
/// Mutations follow the cursor rules: a pure trailing extension
/// ([`append`](BitStream::append)) leaves the position alone; every other
/// length-changing operation resets it to 0.
#[derive(Debug, Clone, Default)]
pub struct BitStream {
    buf: BitsMut,
    pos: usize,
}

impl BitStream {
    /// An empty stream at position 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// A stream over the given bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        BitsMut::from_bytes(bytes).into()
    }

    /// A stream built from a format specification of literal or
    /// value-bound tokens.
    pub fn from_spec(spec: &str) -> Result<Self, PackError> {
        Ok(BitsMut::from_spec(spec)?.into())
    }

    /// Length in bits.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The current read position in bits.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Moves the read position; it must stay within `[0, len]`.
    pub fn set_pos(&mut self, pos: usize) -> Result<(), ReadError> {
        if pos > self.len() {
            return Err(ReadError::BadPosition {
                pos,
                len: self.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Bits left between the position and the end.
    pub fn remaining(&self) -> usize {
        self.len() - self.pos
    }

    /// Copies the underlying bits, position excluded.
    pub fn to_bits(&self) -> Bits {
        self.buf.to_bits()
    }

    // ---- reading ---------------------------------------------------------

    /// Reads the next `n` bits as a raw sequence and advances.
    pub fn read_bits(&mut self, n: usize) -> Result<Bits, ReadError> {
        if n > self.remaining() {
            return Err(ReadError::Exhausted {
                requested: n,
                available: self.remaining(),
            });
        }
        let out = self.to_bits().slice(self.pos..self.pos + n).unwrap();
        self.pos += n;
        Ok(out)
    }

    /// Reads the next `n` bits without advancing.
    pub fn peek_bits(&self, n: usize) -> Result<Bits, ReadError> {
        if n > self.remaining() {
            return Err(ReadError::Exhausted {
                requested: n,
                available: self.remaining(),
            });
        }
        Ok(self.to_bits().slice(self.pos..self.pos + n).unwrap())
    }

    /// Reads one token (e.g. `"uint:8"` or `"ue"`) and advances by its
    /// consumed width.
    pub fn read(&mut self, fmt: &str) -> Result<Value, ReadError> {
        let program = self.single_token_program(fmt)?;
        let mut values = self.run(&program, true)?;
        Ok(values.remove(0))
    }

    /// Reads one token without advancing.
    pub fn peek(&mut self, fmt: &str) -> Result<Value, ReadError> {
        let program = self.single_token_program(fmt)?;
        let mut values = self.run(&program, false)?;
        Ok(values.remove(0))
    }

    /// Reads a whole token list atomically: either every token decodes and
    /// the position advances past them all, or nothing moves.
    pub fn read_list(&mut self, fmt: &str) -> Result<Vec<Value>, ReadError> {
        self.read_list_with(fmt, &HashMap::new())
    }

    /// [`read_list`](BitStream::read_list) with named lengths/values.
    pub fn read_list_with(
        &mut self,
        fmt: &str,
        names: &HashMap<String, Value>,
    ) -> Result<Vec<Value>, ReadError> {
        let program = Format::parse(fmt)?.bind(names)?;
        self.run(&program, true)
    }

    /// Reads a token list without advancing.
    pub fn peek_list(&mut self, fmt: &str) -> Result<Vec<Value>, ReadError> {
        let program = Program::from_spec(fmt)?;
        self.run(&program, false)
    }

    /// Runs a precompiled program at the position, advancing on success.
    pub fn read_program(&mut self, program: &Program) -> Result<Vec<Value>, ReadError> {
        self.run(program, true)
    }

    /// Runs a precompiled program without advancing.
    pub fn peek_program(&mut self, program: &Program) -> Result<Vec<Value>, ReadError> {
        self.run(program, false)
    }

    fn run(&mut self, program: &Program, advance: bool) -> Result<Vec<Value>, ReadError> {
        // Decode against a local cursor; commit only on full success.
        let (values, end) = program.execute(self.buf.as_bitslice(), self.pos)?;
        if advance {
            self.pos = end;
        }
        Ok(values)
    }

    fn single_token_program(&self, fmt: &str) -> Result<Program, ReadError> {
        let program = Program::from_spec(fmt)?;
        // Exactly one value-producing token.
        if program.tokens().len() != 1 || program.tokens()[0].kind == Kind::Pad {
            return Err(ReadError::Compile(CompileError::BadToken(fmt.to_string())));
        }
        Ok(program)
    }

    /// Advances to the next multiple of 8, returning the bits skipped.
    pub fn byte_align(&mut self) -> usize {
        let target = self.pos.next_multiple_of(8).min(self.len());
        let skipped = target - self.pos;
        self.pos = target;
        skipped
    }

    // ---- search ----------------------------------------------------------

    /// Finds `needle`; on success the position moves to the match start.
    pub fn find<T: AsBits + ?Sized>(
        &mut self,
        needle: &T,
        opts: FindOpts,
    ) -> Result<Option<usize>, BitsError> {
        let hit = self.buf.find(needle, opts)?;
        if let Some(p) = hit {
            self.pos = p;
        }
        Ok(hit)
    }

    /// Reverse-finds `needle`; on success the position moves to the match
    /// start.
    pub fn rfind<T: AsBits + ?Sized>(
        &mut self,
        needle: &T,
        opts: FindOpts,
    ) -> Result<Option<usize>, BitsError> {
        let hit = self.buf.rfind(needle, opts)?;
        if let Some(p) = hit {
            self.pos = p;
        }
        Ok(hit)
    }

    // ---- mutation with cursor rules --------------------------------------

    /// Appends at the end. A pure trailing extension: the position is
    /// unchanged.
    pub fn append<T: AsBits + ?Sized>(&mut self, other: &T) {
        self.buf.append(other);
    }

    /// Prepends; the position resets to 0.
    pub fn prepend<T: AsBits + ?Sized>(&mut self, other: &T) {
        self.buf.prepend(other);
        self.pos = 0;
    }

    /// Inserts before `pos`; the position resets to 0.
    pub fn insert<T: AsBits + ?Sized>(&mut self, pos: usize, other: &T) -> Result<(), BitsError> {
        self.buf.insert(pos, other)?;
        self.pos = 0;
        Ok(())
    }

    /// Overwrites at `pos`. The position resets to 0 only when the length
    /// grows.
    pub fn overwrite<T: AsBits + ?Sized>(
        &mut self,
        pos: usize,
        other: &T,
    ) -> Result<(), BitsError> {
        let before = self.len();
        self.buf.overwrite(pos, other)?;
        if self.len() != before {
            self.pos = 0;
        }
        Ok(())
    }

    /// Deletes a range; the position resets to 0.
    pub fn delete(&mut self, range: std::ops::Range<usize>) -> Result<(), BitsError> {
        self.buf.delete(range)?;
        self.pos = 0;
        Ok(())
    }

    /// Replaces matches in place. The position resets to 0 only when the
    /// length changed.
    pub fn replace<T: AsBits + ?Sized, U: AsBits + ?Sized>(
        &mut self,
        needle: &T,
        replacement: &U,
        opts: FindOpts,
        count: Option<usize>,
    ) -> Result<usize, BitsError> {
        let before = self.len();
        let n = self.buf.replace(needle, replacement, opts, count)?;
        if self.len() != before {
            self.pos = 0;
        }
        Ok(n)
    }
}

impl AsBits for BitStream {
    fn as_bitslice(&self) -> BitSlice<'_> {
        self.buf.as_bitslice()
    }
}

impl PartialEq for BitStream {
    fn eq(&self, other: &Self) -> bool {
        // Cursor state never takes part in equality.
        self.buf == other.buf
    }
}

impl Eq for BitStream {}

impl PartialEq<Bits> for BitStream {
    fn eq(&self, other: &Bits) -> bool {
        self.buf == *other
    }
}

impl From<Bits> for BitStream {
    fn from(bits: Bits) -> Self {
        Self {
            buf: bits.to_mut(),
            pos: 0,
        }
    }
}

impl From<BitsMut> for BitStream {
    fn from(buf: BitsMut) -> Self {
        Self { buf, pos: 0 }
    }
}

impl std::fmt::Display for BitStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        crate::bits::display_slice(self.as_bitslice(), f)
    }
}
