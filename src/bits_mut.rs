//! Growable, mutable bit sequence.

use std::collections::HashMap;

use crate::bits::Bits;
use crate::codec::{self, Kind, Value};
use crate::errors::{BitsError, InterpretError, PackError, ReadError};
use crate::search::{self, FindOpts};
use crate::slice::{AsBits, BitSlice};
use crate::raw;

/// A mutable bit sequence backed by a growable byte buffer.
///
/// Unused bits in the final byte are always zero. `BitsMut` compares equal
/// to [`Bits`] with the same content but is never hashable.
#[derive(Debug, Clone, Default)]
pub struct BitsMut {
    data: Vec<u8>,
    len: usize,
}

impl BitsMut {
    /// Creates an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty sequence with room for `bits` bits.
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            data: Vec::with_capacity(raw::byte_len(bits)),
            len: 0,
        }
    }

    /// Creates a sequence of `n` zero bits.
    pub fn zeros(n: usize) -> Self {
        Self {
            data: vec![0u8; raw::byte_len(n)],
            len: n,
        }
    }

    /// Creates a sequence of `n` one bits.
    pub fn ones(n: usize) -> Self {
        let mut data = vec![0xFFu8; raw::byte_len(n)];
        raw::mask_tail(&mut data, n);
        Self { data, len: n }
    }

    /// Creates a sequence from whole bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: bytes.to_vec(),
            len: bytes.len() * 8,
        }
    }

    /// Creates a sequence from a bool iterator, one bit per item.
    pub fn from_bools<I: IntoIterator<Item = bool>>(bools: I) -> Self {
        let mut out = Self::new();
        for b in bools {
            out.push(b);
        }
        out
    }

    /// Builds a sequence from a format specification whose tokens are all
    /// literals or value-bound (e.g. `"0x2f, uint:12=352"`).
    pub fn from_spec(spec: &str) -> Result<Self, PackError> {
        crate::format::Format::parse(spec)?
            .bind(&HashMap::new())?
            .pack(&[])
    }

    /// Wraps an already tail-masked buffer. Internal constructor.
    pub(crate) fn from_raw(data: Vec<u8>, len: usize) -> Self {
        debug_assert!(data.len() == raw::byte_len(len));
        Self { data, len }
    }

    /// Length in bits.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Freezes into an immutable [`Bits`] without copying.
    pub fn freeze(self) -> Bits {
        Bits::from_raw(self.data, self.len)
    }

    /// Copies into an immutable [`Bits`], leaving `self` usable.
    pub fn to_bits(&self) -> Bits {
        self.clone().freeze()
    }

    /// Reads the bit at `pos`, or `None` past the end.
    pub fn get(&self, pos: usize) -> Option<bool> {
        (pos < self.len).then(|| raw::bit(&self.data, pos))
    }

    /// Reads the bit at `index`, negative indices counting from the end.
    pub fn at(&self, index: i64) -> Result<bool, BitsError> {
        let pos = search::resolve_pos(index, self.len)?;
        Ok(raw::bit(&self.data, pos))
    }

    // ---- growth ----------------------------------------------------------

    /// Appends a single bit.
    pub fn push(&mut self, bit: bool) {
        if self.len % 8 == 0 {
            self.data.push(0);
        }
        if bit {
            raw::set_bit(&mut self.data, self.len, true);
        }
        self.len += 1;
    }

    /// Appends the low `n` bits of `value`, MSB-first.
    pub fn push_uint(&mut self, n: usize, value: u128) {
        debug_assert!(n <= 128);
        let new_len = self.len + n;
        self.data.resize(raw::byte_len(new_len), 0);
        raw::write_uint(&mut self.data, self.len, n, mask_low(value, n));
        self.len = new_len;
    }

    /// Appends another sequence. A pure trailing extension: existing bits
    /// are untouched.
    pub fn append<T: AsBits + ?Sized>(&mut self, other: &T) {
        let s = other.as_bitslice();
        let new_len = self.len + s.len;
        self.data.resize(raw::byte_len(new_len), 0);
        raw::copy_range(&mut self.data, self.len, s.data, s.offset, s.len);
        self.len = new_len;
    }

    /// Inserts another sequence at bit position 0.
    pub fn prepend<T: AsBits + ?Sized>(&mut self, other: &T) {
        // insert at 0 cannot fail
        self.insert(0, other).unwrap();
    }

    /// Inserts another sequence before bit position `pos`.
    pub fn insert<T: AsBits + ?Sized>(&mut self, pos: usize, other: &T) -> Result<(), BitsError> {
        if pos > self.len {
            return Err(BitsError::IndexOutOfRange {
                index: pos as i64,
                len: self.len,
            });
        }
        let s = other.as_bitslice();
        let new_len = self.len + s.len;
        let mut out = vec![0u8; raw::byte_len(new_len)];
        raw::copy_range(&mut out, 0, &self.data, 0, pos);
        raw::copy_range(&mut out, pos, s.data, s.offset, s.len);
        raw::copy_range(&mut out, pos + s.len, &self.data, pos, self.len - pos);
        self.data = out;
        self.len = new_len;
        Ok(())
    }

    /// Overwrites bits starting at `pos`, extending the sequence if the
    /// other runs past the current end.
    pub fn overwrite<T: AsBits + ?Sized>(
        &mut self,
        pos: usize,
        other: &T,
    ) -> Result<(), BitsError> {
        if pos > self.len {
            return Err(BitsError::IndexOutOfRange {
                index: pos as i64,
                len: self.len,
            });
        }
        let s = other.as_bitslice();
        let end = pos + s.len;
        if end > self.len {
            self.data.resize(raw::byte_len(end), 0);
            self.len = end;
        }
        raw::copy_range(&mut self.data, pos, s.data, s.offset, s.len);
        Ok(())
    }

    /// Deletes the bits in `range`, closing the gap.
    pub fn delete(&mut self, range: std::ops::Range<usize>) -> Result<(), BitsError> {
        if range.start > range.end || range.end > self.len {
            return Err(BitsError::RangeOutOfBounds {
                start: range.start,
                end: range.end,
                len: self.len,
            });
        }
        let removed = range.end - range.start;
        let new_len = self.len - removed;
        let mut out = vec![0u8; raw::byte_len(new_len)];
        raw::copy_range(&mut out, 0, &self.data, 0, range.start);
        raw::copy_range(&mut out, range.start, &self.data, range.end, self.len - range.end);
        self.data = out;
        self.len = new_len;
        Ok(())
    }

    // ---- bit twiddling ---------------------------------------------------

    /// Sets the bit at `index` (negative allowed) to `value`.
    pub fn set(&mut self, value: bool, index: i64) -> Result<(), BitsError> {
        let pos = search::resolve_pos(index, self.len)?;
        raw::set_bit(&mut self.data, pos, value);
        Ok(())
    }

    /// Sets every listed position to `value`. Fails on the first position
    /// outside `[-len, len)` without applying the rest.
    pub fn set_many<I: IntoIterator<Item = i64>>(
        &mut self,
        value: bool,
        positions: I,
    ) -> Result<(), BitsError> {
        let resolved: Result<Vec<usize>, _> = positions
            .into_iter()
            .map(|i| search::resolve_pos(i, self.len))
            .collect();
        for pos in resolved? {
            raw::set_bit(&mut self.data, pos, value);
        }
        Ok(())
    }

    /// Sets every bit to `value`.
    pub fn set_all(&mut self, value: bool) {
        let fill = if value { 0xFF } else { 0x00 };
        self.data.fill(fill);
        raw::mask_tail(&mut self.data, self.len);
    }

    /// Inverts the bit at `index` (negative allowed).
    pub fn invert(&mut self, index: i64) -> Result<(), BitsError> {
        let pos = search::resolve_pos(index, self.len)?;
        let cur = raw::bit(&self.data, pos);
        raw::set_bit(&mut self.data, pos, !cur);
        Ok(())
    }

    /// Inverts every listed position, validating all positions first.
    pub fn invert_many<I: IntoIterator<Item = i64>>(
        &mut self,
        positions: I,
    ) -> Result<(), BitsError> {
        let resolved: Result<Vec<usize>, _> = positions
            .into_iter()
            .map(|i| search::resolve_pos(i, self.len))
            .collect();
        for pos in resolved? {
            let cur = raw::bit(&self.data, pos);
            raw::set_bit(&mut self.data, pos, !cur);
        }
        Ok(())
    }

    /// Inverts every bit.
    pub fn invert_all(&mut self) {
        for b in &mut self.data {
            *b = !*b;
        }
        raw::mask_tail(&mut self.data, self.len);
    }

    /// Reverses the whole sequence in place.
    pub fn reverse(&mut self) {
        let len = self.len;
        if len > 1 {
            self.reverse_range(0..len).unwrap();
        }
    }

    /// Reverses the bits in `range` in place.
    pub fn reverse_range(&mut self, range: std::ops::Range<usize>) -> Result<(), BitsError> {
        if range.start > range.end || range.end > self.len {
            return Err(BitsError::RangeOutOfBounds {
                start: range.start,
                end: range.end,
                len: self.len,
            });
        }
        let (mut i, mut j) = (range.start, range.end);
        while i + 1 < j {
            j -= 1;
            let (a, b) = (raw::bit(&self.data, i), raw::bit(&self.data, j));
            raw::set_bit(&mut self.data, i, b);
            raw::set_bit(&mut self.data, j, a);
            i += 1;
        }
        Ok(())
    }

    /// Rotates left by `n` bits with wrap-around.
    pub fn rotate_left(&mut self, n: usize) -> Result<(), BitsError> {
        if self.is_empty() {
            return Err(BitsError::EmptyOperand);
        }
        let n = n % self.len;
        if n > 0 {
            let head = self.to_bits().slice(0..n).unwrap();
            self.delete(0..n).unwrap();
            self.append(&head);
        }
        Ok(())
    }

    /// Rotates right by `n` bits with wrap-around.
    pub fn rotate_right(&mut self, n: usize) -> Result<(), BitsError> {
        if self.is_empty() {
            return Err(BitsError::EmptyOperand);
        }
        let n = n % self.len;
        if n > 0 {
            let split = self.len - n;
            let tail = self.to_bits().slice(split..self.len).unwrap();
            self.delete(split..self.len).unwrap();
            self.prepend(&tail);
        }
        Ok(())
    }

    /// Shifts left by `n` bits, zero-filling on the right.
    pub fn shift_left(&mut self, n: usize) -> Result<(), BitsError> {
        if self.is_empty() {
            return Err(BitsError::EmptyOperand);
        }
        let n = n.min(self.len);
        self.delete(0..n).unwrap();
        self.push_zeros(n);
        Ok(())
    }

    /// Shifts right by `n` bits, zero-filling on the left.
    pub fn shift_right(&mut self, n: usize) -> Result<(), BitsError> {
        if self.is_empty() {
            return Err(BitsError::EmptyOperand);
        }
        let n = n.min(self.len);
        self.delete(self.len - n..self.len).unwrap();
        self.insert(0, &BitsMut::zeros(n)).unwrap();
        Ok(())
    }

    fn push_zeros(&mut self, n: usize) {
        let new_len = self.len + n;
        self.data.resize(raw::byte_len(new_len), 0);
        self.len = new_len;
    }

    // ---- bitwise ---------------------------------------------------------

    /// In-place bitwise AND with an equal-length sequence.
    pub fn and_assign<T: AsBits + ?Sized>(&mut self, other: &T) -> Result<(), BitsError> {
        self.bitwise_assign(other, |a, b| a & b)
    }

    /// In-place bitwise OR with an equal-length sequence.
    pub fn or_assign<T: AsBits + ?Sized>(&mut self, other: &T) -> Result<(), BitsError> {
        self.bitwise_assign(other, |a, b| a | b)
    }

    /// In-place bitwise XOR with an equal-length sequence.
    pub fn xor_assign<T: AsBits + ?Sized>(&mut self, other: &T) -> Result<(), BitsError> {
        self.bitwise_assign(other, |a, b| a ^ b)
    }

    fn bitwise_assign<T: AsBits + ?Sized>(
        &mut self,
        other: &T,
        op: fn(bool, bool) -> bool,
    ) -> Result<(), BitsError> {
        let s = other.as_bitslice();
        if s.len != self.len {
            return Err(BitsError::LengthMismatch {
                left: self.len,
                right: s.len,
            });
        }
        for i in 0..self.len {
            let b = op(raw::bit(&self.data, i), s.bit(i));
            raw::set_bit(&mut self.data, i, b);
        }
        Ok(())
    }

    // ---- search ----------------------------------------------------------

    /// Smallest match position of `needle`, subject to `opts`.
    pub fn find<T: AsBits + ?Sized>(
        &self,
        needle: &T,
        opts: FindOpts,
    ) -> Result<Option<usize>, BitsError> {
        search::find(self.as_bitslice(), needle.as_bitslice(), opts)
    }

    /// Largest match position of `needle`, subject to `opts`.
    pub fn rfind<T: AsBits + ?Sized>(
        &self,
        needle: &T,
        opts: FindOpts,
    ) -> Result<Option<usize>, BitsError> {
        search::rfind(self.as_bitslice(), needle.as_bitslice(), opts)
    }

    /// Replaces non-overlapping matches left to right, in place. Returns
    /// the number of substitutions.
    pub fn replace<T: AsBits + ?Sized, U: AsBits + ?Sized>(
        &mut self,
        needle: &T,
        replacement: &U,
        opts: FindOpts,
        count: Option<usize>,
    ) -> Result<usize, BitsError> {
        let (out, n) = search::replace(
            self.as_bitslice(),
            needle.as_bitslice(),
            replacement.as_bitslice(),
            opts,
            count,
        )?;
        *self = out;
        Ok(n)
    }

    /// Number of bits equal to `value`.
    pub fn count(&self, value: bool) -> usize {
        let ones = self.as_bitslice().count_ones();
        if value { ones } else { self.len - ones }
    }

    /// True when every listed position (default: all) holds `value`.
    pub fn all(&self, value: bool, positions: Option<&[i64]>) -> Result<bool, BitsError> {
        search::all(self.as_bitslice(), value, positions)
    }

    /// True when at least one listed position (default: any) holds `value`.
    pub fn any(&self, value: bool, positions: Option<&[i64]>) -> Result<bool, BitsError> {
        search::any(self.as_bitslice(), value, positions)
    }

    // ---- interpretation --------------------------------------------------

    /// Decodes the whole sequence as `kind`.
    pub fn interpret(&self, kind: Kind) -> Result<Value, InterpretError> {
        codec::decode(kind, self.as_bitslice())
    }

    /// Unsigned big-endian integer over the whole sequence.
    pub fn uint(&self) -> Result<u128, InterpretError> {
        codec::decode_uint(self.as_bitslice())
    }

    /// Two's-complement signed integer over the whole sequence.
    pub fn int(&self) -> Result<i128, InterpretError> {
        codec::decode_int(self.as_bitslice())
    }

    /// Hex digits, most-significant nibble first. Length must be a
    /// multiple of 4.
    pub fn hex(&self) -> Result<String, InterpretError> {
        codec::decode_digits(Kind::Hex, self.as_bitslice())
    }

    /// Octal digits. Length must be a multiple of 3.
    pub fn oct(&self) -> Result<String, InterpretError> {
        codec::decode_digits(Kind::Oct, self.as_bitslice())
    }

    /// Binary digits.
    pub fn bin(&self) -> String {
        codec::decode_digits(Kind::Bin, self.as_bitslice()).unwrap()
    }

    /// Re-encodes `value` as `kind` over the existing length, replacing the
    /// contents. The length never changes.
    pub fn store(&mut self, kind: Kind, value: &Value) -> Result<(), InterpretError> {
        let encoded = codec::encode(kind, value, Some(self.len))?;
        self.data = encoded.data;
        Ok(())
    }

    /// Unpacks the sequence according to a format string.
    pub fn unpack(&self, fmt: &str) -> Result<Vec<Value>, ReadError> {
        self.unpack_with(fmt, &HashMap::new())
    }

    /// Unpacks with named lengths/values resolved from `names`.
    pub fn unpack_with(
        &self,
        fmt: &str,
        names: &HashMap<String, Value>,
    ) -> Result<Vec<Value>, ReadError> {
        let program = crate::format::Format::parse(fmt)?.bind(names)?;
        let (values, _) = program.execute(self.as_bitslice(), 0)?;
        Ok(values)
    }

    // ---- export ----------------------------------------------------------

    /// Exact byte conversion; the length must be a multiple of 8.
    pub fn to_bytes(&self) -> Result<Vec<u8>, InterpretError> {
        if self.len % 8 != 0 {
            return Err(InterpretError::UnalignedLength(self.len));
        }
        Ok(self.data.clone())
    }

    /// Byte conversion padding the final partial byte with up to 7 zero
    /// bits.
    pub fn to_bytes_padded(&self) -> Vec<u8> {
        self.data.clone()
    }
}

fn mask_low(value: u128, n: usize) -> u128 {
    if n >= 128 {
        value
    } else {
        value & ((1u128 << n) - 1)
    }
}

impl AsBits for BitsMut {
    fn as_bitslice(&self) -> BitSlice<'_> {
        BitSlice::new(&self.data, 0, self.len)
    }
}

impl PartialEq for BitsMut {
    fn eq(&self, other: &Self) -> bool {
        self.as_bitslice() == other.as_bitslice()
    }
}

impl Eq for BitsMut {}

impl PartialEq<Bits> for BitsMut {
    fn eq(&self, other: &Bits) -> bool {
        self.as_bitslice() == other.as_bitslice()
    }
}

impl std::fmt::Display for BitsMut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        crate::bits::display_slice(self.as_bitslice(), f)
    }
}

impl From<Bits> for BitsMut {
    fn from(bits: Bits) -> Self {
        bits.to_mut()
    }
}

impl FromIterator<bool> for BitsMut {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self::from_bools(iter)
    }
}
