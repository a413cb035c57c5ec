//! Immutable bit sequence with zero-copy slicing.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::io::{Read, Write};
use std::sync::Arc;

use crate::bits_mut::BitsMut;
use crate::codec::{self, Kind, Value};
use crate::errors::{BitsError, BuildError, InterpretError, PackError, ReadError};
use crate::search::{self, FindAll, FindOpts, Split};
use crate::slice::{AsBits, BitSlice};

/// An immutable sequence of bits.
///
/// Storage is shared: `clone` and [`slice`](Bits::slice) are cheap and never
/// copy the underlying bytes. Every operation returns a new value; two
/// sequences are equal iff their lengths and bit contents match.
#[derive(Clone)]
pub struct Bits {
    data: Arc<[u8]>,
    offset: usize,
    len: usize,
}

/// The accepted construction sources, one variant per input shape.
pub enum Init<'a> {
    /// A format specification whose tokens are all literal or value-bound.
    Spec(&'a str),
    /// Whole bytes, 8 bits each.
    Bytes(&'a [u8]),
    /// One bit per bool.
    Bools(&'a [bool]),
    /// `n` zero bits.
    Zeros(usize),
    /// An open byte source, read to its end. The handle is never closed
    /// here.
    Reader(&'a mut dyn Read),
}

impl Bits {
    /// Creates an empty sequence.
    pub fn new() -> Self {
        Self {
            data: Arc::from(Vec::new()),
            offset: 0,
            len: 0,
        }
    }

    /// Creates a sequence of `n` zero bits.
    pub fn zeros(n: usize) -> Self {
        BitsMut::zeros(n).freeze()
    }

    /// Creates a sequence of `n` one bits.
    pub fn ones(n: usize) -> Self {
        BitsMut::ones(n).freeze()
    }

    /// Creates a sequence from whole bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: Arc::from(bytes),
            offset: 0,
            len: bytes.len() * 8,
        }
    }

    /// Creates a sequence viewing `len` bits of `bytes` starting `offset`
    /// bits in.
    pub fn with_offset(bytes: &[u8], offset: usize, len: usize) -> Result<Self, BitsError> {
        if offset + len > bytes.len() * 8 {
            return Err(BitsError::RangeOutOfBounds {
                start: offset,
                end: offset + len,
                len: bytes.len() * 8,
            });
        }
        Ok(Self {
            data: Arc::from(bytes),
            offset,
            len,
        })
    }

    /// Creates a sequence from a bool iterator, one bit per item.
    pub fn from_bools<I: IntoIterator<Item = bool>>(bools: I) -> Self {
        BitsMut::from_bools(bools).freeze()
    }

    /// Builds a sequence from a format specification whose tokens are all
    /// literals or value-bound (e.g. `"0x000001b3, uint:12=352"`).
    pub fn from_spec(spec: &str) -> Result<Self, PackError> {
        BitsMut::from_spec(spec).map(BitsMut::freeze)
    }

    /// Builds from any accepted construction source.
    pub fn build(init: Init<'_>) -> Result<Self, BuildError> {
        match init {
            Init::Spec(s) => Ok(Self::from_spec(s)?),
            Init::Bytes(b) => Ok(Self::from_bytes(b)),
            Init::Bools(b) => Ok(Self::from_bools(b.iter().copied())),
            Init::Zeros(n) => Ok(Self::zeros(n)),
            Init::Reader(r) => Ok(Self::read_from(r)?),
        }
    }

    /// Reads an open byte source to its end. The handle is borrowed for the
    /// call only and never closed here.
    pub fn read_from(reader: &mut dyn Read) -> std::io::Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self::from_byte_vec(bytes))
    }

    /// Reads exactly `nbytes` bytes from an open byte source.
    pub fn read_exact_from(reader: &mut dyn Read, nbytes: usize) -> std::io::Result<Self> {
        let mut bytes = vec![0u8; nbytes];
        reader.read_exact(&mut bytes)?;
        Ok(Self::from_byte_vec(bytes))
    }

    /// Seeks to `offset_bytes` in an open byte source, then reads `nbytes`
    /// bytes (or to the end when `None`).
    pub fn read_from_offset<R: Read + std::io::Seek>(
        reader: &mut R,
        offset_bytes: u64,
        nbytes: Option<usize>,
    ) -> std::io::Result<Self> {
        reader.seek(std::io::SeekFrom::Start(offset_bytes))?;
        match nbytes {
            Some(n) => Self::read_exact_from(reader, n),
            None => Self::read_from(reader),
        }
    }

    /// Creates a sequence taking ownership of whole bytes.
    pub fn from_byte_vec(bytes: Vec<u8>) -> Self {
        let len = bytes.len() * 8;
        Self {
            data: Arc::from(bytes),
            offset: 0,
            len,
        }
    }

    /// Unsigned integer in `len` bits, most-significant bit first. The
    /// value must fit.
    pub fn from_uint(value: u128, len: usize) -> Result<Self, InterpretError> {
        codec::encode(Kind::Uint, &Value::Uint(value), Some(len)).map(BitsMut::freeze)
    }

    /// Two's-complement signed integer in `len` bits.
    pub fn from_int(value: i128, len: usize) -> Result<Self, InterpretError> {
        codec::encode(Kind::Int, &Value::Int(value), Some(len)).map(BitsMut::freeze)
    }

    /// IEEE-754 big-endian float in 16, 32 or 64 bits.
    pub fn from_float(value: f64, len: usize) -> Result<Self, InterpretError> {
        codec::encode(Kind::FloatBe, &Value::Float(value), Some(len)).map(BitsMut::freeze)
    }

    /// A single bit.
    pub fn from_bool(value: bool) -> Self {
        Self::from_bools([value])
    }

    pub(crate) fn from_raw(data: Vec<u8>, len: usize) -> Self {
        Self {
            data: Arc::from(data),
            offset: 0,
            len,
        }
    }

    /// Length in bits.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reads the bit at `pos`, or `None` past the end.
    pub fn get(&self, pos: usize) -> Option<bool> {
        self.as_bitslice().get(pos)
    }

    /// Reads the bit at `index`, negative indices counting from the end.
    pub fn at(&self, index: i64) -> Result<bool, BitsError> {
        let pos = search::resolve_pos(index, self.len)?;
        Ok(self.as_bitslice().bit(pos))
    }

    /// Returns the sub-sequence `range` without copying storage.
    pub fn slice(&self, range: std::ops::Range<usize>) -> Result<Self, BitsError> {
        if range.start > range.end || range.end > self.len {
            return Err(BitsError::RangeOutOfBounds {
                start: range.start,
                end: range.end,
                len: self.len,
            });
        }
        Ok(Self {
            data: Arc::clone(&self.data),
            offset: self.offset + range.start,
            len: range.end - range.start,
        })
    }

    /// Returns the strided sub-sequence `start..stop` by `step`, with
    /// slice semantics: negative indices count from the end, out-of-range
    /// bounds clamp, and a negative step walks backwards.
    pub fn slice_step(
        &self,
        start: Option<i64>,
        stop: Option<i64>,
        step: i64,
    ) -> Result<Self, BitsError> {
        if step == 0 {
            return Err(BitsError::ZeroStep);
        }
        let len = self.len as i64;
        let clamp = |i: i64, low: i64, high: i64| i.max(low).min(high);
        let adjust = |i: i64| if i < 0 { i + len } else { i };

        let mut out = BitsMut::new();
        if step > 0 {
            let start = clamp(adjust(start.unwrap_or(0)), 0, len);
            let stop = clamp(adjust(stop.unwrap_or(len)), 0, len);
            let mut i = start;
            while i < stop {
                out.push(self.as_bitslice().bit(i as usize));
                i += step;
            }
        } else {
            let start = clamp(adjust(start.unwrap_or(len - 1)), -1, len - 1);
            let stop = clamp(adjust(stop.unwrap_or(-1 - len)), -1, len - 1);
            let mut i = start;
            while i > stop {
                out.push(self.as_bitslice().bit(i as usize));
                i += step;
            }
        }
        Ok(out.freeze())
    }

    /// Concatenation; `a + b` is sugar for this.
    pub fn concat(&self, other: &Bits) -> Bits {
        let mut out = self.to_mut();
        out.append(other);
        out.freeze()
    }

    /// `n` copies back to back; `a * n` is sugar for this.
    pub fn repeat(&self, n: usize) -> Bits {
        let mut out = BitsMut::with_capacity(self.len * n);
        for _ in 0..n {
            out.append(self);
        }
        out.freeze()
    }

    /// Bitwise AND of two equal-length sequences.
    pub fn and(&self, other: &Bits) -> Result<Bits, BitsError> {
        let mut out = self.to_mut();
        out.and_assign(other)?;
        Ok(out.freeze())
    }

    /// Bitwise OR of two equal-length sequences.
    pub fn or(&self, other: &Bits) -> Result<Bits, BitsError> {
        let mut out = self.to_mut();
        out.or_assign(other)?;
        Ok(out.freeze())
    }

    /// Bitwise XOR of two equal-length sequences.
    pub fn xor(&self, other: &Bits) -> Result<Bits, BitsError> {
        let mut out = self.to_mut();
        out.xor_assign(other)?;
        Ok(out.freeze())
    }

    /// Bitwise complement. Errors on an empty sequence.
    pub fn not(&self) -> Result<Bits, BitsError> {
        if self.is_empty() {
            return Err(BitsError::EmptyOperand);
        }
        let mut out = self.to_mut();
        out.invert_all();
        Ok(out.freeze())
    }

    /// Logical left shift by `n`, zero-filling on the right.
    pub fn shifted_left(&self, n: usize) -> Result<Bits, BitsError> {
        let mut out = self.to_mut();
        out.shift_left(n)?;
        Ok(out.freeze())
    }

    /// Logical right shift by `n`, zero-filling on the left.
    pub fn shifted_right(&self, n: usize) -> Result<Bits, BitsError> {
        let mut out = self.to_mut();
        out.shift_right(n)?;
        Ok(out.freeze())
    }

    /// Left rotation by `n` with wrap-around.
    pub fn rotated_left(&self, n: usize) -> Result<Bits, BitsError> {
        let mut out = self.to_mut();
        out.rotate_left(n)?;
        Ok(out.freeze())
    }

    /// Right rotation by `n` with wrap-around.
    pub fn rotated_right(&self, n: usize) -> Result<Bits, BitsError> {
        let mut out = self.to_mut();
        out.rotate_right(n)?;
        Ok(out.freeze())
    }

    /// The sequence with all bits in reverse order.
    pub fn reversed(&self) -> Bits {
        let mut out = self.to_mut();
        out.reverse();
        out.freeze()
    }

    /// Copies into a mutable sequence.
    pub fn to_mut(&self) -> BitsMut {
        BitsMut::from_raw(self.as_bitslice().to_byte_vec(), self.len)
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

    /// Single-bit boolean. Length must be exactly 1.
    pub fn to_bool(&self) -> Result<bool, InterpretError> {
        match codec::decode(Kind::Bool, self.as_bitslice())? {
            Value::Bool(b) => Ok(b),
            _ => unreachable!(),
        }
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

    /// Lazy ascending iterator over all match positions, overlapping
    /// matches included, optionally capped at `count`.
    pub fn find_all<'a, T: AsBits + ?Sized>(
        &'a self,
        needle: &'a T,
        opts: FindOpts,
        count: Option<usize>,
    ) -> Result<FindAll<'a>, BitsError> {
        search::find_all(self.as_bitslice(), needle.as_bitslice(), opts, count)
    }

    /// Splits at non-overlapping matches of `delimiter`, yielding the
    /// prefix chunk first (possibly empty). Chunks after the first start
    /// with the delimiter.
    pub fn split<'a, T: AsBits + ?Sized>(
        &'a self,
        delimiter: &'a T,
        opts: FindOpts,
        count: Option<usize>,
    ) -> Result<Split<'a>, BitsError> {
        search::split(self.as_bitslice(), delimiter.as_bitslice(), opts, count)
    }

    /// Replaces non-overlapping matches left to right, returning the new
    /// sequence and the number of substitutions.
    pub fn replace<T: AsBits + ?Sized, U: AsBits + ?Sized>(
        &self,
        needle: &T,
        replacement: &U,
        opts: FindOpts,
        count: Option<usize>,
    ) -> Result<(Bits, usize), BitsError> {
        let (out, n) = search::replace(
            self.as_bitslice(),
            needle.as_bitslice(),
            replacement.as_bitslice(),
            opts,
            count,
        )?;
        Ok((out.freeze(), n))
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

    // ---- export ----------------------------------------------------------

    /// Exact byte conversion; the length must be a multiple of 8.
    pub fn to_bytes(&self) -> Result<Vec<u8>, InterpretError> {
        if self.len % 8 != 0 {
            return Err(InterpretError::UnalignedLength(self.len));
        }
        Ok(self.as_bitslice().to_byte_vec())
    }

    /// Byte conversion padding the final partial byte with up to 7 zero
    /// bits. The only implicit padding anywhere in the crate.
    pub fn to_bytes_padded(&self) -> Vec<u8> {
        self.as_bitslice().to_byte_vec()
    }

    /// Writes the exact bytes to an open sink; the length must be a
    /// multiple of 8. The handle is borrowed for the call only.
    pub fn write_to(&self, writer: &mut dyn Write) -> std::io::Result<()> {
        let bytes = self
            .to_bytes()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        writer.write_all(&bytes)
    }

    /// Iterates the bits front to back.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.as_bitslice().iter()
    }
}

pub(crate) fn display_slice(s: BitSlice<'_>, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    if s.is_empty() {
        return Ok(());
    }
    if s.len() % 4 == 0 {
        write!(f, "0x")?;
        for i in (0..s.len()).step_by(4) {
            let nibble = s.read_uint(i, 4) as u32;
            write!(f, "{}", char::from_digit(nibble, 16).unwrap())?;
        }
        Ok(())
    } else {
        write!(f, "0b")?;
        for b in s.iter() {
            write!(f, "{}", if b { '1' } else { '0' })?;
        }
        Ok(())
    }
}

impl AsBits for Bits {
    fn as_bitslice(&self) -> BitSlice<'_> {
        BitSlice::new(&self.data, self.offset, self.len)
    }
}

impl Default for Bits {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Bits {
    fn eq(&self, other: &Self) -> bool {
        self.as_bitslice() == other.as_bitslice()
    }
}

impl Eq for Bits {}

impl PartialEq<BitsMut> for Bits {
    fn eq(&self, other: &BitsMut) -> bool {
        self.as_bitslice() == other.as_bitslice()
    }
}

impl Hash for Bits {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len.hash(state);
        self.as_bitslice().to_byte_vec().hash(state);
    }
}

impl std::fmt::Display for Bits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        display_slice(self.as_bitslice(), f)
    }
}

impl std::fmt::Debug for Bits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bits({}, {} bits)", self, self.len)
    }
}

impl std::ops::Add<&Bits> for &Bits {
    type Output = Bits;

    fn add(self, rhs: &Bits) -> Bits {
        self.concat(rhs)
    }
}

impl std::ops::Mul<usize> for &Bits {
    type Output = Bits;

    fn mul(self, rhs: usize) -> Bits {
        self.repeat(rhs)
    }
}

impl From<&[u8]> for Bits {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Vec<u8>> for Bits {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_byte_vec(bytes)
    }
}

impl From<BitsMut> for Bits {
    fn from(bits: BitsMut) -> Self {
        bits.freeze()
    }
}

impl FromIterator<bool> for Bits {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self::from_bools(iter)
    }
}
