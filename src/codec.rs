//! Stateless conversions between bit ranges and typed values.
//!
//! Every interpretation kind has a decode rule and an inverse encode rule;
//! violating a kind's length precondition fails with an
//! [`InterpretError`], never a silent truncation.

use crate::bits::Bits;
use crate::bits_mut::BitsMut;
use crate::errors::InterpretError;
use crate::float;
use crate::golomb;
use crate::slice::BitSlice;
use crate::raw;

/// Byte order for the multi-byte integer and float kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endianness {
    Big,
    Little,
    /// The host byte order, resolved once at compile time.
    Native,
}

/// The host byte order, detected once from the build target.
pub const NATIVE_ENDIAN: Endianness = if cfg!(target_endian = "little") {
    Endianness::Little
} else {
    Endianness::Big
};

impl Endianness {
    /// Collapses `Native` to the concrete host order.
    pub fn resolve(self) -> Endianness {
        match self {
            Endianness::Native => NATIVE_ENDIAN,
            other => other,
        }
    }
}

/// An interpretation kind: a typed view computed from a bit range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Binary digit string, any length.
    Bin,
    /// Hex digit string, length a multiple of 4.
    Hex,
    /// Octal digit string, length a multiple of 3.
    Oct,
    /// Unsigned base-2 integer, 1 to 128 bits.
    Uint,
    /// Two's-complement signed integer, 1 to 128 bits.
    Int,
    /// Unsigned integer over whole bytes, big-endian.
    UintBe,
    /// Unsigned integer over whole bytes, little-endian.
    UintLe,
    /// Unsigned integer over whole bytes, host-endian.
    UintNe,
    /// Signed integer over whole bytes, big-endian.
    IntBe,
    /// Signed integer over whole bytes, little-endian.
    IntLe,
    /// Signed integer over whole bytes, host-endian.
    IntNe,
    /// IEEE-754 binary16/32/64, big-endian.
    FloatBe,
    /// IEEE-754 binary16/32/64, little-endian.
    FloatLe,
    /// IEEE-754 binary16/32/64, host-endian.
    FloatNe,
    /// Top 16 bits of a binary32 pattern.
    BFloat,
    /// 8-bit FNUZ float, 1-4-3 layout.
    Float8e143,
    /// 8-bit FNUZ float, 1-5-2 layout.
    Float8e152,
    /// Standard Exp-Golomb, unsigned.
    Ue,
    /// Standard Exp-Golomb, signed.
    Se,
    /// Interleaved Exp-Golomb, unsigned.
    Uie,
    /// Interleaved Exp-Golomb, signed.
    Sie,
    /// A single bit as a boolean.
    Bool,
    /// Write-only zero padding.
    Pad,
    /// Raw bit passthrough.
    Bits,
}

impl Kind {
    /// Looks up a kind by its mini-language keyword. `float` and `bfloat`
    /// default to big-endian.
    pub fn from_name(name: &str) -> Option<Kind> {
        Some(match name {
            "bin" => Kind::Bin,
            "hex" => Kind::Hex,
            "oct" => Kind::Oct,
            "uint" => Kind::Uint,
            "int" => Kind::Int,
            "uintbe" => Kind::UintBe,
            "uintle" => Kind::UintLe,
            "uintne" => Kind::UintNe,
            "intbe" => Kind::IntBe,
            "intle" => Kind::IntLe,
            "intne" => Kind::IntNe,
            "float" | "floatbe" => Kind::FloatBe,
            "floatle" => Kind::FloatLe,
            "floatne" => Kind::FloatNe,
            "bfloat" => Kind::BFloat,
            "float8_143" => Kind::Float8e143,
            "float8_152" => Kind::Float8e152,
            "ue" => Kind::Ue,
            "se" => Kind::Se,
            "uie" => Kind::Uie,
            "sie" => Kind::Sie,
            "bool" => Kind::Bool,
            "pad" => Kind::Pad,
            "bits" => Kind::Bits,
            _ => return None,
        })
    }

    /// The mini-language keyword for this kind.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Bin => "bin",
            Kind::Hex => "hex",
            Kind::Oct => "oct",
            Kind::Uint => "uint",
            Kind::Int => "int",
            Kind::UintBe => "uintbe",
            Kind::UintLe => "uintle",
            Kind::UintNe => "uintne",
            Kind::IntBe => "intbe",
            Kind::IntLe => "intle",
            Kind::IntNe => "intne",
            Kind::FloatBe => "floatbe",
            Kind::FloatLe => "floatle",
            Kind::FloatNe => "floatne",
            Kind::BFloat => "bfloat",
            Kind::Float8e143 => "float8_143",
            Kind::Float8e152 => "float8_152",
            Kind::Ue => "ue",
            Kind::Se => "se",
            Kind::Uie => "uie",
            Kind::Sie => "sie",
            Kind::Bool => "bool",
            Kind::Pad => "pad",
            Kind::Bits => "bits",
        }
    }

    /// True for the Exp-Golomb kinds, which carry their own length.
    pub fn is_self_delimiting(self) -> bool {
        matches!(self, Kind::Ue | Kind::Se | Kind::Uie | Kind::Sie)
    }

    /// A fixed length implied by the kind itself when none is written.
    pub(crate) fn implicit_len(self) -> Option<usize> {
        match self {
            Kind::Bool => Some(1),
            _ => None,
        }
    }

    /// Checks the kind's length precondition.
    pub fn validate_len(self, len: usize) -> Result<(), InterpretError> {
        let bad = || InterpretError::BadLength {
            kind: self.name(),
            len,
        };
        match self {
            Kind::Bin | Kind::Bits | Kind::Pad => Ok(()),
            Kind::Hex => (len % 4 == 0).then_some(()).ok_or_else(bad),
            Kind::Oct => (len % 3 == 0).then_some(()).ok_or_else(bad),
            Kind::Uint | Kind::Int => {
                if len == 0 {
                    Err(bad())
                } else if len > 128 {
                    Err(InterpretError::TooWide {
                        kind: self.name(),
                        len,
                    })
                } else {
                    Ok(())
                }
            }
            Kind::UintBe | Kind::UintLe | Kind::UintNe | Kind::IntBe | Kind::IntLe
            | Kind::IntNe => {
                if len == 0 || len % 8 != 0 {
                    Err(bad())
                } else if len > 128 {
                    Err(InterpretError::TooWide {
                        kind: self.name(),
                        len,
                    })
                } else {
                    Ok(())
                }
            }
            Kind::FloatBe | Kind::FloatLe | Kind::FloatNe => {
                matches!(len, 16 | 32 | 64).then_some(()).ok_or_else(bad)
            }
            Kind::BFloat => (len == 16).then_some(()).ok_or_else(bad),
            Kind::Float8e143 | Kind::Float8e152 => (len == 8).then_some(()).ok_or_else(bad),
            Kind::Bool => (len == 1).then_some(()).ok_or_else(bad),
            Kind::Ue | Kind::Se | Kind::Uie | Kind::Sie => Err(bad()),
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed value produced by decoding or accepted for encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Uint(u128),
    Int(i128),
    Float(f64),
    Bool(bool),
    /// Digit strings for the `bin`/`hex`/`oct` views, and unparsed literal
    /// values from format specifications.
    Str(String),
    Bits(Bits),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Uint(_) => "an unsigned integer",
            Value::Int(_) => "a signed integer",
            Value::Float(_) => "a float",
            Value::Bool(_) => "a bool",
            Value::Str(_) => "a string",
            Value::Bits(_) => "a bit sequence",
        }
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Uint(v.into())
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::Uint(v.into())
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Uint(v.into())
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint(v.into())
    }
}

impl From<u128> for Value {
    fn from(v: u128) -> Self {
        Value::Uint(v)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Uint(v as u128)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v.into())
    }
}

impl From<i128> for Value {
    fn from(v: i128) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v.into())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Bits> for Value {
    fn from(v: Bits) -> Self {
        Value::Bits(v)
    }
}

// ---- decode ---------------------------------------------------------------

/// Decodes the whole of `s` as `kind`. For the self-delimiting kinds the
/// code must occupy `s` exactly.
pub fn decode(kind: Kind, s: BitSlice<'_>) -> Result<Value, InterpretError> {
    let len = s.len();
    match kind {
        Kind::Bin | Kind::Hex | Kind::Oct => decode_digits(kind, s).map(Value::Str),
        Kind::Uint => decode_uint(s).map(Value::Uint),
        Kind::Int => decode_int(s).map(Value::Int),
        Kind::UintBe | Kind::UintNe if kind_is_big(kind) => {
            kind.validate_len(len)?;
            Ok(Value::Uint(s.read_uint(0, len)))
        }
        Kind::UintBe | Kind::UintLe | Kind::UintNe => {
            kind.validate_len(len)?;
            Ok(Value::Uint(le_uint(s)))
        }
        Kind::IntBe | Kind::IntNe if kind_is_big(kind) => {
            kind.validate_len(len)?;
            Ok(Value::Int(raw::sign_extend(s.read_uint(0, len), len)))
        }
        Kind::IntBe | Kind::IntLe | Kind::IntNe => {
            kind.validate_len(len)?;
            Ok(Value::Int(raw::sign_extend(le_uint(s), len)))
        }
        Kind::FloatBe | Kind::FloatLe | Kind::FloatNe => {
            kind.validate_len(len)?;
            let bits = if kind_is_big(kind) {
                s.read_uint(0, len)
            } else {
                le_uint(s)
            };
            Ok(Value::Float(match len {
                16 => float::decode_f16(bits as u16),
                32 => f64::from(f32::from_bits(bits as u32)),
                _ => f64::from_bits(bits as u64),
            }))
        }
        Kind::BFloat => {
            kind.validate_len(len)?;
            Ok(Value::Float(float::decode_bf16(s.read_uint(0, 16) as u16)))
        }
        Kind::Float8e143 => {
            kind.validate_len(len)?;
            Ok(Value::Float(float::F8_143.decode(s.read_uint(0, 8) as u8)))
        }
        Kind::Float8e152 => {
            kind.validate_len(len)?;
            Ok(Value::Float(float::F8_152.decode(s.read_uint(0, 8) as u8)))
        }
        Kind::Ue | Kind::Se | Kind::Uie | Kind::Sie => {
            let (value, consumed) = decode_code(kind, s, 0).ok_or(InterpretError::BadLength {
                kind: kind.name(),
                len,
            })?;
            if consumed != len {
                return Err(InterpretError::BadLength {
                    kind: kind.name(),
                    len,
                });
            }
            Ok(value)
        }
        Kind::Bool => {
            kind.validate_len(len)?;
            Ok(Value::Bool(s.bit(0)))
        }
        Kind::Pad => Err(InterpretError::WriteOnly("pad")),
        Kind::Bits => Ok(Value::Bits(Bits::from_raw(s.to_byte_vec(), len))),
    }
}

/// Decodes one self-delimiting code at `pos`, reporting bits consumed.
/// `None` when the input ends mid-code.
pub(crate) fn decode_code(kind: Kind, s: BitSlice<'_>, pos: usize) -> Option<(Value, usize)> {
    match kind {
        Kind::Ue => golomb::read_ue(s, pos).map(|(v, n)| (Value::Uint(v.into()), n)),
        Kind::Se => golomb::read_se(s, pos).map(|(v, n)| (Value::Int(v.into()), n)),
        Kind::Uie => golomb::read_uie(s, pos).map(|(v, n)| (Value::Uint(v.into()), n)),
        Kind::Sie => golomb::read_sie(s, pos).map(|(v, n)| (Value::Int(v.into()), n)),
        _ => unreachable!("not a self-delimiting kind"),
    }
}

/// Unsigned big-endian integer over the whole slice, 1 to 128 bits.
pub fn decode_uint(s: BitSlice<'_>) -> Result<u128, InterpretError> {
    Kind::Uint.validate_len(s.len())?;
    Ok(s.read_uint(0, s.len()))
}

/// Two's-complement signed integer over the whole slice, 1 to 128 bits.
pub fn decode_int(s: BitSlice<'_>) -> Result<i128, InterpretError> {
    Kind::Int.validate_len(s.len())?;
    Ok(raw::sign_extend(s.read_uint(0, s.len()), s.len()))
}

/// Digit-string view for `bin`, `hex` or `oct`.
pub fn decode_digits(kind: Kind, s: BitSlice<'_>) -> Result<String, InterpretError> {
    kind.validate_len(s.len())?;
    let per = digit_width(kind);
    let mut out = String::with_capacity(s.len() / per);
    for i in (0..s.len()).step_by(per) {
        let digit = s.read_uint(i, per) as u32;
        out.push(char::from_digit(digit, 1 << per).unwrap());
    }
    Ok(out)
}

// ---- encode ---------------------------------------------------------------

/// Encodes `value` as `kind` into a fresh sequence. `len` is required for
/// the kinds without an intrinsic width; when given it must satisfy the
/// kind's precondition and hold the value exactly.
pub fn encode(kind: Kind, value: &Value, len: Option<usize>) -> Result<BitsMut, InterpretError> {
    match kind {
        Kind::Bin | Kind::Hex | Kind::Oct => {
            let digits = digit_text(kind, value)?;
            let per = digit_width(kind);
            if let Some(l) = len {
                kind.validate_len(l)?;
                if l != digits.len() * per {
                    return Err(InterpretError::DoesNotFit {
                        kind: kind.name(),
                        value: digits,
                        len: l,
                    });
                }
            }
            let mut out = BitsMut::with_capacity(digits.len() * per);
            for c in digits.chars() {
                let digit = c.to_digit(1 << per as u32).ok_or(InterpretError::BadValue {
                    kind: kind.name(),
                    got: "a string with non-digit characters",
                })?;
                out.push_uint(per, digit.into());
            }
            Ok(out)
        }
        Kind::Uint | Kind::UintBe | Kind::UintLe | Kind::UintNe => {
            let len = len.ok_or(InterpretError::NeedsLength(kind.name()))?;
            kind.validate_len(len)?;
            let v = value_as_u128(kind, value)?;
            if len < 128 && v >> len != 0 {
                return Err(InterpretError::DoesNotFit {
                    kind: kind.name(),
                    value: v.to_string(),
                    len,
                });
            }
            let mut out = BitsMut::new();
            out.push_uint(len, v);
            Ok(reorder(kind, out))
        }
        Kind::Int | Kind::IntBe | Kind::IntLe | Kind::IntNe => {
            let len = len.ok_or(InterpretError::NeedsLength(kind.name()))?;
            kind.validate_len(len)?;
            let v = value_as_i128(kind, value)?;
            let fits = if len == 128 {
                true
            } else {
                v >= -(1i128 << (len - 1)) && v < (1i128 << (len - 1))
            };
            if !fits {
                return Err(InterpretError::DoesNotFit {
                    kind: kind.name(),
                    value: v.to_string(),
                    len,
                });
            }
            let mut out = BitsMut::new();
            out.push_uint(len, v as u128);
            Ok(reorder(kind, out))
        }
        Kind::FloatBe | Kind::FloatLe | Kind::FloatNe => {
            let len = len.ok_or(InterpretError::NeedsLength(kind.name()))?;
            kind.validate_len(len)?;
            let v = value_as_f64(kind, value)?;
            let bits: u128 = match len {
                16 => float::encode_f16(v).into(),
                32 => (v as f32).to_bits().into(),
                _ => v.to_bits().into(),
            };
            let mut out = BitsMut::new();
            out.push_uint(len, bits);
            Ok(reorder(kind, out))
        }
        Kind::BFloat => {
            if let Some(l) = len {
                kind.validate_len(l)?;
            }
            let v = value_as_f64(kind, value)?;
            let mut out = BitsMut::new();
            out.push_uint(16, float::encode_bf16(v).into());
            Ok(out)
        }
        Kind::Float8e143 | Kind::Float8e152 => {
            if let Some(l) = len {
                kind.validate_len(l)?;
            }
            let v = value_as_f64(kind, value)?;
            let fmt = if kind == Kind::Float8e143 {
                float::F8_143
            } else {
                float::F8_152
            };
            let mut out = BitsMut::new();
            out.push_uint(8, fmt.encode(v).into());
            Ok(out)
        }
        Kind::Ue | Kind::Uie => {
            if let Some(l) = len {
                kind.validate_len(l)?;
            }
            let v = value_as_u128(kind, value)?;
            let v = u64::try_from(v).map_err(|_| InterpretError::DoesNotFit {
                kind: kind.name(),
                value: v.to_string(),
                len: 64,
            })?;
            let mut out = BitsMut::new();
            if kind == Kind::Ue {
                golomb::append_ue(&mut out, v);
            } else {
                golomb::append_uie(&mut out, v);
            }
            Ok(out)
        }
        Kind::Se | Kind::Sie => {
            if let Some(l) = len {
                kind.validate_len(l)?;
            }
            let v = value_as_i128(kind, value)?;
            let v = i64::try_from(v)
                .ok()
                .filter(|&v| v != i64::MIN)
                .ok_or(InterpretError::DoesNotFit {
                    kind: kind.name(),
                    value: v.to_string(),
                    len: 64,
                })?;
            let mut out = BitsMut::new();
            if kind == Kind::Se {
                golomb::append_se(&mut out, v);
            } else {
                golomb::append_sie(&mut out, v);
            }
            Ok(out)
        }
        Kind::Bool => {
            if let Some(l) = len {
                kind.validate_len(l)?;
            }
            let v = value_as_bool(value)?;
            let mut out = BitsMut::new();
            out.push(v);
            Ok(out)
        }
        Kind::Pad => {
            let len = len.ok_or(InterpretError::NeedsLength("pad"))?;
            Ok(BitsMut::zeros(len))
        }
        Kind::Bits => {
            let bits = match value {
                Value::Bits(b) => b.clone(),
                Value::Str(s) => {
                    crate::literal::parse(s).map_err(|_| InterpretError::BadValue {
                        kind: "bits",
                        got: "a string that is not a bit literal",
                    })?
                }
                other => {
                    return Err(InterpretError::BadValue {
                        kind: "bits",
                        got: other.type_name(),
                    });
                }
            };
            if let Some(l) = len {
                if l != bits.len() {
                    return Err(InterpretError::DoesNotFit {
                        kind: "bits",
                        value: bits.to_string(),
                        len: l,
                    });
                }
            }
            Ok(bits.to_mut())
        }
    }
}

// ---- helpers --------------------------------------------------------------

fn kind_is_big(kind: Kind) -> bool {
    match kind {
        Kind::UintBe | Kind::IntBe | Kind::FloatBe => true,
        Kind::UintLe | Kind::IntLe | Kind::FloatLe => false,
        Kind::UintNe | Kind::IntNe | Kind::FloatNe => NATIVE_ENDIAN == Endianness::Big,
        _ => true,
    }
}

/// Big-endian read of the byte-reversed buffer.
fn le_uint(s: BitSlice<'_>) -> u128 {
    let mut bytes = s.to_byte_vec();
    bytes.reverse();
    raw::read_uint(&bytes, 0, s.len())
}

/// Byte-reverses freshly encoded big-endian content for the `le` kinds.
fn reorder(kind: Kind, out: BitsMut) -> BitsMut {
    if kind_is_big(kind) {
        out
    } else {
        let len = out.len();
        let mut bytes = out.to_bytes_padded();
        bytes.reverse();
        BitsMut::from_raw(bytes, len)
    }
}

fn digit_width(kind: Kind) -> usize {
    match kind {
        Kind::Bin => 1,
        Kind::Oct => 3,
        Kind::Hex => 4,
        _ => unreachable!("not a digit kind"),
    }
}

fn digit_text(kind: Kind, value: &Value) -> Result<String, InterpretError> {
    match value {
        Value::Str(s) => {
            let s = s.trim();
            let stripped = match kind {
                Kind::Hex => s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")),
                Kind::Oct => s.strip_prefix("0o"),
                Kind::Bin => s.strip_prefix("0b"),
                _ => None,
            }
            .unwrap_or(s);
            Ok(stripped.replace('_', "").to_lowercase())
        }
        other => Err(InterpretError::BadValue {
            kind: kind.name(),
            got: other.type_name(),
        }),
    }
}

fn value_as_u128(kind: Kind, value: &Value) -> Result<u128, InterpretError> {
    match value {
        Value::Uint(v) => Ok(*v),
        Value::Int(v) if *v >= 0 => Ok(*v as u128),
        Value::Str(s) => parse_int_text(s.trim())
            .and_then(|v| u128::try_from(v).ok())
            .ok_or(InterpretError::BadValue {
                kind: kind.name(),
                got: "an unparsable string",
            }),
        other => Err(InterpretError::BadValue {
            kind: kind.name(),
            got: other.type_name(),
        }),
    }
}

fn value_as_i128(kind: Kind, value: &Value) -> Result<i128, InterpretError> {
    match value {
        Value::Int(v) => Ok(*v),
        Value::Uint(v) => i128::try_from(*v).map_err(|_| InterpretError::DoesNotFit {
            kind: kind.name(),
            value: v.to_string(),
            len: 128,
        }),
        Value::Str(s) => parse_int_text(s.trim()).ok_or(InterpretError::BadValue {
            kind: kind.name(),
            got: "an unparsable string",
        }),
        other => Err(InterpretError::BadValue {
            kind: kind.name(),
            got: other.type_name(),
        }),
    }
}

fn value_as_f64(kind: Kind, value: &Value) -> Result<f64, InterpretError> {
    match value {
        Value::Float(v) => Ok(*v),
        Value::Uint(v) => Ok(*v as f64),
        Value::Int(v) => Ok(*v as f64),
        Value::Str(s) => s.trim().parse().map_err(|_| InterpretError::BadValue {
            kind: kind.name(),
            got: "an unparsable string",
        }),
        other => Err(InterpretError::BadValue {
            kind: kind.name(),
            got: other.type_name(),
        }),
    }
}

fn value_as_bool(value: &Value) -> Result<bool, InterpretError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Uint(0) | Value::Int(0) => Ok(false),
        Value::Uint(1) | Value::Int(1) => Ok(true),
        Value::Str(s) => match s.trim() {
            "true" | "True" | "1" => Ok(true),
            "false" | "False" | "0" => Ok(false),
            _ => Err(InterpretError::BadValue {
                kind: "bool",
                got: "an unparsable string",
            }),
        },
        other => Err(InterpretError::BadValue {
            kind: "bool",
            got: other.type_name(),
        }),
    }
}

/// Parses decimal or prefixed (`0x`/`0o`/`0b`) integer text with an
/// optional sign.
fn parse_int_text(s: &str) -> Option<i128> {
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let magnitude = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        i128::from_str_radix(&hex.replace('_', ""), 16).ok()?
    } else if let Some(oct) = body.strip_prefix("0o") {
        i128::from_str_radix(&oct.replace('_', ""), 8).ok()?
    } else if let Some(bin) = body.strip_prefix("0b") {
        i128::from_str_radix(&bin.replace('_', ""), 2).ok()?
    } else {
        body.replace('_', "").parse().ok()?
    };
    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slice::AsBits;

    fn bits(spec: &str) -> Bits {
        Bits::from_spec(spec).unwrap()
    }

    #[test]
    fn test_uint_int_round_trip() {
        for (value, len) in [(0u128, 1), (1, 1), (352, 12), (u64::MAX as u128, 64)] {
            let encoded = encode(Kind::Uint, &Value::Uint(value), Some(len)).unwrap();
            assert_eq!(decode_uint(encoded.as_bitslice()).unwrap(), value);
        }
        for (value, len) in [(0i128, 1), (-1, 4), (-128, 8), (127, 8)] {
            let encoded = encode(Kind::Int, &Value::Int(value), Some(len)).unwrap();
            assert_eq!(decode_int(encoded.as_bitslice()).unwrap(), value);
        }
    }

    #[test]
    fn test_uint_needs_length_and_fit() {
        assert_eq!(
            encode(Kind::Uint, &Value::Uint(1), None).unwrap_err(),
            InterpretError::NeedsLength("uint")
        );
        assert!(matches!(
            encode(Kind::Uint, &Value::Uint(16), Some(4)).unwrap_err(),
            InterpretError::DoesNotFit { .. }
        ));
        assert!(matches!(
            decode_uint(Bits::new().as_bitslice()).unwrap_err(),
            InterpretError::BadLength { .. }
        ));
    }

    #[test]
    fn test_endian_kinds() {
        let b = bits("0x0102");
        assert_eq!(b.interpret(Kind::UintBe).unwrap(), Value::Uint(0x0102));
        assert_eq!(b.interpret(Kind::UintLe).unwrap(), Value::Uint(0x0201));
        let ne = b.interpret(Kind::UintNe).unwrap();
        if NATIVE_ENDIAN == Endianness::Little {
            assert_eq!(ne, Value::Uint(0x0201));
        } else {
            assert_eq!(ne, Value::Uint(0x0102));
        }

        let neg = bits("0xff01");
        assert_eq!(
            neg.interpret(Kind::IntBe).unwrap(),
            Value::Int(i128::from(i16::from_be_bytes([0xFF, 0x01])))
        );
        assert_eq!(
            neg.interpret(Kind::IntLe).unwrap(),
            Value::Int(i128::from(i16::from_le_bytes([0xFF, 0x01])))
        );

        // Non-multiple-of-8 lengths are rejected.
        assert!(bits("0b1010").interpret(Kind::UintLe).is_err());
    }

    #[test]
    fn test_endian_encode_round_trip() {
        for kind in [Kind::UintBe, Kind::UintLe, Kind::IntBe, Kind::IntLe] {
            let value = if matches!(kind, Kind::IntBe | Kind::IntLe) {
                Value::Int(-1234)
            } else {
                Value::Uint(0xABCD)
            };
            let encoded = encode(kind, &value, Some(16)).unwrap();
            assert_eq!(decode(kind, encoded.as_bitslice()).unwrap(), value);
        }
    }

    #[test]
    fn test_float_kinds() {
        let one = encode(Kind::FloatBe, &Value::Float(1.0), Some(32)).unwrap();
        assert_eq!(one.to_bytes().unwrap(), vec![0x3F, 0x80, 0x00, 0x00]);
        assert_eq!(
            decode(Kind::FloatBe, one.as_bitslice()).unwrap(),
            Value::Float(1.0)
        );

        let one_le = encode(Kind::FloatLe, &Value::Float(1.0), Some(32)).unwrap();
        assert_eq!(one_le.to_bytes().unwrap(), vec![0x00, 0x00, 0x80, 0x3F]);
        assert_eq!(
            decode(Kind::FloatLe, one_le.as_bitslice()).unwrap(),
            Value::Float(1.0)
        );

        for len in [16, 32, 64] {
            let encoded = encode(Kind::FloatBe, &Value::Float(-0.5), Some(len)).unwrap();
            assert_eq!(
                decode(Kind::FloatBe, encoded.as_bitslice()).unwrap(),
                Value::Float(-0.5)
            );
        }

        assert!(encode(Kind::FloatBe, &Value::Float(1.0), Some(24)).is_err());
        assert!(encode(Kind::FloatBe, &Value::Float(1.0), None).is_err());
    }

    #[test]
    fn test_bfloat_scenario_f() {
        let encoded = encode(Kind::BFloat, &Value::Float(4.5e23), None).unwrap();
        assert_eq!(encoded.to_bytes().unwrap(), vec![0x66, 0xBE]);
        let Value::Float(back) = decode(Kind::BFloat, encoded.as_bitslice()).unwrap() else {
            panic!("bfloat decodes to a float");
        };
        assert!((back - 4.5e23).abs() / 4.5e23 < 0.01);
    }

    #[test]
    fn test_float8_kinds() {
        for kind in [Kind::Float8e143, Kind::Float8e152] {
            let encoded = encode(kind, &Value::Float(1.5), None).unwrap();
            assert_eq!(encoded.len(), 8);
            assert_eq!(decode(kind, encoded.as_bitslice()).unwrap(), Value::Float(1.5));
            assert!(bits("0x0102").interpret(kind).is_err());
        }
    }

    #[test]
    fn test_golomb_exact_fit_decode() {
        let code = encode(Kind::Ue, &Value::Uint(3), None).unwrap();
        assert_eq!(
            decode(Kind::Ue, code.as_bitslice()).unwrap(),
            Value::Uint(3)
        );
        // Trailing bits make the exact-fit decode fail.
        let mut longer = code.clone();
        longer.push(false);
        assert!(decode(Kind::Ue, longer.as_bitslice()).is_err());
    }

    #[test]
    fn test_digits_round_trip() {
        let b = bits("0x4f8e220");
        assert_eq!(b.hex().unwrap(), "4f8e220");
        let re = encode(Kind::Hex, &Value::Str("4f8e220".into()), None).unwrap();
        assert_eq!(re, b);

        assert_eq!(bits("0o755").oct().unwrap(), "755");
        assert_eq!(bits("0b0110").bin(), "0110");

        // A 7-bit sequence has no hex view.
        let seven = Bits::zeros(7);
        assert!(seven.hex().is_err());
        assert!(seven.slice(0..6).unwrap().oct().is_ok());
    }

    #[test]
    fn test_digit_encode_length_check() {
        assert!(encode(Kind::Hex, &Value::Str("ff".into()), Some(8)).is_ok());
        assert!(encode(Kind::Hex, &Value::Str("ff".into()), Some(12)).is_err());
        assert!(encode(Kind::Hex, &Value::Str("zz".into()), None).is_err());
    }

    #[test]
    fn test_bool_and_pad() {
        assert_eq!(
            decode(Kind::Bool, bits("0b1").as_bitslice()).unwrap(),
            Value::Bool(true)
        );
        assert!(decode(Kind::Bool, bits("0b10").as_bitslice()).is_err());
        assert_eq!(encode(Kind::Pad, &Value::Uint(0), Some(6)).unwrap().len(), 6);
        assert!(decode(Kind::Pad, bits("0b000000").as_bitslice()).is_err());
    }

    #[test]
    fn test_str_coercions() {
        let encoded = encode(Kind::Uint, &Value::Str("352".into()), Some(12)).unwrap();
        assert_eq!(decode_uint(encoded.as_bitslice()).unwrap(), 352);

        let encoded = encode(Kind::Int, &Value::Str("-5".into()), Some(8)).unwrap();
        assert_eq!(decode_int(encoded.as_bitslice()).unwrap(), -5);

        let encoded = encode(Kind::Uint, &Value::Str("0x1b3".into()), Some(12)).unwrap();
        assert_eq!(decode_uint(encoded.as_bitslice()).unwrap(), 0x1B3);
    }

    #[test]
    fn test_native_endian_is_constant() {
        assert_eq!(Endianness::Native.resolve(), NATIVE_ENDIAN);
        assert_ne!(NATIVE_ENDIAN, Endianness::Native);
    }
}
