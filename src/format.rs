//! The format mini-language: compile token specifications, bind names,
//! then pack values or unpack bit ranges.
//!
//! Compilation is two-phase. [`Format::parse`] turns text like
//! `"uint:12, hex8, 3*(bool, pad:1), bin"` into tokens that may still
//! carry named lengths/values; [`Format::bind`] resolves every name
//! against a caller map and yields an executable [`Program`]. Parse errors
//! and unresolved names are distinct failures.

use std::collections::HashMap;

use crate::bits::Bits;
use crate::bits_mut::BitsMut;
use crate::codec::{self, Endianness, Kind, Value};
use crate::errors::{BindError, CompileError, PackError, ReadError};
use crate::literal;
use crate::slice::BitSlice;

/// A token length as written: fixed, named (resolved at bind time), the
/// single permitted consume-remainder form, or self-delimiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LenSpec {
    Fixed(usize),
    Named(String),
    Remainder,
    Dynamic,
}

/// A bound value as written: literal text, a name, or an already-built
/// constant (literal terms).
#[derive(Debug, Clone, PartialEq)]
pub enum ValueSpec {
    Text(String),
    Named(String),
    Const(Value),
}

/// One parsed token: an interpretation kind, its length form, and an
/// optional bound value for packing.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatToken {
    pub kind: Kind,
    pub len: LenSpec,
    pub value: Option<ValueSpec>,
}

/// A parsed format: flattened tokens, possibly with unresolved names.
#[derive(Debug, Clone, PartialEq)]
pub struct Format {
    tokens: Vec<FormatToken>,
}

/// A bound token: every length is concrete except the one remainder.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundToken {
    pub kind: Kind,
    pub len: BoundLen,
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundLen {
    Fixed(usize),
    Remainder,
    Dynamic,
}

/// An executable program: bound tokens in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    tokens: Vec<BoundToken>,
}

impl Format {
    /// Parses a format specification. Repeat factors and groups are
    /// flattened here; at most one token may consume the remainder.
    pub fn parse(spec: &str) -> Result<Format, CompileError> {
        let tokens = parse_sequence(spec)?;
        Self::from_tokens(tokens)
    }

    /// Builds a format from already-constructed tokens, enforcing the
    /// single-remainder rule.
    pub(crate) fn from_tokens(tokens: Vec<FormatToken>) -> Result<Format, CompileError> {
        let remainders = tokens
            .iter()
            .filter(|t| t.len == LenSpec::Remainder)
            .count();
        if remainders > 1 {
            return Err(CompileError::MultipleRemainder);
        }
        Ok(Format { tokens })
    }

    /// The parsed tokens in order.
    pub fn tokens(&self) -> &[FormatToken] {
        &self.tokens
    }

    /// Resolves every named length and value against `names`.
    pub fn bind(&self, names: &HashMap<String, Value>) -> Result<Program, BindError> {
        let mut tokens = Vec::with_capacity(self.tokens.len());
        for token in &self.tokens {
            let len = match &token.len {
                LenSpec::Fixed(n) => BoundLen::Fixed(*n),
                LenSpec::Remainder => BoundLen::Remainder,
                LenSpec::Dynamic => BoundLen::Dynamic,
                LenSpec::Named(name) => {
                    let value = names
                        .get(name)
                        .ok_or_else(|| BindError::Unresolved(name.clone()))?;
                    let bits = match value {
                        Value::Uint(v) => usize::try_from(*v).ok(),
                        Value::Int(v) => usize::try_from(*v).ok(),
                        _ => None,
                    }
                    .ok_or_else(|| BindError::BadLengthValue(name.clone()))?;
                    BoundLen::Fixed(bits)
                }
            };
            let value = match &token.value {
                None => None,
                Some(ValueSpec::Const(v)) => Some(v.clone()),
                Some(ValueSpec::Text(text)) => Some(Value::Str(text.clone())),
                Some(ValueSpec::Named(name)) => Some(
                    names
                        .get(name)
                        .cloned()
                        .ok_or_else(|| BindError::Unresolved(name.clone()))?,
                ),
            };
            tokens.push(BoundToken {
                kind: token.kind,
                len,
                value,
            });
        }
        Ok(Program { tokens })
    }
}

impl Program {
    /// Compiles and binds in one step for formats without names.
    pub fn from_spec(spec: &str) -> Result<Program, ReadError> {
        Ok(Format::parse(spec)?.bind(&HashMap::new())?)
    }

    /// The bound tokens in order.
    pub fn tokens(&self) -> &[BoundToken] {
        &self.tokens
    }

    /// Total bit length when every token is fixed-width.
    pub fn bit_len(&self) -> Option<usize> {
        self.tokens.iter().try_fold(0usize, |acc, t| match t.len {
            BoundLen::Fixed(n) => Some(acc + n),
            _ => None,
        })
    }

    /// How many caller values [`pack`](Program::pack) consumes: one per
    /// token without a bound value, padding excluded.
    pub fn values_expected(&self) -> usize {
        self.tokens
            .iter()
            .filter(|t| t.value.is_none() && t.kind != Kind::Pad)
            .count()
    }

    /// Packs caller values (plus any bound values) into a fresh sequence.
    pub fn pack(&self, values: &[Value]) -> Result<BitsMut, PackError> {
        let expected = self.values_expected();
        if values.len() != expected {
            return Err(PackError::ValueCount {
                expected,
                got: values.len(),
            });
        }

        let mut out = BitsMut::new();
        let mut next_value = values.iter();
        for token in &self.tokens {
            let len = match token.len {
                BoundLen::Fixed(n) => Some(n),
                BoundLen::Remainder | BoundLen::Dynamic => None,
            };
            let encoded = match (&token.value, token.kind) {
                (Some(value), _) => codec::encode(token.kind, value, len)?,
                (None, Kind::Pad) => {
                    codec::encode(Kind::Pad, &Value::Uint(0), len)?
                }
                (None, _) => {
                    let value = next_value.next().expect("counted above");
                    codec::encode(token.kind, value, len)?
                }
            };
            out.append(&encoded);
        }
        Ok(out)
    }

    /// Decodes tokens from `s` starting at `pos`. Returns the values and
    /// the final position. Padding is consumed but yields no value; the
    /// remainder token takes what is left minus the fixed widths after it.
    pub(crate) fn execute(
        &self,
        s: BitSlice<'_>,
        start: usize,
    ) -> Result<(Vec<Value>, usize), ReadError> {
        let mut pos = start;
        let mut values = Vec::new();

        for (index, token) in self.tokens.iter().enumerate() {
            let width = match token.len {
                BoundLen::Fixed(n) => n,
                BoundLen::Remainder => {
                    let trailing = self.trailing_fixed_width(index + 1)?;
                    let available = s.len() - pos;
                    if trailing > available {
                        return Err(ReadError::Exhausted {
                            requested: trailing,
                            available,
                        });
                    }
                    available - trailing
                }
                BoundLen::Dynamic => {
                    let available = s.len() - pos;
                    let (value, consumed) = codec::decode_code(token.kind, s, pos).ok_or(
                        ReadError::Exhausted {
                            requested: available + 1,
                            available,
                        },
                    )?;
                    values.push(value);
                    pos += consumed;
                    continue;
                }
            };

            if pos + width > s.len() {
                return Err(ReadError::Exhausted {
                    requested: width,
                    available: s.len() - pos,
                });
            }
            if token.kind != Kind::Pad {
                values.push(codec::decode(token.kind, s.sub(pos, width))?);
            }
            pos += width;
        }

        Ok((values, pos))
    }

    /// Sum of the fixed widths of tokens from `from` on. A self-delimiting
    /// token there cannot be sized against the remainder.
    fn trailing_fixed_width(&self, from: usize) -> Result<usize, ReadError> {
        self.tokens[from..]
            .iter()
            .try_fold(0usize, |acc, t| match t.len {
                BoundLen::Fixed(n) => Ok(acc + n),
                _ => Err(ReadError::Compile(CompileError::BadToken(format!(
                    "`{}` after the remainder token",
                    t.kind.name()
                )))),
            })
    }
}

/// Packs `values` according to `spec` in one call.
pub fn pack(spec: &str, values: &[Value]) -> Result<Bits, PackError> {
    Ok(Format::parse(spec)?
        .bind(&HashMap::new())?
        .pack(values)?
        .freeze())
}

/// Packs with named lengths/values resolved from `names`.
pub fn pack_with(
    spec: &str,
    values: &[Value],
    names: &HashMap<String, Value>,
) -> Result<Bits, PackError> {
    Ok(Format::parse(spec)?.bind(names)?.pack(values)?.freeze())
}

// ---- parsing --------------------------------------------------------------

fn parse_sequence(spec: &str) -> Result<Vec<FormatToken>, CompileError> {
    let mut tokens = Vec::new();
    for term in split_terms(spec)? {
        parse_term(term, &mut tokens)?;
    }
    Ok(tokens)
}

/// Splits on top-level commas, honouring parentheses.
fn split_terms(spec: &str) -> Result<Vec<&str>, CompileError> {
    let mut terms = Vec::new();
    let mut depth = 0usize;
    let mut term_start = 0;
    for (i, c) in spec.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1).ok_or(CompileError::UnbalancedGroup)?,
            ',' if depth == 0 => {
                terms.push(&spec[term_start..i]);
                term_start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(CompileError::UnbalancedGroup);
    }
    terms.push(&spec[term_start..]);
    if terms.len() == 1 && terms[0].trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(terms)
}

fn parse_term(term: &str, out: &mut Vec<FormatToken>) -> Result<(), CompileError> {
    let term = term.trim();
    if term.is_empty() {
        return Err(CompileError::BadToken(term.to_string()));
    }

    // Leading repeat factor: `N*...`, applied recursively through groups.
    let (factor, rest) = split_factor(term)?;

    if let Some(inner) = rest.strip_prefix('(') {
        let inner = inner
            .strip_suffix(')')
            .ok_or(CompileError::UnbalancedGroup)?;
        let group = parse_sequence(inner)?;
        for _ in 0..factor {
            out.extend(group.iter().cloned());
        }
        return Ok(());
    }

    let parsed = parse_single(rest)?;
    for _ in 0..factor {
        out.extend(parsed.iter().cloned());
    }
    Ok(())
}

fn split_factor(term: &str) -> Result<(usize, &str), CompileError> {
    let Some(star) = find_top_level_star(term) else {
        return Ok((1, term));
    };
    let head = term[..star].trim();
    if head.is_empty() || !head.chars().all(|c| c.is_ascii_digit()) {
        // Not a repeat factor; leave the term untouched.
        return Ok((1, term));
    }
    let factor: usize = head
        .parse()
        .map_err(|_| CompileError::BadFactor(head.to_string()))?;
    if factor == 0 {
        return Err(CompileError::BadFactor(head.to_string()));
    }
    Ok((factor, term[star + 1..].trim_start()))
}

fn find_top_level_star(term: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in term.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '*' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Parses one non-group term into tokens (struct-style terms expand to
/// several).
fn parse_single(term: &str) -> Result<Vec<FormatToken>, CompileError> {
    if literal::looks_like_literal(term) {
        let bits = literal::parse(term)?;
        return Ok(vec![FormatToken {
            kind: Kind::Bits,
            len: LenSpec::Fixed(bits.len()),
            value: Some(ValueSpec::Const(Value::Bits(bits))),
        }]);
    }
    if term.starts_with(['>', '<', '@', '=', '!']) {
        return parse_struct_term(term);
    }
    Ok(vec![parse_kind_token(term)?])
}

fn parse_kind_token(term: &str) -> Result<FormatToken, CompileError> {
    let bad = || CompileError::BadToken(term.to_string());

    let (head, value_text) = match term.split_once('=') {
        Some((head, value)) => (head.trim_end(), Some(value.trim())),
        None => (term, None),
    };

    let (kind_text, len_text) = match head.split_once(':') {
        Some((kind, len)) => (kind.trim(), Some(len.trim())),
        None => (head.trim(), None),
    };

    let (kind, len) = match (Kind::from_name(kind_text), len_text) {
        (Some(kind), Some(len)) => (kind, Some(len.to_string())),
        (Some(kind), None) => (kind, None),
        (None, Some(_)) => return Err(CompileError::UnknownKind(kind_text.to_string())),
        (None, None) => {
            // `uint12` style: a kind name with the length appended.
            if !kind_text.is_ascii() {
                return Err(CompileError::UnknownKind(kind_text.to_string()));
            }
            let digits_at = kind_text
                .rfind(|c: char| !c.is_ascii_digit())
                .map(|i| i + 1)
                .unwrap_or(0);
            let (name, digits) = kind_text.split_at(digits_at);
            let kind =
                Kind::from_name(name).ok_or_else(|| CompileError::UnknownKind(name.to_string()))?;
            if digits.is_empty() {
                (kind, None)
            } else {
                (kind, Some(digits.to_string()))
            }
        }
    };

    let len = match len {
        None => match kind.implicit_len() {
            Some(n) => LenSpec::Fixed(n),
            None if kind.is_self_delimiting() => LenSpec::Dynamic,
            None => LenSpec::Remainder,
        },
        Some(text) if text.is_empty() => return Err(bad()),
        Some(text) if text.chars().all(|c| c.is_ascii_digit()) => {
            let bits: usize = text.parse().map_err(|_| bad())?;
            kind.validate_len(bits).map_err(|_| bad())?;
            LenSpec::Fixed(bits)
        }
        Some(text) if is_name(&text) => {
            if kind.is_self_delimiting() {
                return Err(bad());
            }
            LenSpec::Named(text)
        }
        Some(_) => return Err(bad()),
    };

    let value = match value_text {
        None => None,
        Some("") => return Err(bad()),
        Some(text) if is_name(text) && !is_bool_text(text) => {
            Some(ValueSpec::Named(text.to_string()))
        }
        Some(text) => Some(ValueSpec::Text(text.to_string())),
    };

    Ok(FormatToken { kind, len, value })
}

pub(crate) fn is_name(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(crate) fn is_bool_text(text: &str) -> bool {
    matches!(text, "true" | "false" | "True" | "False")
}

/// Expands a compact struct-style term: a mandatory endianness character,
/// then repeat-count/type-character pairs. The endianness applies to every
/// following type character until changed.
fn parse_struct_term(term: &str) -> Result<Vec<FormatToken>, CompileError> {
    let mut endian = Endianness::Big;
    let mut tokens = Vec::new();
    let mut count = 0usize;
    let mut have_count = false;

    for c in term.chars() {
        match c {
            '>' | '!' => endian = Endianness::Big,
            '<' => endian = Endianness::Little,
            '@' | '=' => endian = Endianness::Native,
            '0'..='9' => {
                count = count * 10 + (c as usize - '0' as usize);
                have_count = true;
                continue;
            }
            c if c.is_whitespace() => continue,
            c => {
                let (kind, bits) = struct_char_kind(c, endian)?;
                let repeat = if have_count { count } else { 1 };
                if have_count && count == 0 {
                    return Err(CompileError::BadFactor(term.to_string()));
                }
                for _ in 0..repeat {
                    tokens.push(FormatToken {
                        kind,
                        len: LenSpec::Fixed(bits),
                        value: None,
                    });
                }
                count = 0;
                have_count = false;
                continue;
            }
        }
        if have_count {
            return Err(CompileError::BadToken(term.to_string()));
        }
    }
    if have_count {
        return Err(CompileError::BadToken(term.to_string()));
    }
    Ok(tokens)
}

fn struct_char_kind(c: char, endian: Endianness) -> Result<(Kind, usize), CompileError> {
    let int_kind = |signed: bool| match (endian, signed) {
        (Endianness::Big, false) => Kind::UintBe,
        (Endianness::Big, true) => Kind::IntBe,
        (Endianness::Little, false) => Kind::UintLe,
        (Endianness::Little, true) => Kind::IntLe,
        (Endianness::Native, false) => Kind::UintNe,
        (Endianness::Native, true) => Kind::IntNe,
    };
    let float_kind = || match endian {
        Endianness::Big => Kind::FloatBe,
        Endianness::Little => Kind::FloatLe,
        Endianness::Native => Kind::FloatNe,
    };
    Ok(match c {
        'b' => (Kind::Int, 8),
        'B' => (Kind::Uint, 8),
        'h' => (int_kind(true), 16),
        'H' => (int_kind(false), 16),
        'l' => (int_kind(true), 32),
        'L' => (int_kind(false), 32),
        'q' => (int_kind(true), 64),
        'Q' => (int_kind(false), 64),
        'e' => (float_kind(), 16),
        'f' => (float_kind(), 32),
        'd' => (float_kind(), 64),
        other => return Err(CompileError::BadStructChar(other)),
    })
}
