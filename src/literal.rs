//! Bit-literal parsing: `0x…`, `0o…`, `0b…` and the `hex=`/`oct=`/`bin=`
//! keyword forms.

use crate::bits::Bits;
use crate::bits_mut::BitsMut;
use crate::errors::LiteralError;

/// Parses one bit literal into a [`Bits`]. Underscores between digits are
/// ignored; digits map most-significant first, 4 bits per hex digit, 3 per
/// octal, 1 per binary.
pub fn parse(text: &str) -> Result<Bits, LiteralError> {
    let text = text.trim();
    let (digits, per, base) = split_prefix(text)
        .ok_or_else(|| LiteralError::UnknownPrefix(text.to_string()))?;

    let cleaned: String = digits.chars().filter(|&c| c != '_').collect();
    if cleaned.is_empty() {
        return Err(LiteralError::Empty(text.to_string()));
    }

    let mut out = BitsMut::with_capacity(cleaned.len() * per);
    for c in cleaned.chars() {
        let digit = c
            .to_digit(1u32 << per)
            .ok_or(LiteralError::BadDigit { digit: c, base })?;
        out.push_uint(per, digit.into());
    }
    Ok(out.freeze())
}

/// True when `text` starts like a bit literal.
pub(crate) fn looks_like_literal(text: &str) -> bool {
    split_prefix(text.trim()).is_some()
}

fn split_prefix(text: &str) -> Option<(&str, usize, &'static str)> {
    if let Some(rest) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some((rest, 4, "hex"))
    } else if let Some(rest) = text.strip_prefix("hex=") {
        Some((strip_inner(rest, "0x", "0X"), 4, "hex"))
    } else if let Some(rest) = text.strip_prefix("0o") {
        Some((rest, 3, "octal"))
    } else if let Some(rest) = text.strip_prefix("oct=") {
        Some((strip_inner(rest, "0o", "0o"), 3, "octal"))
    } else if let Some(rest) = text.strip_prefix("0b") {
        Some((rest, 1, "binary"))
    } else if let Some(rest) = text.strip_prefix("bin=") {
        Some((strip_inner(rest, "0b", "0b"), 1, "binary"))
    } else {
        None
    }
}

fn strip_inner<'a>(text: &'a str, prefix: &str, alt: &str) -> &'a str {
    text.strip_prefix(prefix)
        .or_else(|| text.strip_prefix(alt))
        .unwrap_or(text)
}
