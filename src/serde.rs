//! JSON-deserializable format description.
//!
//! These types describe the *shape* of a format program. They are intended
//! to be constructed from JSON (for example a format file shipped with
//! your application) and then compiled into a [`crate::Format`].

use serde::{Deserialize, Serialize};

use crate::codec::Kind;
use crate::errors::CompileError;
use crate::format::{self, Format, FormatToken, LenSpec, ValueSpec};

/// Top-level format definition consisting of a list of tokens.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FormatDef {
    /// All tokens of the program, in order.
    pub tokens: Vec<TokenDef>,
}

/// Description of a single token.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TokenDef {
    /// Interpretation kind keyword, e.g. `"uint"` or `"float8_143"`.
    pub kind: String,
    /// Bit length: a number, or a name resolved at bind time. Omitted for
    /// self-delimiting kinds and the consume-remainder token.
    #[serde(default)]
    pub length: Option<LengthDef>,
    /// Optional bound value for packing: literal text or a name.
    #[serde(default)]
    pub value: Option<String>,
    /// Repeat count; the token is flattened this many times.
    #[serde(default)]
    pub repeat: Option<usize>,
}

/// A literal bit count or a deferred name.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(untagged)]
pub enum LengthDef {
    Bits(usize),
    Name(String),
}

impl TryFrom<FormatDef> for Format {
    type Error = CompileError;

    fn try_from(def: FormatDef) -> Result<Self, Self::Error> {
        let mut tokens = Vec::with_capacity(def.tokens.len());
        for token in def.tokens {
            let kind = Kind::from_name(&token.kind)
                .ok_or_else(|| CompileError::UnknownKind(token.kind.clone()))?;

            let len = match token.length {
                Some(LengthDef::Bits(bits)) => {
                    kind.validate_len(bits)
                        .map_err(|_| CompileError::BadToken(token.kind.clone()))?;
                    LenSpec::Fixed(bits)
                }
                Some(LengthDef::Name(name)) => {
                    if kind.is_self_delimiting() {
                        return Err(CompileError::BadToken(token.kind.clone()));
                    }
                    LenSpec::Named(name)
                }
                None => match kind.implicit_len() {
                    Some(bits) => LenSpec::Fixed(bits),
                    None if kind.is_self_delimiting() => LenSpec::Dynamic,
                    None => LenSpec::Remainder,
                },
            };

            let value = token.value.map(|text| {
                if format::is_name(&text) && !format::is_bool_text(&text) {
                    ValueSpec::Named(text)
                } else {
                    ValueSpec::Text(text)
                }
            });

            let repeat = token.repeat.unwrap_or(1);
            if repeat == 0 {
                return Err(CompileError::BadFactor("0".to_string()));
            }
            let flat = FormatToken { kind, len, value };
            for _ in 0..repeat {
                tokens.push(flat.clone());
            }
        }
        Format::from_tokens(tokens)
    }
}
