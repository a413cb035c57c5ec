//! Error types for container operations, interpretation, format compilation
//! and stream reads.

use thiserror::Error;

/// Errors produced when parsing a bit-literal (`0x…`, `0b…`, `0o…`,
/// `hex=…`, `oct=…`, `bin=…`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    /// The text has no recognized literal prefix.
    #[error("no recognized literal prefix in `{0}`")]
    UnknownPrefix(String),
    /// A digit is not valid for the literal's base.
    #[error("`{digit}` is not a valid {base} digit")]
    BadDigit { digit: char, base: &'static str },
    /// The literal has a prefix but no digits.
    #[error("literal `{0}` has no digits")]
    Empty(String),
}

/// Errors produced by container-level operations on [`crate::Bits`] and
/// [`crate::BitsMut`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitsError {
    /// Bitwise operands must have equal lengths.
    #[error("length mismatch: {left} bits vs {right} bits")]
    LengthMismatch { left: usize, right: usize },
    /// The operation is not defined on an empty sequence.
    #[error("operation not defined on an empty bit sequence")]
    EmptyOperand,
    /// A bit position is outside `[-len, len)`.
    #[error("bit position {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },
    /// A slice range does not fit in the sequence.
    #[error("range {start}..{end} out of bounds for length {len}")]
    RangeOutOfBounds {
        start: usize,
        end: usize,
        len: usize,
    },
    /// Slice step must be non-zero.
    #[error("slice step must be non-zero")]
    ZeroStep,
    /// Search needles must be non-empty.
    #[error("search needle must be non-empty")]
    EmptyNeedle,
}

/// Errors produced when a codec length precondition is violated or a value
/// cannot be represented in the requested kind/width.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpretError {
    /// The bit length does not satisfy the kind's precondition.
    #[error("cannot interpret {len} bits as `{kind}`")]
    BadLength { kind: &'static str, len: usize },
    /// Integer interpretations are bounded at 128 bits.
    #[error("`{kind}` interpretation limited to 128 bits, got {len}")]
    TooWide { kind: &'static str, len: usize },
    /// The value does not fit in the requested width.
    #[error("value {value} does not fit in {len} bits as `{kind}`")]
    DoesNotFit {
        kind: &'static str,
        value: String,
        len: usize,
    },
    /// The kind requires an explicit length to encode.
    #[error("`{0}` requires an explicit length")]
    NeedsLength(&'static str),
    /// The kind is write-only and cannot be decoded to a value.
    #[error("`{0}` is write-only")]
    WriteOnly(&'static str),
    /// The supplied value has the wrong shape for the kind.
    #[error("cannot encode {got} as `{kind}`")]
    BadValue {
        kind: &'static str,
        got: &'static str,
    },
    /// Exact byte export requires a multiple of 8 bits.
    #[error("byte export requires a multiple of 8 bits, got {0}")]
    UnalignedLength(usize),
}

/// Errors produced when compiling a format specification into a
/// [`crate::Format`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// A token names no known interpretation kind.
    #[error("unknown kind `{0}`")]
    UnknownKind(String),
    /// More than one token consumes the remainder of the input.
    #[error("only one token may consume the remainder")]
    MultipleRemainder,
    /// A token, group or repeat factor is malformed.
    #[error("malformed format token `{0}`")]
    BadToken(String),
    /// A repeat factor is zero or not an integer.
    #[error("invalid repeat factor `{0}`")]
    BadFactor(String),
    /// Parentheses are unbalanced.
    #[error("unbalanced parentheses in format")]
    UnbalancedGroup,
    /// A struct-style token uses an unknown type character.
    #[error("unknown struct-format character `{0}`")]
    BadStructChar(char),
    /// A literal term failed to parse.
    #[error(transparent)]
    Literal(#[from] LiteralError),
}

/// Errors produced when binding named lengths/values against a name map.
/// Distinct from [`CompileError`]: the format text itself is well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// A name in the format has no entry in the map.
    #[error("unresolved name `{0}`")]
    Unresolved(String),
    /// A named length resolved to something that is not a bit count.
    #[error("name `{0}` does not resolve to a bit length")]
    BadLengthValue(String),
}

/// Errors produced when executing a [`crate::Program`] against caller
/// supplied values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackError {
    /// The program consumed a different number of values than supplied.
    #[error("format takes {expected} values, got {got}")]
    ValueCount { expected: usize, got: usize },
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Bind(#[from] BindError),
    #[error(transparent)]
    Interpret(#[from] InterpretError),
}

/// Errors produced by [`crate::Array`] element operations, which can fail
/// on either indexing or element encoding grounds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArrayError {
    #[error(transparent)]
    Bits(#[from] BitsError),
    #[error(transparent)]
    Interpret(#[from] InterpretError),
    /// Slice assignment received the wrong number of values.
    #[error("slice assignment takes {expected} values, got {got}")]
    SliceLength { expected: usize, got: usize },
}

/// Errors produced by [`crate::Bits::build`], which accepts both parsed
/// and byte-source construction inputs.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Pack(#[from] PackError),
    #[error("byte source read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced by stream reads on [`crate::BitStream`]. A failed read
/// never advances the stream position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    /// The read requested more bits than remain.
    #[error("requested {requested} bits with {available} remaining")]
    Exhausted { requested: usize, available: usize },
    /// Position outside `[0, len]`.
    #[error("position {pos} out of range for length {len}")]
    BadPosition { pos: usize, len: usize },
    #[error(transparent)]
    Interpret(#[from] InterpretError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Bind(#[from] BindError),
}
