//! # bitlens
//!
//! A bit-exact binary container with typed interpretations and a small
//! declarative format language.
//!
//! [`Bits`] and [`BitsMut`] hold arbitrary-length bit sequences; the codec
//! turns bit ranges into integers of either endianness, IEEE and
//! low-precision floats, Exp-Golomb codes and digit strings, and back.
//! Format strings describe token sequences so structured binary data
//! (codec headers, network and video bitstreams) can be packed or parsed
//! declaratively, and [`BitStream`] walks a sequence token by token.
//!
//! ## Example
//!
//! ```
//! use bitlens::{Bits, BitStream, Value};
//!
//! let header = Bits::from_spec("0x4f8e220").unwrap();
//! let fields = header.unpack("uint:12, hex:8, bin").unwrap();
//! assert_eq!(
//!     fields,
//!     vec![
//!         Value::Uint(1272),
//!         Value::Str("e2".to_string()),
//!         Value::Str("00100000".to_string()),
//!     ]
//! );
//!
//! let mut stream = BitStream::from(header);
//! assert_eq!(stream.read("uint:12").unwrap(), Value::Uint(1272));
//! assert_eq!(stream.pos(), 12);
//! ```

pub mod array;
pub mod bits;
pub mod bits_mut;
pub mod cache;
pub mod codec;
pub mod errors;
mod float;
pub mod format;
mod golomb;
pub mod literal;
mod raw;
pub mod search;
#[cfg(feature = "serde")]
pub mod serde;
pub mod slice;
pub mod stream;

pub use array::Array;
pub use bits::{Bits, Init};
pub use bits_mut::BitsMut;
pub use cache::SpecCache;
pub use codec::{Endianness, Kind, NATIVE_ENDIAN, Value};
pub use errors::{
    ArrayError, BindError, BitsError, BuildError, CompileError, InterpretError, LiteralError,
    PackError, ReadError,
};
pub use format::{Format, Program, pack, pack_with};
pub use search::{FindAll, FindOpts, Split};
pub use slice::{AsBits, BitSlice};
pub use stream::BitStream;
