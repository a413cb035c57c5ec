//! Fixed-width typed element collection over a bit buffer.

use crate::bits::Bits;
use crate::bits_mut::BitsMut;
use crate::codec::{self, Kind, Value};
use crate::errors::{ArrayError, BitsError, InterpretError};
use crate::slice::AsBits;

/// A collection of equally wide elements, each decoded and encoded through
/// one interpretation kind.
///
/// Element `i` lives at bit offset `i * width`; `length mod width`
/// trailing bits stay in storage but are not addressable as elements.
#[derive(Debug, Clone)]
pub struct Array {
    data: BitsMut,
    kind: Kind,
    width: usize,
}

impl Array {
    /// An empty array of `width`-bit elements of `kind`. The width must
    /// satisfy the kind's length precondition.
    pub fn new(kind: Kind, width: usize) -> Result<Self, InterpretError> {
        if kind == Kind::Pad || kind.is_self_delimiting() {
            return Err(InterpretError::BadLength { kind: kind.name(), len: width });
        }
        kind.validate_len(width)?;
        Ok(Self {
            data: BitsMut::new(),
            kind,
            width,
        })
    }

    /// An array over existing bit content.
    pub fn with_bits<T: AsBits + ?Sized>(
        kind: Kind,
        width: usize,
        bits: &T,
    ) -> Result<Self, InterpretError> {
        let mut array = Self::new(kind, width)?;
        array.data.append(bits);
        Ok(array)
    }

    /// An array built by encoding `values` one after another.
    pub fn from_values(kind: Kind, width: usize, values: &[Value]) -> Result<Self, InterpretError> {
        let mut array = Self::new(kind, width)?;
        for value in values {
            array.push(value)?;
        }
        Ok(array)
    }

    /// Number of whole elements.
    pub fn len(&self) -> usize {
        self.data.len() / self.width
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element kind.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// The element width in bits.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Bits past the last whole element.
    pub fn trailing_bits(&self) -> usize {
        self.data.len() % self.width
    }

    /// The underlying bit content, trailing bits included.
    pub fn to_bits(&self) -> Bits {
        self.data.to_bits()
    }

    /// Decodes element `i`.
    pub fn get(&self, i: usize) -> Option<Value> {
        if i >= self.len() {
            return None;
        }
        let s = self.data.as_bitslice().sub(i * self.width, self.width);
        // The width was validated at construction.
        Some(codec::decode(self.kind, s).unwrap())
    }

    /// Encodes `value` into element `i`.
    pub fn set(&mut self, i: usize, value: &Value) -> Result<(), ArrayError> {
        if i >= self.len() {
            return Err(BitsError::IndexOutOfRange {
                index: i as i64,
                len: self.len(),
            }
            .into());
        }
        let encoded = codec::encode(self.kind, value, Some(self.width))?;
        self.data.overwrite(i * self.width, &encoded)?;
        Ok(())
    }

    /// Appends one encoded element.
    pub fn push(&mut self, value: &Value) -> Result<(), InterpretError> {
        let encoded = codec::encode(self.kind, value, Some(self.width))?;
        self.data.append(&encoded);
        Ok(())
    }

    /// Decodes every element front to back.
    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.len()).map(|i| self.get(i).unwrap())
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.iter().collect()
    }

    /// Assigns `values` over the index sequence `start..stop` by `step`
    /// (slice semantics, negative indices and steps included). The value
    /// count must match the index count exactly.
    pub fn set_slice(
        &mut self,
        start: Option<i64>,
        stop: Option<i64>,
        step: i64,
        values: &[Value],
    ) -> Result<(), ArrayError> {
        if step == 0 {
            return Err(BitsError::ZeroStep.into());
        }
        let len = self.len() as i64;
        let clamp = |i: i64, low: i64, high: i64| i.max(low).min(high);
        let adjust = |i: i64| if i < 0 { i + len } else { i };

        let mut indices = Vec::new();
        if step > 0 {
            let start = clamp(adjust(start.unwrap_or(0)), 0, len);
            let stop = clamp(adjust(stop.unwrap_or(len)), 0, len);
            let mut i = start;
            while i < stop {
                indices.push(i as usize);
                i += step;
            }
        } else {
            let start = clamp(adjust(start.unwrap_or(len - 1)), -1, len - 1);
            let stop = clamp(adjust(stop.unwrap_or(-1 - len)), -1, len - 1);
            let mut i = start;
            while i > stop {
                indices.push(i as usize);
                i += step;
            }
        }

        if indices.len() != values.len() {
            return Err(ArrayError::SliceLength {
                expected: indices.len(),
                got: values.len(),
            });
        }
        for (&i, value) in indices.iter().zip(values) {
            self.set(i, value)?;
        }
        Ok(())
    }

    /// Reinterprets the same bit content with a new element descriptor,
    /// truncating to whole elements of the new width.
    pub fn astype(&self, kind: Kind, width: usize) -> Result<Array, InterpretError> {
        Self::with_bits(kind, width, &self.data)
    }

    // ---- element-wise value operations -----------------------------------

    /// Multiplies every element by `factor`, failing when any result falls
    /// outside the element kind's range.
    pub fn mul_all(&mut self, factor: i128) -> Result<(), ArrayError> {
        self.map_ints(|v| v.checked_mul(factor))
    }

    /// Shifts every decoded element value left by `n`.
    pub fn shl_all(&mut self, n: u32) -> Result<(), ArrayError> {
        self.map_ints(|v| v.checked_shl(n))
    }

    /// Shifts every decoded element value right by `n`.
    pub fn shr_all(&mut self, n: u32) -> Result<(), ArrayError> {
        self.map_ints(|v| v.checked_shr(n))
    }

    /// ANDs every decoded element value with `mask`.
    pub fn and_all(&mut self, mask: i128) -> Result<(), ArrayError> {
        self.map_ints(|v| Some(v & mask))
    }

    /// ORs every decoded element value with `mask`.
    pub fn or_all(&mut self, mask: i128) -> Result<(), ArrayError> {
        self.map_ints(|v| Some(v | mask))
    }

    /// XORs every decoded element value with `mask`.
    pub fn xor_all(&mut self, mask: i128) -> Result<(), ArrayError> {
        self.map_ints(|v| Some(v ^ mask))
    }

    /// Applies an integer-valued operation to every element. The element
    /// kind must decode to integers; each result is re-encoded, so
    /// out-of-range results fail before any element is written back.
    fn map_ints(&mut self, op: impl Fn(i128) -> Option<i128>) -> Result<(), ArrayError> {
        let mut mapped = Vec::with_capacity(self.len());
        for (i, value) in self.iter().enumerate() {
            let v = match value {
                Value::Uint(v) => i128::try_from(v).ok(),
                Value::Int(v) => Some(v),
                _ => {
                    return Err(InterpretError::BadValue {
                        kind: self.kind.name(),
                        got: "a non-integer element",
                    }
                    .into());
                }
            };
            let result = v.and_then(&op).ok_or(InterpretError::DoesNotFit {
                kind: self.kind.name(),
                value: format!("element {i}"),
                len: self.width,
            })?;
            // Validate the result fits before committing anything.
            mapped.push(codec::encode(self.kind, &Value::Int(result), Some(self.width))?);
        }
        for (i, encoded) in mapped.into_iter().enumerate() {
            self.data.overwrite(i * self.width, &encoded)?;
        }
        Ok(())
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        // Descriptor plus the element region; trailing bits do not count.
        self.kind == other.kind
            && self.width == other.width
            && self.len() == other.len()
            && self
                .data
                .as_bitslice()
                .sub(0, self.len() * self.width)
                == other.data.as_bitslice().sub(0, other.len() * other.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uint8_array(values: &[u128]) -> Array {
        let values: Vec<Value> = values.iter().map(|&v| Value::Uint(v)).collect();
        Array::from_values(Kind::Uint, 8, &values).unwrap()
    }

    #[test]
    fn test_push_get_set() {
        let mut a = uint8_array(&[1, 2, 3]);
        assert_eq!(a.len(), 3);
        assert_eq!(a.get(1), Some(Value::Uint(2)));
        assert_eq!(a.get(3), None);

        a.set(1, &Value::Uint(200)).unwrap();
        assert_eq!(a.get(1), Some(Value::Uint(200)));
        assert!(a.set(3, &Value::Uint(0)).is_err());
        assert!(a.set(0, &Value::Uint(300)).is_err());
    }

    #[test]
    fn test_trailing_bits_inaccessible() {
        let bits = Bits::from_spec("0b11111111110").unwrap(); // 11 bits
        let a = Array::with_bits(Kind::Uint, 4, &bits).unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a.trailing_bits(), 3);
        assert_eq!(a.to_bits().len(), 11);
    }

    #[test]
    fn test_kind_validation() {
        assert!(Array::new(Kind::Uint, 0).is_err());
        assert!(Array::new(Kind::FloatBe, 24).is_err());
        assert!(Array::new(Kind::Ue, 8).is_err());
        assert!(Array::new(Kind::Pad, 8).is_err());
        assert!(Array::new(Kind::FloatBe, 16).is_ok());
    }

    #[test]
    fn test_element_ops() {
        let mut a = uint8_array(&[1, 2, 3]);
        a.mul_all(10).unwrap();
        assert_eq!(
            a.to_vec(),
            vec![Value::Uint(10), Value::Uint(20), Value::Uint(30)]
        );

        a.shl_all(2).unwrap();
        assert_eq!(a.get(0), Some(Value::Uint(40)));

        a.and_all(0x0F).unwrap();
        assert_eq!(a.get(0), Some(Value::Uint(8)));

        a.or_all(0x10).unwrap();
        assert_eq!(a.get(0), Some(Value::Uint(24)));

        a.xor_all(0xFF).unwrap();
        assert_eq!(a.get(0), Some(Value::Uint(231)));
    }

    #[test]
    fn test_element_ops_reject_out_of_range() {
        let mut a = uint8_array(&[100, 2]);
        let before = a.to_vec();
        assert!(a.mul_all(3).is_err());
        // Nothing was committed.
        assert_eq!(a.to_vec(), before);
    }

    #[test]
    fn test_element_ops_on_signed() {
        let values: Vec<Value> = [-2i128, 3].iter().map(|&v| Value::Int(v)).collect();
        let mut a = Array::from_values(Kind::Int, 8, &values).unwrap();
        a.mul_all(-1).unwrap();
        assert_eq!(a.to_vec(), vec![Value::Int(2), Value::Int(-3)]);
    }

    #[test]
    fn test_set_slice_with_step() {
        let mut a = uint8_array(&[0, 0, 0, 0, 0, 0]);
        a.set_slice(
            Some(1),
            None,
            2,
            &[Value::Uint(7), Value::Uint(8), Value::Uint(9)],
        )
        .unwrap();
        assert_eq!(
            a.to_vec(),
            vec![
                Value::Uint(0),
                Value::Uint(7),
                Value::Uint(0),
                Value::Uint(8),
                Value::Uint(0),
                Value::Uint(9)
            ]
        );

        let err = a.set_slice(None, None, 1, &[Value::Uint(1)]).unwrap_err();
        assert_eq!(err, ArrayError::SliceLength { expected: 6, got: 1 });
    }

    #[test]
    fn test_astype_truncates_to_whole_elements() {
        let a = uint8_array(&[0xAB, 0xCD, 0xEF]);
        let wide = a.astype(Kind::Uint, 16).unwrap();
        assert_eq!(wide.len(), 1);
        assert_eq!(wide.get(0), Some(Value::Uint(0xABCD)));
        assert_eq!(wide.trailing_bits(), 8);

        let narrow = a.astype(Kind::Uint, 4).unwrap();
        assert_eq!(narrow.len(), 6);
        assert_eq!(narrow.get(0), Some(Value::Uint(0xA)));
    }

    #[test]
    fn test_float_elements() {
        let values = vec![Value::Float(1.5), Value::Float(-0.25)];
        let a = Array::from_values(Kind::FloatBe, 32, &values).unwrap();
        assert_eq!(a.to_vec(), values);
        // Value-level integer ops have no meaning for float elements.
        let mut a = a;
        assert!(a.mul_all(2).is_err());
    }

    #[test]
    fn test_equality_ignores_trailing_bits() {
        let a = Array::with_bits(Kind::Uint, 8, &Bits::from_spec("0xab").unwrap()).unwrap();
        let mut with_tail = Bits::from_spec("0xab").unwrap().to_mut();
        with_tail.push(true);
        let b = Array::with_bits(Kind::Uint, 8, &with_tail).unwrap();
        assert_eq!(a, b);
    }
}
