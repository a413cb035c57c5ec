//! Exponential-Golomb codes, standard and interleaved.
//!
//! All decoders report the number of bits consumed; that count is how a
//! stream advances over a token with no declared length.

use crate::bits_mut::BitsMut;
use crate::slice::BitSlice;

/// Appends the standard Exp-Golomb code for `value`: `value + 1` in binary,
/// preceded by one fewer zero bits than its bit count.
pub(crate) fn append_ue(out: &mut BitsMut, value: u64) {
    let k = u128::from(value) + 1;
    let bits = 128 - k.leading_zeros() as usize;
    out.push_uint(bits - 1, 0);
    out.push_uint(bits, k);
}

/// Reads one standard Exp-Golomb code starting at `pos`. Returns the value
/// and the bits consumed, or `None` when the input ends mid-code.
pub(crate) fn read_ue(s: BitSlice<'_>, pos: usize) -> Option<(u64, usize)> {
    let mut zeros = 0;
    while pos + zeros < s.len() && !s.bit(pos + zeros) {
        zeros += 1;
    }
    if pos + zeros >= s.len() || zeros > 64 {
        return None;
    }
    // The marker 1 plus `zeros` suffix bits.
    let suffix_start = pos + zeros + 1;
    if suffix_start + zeros > s.len() {
        return None;
    }
    let suffix = s.read_uint(suffix_start, zeros);
    let value = u64::try_from((1u128 << zeros | suffix) - 1).ok()?;
    Some((value, 2 * zeros + 1))
}

/// Appends the signed Exp-Golomb code: `v > 0` maps to `2v - 1`, `v <= 0`
/// maps to `-2v`, then the unsigned code.
pub(crate) fn append_se(out: &mut BitsMut, value: i64) {
    append_ue(out, zigzag(value));
}

/// Reads one signed Exp-Golomb code starting at `pos`.
pub(crate) fn read_se(s: BitSlice<'_>, pos: usize) -> Option<(i64, usize)> {
    let (k, consumed) = read_ue(s, pos)?;
    Some((unzigzag(k)?, consumed))
}

/// Appends the interleaved Exp-Golomb code for `value`: for each bit of
/// `value + 1` below the leading one, a zero continuation bit then the data
/// bit, closed by a one.
pub(crate) fn append_uie(out: &mut BitsMut, value: u64) {
    let k = u128::from(value) + 1;
    let bits = 128 - k.leading_zeros() as usize;
    for i in (0..bits - 1).rev() {
        out.push(false);
        out.push(k >> i & 1 == 1);
    }
    out.push(true);
}

/// Reads one interleaved Exp-Golomb code starting at `pos`.
pub(crate) fn read_uie(s: BitSlice<'_>, pos: usize) -> Option<(u64, usize)> {
    let mut code = 1u128;
    let mut p = pos;
    loop {
        if p >= s.len() {
            return None;
        }
        if s.bit(p) {
            let value = u64::try_from(code - 1).ok()?;
            return Some((value, p + 1 - pos));
        }
        if p + 1 >= s.len() || code > 1u128 << 64 {
            return None;
        }
        code = code << 1 | u128::from(s.bit(p + 1));
        p += 2;
    }
}

/// Appends the signed interleaved code using the same zigzag mapping as
/// [`append_se`].
pub(crate) fn append_sie(out: &mut BitsMut, value: i64) {
    append_uie(out, zigzag(value));
}

/// Reads one signed interleaved code starting at `pos`.
pub(crate) fn read_sie(s: BitSlice<'_>, pos: usize) -> Option<(i64, usize)> {
    let (k, consumed) = read_uie(s, pos)?;
    Some((unzigzag(k)?, consumed))
}

fn zigzag(value: i64) -> u64 {
    if value > 0 {
        2 * value as u64 - 1
    } else {
        2 * value.unsigned_abs()
    }
}

fn unzigzag(k: u64) -> Option<i64> {
    if k % 2 == 1 {
        i64::try_from(k / 2 + 1).ok()
    } else {
        i64::try_from(k / 2).ok().map(|v| -v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slice::AsBits;

    fn ue(value: u64) -> BitsMut {
        let mut out = BitsMut::new();
        append_ue(&mut out, value);
        out
    }

    fn uie(value: u64) -> BitsMut {
        let mut out = BitsMut::new();
        append_uie(&mut out, value);
        out
    }

    #[test]
    fn test_ue_known_codes() {
        assert_eq!(ue(0).bin(), "1");
        assert_eq!(ue(1).bin(), "010");
        assert_eq!(ue(2).bin(), "011");
        assert_eq!(ue(3).bin(), "00100");
        assert_eq!(ue(7).bin(), "0001000");
    }

    #[test]
    fn test_ue_round_trip() {
        for value in [0u64, 1, 2, 100, 1_000_000, u64::MAX] {
            let encoded = ue(value);
            let (decoded, consumed) = read_ue(encoded.as_bitslice(), 0).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(consumed, encoded.len());
        }
    }

    #[test]
    fn test_se_round_trip() {
        for value in [0i64, 1, -1, 5, -5] {
            let mut encoded = BitsMut::new();
            append_se(&mut encoded, value);
            let (decoded, consumed) = read_se(encoded.as_bitslice(), 0).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(consumed, encoded.len());
        }
    }

    #[test]
    fn test_se_mapping() {
        // v > 0 -> 2v-1, v <= 0 -> -2v.
        let mut one = BitsMut::new();
        append_se(&mut one, 1);
        assert_eq!(one.bin(), ue(1).bin());

        let mut minus_one = BitsMut::new();
        append_se(&mut minus_one, -1);
        assert_eq!(minus_one.bin(), ue(2).bin());
    }

    #[test]
    fn test_uie_known_codes() {
        assert_eq!(uie(0).bin(), "1");
        assert_eq!(uie(1).bin(), "001");
        assert_eq!(uie(2).bin(), "011");
        assert_eq!(uie(3).bin(), "00001");
    }

    #[test]
    fn test_uie_round_trip() {
        for value in [0u64, 1, 2, 3, 4, 100, 1_000_000] {
            let encoded = uie(value);
            let (decoded, consumed) = read_uie(encoded.as_bitslice(), 0).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(consumed, encoded.len());
        }
    }

    #[test]
    fn test_sie_round_trip() {
        for value in [0i64, 1, -1, 5, -5, 1000, -1000] {
            let mut encoded = BitsMut::new();
            append_sie(&mut encoded, value);
            let (decoded, consumed) = read_sie(encoded.as_bitslice(), 0).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(consumed, encoded.len());
        }
    }

    #[test]
    fn test_truncated_codes() {
        let mut b = BitsMut::new();
        b.push_uint(3, 0); // all-zero prefix, no marker
        assert!(read_ue(b.as_bitslice(), 0).is_none());
        assert!(read_uie(b.as_bitslice(), 0).is_none());
        assert!(read_ue(BitsMut::new().as_bitslice(), 0).is_none());
    }

    #[test]
    fn test_read_at_offset() {
        let mut b = BitsMut::new();
        b.push_uint(4, 0b1111);
        append_ue(&mut b, 5);
        let (value, consumed) = read_ue(b.as_bitslice(), 4).unwrap();
        assert_eq!(value, 5);
        assert_eq!(consumed, b.len() - 4);
    }
}
