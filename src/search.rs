//! Bit-pattern search: find, rfind, find_all, split, replace, all/any.

use crate::bits::Bits;
use crate::bits_mut::BitsMut;
use crate::errors::BitsError;
use crate::slice::BitSlice;
use crate::raw;

/// Options shared by the search family. `start`/`end` bound the region
/// searched (negative indices count from the end); `byte_aligned` keeps
/// only match positions that are a multiple of 8.
#[derive(Debug, Clone, Copy, Default)]
pub struct FindOpts {
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub byte_aligned: bool,
}

impl FindOpts {
    /// Byte-aligned search over the whole sequence.
    pub fn aligned() -> Self {
        Self {
            byte_aligned: true,
            ..Self::default()
        }
    }

    /// Search over `start..end`.
    pub fn between(start: i64, end: i64) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            byte_aligned: false,
        }
    }
}

/// Resolves an index in `[-len, len)` to an absolute position.
pub(crate) fn resolve_pos(index: i64, len: usize) -> Result<usize, BitsError> {
    let adjusted = if index < 0 { index + len as i64 } else { index };
    if adjusted < 0 || adjusted >= len as i64 {
        return Err(BitsError::IndexOutOfRange { index, len });
    }
    Ok(adjusted as usize)
}

/// Resolves optional start/end bounds to an absolute `start..end` region.
fn resolve_region(opts: FindOpts, len: usize) -> Result<(usize, usize), BitsError> {
    let adjust = |i: i64| if i < 0 { i + len as i64 } else { i };
    let start = adjust(opts.start.unwrap_or(0));
    let end = adjust(opts.end.unwrap_or(len as i64));
    if start < 0 || end < 0 || start > end || end > len as i64 {
        return Err(BitsError::RangeOutOfBounds {
            start: start.max(0) as usize,
            end: end.max(0) as usize,
            len,
        });
    }
    Ok((start as usize, end as usize))
}

fn matches_at(h: BitSlice<'_>, n: BitSlice<'_>, p: usize) -> bool {
    raw::range_eq(h.data, h.offset + p, n.data, n.offset, n.len())
}

fn scan_forward(
    h: BitSlice<'_>,
    n: BitSlice<'_>,
    from: usize,
    end: usize,
    aligned: bool,
) -> Option<usize> {
    if n.len() > end || n.is_empty() {
        return None;
    }
    let last = end - n.len();
    let step = if aligned { 8 } else { 1 };
    let mut p = if aligned { from.next_multiple_of(8) } else { from };
    while p <= last {
        if matches_at(h, n, p) {
            return Some(p);
        }
        p += step;
    }
    None
}

/// Smallest `p` in the region with `h[p..p+len(n)] == n`.
pub(crate) fn find(
    h: BitSlice<'_>,
    n: BitSlice<'_>,
    opts: FindOpts,
) -> Result<Option<usize>, BitsError> {
    if n.is_empty() {
        return Err(BitsError::EmptyNeedle);
    }
    let (start, end) = resolve_region(opts, h.len())?;
    Ok(scan_forward(h, n, start, end, opts.byte_aligned))
}

/// Largest `p` in the region with `h[p..p+len(n)] == n`. A genuine
/// backward scan.
pub(crate) fn rfind(
    h: BitSlice<'_>,
    n: BitSlice<'_>,
    opts: FindOpts,
) -> Result<Option<usize>, BitsError> {
    if n.is_empty() {
        return Err(BitsError::EmptyNeedle);
    }
    let (start, end) = resolve_region(opts, h.len())?;
    if n.len() > end || start + n.len() > end {
        return Ok(None);
    }
    let last = end - n.len();
    let step = if opts.byte_aligned { 8 } else { 1 };
    let mut p = if opts.byte_aligned {
        last - last % 8
    } else {
        last
    };
    if p < start {
        return Ok(None);
    }
    loop {
        if matches_at(h, n, p) {
            return Ok(Some(p));
        }
        if p < start + step {
            return Ok(None);
        }
        p -= step;
    }
}

/// Lazy ascending iterator over match positions; overlapping matches are
/// all reported.
pub struct FindAll<'a> {
    h: BitSlice<'a>,
    n: BitSlice<'a>,
    next_from: usize,
    end: usize,
    aligned: bool,
    remaining: Option<usize>,
}

impl Iterator for FindAll<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == Some(0) {
            return None;
        }
        let p = scan_forward(self.h, self.n, self.next_from, self.end, self.aligned)?;
        self.next_from = p + 1;
        if let Some(r) = &mut self.remaining {
            *r -= 1;
        }
        Some(p)
    }
}

pub(crate) fn find_all<'a>(
    h: BitSlice<'a>,
    n: BitSlice<'a>,
    opts: FindOpts,
    count: Option<usize>,
) -> Result<FindAll<'a>, BitsError> {
    if n.is_empty() {
        return Err(BitsError::EmptyNeedle);
    }
    let (start, end) = resolve_region(opts, h.len())?;
    Ok(FindAll {
        h,
        n,
        next_from: start,
        end,
        aligned: opts.byte_aligned,
        remaining: count,
    })
}

/// Iterator of chunks cut at non-overlapping delimiter matches. The first
/// chunk is everything before the first match (possibly empty); later
/// chunks start with the delimiter.
pub struct Split<'a> {
    h: BitSlice<'a>,
    d: BitSlice<'a>,
    chunk_start: usize,
    end: usize,
    aligned: bool,
    first: bool,
    done: bool,
    remaining: Option<usize>,
}

impl Iterator for Split<'_> {
    type Item = Bits;

    fn next(&mut self) -> Option<Bits> {
        if self.done || self.remaining == Some(0) {
            return None;
        }
        if let Some(r) = &mut self.remaining {
            *r -= 1;
        }
        let from = if self.first {
            self.chunk_start
        } else {
            self.chunk_start + self.d.len()
        };
        self.first = false;
        let chunk_end = match scan_forward(self.h, self.d, from, self.end, self.aligned) {
            Some(p) => p,
            None => {
                self.done = true;
                self.end
            }
        };
        let chunk = self.h.sub(self.chunk_start, chunk_end - self.chunk_start);
        self.chunk_start = chunk_end;
        Some(Bits::from_raw(chunk.to_byte_vec(), chunk.len()))
    }
}

pub(crate) fn split<'a>(
    h: BitSlice<'a>,
    d: BitSlice<'a>,
    opts: FindOpts,
    count: Option<usize>,
) -> Result<Split<'a>, BitsError> {
    if d.is_empty() {
        return Err(BitsError::EmptyNeedle);
    }
    let (start, end) = resolve_region(opts, h.len())?;
    Ok(Split {
        h,
        d,
        chunk_start: start,
        end,
        aligned: opts.byte_aligned,
        first: true,
        done: false,
        remaining: count,
    })
}

/// Non-overlapping left-to-right substitution over the region. Returns the
/// rebuilt sequence and the number of substitutions.
pub(crate) fn replace(
    h: BitSlice<'_>,
    n: BitSlice<'_>,
    r: BitSlice<'_>,
    opts: FindOpts,
    count: Option<usize>,
) -> Result<(BitsMut, usize), BitsError> {
    if n.is_empty() {
        return Err(BitsError::EmptyNeedle);
    }
    let (start, end) = resolve_region(opts, h.len())?;

    let mut out = BitsMut::with_capacity(h.len());
    out.append(&h.sub(0, start));

    let mut cur = start;
    let mut substitutions = 0;
    while count.is_none_or(|c| substitutions < c) {
        match scan_forward(h, n, cur, end, opts.byte_aligned) {
            Some(p) => {
                out.append(&h.sub(cur, p - cur));
                out.append(&r);
                cur = p + n.len();
                substitutions += 1;
            }
            None => break,
        }
    }
    out.append(&h.sub(cur, h.len() - cur));
    Ok((out, substitutions))
}

/// True when every listed position (default: the whole sequence) holds
/// `value`.
pub(crate) fn all(
    s: BitSlice<'_>,
    value: bool,
    positions: Option<&[i64]>,
) -> Result<bool, BitsError> {
    match positions {
        Some(positions) => {
            let mut ok = true;
            for &index in positions {
                let pos = resolve_pos(index, s.len())?;
                ok &= s.bit(pos) == value;
            }
            Ok(ok)
        }
        None => {
            let ones = s.count_ones();
            Ok(if value { ones == s.len() } else { ones == 0 })
        }
    }
}

/// True when at least one listed position (default: the whole sequence)
/// holds `value`.
pub(crate) fn any(
    s: BitSlice<'_>,
    value: bool,
    positions: Option<&[i64]>,
) -> Result<bool, BitsError> {
    match positions {
        Some(positions) => {
            let mut hit = false;
            for &index in positions {
                let pos = resolve_pos(index, s.len())?;
                hit |= s.bit(pos) == value;
            }
            Ok(hit)
        }
        None => {
            let ones = s.count_ones();
            Ok(if value { ones > 0 } else { ones < s.len() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slice::AsBits;

    fn bits(spec: &str) -> Bits {
        Bits::from_spec(spec).unwrap()
    }

    #[test]
    fn test_find_basic() {
        let h = bits("0b00111011");
        let n = bits("0b11");
        assert_eq!(h.find(&n, FindOpts::default()).unwrap(), Some(2));
        assert_eq!(
            h.find(&n, FindOpts { start: Some(4), ..Default::default() })
                .unwrap(),
            Some(6)
        );
        assert_eq!(h.find(&bits("0b10101"), FindOpts::default()).unwrap(), None);
    }

    #[test]
    fn test_find_validates_needle_and_region() {
        let h = bits("0xff");
        assert_eq!(
            h.find(&Bits::new(), FindOpts::default()).unwrap_err(),
            BitsError::EmptyNeedle
        );
        assert!(h
            .find(&bits("0b1"), FindOpts { start: Some(9), ..Default::default() })
            .is_err());
        assert!(h
            .find(&bits("0b1"), FindOpts::between(4, 2))
            .is_err());
    }

    #[test]
    fn test_scenario_c_byte_aligned_find() {
        let h = bits("0x0023122");
        let n = bits("0b000100");
        assert_eq!(h.find(&n, FindOpts::aligned()).unwrap(), Some(16));
        // Without alignment an earlier, unaligned match wins.
        let free = h.find(&n, FindOpts::default()).unwrap().unwrap();
        assert!(free < 16);
    }

    #[test]
    fn test_find_result_is_a_real_match() {
        let h = bits("0b1101101001011");
        let n = bits("0b0110");
        if let Some(p) = h.find(&n, FindOpts::default()).unwrap() {
            assert_eq!(h.slice(p..p + n.len()).unwrap(), n);
        } else {
            panic!("needle exists");
        }
    }

    #[test]
    fn test_rfind_returns_maximum() {
        let h = bits("0b11011011");
        let n = bits("0b11");
        assert_eq!(h.rfind(&n, FindOpts::default()).unwrap(), Some(6));
        assert_eq!(h.find(&n, FindOpts::default()).unwrap(), Some(0));

        // Brute-force cross-check.
        let brute = (0..=h.len() - n.len())
            .filter(|&p| h.slice(p..p + n.len()).unwrap() == n)
            .max();
        assert_eq!(h.rfind(&n, FindOpts::default()).unwrap(), brute);
    }

    #[test]
    fn test_rfind_byte_aligned() {
        let h = bits("0x110011");
        let n = bits("0x11");
        assert_eq!(h.rfind(&n, FindOpts::aligned()).unwrap(), Some(16));
    }

    #[test]
    fn test_find_all_overlapping() {
        let h = bits("0b1111");
        let n = bits("0b11");
        let hits: Vec<usize> = h.find_all(&n, FindOpts::default(), None).unwrap().collect();
        assert_eq!(hits, vec![0, 1, 2]);

        let capped: Vec<usize> = h
            .find_all(&n, FindOpts::default(), Some(2))
            .unwrap()
            .collect();
        assert_eq!(capped, vec![0, 1]);
    }

    #[test]
    fn test_split_prefix_first() {
        let h = bits("0xaa1234aa56");
        let d = bits("0xaa");
        let chunks: Vec<Bits> = h.split(&d, FindOpts::aligned(), None).unwrap().collect();
        assert_eq!(chunks.len(), 3);
        assert!(chunks[0].is_empty());
        assert_eq!(chunks[1], bits("0xaa1234"));
        assert_eq!(chunks[2], bits("0xaa56"));
    }

    #[test]
    fn test_split_no_match_yields_whole() {
        let h = bits("0x1234");
        let chunks: Vec<Bits> = h
            .split(&bits("0xff"), FindOpts::default(), None)
            .unwrap()
            .collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], h);
    }

    #[test]
    fn test_split_rejects_empty_delimiter() {
        let h = bits("0x1234");
        assert!(h.split(&Bits::new(), FindOpts::default(), None).is_err());
    }

    #[test]
    fn test_split_count_cap() {
        let h = bits("0x01010101");
        let d = bits("0x01");
        let chunks: Vec<Bits> = h.split(&d, FindOpts::aligned(), Some(2)).unwrap().collect();
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_replace_non_overlapping() {
        let h = bits("0b010101");
        let (out, n) = h
            .replace(&bits("0b101"), &bits("0b000"), FindOpts::default(), None)
            .unwrap();
        // Matches at 1 only the first; the scan resumes past it.
        assert_eq!(n, 1);
        assert_eq!(out.bin(), "000001");
    }

    #[test]
    fn test_replace_in_place_and_count() {
        let mut h = bits("0xabab").to_mut();
        let n = h
            .replace(&bits("0xab"), &bits("0xcd"), FindOpts::aligned(), None)
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(h.hex().unwrap(), "cdcd");

        let mut h = bits("0xabab").to_mut();
        let n = h
            .replace(&bits("0xab"), &bits("0xcd"), FindOpts::aligned(), Some(1))
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(h.hex().unwrap(), "cdab");
    }

    #[test]
    fn test_replace_with_different_length() {
        let h = bits("0b0110");
        let (out, n) = h
            .replace(&bits("0b11"), &bits("0b0"), FindOpts::default(), None)
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(out.bin(), "000");
    }

    #[test]
    fn test_all_any_defaults() {
        let ones = bits("0b111");
        let s = ones.as_bitslice();
        assert!(all(s, true, None).unwrap());
        assert!(!any(s, false, None).unwrap());
        let mixed = bits("0b101");
        assert!(!mixed.all(true, None).unwrap());
        assert!(mixed.any(false, None).unwrap());
    }
}
