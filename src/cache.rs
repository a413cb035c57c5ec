//! Bounded memoization of specification text.

use std::collections::{HashMap, VecDeque};

use crate::bits::Bits;
use crate::errors::PackError;

/// A bounded cache from specification text to the [`Bits`] it builds.
///
/// Repeatedly constructing from the same literal text skips re-parsing;
/// cached values share storage, so hits are cheap. Eviction is first-in
/// first-out once `capacity` entries are held, and [`clear`](SpecCache::clear)
/// empties the cache explicitly. Nothing is cached process-wide.
#[derive(Debug)]
pub struct SpecCache {
    capacity: usize,
    map: HashMap<String, Bits>,
    order: VecDeque<String>,
}

impl SpecCache {
    /// Creates a cache holding at most `capacity` parsed specifications.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            map: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Builds `spec`, reusing a previous result when cached.
    pub fn get_or_parse(&mut self, spec: &str) -> Result<Bits, PackError> {
        if let Some(bits) = self.map.get(spec) {
            return Ok(bits.clone());
        }
        let bits = Bits::from_spec(spec)?;
        if self.capacity > 0 {
            if self.map.len() == self.capacity {
                if let Some(oldest) = self.order.pop_front() {
                    self.map.remove(&oldest);
                }
            }
            self.map.insert(spec.to_string(), bits.clone());
            self.order.push_back(spec.to_string());
        }
        Ok(bits)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every cached entry.
    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_returns_same_content() {
        let mut cache = SpecCache::new(4);
        let a = cache.get_or_parse("0xff").unwrap();
        let b = cache.get_or_parse("0xff").unwrap();
        assert_eq!(a, b);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_eviction_is_bounded() {
        let mut cache = SpecCache::new(2);
        cache.get_or_parse("0x01").unwrap();
        cache.get_or_parse("0x02").unwrap();
        cache.get_or_parse("0x03").unwrap();
        assert_eq!(cache.len(), 2);
        // The oldest entry was evicted; it still parses fine.
        assert!(cache.get_or_parse("0x01").is_ok());
    }

    #[test]
    fn test_clear() {
        let mut cache = SpecCache::new(2);
        cache.get_or_parse("0x01").unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_capacity_never_stores() {
        let mut cache = SpecCache::new(0);
        cache.get_or_parse("0x01").unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_parse_errors_not_cached() {
        let mut cache = SpecCache::new(2);
        assert!(cache.get_or_parse("0xzz").is_err());
        assert!(cache.is_empty());
    }
}
