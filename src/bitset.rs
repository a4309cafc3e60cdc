//! Fixed-length attribute bit vectors.
//!
//! A [`BitVector`] marks which attributes belong to a candidate subset.
//! Values are compared, hashed and ordered by content, so they can key the
//! evaluation cache directly.
//!
//! [`parse_ranges`] turns a 1-based attribute list such as `"1,3,5-7"` into
//! zero-based indices; it is how starting subsets are specified.

use crate::error::{Result, SearchError};
use std::fmt;

const WORD_BITS: usize = 64;

/// Fixed-length, zero-indexed boolean vector.
///
/// Indexing past [`len`](BitVector::len) panics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BitVector {
    len: usize,
    words: Vec<u64>,
}

impl BitVector {
    /// Creates a vector of `len` cleared bits.
    pub fn new(len: usize) -> Self {
        Self {
            len,
            words: vec![0; len.div_ceil(WORD_BITS)],
        }
    }

    /// Creates a vector of `len` bits with the given indices set.
    ///
    /// # Panics
    /// Panics if any index is `>= len`.
    pub fn from_indices(len: usize, indices: &[usize]) -> Self {
        let mut bits = Self::new(len);
        for &i in indices {
            bits.set(i);
        }
        bits
    }

    /// Number of bits (attributes).
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` for a zero-length vector.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns bit `i`.
    pub fn get(&self, i: usize) -> bool {
        self.check(i);
        self.words[i / WORD_BITS] & (1 << (i % WORD_BITS)) != 0
    }

    /// Sets bit `i`.
    pub fn set(&mut self, i: usize) {
        self.check(i);
        self.words[i / WORD_BITS] |= 1 << (i % WORD_BITS);
    }

    /// Clears bit `i`.
    pub fn clear(&mut self, i: usize) {
        self.check(i);
        self.words[i / WORD_BITS] &= !(1 << (i % WORD_BITS));
    }

    /// Writes `value` into bit `i`.
    pub fn assign(&mut self, i: usize, value: bool) {
        if value {
            self.set(i);
        } else {
            self.clear(i);
        }
    }

    /// Inverts bit `i`.
    pub fn flip(&mut self, i: usize) {
        self.check(i);
        self.words[i / WORD_BITS] ^= 1 << (i % WORD_BITS);
    }

    /// Number of set bits.
    pub fn count_set(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Iterates over set indices in ascending order.
    pub fn iter_set(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(move |&i| self.get(i))
    }

    /// Ordered list of set indices.
    pub fn to_index_list(&self) -> Vec<usize> {
        self.iter_set().collect()
    }

    /// Renders set attributes 1-based, each followed by a space (`"1 3 "`).
    pub fn to_attribute_string(&self) -> String {
        self.iter_set().map(|i| format!("{} ", i + 1)).collect()
    }

    fn check(&self, i: usize) {
        assert!(
            i < self.len,
            "bit index {i} out of bounds for length {}",
            self.len
        );
    }
}

/// Binary rendering, bit 0 first.
impl fmt::Display for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.len {
            f.write_str(if self.get(i) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Parses a 1-based attribute list into sorted, deduplicated zero-based
/// indices.
///
/// Accepts comma-separated single indices and inclusive `a-b` ranges; the
/// keywords `first` and `last` stand for `1` and `upper`. An empty string
/// yields an empty selection.
///
/// ```
/// use u_featsearch::bitset::parse_ranges;
///
/// assert_eq!(parse_ranges("1,3,5-7", 10).unwrap(), vec![0, 2, 4, 5, 6]);
/// assert_eq!(parse_ranges("first,last", 4).unwrap(), vec![0, 3]);
/// ```
pub fn parse_ranges(spec: &str, upper: usize) -> Result<Vec<usize>> {
    let mut out = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (lo, hi) = match part.split_once('-') {
            Some((a, b)) => (parse_bound(a, upper)?, parse_bound(b, upper)?),
            None => {
                let v = parse_bound(part, upper)?;
                (v, v)
            }
        };
        if lo > hi {
            return Err(SearchError::config(format!(
                "attribute range {part} is descending"
            )));
        }
        out.extend(lo - 1..hi);
    }
    out.sort_unstable();
    out.dedup();
    Ok(out)
}

fn parse_bound(token: &str, upper: usize) -> Result<usize> {
    let token = token.trim();
    let value = match token {
        "first" => 1,
        "last" => upper,
        _ => token.parse::<usize>().map_err(|_| {
            SearchError::config(format!("cannot parse attribute index {token:?}"))
        })?,
    };
    if value == 0 || value > upper {
        return Err(SearchError::config(format!(
            "attribute index {value} outside 1..={upper}"
        )));
    }
    Ok(value)
}
