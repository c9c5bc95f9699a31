use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

use crate::error::{Error, Result};
use crate::prefix_doubling;
use crate::searchable::{Probe, Searchable};
use crate::util::MemoryUsage;

/// A suffix table is a text together with its lexicographically sorted suffixes.
///
/// The text is expected to end with a sentinel byte smaller than every other
/// byte; [`Searchable::find`] uses it to tell exact hits from partial ones.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SuffixTable<T = Box<[u8]>, U = Box<[usize]>> {
    text: T,
    table: U,
}

/// Methods for vanilla in-memory suffix tables
impl SuffixTable<Box<[u8]>, Box<[usize]>> {
    /// Creates a new suffix table for `text` in `O(n log n)` time and `O(n)`
    /// space using prefix doubling.
    pub fn new<S>(src: S) -> Self
    where
        S: Into<Box<[u8]>>,
    {
        let text = src.into();
        let table = prefix_doubling::suffix_array(&text);
        log::info!("built suffix array over {} bytes", text.len());

        SuffixTable {
            text,
            table: table.into(),
        }
    }

    /// Builds the table by sorting suffixes directly. Slow; used as a reference.
    pub fn new_naive<S>(src: S) -> Self
    where
        S: Into<Box<[u8]>>,
    {
        let text = src.into();
        let mut table: Vec<usize> = (0..text.len()).collect();
        table.sort_by(|&a, &b| text[a..].cmp(&text[b..]));

        SuffixTable {
            text,
            table: table.into(),
        }
    }
}

impl<T, U> SuffixTable<T, U>
where
    T: Deref<Target = [u8]> + Sync,
    U: Deref<Target = [usize]> + Sync,
{
    /// Pairs a text with a previously computed suffix array.
    ///
    /// Only the lengths are checked; use [`SuffixTable::is_sorted`] to
    /// validate the order.
    pub fn from_parts(text: T, table: U) -> Result<Self> {
        if text.len() != table.len() {
            return Err(Error::SizeMismatch {
                text: text.len(),
                table: table.len(),
            });
        }
        Ok(SuffixTable { text, table })
    }

    #[inline]
    pub fn text(&self) -> &[u8] {
        &self.text
    }

    #[inline]
    pub fn table(&self) -> &[usize] {
        &self.table
    }

    /// Returns the number of suffixes in the table.
    ///
    /// Alternatively, this is the number of *bytes* in the text.
    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` iff `self.len() == 0`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks if the suffix table is a lexicographically sorted permutation of
    /// the text offsets. This is always true for tables built by [`SuffixTable::new`].
    pub fn is_sorted(&self) -> bool {
        let n = self.text.len();
        let mut seen = vec![false; n];
        for &pos in self.table.iter() {
            if pos >= n || std::mem::replace(&mut seen[pos], true) {
                return false;
            }
        }
        self.table
            .par_windows(2)
            .all(|pair| self.text[pair[0]..] <= self.text[pair[1]..])
    }

    /// Returns the suffix at rank `i`.
    #[inline]
    pub fn suffix(&self, i: usize) -> &[u8] {
        &self.text[self.table[i]..]
    }

    /// Returns true if and only if `query` is in text.
    ///
    /// This runs in `O(mlogn)` time, where `m == query.len()` and
    /// `n == self.len()`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use psiarray::SuffixTable;
    ///
    /// let sa = SuffixTable::new(&b"The quick brown fox.\x03"[..]);
    /// assert!(sa.contains(b"quick"));
    /// ```
    pub fn contains(&self, query: &[u8]) -> bool {
        !query.is_empty()
            && self
                .table
                .binary_search_by(|&sufi| {
                    self.text[sufi..]
                        .iter()
                        .take(query.len())
                        .cmp(query.iter())
                })
                .is_ok()
    }

    /// Returns an unordered list of positions where `query` starts in `text`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use psiarray::SuffixTable;
    ///
    /// let sa = SuffixTable::new(&b"The quick brown fox was very quick.\x03"[..]);
    /// assert_eq!(sa.positions(b"quick"), &[4, 29]);
    /// ```
    pub fn positions(&self, query: &[u8]) -> &[usize] {
        let (start, end) = self.boundaries(query);
        &self.table[start..end]
    }

    /// Determine start and end `table` indices of items that start with `query`.
    pub fn boundaries(&self, query: &[u8]) -> (usize, usize) {
        if self.text.is_empty() || query.is_empty() {
            return (0, 0);
        }

        let start = binary_search(&self.table, |&sufi| query <= &self.text[sufi..]);
        let end = start
            + binary_search(&self.table[start..], |&sufi| {
                !self.text[sufi..].starts_with(query)
            });

        (start, end)
    }

    pub fn memory_usage(&self) -> MemoryUsage {
        MemoryUsage::of_slice(&self.table)
    }

    /// Gets breakdowns of memory usages for components.
    pub fn memory_statistics(&self) -> serde_json::Value {
        serde_json::json!({
            "text": MemoryUsage::of_slice(&self.text),
            "table": self.memory_usage(),
        })
    }
}

impl<T, U> Searchable for SuffixTable<T, U>
where
    T: Deref<Target = [u8]> + Sync,
    U: Deref<Target = [usize]> + Sync,
{
    fn num_suffixes(&self) -> usize {
        self.len()
    }

    /// Compares the suffix at `rank` byte by byte with `query`.
    ///
    /// When the query is exhausted first the hit is exact if nothing but the
    /// sentinel follows, e.g. `ippi$` against `ippi`, and partial otherwise,
    /// e.g. `ippi$` against `ipp`.
    fn probe(&self, rank: usize, query: &[u8]) -> Result<Probe> {
        let pos = self.table[rank];
        let suffix = self
            .text
            .get(pos..)
            .ok_or(Error::InvalidSuffixArray { rank })?;
        for (&s, &q) in suffix.iter().zip(query) {
            if s != q {
                return Ok(if s < q { Probe::Less } else { Probe::Greater });
            }
        }
        if query.len() > suffix.len() {
            return Ok(Probe::Less);
        }
        Ok(if pos + query.len() + 1 < self.text.len() {
            Probe::Partial
        } else {
            Probe::Exact
        })
    }

    fn locate(&self, rank: usize) -> Result<usize> {
        Ok(self.table[rank])
    }
}

impl<T, U> fmt::Debug for SuffixTable<T, U>
where
    T: Deref<Target = [u8]>,
    U: Deref<Target = [usize]>,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "\n-----------------------------------------")?;
        writeln!(f, "SUFFIX TABLE")?;
        for (rank, &sufstart) in self.table.iter().enumerate() {
            writeln!(
                f,
                "suffix[{}] {} {}",
                rank,
                sufstart,
                String::from_utf8_lossy(&self.text[sufstart..])
            )?;
        }
        writeln!(f, "-----------------------------------------")
    }
}

/// Binary search to find first element such that `pred(T) == true`.
///
/// Assumes that if `pred(xs[i]) == true` then `pred(xs[i+1]) == true`.
///
/// If all elements yield `pred(T) == false`, then `xs.len()` is returned.
fn binary_search<T, F>(xs: &[T], mut pred: F) -> usize
where
    F: FnMut(&T) -> bool,
{
    let (mut left, mut right) = (0, xs.len());
    while left < right {
        let mid = (left + right) / 2;
        if pred(&xs[mid]) {
            right = mid;
        } else {
            left = mid + 1;
        }
    }
    left
}
