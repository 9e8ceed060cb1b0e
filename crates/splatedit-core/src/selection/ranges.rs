//! Run-length packed index sets
//!
//! A [`SelectionSet`] stores a subset of `[0, total)` as a flat `u32` buffer
//! parsed left to right. Each entry is either
//!
//! - a **single** index: one word with the top bit set, index in the low 31 bits
//! - a **range**: a header word (top bit clear) holding the start index,
//!   followed by a word holding the run length (always >= 2)
//!
//! Entries are strictly ascending, never overlap and never touch, so every run
//! is maximal. Storage is proportional to the number of runs, not the number of
//! selected indices, which keeps spatially coherent selections tiny.
//!
//! When written out, the buffer is a sequence of little-endian `u32` words in
//! natural order.

use std::iter::FusedIterator;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::predicate::IndexPredicate;
use crate::error::SelectionError;

/// Tag bit marking a single-index entry
pub const SINGLE_BIT: u32 = 0x8000_0000;

/// Mask extracting the index from a single-index entry
pub const INDEX_MASK: u32 = 0x7FFF_FFFF;

/// Exclusive upper bound of the index domain
pub const MAX_DOMAIN: usize = 1 << 31;

/// Domains at least this large are logged when encoded
const LARGE_DOMAIN: usize = 1 << 20;

/// One decoded entry of a packed selection buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RangeEntry {
    /// A lone index
    Single(u32),
    /// `length` consecutive indices starting at `start`
    Range { start: u32, length: u32 },
}

impl RangeEntry {
    /// Entry covering `length` indices from `start`; `length` must be non-zero
    pub fn run(start: u32, length: u32) -> Self {
        debug_assert!(length > 0);
        if length == 1 {
            RangeEntry::Single(start)
        } else {
            RangeEntry::Range { start, length }
        }
    }

    /// First index covered
    pub fn start(&self) -> u32 {
        match *self {
            RangeEntry::Single(index) => index,
            RangeEntry::Range { start, .. } => start,
        }
    }

    /// Number of indices covered
    pub fn length(&self) -> u32 {
        match *self {
            RangeEntry::Single(_) => 1,
            RangeEntry::Range { length, .. } => length,
        }
    }

    /// One past the last index covered
    pub fn end(&self) -> u32 {
        self.start() + self.length()
    }

    /// Indices covered
    pub fn indices(&self) -> Range<u32> {
        self.start()..self.end()
    }

    /// Words this entry occupies in a packed buffer
    pub fn word_count(&self) -> usize {
        match self {
            RangeEntry::Single(_) => 1,
            RangeEntry::Range { .. } => 2,
        }
    }

    /// Append the packed form of this entry
    pub fn encode(&self, words: &mut Vec<u32>) {
        match *self {
            RangeEntry::Single(index) => words.push(index | SINGLE_BIT),
            RangeEntry::Range { start, length } => {
                words.push(start);
                words.push(length);
            }
        }
    }

    /// Decode the entry at the front of `words`, returning it and the words consumed
    ///
    /// Returns `None` for an empty slice or a range header missing its length word.
    pub fn decode(words: &[u32]) -> Option<(Self, usize)> {
        let &word = words.first()?;
        if word & SINGLE_BIT != 0 {
            Some((RangeEntry::Single(word & INDEX_MASK), 1))
        } else {
            let &length = words.get(1)?;
            Some((RangeEntry::Range { start: word, length }, 2))
        }
    }
}

fn emit(words: &mut Vec<u32>, start: usize, length: usize) {
    RangeEntry::run(start as u32, length as u32).encode(words);
}

/// Immutable, run-length packed set of point indices
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct SelectionSet {
    words: Vec<u32>,
}

impl SelectionSet {
    /// The empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `[0, total)` once in ascending order, keeping indices where `predicate` holds
    ///
    /// The predicate is called exactly once per index and consumed by the scan.
    /// Runs in O(total); the result holds one or two words per maximal run.
    pub fn from_predicate<P>(total: usize, mut predicate: P) -> Result<Self, SelectionError>
    where
        P: IndexPredicate,
    {
        if total > MAX_DOMAIN {
            return Err(SelectionError::InvalidArgument(format!(
                "domain of {} indices exceeds the 31-bit limit of {}",
                total, MAX_DOMAIN
            )));
        }

        let mut words = Vec::new();
        let mut run_start = None;

        for i in 0..total {
            if predicate.test(i) {
                if run_start.is_none() {
                    run_start = Some(i);
                }
            } else if let Some(start) = run_start.take() {
                emit(&mut words, start, i - start);
            }
        }
        if let Some(start) = run_start {
            emit(&mut words, start, total - start);
        }

        if total >= LARGE_DOMAIN {
            tracing::debug!(total, words = words.len(), "Encoded selection");
        }

        Ok(Self { words })
    }

    /// Build from an ascending, duplicate-free index list
    pub fn from_sorted_indices(ids: &[u32]) -> Result<Self, SelectionError> {
        let mut words = Vec::new();
        let mut run: Option<(u32, u32)> = None;

        for (position, &id) in ids.iter().enumerate() {
            if id > INDEX_MASK {
                return Err(SelectionError::InvalidArgument(format!(
                    "index {} exceeds the 31-bit limit",
                    id
                )));
            }

            run = match run {
                None => Some((id, 1)),
                Some((start, length)) => {
                    let previous = start + length - 1;
                    if id <= previous {
                        return Err(SelectionError::UnsortedIds {
                            position,
                            previous,
                            current: id,
                        });
                    }
                    if id == previous + 1 {
                        Some((start, length + 1))
                    } else {
                        RangeEntry::run(start, length).encode(&mut words);
                        Some((id, 1))
                    }
                }
            };
        }
        if let Some((start, length)) = run {
            RangeEntry::run(start, length).encode(&mut words);
        }

        Ok(Self { words })
    }

    /// Adopt an already packed buffer after checking its invariants
    pub fn from_words(words: Vec<u32>) -> Result<Self, SelectionError> {
        let malformed =
            |offset: usize, reason: String| SelectionError::MalformedBuffer { offset, reason };

        let mut offset = 0;
        let mut previous_end: Option<u64> = None;

        while offset < words.len() {
            let (entry, consumed) = RangeEntry::decode(&words[offset..]).ok_or_else(|| {
                malformed(offset, "range header without a length word".to_string())
            })?;

            if let RangeEntry::Range { length, .. } = entry {
                if length < 2 {
                    return Err(malformed(
                        offset + 1,
                        format!("range length {} below 2", length),
                    ));
                }
            }

            let start = u64::from(entry.start());
            let end = start + u64::from(entry.length());
            if end > MAX_DOMAIN as u64 {
                return Err(malformed(
                    offset,
                    "run extends past the 31-bit index domain".to_string(),
                ));
            }

            if let Some(previous_end) = previous_end {
                if start < previous_end {
                    return Err(malformed(
                        offset,
                        "entries overlap or are out of order".to_string(),
                    ));
                }
                if start == previous_end {
                    return Err(malformed(
                        offset,
                        "entry continues the previous run".to_string(),
                    ));
                }
            }

            previous_end = Some(end);
            offset += consumed;
        }

        Ok(Self { words })
    }

    /// Decode a little-endian word buffer
    pub fn from_le_bytes(bytes: &[u8]) -> Result<Self, SelectionError> {
        if bytes.len() % 4 != 0 {
            return Err(SelectionError::MalformedBuffer {
                offset: bytes.len() / 4,
                reason: format!("{} bytes is not a whole number of words", bytes.len()),
            });
        }

        let words = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Self::from_words(words)
    }

    /// Encode as little-endian words
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    /// Whether no index is selected
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Number of selected indices
    pub fn len(&self) -> usize {
        self.entries().map(|e| e.length() as usize).sum()
    }

    /// Number of maximal runs
    pub fn run_count(&self) -> usize {
        self.entries().count()
    }

    /// The packed buffer
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Whether `index` is selected
    ///
    /// Walks the runs in order and stops at the first one starting past
    /// `index`. The packed words are not randomly addressable (an unflagged
    /// word is either a range start or a length), so there is no binary search.
    pub fn contains(&self, index: usize) -> bool {
        for entry in self.entries() {
            let start = entry.start() as usize;
            if index < start {
                return false;
            }
            if index < entry.end() as usize {
                return true;
            }
        }
        false
    }

    /// Call `f` with every selected index, ascending
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(usize),
    {
        for entry in self.entries() {
            match entry {
                RangeEntry::Single(index) => f(index as usize),
                RangeEntry::Range { start, length } => {
                    for i in start..start + length {
                        f(i as usize);
                    }
                }
            }
        }
    }

    /// Iterate the decoded entries
    pub fn entries(&self) -> Entries<'_> {
        Entries { words: &self.words }
    }

    /// Iterate selected indices, ascending
    pub fn iter(&self) -> Indices<'_> {
        Indices {
            entries: self.entries(),
            current: 0..0,
        }
    }
}

impl TryFrom<Vec<u32>> for SelectionSet {
    type Error = SelectionError;

    fn try_from(words: Vec<u32>) -> Result<Self, Self::Error> {
        Self::from_words(words)
    }
}

impl From<SelectionSet> for Vec<u32> {
    fn from(set: SelectionSet) -> Self {
        set.words
    }
}

impl<'a> IntoIterator for &'a SelectionSet {
    type Item = usize;
    type IntoIter = Indices<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the entries of a [`SelectionSet`]
#[derive(Clone, Debug)]
pub struct Entries<'a> {
    words: &'a [u32],
}

impl Iterator for Entries<'_> {
    type Item = RangeEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let (entry, consumed) = RangeEntry::decode(self.words)?;
        self.words = &self.words[consumed..];
        Some(entry)
    }
}

impl FusedIterator for Entries<'_> {}

/// Iterator over the selected indices of a [`SelectionSet`]
#[derive(Clone, Debug)]
pub struct Indices<'a> {
    entries: Entries<'a>,
    current: Range<u32>,
}

impl Iterator for Indices<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(index) = self.current.next() {
                return Some(index as usize);
            }
            self.current = self.entries.next()?.indices();
        }
    }
}

impl FusedIterator for Indices<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_runs() {
        let set = SelectionSet::from_predicate(10, |i: usize| matches!(i, 2 | 3 | 4 | 7)).unwrap();

        assert_eq!(set.words(), &[2, 3, 7 | SINGLE_BIT]);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![2, 3, 4, 7]);
        assert_eq!(set.len(), 4);
        assert_eq!(set.run_count(), 2);
        assert!(!set.is_empty());
    }

    #[test]
    fn test_nothing_selected() {
        let set = SelectionSet::from_predicate(100, |_: usize| false).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.words().len(), 0);
        assert_eq!(set.iter().count(), 0);

        let zero_domain = SelectionSet::from_predicate(0, |_: usize| true).unwrap();
        assert!(zero_domain.is_empty());
    }

    #[test]
    fn test_run_open_at_end() {
        let set = SelectionSet::from_predicate(6, |i: usize| i >= 3).unwrap();
        assert_eq!(set.words(), &[3, 3]);

        let last_only = SelectionSet::from_predicate(6, |i: usize| i == 5).unwrap();
        assert_eq!(last_only.words(), &[5 | SINGLE_BIT]);
    }

    #[test]
    fn test_predicate_called_once_ascending() {
        let mut calls = Vec::new();
        SelectionSet::from_predicate(5, |i: usize| {
            calls.push(i);
            i % 2 == 0
        })
        .unwrap();
        assert_eq!(calls, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_domain_too_large() {
        let err = SelectionSet::from_predicate(MAX_DOMAIN + 1, |_: usize| true).unwrap_err();
        assert!(matches!(err, SelectionError::InvalidArgument(_)));
    }

    #[test]
    fn test_entries_are_tagged() {
        let set = SelectionSet::from_words(vec![SINGLE_BIT, 4, 3, 9 | SINGLE_BIT]).unwrap();
        let entries: Vec<RangeEntry> = set.entries().collect();
        assert_eq!(
            entries,
            vec![
                RangeEntry::Single(0),
                RangeEntry::Range { start: 4, length: 3 },
                RangeEntry::Single(9),
            ]
        );

        let mut seen = Vec::new();
        set.for_each(|i| seen.push(i));
        assert_eq!(seen, vec![0, 4, 5, 6, 9]);
    }

    #[test]
    fn test_from_words_rejects_malformed() {
        let cases: Vec<Vec<u32>> = vec![
            vec![4],                              // header without length
            vec![4, 1],                           // range of one
            vec![4, 0],                           // range of zero
            vec![5 | SINGLE_BIT, 2 | SINGLE_BIT], // descending
            vec![2, 4, 3 | SINGLE_BIT],           // overlap
            vec![2, 2, 4 | SINGLE_BIT],           // touching, not maximal
            vec![INDEX_MASK, 2],                  // past the domain
        ];
        for words in cases {
            assert!(
                matches!(
                    SelectionSet::from_words(words.clone()),
                    Err(SelectionError::MalformedBuffer { .. })
                ),
                "accepted {:?}",
                words
            );
        }
    }

    #[test]
    fn test_from_sorted_indices() {
        let set = SelectionSet::from_sorted_indices(&[0, 1, 2, 5, 9, 10]).unwrap();
        assert_eq!(set.words(), &[0, 3, 5 | SINGLE_BIT, 9, 2]);

        assert_eq!(
            SelectionSet::from_sorted_indices(&[1, 3, 3]).unwrap_err(),
            SelectionError::UnsortedIds {
                position: 2,
                previous: 3,
                current: 3
            }
        );
        assert!(SelectionSet::from_sorted_indices(&[SINGLE_BIT]).is_err());
        assert!(SelectionSet::from_sorted_indices(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_contains() {
        let set = SelectionSet::from_sorted_indices(&[2, 3, 4, 7]).unwrap();
        let hits: Vec<usize> = (0..10).filter(|&i| set.contains(i)).collect();
        assert_eq!(hits, vec![2, 3, 4, 7]);
    }

    #[test]
    fn test_contains_run_boundaries() {
        let set = SelectionSet::from_words(vec![0, 2, 5 | SINGLE_BIT, 9, 4]).unwrap();
        for (index, expected) in [
            (0, true),
            (1, true),
            (2, false),
            (5, true),
            (8, false),
            (9, true),
            (12, true),
            (13, false),
            (MAX_DOMAIN, false),
        ] {
            assert_eq!(set.contains(index), expected, "index {}", index);
        }
        assert!(!SelectionSet::new().contains(0));
    }

    #[test]
    fn test_le_bytes() {
        let set = SelectionSet::from_sorted_indices(&[2, 3, 4, 7]).unwrap();
        let bytes = set.to_le_bytes();
        assert_eq!(bytes, vec![2, 0, 0, 0, 3, 0, 0, 0, 7, 0, 0, 0x80]);
        assert_eq!(SelectionSet::from_le_bytes(&bytes).unwrap(), set);
        assert!(SelectionSet::from_le_bytes(&bytes[..5]).is_err());
    }

    #[test]
    fn test_serde_validates() {
        let set = SelectionSet::from_sorted_indices(&[1, 2, 8]).unwrap();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, format!("[1,2,{}]", 8 | SINGLE_BIT));
        assert_eq!(serde_json::from_str::<SelectionSet>(&json).unwrap(), set);

        assert!(serde_json::from_str::<SelectionSet>("[4,1]").is_err());
    }
}
