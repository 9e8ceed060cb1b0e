//! Membership predicates for ascending scans
//!
//! [`SelectionSet::from_predicate`](super::SelectionSet::from_predicate) asks
//! its predicate about every index of the domain exactly once, in ascending
//! order, and takes the predicate by value. That contract lets a predicate keep
//! state between calls, as [`SortedIdPredicate`] does with its cursor.

/// A membership test over point indices
pub trait IndexPredicate {
    /// Whether `index` belongs to the set
    fn test(&mut self, index: usize) -> bool;
}

impl<F> IndexPredicate for F
where
    F: FnMut(usize) -> bool,
{
    fn test(&mut self, index: usize) -> bool {
        self(index)
    }
}

/// Cursor-based membership test over an ascending, duplicate-free id list
///
/// Valid for a single scan with strictly increasing queries. Queries that go
/// backwards are a contract breach and panic in debug builds.
#[derive(Debug)]
pub struct SortedIdPredicate<'a> {
    ids: &'a [u32],
    cursor: usize,
    last_query: Option<usize>,
}

impl<'a> SortedIdPredicate<'a> {
    /// Wrap a sorted id list
    pub fn new(ids: &'a [u32]) -> Self {
        debug_assert!(
            ids.windows(2).all(|w| w[0] < w[1]),
            "ids must be strictly ascending"
        );
        Self {
            ids,
            cursor: 0,
            last_query: None,
        }
    }

    /// Ids not yet matched
    pub fn remaining(&self) -> &'a [u32] {
        &self.ids[self.cursor..]
    }
}

impl IndexPredicate for SortedIdPredicate<'_> {
    fn test(&mut self, index: usize) -> bool {
        debug_assert!(
            self.last_query.map_or(true, |last| index > last),
            "SortedIdPredicate queried out of order: {} after {:?}",
            index,
            self.last_query
        );
        self.last_query = Some(index);

        match self.ids.get(self.cursor) {
            Some(&id) if id as usize == index => {
                self.cursor += 1;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_advances_on_match() {
        let ids = [1, 4, 5];
        let mut pred = SortedIdPredicate::new(&ids);

        let hits: Vec<bool> = (0..7).map(|i| pred.test(i)).collect();
        assert_eq!(hits, vec![false, true, false, false, true, true, false]);
        assert!(pred.remaining().is_empty());
    }

    #[test]
    fn test_skipped_queries_do_not_advance() {
        let ids = [2, 3];
        let mut pred = SortedIdPredicate::new(&ids);

        // 2 is never asked, so 3 cannot match either
        assert!(!pred.test(0));
        assert!(!pred.test(3));
        assert_eq!(pred.remaining(), &[2, 3]);
    }

    #[test]
    fn test_closure_predicate() {
        let mut even = |i: usize| i % 2 == 0;
        assert!(IndexPredicate::test(&mut even, 4));
        assert!(!IndexPredicate::test(&mut even, 5));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "out of order")]
    fn test_out_of_order_query_panics() {
        let ids = [1, 2];
        let mut pred = SortedIdPredicate::new(&ids);
        pred.test(2);
        pred.test(1);
    }
}
