//! # Acknowledged Byte Ranges
//!
//! Coalescing interval set over a stream's outgoing byte offsets. Ranges are
//! half-open `[start, end)`, pairwise disjoint and never adjacent: an
//! insertion touching an existing range merges with it. Acknowledgments are
//! never retracted, so the set only grows.
//!
//! ```text
//! record(0, 10)   →  [0..10)
//! record(20, 5)   →  [0..10) [20..25)
//! record(10, 10)  →  [0..25)
//! ```

#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::ops::Range;

/// Set of acknowledged stream byte ranges plus the FIN acknowledgment.
#[derive(Debug, Clone, Default)]
pub struct AckRangeSet {
    /// start → end (exclusive)
    ranges: BTreeMap<u64, u64>,
    fin_acked: bool,
}

impl AckRangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `[offset, offset + len)` as acknowledged.
    pub fn record(&mut self, offset: u64, len: u64) {
        if len == 0 {
            return;
        }
        let mut start = offset;
        let mut end = offset.saturating_add(len);

        // Absorb a range that starts at or before us and reaches us.
        let prev = self.ranges.range(..=start).next_back().map(|(&s, &e)| (s, e));
        if let Some((s, e)) = prev {
            if e >= start {
                if e >= end {
                    return;
                }
                start = s;
                self.ranges.remove(&s);
            }
        }

        // Absorb every range starting inside or right after us.
        loop {
            let next = self.ranges.range(start..=end).next().map(|(&s, &e)| (s, e));
            let Some((s, e)) = next else {
                break;
            };
            end = end.max(e);
            self.ranges.remove(&s);
        }

        self.ranges.insert(start, end);
    }

    /// True if every byte of `[offset, offset + len)` is acknowledged.
    pub fn covers(&self, offset: u64, len: u64) -> bool {
        if len == 0 {
            return true;
        }
        match self.ranges.range(..=offset).next_back() {
            Some((_, &e)) => e >= offset.saturating_add(len),
            None => false,
        }
    }

    /// The unacknowledged range containing `offset`, or the first one after
    /// it when `offset` is acknowledged.
    ///
    /// `start` may lie below `offset`; `end` is the start of the next
    /// acknowledged range, or `u64::MAX` if there is none.
    pub fn gap_after(&self, offset: u64) -> Range<u64> {
        let start = match self.ranges.range(..=offset).next_back() {
            Some((_, &e)) => e,
            None => 0,
        };
        let end = match self.ranges.range(start..).next() {
            Some((&s, _)) => s,
            None => u64::MAX,
        };
        start..end
    }

    /// Smallest unacknowledged offset at or after `offset`.
    pub fn first_gap_at_or_after(&self, offset: u64) -> u64 {
        self.gap_after(offset).start.max(offset)
    }

    /// Length of the acknowledged prefix of the stream.
    pub fn acked_offset(&self) -> u64 {
        self.first_gap_at_or_after(0)
    }

    pub fn mark_fin_acked(&mut self) {
        self.fin_acked = true;
    }

    pub fn fin_acked(&self) -> bool {
        self.fin_acked
    }

    /// Number of disjoint acknowledged ranges.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Acknowledged ranges in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Range<u64>> + '_ {
        self.ranges.iter().map(|(&s, &e)| s..e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(set: &AckRangeSet) -> Vec<Range<u64>> {
        set.iter().collect()
    }

    #[test]
    fn test_record_coalesces() {
        let mut set = AckRangeSet::new();
        set.record(0, 10);
        set.record(20, 5);
        assert_eq!(ranges(&set), vec![0..10, 20..25]);

        set.record(10, 10);
        assert_eq!(ranges(&set), vec![0..25]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_record_spanning_several() {
        let mut set = AckRangeSet::new();
        set.record(10, 5);
        set.record(20, 5);
        set.record(30, 5);
        set.record(12, 20);
        assert_eq!(ranges(&set), vec![10..35]);
    }

    #[test]
    fn test_record_contained_and_zero_len() {
        let mut set = AckRangeSet::new();
        set.record(0, 100);
        set.record(10, 10);
        set.record(200, 0);
        assert_eq!(ranges(&set), vec![0..100]);
    }

    #[test]
    fn test_covers() {
        let mut set = AckRangeSet::new();
        set.record(10, 10);
        assert!(set.covers(10, 10));
        assert!(set.covers(12, 3));
        assert!(!set.covers(9, 2));
        assert!(!set.covers(15, 6));
        assert!(set.covers(500, 0));
    }

    #[test]
    fn test_gap_after() {
        let mut set = AckRangeSet::new();
        assert_eq!(set.gap_after(7), 0..u64::MAX);

        set.record(130, 1);
        assert_eq!(set.gap_after(0), 0..130);
        assert_eq!(set.gap_after(128), 0..130);
        assert_eq!(set.gap_after(130), 131..u64::MAX);

        set.record(0, 12);
        assert_eq!(set.gap_after(5), 12..130);
        assert_eq!(set.first_gap_at_or_after(5), 12);
        assert_eq!(set.first_gap_at_or_after(40), 40);
        assert_eq!(set.acked_offset(), 12);
    }

    #[test]
    fn test_fin_acked() {
        let mut set = AckRangeSet::new();
        assert!(!set.fin_acked());
        set.mark_fin_acked();
        assert!(set.fin_acked());
        assert!(set.is_empty());
    }
}
