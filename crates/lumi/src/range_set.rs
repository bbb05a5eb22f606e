use arrow_buffer::BooleanBuffer;
use std::fmt::{Display, Formatter};
use tnp_primitives::{LumiBlock, LumiRange};


/// Certified luminosity blocks of a single run.
///
/// Every inclusive range `[first, last]` is stored as a half-open boundary pair
/// `(first - 1, last]`. After sorting, the boundaries alternate between
/// excluded and included ends, so a lumi block is certified iff the number of
/// boundaries strictly below it is odd.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct RangeSet {
    boundaries: Vec<i64>
}


#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum InvalidRange {
    Reversed(LumiRange),
    Overlap(LumiRange, LumiRange)
}


impl InvalidRange {
    pub fn range(&self) -> LumiRange {
        match self {
            InvalidRange::Reversed(range) => *range,
            InvalidRange::Overlap(range, _) => *range
        }
    }
}


impl Display for InvalidRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidRange::Reversed(_) => write!(f, "has its first lumi block after the last one"),
            InvalidRange::Overlap(_, other) => write!(f, "overlaps with {}", other)
        }
    }
}


impl std::error::Error for InvalidRange {}


impl TryFrom<Vec<LumiRange>> for RangeSet {
    type Error = InvalidRange;

    fn try_from(mut ranges: Vec<LumiRange>) -> Result<Self, Self::Error> {
        if let Some(r) = ranges.iter().find(|r| !r.is_valid()) {
            return Err(InvalidRange::Reversed(*r))
        }
        ranges.sort_unstable();
        for i in 1..ranges.len() {
            let prev = &ranges[i - 1];
            let current = &ranges[i];
            if prev.overlaps(current) {
                return Err(InvalidRange::Overlap(*current, *prev))
            }
        }
        Ok(Self::new_unchecked(ranges))
    }
}


impl RangeSet {
    /// Builds the set without validating the input.
    ///
    /// Reversed or overlapping ranges never panic, but the resulting membership
    /// answers for them are unspecified.
    pub fn new_unchecked<I: IntoIterator<Item = LumiRange>>(ranges: I) -> Self {
        let mut boundaries: Vec<i64> = ranges.into_iter()
            .flat_map(|r| [r.first as i64 - 1, r.last as i64])
            .collect();
        boundaries.sort_unstable();
        Self {
            boundaries
        }
    }

    pub fn boundaries(&self) -> &[i64] {
        &self.boundaries
    }

    /// Number of certified ranges
    pub fn len(&self) -> usize {
        self.boundaries.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    /// Certified ranges in ascending order
    pub fn ranges(&self) -> impl Iterator<Item = LumiRange> + '_ {
        self.boundaries.chunks_exact(2).map(|pair| {
            LumiRange::new((pair[0] + 1) as LumiBlock, pair[1] as LumiBlock)
        })
    }

    #[inline]
    pub fn contains(&self, lumi: LumiBlock) -> bool {
        let lumi = lumi as i64;
        self.boundaries.partition_point(|b| *b < lumi) & 1 == 1
    }

    pub fn query(&self, lumi: &[LumiBlock]) -> Vec<bool> {
        lumi.iter().map(|l| self.contains(*l)).collect()
    }

    pub fn query_buffer(&self, lumi: &[LumiBlock]) -> BooleanBuffer {
        BooleanBuffer::collect_bool(lumi.len(), |i| self.contains(lumi[i]))
    }
}


#[cfg(test)]
mod tests {
    use super::{InvalidRange, RangeSet};
    use tnp_primitives::LumiRange;


    fn range_set(ranges: &[(u32, u32)]) -> RangeSet {
        let ranges = ranges.iter().copied().map(LumiRange::from).collect::<Vec<_>>();
        RangeSet::try_from(ranges).unwrap()
    }

    #[test]
    fn half_open_boundaries() {
        let set = range_set(&[(5, 9)]);
        assert_eq!(set.boundaries(), &[4, 9]);
        assert_eq!(set.query(&[4, 5, 9, 10]), vec![false, true, true, false]);
    }

    #[test]
    fn multi_range_run() {
        let set = range_set(&[(20, 25), (10, 12)]);
        assert_eq!(set.boundaries(), &[9, 12, 19, 25]);
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.query(&[9, 10, 12, 13, 19, 20, 25, 26]),
            vec![false, true, true, false, false, true, true, false]
        );
    }

    #[test]
    fn touching_ranges() {
        let set = range_set(&[(1, 5), (6, 8)]);
        assert_eq!(
            set.query(&[0, 1, 5, 6, 8, 9]),
            vec![false, true, true, true, true, false]
        );
    }

    #[test]
    fn lumi_block_zero() {
        let set = range_set(&[(0, 2)]);
        assert_eq!(set.boundaries(), &[-1, 2]);
        assert!(set.contains(0));
        assert!(!set.contains(3));
    }

    #[test]
    fn extreme_lumi_block() {
        let set = range_set(&[(u32::MAX - 1, u32::MAX)]);
        assert!(!set.contains(u32::MAX - 2));
        assert!(set.contains(u32::MAX));
    }

    #[test]
    fn empty_set_rejects_everything() {
        let set = RangeSet::default();
        assert!(set.is_empty());
        assert_eq!(set.query(&[0, 1, u32::MAX]), vec![false, false, false]);
    }

    #[test]
    fn ranges_round_trip_sorted() {
        let set = range_set(&[(8, 12), (1, 5)]);
        let ranges: Vec<_> = set.ranges().collect();
        assert_eq!(ranges, vec![LumiRange::new(1, 5), LumiRange::new(8, 12)]);
    }

    #[test]
    fn rejects_reversed_range() {
        let err = RangeSet::try_from(vec![LumiRange::new(1, 2), LumiRange::new(7, 3)]).unwrap_err();
        assert_eq!(err, InvalidRange::Reversed(LumiRange::new(7, 3)));
    }

    #[test]
    fn rejects_overlap() {
        let err = RangeSet::try_from(vec![LumiRange::new(3, 8), LumiRange::new(1, 5)]).unwrap_err();
        assert_eq!(err, InvalidRange::Overlap(LumiRange::new(3, 8), LumiRange::new(1, 5)));
        assert_eq!(err.range(), LumiRange::new(3, 8));
    }

    #[test]
    fn unchecked_overlap_does_not_panic() {
        let set = RangeSet::new_unchecked([LumiRange::new(1, 5), LumiRange::new(3, 8), LumiRange::new(9, 2)]);
        let _ = set.query(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        let _ = set.ranges().count();
    }

    #[test]
    fn query_buffer_matches_query() {
        let set = range_set(&[(10, 12), (20, 25)]);
        let lumi = [9, 10, 12, 13, 19, 20, 25, 26];
        let buf = set.query_buffer(&lumi);
        assert_eq!(buf.iter().collect::<Vec<_>>(), set.query(&lumi));
    }
}
