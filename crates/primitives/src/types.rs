use std::fmt::{Display, Formatter};


pub type RunNumber = u32;
pub type LumiBlock = u32;


/// Inclusive range of luminosity blocks `[first, last]`.
///
/// Serialized as a two element array, the way certification documents spell it.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "[LumiBlock; 2]", into = "[LumiBlock; 2]"))]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct LumiRange {
    pub first: LumiBlock,
    pub last: LumiBlock
}


impl LumiRange {
    pub fn new(first: LumiBlock, last: LumiBlock) -> Self {
        Self {
            first,
            last
        }
    }

    pub fn is_valid(&self) -> bool {
        self.first <= self.last
    }

    #[inline]
    pub fn contains(&self, lumi: LumiBlock) -> bool {
        self.first <= lumi && lumi <= self.last
    }

    pub fn overlaps(&self, other: &LumiRange) -> bool {
        self.first <= other.last && other.first <= self.last
    }
}


impl From<[LumiBlock; 2]> for LumiRange {
    fn from([first, last]: [LumiBlock; 2]) -> Self {
        Self::new(first, last)
    }
}


impl From<(LumiBlock, LumiBlock)> for LumiRange {
    fn from((first, last): (LumiBlock, LumiBlock)) -> Self {
        Self::new(first, last)
    }
}


impl From<LumiRange> for [LumiBlock; 2] {
    fn from(range: LumiRange) -> Self {
        [range.first, range.last]
    }
}


impl Display for LumiRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.first, self.last)
    }
}
