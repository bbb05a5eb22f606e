use crate::certification::{parse_certification_document, read_certification_document, read_certification_file, CertificationDocument};
use crate::error::{ensure_same_len, MalformedCertification};
use crate::range_set::RangeSet;
use rayon::prelude::*;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};
use tnp_primitives::{LumiBlock, LumiRange, RunNumber};


/// Registry of certified lumi ranges for every run of a certification document.
///
/// Runs missing from the document are never certified.
#[derive(Debug, Clone, Default)]
pub struct LumiMask {
    runs: HashMap<RunNumber, RangeSet>
}


impl LumiMask {
    pub fn new(document: CertificationDocument) -> anyhow::Result<Self> {
        let mut runs = HashMap::with_capacity(document.len());
        for (run, ranges) in document {
            let set = RangeSet::try_from(ranges).map_err(|err| {
                let range = err.range();
                MalformedCertification {
                    run,
                    first: range.first as i64,
                    last: range.last as i64,
                    reason: err.to_string()
                }
            })?;
            runs.insert(run, set);
        }
        let mask = Self {
            runs
        };
        debug!(
            runs = mask.num_runs(),
            ranges = mask.num_ranges(),
            "built certification mask"
        );
        Ok(mask)
    }

    /// Builds the mask without validating ranges. See [`RangeSet::new_unchecked`].
    pub fn new_unchecked<I, R>(document: I) -> Self
    where
        I: IntoIterator<Item = (RunNumber, R)>,
        R: IntoIterator<Item = LumiRange>
    {
        Self {
            runs: document.into_iter()
                .map(|(run, ranges)| (run, RangeSet::new_unchecked(ranges)))
                .collect()
        }
    }

    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        Self::new(parse_certification_document(json)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> anyhow::Result<Self> {
        Self::new(read_certification_document(reader)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let mask = Self::new(read_certification_file(path)?)?;
        info!(
            path = %path.display(),
            runs = mask.num_runs(),
            ranges = mask.num_ranges(),
            "loaded certification mask"
        );
        Ok(mask)
    }

    pub fn get(&self, run: RunNumber) -> Option<&RangeSet> {
        self.runs.get(&run)
    }

    pub fn num_runs(&self) -> usize {
        self.runs.len()
    }

    pub fn num_ranges(&self) -> usize {
        self.runs.values().map(|set| set.len()).sum()
    }

    /// Certified run numbers in ascending order
    pub fn runs(&self) -> Vec<RunNumber> {
        let mut runs: Vec<_> = self.runs.keys().copied().collect();
        runs.sort_unstable();
        runs
    }

    /// Converts the mask back into the document it was built from, with sorted ranges.
    pub fn to_document(&self) -> CertificationDocument {
        self.runs.iter()
            .map(|(run, set)| (*run, set.ranges().collect()))
            .collect()
    }

    #[inline]
    pub fn contains(&self, run: RunNumber, lumi: LumiBlock) -> bool {
        self.runs.get(&run).map_or(false, |set| set.contains(lumi))
    }

    pub fn classify_single_run(&self, run: RunNumber, lumi: &[LumiBlock]) -> Vec<bool> {
        match self.runs.get(&run) {
            Some(set) => set.query(lumi),
            None => vec![false; lumi.len()]
        }
    }

    /// Tells for every event `i` whether `(run[i], lumi[i])` is certified.
    ///
    /// Rows are grouped by run, so each run's range set is looked up once per
    /// batch regardless of how the rows are ordered.
    pub fn classify(&self, run: &[RunNumber], lumi: &[LumiBlock]) -> anyhow::Result<Vec<bool>> {
        ensure_same_len(run.len(), lumi.len())?;
        let mut mask = vec![false; run.len()];
        let order = group_by_run(run);
        for group in order.chunk_by(|a, b| run[*a] == run[*b]) {
            if let Some(set) = self.runs.get(&run[group[0]]) {
                for &i in group {
                    mask[i] = set.contains(lumi[i]);
                }
            }
        }
        Ok(mask)
    }

    /// Same as [`LumiMask::classify`], but run groups are classified on the rayon pool.
    pub fn classify_par(&self, run: &[RunNumber], lumi: &[LumiBlock]) -> anyhow::Result<Vec<bool>> {
        ensure_same_len(run.len(), lumi.len())?;
        let mut order: Vec<usize> = (0..run.len()).collect();
        order.par_sort_unstable_by_key(|i| run[*i]);

        let groups: Vec<&[usize]> = order.chunk_by(|a, b| run[*a] == run[*b]).collect();
        let results: Vec<(&[usize], Vec<bool>)> = groups.into_par_iter().filter_map(|group| {
            let set = self.runs.get(&run[group[0]])?;
            let bits = group.iter().map(|i| set.contains(lumi[*i])).collect();
            Some((group, bits))
        }).collect();

        let mut mask = vec![false; run.len()];
        for (group, bits) in results {
            for (i, accepted) in group.iter().zip(bits) {
                mask[*i] = accepted;
            }
        }
        Ok(mask)
    }
}


fn group_by_run(run: &[RunNumber]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..run.len()).collect();
    if !run.windows(2).all(|w| w[0] <= w[1]) {
        order.sort_unstable_by_key(|i| run[*i]);
    }
    order
}


#[cfg(test)]
mod tests {
    use super::LumiMask;
    use crate::{LengthMismatch, MalformedCertification};
    use tnp_primitives::LumiRange;


    fn mask(json: &str) -> LumiMask {
        LumiMask::from_json_str(json).unwrap()
    }

    #[test]
    fn half_open_semantics() {
        let mask = mask(r#"{"1": [[10, 20]]}"#);
        let got = mask.classify(&[1, 1, 1, 1], &[9, 10, 20, 21]).unwrap();
        assert_eq!(got, vec![false, true, true, false]);
    }

    #[test]
    fn unknown_run_is_rejected() {
        let mask = mask(r#"{"1": [[1, 10]]}"#);
        assert_eq!(mask.classify(&[999999], &[1]).unwrap(), vec![false]);
        assert_eq!(mask.classify_single_run(999999, &[1, 2, 3]), vec![false, false, false]);
        assert!(!mask.contains(999999, 1));
    }

    #[test]
    fn mixed_run_batch() {
        let mask = mask(r#"{"1": [[1, 10]], "2": [[50, 150]]}"#);
        let got = mask.classify(&[1, 1, 2, 2], &[5, 100, 5, 100]).unwrap();
        assert_eq!(got, vec![true, false, false, true]);
    }

    #[test]
    fn interleaved_runs_keep_row_order() {
        let mask = mask(r#"{"1": [[1, 10]], "2": [[50, 150]]}"#);
        let run = [2, 1, 3, 2, 1, 2];
        let lumi = [60, 5, 5, 10, 11, 150];
        let expected = vec![true, true, false, false, false, true];
        assert_eq!(mask.classify(&run, &lumi).unwrap(), expected);
        assert_eq!(mask.classify_par(&run, &lumi).unwrap(), expected);
    }

    #[test]
    fn end_to_end_document() {
        let mask = LumiMask::from_json_str(r#"{"1": [[1,5]], "2": [[10,10]]}"#).unwrap();
        let got = mask.classify(&[1, 1, 2, 3], &[3, 6, 10, 1]).unwrap();
        assert_eq!(got, vec![true, false, true, false]);
        assert_eq!(mask.runs(), vec![1, 2]);
    }

    #[test]
    fn classify_is_idempotent() {
        let mask = mask(r#"{"5": [[1, 3], [7, 9]]}"#);
        let run = [5, 5, 5, 6];
        let lumi = [2, 5, 8, 2];
        let first = mask.classify(&run, &lumi).unwrap();
        let second = mask.classify(&run, &lumi).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_batch() {
        let mask = mask(r#"{"1": [[1, 10]]}"#);
        assert!(mask.classify(&[], &[]).unwrap().is_empty());
        assert!(mask.classify_par(&[], &[]).unwrap().is_empty());
    }

    #[test]
    fn length_mismatch() {
        let mask = mask(r#"{"1": [[1, 10]]}"#);
        let err = mask.classify(&[1, 1], &[1]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<LengthMismatch>(),
            Some(&LengthMismatch { expected: 2, actual: 1 })
        );
        assert!(mask.classify_par(&[1], &[1, 2]).is_err());
    }

    #[test]
    fn overlapping_ranges_are_malformed() {
        let err = LumiMask::from_json_str(r#"{"42": [[1, 5], [4, 8]]}"#).unwrap_err();
        let err = err.downcast_ref::<MalformedCertification>().unwrap();
        assert_eq!(err.run, 42);
        assert_eq!((err.first, err.last), (4, 8));
    }

    #[test]
    fn document_round_trip() {
        let mask = mask(r#"{"1": [[8, 12], [1, 5]], "2": [[3, 3]]}"#);
        let doc = mask.to_document();
        assert_eq!(doc[&1], vec![LumiRange::new(1, 5), LumiRange::new(8, 12)]);
        assert_eq!(mask.num_ranges(), 3);
        assert_eq!(mask.get(2).map(|s| s.len()), Some(1));
    }

    #[test]
    fn unchecked_mask_tolerates_bad_input() {
        let mask = LumiMask::new_unchecked([(1, vec![LumiRange::new(9, 2), LumiRange::new(1, 5)])]);
        let _ = mask.classify(&[1, 1, 1], &[0, 3, 10]).unwrap();
    }
}
