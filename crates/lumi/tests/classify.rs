use proptest::prelude::*;
use std::collections::BTreeMap;
use tnp_lumi::{LumiMask, LumiRange, RunNumber};


/// Disjoint ranges per run, built from gaps and lengths so they never overlap.
fn certification() -> impl Strategy<Value = BTreeMap<RunNumber, Vec<LumiRange>>> {
    let ranges = prop::collection::vec((0..5u32, 0..5u32), 0..6).prop_map(|steps| {
        let mut ranges = Vec::with_capacity(steps.len());
        let mut next = 0;
        for (gap, len) in steps {
            let first = next + gap;
            let last = first + len;
            ranges.push(LumiRange::new(first, last));
            next = last + 1;
        }
        ranges
    }).prop_shuffle();
    prop::collection::btree_map(0..8u32, ranges, 0..6)
}


fn events(len: usize) -> impl Strategy<Value = (Vec<RunNumber>, Vec<u32>)> {
    prop::collection::vec((0..10u32, 0..40u32), 0..len).prop_map(|rows| {
        rows.into_iter().unzip()
    })
}


fn naive_classify(doc: &BTreeMap<RunNumber, Vec<LumiRange>>, run: &[RunNumber], lumi: &[u32]) -> Vec<bool> {
    run.iter().zip(lumi).map(|(run, lumi)| {
        doc.get(run).map_or(false, |ranges| ranges.iter().any(|r| r.contains(*lumi)))
    }).collect()
}


proptest! {
    #[test]
    fn classify_matches_linear_scan(doc in certification(), (run, lumi) in events(200)) {
        let mask = LumiMask::new(doc.clone()).unwrap();
        let expected = naive_classify(&doc, &run, &lumi);
        prop_assert_eq!(mask.classify(&run, &lumi).unwrap(), expected.clone());
        prop_assert_eq!(mask.classify_par(&run, &lumi).unwrap(), expected);
    }

    #[test]
    fn classify_commutes_with_permutation(
        doc in certification(),
        ((run, lumi), order) in events(100).prop_flat_map(|(run, lumi)| {
            let order = Just((0..run.len()).collect::<Vec<_>>()).prop_shuffle();
            (Just((run, lumi)), order)
        })
    ) {
        let mask = LumiMask::new(doc).unwrap();
        let result = mask.classify(&run, &lumi).unwrap();

        let permuted_run: Vec<_> = order.iter().map(|i| run[*i]).collect();
        let permuted_lumi: Vec<_> = order.iter().map(|i| lumi[*i]).collect();
        let permuted_result = mask.classify(&permuted_run, &permuted_lumi).unwrap();

        let expected: Vec<_> = order.iter().map(|i| result[*i]).collect();
        prop_assert_eq!(permuted_result, expected);
    }

    #[test]
    fn boundaries_are_half_open(first in 1..1000u32, len in 0..100u32, run in any::<u32>()) {
        let last = first + len;
        let mask = LumiMask::new(BTreeMap::from([(run, vec![LumiRange::new(first, last)])])).unwrap();
        let got = mask.classify(&[run; 4], &[first - 1, first, last, last + 1]).unwrap();
        prop_assert_eq!(got, vec![false, true, true, false]);
    }

    #[test]
    fn document_survives_mask_construction(doc in certification()) {
        let mask = LumiMask::new(doc.clone()).unwrap();
        let mut expected = doc;
        for ranges in expected.values_mut() {
            ranges.sort_unstable();
        }
        prop_assert_eq!(mask.to_document(), expected);
    }
}


#[test]
fn multi_range_run() {
    let mask = LumiMask::from_json_str(r#"{"7": [[10, 12], [20, 25]]}"#).unwrap();
    let got = mask.classify(&[7; 8], &[9, 10, 12, 13, 19, 20, 25, 26]).unwrap();
    assert_eq!(got, vec![false, true, true, false, false, true, true, false]);
    assert_eq!(got, mask.classify_single_run(7, &[9, 10, 12, 13, 19, 20, 25, 26]));
}


#[test]
fn large_batch_with_many_runs() {
    let doc: BTreeMap<RunNumber, Vec<LumiRange>> = (0..500)
        .map(|run| (run, vec![LumiRange::new(run, run + 10)]))
        .collect();
    let mask = LumiMask::new(doc).unwrap();

    let n = 200_000u32;
    let run: Vec<u32> = (0..n).map(|i| (i * 7919) % 600).collect();
    let lumi: Vec<u32> = (0..n).map(|i| i % 700).collect();

    let got = mask.classify(&run, &lumi).unwrap();
    for i in 0..n as usize {
        let expected = run[i] < 500 && run[i] <= lumi[i] && lumi[i] <= run[i] + 10;
        assert_eq!(got[i], expected, "row {}", i);
    }
    assert_eq!(mask.classify_par(&run, &lumi).unwrap(), got);
}
