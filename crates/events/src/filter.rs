use crate::predicate::{AndPredicate, EventPredicate, EventPredicateRef};
use arrow::array::{Array, ArrayRef, BooleanArray, RecordBatch};
use arrow::compute::{filter, filter_record_batch};
use tnp_lumi::ensure_same_len;
use tracing::debug;


/// Conjunction of predicates applied to whole batches.
///
/// Every column of a batch is filtered by the same mask, so payload columns
/// stay aligned with the `(run, luminosityBlock)` columns they came with.
pub struct EventFilter {
    predicate: AndPredicate
}


impl EventFilter {
    pub fn new(predicates: Vec<EventPredicateRef>) -> Self {
        Self {
            predicate: AndPredicate::new(predicates)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.predicate.is_empty()
    }

    pub fn projection(&self) -> &[String] {
        self.predicate.projection()
    }

    pub fn mask(&self, batch: &RecordBatch) -> anyhow::Result<BooleanArray> {
        self.predicate.evaluate(batch)
    }

    pub fn apply(&self, batch: &RecordBatch) -> anyhow::Result<RecordBatch> {
        if self.is_empty() {
            return Ok(batch.clone())
        }
        let mask = self.mask(batch)?;
        let result = filter_record_batch(batch, &mask)?;
        debug!(
            rows = batch.num_rows(),
            accepted = result.num_rows(),
            "filtered batch"
        );
        Ok(result)
    }
}


/// Filters loose same-length arrays in lockstep with `mask`.
pub fn filter_columns(columns: &[ArrayRef], mask: &BooleanArray) -> anyhow::Result<Vec<ArrayRef>> {
    for col in columns {
        ensure_same_len(mask.len(), col.len())?;
    }
    columns.iter().map(|col| {
        Ok(filter(col.as_ref(), mask)?)
    }).collect()
}
