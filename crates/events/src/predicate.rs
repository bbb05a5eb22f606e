use crate::blacklist::Blacklist;
use crate::columns::{column, StringColumn};
use arrow::array::{BooleanArray, RecordBatch};
use arrow_buffer::BooleanBuffer;
use std::collections::HashSet;
use std::sync::Arc;
use tnp_lumi::LumiMask;


pub type EventPredicateRef = Arc<dyn EventPredicate>;


/// Row-wise selection over an event (or hit) batch.
pub trait EventPredicate: Sync + Send {
    fn projection(&self) -> &[String];

    fn evaluate(&self, batch: &RecordBatch) -> anyhow::Result<BooleanArray>;
}


pub fn zero_mask(len: usize, is_set: bool) -> BooleanArray {
    let buf = if is_set {
        BooleanBuffer::new_set(len)
    } else {
        BooleanBuffer::new_unset(len)
    };
    BooleanArray::from(buf)
}


/// Keeps events whose `(run, luminosityBlock)` is certified.
pub struct CertifiedLumiPredicate {
    columns: [String; 2],
    mask: Arc<LumiMask>
}


impl CertifiedLumiPredicate {
    pub fn new(run_column: impl Into<String>, lumi_column: impl Into<String>, mask: Arc<LumiMask>) -> Self {
        Self {
            columns: [run_column.into(), lumi_column.into()],
            mask
        }
    }
}


impl EventPredicate for CertifiedLumiPredicate {
    fn projection(&self) -> &[String] {
        &self.columns
    }

    fn evaluate(&self, batch: &RecordBatch) -> anyhow::Result<BooleanArray> {
        let run = column(batch, &self.columns[0])?;
        let lumi = column(batch, &self.columns[1])?;
        self.mask.classify_named_arrays(&self.columns[0], run, &self.columns[1], lumi)
    }
}


/// Drops rows whose identifier column value is blacklisted.
pub struct BlacklistPredicate {
    column: [String; 1],
    blacklist: Arc<Blacklist>
}


impl BlacklistPredicate {
    pub fn new(column: impl Into<String>, blacklist: Arc<Blacklist>) -> Self {
        Self {
            column: [column.into()],
            blacklist
        }
    }
}


impl EventPredicate for BlacklistPredicate {
    fn projection(&self) -> &[String] {
        &self.column
    }

    fn evaluate(&self, batch: &RecordBatch) -> anyhow::Result<BooleanArray> {
        let array = column(batch, &self.column[0])?;
        self.blacklist.keep_mask(&self.column[0], array)
    }
}


/// Drops rows whose name starts with any of the given prefixes, e.g. a whole detector station.
pub struct ExcludePrefixPredicate {
    column: [String; 1],
    prefixes: Vec<String>
}


impl ExcludePrefixPredicate {
    pub fn new(column: impl Into<String>, prefixes: Vec<String>) -> Self {
        Self {
            column: [column.into()],
            prefixes
        }
    }
}


impl EventPredicate for ExcludePrefixPredicate {
    fn projection(&self) -> &[String] {
        &self.column
    }

    fn evaluate(&self, batch: &RecordBatch) -> anyhow::Result<BooleanArray> {
        let names = StringColumn::new(&self.column[0], column(batch, &self.column[0])?)?;
        let buf = BooleanBuffer::collect_bool(names.len(), |i| {
            names.get(i).map_or(false, |name| {
                !self.prefixes.iter().any(|p| name.starts_with(p.as_str()))
            })
        });
        Ok(BooleanArray::new(buf, None))
    }
}


pub struct AndPredicate {
    predicates: Vec<EventPredicateRef>,
    projection: Vec<String>
}


impl AndPredicate {
    pub fn new(predicates: Vec<EventPredicateRef>) -> Self {
        let projection = predicates_projection(&predicates);
        Self {
            predicates,
            projection
        }
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}


impl EventPredicate for AndPredicate {
    fn projection(&self) -> &[String] {
        &self.projection
    }

    fn evaluate(&self, batch: &RecordBatch) -> anyhow::Result<BooleanArray> {
        if self.predicates.is_empty() {
            return Ok(zero_mask(batch.num_rows(), true))
        }
        let mut result_mask = self.predicates[0].evaluate(batch)?;
        for i in 1..self.predicates.len() {
            let m = self.predicates[i].evaluate(batch)?;
            result_mask = arrow::compute::and(&result_mask, &m)?;
        }
        Ok(result_mask)
    }
}


fn predicates_projection(predicates: &[EventPredicateRef]) -> Vec<String> {
    let mut projected_set: HashSet<&str> = HashSet::new();
    let mut projection = Vec::new();
    for name in predicates.iter().flat_map(|p| p.projection()) {
        if projected_set.insert(name.as_str()) {
            projection.push(name.clone());
        }
    }
    projection
}
