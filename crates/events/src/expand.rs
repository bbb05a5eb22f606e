use crate::columns::column;
use arrow::array::{Array, ArrayRef, AsArray, GenericListArray, OffsetSizeTrait, RecordBatch, UInt32Array, UInt64Array};
use arrow::compute::take;
use arrow::datatypes::{DataType, Field, Schema};
use arrow_buffer::ArrowNativeType;
use std::sync::Arc;
use tnp_lumi::{as_u32_array, LengthMismatch, TypeMismatch};


/// Turns a batch of events into a batch of hits.
///
/// `size_column` holds the number of hits of every event. Columns listed in
/// `per_event` are repeated once per hit, list columns listed in `per_hit` are
/// flattened. The list lengths must agree with the hit counts.
pub fn flatten_hits(
    batch: &RecordBatch,
    size_column: &str,
    per_event: &[&str],
    per_hit: &[&str]
) -> anyhow::Result<RecordBatch>
{
    let sizes = as_u32_array(size_column, column(batch, size_column)?)?;
    let sizes: Vec<u32> = sizes.iter().map(|s| s.unwrap_or(0)).collect();
    let indexes = repeat_indexes(&sizes);

    let mut fields = Vec::with_capacity(per_event.len() + per_hit.len());
    let mut columns = Vec::with_capacity(per_event.len() + per_hit.len());

    for name in per_event {
        let array = column(batch, name)?;
        fields.push(batch.schema_ref().field_with_name(name)?.clone());
        columns.push(take(array.as_ref(), &indexes, None)?);
    }

    for name in per_hit {
        let array = column(batch, name)?;
        let (item, values) = match array.data_type() {
            DataType::List(item) => (item, list_values(name, array.as_list::<i32>(), &sizes)?),
            DataType::LargeList(item) => (item, list_values(name, array.as_list::<i64>(), &sizes)?),
            data_type => return Err(not_a_list(name, data_type))
        };
        fields.push(item.as_ref().clone().with_name(*name));
        columns.push(values);
    }

    make_batch(fields, columns)
}


/// Muon level view of a batch of events, one row per event.
///
/// Columns listed in `per_event` are kept as they are. Every list column listed
/// in `per_muon` is replaced by its first element; empty and null lists give null.
pub fn first_per_event(
    batch: &RecordBatch,
    per_event: &[&str],
    per_muon: &[&str]
) -> anyhow::Result<RecordBatch>
{
    let mut fields = Vec::with_capacity(per_event.len() + per_muon.len());
    let mut columns = Vec::with_capacity(per_event.len() + per_muon.len());

    for name in per_event {
        let array = column(batch, name)?;
        fields.push(batch.schema_ref().field_with_name(name)?.clone());
        columns.push(array.clone());
    }

    for name in per_muon {
        let array = column(batch, name)?;
        let (item, values) = match array.data_type() {
            DataType::List(item) => (item, first_values(array.as_list::<i32>())?),
            DataType::LargeList(item) => (item, first_values(array.as_list::<i64>())?),
            data_type => return Err(not_a_list(name, data_type))
        };
        fields.push(item.as_ref().clone().with_name(*name).with_nullable(true));
        columns.push(values);
    }

    make_batch(fields, columns)
}


/// Row index of every hit: row `i` is repeated `sizes[i]` times.
pub fn repeat_indexes(sizes: &[u32]) -> UInt32Array {
    let total = sizes.iter().map(|s| *s as usize).sum();
    let mut indexes = Vec::with_capacity(total);
    for (row, size) in sizes.iter().enumerate() {
        indexes.extend(std::iter::repeat(row as u32).take(*size as usize));
    }
    UInt32Array::from(indexes)
}


fn list_values<O: OffsetSizeTrait>(
    column: &str,
    list: &GenericListArray<O>,
    sizes: &[u32]
) -> anyhow::Result<ArrayRef>
{
    let offsets = list.value_offsets();
    for (i, size) in sizes.iter().enumerate() {
        let len = (offsets[i + 1] - offsets[i]).as_usize();
        if len != *size as usize {
            return Err(anyhow::Error::new(LengthMismatch {
                expected: *size as usize,
                actual: len
            }).context(format!("hit count of row {} disagrees with list column '{}'", i, column)))
        }
    }
    let start = offsets[0].as_usize();
    let end = offsets[list.len()].as_usize();
    Ok(list.values().slice(start, end - start))
}


fn first_values<O: OffsetSizeTrait>(list: &GenericListArray<O>) -> anyhow::Result<ArrayRef> {
    let offsets = list.value_offsets();
    let indexes: UInt64Array = (0..list.len())
        .map(|i| {
            let non_empty = list.is_valid(i) && offsets[i + 1] > offsets[i];
            non_empty.then(|| offsets[i].as_usize() as u64)
        })
        .collect();
    Ok(take(list.values().as_ref(), &indexes, None)?)
}


fn not_a_list(column: &str, data_type: &DataType) -> anyhow::Error {
    TypeMismatch {
        column: column.to_string(),
        expected: "list",
        data_type: data_type.clone()
    }.into()
}


fn make_batch(fields: Vec<Field>, columns: Vec<ArrayRef>) -> anyhow::Result<RecordBatch> {
    let schema = Arc::new(Schema::new(fields));
    if columns.is_empty() {
        return Ok(RecordBatch::new_empty(schema))
    }
    Ok(RecordBatch::try_new(schema, columns)?)
}
