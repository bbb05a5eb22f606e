use crate::error::{ensure_same_len, TypeMismatch};
use crate::mask::LumiMask;
use anyhow::Context;
use arrow::array::{Array, AsArray, BooleanArray, UInt32Array};
use arrow::compute::{cast_with_options, CastOptions};
use arrow::datatypes::{DataType, UInt32Type};
use arrow_buffer::{BooleanBuffer, NullBuffer};


pub const RUN_COLUMN: &str = "run";
pub const LUMI_COLUMN: &str = "luminosityBlock";


/// Converts an integer column into `u32` values.
///
/// Non-integer columns are rejected rather than coerced. Values that do not
/// fit into `u32` fail the whole column. Nulls are preserved.
pub fn as_u32_array(column: &str, array: &dyn Array) -> anyhow::Result<UInt32Array> {
    if array.data_type() == &DataType::UInt32 {
        return Ok(array.as_primitive::<UInt32Type>().clone())
    }
    if !array.data_type().is_integer() {
        return Err(TypeMismatch {
            column: column.to_string(),
            expected: "integer",
            data_type: array.data_type().clone()
        }.into())
    }
    let options = CastOptions {
        safe: false,
        ..CastOptions::default()
    };
    let result = cast_with_options(array, &DataType::UInt32, &options).with_context(|| {
        format!("column '{}' has values outside of the u32 range", column)
    })?;
    Ok(result.as_primitive::<UInt32Type>().clone())
}


impl LumiMask {
    /// Classifies Arrow run and lumi columns. Rows where either value is null are rejected.
    pub fn classify_arrays(&self, run: &dyn Array, lumi: &dyn Array) -> anyhow::Result<BooleanArray> {
        self.classify_named_arrays(RUN_COLUMN, run, LUMI_COLUMN, lumi)
    }

    pub fn classify_named_arrays(
        &self,
        run_column: &str,
        run: &dyn Array,
        lumi_column: &str,
        lumi: &dyn Array
    ) -> anyhow::Result<BooleanArray>
    {
        ensure_same_len(run.len(), lumi.len())?;
        let run = as_u32_array(run_column, run)?;
        let lumi = as_u32_array(lumi_column, lumi)?;

        let mask = BooleanBuffer::from(self.classify(run.values(), lumi.values())?);
        let mask = match NullBuffer::union(run.nulls(), lumi.nulls()) {
            Some(valid) => &mask & valid.inner(),
            None => mask
        };
        Ok(BooleanArray::new(mask, None))
    }
}
