use arrow::array::{Array, ArrayRef, AsArray, BooleanArray, LargeStringArray, RecordBatch, StringArray};
use arrow::datatypes::DataType;
use std::fmt::{Display, Formatter};
use tnp_lumi::TypeMismatch;


#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MissingColumn {
    pub column: String
}


impl Display for MissingColumn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "missing column: {}", self.column)
    }
}


impl std::error::Error for MissingColumn {}


pub fn column<'a>(batch: &'a RecordBatch, name: &str) -> anyhow::Result<&'a ArrayRef> {
    batch.column_by_name(name).ok_or_else(|| {
        MissingColumn {
            column: name.to_string()
        }.into()
    })
}


pub fn boolean_column<'a>(batch: &'a RecordBatch, name: &str) -> anyhow::Result<&'a BooleanArray> {
    let array = column(batch, name)?;
    array.as_boolean_opt().ok_or_else(|| {
        TypeMismatch {
            column: name.to_string(),
            expected: "boolean",
            data_type: array.data_type().clone()
        }.into()
    })
}


/// Read access to either flavour of Arrow string arrays
#[derive(Copy, Clone)]
pub enum StringColumn<'a> {
    Utf8(&'a StringArray),
    LargeUtf8(&'a LargeStringArray)
}


impl<'a> StringColumn<'a> {
    pub fn new(column: &str, array: &'a dyn Array) -> anyhow::Result<Self> {
        match array.data_type() {
            DataType::Utf8 => Ok(StringColumn::Utf8(array.as_string::<i32>())),
            DataType::LargeUtf8 => Ok(StringColumn::LargeUtf8(array.as_string::<i64>())),
            data_type => Err(TypeMismatch {
                column: column.to_string(),
                expected: "string",
                data_type: data_type.clone()
            }.into())
        }
    }

    pub fn len(&self) -> usize {
        match self {
            StringColumn::Utf8(arr) => arr.len(),
            StringColumn::LargeUtf8(arr) => arr.len()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn get(&self, i: usize) -> Option<&'a str> {
        match *self {
            StringColumn::Utf8(arr) => arr.is_valid(i).then(|| arr.value(i)),
            StringColumn::LargeUtf8(arr) => arr.is_valid(i).then(|| arr.value(i))
        }
    }
}
