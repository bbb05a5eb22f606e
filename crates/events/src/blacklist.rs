use crate::columns::StringColumn;
use anyhow::Context;
use arrow::array::{Array, AsArray, BooleanArray};
use arrow::compute::{cast_with_options, CastOptions};
use arrow::datatypes::{DataType, Int64Type};
use arrow_buffer::BooleanBuffer;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tnp_lumi::TypeMismatch;
use tracing::info;


/// Set of excluded identifiers: detector roll names or run numbers.
///
/// Identifiers are opaque strings. Those that spell an integer can also be
/// matched against integer columns.
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    names: HashSet<String>,
    numbers: HashSet<i64>
}


#[derive(Deserialize)]
#[serde(untagged)]
enum Entry {
    Number(i64),
    Name(String)
}


impl Blacklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>) {
        let id = id.into();
        if let Ok(number) = id.parse::<i64>() {
            self.numbers.insert(number);
        }
        self.names.insert(id);
    }

    pub fn insert_number(&mut self, number: i64) {
        self.numbers.insert(number);
        self.names.insert(number.to_string());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.names.contains(id)
    }

    #[inline]
    pub fn contains_number(&self, number: i64) -> bool {
        self.numbers.contains(&number)
    }

    /// Parses a JSON array of identifiers. Both strings and integers are accepted.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let entries: Vec<Entry> = serde_json::from_str(json)
            .context("blacklist must be a JSON array of strings or integers")?;
        Ok(Self::from_entries(entries))
    }

    pub fn read_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).with_context(|| {
            format!("failed to open blacklist file {}", path.display())
        })?;
        let entries: Vec<Entry> = serde_json::from_reader(std::io::BufReader::new(file))
            .with_context(|| format!("invalid blacklist file {}", path.display()))?;
        let blacklist = Self::from_entries(entries);
        info!(
            path = %path.display(),
            entries = blacklist.len(),
            "loaded blacklist"
        );
        Ok(blacklist)
    }

    fn from_entries(entries: Vec<Entry>) -> Self {
        let mut blacklist = Self::new();
        for entry in entries {
            match entry {
                Entry::Number(number) => blacklist.insert_number(number),
                Entry::Name(name) => blacklist.insert(name)
            }
        }
        blacklist
    }

    /// Marks rows whose identifier is NOT blacklisted.
    ///
    /// String columns are matched by name, integer columns by number.
    /// Null identifiers are never kept.
    pub fn keep_mask(&self, column: &str, array: &dyn Array) -> anyhow::Result<BooleanArray> {
        if array.data_type().is_integer() {
            let options = CastOptions {
                safe: false,
                ..CastOptions::default()
            };
            let numbers = cast_with_options(array, &DataType::Int64, &options).with_context(|| {
                format!("column '{}' has values outside of the i64 range", column)
            })?;
            let numbers = numbers.as_primitive::<Int64Type>();
            let buf = BooleanBuffer::collect_bool(numbers.len(), |i| {
                numbers.is_valid(i) && !self.contains_number(numbers.value(i))
            });
            return Ok(BooleanArray::new(buf, None))
        }
        let names = match StringColumn::new(column, array) {
            Ok(names) => names,
            Err(_) => return Err(TypeMismatch {
                column: column.to_string(),
                expected: "string or integer",
                data_type: array.data_type().clone()
            }.into())
        };
        let buf = BooleanBuffer::collect_bool(names.len(), |i| {
            names.get(i).map_or(false, |name| !self.contains(name))
        });
        Ok(BooleanArray::new(buf, None))
    }
}


impl<S: Into<String>> FromIterator<S> for Blacklist {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut blacklist = Self::new();
        for id in iter {
            blacklist.insert(id);
        }
        blacklist
    }
}
