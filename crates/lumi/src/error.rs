use arrow::datatypes::DataType;
use std::fmt::{Display, Formatter};
use tnp_primitives::RunNumber;


#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MalformedCertification {
    pub run: RunNumber,
    pub first: i64,
    pub last: i64,
    pub reason: String
}


impl Display for MalformedCertification {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f, "malformed certification for run {}: range [{}, {}] {}",
            self.run,
            self.first,
            self.last,
            self.reason
        )
    }
}


impl std::error::Error for MalformedCertification {}


#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TypeMismatch {
    pub column: String,
    pub expected: &'static str,
    pub data_type: DataType
}


impl Display for TypeMismatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f, "column '{}' was expected to be of {} type, but got {}",
            self.column,
            self.expected,
            self.data_type
        )
    }
}


impl std::error::Error for TypeMismatch {}


#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LengthMismatch {
    pub expected: usize,
    pub actual: usize
}


impl Display for LengthMismatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "array length mismatch: expected {}, got {}", self.expected, self.actual)
    }
}


impl std::error::Error for LengthMismatch {}


pub fn ensure_same_len(expected: usize, actual: usize) -> anyhow::Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(LengthMismatch { expected, actual }.into())
    }
}
