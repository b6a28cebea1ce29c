use std::ops::RangeInclusive;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("{field} {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("invalid time signature {0:?}")]
    TimeSignature(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl DomainError {
    pub fn out_of_range(field: &'static str, value: i64, range: RangeInclusive<i64>) -> Self {
        Self::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        }
    }
}
