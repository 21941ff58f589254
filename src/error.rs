//! Error types

use std::fmt;

/// Errors raised by the bounds-checked font data views.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum DataError {
    /// A read or write index/width exceeds the view's region.
    OutOfBounds,
    /// A requested slice or checksum range is inverted, misaligned, or
    /// exceeds the parent's bounds.
    InvalidRange,
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::OutOfBounds => write!(f, "access outside data bounds"),
            DataError::InvalidRange => write!(f, "invalid data range"),
        }
    }
}

impl std::error::Error for DataError {}

/// Errors that originate when writing binary data.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum WriteError {
    BadValue,
    NotImplemented,
}

impl From<std::num::TryFromIntError> for WriteError {
    fn from(_error: std::num::TryFromIntError) -> Self {
        WriteError::BadValue
    }
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::BadValue => write!(f, "write: bad value"),
            WriteError::NotImplemented => write!(f, "writing in this format is not implemented"),
        }
    }
}

impl std::error::Error for WriteError {}

/// Errors raised while constructing or building font tables.
///
/// Lookup misses (a glyph code or name entry that is simply absent) are not
/// errors; they are reported as `None` results.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum TableError {
    /// The table's backing region is shorter than its minimum structural
    /// length, or declared counts are inconsistent with the region.
    Malformed,
    /// A bounds failure surfaced while accessing table data.
    Data(DataError),
    /// A failure surfaced while serializing a table.
    Write(WriteError),
}

impl From<DataError> for TableError {
    fn from(error: DataError) -> Self {
        TableError::Data(error)
    }
}

impl From<WriteError> for TableError {
    fn from(error: WriteError) -> Self {
        TableError::Write(error)
    }
}

impl From<std::num::TryFromIntError> for TableError {
    fn from(_error: std::num::TryFromIntError) -> Self {
        TableError::Malformed
    }
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::Malformed => write!(f, "malformed table"),
            TableError::Data(err) => write!(f, "table data: {}", err),
            TableError::Write(err) => write!(f, "table write: {}", err),
        }
    }
}

impl std::error::Error for TableError {}
