#![warn(rust_2018_idioms)]

//! Reading, editing, and writing of SFNT (OpenType/TrueType) font table
//! data.
//!
//! Font data is accessed through bounds-checked views over shared storage:
//! [`binary::read::ReadableFontData`] for random-access reads and
//! [`binary::write::WritableFontData`] for mutation. Tables wrap a view and
//! interpret it ([`table::FontDataTable`]); table builders pair a view with
//! lazily parsed, mutable state and re-serialize it only when it has been
//! edited ([`table::Builder`]).

/// Reading and writing of binary data.
pub mod binary;
/// Checksum calculation routines.
pub mod checksum;
pub mod error;
pub mod size;
pub mod table;
pub mod tag;
