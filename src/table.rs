//! The generic contract shared by font tables and their builders.
//!
//! A [`FontDataTable`] is an immutable, validated wrapper around a region of
//! font data. A [`Builder`] pairs a source region with lazily materialized,
//! mutable per-table state described by a [`TableModel`]; building a clean
//! builder hands back the source bytes unchanged, building a dirty one
//! re-serializes the model.

pub mod bitmap;
pub mod hhea;
pub mod name;

use log::debug;

use crate::binary::read::ReadableFontData;
use crate::binary::write::{WritableFontData, WriteBuffer, WriteContext};
use crate::error::{TableError, WriteError};

/// A font table backed by a region of font data.
pub trait FontDataTable: Sized {
    /// The minimum structural length of the table in bytes.
    const MIN_LENGTH: usize;

    /// Bind a table to `data` without validation.
    fn bind(data: ReadableFontData) -> Self;

    /// Construct a table over `data`.
    ///
    /// Fails with [`TableError::Malformed`] when the region is shorter than
    /// the table's minimum structural length. Implementations with declared
    /// counts also check them against the region here.
    fn new(data: ReadableFontData) -> Result<Self, TableError> {
        if data.len() < Self::MIN_LENGTH {
            return Err(TableError::Malformed);
        }
        Ok(Self::bind(data))
    }

    /// The data region backing this table.
    fn data(&self) -> &ReadableFontData;

    /// The length of the backing region in bytes.
    fn data_length(&self) -> usize {
        self.data().len()
    }

    /// Serialize the table into `ctxt` as a plain copy of its region.
    fn serialize<C: WriteContext>(&self, ctxt: &mut C) -> Result<(), WriteError> {
        self.data().copy_to(ctxt).map(drop)
    }
}

/// The mutable state behind a [`Builder`].
///
/// `sub_build` parses the state from existing table bytes; it runs at most
/// once per builder, on first access. `sub_serialize` writes the state back
/// out in table format.
pub trait TableModel: Sized {
    /// The table type this model builds.
    type Table: FontDataTable;

    /// Parse model state from existing table bytes.
    fn sub_build(data: &ReadableFontData) -> Result<Self, TableError>;

    /// Initial model state for a builder over writable data.
    fn sub_new(data: &WritableFontData) -> Result<Self, TableError> {
        Self::sub_build(&data.readable())
    }

    /// Serialize the model state into `buffer`.
    fn sub_serialize(&self, buffer: &mut WriteBuffer) -> Result<(), WriteError>;
}

enum SourceData {
    Readable(ReadableFontData),
    Writable(WritableFontData),
}

impl SourceData {
    fn readable(&self) -> ReadableFontData {
        match self {
            SourceData::Readable(data) => data.clone(),
            SourceData::Writable(data) => data.readable(),
        }
    }
}

/// A table builder over a source region.
///
/// The model is materialized lazily: a builder that is only ever built passes
/// its source bytes through without parsing them. Accessors that hand out
/// mutable state mark the builder dirty, which switches `build` from the
/// pass-through path to re-serialization.
pub struct Builder<M: TableModel> {
    source: SourceData,
    model: Option<M>,
    dirty: bool,
}

impl<M: TableModel> Builder<M> {
    /// Create a builder over read-only source data.
    pub fn from_readable(data: ReadableFontData) -> Builder<M> {
        Builder {
            source: SourceData::Readable(data),
            model: None,
            dirty: false,
        }
    }

    /// Create a builder over writable source data.
    pub fn from_writable(data: WritableFontData) -> Builder<M> {
        Builder {
            source: SourceData::Writable(data),
            model: None,
            dirty: false,
        }
    }

    /// True if the builder's state has been mutated since it was created or
    /// last reverted.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    /// The model state if it has already been materialized. Does not mark
    /// the builder dirty.
    pub(crate) fn peek_model_mut(&mut self) -> Option<&mut M> {
        self.model.as_mut()
    }

    fn materialize(&mut self) -> Result<(), TableError> {
        if self.model.is_none() {
            let model = match &self.source {
                SourceData::Readable(data) => M::sub_build(data)?,
                SourceData::Writable(data) => M::sub_new(data)?,
            };
            self.model = Some(model);
        }
        Ok(())
    }

    /// The model state, parsed from the source bytes on first access.
    pub fn model(&mut self) -> Result<&M, TableError> {
        self.materialize()?;
        // NOTE(unwrap): materialize filled the slot or returned early
        Ok(self.model.as_ref().unwrap())
    }

    /// Mutable model state. Marks the builder dirty.
    pub fn model_mut(&mut self) -> Result<&mut M, TableError> {
        self.materialize()?;
        self.dirty = true;
        // NOTE(unwrap): materialize filled the slot or returned early
        Ok(self.model.as_mut().unwrap())
    }

    /// Build the table.
    ///
    /// A dirty builder serializes its model into fresh storage; a clean one
    /// wraps the source bytes unchanged. Building twice without intervening
    /// mutation yields byte-identical tables.
    pub fn build(&mut self) -> Result<M::Table, TableError> {
        if self.dirty {
            debug!("serializing modified table state");
            self.materialize()?;
            // NOTE(unwrap): materialize filled the slot or returned early
            let model = self.model.as_ref().unwrap();
            let mut buffer = WriteBuffer::new();
            model.sub_serialize(&mut buffer)?;
            M::Table::new(ReadableFontData::new(buffer.into_inner()))
        } else {
            M::Table::new(self.source.readable())
        }
    }
}
