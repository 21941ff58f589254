//! Bitmap location index subtables (`EBLC`/`CBLC`/`bloc`).
//!
//! Covers index format 4: a sparse glyph-code array of `(glyph id, offset)`
//! pairs sorted by glyph id, closed by a sentinel pair one past the last
//! glyph. Glyph image length is recovered by subtracting consecutive offsets,
//! so lookups read two pairs.

use crate::binary::read::{ReadArray, ReadFixed, ReadableFontData};
use crate::binary::write::{WritableFontData, WriteBinary, WriteBuffer, WriteContext};
use crate::binary::{U16Be, U32Be};
use crate::error::{DataError, TableError, WriteError};
use crate::size;
use crate::table::{Builder, FontDataTable, TableModel};

mod offset {
    pub const INDEX_FORMAT: usize = 0;
    pub const IMAGE_FORMAT: usize = 2;
    pub const IMAGE_DATA_OFFSET: usize = 4;
    pub const NUM_GLYPHS: usize = 8;
    pub const GLYPH_ARRAY: usize = 12;
}

/// One entry of a format 4 glyph array.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GlyphOffsetPair {
    pub glyph_id: u16,
    /// Offset of the glyph's image data, relative to `image_data_offset`.
    pub offset: u16,
}

impl ReadFixed for GlyphOffsetPair {
    const SIZE: usize = size::U16 + size::U16;

    fn read(data: &ReadableFontData, offset: usize) -> Result<Self, DataError> {
        let glyph_id = data.read_u16be(offset)?;
        let offset = data.read_u16be(offset + size::U16)?;
        Ok(GlyphOffsetPair { glyph_id, offset })
    }
}

/// An index subtable in format 4.
pub struct IndexSubTableFormat4 {
    data: ReadableFontData,
}

impl FontDataTable for IndexSubTableFormat4 {
    // Header plus the sentinel pair of an empty glyph array.
    const MIN_LENGTH: usize = offset::GLYPH_ARRAY + GlyphOffsetPair::SIZE;

    fn bind(data: ReadableFontData) -> Self {
        IndexSubTableFormat4 { data }
    }

    fn new(data: ReadableFontData) -> Result<Self, TableError> {
        if data.len() < Self::MIN_LENGTH {
            return Err(TableError::Malformed);
        }
        let table = Self::bind(data);
        if table.data.read_u16be(offset::INDEX_FORMAT)? != 4 {
            return Err(TableError::Malformed);
        }
        let num_glyphs = table.num_glyphs()? as usize;
        let array_len = num_glyphs
            .checked_add(1)
            .and_then(|pairs| pairs.checked_mul(GlyphOffsetPair::SIZE))
            .ok_or(TableError::Malformed)?;
        if offset::GLYPH_ARRAY + array_len > table.data.len() {
            return Err(TableError::Malformed);
        }
        Ok(table)
    }

    fn data(&self) -> &ReadableFontData {
        &self.data
    }
}

impl IndexSubTableFormat4 {
    /// The serialized length of a format 4 subtable covering glyphs
    /// `first..=last`: the header plus the glyph array and its sentinel.
    /// An inverted range covers no glyphs and sizes to 0.
    pub fn data_length(first: u16, last: u16) -> usize {
        if first > last {
            return 0;
        }
        let num_glyphs = usize::from(last) - usize::from(first) + 1;
        offset::GLYPH_ARRAY + (num_glyphs + 1) * GlyphOffsetPair::SIZE
    }

    /// Construct a table over `data`, additionally checking that the stored
    /// glyph count matches the declared range `first..=last`.
    pub fn with_range(
        data: ReadableFontData,
        first: u16,
        last: u16,
    ) -> Result<IndexSubTableFormat4, TableError> {
        if first > last {
            return Err(TableError::Malformed);
        }
        let table = Self::new(data)?;
        let num_glyphs = u32::from(last) - u32::from(first) + 1;
        if table.num_glyphs()? != num_glyphs {
            return Err(TableError::Malformed);
        }
        Ok(table)
    }

    pub fn image_format(&self) -> Result<u16, DataError> {
        self.data.read_u16be(offset::IMAGE_FORMAT)
    }

    /// Offset of this subtable's image data from the start of the bitmap
    /// data table.
    pub fn image_data_offset(&self) -> Result<u32, DataError> {
        self.data.read_u32be(offset::IMAGE_DATA_OFFSET)
    }

    /// The number of glyphs covered, excluding the sentinel entry.
    pub fn num_glyphs(&self) -> Result<u32, DataError> {
        self.data.read_u32be(offset::NUM_GLYPHS)
    }

    /// The glyph array including its sentinel entry.
    pub fn glyph_array(&self) -> Result<ReadArray<GlyphOffsetPair>, DataError> {
        let num_glyphs = self.num_glyphs()? as usize;
        let array = self.data.slice_from(offset::GLYPH_ARRAY)?;
        ReadArray::new(array, num_glyphs + 1)
    }

    /// Binary search the glyph array for `glyph_id`. The sentinel entry is
    /// not a match.
    fn find_code_offset_pair(&self, glyph_id: u16) -> Result<Option<usize>, DataError> {
        let num_glyphs = self.num_glyphs()? as usize;
        let array = self.glyph_array()?;
        match array.binary_search_by(|pair| pair.glyph_id.cmp(&glyph_id)) {
            Ok(index) if index < num_glyphs => Ok(Some(index)),
            _ => Ok(None),
        }
    }

    /// The offset of `glyph_id`'s image data relative to `image_data_offset`,
    /// or `None` if the glyph is not covered by this subtable.
    pub fn glyph_offset(&self, glyph_id: u16) -> Result<Option<u16>, DataError> {
        let array = self.glyph_array()?;
        match self.find_code_offset_pair(glyph_id)? {
            Some(index) => Ok(Some(array.read_item(index)?.offset)),
            None => Ok(None),
        }
    }

    /// The length of `glyph_id`'s image data, or `None` if the glyph is not
    /// covered by this subtable.
    pub fn glyph_length(&self, glyph_id: u16) -> Result<Option<u16>, DataError> {
        let array = self.glyph_array()?;
        match self.find_code_offset_pair(glyph_id)? {
            Some(index) => {
                let pair = array.read_item(index)?;
                let next = array.read_item(index + 1)?;
                // Image offsets must ascend through the array.
                let length = next
                    .offset
                    .checked_sub(pair.offset)
                    .ok_or(DataError::InvalidRange)?;
                Ok(Some(length))
            }
            None => Ok(None),
        }
    }
}

/// Builder state for a format 4 index subtable: the header fields plus an
/// editable glyph array (sentinel included).
pub struct IndexSubTableFormat4Model {
    image_format: u16,
    image_data_offset: u32,
    pairs: Vec<GlyphOffsetPair>,
    /// Trailing bytes between this subtable and the next; alignment only,
    /// re-emitted as zeros.
    padding: usize,
}

impl TableModel for IndexSubTableFormat4Model {
    type Table = IndexSubTableFormat4;

    fn sub_build(data: &ReadableFontData) -> Result<Self, TableError> {
        let table = IndexSubTableFormat4::new(data.clone())?;
        let pairs: Vec<GlyphOffsetPair> = table.glyph_array()?.iter().collect();
        let padding = data.len() - (offset::GLYPH_ARRAY + pairs.len() * GlyphOffsetPair::SIZE);
        Ok(IndexSubTableFormat4Model {
            image_format: table.image_format()?,
            image_data_offset: table.image_data_offset()?,
            pairs,
            padding,
        })
    }

    fn sub_serialize(&self, buffer: &mut WriteBuffer) -> Result<(), WriteError> {
        let num_glyphs = self
            .pairs
            .len()
            .checked_sub(1)
            .ok_or(WriteError::BadValue)?;
        U16Be::write(buffer, 4u16)?;
        U16Be::write(buffer, self.image_format)?;
        U32Be::write(buffer, self.image_data_offset)?;
        U32Be::write(buffer, u32::try_from(num_glyphs)?)?;
        for pair in &self.pairs {
            U16Be::write(buffer, pair.glyph_id)?;
            U16Be::write(buffer, pair.offset)?;
        }
        buffer.write_zeros(self.padding)
    }
}

/// Builder for a format 4 index subtable.
pub struct IndexSubTableFormat4Builder {
    builder: Builder<IndexSubTableFormat4Model>,
}

impl IndexSubTableFormat4Builder {
    pub fn from_readable(data: ReadableFontData) -> IndexSubTableFormat4Builder {
        IndexSubTableFormat4Builder {
            builder: Builder::from_readable(data),
        }
    }

    pub fn from_writable(data: WritableFontData) -> IndexSubTableFormat4Builder {
        IndexSubTableFormat4Builder {
            builder: Builder::from_writable(data),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.builder.is_dirty()
    }

    pub fn build(&mut self) -> Result<IndexSubTableFormat4, TableError> {
        self.builder.build()
    }

    pub fn image_format(&mut self) -> Result<u16, TableError> {
        Ok(self.builder.model()?.image_format)
    }

    pub fn set_image_format(&mut self, image_format: u16) -> Result<(), TableError> {
        self.builder.model_mut()?.image_format = image_format;
        Ok(())
    }

    pub fn image_data_offset(&mut self) -> Result<u32, TableError> {
        Ok(self.builder.model()?.image_data_offset)
    }

    pub fn set_image_data_offset(&mut self, image_data_offset: u32) -> Result<(), TableError> {
        self.builder.model_mut()?.image_data_offset = image_data_offset;
        Ok(())
    }

    /// The glyph array, sentinel included.
    pub fn glyph_array(&mut self) -> Result<&[GlyphOffsetPair], TableError> {
        Ok(&self.builder.model()?.pairs)
    }

    /// Mutable access to the glyph array. Entries must stay sorted by glyph
    /// id with the sentinel last; the count field is recomputed on build.
    pub fn glyph_array_mut(&mut self) -> Result<&mut Vec<GlyphOffsetPair>, TableError> {
        Ok(&mut self.builder.model_mut()?.pairs)
    }
}
