//! `hhea` horizontal header table.
//!
//! A fixed-layout table: every field lives at a known byte offset, so the
//! read side is accessors over the region and the builder pokes the same
//! offsets in a writable copy.

use crate::binary::read::ReadableFontData;
use crate::binary::write::{WritableFontData, WriteBuffer};
use crate::error::{DataError, TableError, WriteError};
use crate::table::{Builder, FontDataTable, TableModel};

mod offset {
    pub const VERSION: usize = 0;
    pub const ASCENDER: usize = 4;
    pub const DESCENDER: usize = 6;
    pub const LINE_GAP: usize = 8;
    pub const ADVANCE_WIDTH_MAX: usize = 10;
    pub const MIN_LEFT_SIDE_BEARING: usize = 12;
    pub const MIN_RIGHT_SIDE_BEARING: usize = 14;
    pub const X_MAX_EXTENT: usize = 16;
    pub const CARET_SLOPE_RISE: usize = 18;
    pub const CARET_SLOPE_RUN: usize = 20;
    pub const CARET_OFFSET: usize = 22;
    pub const METRIC_DATA_FORMAT: usize = 32;
    pub const NUM_H_METRICS: usize = 34;
}

/// `hhea` — horizontal header table.
pub struct HheaTable {
    data: ReadableFontData,
}

impl FontDataTable for HheaTable {
    const MIN_LENGTH: usize = 36;

    fn bind(data: ReadableFontData) -> Self {
        HheaTable { data }
    }

    fn data(&self) -> &ReadableFontData {
        &self.data
    }
}

impl HheaTable {
    /// Table version as raw 16.16 fixed-point bits, normally 0x00010000.
    pub fn version(&self) -> Result<i32, DataError> {
        self.data.read_fixed(offset::VERSION)
    }

    pub fn ascender(&self) -> Result<i16, DataError> {
        self.data.read_fword(offset::ASCENDER)
    }

    pub fn descender(&self) -> Result<i16, DataError> {
        self.data.read_fword(offset::DESCENDER)
    }

    pub fn line_gap(&self) -> Result<i16, DataError> {
        self.data.read_fword(offset::LINE_GAP)
    }

    pub fn advance_width_max(&self) -> Result<u16, DataError> {
        self.data.read_ufword(offset::ADVANCE_WIDTH_MAX)
    }

    pub fn min_left_side_bearing(&self) -> Result<i16, DataError> {
        self.data.read_fword(offset::MIN_LEFT_SIDE_BEARING)
    }

    pub fn min_right_side_bearing(&self) -> Result<i16, DataError> {
        self.data.read_fword(offset::MIN_RIGHT_SIDE_BEARING)
    }

    pub fn x_max_extent(&self) -> Result<i16, DataError> {
        self.data.read_fword(offset::X_MAX_EXTENT)
    }

    pub fn caret_slope_rise(&self) -> Result<i16, DataError> {
        self.data.read_i16be(offset::CARET_SLOPE_RISE)
    }

    pub fn caret_slope_run(&self) -> Result<i16, DataError> {
        self.data.read_i16be(offset::CARET_SLOPE_RUN)
    }

    pub fn caret_offset(&self) -> Result<i16, DataError> {
        self.data.read_i16be(offset::CARET_OFFSET)
    }

    pub fn metric_data_format(&self) -> Result<i16, DataError> {
        self.data.read_i16be(offset::METRIC_DATA_FORMAT)
    }

    pub fn num_h_metrics(&self) -> Result<u16, DataError> {
        self.data.read_u16be(offset::NUM_H_METRICS)
    }
}

/// Builder state for `hhea`: a private writable copy of the table bytes that
/// setters poke at fixed offsets.
pub struct HheaData {
    data: WritableFontData,
}

impl TableModel for HheaData {
    type Table = HheaTable;

    fn sub_build(data: &ReadableFontData) -> Result<Self, TableError> {
        if data.len() < HheaTable::MIN_LENGTH {
            return Err(TableError::Malformed);
        }
        Ok(HheaData {
            data: WritableFontData::from_vec(data.to_vec()),
        })
    }

    fn sub_serialize(&self, buffer: &mut WriteBuffer) -> Result<(), WriteError> {
        self.data.readable().copy_to(buffer).map(drop)
    }
}

/// Builder for the `hhea` table.
pub struct HheaBuilder {
    builder: Builder<HheaData>,
}

impl HheaBuilder {
    pub fn from_readable(data: ReadableFontData) -> HheaBuilder {
        HheaBuilder {
            builder: Builder::from_readable(data),
        }
    }

    pub fn from_writable(data: WritableFontData) -> HheaBuilder {
        HheaBuilder {
            builder: Builder::from_writable(data),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.builder.is_dirty()
    }

    pub fn build(&mut self) -> Result<HheaTable, TableError> {
        self.builder.build()
    }

    fn read(&mut self) -> Result<ReadableFontData, TableError> {
        Ok(self.builder.model()?.data.readable())
    }

    fn write(&mut self) -> Result<&mut WritableFontData, TableError> {
        Ok(&mut self.builder.model_mut()?.data)
    }

    pub fn version(&mut self) -> Result<i32, TableError> {
        Ok(self.read()?.read_fixed(offset::VERSION)?)
    }

    pub fn set_version(&mut self, version: i32) -> Result<(), TableError> {
        Ok(self.write()?.write_fixed(offset::VERSION, version)?)
    }

    pub fn ascender(&mut self) -> Result<i16, TableError> {
        Ok(self.read()?.read_fword(offset::ASCENDER)?)
    }

    pub fn set_ascender(&mut self, ascender: i16) -> Result<(), TableError> {
        Ok(self.write()?.write_fword(offset::ASCENDER, ascender)?)
    }

    pub fn descender(&mut self) -> Result<i16, TableError> {
        Ok(self.read()?.read_fword(offset::DESCENDER)?)
    }

    pub fn set_descender(&mut self, descender: i16) -> Result<(), TableError> {
        Ok(self.write()?.write_fword(offset::DESCENDER, descender)?)
    }

    pub fn line_gap(&mut self) -> Result<i16, TableError> {
        Ok(self.read()?.read_fword(offset::LINE_GAP)?)
    }

    pub fn set_line_gap(&mut self, line_gap: i16) -> Result<(), TableError> {
        Ok(self.write()?.write_fword(offset::LINE_GAP, line_gap)?)
    }

    pub fn advance_width_max(&mut self) -> Result<u16, TableError> {
        Ok(self.read()?.read_ufword(offset::ADVANCE_WIDTH_MAX)?)
    }

    pub fn set_advance_width_max(&mut self, max: u16) -> Result<(), TableError> {
        Ok(self.write()?.write_ufword(offset::ADVANCE_WIDTH_MAX, max)?)
    }

    pub fn min_left_side_bearing(&mut self) -> Result<i16, TableError> {
        Ok(self.read()?.read_fword(offset::MIN_LEFT_SIDE_BEARING)?)
    }

    pub fn set_min_left_side_bearing(&mut self, bearing: i16) -> Result<(), TableError> {
        Ok(self
            .write()?
            .write_fword(offset::MIN_LEFT_SIDE_BEARING, bearing)?)
    }

    pub fn min_right_side_bearing(&mut self) -> Result<i16, TableError> {
        Ok(self.read()?.read_fword(offset::MIN_RIGHT_SIDE_BEARING)?)
    }

    pub fn set_min_right_side_bearing(&mut self, bearing: i16) -> Result<(), TableError> {
        Ok(self
            .write()?
            .write_fword(offset::MIN_RIGHT_SIDE_BEARING, bearing)?)
    }

    pub fn x_max_extent(&mut self) -> Result<i16, TableError> {
        Ok(self.read()?.read_fword(offset::X_MAX_EXTENT)?)
    }

    pub fn set_x_max_extent(&mut self, extent: i16) -> Result<(), TableError> {
        Ok(self.write()?.write_fword(offset::X_MAX_EXTENT, extent)?)
    }

    pub fn caret_slope_rise(&mut self) -> Result<i16, TableError> {
        Ok(self.read()?.read_i16be(offset::CARET_SLOPE_RISE)?)
    }

    pub fn set_caret_slope_rise(&mut self, rise: i16) -> Result<(), TableError> {
        Ok(self.write()?.write_i16be(offset::CARET_SLOPE_RISE, rise)?)
    }

    pub fn caret_slope_run(&mut self) -> Result<i16, TableError> {
        Ok(self.read()?.read_i16be(offset::CARET_SLOPE_RUN)?)
    }

    pub fn set_caret_slope_run(&mut self, run: i16) -> Result<(), TableError> {
        Ok(self.write()?.write_i16be(offset::CARET_SLOPE_RUN, run)?)
    }

    pub fn caret_offset(&mut self) -> Result<i16, TableError> {
        Ok(self.read()?.read_i16be(offset::CARET_OFFSET)?)
    }

    pub fn set_caret_offset(&mut self, caret_offset: i16) -> Result<(), TableError> {
        Ok(self.write()?.write_i16be(offset::CARET_OFFSET, caret_offset)?)
    }

    pub fn metric_data_format(&mut self) -> Result<i16, TableError> {
        Ok(self.read()?.read_i16be(offset::METRIC_DATA_FORMAT)?)
    }

    pub fn set_metric_data_format(&mut self, format: i16) -> Result<(), TableError> {
        Ok(self.write()?.write_i16be(offset::METRIC_DATA_FORMAT, format)?)
    }

    pub fn num_h_metrics(&mut self) -> Result<u16, TableError> {
        Ok(self.read()?.read_u16be(offset::NUM_H_METRICS)?)
    }

    pub fn set_num_h_metrics(&mut self, num: u16) -> Result<(), TableError> {
        Ok(self.write()?.write_u16be(offset::NUM_H_METRICS, num)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_hhea() -> ReadableFontData {
        let mut data = WritableFontData::new();
        data.write_fixed(offset::VERSION, 0x0001_0000).unwrap();
        data.write_fword(offset::ASCENDER, 1900).unwrap();
        data.write_fword(offset::DESCENDER, -500).unwrap();
        data.write_fword(offset::LINE_GAP, 0).unwrap();
        data.write_ufword(offset::ADVANCE_WIDTH_MAX, 2048).unwrap();
        data.write_fword(offset::MIN_LEFT_SIDE_BEARING, -100).unwrap();
        data.write_fword(offset::MIN_RIGHT_SIDE_BEARING, -80).unwrap();
        data.write_fword(offset::X_MAX_EXTENT, 2000).unwrap();
        data.write_i16be(offset::CARET_SLOPE_RISE, 1).unwrap();
        data.write_i16be(offset::CARET_SLOPE_RUN, 0).unwrap();
        data.write_i16be(offset::CARET_OFFSET, 0).unwrap();
        data.write_i16be(offset::METRIC_DATA_FORMAT, 0).unwrap();
        data.write_u16be(offset::NUM_H_METRICS, 258).unwrap();
        data.readable()
    }

    #[test]
    fn test_read_fields() {
        let hhea = HheaTable::new(sample_hhea()).unwrap();
        assert_eq!(hhea.version(), Ok(0x0001_0000));
        assert_eq!(hhea.ascender(), Ok(1900));
        assert_eq!(hhea.descender(), Ok(-500));
        assert_eq!(hhea.line_gap(), Ok(0));
        assert_eq!(hhea.advance_width_max(), Ok(2048));
        assert_eq!(hhea.min_left_side_bearing(), Ok(-100));
        assert_eq!(hhea.min_right_side_bearing(), Ok(-80));
        assert_eq!(hhea.x_max_extent(), Ok(2000));
        assert_eq!(hhea.caret_slope_rise(), Ok(1));
        assert_eq!(hhea.metric_data_format(), Ok(0));
        assert_eq!(hhea.num_h_metrics(), Ok(258));
    }

    #[test]
    fn test_short_region_rejected() {
        let data = ReadableFontData::new(vec![0; HheaTable::MIN_LENGTH - 1]);
        assert!(HheaTable::new(data).is_err());
    }

    #[test]
    fn test_builder_edit() {
        let mut builder = HheaBuilder::from_readable(sample_hhea());
        assert_eq!(builder.ascender().unwrap(), 1900);
        assert!(!builder.is_dirty());

        builder.set_ascender(2100).unwrap();
        builder.set_num_h_metrics(260).unwrap();
        assert!(builder.is_dirty());

        let hhea = builder.build().unwrap();
        assert_eq!(hhea.ascender(), Ok(2100));
        assert_eq!(hhea.num_h_metrics(), Ok(260));
        // Untouched fields survive the rebuild.
        assert_eq!(hhea.descender(), Ok(-500));
    }

    #[test]
    fn test_clean_build_preserves_bytes() {
        let source = sample_hhea();
        let mut builder = HheaBuilder::from_readable(source.clone());
        // Reading through the builder does not dirty it.
        let _ = builder.line_gap().unwrap();
        let hhea = builder.build().unwrap();
        assert_eq!(hhea.data().to_vec(), source.to_vec());
    }

    #[test]
    fn test_builder_edits_do_not_alias_source() {
        let source = sample_hhea();
        let mut builder = HheaBuilder::from_readable(source.clone());
        builder.set_ascender(1).unwrap();
        assert_eq!(source.read_fword(offset::ASCENDER), Ok(1900));
    }
}
