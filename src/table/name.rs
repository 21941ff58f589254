//! `name` naming table.
//!
//! The read side resolves a name by its (platform, encoding, language, name
//! id) key and decodes UTF-16BE strings for the Unicode and Windows
//! platforms. The builder keeps a live map of entries and retains the
//! as-parsed mapping so edits can be reverted wholesale.

use std::collections::BTreeMap;

use encoding_rs::UTF_16BE;
use log::warn;

use crate::binary::read::{ReadArray, ReadFixed, ReadableFontData};
use crate::binary::write::{WritableFontData, WriteBinary, WriteBuffer, WriteContext};
use crate::binary::U16Be;
use crate::error::{DataError, TableError, WriteError};
use crate::size;
use crate::table::{Builder, FontDataTable, TableModel};

pub mod platform_id {
    pub const UNICODE: u16 = 0;
    pub const MACINTOSH: u16 = 1;
    pub const WINDOWS: u16 = 3;
}

/// Encoding ids for the Windows platform.
pub mod windows_encoding_id {
    pub const SYMBOL: u16 = 0;
    pub const UNICODE_BMP: u16 = 1;
}

/// Language ids for the Windows platform.
pub mod windows_language_id {
    pub const ENGLISH_US: u16 = 0x409;
}

pub mod name_id {
    pub const COPYRIGHT_NOTICE: u16 = 0;
    pub const FONT_FAMILY_NAME: u16 = 1;
    pub const FONT_SUBFAMILY_NAME: u16 = 2;
    pub const UNIQUE_ID: u16 = 3;
    pub const FULL_FONT_NAME: u16 = 4;
    pub const VERSION_STRING: u16 = 5;
    pub const POSTSCRIPT_NAME: u16 = 6;
}

const HEADER_SIZE: usize = 3 * size::U16;
const RECORD_SIZE: usize = 6 * size::U16;

/// The key identifying one name table entry.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NameEntryId {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub language_id: u16,
    pub name_id: u16,
}

impl NameEntryId {
    /// True if the entry's string data is UTF-16BE encoded.
    fn is_utf16be(&self) -> bool {
        self.platform_id == platform_id::UNICODE
            || (self.platform_id == platform_id::WINDOWS
                && self.encoding_id != windows_encoding_id::SYMBOL)
    }
}

/// One record of the name table's record array.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NameRecord {
    pub id: NameEntryId,
    /// Length of the string data in bytes.
    pub length: u16,
    /// Offset of the string data from the start of the string storage.
    pub offset: u16,
}

impl ReadFixed for NameRecord {
    const SIZE: usize = RECORD_SIZE;

    fn read(data: &ReadableFontData, offset: usize) -> Result<Self, DataError> {
        let id = NameEntryId {
            platform_id: data.read_u16be(offset)?,
            encoding_id: data.read_u16be(offset + 2)?,
            language_id: data.read_u16be(offset + 4)?,
            name_id: data.read_u16be(offset + 6)?,
        };
        let length = data.read_u16be(offset + 8)?;
        let offset = data.read_u16be(offset + 10)?;
        Ok(NameRecord { id, length, offset })
    }
}

/// `name` — naming table.
pub struct NameTable {
    data: ReadableFontData,
}

impl FontDataTable for NameTable {
    const MIN_LENGTH: usize = HEADER_SIZE;

    fn bind(data: ReadableFontData) -> Self {
        NameTable { data }
    }

    fn new(data: ReadableFontData) -> Result<Self, TableError> {
        if data.len() < Self::MIN_LENGTH {
            return Err(TableError::Malformed);
        }
        let table = Self::bind(data);
        let count = usize::from(table.count()?);
        if HEADER_SIZE + count * RECORD_SIZE > table.data.len() {
            return Err(TableError::Malformed);
        }
        Ok(table)
    }

    fn data(&self) -> &ReadableFontData {
        &self.data
    }
}

impl NameTable {
    /// Table format, 0 or 1.
    pub fn format(&self) -> Result<u16, DataError> {
        self.data.read_u16be(0)
    }

    /// Number of name records.
    pub fn count(&self) -> Result<u16, DataError> {
        self.data.read_u16be(2)
    }

    /// Offset of the string storage from the start of the table.
    pub fn string_offset(&self) -> Result<u16, DataError> {
        self.data.read_u16be(4)
    }

    /// The name record array.
    pub fn records(&self) -> Result<ReadArray<NameRecord>, DataError> {
        let count = usize::from(self.count()?);
        ReadArray::new(self.data.slice_from(HEADER_SIZE)?, count)
    }

    /// The raw string bytes of the entry identified by `id`, or `None` if the
    /// table has no such entry.
    pub fn name_bytes(&self, id: &NameEntryId) -> Result<Option<Vec<u8>>, TableError> {
        let string_offset = usize::from(self.string_offset()?);
        for record in &self.records()? {
            if record.id == *id {
                let start = string_offset + usize::from(record.offset);
                let string = self.data.slice(start, usize::from(record.length))?;
                return Ok(Some(string.to_vec()));
            }
        }
        Ok(None)
    }

    /// The decoded string of the entry identified by `id`.
    ///
    /// Returns `None` when the table has no such entry, when the entry's
    /// platform does not store UTF-16BE, or when the stored bytes are not
    /// valid UTF-16BE.
    pub fn name(&self, id: &NameEntryId) -> Result<Option<String>, TableError> {
        if !id.is_utf16be() {
            return Ok(None);
        }
        match self.name_bytes(id)? {
            Some(bytes) => match UTF_16BE.decode_without_bom_handling_and_without_replacement(&bytes) {
                Some(name) => Ok(Some(name.into_owned())),
                None => {
                    warn!("name entry is not valid UTF-16BE");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }
}

fn encode_utf16be(name: &str) -> Vec<u8> {
    name.encode_utf16().flat_map(u16::to_be_bytes).collect()
}

/// Builder state for `name`: the live entry map plus the as-parsed mapping
/// retained for revert.
pub struct NameModel {
    entries: BTreeMap<NameEntryId, Vec<u8>>,
    original: BTreeMap<NameEntryId, Vec<u8>>,
}

impl TableModel for NameModel {
    type Table = NameTable;

    fn sub_build(data: &ReadableFontData) -> Result<Self, TableError> {
        let table = NameTable::new(data.clone())?;
        let string_offset = usize::from(table.string_offset()?);
        let mut entries = BTreeMap::new();
        for record in &table.records()? {
            let start = string_offset + usize::from(record.offset);
            let string = table.data.slice(start, usize::from(record.length))?;
            entries.insert(record.id, string.to_vec());
        }
        let original = entries.clone();
        Ok(NameModel { entries, original })
    }

    /// Serialize as format 0: header, records in key order, then the string
    /// data concatenated in the same order.
    fn sub_serialize(&self, buffer: &mut WriteBuffer) -> Result<(), WriteError> {
        U16Be::write(buffer, 0u16)?;
        U16Be::write(buffer, u16::try_from(self.entries.len())?)?;
        let string_offset = buffer.placeholder::<U16Be, u16>()?;

        let mut offset = 0usize;
        for (id, string) in &self.entries {
            U16Be::write(buffer, id.platform_id)?;
            U16Be::write(buffer, id.encoding_id)?;
            U16Be::write(buffer, id.language_id)?;
            U16Be::write(buffer, id.name_id)?;
            U16Be::write(buffer, u16::try_from(string.len())?)?;
            U16Be::write(buffer, u16::try_from(offset)?)?;
            offset += string.len();
        }

        let storage_start = u16::try_from(buffer.bytes_written())?;
        buffer.write_placeholder(string_offset, storage_start)?;
        for string in self.entries.values() {
            buffer.write_bytes(string)?;
        }
        Ok(())
    }
}

/// Builder for the `name` table.
pub struct NameTableBuilder {
    builder: Builder<NameModel>,
}

impl NameTableBuilder {
    pub fn from_readable(data: ReadableFontData) -> NameTableBuilder {
        NameTableBuilder {
            builder: Builder::from_readable(data),
        }
    }

    pub fn from_writable(data: WritableFontData) -> NameTableBuilder {
        NameTableBuilder {
            builder: Builder::from_writable(data),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.builder.is_dirty()
    }

    pub fn build(&mut self) -> Result<NameTable, TableError> {
        self.builder.build()
    }

    /// True if an entry with this id exists.
    pub fn has(&mut self, id: &NameEntryId) -> Result<bool, TableError> {
        Ok(self.builder.model()?.entries.contains_key(id))
    }

    /// The current string bytes of the entry, if present.
    pub fn name_bytes(&mut self, id: &NameEntryId) -> Result<Option<Vec<u8>>, TableError> {
        Ok(self.builder.model()?.entries.get(id).cloned())
    }

    /// Remove the entry with this id. Returns whether an entry was removed;
    /// removing an absent entry leaves the builder clean.
    pub fn remove(&mut self, id: &NameEntryId) -> Result<bool, TableError> {
        if !self.has(id)? {
            return Ok(false);
        }
        self.builder.model_mut()?.entries.remove(id);
        Ok(true)
    }

    /// An edit handle for the entry with this id, creating an empty entry if
    /// none exists. Marks the builder dirty.
    pub fn name_builder(&mut self, id: NameEntryId) -> Result<NameEntryBuilder<'_>, TableError> {
        let model = self.builder.model_mut()?;
        model.entries.entry(id).or_default();
        Ok(NameEntryBuilder {
            model: self.builder.model_mut()?,
            id,
        })
    }

    /// Restore every entry to its as-parsed state, including entries that
    /// were removed, and mark the builder clean. Reverting an untouched
    /// builder is a no-op; reverting twice is the same as reverting once.
    pub fn revert_names(&mut self) {
        if let Some(model) = self.builder.peek_model_mut() {
            model.entries = model.original.clone();
        }
        self.builder.set_dirty(false);
    }
}

/// An edit handle for one name table entry.
pub struct NameEntryBuilder<'a> {
    model: &'a mut NameModel,
    id: NameEntryId,
}

impl NameEntryBuilder<'_> {
    pub fn id(&self) -> NameEntryId {
        self.id
    }

    /// Replace the entry's string, encoded as the entry's platform stores it.
    pub fn set_name(&mut self, name: &str) {
        let bytes = if self.id.is_utf16be() {
            encode_utf16be(name)
        } else {
            name.as_bytes().to_vec()
        };
        self.set_name_bytes(bytes);
    }

    /// Replace the entry's string with raw bytes.
    pub fn set_name_bytes(&mut self, bytes: Vec<u8>) {
        self.model.entries.insert(self.id, bytes);
    }

    pub fn name_bytes(&self) -> &[u8] {
        // NOTE(unwrap): name_builder inserted the entry before handing out
        // the handle, and only the handle can touch the map while it lives
        self.model.entries.get(&self.id).map(Vec::as_slice).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name_id: u16) -> NameEntryId {
        NameEntryId {
            platform_id: platform_id::WINDOWS,
            encoding_id: windows_encoding_id::UNICODE_BMP,
            language_id: windows_language_id::ENGLISH_US,
            name_id,
        }
    }

    fn sample_name_table() -> ReadableFontData {
        let mut model = NameModel {
            entries: BTreeMap::new(),
            original: BTreeMap::new(),
        };
        model
            .entries
            .insert(entry(name_id::FONT_FAMILY_NAME), encode_utf16be("Test Family"));
        model
            .entries
            .insert(entry(name_id::FULL_FONT_NAME), encode_utf16be("Test Family Regular"));
        let mut buffer = WriteBuffer::new();
        model.sub_serialize(&mut buffer).unwrap();
        ReadableFontData::new(buffer.into_inner())
    }

    #[test]
    fn test_read_names() {
        let table = NameTable::new(sample_name_table()).unwrap();
        assert_eq!(table.format(), Ok(0));
        assert_eq!(table.count(), Ok(2));
        assert_eq!(
            table.name(&entry(name_id::FONT_FAMILY_NAME)).unwrap(),
            Some(String::from("Test Family"))
        );
        assert_eq!(
            table.name(&entry(name_id::FULL_FONT_NAME)).unwrap(),
            Some(String::from("Test Family Regular"))
        );
        assert_eq!(table.name(&entry(name_id::POSTSCRIPT_NAME)).unwrap(), None);
    }

    #[test]
    fn test_name_bytes_round_trip() {
        let table = NameTable::new(sample_name_table()).unwrap();
        let bytes = table
            .name_bytes(&entry(name_id::FONT_FAMILY_NAME))
            .unwrap()
            .unwrap();
        assert_eq!(bytes, encode_utf16be("Test Family"));
    }

    #[test]
    fn test_invalid_utf16_is_none() {
        let mut builder = NameTableBuilder::from_readable(sample_name_table());
        builder
            .name_builder(entry(name_id::VERSION_STRING))
            .unwrap()
            // An odd byte count cannot be UTF-16BE.
            .set_name_bytes(vec![0x00]);
        let table = builder.build().unwrap();
        assert_eq!(table.name(&entry(name_id::VERSION_STRING)).unwrap(), None);
        assert_eq!(
            table.name_bytes(&entry(name_id::VERSION_STRING)).unwrap(),
            Some(vec![0x00])
        );
    }

    #[test]
    fn test_malformed_header() {
        // Record array runs past the region.
        let mut data = WritableFontData::new();
        data.write_u16be(0, 0).unwrap();
        data.write_u16be(2, 5).unwrap();
        data.write_u16be(4, 6).unwrap();
        assert!(NameTable::new(data.readable()).is_err());
    }

    #[test]
    fn test_remove_absent_entry_stays_clean() {
        let mut builder = NameTableBuilder::from_readable(sample_name_table());
        assert!(!builder.remove(&entry(name_id::POSTSCRIPT_NAME)).unwrap());
        assert!(!builder.is_dirty());
        assert!(builder.remove(&entry(name_id::FULL_FONT_NAME)).unwrap());
        assert!(builder.is_dirty());
    }

    #[test]
    fn test_revert_is_idempotent() {
        let source = sample_name_table();
        let mut builder = NameTableBuilder::from_readable(source.clone());
        builder
            .name_builder(entry(name_id::FONT_FAMILY_NAME))
            .unwrap()
            .set_name("Changed");
        builder.revert_names();
        builder.revert_names();
        assert!(!builder.is_dirty());
        let table = builder.build().unwrap();
        assert_eq!(table.data().to_vec(), source.to_vec());
    }

    #[test]
    fn test_serialized_key_order_and_offsets() {
        let mut builder = NameTableBuilder::from_readable(sample_name_table());
        builder
            .name_builder(entry(name_id::COPYRIGHT_NOTICE))
            .unwrap()
            .set_name("c");
        let table = builder.build().unwrap();

        // Records sort by key, so the new entry comes first.
        let records: Vec<NameRecord> = table.records().unwrap().iter().collect();
        assert_eq!(records[0].id.name_id, name_id::COPYRIGHT_NOTICE);
        assert_eq!(records[0].offset, 0);
        // Offsets accumulate through the concatenated string storage.
        assert_eq!(records[1].offset, records[0].length);
        assert_eq!(
            usize::from(table.string_offset().unwrap()),
            HEADER_SIZE + records.len() * RECORD_SIZE
        );
    }
}
