//! End-to-end name table editing: edit, serialize, reload, and revert over a
//! table synthesized through the builder API.

use sfntdata::binary::read::ReadableFontData;
use sfntdata::binary::write::{WritableFontData, WriteBuffer};
use sfntdata::table::name::{
    name_id, platform_id, windows_encoding_id, windows_language_id, NameEntryId, NameTable,
    NameTableBuilder,
};
use sfntdata::table::FontDataTable;

fn entry(name_id: u16) -> NameEntryId {
    NameEntryId {
        platform_id: platform_id::WINDOWS,
        encoding_id: windows_encoding_id::UNICODE_BMP,
        language_id: windows_language_id::ENGLISH_US,
        name_id,
    }
}

/// An empty format 0 name table: zero records, string storage directly after
/// the header.
fn empty_name_table() -> WritableFontData {
    let mut data = WritableFontData::new();
    data.write_u16be(0, 0).unwrap();
    data.write_u16be(2, 0).unwrap();
    data.write_u16be(4, 6).unwrap();
    data
}

fn sample_font_names() -> ReadableFontData {
    let mut builder = NameTableBuilder::from_writable(empty_name_table());
    builder
        .name_builder(entry(name_id::FONT_FAMILY_NAME))
        .unwrap()
        .set_name("Sample Family");
    builder
        .name_builder(entry(name_id::FONT_SUBFAMILY_NAME))
        .unwrap()
        .set_name("Regular");
    builder
        .name_builder(entry(name_id::FULL_FONT_NAME))
        .unwrap()
        .set_name("Sample Family Regular");
    let table = builder.build().unwrap();
    table.data().clone()
}

fn serialize_and_reload(table: &NameTable) -> NameTable {
    let mut buffer = WriteBuffer::new();
    table.serialize(&mut buffer).unwrap();
    NameTable::new(ReadableFontData::new(buffer.into_inner())).unwrap()
}

#[test]
fn change_one_name() {
    let source = sample_font_names();
    let mut builder = NameTableBuilder::from_readable(source);
    builder
        .name_builder(entry(name_id::FONT_FAMILY_NAME))
        .unwrap()
        .set_name("Changed Family");

    let reloaded = serialize_and_reload(&builder.build().unwrap());
    assert_eq!(
        reloaded.name(&entry(name_id::FONT_FAMILY_NAME)).unwrap(),
        Some(String::from("Changed Family"))
    );
    // Untouched entries survive the rebuild.
    assert_eq!(
        reloaded.name(&entry(name_id::FULL_FONT_NAME)).unwrap(),
        Some(String::from("Sample Family Regular"))
    );
    assert_eq!(reloaded.count(), Ok(3));
}

#[test]
fn remove_one_name() {
    let source = sample_font_names();
    let mut builder = NameTableBuilder::from_readable(source);
    assert!(builder.remove(&entry(name_id::FULL_FONT_NAME)).unwrap());

    let reloaded = serialize_and_reload(&builder.build().unwrap());
    assert_eq!(reloaded.count(), Ok(2));
    assert_eq!(reloaded.name(&entry(name_id::FULL_FONT_NAME)).unwrap(), None);
    assert_eq!(
        reloaded.name(&entry(name_id::FONT_SUBFAMILY_NAME)).unwrap(),
        Some(String::from("Regular"))
    );
}

#[test]
fn revert_after_edit_and_remove() {
    let source = sample_font_names();
    let mut builder = NameTableBuilder::from_readable(source.clone());
    builder
        .name_builder(entry(name_id::FONT_FAMILY_NAME))
        .unwrap()
        .set_name("Changed Family");
    builder.remove(&entry(name_id::FULL_FONT_NAME)).unwrap();
    assert!(builder.is_dirty());

    builder.revert_names();
    assert!(!builder.is_dirty());
    assert!(builder.has(&entry(name_id::FULL_FONT_NAME)).unwrap());

    // A reverted builder reproduces its source bytes exactly.
    let table = builder.build().unwrap();
    assert_eq!(table.data().to_vec(), source.to_vec());
}

#[test]
fn build_twice_is_byte_identical() {
    let mut builder = NameTableBuilder::from_readable(sample_font_names());
    builder
        .name_builder(entry(name_id::VERSION_STRING))
        .unwrap()
        .set_name("Version 1.0");
    let first = builder.build().unwrap();
    let second = builder.build().unwrap();
    assert_eq!(first.data().to_vec(), second.data().to_vec());
}
