//! Synthetic symbol files shared by the integration tests.
//!
//! Each fixture lists its units as `(header, [(depth, record)])`, the same
//! shape a depth-first walk of `.debug_info` produces.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dienav_core::error::{DwarfError, Result};
use dienav_core::records::{AttrValue, Record, RecordStore, RecordStoreBuilder};
use dienav_core::symbols::{RecordDecoder, SymbolFile, SymbolFileOptions};
use dienav_core::types::SourceLanguage;
use dienav_core::unit::UnitHeader;
use gimli::constants;

/// One unit of a synthetic file.
pub struct SyntheticUnit
{
    pub header: UnitHeader,
    pub records: Vec<(usize, Record)>,
}

/// [`RecordDecoder`] over hand-built records; counts decode calls.
pub struct SyntheticDecoder
{
    units: Vec<SyntheticUnit>,
    decodes: Arc<AtomicUsize>,
}

impl SyntheticDecoder
{
    pub fn new(units: Vec<SyntheticUnit>) -> Self
    {
        Self {
            units,
            decodes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of `decode_unit` calls.
    pub fn decode_counter(&self) -> Arc<AtomicUsize>
    {
        Arc::clone(&self.decodes)
    }
}

impl RecordDecoder for SyntheticDecoder
{
    fn unit_headers(&self) -> Result<Vec<UnitHeader>>
    {
        Ok(self.units.iter().map(|unit| unit.header.clone()).collect())
    }

    fn decode_unit(&self, header: &UnitHeader) -> Result<RecordStore>
    {
        self.decodes.fetch_add(1, Ordering::SeqCst);
        let unit = self
            .units
            .iter()
            .find(|unit| unit.header.offset == header.offset)
            .ok_or(DwarfError::UnitNotFound(header.offset))?;

        let mut builder = RecordStoreBuilder::new(header.range());
        for (depth, record) in &unit.records {
            builder.push(*depth, record.clone());
        }
        Ok(builder.finish())
    }
}

pub fn named(offset: u64, tag: gimli::DwTag, has_children: bool, name: &str) -> Record
{
    Record::new(offset, tag, has_children).with_attribute(constants::DW_AT_name, AttrValue::String(Arc::from(name)))
}

pub fn with_pc(record: Record, low: u64, high: u64) -> Record
{
    record
        .with_attribute(constants::DW_AT_low_pc, AttrValue::Address(low))
        .with_attribute(constants::DW_AT_high_pc, AttrValue::Address(high))
}

pub fn with_ref(record: Record, key: gimli::DwAt, target: u64) -> Record
{
    record.with_attribute(key, AttrValue::Reference(target))
}

/// Two adjacent units.
///
/// ```text
/// unit A [0x000, 0x100) C++
///   0x00b compile_unit "a.cpp"
///     0x010 subprogram "main" [0x100, 0x400)
///       0x020 lexical_block [0x100, 0x200)
///         0x028 variable "x" -> 0x060
///     0x040 namespace "geo"
///       0x048 structure_type "Point" (8 bytes)
///         0x050 member "x" -> 0x060 @0
///         0x054 member "y" -> 0x060 @4
///         0x058 subprogram "norm" (declaration)
///     0x060 base_type "int" (4 bytes, signed)
///     0x068 pointer_type -> 0x048
///     0x070 subprogram specification -> 0x058 [0x500, 0x600)
///     0x080 subprogram "loop" specification -> 0x080
///     0x090 variable "v" -> 0x068
/// unit B [0x100, 0x200) C
///   0x10b compile_unit "b.c" [0x700, 0x800)
///     0x110 variable "shared" -> 0x060 (cross-unit)
///     0x120 subprogram "helper" [0x700, 0x780)
///       0x130 lexical_block [0x700, 0x740)
/// ```
pub fn two_units() -> Vec<SyntheticUnit>
{
    let int = constants::DW_ATE_signed.0;
    let unit_a = vec![
        (0, named(0x0b, constants::DW_TAG_compile_unit, true, "a.cpp")),
        (1, with_pc(named(0x10, constants::DW_TAG_subprogram, true, "main"), 0x100, 0x400)),
        (2, with_pc(Record::new(0x20, constants::DW_TAG_lexical_block, true), 0x100, 0x200)),
        (3, with_ref(named(0x28, constants::DW_TAG_variable, false, "x"), constants::DW_AT_type, 0x60)),
        (1, named(0x40, constants::DW_TAG_namespace, true, "geo")),
        (
            2,
            named(0x48, constants::DW_TAG_structure_type, true, "Point")
                .with_attribute(constants::DW_AT_byte_size, AttrValue::Unsigned(8)),
        ),
        (
            3,
            with_ref(named(0x50, constants::DW_TAG_member, false, "x"), constants::DW_AT_type, 0x60)
                .with_attribute(constants::DW_AT_data_member_location, AttrValue::Unsigned(0)),
        ),
        (
            3,
            with_ref(named(0x54, constants::DW_TAG_member, false, "y"), constants::DW_AT_type, 0x60)
                .with_attribute(constants::DW_AT_data_member_location, AttrValue::Unsigned(4)),
        ),
        (
            3,
            named(0x58, constants::DW_TAG_subprogram, false, "norm")
                .with_attribute(constants::DW_AT_declaration, AttrValue::Flag(true)),
        ),
        (
            1,
            named(0x60, constants::DW_TAG_base_type, false, "int")
                .with_attribute(constants::DW_AT_byte_size, AttrValue::Unsigned(4))
                .with_attribute(constants::DW_AT_encoding, AttrValue::Unsigned(u64::from(int))),
        ),
        (
            1,
            with_ref(Record::new(0x68, constants::DW_TAG_pointer_type, false), constants::DW_AT_type, 0x48)
                .with_attribute(constants::DW_AT_byte_size, AttrValue::Unsigned(8)),
        ),
        (
            1,
            with_pc(
                with_ref(Record::new(0x70, constants::DW_TAG_subprogram, false), constants::DW_AT_specification, 0x58),
                0x500,
                0x600,
            ),
        ),
        (
            1,
            with_ref(named(0x80, constants::DW_TAG_subprogram, false, "loop"), constants::DW_AT_specification, 0x80),
        ),
        (1, with_ref(named(0x90, constants::DW_TAG_variable, false, "v"), constants::DW_AT_type, 0x68)),
    ];

    let unit_b = vec![
        (0, with_pc(named(0x10b, constants::DW_TAG_compile_unit, true, "b.c"), 0x700, 0x800)),
        (1, with_ref(named(0x110, constants::DW_TAG_variable, false, "shared"), constants::DW_AT_type, 0x60)),
        (1, with_pc(named(0x120, constants::DW_TAG_subprogram, true, "helper"), 0x700, 0x780)),
        (2, with_pc(Record::new(0x130, constants::DW_TAG_lexical_block, false), 0x700, 0x740)),
    ];

    vec![
        SyntheticUnit {
            header: UnitHeader::new(0x0, 0x100).with_language(SourceLanguage::Cpp),
            records: unit_a,
        },
        SyntheticUnit {
            header: UnitHeader::new(0x100, 0x200).with_language(SourceLanguage::C),
            records: unit_b,
        },
    ]
}

pub fn open(units: Vec<SyntheticUnit>, options: SymbolFileOptions) -> SymbolFile
{
    dienav_utils::init_test_logging();
    SymbolFile::new(SyntheticDecoder::new(units), options).expect("synthetic symbol file")
}

pub fn two_unit_file() -> SymbolFile
{
    open(two_units(), SymbolFileOptions::default())
}
