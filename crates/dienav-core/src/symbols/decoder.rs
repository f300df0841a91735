//! Record decoding.
//!
//! The [`RecordDecoder`] trait is the seam between the engine and the raw
//! debug-info bytes: it lists unit headers and turns one unit into a
//! [`RecordStore`]. [`GimliDecoder`] implements it with `gimli`; tests plug
//! in synthetic decoders.

use std::sync::Arc;

use gimli::{constants, AttributeValue, DebugInfoOffset, Dwarf, EndianArcSlice, Reader, RunTimeEndian, Unit};

use super::image::DwarfSections;
use crate::error::{DwarfError, Result};
use crate::records::{AttrValue, Record, RecordStore, RecordStoreBuilder};
use crate::types::{AddressRange, SourceLanguage};
use crate::unit::UnitHeader;

type OwnedReader = EndianArcSlice<RunTimeEndian>;
type OwnedDwarf = Dwarf<OwnedReader>;

/// Source of unit headers and decoded records.
pub trait RecordDecoder: Send + Sync
{
    /// Headers of every unit, in section order.
    fn unit_headers(&self) -> Result<Vec<UnitHeader>>;

    /// Decode every record of the unit described by `header`.
    fn decode_unit(&self, header: &UnitHeader) -> Result<RecordStore>;
}

/// [`RecordDecoder`] over `gimli`.
pub struct GimliDecoder
{
    dwarf: OwnedDwarf,
}

impl GimliDecoder
{
    /// Decoder over mapped sections.
    pub fn from_sections(sections: &DwarfSections) -> Result<Self>
    {
        let endian = sections.endian();
        let dwarf = Dwarf::load(|id| Ok::<_, gimli::Error>(EndianArcSlice::new(sections.section(id), endian)))
            .map_err(|err| DwarfError::decode("DWARF sections", err))?;
        Ok(Self { dwarf })
    }

    fn unit_language(&self, header: &gimli::UnitHeader<OwnedReader>) -> Result<SourceLanguage>
    {
        let abbrevs = self
            .dwarf
            .abbreviations(header)
            .map_err(|err| DwarfError::decode("abbreviation table", err))?;
        let mut cursor = header.entries(&abbrevs);
        let Some((_, root)) = cursor.next_dfs().map_err(|err| DwarfError::decode("unit root", err))? else {
            return Ok(SourceLanguage::Unknown);
        };
        let language = root
            .attr_value(constants::DW_AT_language)
            .map_err(|err| DwarfError::decode("DW_AT_language", err))?;
        Ok(match language {
            Some(AttributeValue::Language(lang)) => SourceLanguage::from_dw_lang(lang),
            _ => SourceLanguage::Unknown,
        })
    }

    fn convert(&self, unit: &Unit<OwnedReader>, unit_offset: u64, attr: &gimli::Attribute<OwnedReader>) -> Result<Option<AttrValue>>
    {
        let value = match attr.value() {
            AttributeValue::Addr(address) => AttrValue::Address(address),
            AttributeValue::DebugAddrIndex(index) => AttrValue::Address(
                self.dwarf
                    .address(unit, index)
                    .map_err(|err| DwarfError::decode("indexed address", err))?,
            ),
            AttributeValue::Flag(flag) => AttrValue::Flag(flag),
            AttributeValue::Data1(value) => AttrValue::Unsigned(value.into()),
            AttributeValue::Data2(value) => AttrValue::Unsigned(value.into()),
            AttributeValue::Data4(value) => AttrValue::Unsigned(value.into()),
            AttributeValue::Data8(value) | AttributeValue::Udata(value) => AttrValue::Unsigned(value),
            AttributeValue::Sdata(value) => AttrValue::Signed(value),
            AttributeValue::UnitRef(offset) => AttrValue::Reference(unit_offset + offset.0 as u64),
            AttributeValue::DebugInfoRef(offset) => AttrValue::Reference(offset.0 as u64),
            AttributeValue::DebugTypesRef(signature) => AttrValue::TypeSignature(signature.0),
            AttributeValue::SecOffset(offset) => AttrValue::SectionOffset(offset as u64),
            AttributeValue::DebugLineRef(offset) => AttrValue::SectionOffset(offset.0 as u64),
            AttributeValue::LocationListsRef(offset) => AttrValue::SectionOffset(offset.0 as u64),
            AttributeValue::Block(bytes) | AttributeValue::Exprloc(gimli::Expression(bytes)) => {
                let bytes = bytes
                    .to_slice()
                    .map_err(|err| DwarfError::decode("block attribute", err))?;
                AttrValue::Block(Arc::from(&*bytes))
            }
            AttributeValue::String(_)
            | AttributeValue::DebugStrRef(_)
            | AttributeValue::DebugStrRefSup(_)
            | AttributeValue::DebugLineStrRef(_)
            | AttributeValue::DebugStrOffsetsIndex(_) => {
                let reader = self
                    .dwarf
                    .attr_string(unit, attr.value())
                    .map_err(|err| DwarfError::decode("string attribute", err))?;
                let text = reader
                    .to_string_lossy()
                    .map_err(|err| DwarfError::decode("string attribute", err))?;
                AttrValue::String(Arc::from(text.as_ref()))
            }
            AttributeValue::RangeListsRef(_) | AttributeValue::DebugRngListsIndex(_) => {
                AttrValue::Ranges(self.ranges(unit, attr.value())?)
            }
            AttributeValue::Language(lang) => AttrValue::Unsigned(lang.0.into()),
            AttributeValue::Encoding(encoding) => AttrValue::Unsigned(encoding.0.into()),
            AttributeValue::Accessibility(access) => AttrValue::Unsigned(access.0.into()),
            AttributeValue::Virtuality(virtuality) => AttrValue::Unsigned(virtuality.0.into()),
            AttributeValue::Inline(inline) => AttrValue::Unsigned(inline.0.into()),
            AttributeValue::FileIndex(index) => AttrValue::Unsigned(index),
            other => {
                tracing::trace!(attribute = %attr.name(), value = ?other, "skipping attribute form");
                return Ok(None);
            }
        };
        Ok(Some(value))
    }

    fn ranges(&self, unit: &Unit<OwnedReader>, value: AttributeValue<OwnedReader>) -> Result<Arc<[AddressRange]>>
    {
        let mut ranges = Vec::new();
        let offset = self
            .dwarf
            .attr_ranges_offset(unit, value)
            .map_err(|err| DwarfError::decode("DW_AT_ranges", err))?;
        if let Some(offset) = offset {
            let mut iter = self
                .dwarf
                .ranges(unit, offset)
                .map_err(|err| DwarfError::decode("range list", err))?;
            while let Some(range) = iter.next().map_err(|err| DwarfError::decode("range list entry", err))? {
                ranges.push(AddressRange::new(range.begin, range.end));
            }
        }
        Ok(ranges.into())
    }
}

impl RecordDecoder for GimliDecoder
{
    fn unit_headers(&self) -> Result<Vec<UnitHeader>>
    {
        let mut headers = Vec::new();
        let mut iter = self.dwarf.units();
        while let Some(header) = iter
            .next()
            .map_err(|err| DwarfError::decode("reading .debug_info unit header", err))?
        {
            let Some(offset) = header.offset().as_debug_info_offset() else {
                continue;
            };
            let start = offset.0 as u64;
            headers.push(UnitHeader {
                offset: start,
                end_offset: start + header.length_including_self() as u64,
                version: header.version(),
                abbrev_offset: header.debug_abbrev_offset().0 as u64,
                address_size: header.address_size(),
                language: self.unit_language(&header)?,
                base_object_offset: None,
                id_partition: None,
            });
        }
        tracing::debug!(units = headers.len(), "read unit headers");
        Ok(headers)
    }

    fn decode_unit(&self, header: &UnitHeader) -> Result<RecordStore>
    {
        let offset = usize::try_from(header.offset).map_err(|_| DwarfError::UnitNotFound(header.offset))?;
        let gimli_header = self
            .dwarf
            .debug_info
            .header_from_offset(DebugInfoOffset(offset))
            .map_err(|err| DwarfError::decode("unit header", err))?;
        let unit = self
            .dwarf
            .unit(gimli_header)
            .map_err(|err| DwarfError::decode("compilation unit", err))?;

        let mut builder = RecordStoreBuilder::new(header.range());
        let mut cursor = unit.entries();
        let mut depth: isize = 0;
        while let Some((delta, entry)) = cursor
            .next_dfs()
            .map_err(|err| DwarfError::decode("traversing DIE tree", err))?
        {
            depth += delta;
            let mut record = Record::new(
                header.offset + entry.offset().0 as u64,
                entry.tag(),
                entry.has_children(),
            );
            let mut attrs = entry.attrs();
            while let Some(attr) = attrs.next().map_err(|err| DwarfError::decode("reading attribute", err))? {
                if let Some(value) = self.convert(&unit, header.offset, &attr)? {
                    record.push_attribute(attr.name(), value);
                }
            }
            builder.push(usize::try_from(depth).unwrap_or(0), record);
        }
        Ok(builder.finish())
    }
}
