//! Names, address ranges and the diagnostic dump.

use std::fmt;

use gimli::constants;
use smallvec::SmallVec;

use super::Die;
use crate::records::AttrValue;
use crate::symbols::demangle::make_symbol_name;
use crate::types::{AddressRange, DeclLocation, SymbolName};

/// Indirection depth used when merging inherited attributes for
/// [`Die::names_and_ranges`] when no symbol file supplies one.
pub const DEFAULT_ATTRIBUTE_DEPTH: u32 = 4;

/// Everything a symbol table needs to know about a function-like record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamesAndRanges<'a>
{
    /// `DW_AT_name`.
    pub name: Option<&'a str>,
    /// `DW_AT_linkage_name` (or its MIPS spelling).
    pub mangled: Option<&'a str>,
    /// Code ranges covered by the record.
    pub ranges: SmallVec<[AddressRange; 4]>,
    /// Declaration location.
    pub decl: DeclLocation,
    /// Call-site location (inlined subroutines).
    pub call: DeclLocation,
    /// `DW_AT_frame_base` expression bytes.
    pub frame_base: Option<&'a [u8]>,
}

impl<'a> Die<'a>
{
    /// `DW_AT_name`.
    #[must_use]
    pub fn name(&self) -> Option<&'a str>
    {
        self.attribute(constants::DW_AT_name).and_then(AttrValue::as_str)
    }

    /// Linkage name: `DW_AT_linkage_name`, then `DW_AT_MIPS_linkage_name`.
    #[must_use]
    pub fn mangled_name(&self) -> Option<&'a str>
    {
        self.attribute(constants::DW_AT_linkage_name)
            .or_else(|| self.attribute(constants::DW_AT_MIPS_linkage_name))
            .and_then(AttrValue::as_str)
    }

    /// Name used in public symbol tables: the mangled name if present,
    /// otherwise the plain name.
    #[must_use]
    pub fn pubname(&self) -> Option<&'a str>
    {
        self.mangled_name().or_else(|| self.name())
    }

    /// Public name with demangling and language detection applied.
    #[must_use]
    pub fn symbol_name(&self) -> Option<SymbolName>
    {
        let raw = self.pubname()?;
        Some(make_symbol_name(raw.to_string(), self.language()))
    }

    /// Fully qualified name as rendered by the unit's type system.
    #[must_use]
    pub fn qualified_name(&self) -> Option<String>
    {
        if !self.is_valid() {
            return None;
        }
        self.unit?.type_system().qualified_name(*self)
    }

    /// Code ranges: `DW_AT_ranges`, or `DW_AT_low_pc` with `DW_AT_high_pc`
    /// in address form or as a length from `low_pc`.
    #[must_use]
    pub fn ranges(&self) -> SmallVec<[AddressRange; 4]>
    {
        let mut ranges = SmallVec::new();
        if let Some(AttrValue::Ranges(list)) = self.attribute(constants::DW_AT_ranges) {
            ranges.extend(list.iter().copied().filter(|range| range.begin <= range.end));
            return ranges;
        }

        let Some(low) = self.attribute(constants::DW_AT_low_pc).and_then(AttrValue::as_address) else {
            return ranges;
        };
        let high = match self.attribute(constants::DW_AT_high_pc) {
            Some(AttrValue::Address(high)) => *high,
            Some(value) => value.as_unsigned().map_or(low, |len| low.saturating_add(len)),
            None => low,
        };
        if low <= high {
            ranges.push(AddressRange::new(low, high));
        }
        ranges
    }

    /// Names, ranges and locations, with attributes inherited from the
    /// abstract origin or specification filled in.
    #[must_use]
    pub fn names_and_ranges(&self) -> NamesAndRanges<'a>
    {
        let mut out = NamesAndRanges::default();
        if !self.is_valid() {
            return out;
        }

        let depth = self
            .file
            .map_or(DEFAULT_ATTRIBUTE_DEPTH, |file| file.options().attribute_depth());
        let mut saw_ranges = false;
        for attr in self.collect_attributes(depth) {
            match attr.name {
                constants::DW_AT_name => out.name = out.name.or(attr.value.as_str()),
                constants::DW_AT_linkage_name | constants::DW_AT_MIPS_linkage_name => {
                    out.mangled = out.mangled.or(attr.value.as_str());
                }
                constants::DW_AT_low_pc | constants::DW_AT_high_pc | constants::DW_AT_ranges if !saw_ranges => {
                    // Ranges come from one record only, never mixed.
                    out.ranges = attr.owner.ranges();
                    saw_ranges = true;
                }
                constants::DW_AT_decl_file => out.decl.file = out.decl.file.or(attr.value.as_unsigned()),
                constants::DW_AT_decl_line => out.decl.line = out.decl.line.or(as_u32(attr.value)),
                constants::DW_AT_decl_column => out.decl.column = out.decl.column.or(as_u32(attr.value)),
                constants::DW_AT_call_file => out.call.file = out.call.file.or(attr.value.as_unsigned()),
                constants::DW_AT_call_line => out.call.line = out.call.line.or(as_u32(attr.value)),
                constants::DW_AT_call_column => out.call.column = out.call.column.or(as_u32(attr.value)),
                constants::DW_AT_frame_base => {
                    if let AttrValue::Block(bytes) = attr.value {
                        out.frame_base = out.frame_base.or(Some(&bytes[..]));
                    }
                }
                _ => {}
            }
        }
        out
    }

    /// Render the record and up to `recurse_depth` levels of descendants.
    ///
    /// Diagnostic output only; the format is not stable.
    pub fn dump(&self, out: &mut impl fmt::Write, recurse_depth: u32) -> fmt::Result
    {
        if !self.is_valid() {
            return writeln!(out, "<invalid die>");
        }
        self.dump_at(out, 0, recurse_depth)
    }

    fn dump_at(&self, out: &mut impl fmt::Write, level: usize, remaining: u32) -> fmt::Result
    {
        let Some(record) = self.record else {
            return Ok(());
        };
        let indent = level * 2;
        writeln!(out, "{:indent$}0x{:08x}: {}", "", record.offset(), record.tag())?;
        for entry in record.attributes() {
            writeln!(out, "{:indent$}  {} ({})", "", entry.name, entry.value)?;
        }
        if remaining > 0 {
            for child in self.children() {
                child.dump_at(out, level + 1, remaining - 1)?;
            }
        }
        Ok(())
    }
}

fn as_u32(value: &AttrValue) -> Option<u32>
{
    value.as_unsigned().and_then(|v| u32::try_from(v).ok())
}

#[cfg(test)]
mod tests
{
    use std::sync::Arc;

    use gimli::constants;

    use crate::records::{AttrValue, Record, RecordStoreBuilder};
    use crate::types::{AddressRange, SourceLanguage};
    use crate::typesystem::RustTypeSystem;
    use crate::unit::{CompileUnit, UnitHeader};

    fn unit() -> CompileUnit
    {
        let ranges: Arc<[AddressRange]> = Arc::from(vec![AddressRange::new(0x100, 0x180), AddressRange::new(0x200, 0x220)]);
        let mut builder = RecordStoreBuilder::new(0x0..0x100);
        builder
            .push(0, Record::new(0x0b, constants::DW_TAG_compile_unit, true))
            .push(
                1,
                Record::new(0x20, constants::DW_TAG_subprogram, true)
                    .with_attribute(constants::DW_AT_name, AttrValue::String("main".into()))
                    .with_attribute(
                        constants::DW_AT_linkage_name,
                        AttrValue::String("_ZN4demo4main17h0123456789abcdefE".into()),
                    )
                    .with_attribute(constants::DW_AT_low_pc, AttrValue::Address(0x1000))
                    .with_attribute(constants::DW_AT_high_pc, AttrValue::Unsigned(0x40))
                    .with_attribute(constants::DW_AT_decl_line, AttrValue::Unsigned(3))
                    .with_attribute(constants::DW_AT_frame_base, AttrValue::Block(Arc::from(&[0x56u8][..]))),
            )
            .push(
                2,
                Record::new(0x40, constants::DW_TAG_inlined_subroutine, false)
                    .with_attribute(constants::DW_AT_abstract_origin, AttrValue::Reference(0x60))
                    .with_attribute(constants::DW_AT_ranges, AttrValue::Ranges(ranges))
                    .with_attribute(constants::DW_AT_call_line, AttrValue::Unsigned(9)),
            )
            .push(
                1,
                Record::new(0x60, constants::DW_TAG_subprogram, false)
                    .with_attribute(constants::DW_AT_name, AttrValue::String("helper".into()))
                    .with_attribute(constants::DW_AT_decl_line, AttrValue::Unsigned(20))
                    .with_attribute(constants::DW_AT_inline, AttrValue::Unsigned(1)),
            );
        CompileUnit::with_records(
            UnitHeader::new(0x0, 0x100).with_language(SourceLanguage::Rust),
            builder.finish(),
            Arc::new(RustTypeSystem::new()),
        )
    }

    #[test]
    fn test_high_pc_as_length()
    {
        let unit = unit();
        let ranges = unit.die_at(0x20).ranges();
        assert_eq!(ranges.as_slice(), &[AddressRange::new(0x1000, 0x1040)]);
    }

    #[test]
    fn test_names()
    {
        let unit = unit();
        let main = unit.die_at(0x20);
        assert_eq!(main.name(), Some("main"));
        assert_eq!(main.pubname(), Some("_ZN4demo4main17h0123456789abcdefE"));

        let symbol = main.symbol_name().unwrap();
        assert_eq!(symbol.language(), SourceLanguage::Rust);
        assert_eq!(symbol.display_name(), "demo::main");
    }

    #[test]
    fn test_names_and_ranges_inherits_from_origin()
    {
        let unit = unit();
        let info = unit.die_at(0x40).names_and_ranges();
        assert_eq!(info.name, Some("helper"));
        assert_eq!(info.ranges.len(), 2);
        assert_eq!(info.call.line, Some(9));
        assert_eq!(info.decl.line, Some(20));

        let main = unit.die_at(0x20).names_and_ranges();
        assert_eq!(main.frame_base, Some(&[0x56u8][..]));
    }

    #[test]
    fn test_dump_respects_depth()
    {
        let unit = unit();
        let mut shallow = String::new();
        unit.root_die().dump(&mut shallow, 0).unwrap();
        assert_eq!(shallow.lines().count(), 1);
        assert!(shallow.starts_with("0x0000000b: DW_TAG_compile_unit"));

        let mut deep = String::new();
        unit.root_die().dump(&mut deep, 2).unwrap();
        assert!(deep.contains("    0x00000040: DW_TAG_inlined_subroutine"));
        assert!(deep.contains("DW_AT_name (\"main\")"));
    }
}
