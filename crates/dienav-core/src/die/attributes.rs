//! Typed attribute access.

use gimli::{constants, DwAt};
use smallvec::SmallVec;

use super::Die;
use crate::records::{AttrValue, DieOffset};

/// One attribute gathered by [`Die::collect_attributes`], with the handle
/// that supplied it.
#[derive(Debug, Clone, Copy)]
pub struct CollectedAttribute<'a>
{
    /// Attribute key.
    pub name: DwAt,
    /// Attribute value.
    pub value: &'a AttrValue,
    /// Record the value was read from (the handle itself, or an abstract
    /// origin / specification it points to).
    pub owner: Die<'a>,
}

impl<'a> Die<'a>
{
    /// Raw value of the first attribute with key `key`.
    #[must_use]
    pub fn attribute(&self, key: DwAt) -> Option<&'a AttrValue>
    {
        self.record?.attribute(key)
    }

    /// Whether the record carries `key`.
    #[must_use]
    pub fn has_attribute(&self, key: DwAt) -> bool
    {
        self.attribute(key).is_some()
    }

    /// String value of `key`, or `fail_value`.
    #[must_use]
    pub fn attribute_as_string<'b>(&self, key: DwAt, fail_value: &'b str) -> &'b str
    where
        'a: 'b,
    {
        self.attribute(key).and_then(AttrValue::as_str).unwrap_or(fail_value)
    }

    /// Unsigned value of `key`, or `fail_value`.
    #[must_use]
    pub fn attribute_as_unsigned(&self, key: DwAt, fail_value: u64) -> u64
    {
        self.attribute(key).and_then(AttrValue::as_unsigned).unwrap_or(fail_value)
    }

    /// Signed value of `key`, or `fail_value`.
    #[must_use]
    pub fn attribute_as_signed(&self, key: DwAt, fail_value: i64) -> i64
    {
        self.attribute(key).and_then(AttrValue::as_signed).unwrap_or(fail_value)
    }

    /// Address value of `key`, or `fail_value`.
    #[must_use]
    pub fn attribute_as_address(&self, key: DwAt, fail_value: u64) -> u64
    {
        self.attribute(key).and_then(AttrValue::as_address).unwrap_or(fail_value)
    }

    /// Referenced offset of `key`, or `fail_value`.
    #[must_use]
    pub fn attribute_as_reference(&self, key: DwAt, fail_value: DieOffset) -> DieOffset
    {
        self.attribute(key).and_then(AttrValue::as_reference).unwrap_or(fail_value)
    }

    /// Flag value of `key`, or `fail_value`.
    #[must_use]
    pub fn attribute_as_flag(&self, key: DwAt, fail_value: bool) -> bool
    {
        self.attribute(key).and_then(AttrValue::as_flag).unwrap_or(fail_value)
    }

    /// Record referenced by `key`, in any unit of the symbol file.
    #[must_use]
    pub fn referenced_entity(&self, key: DwAt) -> Die<'a>
    {
        match self.attribute(key).and_then(AttrValue::as_reference) {
            Some(offset) => self.die_at_offset(offset),
            None => Die::default(),
        }
    }

    /// Attributes of this record, merged with those inherited through
    /// `DW_AT_abstract_origin` and `DW_AT_specification`.
    ///
    /// Each indirection consumes one unit of `depth`. Inherited attributes
    /// never include `DW_AT_sibling` or `DW_AT_declaration`, nor keys that
    /// were already collected.
    #[must_use]
    pub fn collect_attributes(&self, depth: u32) -> SmallVec<[CollectedAttribute<'a>; 16]>
    {
        let mut out = SmallVec::new();
        self.collect_into(&mut out, depth, true);
        out
    }

    fn collect_into(&self, out: &mut SmallVec<[CollectedAttribute<'a>; 16]>, depth: u32, direct: bool)
    {
        let Some(record) = self.record else {
            return;
        };

        let mut origins = SmallVec::<[Die<'a>; 2]>::new();
        for entry in record.attributes() {
            if !direct {
                if matches!(entry.name, constants::DW_AT_sibling | constants::DW_AT_declaration) {
                    continue;
                }
                if out.iter().any(|collected| collected.name == entry.name) {
                    continue;
                }
            }

            out.push(CollectedAttribute {
                name: entry.name,
                value: &entry.value,
                owner: *self,
            });

            if depth > 0 && matches!(entry.name, constants::DW_AT_abstract_origin | constants::DW_AT_specification) {
                let origin = self.referenced_entity(entry.name);
                if origin.is_valid() && origin != *self {
                    origins.push(origin);
                }
            }
        }

        for origin in origins {
            origin.collect_into(out, depth - 1, false);
        }
    }
}

#[cfg(test)]
mod tests
{
    use std::sync::Arc;

    use gimli::constants;

    use crate::records::{AttrValue, Record, RecordStoreBuilder};
    use crate::typesystem::CFamilyTypeSystem;
    use crate::unit::{CompileUnit, UnitHeader};

    fn unit() -> CompileUnit
    {
        let mut builder = RecordStoreBuilder::new(0x0..0x100);
        builder
            .push(0, Record::new(0x0b, constants::DW_TAG_compile_unit, true))
            .push(
                1,
                Record::new(0x20, constants::DW_TAG_subprogram, false)
                    .with_attribute(constants::DW_AT_name, AttrValue::String("inner".into()))
                    .with_attribute(constants::DW_AT_declaration, AttrValue::Flag(true))
                    .with_attribute(constants::DW_AT_decl_line, AttrValue::Unsigned(7))
                    .with_attribute(constants::DW_AT_sibling, AttrValue::Reference(0x40)),
            )
            .push(
                1,
                Record::new(0x40, constants::DW_TAG_subprogram, false)
                    .with_attribute(constants::DW_AT_specification, AttrValue::Reference(0x20))
                    .with_attribute(constants::DW_AT_decl_line, AttrValue::Unsigned(12))
                    .with_attribute(constants::DW_AT_low_pc, AttrValue::Address(0x1000)),
            )
            .push(
                1,
                Record::new(0x60, constants::DW_TAG_subprogram, false)
                    .with_attribute(constants::DW_AT_abstract_origin, AttrValue::Reference(0x40)),
            );
        CompileUnit::with_records(UnitHeader::new(0x0, 0x100), builder.finish(), Arc::new(CFamilyTypeSystem::new()))
    }

    #[test]
    fn test_fail_values()
    {
        let unit = unit();
        let die = unit.die_at(0x20);
        assert_eq!(die.attribute_as_string(constants::DW_AT_name, "?"), "inner");
        assert_eq!(die.attribute_as_string(constants::DW_AT_producer, "?"), "?");
        assert_eq!(die.attribute_as_unsigned(constants::DW_AT_decl_line, 0), 7);
        assert_eq!(die.attribute_as_signed(constants::DW_AT_decl_line, -1), 7);
        assert_eq!(die.attribute_as_unsigned(constants::DW_AT_name, 42), 42);
        assert!(die.attribute_as_flag(constants::DW_AT_declaration, false));
        assert_eq!(die.attribute_as_address(constants::DW_AT_low_pc, 0xdead), 0xdead);
        assert_eq!(die.attribute_as_reference(constants::DW_AT_sibling, 0), 0x40);
    }

    #[test]
    fn test_referenced_entity_inside_unit()
    {
        let unit = unit();
        let definition = unit.die_at(0x40);
        assert_eq!(definition.referenced_entity(constants::DW_AT_specification), unit.die_at(0x20));
        assert!(!definition.referenced_entity(constants::DW_AT_type).is_valid());
    }

    #[test]
    fn test_collect_attributes_merges_origins()
    {
        let unit = unit();
        let concrete = unit.die_at(0x60);

        let shallow = concrete.collect_attributes(0);
        assert_eq!(shallow.len(), 1);

        let merged = concrete.collect_attributes(2);
        let names: Vec<_> = merged.iter().map(|attr| attr.name).collect();
        assert!(names.contains(&constants::DW_AT_name));
        assert!(!names.contains(&constants::DW_AT_declaration));
        assert!(!names.contains(&constants::DW_AT_sibling));

        // The definition's line wins over the declaration's.
        let line = merged.iter().find(|attr| attr.name == constants::DW_AT_decl_line).unwrap();
        assert_eq!(line.value.as_unsigned(), Some(12));
        assert_eq!(line.owner, unit.die_at(0x40));
    }
}
