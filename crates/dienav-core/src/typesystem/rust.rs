//! Rust.

use gimli::{constants, DwTag};

use super::extractor::{Dialect, TypeExtractor};
use super::{default_parent_decl_context, ResolvedType, TypeSystem};
use crate::die::Die;
use crate::error::Result;

/// Enumerations own impl items in Rust, so they are contexts too.
const RUST_CONTEXT_TAGS: &[DwTag] = &[
    constants::DW_TAG_compile_unit,
    constants::DW_TAG_partial_unit,
    constants::DW_TAG_namespace,
    constants::DW_TAG_structure_type,
    constants::DW_TAG_union_type,
    constants::DW_TAG_class_type,
    constants::DW_TAG_enumeration_type,
];

/// Type system for Rust units.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustTypeSystem;

impl RustTypeSystem
{
    /// Create the Rust type system.
    #[must_use]
    pub fn new() -> Self
    {
        Self
    }
}

impl TypeSystem for RustTypeSystem
{
    fn name(&self) -> &'static str
    {
        "rust"
    }

    fn resolve_type(&self, die: Die<'_>) -> Result<ResolvedType>
    {
        TypeExtractor::new(die, Dialect::Rust).extract()
    }

    fn parent_declaration_context<'a>(&self, die: Die<'a>) -> Die<'a>
    {
        default_parent_decl_context(die, RUST_CONTEXT_TAGS)
    }

    // Paths never contain anonymous scopes.
    fn qualified_name(&self, die: Die<'_>) -> Option<String>
    {
        die.name()?;
        let context = die.decl_context();
        let parts: Vec<&str> = context
            .entries()
            .iter()
            .rev()
            .filter_map(|entry| entry.name.as_deref())
            .collect();
        Some(parts.join("::"))
    }
}

#[cfg(test)]
mod tests
{
    use std::sync::Arc;

    use gimli::constants;

    use super::*;
    use crate::records::{AttrValue, Record, RecordStoreBuilder};
    use crate::types::SourceLanguage;
    use crate::typesystem::TypeKind;
    use crate::unit::{CompileUnit, UnitHeader};

    fn named(offset: u64, tag: DwTag, name: &str) -> Record
    {
        Record::new(offset, tag, true).with_attribute(constants::DW_AT_name, AttrValue::String(name.into()))
    }

    fn unit() -> CompileUnit
    {
        // mod shapes {
        //     enum Shape { Circle(f64), Square(f64) }
        //     impl Shape { fn area() }
        // }
        // dyn core::fmt::Debug
        let mut builder = RecordStoreBuilder::new(0x0..0x200);
        builder
            .push(0, Record::new(0x0b, constants::DW_TAG_compile_unit, true))
            .push(
                1,
                named(0x10, constants::DW_TAG_base_type, "f64").with_attribute(constants::DW_AT_byte_size, AttrValue::Unsigned(8)),
            )
            .push(1, named(0x18, constants::DW_TAG_namespace, "shapes"))
            .push(
                2,
                named(0x20, constants::DW_TAG_structure_type, "Shape")
                    .with_attribute(constants::DW_AT_byte_size, AttrValue::Unsigned(16)),
            )
            .push(3, Record::new(0x28, constants::DW_TAG_variant_part, true))
            .push(
                4,
                Record::new(0x30, constants::DW_TAG_variant, true)
                    .with_attribute(constants::DW_AT_discr_value, AttrValue::Unsigned(0)),
            )
            .push(
                5,
                named(0x34, constants::DW_TAG_member, "Circle")
                    .with_attribute(constants::DW_AT_type, AttrValue::Reference(0x10)),
            )
            .push(
                4,
                Record::new(0x40, constants::DW_TAG_variant, true)
                    .with_attribute(constants::DW_AT_discr_value, AttrValue::Unsigned(1)),
            )
            .push(
                5,
                named(0x44, constants::DW_TAG_member, "Square")
                    .with_attribute(constants::DW_AT_type, AttrValue::Reference(0x10)),
            )
            .push(2, named(0x50, constants::DW_TAG_enumeration_type, "Kind"))
            .push(3, named(0x58, constants::DW_TAG_subprogram, "describe"))
            .push(1, named(0x60, constants::DW_TAG_structure_type, "dyn core::fmt::Debug"))
            .push(1, Record::new(0x70, constants::DW_TAG_namespace, true))
            .push(2, named(0x78, constants::DW_TAG_structure_type, "Hidden"));
        CompileUnit::with_records(
            UnitHeader::new(0x0, 0x200).with_language(SourceLanguage::Rust),
            builder.finish(),
            Arc::new(RustTypeSystem::new()),
        )
    }

    #[test]
    fn test_variant_part_is_enum()
    {
        let unit = unit();
        let shape = RustTypeSystem.resolve_type(unit.die_at(0x20)).unwrap();
        assert_eq!(shape.kind, TypeKind::Enum);
        assert_eq!(shape.qualified_name.as_deref(), Some("shapes::Shape"));
        let names: Vec<_> = shape.variants.iter().filter_map(|variant| variant.name.as_deref()).collect();
        assert_eq!(names, vec!["Circle", "Square"]);
        assert_eq!(shape.variants[1].discriminant, Some(1));
        assert_eq!(shape.variants[0].fields[0].type_name.as_deref(), Some("f64"));
    }

    #[test]
    fn test_dyn_is_trait_object()
    {
        let unit = unit();
        let object = RustTypeSystem.resolve_type(unit.die_at(0x60)).unwrap();
        assert_eq!(object.kind, TypeKind::TraitObject);
    }

    #[test]
    fn test_enumeration_is_context()
    {
        let unit = unit();
        let describe = unit.die_at(0x58);
        assert_eq!(describe.parent_decl_context(), unit.die_at(0x50));
        assert_eq!(describe.qualified_name().as_deref(), Some("shapes::Kind::describe"));
    }

    #[test]
    fn test_anonymous_scopes_are_skipped()
    {
        let unit = unit();
        assert_eq!(unit.die_at(0x78).qualified_name().as_deref(), Some("Hidden"));
    }
}
