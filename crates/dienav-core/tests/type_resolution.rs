//! Tests for type resolution through the symbol file's type cache

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use common::{named, two_unit_file, two_units, with_ref, SyntheticDecoder, SyntheticUnit};
use dienav_core::prelude::*;
use dienav_core::typesystem::CFamilyTypeSystem;

#[test]
fn test_struct_resolution()
{
    let file = two_unit_file();
    let point = file.die_at(0x48);
    let ty = point.resolve_type().expect("Point");
    assert_eq!(ty.kind, TypeKind::Struct);
    assert_eq!(ty.name.as_deref(), Some("Point"));
    assert_eq!(ty.qualified_name.as_deref(), Some("geo::Point"));
    assert_eq!(ty.display_name(), "geo::Point");
    assert_eq!(ty.byte_size, Some(8));
    assert_eq!(ty.size_bits(), Some(64));
    assert_eq!(ty.id, point.id());
    assert_eq!(ty.die_ref, point.die_ref());
    assert_eq!(ty.language, SourceLanguage::Cpp);

    let fields: Vec<_> = ty
        .fields
        .iter()
        .map(|field| (field.name.as_deref(), field.type_name.as_deref(), field.offset_bits))
        .collect();
    assert_eq!(fields, vec![(Some("x"), Some("int"), Some(0)), (Some("y"), Some("int"), Some(32))]);
}

#[test]
fn test_targets_are_ids_resolved_on_demand()
{
    let file = two_unit_file();
    let pointer = file.die_at(0x68).resolve_type().expect("pointer");
    assert_eq!(pointer.kind, TypeKind::Pointer);
    assert_eq!(pointer.name.as_deref(), Some("Point *"));

    let target = pointer.target.expect("pointee id");
    let point = file.resolve_type_by_id(target).expect("pointee");
    assert_eq!(point.name.as_deref(), Some("Point"));
    assert!(Arc::ptr_eq(&point, &file.die_at(0x48).resolve_type().expect("cached")));
}

#[test]
fn test_non_types_resolve_to_none()
{
    let file = two_unit_file();
    let variable = file.die_at(0x28);
    assert!(variable.resolve_type().is_none());
    assert!(variable.resolve_type().is_none());
    assert!(file.resolve_type_by_id(UserId::from_raw(0x44)).is_none());
}

#[test]
fn test_cross_unit_type_uses_owning_units_type_system()
{
    let file = two_unit_file();
    let shared = file.die_at(0x110);
    let int = shared.referenced_entity(gimli::constants::DW_AT_type);
    let ty = shared.resolve_type_uid(int.id()).expect("int");
    assert_eq!(ty.kind, TypeKind::Base);
    assert_eq!(ty.encoding, Some(gimli::constants::DW_ATE_signed));
    assert_eq!(ty.language, SourceLanguage::Cpp);
}

#[derive(Debug, Default)]
struct CountingTypeSystem
{
    calls: AtomicUsize,
}

impl TypeSystem for CountingTypeSystem
{
    fn name(&self) -> &'static str
    {
        "counting"
    }

    fn resolve_type(&self, die: Die<'_>) -> Result<ResolvedType>
    {
        self.calls.fetch_add(1, Ordering::SeqCst);
        CFamilyTypeSystem::new().resolve_type(die)
    }

    fn qualified_name(&self, die: Die<'_>) -> Option<String>
    {
        die.name().map(|name| format!("b::{name}"))
    }
}

#[test]
fn test_plugged_type_system_and_cached_failures()
{
    let counting = Arc::new(CountingTypeSystem::default());
    let options = SymbolFileOptions::builder()
        .type_system(SourceLanguage::C, Arc::clone(&counting) as Arc<dyn TypeSystem>)
        .build();
    let file = common::open(two_units(), options);

    assert_eq!(file.units()[1].type_system().name(), "counting");
    assert_eq!(file.units()[0].type_system().name(), "c-family");
    assert_eq!(file.die_at(0x120).qualified_name().as_deref(), Some("b::helper"));

    let shared = file.die_at(0x110);
    assert!(shared.resolve_type().is_none());
    assert!(shared.resolve_type().is_none());
    assert!(file.resolve_type_by_id(shared.id()).is_none());
    assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_concurrent_first_use()
{
    let decoder = SyntheticDecoder::new(two_units());
    let decodes = decoder.decode_counter();
    let file = SymbolFile::new(decoder, SymbolFileOptions::default()).expect("symbol file");

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    let pointer = file.die_at(0x68).resolve_type().expect("pointer");
                    let point = file.resolve_type_by_id(pointer.target.expect("target")).expect("point");
                    (pointer, point)
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().expect("thread")).collect()
    });

    assert_eq!(decodes.load(Ordering::SeqCst), 1);
    let (first_pointer, first_point) = &results[0];
    for (pointer, point) in &results {
        assert!(Arc::ptr_eq(pointer, first_pointer));
        assert!(Arc::ptr_eq(point, first_point));
    }
}

/// Sizes and member offsets large enough to overflow when scaled to bits.
fn oversized_unit() -> Vec<SyntheticUnit>
{
    vec![SyntheticUnit {
        header: UnitHeader::new(0x0, 0x100).with_language(SourceLanguage::C),
        records: vec![
            (0, named(0x0b, gimli::constants::DW_TAG_compile_unit, true, "huge.c")),
            (
                1,
                named(0x10, gimli::constants::DW_TAG_structure_type, true, "Huge")
                    .with_attribute(gimli::constants::DW_AT_byte_size, AttrValue::Unsigned(u64::MAX)),
            ),
            (
                2,
                with_ref(named(0x18, gimli::constants::DW_TAG_member, false, "tail"), gimli::constants::DW_AT_type, 0x20)
                    .with_attribute(gimli::constants::DW_AT_data_member_location, AttrValue::Unsigned(u64::MAX)),
            ),
            (
                1,
                named(0x20, gimli::constants::DW_TAG_base_type, false, "wide")
                    .with_attribute(gimli::constants::DW_AT_byte_size, AttrValue::Unsigned(u64::MAX))
                    .with_attribute(
                        gimli::constants::DW_AT_encoding,
                        AttrValue::Unsigned(u64::from(gimli::constants::DW_ATE_unsigned.0)),
                    ),
            ),
        ],
    }]
}

#[test]
fn test_oversized_offsets_and_sizes_have_no_bit_value()
{
    let file = common::open(oversized_unit(), SymbolFileOptions::default());
    let huge = file.die_at(0x10).resolve_type().expect("Huge");
    assert_eq!(huge.byte_size, Some(u64::MAX));
    assert_eq!(huge.size_bits(), None);
    assert_eq!(huge.fields.len(), 1);
    assert_eq!(huge.fields[0].name.as_deref(), Some("tail"));
    assert_eq!(huge.fields[0].offset_bits, None);

    let wide = file.die_at(0x20).resolve_type().expect("wide");
    assert_eq!(wide.kind, TypeKind::Base);
    assert_eq!(wide.size_bits(), None);
}
