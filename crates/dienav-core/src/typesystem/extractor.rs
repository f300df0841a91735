//! Type record extraction shared by the shipped type systems.

use gimli::{constants, DwAte, DwTag};

use super::{ResolvedType, TypeField, TypeKind, TypeVariant};
use crate::die::Die;
use crate::error::{DwarfError, Result};
use crate::records::AttrValue;
use crate::symbols::demangle::is_trait_object;

const MAX_TYPE_REF_DEPTH: usize = 32;

/// Language-specific rendering and classification rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dialect
{
    C,
    Rust,
}

pub(crate) struct TypeExtractor<'a>
{
    die: Die<'a>,
    dialect: Dialect,
}

impl<'a> TypeExtractor<'a>
{
    pub(crate) fn new(die: Die<'a>, dialect: Dialect) -> Self
    {
        Self { die, dialect }
    }

    pub(crate) fn extract(&self) -> Result<ResolvedType>
    {
        let die = self.die;
        let Some(offset) = die.offset() else {
            return Err(DwarfError::UnsupportedType {
                offset: u64::MAX,
                reason: "invalid handle".to_string(),
            });
        };

        let mut kind = self.kind_for_tag(die.tag()).ok_or_else(|| DwarfError::UnsupportedType {
            offset,
            reason: format!("{} does not describe a type", die.tag()),
        })?;

        let name = die.name().map(str::to_string).or_else(|| self.type_name(die, 0));
        if self.dialect == Dialect::Rust && die.is_struct_or_class() && name.as_deref().is_some_and(is_trait_object) {
            kind = TypeKind::TraitObject;
        }

        let mut fields = Vec::new();
        let mut variants = Vec::new();
        let mut dimensions = Vec::new();
        let mut parameters = Vec::new();

        match die.tag() {
            constants::DW_TAG_structure_type | constants::DW_TAG_class_type | constants::DW_TAG_union_type => {
                for child in die.children() {
                    match child.tag() {
                        constants::DW_TAG_member => fields.push(self.build_field(child)),
                        constants::DW_TAG_variant_part => {
                            variants.extend(self.collect_variants(child));
                            if self.dialect == Dialect::Rust {
                                kind = TypeKind::Enum;
                            }
                        }
                        _ => {}
                    }
                }
            }
            constants::DW_TAG_enumeration_type => variants = self.collect_enumerators(die),
            constants::DW_TAG_array_type => {
                dimensions = die
                    .children()
                    .filter(|child| child.tag() == constants::DW_TAG_subrange_type)
                    .map(subrange_count)
                    .collect();
            }
            constants::DW_TAG_subroutine_type => {
                parameters = die
                    .children()
                    .filter(|child| child.tag() == constants::DW_TAG_formal_parameter)
                    .filter_map(|child| {
                        let ty = child.referenced_entity(constants::DW_AT_type);
                        ty.is_valid().then(|| ty.id())
                    })
                    .collect();
            }
            _ => {}
        }

        let target = die.referenced_entity(constants::DW_AT_type);
        let byte_size = die
            .attribute(constants::DW_AT_byte_size)
            .and_then(AttrValue::as_unsigned)
            .or_else(|| {
                die.attribute(constants::DW_AT_bit_size)
                    .and_then(AttrValue::as_unsigned)
                    .map(|bits| bits.div_ceil(8))
            });

        Ok(ResolvedType {
            id: die.id(),
            die_ref: die.die_ref(),
            qualified_name: die.name().and_then(|_| die.qualified_name()),
            name,
            kind,
            byte_size,
            encoding: die
                .attribute(constants::DW_AT_encoding)
                .and_then(AttrValue::as_unsigned)
                .and_then(|value| u8::try_from(value).ok())
                .map(DwAte),
            target: target.is_valid().then(|| target.id()),
            fields,
            variants,
            dimensions,
            parameters,
            is_declaration: die.attribute_as_flag(constants::DW_AT_declaration, false),
            language: die.language(),
        })
    }

    fn kind_for_tag(&self, tag: DwTag) -> Option<TypeKind>
    {
        Some(match tag {
            constants::DW_TAG_base_type => TypeKind::Base,
            constants::DW_TAG_pointer_type => TypeKind::Pointer,
            constants::DW_TAG_reference_type => TypeKind::Reference,
            constants::DW_TAG_rvalue_reference_type => TypeKind::RvalueReference,
            constants::DW_TAG_ptr_to_member_type => TypeKind::MemberPointer,
            constants::DW_TAG_const_type => TypeKind::Const,
            constants::DW_TAG_volatile_type => TypeKind::Volatile,
            constants::DW_TAG_restrict_type => TypeKind::Restrict,
            constants::DW_TAG_typedef => TypeKind::Typedef,
            constants::DW_TAG_array_type => TypeKind::Array,
            constants::DW_TAG_structure_type => TypeKind::Struct,
            constants::DW_TAG_class_type if self.dialect == Dialect::C => TypeKind::Class,
            constants::DW_TAG_class_type => TypeKind::Struct,
            constants::DW_TAG_union_type => TypeKind::Union,
            constants::DW_TAG_enumeration_type => TypeKind::Enum,
            constants::DW_TAG_subroutine_type => TypeKind::Subroutine,
            constants::DW_TAG_unspecified_type => TypeKind::Unspecified,
            _ => return None,
        })
    }

    fn build_field(&self, member: Die<'_>) -> TypeField
    {
        let ty = member.referenced_entity(constants::DW_AT_type);
        let offset_bits = member
            .attribute(constants::DW_AT_data_bit_offset)
            .and_then(AttrValue::as_unsigned)
            .or_else(|| {
                member
                    .attribute(constants::DW_AT_data_member_location)
                    .and_then(AttrValue::as_unsigned)
                    .and_then(|bytes| bytes.checked_mul(8))
            });

        TypeField {
            name: member.name().map(str::to_string),
            type_id: ty.is_valid().then(|| ty.id()),
            type_name: self.type_name(ty, 0),
            offset_bits,
            bit_size: member.attribute(constants::DW_AT_bit_size).and_then(AttrValue::as_unsigned),
        }
    }

    fn collect_variants(&self, variant_part: Die<'_>) -> Vec<TypeVariant>
    {
        variant_part
            .children()
            .filter(|child| child.tag() == constants::DW_TAG_variant)
            .map(|variant| {
                let fields: Vec<TypeField> = variant
                    .children()
                    .filter(|child| child.tag() == constants::DW_TAG_member)
                    .map(|member| self.build_field(member))
                    .collect();
                // rustc names the variant through its single payload member.
                let name = fields.first().and_then(|field| field.name.clone());
                TypeVariant {
                    name: variant.name().map(str::to_string).or(name),
                    discriminant: variant.attribute(constants::DW_AT_discr_value).and_then(AttrValue::as_signed),
                    fields,
                }
            })
            .collect()
    }

    fn collect_enumerators(&self, enumeration: Die<'_>) -> Vec<TypeVariant>
    {
        enumeration
            .children()
            .filter(|child| child.tag() == constants::DW_TAG_enumerator)
            .map(|enumerator| TypeVariant {
                name: enumerator.name().map(str::to_string),
                discriminant: enumerator
                    .attribute(constants::DW_AT_const_value)
                    .and_then(AttrValue::as_signed),
                fields: Vec::new(),
            })
            .collect()
    }

    /// Display name of `die` as a type, following modifiers until a named
    /// type is found.
    fn type_name(&self, die: Die<'_>, depth: usize) -> Option<String>
    {
        if !die.is_valid() || depth >= MAX_TYPE_REF_DEPTH {
            return None;
        }
        if let Some(name) = die.name() {
            return Some(name.to_string());
        }

        let inner = || {
            self.type_name(die.referenced_entity(constants::DW_AT_type), depth + 1)
                .unwrap_or_else(|| "void".to_string())
        };

        let rendered = match (self.dialect, die.tag()) {
            (Dialect::C, constants::DW_TAG_pointer_type) => format!("{} *", inner()),
            (Dialect::C, constants::DW_TAG_reference_type) => format!("{} &", inner()),
            (Dialect::C, constants::DW_TAG_rvalue_reference_type) => format!("{} &&", inner()),
            (Dialect::Rust, constants::DW_TAG_pointer_type) => format!("*const {}", inner()),
            (Dialect::Rust, constants::DW_TAG_reference_type) => format!("&{}", inner()),
            (_, constants::DW_TAG_const_type) => format!("const {}", inner()),
            (_, constants::DW_TAG_volatile_type) => format!("volatile {}", inner()),
            (Dialect::C, constants::DW_TAG_array_type) => format!("{}{}", inner(), self.array_suffix(die)),
            (Dialect::Rust, constants::DW_TAG_array_type) => {
                let count = die
                    .children()
                    .find(|child| child.tag() == constants::DW_TAG_subrange_type)
                    .and_then(subrange_count);
                match count {
                    Some(count) => format!("[{}; {count}]", inner()),
                    None => format!("[{}]", inner()),
                }
            }
            (Dialect::C, constants::DW_TAG_structure_type) => "(anonymous struct)".to_string(),
            (Dialect::C, constants::DW_TAG_class_type) => "(anonymous class)".to_string(),
            (Dialect::C, constants::DW_TAG_union_type) => "(anonymous union)".to_string(),
            (Dialect::C, constants::DW_TAG_enumeration_type) => "(anonymous enum)".to_string(),
            (_, constants::DW_TAG_subroutine_type) => self.subroutine_name(die, depth),
            _ => return self.type_name(die.referenced_entity(constants::DW_AT_type), depth + 1),
        };
        Some(rendered)
    }

    fn array_suffix(&self, array: Die<'_>) -> String
    {
        array
            .children()
            .filter(|child| child.tag() == constants::DW_TAG_subrange_type)
            .map(|subrange| match subrange_count(subrange) {
                Some(count) => format!("[{count}]"),
                None => "[]".to_string(),
            })
            .collect()
    }

    fn subroutine_name(&self, subroutine: Die<'_>, depth: usize) -> String
    {
        let params: Vec<String> = subroutine
            .children()
            .filter(|child| child.tag() == constants::DW_TAG_formal_parameter)
            .map(|param| {
                self.type_name(param.referenced_entity(constants::DW_AT_type), depth + 1)
                    .unwrap_or_else(|| "?".to_string())
            })
            .collect();
        let ret = self.type_name(subroutine.referenced_entity(constants::DW_AT_type), depth + 1);

        match self.dialect {
            Dialect::C => format!("{} ({})", ret.as_deref().unwrap_or("void"), params.join(", ")),
            Dialect::Rust => match ret {
                Some(ret) => format!("fn({}) -> {ret}", params.join(", ")),
                None => format!("fn({})", params.join(", ")),
            },
        }
    }
}

/// Element count of a `DW_TAG_subrange_type`.
fn subrange_count(subrange: Die<'_>) -> Option<u64>
{
    if let Some(count) = subrange.attribute(constants::DW_AT_count).and_then(AttrValue::as_unsigned) {
        return Some(count);
    }
    let upper = subrange.attribute(constants::DW_AT_upper_bound).and_then(AttrValue::as_signed)?;
    let lower = subrange
        .attribute(constants::DW_AT_lower_bound)
        .and_then(AttrValue::as_signed)
        .unwrap_or(0);
    let count = upper.checked_sub(lower)?.checked_add(1)?;
    u64::try_from(count).ok()
}
