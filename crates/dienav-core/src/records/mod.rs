//! # Records
//!
//! Decoded debug-info nodes and the per-unit store that owns them.
//!
//! A [`Record`] is one DIE after its abbreviation has been applied: the tag,
//! the attribute values, and the structural links to its parent, first child
//! and next sibling. Links are *offsets* into the owning unit's
//! [`RecordStore`], never pointers, so a store is a flat append-only array
//! that can be rebuilt from the byte stream without any pointer patching.

mod store;

use std::fmt;
use std::sync::Arc;

use gimli::{DwAt, DwTag};
use smallvec::SmallVec;

pub use store::{RecordStore, RecordStoreBuilder};

use crate::types::AddressRange;

/// Absolute offset of a record in `.debug_info`.
pub type DieOffset = u64;

/// A single decoded attribute value.
///
/// References are always stored as absolute `.debug_info` offsets, whether
/// the producer used a unit-relative form (`DW_FORM_ref4`) or a section form
/// (`DW_FORM_ref_addr`). This is what lets reference resolution be global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue
{
    /// Unsigned constant (`DW_FORM_data*`, `DW_FORM_udata`, enumerated codes).
    Unsigned(u64),
    /// Signed constant (`DW_FORM_sdata`, `DW_FORM_implicit_const`).
    Signed(i64),
    /// Target address (`DW_FORM_addr`, `DW_FORM_addrx*` once resolved).
    Address(u64),
    /// String (inline or out of line, already resolved).
    String(Arc<str>),
    /// Flag (`DW_FORM_flag`, `DW_FORM_flag_present`).
    Flag(bool),
    /// Reference to another record by absolute offset.
    Reference(DieOffset),
    /// 64-bit type signature (`DW_FORM_ref_sig8`).
    TypeSignature(u64),
    /// Offset into some other debug section (line table, location lists, ...).
    SectionOffset(u64),
    /// Raw block or DWARF expression bytes.
    Block(Arc<[u8]>),
    /// `DW_AT_ranges` list, decoded when the record was decoded.
    Ranges(Arc<[AddressRange]>),
}

impl AttrValue
{
    /// Short name of the value class, used by the dump renderer.
    #[must_use]
    pub fn class_name(&self) -> &'static str
    {
        match self {
            AttrValue::Unsigned(_) => "udata",
            AttrValue::Signed(_) => "sdata",
            AttrValue::Address(_) => "address",
            AttrValue::String(_) => "string",
            AttrValue::Flag(_) => "flag",
            AttrValue::Reference(_) => "reference",
            AttrValue::TypeSignature(_) => "signature",
            AttrValue::SectionOffset(_) => "sec_offset",
            AttrValue::Block(_) => "block",
            AttrValue::Ranges(_) => "ranges",
        }
    }

    /// Interpret the value as an unsigned constant.
    #[must_use]
    pub fn as_unsigned(&self) -> Option<u64>
    {
        match *self {
            AttrValue::Unsigned(value) | AttrValue::SectionOffset(value) => Some(value),
            AttrValue::Signed(value) => u64::try_from(value).ok(),
            AttrValue::Flag(value) => Some(u64::from(value)),
            _ => None,
        }
    }

    /// Interpret the value as a signed constant.
    #[must_use]
    pub fn as_signed(&self) -> Option<i64>
    {
        match *self {
            AttrValue::Signed(value) => Some(value),
            AttrValue::Unsigned(value) => i64::try_from(value).ok(),
            _ => None,
        }
    }

    /// Interpret the value as a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str>
    {
        match self {
            AttrValue::String(value) => Some(value),
            _ => None,
        }
    }

    /// Interpret the value as an address.
    #[must_use]
    pub fn as_address(&self) -> Option<u64>
    {
        match *self {
            AttrValue::Address(value) => Some(value),
            _ => None,
        }
    }

    /// Interpret the value as a record reference.
    #[must_use]
    pub fn as_reference(&self) -> Option<DieOffset>
    {
        match *self {
            AttrValue::Reference(offset) => Some(offset),
            _ => None,
        }
    }

    /// Interpret the value as a flag.
    #[must_use]
    pub fn as_flag(&self) -> Option<bool>
    {
        match *self {
            AttrValue::Flag(value) => Some(value),
            AttrValue::Unsigned(value) => Some(value != 0),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            AttrValue::Unsigned(value) => write!(f, "0x{value:x}"),
            AttrValue::Signed(value) => write!(f, "{value}"),
            AttrValue::Address(value) => write!(f, "0x{value:016x}"),
            AttrValue::String(value) => write!(f, "\"{value}\""),
            AttrValue::Flag(value) => write!(f, "{value}"),
            AttrValue::Reference(offset) => write!(f, "{{0x{offset:08x}}}"),
            AttrValue::TypeSignature(sig) => write!(f, "sig 0x{sig:016x}"),
            AttrValue::SectionOffset(offset) => write!(f, "0x{offset:08x}"),
            AttrValue::Block(bytes) => {
                write!(f, "<0x{:x}>", bytes.len())?;
                for byte in bytes.iter() {
                    write!(f, " {byte:02x}")?;
                }
                Ok(())
            }
            AttrValue::Ranges(ranges) => {
                for (index, range) in ranges.iter().enumerate() {
                    if index > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{range}")?;
                }
                Ok(())
            }
        }
    }
}

/// One `(key, value)` pair of a record's attribute list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeEntry
{
    /// Attribute key (`DW_AT_*`).
    pub name: DwAt,
    /// Decoded value.
    pub value: AttrValue,
}

impl AttributeEntry
{
    /// Pair a key with its value.
    #[must_use]
    pub fn new(name: DwAt, value: AttrValue) -> Self
    {
        Self { name, value }
    }
}

/// Inline capacity for attribute lists; most DIEs carry fewer than eight.
pub(crate) type AttributeList = SmallVec<[AttributeEntry; 8]>;

/// One decoded debug-info node.
///
/// Links are filled in by [`RecordStoreBuilder`]; a record built by hand
/// starts unlinked.
#[derive(Debug, Clone)]
pub struct Record
{
    offset: DieOffset,
    tag: DwTag,
    has_children: bool,
    attributes: AttributeList,
    pub(crate) parent: Option<DieOffset>,
    pub(crate) first_child: Option<DieOffset>,
    pub(crate) sibling: Option<DieOffset>,
}

impl Record
{
    /// Create an unlinked record.
    #[must_use]
    pub fn new(offset: DieOffset, tag: DwTag, has_children: bool) -> Self
    {
        Self {
            offset,
            tag,
            has_children,
            attributes: AttributeList::new(),
            parent: None,
            first_child: None,
            sibling: None,
        }
    }

    /// Append an attribute, builder style.
    #[must_use]
    pub fn with_attribute(mut self, name: DwAt, value: AttrValue) -> Self
    {
        self.push_attribute(name, value);
        self
    }

    /// Append an attribute.
    pub fn push_attribute(&mut self, name: DwAt, value: AttrValue)
    {
        self.attributes.push(AttributeEntry::new(name, value));
    }

    /// Absolute `.debug_info` offset.
    #[must_use]
    pub fn offset(&self) -> DieOffset
    {
        self.offset
    }

    /// Tag of this record.
    #[must_use]
    pub fn tag(&self) -> DwTag
    {
        self.tag
    }

    /// Whether the abbreviation declared children.
    #[must_use]
    pub fn has_children(&self) -> bool
    {
        self.has_children
    }

    /// Attributes in decode order.
    #[must_use]
    pub fn attributes(&self) -> &[AttributeEntry]
    {
        &self.attributes
    }

    /// Value of the first attribute with key `name`.
    #[must_use]
    pub fn attribute(&self, name: DwAt) -> Option<&AttrValue>
    {
        self.attributes.iter().find(|entry| entry.name == name).map(|entry| &entry.value)
    }

    /// Offset of the parent record, if any.
    #[must_use]
    pub fn parent_offset(&self) -> Option<DieOffset>
    {
        self.parent
    }

    /// Offset of the first child record, if any.
    #[must_use]
    pub fn first_child_offset(&self) -> Option<DieOffset>
    {
        self.first_child
    }

    /// Offset of the next sibling record, if any.
    #[must_use]
    pub fn sibling_offset(&self) -> Option<DieOffset>
    {
        self.sibling
    }
}

#[cfg(test)]
mod tests
{
    use gimli::constants;

    use super::*;

    #[test]
    fn test_attribute_lookup_returns_first_match()
    {
        let record = Record::new(0x10, constants::DW_TAG_variable, false)
            .with_attribute(constants::DW_AT_name, AttrValue::String("x".into()))
            .with_attribute(constants::DW_AT_name, AttrValue::String("shadowed".into()));

        assert_eq!(record.attribute(constants::DW_AT_name).and_then(AttrValue::as_str), Some("x"));
        assert!(record.attribute(constants::DW_AT_type).is_none());
    }

    #[test]
    fn test_value_class_conversions()
    {
        assert_eq!(AttrValue::Signed(5).as_unsigned(), Some(5));
        assert_eq!(AttrValue::Signed(-1).as_unsigned(), None);
        assert_eq!(AttrValue::Unsigned(u64::MAX).as_signed(), None);
        assert_eq!(AttrValue::Unsigned(1).as_flag(), Some(true));
        assert_eq!(AttrValue::Address(0x100).as_unsigned(), None);
        assert_eq!(AttrValue::Reference(0x40).as_reference(), Some(0x40));
    }

    #[test]
    fn test_value_display()
    {
        assert_eq!(AttrValue::Reference(0x2a).to_string(), "{0x0000002a}");
        assert_eq!(AttrValue::Block(Arc::from(&[0x91u8, 0x70][..])).to_string(), "<0x2> 91 70");
        let ranges: Arc<[AddressRange]> = Arc::from(vec![AddressRange::new(0x10, 0x20), AddressRange::new(0x30, 0x40)]);
        assert_eq!(AttrValue::Ranges(ranges).to_string(), "[0x10, 0x20) [0x30, 0x40)");
    }
}
