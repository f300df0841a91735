//! # Entity handles
//!
//! A [`Die`] is a lightweight, non-owning handle to one decoded record: a
//! borrow of the owning [`CompileUnit`], a borrow of the [`Record`], and
//! (when the unit belongs to one) a borrow of the [`SymbolFile`] used for
//! global lookups.
//!
//! Handles are `Copy` and compare by identity: two handles are equal only
//! if they point at the very same unit and record objects. A default
//! handle is *invalid*; every accessor on an invalid handle returns the
//! caller's fail value or another invalid handle instead of panicking.
//!
//! The functionality is split across submodules:
//!
//! - [`attributes`]: typed attribute access and inherited-attribute merging
//! - [`names`]: names, address ranges and the diagnostic dump
//! - [`lookup`]: address to function/block resolution
//! - [`decl_context`]: declaration-context chains

pub mod attributes;
pub mod decl_context;
pub mod lookup;
pub mod names;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ptr;
use std::sync::Arc;

use gimli::{constants, DwTag};

pub use attributes::CollectedAttribute;
pub use decl_context::{DeclContext, DeclContextEntry};
pub use names::NamesAndRanges;

use crate::identity::UserId;
use crate::records::{DieOffset, Record};
use crate::reference::DieRef;
use crate::symbols::SymbolFile;
use crate::typesystem::ResolvedType;
use crate::types::SourceLanguage;
use crate::unit::{CompileUnit, CompileUnitDescriptor};

/// Non-owning handle to one record of a compilation unit.
#[derive(Clone, Copy, Default)]
pub struct Die<'a>
{
    file: Option<&'a SymbolFile>,
    unit: Option<&'a CompileUnit>,
    record: Option<&'a Record>,
}

impl<'a> Die<'a>
{
    pub(crate) fn new(file: Option<&'a SymbolFile>, unit: &'a CompileUnit, record: &'a Record) -> Self
    {
        Self {
            file,
            unit: Some(unit),
            record: Some(record),
        }
    }

    /// Whether the handle points at a record.
    #[must_use]
    pub fn is_valid(&self) -> bool
    {
        self.unit.is_some() && self.record.is_some()
    }

    /// Underlying record.
    #[must_use]
    pub fn record(&self) -> Option<&'a Record>
    {
        self.record
    }

    /// Owning compilation unit.
    #[must_use]
    pub fn unit(&self) -> Option<&'a CompileUnit>
    {
        self.unit
    }

    /// Symbol file the unit belongs to, if any.
    #[must_use]
    pub fn symbol_file(&self) -> Option<&'a SymbolFile>
    {
        self.file
    }

    /// Record tag; `DwTag(0)` on an invalid handle.
    #[must_use]
    pub fn tag(&self) -> DwTag
    {
        self.record.map_or(DwTag(0), Record::tag)
    }

    /// Absolute `.debug_info` offset of the record.
    #[must_use]
    pub fn offset(&self) -> Option<DieOffset>
    {
        self.record.map(Record::offset)
    }

    /// Offset of the record relative to its unit header.
    #[must_use]
    pub fn unit_relative_offset(&self) -> Option<u64>
    {
        let (unit, record) = self.parts()?;
        record.offset().checked_sub(unit.offset())
    }

    /// Language of the owning unit.
    #[must_use]
    pub fn language(&self) -> SourceLanguage
    {
        self.unit.map_or(SourceLanguage::Unknown, CompileUnit::language)
    }

    /// Whether the abbreviation declared children.
    #[must_use]
    pub fn has_children(&self) -> bool
    {
        self.record.is_some_and(Record::has_children)
    }

    /// Whether this is a structure or class type.
    #[must_use]
    pub fn is_struct_or_class(&self) -> bool
    {
        matches!(self.tag(), constants::DW_TAG_structure_type | constants::DW_TAG_class_type)
    }

    /// Parent record in the raw tree.
    #[must_use]
    pub fn parent(&self) -> Die<'a>
    {
        self.link(Record::parent_offset)
    }

    /// First child record.
    #[must_use]
    pub fn first_child(&self) -> Die<'a>
    {
        self.link(Record::first_child_offset)
    }

    /// Next sibling record.
    #[must_use]
    pub fn sibling(&self) -> Die<'a>
    {
        self.link(Record::sibling_offset)
    }

    /// Iterate direct children.
    #[must_use]
    pub fn children(&self) -> Children<'a>
    {
        Children {
            next: self.first_child(),
        }
    }

    /// Serializable reference to this record.
    ///
    /// Split/dependent units report their base object offset as the unit
    /// component.
    #[must_use]
    pub fn die_ref(&self) -> DieRef
    {
        match self.parts() {
            Some((unit, record)) => DieRef::new(unit.reference_offset(), record.offset()),
            None => DieRef::INVALID,
        }
    }

    /// Debugger-wide id of this record.
    ///
    /// With a symbol file the id is registered so that
    /// [`SymbolFile::die_for_user_id`] can map it back later.
    #[must_use]
    pub fn id(&self) -> UserId
    {
        let Some((unit, record)) = self.parts() else {
            return UserId::INVALID;
        };

        let raw = record.offset();
        let file_id = self.file.map_or(raw, |file| file.make_user_id(raw));
        let id = UserId::combine(file_id, unit.id_high_bits());
        if let Some(file) = self.file {
            file.register_user_id(id, self.die_ref());
        }
        id
    }

    /// Handle for the record at absolute `offset`.
    ///
    /// The handle's own unit is searched first (its store may also hold
    /// records attached from a dependent unit); the symbol file is searched
    /// next. Without a symbol file, offsets outside this unit are invalid.
    #[must_use]
    pub fn die_at_offset(&self, offset: DieOffset) -> Die<'a>
    {
        let Some(unit) = self.unit else {
            return Die::default();
        };

        if let Some(record) = unit.records().and_then(|store| store.record_at(offset)) {
            return Die::new(self.file, unit, record);
        }

        self.file.map_or_else(Die::default, |file| file.die_at(offset))
    }

    /// Descriptor of the owning unit.
    #[must_use]
    pub fn compile_unit(&self) -> Option<&'a CompileUnitDescriptor>
    {
        if !self.is_valid() {
            return None;
        }
        match self.file {
            Some(file) => file.compile_unit_for_die(*self),
            None => self.unit?.descriptor(),
        }
    }

    /// Resolve this record as a type through the symbol file's cache.
    ///
    /// `None` if the handle is invalid, has no symbol file, or the unit's
    /// type system can't represent the record.
    #[must_use]
    pub fn resolve_type(&self) -> Option<Arc<ResolvedType>>
    {
        self.file?.resolve_type(*self)
    }

    /// Resolve the type with id `id` through this handle's symbol file.
    #[must_use]
    pub fn resolve_type_uid(&self, id: UserId) -> Option<Arc<ResolvedType>>
    {
        self.file?.resolve_type_by_id(id)
    }

    fn parts(&self) -> Option<(&'a CompileUnit, &'a Record)>
    {
        Some((self.unit?, self.record?))
    }

    fn link(&self, next: fn(&Record) -> Option<DieOffset>) -> Die<'a>
    {
        match self.record.and_then(next) {
            Some(offset) => self.die_at_offset(offset),
            None => Die::default(),
        }
    }
}

fn same_object<T>(a: Option<&T>, b: Option<&T>) -> bool
{
    match (a, b) {
        (Some(a), Some(b)) => ptr::eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

impl PartialEq for Die<'_>
{
    fn eq(&self, other: &Self) -> bool
    {
        same_object(self.unit, other.unit) && same_object(self.record, other.record)
    }
}

impl Eq for Die<'_> {}

impl Hash for Die<'_>
{
    fn hash<H: Hasher>(&self, state: &mut H)
    {
        self.unit.map(ptr::from_ref).hash(state);
        self.record.map(ptr::from_ref).hash(state);
    }
}

impl fmt::Debug for Die<'_>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        if self.is_valid() {
            write!(f, "Die({} {})", self.die_ref(), self.tag())
        } else {
            f.write_str("Die(<invalid>)")
        }
    }
}

/// Iterator over the direct children of a record.
#[derive(Debug, Clone)]
pub struct Children<'a>
{
    next: Die<'a>,
}

impl<'a> Iterator for Children<'a>
{
    type Item = Die<'a>;

    fn next(&mut self) -> Option<Self::Item>
    {
        if !self.next.is_valid() {
            return None;
        }
        let current = self.next;
        self.next = current.sibling();
        Some(current)
    }
}
