//! Compilation units.
//!
//! A [`CompileUnit`] owns the records of one `.debug_info` unit. Records are
//! decoded lazily: the unit starts with only its header, and the first
//! navigation into it runs the decoder exactly once, even under concurrent
//! first access. After that the [`RecordStore`] is immutable and read
//! without locking.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use gimli::constants;
use once_cell::sync::OnceCell;

use crate::die::Die;
use crate::error::Result;
use crate::records::{DieOffset, RecordStore};
use crate::symbols::RecordDecoder;
use crate::typesystem::TypeSystem;
use crate::types::SourceLanguage;

/// Index of a unit inside its symbol file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitId(u32);

impl UnitId
{
    /// Create an id from its raw index.
    #[must_use]
    pub const fn new(index: u32) -> Self
    {
        Self(index)
    }

    /// Raw index.
    #[must_use]
    pub const fn index(self) -> u32
    {
        self.0
    }
}

impl fmt::Display for UnitId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "cu#{}", self.0)
    }
}

/// Everything known about a unit before its records are decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitHeader
{
    /// Offset of the unit header in `.debug_info`.
    pub offset: u64,
    /// One past the unit's last byte.
    pub end_offset: u64,
    /// DWARF version.
    pub version: u16,
    /// Offset of the unit's abbreviation table in `.debug_abbrev`.
    pub abbrev_offset: u64,
    /// Target address size in bytes.
    pub address_size: u8,
    /// `DW_AT_language` of the unit's root record.
    pub language: SourceLanguage,
    /// For units read from a split/dependent object: the offset of the
    /// skeleton unit in the main object. References use it as their unit
    /// component.
    pub base_object_offset: Option<u64>,
    /// High-order id partition contributed by this unit, if any.
    pub id_partition: Option<u32>,
}

impl UnitHeader
{
    /// Header for a DWARF 4, 8-byte-address unit spanning
    /// `offset..end_offset`; other fields take their defaults.
    #[must_use]
    pub fn new(offset: u64, end_offset: u64) -> Self
    {
        Self {
            offset,
            end_offset,
            version: 4,
            abbrev_offset: 0,
            address_size: 8,
            language: SourceLanguage::Unknown,
            base_object_offset: None,
            id_partition: None,
        }
    }

    /// Set the unit language.
    #[must_use]
    pub fn with_language(mut self, language: SourceLanguage) -> Self
    {
        self.language = language;
        self
    }

    /// Section range covered by the unit.
    #[must_use]
    pub fn range(&self) -> Range<u64>
    {
        self.offset..self.end_offset
    }
}

/// Higher-level description of a unit, as tracked by the rest of the
/// debugger (source file name, build directory, producer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileUnitDescriptor
{
    /// Owning unit.
    pub id: UnitId,
    /// Offset of the owning unit.
    pub offset: u64,
    /// `DW_AT_name` of the root record (usually the primary source file).
    pub name: Option<String>,
    /// `DW_AT_comp_dir`.
    pub comp_dir: Option<String>,
    /// `DW_AT_producer`.
    pub producer: Option<String>,
    /// Unit language.
    pub language: SourceLanguage,
}

/// One compilation unit and its lazily decoded records.
pub struct CompileUnit
{
    id: UnitId,
    header: UnitHeader,
    type_system: Arc<dyn TypeSystem>,
    store: OnceCell<RecordStore>,
    descriptor: OnceCell<CompileUnitDescriptor>,
}

impl CompileUnit
{
    pub(crate) fn new(id: UnitId, header: UnitHeader, type_system: Arc<dyn TypeSystem>) -> Self
    {
        Self {
            id,
            header,
            type_system,
            store: OnceCell::new(),
            descriptor: OnceCell::new(),
        }
    }

    /// Build a standalone unit around an already decoded store.
    ///
    /// Handles obtained from such a unit have no symbol file: references
    /// resolve only inside this unit, ids fall back to raw offsets, and type
    /// resolution is unavailable.
    #[must_use]
    pub fn with_records(header: UnitHeader, store: RecordStore, type_system: Arc<dyn TypeSystem>) -> Self
    {
        let unit = Self::new(UnitId::new(0), header, type_system);
        let _ = unit.store.set(store);
        unit
    }

    /// Index of this unit inside its symbol file.
    #[must_use]
    pub fn id(&self) -> UnitId
    {
        self.id
    }

    /// Unit header.
    #[must_use]
    pub fn header(&self) -> &UnitHeader
    {
        &self.header
    }

    /// Offset of the unit header in `.debug_info`.
    #[must_use]
    pub fn offset(&self) -> u64
    {
        self.header.offset
    }

    /// One past the unit's last byte.
    #[must_use]
    pub fn end_offset(&self) -> u64
    {
        self.header.end_offset
    }

    /// Unit offset used in serialized references.
    #[must_use]
    pub fn reference_offset(&self) -> u64
    {
        self.header.base_object_offset.unwrap_or(self.header.offset)
    }

    /// Whether `offset` lies inside this unit's section range.
    #[must_use]
    pub fn contains_offset(&self, offset: DieOffset) -> bool
    {
        self.header.range().contains(&offset)
    }

    /// Unit language.
    #[must_use]
    pub fn language(&self) -> SourceLanguage
    {
        self.header.language
    }

    /// Type system selected for this unit's language.
    #[must_use]
    pub fn type_system(&self) -> &dyn TypeSystem
    {
        self.type_system.as_ref()
    }

    /// High-order bits this unit ORs into user ids.
    #[must_use]
    pub fn id_high_bits(&self) -> u64
    {
        self.header.id_partition.map_or(0, |partition| u64::from(partition) << 32)
    }

    /// Decoded records, or `None` if the unit hasn't been decoded yet.
    #[must_use]
    pub fn records(&self) -> Option<&RecordStore>
    {
        self.store.get()
    }

    /// Whether the unit's records have been decoded.
    #[must_use]
    pub fn is_decoded(&self) -> bool
    {
        self.store.get().is_some()
    }

    /// Decoded records, running `decoder` if this is the first access.
    ///
    /// Concurrent callers block until the single decode finishes. A failed
    /// decode is not cached; the next call tries again.
    pub(crate) fn records_or_decode(&self, decoder: &dyn RecordDecoder) -> Result<&RecordStore>
    {
        self.store.get_or_try_init(|| {
            let store = decoder.decode_unit(&self.header)?;
            tracing::debug!(
                unit = %self.id,
                offset = format_args!("0x{:08x}", self.header.offset),
                records = store.len(),
                "decoded compilation unit"
            );
            Ok(store)
        })
    }

    /// Handle for the root record of an already decoded unit, without a
    /// symbol file attached.
    #[must_use]
    pub fn root_die(&self) -> Die<'_>
    {
        self.store
            .get()
            .and_then(RecordStore::root)
            .map_or_else(Die::default, |record| Die::new(None, self, record))
    }

    /// Handle for the record at `offset` of an already decoded unit,
    /// without a symbol file attached.
    #[must_use]
    pub fn die_at(&self, offset: DieOffset) -> Die<'_>
    {
        self.store
            .get()
            .and_then(|store| store.record_at(offset))
            .map_or_else(Die::default, |record| Die::new(None, self, record))
    }

    /// Unit descriptor built from the root record; `None` until decoded.
    #[must_use]
    pub fn descriptor(&self) -> Option<&CompileUnitDescriptor>
    {
        let root = self.store.get()?.root()?;
        Some(self.descriptor.get_or_init(|| {
            let text = |key| root.attribute(key).and_then(|value| value.as_str()).map(str::to_string);
            CompileUnitDescriptor {
                id: self.id,
                offset: self.header.offset,
                name: text(constants::DW_AT_name),
                comp_dir: text(constants::DW_AT_comp_dir),
                producer: text(constants::DW_AT_producer),
                language: self.header.language,
            }
        }))
    }
}

impl fmt::Debug for CompileUnit
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("CompileUnit")
            .field("id", &self.id)
            .field("header", &self.header)
            .field("type_system", &self.type_system.name())
            .field("decoded", &self.is_decoded())
            .finish()
    }
}
