//! # Symbol files
//!
//! A [`SymbolFile`] is the per-module root of the engine. It owns every
//! [`CompileUnit`] of one object file, the decoder that fills them in on
//! demand, and the module-wide caches:
//!
//! - the identity table, mapping [`UserId`]s handed out by [`Die::id`] back
//!   to [`DieRef`]s;
//! - the type cache, mapping type ids to their [`ResolvedType`] (or to the
//!   fact that resolution failed).
//!
//! Both caches are `RwLock` maps: lookups take a read lock, first
//! resolutions a write lock. A poisoned lock is recovered, since every
//! value in the maps is written whole.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use dienav_core::symbols::{SymbolFile, SymbolFileOptions};
//! use dienav_core::types::Address;
//!
//! # fn example() -> dienav_core::error::Result<()> {
//! let file = SymbolFile::open(Path::new("target/debug/app"), SymbolFileOptions::default())?;
//! let function = file.lookup_function(Address::new(0x1_0000_3f20));
//! if let Some(function) = function {
//!     println!("{:?} in {:?}", function.name(), function.compile_unit().and_then(|cu| cu.name.as_deref()));
//! }
//! # Ok(())
//! # }
//! ```

mod decoder;
pub(crate) mod demangle;
pub mod image;
mod options;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::ptr;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub use decoder::{GimliDecoder, RecordDecoder};
pub use image::DwarfSections;
pub use options::{SymbolFileOptions, SymbolFileOptionsBuilder};

use crate::die::Die;
use crate::error::{DwarfError, Result};
use crate::identity::{file_id, ModulePartition, UserId};
use crate::records::{DieOffset, RecordStore};
use crate::reference::DieRef;
use crate::types::Address;
use crate::typesystem::ResolvedType;
use crate::unit::{CompileUnit, CompileUnitDescriptor, UnitId};

type TypeCache = HashMap<UserId, Option<Arc<ResolvedType>>>;

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T>
{
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T>
{
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// All debug info of one loaded module.
pub struct SymbolFile
{
    decoder: Box<dyn RecordDecoder>,
    units: Vec<CompileUnit>,
    options: SymbolFileOptions,
    user_ids: RwLock<HashMap<UserId, DieRef>>,
    types: RwLock<TypeCache>,
}

impl SymbolFile
{
    /// Build a symbol file over `decoder`.
    ///
    /// Only unit headers are read here; records are decoded the first time
    /// each unit is navigated into.
    pub fn new(decoder: impl RecordDecoder + 'static, options: SymbolFileOptions) -> Result<Self>
    {
        let mut headers = decoder.unit_headers()?;
        headers.sort_by_key(|header| header.offset);

        let mut units = Vec::with_capacity(headers.len());
        for (index, header) in headers.into_iter().enumerate() {
            let id = u32::try_from(index).map_err(|_| DwarfError::UnitNotFound(header.offset))?;
            let type_system = options.type_systems().for_language(header.language);
            units.push(CompileUnit::new(UnitId::new(id), header, type_system));
        }

        tracing::info!(
            units = units.len(),
            partition = ?options.partition().map(ModulePartition::index),
            "opened symbol file"
        );

        Ok(Self {
            decoder: Box::new(decoder),
            units,
            options,
            user_ids: RwLock::new(HashMap::new()),
            types: RwLock::new(HashMap::new()),
        })
    }

    /// Build a symbol file from mapped DWARF sections.
    pub fn from_sections(sections: &DwarfSections, options: SymbolFileOptions) -> Result<Self>
    {
        Self::new(GimliDecoder::from_sections(sections)?, options)
    }

    /// Open an ELF or Mach-O file from disk.
    pub fn open(path: &Path, options: SymbolFileOptions) -> Result<Self>
    {
        let sections = image::load_dwarf_sections(path)?;
        Self::from_sections(&sections, options)
    }

    /// Options this file was opened with.
    #[must_use]
    pub fn options(&self) -> &SymbolFileOptions
    {
        &self.options
    }

    /// All units in section order.
    #[must_use]
    pub fn units(&self) -> &[CompileUnit]
    {
        &self.units
    }

    /// Unit with index `id`.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&CompileUnit>
    {
        self.units.get(id.index() as usize)
    }

    /// Unit whose header starts at `offset`, or whose base object offset is
    /// `offset`.
    #[must_use]
    pub fn unit_by_offset(&self, offset: u64) -> Option<&CompileUnit>
    {
        if let Ok(index) = self.units.binary_search_by_key(&offset, CompileUnit::offset) {
            return Some(&self.units[index]);
        }
        self.units
            .iter()
            .find(|unit| unit.header().base_object_offset == Some(offset))
    }

    /// Unit whose section range contains `offset`.
    #[must_use]
    pub fn unit_containing_offset(&self, offset: DieOffset) -> Option<&CompileUnit>
    {
        let index = self.units.partition_point(|unit| unit.offset() <= offset).checked_sub(1)?;
        let unit = &self.units[index];
        unit.contains_offset(offset).then_some(unit)
    }

    /// Records of `unit`, decoding them on first access.
    pub fn decode<'a>(&self, unit: &'a CompileUnit) -> Result<&'a RecordStore>
    {
        unit.records_or_decode(self.decoder.as_ref()).inspect_err(|err| {
            tracing::warn!(unit = %unit.id(), offset = format_args!("0x{:08x}", unit.offset()), %err, "failed to decode unit");
        })
    }

    /// Decode every unit now; returns the total record count.
    pub fn decode_all(&self) -> Result<usize>
    {
        let mut records = 0;
        for unit in &self.units {
            records += self.decode(unit)?.len();
        }
        Ok(records)
    }

    /// Root record of `unit`; invalid if the unit can't be decoded.
    #[must_use]
    pub fn root_die<'a>(&'a self, unit: &'a CompileUnit) -> Die<'a>
    {
        match self.decode(unit) {
            Ok(store) => store
                .root()
                .map_or_else(Die::default, |record| Die::new(Some(self), unit, record)),
            Err(_) => Die::default(),
        }
    }

    /// Record at absolute `.debug_info` offset `offset`, in whichever unit
    /// contains it.
    #[must_use]
    pub fn die_at(&self, offset: DieOffset) -> Die<'_>
    {
        let Some(unit) = self.unit_containing_offset(offset) else {
            return Die::default();
        };
        match self.decode(unit) {
            Ok(store) => store
                .record_at(offset)
                .map_or_else(Die::default, |record| Die::new(Some(self), unit, record)),
            Err(_) => Die::default(),
        }
    }

    /// Turn a serialized reference back into a handle.
    pub fn resolve_reference(&self, reference: DieRef) -> Result<Die<'_>>
    {
        if !reference.is_valid() {
            return Err(DwarfError::InvalidReference(reference));
        }
        // Split units reference through their skeleton's offset, so the
        // owning unit is found by the record and checked against the prefix.
        let unit = self
            .unit_containing_offset(reference.die_offset())
            .filter(|unit| unit.reference_offset() == reference.unit_offset())
            .ok_or(DwarfError::UnitNotFound(reference.unit_offset()))?;
        let record = self
            .decode(unit)?
            .record_at(reference.die_offset())
            .ok_or(DwarfError::InvalidReference(reference))?;
        Ok(Die::new(Some(self), unit, record))
    }

    /// Module-level half of a [`UserId`] for the record at `raw_offset`.
    #[must_use]
    pub fn make_user_id(&self, raw_offset: DieOffset) -> u64
    {
        file_id(self.options.partition(), raw_offset)
    }

    pub(crate) fn register_user_id(&self, id: UserId, reference: DieRef)
    {
        if read(&self.user_ids).contains_key(&id) {
            return;
        }
        write(&self.user_ids).entry(id).or_insert(reference);
    }

    /// Handle for a [`UserId`] previously produced by [`Die::id`].
    ///
    /// Ids never handed out are decoded from their bits: the low half is
    /// taken as the record offset, and the result is accepted only if that
    /// record produces the same id.
    pub fn die_for_user_id(&self, id: UserId) -> Result<Die<'_>>
    {
        if !id.is_valid() {
            return Err(DwarfError::UnknownUserId(id));
        }
        let known = read(&self.user_ids).get(&id).copied();
        if let Some(reference) = known {
            return self.resolve_reference(reference);
        }

        let die = self.die_at(u64::from(id.low()));
        if die.is_valid() && die.id() == id {
            Ok(die)
        } else {
            Err(DwarfError::UnknownUserId(id))
        }
    }

    /// Descriptor of the unit owning `die`; `None` if `die` doesn't belong
    /// to this file.
    #[must_use]
    pub fn compile_unit_for_die<'a>(&'a self, die: Die<'a>) -> Option<&'a CompileUnitDescriptor>
    {
        let unit = die.unit()?;
        let owned = self.unit(unit.id()).is_some_and(|candidate| ptr::eq(candidate, unit));
        if !owned {
            return None;
        }
        unit.descriptor()
    }

    /// Resolve `die` as a type, through the type cache.
    ///
    /// The first call for a record runs its unit's type system; the outcome,
    /// success or failure, is cached under the record's id.
    #[must_use]
    pub fn resolve_type(&self, die: Die<'_>) -> Option<Arc<ResolvedType>>
    {
        if !die.is_valid() {
            return None;
        }
        let id = die.id();
        if let Some(cached) = read(&self.types).get(&id) {
            tracing::trace!(%id, "type cache hit");
            return cached.clone();
        }

        let unit = die.unit()?;
        let resolved = match unit.type_system().resolve_type(die) {
            Ok(resolved) => Some(Arc::new(resolved)),
            Err(err) => {
                tracing::debug!(%id, type_system = unit.type_system().name(), %err, "type resolution failed");
                None
            }
        };

        // Racing resolvers agree on whichever result landed first.
        write(&self.types).entry(id).or_insert(resolved).clone()
    }

    /// Resolve the type with id `id`.
    #[must_use]
    pub fn resolve_type_by_id(&self, id: UserId) -> Option<Arc<ResolvedType>>
    {
        if let Some(cached) = read(&self.types).get(&id) {
            tracing::trace!(%id, "type cache hit");
            return cached.clone();
        }
        let die = self.die_for_user_id(id).ok()?;
        self.resolve_type(die)
    }

    /// Function containing `address`.
    #[must_use]
    pub fn lookup_function(&self, address: Address) -> Option<Die<'_>>
    {
        self.lookup_address(address).map(|(function, _)| function)
    }

    /// Innermost block containing `address`; invalid when `address` is in
    /// no function or directly in a function's body.
    #[must_use]
    pub fn lookup_block(&self, address: Address) -> Die<'_>
    {
        self.search_units(address)
            .map_or_else(Die::default, |(root, _)| root.lookup_deepest_block(address))
    }

    /// Function and innermost block containing `address`.
    #[must_use]
    pub fn lookup_address(&self, address: Address) -> Option<(Die<'_>, Die<'_>)>
    {
        self.search_units(address).map(|(_, found)| found)
    }

    fn search_units(&self, address: Address) -> Option<(Die<'_>, (Die<'_>, Die<'_>))>
    {
        let budget = match self.options.max_lookup_units() {
            0 => usize::MAX,
            limit => limit,
        };

        let mut searched = 0;
        for unit in &self.units {
            let root = self.root_die(unit);
            let ranges = root.ranges();
            if !root.is_valid() || (!ranges.is_empty() && !ranges.iter().any(|range| range.contains(address))) {
                continue;
            }
            if searched == budget {
                tracing::debug!(%address, budget, "address lookup stopped at unit budget");
                return None;
            }
            searched += 1;
            if let Some(found) = root.lookup_address(address) {
                return Some((root, found));
            }
        }
        None
    }
}

impl fmt::Debug for SymbolFile
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("SymbolFile")
            .field("units", &self.units.len())
            .field("options", &self.options)
            .field("user_ids", &read(&self.user_ids).len())
            .field("types", &read(&self.types).len())
            .finish_non_exhaustive()
    }
}
