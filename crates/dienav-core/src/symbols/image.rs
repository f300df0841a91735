//! Object file parsing and DWARF section loading.
//!
//! This is the thin boundary to the module loader: it maps the DWARF
//! sections of an ELF or Mach-O file into memory and nothing else. No
//! relocations are applied, so the file must be a linked image or a
//! `.dSYM`/`.debug` companion.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use gimli::{RunTimeEndian, SectionId};
use object::{Object, ObjectSection};

use crate::error::Result;

const DWARF_SECTIONS: &[SectionId] = &[
    SectionId::DebugAbbrev,
    SectionId::DebugAddr,
    SectionId::DebugInfo,
    SectionId::DebugLine,
    SectionId::DebugLineStr,
    SectionId::DebugRanges,
    SectionId::DebugRngLists,
    SectionId::DebugStr,
    SectionId::DebugStrOffsets,
    SectionId::DebugTypes,
    SectionId::DebugLoc,
    SectionId::DebugLocLists,
];

/// Raw DWARF section bytes plus the file's byte order.
#[derive(Debug, Clone)]
pub struct DwarfSections
{
    endian: RunTimeEndian,
    sections: HashMap<SectionId, Arc<[u8]>>,
}

impl DwarfSections
{
    /// Assemble sections from already extracted bytes.
    #[must_use]
    pub fn from_parts(endian: RunTimeEndian, sections: impl IntoIterator<Item = (SectionId, Arc<[u8]>)>) -> Self
    {
        Self {
            endian,
            sections: sections.into_iter().collect(),
        }
    }

    /// Byte order of the sections.
    #[must_use]
    pub fn endian(&self) -> RunTimeEndian
    {
        self.endian
    }

    /// Bytes of section `id`; empty if the file doesn't have it.
    #[must_use]
    pub fn section(&self, id: SectionId) -> Arc<[u8]>
    {
        self.sections
            .get(&id)
            .cloned()
            .unwrap_or_else(|| Arc::<[u8]>::from(Vec::new()))
    }

    /// Whether the file has a non-empty `.debug_info`.
    #[must_use]
    pub fn has_debug_info(&self) -> bool
    {
        self.sections.get(&SectionId::DebugInfo).is_some_and(|data| !data.is_empty())
    }
}

/// Read `path` and map its DWARF sections.
pub fn load_dwarf_sections(path: &Path) -> Result<DwarfSections>
{
    let bytes = fs::read(path)?;
    let sections = parse_dwarf_sections(&bytes)?;
    tracing::debug!(
        path = %path.display(),
        sections = sections.sections.len(),
        "loaded DWARF sections"
    );
    Ok(sections)
}

/// Map the DWARF sections of an in-memory object file.
pub fn parse_dwarf_sections(data: &[u8]) -> Result<DwarfSections>
{
    let file = object::File::parse(data)?;
    let endian = if file.is_little_endian() {
        RunTimeEndian::Little
    } else {
        RunTimeEndian::Big
    };

    let mut sections = HashMap::new();
    for &id in DWARF_SECTIONS {
        if let Some(bytes) = load_section_bytes(&file, id)? {
            sections.insert(id, bytes);
        }
    }

    Ok(DwarfSections { endian, sections })
}

fn load_section_bytes(file: &object::File<'_>, id: SectionId) -> Result<Option<Arc<[u8]>>>
{
    // Mach-O spells `.debug_info` as `__debug_info`.
    let name = id.name();
    let macho = format!("__{}", name.trim_start_matches('.'));
    for candidate in [name, macho.as_str()] {
        if let Some(section) = file.section_by_name(candidate) {
            let data = section.uncompressed_data()?;
            return Ok(Some(match data {
                Cow::Borrowed(bytes) => Arc::<[u8]>::from(bytes),
                Cow::Owned(vec) => vec.into(),
            }));
        }
    }
    Ok(None)
}
