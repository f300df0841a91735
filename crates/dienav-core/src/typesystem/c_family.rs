//! C, C++, Objective-C and Objective-C++.

use super::extractor::{Dialect, TypeExtractor};
use super::{ResolvedType, TypeSystem};
use crate::die::Die;
use crate::error::Result;

/// Type system for the C family of languages.
///
/// Also the fallback for units whose language has no dedicated plugin, so
/// it makes no assumptions beyond standard DWARF.
#[derive(Debug, Clone, Copy, Default)]
pub struct CFamilyTypeSystem;

impl CFamilyTypeSystem
{
    /// Create the C-family type system.
    #[must_use]
    pub fn new() -> Self
    {
        Self
    }
}

impl TypeSystem for CFamilyTypeSystem
{
    fn name(&self) -> &'static str
    {
        "c-family"
    }

    fn resolve_type(&self, die: Die<'_>) -> Result<ResolvedType>
    {
        TypeExtractor::new(die, Dialect::C).extract()
    }
}
