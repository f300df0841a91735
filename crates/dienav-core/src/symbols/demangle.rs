//! Symbol demangling utilities.
//!
//! Linkage names found in `DW_AT_linkage_name` are mangled. This module
//! demangles them and classifies their language:
//!
//! - **Rust**: legacy (`_ZN...E` with a hash) and v0 (`_R...`) schemes,
//!   demangled with `rustc_demangle`
//! - **C++**: Itanium ABI names (`_Z...`); left mangled, but classified
//! - **C**: unmangled names
//!
//! The owning unit's `DW_AT_language` is more reliable than the mangling
//! pattern, so it wins whenever it is known.

use rustc_demangle::try_demangle;

use crate::types::{SourceLanguage, SymbolName};

/// Create a `SymbolName` from a raw linkage name.
///
/// `unit_language` is the language of the unit the name was read from;
/// pass [`SourceLanguage::Unknown`] to classify by mangling pattern only.
pub(crate) fn make_symbol_name(raw: String, unit_language: SourceLanguage) -> SymbolName
{
    // `{:#}` drops the trailing `::h<hash>` of legacy Rust symbols.
    let demangled = try_demangle(&raw).ok().map(|d| format!("{d:#}"));
    let language = match unit_language {
        SourceLanguage::Unknown => {
            if raw.starts_with("_R") || (raw.starts_with("_ZN") && demangled.is_some()) || raw.contains("::") {
                SourceLanguage::Rust
            } else if raw.starts_with("_Z") {
                SourceLanguage::Cpp
            } else {
                SourceLanguage::Unknown
            }
        }
        known => known,
    };

    SymbolName::new(raw, demangled, language)
}

/// Check if a type name represents a Rust trait object.
///
/// Trait objects are named `dyn Trait` or `(dyn Trait)`, possibly nested
/// inside another type's name.
pub(crate) fn is_trait_object(name: &str) -> bool
{
    let trimmed = name.trim();
    trimmed.starts_with("dyn ") || trimmed.starts_with("(dyn ") || trimmed.contains(" as dyn ") || trimmed.contains(" dyn ")
}
