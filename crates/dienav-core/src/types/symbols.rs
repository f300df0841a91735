//! Source language, symbol name and declaration location types.

use std::fmt;

use gimli::constants;
use gimli::DwLang;

/// Source language of a compilation unit or symbol.
///
/// Compilation units get theirs from `DW_AT_language`; symbol names get
/// theirs from their mangling scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceLanguage
{
    /// C (any standard revision).
    C,
    /// C++ (any standard revision).
    Cpp,
    /// Objective-C.
    ObjC,
    /// Objective-C++.
    ObjCpp,
    /// Rust.
    Rust,
    /// Swift.
    Swift,
    /// Go.
    Go,
    /// Fortran (any standard revision).
    Fortran,
    /// No `DW_AT_language` on the unit.
    #[default]
    Unknown,
    /// A `DW_LANG_*` value this crate has no dedicated variant for.
    Other(u16),
}

impl SourceLanguage
{
    /// Classify a `DW_AT_language` value.
    #[must_use]
    pub fn from_dw_lang(lang: DwLang) -> Self
    {
        match lang {
            constants::DW_LANG_C89 | constants::DW_LANG_C | constants::DW_LANG_C99 | constants::DW_LANG_C11 => {
                SourceLanguage::C
            }
            // C17
            DwLang(0x002c) => SourceLanguage::C,
            constants::DW_LANG_C_plus_plus
            | constants::DW_LANG_C_plus_plus_03
            | constants::DW_LANG_C_plus_plus_11
            | constants::DW_LANG_C_plus_plus_14 => SourceLanguage::Cpp,
            // C++17, C++20
            DwLang(0x002a | 0x002b) => SourceLanguage::Cpp,
            constants::DW_LANG_ObjC => SourceLanguage::ObjC,
            constants::DW_LANG_ObjC_plus_plus => SourceLanguage::ObjCpp,
            constants::DW_LANG_Rust => SourceLanguage::Rust,
            constants::DW_LANG_Swift => SourceLanguage::Swift,
            constants::DW_LANG_Go => SourceLanguage::Go,
            constants::DW_LANG_Fortran77
            | constants::DW_LANG_Fortran90
            | constants::DW_LANG_Fortran95
            | constants::DW_LANG_Fortran03
            | constants::DW_LANG_Fortran08 => SourceLanguage::Fortran,
            DwLang(0) => SourceLanguage::Unknown,
            DwLang(other) => SourceLanguage::Other(other),
        }
    }

    /// Whether this is one of the C family languages (C, C++, Objective-C/C++).
    #[must_use]
    pub fn is_c_family(self) -> bool
    {
        matches!(
            self,
            SourceLanguage::C | SourceLanguage::Cpp | SourceLanguage::ObjC | SourceLanguage::ObjCpp
        )
    }
}

impl fmt::Display for SourceLanguage
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            SourceLanguage::C => "c",
            SourceLanguage::Cpp => "c++",
            SourceLanguage::ObjC => "objective-c",
            SourceLanguage::ObjCpp => "objective-c++",
            SourceLanguage::Rust => "rust",
            SourceLanguage::Swift => "swift",
            SourceLanguage::Go => "go",
            SourceLanguage::Fortran => "fortran",
            SourceLanguage::Unknown => "unknown",
            SourceLanguage::Other(raw) => return write!(f, "DW_LANG(0x{raw:04x})"),
        };
        write!(f, "{label}")
    }
}

/// A function or type name with demangling metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolName
{
    raw: String,
    demangled: Option<String>,
    language: SourceLanguage,
}

impl SymbolName
{
    /// Construct from a raw linkage name.
    #[must_use]
    pub fn new(raw: String, demangled: Option<String>, language: SourceLanguage) -> Self
    {
        Self {
            raw,
            demangled,
            language,
        }
    }

    /// Raw (mangled) name emitted in the object file.
    #[must_use]
    pub fn raw(&self) -> &str
    {
        &self.raw
    }

    /// Demangled human-friendly name if available.
    #[must_use]
    pub fn demangled(&self) -> Option<&str>
    {
        self.demangled.as_deref()
    }

    /// Preferred presentation (demangled fallback to raw).
    #[must_use]
    pub fn display_name(&self) -> &str
    {
        self.demangled.as_deref().unwrap_or(&self.raw)
    }

    /// Language classification for the symbol.
    #[must_use]
    pub fn language(&self) -> SourceLanguage
    {
        self.language
    }
}

impl fmt::Display for SymbolName
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.display_name())
    }
}

/// Source position recorded on a record (`DW_AT_decl_*` or `DW_AT_call_*`).
///
/// `file` is the raw file index into the unit's line-program file table;
/// mapping it to a path is left to the line-table reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeclLocation
{
    /// Line-program file index, if present.
    pub file: Option<u64>,
    /// Line number, if known.
    pub line: Option<u32>,
    /// Column number, if known.
    pub column: Option<u32>,
}

impl DeclLocation
{
    /// Whether no component of the location is known.
    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.file.is_none() && self.line.is_none() && self.column.is_none()
    }
}
