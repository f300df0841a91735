//! # dienav-core
//!
//! Debug-info resolution engine for native debuggers.
//!
//! This crate turns DWARF debug information into a navigable entity graph:
//! - Lazily decoded, per-unit record stores
//! - Copyable entity handles with identity equality
//! - Global cross-unit reference resolution
//! - Serializable references and debugger-wide ids
//! - Address to function / lexical block lookup
//! - Declaration-context chains
//! - On-demand type resolution through per-language type systems
//!
//! ## Layout
//!
//! - [`symbols::SymbolFile`] owns the units of one module and its caches
//! - [`unit::CompileUnit`] owns one unit's [`records::RecordStore`]
//! - [`die::Die`] is a borrowed handle to one record
//! - [`reference::DieRef`] and [`identity::UserId`] name records without
//!   borrowing them
//! - [`typesystem::TypeSystem`] is the per-language resolution delegate
//!
//! Byte-level DWARF decoding is done by `gimli`; object files are mapped with
//! `object`.

pub mod die;
pub mod error;
pub mod identity;
pub mod prelude;
pub mod records;
pub mod reference;
pub mod symbols;
pub mod types;
pub mod typesystem;
pub mod unit;

pub use die::Die;
// Re-export commonly used types
pub use error::{DwarfError, Result};
pub use identity::UserId;
pub use reference::DieRef;
pub use symbols::{SymbolFile, SymbolFileOptions};
