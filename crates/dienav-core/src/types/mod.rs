//! # Types
//!
//! Plain value types shared across the engine: file addresses, address
//! ranges, source languages, symbol names and declaration locations.

pub mod address;
pub mod symbols;

// Re-export all public types
pub use address::{Address, AddressRange};
pub use symbols::{DeclLocation, SourceLanguage, SymbolName};
