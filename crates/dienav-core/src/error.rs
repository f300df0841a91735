//! # Error Types
//!
//! Error handling for the debug-info engine.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.
//!
//! ## What is (and isn't) an error
//!
//! Most lookups in this crate never produce a `DwarfError`. A missing
//! attribute, a record without a parent or a lookup that finds nothing are
//! ordinary outcomes and are reported through caller-supplied fail values or
//! an invalid [`Die`](crate::die::Die). Errors are reserved for things the
//! caller may want to surface: unreadable files, undecodable units, references
//! that point outside every known unit, and types the active type system
//! cannot represent.

use thiserror::Error;

use crate::identity::UserId;
use crate::reference::DieRef;

/// Main error type for debug-info operations
///
/// ## Error Categories
///
/// 1. **Input errors**: Io, Object, Decode
/// 2. **Lookup errors**: UnitNotFound, InvalidReference, UnknownUserId
/// 3. **Type-system errors**: UnsupportedType
#[derive(Error, Debug)]
pub enum DwarfError
{
    /// I/O error while reading an object file from disk
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The object file container could not be parsed
    ///
    /// This wraps errors from the `object` crate (bad ELF/Mach-O headers,
    /// compressed sections that fail to inflate, etc.).
    #[error("Object file error: {0}")]
    Object(#[from] object::Error),

    /// The DWARF byte stream is malformed
    ///
    /// Raised by `gimli` while reading unit headers, abbreviations or
    /// attribute values, tagged with the step that was running.
    #[error("Failed to decode {context}: {source}")]
    Decode
    {
        /// Description of what was being decoded
        context: String,
        /// Underlying gimli error
        #[source]
        source: gimli::Error,
    },

    /// No compilation unit starts at, or contains, the given offset
    #[error("No compilation unit at offset 0x{0:08x}")]
    UnitNotFound(u64),

    /// A reference names a unit that exists but no record at that offset
    #[error("Invalid reference {0}")]
    InvalidReference(DieRef),

    /// A user id does not map back to any record of this symbol file
    #[error("Unknown user id {0}")]
    UnknownUserId(UserId),

    /// The type system cannot build a type from this record
    ///
    /// This is the "unresolvable but well-formed" case: the record is valid
    /// DWARF, but either it doesn't describe a type or the active language
    /// plugin has no representation for it.
    #[error("Unsupported type at 0x{offset:08x}: {reason}")]
    UnsupportedType
    {
        /// Absolute offset of the record
        offset: u64,
        /// Why the type system gave up
        reason: String,
    },
}

impl DwarfError
{
    /// Wrap a gimli error with the step that was running when it occurred.
    pub(crate) fn decode(context: impl Into<String>, source: gimli::Error) -> Self
    {
        DwarfError::Decode {
            context: context.into(),
            source,
        }
    }
}

/// Convenience type alias for `Result<T, DwarfError>`
///
/// ```rust
/// use dienav_core::error::Result;
/// fn foo() -> Result<()>
/// {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, DwarfError>;
