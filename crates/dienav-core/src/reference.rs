//! Serializable record references.
//!
//! A [`DieRef`] is the only form of an entity that may be persisted or sent
//! across process boundaries. [`Die`](crate::die::Die) handles borrow their
//! unit and can't outlive it; a `DieRef` is two plain offsets and can be
//! turned back into a handle with
//! [`SymbolFile::resolve_reference`](crate::symbols::SymbolFile::resolve_reference)
//! for as long as the module stays loaded.

use std::fmt;
use std::str::FromStr;

use crate::die::Die;
use crate::records::DieOffset;

const INVALID_OFFSET: u64 = u64::MAX;

/// `(unit offset, record offset)` pair, both absolute `.debug_info` offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DieRef
{
    unit_offset: u64,
    die_offset: DieOffset,
}

impl DieRef
{
    /// Reference produced from an invalid handle.
    pub const INVALID: Self = DieRef {
        unit_offset: INVALID_OFFSET,
        die_offset: INVALID_OFFSET,
    };

    /// Size of the binary encoding.
    pub const ENCODED_LEN: usize = 16;

    /// Build a reference from its two offsets.
    #[must_use]
    pub const fn new(unit_offset: u64, die_offset: DieOffset) -> Self
    {
        Self {
            unit_offset,
            die_offset,
        }
    }

    /// Offset of the owning unit (or of its base object for split units).
    #[must_use]
    pub const fn unit_offset(self) -> u64
    {
        self.unit_offset
    }

    /// Offset of the record.
    #[must_use]
    pub const fn die_offset(self) -> DieOffset
    {
        self.die_offset
    }

    /// Whether this is not [`DieRef::INVALID`].
    #[must_use]
    pub const fn is_valid(self) -> bool
    {
        self.unit_offset != INVALID_OFFSET && self.die_offset != INVALID_OFFSET
    }

    /// Little-endian binary encoding: unit offset then record offset.
    #[must_use]
    pub fn to_bytes(self) -> [u8; Self::ENCODED_LEN]
    {
        let mut out = [0u8; Self::ENCODED_LEN];
        out[..8].copy_from_slice(&self.unit_offset.to_le_bytes());
        out[8..].copy_from_slice(&self.die_offset.to_le_bytes());
        out
    }

    /// Decode [`DieRef::to_bytes`] output; `None` if `bytes` is too short.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self>
    {
        let unit: [u8; 8] = bytes.get(..8)?.try_into().ok()?;
        let die: [u8; 8] = bytes.get(8..16)?.try_into().ok()?;
        Some(Self::new(u64::from_le_bytes(unit), u64::from_le_bytes(die)))
    }
}

impl Default for DieRef
{
    fn default() -> Self
    {
        Self::INVALID
    }
}

impl From<Die<'_>> for DieRef
{
    fn from(die: Die<'_>) -> Self
    {
        die.die_ref()
    }
}

impl fmt::Display for DieRef
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        if self.is_valid() {
            write!(f, "0x{:08x}:0x{:08x}", self.unit_offset, self.die_offset)
        } else {
            f.write_str("<invalid>")
        }
    }
}

/// Error returned when parsing a [`DieRef`] from text fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed die reference: {0}")]
pub struct ParseDieRefError(String);

impl FromStr for DieRef
{
    type Err = ParseDieRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        let s = s.trim();
        if s == "<invalid>" {
            return Ok(Self::INVALID);
        }

        let (unit, die) = s.split_once(':').ok_or_else(|| ParseDieRefError(s.to_string()))?;
        let parse = |part: &str| {
            let digits = part.trim().trim_start_matches("0x").trim_start_matches("0X");
            u64::from_str_radix(digits, 16).map_err(|_| ParseDieRefError(s.to_string()))
        };
        Ok(Self::new(parse(unit)?, parse(die)?))
    }
}
