//! Debugger-wide entity ids.
//!
//! A [`UserId`] is the 64-bit id the rest of the debugger uses to name a
//! record without holding a handle to it. It is built in two halves:
//!
//! - the low 32 bits are the record's absolute `.debug_info` offset, which is
//!   unique inside one symbol file;
//! - the high 32 bits disambiguate id spaces: either the module partition of
//!   the owning [`SymbolFile`](crate::symbols::SymbolFile) or the partition of
//!   a split/dependent unit.
//!
//! The two sources of high bits must never both be set to different values;
//! see [`UserId::combine`].

use std::fmt;

const HIGH_MASK: u64 = 0xffff_ffff_0000_0000;

/// Debugger-wide id for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(u64);

impl UserId
{
    /// Id of an invalid handle.
    pub const INVALID: Self = UserId(u64::MAX);

    /// Create an id from its raw value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self
    {
        Self(value)
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn raw(self) -> u64
    {
        self.0
    }

    /// Whether this is not [`UserId::INVALID`].
    #[must_use]
    pub const fn is_valid(self) -> bool
    {
        self.0 != u64::MAX
    }

    /// High 32 bits (the partition half).
    #[must_use]
    pub const fn high(self) -> u32
    {
        (self.0 >> 32) as u32
    }

    /// Low 32 bits (the record-offset half).
    #[must_use]
    pub const fn low(self) -> u32
    {
        (self.0 & !HIGH_MASK) as u32
    }

    /// OR the unit's high-order bits into an id produced by the symbol file.
    ///
    /// If both carry non-zero, different high halves the id spaces overlap:
    /// this is an id partitioning bug, not bad input. Debug builds assert;
    /// release builds log and keep the OR so the session survives.
    #[must_use]
    pub fn combine(file_id: u64, unit_high_bits: u64) -> Self
    {
        let file_high = file_id & HIGH_MASK;
        let unit_high = unit_high_bits & HIGH_MASK;
        let collides = file_high != 0 && unit_high != 0 && file_high != unit_high;
        debug_assert!(
            !collides,
            "user id partition collision: file id 0x{file_id:016x}, unit bits 0x{unit_high:016x}"
        );
        if collides {
            tracing::error!(
                file_id = format_args!("0x{file_id:016x}"),
                unit_bits = format_args!("0x{unit_high:016x}"),
                "user id partition collision"
            );
        }
        UserId(file_id | unit_high)
    }
}

/// Module-level half of a [`UserId`]: the partition's high bits over the
/// record offset.
///
/// Offsets must fit the low half. A wider one (a DWARF64 `.debug_info` past
/// 4 GiB) would alias another partition: debug builds assert, release builds
/// log and keep the OR.
pub(crate) fn file_id(partition: Option<ModulePartition>, raw_offset: u64) -> u64
{
    let overflows = raw_offset & HIGH_MASK != 0;
    debug_assert!(!overflows, "record offset 0x{raw_offset:016x} overflows the user id offset half");
    if overflows {
        tracing::error!(
            offset = format_args!("0x{raw_offset:016x}"),
            "record offset overflows the user id offset half"
        );
    }
    partition.map_or(raw_offset, |partition| partition.high_bits() | raw_offset)
}

impl fmt::Display for UserId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:016x}", self.0)
    }
}

/// Fixed id-space partition for one loaded module.
///
/// When several modules (or several object files behind one debug map) share
/// a debugger session, each gets a distinct partition so their record
/// offsets can't produce the same [`UserId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModulePartition(u32);

impl ModulePartition
{
    /// Create a partition from its index.
    #[must_use]
    pub const fn new(index: u32) -> Self
    {
        Self(index)
    }

    /// Partition index.
    #[must_use]
    pub const fn index(self) -> u32
    {
        self.0
    }

    /// Partition shifted into the high half of a [`UserId`].
    #[must_use]
    pub const fn high_bits(self) -> u64
    {
        (self.0 as u64) << 32
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_combine_without_partitions_is_raw_offset()
    {
        let id = UserId::combine(0x1234, 0);
        assert_eq!(id.raw(), 0x1234);
        assert_eq!(id.high(), 0);
        assert_eq!(id.low(), 0x1234);
    }

    #[test]
    fn test_combine_takes_either_high_half()
    {
        let partition = ModulePartition::new(3);
        assert_eq!(UserId::combine(partition.high_bits() | 0x40, 0).high(), 3);
        assert_eq!(UserId::combine(0x40, ModulePartition::new(7).high_bits()).high(), 7);
    }

    #[test]
    fn test_combine_accepts_equal_high_halves()
    {
        let bits = ModulePartition::new(2).high_bits();
        assert_eq!(UserId::combine(bits | 0x10, bits).raw(), bits | 0x10);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "partition collision")]
    fn test_combine_asserts_on_collision()
    {
        let _ = UserId::combine(ModulePartition::new(1).high_bits() | 0x10, ModulePartition::new(2).high_bits());
    }

    #[test]
    fn test_file_id_puts_partition_above_offset()
    {
        assert_eq!(file_id(None, 0x10), 0x10);
        assert_eq!(file_id(Some(ModulePartition::new(1)), 0x10), 0x1_0000_0010);
        assert_eq!(file_id(Some(ModulePartition::new(1)), 0xffff_ffff), 0x1_ffff_ffff);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "overflows the user id offset half")]
    fn test_file_id_asserts_on_wide_offset()
    {
        let _ = file_id(Some(ModulePartition::new(1)), 0x1_0000_0010);
    }

    #[test]
    fn test_invalid_id()
    {
        assert!(!UserId::INVALID.is_valid());
        assert!(UserId::from_raw(0).is_valid());
    }
}
