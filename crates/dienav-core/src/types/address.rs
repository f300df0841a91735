//! File address and address range types.

use std::fmt;
use std::ops::{Add, Sub};

/// Strongly typed file address
///
/// Addresses handled by this crate are *file* addresses: the values found in
/// `DW_AT_low_pc`, `DW_AT_high_pc` and range lists, before any load slide is
/// applied. Translating a runtime address into a file address is the job of
/// the module loader.
///
/// ## Example
///
/// ```rust
/// use dienav_core::types::Address;
///
/// let addr = Address::from(0x1000);
/// let next_addr = addr + 0x100;
/// assert_eq!(next_addr.value(), 0x1100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(u64);

impl Address
{
    /// The null address (0x0)
    pub const ZERO: Self = Address(0);

    /// Create a new address from a `u64` value
    ///
    /// ```rust
    /// use dienav_core::types::Address;
    ///
    /// const TEXT_START: Address = Address::new(0x401000);
    /// assert_eq!(TEXT_START.value(), 0x401000);
    /// ```
    #[must_use]
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Get the raw `u64` value of this address
    #[must_use]
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Add an offset to this address, checking for overflow
    ///
    /// ```rust
    /// use dienav_core::types::Address;
    ///
    /// let addr = Address::from(0x1000);
    /// assert_eq!(addr.checked_add(0x100), Some(Address::from(0x1100)));
    /// assert_eq!(addr.checked_add(u64::MAX), None);
    /// ```
    #[must_use]
    pub fn checked_add(self, offset: u64) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }
}

impl From<u64> for Address
{
    fn from(value: u64) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u64
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:016x}", self.0)
    }
}

impl Add<u64> for Address
{
    type Output = Address;

    fn add(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_add(rhs))
    }
}

impl Sub<u64> for Address
{
    type Output = Address;

    fn sub(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_sub(rhs))
    }
}

/// Half-open address range `[begin, end)`.
///
/// An empty range (`begin == end`) matches only `begin`; compilers emit such
/// ranges for inlined call sites that were folded to a single instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressRange
{
    /// First address covered by the range.
    pub begin: u64,
    /// One past the last address covered by the range.
    pub end: u64,
}

impl AddressRange
{
    /// Build a range from its bounds.
    #[must_use]
    pub const fn new(begin: u64, end: u64) -> Self
    {
        Self { begin, end }
    }

    /// Whether `address` falls inside this range.
    #[must_use]
    pub fn contains(&self, address: Address) -> bool
    {
        let pc = address.value();
        if self.begin == self.end {
            pc == self.begin
        } else {
            pc >= self.begin && pc < self.end
        }
    }

    /// Size of the range in bytes.
    #[must_use]
    pub fn len(&self) -> u64
    {
        self.end.saturating_sub(self.begin)
    }

    /// Whether the range covers no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool
    {
        self.begin >= self.end
    }
}

impl fmt::Display for AddressRange
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "[0x{:x}, 0x{:x})", self.begin, self.end)
    }
}
