//! Debuggee address type.

use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use crate::error::RemoraError;

/// Strongly typed address in the debuggee's address space
///
/// This wrapper around `u64` keeps debuggee addresses from being mixed up with
/// sizes, counts, or offsets. 32-bit targets still use a `u64`; the pointer
/// width only matters when reading a pointer out of memory.
///
/// ## Example
///
/// ```rust
/// use remora_core::types::Address;
///
/// let addr = Address::from(0x1000);
/// let next_addr = addr + 0x100; // Add offset
/// assert_eq!(next_addr.value(), 0x1100);
/// assert!(Address::NULL.is_null());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(u64);

impl Address
{
    /// The null address (0x0)
    ///
    /// Handles at this address are NULL: navigation through them yields NULL
    /// or an empty sequence without touching the backend.
    pub const NULL: Self = Address(0);

    /// Create a new address from a `u64` value (usable in const contexts)
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Get the raw `u64` value of this address
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Returns `true` for the null address
    pub const fn is_null(self) -> bool
    {
        self.0 == 0
    }

    /// Add an offset, returning `None` on overflow
    pub fn checked_add(self, offset: u64) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }

    /// Subtract an offset, saturating at zero
    pub fn saturating_sub(self, offset: u64) -> Self
    {
        Address(self.0.saturating_sub(offset))
    }

    /// Address of element `index` in an array of `stride`-byte elements
    /// starting here. Returns `None` on overflow.
    pub fn element(self, index: u64, stride: u64) -> Option<Self>
    {
        index.checked_mul(stride).and_then(|offset| self.checked_add(offset))
    }

    /// Parse a hexadecimal address string as reported by debugger engines
    ///
    /// Accepts an optional `0x`/`0X` prefix and surrounding whitespace.
    ///
    /// ```rust
    /// use remora_core::types::Address;
    ///
    /// assert_eq!(Address::parse_hex("0x7ff61a2b").unwrap(), Address::new(0x7ff6_1a2b));
    /// assert_eq!(Address::parse_hex("DEAD").unwrap(), Address::new(0xdead));
    /// assert!(Address::parse_hex("0xnothex").is_err());
    /// ```
    pub fn parse_hex(text: &str) -> Result<Self, RemoraError>
    {
        let trimmed = text.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        // Engines sometimes print 64-bit addresses with a tick separator
        let digits: String = digits.chars().filter(|c| *c != '`').collect();
        u64::from_str_radix(&digits, 16)
            .map(Address)
            .map_err(|e| RemoraError::InvalidArgument(format!("bad hex address '{text}': {e}")))
    }
}

impl FromStr for Address
{
    type Err = RemoraError;

    /// Parses `0x`-prefixed hex or plain decimal.
    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        let s = s.trim();
        if s.starts_with("0x") || s.starts_with("0X") {
            Self::parse_hex(s)
        } else {
            s.parse::<u64>()
                .map(Address)
                .map_err(|e| RemoraError::InvalidArgument(format!("bad address '{s}': {e}")))
        }
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
        write!(f, "0x{:08x}", self.0)
    }
}

impl fmt::LowerHex for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        fmt::LowerHex::fmt(&self.0, f)
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
