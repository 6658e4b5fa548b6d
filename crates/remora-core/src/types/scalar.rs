//! Scalar decoding for values read out of debuggee memory.
//!
//! A handle's declared type decides how its bytes are interpreted: integer
//! width and signedness, floating point, boolean, or pointer. Endianness comes
//! from the navigator configuration, not from the host.

use std::fmt;
use std::str::FromStr;

use super::Address;
use crate::error::{RemoraError, RemoraResult};

/// Byte order of the debuggee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness
{
    /// Least significant byte first (x86, x86-64, most ARM targets)
    #[default]
    Little,
    /// Most significant byte first
    Big,
}

impl FromStr for Endianness
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "little" | "le" => Ok(Endianness::Little),
            "big" | "be" => Ok(Endianness::Big),
            _ => Err(format!("Unknown endianness: {s}. Use 'little' or 'big'")),
        }
    }
}

/// How a run of bytes decodes into a [`ScalarValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind
{
    /// One byte, zero is `false`
    Bool,
    /// Two's complement integer of the given width in bytes
    Signed(u8),
    /// Unsigned integer of the given width in bytes
    Unsigned(u8),
    /// IEEE 754 float, 4 or 8 bytes
    Float(u8),
    /// Target pointer (width comes from the target)
    Pointer,
}

impl ScalarKind
{
    /// Map a primitive C/C++/Rust type name to its scalar kind.
    ///
    /// Pointer types (trailing `*`) map to [`ScalarKind::Pointer`]. Returns
    /// `None` for records, enums and typedefs; those carry their scalar kind
    /// in the type descriptor instead.
    pub fn from_type_name(name: &str) -> Option<Self>
    {
        let name = name.trim();
        if name.ends_with('*') {
            return Some(Self::Pointer);
        }
        let kind = match name {
            "bool" => Self::Bool,
            "char" | "signed char" | "__int8" | "int8_t" | "i8" => Self::Signed(1),
            "unsigned char" | "unsigned __int8" | "uint8_t" | "u8" => Self::Unsigned(1),
            "short" | "signed short" | "__int16" | "int16_t" | "i16" => Self::Signed(2),
            "unsigned short" | "unsigned __int16" | "uint16_t" | "u16" | "wchar_t" | "char16_t" => Self::Unsigned(2),
            "int" | "signed int" | "long" | "__int32" | "int32_t" | "i32" => Self::Signed(4),
            "unsigned int" | "unsigned long" | "unsigned __int32" | "uint32_t" | "u32" | "char32_t" => {
                Self::Unsigned(4)
            }
            "long long" | "__int64" | "int64_t" | "i64" => Self::Signed(8),
            "unsigned long long" | "unsigned __int64" | "uint64_t" | "u64" => Self::Unsigned(8),
            "float" | "f32" => Self::Float(4),
            "double" | "f64" => Self::Float(8),
            _ => return None,
        };
        Some(kind)
    }

    /// Size in bytes of a value of this kind.
    pub fn size(self, pointer_size: usize) -> usize
    {
        match self {
            Self::Bool => 1,
            Self::Signed(width) | Self::Unsigned(width) | Self::Float(width) => usize::from(width),
            Self::Pointer => pointer_size,
        }
    }

    /// Decode `bytes` as a value of this kind.
    ///
    /// `bytes` must be exactly the kind's size (for pointers, the target
    /// pointer size).
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument`: wrong byte count or an unsupported float width
    pub fn decode(self, bytes: &[u8], endianness: Endianness) -> RemoraResult<ScalarValue>
    {
        if bytes.is_empty() || bytes.len() > 8 {
            return Err(RemoraError::InvalidArgument(format!(
                "cannot decode {} bytes as {self:?}",
                bytes.len()
            )));
        }
        if !matches!(self, Self::Pointer) && bytes.len() != self.size(0) {
            return Err(RemoraError::InvalidArgument(format!(
                "{self:?} needs {} bytes, got {}",
                self.size(0),
                bytes.len()
            )));
        }

        let raw = match endianness {
            Endianness::Little => bytes.iter().rev().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)),
            Endianness::Big => bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)),
        };

        let value = match self {
            Self::Bool => ScalarValue::Bool(raw != 0),
            Self::Unsigned(_) => ScalarValue::Unsigned(raw),
            Self::Signed(width) => {
                let shift = 64 - 8 * u32::from(width);
                #[allow(clippy::cast_possible_wrap)]
                let signed = ((raw << shift) as i64) >> shift;
                ScalarValue::Signed(signed)
            }
            Self::Float(4) => {
                #[allow(clippy::cast_possible_truncation)]
                let bits = raw as u32;
                ScalarValue::Float(f64::from(f32::from_bits(bits)))
            }
            Self::Float(8) => ScalarValue::Float(f64::from_bits(raw)),
            Self::Float(width) => {
                return Err(RemoraError::InvalidArgument(format!("unsupported float width {width}")));
            }
            Self::Pointer => ScalarValue::Pointer(Address::new(raw)),
        };
        Ok(value)
    }
}

/// A decoded scalar read from the debuggee.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarValue
{
    /// Boolean
    Bool(bool),
    /// Sign-extended integer
    Signed(i64),
    /// Zero-extended integer
    Unsigned(u64),
    /// Floating point (f32 values are widened)
    Float(f64),
    /// Pointer into the debuggee
    Pointer(Address),
}

impl ScalarValue
{
    /// Integer view of the value, used for length fields and type tags.
    ///
    /// Negative integers and floats have no integer view.
    pub fn as_u64(self) -> Option<u64>
    {
        match self {
            Self::Bool(b) => Some(u64::from(b)),
            Self::Unsigned(v) => Some(v),
            Self::Signed(v) => u64::try_from(v).ok(),
            Self::Pointer(addr) => Some(addr.value()),
            Self::Float(_) => None,
        }
    }

    /// Truthiness in the C sense: nonzero is `true`.
    pub fn is_truthy(self) -> bool
    {
        match self {
            Self::Bool(b) => b,
            Self::Unsigned(v) => v != 0,
            Self::Signed(v) => v != 0,
            Self::Float(v) => v != 0.0,
            Self::Pointer(addr) => !addr.is_null(),
        }
    }
}

impl fmt::Display for ScalarValue
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Signed(v) => write!(f, "{v}"),
            Self::Unsigned(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Pointer(addr) => write!(f, "{addr}"),
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_decode_signed_sign_extends()
    {
        let value = ScalarKind::Signed(2).decode(&[0xfe, 0xff], Endianness::Little).unwrap();
        assert_eq!(value, ScalarValue::Signed(-2));
    }

    #[test]
    fn test_decode_big_endian_unsigned()
    {
        let value = ScalarKind::Unsigned(4).decode(&[0x00, 0x00, 0x01, 0x02], Endianness::Big).unwrap();
        assert_eq!(value, ScalarValue::Unsigned(0x0102));
    }

    #[test]
    fn test_decode_float()
    {
        let bytes = 1.5f32.to_le_bytes();
        let value = ScalarKind::Float(4).decode(&bytes, Endianness::Little).unwrap();
        assert_eq!(value, ScalarValue::Float(1.5));
    }

    #[test]
    fn test_decode_pointer_uses_byte_count()
    {
        let value = ScalarKind::Pointer
            .decode(&[0x00, 0x10, 0x00, 0x00], Endianness::Little)
            .unwrap();
        assert_eq!(value, ScalarValue::Pointer(Address::new(0x1000)));
    }

    #[test]
    fn test_decode_rejects_wrong_width()
    {
        assert!(ScalarKind::Unsigned(4).decode(&[1, 2], Endianness::Little).is_err());
    }

    #[test]
    fn test_type_name_mapping()
    {
        assert_eq!(ScalarKind::from_type_name("unsigned int"), Some(ScalarKind::Unsigned(4)));
        assert_eq!(ScalarKind::from_type_name("Layout::Box *"), Some(ScalarKind::Pointer));
        assert_eq!(ScalarKind::from_type_name("Layout::Box"), None);
    }

    #[test]
    fn test_as_u64_rejects_negative()
    {
        assert_eq!(ScalarValue::Signed(-1).as_u64(), None);
        assert_eq!(ScalarValue::Signed(7).as_u64(), Some(7));
    }
}
