//! Loaded module descriptors.

use std::fmt;

use super::Address;

/// A module (executable image or shared library) loaded in the debuggee.
///
/// Names are stored without their filename suffix: `edgehtml.dll` becomes
/// `edgehtml`, which is the form type lookups use.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleDescriptor
{
    /// Module name with the suffix stripped
    pub name: String,
    /// Load (base) address of the image
    pub base: Address,
    /// Size of the mapped image in bytes
    pub size: u64,
}

impl ModuleDescriptor
{
    /// Create a descriptor from already-stripped parts.
    pub fn new(name: impl Into<String>, base: Address, size: u64) -> Self
    {
        Self {
            name: name.into(),
            base,
            size,
        }
    }

    /// First address past the end of the image.
    pub fn end(&self) -> Address
    {
        self.base + self.size
    }

    /// Returns `true` if `address` falls in `[base, base + size)`.
    pub fn contains(&self, address: Address) -> bool
    {
        address >= self.base && address.value() - self.base.value() < self.size
    }
}

impl fmt::Display for ModuleDescriptor
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{} [{} - {}]", self.name, self.base, self.end())
    }
}

/// Strip the filename suffix (everything from the last `separator` on).
///
/// Names without a separator are returned unchanged.
///
/// ```rust
/// use remora_core::types::strip_module_suffix;
///
/// assert_eq!(strip_module_suffix("foo.dll", '.'), "foo");
/// assert_eq!(strip_module_suffix("libc.so.6", '.'), "libc.so");
/// assert_eq!(strip_module_suffix("ntoskrnl", '.'), "ntoskrnl");
/// ```
pub fn strip_module_suffix(name: &str, separator: char) -> &str
{
    match name.rfind(separator) {
        Some(index) => &name[..index],
        None => name,
    }
}
