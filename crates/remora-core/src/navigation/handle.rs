//! Remote object handles.

use std::fmt;
use std::sync::Arc;

use crate::types::Address;

/// A typed value at an address in the debuggee.
///
/// Handles are inert: they hold no backend resource and never read memory
/// on their own. Every navigation step produces a new handle. Cloning is
/// cheap (two `Arc<str>` bumps).
///
/// Pointer types carry a trailing `*` (`Layout::Box*`). A handle whose
/// address is 0 is NULL; navigating through it yields NULL without touching
/// the backend.
///
/// ## Example
///
/// ```rust
/// use remora_core::navigation::RemoteObject;
/// use remora_core::types::Address;
///
/// let node = RemoteObject::new("app", "Node*", Address::new(0x2000));
/// assert!(node.is_pointer());
/// assert_eq!(node.pointee_type(), Some("Node"));
/// assert!(RemoteObject::null().is_null());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteObject
{
    module: Arc<str>,
    type_name: Arc<str>,
    address: Address,
}

impl RemoteObject
{
    /// Handle to a `type_name` value at `address` in `module`.
    pub fn new(module: impl Into<Arc<str>>, type_name: impl Into<Arc<str>>, address: Address) -> Self
    {
        Self {
            module: module.into(),
            type_name: type_name.into(),
            address,
        }
    }

    /// The untyped NULL handle.
    pub fn null() -> Self
    {
        Self::new("", "", Address::NULL)
    }

    /// Module the type is resolved in.
    pub fn module(&self) -> &str
    {
        &self.module
    }

    /// Declared type name.
    pub fn type_name(&self) -> &str
    {
        &self.type_name
    }

    /// Address of the value.
    pub fn address(&self) -> Address
    {
        self.address
    }

    /// `true` when the address is 0.
    pub fn is_null(&self) -> bool
    {
        self.address.is_null()
    }

    /// `true` when the declared type is a pointer.
    pub fn is_pointer(&self) -> bool
    {
        self.type_name.trim_end().ends_with('*')
    }

    /// Type pointed to, for pointer types.
    pub fn pointee_type(&self) -> Option<&str>
    {
        self.type_name.trim_end().strip_suffix('*').map(str::trim_end)
    }

    /// Same address, different declared type.
    #[must_use]
    pub fn retyped(&self, type_name: impl Into<Arc<str>>) -> Self
    {
        Self {
            module: Arc::clone(&self.module),
            type_name: type_name.into(),
            address: self.address,
        }
    }

    /// Same module and type, different address.
    #[must_use]
    pub fn at(&self, address: Address) -> Self
    {
        Self {
            module: Arc::clone(&self.module),
            type_name: Arc::clone(&self.type_name),
            address,
        }
    }
}

impl fmt::Display for RemoteObject
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        if self.type_name.is_empty() {
            return write!(f, "NULL");
        }
        write!(f, "{}!{} @ {}", self.module, self.type_name, self.address)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_pointer_detection_tolerates_spaces()
    {
        let handle = RemoteObject::new("m", "Layout::Box *", Address::new(8));
        assert!(handle.is_pointer());
        assert_eq!(handle.pointee_type(), Some("Layout::Box"));

        let value = handle.retyped("Layout::Box");
        assert!(!value.is_pointer());
        assert_eq!(value.pointee_type(), None);
        assert_eq!(value.address(), Address::new(8));
    }

    #[test]
    fn test_display()
    {
        assert_eq!(RemoteObject::null().to_string(), "NULL");
        let handle = RemoteObject::new("app", "Node", Address::new(0x10));
        assert_eq!(handle.to_string(), "app!Node @ 0x00000010");
    }
}
