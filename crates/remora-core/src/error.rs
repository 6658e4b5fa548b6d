//! # Error Types
//!
//! Error handling for the navigation engine and the debugger bridge.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.

use std::fmt;

use thiserror::Error;

use crate::types::Address;

/// Key used to look up a loaded module.
///
/// Carried by [`RemoraError::ModuleNotFound`] so callers can tell which lookup
/// failed when several are in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleKey
{
    /// Lookup by an address that should fall inside the module image.
    Address(Address),
    /// Lookup by module name (without the filename suffix).
    Name(String),
}

impl fmt::Display for ModuleKey
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Self::Address(address) => write!(f, "no module contains address {address}"),
            Self::Name(name) => write!(f, "unknown module {name}"),
        }
    }
}

/// Main error type for navigation and bridge operations
///
/// Every `Pending` operation settles to either a value or one of these
/// variants. Failures propagate through a navigation chain unless the caller
/// attaches a fallback.
///
/// ## Error Categories
///
/// 1. **Layout errors**: FieldNotFound, TypeNotFound, NotAScalar
/// 2. **Backend errors**: ModuleNotFound, MemoryUnreadable, PartialRead
/// 3. **Session errors**: DebuggeeUnavailable, UnsupportedOperation
/// 4. **Traversal errors**: SequenceLimitExceeded, RootsUnavailable
/// 5. **I/O errors**: Io (procfs parsing, etc.)
#[derive(Error, Debug)]
pub enum RemoraError
{
    /// None of the candidate field names exist on the type
    ///
    /// Candidates are aliases for one logical field across binary versions.
    /// This error means the layout matched none of them.
    #[error("Field not found on {type_name}: tried {candidates:?}")]
    FieldNotFound
    {
        /// Type whose layout was searched
        type_name: String,
        /// Every candidate that was tried, in order
        candidates: Vec<String>,
    },

    /// The metadata provider has no descriptor for this module/type pair
    #[error("Type not found: {module}!{type_name}")]
    TypeNotFound
    {
        /// Module the type was looked up in
        module: String,
        /// Requested type name
        type_name: String,
    },

    /// No loaded module matched the lookup
    #[error("Module not found: {0}")]
    ModuleNotFound(ModuleKey),

    /// The backend could not read any of the requested range
    #[error("Memory unreadable at {address} ({len} bytes)")]
    MemoryUnreadable
    {
        /// Start of the requested range
        address: Address,
        /// Requested length
        len: usize,
    },

    /// The backend returned fewer bytes than requested
    ///
    /// The partial buffer is discarded; callers never observe it.
    #[error("Partial read at {address}: requested {requested} bytes, got {read}")]
    PartialRead
    {
        /// Start of the requested range
        address: Address,
        /// Requested length
        requested: usize,
        /// Bytes the backend actually returned
        read: usize,
    },

    /// The backend does not implement this operation (memory writes, etc.)
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// No suspended debuggee session is available
    ///
    /// Raised when the debugger is detaching, the target exited, or the
    /// backend reports it left the break state mid-call. Re-issue the request
    /// once the debuggee breaks again.
    #[error("Debuggee unavailable: {0}")]
    DebuggeeUnavailable(String),

    /// Invalid argument passed to a navigation or bridge function
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// `value()` was requested on a type with no scalar decoding
    #[error("Type {0} is not a scalar")]
    NotAScalar(String),

    /// A list or array walk exceeded the configured element limit
    ///
    /// Usually means the debuggee's list is cyclic or the length field is
    /// garbage.
    #[error("Sequence exceeded the limit of {0} elements")]
    SequenceLimitExceeded(usize),

    /// No root provider could produce a starting point
    #[error("No roots available: {0}")]
    RootsUnavailable(String),

    /// I/O error (procfs files, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RemoraError
{
    /// Shorthand for a single-candidate [`RemoraError::FieldNotFound`].
    pub(crate) fn field_not_found(type_name: &str, candidates: impl IntoIterator<Item = impl Into<String>>) -> Self
    {
        Self::FieldNotFound {
            type_name: type_name.to_string(),
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }
}

/// Convenience type alias for `Result<T, RemoraError>`
///
/// ```rust
/// use remora_core::error::RemoraResult;
/// fn foo() -> RemoraResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type RemoraResult<T> = std::result::Result<T, RemoraError>;
