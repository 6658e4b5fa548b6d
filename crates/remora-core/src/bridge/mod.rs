//! # Debugger Bridge
//!
//! The asynchronous interface the navigator reads the debuggee through.
//!
//! A concrete debugger exposes blocking, state-dependent calls (enumerate
//! modules, enumerate frames, read memory). [`BackendBridge`] wraps any
//! [`DebugBackend`] and turns those into futures that:
//!
//! - wait for the debuggee to be in a break state first ([`BreakGate`]),
//! - hold each backend resource in a [`ResourceGuard`] so it is released on
//!   every exit path,
//! - fail with typed errors (`ModuleNotFound`, `PartialRead`, ...) rather
//!   than returning partial data.
//!
//! ## Why a trait?
//!
//! The navigator only sees `dyn DebuggerBridge`. Tests and the CLI plug in a
//! snapshot backend; a debugger extension plugs in its engine.

pub mod backend;
pub mod engine;
pub mod gate;
pub mod guards;

use async_trait::async_trait;
pub use backend::{
    BackendResource, CodeContext, DebugBackend, FrameEnumerator, MemoryContext, ModuleEnumerator, RawFrame,
    RawFrameRange, RawModuleInfo,
};
pub use engine::BackendBridge;
pub use gate::BreakGate;
pub use guards::ResourceGuard;

use crate::error::{RemoraError, RemoraResult};
use crate::events::BridgeEventReceiver;
use crate::types::{Address, ModuleDescriptor, StackFrame};

/// Asynchronous access to a suspended debuggee
///
/// Calls issued concurrently are not ordered relative to each other; each one
/// individually observes a consistent suspended snapshot.
#[async_trait]
pub trait DebuggerBridge: Send + Sync
{
    /// `true` when the target uses 8-byte pointers.
    fn is_pointer_64bit(&self) -> bool;

    /// Subscribe to state-change and bitness-change notifications.
    fn subscribe(&self) -> BridgeEventReceiver;

    /// Module whose image contains `address`.
    ///
    /// ## Errors
    ///
    /// - `ModuleNotFound`: no loaded module contains the address
    /// - `DebuggeeUnavailable`: the debugger is detaching
    async fn module_by_address(&self, address: Address) -> RemoraResult<ModuleDescriptor>;

    /// Module named `name` (compared without the filename suffix).
    ///
    /// ## Errors
    ///
    /// - `ModuleNotFound`: no loaded module has that name
    /// - `DebuggeeUnavailable`: the debugger is detaching
    async fn module_by_name(&self, name: &str) -> RemoraResult<ModuleDescriptor>;

    /// Read exactly `len` bytes at `address`.
    ///
    /// ## Errors
    ///
    /// - `PartialRead`: the backend returned fewer bytes; nothing is returned
    /// - `MemoryUnreadable`: the range is not mapped at all
    /// - `DebuggeeUnavailable`: the debugger is detaching
    async fn read_bytes(&self, address: Address, len: usize) -> RemoraResult<Vec<u8>>;

    /// Frames of the current thread, innermost first.
    ///
    /// ## Errors
    ///
    /// - `DebuggeeUnavailable`: no current thread, or the debugger is detaching
    /// - `UnsupportedOperation`: the backend cannot enumerate frames
    async fn capture_call_stack(&self) -> RemoraResult<Vec<StackFrame>>;

    /// Write `bytes` at `address`.
    ///
    /// Writes are not supported by any backend in this crate.
    ///
    /// ## Errors
    ///
    /// - `UnsupportedOperation`: always
    async fn write_value(&self, address: Address, bytes: &[u8]) -> RemoraResult<()>
    {
        Err(RemoraError::UnsupportedOperation(format!(
            "memory writes are not supported ({} bytes at {address})",
            bytes.len()
        )))
    }
}

/// Read `count` elements of `T` at `address` by bitwise copy.
///
/// Reads `count * size_of::<T>()` bytes through [`DebuggerBridge::read_bytes`]
/// and reinterprets them with no per-element decoding, so the elements'
/// concatenated byte image equals the bytes in the debuggee. Element byte
/// order is the host's.
///
/// ## Errors
///
/// - `InvalidArgument`: zero-sized `T` or the byte count overflows
/// - anything `read_bytes` can fail with
pub async fn read_typed_array<T, B>(bridge: &B, address: Address, count: usize) -> RemoraResult<Vec<T>>
where
    T: bytemuck::Pod,
    B: DebuggerBridge + ?Sized,
{
    let element_size = std::mem::size_of::<T>();
    if element_size == 0 {
        return Err(RemoraError::InvalidArgument(
            "cannot read an array of zero-sized elements".to_string(),
        ));
    }
    let byte_len = count.checked_mul(element_size).ok_or_else(|| {
        RemoraError::InvalidArgument(format!("{count} elements of {element_size} bytes overflows"))
    })?;
    let bytes = bridge.read_bytes(address, byte_len).await?;
    Ok(bytemuck::allocation::pod_collect_to_vec(&bytes))
}
