//! # Blocking Backend Interface
//!
//! What a concrete debugger has to provide for [`super::BackendBridge`] to
//! drive it. These calls are synchronous and assume the debuggee is already
//! in a break state; the bridge takes care of waiting for that.
//!
//! Enumerators and contexts are *resources*: the backend may hold engine
//! objects (COM references, file descriptors, ...) behind them. Each one is
//! released exactly once through [`BackendResource::release`], which the
//! bridge calls from a guard on every exit path.

use crate::error::RemoraResult;
use crate::types::Address;

/// A backend object with an explicit release step.
pub trait BackendResource: Send
{
    /// Short label used in trace logs.
    fn label(&self) -> &'static str;

    /// Release the underlying engine object. Called once, by the guard.
    fn release(&mut self) {}
}

/// Module information as the engine reports it (name still has its suffix).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawModuleInfo
{
    /// File name, e.g. `edgehtml.dll`
    pub name: String,
    /// Load address
    pub load_address: Address,
    /// Image size in bytes
    pub size: u64,
}

/// Cursor over the loaded modules.
pub trait ModuleEnumerator: BackendResource
{
    /// Rewind to the first module.
    fn reset(&mut self);

    /// Next module, or `None` when exhausted.
    fn next_module(&mut self) -> Option<RawModuleInfo>;
}

/// Stack range of one frame as the engine reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrameRange
{
    /// Lowest address of the frame
    pub addr_min: Address,
    /// Highest address of the frame
    pub addr_max: Address,
}

/// Code context of a frame.
pub trait CodeContext: BackendResource
{
    /// The frame's code address as text (`0x...`), if the engine has one.
    fn address_text(&self) -> Option<String>;
}

/// A frame plus its optional code context.
pub struct RawFrame
{
    /// Stack range
    pub range: RawFrameRange,
    /// Code context, acquired with the frame and released by the bridge
    pub code_context: Option<Box<dyn CodeContext>>,
}

/// Cursor over the current thread's frames.
pub trait FrameEnumerator: BackendResource
{
    /// Number of frames available.
    fn count(&self) -> usize;

    /// Rewind to the innermost frame.
    fn reset(&mut self);

    /// Up to `max` frames from the current position.
    fn next_frames(&mut self, max: usize) -> Vec<RawFrame>;
}

/// A memory context positioned at one address.
pub trait MemoryContext: BackendResource
{
    /// Fill as much of `buf` as the backend can, returning the byte count.
    ///
    /// A short count is not an error here; the bridge turns it into
    /// `PartialRead`.
    fn read(&mut self, buf: &mut [u8]) -> RemoraResult<usize>;
}

/// A concrete debugger engine (live session, crash dump, ...).
///
/// Implementations are blocking and state-dependent: calls are only valid
/// while the debuggee is suspended.
pub trait DebugBackend: Send + Sync
{
    /// `true` when the target uses 8-byte pointers.
    fn is_pointer_64bit(&self) -> bool;

    /// Acquire a module enumerator.
    fn enum_modules(&self) -> RemoraResult<Box<dyn ModuleEnumerator>>;

    /// Acquire a frame enumerator for the current thread, limited to
    /// `max_frames`. `Ok(None)` means there is no current thread.
    fn enum_frames(&self, max_frames: usize) -> RemoraResult<Option<Box<dyn FrameEnumerator>>>;

    /// Acquire a memory context positioned at `address`.
    fn memory_context(&self, address: Address) -> RemoraResult<Box<dyn MemoryContext>>;
}
