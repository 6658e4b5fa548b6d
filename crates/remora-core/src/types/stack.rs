//! Stack frame types.

use super::Address;

/// One frame of the debuggee's current call stack.
///
/// Only the three addresses needed to read memory relative to the frame are
/// kept; symbols and source locations are out of scope for the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StackFrame
{
    /// Base of the frame, after the bridge's frame-base adjustment
    pub frame_address: Address,
    /// Code address the frame is executing
    pub instruction_address: Address,
    /// Top of the frame's stack range
    pub stack_address: Address,
}
