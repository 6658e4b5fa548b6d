//! Bridge event types and helpers.
//!
//! Higher layers (tree views, the CLI) subscribe to these events to react to
//! debugger state changes without polling. Delivery is observational: an
//! event carries no ordering guarantee relative to bridge calls already in
//! flight, so a call in progress may or may not see the new state.

use tokio::sync::broadcast;

/// Debugger state as reported by the hosting debugger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebuggerStatus
{
    /// The debuggee is suspended; memory may be read.
    Break,
    /// The debuggee is running; bridge calls wait for the next break.
    Waiting,
    /// The debugger is detaching; bridge calls fail.
    Detaching,
    /// Effective machine bitness is switching (e.g. WoW64).
    ChangingBitness,
    /// The current thread is changing.
    ChangingThread,
    /// The current process is changing.
    ChangingProcess,
}

impl DebuggerStatus
{
    /// `true` when memory and frames may be inspected.
    pub const fn is_break(self) -> bool
    {
        matches!(self, Self::Break)
    }
}

/// Event emitted by a debugger bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent
{
    /// The debugger moved to a new state.
    DebuggerStateChanged(DebuggerStatus),
    /// The target's pointer width changed; cached layouts may be stale.
    BitnessChanged,
}

impl BridgeEvent
{
    /// Human-readable description of the event.
    #[must_use]
    pub fn describe(&self) -> String
    {
        match self {
            Self::DebuggerStateChanged(status) => format_status(*status),
            Self::BitnessChanged => "Target bitness changed".to_string(),
        }
    }
}

/// Format a [`DebuggerStatus`] into a user-facing message.
#[must_use]
pub fn format_status(status: DebuggerStatus) -> String
{
    match status {
        DebuggerStatus::Break => "Debuggee is in break state".to_string(),
        DebuggerStatus::Waiting => "Debuggee is running".to_string(),
        DebuggerStatus::Detaching => "Debugger is detaching".to_string(),
        DebuggerStatus::ChangingBitness => "Debugger is changing bitness".to_string(),
        DebuggerStatus::ChangingThread => "Debugger is changing thread".to_string(),
        DebuggerStatus::ChangingProcess => "Debugger is changing process".to_string(),
    }
}

/// Sender side of the bridge event channel.
pub type BridgeEventSender = broadcast::Sender<BridgeEvent>;
/// Receiver side of the bridge event channel.
pub type BridgeEventReceiver = broadcast::Receiver<BridgeEvent>;

/// Create a new bridge event channel.
///
/// Slow subscribers lag rather than block the bridge; `capacity` bounds how
/// many events each one may fall behind.
#[must_use]
pub fn event_channel(capacity: usize) -> (BridgeEventSender, BridgeEventReceiver)
{
    broadcast::channel(capacity.max(1))
}
