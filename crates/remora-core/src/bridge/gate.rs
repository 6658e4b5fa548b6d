//! Break-state gate.
//!
//! Every bridge call that touches the debuggee awaits [`BreakGate::wait_for_break`]
//! first. The gate is driven by state notifications from the hosting
//! debugger; it never polls the backend.

use tokio::sync::watch;
use tracing::debug;

use crate::error::{RemoraError, RemoraResult};
use crate::events::DebuggerStatus;

/// Tracks the last reported debugger status and parks callers until a break.
#[derive(Debug)]
pub struct BreakGate
{
    status: watch::Sender<DebuggerStatus>,
}

impl BreakGate
{
    /// Create a gate in the given initial state.
    pub fn new(initial: DebuggerStatus) -> Self
    {
        let (status, _) = watch::channel(initial);
        Self { status }
    }

    /// Last reported status.
    pub fn status(&self) -> DebuggerStatus
    {
        *self.status.borrow()
    }

    /// Record a new status, waking waiters if it is a break.
    pub fn set(&self, status: DebuggerStatus)
    {
        let previous = self.status.send_replace(status);
        if previous != status {
            debug!("break gate: {previous:?} -> {status:?}");
        }
    }

    /// Wait until the debuggee is in a break state.
    ///
    /// Returns immediately when already broken in. Suspends while the target
    /// runs or the debugger is switching thread/process/bitness.
    ///
    /// ## Errors
    ///
    /// - `DebuggeeUnavailable`: the debugger is detaching
    pub async fn wait_for_break(&self) -> RemoraResult<()>
    {
        let mut receiver = self.status.subscribe();
        loop {
            let status = *receiver.borrow_and_update();
            match status {
                DebuggerStatus::Break => return Ok(()),
                DebuggerStatus::Detaching => {
                    return Err(RemoraError::DebuggeeUnavailable("debugger is detaching".to_string()));
                }
                _ => debug!("waiting for break-in (currently {status:?})"),
            }
            if receiver.changed().await.is_err() {
                return Err(RemoraError::DebuggeeUnavailable("break gate closed".to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[tokio::test]
    async fn test_break_passes_immediately()
    {
        let gate = BreakGate::new(DebuggerStatus::Break);
        assert!(gate.wait_for_break().await.is_ok());
    }

    #[tokio::test]
    async fn test_detaching_is_unavailable()
    {
        let gate = BreakGate::new(DebuggerStatus::Detaching);
        assert!(matches!(
            gate.wait_for_break().await,
            Err(RemoraError::DebuggeeUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_waiting_resumes_on_break()
    {
        let gate = BreakGate::new(DebuggerStatus::Waiting);
        let (waited, ()) = tokio::join!(gate.wait_for_break(), async {
            tokio::task::yield_now().await;
            gate.set(DebuggerStatus::ChangingThread);
            tokio::task::yield_now().await;
            gate.set(DebuggerStatus::Break);
        });
        assert!(waited.is_ok());
        assert_eq!(gate.status(), DebuggerStatus::Break);
    }
}
