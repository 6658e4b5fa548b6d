//! # Backend Bridge
//!
//! [`BackendBridge`] adapts a blocking [`DebugBackend`] into the asynchronous
//! [`DebuggerBridge`] interface.
//!
//! Each call follows the same shape:
//!
//! 1. await the break gate,
//! 2. acquire the backend resources it needs inside [`ResourceGuard`]s,
//! 3. run the blocking engine calls,
//! 4. let the guards release everything before the result is returned.
//!
//! No call holds a resource across an await point, and nothing is cached
//! between calls.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::backend::{DebugBackend, RawModuleInfo};
use super::gate::BreakGate;
use super::guards::ResourceGuard;
use super::DebuggerBridge;
use crate::config::BridgeConfig;
use crate::error::{ModuleKey, RemoraError, RemoraResult};
use crate::events::{event_channel, BridgeEvent, BridgeEventReceiver, BridgeEventSender, DebuggerStatus};
use crate::types::{strip_module_suffix, Address, ModuleDescriptor, StackFrame};

const EVENT_CAPACITY: usize = 64;

/// Asynchronous bridge over a blocking debugger backend.
///
/// The hosting debugger reports state changes through
/// [`BackendBridge::notify_state`]; until the first `Break` arrives, memory
/// calls wait.
///
/// ## Example
///
/// ```rust
/// use remora_core::backends::SnapshotBackend;
/// use remora_core::bridge::{BackendBridge, DebuggerBridge};
/// use remora_core::config::BridgeConfig;
/// use remora_core::events::DebuggerStatus;
/// use remora_core::types::Address;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let backend = SnapshotBackend::builder()
///     .module("foo.dll", 0x1000, 0x500)
///     .build();
/// let bridge = BackendBridge::new(backend, BridgeConfig::default());
/// bridge.notify_state(DebuggerStatus::Break);
///
/// let module = bridge.module_by_address(Address::new(0x1200)).await.unwrap();
/// assert_eq!(module.name, "foo");
/// # });
/// ```
pub struct BackendBridge<B>
{
    backend: B,
    gate: BreakGate,
    events: BridgeEventSender,
    config: BridgeConfig,
}

impl<B: DebugBackend> BackendBridge<B>
{
    /// Wrap `backend`. The gate starts in `Waiting`.
    pub fn new(backend: B, config: BridgeConfig) -> Self
    {
        let (events, _) = event_channel(EVENT_CAPACITY);
        Self {
            backend,
            gate: BreakGate::new(DebuggerStatus::Waiting),
            events,
            config,
        }
    }

    /// The wrapped backend.
    pub fn backend(&self) -> &B
    {
        &self.backend
    }

    /// Active configuration.
    pub fn config(&self) -> &BridgeConfig
    {
        &self.config
    }

    /// Last status reported by the hosting debugger.
    pub fn status(&self) -> DebuggerStatus
    {
        self.gate.status()
    }

    /// Record a debugger state change and broadcast it.
    pub fn notify_state(&self, status: DebuggerStatus)
    {
        self.gate.set(status);
        // No subscribers is fine
        let _ = self.events.send(BridgeEvent::DebuggerStateChanged(status));
    }

    /// Broadcast that the target's pointer width changed.
    pub fn notify_bitness_changed(&self)
    {
        debug!("target bitness changed (64-bit: {})", self.backend.is_pointer_64bit());
        let _ = self.events.send(BridgeEvent::BitnessChanged);
    }

    fn module_matching<P>(&self, predicate: P, key: ModuleKey) -> RemoraResult<ModuleDescriptor>
    where
        P: Fn(&RawModuleInfo) -> bool,
    {
        let mut modules = ResourceGuard::new(self.backend.enum_modules()?);
        modules.reset();
        while let Some(info) = modules.next_module() {
            if predicate(&info) {
                let name = strip_module_suffix(&info.name, self.config.module_suffix_separator);
                return Ok(ModuleDescriptor::new(name, info.load_address, info.size));
            }
        }
        Err(RemoraError::ModuleNotFound(key))
    }

    fn read_exact(&self, address: Address, len: usize) -> RemoraResult<Vec<u8>>
    {
        let mut context = ResourceGuard::new(self.backend.memory_context(address)?);
        let mut buffer = vec![0u8; len];
        let read = context.read(&mut buffer)?;
        if read == 0 {
            return Err(RemoraError::MemoryUnreadable { address, len });
        }
        if read != len {
            return Err(RemoraError::PartialRead {
                address,
                requested: len,
                read,
            });
        }
        Ok(buffer)
    }

    fn frames(&self) -> RemoraResult<Vec<StackFrame>>
    {
        let Some(enumerator) = self.backend.enum_frames(self.config.max_frames)? else {
            return Err(RemoraError::DebuggeeUnavailable("no current thread was recorded".to_string()));
        };
        let mut enumerator = ResourceGuard::new(enumerator);
        let count = enumerator.count().min(self.config.max_frames);
        enumerator.reset();

        let mut frames = Vec::with_capacity(count);
        for raw in enumerator.next_frames(count) {
            let Some(context) = raw.code_context else {
                continue;
            };
            let context = ResourceGuard::new(context);
            let Some(text) = context.address_text() else {
                continue;
            };
            let instruction_address = match Address::parse_hex(&text) {
                Ok(address) => address,
                Err(err) => {
                    warn!("skipping frame with unparseable code address: {err}");
                    continue;
                }
            };
            frames.push(StackFrame {
                // The adjustment matches the engine's x86-64 convention; other
                // architectures are unverified.
                frame_address: raw.range.addr_min.saturating_sub(self.config.frame_base_adjustment),
                instruction_address,
                stack_address: raw.range.addr_max,
            });
        }
        Ok(frames)
    }
}

#[async_trait]
impl<B: DebugBackend> DebuggerBridge for BackendBridge<B>
{
    fn is_pointer_64bit(&self) -> bool
    {
        self.backend.is_pointer_64bit()
    }

    fn subscribe(&self) -> BridgeEventReceiver
    {
        self.events.subscribe()
    }

    async fn module_by_address(&self, address: Address) -> RemoraResult<ModuleDescriptor>
    {
        self.gate.wait_for_break().await?;
        debug!("resolving module for address {address}");
        self.module_matching(
            |info| info.load_address <= address && address.value() - info.load_address.value() < info.size,
            ModuleKey::Address(address),
        )
    }

    async fn module_by_name(&self, name: &str) -> RemoraResult<ModuleDescriptor>
    {
        self.gate.wait_for_break().await?;
        debug!("resolving module named {name}");
        let separator = self.config.module_suffix_separator;
        self.module_matching(
            |info| strip_module_suffix(&info.name, separator) == name,
            ModuleKey::Name(name.to_string()),
        )
    }

    async fn read_bytes(&self, address: Address, len: usize) -> RemoraResult<Vec<u8>>
    {
        self.gate.wait_for_break().await?;
        if len == 0 {
            return Ok(Vec::new());
        }
        self.read_exact(address, len)
    }

    async fn capture_call_stack(&self) -> RemoraResult<Vec<StackFrame>>
    {
        self.gate.wait_for_break().await?;
        self.frames()
    }
}
