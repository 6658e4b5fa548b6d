//! # Snapshot Backend
//!
//! An in-memory debuggee: a fixed set of modules, sparse memory pages and a
//! captured stack. It behaves like a crash dump opened in a debugger, and is
//! what the tests and the CLI demo navigate.
//!
//! Memory is mapped in whole pages. Reads stop at the first unmapped page, so
//! a read straddling the end of a mapping comes back short exactly like a
//! live engine's would.
//!
//! Every resource handed out is counted in [`ResourceStats`], so callers can
//! check that the bridge released everything it acquired.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::bridge::{
    BackendResource, CodeContext, DebugBackend, FrameEnumerator, MemoryContext, ModuleEnumerator, RawFrame,
    RawFrameRange, RawModuleInfo,
};
use crate::error::RemoraResult;
use crate::types::Address;

/// Page granularity of snapshot memory.
pub const PAGE_SIZE: u64 = 0x1000;

/// Counters for resources handed out by a [`SnapshotBackend`].
#[derive(Debug, Default)]
pub struct ResourceStats
{
    acquired: AtomicUsize,
    released: AtomicUsize,
    reads: AtomicUsize,
}

impl ResourceStats
{
    /// Resources handed out so far.
    pub fn acquired(&self) -> usize
    {
        self.acquired.load(Ordering::SeqCst)
    }

    /// Resources released so far.
    pub fn released(&self) -> usize
    {
        self.released.load(Ordering::SeqCst)
    }

    /// Resources acquired but not yet released.
    pub fn outstanding(&self) -> usize
    {
        self.acquired().saturating_sub(self.released())
    }

    /// Memory reads performed.
    pub fn reads(&self) -> usize
    {
        self.reads.load(Ordering::SeqCst)
    }

    fn acquire(&self)
    {
        self.acquired.fetch_add(1, Ordering::SeqCst);
    }

    fn release(&self)
    {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Sparse, page-mapped memory image.
#[derive(Debug, Default, Clone)]
struct PageMap
{
    pages: BTreeMap<u64, Vec<u8>>,
}

impl PageMap
{
    fn page_base(address: u64) -> u64
    {
        address & !(PAGE_SIZE - 1)
    }

    fn write(&mut self, address: u64, bytes: &[u8])
    {
        for (i, byte) in bytes.iter().enumerate() {
            let absolute = address.wrapping_add(i as u64);
            let base = Self::page_base(absolute);
            let page = self
                .pages
                .entry(base)
                .or_insert_with(|| vec![0u8; usize::try_from(PAGE_SIZE).unwrap_or(4096)]);
            if let Ok(offset) = usize::try_from(absolute - base) {
                page[offset] = *byte;
            }
        }
    }

    fn map(&mut self, address: u64, len: u64)
    {
        let mut base = Self::page_base(address);
        let end = address.saturating_add(len);
        while base < end {
            self.pages
                .entry(base)
                .or_insert_with(|| vec![0u8; usize::try_from(PAGE_SIZE).unwrap_or(4096)]);
            base = base.saturating_add(PAGE_SIZE);
        }
    }

    /// Copy into `buf` until the first unmapped byte.
    fn read(&self, address: u64, buf: &mut [u8]) -> usize
    {
        let mut copied = 0usize;
        while copied < buf.len() {
            let Some(absolute) = address.checked_add(copied as u64) else {
                break;
            };
            let base = Self::page_base(absolute);
            let Some(page) = self.pages.get(&base) else {
                break;
            };
            let offset = usize::try_from(absolute - base).unwrap_or(0);
            let chunk = (page.len() - offset).min(buf.len() - copied);
            buf[copied..copied + chunk].copy_from_slice(&page[offset..offset + chunk]);
            copied += chunk;
        }
        copied
    }
}

/// One captured frame.
#[derive(Debug, Clone)]
struct SnapshotFrame
{
    range: RawFrameRange,
    address_text: Option<String>,
}

/// Builder for [`SnapshotBackend`].
///
/// Integer writes use little-endian byte order; pointers use the snapshot's
/// pointer width.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder
{
    modules: Vec<RawModuleInfo>,
    memory: PageMap,
    frames: Option<Vec<SnapshotFrame>>,
    pointer_64bit: bool,
}

impl SnapshotBuilder
{
    /// Add a loaded module (name including its suffix, e.g. `foo.dll`).
    #[must_use]
    pub fn module(mut self, name: &str, base: u64, size: u64) -> Self
    {
        self.modules.push(RawModuleInfo {
            name: name.to_string(),
            load_address: Address::new(base),
            size,
        });
        self
    }

    /// Map zero-filled pages covering `[address, address + len)`.
    #[must_use]
    pub fn map(mut self, address: u64, len: u64) -> Self
    {
        self.memory.map(address, len);
        self
    }

    /// Write raw bytes (mapping pages as needed).
    #[must_use]
    pub fn bytes(mut self, address: u64, bytes: &[u8]) -> Self
    {
        self.memory.write(address, bytes);
        self
    }

    /// Write a little-endian `u8`.
    #[must_use]
    pub fn u8(self, address: u64, value: u8) -> Self
    {
        self.bytes(address, &[value])
    }

    /// Write a little-endian `u16`.
    #[must_use]
    pub fn u16(self, address: u64, value: u16) -> Self
    {
        self.bytes(address, &value.to_le_bytes())
    }

    /// Write a little-endian `u32`.
    #[must_use]
    pub fn u32(self, address: u64, value: u32) -> Self
    {
        self.bytes(address, &value.to_le_bytes())
    }

    /// Write a little-endian `u64`.
    #[must_use]
    pub fn u64(self, address: u64, value: u64) -> Self
    {
        self.bytes(address, &value.to_le_bytes())
    }

    /// Write a pointer of the snapshot's width.
    #[must_use]
    pub fn pointer(self, address: u64, value: u64) -> Self
    {
        if self.pointer_64bit {
            self.u64(address, value)
        } else {
            #[allow(clippy::cast_possible_truncation)]
            self.u32(address, value as u32)
        }
    }

    /// Use 4-byte (`false`) or 8-byte (`true`) pointers. Defaults to 8.
    #[must_use]
    pub fn pointer_64bit(mut self, pointer_64bit: bool) -> Self
    {
        self.pointer_64bit = pointer_64bit;
        self
    }

    /// Add a frame to the current thread's stack (innermost first).
    ///
    /// `code_address` is the engine's textual address (`"0x..."`); `None`
    /// models a frame without a code context.
    #[must_use]
    pub fn frame(mut self, addr_min: u64, addr_max: u64, code_address: Option<&str>) -> Self
    {
        self.frames.get_or_insert_with(Vec::new).push(SnapshotFrame {
            range: RawFrameRange {
                addr_min: Address::new(addr_min),
                addr_max: Address::new(addr_max),
            },
            address_text: code_address.map(str::to_string),
        });
        self
    }

    /// Record a current thread with an empty stack.
    #[must_use]
    pub fn thread(mut self) -> Self
    {
        self.frames.get_or_insert_with(Vec::new);
        self
    }

    /// Finish the snapshot.
    pub fn build(self) -> SnapshotBackend
    {
        SnapshotBackend {
            modules: Arc::new(self.modules),
            memory: Arc::new(self.memory),
            frames: self.frames.map(Arc::new),
            pointer_64bit: self.pointer_64bit,
            stats: Arc::new(ResourceStats::default()),
        }
    }
}

/// In-memory debuggee backend.
#[derive(Debug, Clone)]
pub struct SnapshotBackend
{
    modules: Arc<Vec<RawModuleInfo>>,
    memory: Arc<PageMap>,
    frames: Option<Arc<Vec<SnapshotFrame>>>,
    pointer_64bit: bool,
    stats: Arc<ResourceStats>,
}

impl SnapshotBackend
{
    /// Start building a snapshot (64-bit, no modules, no memory, no thread).
    pub fn builder() -> SnapshotBuilder
    {
        SnapshotBuilder {
            modules: Vec::new(),
            memory: PageMap::default(),
            frames: None,
            pointer_64bit: true,
        }
    }

    /// Shared resource counters.
    pub fn stats(&self) -> Arc<ResourceStats>
    {
        Arc::clone(&self.stats)
    }
}

impl DebugBackend for SnapshotBackend
{
    fn is_pointer_64bit(&self) -> bool
    {
        self.pointer_64bit
    }

    fn enum_modules(&self) -> RemoraResult<Box<dyn ModuleEnumerator>>
    {
        self.stats.acquire();
        Ok(Box::new(SnapshotModules {
            modules: Arc::clone(&self.modules),
            position: 0,
            stats: Arc::clone(&self.stats),
        }))
    }

    fn enum_frames(&self, max_frames: usize) -> RemoraResult<Option<Box<dyn FrameEnumerator>>>
    {
        let Some(frames) = &self.frames else {
            return Ok(None);
        };
        self.stats.acquire();
        Ok(Some(Box::new(SnapshotFrames {
            frames: Arc::clone(frames),
            limit: max_frames,
            position: 0,
            stats: Arc::clone(&self.stats),
        })))
    }

    fn memory_context(&self, address: Address) -> RemoraResult<Box<dyn MemoryContext>>
    {
        self.stats.acquire();
        Ok(Box::new(SnapshotMemory {
            memory: Arc::clone(&self.memory),
            address,
            stats: Arc::clone(&self.stats),
        }))
    }
}

struct SnapshotModules
{
    modules: Arc<Vec<RawModuleInfo>>,
    position: usize,
    stats: Arc<ResourceStats>,
}

impl BackendResource for SnapshotModules
{
    fn label(&self) -> &'static str
    {
        "module enumerator"
    }

    fn release(&mut self)
    {
        self.stats.release();
    }
}

impl ModuleEnumerator for SnapshotModules
{
    fn reset(&mut self)
    {
        self.position = 0;
    }

    fn next_module(&mut self) -> Option<RawModuleInfo>
    {
        let module = self.modules.get(self.position).cloned();
        self.position += 1;
        module
    }
}

struct SnapshotFrames
{
    frames: Arc<Vec<SnapshotFrame>>,
    limit: usize,
    position: usize,
    stats: Arc<ResourceStats>,
}

impl BackendResource for SnapshotFrames
{
    fn label(&self) -> &'static str
    {
        "frame enumerator"
    }

    fn release(&mut self)
    {
        self.stats.release();
    }
}

impl FrameEnumerator for SnapshotFrames
{
    fn count(&self) -> usize
    {
        self.frames.len().min(self.limit)
    }

    fn reset(&mut self)
    {
        self.position = 0;
    }

    fn next_frames(&mut self, max: usize) -> Vec<RawFrame>
    {
        let end = (self.position + max).min(self.count());
        let batch = self.frames[self.position.min(end)..end]
            .iter()
            .map(|frame| RawFrame {
                range: frame.range,
                code_context: frame.address_text.clone().map(|text| {
                    self.stats.acquire();
                    Box::new(SnapshotCodeContext {
                        text,
                        stats: Arc::clone(&self.stats),
                    }) as Box<dyn CodeContext>
                }),
            })
            .collect();
        self.position = end;
        batch
    }
}

struct SnapshotCodeContext
{
    text: String,
    stats: Arc<ResourceStats>,
}

impl BackendResource for SnapshotCodeContext
{
    fn label(&self) -> &'static str
    {
        "code context"
    }

    fn release(&mut self)
    {
        self.stats.release();
    }
}

impl CodeContext for SnapshotCodeContext
{
    fn address_text(&self) -> Option<String>
    {
        Some(self.text.clone())
    }
}

struct SnapshotMemory
{
    memory: Arc<PageMap>,
    address: Address,
    stats: Arc<ResourceStats>,
}

impl BackendResource for SnapshotMemory
{
    fn label(&self) -> &'static str
    {
        "memory context"
    }

    fn release(&mut self)
    {
        self.stats.release();
    }
}

impl MemoryContext for SnapshotMemory
{
    fn read(&mut self, buf: &mut [u8]) -> RemoraResult<usize>
    {
        self.stats.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.memory.read(self.address.value(), buf))
    }
}
