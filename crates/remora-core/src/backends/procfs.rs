//! # Linux Live-Process Backend
//!
//! Reads a running (or ptrace-stopped) process through procfs and
//! `process_vm_readv(2)`.
//!
//! - **Modules**: file-backed mappings from `/proc/<pid>/maps`, merged per path
//! - **Memory**: `process_vm_readv`, which needs the same permissions as ptrace
//! - **Break state**: `/proc/<pid>/stat`; a stopped or traced process counts
//!   as broken in
//! - **Bitness**: ELF class of `/proc/<pid>/exe`
//!
//! Stack frames need an unwinder, which this backend does not have, so
//! `enum_frames` reports `UnsupportedOperation`.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::bridge::{BackendResource, DebugBackend, FrameEnumerator, MemoryContext, ModuleEnumerator, RawModuleInfo};
use crate::error::{RemoraError, RemoraResult};
use crate::events::DebuggerStatus;
use crate::types::Address;

const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];
const ELF_CLASS_64: u8 = 2;

/// Backend over a live Linux process.
#[derive(Debug, Clone)]
pub struct ProcfsBackend
{
    pid: libc::pid_t,
    root: PathBuf,
    pointer_64bit: bool,
}

impl ProcfsBackend
{
    /// Open process `pid`.
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument`: `pid` does not fit a `pid_t`
    /// - `DebuggeeUnavailable`: no such process
    pub fn new(pid: u32) -> RemoraResult<Self>
    {
        let pid = libc::pid_t::try_from(pid).map_err(|_| RemoraError::InvalidArgument(format!("invalid pid {pid}")))?;
        let root = PathBuf::from(format!("/proc/{pid}"));
        if !root.exists() {
            return Err(RemoraError::DebuggeeUnavailable(format!("process {pid} does not exist")));
        }
        let pointer_64bit = read_elf_class(&root.join("exe")).unwrap_or(cfg!(target_pointer_width = "64"));
        debug!("opened process {pid} (64-bit: {pointer_64bit})");
        Ok(Self {
            pid,
            root,
            pointer_64bit,
        })
    }

    /// Process id.
    pub fn pid(&self) -> u32
    {
        u32::try_from(self.pid).unwrap_or_default()
    }

    /// Status derived from the process state in `/proc/<pid>/stat`.
    ///
    /// ## Errors
    ///
    /// - `Io`: the stat file could not be read
    pub fn current_status(&self) -> RemoraResult<DebuggerStatus>
    {
        match fs::read_to_string(self.root.join("stat")) {
            Ok(stat) => Ok(parse_stat_state(&stat).map_or(DebuggerStatus::Waiting, status_for_state)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(DebuggerStatus::Detaching),
            Err(err) => Err(err.into()),
        }
    }
}

impl DebugBackend for ProcfsBackend
{
    fn is_pointer_64bit(&self) -> bool
    {
        self.pointer_64bit
    }

    fn enum_modules(&self) -> RemoraResult<Box<dyn ModuleEnumerator>>
    {
        let maps = fs::read_to_string(self.root.join("maps"))?;
        Ok(Box::new(ProcfsModules {
            modules: parse_maps(&maps),
            position: 0,
        }))
    }

    fn enum_frames(&self, _max_frames: usize) -> RemoraResult<Option<Box<dyn FrameEnumerator>>>
    {
        Err(RemoraError::UnsupportedOperation(
            "stack enumeration needs an unwinder; procfs provides none".to_string(),
        ))
    }

    fn memory_context(&self, address: Address) -> RemoraResult<Box<dyn MemoryContext>>
    {
        Ok(Box::new(ProcfsMemory { pid: self.pid, address }))
    }
}

struct ProcfsModules
{
    modules: Vec<RawModuleInfo>,
    position: usize,
}

impl BackendResource for ProcfsModules
{
    fn label(&self) -> &'static str
    {
        "procfs module list"
    }
}

impl ModuleEnumerator for ProcfsModules
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

struct ProcfsMemory
{
    pid: libc::pid_t,
    address: Address,
}

impl BackendResource for ProcfsMemory
{
    fn label(&self) -> &'static str
    {
        "process_vm_readv context"
    }
}

impl MemoryContext for ProcfsMemory
{
    fn read(&mut self, buf: &mut [u8]) -> RemoraResult<usize>
    {
        let remote_base = usize::try_from(self.address.value()).map_err(|_| RemoraError::MemoryUnreadable {
            address: self.address,
            len: buf.len(),
        })?;
        let local = libc::iovec {
            iov_base: buf.as_mut_ptr().cast(),
            iov_len: buf.len(),
        };
        let remote = libc::iovec {
            iov_base: remote_base as *mut libc::c_void,
            iov_len: buf.len(),
        };

        // SAFETY: `local` covers exactly `buf`, which is live and writable for
        // the duration of the call. `remote` is only dereferenced by the kernel
        // in the target's address space.
        let read = unsafe { libc::process_vm_readv(self.pid, &local, 1, &remote, 1, 0) };

        if read >= 0 {
            return Ok(usize::try_from(read).unwrap_or_default());
        }
        let err = std::io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::EFAULT) => Err(RemoraError::MemoryUnreadable {
                address: self.address,
                len: buf.len(),
            }),
            Some(libc::ESRCH) => Err(RemoraError::DebuggeeUnavailable(format!("process {} exited", self.pid))),
            _ => Err(err.into()),
        }
    }
}

/// Process state letter from the contents of `/proc/<pid>/stat`.
///
/// The command name may contain spaces and parentheses, so the state is the
/// first field after the *last* `)`.
pub fn parse_stat_state(stat: &str) -> Option<char>
{
    let rest = &stat[stat.rfind(')')? + 1..];
    rest.split_whitespace().next()?.chars().next()
}

fn status_for_state(state: char) -> DebuggerStatus
{
    match state {
        // Stopped by a signal or by a tracer
        'T' | 't' => DebuggerStatus::Break,
        // Zombie or dead: nothing left to read
        'Z' | 'X' | 'x' => DebuggerStatus::Detaching,
        _ => DebuggerStatus::Waiting,
    }
}

/// File-backed modules from the contents of `/proc/<pid>/maps`.
///
/// All mappings of one path are merged into a single module spanning the
/// lowest start to the highest end. Order follows the first mapping of each
/// path. Anonymous and pseudo mappings (`[heap]`, `[stack]`, ...) are skipped.
pub fn parse_maps(maps: &str) -> Vec<RawModuleInfo>
{
    let mut modules: Vec<(String, u64, u64)> = Vec::new();
    for line in maps.lines() {
        let mut parts = line.splitn(6, char::is_whitespace);
        let Some(range) = parts.next() else {
            continue;
        };
        // perms, offset, dev, inode
        let path = parts.nth(4).map(str::trim).unwrap_or_default();
        if !path.starts_with('/') {
            continue;
        }
        let Some((start, end)) = range.split_once('-') else {
            continue;
        };
        let (Ok(start), Ok(end)) = (u64::from_str_radix(start, 16), u64::from_str_radix(end, 16)) else {
            continue;
        };

        match modules.iter_mut().find(|(p, _, _)| p == path) {
            Some(entry) => {
                entry.1 = entry.1.min(start);
                entry.2 = entry.2.max(end);
            }
            None => modules.push((path.to_string(), start, end)),
        }
    }

    modules
        .into_iter()
        .map(|(path, start, end)| RawModuleInfo {
            name: Path::new(&path)
                .file_name()
                .map_or_else(|| path.clone(), |name| name.to_string_lossy().into_owned()),
            load_address: Address::new(start),
            size: end - start,
        })
        .collect()
}

fn read_elf_class(exe: &Path) -> Option<bool>
{
    let mut header = [0u8; 5];
    fs::File::open(exe).ok()?.read_exact(&mut header).ok()?;
    if header[..4] != ELF_MAGIC {
        return None;
    }
    Some(header[4] == ELF_CLASS_64)
}
