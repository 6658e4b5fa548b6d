//! # Configuration
//!
//! Tunables for the bridge and the navigator.
//!
//! Both structs have sensible defaults and can be read from the environment:
//!
//! - `REMORA_MAX_FRAMES`: frames captured per call stack (default: 10)
//! - `REMORA_FRAME_BASE_ADJUST`: bytes subtracted from each frame's base (default: 8)
//! - `REMORA_POINTER_SIZE`: force the target pointer size (4 or 8; default: ask the bridge)
//! - `REMORA_ENDIAN`: target byte order (`little` or `big`, default: `little`)
//! - `REMORA_MAX_SEQUENCE`: longest list/array walk before giving up (default: 100000)
//!
//! Invalid values are logged and replaced with the default.

use std::env;
use std::str::FromStr;

use tracing::warn;

use crate::types::Endianness;

/// Settings for [`crate::bridge::BackendBridge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig
{
    /// Upper bound on frames requested from the backend's frame enumerator
    pub max_frames: usize,
    /// Bytes subtracted from a frame's lowest address to get its base
    ///
    /// The default of 8 matches the Visual Studio engine on x86-64. Whether
    /// it holds on other architectures has not been verified.
    pub frame_base_adjustment: u64,
    /// Character that starts a module's filename suffix (`foo.dll` → `foo`)
    pub module_suffix_separator: char,
}

impl Default for BridgeConfig
{
    fn default() -> Self
    {
        Self {
            max_frames: 10,
            frame_base_adjustment: 8,
            module_suffix_separator: '.',
        }
    }
}

impl BridgeConfig
{
    /// Defaults overridden by `REMORA_MAX_FRAMES` and `REMORA_FRAME_BASE_ADJUST`.
    #[must_use]
    pub fn from_env() -> Self
    {
        let defaults = Self::default();
        Self {
            max_frames: env_or("REMORA_MAX_FRAMES", defaults.max_frames),
            frame_base_adjustment: env_or("REMORA_FRAME_BASE_ADJUST", defaults.frame_base_adjustment),
            module_suffix_separator: defaults.module_suffix_separator,
        }
    }
}

/// Settings for [`crate::navigation::Navigator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigatorConfig
{
    /// Target pointer size in bytes; `None` asks the bridge on every read so
    /// bitness changes are picked up
    pub pointer_size: Option<usize>,
    /// Target byte order
    pub endianness: Endianness,
    /// Longest list or array the navigator will materialize
    pub max_sequence_len: usize,
}

impl Default for NavigatorConfig
{
    fn default() -> Self
    {
        Self {
            pointer_size: None,
            endianness: Endianness::Little,
            max_sequence_len: 100_000,
        }
    }
}

impl NavigatorConfig
{
    /// Defaults overridden by `REMORA_POINTER_SIZE`, `REMORA_ENDIAN` and
    /// `REMORA_MAX_SEQUENCE`.
    #[must_use]
    pub fn from_env() -> Self
    {
        let defaults = Self::default();
        let pointer_size = match env::var("REMORA_POINTER_SIZE") {
            Ok(raw) => match raw.parse::<usize>() {
                Ok(size @ (4 | 8)) => Some(size),
                _ => {
                    warn!("Ignoring REMORA_POINTER_SIZE={raw}: expected 4 or 8");
                    defaults.pointer_size
                }
            },
            Err(_) => defaults.pointer_size,
        };
        Self {
            pointer_size,
            endianness: env_or("REMORA_ENDIAN", defaults.endianness),
            max_sequence_len: env_or("REMORA_MAX_SEQUENCE", defaults.max_sequence_len),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {key}={raw}");
            default
        }),
        Err(_) => default,
    }
}
