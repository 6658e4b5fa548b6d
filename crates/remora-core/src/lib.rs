//! # remora-core
//!
//! Lazy remote object navigation over a suspended debuggee, and the debugger
//! bridge that feeds it.
//!
//! This crate provides:
//! - A navigation engine over typed values in another process: field lookup
//!   with version aliases, pointer chasing, arrays, linked lists, runtime-type
//!   downcasts and copy-on-write patch resolution
//! - An asynchronous bridge over blocking debugger backends, gated on the
//!   debuggee being in a break state
//! - Backends for in-memory snapshots and (on Linux) live processes
//! - Registries for roots, address interpreters, computed fields and
//!   descriptions
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use remora_core::prelude::*;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let backend = SnapshotBackend::builder()
//!     .module("app.exe", 0x40_0000, 0x1_0000)
//!     .u64(0x1000, 0x2000) // node A: next -> B
//!     .u64(0x1008, 1)
//!     .u64(0x2000, 0) // node B: end of list
//!     .u64(0x2008, 2)
//!     .build();
//! let bridge = BackendBridge::new(backend, BridgeConfig::default());
//! bridge.notify_state(DebuggerStatus::Break);
//!
//! let metadata = StaticMetadata::new().with_type(
//!     "app",
//!     TypeDescriptor::new("Node", 16)
//!         .with_field("next", 0, 8, "Node*")
//!         .with_field("value", 8, 8, "uint64_t"),
//! );
//! let nav = Navigator::new(Arc::new(bridge), Arc::new(metadata), NavigatorConfig::default());
//!
//! let head = RemoteObject::new("app", "Node", Address::new(0x1000));
//! let values = nav.at(head).list("next").f("value").value().await.unwrap();
//! assert_eq!(values, vec![ScalarValue::Unsigned(1), ScalarValue::Unsigned(2)]);
//! # });
//! ```
//!
//! ## Why unsafe code is needed
//!
//! The Linux live-process backend reads the target with `process_vm_readv`,
//! a raw system call. The call is wrapped in a safe memory context; no other
//! module uses `unsafe`.

#![allow(unsafe_code)] // Required for process_vm_readv in the procfs backend

pub mod backends;
pub mod bridge;
pub mod config;
pub mod error;
pub mod events;
pub mod metadata;
pub mod navigation;
pub mod prelude;
pub mod registry;
pub mod types;

pub use bridge::{BackendBridge, DebuggerBridge};
pub use error::{RemoraError, RemoraResult};
pub use navigation::{Navigator, RemoteObject};
