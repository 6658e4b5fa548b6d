//! # Types
//!
//! Backend-agnostic value types shared by the bridge and the navigation
//! engine.
//!
//! These types abstract away backend details, so the engine can talk about
//! "an address", "a module" or "a stack frame" without knowing whether the
//! data comes from a live process or a crash dump.

pub mod address;
pub mod module;
pub mod scalar;
pub mod stack;

// Re-export all public types
pub use address::Address;
pub use module::{strip_module_suffix, ModuleDescriptor};
pub use scalar::{Endianness, ScalarKind, ScalarValue};
pub use stack::StackFrame;
