//! # Remote Object Navigation
//!
//! Lazy, asynchronous navigation over typed values living in the debuggee.
//!
//! - [`RemoteObject`]: inert handle (module, type, address)
//! - [`FieldPath`]: field name with aliases across binary versions
//! - [`Pending`]: a not-yet-settled result with chaining combinators
//! - [`Navigator`]: the engine (field, deref, index, downcast, patches, values)
//! - [`ArrayWalk`] / [`ListWalk`]: restartable lazy sequences
//! - [`Cursor`] / [`CursorSeq`]: fluent chains over the above
//! - [`TypeVariants`]: closed classification of runtime type names

pub mod cursor;
pub mod handle;
pub mod navigator;
pub mod path;
pub mod pending;
pub mod sequence;
pub mod variants;

pub use cursor::{Cursor, CursorSeq};
pub use handle::RemoteObject;
pub use navigator::Navigator;
pub use path::FieldPath;
pub use pending::Pending;
pub use sequence::{ArrayWalk, ListWalk, NextFn, NextLink};
pub use variants::{TypeVariants, Variant};
