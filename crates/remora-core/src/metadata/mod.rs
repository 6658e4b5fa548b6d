//! # Type Metadata
//!
//! Layout descriptors (field offsets, array strides, dispatch tables) and the
//! provider trait the navigator reads them through.
//!
//! The crate never resolves symbols itself. A provider hands out
//! [`TypeDescriptor`]s by module and type name, and answers "which type owns
//! this vtable" for runtime downcasts.

pub mod descriptor;
pub mod provider;

pub use descriptor::{
    resolve_discriminant, ArrayLayout, ArrayLength, ArrayStorage, DiscriminantSource, DispatchTable, FieldLayout,
    PatchLayout, TypeDescriptor,
};
pub use provider::{StaticMetadata, TypeMetadataProvider};
