//! Metadata provider trait and an in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::descriptor::TypeDescriptor;
use crate::error::{RemoraError, RemoraResult};
use crate::types::Address;

/// Source of type layouts.
///
/// Symbol and layout resolution (PDB, DWARF, ...) lives outside this crate;
/// the navigator only consumes descriptors through this trait.
#[async_trait]
pub trait TypeMetadataProvider: Send + Sync
{
    /// Layout of `type_name` in `module`.
    ///
    /// ## Errors
    ///
    /// - `TypeNotFound`: no descriptor for the pair
    async fn lookup_type(&self, module: &str, type_name: &str) -> RemoraResult<Arc<TypeDescriptor>>;

    /// Type whose vtable lives at `vtable`, if known.
    async fn lookup_vtable_owner(&self, module: &str, vtable: Address) -> Option<String>;
}

/// Provider backed by descriptors registered up front.
///
/// Useful for tests, demos, and embedders that already hold layouts.
///
/// ## Example
///
/// ```rust
/// use remora_core::metadata::{StaticMetadata, TypeDescriptor};
///
/// let metadata = StaticMetadata::new()
///     .with_type("app", TypeDescriptor::new("Node", 16).with_field("next", 0, 8, "Node*"))
///     .with_vtable("app", 0x1400_2000, "Node");
/// assert!(metadata.contains("app", "Node"));
/// ```
#[derive(Debug, Default, Clone)]
pub struct StaticMetadata
{
    types: HashMap<(String, String), Arc<TypeDescriptor>>,
    vtables: HashMap<(String, u64), String>,
}

impl StaticMetadata
{
    /// Create an empty provider.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Register a descriptor under `module`.
    #[must_use]
    pub fn with_type(mut self, module: &str, descriptor: TypeDescriptor) -> Self
    {
        self.insert(module, descriptor);
        self
    }

    /// Register a vtable address as belonging to `type_name`.
    #[must_use]
    pub fn with_vtable(mut self, module: &str, vtable: u64, type_name: &str) -> Self
    {
        self.vtables.insert((module.to_string(), vtable), type_name.to_string());
        self
    }

    /// Register a descriptor, replacing any previous one with the same name.
    pub fn insert(&mut self, module: &str, descriptor: TypeDescriptor)
    {
        self.types
            .insert((module.to_string(), descriptor.name.clone()), Arc::new(descriptor));
    }

    /// `true` if a descriptor is registered for the pair.
    pub fn contains(&self, module: &str, type_name: &str) -> bool
    {
        self.types.contains_key(&(module.to_string(), type_name.to_string()))
    }
}

#[async_trait]
impl TypeMetadataProvider for StaticMetadata
{
    async fn lookup_type(&self, module: &str, type_name: &str) -> RemoraResult<Arc<TypeDescriptor>>
    {
        self.types
            .get(&(module.to_string(), type_name.trim().to_string()))
            .cloned()
            .ok_or_else(|| RemoraError::TypeNotFound {
                module: module.to_string(),
                type_name: type_name.to_string(),
            })
    }

    async fn lookup_vtable_owner(&self, module: &str, vtable: Address) -> Option<String>
    {
        self.vtables.get(&(module.to_string(), vtable.value())).cloned()
    }
}
