//! # Navigator
//!
//! The navigation engine: turns handles plus type metadata into new handles
//! and scalar values, reading the debuggee through a [`DebuggerBridge`].
//!
//! Every public operation returns a [`Pending`] that owns what it needs, so
//! chains can outlive the borrow of the navigator. Nothing is read until the
//! pending operation is awaited.
//!
//! ## NULL handling
//!
//! A NULL handle (address 0) navigates to NULL or to an empty sequence
//! without touching the bridge. Reading the *value* of a NULL handle is an
//! `InvalidArgument` error instead, since there is nothing to decode.
//!
//! ## Pointers
//!
//! A handle of type `T*` denotes the pointer variable itself. Field lookup,
//! downcast, patch resolution and sequence walks dereference pointer handles
//! first; [`Navigator::deref`] does it explicitly.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use super::cursor::Cursor;
use super::handle::RemoteObject;
use super::path::{first_segment, FieldPath};
use super::pending::Pending;
use super::sequence::{ArrayWalk, ListWalk, NextLink};
use super::variants::{TypeVariants, Variant};
use crate::bridge::DebuggerBridge;
use crate::config::NavigatorConfig;
use crate::error::{RemoraError, RemoraResult};
use crate::metadata::{resolve_discriminant, DiscriminantSource, TypeDescriptor, TypeMetadataProvider};
use crate::types::{Address, ScalarKind, ScalarValue};

struct NavigatorInner
{
    bridge: Arc<dyn DebuggerBridge>,
    metadata: Arc<dyn TypeMetadataProvider>,
    config: NavigatorConfig,
}

/// Lazy navigation over a suspended debuggee.
///
/// Cheap to clone; clones share the bridge and the metadata provider.
#[derive(Clone)]
pub struct Navigator
{
    inner: Arc<NavigatorInner>,
}

impl fmt::Debug for Navigator
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Navigator")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl Navigator
{
    /// Navigator reading through `bridge` with layouts from `metadata`.
    pub fn new(
        bridge: Arc<dyn DebuggerBridge>,
        metadata: Arc<dyn TypeMetadataProvider>,
        config: NavigatorConfig,
    ) -> Self
    {
        Self {
            inner: Arc::new(NavigatorInner {
                bridge,
                metadata,
                config,
            }),
        }
    }

    /// The bridge reads go through.
    pub fn bridge(&self) -> &Arc<dyn DebuggerBridge>
    {
        &self.inner.bridge
    }

    /// The layout source.
    pub fn metadata(&self) -> &Arc<dyn TypeMetadataProvider>
    {
        &self.inner.metadata
    }

    /// Active configuration.
    pub fn config(&self) -> &NavigatorConfig
    {
        &self.inner.config
    }

    /// Target pointer size in bytes.
    ///
    /// Taken from the configuration when forced, otherwise from the bridge on
    /// every call so bitness changes are honored.
    pub fn pointer_size(&self) -> usize
    {
        self.inner
            .config
            .pointer_size
            .unwrap_or_else(|| if self.inner.bridge.is_pointer_64bit() { 8 } else { 4 })
    }

    /// Start a fluent chain at `handle`.
    pub fn at(&self, handle: RemoteObject) -> Cursor
    {
        Cursor::new(self.clone(), Pending::ready(handle))
    }

    /// Layout of the handle's declared type.
    ///
    /// ## Errors
    ///
    /// - `TypeNotFound`: the provider has no such type
    pub fn descriptor(&self, handle: &RemoteObject) -> Pending<'static, Arc<TypeDescriptor>>
    {
        let nav = self.clone();
        let handle = handle.clone();
        Pending::new(async move { nav.descriptor_of(&handle).await })
    }

    /// Follow a pointer handle to the value it points at.
    ///
    /// A NULL pointer variable, or a pointer whose value is 0, gives a NULL
    /// handle that keeps the pointee type.
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument`: the handle is not pointer-typed
    /// - anything the bridge read fails with
    pub fn deref(&self, handle: RemoteObject) -> Pending<'static, RemoteObject>
    {
        let nav = self.clone();
        Pending::new(async move { nav.deref_once(handle).await })
    }

    /// Child handle for the first candidate of `path` that exists on the type.
    ///
    /// ## Errors
    ///
    /// - `FieldNotFound`: no candidate exists, or a later segment of the
    ///   chosen dotted candidate is missing
    /// - `TypeNotFound`: a type along the path has no layout
    pub fn field(&self, handle: RemoteObject, path: impl Into<FieldPath>) -> Pending<'static, RemoteObject>
    {
        let nav = self.clone();
        let path = path.into();
        Pending::new(async move { nav.resolve_field(handle, &path).await })
    }

    /// Like [`Navigator::field`], with the declared field type replaced by
    /// `type_name`.
    pub fn field_as(
        &self,
        handle: RemoteObject,
        path: impl Into<FieldPath>,
        type_name: &str,
    ) -> Pending<'static, RemoteObject>
    {
        let type_name: Arc<str> = Arc::from(type_name);
        self.field(handle, path).map(move |child| child.retyped(type_name))
    }

    /// Element `index` of the array starting at the handle.
    ///
    /// For a pointer handle `T*` this is `p[index]`: the pointer is read and
    /// the element is a `T`. Otherwise the handle is the first element.
    pub fn index(&self, handle: RemoteObject, index: u64) -> Pending<'static, RemoteObject>
    {
        let nav = self.clone();
        Pending::new(async move { nav.element_at(handle, index).await })
    }

    /// Elements of a container type, sized by its array layout.
    pub fn array(&self, handle: RemoteObject) -> ArrayWalk
    {
        ArrayWalk::new(self.clone(), handle, None)
    }

    /// `count` elements starting at the handle (or at the storage of its
    /// array layout, if it has one).
    pub fn array_n(&self, handle: RemoteObject, count: u64) -> ArrayWalk
    {
        ArrayWalk::new(self.clone(), handle, Some(count))
    }

    /// Singly linked list starting at `head`, advanced by `next` until NULL.
    pub fn list(&self, head: RemoteObject, next: impl Into<NextLink>) -> ListWalk
    {
        ListWalk::new(self.clone(), head, next.into())
    }

    /// Retype the handle to its most-derived runtime type.
    ///
    /// The discriminant (vtable pointer or tag field) is resolved against the
    /// type's dispatch table, then against the provider's vtable owners. An
    /// unknown discriminant leaves the handle unchanged.
    ///
    /// ## Errors
    ///
    /// - reading the discriminant failed
    pub fn downcast(&self, handle: RemoteObject) -> Pending<'static, RemoteObject>
    {
        let nav = self.clone();
        Pending::new(async move { nav.most_derived(handle).await })
    }

    /// The most recent patch of a copy-on-write versioned structure.
    ///
    /// Returns the handle unchanged when the type is not patch-versioned or
    /// no patch has been applied.
    pub fn latest_patch(&self, handle: RemoteObject) -> Pending<'static, RemoteObject>
    {
        let nav = self.clone();
        Pending::new(async move { nav.resolve_latest_patch(handle).await })
    }

    /// Name of the handle's most-derived runtime type.
    pub fn runtime_type_name(&self, handle: RemoteObject) -> Pending<'static, String>
    {
        self.downcast(handle).map(|derived| derived.type_name().to_string())
    }

    /// Classify the handle's runtime type against a closed set of variants.
    pub fn variant<T>(&self, handle: RemoteObject, variants: &TypeVariants<T>) -> Pending<'static, Variant<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        let variants = variants.clone();
        self.runtime_type_name(handle).map(move |name| variants.classify(&name))
    }

    /// Decode the handle's value according to its declared type.
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument`: the handle is NULL
    /// - `NotAScalar`: the type has no scalar decoding
    /// - anything the bridge read fails with
    pub fn value(&self, handle: RemoteObject) -> Pending<'static, ScalarValue>
    {
        let nav = self.clone();
        Pending::new(async move { nav.scalar(&handle).await })
    }

    /// Value of a pointer-typed handle.
    pub fn pointer_value(&self, handle: RemoteObject) -> Pending<'static, Address>
    {
        let nav = self.clone();
        Pending::new(async move { nav.pointer_target(&handle).await })
    }

    /// Raw bytes at the handle's address.
    pub fn read_bytes(&self, handle: RemoteObject, len: usize) -> Pending<'static, Vec<u8>>
    {
        let nav = self.clone();
        Pending::new(async move {
            ensure_not_null(&handle, "read bytes")?;
            nav.inner.bridge.read_bytes(handle.address(), len).await
        })
    }

    /// Size in bytes of the handle's declared type.
    pub fn size_of(&self, handle: &RemoteObject) -> Pending<'static, u64>
    {
        let nav = self.clone();
        let handle = handle.clone();
        Pending::new(async move { nav.type_size(handle.module(), handle.type_name()).await })
    }

    pub(crate) async fn descriptor_of(&self, handle: &RemoteObject) -> RemoraResult<Arc<TypeDescriptor>>
    {
        self.inner
            .metadata
            .lookup_type(handle.module(), handle.type_name())
            .await
    }

    pub(crate) async fn type_size(&self, module: &str, type_name: &str) -> RemoraResult<u64>
    {
        if let Some(kind) = ScalarKind::from_type_name(type_name) {
            return Ok(kind.size(self.pointer_size()) as u64);
        }
        Ok(self.inner.metadata.lookup_type(module, type_name).await?.size)
    }

    pub(crate) async fn read_pointer(&self, address: Address) -> RemoraResult<Address>
    {
        let bytes = self.inner.bridge.read_bytes(address, self.pointer_size()).await?;
        let value = ScalarKind::Pointer.decode(&bytes, self.inner.config.endianness)?;
        Ok(Address::new(value.as_u64().unwrap_or_default()))
    }

    async fn deref_once(&self, handle: RemoteObject) -> RemoraResult<RemoteObject>
    {
        let Some(pointee) = handle.pointee_type() else {
            return Err(RemoraError::InvalidArgument(format!(
                "cannot dereference non-pointer type {}",
                handle.type_name()
            )));
        };
        let pointee: Arc<str> = Arc::from(pointee);
        if handle.is_null() {
            return Ok(handle.retyped(pointee));
        }
        let target = self.read_pointer(handle.address()).await?;
        trace!("deref {handle} -> {target}");
        Ok(handle.retyped(pointee).at(target))
    }

    /// Dereference until the handle is not pointer-typed or is NULL.
    pub(crate) async fn auto_deref(&self, mut handle: RemoteObject) -> RemoraResult<RemoteObject>
    {
        while handle.is_pointer() {
            let next = self.deref_once(handle).await?;
            if next.is_null() {
                return Ok(next);
            }
            handle = next;
        }
        Ok(handle)
    }

    pub(crate) async fn resolve_field(&self, handle: RemoteObject, path: &FieldPath) -> RemoraResult<RemoteObject>
    {
        if path.is_empty() {
            return Err(RemoraError::InvalidArgument("empty field path".to_string()));
        }
        let mut current = self.auto_deref(handle).await?;
        if current.is_null() {
            return Ok(RemoteObject::null());
        }

        let mut descriptor = self.descriptor_of(&current).await?;
        let Some(candidate) = path
            .candidates()
            .iter()
            .find(|candidate| descriptor.field(first_segment(candidate)).is_some())
        else {
            return Err(RemoraError::field_not_found(&descriptor.name, path.candidates().iter().cloned()));
        };

        for (depth, segment) in candidate.split('.').enumerate() {
            if depth > 0 {
                current = self.auto_deref(current).await?;
                if current.is_null() {
                    return Ok(RemoteObject::null());
                }
                descriptor = self.descriptor_of(&current).await?;
            }
            let field = descriptor
                .field(segment)
                .ok_or_else(|| RemoraError::field_not_found(&descriptor.name, [candidate.as_str()]))?;
            let address = current.address().checked_add(field.offset).ok_or_else(|| {
                RemoraError::InvalidArgument(format!("field {segment} of {current} overflows the address space"))
            })?;
            current = current.retyped(field.type_name.as_str()).at(address);
        }
        Ok(current)
    }

    async fn element_at(&self, handle: RemoteObject, index: u64) -> RemoraResult<RemoteObject>
    {
        let first = if handle.is_pointer() {
            self.deref_once(handle).await?
        } else {
            handle
        };
        if first.is_null() {
            return Ok(first);
        }
        let stride = self.type_size(first.module(), first.type_name()).await?;
        let address = first
            .address()
            .element(index, stride)
            .ok_or_else(|| RemoraError::InvalidArgument(format!("index {index} of {first} overflows")))?;
        Ok(first.at(address))
    }

    async fn most_derived(&self, handle: RemoteObject) -> RemoraResult<RemoteObject>
    {
        let handle = self.auto_deref(handle).await?;
        // Scalars have no descriptor and no runtime type
        if handle.is_null() || ScalarKind::from_type_name(handle.type_name()).is_some() {
            return Ok(handle);
        }
        let descriptor = self.descriptor_of(&handle).await?;

        let resolved = match &descriptor.dispatch {
            Some(table) => match &table.source {
                DiscriminantSource::VtablePointer => {
                    let vtable = self.read_pointer(handle.address()).await?;
                    match resolve_discriminant(table, vtable.value()) {
                        Some(name) => Some(name.to_string()),
                        None => self.inner.metadata.lookup_vtable_owner(handle.module(), vtable).await,
                    }
                }
                DiscriminantSource::TagField(field) => {
                    let tag_handle = self.resolve_field(handle.clone(), &FieldPath::from(field.as_str())).await?;
                    let tag = self.scalar(&tag_handle).await?;
                    tag.as_u64()
                        .and_then(|tag| resolve_discriminant(table, tag))
                        .map(str::to_string)
                }
            },
            None if descriptor.size >= self.pointer_size() as u64 => {
                let vtable = self.read_pointer(handle.address()).await?;
                self.inner.metadata.lookup_vtable_owner(handle.module(), vtable).await
            }
            None => None,
        };

        match resolved {
            Some(name) if name != handle.type_name() => {
                debug!("downcast {handle} -> {name}");
                Ok(handle.retyped(name))
            }
            _ => Ok(handle),
        }
    }

    async fn resolve_latest_patch(&self, handle: RemoteObject) -> RemoraResult<RemoteObject>
    {
        let handle = self.auto_deref(handle).await?;
        if handle.is_null() {
            return Ok(handle);
        }
        let descriptor = self.descriptor_of(&handle).await?;
        let Some(patch) = &descriptor.patch else {
            return Ok(handle);
        };
        let pointer = self
            .resolve_field(handle.clone(), &FieldPath::from(patch.latest_field.as_str()))
            .await?;
        let latest = self.pointer_target(&pointer).await?;
        if latest.is_null() {
            Ok(handle)
        } else {
            trace!("latest patch of {handle} is at {latest}");
            Ok(handle.at(latest))
        }
    }

    pub(crate) async fn scalar(&self, handle: &RemoteObject) -> RemoraResult<ScalarValue>
    {
        ensure_not_null(handle, "read the value of")?;
        let kind = match ScalarKind::from_type_name(handle.type_name()) {
            Some(kind) => kind,
            None => self
                .descriptor_of(handle)
                .await?
                .scalar
                .ok_or_else(|| RemoraError::NotAScalar(handle.type_name().to_string()))?,
        };
        let bytes = self
            .inner
            .bridge
            .read_bytes(handle.address(), kind.size(self.pointer_size()))
            .await?;
        kind.decode(&bytes, self.inner.config.endianness)
    }

    pub(crate) async fn pointer_target(&self, handle: &RemoteObject) -> RemoraResult<Address>
    {
        if !handle.is_pointer() {
            return Err(RemoraError::InvalidArgument(format!(
                "{} is not a pointer type",
                handle.type_name()
            )));
        }
        ensure_not_null(handle, "read the pointer value of")?;
        self.read_pointer(handle.address()).await
    }
}

fn ensure_not_null(handle: &RemoteObject, action: &str) -> RemoraResult<()>
{
    if handle.is_null() {
        return Err(RemoraError::InvalidArgument(format!("cannot {action} a NULL handle")));
    }
    Ok(())
}
