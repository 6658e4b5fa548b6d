//! Type layout descriptors.

use std::collections::HashMap;

use crate::types::ScalarKind;

/// One field of a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout
{
    /// Field name as it appears in the layout
    pub name: String,
    /// Byte offset from the start of the record
    pub offset: u64,
    /// Field size in bytes
    pub size: u64,
    /// Declared type of the field (`T*` for pointers)
    pub type_name: String,
}

/// Where an array's elements live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayStorage
{
    /// Elements start at the handle's own address.
    Inline,
    /// Elements live behind the pointer stored in the named field.
    Pointer
    {
        /// Field holding the element pointer
        field: String,
    },
}

/// How many elements an array has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayLength
{
    /// Length fixed by the type itself.
    Fixed(u64),
    /// Length read from a companion integer field.
    Field(String),
}

/// Array metadata for container-like types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayLayout
{
    /// Declared type of each element
    pub element_type: String,
    /// Stride between elements in bytes
    pub element_size: u64,
    /// Inline or pointer-backed storage
    pub storage: ArrayStorage,
    /// Fixed or field-driven length
    pub length: ArrayLength,
}

/// Where the runtime-type discriminant is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscriminantSource
{
    /// A pointer-sized vtable pointer at offset 0.
    VtablePointer,
    /// An integer tag stored in the named field.
    TagField(String),
}

/// Maps an observed discriminant to the most-derived type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchTable
{
    /// Where to read the discriminant
    pub source: DiscriminantSource,
    /// Discriminant value → concrete type name
    pub entries: HashMap<u64, String>,
}

impl DispatchTable
{
    /// Empty table reading the vtable pointer.
    pub fn vtable() -> Self
    {
        Self {
            source: DiscriminantSource::VtablePointer,
            entries: HashMap::new(),
        }
    }

    /// Empty table reading an integer tag field.
    pub fn tag_field(field: impl Into<String>) -> Self
    {
        Self {
            source: DiscriminantSource::TagField(field.into()),
            entries: HashMap::new(),
        }
    }

    /// Add a discriminant → type mapping.
    #[must_use]
    pub fn with_entry(mut self, discriminant: u64, type_name: impl Into<String>) -> Self
    {
        self.entries.insert(discriminant, type_name.into());
        self
    }
}

/// Resolve an observed discriminant against a dispatch table.
///
/// Pure function: no reads, no provider calls. `None` means the value is not
/// in the table, which callers treat as "keep the static type".
pub fn resolve_discriminant(table: &DispatchTable, discriminant: u64) -> Option<&str>
{
    table.entries.get(&discriminant).map(String::as_str)
}

/// Overlay metadata for structures that are mutated by copy-on-write patches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchLayout
{
    /// Field holding a pointer to the most recent patch (same type), or null
    pub latest_field: String,
}

/// Layout of one type in one module, as supplied by a metadata provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor
{
    /// Fully qualified type name
    pub name: String,
    /// Size of the type in bytes
    pub size: u64,
    fields: Vec<FieldLayout>,
    /// Array metadata, if the type is a container
    pub array: Option<ArrayLayout>,
    /// Runtime-type dispatch, if the type is polymorphic or tagged
    pub dispatch: Option<DispatchTable>,
    /// Patch overlay, if the type is versioned
    pub patch: Option<PatchLayout>,
    /// Scalar decoding for enums and typedefs of primitives
    pub scalar: Option<ScalarKind>,
}

impl TypeDescriptor
{
    /// Start a descriptor with no fields.
    pub fn new(name: impl Into<String>, size: u64) -> Self
    {
        Self {
            name: name.into(),
            size,
            fields: Vec::new(),
            array: None,
            dispatch: None,
            patch: None,
            scalar: None,
        }
    }

    /// Add a field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, offset: u64, size: u64, type_name: impl Into<String>) -> Self
    {
        self.fields.push(FieldLayout {
            name: name.into(),
            offset,
            size,
            type_name: type_name.into(),
        });
        self
    }

    /// Attach array metadata.
    #[must_use]
    pub fn with_array(mut self, array: ArrayLayout) -> Self
    {
        self.array = Some(array);
        self
    }

    /// Attach a dispatch table.
    #[must_use]
    pub fn with_dispatch(mut self, dispatch: DispatchTable) -> Self
    {
        self.dispatch = Some(dispatch);
        self
    }

    /// Mark the type as patch-versioned through `latest_field`.
    #[must_use]
    pub fn with_patch(mut self, latest_field: impl Into<String>) -> Self
    {
        self.patch = Some(PatchLayout {
            latest_field: latest_field.into(),
        });
        self
    }

    /// Decode values of this type as `kind`.
    #[must_use]
    pub fn with_scalar(mut self, kind: ScalarKind) -> Self
    {
        self.scalar = Some(kind);
        self
    }

    /// Look up a field by exact name.
    pub fn field(&self, name: &str) -> Option<&FieldLayout>
    {
        self.fields.iter().find(|f| f.name == name)
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> &[FieldLayout]
    {
        &self.fields
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_resolve_discriminant_hit_and_miss()
    {
        let table = DispatchTable::vtable().with_entry(0x1000, "Derived");
        assert_eq!(resolve_discriminant(&table, 0x1000), Some("Derived"));
        assert_eq!(resolve_discriminant(&table, 0x2000), None);
    }

    #[test]
    fn test_field_lookup()
    {
        let desc = TypeDescriptor::new("Node", 16)
            .with_field("next", 0, 8, "Node*")
            .with_field("value", 8, 4, "int");
        assert_eq!(desc.field("value").map(|f| f.offset), Some(8));
        assert!(desc.field("missing").is_none());
        assert_eq!(desc.fields().len(), 2);
    }
}
