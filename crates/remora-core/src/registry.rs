//! # Registries
//!
//! Extension points for outer tooling (tree views, the CLI):
//!
//! - **Roots**: named enumerators producing starting handles
//! - **Address interpreters**: bare address to best-guess typed handle
//! - **Computed fields**: per-type named values derived from a handle
//! - **Descriptions**: per-type one-line summaries
//!
//! Registration takes `&mut self` and is expected to happen once, at setup.
//! Lookups hand out pending operations that own clones of the registered
//! functions, so the registry can be dropped while they run.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{RemoraError, RemoraResult};
use crate::navigation::{Navigator, Pending, RemoteObject};
use crate::types::{Address, ScalarValue};

/// Produces the handles of one root set.
pub type RootFn = Arc<dyn Fn(&Navigator) -> Pending<'static, Vec<RemoteObject>> + Send + Sync>;

/// Turns a bare address into a typed handle.
pub type InterpreterFn = Arc<dyn Fn(&Navigator, Address) -> Pending<'static, RemoteObject> + Send + Sync>;

/// Computes one field's output for a handle.
pub type ComputeFn = Arc<dyn Fn(&Navigator, RemoteObject) -> Pending<'static, FieldOutput> + Send + Sync>;

/// Summarizes a handle in one line.
pub type DescribeFn = Arc<dyn Fn(&Navigator, RemoteObject) -> Pending<'static, String> + Send + Sync>;

/// (module, type) pair registrations are keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeKey
{
    /// Module name (no suffix)
    pub module: String,
    /// Type name
    pub type_name: String,
}

impl TypeKey
{
    /// Key for `type_name` in `module`.
    pub fn new(module: impl Into<String>, type_name: impl Into<String>) -> Self
    {
        Self {
            module: module.into(),
            type_name: type_name.into(),
        }
    }

    /// Key of a handle's declared type.
    pub fn of(handle: &RemoteObject) -> Self
    {
        Self::new(handle.module(), handle.type_name())
    }
}

impl fmt::Display for TypeKey
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}!{}", self.module, self.type_name)
    }
}

/// Outcome of a root enumerator that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootSet
{
    /// The enumerator ran and found nothing.
    Empty,
    /// Starting handles, in enumeration order.
    Found(Vec<RemoteObject>),
}

impl RootSet
{
    fn from_handles(handles: Vec<RemoteObject>) -> Self
    {
        if handles.is_empty() {
            Self::Empty
        } else {
            Self::Found(handles)
        }
    }

    /// Handles, empty for [`RootSet::Empty`].
    pub fn into_handles(self) -> Vec<RemoteObject>
    {
        match self {
            Self::Empty => Vec::new(),
            Self::Found(handles) => handles,
        }
    }
}

/// How a computed field should be presented, beyond its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentationHint
{
    /// Background color (CSS color string)
    Background(String),
    /// Render the value emphasized
    Emphasis,
}

/// Displayable part of a computed field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDisplay
{
    /// Preformatted text
    Text(String),
    /// A decoded scalar
    Scalar(ScalarValue),
    /// Another handle (rendered by its description)
    Object(RemoteObject),
}

impl fmt::Display for FieldDisplay
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Scalar(value) => write!(f, "{value}"),
            Self::Object(handle) if handle.is_null() => f.write_str("null"),
            Self::Object(handle) => write!(f, "{}", handle.address()),
        }
    }
}

/// Output of a computed field: a value, a presentation hint, or both.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldOutput
{
    /// The value to show, if any
    pub display: Option<FieldDisplay>,
    /// Presentation hint, if any
    pub hint: Option<PresentationHint>,
}

impl FieldOutput
{
    /// Text output.
    pub fn text(text: impl Into<String>) -> Self
    {
        Self {
            display: Some(FieldDisplay::Text(text.into())),
            hint: None,
        }
    }

    /// Scalar output.
    pub fn scalar(value: ScalarValue) -> Self
    {
        Self {
            display: Some(FieldDisplay::Scalar(value)),
            hint: None,
        }
    }

    /// Handle output.
    pub fn object(handle: RemoteObject) -> Self
    {
        Self {
            display: Some(FieldDisplay::Object(handle)),
            hint: None,
        }
    }

    /// Hint only.
    pub fn hint(hint: PresentationHint) -> Self
    {
        Self {
            display: None,
            hint: Some(hint),
        }
    }

    /// Attach a presentation hint.
    #[must_use]
    pub fn with_hint(mut self, hint: PresentationHint) -> Self
    {
        self.hint = Some(hint);
        self
    }
}

/// A named value computed from a handle of one type.
#[derive(Clone)]
pub struct ComputedField
{
    /// Display name (`ContentBoxWidth`)
    pub full_name: String,
    /// Column/short name (`w`)
    pub short_name: String,
    compute: ComputeFn,
}

impl ComputedField
{
    /// Field computed by `compute`.
    pub fn new<F>(full_name: impl Into<String>, short_name: impl Into<String>, compute: F) -> Self
    where
        F: Fn(&Navigator, RemoteObject) -> Pending<'static, FieldOutput> + Send + Sync + 'static,
    {
        Self {
            full_name: full_name.into(),
            short_name: short_name.into(),
            compute: Arc::new(compute),
        }
    }

    /// Compute the field for `handle`.
    pub fn compute(&self, nav: &Navigator, handle: RemoteObject) -> Pending<'static, FieldOutput>
    {
        (self.compute)(nav, handle)
    }
}

impl fmt::Debug for ComputedField
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("ComputedField")
            .field("full_name", &self.full_name)
            .field("short_name", &self.short_name)
            .finish_non_exhaustive()
    }
}

/// Registered roots, interpreters, computed fields and descriptions.
#[derive(Default, Clone)]
pub struct Registry
{
    roots: Vec<(String, RootFn)>,
    interpreters: Vec<InterpreterFn>,
    fields: HashMap<TypeKey, Vec<ComputedField>>,
    descriptions: HashMap<TypeKey, DescribeFn>,
}

impl fmt::Debug for Registry
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Registry")
            .field("roots", &self.root_names())
            .field("interpreters", &self.interpreters.len())
            .field("fields", &self.fields)
            .field("descriptions", &self.descriptions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry
{
    /// Empty registry.
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Register a named root enumerator. A later registration with the same
    /// name replaces the earlier one.
    pub fn add_root<F>(&mut self, name: impl Into<String>, enumerate: F)
    where
        F: Fn(&Navigator) -> Pending<'static, Vec<RemoteObject>> + Send + Sync + 'static,
    {
        let name = name.into();
        self.roots.retain(|(existing, _)| *existing != name);
        self.roots.push((name, Arc::new(enumerate)));
    }

    /// Names of the registered roots, in registration order.
    pub fn root_names(&self) -> Vec<String>
    {
        self.roots.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Run the root enumerator called `name`.
    ///
    /// ## Errors
    ///
    /// - `RootsUnavailable`: no root of that name
    /// - anything the enumerator fails with (distinct from [`RootSet::Empty`])
    pub fn roots(&self, nav: &Navigator, name: &str) -> Pending<'static, RootSet>
    {
        match self.roots.iter().find(|(existing, _)| existing == name) {
            Some((_, enumerate)) => enumerate(nav).map(RootSet::from_handles),
            None => Pending::failed(RemoraError::RootsUnavailable(format!("no root named {name}"))),
        }
    }

    /// Register an address interpreter. The most recent one is used.
    pub fn add_address_interpreter<F>(&mut self, interpret: F)
    where
        F: Fn(&Navigator, Address) -> Pending<'static, RemoteObject> + Send + Sync + 'static,
    {
        self.interpreters.push(Arc::new(interpret));
    }

    /// Best-guess typed handle for a bare address.
    ///
    /// ## Errors
    ///
    /// - `UnsupportedOperation`: no interpreter is registered
    pub fn interpret_address(&self, nav: &Navigator, address: Address) -> Pending<'static, RemoteObject>
    {
        match self.interpreters.last() {
            Some(interpret) => interpret(nav, address),
            None => Pending::failed(RemoraError::UnsupportedOperation(
                "no address interpreter is registered".to_string(),
            )),
        }
    }

    /// Register a computed field for `(module, type)`. All registrations are
    /// kept, in order.
    pub fn add_field(&mut self, key: TypeKey, field: ComputedField)
    {
        debug!("registering field {} for {key}", field.full_name);
        self.fields.entry(key).or_default().push(field);
    }

    /// Computed fields registered for the key, in registration order.
    pub fn fields_for(&self, key: &TypeKey) -> &[ComputedField]
    {
        self.fields.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Compute every field registered for the handle's type.
    ///
    /// A field that fails is reported as its error text rather than failing
    /// the others.
    pub fn compute_fields(&self, nav: &Navigator, handle: &RemoteObject) -> Pending<'static, Vec<(String, FieldOutput)>>
    {
        let pending = self
            .fields_for(&TypeKey::of(handle))
            .iter()
            .map(|field| {
                let name = field.short_name.clone();
                field
                    .compute(nav, handle.clone())
                    .or_else(|err| async move { Ok::<_, RemoraError>(FieldOutput::text(format!("error: {err}"))) })
                    .map(move |output| (name, output))
            })
            .collect::<Vec<_>>();
        Pending::join_all(pending)
    }

    /// Register a one-line description for `(module, type)`, replacing any
    /// previous one.
    pub fn add_description<F>(&mut self, key: TypeKey, describe: F)
    where
        F: Fn(&Navigator, RemoteObject) -> Pending<'static, String> + Send + Sync + 'static,
    {
        self.descriptions.insert(key, Arc::new(describe));
    }

    /// One-line description of the handle.
    ///
    /// Falls back to the address when no description is registered for the
    /// handle's type, and to `null` for NULL handles.
    pub fn describe(&self, nav: &Navigator, handle: RemoteObject) -> Pending<'static, String>
    {
        if handle.is_null() {
            return Pending::ready("null".to_string());
        }
        match self.descriptions.get(&TypeKey::of(&handle)) {
            Some(describe) => describe(nav, handle),
            None => Pending::ready(handle.address().to_string()),
        }
    }
}

/// Run every root enumerator and keep the non-empty ones.
///
/// ## Errors
///
/// - `RootsUnavailable`: every enumerator failed or came back empty
pub async fn first_roots(registry: &Registry, nav: &Navigator) -> RemoraResult<(String, Vec<RemoteObject>)>
{
    let mut last_error = None;
    for name in registry.root_names() {
        match registry.roots(nav, &name).await {
            Ok(RootSet::Found(handles)) => return Ok((name, handles)),
            Ok(RootSet::Empty) => debug!("root {name} is empty"),
            Err(err) => {
                debug!("root {name} failed: {err}");
                last_error = Some(err);
            }
        }
    }
    Err(RemoraError::RootsUnavailable(
        last_error.map_or_else(|| "every root enumerator came back empty".to_string(), |err| err.to_string()),
    ))
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::backends::SnapshotBackend;
    use crate::bridge::BackendBridge;
    use crate::config::{BridgeConfig, NavigatorConfig};
    use crate::events::DebuggerStatus;
    use crate::metadata::StaticMetadata;

    fn navigator() -> Navigator
    {
        let bridge = BackendBridge::new(SnapshotBackend::builder().build(), BridgeConfig::default());
        bridge.notify_state(DebuggerStatus::Break);
        Navigator::new(
            Arc::new(bridge),
            Arc::new(StaticMetadata::new()),
            NavigatorConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_empty_root_is_not_a_failure()
    {
        let nav = navigator();
        let mut registry = Registry::new();
        registry.add_root("empty", |_| Pending::ready(Vec::new()));
        registry.add_root("broken", |_| {
            Pending::failed(RemoraError::RootsUnavailable("no page loaded".to_string()))
        });

        assert_eq!(registry.roots(&nav, "empty").await.unwrap(), RootSet::Empty);
        assert!(registry.roots(&nav, "broken").await.is_err());
        assert!(matches!(
            registry.roots(&nav, "missing").await,
            Err(RemoraError::RootsUnavailable(_))
        ));
        assert!(matches!(
            first_roots(&registry, &nav).await,
            Err(RemoraError::RootsUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_latest_interpreter_wins()
    {
        let nav = navigator();
        let mut registry = Registry::new();
        assert!(registry.interpret_address(&nav, Address::new(0x10)).await.is_err());

        registry.add_address_interpreter(|_, address| Pending::ready(RemoteObject::new("m", "Old", address)));
        registry.add_address_interpreter(|_, address| Pending::ready(RemoteObject::new("m", "New", address)));

        let handle = registry.interpret_address(&nav, Address::new(0x10)).await.unwrap();
        assert_eq!(handle.type_name(), "New");
        assert_eq!(handle.address(), Address::new(0x10));
    }

    #[tokio::test]
    async fn test_fields_keep_every_registration()
    {
        let nav = navigator();
        let mut registry = Registry::new();
        let key = TypeKey::new("m", "Box");
        registry.add_field(
            key.clone(),
            ComputedField::new("Width", "w", |_, _| Pending::ready(FieldOutput::text("10"))),
        );
        registry.add_field(
            key.clone(),
            ComputedField::new("Broken", "b", |_, _| {
                Pending::failed(RemoraError::NotAScalar("Box".to_string()))
            }),
        );

        assert_eq!(registry.fields_for(&key).len(), 2);
        let handle = RemoteObject::new("m", "Box", Address::new(0x100));
        let outputs = registry.compute_fields(&nav, &handle).await.unwrap();
        assert_eq!(outputs[0], ("w".to_string(), FieldOutput::text("10")));
        assert_eq!(outputs[1].0, "b");
        assert!(matches!(&outputs[1].1.display, Some(FieldDisplay::Text(t)) if t.starts_with("error:")));
    }

    #[tokio::test]
    async fn test_describe_falls_back_to_address()
    {
        let nav = navigator();
        let mut registry = Registry::new();
        registry.add_description(TypeKey::new("m", "Box"), |_, handle| {
            Pending::ready(format!("box at {}", handle.address()))
        });

        let described = registry
            .describe(&nav, RemoteObject::new("m", "Box", Address::new(0x20)))
            .await
            .unwrap();
        assert_eq!(described, "box at 0x00000020");

        let fallback = registry
            .describe(&nav, RemoteObject::new("m", "Other", Address::new(0x20)))
            .await
            .unwrap();
        assert_eq!(fallback, "0x00000020");
        assert_eq!(registry.describe(&nav, RemoteObject::null()).await.unwrap(), "null");
    }
}
