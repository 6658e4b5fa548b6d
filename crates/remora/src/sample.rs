//! Bundled sample debuggee: a small layout box tree in the shape the edgehtml
//! engine keeps in memory.
//!
//! ```text
//! FlowBox <html>            0x00100000
//! ├── FlowBox <body>        0x00100100   (layout invalid)
//! │   └── LineBox "Hello"   0x00100200
//! └── LineBox "world"       0x00100300
//! ContainerBox <div>        0x00100400   (display invalid, second root)
//! ```
//!
//! The html box's first flow item has been patched; the stale copy points at
//! nothing, the patch points at the body box.

use std::future::IntoFuture;
use std::sync::Arc;

use remora_core::backends::{SnapshotBackend, SnapshotBuilder};
use remora_core::bridge::BackendBridge;
use remora_core::config::{BridgeConfig, NavigatorConfig};
use remora_core::error::RemoraResult;
use remora_core::events::DebuggerStatus;
use remora_core::metadata::{DispatchTable, StaticMetadata, TypeDescriptor};
use remora_core::navigation::{FieldPath, Navigator, NextLink, Pending, RemoteObject, TypeVariants, Variant};
use remora_core::registry::{ComputedField, FieldOutput, PresentationHint, Registry, TypeKey};
use remora_core::types::Address;

pub const MODULE: &str = "edgehtml";

const MODULE_BASE: u64 = 0x1800_0000;
const CONTAINER_BOX_VTABLE: u64 = 0x1801_0000;
const FLOW_BOX_VTABLE: u64 = 0x1801_0100;
const LINE_BOX_VTABLE: u64 = 0x1801_0200;

const LAYOUT_BOX: &str = "Layout::LayoutBox";
const CONTAINER_BOX: &str = "Layout::ContainerBox";
const FLOW_BOX: &str = "Layout::FlowBox";
const LINE_BOX: &str = "Layout::LineBox";

const TAG_NAMES: [(u64, &str); 3] = [(1, "html"), (2, "body"), (3, "div")];

/// Everything the CLI needs to explore the sample.
pub struct Sample
{
    pub bridge: Arc<BackendBridge<SnapshotBackend>>,
    pub nav: Navigator,
    pub registry: Registry,
}

/// Build the sample snapshot, its metadata and its registry.
pub fn load(bridge_config: BridgeConfig, nav_config: NavigatorConfig) -> Sample
{
    let bridge = Arc::new(BackendBridge::new(memory().build(), bridge_config));
    bridge.notify_state(DebuggerStatus::Break);
    let nav = Navigator::new(bridge.clone(), Arc::new(metadata()), nav_config);
    Sample {
        bridge,
        nav,
        registry: registry(),
    }
}

fn utf16(text: &str) -> Vec<u8>
{
    text.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

#[allow(clippy::too_many_arguments)]
fn container(
    builder: SnapshotBuilder,
    at: u64,
    vtable: u64,
    element: u64,
    size: (u32, u32),
    invalid: (bool, bool),
    next: u64,
    flow: Option<u64>,
) -> SnapshotBuilder
{
    let builder = builder
        .u64(at, vtable)
        .u64(at + 0x08, element)
        .u32(at + 0x10, size.0)
        .u32(at + 0x14, size.1)
        .u8(at + 0x18, u8::from(invalid.0))
        .u8(at + 0x19, u8::from(invalid.1))
        .u64(at + 0x20, next);
    match flow {
        Some(flow) => builder.u64(at + 0x28, flow),
        None => builder,
    }
}

fn flow_item(
    builder: SnapshotBuilder,
    at: u64,
    latest: u64,
    next: u64,
    target: u64,
) -> SnapshotBuilder
{
    builder.u64(at, latest).u64(at + 0x08, next).u64(at + 0x10, target)
}

fn memory() -> SnapshotBuilder
{
    let builder = SnapshotBackend::builder()
        .module("edgehtml.dll", MODULE_BASE, 0x100_0000)
        .module("ntdll.dll", 0x7700_0000, 0x20_0000)
        .frame(0x7fe_e010, 0x7fe_e100, Some("0x18004a10"))
        .frame(0x7fe_e100, 0x7fe_e1c0, Some("0x18002f3c"))
        .frame(0x7fe_e1c0, 0x7fe_e300, Some("0x77012345"));

    let builder = container(builder, 0x10_0000, FLOW_BOX_VTABLE, 0x12_0000, (800, 600), (false, false), 0x10_0400, Some(0x11_0000));
    let builder = container(builder, 0x10_0100, FLOW_BOX_VTABLE, 0x12_0010, (784, 40), (true, false), 0, Some(0x11_0300));
    let builder = container(builder, 0x10_0400, CONTAINER_BOX_VTABLE, 0x12_0020, (120, 20), (false, true), 0, None);

    // Stale flow item, then its patch
    let builder = flow_item(builder, 0x11_0000, 0x11_0100, 0, 0);
    let builder = flow_item(builder, 0x11_0100, 0, 0x11_0200, 0x10_0100);
    let builder = flow_item(builder, 0x11_0200, 0, 0, 0x10_0300);
    let builder = flow_item(builder, 0x11_0300, 0, 0, 0x10_0200);

    builder
        // Line boxes
        .u64(0x10_0200, LINE_BOX_VTABLE)
        .u32(0x10_0208, 0)
        .u32(0x10_020c, 5)
        .u64(0x10_0210, 0x13_0000)
        .u64(0x10_0300, LINE_BOX_VTABLE)
        .u32(0x10_0308, 0)
        .u32(0x10_030c, 5)
        .u64(0x10_0310, 0x13_0100)
        .bytes(0x13_0000, &utf16("Hello"))
        .bytes(0x13_0100, &utf16("world"))
        // Elements
        .u32(0x12_0000, 1)
        .u32(0x12_0010, 2)
        .u32(0x12_0020, 3)
}

fn box_dispatch() -> DispatchTable
{
    DispatchTable::vtable()
        .with_entry(CONTAINER_BOX_VTABLE, CONTAINER_BOX)
        .with_entry(FLOW_BOX_VTABLE, FLOW_BOX)
        .with_entry(LINE_BOX_VTABLE, LINE_BOX)
}

fn container_fields(descriptor: TypeDescriptor) -> TypeDescriptor
{
    descriptor
        .with_field("vtable", 0x00, 8, "void*")
        .with_field("elementInternal", 0x08, 8, "Tree::ElementNode*")
        .with_field("contentBoxWidth", 0x10, 4, "int")
        .with_field("contentBoxHeight", 0x14, 4, "int")
        .with_field("isLayoutInvalid", 0x18, 1, "bool")
        .with_field("isDisplayInvalid", 0x19, 1, "bool")
        .with_field("nextLayoutBox", 0x20, 8, "Layout::ContainerBox*")
}

/// Type layouts for the sample module.
pub fn metadata() -> StaticMetadata
{
    StaticMetadata::new()
        .with_type(
            MODULE,
            TypeDescriptor::new(LAYOUT_BOX, 0x08)
                .with_field("vtable", 0x00, 8, "void*")
                .with_dispatch(box_dispatch()),
        )
        .with_type(
            MODULE,
            container_fields(TypeDescriptor::new(CONTAINER_BOX, 0x28)).with_dispatch(box_dispatch()),
        )
        .with_type(
            MODULE,
            container_fields(TypeDescriptor::new(FLOW_BOX, 0x30)).with_field("flow", 0x28, 8, "Layout::FlowItem*"),
        )
        .with_type(
            MODULE,
            TypeDescriptor::new(LINE_BOX, 0x18)
                .with_field("vtable", 0x00, 8, "void*")
                .with_field("lineBoxFlags", 0x08, 4, "uint32_t")
                .with_field("textLength", 0x0c, 4, "uint32_t")
                .with_field("text", 0x10, 8, "wchar_t*"),
        )
        .with_type(
            MODULE,
            TypeDescriptor::new("Layout::FlowItem", 0x18)
                .with_field("latest", 0x00, 8, "Layout::FlowItem*")
                .with_field("data", 0x08, 0x10, "Layout::FlowItemData")
                .with_patch("latest"),
        )
        .with_type(
            MODULE,
            TypeDescriptor::new("Layout::FlowItemData", 0x10)
                .with_field("next", 0x00, 8, "Layout::FlowItem*")
                .with_field("boxReference", 0x08, 8, "SmartPtr<Layout::LayoutBox>"),
        )
        .with_type(
            MODULE,
            TypeDescriptor::new("SmartPtr<Layout::LayoutBox>", 0x08).with_field("m_pT", 0x00, 8, "Layout::LayoutBox*"),
        )
        .with_type(
            MODULE,
            TypeDescriptor::new("Tree::ElementNode", 0x04).with_field("_etag", 0x00, 4, "uint32_t"),
        )
}

/// Boxes reachable through a flow: patched items linked by `data.next`.
pub fn flow_children(nav: &Navigator, flow: RemoteObject) -> Pending<'static, Vec<RemoteObject>>
{
    let next = NextLink::func(|nav, item| nav.at(item).f("data.next").latest_patch().into_future());
    nav.at(flow)
        .latest_patch()
        .list(next)
        .f("data.boxReference.m_pT")
        .vcast()
        .non_null()
        .into_future()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoxKind
{
    Flow,
    Line,
    Container,
}

/// Children of a (downcast) box, by runtime type.
pub fn children(nav: &Navigator, layout_box: RemoteObject) -> Pending<'static, Vec<RemoteObject>>
{
    let kinds = TypeVariants::new()
        .exact(FLOW_BOX, BoxKind::Flow)
        .exact(LINE_BOX, BoxKind::Line)
        .containing("Box", BoxKind::Container);
    match kinds.classify(layout_box.type_name()) {
        Variant::Known(BoxKind::Flow) => {
            let nav = nav.clone();
            nav.field(layout_box, "flow")
                .and_then(move |flow| flow_children(&nav, flow))
        }
        Variant::Known(BoxKind::Line | BoxKind::Container) | Variant::Unrecognized(_) => Pending::ready(Vec::new()),
    }
}

fn tag_name(tag: u64) -> String
{
    TAG_NAMES
        .iter()
        .find(|(id, _)| *id == tag)
        .map_or_else(|| format!("tag#{tag}"), |(_, name)| (*name).to_string())
}

async fn validity(nav: Navigator, layout_box: RemoteObject) -> RemoraResult<FieldOutput>
{
    let (layout, display) = futures::try_join!(
        nav.at(layout_box.clone()).f("isLayoutInvalid").value(),
        nav.at(layout_box).f("isDisplayInvalid").value()
    )?;
    let color = if layout.is_truthy() {
        "#fbc"
    } else if display.is_truthy() {
        "#ffc"
    } else {
        "#bfc"
    };
    Ok(FieldOutput::hint(PresentationHint::Background(color.to_string())))
}

async fn line_text(nav: Navigator, line: RemoteObject) -> RemoraResult<FieldOutput>
{
    let len = nav.at(line.clone()).f("textLength").value().await?.as_u64().unwrap_or(0);
    let units: Vec<u16> = nav
        .at(line)
        .f("text")
        .deref()
        .array_n(len)
        .value()
        .await?
        .into_iter()
        .filter_map(|unit| unit.as_u64().and_then(|unit| u16::try_from(unit).ok()))
        .collect();
    Ok(FieldOutput::text(String::from_utf16_lossy(&units)).with_hint(PresentationHint::Emphasis))
}

fn container_computed_fields() -> Vec<ComputedField>
{
    let element = FieldPath::from(["elementInternal", "element.m_pT"]);
    let tag_path = element.clone();
    vec![
        ComputedField::new("Element", "e", move |nav, layout_box| {
            nav.at(layout_box).f(&element).deref().into_future().map(FieldOutput::object)
        }),
        ComputedField::new("Tag", "tag", move |nav, layout_box| {
            nav.at(layout_box)
                .f(&tag_path)
                .f("_etag")
                .value()
                .map(|tag| FieldOutput::text(tag.as_u64().map_or_else(|| "?".to_string(), tag_name)))
        }),
        ComputedField::new("ContentBoxWidth", "w", |nav, layout_box| {
            nav.at(layout_box)
                .f(["borderBoxModel.ContentBox.Width", "contentBoxWidth"])
                .value()
                .map(FieldOutput::scalar)
        }),
        ComputedField::new("ContentBoxHeight", "h", |nav, layout_box| {
            nav.at(layout_box)
                .f(["borderBoxModel.ContentBox.Height", "contentBoxHeight"])
                .value()
                .map(FieldOutput::scalar)
        }),
        ComputedField::new("Validity", "validity", |nav, layout_box| {
            Pending::new(validity(nav.clone(), layout_box))
        }),
    ]
}

/// Roots, address interpreter, computed fields and descriptions for the
/// sample's box types.
pub fn registry() -> Registry
{
    let mut registry = Registry::new();

    registry.add_root("Box Tree", |nav| {
        let first = RemoteObject::new(MODULE, CONTAINER_BOX, Address::new(0x10_0000));
        nav.at(first).list("nextLayoutBox").vcast().into_future()
    });
    registry.add_address_interpreter(|nav, address| nav.downcast(RemoteObject::new(MODULE, LAYOUT_BOX, address)));

    for type_name in [CONTAINER_BOX, FLOW_BOX] {
        for field in container_computed_fields() {
            registry.add_field(TypeKey::new(MODULE, type_name), field);
        }
    }
    registry.add_field(
        TypeKey::new(MODULE, LINE_BOX),
        ComputedField::new("Text", "text", |nav, line| Pending::new(line_text(nav.clone(), line))),
    );

    for type_name in [LAYOUT_BOX, CONTAINER_BOX, FLOW_BOX, LINE_BOX] {
        registry.add_description(TypeKey::new(MODULE, type_name), |_, layout_box| {
            let short = layout_box.type_name().trim_start_matches("Layout::").to_string();
            Pending::ready(format!("{short} {}", layout_box.address()))
        });
    }
    registry.add_description(TypeKey::new(MODULE, "Tree::ElementNode"), |nav, element| {
        nav.at(element)
            .f("_etag")
            .value()
            .map(|tag| format!("<{}>", tag.as_u64().map_or_else(|| "?".to_string(), tag_name)))
    });

    registry
}

#[cfg(test)]
mod tests
{
    use super::*;
    use remora_core::registry::{first_roots, FieldDisplay};

    fn sample() -> Sample
    {
        load(BridgeConfig::default(), NavigatorConfig::default())
    }

    #[tokio::test]
    async fn test_roots_are_downcast()
    {
        let sample = sample();
        let (name, roots) = first_roots(&sample.registry, &sample.nav).await.unwrap();
        assert_eq!(name, "Box Tree");
        let types: Vec<&str> = roots.iter().map(RemoteObject::type_name).collect();
        assert_eq!(types, vec![FLOW_BOX, CONTAINER_BOX]);
    }

    #[tokio::test]
    async fn test_flow_children_follow_patches()
    {
        let sample = sample();
        let html = RemoteObject::new(MODULE, FLOW_BOX, Address::new(0x10_0000));
        let kids = children(&sample.nav, html).await.unwrap();
        assert_eq!(
            kids,
            vec![
                RemoteObject::new(MODULE, FLOW_BOX, Address::new(0x10_0100)),
                RemoteObject::new(MODULE, LINE_BOX, Address::new(0x10_0300)),
            ]
        );
    }

    #[tokio::test]
    async fn test_computed_fields()
    {
        let sample = sample();
        let body = RemoteObject::new(MODULE, FLOW_BOX, Address::new(0x10_0100));
        let fields = sample.registry.compute_fields(&sample.nav, &body).await.unwrap();

        let tag = fields.iter().find(|(name, _)| name == "tag").unwrap();
        assert_eq!(tag.1.display, Some(FieldDisplay::Text("body".to_string())));
        let validity = fields.iter().find(|(name, _)| name == "validity").unwrap();
        assert_eq!(validity.1.hint, Some(PresentationHint::Background("#fbc".to_string())));

        let line = RemoteObject::new(MODULE, LINE_BOX, Address::new(0x10_0200));
        let text = sample.registry.compute_fields(&sample.nav, &line).await.unwrap();
        assert_eq!(text[0].1.display, Some(FieldDisplay::Text("Hello".to_string())));
    }

    #[tokio::test]
    async fn test_address_interpreter_downcasts()
    {
        let sample = sample();
        let line = sample
            .registry
            .interpret_address(&sample.nav, Address::new(0x10_0300))
            .await
            .unwrap();
        assert_eq!(line.type_name(), LINE_BOX);
        let description = sample.registry.describe(&sample.nav, line).await.unwrap();
        assert_eq!(description, "LineBox 0x00100300");
    }
}
