//! Shared snapshot fixture for the integration tests.
//!
//! Memory map (all 64-bit, little-endian):
//!
//! | address  | contents                                         |
//! |----------|--------------------------------------------------|
//! | 0x1000   | Node A (value 1) -> 0x1100                       |
//! | 0x1100   | Node B (value 2) -> 0x1200                       |
//! | 0x1200   | Node C (value 3) -> NULL                         |
//! | 0x3000   | Shape, vtable in the dispatch table (Circle)     |
//! | 0x3100   | Shape, vtable known to the provider (Square)     |
//! | 0x3200   | Shape, unknown vtable                            |
//! | 0x4000   | Item patched by 0x4100                           |
//! | 0x4200   | Item without patches                             |
//! | 0x5000   | Vec { data: 0x5100, len: 3 } of Elem             |
//! | 0x5200   | Triple: inline uint32_t[3] = 7, 8, 9             |
//! | 0x5300   | Token with tag 2 (Number)                        |
//! | 0x5400   | Widget { newName: 42 }                           |
//! | 0x5500   | Outer { inner: 0x5600 }, Inner.value = 99        |
//! | 0x5700   | int -5                                           |
//! | 0x6000   | cyclic Node X <-> Y                              |

#![allow(dead_code)]

use std::sync::Arc;

use remora_core::backends::{ResourceStats, SnapshotBackend, SnapshotBuilder};
use remora_core::bridge::BackendBridge;
use remora_core::config::{BridgeConfig, NavigatorConfig};
use remora_core::events::DebuggerStatus;
use remora_core::metadata::{ArrayLayout, ArrayLength, ArrayStorage, DispatchTable, StaticMetadata, TypeDescriptor};
use remora_core::navigation::{Navigator, RemoteObject};
use remora_core::types::Address;

pub const MODULE: &str = "app";

pub const CIRCLE_VTABLE: u64 = 0x7000_1000;
pub const SQUARE_VTABLE: u64 = 0x7000_2000;
pub const UNKNOWN_VTABLE: u64 = 0x7000_9999;

pub struct Fixture
{
    pub nav: Navigator,
    pub bridge: Arc<BackendBridge<SnapshotBackend>>,
    pub stats: Arc<ResourceStats>,
}

pub fn handle(type_name: &str, address: u64) -> RemoteObject
{
    RemoteObject::new(MODULE, type_name, Address::new(address))
}

pub fn memory() -> SnapshotBuilder
{
    SnapshotBackend::builder()
        .module("app.exe", 0x40_0000, 0x10_0000)
        // Node list
        .u64(0x1000, 0x1100)
        .u32(0x1008, 1)
        .u64(0x1100, 0x1200)
        .u32(0x1108, 2)
        .u64(0x1200, 0)
        .u32(0x1208, 3)
        // Shapes
        .u64(0x3000, CIRCLE_VTABLE)
        .u32(0x3008, 5)
        .u64(0x3100, SQUARE_VTABLE)
        .u64(0x3200, UNKNOWN_VTABLE)
        // Patched items
        .u64(0x4000, 0x4100)
        .u32(0x4008, 1)
        .u64(0x4100, 0)
        .u32(0x4108, 2)
        .u64(0x4200, 0)
        .u32(0x4208, 7)
        // Vec of Elem
        .u64(0x5000, 0x5100)
        .u64(0x5008, 3)
        .u64(0x5100, 10)
        .u64(0x5108, 20)
        .u64(0x5110, 30)
        // Triple
        .u32(0x5200, 7)
        .u32(0x5204, 8)
        .u32(0x5208, 9)
        // Token
        .u32(0x5300, 2)
        // Widget
        .u32(0x5400, 42)
        // Outer / Inner
        .u64(0x5500, 0x5600)
        .u32(0x5604, 99)
        // int
        .bytes(0x5700, &(-5i32).to_le_bytes())
        // Cycle
        .u64(0x6000, 0x6100)
        .u64(0x6100, 0x6000)
}

pub fn metadata() -> StaticMetadata
{
    StaticMetadata::new()
        .with_type(
            MODULE,
            TypeDescriptor::new("Node", 16)
                .with_field("next", 0, 8, "Node*")
                .with_field("value", 8, 4, "uint32_t"),
        )
        .with_type(
            MODULE,
            TypeDescriptor::new("Shape", 16)
                .with_field("vtable", 0, 8, "void*")
                .with_dispatch(DispatchTable::vtable().with_entry(CIRCLE_VTABLE, "Circle")),
        )
        .with_type(MODULE, TypeDescriptor::new("Circle", 16).with_field("radius", 8, 4, "uint32_t"))
        .with_type(MODULE, TypeDescriptor::new("Square", 16).with_field("side", 8, 4, "uint32_t"))
        .with_vtable(MODULE, SQUARE_VTABLE, "Square")
        .with_type(
            MODULE,
            TypeDescriptor::new("Item", 16)
                .with_field("latest", 0, 8, "Item*")
                .with_field("payload", 8, 4, "uint32_t")
                .with_patch("latest"),
        )
        .with_type(
            MODULE,
            TypeDescriptor::new("Vec", 16)
                .with_field("data", 0, 8, "Elem*")
                .with_field("len", 8, 8, "uint64_t")
                .with_array(ArrayLayout {
                    element_type: "Elem".to_string(),
                    element_size: 8,
                    storage: ArrayStorage::Pointer {
                        field: "data".to_string(),
                    },
                    length: ArrayLength::Field("len".to_string()),
                }),
        )
        .with_type(MODULE, TypeDescriptor::new("Elem", 8).with_field("value", 0, 8, "uint64_t"))
        .with_type(
            MODULE,
            TypeDescriptor::new("Triple", 12).with_array(ArrayLayout {
                element_type: "uint32_t".to_string(),
                element_size: 4,
                storage: ArrayStorage::Inline,
                length: ArrayLength::Fixed(3),
            }),
        )
        .with_type(
            MODULE,
            TypeDescriptor::new("Token", 4)
                .with_field("kind", 0, 4, "uint32_t")
                .with_dispatch(
                    DispatchTable::tag_field("kind")
                        .with_entry(1, "Ident")
                        .with_entry(2, "Number"),
                ),
        )
        .with_type(MODULE, TypeDescriptor::new("Widget", 4).with_field("newName", 0, 4, "uint32_t"))
        .with_type(MODULE, TypeDescriptor::new("Outer", 8).with_field("inner", 0, 8, "Inner*"))
        .with_type(MODULE, TypeDescriptor::new("Inner", 8).with_field("value", 4, 4, "uint32_t"))
}

pub fn fixture() -> Fixture
{
    fixture_with(NavigatorConfig::default())
}

pub fn fixture_with(config: NavigatorConfig) -> Fixture
{
    build(memory().build(), metadata(), config)
}

pub fn build(backend: SnapshotBackend, metadata: StaticMetadata, config: NavigatorConfig) -> Fixture
{
    let stats = backend.stats();
    let bridge = Arc::new(BackendBridge::new(backend, BridgeConfig::default()));
    bridge.notify_state(DebuggerStatus::Break);
    let nav = Navigator::new(bridge.clone(), Arc::new(metadata), config);
    Fixture { nav, bridge, stats }
}
