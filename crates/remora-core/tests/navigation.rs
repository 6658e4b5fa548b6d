//! Navigation engine tests against the shared snapshot fixture.

mod common;

use common::{build, fixture, fixture_with, handle, memory, metadata, MODULE};
use futures::TryStreamExt;
use remora_core::backends::SnapshotBackend;
use remora_core::config::NavigatorConfig;
use remora_core::error::RemoraError;
use remora_core::metadata::{StaticMetadata, TypeDescriptor};
use remora_core::navigation::{FieldPath, NextLink, Pending, RemoteObject, TypeVariants, Variant};
use remora_core::types::{Address, Endianness, ScalarValue};

fn addresses(handles: &[RemoteObject]) -> Vec<u64>
{
    handles.iter().map(|h| h.address().value()).collect()
}

#[tokio::test]
async fn test_null_handle_navigation_reads_nothing()
{
    let fx = fixture();
    let null_node = handle("Node", 0);
    let null_pointer = handle("Node*", 0);

    assert!(fx.nav.field(null_node.clone(), "next").await.unwrap().is_null());
    assert!(fx.nav.field(null_pointer.clone(), "value").await.unwrap().is_null());
    assert!(fx.nav.deref(null_pointer.clone()).await.unwrap().is_null());
    assert!(fx.nav.downcast(null_node.clone()).await.unwrap().is_null());
    assert!(fx.nav.latest_patch(handle("Item", 0)).await.unwrap().is_null());
    assert!(fx.nav.index(null_pointer.clone(), 3).await.unwrap().is_null());
    assert!(fx.nav.list(null_node.clone(), "next").await.unwrap().is_empty());
    assert!(fx.nav.array(handle("Vec", 0)).await.unwrap().is_empty());
    assert!(fx.nav.at(RemoteObject::null()).f("a").f("b").await.unwrap().is_null());

    assert_eq!(fx.stats.reads(), 0);
}

#[tokio::test]
async fn test_value_of_null_is_invalid_without_reading()
{
    let fx = fixture();
    let result = fx.nav.value(handle("uint32_t", 0)).await;
    assert!(matches!(result, Err(RemoraError::InvalidArgument(_))));
    assert_eq!(fx.stats.reads(), 0);
}

#[tokio::test]
async fn test_field_aliases_first_match_wins()
{
    let fx = fixture();
    let widget = handle("Widget", 0x5400);

    for path in [FieldPath::from(["oldName", "newName"]), FieldPath::from(["newName", "oldName"])] {
        let value = fx.nav.at(widget.clone()).f(path).value().await.unwrap();
        assert_eq!(value, ScalarValue::Unsigned(42));
    }

    match fx.nav.field(widget, ["missing", "gone"]).await {
        Err(RemoraError::FieldNotFound { type_name, candidates }) => {
            assert_eq!(type_name, "Widget");
            assert_eq!(candidates, vec!["missing".to_string(), "gone".to_string()]);
        }
        other => panic!("expected FieldNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_dotted_path_dereferences_each_segment()
{
    let fx = fixture();
    let value = fx.nav.field(handle("Outer", 0x5500), "inner.value").await.unwrap();
    assert_eq!(value.type_name(), "uint32_t");
    assert_eq!(value.address(), Address::new(0x5604));
    assert_eq!(fx.nav.value(value).await.unwrap(), ScalarValue::Unsigned(99));

    // The first segment matched, so a bad tail is an error, not a fallback
    let result = fx
        .nav
        .field(handle("Outer", 0x5500), ["inner.missing", "inner.value"])
        .await;
    assert!(matches!(result, Err(RemoraError::FieldNotFound { .. })));
}

#[tokio::test]
async fn test_list_yields_every_link_and_restarts()
{
    let fx = fixture();
    let walk = fx.nav.list(handle("Node", 0x1000), "next");

    let first = walk.to_vec().await.unwrap();
    let second = walk.to_vec().await.unwrap();
    assert_eq!(addresses(&first), vec![0x1000, 0x1100, 0x1200]);
    assert_eq!(first, second);

    let streamed: Vec<RemoteObject> = walk.stream().try_collect().await.unwrap();
    assert_eq!(streamed, first);
}

#[tokio::test]
async fn test_list_lengths_zero_to_three()
{
    let fx = fixture();
    let cases = [(0u64, 0usize), (0x1200, 1), (0x1100, 2), (0x1000, 3)];
    for (head, expected) in cases {
        let items = fx.nav.list(handle("Node", head), "next").await.unwrap();
        assert_eq!(items.len(), expected, "list from {head:#x}");
    }
}

#[tokio::test]
async fn test_list_from_pointer_head_and_function_link()
{
    let fx = fixture();
    // A Node* variable holding 0x1100
    let head = fx.nav.field(handle("Node", 0x1000), "next").await.unwrap();
    assert!(head.is_pointer());

    let next = NextLink::func(|nav, node| nav.field(node, "next"));
    let items = fx.nav.list(head, next).await.unwrap();
    assert_eq!(addresses(&items), vec![0x1100, 0x1200]);
    assert!(items.iter().all(|h| h.type_name() == "Node"));
}

#[tokio::test]
async fn test_cyclic_list_hits_sequence_limit()
{
    let fx = fixture_with(NavigatorConfig {
        max_sequence_len: 10,
        ..NavigatorConfig::default()
    });
    let result = fx.nav.list(handle("Node", 0x6000), "next").await;
    assert!(matches!(result, Err(RemoraError::SequenceLimitExceeded(10))));
}

#[tokio::test]
async fn test_downcast()
{
    let fx = fixture();

    let circle = fx.nav.downcast(handle("Shape", 0x3000)).await.unwrap();
    assert_eq!(circle.type_name(), "Circle");
    assert_eq!(circle.address(), Address::new(0x3000));

    let square = fx.nav.runtime_type_name(handle("Shape", 0x3100)).await.unwrap();
    assert_eq!(square, "Square");

    let unknown = handle("Shape", 0x3200);
    assert_eq!(fx.nav.downcast(unknown.clone()).await.unwrap(), unknown);

    let token = fx.nav.downcast(handle("Token", 0x5300)).await.unwrap();
    assert_eq!(token.type_name(), "Number");
}

#[tokio::test]
async fn test_downcast_leaves_scalars_unchanged()
{
    let fx = fixture();

    let word = handle("uint32_t", 0x5200);
    assert_eq!(fx.nav.downcast(word.clone()).await.unwrap(), word);

    let elements = fx.nav.at(handle("Triple", 0x5200)).array().vcast().await.unwrap();
    assert_eq!(addresses(&elements), vec![0x5200, 0x5204, 0x5208]);
    assert!(elements.iter().all(|h| h.type_name() == "uint32_t"));
}

#[tokio::test]
async fn test_downcast_propagates_read_failure()
{
    let fx = fixture();
    let result = fx.nav.downcast(handle("Shape", 0x9_0000)).await;
    assert!(matches!(result, Err(RemoraError::MemoryUnreadable { .. })));
}

#[tokio::test]
async fn test_runtime_type_variants()
{
    #[derive(Debug, Clone, PartialEq)]
    enum Shape
    {
        Round,
        Angular,
    }

    let fx = fixture();
    let variants = TypeVariants::new()
        .exact("Circle", Shape::Round)
        .containing("quare", Shape::Angular);

    let round = fx.nav.variant(handle("Shape", 0x3000), &variants).await.unwrap();
    assert_eq!(round, Variant::Known(Shape::Round));
    let angular = fx.nav.variant(handle("Shape", 0x3100), &variants).await.unwrap();
    assert_eq!(angular, Variant::Known(Shape::Angular));
    let unknown = fx.nav.variant(handle("Shape", 0x3200), &variants).await.unwrap();
    assert_eq!(unknown, Variant::Unrecognized("Shape".to_string()));
}

#[tokio::test]
async fn test_latest_patch()
{
    let fx = fixture();

    let patched = fx.nav.latest_patch(handle("Item", 0x4000)).await.unwrap();
    assert_eq!(patched, handle("Item", 0x4100));
    let payload = fx.nav.at(handle("Item", 0x4000)).latest_patch().f("payload").value().await;
    assert_eq!(payload.unwrap(), ScalarValue::Unsigned(2));

    let unpatched = handle("Item", 0x4200);
    assert_eq!(fx.nav.latest_patch(unpatched.clone()).await.unwrap(), unpatched);

    // Types without a patch layout are returned as is
    let node = handle("Node", 0x1000);
    assert_eq!(fx.nav.latest_patch(node.clone()).await.unwrap(), node);
}

#[tokio::test]
async fn test_pointer_backed_array()
{
    let fx = fixture();
    let walk = fx.nav.array(handle("Vec", 0x5000));

    assert_eq!(walk.len().await.unwrap(), 3);
    let elements = walk.to_vec().await.unwrap();
    assert_eq!(addresses(&elements), vec![0x5100, 0x5108, 0x5110]);
    assert_eq!(walk.to_vec().await.unwrap(), elements);
    assert!(elements.iter().all(|h| h.type_name() == "Elem"));

    let values = fx.nav.at(handle("Vec", 0x5000)).array().f("value").value().await.unwrap();
    assert_eq!(
        values,
        vec![ScalarValue::Unsigned(10), ScalarValue::Unsigned(20), ScalarValue::Unsigned(30)]
    );
}

#[tokio::test]
async fn test_inline_array_and_indexing()
{
    let fx = fixture();
    let values = fx.nav.at(handle("Triple", 0x5200)).array().value().await.unwrap();
    assert_eq!(
        values,
        vec![ScalarValue::Unsigned(7), ScalarValue::Unsigned(8), ScalarValue::Unsigned(9)]
    );

    let third = fx.nav.index(handle("uint32_t", 0x5200), 2).await.unwrap();
    assert_eq!(third.address(), Address::new(0x5208));

    let first_two = fx.nav.at(handle("uint32_t", 0x5200)).array_n(2).value().await.unwrap();
    assert_eq!(first_two, vec![ScalarValue::Unsigned(7), ScalarValue::Unsigned(8)]);

    // Elem* variable at 0x5000 holds 0x5100: p[1] is the second element
    let second = fx.nav.index(handle("Elem*", 0x5000), 1).await.unwrap();
    assert_eq!(second, handle("Elem", 0x5108));
}

#[tokio::test]
async fn test_array_without_layout_needs_a_count()
{
    let fx = fixture();
    let result = fx.nav.array(handle("Node", 0x1000)).await;
    assert!(matches!(result, Err(RemoraError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_array_longer_than_limit_fails()
{
    let fx = fixture_with(NavigatorConfig {
        max_sequence_len: 2,
        ..NavigatorConfig::default()
    });
    let result = fx.nav.array(handle("Vec", 0x5000)).await;
    assert!(matches!(result, Err(RemoraError::SequenceLimitExceeded(2))));
}

#[tokio::test]
async fn test_value_decoding()
{
    let fx = fixture();
    assert_eq!(fx.nav.value(handle("int", 0x5700)).await.unwrap(), ScalarValue::Signed(-5));
    assert_eq!(
        fx.nav.value(handle("Node*", 0x1000)).await.unwrap(),
        ScalarValue::Pointer(Address::new(0x1100))
    );
    assert_eq!(
        fx.nav.pointer_value(handle("Node*", 0x1000)).await.unwrap(),
        Address::new(0x1100)
    );
    assert!(matches!(
        fx.nav.value(handle("Node", 0x1000)).await,
        Err(RemoraError::NotAScalar(name)) if name == "Node"
    ));
    assert_eq!(
        fx.nav.read_bytes(handle("Triple", 0x5200), 4).await.unwrap(),
        vec![7, 0, 0, 0]
    );
}

#[tokio::test]
async fn test_big_endian_target()
{
    let fx = fixture_with(NavigatorConfig {
        endianness: Endianness::Big,
        ..NavigatorConfig::default()
    });
    let value = fx.nav.value(handle("uint32_t", 0x5200)).await.unwrap();
    assert_eq!(value, ScalarValue::Unsigned(0x0700_0000));
}

#[tokio::test]
async fn test_32bit_target_uses_4_byte_pointers()
{
    let backend = SnapshotBackend::builder()
        .pointer_64bit(false)
        .pointer(0x100, 0x200)
        .u32(0x104, 11)
        .pointer(0x200, 0)
        .u32(0x204, 22)
        .build();
    let metadata = StaticMetadata::new().with_type(
        "app",
        TypeDescriptor::new("Node32", 8)
            .with_field("next", 0, 4, "Node32*")
            .with_field("value", 4, 4, "uint32_t"),
    );
    let fx = build(backend, metadata, NavigatorConfig::default());

    assert_eq!(fx.nav.pointer_size(), 4);
    let values = fx
        .nav
        .at(RemoteObject::new("app", "Node32", Address::new(0x100)))
        .list("next")
        .f("value")
        .value()
        .await
        .unwrap();
    assert_eq!(values, vec![ScalarValue::Unsigned(11), ScalarValue::Unsigned(22)]);
}

#[tokio::test]
async fn test_cursor_sequence_combinators()
{
    let fx = fixture();

    let odd = fx
        .nav
        .at(handle("Node", 0x1000))
        .list("next")
        .filter(|nav, node| {
            nav.at(node)
                .f("value")
                .value()
                .map(|value| value.as_u64().is_some_and(|v| v % 2 == 1))
        })
        .await
        .unwrap();
    assert_eq!(addresses(&odd), vec![0x1000, 0x1200]);

    let nexts = fx
        .nav
        .at(handle("Node", 0x1000))
        .list("next")
        .map(|cursor| cursor.f("next").deref())
        .non_null()
        .await
        .unwrap();
    assert_eq!(addresses(&nexts), vec![0x1100, 0x1200]);

    let flattened = fx
        .nav
        .at(handle("Vec", 0x5000))
        .as_type("Vec")
        .array()
        .flat_map(|cursor| cursor.array_n(2))
        .await
        .unwrap();
    assert_eq!(addresses(&flattened), vec![0x5100, 0x5108, 0x5108, 0x5110, 0x5110, 0x5118]);
}

#[tokio::test]
async fn test_failures_propagate_unless_recovered()
{
    let fx = fixture();
    let failing = fx.nav.at(handle("Widget", 0x5400)).f("missing").array();
    assert!(matches!(failing.await, Err(RemoraError::FieldNotFound { .. })));

    let recovered = fx
        .nav
        .at(handle("Widget", 0x5400))
        .f("missing")
        .array()
        .or_empty()
        .await
        .unwrap();
    assert!(recovered.is_empty());

    let fallback = fx
        .nav
        .at(handle("Widget", 0x5400))
        .f("missing")
        .or(RemoteObject::null())
        .await
        .unwrap();
    assert!(fallback.is_null());

    let nav = fx.nav.clone();
    let joined = Pending::join_all([
        fx.nav.field(handle("Node", 0x1000), "value"),
        fx.nav.field(handle("Node", 0x1100), "value"),
    ])
    .map_each(move |field| nav.value(field))
    .await
    .unwrap();
    assert_eq!(joined, vec![ScalarValue::Unsigned(1), ScalarValue::Unsigned(2)]);
}

#[tokio::test]
async fn test_navigation_releases_every_resource()
{
    let fx = fixture();
    let _ = fx.nav.at(handle("Vec", 0x5000)).array().f("value").value().await;
    let _ = fx.nav.downcast(handle("Shape", 0x9_0000)).await;
    let _ = fx.nav.list(handle("Node", 0x1000), "next").await;

    assert!(fx.stats.acquired() > 0);
    assert_eq!(fx.stats.outstanding(), 0);
}

#[tokio::test]
async fn test_unknown_type_is_reported()
{
    let fx = build(memory().build(), metadata(), NavigatorConfig::default());
    let result = fx.nav.field(RemoteObject::new(MODULE, "Nope", Address::new(0x1000)), "x").await;
    assert!(matches!(result, Err(RemoraError::TypeNotFound { .. })));
}
