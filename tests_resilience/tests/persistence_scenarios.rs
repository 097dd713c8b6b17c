//! Persistence Scenario Tests
//!
//! End-to-end reads and writes through the resolver against both
//! on-disk layouts.

use persist_store::{BackendKind, PersistentBackend, PersistentStore};
use prop_resolver::ResolveError;
use prop_types::{PropFlags, PERSIST_VALUE_CAPACITY};
use tests_resilience::{binary_fixture, legacy_fixture, persist_flags};

/// Test: Read one value out of a multi-record store
#[test]
fn test_scenario_a_get_from_binary_store() {
    let fixture = binary_fixture(&[("persist.a", "1"), ("persist.b", "22")]);
    let resolver = fixture.resolver();

    let value = resolver
        .get("persist.b", PropFlags::new().include_persistent())
        .unwrap();

    assert_eq!(value, "22");
}

/// Test: Delete rewrites the store without the removed record
#[test]
fn test_scenario_b_delete_from_binary_store() {
    let fixture = binary_fixture(&[("persist.a", "1"), ("persist.b", "22")]);
    let mut resolver = fixture.resolver();
    let flags = PropFlags::new().include_persistent();

    resolver.delete("persist.a", flags).unwrap();

    let remaining = prop_codec::decode_list(&fixture.canonical_bytes());
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining["persist.b"], "22");
    assert!(matches!(
        resolver.get("persist.a", flags),
        Err(ResolveError::NotFound(_))
    ));
}

/// Test: Short value round-trips through both layouts
#[test]
fn test_scenario_c_set_then_get() {
    for fixture in [binary_fixture(&[]), legacy_fixture(&[])] {
        let mut resolver = fixture.resolver();

        resolver.set("persist.c", "3", persist_flags()).unwrap();

        assert_eq!(
            resolver
                .get("persist.c", PropFlags::new().persistent_only())
                .unwrap(),
            "3"
        );
    }
}

/// Test: Values are capped at the persistent capacity
///
/// 91 bytes fit exactly; one more byte is cut off on write.
#[test]
fn test_scenario_d_value_capacity() {
    let fixture = binary_fixture(&[]);
    let store = PersistentStore::probe(&fixture.config);
    let exact = "x".repeat(PERSIST_VALUE_CAPACITY);
    let over = "y".repeat(PERSIST_VALUE_CAPACITY + 1);

    store.set("persist.exact", &exact).unwrap();
    store.set("persist.over", &over).unwrap();

    assert_eq!(store.get("persist.exact").unwrap(), Some(exact));
    assert_eq!(
        store.get("persist.over").unwrap(),
        Some("y".repeat(PERSIST_VALUE_CAPACITY))
    );
}

/// Test: Persistent-only names are invisible without the persist flag
#[test]
fn test_persistent_name_needs_flag() {
    let fixture = binary_fixture(&[("persist.hidden", "1")]);
    let resolver = fixture.resolver();

    assert!(matches!(
        resolver.get("persist.hidden", PropFlags::new()),
        Err(ResolveError::NotFound(_))
    ));
    assert_eq!(
        resolver
            .get("persist.hidden", PropFlags::new().include_persistent())
            .unwrap(),
        "1"
    );
}

/// Test: Legacy layout stores the raw value with no terminator
#[test]
fn test_legacy_round_trip_is_exact() {
    let fixture = legacy_fixture(&[]);
    let mut resolver = fixture.resolver();
    assert_eq!(resolver.backend_kind(), BackendKind::Legacy);

    resolver
        .set("persist.sys.timezone", "Europe/Paris", persist_flags())
        .unwrap();

    let raw = std::fs::read(fixture.dir.path().join("persist.sys.timezone")).unwrap();
    assert_eq!(raw, b"Europe/Paris");
    assert_eq!(
        resolver
            .get("persist.sys.timezone", PropFlags::new().persistent_only())
            .unwrap(),
        "Europe/Paris"
    );
}

/// Test: Listing merges both sources with disk winning
#[test]
fn test_list_all_prefers_persistent_value() {
    let fixture = legacy_fixture(&[("persist.dup", "disk"), ("persist.only", "x")]);
    let area = prop_area::MemoryPropertyArea::new()
        .with_property("persist.dup", "live")
        .unwrap()
        .with_property("sys.live", "1")
        .unwrap();
    let resolver = fixture.resolver_with_area(area);

    let all = resolver.list_all(PropFlags::new().include_persistent());

    assert_eq!(
        all.into_iter().collect::<Vec<_>>(),
        vec![
            ("persist.dup".to_string(), "disk".to_string()),
            ("persist.only".to_string(), "x".to_string()),
            ("sys.live".to_string(), "1".to_string()),
        ]
    );
}
