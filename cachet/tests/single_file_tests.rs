//! Persistence protocol tests for the single-file adapter

use cachet::{CacheError, CacheItem, SingleFileAdapter, StorageAdapter};
use serde_json::json;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn save_then_expire_removes_key_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.json");
    let adapter = SingleFileAdapter::new(&path).unwrap();

    let mut item = CacheItem::new("k");
    item.set(json!("v")).expires_after(Some(Duration::from_secs(1)));
    assert!(adapter.save(&item));
    assert!(adapter.get_item("k").is_hit());

    std::thread::sleep(Duration::from_secs(2));

    assert!(!adapter.get_item("k").is_hit());
    let contents = fs::read_to_string(&path).unwrap();
    assert!(!contents.contains("\"k\""), "purged key still on disk: {contents}");
}

#[test]
fn one_malformed_record_yields_an_entirely_empty_cache() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.json");

    // Three well-formed records and one missing its expiration field
    fs::write(
        &path,
        concat!(
            r#"{"a":{"value":1,"expiration":null},"#,
            r#""b":{"value":2,"expiration":null},"#,
            r#""broken":{"value":3},"#,
            r#""c":{"value":4,"expiration":null}}"#,
        ),
    )
    .unwrap();

    let adapter = SingleFileAdapter::new(&path).unwrap();

    // Fail-closed: the good records are discarded along with the bad one
    assert_eq!(adapter.item_count(), 0);
    for key in ["a", "b", "broken", "c"] {
        assert!(!adapter.get_item(key).is_hit());
    }
}

#[test]
fn failed_save_reports_false() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.json");
    let adapter = SingleFileAdapter::new(&path).unwrap();

    // Remove the backing file's directory entry and replace it with a
    // directory of the same name so the rewrite cannot open it
    fs::remove_file(&path).unwrap();
    fs::create_dir(&path).unwrap();

    let mut item = CacheItem::new("k");
    item.set(json!("v"));
    assert!(!adapter.save(&item));
}

#[test]
fn construction_fails_in_unwritable_location() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("no_such_dir").join("cache.json");
    assert!(matches!(
        SingleFileAdapter::new(path),
        Err(CacheError::Init(_))
    ));
}

#[test]
fn writers_serialize_through_the_file_lock() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.json");

    let a = SingleFileAdapter::new(&path).unwrap();
    let b = SingleFileAdapter::new(&path).unwrap();

    let mut item_a = CacheItem::new("from_a");
    item_a.set(json!("a"));
    let mut item_b = CacheItem::new("from_b");
    item_b.set(json!("b"));

    assert!(a.save(&item_a));
    assert!(b.save(&item_b));

    // Each save is a full rewrite of the writer's own mirror, so the last
    // writer's view wins wholesale
    let fresh = SingleFileAdapter::new(&path).unwrap();
    assert!(fresh.get_item("from_b").is_hit());
    assert!(!fresh.get_item("from_a").is_hit());
}

#[test]
fn full_rewrite_drops_nothing_else() {
    let dir = TempDir::new().unwrap();
    let adapter = SingleFileAdapter::new(dir.path().join("cache.json")).unwrap();

    for i in 0..20 {
        let mut item = CacheItem::new(format!("key{i}"));
        item.set(json!(i));
        assert!(adapter.save(&item));
    }

    assert_eq!(adapter.item_count(), 20);
    for i in 0..20 {
        assert_eq!(adapter.get_item(&format!("key{i}")).get(), Some(&json!(i)));
    }
}
