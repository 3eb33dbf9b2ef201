use shard_wal_kv::{Store, StoreOptions, Value};

#[test]
fn snapshot_then_restore_preserves_five_keys() {
    let store = Store::new();
    for i in 1..=5 {
        store.set(format!("test{i}"), Value::from(format!("value{i}")));
    }

    let mut buf = Vec::new();
    store.snapshot(&mut buf).unwrap();

    let restored = Store::restore(&mut &buf[..], StoreOptions::new()).unwrap();
    for i in 1..=5 {
        assert_eq!(
            restored.get(format!("test{i}")),
            Some(Value::from(format!("value{i}")))
        );
    }
}

#[test]
fn restore_reproduces_the_mapping_after_overwrites_and_deletes() {
    let store = Store::with_options(StoreOptions::new().shard_count(8));
    for i in 0..100 {
        store.set(format!("k{i}"), Value::I64(i));
    }
    for i in 0..100 {
        store.set(format!("k{i}"), Value::I64(i * 2));
    }
    for i in 0..20 {
        store.remove(format!("k{i}"));
    }

    let mut buf = Vec::new();
    store.snapshot(&mut buf).unwrap();
    let restored = Store::restore(&mut &buf[..], StoreOptions::new().shard_count(8)).unwrap();

    for i in 0..100 {
        let expected = if i < 20 { None } else { Some(Value::I64(i * 2)) };
        assert_eq!(restored.get(format!("k{i}")), expected);
    }
}

#[test]
fn restore_of_truncated_stream_fails() {
    let store = Store::new();
    store.set("k", Value::from("v"));
    let mut buf = Vec::new();
    store.snapshot(&mut buf).unwrap();
    buf.truncate(buf.len() - 1);

    assert!(Store::restore(&mut &buf[..], StoreOptions::new()).is_err());
}

#[test]
fn restore_honors_the_shard_count_in_the_stream() {
    let store = Store::with_options(StoreOptions::new().shard_count(16));
    store.set("k", Value::from("v"));

    let mut buf = Vec::new();
    store.snapshot(&mut buf).unwrap();

    // Restore with a different configured shard_count: the stream's own
    // count wins.
    let restored = Store::restore(&mut &buf[..], StoreOptions::new().shard_count(4)).unwrap();
    assert_eq!(restored.shard_count(), 16);
    assert_eq!(restored.get("k"), Some(Value::from("v")));
}
