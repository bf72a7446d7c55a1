use super::*;

fn collect(store: &dyn Store) -> Vec<(Vec<u8>, Vec<u8>)> {
    store.iter().collect()
}

#[test]
fn test_memory_store() {
    let mut store = MemoryStore::new();
    assert!(store.is_empty());

    store.insert(b"b", b"2");
    store.insert(b"a", b"1");
    store.insert(b"c", b"3");
    assert_eq!(store.len(), 3);
    assert_eq!(store.get(b"a"), Some(b"1".to_vec()));
    assert_eq!(store.get(b"d"), None);

    store.remove(b"b");
    assert_eq!(
        collect(&store),
        vec![
            (b"a".to_vec(), b"1".to_vec()),
            (b"c".to_vec(), b"3".to_vec()),
        ]
    );

    let from_b: Vec<_> = store.iter_from(b"b").map(|(key, _)| key).collect();
    assert_eq!(from_b, vec![b"c".to_vec()]);
    assert_eq!(store.iter_from(b"d").count(), 0);
}

#[test]
fn test_overlay() {
    let mut root = MemoryStore::new();
    root.insert(b"a", b"1");
    root.insert(b"b", b"2");
    root.insert(b"d", b"4");

    let mut overlay = OverlayStore::new(&mut root);
    assert!(!overlay.has_pending_updates());
    overlay.insert(b"c", b"3");
    overlay.insert(b"a", b"10");
    overlay.remove(b"b");
    overlay.insert(b"e", b"5");
    overlay.remove(b"e");
    assert!(overlay.has_pending_updates());

    assert_eq!(overlay.get(b"a"), Some(b"10".to_vec()));
    assert_eq!(overlay.get(b"b"), None);
    assert_eq!(overlay.get(b"e"), None);
    assert_eq!(
        collect(&overlay),
        vec![
            (b"a".to_vec(), b"10".to_vec()),
            (b"c".to_vec(), b"3".to_vec()),
            (b"d".to_vec(), b"4".to_vec()),
        ]
    );
    let from_b: Vec<_> = overlay.iter_from(b"b").map(|(key, _)| key).collect();
    assert_eq!(from_b, vec![b"c".to_vec(), b"d".to_vec()]);

    overlay.commit();
    assert_eq!(root.get(b"a"), Some(b"10".to_vec()));
    assert_eq!(root.get(b"b"), None);
    assert_eq!(root.get(b"c"), Some(b"3".to_vec()));
    assert_eq!(root.get(b"e"), None);
    assert_eq!(root.len(), 3);
}

#[test]
fn test_overlay_rollback() {
    let mut root = MemoryStore::new();
    root.insert(b"a", b"1");

    let mut overlay = OverlayStore::new(&mut root);
    overlay.insert(b"a", b"2");
    overlay.remove(b"a");
    overlay.rollback();

    assert_eq!(root.get(b"a"), Some(b"1".to_vec()));
}

#[test]
fn test_nested_store() {
    let root: Box<dyn NestedStore> = Box::new(MemoryStore::new());
    let mut level1: Box<dyn NestedStore> = Box::new(OverlayStore::new(root));
    level1.insert(b"key", b"one");

    let mut level2: Box<dyn NestedStore> = Box::new(OverlayStore::new(level1));
    level2.insert(b"key", b"two");
    level2.insert(b"other", b"value");
    let level1 = level2.rollback();
    assert_eq!(level1.get(b"key"), Some(b"one".to_vec()));
    assert_eq!(level1.get(b"other"), None);

    let mut level2: Box<dyn NestedStore> = Box::new(OverlayStore::new(level1));
    level2.remove(b"key");
    let level1 = level2.commit();
    assert!(level1.has_pending_updates());
    assert_eq!(level1.get(b"key"), None);
}

#[test]
fn test_prefix_store() {
    let mut root = MemoryStore::new();
    root.insert(b"aa1", b"x");
    {
        let mut store = PrefixStore::new(&mut root, b"ab");
        store.insert(b"1", b"one");
        store.insert(b"2", b"two");
        assert_eq!(store.get(b"1"), Some(b"one".to_vec()));
        assert_eq!(
            collect(&store),
            vec![
                (b"1".to_vec(), b"one".to_vec()),
                (b"2".to_vec(), b"two".to_vec()),
            ]
        );
    }
    root.insert(b"ac1", b"y");

    let store = PrefixStore::new(&mut root, b"ab");
    let from_2: Vec<_> = store.iter_from(b"2").collect();
    assert_eq!(from_2, vec![(b"2".to_vec(), b"two".to_vec())]);
}

#[test]
fn test_typed_store() {
    let mut root = MemoryStore::new();
    let mut store = TypedStore::new(PrefixStore::new(&mut root, b"t"));
    store.insert(b"x", 10u64);
    store.insert(b"y", 20u64);
    assert_eq!(store.get::<_, u64>(b"x"), Some(10));
    assert_eq!(store.get::<_, u64>(b"z"), None);

    let items: Vec<(Vec<u8>, u64)> = store.iter::<Vec<u8>, u64>().collect();
    assert_eq!(items, vec![(b"x".to_vec(), 10), (b"y".to_vec(), 20)]);

    store.remove(b"x");
    assert_eq!(store.get::<_, u64>(b"x"), None);
}
