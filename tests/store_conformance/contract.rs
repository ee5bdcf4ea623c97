//! Read/write/delete semantics shared by every store

use crate::test_utils::*;
use serde_json::json;
use tagstore::{BatchMode, Condition, ETag, Error, Record, WriteBatch};

#[test]
fn versioned_write_scenario() {
    init_tracing();
    for (name, store) in all_stores(BatchMode::AllOrNothing) {
        let store = store.as_ref();

        put_counter(store, "k", &Counter::new(1)).unwrap();
        let t1 = get_counter(store, "k").unwrap().e_tag.unwrap();

        put_counter(store, "k", &Counter::tagged(2, t1.clone())).unwrap();
        let second = get_counter(store, "k").unwrap();
        let t2 = second.e_tag.clone().unwrap();
        assert_ne!(t1, t2, "{name}");
        assert_eq!(second.x, 2, "{name}");

        let err = put_counter(store, "k", &Counter::tagged(3, t1.clone())).unwrap_err();
        match err {
            Error::Conflict {
                key,
                expected,
                current,
            } => {
                assert_eq!(key, "k", "{name}");
                assert_eq!(expected, Some(t1), "{name}");
                assert_eq!(current, t2, "{name}");
            }
            other => panic!("{name}: expected conflict, got {other:?}"),
        }
        assert_eq!(get_counter(store, "k").unwrap().x, 2, "{name}");
    }
}

#[test]
fn first_token_is_one() {
    for (name, store) in all_stores(BatchMode::AllOrNothing) {
        put_counter(store.as_ref(), "k", &Counter::new(0)).unwrap();
        let tag = get_counter(store.as_ref(), "k").unwrap().e_tag.unwrap();
        assert_eq!(tag.as_str(), "1", "{name}");
    }
}

#[test]
fn wildcard_always_applies() {
    for (name, store) in all_stores(BatchMode::AllOrNothing) {
        let store = store.as_ref();
        put_counter(store, "k", &Counter::new(1)).unwrap();
        put_counter(store, "k", &Counter::tagged(2, ETag::wildcard())).unwrap();
        put_counter(store, "fresh", &Counter::tagged(3, "*")).unwrap();

        assert_eq!(get_counter(store, "k").unwrap().x, 2, "{name}");
        assert_eq!(get_counter(store, "fresh").unwrap().x, 3, "{name}");
    }
}

#[test]
fn missing_token_against_stored_token_conflicts() {
    for (name, store) in all_stores(BatchMode::AllOrNothing) {
        let store = store.as_ref();
        put_counter(store, "k", &Counter::new(1)).unwrap();
        let err = put_counter(store, "k", &Counter::new(2)).unwrap_err();
        assert!(
            matches!(err, Error::Conflict { expected: None, .. }),
            "{name}: {err:?}"
        );
    }
}

#[test]
fn any_token_accepted_for_new_key() {
    for (name, store) in all_stores(BatchMode::AllOrNothing) {
        let store = store.as_ref();
        put_counter(store, "k", &Counter::tagged(1, "made-up")).unwrap();
        assert_eq!(get_counter(store, "k").unwrap().x, 1, "{name}");
    }
}

#[test]
fn plain_overwrite_drops_token() {
    for (name, store) in all_stores(BatchMode::AllOrNothing) {
        let store = store.as_ref();
        put_counter(store, "k", &Counter::new(1)).unwrap();

        let mut batch = WriteBatch::new();
        batch
            .put("k", &Note {
                text: "plain".into(),
            })
            .unwrap();
        store.write(batch).unwrap();

        let records = store.read_records(&["k"]).unwrap();
        assert_eq!(records["k"].e_tag(), None, "{name}");
        assert!(records["k"].is::<Note>(), "{name}");

        // With no stored token any versioned write goes through again
        put_counter(store, "k", &Counter::tagged(5, "whatever")).unwrap();
        assert_eq!(get_counter(store, "k").unwrap().x, 5, "{name}");
    }
}

#[test]
fn tokens_are_never_reused() {
    for (name, store) in all_stores(BatchMode::AllOrNothing) {
        let store = store.as_ref();
        let mut seen = std::collections::HashSet::new();
        for i in 0..50 {
            let key = format!("k{}", i % 5);
            put_counter(store, &key, &Counter::tagged(i, "*")).unwrap();
            let tag = get_counter(store, &key).unwrap().e_tag.unwrap();
            assert!(seen.insert(tag), "{name}");
        }
        // Deleting and recreating does not restart the counter
        store.delete(&["k0"]).unwrap();
        put_counter(store, "k0", &Counter::new(0)).unwrap();
        let tag = get_counter(store, "k0").unwrap().e_tag.unwrap();
        assert!(seen.insert(tag), "{name}");
    }
}

#[test]
fn read_omits_absent_and_tolerates_duplicates() {
    for (name, store) in all_stores(BatchMode::AllOrNothing) {
        let store = store.as_ref();
        let mut batch = WriteBatch::new();
        batch.put("a", &1).unwrap().put("b", &2).unwrap();
        store.write(batch).unwrap();

        let records = store.read_records(&["a", "a", "missing", "b"]).unwrap();
        assert_eq!(records.len(), 2, "{name}");
        assert_eq!(records["a"].decode::<i32>().unwrap(), 1, "{name}");
        assert!(store.read_records(&[]).unwrap().is_empty(), "{name}");
    }
}

#[test]
fn empty_keys_are_rejected_everywhere() {
    for (name, store) in all_stores(BatchMode::AllOrNothing) {
        let store = store.as_ref();
        assert!(
            matches!(store.read_records(&["ok", ""]), Err(Error::InvalidArgument(_))),
            "{name}"
        );
        assert!(
            matches!(store.delete(&[""]), Err(Error::InvalidArgument(_))),
            "{name}"
        );
    }
    let mut batch = WriteBatch::new();
    assert!(matches!(batch.put("", &1), Err(Error::InvalidArgument(_))));
    assert!(batch.is_empty());
}

#[test]
fn delete_is_idempotent() {
    for (name, store) in all_stores(BatchMode::AllOrNothing) {
        let store = store.as_ref();
        put_counter(store, "k", &Counter::new(1)).unwrap();
        store.delete(&["k", "never-written"]).unwrap();
        store.delete(&["k"]).unwrap();
        assert!(store.read_records(&["k"]).unwrap().is_empty(), "{name}");
    }
}

#[test]
fn wrong_type_is_a_serialization_error() {
    for (name, store) in all_stores(BatchMode::AllOrNothing) {
        let store = store.as_ref();
        let mut batch = WriteBatch::new();
        batch.put("k", "text").unwrap();
        store.write(batch).unwrap();

        let record = store.read_records(&["k"]).unwrap().remove("k").unwrap();
        assert!(record.decode::<Counter>().is_err(), "{name}");
        assert!(record.is::<str>(), "{name}");
    }
}

#[test]
fn all_or_nothing_batch_leaves_store_untouched() {
    for (name, store) in all_stores(BatchMode::AllOrNothing) {
        let store = store.as_ref();
        for key in ["a", "b", "c"] {
            put_counter(store, key, &Counter::new(0)).unwrap();
        }
        let before = store.read_records(&["a", "b", "c"]).unwrap();

        let mut batch = WriteBatch::new();
        batch
            .put_item("a", &Counter::tagged(1, "*"))
            .unwrap()
            .put_item("b", &Counter::tagged(1, "stale"))
            .unwrap()
            .put("c", &Note { text: "x".into() })
            .unwrap();
        let err = store.write(batch).unwrap_err();
        assert_eq!(err.key(), Some("b"), "{name}");

        assert_eq!(store.read_records(&["a", "b", "c"]).unwrap(), before, "{name}");
    }
}

#[test]
fn best_effort_batch_keeps_earlier_entries() {
    for (name, store) in all_stores(BatchMode::BestEffort) {
        let store = store.as_ref();
        for key in ["a", "b", "c"] {
            put_counter(store, key, &Counter::new(0)).unwrap();
        }

        let mut batch = WriteBatch::new();
        batch
            .put_item("c", &Counter::tagged(1, "*"))
            .unwrap()
            .put_item("b", &Counter::tagged(1, "stale"))
            .unwrap()
            .put_item("a", &Counter::tagged(1, "*"))
            .unwrap();
        assert!(store.write(batch).unwrap_err().is_conflict(), "{name}");

        // Entries apply in key order: a lands, b conflicts, c is never reached
        assert_eq!(get_counter(store, "a").unwrap().x, 1, "{name}");
        assert_eq!(get_counter(store, "b").unwrap().x, 0, "{name}");
        assert_eq!(get_counter(store, "c").unwrap().x, 0, "{name}");
    }
}

#[test]
fn last_put_for_a_key_wins() {
    for (name, store) in all_stores(BatchMode::AllOrNothing) {
        let store = store.as_ref();
        let mut batch = WriteBatch::new();
        batch.put("k", &1).unwrap().put("k", &2).unwrap();
        assert_eq!(batch.len(), 1);
        store.write(batch).unwrap();
        let records = store.read_records(&["k"]).unwrap();
        assert_eq!(records["k"].decode::<i32>().unwrap(), 2, "{name}");
    }
}

#[test]
fn heterogeneous_values_share_a_store() {
    for (name, store) in all_stores(BatchMode::AllOrNothing) {
        let store = store.as_ref();
        let mut batch = WriteBatch::new();
        batch
            .put("note", &Note { text: "hi".into() })
            .unwrap()
            .put("list", &vec![1, 2, 3])
            .unwrap()
            .put_item("counter", &Counter::new(7))
            .unwrap()
            .put_record("raw", Record::new(json!({"free": "form"})), Condition::Unversioned)
            .unwrap();
        store.write(batch).unwrap();

        let records = store
            .read_records(&["note", "list", "counter", "raw"])
            .unwrap();
        assert!(records["note"].is::<Note>(), "{name}");
        assert!(records["list"].is::<Vec<i32>>(), "{name}");
        assert!(records["counter"].is::<Counter>(), "{name}");
        assert_eq!(records["raw"].type_name(), None, "{name}");
        assert_eq!(records["list"].decode::<Vec<i32>>().unwrap(), vec![1, 2, 3]);
        assert_eq!(
            records["counter"].document(),
            json!({"x": 7, "eTag": "1"}),
            "{name}"
        );
    }
}
