//! Batch atomicity under concurrent readers and writers

use crate::test_utils::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tagstore::{BatchMode, ETag, Storage, WriteBatch};

const PAIR: [&str; 2] = ["left", "right"];

/// Token minted for `key` in `round` when one writer owns the counter
///
/// Keys commit in order, so round `r` mints `2r + 1` for "left" and
/// `2r + 2` for "right".
fn expected_token(round: i64, key: &str) -> ETag {
    let offset = if key == "left" { 1 } else { 2 };
    ETag::from_version(2 * round as u64 + offset)
}

#[test]
fn readers_never_see_half_a_batch() {
    init_tracing();
    for (name, store) in all_stores(BatchMode::AllOrNothing) {
        let store: Arc<dyn Storage> = Arc::from(store);
        let done = Arc::new(AtomicBool::new(false));

        let writer = {
            let store = Arc::clone(&store);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut tokens: Vec<Option<ETag>> = vec![None; PAIR.len()];
                for round in 0..2_000i64 {
                    let mut batch = WriteBatch::new();
                    for (key, token) in PAIR.iter().zip(&tokens) {
                        let counter = Counter {
                            x: round,
                            e_tag: token.clone(),
                        };
                        batch.put_item(*key, &counter).unwrap();
                    }
                    store.write(batch).unwrap();

                    let records = store.read_records(&PAIR).unwrap();
                    for (key, token) in PAIR.iter().zip(tokens.iter_mut()) {
                        *token = records[*key].e_tag().cloned();
                    }
                }
                done.store(true, Ordering::Release);
            })
        };

        let readers: Vec<_> = (0..3)
            .map(|_| {
                let store = Arc::clone(&store);
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    let mut observed = 0usize;
                    while !done.load(Ordering::Acquire) || observed == 0 {
                        let records = store.read_records(&PAIR).unwrap();
                        if records.is_empty() {
                            continue;
                        }
                        assert_eq!(records.len(), 2);
                        let left: Counter = records["left"].decode_item().unwrap();
                        let right: Counter = records["right"].decode_item().unwrap();
                        assert_eq!(left.x, right.x);
                        // Payload and token of each record change together
                        assert_eq!(left.e_tag, Some(expected_token(left.x, "left")));
                        assert_eq!(right.e_tag, Some(expected_token(right.x, "right")));
                        observed += 1;
                    }
                    observed
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            let observed = reader.join().unwrap();
            assert!(observed > 0, "{name}: reader saw no committed batch");
        }

        let left = get_counter(store.as_ref(), "left").unwrap();
        assert_eq!(left.x, 1_999, "{name}");
        assert_eq!(left.e_tag, Some(expected_token(1_999, "left")), "{name}");
    }
}

#[test]
fn optimistic_increments_are_never_lost() {
    const THREADS: i64 = 4;
    const INCREMENTS: i64 = 50;

    for (name, store) in all_stores(BatchMode::AllOrNothing) {
        let store: Arc<dyn Storage> = Arc::from(store);
        put_counter(store.as_ref(), "count", &Counter::new(0)).unwrap();

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let mut conflicts = 0;
                    for _ in 0..INCREMENTS {
                        loop {
                            let mut current = get_counter(store.as_ref(), "count").unwrap();
                            current.x += 1;
                            match put_counter(store.as_ref(), "count", &current) {
                                Ok(()) => break,
                                Err(e) if e.is_conflict() => conflicts += 1,
                                Err(e) => panic!("unexpected error: {e}"),
                            }
                        }
                    }
                    conflicts
                })
            })
            .collect();

        let conflicts: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        let final_count = get_counter(store.as_ref(), "count").unwrap();
        assert_eq!(final_count.x, THREADS * INCREMENTS, "{name} ({conflicts} retries)");
    }
}

#[test]
fn overlapping_multi_key_batches_commit_whole() {
    for (name, store) in all_stores(BatchMode::AllOrNothing) {
        let store: Arc<dyn Storage> = Arc::from(store);
        let keys: Vec<String> = (0..6).map(|i| format!("slot{i}")).collect();

        let handles: Vec<_> = (0..4i64)
            .map(|t| {
                let store = Arc::clone(&store);
                let keys = keys.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        let mut batch = WriteBatch::new();
                        for key in &keys {
                            batch.put(key.as_str(), &t).unwrap();
                        }
                        store.write(batch).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        // Whichever batch landed last, it landed on every key
        let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        let records = store.read_records(&refs).unwrap();
        let values: Vec<i64> = refs
            .iter()
            .map(|k| records[*k].decode::<i64>().unwrap())
            .collect();
        assert!(values.windows(2).all(|w| w[0] == w[1]), "{name}: {values:?}");
    }
}
