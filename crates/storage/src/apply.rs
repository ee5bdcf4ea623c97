//! Write path shared by both stores
//!
//! Both stores hold their lock(s) for the whole call and hand a
//! [`RecordTable`] view of the locked state to [`apply_batch`], so conflict
//! checks, token minting and commit order are identical between them.

use tagstore_concurrency::{validate_batch, validate_change};
use tagstore_core::{BatchMode, Condition, ETag, Error, Record, Result, WriteBatch};
use tracing::warn;

/// Locked view of a store's records and token counter
pub(crate) trait RecordTable {
    /// Token currently stored for `key`
    fn current_e_tag(&self, key: &str) -> Option<&ETag>;

    /// Insert or replace the record for `key`
    fn commit(&mut self, key: String, record: Record);

    /// Advance the counter by `count` and return the first new value
    ///
    /// Fails with [`tagstore_core::Error::VersionExhausted`] without moving
    /// the counter when it would overflow.
    fn reserve(&mut self, count: u64) -> Result<u64>;
}

/// Validate and commit a batch against a locked table
///
/// Returns the number of records committed.
///
/// In [`BatchMode::AllOrNothing`] every change is validated before the first
/// commit, so a conflict leaves the table untouched. In
/// [`BatchMode::BestEffort`] changes are validated and committed one at a
/// time in key order; a conflict stops the batch and earlier commits stay.
///
/// Tokens for an all-or-nothing batch are reserved in one step after
/// validation, so an exhausted counter also rejects the batch before the
/// first commit.
pub(crate) fn apply_batch<T: RecordTable>(
    table: &mut T,
    batch: WriteBatch,
    mode: BatchMode,
) -> Result<usize> {
    if mode == BatchMode::AllOrNothing {
        let view: &T = table;
        let result = validate_batch(&batch, |key| view.current_e_tag(key));
        if let Some(conflict) = result.first() {
            warn!(
                target: "tagstore::storage",
                key = conflict.key(),
                expected = ?conflict.expected(),
                current = %conflict.current(),
                conflicts = result.conflict_count(),
                batch = batch.len(),
                "write batch rejected"
            );
            return result.into_result().map(|()| 0);
        }
    }

    let mut next = None;
    if mode == BatchMode::AllOrNothing {
        let versioned = batch
            .iter()
            .filter(|(_, change)| change.condition().is_versioned())
            .count() as u64;
        if versioned > 0 {
            next = Some(table.reserve(versioned).map_err(log_exhausted)?);
        }
    }

    let mut committed = 0;
    for (key, change) in batch {
        let (record, condition) = change.into_parts();

        if mode == BatchMode::BestEffort {
            if let Some(conflict) = validate_change(&key, &condition, table.current_e_tag(&key)) {
                warn!(
                    target: "tagstore::storage",
                    key = conflict.key(),
                    expected = ?conflict.expected(),
                    current = %conflict.current(),
                    applied = committed,
                    "write batch stopped on conflict"
                );
                return Err(conflict.into_error());
            }
        }

        let e_tag = match (&condition, next.as_mut()) {
            (Condition::Unversioned, _) => None,
            (Condition::Versioned(_), Some(version)) => {
                let tag = ETag::from_version(*version);
                *version = version.saturating_add(1);
                Some(tag)
            }
            (Condition::Versioned(_), None) => {
                Some(ETag::from_version(table.reserve(1).map_err(log_exhausted)?))
            }
        };
        table.commit(key, record.stamped(e_tag));
        committed += 1;
    }

    Ok(committed)
}

fn log_exhausted(err: Error) -> Error {
    warn!(target: "tagstore::storage", error = %err, "write batch rejected");
    err
}

/// Highest numeric token among seeded records
///
/// Counters of seeded stores start here so freshly minted tokens never
/// repeat a seeded one.
pub(crate) fn max_seeded_version<'a>(records: impl Iterator<Item = &'a Record>) -> u64 {
    records
        .filter_map(|r| r.e_tag().and_then(ETag::version))
        .max()
        .unwrap_or(0)
}
