//! Duplicate detection and merging within a vault.
//!
//! Records are partitioned by equality key, and every group with more than one
//! member is folded into a single record. Before each pairwise fold the two
//! participants are ordered newest first, so the more recently modified
//! record is always the authoritative operand.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::VaultResult;
use crate::record::{EqualityKey, Record};

/// A duplicate group about to be merged.
#[derive(Debug, Clone, Copy)]
pub struct DuplicateEvent<'a> {
    /// Name of the vault being deduplicated
    pub vault: &'a str,
    /// Key shared by every record in the group
    pub key: &'a EqualityKey,
    /// Number of records in the group (always at least 2)
    pub count: usize,
}

/// Receives one event per duplicate group. Purely observational: nothing an
/// observer does changes the merge result.
pub trait DuplicateObserver {
    fn duplicates_found(&mut self, event: &DuplicateEvent<'_>);
}

impl<F> DuplicateObserver for F
where
    F: FnMut(&DuplicateEvent<'_>),
{
    fn duplicates_found(&mut self, event: &DuplicateEvent<'_>) {
        self(event)
    }
}

/// Observer that reports duplicate groups through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl DuplicateObserver for TracingObserver {
    fn duplicates_found(&mut self, event: &DuplicateEvent<'_>) {
        tracing::info!(
            vault = event.vault,
            count = event.count,
            "found {} duplicates of {}",
            event.count,
            event.key
        );
    }
}

/// Statistics about a deduplication pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupStats {
    /// Records before deduplication
    pub records_in: u32,
    /// Records after deduplication
    pub records_out: u32,
    /// Groups that contained more than one record
    pub duplicate_groups: u32,
    /// Records folded away into another record
    pub records_removed: u32,
}

impl DedupStats {
    /// Add another pass's counts to this one.
    pub fn absorb(&mut self, other: &DedupStats) {
        self.records_in += other.records_in;
        self.records_out += other.records_out;
        self.duplicate_groups += other.duplicate_groups;
        self.records_removed += other.records_removed;
    }
}

/// Partition records into groups of the same logical entry.
///
/// Groups come out in order of their first member's position; members keep
/// their relative order. Records without an equality key each form their
/// own group.
pub fn group_records(records: Vec<Record>) -> Vec<Vec<Record>> {
    let mut groups: Vec<Vec<Record>> = Vec::new();
    let mut index_by_key: HashMap<EqualityKey, usize> = HashMap::new();

    for record in records {
        match record.equality_key() {
            Some(key) => match index_by_key.get(&key) {
                Some(&index) => groups[index].push(record),
                None => {
                    index_by_key.insert(key, groups.len());
                    groups.push(vec![record]);
                }
            },
            None => groups.push(vec![record]),
        }
    }

    groups
}

/// Fold a group left to right into one record.
///
/// At each step the more recently modified of the accumulator and the next
/// member becomes `self` of the merge; on a tie the accumulator stays
/// authoritative.
pub fn fold_group<I>(first: Record, rest: I) -> VaultResult<Record>
where
    I: IntoIterator<Item = Record>,
{
    rest.into_iter().try_fold(first, |merged, next| {
        if next.header.modified_at > merged.header.modified_at {
            next.merge_with(merged)
        } else {
            merged.merge_with(next)
        }
    })
}

/// Replace every duplicate group in `records` with its merged record.
pub fn deduplicate_records(
    vault: &str,
    records: Vec<Record>,
    observer: &mut dyn DuplicateObserver,
) -> VaultResult<(Vec<Record>, DedupStats)> {
    let mut stats = DedupStats {
        records_in: records.len() as u32,
        ..DedupStats::default()
    };
    let mut output = Vec::with_capacity(records.len());

    for group in group_records(records) {
        let count = group.len();
        let mut members = group.into_iter();
        let Some(first) = members.next() else {
            continue;
        };

        if count > 1 {
            if let Some(key) = first.equality_key() {
                observer.duplicates_found(&DuplicateEvent {
                    vault,
                    key: &key,
                    count,
                });
            }
            stats.duplicate_groups += 1;
            stats.records_removed += (count - 1) as u32;
        }

        output.push(fold_group(first, members)?);
    }

    stats.records_out = output.len() as u32;
    Ok((output, stats))
}

#[cfg(test)]
mod tests;
