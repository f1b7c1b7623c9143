use std::collections::HashSet;

use crate::projection::{MatchRecord, sort_newest_first};

/// Merge freshly fetched records into a cached window.
///
/// Fresh records take precedence over cached copies with the same ID. The
/// result is sorted newest first (undated records last) and holds at most
/// `window` records.
pub(super) fn merge_window(
    fresh: Vec<MatchRecord>,
    cached: Vec<MatchRecord>,
    window: usize,
) -> Vec<MatchRecord> {
    let mut seen = HashSet::with_capacity(fresh.len() + cached.len());
    let mut merged: Vec<MatchRecord> = fresh
        .into_iter()
        .chain(cached)
        .filter(|record| seen.insert(record.id.clone()))
        .collect();

    sort_newest_first(&mut merged);
    merged.truncate(window);
    merged
}

/// Sort and bound a window built from fresh records only.
pub(super) fn rebuild_window(fresh: Vec<MatchRecord>, window: usize) -> Vec<MatchRecord> {
    merge_window(fresh, Vec::new(), window)
}
