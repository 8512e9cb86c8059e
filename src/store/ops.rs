//! Pure operations over id collections
//!
//! These never touch the disk. Every id collection goes through
//! [`clean_id_set`] before it is persisted.

use crate::catalog::{AvailabilityMap, ItemId, Region};
use std::collections::{BTreeMap, HashSet};

/// Returns the ids deduplicated and sorted ascending
pub fn clean_id_set(ids: impl IntoIterator<Item = ItemId>) -> Vec<ItemId> {
    let mut cleaned: Vec<ItemId> = ids.into_iter().collect();
    cleaned.sort_unstable();
    cleaned.dedup();
    cleaned
}

/// Returns the ids of `region_ids` that are not keys of `reference`
///
/// The relative order of `region_ids` is preserved. Used to compute the
/// titles and thumbnails a region still needs.
pub fn missing_against<V>(region_ids: &[ItemId], reference: &BTreeMap<ItemId, V>) -> Vec<ItemId> {
    region_ids
        .iter()
        .copied()
        .filter(|id| !reference.contains_key(id))
        .collect()
}

/// Unions a fresh scrape into a known id set
///
/// Known ids are never dropped, even when the fresh scrape misses them.
pub fn union_id_sets(known: &[ItemId], fresh: &[ItemId]) -> Vec<ItemId> {
    clean_id_set(known.iter().chain(fresh.iter()).copied())
}

/// Rebuilds the availability map from scratch
///
/// For every region, in the order given, the region is appended to the entry
/// of every id in its set. The result only depends on `region_id_sets`, so
/// running it again over the same sets yields the same map.
pub fn merge_availability<'a, I>(region_id_sets: I) -> AvailabilityMap
where
    I: IntoIterator<Item = (&'a Region, &'a [ItemId])>,
{
    let mut availability = AvailabilityMap::new();
    for (region, ids) in region_id_sets {
        // A snapshot read from disk may predate normalization
        let unique: HashSet<ItemId> = ids.iter().copied().collect();
        for id in unique {
            let entry = availability.entry(id).or_default();
            if !entry.contains(region) {
                entry.push(region.clone());
            }
        }
    }
    availability
}
