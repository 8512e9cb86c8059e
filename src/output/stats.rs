//! Statistics over the catalog state
//!
//! This module reads the state files through the storage layer and
//! summarizes how complete the catalog is.

use crate::catalog::{ItemId, Region};
use crate::crawler::PassReport;
use crate::store::{union_id_sets, Storage};
use crate::Result;

/// Number of journal entries shown by `print_statistics`
pub const RECENT_RUNS: usize = 5;

/// Catalog statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogStatistics {
    /// Snapshot size of every input region, in input order
    pub region_sizes: Vec<(Region, usize)>,

    /// Distinct ids across all regions
    pub total_ids: usize,

    /// Title records stored
    pub titles: usize,

    /// Title records that carry a name
    pub named_titles: usize,

    /// Thumbnails stored
    pub thumbnails: usize,

    /// Known ids without a title record
    pub missing_titles: usize,

    /// Named titles without a thumbnail
    pub missing_thumbnails: usize,

    /// Latest pass reports, oldest first
    pub recent_runs: Vec<PassReport>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to read
/// * `regions` - The input regions, in visiting order
pub fn load_statistics(storage: &dyn Storage, regions: &[Region]) -> Result<CatalogStatistics> {
    let mut region_sizes = Vec::with_capacity(regions.len());
    let mut all_ids: Vec<ItemId> = storage.load_global_ids()?;
    for region in regions {
        let ids = storage.load_region_ids(region)?;
        region_sizes.push((region.clone(), ids.len()));
        all_ids = union_id_sets(&all_ids, &ids);
    }

    let titles = storage.load_titles()?;
    let thumbnails = storage.load_thumbnails()?;

    let missing_titles = all_ids.iter().filter(|id| !titles.contains_key(*id)).count();
    let named: Vec<ItemId> = titles
        .values()
        .filter(|record| record.name().is_some())
        .map(|record| record.id)
        .collect();
    let missing_thumbnails = named
        .iter()
        .filter(|id| !thumbnails.contains_key(*id))
        .count();

    let runs = storage.load_runs()?;
    let recent_runs = runs[runs.len().saturating_sub(RECENT_RUNS)..].to_vec();

    Ok(CatalogStatistics {
        region_sizes,
        total_ids: all_ids.len(),
        titles: titles.len(),
        named_titles: named.len(),
        thumbnails: thumbnails.len(),
        missing_titles,
        missing_thumbnails,
        recent_runs,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CatalogStatistics) {
    println!("=== Catalog Statistics ===\n");

    println!("Regions ({}):", stats.region_sizes.len());
    for (region, size) in &stats.region_sizes {
        println!("  {}: {} ids", region, size);
    }
    println!();

    println!("Overview:");
    println!("  Distinct ids: {}", stats.total_ids);
    println!(
        "  Titles: {} ({} named, {} missing)",
        stats.titles, stats.named_titles, stats.missing_titles
    );
    println!(
        "  Thumbnails: {} ({} missing)",
        stats.thumbnails, stats.missing_thumbnails
    );
    println!();

    if !stats.recent_runs.is_empty() {
        println!("Recent Passes:");
        for run in &stats.recent_runs {
            println!("  {} {}", run.started_at.format("%Y-%m-%d %H:%M:%S"), run);
        }
        println!();
    }

    let coverage = if stats.total_ids > 0 {
        (stats.total_ids - stats.missing_titles) as f64 / stats.total_ids as f64 * 100.0
    } else {
        0.0
    };
    println!(
        "Title Coverage: {:.1}% ({} / {} ids)",
        coverage,
        stats.total_ids - stats.missing_titles,
        stats.total_ids
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ItemRecord, Thumbnail, ThumbnailMap, TitleMap};
    use crate::state::PassKind;
    use crate::store::JsonStore;
    use tempfile::TempDir;

    #[test]
    fn test_empty_state() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();

        let stats = load_statistics(&store, &[Region::from("r1")]).unwrap();

        assert_eq!(stats.region_sizes, vec![(Region::from("r1"), 0)]);
        assert_eq!(stats.total_ids, 0);
        assert_eq!(stats.missing_titles, 0);
        assert!(stats.recent_runs.is_empty());
    }

    #[test]
    fn test_counts_missing_work() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonStore::open(dir.path()).unwrap();
        let r1 = Region::from("r1");
        let r2 = Region::from("r2");
        store.save_region_ids(&r1, &[1, 3, 5]).unwrap();
        store.save_region_ids(&r2, &[1, 4]).unwrap();
        store.save_global_ids(&[1, 3, 4, 5]).unwrap();

        let mut titles = TitleMap::new();
        let mut named = ItemRecord::new(1);
        named.name = Some("One".to_string());
        titles.insert(1, named);
        let mut other = ItemRecord::new(3);
        other.name = Some("Three".to_string());
        titles.insert(3, other);
        titles.insert(4, ItemRecord::new(4));
        store.save_titles(&titles).unwrap();

        let mut thumbnails = ThumbnailMap::new();
        thumbnails.insert(
            1,
            Thumbnail {
                code: "1".to_string(),
                source: "one.jpg".to_string(),
            },
        );
        store.save_thumbnails(&thumbnails).unwrap();

        for _ in 0..(RECENT_RUNS + 2) {
            store.append_run(&PassReport::start(PassKind::Ids)).unwrap();
        }

        let stats = load_statistics(&store, &[r1.clone(), r2.clone()]).unwrap();

        assert_eq!(stats.region_sizes, vec![(r1, 3), (r2, 2)]);
        assert_eq!(stats.total_ids, 4);
        assert_eq!(stats.titles, 3);
        assert_eq!(stats.named_titles, 2);
        assert_eq!(stats.missing_titles, 1);
        assert_eq!(stats.thumbnails, 1);
        assert_eq!(stats.missing_thumbnails, 1);
        assert_eq!(stats.recent_runs.len(), RECENT_RUNS);
    }
}
