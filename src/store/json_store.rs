//! JSON file storage implementation
//!
//! Layout under the output directory:
//!
//! ```text
//! region_ids/<region>.json   sorted id array per region
//! ids.json                   sorted id array across regions
//! titles.json                {"<id>": ItemRecord}
//! thumbnails.json            {"<id>": {"code": ..., "source": ...}}
//! availability.json          {"<id>": ["<region>", ...]}
//! runs.json                  [PassReport]
//! ```

use crate::catalog::{AvailabilityMap, ItemId, Region, ThumbnailMap, TitleMap};
use crate::crawler::PassReport;
use crate::store::ops::clean_id_set;
use crate::store::traits::{Storage, StorageError, StorageResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

const REGION_IDS_DIR: &str = "region_ids";
const IDS_FILE: &str = "ids.json";
const TITLES_FILE: &str = "titles.json";
const THUMBNAILS_FILE: &str = "thumbnails.json";
const AVAILABILITY_FILE: &str = "availability.json";
const RUNS_FILE: &str = "runs.json";

/// JSON file storage backend
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    /// Opens the state directory, creating it if it does not exist yet
    pub fn open(root: &Path) -> StorageResult<Self> {
        let region_dir = root.join(REGION_IDS_DIR);
        fs::create_dir_all(&region_dir).map_err(|source| StorageError::Io {
            path: region_dir.display().to_string(),
            source,
        })?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Path of the id snapshot for `region`
    ///
    /// Characters outside `[A-Za-z0-9._-]` are replaced so a region name can
    /// never point outside the snapshot directory.
    pub fn region_ids_path(&self, region: &Region) -> PathBuf {
        let file_stem: String = region
            .as_str()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let file_stem = file_stem.trim_start_matches('.');
        self.root
            .join(REGION_IDS_DIR)
            .join(format!("{}.json", file_stem))
    }

    fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl Storage for JsonStore {
    fn load_region_ids(&self, region: &Region) -> StorageResult<Vec<ItemId>> {
        let ids: Vec<ItemId> = read_or_default(&self.region_ids_path(region))?;
        Ok(clean_id_set(ids))
    }

    fn save_region_ids(&mut self, region: &Region, ids: &[ItemId]) -> StorageResult<()> {
        let cleaned = clean_id_set(ids.iter().copied());
        write_json(&self.region_ids_path(region), &cleaned)
    }

    fn load_global_ids(&self) -> StorageResult<Vec<ItemId>> {
        let ids: Vec<ItemId> = read_or_default(&self.file(IDS_FILE))?;
        Ok(clean_id_set(ids))
    }

    fn save_global_ids(&mut self, ids: &[ItemId]) -> StorageResult<()> {
        let cleaned = clean_id_set(ids.iter().copied());
        write_json(&self.file(IDS_FILE), &cleaned)
    }

    fn load_availability(&self) -> StorageResult<AvailabilityMap> {
        read_or_default(&self.file(AVAILABILITY_FILE))
    }

    fn save_availability(&mut self, availability: &AvailabilityMap) -> StorageResult<()> {
        write_json(&self.file(AVAILABILITY_FILE), availability)
    }

    fn load_titles(&self) -> StorageResult<TitleMap> {
        read_or_default(&self.file(TITLES_FILE))
    }

    fn save_titles(&mut self, titles: &TitleMap) -> StorageResult<()> {
        write_json(&self.file(TITLES_FILE), titles)
    }

    fn load_thumbnails(&self) -> StorageResult<ThumbnailMap> {
        read_or_default(&self.file(THUMBNAILS_FILE))
    }

    fn save_thumbnails(&mut self, thumbnails: &ThumbnailMap) -> StorageResult<()> {
        write_json(&self.file(THUMBNAILS_FILE), thumbnails)
    }

    fn load_runs(&self) -> StorageResult<Vec<PassReport>> {
        read_or_default(&self.file(RUNS_FILE))
    }

    fn append_run(&mut self, report: &PassReport) -> StorageResult<()> {
        let mut runs = self.load_runs()?;
        runs.push(report.clone());
        write_json(&self.file(RUNS_FILE), &runs)
    }
}

/// Reads a JSON document, treating a missing file as the empty value
fn read_or_default<T: DeserializeOwned + Default>(path: &Path) -> StorageResult<T> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(source) => {
            return Err(StorageError::Io {
                path: path.display().to_string(),
                source,
            })
        }
    };

    if content.trim().is_empty() {
        return Ok(T::default());
    }

    serde_json::from_str(&content).map_err(|source| StorageError::Json {
        path: path.display().to_string(),
        source,
    })
}

/// Writes a JSON document atomically
///
/// The document goes to a sibling temporary file which is synced and then
/// renamed over the target, so readers only ever see a complete document.
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> StorageResult<()> {
    let io_err = |source| StorageError::Io {
        path: path.display().to_string(),
        source,
    };

    let bytes = serde_json::to_vec(value).map_err(|source| StorageError::Json {
        path: path.display().to_string(),
        source,
    })?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let mut file = File::create(&tmp_path).map_err(io_err)?;
    file.write_all(&bytes).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    drop(file);

    fs::rename(&tmp_path, path).map_err(io_err)?;
    Ok(())
}
