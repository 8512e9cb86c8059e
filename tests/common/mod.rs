//! In-process fakes of the VPN client, the address probe and the browser
//!
//! All fakes share one `Network`: connecting changes which region's catalog
//! the next browser session sees, and every interaction is recorded.

#![allow(dead_code)]

use async_trait::async_trait;
use catalog_atlas::catalog::{
    AvailabilityMap, CatalogInputs, Genre, ItemId, ItemRecord, Region, Thumbnail, ThumbnailMap,
    TitleMap,
};
use catalog_atlas::crawler::{Coordinator, PassReport};
use catalog_atlas::extract::{ExtractSettings, ListView};
use catalog_atlas::identity::{
    AddressProbe, IdentityController, IdentityError, IdentitySettings, VpnClient,
};
use catalog_atlas::reader::{CatalogSession, ReaderError, SessionLauncher};
use catalog_atlas::store::{JsonStore, Storage, StorageError, StorageResult};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const HOME_ADDRESS: &str = "203.0.113.7";
pub const HOME_REGION: &str = "home";
pub const GENRE: &str = "g1";
pub const SECOND_GENRE: &str = "g2";

/// Items rendered per load-more round
const PAGE_SIZE: usize = 2;

#[derive(Debug, Default)]
pub struct NetworkState {
    /// Region whose identity is active, `None` when at home
    pub active: Option<Region>,
    /// Regions whose identity never comes up
    pub unreachable: HashSet<Region>,
    /// Whether browser sessions fail to launch
    pub launch_fails: bool,
    /// Genres whose list view cannot be opened
    pub failing_genres: HashSet<String>,
    /// Region in which the address lookup stops working
    pub probe_fails_in: Option<Region>,
    /// Ids listed per region and genre, in page order
    pub listings: HashMap<(Region, String), Vec<ItemId>>,
    /// Genre menu entries per landing genre, as (id, label)
    pub genre_menus: HashMap<String, Vec<(String, String)>>,
    /// Detail records served by title pages
    pub titles: HashMap<ItemId, ItemRecord>,
    /// Thumbnails served by search, keyed by name
    pub thumbnails: HashMap<String, Thumbnail>,

    pub connect_requests: Vec<Region>,
    pub launches: usize,
    pub closes: usize,
    /// (region, genre id) of every genre opened
    pub genre_opens: Vec<(Option<Region>, String)>,
    pub menu_opens: Vec<String>,
    pub title_scrapes: Vec<ItemId>,
    pub thumbnail_scrapes: Vec<String>,
}

#[derive(Clone, Default)]
pub struct Network(pub Arc<Mutex<NetworkState>>);

impl Network {
    pub fn state(&self) -> std::sync::MutexGuard<'_, NetworkState> {
        self.0.lock().unwrap()
    }

    pub fn list(&self, region: &str, ids: &[ItemId]) {
        self.list_genre(region, GENRE, ids);
    }

    pub fn list_genre(&self, region: &str, genre: &str, ids: &[ItemId]) {
        self.state()
            .listings
            .insert((Region::from(region), genre.to_string()), ids.to_vec());
    }

    pub fn set_genre_failing(&self, genre: &str, failing: bool) {
        let mut state = self.state();
        if failing {
            state.failing_genres.insert(genre.to_string());
        } else {
            state.failing_genres.remove(genre);
        }
    }

    pub fn genre_menu(&self, landing_id: &str, entries: &[(&str, &str)]) {
        self.state().genre_menus.insert(
            landing_id.to_string(),
            entries
                .iter()
                .map(|(id, label)| (id.to_string(), label.to_string()))
                .collect(),
        );
    }

    pub fn title(&self, id: ItemId, name: Option<&str>) -> ItemRecord {
        let mut record = ItemRecord::new(id);
        record.name = name.map(str::to_string);
        self.state().titles.insert(id, record.clone());
        record
    }

    pub fn thumbnail(&self, name: &str, code: &str) {
        self.state().thumbnails.insert(
            name.to_string(),
            Thumbnail {
                code: code.to_string(),
                source: format!("https://img.example.com/{}.jpg", code),
            },
        );
    }

    pub fn set_unreachable(&self, region: &str, unreachable: bool) {
        let mut state = self.state();
        if unreachable {
            state.unreachable.insert(Region::from(region));
        } else {
            state.unreachable.remove(&Region::from(region));
        }
    }

    pub fn reset_log(&self) {
        let mut state = self.state();
        state.connect_requests.clear();
        state.launches = 0;
        state.closes = 0;
        state.genre_opens.clear();
        state.menu_opens.clear();
        state.title_scrapes.clear();
        state.thumbnail_scrapes.clear();
    }
}

pub struct FakeVpn(pub Network);

#[async_trait]
impl VpnClient for FakeVpn {
    async fn disconnect_all(&self) -> Result<(), IdentityError> {
        self.0.state().active = None;
        Ok(())
    }

    async fn connect(&self, region: &Region) -> Result<(), IdentityError> {
        let mut state = self.0.state();
        state.connect_requests.push(region.clone());
        if !state.unreachable.contains(region) {
            state.active = Some(region.clone());
        }
        Ok(())
    }
}

pub struct FakeProbe(pub Network);

#[async_trait]
impl AddressProbe for FakeProbe {
    async fn current_address(&self) -> Result<String, IdentityError> {
        let state = self.0.state();
        match &state.active {
            Some(region) if state.probe_fails_in.as_ref() == Some(region) => {
                Err(IdentityError::Probe("interface went away".to_string()))
            }
            Some(region) => Ok(format!("10.8.0.1-{}", region)),
            None => Ok(HOME_ADDRESS.to_string()),
        }
    }
}

pub struct FakeLauncher(pub Network);

#[async_trait]
impl SessionLauncher for FakeLauncher {
    type Session = FakeSession;

    async fn launch(&self) -> Result<FakeSession, ReaderError> {
        let mut state = self.0.state();
        if state.launch_fails {
            return Err(ReaderError::Launch("no browser".to_string()));
        }
        state.launches += 1;
        Ok(FakeSession {
            network: self.0.clone(),
            region: state.active.clone(),
            listing: Vec::new(),
            loaded_pages: 0,
        })
    }
}

pub struct FakeSession {
    network: Network,
    region: Option<Region>,
    listing: Vec<ItemId>,
    loaded_pages: usize,
}

impl FakeSession {
    fn page_count(&self) -> usize {
        self.listing.len().div_ceil(PAGE_SIZE)
    }
}

#[async_trait]
impl ListView for FakeSession {
    async fn rendered_ids(&mut self) -> Result<Vec<ItemId>, ReaderError> {
        let shown = (self.loaded_pages * PAGE_SIZE).min(self.listing.len());
        Ok(self.listing[..shown].to_vec())
    }

    async fn content_extent(&mut self) -> Result<u64, ReaderError> {
        Ok(self.loaded_pages as u64 * 100)
    }

    async fn trigger_load_more(&mut self) -> Result<(), ReaderError> {
        if self.loaded_pages < self.page_count() {
            self.loaded_pages += 1;
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogSession for FakeSession {
    async fn open_genre(&mut self, genre: &Genre) -> Result<(), ReaderError> {
        let mut state = self.network.state();
        state
            .genre_opens
            .push((self.region.clone(), genre.id.clone()));
        if state.failing_genres.contains(&genre.id) {
            return Err(ReaderError::Navigation {
                url: format!("browse/genre/{}", genre.id),
                message: "net::ERR_CONNECTION_RESET".to_string(),
            });
        }
        let key = (
            self.region
                .clone()
                .unwrap_or_else(|| Region::from(HOME_REGION)),
            genre.id.clone(),
        );
        self.listing = state.listings.get(&key).cloned().unwrap_or_default();
        self.loaded_pages = usize::from(!self.listing.is_empty());
        Ok(())
    }

    async fn scrape_genre_menu(
        &mut self,
        landing_id: &str,
        suffix: &str,
    ) -> Result<Vec<Genre>, ReaderError> {
        let mut state = self.network.state();
        state.menu_opens.push(landing_id.to_string());
        Ok(state
            .genre_menus
            .get(landing_id)
            .into_iter()
            .flatten()
            .map(|(id, label)| Genre {
                id: id.clone(),
                name: format!("{}{}", label, suffix),
            })
            .collect())
    }

    async fn scrape_title(&mut self, id: ItemId) -> Result<ItemRecord, ReaderError> {
        let mut state = self.network.state();
        state.title_scrapes.push(id);
        Ok(state
            .titles
            .get(&id)
            .cloned()
            .unwrap_or_else(|| ItemRecord::new(id)))
    }

    async fn scrape_thumbnail(&mut self, name: &str) -> Result<Option<Thumbnail>, ReaderError> {
        let mut state = self.network.state();
        state.thumbnail_scrapes.push(name.to_string());
        Ok(state.thumbnails.get(name).cloned())
    }

    async fn close(&mut self) -> Result<(), ReaderError> {
        self.network.state().closes += 1;
        Ok(())
    }
}

/// Store whose saves start failing after a number of successful ones
pub struct FlakyStore {
    pub inner: JsonStore,
    pub title_saves_left: usize,
    pub region_saves_left: usize,
}

impl FlakyStore {
    pub fn new(inner: JsonStore) -> Self {
        Self {
            inner,
            title_saves_left: usize::MAX,
            region_saves_left: usize::MAX,
        }
    }
}

fn disk_full(path: &str) -> StorageError {
    StorageError::Io {
        path: path.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
    }
}

impl Storage for FlakyStore {
    fn load_region_ids(&self, region: &Region) -> StorageResult<Vec<ItemId>> {
        self.inner.load_region_ids(region)
    }

    fn save_region_ids(&mut self, region: &Region, ids: &[ItemId]) -> StorageResult<()> {
        if self.region_saves_left == 0 {
            return Err(disk_full(&format!("region_ids/{}.json", region)));
        }
        self.region_saves_left -= 1;
        self.inner.save_region_ids(region, ids)
    }

    fn load_global_ids(&self) -> StorageResult<Vec<ItemId>> {
        self.inner.load_global_ids()
    }

    fn save_global_ids(&mut self, ids: &[ItemId]) -> StorageResult<()> {
        self.inner.save_global_ids(ids)
    }

    fn load_availability(&self) -> StorageResult<AvailabilityMap> {
        self.inner.load_availability()
    }

    fn save_availability(&mut self, availability: &AvailabilityMap) -> StorageResult<()> {
        self.inner.save_availability(availability)
    }

    fn load_titles(&self) -> StorageResult<TitleMap> {
        self.inner.load_titles()
    }

    fn save_titles(&mut self, titles: &TitleMap) -> StorageResult<()> {
        if self.title_saves_left == 0 {
            return Err(disk_full("titles.json"));
        }
        self.title_saves_left -= 1;
        self.inner.save_titles(titles)
    }

    fn load_thumbnails(&self) -> StorageResult<ThumbnailMap> {
        self.inner.load_thumbnails()
    }

    fn save_thumbnails(&mut self, thumbnails: &ThumbnailMap) -> StorageResult<()> {
        self.inner.save_thumbnails(thumbnails)
    }

    fn load_runs(&self) -> StorageResult<Vec<PassReport>> {
        self.inner.load_runs()
    }

    fn append_run(&mut self, report: &PassReport) -> StorageResult<()> {
        self.inner.append_run(report)
    }
}

pub fn create_inputs(regions: &[&str]) -> CatalogInputs {
    CatalogInputs {
        regions: regions.iter().map(|r| Region::from(*r)).collect(),
        genres: vec![
            Genre {
                id: GENRE.to_string(),
                name: "Dramas".to_string(),
            },
            Genre {
                id: SECOND_GENRE.to_string(),
                name: "Comedies".to_string(),
            },
        ],
        cookies: Vec::new(),
        unaltered_addresses: [HOME_ADDRESS.to_string()].into_iter().collect(),
    }
}

pub fn create_identity(network: &Network) -> IdentityController {
    IdentityController::new(
        Box::new(FakeVpn(network.clone())),
        Box::new(FakeProbe(network.clone())),
        [HOME_ADDRESS.to_string()].into_iter().collect(),
        IdentitySettings {
            home_region: Region::from(HOME_REGION),
            connect_attempts: 3,
            disconnect_attempts: 3,
            poll_interval: Duration::from_millis(1),
            settle_delay: Duration::from_millis(1),
        },
    )
}

pub fn create_extract_settings() -> ExtractSettings {
    ExtractSettings {
        load_timeout: Duration::from_millis(20),
        poll_interval: Duration::from_millis(1),
        scroll_delay: Duration::ZERO,
        max_rounds: 100,
    }
}

pub fn create_coordinator<S: Storage>(
    network: &Network,
    regions: &[&str],
    store: S,
) -> Coordinator<S, FakeLauncher> {
    Coordinator::new(
        create_inputs(regions),
        create_identity(network),
        FakeLauncher(network.clone()),
        store,
        create_extract_settings(),
    )
}
