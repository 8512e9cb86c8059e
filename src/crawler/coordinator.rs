//! Crawl coordinator - pass orchestration logic
//!
//! This module composes the identity controller, the list extractor, the
//! page reader and the store into the three acquisition passes. Every pass
//! walks the regions in input order, one identity and one browser session at
//! a time, and flushes each acquired unit before moving on.

use crate::catalog::{CatalogInputs, Genre, ItemId, ItemRecord, Region, ThumbnailMap, TitleMap};
use crate::crawler::PassReport;
use crate::extract::ExtractSettings;
use crate::identity::IdentityController;
use crate::reader::{self, scrape_ids, CatalogSession, SessionLauncher};
use crate::state::{PassKind, PassState};
use crate::store::{merge_availability, missing_against, union_id_sets, Storage};
use crate::{CatalogError, Result};
use std::collections::{BTreeSet, HashSet};

/// Main crawl coordinator structure
pub struct Coordinator<S: Storage, L: SessionLauncher> {
    inputs: CatalogInputs,
    identity: IdentityController,
    launcher: L,
    store: S,
    extract: ExtractSettings,
    state: PassState,
    selected: Option<Vec<Region>>,
}

impl<S: Storage, L: SessionLauncher> Coordinator<S, L> {
    pub fn new(
        inputs: CatalogInputs,
        identity: IdentityController,
        launcher: L,
        store: S,
        extract: ExtractSettings,
    ) -> Self {
        Self {
            inputs,
            identity,
            launcher,
            store,
            extract,
            state: PassState::PendingRegion,
            selected: None,
        }
    }

    /// Restricts the passes to the named regions
    ///
    /// The regions are still visited in input order. Aggregates are always
    /// rebuilt over every input region.
    ///
    /// # Arguments
    ///
    /// * `names` - Region names to visit; empty means every input region
    ///
    /// # Errors
    ///
    /// `CatalogError::UnknownRegion` when a name is not in the regions input.
    pub fn with_regions(mut self, names: &[String]) -> Result<Self> {
        if names.is_empty() {
            self.selected = None;
            return Ok(self);
        }

        if let Some(unknown) = names
            .iter()
            .find(|name| !self.inputs.regions.iter().any(|r| r.as_str() == name.as_str()))
        {
            return Err(CatalogError::UnknownRegion(unknown.clone()));
        }

        let selected = self
            .inputs
            .regions
            .iter()
            .filter(|region| names.iter().any(|name| name == region.as_str()))
            .cloned()
            .collect();
        self.selected = Some(selected);
        Ok(self)
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs one pass and appends its report to the pass journal
    ///
    /// # Arguments
    ///
    /// * `pass` - Which pass to run
    ///
    /// # Returns
    ///
    /// * `Ok(PassReport)` - The pass finished; the report is also journaled
    /// * `Err(CatalogError)` - The pass was aborted
    ///
    /// # Errors
    ///
    /// Persistence failures and an unusable address probe abort the pass.
    /// Everything flushed before the failure stays on disk, and any regional
    /// identity is released before the error is returned.
    pub async fn run(&mut self, pass: PassKind) -> Result<PassReport> {
        tracing::info!("Starting {} pass", pass);
        self.state = PassState::PendingRegion;
        let mut report = PassReport::start(pass);

        let result = match pass {
            PassKind::Ids => self.acquire_ids(&mut report).await,
            PassKind::Titles => self.acquire_titles(&mut report).await,
            PassKind::Thumbnails => self.acquire_thumbnails(&mut report).await,
        };

        if let Err(e) = result {
            tracing::error!("{} pass aborted: {}", pass, e);
            self.identity.release().await;
            return Err(e);
        }

        self.transition(PassState::Done)?;
        report.finish();
        self.store.append_run(&report)?;
        tracing::info!("{}", report);
        Ok(report)
    }

    /// Runs the ids, titles and thumbnails passes in order
    pub async fn run_all(&mut self) -> Result<Vec<PassReport>> {
        let mut reports = Vec::with_capacity(3);
        for pass in PassKind::all() {
            reports.push(self.run(pass).await?);
        }
        Ok(reports)
    }

    /// Discovers the catalog's genres from the home region
    ///
    /// The discovered genres replace the ones the coordinator was built
    /// with, so a following ids pass enumerates them.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Genre>)` - Genres in menu order, possibly empty
    /// * `Err(CatalogError)` - The address probe or the browser failed
    pub async fn discover_genres(&mut self) -> Result<Vec<Genre>> {
        self.identity.disconnect().await?;

        let mut session = self.launcher.launch().await?;
        let result = reader::discover_genres(&mut session).await;
        self.close_session(&mut session).await;
        let genres = result?;

        tracing::info!("Discovered {} genres", genres.len());
        self.inputs.genres = genres.clone();
        Ok(genres)
    }

    /// Enumerates every region's ids, then rebuilds the aggregates
    async fn acquire_ids(&mut self, report: &mut PassReport) -> Result<()> {
        if self.inputs.genres.is_empty() {
            return Err(CatalogError::NoGenres);
        }

        for region in self.regions() {
            self.transition(PassState::PendingRegion)?;

            let Some(mut session) = self.open_region(&region, report).await? else {
                continue;
            };

            let result = self.scrape_region_ids(&mut session, &region, report).await;
            self.close_session(&mut session).await;
            result?;

            self.transition(PassState::NextRegion)?;
        }

        self.rebuild_aggregates()?;
        self.identity.disconnect().await?;
        Ok(())
    }

    /// Runs the extractor over every genre and folds the results into the
    /// region's snapshot
    async fn scrape_region_ids(
        &mut self,
        session: &mut L::Session,
        region: &Region,
        report: &mut PassReport,
    ) -> Result<()> {
        self.transition(PassState::Extracting)?;

        let mut scraped: BTreeSet<ItemId> = BTreeSet::new();
        let mut failed_genres = 0;
        for genre in &self.inputs.genres {
            match scrape_ids(session, genre, &self.extract).await {
                Ok(ids) => {
                    tracing::debug!("Genre {} lists {} ids in {}", genre.name, ids.len(), region);
                    scraped.extend(ids);
                }
                Err(e) => {
                    tracing::warn!("Failed to scrape genre {} in {}: {}", genre.name, region, e);
                    failed_genres += 1;
                }
            }
        }

        if failed_genres == self.inputs.genres.len() {
            tracing::warn!("No genre could be read in {}, skipping", region);
            report.regions_skipped += 1;
            self.transition(PassState::NextRegion)?;
            return Ok(());
        }

        self.transition(PassState::Persisting)?;
        let known = self.store.load_region_ids(region)?;
        let fresh: Vec<ItemId> = scraped.into_iter().collect();
        let merged = union_id_sets(&known, &fresh);
        self.store.save_region_ids(region, &merged)?;

        let added = (merged.len() - known.len()) as u64;
        tracing::info!("{}: {} ids ({} new)", region, merged.len(), added);
        report.acquired += added;
        report.regions_visited += 1;
        Ok(())
    }

    /// Scrapes a detail record for every id without one
    async fn acquire_titles(&mut self, report: &mut PassReport) -> Result<()> {
        let mut titles = self.store.load_titles()?;

        for region in self.regions() {
            self.transition(PassState::PendingRegion)?;

            let ids = self.store.load_region_ids(&region)?;
            let missing = missing_against(&ids, &titles);
            if missing.is_empty() {
                tracing::info!("No missing titles in {}", region);
                report.regions_up_to_date += 1;
                self.transition(PassState::NextRegion)?;
                continue;
            }
            tracing::info!("Acquiring {} missing titles from {}...", missing.len(), region);

            let Some(mut session) = self.open_region(&region, report).await? else {
                continue;
            };

            let result = self
                .scrape_titles(&mut session, &missing, &mut titles, report)
                .await;
            self.close_session(&mut session).await;
            result?;

            report.regions_visited += 1;
            self.transition(PassState::NextRegion)?;
        }

        self.identity.disconnect().await?;
        Ok(())
    }

    async fn scrape_titles(
        &mut self,
        session: &mut L::Session,
        missing: &[ItemId],
        titles: &mut TitleMap,
        report: &mut PassReport,
    ) -> Result<()> {
        for &id in missing {
            // Acquired from an earlier region in this pass
            if titles.contains_key(&id) {
                continue;
            }

            self.transition(PassState::Extracting)?;
            let record = match session.scrape_title(id).await {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!("Failed to scrape title {}: {}", id, e);
                    report.failed += 1;
                    continue;
                }
            };

            self.transition(PassState::Persisting)?;
            if record.name().is_none() {
                tracing::debug!("Title {} has no name, storing partial record", id);
            }
            titles
                .entry(id)
                .or_insert_with(|| ItemRecord::new(id))
                .merge_from(record);
            self.store.save_titles(titles)?;
            report.acquired += 1;
        }
        Ok(())
    }

    /// Looks up a thumbnail for every titled id without one
    async fn acquire_thumbnails(&mut self, report: &mut PassReport) -> Result<()> {
        let titles = self.store.load_titles()?;
        let mut thumbnails = self.store.load_thumbnails()?;
        let mut nameless: HashSet<ItemId> = HashSet::new();

        for region in self.regions() {
            self.transition(PassState::PendingRegion)?;

            let ids = self.store.load_region_ids(&region)?;
            let actionable: Vec<(ItemId, String)> = missing_against(&ids, &thumbnails)
                .into_iter()
                .filter_map(|id| match titles.get(&id).and_then(ItemRecord::name) {
                    Some(name) => Some((id, name.to_string())),
                    None => {
                        nameless.insert(id);
                        None
                    }
                })
                .collect();

            if actionable.is_empty() {
                tracing::info!("No missing thumbnails in {}", region);
                report.regions_up_to_date += 1;
                self.transition(PassState::NextRegion)?;
                continue;
            }
            tracing::info!(
                "Acquiring {} missing thumbnails from {}...",
                actionable.len(),
                region
            );

            let Some(mut session) = self.open_region(&region, report).await? else {
                continue;
            };

            let result = self
                .scrape_thumbnails(&mut session, &actionable, &mut thumbnails, report)
                .await;
            self.close_session(&mut session).await;
            result?;

            report.regions_visited += 1;
            self.transition(PassState::NextRegion)?;
        }

        report.skipped = nameless.len() as u64;
        if !nameless.is_empty() {
            tracing::info!("{} ids have no title name yet, thumbnails skipped", nameless.len());
        }

        self.identity.disconnect().await?;
        Ok(())
    }

    async fn scrape_thumbnails(
        &mut self,
        session: &mut L::Session,
        actionable: &[(ItemId, String)],
        thumbnails: &mut ThumbnailMap,
        report: &mut PassReport,
    ) -> Result<()> {
        for (id, name) in actionable {
            if thumbnails.contains_key(id) {
                continue;
            }

            self.transition(PassState::Extracting)?;
            let thumbnail = match session.scrape_thumbnail(name).await {
                Ok(Some(thumbnail)) => thumbnail,
                Ok(None) => {
                    tracing::warn!("No thumbnail found for {} ({})", name, id);
                    report.failed += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Failed to scrape thumbnail for {} ({}): {}", name, id, e);
                    report.failed += 1;
                    continue;
                }
            };

            self.transition(PassState::Persisting)?;
            thumbnails.insert(*id, thumbnail);
            self.store.save_thumbnails(thumbnails)?;
            report.acquired += 1;
        }
        Ok(())
    }

    /// Rebuilds the global id set and the availability map
    ///
    /// Both are derived from every input region's snapshot, whatever subset
    /// of regions the pass visited. The global id set keeps ids it already
    /// holds.
    pub fn rebuild_aggregates(&mut self) -> Result<()> {
        let mut region_sets = Vec::with_capacity(self.inputs.regions.len());
        for region in &self.inputs.regions {
            region_sets.push((region, self.store.load_region_ids(region)?));
        }

        let fresh: Vec<ItemId> = region_sets
            .iter()
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect();
        let known = self.store.load_global_ids()?;
        let global = union_id_sets(&known, &fresh);

        let availability = merge_availability(
            region_sets
                .iter()
                .map(|(region, ids)| (*region, ids.as_slice())),
        );

        self.store.save_global_ids(&global)?;
        self.store.save_availability(&availability)?;
        tracing::info!(
            "Aggregates rebuilt: {} ids across {} regions",
            global.len(),
            region_sets.len()
        );
        Ok(())
    }

    /// Connects to `region` and opens a session there
    ///
    /// Returns `None` when the region is skipped, which leaves the pass in
    /// `NextRegion`.
    async fn open_region(
        &mut self,
        region: &Region,
        report: &mut PassReport,
    ) -> Result<Option<L::Session>> {
        self.transition(PassState::Connecting)?;
        if !self.identity.connect(region).await? {
            tracing::warn!("Skipping {}: connection failed", region);
            report.regions_skipped += 1;
            self.transition(PassState::NextRegion)?;
            return Ok(None);
        }
        self.transition(PassState::Connected)?;

        match self.launcher.launch().await {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!("Skipping {}: {}", region, e);
                report.regions_skipped += 1;
                self.transition(PassState::NextRegion)?;
                Ok(None)
            }
        }
    }

    async fn close_session(&self, session: &mut L::Session) {
        if let Err(e) = session.close().await {
            tracing::warn!("Failed to close browser session: {}", e);
        }
    }

    fn regions(&self) -> Vec<Region> {
        self.selected
            .clone()
            .unwrap_or_else(|| self.inputs.regions.clone())
    }

    fn transition(&mut self, next: PassState) -> Result<()> {
        if next == self.state {
            return Ok(());
        }
        if !self.state.can_transition_to(next) {
            return Err(CatalogError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!("{} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }
}

impl<S: Storage, L: SessionLauncher> std::fmt::Debug for Coordinator<S, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("regions", &self.inputs.regions)
            .field("selected", &self.selected)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
