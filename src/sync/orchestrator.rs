use std::collections::HashSet;

use chrono::{DateTime, Utc};
use colored::Colorize;
use error_stack::{Report, ResultExt};

use crate::config::AppConfig;
use crate::history::{LineStore, TrackHistory};
use crate::sync::batch::append_in_batches;
use crate::sync::destination::{
    destination_name, resolve_destination, Destination, Period, PeriodGranularity,
};
use crate::sync::novelty::{dedupe_within_batch, exclude_seen, FilterOrder, MergePolicy};
use crate::sync::provider::PlaylistProvider;
use crate::sync::recency::{select_recent, LookbackWindow};
use crate::sync::track::{Category, SourcePlaylist, TrackId, TrackRef};
use crate::sync::{SyncError, SyncResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub window: LookbackWindow,
    pub granularity: PeriodGranularity,
    pub merge_policy: MergePolicy,
    pub filter_order: FilterOrder,
    /// Also skip tracks the destination playlist already holds.
    pub exclude_destination_tracks: bool,
    pub batch_size: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            window: LookbackWindow::default(),
            granularity: PeriodGranularity::default(),
            merge_policy: MergePolicy::default(),
            filter_order: FilterOrder::default(),
            exclude_destination_tracks: true,
            batch_size: AppConfig::BATCH_SIZE,
        }
    }
}

/// Everything a run needs to know about its caller. Built once before the
/// run and dropped with it.
#[derive(Debug, Clone)]
pub struct SyncContext {
    pub owner_id: String,
    pub now: DateTime<Utc>,
    pub options: SyncOptions,
}

impl SyncContext {
    pub fn new(owner_id: impl Into<String>, options: SyncOptions) -> Self {
        Self {
            owner_id: owner_id.into(),
            now: Utc::now(),
            options,
        }
    }

    pub fn period(&self) -> Period {
        Period::current(self.options.granularity, self.now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum CategoryState {
    Fetching,
    Filtering,
    Deduping,
    Appending,
    Persisting,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryReport {
    pub category: String,
    pub destination_name: String,
    pub destination_id: Option<String>,
    pub created: bool,
    pub sources_fetched: usize,
    pub sources_failed: usize,
    pub candidates: usize,
    pub appended: usize,
    pub failed: usize,
    pub state: CategoryState,
    pub error: Option<SyncError>,
}

impl CategoryReport {
    fn new(category: &str, destination_name: String) -> Self {
        Self {
            category: category.to_string(),
            destination_name,
            destination_id: None,
            created: false,
            sources_fetched: 0,
            sources_failed: 0,
            candidates: 0,
            appended: 0,
            failed: 0,
            state: CategoryState::Fetching,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub categories: Vec<CategoryReport>,
}

impl RunSummary {
    pub fn appended(&self) -> usize {
        self.categories.iter().map(|report| report.appended).sum()
    }

    pub fn failed_categories(&self) -> Vec<&CategoryReport> {
        self.categories
            .iter()
            .filter(|report| report.state == CategoryState::Failed)
            .collect()
    }
}

/// Surviving tracks of one source after its own filters.
struct SourceCandidates {
    key: String,
    tracks: Vec<TrackRef>,
}

pub struct SyncOrchestrator<'a, P: PlaylistProvider + ?Sized, S: LineStore> {
    provider: &'a P,
    history: &'a mut TrackHistory<S>,
    context: SyncContext,
}

impl<'a, P: PlaylistProvider + ?Sized, S: LineStore> SyncOrchestrator<'a, P, S> {
    pub fn new(provider: &'a P, history: &'a mut TrackHistory<S>, context: SyncContext) -> Self {
        Self {
            provider,
            history,
            context,
        }
    }

    /// Syncs every category in order. A failed category is reported and the
    /// next one still runs; only an empty category list fails the run.
    pub async fn run(&mut self, categories: &[Category]) -> SyncResult<RunSummary> {
        if categories.is_empty() {
            return Err(Report::new(SyncError::Fatal).attach_printable("No categories to sync"));
        }
        let mut summary = RunSummary::default();
        for category in categories {
            println!("\nProcessing genre: {}", category.label.cyan());
            summary.categories.push(self.sync_category(category).await);
        }
        Ok(summary)
    }

    pub async fn sync_category(&mut self, category: &Category) -> CategoryReport {
        let name = destination_name(&category.label, self.context.period());
        let mut report = CategoryReport::new(&category.label, name);
        match self.run_category(category, &mut report).await {
            Ok(()) => Self::enter(&mut report, CategoryState::Done),
            Err(error) => {
                log::error!(
                    "Genre {} failed while {}: {:?}",
                    category.label,
                    report.state,
                    error
                );
                report.error = Some(*error.current_context());
                Self::enter(&mut report, CategoryState::Failed);
            }
        }
        report
    }

    async fn run_category(
        &mut self,
        category: &Category,
        report: &mut CategoryReport,
    ) -> SyncResult<()> {
        let fetched = self.fetch_sources(category, report).await?;

        Self::enter(report, CategoryState::Filtering);
        let mut per_source: Vec<SourceCandidates> = vec![];
        for (source, tracks) in fetched {
            let seen = self
                .history
                .load_source_history(&source.key)
                .change_context(SyncError::Persistence)?;
            let tracks = self.filter_source(tracks, &seen);
            log::info!(
                "{} new recent tracks in playlist {}",
                tracks.len(),
                source.url
            );
            match per_source.iter_mut().find(|other| other.key == source.key) {
                Some(other) => other.tracks.extend(tracks),
                None => per_source.push(SourceCandidates {
                    key: source.key.clone(),
                    tracks,
                }),
            }
        }

        Self::enter(report, CategoryState::Deduping);
        let global = self
            .history
            .load_global_registry()
            .change_context(SyncError::Persistence)?;
        let merged: Vec<TrackRef> = per_source
            .iter()
            .flat_map(|source| source.tracks.iter().cloned())
            .collect();
        let candidates = dedupe_within_batch(
            exclude_seen(merged, &global),
            self.context.options.merge_policy,
        );

        Self::enter(report, CategoryState::Appending);
        if candidates.is_empty() {
            println!("No new tracks found for {}", report.destination_name.yellow());
            return Ok(());
        }
        let (destination, existing_ids) = self.lookup_destination(category).await?;
        let candidates = exclude_seen(candidates, &existing_ids);
        report.candidates = candidates.len();
        if candidates.is_empty() {
            println!(
                "Every new track is already in {}",
                report.destination_name.yellow()
            );
            return Ok(());
        }
        let destination_id = self.obtain_destination(destination, report).await?;
        let ids: Vec<TrackId> = candidates.into_iter().map(|track| track.id).collect();
        let outcome = append_in_batches(
            self.provider,
            &destination_id,
            &ids,
            self.context.options.batch_size,
        )
        .await;
        report.appended = outcome.appended.len();
        report.failed = outcome.failed.len();
        if outcome.all_failed() {
            return Err(Report::new(SyncError::Transient).attach_printable(format!(
                "Every batch for {} failed",
                report.destination_name
            )));
        }

        Self::enter(report, CategoryState::Persisting);
        self.persist(&per_source, &outcome.appended)?;
        println!(
            "Added {} tracks to {}",
            report.appended.to_string().green(),
            report.destination_name.green()
        );
        Ok(())
    }

    async fn fetch_sources<'c>(
        &self,
        category: &'c Category,
        report: &mut CategoryReport,
    ) -> SyncResult<Vec<(&'c SourcePlaylist, Vec<TrackRef>)>> {
        let mut fetched = vec![];
        for source in &category.sources {
            println!("Processing playlist: {}", source.url.clone().cyan());
            match self.provider.list_source_tracks(source).await {
                Ok(tracks) => {
                    report.sources_fetched += 1;
                    fetched.push((source, tracks));
                }
                Err(error) => {
                    report.sources_failed += 1;
                    log::warn!("Skipping playlist {}: {:?}", source.url, error);
                }
            }
        }
        if fetched.is_empty() && !category.sources.is_empty() {
            return Err(Report::new(SyncError::Transient)
                .attach_printable(format!("No playlist of {} could be fetched", category.label)));
        }
        Ok(fetched)
    }

    fn filter_source(&self, tracks: Vec<TrackRef>, seen: &HashSet<TrackId>) -> Vec<TrackRef> {
        let window = self.context.options.window;
        let now = self.context.now;
        match self.context.options.filter_order {
            FilterOrder::NoveltyFirst => select_recent(exclude_seen(tracks, seen), window, now),
            FilterOrder::RecencyFirst => exclude_seen(select_recent(tracks, window, now), seen),
        }
    }

    /// Resolves the destination and, when it already exists and the options
    /// ask for it, the ids it holds.
    async fn lookup_destination(
        &self,
        category: &Category,
    ) -> SyncResult<(Destination, HashSet<TrackId>)> {
        let collections = self
            .provider
            .list_owner_collections()
            .await
            .attach_printable("Failed to list the user playlists")?;
        let destination = resolve_destination(&category.label, self.context.period(), &collections);
        log::debug!("{} resolves to {:?}", category.label, destination.name());
        let mut existing_ids = HashSet::new();
        if let Destination::Existing { id, name } = &destination {
            if self.context.options.exclude_destination_tracks {
                match self.provider.list_collection_track_ids(id).await {
                    Ok(ids) => existing_ids.extend(ids),
                    Err(error) => {
                        log::warn!("Could not read the tracks of {}: {:?}", name, error)
                    }
                }
            }
        }
        Ok((destination, existing_ids))
    }

    async fn obtain_destination(
        &self,
        destination: Destination,
        report: &mut CategoryReport,
    ) -> SyncResult<String> {
        let id = match destination {
            Destination::Existing { id, name } => {
                log::info!("Found playlist {} ({})", name, id);
                id
            }
            Destination::Create { name, description } => {
                println!("Creating playlist {}", name.clone().cyan());
                let id = self
                    .provider
                    .create_collection(&self.context.owner_id, &name)
                    .await
                    .attach_printable_lazy(|| format!("Failed to create playlist {}", name))?;
                if let Err(error) = self
                    .provider
                    .set_collection_description(&id, &description)
                    .await
                {
                    log::warn!("Could not set the description of {}: {:?}", name, error);
                }
                report.created = true;
                id
            }
        };
        report.destination_id = Some(id.clone());
        Ok(id)
    }

    fn persist(&mut self, per_source: &[SourceCandidates], appended: &[TrackId]) -> SyncResult<()> {
        self.history
            .append_global_registry(appended)
            .change_context(SyncError::Persistence)?;
        for source in per_source {
            let contributed: HashSet<&TrackId> =
                source.tracks.iter().map(|track| &track.id).collect();
            let ids: Vec<TrackId> = appended
                .iter()
                .filter(|id| contributed.contains(id))
                .cloned()
                .collect();
            if ids.is_empty() {
                continue;
            }
            self.history
                .append_source_history(&source.key, &ids)
                .change_context(SyncError::Persistence)?;
        }
        Ok(())
    }

    fn enter(report: &mut CategoryReport, state: CategoryState) {
        log::debug!("{}: {} -> {}", report.category, report.state, state);
        report.state = state;
    }
}
