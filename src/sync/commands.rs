use std::path::Path;

use clap::Args;
use colored::Colorize;
use comfy_table::Table;
use error_stack::{Report, ResultExt};

use crate::cover::load_cover;
use crate::dialoguer::Dialoguer;
use crate::history::file_store::FileLineStore;
use crate::history::TrackHistory;
use crate::playlists::load_playlists;
use crate::spotify::api::SpotifyClient;
use crate::sync::destination::PeriodGranularity;
use crate::sync::novelty::{FilterOrder, MergePolicy};
use crate::sync::orchestrator::{
    CategoryState, RunSummary, SyncContext, SyncOptions, SyncOrchestrator,
};
use crate::sync::provider::PlaylistProvider;
use crate::sync::recency::LookbackWindow;
use crate::sync::{SyncError, SyncResult};
use crate::user::User;
use crate::Suggestion;

#[derive(Args, Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncCli {
    /// Days back a track may have been added, asked interactively when absent
    #[clap(long, short)]
    pub days: Option<i64>,
    /// Create one destination playlist per year or per month
    #[clap(long, value_enum)]
    pub period: Option<PeriodGranularity>,
    /// Occurrence kept when several playlists share a track
    #[clap(long, value_enum)]
    pub merge: Option<MergePolicy>,
    /// Order of the history and date filters
    #[clap(long, value_enum, default_value_t = FilterOrder::NoveltyFirst)]
    pub filter_order: FilterOrder,
    /// Do not skip tracks already present in the destination playlist
    #[clap(long, action)]
    pub keep_destination_tracks: bool,
    /// Do not upload cover images to newly created playlists
    #[clap(long, action)]
    pub no_cover: bool,
}

pub struct SyncCommands;

impl SyncCommands {
    pub async fn execute(cli: SyncCli) -> SyncResult<()> {
        let mut user = User::new();
        user.read_config_file()
            .change_context(SyncError::Fatal)
            .attach(Suggestion("run `spotibot login` to store your credentials".to_string()))?;
        if !user.spotify_refresh_token.is_empty() {
            if let Err(error) = user.refresh_spotify_token().await {
                if user.spotify_access_token.is_empty() {
                    return Err(error.change_context(SyncError::Fatal));
                }
                log::warn!("Using the stored access token: {:?}", error);
            }
        }

        let client = SpotifyClient::new(user.spotify_access_token.clone());
        let spotify_user = client
            .current_user()
            .await
            .change_context(SyncError::Fatal)
            .attach_printable("Failed to read the current Spotify user")?;
        println!("SpotiBOT");
        println!(
            "Welcome {}",
            spotify_user
                .display_name
                .clone()
                .unwrap_or(spotify_user.id.clone())
                .green()
        );

        let categories = load_playlists(Path::new(&user.playlists_path))
            .change_context(SyncError::Fatal)
            .attach(Suggestion(
                "add lines like `https://open.spotify.com/playlist/<id> techno`".to_string(),
            ))?;

        let days = match cli.days {
            Some(days) => days,
            None => Dialoguer::lookback_days(user.lookback_days).change_context(SyncError::Fatal)?,
        };
        let options = SyncOptions {
            window: LookbackWindow::from_days(days),
            granularity: cli.period.unwrap_or(user.period),
            merge_policy: cli.merge.unwrap_or(user.merge_policy),
            filter_order: cli.filter_order,
            exclude_destination_tracks: user.exclude_destination_tracks
                && !cli.keep_destination_tracks,
            ..SyncOptions::default()
        };
        println!(
            "Looking for tracks added in the last {} days",
            options.window.days().to_string().cyan()
        );
        let context = SyncContext::new(spotify_user.id.clone(), options);
        let mut history = TrackHistory::new(FileLineStore::new(&user.data_path));

        let summary = SyncOrchestrator::new(&client, &mut history, context)
            .run(&categories)
            .await?;

        if !cli.no_cover {
            Self::upload_covers(&client, &summary, Path::new(&user.images_path)).await;
        }
        Self::print_summary(&summary);
        if summary.categories.len() == summary.failed_categories().len() {
            return Err(Report::new(SyncError::Transient).attach_printable("Every genre failed"));
        }
        Ok(())
    }

    async fn upload_covers<P: PlaylistProvider + ?Sized>(
        provider: &P,
        summary: &RunSummary,
        images_path: &Path,
    ) {
        for report in summary.categories.iter().filter(|report| report.created) {
            let Some(destination_id) = &report.destination_id else {
                continue;
            };
            let cover = match load_cover(images_path, &report.category) {
                Ok(Some(cover)) => cover,
                Ok(None) => {
                    log::warn!("No cover image found for genre {}", report.category);
                    continue;
                }
                Err(error) => {
                    log::warn!("Could not read the cover of {}: {:?}", report.category, error);
                    continue;
                }
            };
            match provider.set_collection_cover(destination_id, &cover).await {
                Ok(()) => println!("Cover set for {}", report.destination_name.green()),
                Err(error) => log::warn!(
                    "Could not upload the cover of {}: {:?}",
                    report.destination_name,
                    error
                ),
            }
        }
    }

    pub fn summary_table(summary: &RunSummary) -> Table {
        let mut table = Table::new();
        table.set_header(vec![
            "Genre",
            "Playlist",
            "Sources",
            "Candidates",
            "Added",
            "Failed",
            "Status",
        ]);
        for report in &summary.categories {
            let status = match (report.state, report.error) {
                (CategoryState::Failed, Some(error)) => format!("{} ({})", report.state, error),
                _ if report.created => format!("{} (created)", report.state),
                _ => report.state.to_string(),
            };
            table.add_row(vec![
                report.category.clone(),
                report.destination_name.clone(),
                format!(
                    "{}/{}",
                    report.sources_fetched,
                    report.sources_fetched + report.sources_failed
                ),
                report.candidates.to_string(),
                report.appended.to_string(),
                report.failed.to_string(),
                status,
            ]);
        }
        table
    }

    fn print_summary(summary: &RunSummary) {
        println!("\n{}", Self::summary_table(summary));
        println!(
            "\n{}: added {} tracks, {} genres failed",
            "Summary".green(),
            summary.appended().to_string().cyan(),
            summary.failed_categories().len().to_string().yellow()
        );
    }

    /// Prints how many tracks each followed playlist and the global
    /// registry already delivered.
    pub fn print_history() -> SyncResult<()> {
        let mut user = User::new();
        user.read_config_file().change_context(SyncError::Fatal)?;
        let categories =
            load_playlists(Path::new(&user.playlists_path)).change_context(SyncError::Fatal)?;
        let history = TrackHistory::new(FileLineStore::new(&user.data_path));

        let mut table = Table::new();
        table.set_header(vec!["Genre", "Playlist", "Delivered tracks"]);
        for category in &categories {
            for source in &category.sources {
                let delivered = history
                    .load_source_history(&source.key)
                    .change_context(SyncError::Persistence)?;
                table.add_row(vec![
                    category.label.clone(),
                    source.url.clone(),
                    delivered.len().to_string(),
                ]);
            }
        }
        let global = history
            .load_global_registry()
            .change_context(SyncError::Persistence)?;
        table.add_row(vec![
            "*".to_string(),
            "Global registry".to_string(),
            global.len().to_string(),
        ]);
        println!(
            "History stored in {}\n{}",
            history.store().root().display().to_string().cyan(),
            table
        );
        Ok(())
    }
}
