use std::fmt;

use clap::{Parser, Subcommand};
use colored::Colorize;
use error_stack::fmt::{Charset, ColorMode};
use error_stack::{Report, ResultExt};

use crate::dialoguer::Dialoguer;
use crate::sync::commands::{SyncCli, SyncCommands};
use crate::user::User;

mod config;
mod cover;
mod dialoguer;
mod history;
mod playlists;
mod spotify;
mod sync;
mod user;

#[derive(Debug)]
pub struct SpotibotError;
impl fmt::Display for SpotibotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SpotiBOT error")
    }
}
impl std::error::Error for SpotibotError {}

pub type SpotibotResult<T> = error_stack::Result<T, SpotibotError>;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "SpotiBOT")]
struct Cli {
    #[command(subcommand)]
    command: SpotibotCommands,
}

/// Feeds per-genre playlists with the newest tracks of the playlists you follow
#[derive(Subcommand, Debug, PartialEq, Clone)]
enum SpotibotCommands {
    /// Stores the Spotify credentials
    Login,
    /// Reads the current config file
    Config,
    /// Adds the new tracks of every followed playlist to its genre playlist
    Sync(SyncCli),
    /// Shows how many tracks were already delivered per playlist
    History,
}

impl SpotibotCommands {
    pub async fn execute(&self) -> SpotibotResult<()> {
        match self {
            SpotibotCommands::Login => {
                let mut user = User::new();
                if User::config_file_exists().change_context(SpotibotError)? {
                    if let Err(error) = user.read_config_file() {
                        log::warn!("Ignoring the current config file: {:?}", error);
                    }
                }
                user.spotify_client_id = Dialoguer::input("Spotify client id: ".to_string())
                    .change_context(SpotibotError)?;
                user.spotify_client_secret =
                    Dialoguer::password("Spotify client secret (optional): ".to_string())
                        .change_context(SpotibotError)?;
                user.spotify_refresh_token =
                    Dialoguer::password("Spotify refresh token: ".to_string())
                        .change_context(SpotibotError)?;
                if user.spotify_refresh_token.is_empty() {
                    user.spotify_access_token =
                        Dialoguer::password("Spotify access token: ".to_string())
                            .change_context(SpotibotError)?;
                }
                user.save_config_file().change_context(SpotibotError)?;
                println!(
                    "Spotify credentials successfully stored in {}",
                    User::get_config_file_path()
                        .change_context(SpotibotError)?
                        .display()
                        .to_string()
                        .green()
                );
                Ok(())
            }
            SpotibotCommands::Config => {
                let mut user = User::new();
                user.read_config_file().change_context(SpotibotError)?;
                println!("Current config:\n{:#?}", user);
                Ok(())
            }
            SpotibotCommands::Sync(cli) => SyncCommands::execute(cli.clone())
                .await
                .change_context(SpotibotError),
            SpotibotCommands::History => {
                SyncCommands::print_history().change_context(SpotibotError)
            }
        }
    }
}

pub struct Suggestion(pub String);

impl Suggestion {
    pub fn set_report() {
        Report::set_charset(Charset::Utf8);
        Report::set_color_mode(ColorMode::Color);
        Report::install_debug_hook::<Self>(|Self(value), context| {
            context.push_body(format!("{}: {value}", "suggestion".yellow()))
        });
    }
}

async fn run() -> SpotibotResult<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    Suggestion::set_report();

    cli.command.execute().await?;

    println!("\n{}", "Done.".green());
    Ok(())
}

#[tokio::main]
async fn main() -> SpotibotResult<()> {
    run().await
}
