use std::path::{Path, PathBuf};
use std::{env, fmt, fs};

use base64::{engine::general_purpose, Engine as _};
use colored::Colorize;
use error_stack::{IntoReport, Report, ResultExt};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::sync::destination::PeriodGranularity;
use crate::sync::novelty::MergePolicy;

#[derive(Debug, Clone)]
pub struct UserError;
impl fmt::Display for UserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("User config error")
    }
}
impl std::error::Error for UserError {}

pub type UserResult<T> = error_stack::Result<T, UserError>;

fn default_data_path() -> String {
    "data".to_string()
}

fn default_playlists_path() -> String {
    "playlists.txt".to_string()
}

fn default_images_path() -> String {
    "images".to_string()
}

fn default_lookback_days() -> i64 {
    AppConfig::DEFAULT_LOOKBACK_DAYS
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct User {
    pub spotify_client_id: String,
    #[serde(default)]
    pub spotify_client_secret: String,
    #[serde(default)]
    pub spotify_access_token: String,
    #[serde(default)]
    pub spotify_refresh_token: String,
    /// Directory holding the per-playlist histories and the global registry.
    #[serde(default = "default_data_path")]
    pub data_path: String,
    #[serde(default = "default_playlists_path")]
    pub playlists_path: String,
    #[serde(default = "default_images_path")]
    pub images_path: String,
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,
    #[serde(default)]
    pub period: PeriodGranularity,
    #[serde(default)]
    pub merge_policy: MergePolicy,
    #[serde(default = "default_true")]
    pub exclude_destination_tracks: bool,
}

impl Default for User {
    fn default() -> Self {
        Self {
            spotify_client_id: "".to_string(),
            spotify_client_secret: "".to_string(),
            spotify_access_token: "".to_string(),
            spotify_refresh_token: "".to_string(),
            data_path: default_data_path(),
            playlists_path: default_playlists_path(),
            images_path: default_images_path(),
            lookback_days: default_lookback_days(),
            period: PeriodGranularity::default(),
            merge_policy: MergePolicy::default(),
            exclude_destination_tracks: true,
        }
    }
}

impl User {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_config_file(&mut self) -> UserResult<()> {
        let config_path = Self::get_config_file_path()?;
        self.read_config_file_at(&config_path)
    }

    pub fn read_config_file_at(&mut self, config_path: &Path) -> UserResult<()> {
        if !config_path.exists() {
            return Err(Report::new(UserError).attach_printable(format!(
                "Config file not found at: {}. Please run `spotibot login` first.",
                config_path.display()
            )));
        }
        log::info!("Reading config file from: {}", config_path.display());
        let config_content = fs::read_to_string(config_path)
            .into_report()
            .attach_printable(format!(
                "Failed to read config file at {}",
                config_path.display()
            ))
            .change_context(UserError)?;
        let config: User = serde_json::from_str(&config_content)
            .into_report()
            .attach_printable("Failed to parse the config file. Ensure it is valid JSON.")
            .change_context(UserError)?;

        if config.spotify_client_id.is_empty()
            || (config.spotify_access_token.is_empty() && config.spotify_refresh_token.is_empty())
        {
            return Err(Report::new(UserError).attach_printable(format!(
                "Config file is incomplete. A client id and an access or refresh token are required in {}",
                config_path.display()
            )));
        }
        self.clone_from(&config);
        Ok(())
    }

    pub fn save_config_file(&self) -> UserResult<()> {
        let config_path = Self::get_config_file_path()?;
        self.save_config_file_at(&config_path)
    }

    pub fn save_config_file_at(&self, config_path: &Path) -> UserResult<()> {
        log::info!("Saving config file to: {}", config_path.display());
        let serialized = serde_json::to_string_pretty(self)
            .into_report()
            .attach_printable("Failed to serialize the user configuration to JSON")
            .change_context(UserError)?;
        if let Some(folder_path) = config_path.parent() {
            if !folder_path.as_os_str().is_empty() && !folder_path.exists() {
                fs::create_dir_all(folder_path)
                    .into_report()
                    .attach_printable(format!(
                        "Failed to create directory at {}",
                        folder_path.display()
                    ))
                    .change_context(UserError)?;
            }
        }
        fs::write(config_path, serialized)
            .into_report()
            .attach_printable(format!(
                "Failed to write config file at {}",
                config_path.display()
            ))
            .change_context(UserError)?;
        Ok(())
    }

    /// `$SPOTIBOT_CONFIG` when set, `~/.spotibot_config/config.json` otherwise.
    pub fn get_config_file_path() -> UserResult<PathBuf> {
        if let Ok(path) = env::var(AppConfig::CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }
        dirs::home_dir()
            .ok_or(UserError)
            .into_report()
            .attach_printable("Failed to retrieve the home directory")
            .map(|home_path| home_path.join(AppConfig::CONFIG_FOLDER).join("config.json"))
    }

    pub fn config_file_exists() -> UserResult<bool> {
        Ok(Self::get_config_file_path()?.exists())
    }

    /// Exchanges the stored refresh token for a new access token and
    /// persists it.
    pub async fn refresh_spotify_token(&mut self) -> UserResult<()> {
        if self.spotify_refresh_token.is_empty() {
            return Err(Report::new(UserError)
                .attach_printable("No refresh token available. Please run `spotibot login` again."));
        }
        println!("Refreshing the Spotify access token...");

        let client = reqwest::Client::new();
        let mut params = vec![
            ("grant_type", "refresh_token".to_string()),
            ("refresh_token", self.spotify_refresh_token.clone()),
        ];
        let mut request = client.post(AppConfig::SPOTIFY_TOKEN_URL);
        if self.spotify_client_secret.is_empty() {
            params.push(("client_id", self.spotify_client_id.clone()));
        } else {
            let auth_string = format!("{}:{}", self.spotify_client_id, self.spotify_client_secret);
            let encoded_auth = general_purpose::STANDARD.encode(auth_string);
            request = request.header("Authorization", format!("Basic {}", encoded_auth));
        }

        let token_response: serde_json::Value = request
            .form(&params)
            .send()
            .await
            .into_report()
            .change_context(UserError)?
            .json()
            .await
            .into_report()
            .change_context(UserError)?;

        if let Some(new_access_token) = token_response["access_token"].as_str() {
            self.spotify_access_token = new_access_token.to_string();
            if let Some(new_refresh_token) = token_response["refresh_token"].as_str() {
                self.spotify_refresh_token = new_refresh_token.to_string();
            }
            self.save_config_file()?;
            println!("{}", "Spotify token refreshed successfully.".green());
            Ok(())
        } else {
            Err(Report::new(UserError).attach_printable(format!(
                "Failed to refresh Spotify token. Response: {:?}",
                token_response
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_defaults_are_filled_in() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"spotify_client_id": "client", "spotify_refresh_token": "refresh", "period": "month"}"#,
        )
        .unwrap();
        let mut user = User::new();
        user.read_config_file_at(&path).unwrap();
        assert_eq!(user.spotify_client_id, "client");
        assert_eq!(user.period, PeriodGranularity::Month);
        assert_eq!(user.merge_policy, MergePolicy::Last);
        assert_eq!(user.lookback_days, 7);
        assert_eq!(user.data_path, "data");
        assert!(user.exclude_destination_tracks);
    }

    #[test]
    fn test_incomplete_config_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"spotify_client_id": "client"}"#).unwrap();
        assert!(User::new().read_config_file_at(&path).is_err());
        assert!(User::new()
            .read_config_file_at(&dir.path().join("missing.json"))
            .is_err());
    }

    #[test]
    fn test_save_and_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".spotibot_config").join("config.json");
        let user = User {
            spotify_client_id: "client".to_string(),
            spotify_access_token: "token".to_string(),
            merge_policy: MergePolicy::First,
            ..User::default()
        };
        user.save_config_file_at(&path).unwrap();
        let mut read = User::new();
        read.read_config_file_at(&path).unwrap();
        assert_eq!(read, user);
    }
}
