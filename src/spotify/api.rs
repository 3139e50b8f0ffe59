use async_trait::async_trait;
use colored::Colorize;
use error_stack::{IntoReport, ResultExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::AppConfig;
use crate::spotify::{SpotifyError, SpotifyResult};
use crate::sync::provider::PlaylistProvider;
use crate::sync::track::{Collection, SourcePlaylist, TrackId, TrackRef};
use crate::sync::{SyncError, SyncResult};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SpotifyUser {
    pub id: String,
    pub display_name: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct ApiTrack {
    id: Option<String>,
    uri: Option<String>,
    name: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct PlaylistItem {
    added_at: Option<String>,
    track: Option<ApiTrack>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct ApiPlaylist {
    id: String,
    name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct Page<T> {
    items: Vec<Option<T>>,
    next: Option<String>,
}

/// Spotify Web API client acting on behalf of one user.
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    client: Client,
    access_token: String,
    base_url: String,
}

impl SpotifyClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            access_token: access_token.into(),
            base_url: AppConfig::SPOTIFY_API_URL.to_string(),
        }
    }

    pub async fn current_user(&self) -> SpotifyResult<SpotifyUser> {
        let url = format!("{}/me", self.base_url);
        self.send_json(self.client.get(&url)).await
    }

    async fn send(&self, request: RequestBuilder) -> SpotifyResult<reqwest::Response> {
        request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .into_report()
            .change_context(SpotifyError)?
            .error_for_status()
            .into_report()
            .change_context(SpotifyError)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> SpotifyResult<T> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .into_report()
            .change_context(SpotifyError)
    }

    /// Follows `next` links until the last page.
    async fn get_all_pages<T: DeserializeOwned>(&self, first_url: String) -> SpotifyResult<Vec<T>> {
        let mut items = vec![];
        let mut next_url = Some(first_url);
        while let Some(url) = next_url {
            let page: Page<T> = self
                .send_json(self.client.get(&url))
                .await
                .attach_printable_lazy(|| format!("Failed to fetch {}", url))?;
            items.extend(page.items.into_iter().flatten());
            next_url = page.next;
        }
        Ok(items)
    }
}

/// Converts playlist items, skipping null payloads and local files.
fn track_refs(items: Vec<PlaylistItem>) -> Vec<TrackRef> {
    items
        .into_iter()
        .filter_map(|item| {
            let track = item.track?;
            match track.id {
                Some(id) => Some(TrackRef {
                    uri: track.uri,
                    name: track.name,
                    ..TrackRef::new(id, item.added_at)
                }),
                None => {
                    log::warn!(
                        "Skipping track {:?} because it has no ID (it might be a local file)",
                        track.name.unwrap_or_default()
                    );
                    None
                }
            }
        })
        .collect()
}

fn track_uri(id: &str) -> String {
    format!("spotify:track:{}", id)
}

#[async_trait]
impl PlaylistProvider for SpotifyClient {
    async fn list_source_tracks(&self, source: &SourcePlaylist) -> SyncResult<Vec<TrackRef>> {
        let url = format!("{}/playlists/{}/tracks?limit=100", self.base_url, source.key);
        let items: Vec<PlaylistItem> = self
            .get_all_pages(url)
            .await
            .attach_printable_lazy(|| format!("Failed to get the tracks of {}", source.url))
            .change_context(SyncError::Transient)?;
        if items.is_empty() {
            println!(
                "Playlist {} has no tracks or could not be read",
                source.url.clone().yellow()
            );
        }
        Ok(track_refs(items))
    }

    async fn list_collection_track_ids(&self, collection_id: &str) -> SyncResult<Vec<TrackId>> {
        let url = format!("{}/playlists/{}/tracks?limit=100", self.base_url, collection_id);
        let items: Vec<PlaylistItem> = self
            .get_all_pages(url)
            .await
            .change_context(SyncError::Transient)?;
        Ok(track_refs(items).into_iter().map(|track| track.id).collect())
    }

    async fn list_owner_collections(&self) -> SyncResult<Vec<Collection>> {
        let url = format!("{}/me/playlists?limit=50", self.base_url);
        let playlists: Vec<ApiPlaylist> = self
            .get_all_pages(url)
            .await
            .change_context(SyncError::Transient)?;
        Ok(playlists
            .into_iter()
            .map(|playlist| Collection {
                id: playlist.id,
                name: playlist.name,
            })
            .collect())
    }

    async fn create_collection(&self, owner_id: &str, name: &str) -> SyncResult<String> {
        let url = format!("{}/users/{}/playlists", self.base_url, owner_id);
        let playlist: ApiPlaylist = self
            .send_json(
                self.client
                    .post(&url)
                    .json(&json!({ "name": name, "public": false })),
            )
            .await
            .change_context(SyncError::Transient)?;
        Ok(playlist.id)
    }

    async fn set_collection_description(&self, collection_id: &str, text: &str) -> SyncResult<()> {
        let url = format!("{}/playlists/{}", self.base_url, collection_id);
        self.send(self.client.put(&url).json(&json!({ "description": text })))
            .await
            .change_context(SyncError::Transient)?;
        Ok(())
    }

    async fn append_tracks(&self, collection_id: &str, ids: &[TrackId]) -> SyncResult<()> {
        let url = format!("{}/playlists/{}/tracks", self.base_url, collection_id);
        let uris: Vec<String> = ids.iter().map(|id| track_uri(id)).collect();
        self.send(self.client.post(&url).json(&json!({ "uris": uris })))
            .await
            .change_context(SyncError::Transient)?;
        Ok(())
    }

    async fn set_collection_cover(&self, collection_id: &str, jpeg_base64: &str) -> SyncResult<()> {
        let url = format!("{}/playlists/{}/images", self.base_url, collection_id);
        self.send(
            self.client
                .put(&url)
                .header(CONTENT_TYPE, "image/jpeg")
                .body(jpeg_base64.to_string()),
        )
        .await
        .change_context(SyncError::Transient)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use dotenvy::dotenv;

    use super::*;

    #[test]
    fn test_track_refs_skip_empty_items() {
        let page: Page<PlaylistItem> = serde_json::from_value(json!({
            "items": [
                {
                    "added_at": "2025-03-01T10:00:00Z",
                    "track": { "id": "4uLU6hMCjMI75M1A2tKUQC", "uri": "spotify:track:4uLU6hMCjMI75M1A2tKUQC", "name": "Song" }
                },
                { "added_at": "2025-03-01T10:00:00Z", "track": null },
                {
                    "added_at": null,
                    "track": { "id": null, "uri": "spotify:local:x", "name": "Local file" }
                },
                null,
                { "track": { "id": "7", "uri": null, "name": null } }
            ],
            "next": null
        }))
        .unwrap();
        let tracks = track_refs(page.items.into_iter().flatten().collect());
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].id, "4uLU6hMCjMI75M1A2tKUQC");
        assert_eq!(tracks[0].added_at.as_deref(), Some("2025-03-01T10:00:00Z"));
        assert_eq!(tracks[1].id, "7");
        assert_eq!(tracks[1].added_at, None);
    }

    #[test]
    fn test_track_uri() {
        assert_eq!(track_uri("abc"), "spotify:track:abc");
    }

    #[tokio::test]
    #[ignore] // Requires SPOTIFY_ACCESS_TOKEN in .env and network access. Run with `cargo test -- --ignored`
    async fn test_current_user() {
        dotenv().ok();
        let token = env::var("SPOTIFY_ACCESS_TOKEN").unwrap();
        let client = SpotifyClient::new(token);
        let user = client.current_user().await.unwrap();
        assert!(!user.id.is_empty());
        let collections = client.list_owner_collections().await.unwrap();
        println!("{} playlists", collections.len());
    }
}
