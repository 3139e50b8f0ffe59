use async_trait::async_trait;

use crate::sync::track::{Collection, SourcePlaylist, TrackId, TrackRef};
use crate::sync::SyncResult;

/// Remote side of a sync run: reads source playlists and writes the
/// destination ones.
///
/// Implementations resolve pagination internally; every call returns the
/// complete result or a `SyncError::Transient` report.
#[async_trait]
pub trait PlaylistProvider: Send + Sync {
    /// All tracks of a source playlist, skipping items without a track
    /// payload.
    async fn list_source_tracks(&self, source: &SourcePlaylist) -> SyncResult<Vec<TrackRef>>;

    /// Ids of the tracks already in one of the owner's playlists.
    async fn list_collection_track_ids(&self, collection_id: &str) -> SyncResult<Vec<TrackId>>;

    async fn list_owner_collections(&self) -> SyncResult<Vec<Collection>>;

    async fn create_collection(&self, owner_id: &str, name: &str) -> SyncResult<String>;

    async fn set_collection_description(&self, collection_id: &str, text: &str)
        -> SyncResult<()>;

    /// Appends one chunk, never longer than the batch size.
    async fn append_tracks(&self, collection_id: &str, ids: &[TrackId]) -> SyncResult<()>;

    /// Uploads a base64 encoded JPEG as the playlist cover.
    async fn set_collection_cover(&self, collection_id: &str, jpeg_base64: &str)
        -> SyncResult<()>;
}
