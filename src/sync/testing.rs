use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use error_stack::Report;

use crate::sync::provider::PlaylistProvider;
use crate::sync::track::{Collection, SourcePlaylist, TrackId, TrackRef};
use crate::sync::{SyncError, SyncResult};

/// Scriptable provider backed by plain maps.
#[derive(Default)]
pub struct FakeProvider {
    pub sources: Mutex<HashMap<String, Vec<TrackRef>>>,
    pub failing_sources: Mutex<HashSet<String>>,
    /// Any chunk containing one of these ids is rejected.
    pub poisoned_ids: Mutex<HashSet<TrackId>>,
    pub fail_list_collections: Mutex<bool>,
    pub fail_create: Mutex<bool>,
    pub collections: Mutex<Vec<Collection>>,
    pub contents: Mutex<HashMap<String, Vec<TrackId>>>,
    pub descriptions: Mutex<HashMap<String, String>>,
    pub covers: Mutex<HashMap<String, String>>,
    pub append_calls: Mutex<usize>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(self, key: &str, tracks: Vec<TrackRef>) -> Self {
        self.sources.lock().unwrap().insert(key.to_string(), tracks);
        self
    }

    pub fn with_collection(self, id: &str, name: &str, track_ids: &[&str]) -> Self {
        self.collections.lock().unwrap().push(Collection {
            id: id.to_string(),
            name: name.to_string(),
        });
        self.contents.lock().unwrap().insert(
            id.to_string(),
            track_ids.iter().map(|id| id.to_string()).collect(),
        );
        self
    }

    pub fn push_tracks(&self, key: &str, tracks: Vec<TrackRef>) {
        self.sources
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .extend(tracks);
    }

    pub fn fail_source(&self, key: &str) {
        self.failing_sources.lock().unwrap().insert(key.to_string());
    }

    pub fn poison(&self, id: &str) {
        self.poisoned_ids.lock().unwrap().insert(id.to_string());
    }

    pub fn heal(&self) {
        self.poisoned_ids.lock().unwrap().clear();
        self.failing_sources.lock().unwrap().clear();
    }

    pub fn collection_id(&self, name: &str) -> Option<String> {
        self.collections
            .lock()
            .unwrap()
            .iter()
            .find(|collection| collection.name == name)
            .map(|collection| collection.id.clone())
    }

    /// Tracks appended to the playlist called `name`, in order.
    pub fn contents_of(&self, name: &str) -> Vec<TrackId> {
        self.collection_id(name)
            .and_then(|id| self.contents.lock().unwrap().get(&id).cloned())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PlaylistProvider for FakeProvider {
    async fn list_source_tracks(&self, source: &SourcePlaylist) -> SyncResult<Vec<TrackRef>> {
        if self.failing_sources.lock().unwrap().contains(&source.key) {
            return Err(Report::new(SyncError::Transient).attach_printable("404"));
        }
        Ok(self
            .sources
            .lock()
            .unwrap()
            .get(&source.key)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_collection_track_ids(&self, collection_id: &str) -> SyncResult<Vec<TrackId>> {
        Ok(self
            .contents
            .lock()
            .unwrap()
            .get(collection_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_owner_collections(&self) -> SyncResult<Vec<Collection>> {
        if *self.fail_list_collections.lock().unwrap() {
            return Err(Report::new(SyncError::Transient));
        }
        Ok(self.collections.lock().unwrap().clone())
    }

    async fn create_collection(&self, _owner_id: &str, name: &str) -> SyncResult<String> {
        if *self.fail_create.lock().unwrap() {
            return Err(Report::new(SyncError::Transient));
        }
        let mut collections = self.collections.lock().unwrap();
        let id = format!("dest-{}", collections.len() + 1);
        collections.push(Collection {
            id: id.clone(),
            name: name.to_string(),
        });
        self.contents.lock().unwrap().insert(id.clone(), vec![]);
        Ok(id)
    }

    async fn set_collection_description(&self, collection_id: &str, text: &str) -> SyncResult<()> {
        self.descriptions
            .lock()
            .unwrap()
            .insert(collection_id.to_string(), text.to_string());
        Ok(())
    }

    async fn append_tracks(&self, collection_id: &str, ids: &[TrackId]) -> SyncResult<()> {
        *self.append_calls.lock().unwrap() += 1;
        let poisoned = self.poisoned_ids.lock().unwrap();
        if ids.iter().any(|id| poisoned.contains(id)) {
            return Err(Report::new(SyncError::Transient).attach_printable("502"));
        }
        self.contents
            .lock()
            .unwrap()
            .entry(collection_id.to_string())
            .or_default()
            .extend_from_slice(ids);
        Ok(())
    }

    async fn set_collection_cover(&self, collection_id: &str, jpeg_base64: &str) -> SyncResult<()> {
        self.covers
            .lock()
            .unwrap()
            .insert(collection_id.to_string(), jpeg_base64.to_string());
        Ok(())
    }
}
