use crate::sync::provider::PlaylistProvider;
use crate::sync::track::TrackId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Ids whose chunk was accepted, in submission order.
    pub appended: Vec<TrackId>,
    pub failed: Vec<TrackId>,
}

impl BatchOutcome {
    pub fn all_failed(&self) -> bool {
        self.appended.is_empty() && !self.failed.is_empty()
    }
}

/// Appends `ids` in consecutive chunks of at most `batch_size`.
///
/// A failing chunk is logged and skipped; the following chunks are still
/// submitted. Only ids of accepted chunks end up in `appended`.
pub async fn append_in_batches<P: PlaylistProvider + ?Sized>(
    provider: &P,
    destination_id: &str,
    ids: &[TrackId],
    batch_size: usize,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    for (index, chunk) in ids.chunks(batch_size.max(1)).enumerate() {
        match provider.append_tracks(destination_id, chunk).await {
            Ok(()) => {
                log::info!("Added {} tracks to playlist {}", chunk.len(), destination_id);
                outcome.appended.extend_from_slice(chunk);
            }
            Err(report) => {
                let first = index * batch_size.max(1);
                log::error!(
                    "Failed to add tracks {}-{} to playlist {}: {:?}",
                    first,
                    first + chunk.len() - 1,
                    destination_id,
                    report
                );
                outcome.failed.extend_from_slice(chunk);
            }
        }
    }
    outcome
}
