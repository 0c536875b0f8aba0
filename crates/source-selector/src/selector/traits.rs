use crate::selector::{PlaybackSnapshot, SourceTag, StreamSelection, Track};
use crate::TrackId;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StreamResolverError {
    #[error("Track {0} has not been found")]
    TrackNotFound(TrackId),
    #[error("Local artifact of track {0} is not available")]
    NotCached(TrackId),
    #[error("Stream service is unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait StreamResolver {
    async fn resolve(
        &self,
        track: &Track,
        source: SourceTag,
    ) -> Result<StreamSelection, StreamResolverError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PlaybackStoreError {
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Shared playback state of a mounted player: the current track plus the
/// position and play state last reported by the host.
#[async_trait]
pub trait PlaybackStore {
    async fn save_track(&self, track: &Track) -> Result<(), PlaybackStoreError>;
    async fn load_playback(&self) -> Result<PlaybackSnapshot, PlaybackStoreError>;
    async fn save_playback(&self, playback: &PlaybackSnapshot) -> Result<(), PlaybackStoreError>;
}
