use async_trait::async_trait;
use source_selector::{PlaybackSnapshot, PlaybackStore, PlaybackStoreError, Track};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct PlaybackState {
    track: Option<Track>,
    playback: PlaybackSnapshot,
}

pub(crate) struct InMemoryPlaybackStore {
    storage: Mutex<PlaybackState>,
}

impl InMemoryPlaybackStore {
    pub(crate) fn new() -> Self {
        Self {
            storage: Mutex::new(PlaybackState::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, PlaybackState>, PlaybackStoreError> {
        self.storage
            .lock()
            .map_err(|error| PlaybackStoreError::Unexpected(error.to_string()))
    }
}

#[async_trait]
impl PlaybackStore for InMemoryPlaybackStore {
    async fn save_track(&self, track: &Track) -> Result<(), PlaybackStoreError> {
        self.lock()?.track.replace(track.clone());

        Ok(())
    }

    async fn load_playback(&self) -> Result<PlaybackSnapshot, PlaybackStoreError> {
        Ok(self.lock()?.playback)
    }

    async fn save_playback(&self, playback: &PlaybackSnapshot) -> Result<(), PlaybackStoreError> {
        self.lock()?.playback = *playback;

        Ok(())
    }
}
