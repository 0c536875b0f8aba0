use crate::selector::{
    PlaybackFailure, PlaybackSnapshot, PlaybackStore, PlaybackStoreError, ResolutionOutcome,
    ResolutionRequest, SelectorState, SourcePreference, SourceSelector, StreamResolver,
    StreamSelection, Track,
};
use crate::{PlayerId, TrackId};
use async_lock::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    PlaybackStoreError(#[from] PlaybackStoreError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectorView {
    pub player_id: PlayerId,
    pub track: Option<Track>,
    pub state: SelectorState,
    pub selection: Option<StreamSelection>,
    pub preference: SourcePreference,
}

/// A mounted player: one selector bound to the playback store and the
/// stream resolver.
///
/// The selector lock is never held while a stream URL is being resolved, so
/// a later gesture can supersede a resolution that is still in flight. Store
/// reads and writes tied to a transition happen under the lock, so a
/// playback snapshot always belongs to the track the selector is on.
pub struct PlayerSession {
    selector: Mutex<SourceSelector>,
    store: Arc<dyn PlaybackStore + Send + Sync>,
    resolver: Arc<dyn StreamResolver + Send + Sync>,
}

impl PlayerSession {
    pub fn new(
        preference: SourcePreference,
        store: Arc<dyn PlaybackStore + Send + Sync>,
        resolver: Arc<dyn StreamResolver + Send + Sync>,
    ) -> Self {
        Self {
            selector: Mutex::new(SourceSelector::new(preference)),
            store,
            resolver,
        }
    }

    pub async fn view(&self) -> SelectorView {
        let selector = self.selector.lock().await;

        SelectorView {
            player_id: selector.player_id(),
            track: selector.track().cloned(),
            state: selector.state().clone(),
            selection: selector.selection().cloned(),
            preference: selector.preference(),
        }
    }

    pub async fn playback(&self) -> Result<PlaybackSnapshot, SessionError> {
        Ok(self.store.load_playback().await?)
    }

    pub async fn select_track(&self, track: Track) -> Result<ResolutionOutcome, SessionError> {
        let request = {
            let mut selector = self.selector.lock().await;
            let PlaybackSnapshot { playing, .. } = self.store.load_playback().await?;

            self.store.save_track(&track).await?;
            self.store
                .save_playback(&PlaybackSnapshot {
                    position: Duration::ZERO,
                    playing,
                })
                .await?;

            selector.track_changed(track, playing)
        };

        self.resolve(request).await
    }

    pub async fn cache_flag_changed(
        &self,
        track_id: &TrackId,
        cached: bool,
    ) -> Result<Option<ResolutionOutcome>, SessionError> {
        let request = {
            let mut selector = self.selector.lock().await;
            let playback = self.store.load_playback().await?;
            let request = selector.cache_flag_changed(track_id, cached, playback);
            if let Some(track) = selector.track().filter(|t| &t.id == track_id) {
                self.store.save_track(track).await?;
            }
            request
        };

        match request {
            Some(request) => Ok(Some(self.resolve(request).await?)),
            None => Ok(None),
        }
    }

    /// Swaps the source preference of a cached track. A rejected toggle is
    /// logged and leaves the selection untouched.
    pub async fn toggle_source(&self) -> Result<Option<ResolutionOutcome>, SessionError> {
        let request = {
            let mut selector = self.selector.lock().await;
            let playback = self.store.load_playback().await?;

            match selector.toggle_source(playback) {
                Ok(request) => request,
                Err(violation) => {
                    warn!(%violation, "Source toggle rejected");
                    return Ok(None);
                }
            }
        };

        Ok(Some(self.resolve(request).await?))
    }

    pub async fn playback_failed(&self, failure: PlaybackFailure) {
        self.selector.lock().await.playback_failed(failure);
    }

    pub async fn report_playback(&self, playback: PlaybackSnapshot) -> Result<(), SessionError> {
        self.store.save_playback(&playback).await?;

        Ok(())
    }

    async fn resolve(
        &self,
        mut request: ResolutionRequest,
    ) -> Result<ResolutionOutcome, SessionError> {
        loop {
            debug!(
                generation = request.generation,
                track_id = %request.track.id,
                source = %request.source,
                "Requesting stream URL"
            );

            let result = self.resolver.resolve(&request.track, request.source).await;

            let outcome = {
                let mut selector = self.selector.lock().await;
                let outcome = selector.apply_resolution(request.generation, result);
                if let Some(track) = selector.track() {
                    self.store.save_track(track).await?;
                }
                if let ResolutionOutcome::Applied(directive) = &outcome {
                    self.store
                        .save_playback(&PlaybackSnapshot {
                            position: directive.resume.position,
                            playing: directive.resume.playing,
                        })
                        .await?;
                }
                outcome
            };

            match outcome {
                ResolutionOutcome::Retarget(next) => request = next,
                outcome => return Ok(outcome),
            }
        }
    }
}
