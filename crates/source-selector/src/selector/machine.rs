use crate::selector::{
    PlaybackFailure, PlaybackFailureKind, PlaybackSnapshot, PolicyViolation, ResolutionOutcome,
    ResolutionRequest, ResumeDirective, SelectorState, SourcePreference, SourceTag,
    StreamResolverError, StreamSelection, SwitchDirective, Track, TransitionReason,
};
use crate::{PlayerId, TrackId};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct PendingResolution {
    generation: u64,
    source: SourceTag,
    resume: ResumeDirective,
}

/// Decides where the audio of the active track comes from.
///
/// The selector never talks to the network itself. Every transition that
/// needs a new stream URL hands out a [`ResolutionRequest`]; the caller
/// resolves it and feeds the result back through
/// [`SourceSelector::apply_resolution`]. Only the most recent request is
/// ever applied.
#[derive(Debug)]
pub struct SourceSelector {
    player_id: PlayerId,
    preference: SourcePreference,
    state: SelectorState,
    track: Option<Track>,
    selection: Option<StreamSelection>,
    generation: u64,
    pending: Option<PendingResolution>,
}

impl SourceSelector {
    pub fn new(preference: SourcePreference) -> Self {
        Self {
            player_id: PlayerId::new(),
            preference,
            state: SelectorState::Idle,
            track: None,
            selection: None,
            generation: 0,
            pending: None,
        }
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    pub fn preference(&self) -> SourcePreference {
        self.preference
    }

    pub fn state(&self) -> &SelectorState {
        &self.state
    }

    pub fn track(&self) -> Option<&Track> {
        self.track.as_ref()
    }

    pub fn selection(&self) -> Option<&StreamSelection> {
        self.selection.as_ref()
    }

    pub fn track_changed(&mut self, track: Track, playing: bool) -> ResolutionRequest {
        let source = self.preference.source_for(track.cached);

        info!(
            player_id = %self.player_id,
            track_id = %track.id,
            cached = track.cached,
            %source,
            "Track changed"
        );

        self.selection = None;
        self.track = Some(track);

        self.start_resolution(
            source,
            ResumeDirective::from_start(playing),
            TransitionReason::TrackChanged,
        )
    }

    pub fn cache_flag_changed(
        &mut self,
        track_id: &TrackId,
        cached: bool,
        playback: PlaybackSnapshot,
    ) -> Option<ResolutionRequest> {
        let track = match self.track.as_mut() {
            Some(track) if &track.id == track_id => track,
            _ => {
                debug!(%track_id, "Cache flag change does not concern the active track");
                return None;
            }
        };

        if track.cached == cached {
            return None;
        }

        track.cached = cached;

        info!(player_id = %self.player_id, %track_id, cached, "Cache flag of the active track flipped");

        if matches!(self.state, SelectorState::Error(_)) {
            debug!(%track_id, "Selector is in error state, skipping re-resolution");
            if !cached && self.selection.as_ref().map(|s| s.source) == Some(SourceTag::Local) {
                self.selection = None;
            }
            return None;
        }

        let current_source = self.current_source();

        if cached {
            if self.preference != SourcePreference::PreferLocal
                || current_source == Some(SourceTag::Local)
            {
                return None;
            }

            Some(self.start_resolution(
                SourceTag::Local,
                playback.into(),
                TransitionReason::CacheCompleted,
            ))
        } else {
            if current_source != Some(SourceTag::Local) {
                return None;
            }

            Some(self.start_resolution(
                SourceTag::Remote,
                playback.into(),
                TransitionReason::CacheEvicted,
            ))
        }
    }

    pub fn toggle_source(
        &mut self,
        playback: PlaybackSnapshot,
    ) -> Result<ResolutionRequest, PolicyViolation> {
        let track = self.track.as_ref().ok_or(PolicyViolation::NoActiveTrack)?;

        if !track.cached {
            return Err(PolicyViolation::TrackNotCached(track.id.clone()));
        }

        self.preference = self.preference.toggled();
        let source = self.preference.source_for(true);

        info!(player_id = %self.player_id, preference = ?self.preference, "Source preference toggled");

        Ok(self.start_resolution(source, playback.into(), TransitionReason::ManualToggle))
    }

    pub fn playback_failed(&mut self, failure: PlaybackFailure) {
        if !matches!(self.state, SelectorState::Ready) {
            debug!(state = ?self.state, ?failure, "Ignoring playback failure outside of ready state");
            return;
        }

        warn!(player_id = %self.player_id, ?failure, "Playback of the selected source failed");

        self.state = SelectorState::Error(failure);
    }

    pub fn apply_resolution(
        &mut self,
        generation: u64,
        result: Result<StreamSelection, StreamResolverError>,
    ) -> ResolutionOutcome {
        let pending = match self.pending.take() {
            Some(pending) if pending.generation == generation => pending,
            other => {
                self.pending = other;
                debug!(generation, latest = self.generation, "Discarding stale resolution");
                return ResolutionOutcome::Stale;
            }
        };

        let (track_id, cached) = match self.track.as_ref() {
            Some(track) => (track.id.clone(), track.cached),
            None => return ResolutionOutcome::Stale,
        };

        match result {
            Ok(selection) if selection.track_id != track_id => {
                let failure = PlaybackFailure::new(
                    PlaybackFailureKind::Unknown,
                    format!("Resolved stream belongs to track {}", selection.track_id),
                );
                self.fail(failure)
            }
            Ok(selection) if selection.source != pending.source => {
                let failure = PlaybackFailure::new(
                    PlaybackFailureKind::Unknown,
                    format!(
                        "Requested {} stream, resolved {}",
                        pending.source, selection.source
                    ),
                );
                self.fail(failure)
            }
            Ok(selection) if selection.source == SourceTag::Local && !cached => {
                self.retarget_remote(pending)
            }
            Ok(selection) => {
                info!(
                    player_id = %self.player_id,
                    %track_id,
                    source = %selection.source,
                    position = ?pending.resume.position,
                    "Stream source applied"
                );

                self.state = SelectorState::Ready;
                self.selection = Some(selection.clone());

                ResolutionOutcome::Applied(SwitchDirective {
                    selection,
                    resume: pending.resume,
                })
            }
            Err(StreamResolverError::NotCached(_)) if pending.source == SourceTag::Local => {
                if let Some(track) = self.track.as_mut() {
                    track.cached = false;
                }
                self.retarget_remote(pending)
            }
            Err(error) => {
                let failure = PlaybackFailure::new(PlaybackFailureKind::Network, error.to_string());
                self.fail(failure)
            }
        }
    }

    fn retarget_remote(&mut self, pending: PendingResolution) -> ResolutionOutcome {
        warn!(player_id = %self.player_id, "Local artifact is gone, falling back to remote stream");

        ResolutionOutcome::Retarget(self.start_resolution(
            SourceTag::Remote,
            pending.resume,
            TransitionReason::CacheEvicted,
        ))
    }

    fn fail(&mut self, failure: PlaybackFailure) -> ResolutionOutcome {
        warn!(player_id = %self.player_id, ?failure, "Stream resolution failed");

        self.state = SelectorState::Error(failure.clone());

        ResolutionOutcome::Failed(failure)
    }

    fn current_source(&self) -> Option<SourceTag> {
        match &self.pending {
            Some(pending) => Some(pending.source),
            None => self.selection.as_ref().map(|s| s.source),
        }
    }

    fn start_resolution(
        &mut self,
        source: SourceTag,
        resume: ResumeDirective,
        reason: TransitionReason,
    ) -> ResolutionRequest {
        self.generation += 1;
        self.state = SelectorState::Resolving;
        self.pending = Some(PendingResolution {
            generation: self.generation,
            source,
            resume,
        });

        let track = self
            .track
            .clone()
            .expect("track should be defined");

        debug!(generation = self.generation, ?reason, %source, "Resolving stream source");

        ResolutionRequest {
            generation: self.generation,
            track,
            source,
            reason,
        }
    }
}
