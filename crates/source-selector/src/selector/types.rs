use crate::TrackId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    #[serde(default)]
    pub cached: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Reference to the external video the audio was extracted from.
    #[serde(default)]
    pub source_id: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    Local,
    Remote,
}

impl std::fmt::Display for SourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceTag::Local => write!(f, "local"),
            SourceTag::Remote => write!(f, "remote"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcePreference {
    PreferLocal,
    PreferRemote,
}

impl SourcePreference {
    pub fn toggled(self) -> Self {
        match self {
            SourcePreference::PreferLocal => SourcePreference::PreferRemote,
            SourcePreference::PreferRemote => SourcePreference::PreferLocal,
        }
    }

    /// Local playback is only ever chosen for a cached track.
    pub fn source_for(self, cached: bool) -> SourceTag {
        match (self, cached) {
            (SourcePreference::PreferLocal, true) => SourceTag::Local,
            _ => SourceTag::Remote,
        }
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct StreamSelection {
    pub track_id: TrackId,
    pub url: String,
    pub source: SourceTag,
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct PlaybackSnapshot {
    pub position: Duration,
    pub playing: bool,
}

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct ResumeDirective {
    pub position: Duration,
    pub playing: bool,
}

impl ResumeDirective {
    pub fn from_start(playing: bool) -> Self {
        Self {
            position: Duration::ZERO,
            playing,
        }
    }
}

impl From<PlaybackSnapshot> for ResumeDirective {
    fn from(snapshot: PlaybackSnapshot) -> Self {
        Self {
            position: snapshot.position,
            playing: snapshot.playing,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackFailureKind {
    UnsupportedFormat,
    DecodeError,
    Aborted,
    Network,
    Unknown,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct PlaybackFailure {
    pub kind: PlaybackFailureKind,
    pub message: String,
}

impl PlaybackFailure {
    pub fn new(kind: PlaybackFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum SelectorState {
    Idle,
    Resolving,
    Ready,
    Error(PlaybackFailure),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TransitionReason {
    TrackChanged,
    CacheCompleted,
    CacheEvicted,
    ManualToggle,
}

#[derive(Clone, PartialEq, Debug)]
pub struct ResolutionRequest {
    pub generation: u64,
    pub track: Track,
    pub source: SourceTag,
    pub reason: TransitionReason,
}

#[derive(Clone, PartialEq, Debug)]
pub struct SwitchDirective {
    pub selection: StreamSelection,
    pub resume: ResumeDirective,
}

#[derive(Clone, PartialEq, Debug)]
pub enum ResolutionOutcome {
    Applied(SwitchDirective),
    Failed(PlaybackFailure),
    /// The local artifact vanished; the track has to be resolved again remotely.
    Retarget(ResolutionRequest),
    /// A newer request superseded this one.
    Stale,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PolicyViolation {
    #[error("There is no active track")]
    NoActiveTrack,
    #[error("Track {0} is not cached, only remote playback is available")]
    TrackNotCached(TrackId),
}
