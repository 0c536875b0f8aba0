use actix_web::web::{Data, Json};
use actix_web::{HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use source_selector::{
    PlaybackFailure, PlaybackFailureKind, PlaybackSnapshot, PlayerId, PlayerSession,
    SelectorState, SelectorView, SessionError, SourcePreference, StreamSelection, Track, TrackId,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum PlayerState {
    Idle,
    Resolving,
    Ready,
    Error,
}

#[derive(Serialize)]
struct PlayerResponse {
    player_id: PlayerId,
    state: PlayerState,
    error: Option<PlaybackFailure>,
    track: Option<Track>,
    selection: Option<StreamSelection>,
    preference: SourcePreference,
    position_secs: f64,
    playing: bool,
}

impl PlayerResponse {
    fn new(view: SelectorView, playback: PlaybackSnapshot) -> Self {
        let (state, error) = match view.state {
            SelectorState::Idle => (PlayerState::Idle, None),
            SelectorState::Resolving => (PlayerState::Resolving, None),
            SelectorState::Ready => (PlayerState::Ready, None),
            SelectorState::Error(failure) => (PlayerState::Error, Some(failure)),
        };

        Self {
            player_id: view.player_id,
            state,
            error,
            track: view.track,
            selection: view.selection,
            preference: view.preference,
            position_secs: playback.position.as_secs_f64(),
            playing: playback.playing,
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct ProgressRequest {
    position_secs: f64,
    playing: bool,
}

#[derive(Deserialize)]
pub(crate) struct CacheEventRequest {
    track_id: TrackId,
    cached: bool,
}

#[derive(Deserialize)]
pub(crate) struct PlaybackFailureRequest {
    kind: PlaybackFailureKind,
    #[serde(default)]
    message: String,
}

async fn respond_with_player(session: &PlayerSession) -> HttpResponse {
    match session.playback().await {
        Ok(playback) => HttpResponse::Ok().json(PlayerResponse::new(session.view().await, playback)),
        Err(error) => internal_error(error),
    }
}

fn internal_error(error: SessionError) -> HttpResponse {
    error!(?error, "Player session failed");

    HttpResponse::InternalServerError().finish()
}

pub(crate) async fn get_player(session: Data<Arc<PlayerSession>>) -> impl Responder {
    respond_with_player(&session).await
}

pub(crate) async fn select_track(
    session: Data<Arc<PlayerSession>>,
    track: Json<Track>,
) -> impl Responder {
    if let Err(error) = session.select_track(track.into_inner()).await {
        return internal_error(error);
    }

    respond_with_player(&session).await
}

pub(crate) async fn toggle_source(session: Data<Arc<PlayerSession>>) -> impl Responder {
    if let Err(error) = session.toggle_source().await {
        return internal_error(error);
    }

    respond_with_player(&session).await
}

pub(crate) async fn report_progress(
    session: Data<Arc<PlayerSession>>,
    progress: Json<ProgressRequest>,
) -> impl Responder {
    let position = match Duration::try_from_secs_f64(progress.position_secs) {
        Ok(position) => position,
        Err(_) => return HttpResponse::BadRequest().body("Invalid playback position"),
    };

    let playback = PlaybackSnapshot {
        position,
        playing: progress.playing,
    };

    match session.report_playback(playback).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(error) => internal_error(error),
    }
}

pub(crate) async fn report_cache_event(
    session: Data<Arc<PlayerSession>>,
    event: Json<CacheEventRequest>,
) -> impl Responder {
    if let Err(error) = session.cache_flag_changed(&event.track_id, event.cached).await {
        return internal_error(error);
    }

    respond_with_player(&session).await
}

pub(crate) async fn report_playback_failure(
    session: Data<Arc<PlayerSession>>,
    failure: Json<PlaybackFailureRequest>,
) -> impl Responder {
    let PlaybackFailureRequest { kind, message } = failure.into_inner();

    session
        .playback_failed(PlaybackFailure::new(kind, message))
        .await;

    respond_with_player(&session).await
}
