mod cache;
mod health;
mod player;

pub(crate) use cache::{get_cache_settings, get_cache_status, update_cache_settings};
pub(crate) use health::{liveness_check, readiness_check};
pub(crate) use player::{
    get_player, report_cache_event, report_playback_failure, report_progress, select_track,
    toggle_source,
};
