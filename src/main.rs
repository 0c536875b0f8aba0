use crate::config::Config;
use crate::services::{CacheServiceStreamResolver, CacheWatcher, SettingsManager};
use crate::storage::InMemoryPlaybackStore;
use actix_rt::signal::unix;
use actix_web::web::Data;
use actix_web::{web, App, HttpServer};
use cache_service_client::CacheServiceClient;
use futures_lite::FutureExt;
use source_selector::{PlayerSession, SourcePreference};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

mod config;
mod http;
mod services;
mod storage;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[actix_rt::main]
async fn main() -> std::io::Result<()> {
    let mut terminate = unix::signal(unix::SignalKind::terminate())?;
    let mut interrupt = unix::signal(unix::SignalKind::interrupt())?;

    dotenv::dotenv().ok();
    env_logger::init();

    let config = Arc::from(Config::from_env());

    info!(version = VERSION, "Starting application...");

    let cache_service_client = Arc::new(
        CacheServiceClient::create(
            &config.cache_service_endpoint,
            Duration::from_secs(config.request_timeout_secs),
        )
        .map_err(|error| std::io::Error::new(std::io::ErrorKind::InvalidInput, error))?,
    );

    let preference = if config.prefer_local_source {
        SourcePreference::PreferLocal
    } else {
        SourcePreference::PreferRemote
    };

    let player_session = Arc::new(PlayerSession::new(
        preference,
        Arc::new(InMemoryPlaybackStore::new()),
        Arc::new(CacheServiceStreamResolver::new(Arc::clone(
            &cache_service_client,
        ))),
    ));
    let settings_manager = Arc::new(SettingsManager::new(
        Arc::clone(&cache_service_client) as _,
    ));
    let cache_watcher = Arc::new(CacheWatcher::new(
        Arc::clone(&cache_service_client) as _,
        Arc::clone(&player_session),
    ));

    if settings_manager.refresh().await.is_none() {
        error!("Cache settings are not available yet");
    }

    actix_rt::spawn(
        Arc::clone(&cache_watcher).run(Duration::from_secs(config.cache_poll_interval_secs)),
    );

    let shutdown_timeout = config.shutdown_timeout;
    let bind_address = config.bind_address.clone();

    let server = HttpServer::new({
        move || {
            App::new()
                .app_data(Data::new(Arc::clone(&player_session)))
                .app_data(Data::new(Arc::clone(&settings_manager)))
                .app_data(Data::new(Arc::clone(&cache_watcher)))
                .service(web::resource("/health").route(web::get().to(http::liveness_check)))
                .service(web::resource("/ready").route(web::get().to(http::readiness_check)))
                .service(web::resource("/player").route(web::get().to(http::get_player)))
                .service(web::resource("/player/track").route(web::post().to(http::select_track)))
                .service(
                    web::resource("/player/toggle").route(web::post().to(http::toggle_source)),
                )
                .service(
                    web::resource("/player/progress").route(web::post().to(http::report_progress)),
                )
                .service(
                    web::resource("/player/cache-events")
                        .route(web::post().to(http::report_cache_event)),
                )
                .service(
                    web::resource("/player/failure")
                        .route(web::post().to(http::report_playback_failure)),
                )
                .service(
                    web::resource("/cache/status").route(web::get().to(http::get_cache_status)),
                )
                .service(
                    web::resource("/cache/settings")
                        .route(web::get().to(http::get_cache_settings))
                        .route(web::patch().to(http::update_cache_settings)),
                )
        }
    })
    .shutdown_timeout(shutdown_timeout)
    .bind(bind_address)?
    .run();

    let server_handle = server.handle();

    actix_rt::spawn({
        async move {
            if let Err(error) = server.await {
                error!(?error, "Error on http server");
            }
        }
    });

    info!("Application started");

    interrupt.recv().or(terminate.recv()).await;

    info!("Received shutdown signal. Shutting down gracefully...");

    server_handle.stop(true).await;

    Ok(())
}
