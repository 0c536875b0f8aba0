use crate::services::{CacheWatcher, SettingsManager, SettingsManagerError};
use actix_web::web::{Data, Json, Query};
use actix_web::{HttpResponse, Responder};
use cache_service_client::CacheSettingsUpdate;
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

#[derive(Deserialize)]
pub(crate) struct StatusQuery {
    #[serde(default)]
    refresh: bool,
}

pub(crate) async fn get_cache_status(
    cache_watcher: Data<Arc<CacheWatcher>>,
    query: Query<StatusQuery>,
) -> impl Responder {
    let snapshot = match cache_watcher.snapshot().await {
        Some(snapshot) if !query.refresh => Some(snapshot),
        _ => cache_watcher.fetch_snapshot().await,
    };

    match snapshot {
        Some(snapshot) => HttpResponse::Ok().json(snapshot),
        None => HttpResponse::ServiceUnavailable().finish(),
    }
}

pub(crate) async fn get_cache_settings(
    settings_manager: Data<Arc<SettingsManager>>,
) -> impl Responder {
    match settings_manager.refresh().await {
        Some(settings) => HttpResponse::Ok().json(settings),
        None => HttpResponse::ServiceUnavailable().finish(),
    }
}

pub(crate) async fn update_cache_settings(
    settings_manager: Data<Arc<SettingsManager>>,
    update: Json<CacheSettingsUpdate>,
) -> impl Responder {
    match settings_manager.update(&update).await {
        Ok(settings) => HttpResponse::Ok().json(settings),
        Err(SettingsManagerError::EmptyUpdate) => {
            HttpResponse::BadRequest().body("Settings update contains no changes")
        }
        Err(error) => {
            error!(?error, "Unable to update cache settings");
            HttpResponse::BadGateway().finish()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::http::{get_cache_settings, get_cache_status, update_cache_settings};
    use crate::services::{CacheService, CacheWatcher, SettingsManager};
    use crate::storage::InMemoryPlaybackStore;
    use actix_web::web::Data;
    use actix_web::{test, web, App};
    use async_trait::async_trait;
    use cache_service_client::{
        CacheServiceError, CacheSettings, CacheSettingsUpdate, CacheSnapshot, StatusCode,
        StreamInfo,
    };
    use serde_json::{json, Value};
    use source_selector::{
        PlayerSession, SourcePreference, SourceTag, StreamResolver, StreamResolverError,
        StreamSelection, Track,
    };
    use std::sync::{Arc, Mutex};

    struct CacheServiceMock {
        settings: Mutex<CacheSettings>,
        status: Mutex<Option<CacheSnapshot>>,
    }

    impl CacheServiceMock {
        fn new(status: Option<CacheSnapshot>) -> Self {
            Self {
                settings: Mutex::new(CacheSettings {
                    max_size_mb: 1024,
                    auto_cleanup: true,
                    cleanup_after_days: 30,
                    preferred_bitrate: 192,
                }),
                status: Mutex::new(status),
            }
        }
    }

    #[async_trait]
    impl CacheService for CacheServiceMock {
        async fn get_stream_info(&self, track_id: &str) -> Result<StreamInfo, CacheServiceError> {
            Err(CacheServiceError::TrackNotFound(track_id.into()))
        }

        async fn get_settings(&self) -> Result<CacheSettings, CacheServiceError> {
            Ok(self.settings.lock().unwrap().clone())
        }

        async fn update_settings(
            &self,
            update: &CacheSettingsUpdate,
        ) -> Result<CacheSettings, CacheServiceError> {
            let mut settings = self.settings.lock().unwrap();
            if let Some(max_size_mb) = update.max_size_mb {
                settings.max_size_mb = max_size_mb;
            }
            if let Some(preferred_bitrate) = update.preferred_bitrate {
                settings.preferred_bitrate = preferred_bitrate;
            }

            Ok(settings.clone())
        }

        async fn get_status(&self) -> Result<CacheSnapshot, CacheServiceError> {
            self.status
                .lock()
                .unwrap()
                .clone()
                .ok_or(CacheServiceError::UnexpectedStatus(
                    StatusCode::SERVICE_UNAVAILABLE,
                ))
        }
    }

    struct StreamResolverMock;

    #[async_trait]
    impl StreamResolver for StreamResolverMock {
        async fn resolve(
            &self,
            track: &Track,
            source: SourceTag,
        ) -> Result<StreamSelection, StreamResolverError> {
            Ok(StreamSelection {
                track_id: track.id.clone(),
                url: format!("http://cache/{}/{}", source, track.id),
                source,
            })
        }
    }

    fn snapshot(file_count: u64) -> CacheSnapshot {
        CacheSnapshot {
            usage_percent: 25.0,
            used_size_mb: 256.0,
            max_size_mb: 1024.0,
            file_count,
            success_rate: 97.5,
            active_downloads: vec![],
            recent_failures: vec![],
        }
    }

    fn create_watcher(cache_service: Arc<CacheServiceMock>) -> Arc<CacheWatcher> {
        let session = Arc::new(PlayerSession::new(
            SourcePreference::PreferLocal,
            Arc::new(InMemoryPlaybackStore::new()),
            Arc::new(StreamResolverMock),
        ));

        Arc::new(CacheWatcher::new(cache_service, session))
    }

    #[actix_rt::test]
    async fn test_serving_last_known_status_unless_refresh_is_requested() {
        let cache_service = Arc::new(CacheServiceMock::new(Some(snapshot(12))));
        let app = test::init_service(
            App::new()
                .app_data(Data::new(create_watcher(Arc::clone(&cache_service))))
                .route("/cache/status", web::get().to(get_cache_status)),
        )
        .await;

        let first: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/cache/status").to_request(),
        )
        .await;
        assert_eq!(first["file_count"], 12);
        assert_eq!(first["usage_percent"], 25.0);

        cache_service.status.lock().unwrap().replace(snapshot(13));

        let cached: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/cache/status").to_request(),
        )
        .await;
        assert_eq!(cached["file_count"], 12);

        let refreshed: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri("/cache/status?refresh=true")
                .to_request(),
        )
        .await;
        assert_eq!(refreshed["file_count"], 13);
    }

    #[actix_rt::test]
    async fn test_status_is_unavailable_without_any_snapshot() {
        let cache_service = Arc::new(CacheServiceMock::new(None));
        let app = test::init_service(
            App::new()
                .app_data(Data::new(create_watcher(cache_service)))
                .route("/cache/status", web::get().to(get_cache_status)),
        )
        .await;

        let response = test::call_service(
            &app,
            test::TestRequest::get().uri("/cache/status").to_request(),
        )
        .await;

        assert_eq!(response.status().as_u16(), 503);
    }

    #[actix_rt::test]
    async fn test_reading_and_updating_settings() {
        let settings_manager = Arc::new(SettingsManager::new(Arc::new(CacheServiceMock::new(
            None,
        ))));
        let app = test::init_service(
            App::new().app_data(Data::new(settings_manager)).service(
                web::resource("/cache/settings")
                    .route(web::get().to(get_cache_settings))
                    .route(web::patch().to(update_cache_settings)),
            ),
        )
        .await;

        let settings: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/cache/settings").to_request(),
        )
        .await;
        assert_eq!(settings["max_size_mb"], 1024);
        assert_eq!(settings["preferred_bitrate"], 192);

        let request = test::TestRequest::patch()
            .uri("/cache/settings")
            .set_json(json!({ "preferred_bitrate": 320 }))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(updated["preferred_bitrate"], 320);
        assert_eq!(updated["max_size_mb"], 1024);
        assert_eq!(updated["auto_cleanup"], true);
    }

    #[actix_rt::test]
    async fn test_rejecting_empty_settings_update() {
        let settings_manager = Arc::new(SettingsManager::new(Arc::new(CacheServiceMock::new(
            None,
        ))));
        let app = test::init_service(
            App::new()
                .app_data(Data::new(settings_manager))
                .route("/cache/settings", web::patch().to(update_cache_settings)),
        )
        .await;

        let request = test::TestRequest::patch()
            .uri("/cache/settings")
            .set_json(json!({}))
            .to_request();
        let response = test::call_service(&app, request).await;

        assert_eq!(response.status().as_u16(), 400);
    }
}
