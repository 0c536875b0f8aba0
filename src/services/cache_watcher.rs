use crate::services::CacheService;
use async_lock::RwLock;
use cache_service_client::{CacheSnapshot, DownloadState};
use source_selector::{PlayerSession, Track};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Polls the cache service and reports a finished download of the active
/// track to the player session.
pub(crate) struct CacheWatcher {
    cache_service: Arc<dyn CacheService + Send + Sync>,
    session: Arc<PlayerSession>,
    snapshot: RwLock<Option<CacheSnapshot>>,
}

impl CacheWatcher {
    pub(crate) fn new(
        cache_service: Arc<dyn CacheService + Send + Sync>,
        session: Arc<PlayerSession>,
    ) -> Self {
        Self {
            cache_service,
            session,
            snapshot: RwLock::new(None),
        }
    }

    pub(crate) async fn snapshot(&self) -> Option<CacheSnapshot> {
        self.snapshot.read().await.clone()
    }

    /// A failed read is logged and the last known snapshot is returned.
    pub(crate) async fn fetch_snapshot(&self) -> Option<CacheSnapshot> {
        match self.cache_service.get_status().await {
            Ok(snapshot) => {
                self.snapshot.write().await.replace(snapshot.clone());
                Some(snapshot)
            }
            Err(error) => {
                error!(?error, "Unable to fetch cache status");
                self.snapshot().await
            }
        }
    }

    pub(crate) async fn run(self: Arc<Self>, poll_interval: Duration) {
        let mut interval = tokio::time::interval(poll_interval);

        info!(?poll_interval, "Cache watcher started");

        loop {
            interval.tick().await;
            self.tick().await;
        }
    }

    pub(crate) async fn tick(&self) {
        let snapshot = self.fetch_snapshot().await;

        let track = match self.session.view().await.track {
            Some(track) if !track.cached => track,
            _ => return,
        };

        if !should_check_stream_info(&track, snapshot.as_ref()) {
            return;
        }

        let info = match self.cache_service.get_stream_info(&track.id).await {
            Ok(info) => info,
            Err(error) => {
                error!(?error, track_id = %track.id, "Unable to check cache state of the track");
                return;
            }
        };

        if !info.is_cached {
            debug!(track_id = %track.id, "Track is not cached yet");
            return;
        }

        info!(track_id = %track.id, "Track has been cached");

        if let Err(error) = self.session.cache_flag_changed(&track.id, true).await {
            error!(?error, track_id = %track.id, "Unable to apply cache flag change");
        }
    }
}

fn should_check_stream_info(track: &Track, snapshot: Option<&CacheSnapshot>) -> bool {
    if snapshot.and_then(|snapshot| snapshot.failure_for(&track.id)).is_some() {
        return false;
    }

    let download = snapshot.and_then(|snapshot| snapshot.download_for(&track.id));

    match download.map(|download| download.status) {
        None | Some(DownloadState::Completed) => true,
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::CacheWatcher;
    use crate::services::CacheService;
    use crate::storage::InMemoryPlaybackStore;
    use async_trait::async_trait;
    use cache_service_client::{
        ActiveDownload, CacheServiceError, CacheSettings, CacheSettingsUpdate, CacheSnapshot,
        DownloadFailure, DownloadState, StatusCode, StreamInfo, StreamSource,
    };
    use source_selector::{
        PlayerSession, SourcePreference, SourceTag, StreamResolver, StreamResolverError,
        StreamSelection, Track,
    };
    use std::sync::{Arc, Mutex};

    struct CacheServiceMock {
        status: Mutex<Option<CacheSnapshot>>,
        cached: Mutex<bool>,
        lookups: Mutex<u32>,
    }

    impl CacheServiceMock {
        fn new(status: Option<CacheSnapshot>, cached: bool) -> Self {
            Self {
                status: Mutex::new(status),
                cached: Mutex::new(cached),
                lookups: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl CacheService for CacheServiceMock {
        async fn get_stream_info(&self, track_id: &str) -> Result<StreamInfo, CacheServiceError> {
            *self.lookups.lock().unwrap() += 1;

            let cached = *self.cached.lock().unwrap();

            Ok(StreamInfo {
                url: format!("/api/cache/files/{}.m4a", track_id),
                source: if cached {
                    StreamSource::Local
                } else {
                    StreamSource::Remote
                },
                is_cached: cached,
            })
        }

        async fn get_settings(&self) -> Result<CacheSettings, CacheServiceError> {
            Err(CacheServiceError::UnexpectedStatus(StatusCode::NOT_IMPLEMENTED))
        }

        async fn update_settings(
            &self,
            _update: &CacheSettingsUpdate,
        ) -> Result<CacheSettings, CacheServiceError> {
            Err(CacheServiceError::UnexpectedStatus(StatusCode::NOT_IMPLEMENTED))
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

    fn snapshot(downloads: Vec<ActiveDownload>) -> CacheSnapshot {
        CacheSnapshot {
            usage_percent: 10.0,
            used_size_mb: 102.4,
            max_size_mb: 1024.0,
            file_count: 12,
            success_rate: 100.0,
            active_downloads: downloads,
            recent_failures: vec![],
        }
    }

    fn track(cached: bool) -> Track {
        Track {
            id: "9bZkp7q19f0".into(),
            cached,
            title: "Gangnam Style".into(),
            artist: "PSY".into(),
            thumbnail: None,
            source_id: Some("9bZkp7q19f0".into()),
        }
    }

    async fn create_watcher(
        cache_service: Arc<CacheServiceMock>,
        track: Track,
    ) -> (CacheWatcher, Arc<PlayerSession>) {
        let session = Arc::new(PlayerSession::new(
            SourcePreference::PreferLocal,
            Arc::new(InMemoryPlaybackStore::new()),
            Arc::new(StreamResolverMock),
        ));
        session.select_track(track).await.unwrap();

        let watcher = CacheWatcher::new(cache_service, Arc::clone(&session));

        (watcher, session)
    }

    #[actix_rt::test]
    async fn test_switching_to_local_after_download_completes() {
        let cache_service = Arc::new(CacheServiceMock::new(
            Some(snapshot(vec![ActiveDownload {
                track_id: "9bZkp7q19f0".into(),
                status: DownloadState::Completed,
            }])),
            true,
        ));
        let (watcher, session) = create_watcher(Arc::clone(&cache_service), track(false)).await;

        watcher.tick().await;

        let view = session.view().await;
        assert_eq!(view.selection.unwrap().source, SourceTag::Local);
        assert!(view.track.unwrap().cached);
        assert_eq!(*cache_service.lookups.lock().unwrap(), 1);
    }

    #[actix_rt::test]
    async fn test_skipping_lookup_while_download_is_in_progress() {
        let cache_service = Arc::new(CacheServiceMock::new(
            Some(snapshot(vec![ActiveDownload {
                track_id: "9bZkp7q19f0".into(),
                status: DownloadState::Downloading,
            }])),
            false,
        ));
        let (watcher, session) = create_watcher(Arc::clone(&cache_service), track(false)).await;

        watcher.tick().await;

        assert_eq!(*cache_service.lookups.lock().unwrap(), 0);
        assert_eq!(
            session.view().await.selection.unwrap().source,
            SourceTag::Remote
        );
    }

    #[actix_rt::test]
    async fn test_skipping_lookup_after_download_failed() {
        let mut failed = snapshot(vec![]);
        failed.recent_failures.push(DownloadFailure {
            track_id: "9bZkp7q19f0".into(),
            error: "Video unavailable".into(),
        });
        let cache_service = Arc::new(CacheServiceMock::new(Some(failed), false));
        let (watcher, session) = create_watcher(Arc::clone(&cache_service), track(false)).await;

        watcher.tick().await;
        watcher.tick().await;

        assert_eq!(*cache_service.lookups.lock().unwrap(), 0);
        assert_eq!(
            session.view().await.selection.unwrap().source,
            SourceTag::Remote
        );
    }

    #[actix_rt::test]
    async fn test_skipping_lookup_for_cached_track() {
        let cache_service = Arc::new(CacheServiceMock::new(Some(snapshot(vec![])), true));
        let (watcher, _) = create_watcher(Arc::clone(&cache_service), track(true)).await;

        watcher.tick().await;

        assert_eq!(*cache_service.lookups.lock().unwrap(), 0);
    }

    #[actix_rt::test]
    async fn test_keeping_remote_source_when_track_is_not_cached_yet() {
        let cache_service = Arc::new(CacheServiceMock::new(Some(snapshot(vec![])), false));
        let (watcher, session) = create_watcher(Arc::clone(&cache_service), track(false)).await;

        watcher.tick().await;

        assert_eq!(*cache_service.lookups.lock().unwrap(), 1);
        assert_eq!(
            session.view().await.selection.unwrap().source,
            SourceTag::Remote
        );
    }

    #[actix_rt::test]
    async fn test_retaining_last_snapshot_on_failure() {
        let cache_service = Arc::new(CacheServiceMock::new(Some(snapshot(vec![])), false));
        let (watcher, _) = create_watcher(Arc::clone(&cache_service), track(true)).await;

        let first = watcher.fetch_snapshot().await;
        assert!(first.is_some());

        cache_service.status.lock().unwrap().take();

        assert_eq!(watcher.fetch_snapshot().await, first);
        assert_eq!(watcher.snapshot().await, first);
    }
}
