use async_trait::async_trait;
use cache_service_client::{CacheServiceClient, CacheServiceError, StreamSource};
use source_selector::{SourceTag, StreamResolver, StreamResolverError, StreamSelection, Track};
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves playback URLs against the cache service: cached artifacts are
/// served by the stream endpoint, everything else goes through the proxy.
pub(crate) struct CacheServiceStreamResolver {
    client: Arc<CacheServiceClient>,
}

impl CacheServiceStreamResolver {
    pub(crate) fn new(client: Arc<CacheServiceClient>) -> Self {
        Self { client }
    }

    fn remote(&self, track: &Track) -> Result<StreamSelection, StreamResolverError> {
        let url = self.client.proxy_url(&track.id).map_err(into_resolver_error)?;

        Ok(StreamSelection {
            track_id: track.id.clone(),
            url: url.to_string(),
            source: SourceTag::Remote,
        })
    }

    async fn local(&self, track: &Track) -> Result<StreamSelection, StreamResolverError> {
        let info = self
            .client
            .get_stream_info(&track.id)
            .await
            .map_err(into_resolver_error)?;

        if !info.is_cached || info.source != StreamSource::Local {
            warn!(track_id = %track.id, ?info, "Cache service has no local artifact for the track");
            return Err(StreamResolverError::NotCached(track.id.clone()));
        }

        let url = self
            .client
            .resolve_stream_url(&info.url)
            .map_err(into_resolver_error)?;

        debug!(track_id = %track.id, %url, "Resolved local stream");

        Ok(StreamSelection {
            track_id: track.id.clone(),
            url: url.to_string(),
            source: SourceTag::Local,
        })
    }
}

#[async_trait]
impl StreamResolver for CacheServiceStreamResolver {
    async fn resolve(
        &self,
        track: &Track,
        source: SourceTag,
    ) -> Result<StreamSelection, StreamResolverError> {
        match source {
            SourceTag::Local => self.local(track).await,
            SourceTag::Remote => self.remote(track),
        }
    }
}

fn into_resolver_error(error: CacheServiceError) -> StreamResolverError {
    match error {
        CacheServiceError::TrackNotFound(track_id) => {
            StreamResolverError::TrackNotFound(track_id.into())
        }
        error => StreamResolverError::Unavailable(error.to_string()),
    }
}
