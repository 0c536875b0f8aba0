use crate::{CacheSettings, CacheSettingsUpdate, CacheSnapshot, StreamInfo};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};


#[derive(Debug, thiserror::Error)]
pub enum CacheServiceError {
    #[error("Invalid cache service endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("Invalid stream URL: {0}")]
    InvalidStreamUrl(String),
    #[error("Track {0} has not been found")]
    TrackNotFound(String),
    #[error("Unexpected response status: {0}")]
    UnexpectedStatus(StatusCode),
    #[error(transparent)]
    HttpError(#[from] reqwest::Error),
}

pub type CacheServiceResult<T> = Result<T, CacheServiceError>;

pub struct CacheServiceClient {
    client: Client,
    endpoint: Url,
}

impl CacheServiceClient {
    pub fn create(endpoint: &str, timeout: Duration) -> CacheServiceResult<Self> {
        let mut endpoint = Url::parse(endpoint)
            .map_err(|error| CacheServiceError::InvalidEndpoint(error.to_string()))?;

        if endpoint.cannot_be_a_base() {
            return Err(CacheServiceError::InvalidEndpoint(endpoint.to_string()));
        }

        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, endpoint })
    }

    /// URL of the backend proxy streaming the track from its remote origin.
    pub fn proxy_url(&self, track_id: &str) -> CacheServiceResult<Url> {
        self.url(&["api", "proxy", track_id])
    }

    /// Backend responses may carry a URL relative to the endpoint.
    pub fn resolve_stream_url(&self, url: &str) -> CacheServiceResult<Url> {
        self.endpoint
            .join(url)
            .map_err(|error| CacheServiceError::InvalidStreamUrl(error.to_string()))
    }

    pub async fn get_stream_info(&self, track_id: &str) -> CacheServiceResult<StreamInfo> {
        let url = self.url(&["api", "stream", track_id])?;

        debug!(track_id, "Requesting stream URL");

        let response = self.client.get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(CacheServiceError::TrackNotFound(track_id.to_string()));
        }

        Self::parse_json(response).await
    }

    pub async fn get_settings(&self) -> CacheServiceResult<CacheSettings> {
        let url = self.url(&["api", "cache", "settings"])?;

        let response = self.client.get(url).send().await?;

        Self::parse_json(response).await
    }

    pub async fn update_settings(
        &self,
        update: &CacheSettingsUpdate,
    ) -> CacheServiceResult<CacheSettings> {
        let url = self.url(&["api", "cache", "settings"])?;

        debug!(?update, "Updating cache settings");

        let response = self.client.patch(url).json(update).send().await?;

        Self::parse_json(response).await
    }

    pub async fn get_status(&self) -> CacheServiceResult<CacheSnapshot> {
        let url = self.url(&["api", "cache", "status"])?;

        let response = self.client.get(url).send().await?;

        Self::parse_json(response).await
    }

    fn url(&self, segments: &[&str]) -> CacheServiceResult<Url> {
        let mut url = self.endpoint.clone();

        url.path_segments_mut()
            .map_err(|_| CacheServiceError::InvalidEndpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> CacheServiceResult<T> {
        let status = response.status();

        if !status.is_success() {
            error!(%status, url = %response.url(), "Cache service responded with an error");
            return Err(CacheServiceError::UnexpectedStatus(status));
        }

        Ok(response.json().await?)
    }
}
