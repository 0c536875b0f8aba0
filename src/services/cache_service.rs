use async_trait::async_trait;
use cache_service_client::{
    CacheServiceClient, CacheServiceError, CacheSettings, CacheSettingsUpdate, CacheSnapshot,
    StreamInfo,
};

#[async_trait]
pub(crate) trait CacheService {
    async fn get_stream_info(&self, track_id: &str) -> Result<StreamInfo, CacheServiceError>;
    async fn get_settings(&self) -> Result<CacheSettings, CacheServiceError>;
    async fn update_settings(
        &self,
        update: &CacheSettingsUpdate,
    ) -> Result<CacheSettings, CacheServiceError>;
    async fn get_status(&self) -> Result<CacheSnapshot, CacheServiceError>;
}

#[async_trait]
impl CacheService for CacheServiceClient {
    async fn get_stream_info(&self, track_id: &str) -> Result<StreamInfo, CacheServiceError> {
        CacheServiceClient::get_stream_info(self, track_id).await
    }

    async fn get_settings(&self) -> Result<CacheSettings, CacheServiceError> {
        CacheServiceClient::get_settings(self).await
    }

    async fn update_settings(
        &self,
        update: &CacheSettingsUpdate,
    ) -> Result<CacheSettings, CacheServiceError> {
        CacheServiceClient::update_settings(self, update).await
    }

    async fn get_status(&self) -> Result<CacheSnapshot, CacheServiceError> {
        CacheServiceClient::get_status(self).await
    }
}
