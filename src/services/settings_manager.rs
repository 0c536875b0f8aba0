use crate::services::CacheService;
use async_lock::RwLock;
use cache_service_client::{CacheServiceError, CacheSettings, CacheSettingsUpdate};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
pub(crate) enum SettingsManagerError {
    #[error("Settings update contains no changes")]
    EmptyUpdate,
    #[error(transparent)]
    CacheServiceError(#[from] CacheServiceError),
}

/// Keeps the last cache policy reported by the cache service.
pub(crate) struct SettingsManager {
    cache_service: Arc<dyn CacheService + Send + Sync>,
    settings: RwLock<Option<CacheSettings>>,
}

impl SettingsManager {
    pub(crate) fn new(cache_service: Arc<dyn CacheService + Send + Sync>) -> Self {
        Self {
            cache_service,
            settings: RwLock::new(None),
        }
    }

    pub(crate) async fn settings(&self) -> Option<CacheSettings> {
        self.settings.read().await.clone()
    }

    /// A failed read is logged and the last known settings are returned.
    pub(crate) async fn refresh(&self) -> Option<CacheSettings> {
        match self.cache_service.get_settings().await {
            Ok(settings) => {
                self.settings.write().await.replace(settings.clone());
                Some(settings)
            }
            Err(error) => {
                error!(?error, "Unable to fetch cache settings");
                self.settings().await
            }
        }
    }

    pub(crate) async fn check_connection(&self) -> Result<(), SettingsManagerError> {
        self.cache_service.get_settings().await?;

        Ok(())
    }

    pub(crate) async fn update(
        &self,
        update: &CacheSettingsUpdate,
    ) -> Result<CacheSettings, SettingsManagerError> {
        if update.is_empty() {
            return Err(SettingsManagerError::EmptyUpdate);
        }

        let settings = self.cache_service.update_settings(update).await?;

        info!(?settings, "Cache settings updated");

        self.settings.write().await.replace(settings.clone());

        Ok(settings)
    }
}
