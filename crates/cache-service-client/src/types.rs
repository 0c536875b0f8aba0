use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamSource {
    Local,
    Remote,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct StreamInfo {
    pub url: String,
    pub source: StreamSource,
    #[serde(default)]
    pub is_cached: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    pub max_size_mb: u64,
    pub auto_cleanup: bool,
    pub cleanup_after_days: u32,
    /// Preferred encoding bitrate in kbps.
    pub preferred_bitrate: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheSettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size_mb: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_cleanup: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleanup_after_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_bitrate: Option<u32>,
}

impl CacheSettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadState {
    Queued,
    Downloading,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveDownload {
    pub track_id: String,
    pub status: DownloadState,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DownloadFailure {
    pub track_id: String,
    pub error: String,
}

/// Point-in-time view of the backend cache.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub usage_percent: f64,
    pub used_size_mb: f64,
    pub max_size_mb: f64,
    pub file_count: u64,
    pub success_rate: f64,
    #[serde(default)]
    pub active_downloads: Vec<ActiveDownload>,
    #[serde(default)]
    pub recent_failures: Vec<DownloadFailure>,
}

impl CacheSnapshot {
    pub fn download_for(&self, track_id: &str) -> Option<&ActiveDownload> {
        self.active_downloads
            .iter()
            .find(|download| download.track_id == track_id)
    }

    pub fn failure_for(&self, track_id: &str) -> Option<&DownloadFailure> {
        self.recent_failures
            .iter()
            .find(|failure| failure.track_id == track_id)
    }
}
