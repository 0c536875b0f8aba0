use serde::Deserialize;

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30u64
}

fn default_cache_poll_interval_secs() -> u64 {
    5u64
}

fn default_request_timeout_secs() -> u64 {
    10u64
}

fn default_prefer_local_source() -> bool {
    true
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct Config {
    #[serde(default = "default_bind_address")]
    pub(crate) bind_address: String,
    #[serde(default = "default_shutdown_timeout")]
    pub(crate) shutdown_timeout: u64,
    pub(crate) cache_service_endpoint: String,
    #[serde(default = "default_cache_poll_interval_secs")]
    pub(crate) cache_poll_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub(crate) request_timeout_secs: u64,
    #[serde(default = "default_prefer_local_source")]
    pub(crate) prefer_local_source: bool,
}

impl Config {
    pub(crate) fn from_env() -> Self {
        match envy::from_env::<Self>() {
            Ok(config) => config,
            Err(error) => panic!("Missing environment variable: {:#?}", error),
        }
    }
}
