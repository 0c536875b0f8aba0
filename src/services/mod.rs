mod cache_service;
pub(crate) use cache_service::*;

mod cache_watcher;
pub(crate) use cache_watcher::*;

mod settings_manager;
pub(crate) use settings_manager::*;

mod stream_resolver;
pub(crate) use stream_resolver::*;
