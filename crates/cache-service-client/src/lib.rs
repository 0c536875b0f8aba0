mod client;
mod types;

pub use client::*;
pub use types::*;

pub use reqwest::StatusCode;
