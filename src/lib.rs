pub mod api_keys;
pub mod batch;
pub mod config;
pub mod content;
pub mod database;
pub mod error;
pub mod i18n;
pub mod media;
pub mod migrations;
pub mod postgrest;
pub mod projects;
pub mod seed;

pub use error::{ApiError, SiteError};
