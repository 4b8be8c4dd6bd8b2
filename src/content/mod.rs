pub mod catalog;
pub mod repository;

pub use catalog::{load_technology_catalog, SettingsStore, TechnologyGroup};
pub use repository::ContentRepository;
