//! Seed data: YAML datasets and the runner that writes them through the REST endpoint.

pub mod dataset;
pub mod runner;

pub use dataset::{SeedDataset, SeedMode, TableSeed};
pub use runner::SeedRunner;
