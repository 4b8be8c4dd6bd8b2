//! Seed data loader.
//! Reads YAML seed files (`tables:` → rows) from a directory or the embedded default set.

use crate::database::Table;
use crate::error::SiteError;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

const EMBEDDED_DEFAULT: &str = include_str!("../../seeds/default.yml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedMode {
    /// Insert or merge on the table's unique key. Re-running is harmless.
    #[default]
    Upsert,
    /// Plain insert; rows that already exist are reported as skipped.
    Insert,
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    mode: SeedMode,
    #[serde(default)]
    tables: BTreeMap<String, Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableSeed {
    pub mode: SeedMode,
    pub rows: Vec<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedDataset {
    tables: BTreeMap<Table, TableSeed>,
    sources: Vec<PathBuf>,
}

impl SeedDataset {
    /// The dataset compiled into the binary.
    pub fn embedded_default() -> Result<Self, SiteError> {
        Self::from_yaml_str(EMBEDDED_DEFAULT, Path::new("<embedded>/default.yml"))
    }

    /// Loads every `*.yml` / `*.yaml` file in a directory, in file-name order.
    pub fn load_from_directory(path: &Path) -> Result<Self, SiteError> {
        info!("Loading seed data from: {:?}", path);

        if !path.is_dir() {
            return Err(SiteError::ConfigError(format!(
                "Seed directory not found: {:?}",
                path
            )));
        }

        let mut files = Vec::new();
        for pattern in ["*.yml", "*.yaml"] {
            let pattern = path.join(pattern);
            let pattern = pattern.to_string_lossy();
            let entries = glob::glob(&pattern)
                .map_err(|e| SiteError::ConfigError(format!("Invalid seed pattern {}: {}", pattern, e)))?;
            for entry in entries {
                files.push(entry.map_err(|e| SiteError::IoError(e.to_string()))?);
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(SiteError::ConfigError(format!(
                "No seed files (*.yml) in {:?}",
                path
            )));
        }

        let mut dataset = SeedDataset::default();
        for file in files {
            dataset.merge(Self::load_file(&file)?);
        }

        info!(
            "Loaded {} rows for {} tables from {} files",
            dataset.row_count(),
            dataset.tables.len(),
            dataset.sources.len()
        );
        Ok(dataset)
    }

    pub fn load_file(path: &Path) -> Result<Self, SiteError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            SiteError::ConfigError(format!("Failed to read {:?}: {}", path, e))
        })?;
        Self::from_yaml_str(&contents, path)
    }

    /// Parses one seed document. `source` is only used in messages.
    pub fn from_yaml_str(contents: &str, source: &Path) -> Result<Self, SiteError> {
        let file: SeedFile = serde_yaml::from_str(contents).map_err(|e| {
            SiteError::ConfigError(format!("Failed to parse {:?}: {}", source, e))
        })?;

        let mut tables = BTreeMap::new();
        for (name, rows) in file.tables {
            let table = Table::from_str(&name).map_err(|_| {
                SiteError::ConfigError(format!("{:?}: unknown table '{}'", source, name))
            })?;

            let rows = rows
                .into_iter()
                .enumerate()
                .map(|(index, row)| match row {
                    Value::Object(map) => Ok(map),
                    other => Err(SiteError::ConfigError(format!(
                        "{:?}: {} row {} is not a mapping: {}",
                        source, name, index, other
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?;

            debug!("{:?}: {} rows for {}", source, rows.len(), table);
            tables.insert(table, TableSeed { mode: file.mode, rows });
        }

        let dataset = Self {
            tables,
            sources: vec![source.to_path_buf()],
        };
        dataset.validate()?;
        Ok(dataset)
    }

    /// Checks that upserted rows carry their table's unique key.
    pub fn validate(&self) -> Result<(), SiteError> {
        for (table, seed) in &self.tables {
            if seed.mode != SeedMode::Upsert {
                continue;
            }
            let Some(key) = table.conflict_key() else {
                continue;
            };
            if let Some(index) = seed.rows.iter().position(|row| !row.contains_key(key)) {
                return Err(SiteError::ConfigError(format!(
                    "{} row {} has no '{}', which is needed to upsert it",
                    table, index, key
                )));
            }
        }
        Ok(())
    }

    /// Appends `other`'s rows. Its mode wins for tables both define.
    pub fn merge(&mut self, other: SeedDataset) {
        for (table, seed) in other.tables {
            match self.tables.get_mut(&table) {
                Some(existing) => {
                    existing.mode = seed.mode;
                    existing.rows.extend(seed.rows);
                }
                None => {
                    self.tables.insert(table, seed);
                }
            }
        }
        self.sources.extend(other.sources);
    }

    pub fn table(&self, table: Table) -> Option<&TableSeed> {
        self.tables.get(&table)
    }

    /// Tables with rows, in seeding order (parents first).
    pub fn tables(&self) -> Vec<Table> {
        Table::ALL
            .iter()
            .copied()
            .filter(|table| self.tables.contains_key(table))
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.tables.values().map(|seed| seed.rows.len()).sum()
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }
}
