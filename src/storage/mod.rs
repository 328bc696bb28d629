//! Fact store access.
//!
//! Game sessions, tenants and player profiles live as JSONL files under the
//! data directory:
//! - `facts/tenants.jsonl`
//! - `facts/players.jsonl`
//! - `facts/sessions.jsonl`
//!
//! The aggregation engine only ever reads through the [`FactStore`] trait.

mod jsonl;
mod store;

pub use jsonl::*;
pub use store::*;

use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Fact store unavailable: {0}")]
    Unavailable(String),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn facts_dir(&self) -> PathBuf {
        self.data_dir.join("facts")
    }

    pub fn fact_path(&self, file: FactFile) -> PathBuf {
        self.facts_dir().join(file.filename())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

/// Fact files in the data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactFile {
    Tenants,
    Players,
    Sessions,
}

impl FactFile {
    /// Get the filename for this fact file.
    pub fn filename(&self) -> &'static str {
        match self {
            FactFile::Tenants => "tenants.jsonl",
            FactFile::Players => "players.jsonl",
            FactFile::Sessions => "sessions.jsonl",
        }
    }
}

/// Keep the first occurrence of each id, preserving order.
pub fn dedup_by_id<T, F>(items: Vec<T>, id: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(id(item).to_string()))
        .collect()
}
