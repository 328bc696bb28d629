//! JSONL (JSON Lines) storage.
//!
//! JSONL is the source of truth for fact rows and profiles.
//! Each line is a valid JSON object representing one entity.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::{FactFile, StorageConfig, StorageError};

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    /// Create a new JSONL writer for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a writer for one of the fact files.
    pub fn for_fact(config: &StorageConfig, file: FactFile) -> Self {
        Self::new(config.fact_path(file))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a single entity.
    pub fn append(&self, entity: &T) -> Result<(), StorageError> {
        self.append_batch(std::slice::from_ref(entity)).map(|_| ())
    }

    /// Append entities, creating the file and its directory on first use.
    pub fn append_batch(&self, entities: &[T]) -> Result<usize, StorageError> {
        if entities.is_empty() {
            return Ok(0);
        }
        let file = self.open(OpenOptions::new().create(true).append(true))?;
        let count = write_lines(file, entities)?;
        info!(path = ?self.path, count, "Appended rows");
        Ok(count)
    }

    /// Replace the file contents with `entities`.
    pub fn write_all(&self, entities: &[T]) -> Result<usize, StorageError> {
        let file = self.open(OpenOptions::new().create(true).write(true).truncate(true))?;
        let count = write_lines(file, entities)?;
        info!(path = ?self.path, count, "Rewrote file");
        Ok(count)
    }

    fn open(&self, options: &OpenOptions) -> Result<File, StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(options.open(&self.path)?)
    }
}

fn write_lines<T: Serialize>(file: File, entities: &[T]) -> Result<usize, StorageError> {
    let mut writer = BufWriter::new(file);
    for entity in entities {
        serde_json::to_writer(&mut writer, entity)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(entities.len())
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    /// Create a new JSONL reader for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a reader for one of the fact files.
    pub fn for_fact(config: &StorageConfig, file: FactFile) -> Self {
        Self::new(config.fact_path(file))
    }

    /// Check if the file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read all entities from the file. A missing file reads as empty;
    /// lines that fail to parse are skipped.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        self.read_where(|_| true)
    }

    /// Read entities matching a predicate, filtering while parsing.
    pub fn read_where<F>(&self, predicate: F) -> Result<Vec<T>, StorageError>
    where
        F: Fn(&T) -> bool,
    {
        let mut rows = Vec::new();
        let skipped = self.scan(|row| {
            if predicate(&row) {
                rows.push(row);
            }
        })?;
        debug!(path = ?self.path, rows = rows.len(), skipped, "Read rows");
        Ok(rows)
    }

    /// Feed every parsable line to `visit`. Returns the number of skipped lines.
    fn scan(&self, mut visit: impl FnMut(T)) -> Result<usize, StorageError> {
        if !self.path.exists() {
            return Ok(0);
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut skipped = 0;
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(entity) => visit(entity),
                Err(e) => {
                    skipped += 1;
                    warn!("Failed to parse line {} in {:?}: {}", idx + 1, self.path, e);
                }
            }
        }
        Ok(skipped)
    }

    /// Count non-empty lines in the file.
    pub fn count(&self) -> Result<usize, StorageError> {
        if !self.path.exists() {
            return Ok(0);
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let count = reader
            .lines()
            .map_while(Result::ok)
            .filter(|l| !l.trim().is_empty())
            .count();

        Ok(count)
    }
}
