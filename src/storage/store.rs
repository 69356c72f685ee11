//! Run store implementations.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Serialize;

use crate::schema::{ConvergenceHistory, GenerationRecord};

const HISTORY_FILE: &str = "convergence.json";

/// Append-only store of committed generations.
pub trait RunStore: Send {
    /// Persist one generation. Either the whole record becomes visible or
    /// none of it does.
    fn commit_generation(&mut self, record: &GenerationRecord) -> Result<(), StoreError>;

    /// Replace the stored convergence history.
    fn commit_history(&mut self, history: &ConvergenceHistory) -> Result<(), StoreError>;

    /// Every committed generation, in generation order.
    fn load(&self) -> Result<Vec<GenerationRecord>, StoreError>;

    /// Directory the store writes to, for stores backed by one.
    fn location(&self) -> Option<&Path> {
        None
    }
}

/// Store that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    generations: Vec<GenerationRecord>,
    history: Option<ConvergenceHistory>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generations(&self) -> &[GenerationRecord] {
        &self.generations
    }

    pub fn history(&self) -> Option<&ConvergenceHistory> {
        self.history.as_ref()
    }
}

impl RunStore for MemoryStore {
    fn commit_generation(&mut self, record: &GenerationRecord) -> Result<(), StoreError> {
        self.generations.push(record.clone());
        Ok(())
    }

    fn commit_history(&mut self, history: &ConvergenceHistory) -> Result<(), StoreError> {
        self.history = Some(history.clone());
        Ok(())
    }

    fn load(&self) -> Result<Vec<GenerationRecord>, StoreError> {
        Ok(self.generations.clone())
    }
}

/// One pretty-printed JSON file per generation in a directory.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    /// Use `dir` as a store, creating it if needed.
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Open an existing store directory.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(StoreError::NotADirectory(dir));
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn generation_path(&self, generation: usize) -> PathBuf {
        self.dir.join(format!("gen_{generation:05}.json"))
    }

    /// Read the stored convergence history, if one was written.
    pub fn load_history(&self) -> Result<Option<ConvergenceHistory>, StoreError> {
        let path = self.dir.join(HISTORY_FILE);
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }
}

impl RunStore for JsonDirStore {
    fn commit_generation(&mut self, record: &GenerationRecord) -> Result<(), StoreError> {
        let path = self.generation_path(record.generation);
        write_json_atomic(&path, record)?;
        debug!(
            "committed generation {} ({} boxes) to {}",
            record.generation,
            record.boxes.len(),
            path.display()
        );
        Ok(())
    }

    fn commit_history(&mut self, history: &ConvergenceHistory) -> Result<(), StoreError> {
        write_json_atomic(&self.dir.join(HISTORY_FILE), history)
    }

    fn load(&self) -> Result<Vec<GenerationRecord>, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| StoreError::Io {
                    path: self.dir.clone(),
                    source,
                })?
                .path();
            if let Some(name) = path.file_name().and_then(|n| n.to_str())
                && name.starts_with("gen_")
                && name.ends_with(".json")
            {
                paths.push(path);
            }
        }

        let mut records: Vec<GenerationRecord> = paths
            .iter()
            .map(|p| read_json(p))
            .collect::<Result<_, _>>()?;
        records.sort_by_key(|r| r.generation);
        Ok(records)
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.dir)
    }
}

/// Serialize to `<path>.tmp`, then rename over `path`.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|source| StoreError::Io {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Run store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Run store {0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("Run store {0} holds no generations")]
    Empty(PathBuf),
}
