//! Static (base-tier) metadata index.
//!
//! Built once at startup by scanning a fixed directory layout: one
//! subdirectory per project, one JSON file per collection, the file's
//! top-level keys being decimal token-id strings. Read-only after load, so
//! concurrent request handlers can share it without synchronization.

use crate::metadata::MetadataRecord;
use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Errors raised while building the index. Any of these is fatal at
/// startup: serving from a partially loaded index is worse than refusing
/// to start.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] io::Error),

    #[error("failed to parse `{0}` as a token metadata map")]
    Parse(PathBuf, #[source] serde_json::Error),

    #[error("`{path}` has non-canonical token id key `{key}` (expected decimal, no leading zeros)")]
    TokenKey { path: PathBuf, key: String },
}

type CollectionMap = BTreeMap<String, MetadataRecord>;

/// Three-level mapping: project -> collection -> token id -> record.
#[derive(Debug, Default)]
pub struct StaticIndex {
    projects: BTreeMap<String, BTreeMap<String, CollectionMap>>,
}

impl StaticIndex {
    /// Scan `base_dir` and load every `<project>/<collection>.json` file.
    ///
    /// A missing base directory yields an empty index (the service can run
    /// dynamic-only); a malformed file inside it aborts the load.
    pub fn load(base_dir: &Path) -> Result<Self, IndexError> {
        let mut projects = BTreeMap::new();

        if !base_dir.is_dir() {
            return Ok(Self { projects });
        }

        for entry in read_dir(base_dir)? {
            let project_dir = entry.path();
            if !project_dir.is_dir() {
                continue;
            }
            let Some(project) = file_name(&project_dir) else {
                continue;
            };

            let mut collections = BTreeMap::new();
            for entry in read_dir(&project_dir)? {
                let file = entry.path();
                if file.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                let Some(collection) = file.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                collections.insert(collection.to_string(), load_collection(&file)?);
            }

            projects.insert(project, collections);
        }

        Ok(Self { projects })
    }

    /// Pure three-level traversal; absence at any level is `None`.
    pub fn lookup(
        &self,
        project: &str,
        collection: &str,
        token_id: &str,
    ) -> Option<&MetadataRecord> {
        self.projects
            .get(project)?
            .get(collection)?
            .get(token_id)
    }

    /// Total number of records across all collections.
    pub fn record_count(&self) -> usize {
        self.projects
            .values()
            .flat_map(|collections| collections.values())
            .map(BTreeMap::len)
            .sum()
    }

    /// Build an index directly from records, bypassing the filesystem.
    #[cfg(test)]
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = (String, String, String, MetadataRecord)>,
    {
        let mut index = Self::default();
        for (project, collection, token_id, record) in records {
            index
                .projects
                .entry(project)
                .or_default()
                .entry(collection)
                .or_default()
                .insert(token_id, record);
        }
        index
    }
}

fn read_dir(dir: &Path) -> Result<Vec<fs::DirEntry>, IndexError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| IndexError::Io(dir.to_path_buf(), e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| IndexError::Io(dir.to_path_buf(), e))?;
    Ok(entries)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

/// Parse one collection file and verify its token-id keys.
///
/// Lookups use the exact string the producer wrote, so keys must already
/// be canonical decimal (`"42"`, never `"042"`).
fn load_collection(path: &Path) -> Result<CollectionMap, IndexError> {
    let content = fs::read_to_string(path).map_err(|e| IndexError::Io(path.to_path_buf(), e))?;
    let map: CollectionMap =
        serde_json::from_str(&content).map_err(|e| IndexError::Parse(path.to_path_buf(), e))?;

    for key in map.keys() {
        if !is_canonical_token_id(key) {
            return Err(IndexError::TokenKey {
                path: path.to_path_buf(),
                key: key.clone(),
            });
        }
    }

    Ok(map)
}

fn is_canonical_token_id(key: &str) -> bool {
    !key.is_empty()
        && key.bytes().all(|b| b.is_ascii_digit())
        && (key == "0" || !key.starts_with('0'))
}
