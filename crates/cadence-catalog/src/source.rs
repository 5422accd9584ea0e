//! Job sources.
//!
//! A source yields raw entries: a discovery key plus a manifest value. The
//! manifest is either a bare handler id (string) or a record
//! `{name?, handler, ...engine options}`. Normalization into [`JobSpec`]s
//! happens in the catalog, not here.
//!
//! [`JobSpec`]: crate::job::JobSpec

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::CatalogError;

/// One discovered entry, before normalization.
#[derive(Debug, Clone)]
pub struct RawJobEntry {
    /// Discovery key (file stem for filesystem sources); used as the job
    /// name when the manifest does not carry one.
    pub key: String,
    /// Bare handler id or `{name?, handler, ...options}` record.
    pub manifest: serde_json::Value,
}

/// A source of job entries.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// All entries, in a deterministic order. A source that does not
    /// exist yields an empty list, not an error.
    async fn entries(&self) -> Result<Vec<RawJobEntry>, CatalogError>;
}

const MANIFEST_SUFFIX: &str = ".job.json";

/// Filesystem source: recursive scan for `*.job.json` manifests.
pub struct FsJobSource {
    root: PathBuf,
}

impl FsJobSource {
    /// Create a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn manifest_paths(&self) -> Result<Vec<PathBuf>, CatalogError> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(true) {
            let entry = entry.map_err(|e| CatalogError::Unreadable {
                path: self.root.display().to_string(),
                message: e.to_string(),
            })?;
            let path = entry.path();
            if entry.file_type().is_file() && is_manifest(path) {
                paths.push(path.to_path_buf());
            }
        }
        // Scan order is filesystem-dependent; sort for determinism.
        paths.sort();
        Ok(paths)
    }
}

fn is_manifest(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(MANIFEST_SUFFIX))
}

fn manifest_key(path: &Path) -> String {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    name.strip_suffix(MANIFEST_SUFFIX).unwrap_or(name).to_string()
}

#[async_trait]
impl JobSource for FsJobSource {
    async fn entries(&self) -> Result<Vec<RawJobEntry>, CatalogError> {
        if !self.root.exists() {
            debug!(root = %self.root.display(), "job source missing, loading zero jobs");
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for path in self.manifest_paths()? {
            let content =
                tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| CatalogError::Unreadable {
                        path: path.display().to_string(),
                        message: e.to_string(),
                    })?;
            let manifest: serde_json::Value =
                serde_json::from_str(&content).map_err(|e| CatalogError::BadManifest {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;

            entries.push(RawJobEntry {
                key: manifest_key(&path),
                manifest,
            });
        }
        Ok(entries)
    }
}

/// In-memory source for tests and embedded hosts.
#[derive(Default)]
pub struct MemoryJobSource {
    entries: Vec<RawJobEntry>,
}

impl MemoryJobSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry.
    pub fn with_entry(mut self, key: impl Into<String>, manifest: serde_json::Value) -> Self {
        self.entries.push(RawJobEntry {
            key: key.into(),
            manifest,
        });
        self
    }
}

#[async_trait]
impl JobSource for MemoryJobSource {
    async fn entries(&self) -> Result<Vec<RawJobEntry>, CatalogError> {
        Ok(self.entries.clone())
    }
}
