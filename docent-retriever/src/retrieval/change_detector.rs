//! Finds documents whose content differs from what the index holds.

use super::hasher::ContentHasher;
use crate::storage::ChunkStore;
use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of comparing a directory with the index. All lists are sorted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    pub all_files: Vec<PathBuf>,
    /// Not in the index yet
    pub new_files: Vec<PathBuf>,
    /// Indexed under a different content hash
    pub changed_files: Vec<PathBuf>,
    pub unchanged_files: Vec<PathBuf>,
    /// Indexed but gone from disk
    pub removed_files: Vec<String>,
}

impl ChangeSet {
    /// Files that need (re)indexing.
    pub fn pending(&self) -> impl Iterator<Item = &PathBuf> {
        self.new_files.iter().chain(&self.changed_files)
    }

    pub fn is_clean(&self) -> bool {
        self.new_files.is_empty() && self.changed_files.is_empty() && self.removed_files.is_empty()
    }
}

/// Canonical form of a documents directory, so every spelling of it
/// (relative, absolute, `./docs`, `docs/.`) yields the same document keys.
/// A directory that cannot be resolved is returned lexically normalized.
pub fn document_root(dir: &Path) -> PathBuf {
    dir.canonicalize()
        .unwrap_or_else(|_| PathBuf::from(path_key(dir)))
}

/// Recursively list files under `dir` whose extension is in `extensions`
/// (case-insensitive), honoring ignore files. Paths are rooted at
/// [`document_root`]. A missing directory yields an empty list.
pub fn list_documents(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        warn!("Documents directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }

    let root = dir
        .canonicalize()
        .with_context(|| format!("Failed to resolve documents directory {}", dir.display()))?;
    let mut files = Vec::new();
    for entry in WalkBuilder::new(&root).build() {
        let entry =
            entry.with_context(|| format!("Failed to walk documents directory {}", dir.display()))?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|wanted| wanted.eq_ignore_ascii_case(ext)));
        if matches {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Key under which a document's chunks are stored: the path without `.`
/// components or redundant separators.
pub fn path_key(path: &Path) -> String {
    let normalized: PathBuf = path
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect();
    normalized.to_string_lossy().to_string()
}

pub struct ChangeDetector {
    store: Arc<dyn ChunkStore>,
    hasher: Arc<dyn ContentHasher>,
    extensions: Vec<String>,
}

impl ChangeDetector {
    pub fn new(
        store: Arc<dyn ChunkStore>,
        hasher: Arc<dyn ContentHasher>,
        extensions: Vec<String>,
    ) -> Self {
        Self {
            store,
            hasher,
            extensions,
        }
    }

    pub fn list_documents(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        list_documents(dir, &self.extensions)
    }

    /// Classify every document under `dir` against the index.
    ///
    /// Only indexed paths under `dir` can be reported as removed. Unreadable
    /// files are logged and left out of every list but `all_files`.
    pub async fn scan(&self, dir: &Path) -> Result<ChangeSet> {
        let all_files = self.list_documents(dir)?;
        let mut indexed = self.store.indexed_files().await?;
        let mut changes = ChangeSet::default();

        for path in &all_files {
            let key = path_key(path);
            let stored_hash = indexed.remove(&key);
            let content = match tokio::fs::read_to_string(path).await {
                Ok(content) => content,
                Err(e) => {
                    warn!("Skipping unreadable document {}: {}", path.display(), e);
                    continue;
                }
            };

            let current_hash = self.hasher.hash(&content);
            match stored_hash {
                None => changes.new_files.push(path.clone()),
                Some(stored) if stored != current_hash => changes.changed_files.push(path.clone()),
                Some(_) => changes.unchanged_files.push(path.clone()),
            }
        }

        let root = document_root(dir);
        let listed: HashSet<String> = all_files.iter().map(|path| path_key(path)).collect();
        let mut removed: Vec<String> = indexed
            .into_keys()
            .filter(|key| Path::new(key).starts_with(&root) && !listed.contains(key))
            .collect();
        removed.sort();
        changes.removed_files = removed;
        changes.all_files = all_files;

        debug!(
            "Scanned {}: {} files, {} new, {} changed, {} removed",
            dir.display(),
            changes.all_files.len(),
            changes.new_files.len(),
            changes.changed_files.len(),
            changes.removed_files.len()
        );
        Ok(changes)
    }
}
