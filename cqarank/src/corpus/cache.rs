//! On-disk cache of document trees
//!
//! Annotating a corpus is slow while reading a finished tree back is cheap,
//! so trees are stored as JSON under a content-addressed name.

use super::tree::{ContentScope, DocumentTree};
use crate::error::Result;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Content-derived cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for a record source and the scope used to build its tree
    pub fn new(source: &[u8], scope: ContentScope) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source);
        hasher.update([0u8]);
        hasher.update(scope.name().as_bytes());
        CacheKey(hex::encode(hasher.finalize()))
    }

    /// Key for a record file on disk
    pub fn from_file<P: AsRef<Path>>(path: P, scope: ContentScope) -> Result<Self> {
        let content = std::fs::read(path)?;
        Ok(CacheKey::new(&content, scope))
    }

    /// Hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Load-or-build cache of document trees
#[derive(Debug, Clone)]
pub struct TreeCache {
    dir: PathBuf,
}

impl TreeCache {
    /// Create a cache rooted at `dir` (created lazily on first store)
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        TreeCache {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for a key
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("tree-{}.json", key.as_str()))
    }

    /// Whether an entry exists for a key
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entry_path(key).is_file()
    }

    /// Return the cached tree, or build it, store it and return it
    pub fn load_or_build<F>(&self, key: &CacheKey, build: F) -> Result<DocumentTree>
    where
        F: FnOnce() -> Result<DocumentTree>,
    {
        let path = self.entry_path(key);
        if path.is_file() {
            tracing::info!("Loading document tree from {}", path.display());
            let file = File::open(&path)?;
            return Ok(serde_json::from_reader(BufReader::new(file))?);
        }

        tracing::info!("Creating document tree, this might take a while");
        let tree = build()?;

        std::fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer(&mut writer, &tree)?;
            writer.flush()?;
        }
        std::fs::rename(&tmp, &path)?;
        tracing::info!("Saved document tree to {}", path.display());

        Ok(tree)
    }
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes
            .as_ref()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }
}
