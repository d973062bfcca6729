use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::foundation::error::{StrobeError, StrobeResult};

/// Resolves logical asset names (audio tracks) to readable bytes.
///
/// Shared by every worker of an orchestrator run.
pub trait AssetResolver: Send + Sync {
    /// Open `name` for reading, or fail with [`StrobeError::AssetNotFound`].
    fn open(&self, name: &str) -> StrobeResult<Box<dyn Read + Send>>;

    /// Local filesystem path for `name`, when the asset already lives on disk.
    ///
    /// Encoders that need a path (e.g. `ffmpeg -i`) use this before falling back to copying
    /// the bytes from [`AssetResolver::open`] into a temporary file.
    fn local_path(&self, name: &str) -> StrobeResult<Option<PathBuf>> {
        let _ = name;
        Ok(None)
    }
}

/// Resolver rooted at a directory; names are relative paths below the root.
#[derive(Clone, Debug)]
pub struct DirAssetResolver {
    root: PathBuf,
}

impl DirAssetResolver {
    /// Resolve assets relative to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> StrobeResult<PathBuf> {
        let rel = normalize_rel_path(name)
            .map_err(|e| StrobeError::asset_not_found(name, e.to_string()))?;
        let path = self.root.join(rel);
        if !path.is_file() {
            return Err(StrobeError::asset_not_found(
                name,
                format!("no file at '{}'", path.display()),
            ));
        }
        Ok(path)
    }
}

impl AssetResolver for DirAssetResolver {
    fn open(&self, name: &str) -> StrobeResult<Box<dyn Read + Send>> {
        let path = self.resolve(name)?;
        let file = std::fs::File::open(&path)
            .map_err(|e| StrobeError::asset_not_found(name, e.to_string()))?;
        Ok(Box::new(file))
    }

    fn local_path(&self, name: &str) -> StrobeResult<Option<PathBuf>> {
        self.resolve(name).map(Some)
    }
}

/// In-memory resolver keyed by normalized name.
#[derive(Clone, Debug, Default)]
pub struct MemoryAssetResolver {
    assets: BTreeMap<String, Arc<[u8]>>,
}

impl MemoryAssetResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an asset.
    pub fn insert(&mut self, name: &str, bytes: impl Into<Arc<[u8]>>) -> StrobeResult<()> {
        self.assets.insert(normalize_rel_path(name)?, bytes.into());
        Ok(())
    }

    /// Builder-style [`MemoryAssetResolver::insert`].
    pub fn with(mut self, name: &str, bytes: impl Into<Arc<[u8]>>) -> StrobeResult<Self> {
        self.insert(name, bytes)?;
        Ok(self)
    }
}

impl AssetResolver for MemoryAssetResolver {
    fn open(&self, name: &str) -> StrobeResult<Box<dyn Read + Send>> {
        let key = normalize_rel_path(name)
            .map_err(|e| StrobeError::asset_not_found(name, e.to_string()))?;
        let bytes = self
            .assets
            .get(&key)
            .cloned()
            .ok_or_else(|| StrobeError::asset_not_found(name, "not registered"))?;
        Ok(Box::new(std::io::Cursor::new(bytes)))
    }
}

/// Normalize and validate asset names.
///
/// The result uses `/` separators, drops `.` segments, and rejects absolute paths or parent
/// traversals (`..`), so a name can never escape the resolver root.
pub(crate) fn normalize_rel_path(source: &str) -> StrobeResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(StrobeError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(StrobeError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(StrobeError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(StrobeError::validation(
            "asset path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/resolver.rs"]
mod tests;
