//! Filesystem asset store for generated images.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

use crate::infrastructure::ports::{AssetError, AssetStorePort};

/// Stores assets under a root directory. Returned paths are relative to it.
pub struct FsAssetStore {
    root: PathBuf,
}

impl FsAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative folder under the root, refusing anything that escapes it.
    fn resolve(&self, folder: &str) -> Result<PathBuf, AssetError> {
        let relative = Path::new(folder.trim_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(AssetError::InvalidPath(folder.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl AssetStorePort for FsAssetStore {
    async fn ensure_folder(&self, folder: &str) -> Result<(), AssetError> {
        let path = self.resolve(folder)?;
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| AssetError::io(path.display().to_string(), e))
    }

    async fn folder_exists(&self, folder: &str) -> Result<bool, AssetError> {
        let path = self.resolve(folder)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AssetError::io(path.display().to_string(), e)),
        }
    }

    async fn upload(
        &self,
        folder: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String, AssetError> {
        if filename.is_empty() || filename.contains(['/', '\\']) || filename.starts_with('.') {
            return Err(AssetError::InvalidPath(filename.to_string()));
        }
        let dir = self.resolve(folder)?;
        let path = dir.join(filename);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AssetError::io(path.display().to_string(), e))?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Stored asset");
        Ok(format!("{}/{}", folder.trim_matches('/'), filename))
    }
}
