use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Filesystem blob store for uploaded profile pictures.
///
/// Stored paths are relative to the upload root so the database stays valid
/// if the root moves.  Writes land under a fresh random name; the caller
/// swaps the stored path and only then deletes the old blob, so a reader
/// always sees a complete picture.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Ensure the upload root exists.
    pub async fn init(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create upload dir {}", self.root.display()))?;
        Ok(())
    }

    /// Write `data` under a random name, keeping the original extension.
    /// Returns the relative path to store in the database.
    pub async fn store(&self, original_name: &str, data: &[u8]) -> Result<String> {
        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");
        let name = format!("{}.{}", crate::database::utils::random_hex(10), ext);

        let path = self.root.join(&name);
        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("Failed to write blob {}", path.display()))?;

        debug!("Stored blob: {} ({} bytes)", name, data.len());
        Ok(name)
    }

    /// Delete a previously stored blob.  Missing files are not an error;
    /// the swap already happened and the stale name is all that is lost.
    pub async fn delete(&self, relative: &str) -> Result<()> {
        // Stored names never contain separators; reject anything that does.
        if relative.contains('/') || relative.contains('\\') || relative.contains("..") {
            anyhow::bail!("Invalid blob name: {}", relative);
        }

        let path = self.root.join(relative);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Blob already gone: {}", relative);
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to delete blob {}", path.display())),
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_then_delete_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());
        store.init().await.unwrap();

        let name = store.store("avatar.png", b"pngdata").await.unwrap();
        assert!(name.ends_with(".png"));
        assert_eq!(
            tokio::fs::read(dir.path().join(&name)).await.unwrap(),
            b"pngdata"
        );

        store.delete(&name).await.unwrap();
        assert!(tokio::fs::read(dir.path().join(&name)).await.is_err());
    }

    #[tokio::test]
    async fn delete_of_missing_blob_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());
        store.init().await.unwrap();
        assert!(store.delete("gone.png").await.is_ok());
    }

    #[tokio::test]
    async fn delete_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());
        assert!(store.delete("../etc/passwd").await.is_err());
    }

    #[tokio::test]
    async fn two_stores_get_distinct_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());
        store.init().await.unwrap();

        let a = store.store("a.png", b"a").await.unwrap();
        let b = store.store("a.png", b"b").await.unwrap();
        assert_ne!(a, b);
    }
}
