//! Local filesystem drive
//!
//! Stores each key as a file below a root directory.

use super::{DriveError, StorageDrive};
use crate::source::SourceDescriptor;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem drive
#[derive(Debug, Clone)]
pub struct LocalDrive {
    root: PathBuf,
}

impl LocalDrive {
    /// Create a drive rooted at `root`, creating the directory if needed
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, DriveError> {
        let root = root.into();

        fs::create_dir_all(&root).await.map_err(|e| {
            DriveError::Config(format!(
                "Failed to create storage directory {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a storage key to a path below the root.
    ///
    /// Keys must be relative and must not contain `..` segments.
    pub fn key_to_path(&self, key: &str) -> Result<PathBuf, DriveError> {
        if key.is_empty() {
            return Err(DriveError::InvalidKey("empty key".into()));
        }

        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(DriveError::InvalidKey(format!(
                "'{}' resolves outside the storage root",
                key
            )));
        }

        Ok(self.root.join(relative))
    }

    async fn ensure_parent_dir(path: &Path) -> Result<(), DriveError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl StorageDrive for LocalDrive {
    #[tracing::instrument(
        name = "drive.local.put_file",
        skip(self),
        fields(drive.key = %key, upload.bytes = tracing::field::Empty),
        err
    )]
    async fn put_file(&self, local_path: &Path, key: &str) -> Result<(), DriveError> {
        let target = self.key_to_path(key)?;
        Self::ensure_parent_dir(&target).await?;

        let bytes = fs::copy(local_path, &target).await?;
        tracing::Span::current().record("upload.bytes", bytes);

        tracing::info!(
            path = %target.display(),
            bytes = bytes,
            "Local drive stored file"
        );

        Ok(())
    }

    #[tracing::instrument(
        name = "drive.local.put_content",
        skip(self, descriptor),
        fields(drive.key = %key, upload.bytes = descriptor.length()),
        err
    )]
    async fn put_content(&self, descriptor: &SourceDescriptor, key: &str) -> Result<(), DriveError> {
        let content = descriptor.content().ok_or(DriveError::MissingContent)?;
        let target = self.key_to_path(key)?;
        Self::ensure_parent_dir(&target).await?;

        let mut file = fs::File::create(&target).await?;
        file.write_all(content).await?;
        file.sync_all().await?;

        tracing::info!(
            path = %target.display(),
            bytes = content.len(),
            "Local drive stored content"
        );

        Ok(())
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_key_to_path_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let drive = tokio_test::block_on(LocalDrive::new(dir.path())).unwrap();

        assert!(drive.key_to_path("../etc/passwd").is_err());
        assert!(drive.key_to_path("a/../../b").is_err());
        assert!(drive.key_to_path("/abs/path").is_err());
        assert!(drive.key_to_path("").is_err());
        assert_eq!(
            drive.key_to_path("2024/01/02/x.png").unwrap(),
            dir.path().join("2024/01/02/x.png")
        );
    }

    #[tokio::test]
    async fn test_put_content_creates_parents() {
        let dir = TempDir::new().unwrap();
        let drive = LocalDrive::new(dir.path()).await.unwrap();

        let descriptor = SourceDescriptor::from_raw_content("hello");
        drive.put_content(&descriptor, "notes/today.txt").await.unwrap();

        let stored = std::fs::read(dir.path().join("notes/today.txt")).unwrap();
        assert_eq!(stored, b"hello");
    }

    #[tokio::test]
    async fn test_put_content_requires_memory_body() {
        let dir = TempDir::new().unwrap();
        let drive = LocalDrive::new(dir.path()).await.unwrap();

        let descriptor = SourceDescriptor::from_local_path("/tmp/whatever.txt");
        let err = drive.put_content(&descriptor, "k.txt").await.unwrap_err();
        assert!(matches!(err, DriveError::MissingContent));
    }

    #[tokio::test]
    async fn test_put_file_copies() {
        let source_dir = TempDir::new().unwrap();
        let source = source_dir.path().join("report.csv");
        std::fs::write(&source, "a,b\n1,2\n").unwrap();

        let dir = TempDir::new().unwrap();
        let drive = LocalDrive::new(dir.path().join("store")).await.unwrap();
        drive.put_file(&source, "reports/q1.csv").await.unwrap();

        let stored = std::fs::read_to_string(dir.path().join("store/reports/q1.csv")).unwrap();
        assert_eq!(stored, "a,b\n1,2\n");
    }

    #[tokio::test]
    async fn test_put_file_missing_source() {
        let dir = TempDir::new().unwrap();
        let drive = LocalDrive::new(dir.path()).await.unwrap();

        let err = drive
            .put_file(Path::new("/nonexistent/upstow-source.bin"), "x.bin")
            .await
            .unwrap_err();
        assert!(matches!(err, DriveError::Io(_)));
    }
}
