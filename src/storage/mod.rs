//! Storage facade
//!
//! [`ObjectStorage`] turns an upload source into a storage key, hands it to a
//! [`StorageDrive`] and reports the resulting key and public URL.
//!
//! # Concurrency
//!
//! The facade keeps no per-call state. Each call builds its own [`Upload`]
//! context, so one `ObjectStorage` can be shared behind an `Arc` by any number
//! of tasks without their keys interfering.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use upstow::drives::LocalDrive;
//! use upstow::storage::{ObjectStorage, StorageOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let drive = LocalDrive::new("/var/lib/upstow").await?;
//! let storage = ObjectStorage::new(
//!     Arc::new(drive),
//!     StorageOptions {
//!         path_prefix: "img/".into(),
//!         auto_generate_path: true,
//!         base_url: "https://cdn.example.com/".into(),
//!         ..Default::default()
//!     },
//! )?;
//!
//! let result = storage.put_net_file("https://example.com/logo.png").await?;
//! println!("{} -> {}", result.key, result.url);
//!
//! // Pin an explicit key for one call
//! let result = storage
//!     .with_path_key("avatars/42")
//!     .put_file("/tmp/avatar.png")
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::Config;
use crate::drives::{create_drive, DriveError, StorageDrive};
use crate::metrics;
use crate::source::stream::first_file_part;
use crate::source::{FetchOptions, NetworkFetcher, SourceBody, SourceDescriptor, SourceError};
use serde::Serialize;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

pub mod path;

pub use path::{build_base_path, StorageOptions};

/// Upload errors
#[derive(Error, Debug)]
pub enum UploadError {
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The drive failed. `result` holds the key and URL computed before the write.
    #[error("Drive failed to store '{}': {source}", .result.key)]
    Drive {
        result: UploadResult,
        #[source]
        source: DriveError,
    },

    /// The call ran past its deadline. `result` is set when the deadline hit
    /// during the drive write, in which case the object may be partly written.
    #[error("Upload timed out after {limit:?}")]
    TimedOut {
        limit: Duration,
        result: Option<UploadResult>,
    },
}

/// Errors building a facade from configuration
#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Drive(#[from] DriveError),

    #[error(transparent)]
    Source(#[from] SourceError),
}

impl UploadError {
    /// The computed result, when the failure happened after key computation
    pub fn result(&self) -> Option<&UploadResult> {
        match self {
            UploadError::Drive { result, .. } => Some(result),
            UploadError::TimedOut { result, .. } => result.as_ref(),
            UploadError::Source(_) => None,
        }
    }

    /// The drive error, untouched, when the drive failed
    pub fn drive_error(&self) -> Option<&DriveError> {
        match self {
            UploadError::Drive { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Where an upload ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    /// Full public URL, `base_url + key`
    pub url: String,
    /// Storage key written to the drive
    pub key: String,
    /// Byte length of the source; zero for local files
    pub size: u64,
    /// Extension used for key construction
    pub extension: String,
}

/// Upload facade over one drive
pub struct ObjectStorage {
    drive: Arc<dyn StorageDrive>,
    options: StorageOptions,
    fetcher: NetworkFetcher,
}

impl ObjectStorage {
    /// Create a facade with default fetch options
    pub fn new(drive: Arc<dyn StorageDrive>, options: StorageOptions) -> Result<Self, SourceError> {
        Self::with_fetch_options(drive, options, FetchOptions::default())
    }

    pub fn with_fetch_options(
        drive: Arc<dyn StorageDrive>,
        options: StorageOptions,
        fetch: FetchOptions,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            drive,
            options,
            fetcher: NetworkFetcher::new(fetch)?,
        })
    }

    /// Build the configured drive and wrap it in a facade
    pub async fn from_config(config: &Config) -> Result<Self, BuildError> {
        let drive = create_drive(&config.drive).await?;
        let storage = Self::with_fetch_options(
            drive,
            StorageOptions::from(&config.storage),
            FetchOptions::from(&config.fetch),
        )?;
        Ok(storage)
    }

    pub fn options(&self) -> &StorageOptions {
        &self.options
    }

    pub fn drive(&self) -> &Arc<dyn StorageDrive> {
        &self.drive
    }

    /// Generate a fresh `YYYY/MM/DD/<uuid>` base path for the current time
    pub fn build_base_path(&self) -> String {
        build_base_path(chrono::Utc::now())
    }

    /// Start an upload with an empty caller key
    pub fn upload(&self) -> Upload<'_> {
        Upload {
            storage: self,
            path_key: String::new(),
            timeout: None,
        }
    }

    /// Start an upload whose key is pinned to `path_key` before key computation
    pub fn with_path_key(&self, path_key: impl Into<String>) -> Upload<'_> {
        self.upload().path_key(path_key)
    }

    /// Upload a network file
    pub async fn put_net_file(&self, url: &str) -> Result<UploadResult, UploadError> {
        self.upload().put_net_file(url).await
    }

    /// Upload a multipart file part
    pub async fn put_upload_part(&self, field: multer::Field<'_>) -> Result<UploadResult, UploadError> {
        self.upload().put_upload_part(field).await
    }

    /// Upload the first file part of a multipart body
    pub async fn put_multipart(
        &self,
        multipart: &mut multer::Multipart<'_>,
    ) -> Result<UploadResult, UploadError> {
        self.upload().put_multipart(multipart).await
    }

    /// Upload everything an async reader yields
    pub async fn put_reader<R>(&self, reader: R) -> Result<UploadResult, UploadError>
    where
        R: tokio::io::AsyncRead + Unpin + Send,
    {
        self.upload().put_reader(reader).await
    }

    /// Upload a local file
    pub async fn put_file(&self, local_path: impl AsRef<Path>) -> Result<UploadResult, UploadError> {
        self.upload().put_file(local_path).await
    }

    /// Upload raw text content
    pub async fn put_str(&self, content: &str) -> Result<UploadResult, UploadError> {
        self.upload().put_str(content).await
    }

    /// Upload a caller-built descriptor
    pub async fn put_descriptor(
        &self,
        descriptor: SourceDescriptor,
    ) -> Result<UploadResult, UploadError> {
        self.upload().put_descriptor(descriptor).await
    }
}

/// Per-call upload context
///
/// Holds the caller's key and optional timeout for exactly one upload.
#[must_use = "an Upload does nothing until one of its put_* methods is awaited"]
pub struct Upload<'a> {
    storage: &'a ObjectStorage,
    path_key: String,
    timeout: Option<Duration>,
}

impl<'a> Upload<'a> {
    /// Pin the caller key. Ignored when auto-generated paths are enabled.
    pub fn path_key(mut self, path_key: impl Into<String>) -> Self {
        self.path_key = path_key.into();
        self
    }

    /// Bound the whole call (source read plus drive write). A deadline that
    /// hits during the write still reports the computed key.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Upload a network file
    pub async fn put_net_file(self, url: &str) -> Result<UploadResult, UploadError> {
        let storage = self.storage;
        self.run("network", storage.fetcher.fetch(url)).await
    }

    /// Upload a multipart file part
    pub async fn put_upload_part(self, field: multer::Field<'_>) -> Result<UploadResult, UploadError> {
        self.run("stream", SourceDescriptor::from_upload_stream(field))
            .await
    }

    /// Upload the first file part of a multipart body
    pub async fn put_multipart(
        self,
        multipart: &mut multer::Multipart<'_>,
    ) -> Result<UploadResult, UploadError> {
        self.run("stream", async {
            let field = first_file_part(multipart, None).await?;
            SourceDescriptor::from_upload_stream(field).await
        })
        .await
    }

    /// Upload everything an async reader yields
    pub async fn put_reader<R>(self, reader: R) -> Result<UploadResult, UploadError>
    where
        R: tokio::io::AsyncRead + Unpin + Send,
    {
        self.run("stream", SourceDescriptor::from_reader(reader))
            .await
    }

    /// Upload a local file. The drive reads the file during the write.
    pub async fn put_file(self, local_path: impl AsRef<Path>) -> Result<UploadResult, UploadError> {
        let descriptor = SourceDescriptor::from_local_path(local_path);
        self.run("local", async { Ok::<_, SourceError>(descriptor) }).await
    }

    /// Upload raw text content
    pub async fn put_str(self, content: &str) -> Result<UploadResult, UploadError> {
        let descriptor = SourceDescriptor::from_raw_content(content);
        self.run("raw", async { Ok::<_, SourceError>(descriptor) }).await
    }

    /// Upload a caller-built descriptor
    pub async fn put_descriptor(
        self,
        descriptor: SourceDescriptor,
    ) -> Result<UploadResult, UploadError> {
        self.run("descriptor", async { Ok::<_, SourceError>(descriptor) }).await
    }

    async fn run<F>(self, source: &'static str, read: F) -> Result<UploadResult, UploadError>
    where
        F: Future<Output = Result<SourceDescriptor, SourceError>>,
    {
        let outcome = self.execute(source, read).await;

        match &outcome {
            Ok(result) => metrics::record_upload_success(source, result.size),
            Err(_) => metrics::record_upload_failure(source),
        }

        outcome
    }

    /// Read the source, then write it, both within one deadline when a
    /// timeout is set.
    async fn execute<F>(&self, source: &'static str, read: F) -> Result<UploadResult, UploadError>
    where
        F: Future<Output = Result<SourceDescriptor, SourceError>>,
    {
        let deadline = self
            .timeout
            .map(|limit| (limit, tokio::time::Instant::now() + limit));

        let read = match deadline {
            Some((limit, at)) => tokio::time::timeout_at(at, read)
                .await
                .map_err(|_| UploadError::TimedOut {
                    limit,
                    result: None,
                })?,
            None => read.await,
        };
        let descriptor = read.inspect_err(|e| metrics::record_source_error(e.kind()))?;

        let result = self.prepare(&descriptor);
        match deadline {
            Some((limit, at)) => {
                match tokio::time::timeout_at(at, self.write(source, descriptor, result.clone()))
                    .await
                {
                    Ok(written) => written,
                    Err(_) => {
                        tracing::error!(key = %result.key, ?limit, "Upload timed out during write");
                        Err(UploadError::TimedOut {
                            limit,
                            result: Some(result),
                        })
                    }
                }
            }
            None => self.write(source, descriptor, result).await,
        }
    }

    /// Compute the key and URL for `descriptor`
    fn prepare(&self, descriptor: &SourceDescriptor) -> UploadResult {
        let options = &self.storage.options;
        let key = options.compute_key(&self.path_key, descriptor.extension(), chrono::Utc::now());

        UploadResult {
            url: options.url_for(&key),
            key,
            size: descriptor.length(),
            extension: descriptor.extension().to_string(),
        }
    }

    #[tracing::instrument(
        name = "storage.put",
        skip(self, descriptor, result),
        fields(
            drive = self.storage.drive.name(),
            upload.bytes = descriptor.length(),
            storage.key = %result.key
        ),
        err
    )]
    async fn write(
        &self,
        source: &'static str,
        descriptor: SourceDescriptor,
        result: UploadResult,
    ) -> Result<UploadResult, UploadError> {
        let drive = &self.storage.drive;
        let start_time = Instant::now();
        let written = match descriptor.body() {
            SourceBody::Memory(_) => drive.put_content(&descriptor, &result.key).await,
            SourceBody::LocalFile(path) => drive.put_file(path, &result.key).await,
        };
        metrics::record_upload_duration(drive.name(), start_time.elapsed().as_secs_f64());

        match written {
            Ok(()) => {
                tracing::info!(
                    key = %result.key,
                    url = %result.url,
                    bytes = result.size,
                    "Upload completed"
                );
                Ok(result)
            }
            Err(source) => Err(UploadError::Drive { result, source }),
        }
    }
}
