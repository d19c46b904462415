//! Upstow Library
//!
//! Uploads local files, network files, multipart upload parts and raw content
//! to a pluggable object-storage drive, returning the storage key and public URL.
//!
//! # Features
//!
//! - **Four sources**: network URL, multipart part / async reader, raw text, local path
//! - **Key policy**: `YYYY/MM/DD/<uuid>.<ext>` auto paths, extension appending, prefixes
//! - **Pluggable drives**: local filesystem and S3-compatible stores out of the box
//! - **Shareable**: no per-call state on the facade, safe to share behind an `Arc`
//!
//! # Example
//!
//! ```no_run
//! use upstow::{config::Config, storage::ObjectStorage};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("upstow.yaml")?;
//!     let storage = ObjectStorage::from_config(&config).await?;
//!     let result = storage.put_str("hello").await?;
//!     println!("{}", result.url);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod drives;
pub mod metrics;
pub mod source;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use drives::{DriveError, StorageDrive};
pub use source::{SourceDescriptor, SourceError};
pub use storage::{ObjectStorage, StorageOptions, Upload, UploadError, UploadResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
