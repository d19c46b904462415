//! Storage drives
//!
//! A drive is a concrete storage provider. The facade only ever talks to the
//! [`StorageDrive`] trait, so any provider with the two write operations below
//! can be plugged in.

use crate::source::SourceDescriptor;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

pub mod factory;
pub mod local;
pub mod s3;

pub use factory::create_drive;
pub use local::LocalDrive;
pub use s3::S3Drive;

/// Drive write errors
#[derive(Error, Debug)]
pub enum DriveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request error: {0}")]
    Request(String),

    #[error("Drive rejected write with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credentials error: {0}")]
    Credentials(#[from] s3::CredentialsError),

    #[error("Descriptor has no in-memory content")]
    MissingContent,
}

/// Write contract every storage provider implements
#[async_trait]
pub trait StorageDrive: Send + Sync {
    /// Store the file at `local_path` under `key`. The drive reads the file itself.
    async fn put_file(&self, local_path: &Path, key: &str) -> Result<(), DriveError>;

    /// Store the in-memory content of `descriptor` under `key`
    async fn put_content(&self, descriptor: &SourceDescriptor, key: &str) -> Result<(), DriveError>;

    /// Short provider name used in logs and metrics
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_display() {
        let err = DriveError::Rejected {
            status: 403,
            body: "AccessDenied".into(),
        };
        assert_eq!(
            err.to_string(),
            "Drive rejected write with HTTP 403: AccessDenied"
        );
    }
}
