use super::s3::{Credentials, S3DriveOptions};
use super::{DriveError, LocalDrive, S3Drive, StorageDrive};
use crate::config::DriveConfig;
use std::sync::Arc;

/// Create a storage drive based on configuration
pub async fn create_drive(config: &DriveConfig) -> Result<Arc<dyn StorageDrive>, DriveError> {
    match config {
        DriveConfig::Local(local) => {
            let drive = LocalDrive::new(&local.root).await?;
            Ok(Arc::new(drive))
        }
        DriveConfig::S3(s3) => {
            let credentials = Credentials::from_config(s3)?;
            let drive = S3Drive::new(S3DriveOptions {
                bucket: s3.bucket.clone(),
                region: s3.region.clone(),
                endpoint: s3.endpoint.clone(),
                credentials,
                timeout: None,
            })?;
            Ok(Arc::new(drive))
        }
    }
}
