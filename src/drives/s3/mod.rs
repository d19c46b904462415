//! S3-compatible drive
//!
//! Writes objects with a path-style `PUT {endpoint}/{bucket}/{key}` request,
//! signed with SigV4 when credentials are available.
//!
//! # Example
//!
//! ```no_run
//! use upstow::drives::s3::{Credentials, S3Drive, S3DriveOptions};
//! use bytes::Bytes;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let drive = S3Drive::new(S3DriveOptions {
//!     bucket: "media".to_string(),
//!     region: "us-east-1".to_string(),
//!     endpoint: Some("http://localhost:9000".to_string()),
//!     credentials: Some(Credentials::new("minioadmin", "minioadmin")),
//!     timeout: None,
//! })?;
//!
//! let response = drive.put_object("hello.txt", Bytes::from("Hello"), Some("text/plain")).await?;
//! println!("ETag: {:?}", response.etag);
//! # Ok(())
//! # }
//! ```
//!
//! # Tracing
//!
//! | Operation | Span Name | Attributes |
//! |-----------|-----------|------------|
//! | PutObject | `s3.put_object` | bucket, key, method, bytes, etag, status_code |

use super::{DriveError, StorageDrive};
use crate::source::{sniff::sniff_mime_type, SourceDescriptor};
use async_trait::async_trait;
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::path::Path;
use std::time::Duration;

pub mod credentials;
pub mod signer;

pub use credentials::{Credentials, CredentialsError};
pub use signer::{SigV4Signer, SignedHeaders};

/// Characters left unescaped in object keys: RFC 3986 unreserved plus `/`
const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// S3 drive options
#[derive(Debug, Clone)]
pub struct S3DriveOptions {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub credentials: Option<Credentials>,
    pub timeout: Option<Duration>,
}

/// S3 PutObject response
#[derive(Debug, Clone)]
pub struct S3PutObjectResponse {
    pub etag: Option<String>,
}

/// S3-compatible drive
pub struct S3Drive {
    options: S3DriveOptions,
    http_client: reqwest::Client,
}

impl S3Drive {
    /// Create a new S3 drive
    pub fn new(options: S3DriveOptions) -> Result<Self, DriveError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| DriveError::Config(e.to_string()))?;

        Ok(Self {
            options,
            http_client,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.options.bucket
    }

    pub fn region(&self) -> &str {
        &self.options.region
    }

    /// Get the endpoint URL
    pub fn endpoint(&self) -> String {
        self.options
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://s3.{}.amazonaws.com", self.options.region))
    }

    /// Path-style object URL for `key`
    ///
    /// Empty keys and keys with `.` or `..` segments are rejected; URL parsing
    /// would otherwise turn them into a bucket request or resolve the dots away.
    pub fn object_url(&self, key: &str) -> Result<reqwest::Url, DriveError> {
        let key = key.trim_start_matches('/');
        if key.is_empty() {
            return Err(DriveError::InvalidKey("empty key".to_string()));
        }
        if key.split('/').any(|segment| segment == "." || segment == "..") {
            return Err(DriveError::InvalidKey(key.to_string()));
        }

        let raw = format!(
            "{}/{}/{}",
            self.endpoint().trim_end_matches('/'),
            self.options.bucket,
            utf8_percent_encode(key, KEY_ENCODE_SET)
        );
        reqwest::Url::parse(&raw)
            .map_err(|e| DriveError::Config(format!("Invalid object URL '{}': {}", raw, e)))
    }

    /// Upload an object (PutObject)
    #[tracing::instrument(
        name = "s3.put_object",
        skip(self, body),
        fields(
            s3.bucket = %self.options.bucket,
            s3.key = %key,
            http.method = "PUT",
            upload.bytes = body.len(),
            s3.etag = tracing::field::Empty,
            http.status_code = tracing::field::Empty
        ),
        err
    )]
    pub async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> Result<S3PutObjectResponse, DriveError> {
        let url = self.object_url(key)?;
        let mut request = self.http_client.put(url.clone());

        if let Some(content_type) = content_type {
            request = request.header(reqwest::header::CONTENT_TYPE, content_type);
        }

        if let Some(ref credentials) = self.options.credentials {
            let host = match (url.host_str(), url.port()) {
                (Some(host), Some(port)) => format!("{}:{}", host, port),
                (Some(host), None) => host.to_string(),
                (None, _) => {
                    return Err(DriveError::Config(format!("Object URL '{}' has no host", url)))
                }
            };
            let signed = SigV4Signer::new(credentials, &self.options.region).sign(
                "PUT",
                &host,
                url.path(),
                &body,
                chrono::Utc::now(),
            );

            request = request
                .header(reqwest::header::AUTHORIZATION, signed.authorization)
                .header("x-amz-date", signed.amz_date)
                .header("x-amz-content-sha256", signed.content_sha256);
            if let Some(token) = signed.security_token {
                request = request.header("x-amz-security-token", token);
            }
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| DriveError::Request(e.to_string()))?;

        let status = response.status();
        let span = tracing::Span::current();
        span.record("http.status_code", status.as_u16());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DriveError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let etag = response
            .headers()
            .get(reqwest::header::ETAG)
            .and_then(|value| value.to_str().ok())
            .map(String::from);

        if let Some(ref etag) = etag {
            span.record("s3.etag", etag.as_str());
        }

        tracing::info!(etag = ?etag, "PutObject completed");

        Ok(S3PutObjectResponse { etag })
    }
}

#[async_trait]
impl StorageDrive for S3Drive {
    async fn put_file(&self, local_path: &Path, key: &str) -> Result<(), DriveError> {
        let body = Bytes::from(tokio::fs::read(local_path).await?);
        let content_type = sniff_mime_type(&body);
        self.put_object(key, body, content_type).await?;
        Ok(())
    }

    async fn put_content(&self, descriptor: &SourceDescriptor, key: &str) -> Result<(), DriveError> {
        let content = descriptor.content().ok_or(DriveError::MissingContent)?;
        let content_type = sniff_mime_type(content);
        self.put_object(key, content.clone(), content_type).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "s3"
    }
}
