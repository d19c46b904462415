//! Network file source
//!
//! Fetches a remote file over HTTP GET and turns it into a [`SourceDescriptor`].
//!
//! # Example
//!
//! ```no_run
//! use upstow::source::{FetchOptions, NetworkFetcher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = NetworkFetcher::new(FetchOptions::default())?;
//! let descriptor = fetcher.fetch("https://example.com/logo.png").await?;
//! println!("{} bytes, .{}", descriptor.length(), descriptor.extension());
//! # Ok(())
//! # }
//! ```

use super::{SourceDescriptor, SourceError};
use crate::config::FetchConfig;
use std::time::Duration;

/// HTTP fetch settings
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Whole-request timeout, `None` waits indefinitely
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            user_agent: format!("upstow/{}", crate::VERSION),
        }
    }
}

impl From<&FetchConfig> for FetchOptions {
    fn from(config: &FetchConfig) -> Self {
        Self {
            timeout: Some(Duration::from_secs(config.timeout_seconds)),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Fetches network files for upload
#[derive(Debug, Clone)]
pub struct NetworkFetcher {
    http_client: reqwest::Client,
}

impl NetworkFetcher {
    /// Create a new fetcher
    pub fn new(options: FetchOptions) -> Result<Self, SourceError> {
        let mut builder = reqwest::Client::builder().user_agent(options.user_agent);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        let http_client = builder.build().map_err(SourceError::Client)?;

        Ok(Self { http_client })
    }

    /// Download `url` and sniff its extension from the first bytes of the body.
    ///
    /// Transport errors, non-success statuses and body read errors are all
    /// returned as [`SourceError`]; nothing is uploaded for a failed fetch.
    #[tracing::instrument(
        name = "source.fetch",
        skip(self),
        fields(
            http.url = %url,
            http.status_code = tracing::field::Empty,
            source.bytes = tracing::field::Empty,
            source.extension = tracing::field::Empty
        ),
        err
    )]
    pub async fn fetch(&self, url: &str) -> Result<SourceDescriptor, SourceError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|source| SourceError::Fetch {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let span = tracing::Span::current();
        span.record("http.status_code", status.as_u16());

        if !status.is_success() {
            return Err(SourceError::FetchStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| SourceError::Fetch {
            url: url.to_string(),
            source,
        })?;

        let descriptor = SourceDescriptor::sniffed(body);
        span.record("source.bytes", descriptor.length());
        span.record("source.extension", descriptor.extension());

        tracing::debug!(
            bytes = descriptor.length(),
            extension = %descriptor.extension(),
            "Fetched network file"
        );

        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = FetchOptions::default();
        assert_eq!(options.timeout, Some(Duration::from_secs(30)));
        assert!(options.user_agent.starts_with("upstow/"));
    }

    #[test]
    fn test_options_from_config() {
        let config = FetchConfig {
            timeout_seconds: 5,
            user_agent: "test-agent".into(),
        };
        let options = FetchOptions::from(&config);
        assert_eq!(options.timeout, Some(Duration::from_secs(5)));
        assert_eq!(options.user_agent, "test-agent");
    }

    #[test]
    fn test_invalid_user_agent_is_client_error() {
        let err = NetworkFetcher::new(FetchOptions {
            user_agent: "bad\nagent".into(),
            ..Default::default()
        })
        .unwrap_err();

        assert!(matches!(err, SourceError::Client(_)));
        assert_eq!(err.kind(), "client");
        assert!(err.to_string().starts_with("Failed to build HTTP client"));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let fetcher = NetworkFetcher::new(FetchOptions::default()).unwrap();
        // Port 9 (discard) is not expected to accept HTTP connections locally
        let err = fetcher.fetch("http://127.0.0.1:9/file.png").await.unwrap_err();
        assert!(matches!(err, SourceError::Fetch { .. }));
    }
}
