//! Source reader module
//!
//! Classifies an upload source and normalizes it into a [`SourceDescriptor`].
//!
//! # Source kinds
//!
//! | Source | Reads bytes | Sniffs extension |
//! |--------|-------------|------------------|
//! | Network URL | yes (HTTP GET) | first 10 bytes |
//! | Upload stream (multipart part) | yes | first 10 bytes |
//! | Raw content | already in memory | no |
//! | Local path | no, the drive reads it | from the file name |

use bytes::Bytes;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod network;
pub mod sniff;
pub mod stream;

pub use network::{FetchOptions, NetworkFetcher};
pub use sniff::sniff_extension;

/// Source read errors
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Fetching {url} returned HTTP {status}")]
    FetchStatus { url: String, status: u16 },

    #[error("Failed to open upload stream: {0}")]
    StreamOpen(String),

    #[error("Failed to read upload stream: {0}")]
    StreamRead(String),

    #[error("Upload stream contains no file part")]
    MissingPart,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::Client(_) => "client",
            SourceError::Fetch { .. } | SourceError::FetchStatus { .. } => "fetch",
            SourceError::StreamOpen(_) => "stream_open",
            SourceError::StreamRead(_) => "stream_read",
            SourceError::MissingPart => "missing_part",
            SourceError::Io(_) => "io",
        }
    }
}

/// Where the bytes of an upload live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceBody {
    /// Content already read into memory
    Memory(Bytes),
    /// A file on local disk, read by the drive during the write
    LocalFile(PathBuf),
}

/// Normalized, immutable description of one upload source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    body: SourceBody,
    length: u64,
    extension: String,
}

impl SourceDescriptor {
    /// Build a descriptor from in-memory content and a known extension
    pub fn new(content: impl Into<Bytes>, extension: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            length: content.len() as u64,
            body: SourceBody::Memory(content),
            extension: extension.into(),
        }
    }

    /// Build a descriptor from in-memory content, sniffing its extension
    pub fn sniffed(content: impl Into<Bytes>) -> Self {
        let content = content.into();
        let extension = sniff_extension(&content);
        Self::new(content, extension)
    }

    /// Wrap raw text. No sniffing is done, so the extension stays empty.
    pub fn from_raw_content(text: impl Into<String>) -> Self {
        Self::new(Bytes::from(text.into()), String::new())
    }

    /// Describe a local file without reading it.
    ///
    /// The extension is whatever follows the last `.` of the file name, so
    /// dotfiles count too (`.env` gives `env`). Length is left at zero; the
    /// drive reads the file itself.
    pub fn from_local_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let extension = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .and_then(|name| name.rsplit_once('.').map(|(_, ext)| ext.to_string()))
            .unwrap_or_default();

        Self {
            body: SourceBody::LocalFile(path.to_path_buf()),
            length: 0,
            extension,
        }
    }

    /// Fetch a network file with a default fetcher
    pub async fn from_network(url: &str) -> Result<Self, SourceError> {
        NetworkFetcher::new(FetchOptions::default())?.fetch(url).await
    }

    pub fn body(&self) -> &SourceBody {
        &self.body
    }

    /// In-memory content, `None` for local file sources
    pub fn content(&self) -> Option<&Bytes> {
        match &self.body {
            SourceBody::Memory(bytes) => Some(bytes),
            SourceBody::LocalFile(_) => None,
        }
    }

    /// Local file path, `None` for in-memory sources
    pub fn local_path(&self) -> Option<&Path> {
        match &self.body {
            SourceBody::LocalFile(path) => Some(path),
            SourceBody::Memory(_) => None,
        }
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}
