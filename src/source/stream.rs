//! Upload stream sources
//!
//! Reads a multipart file part (or any async reader) fully into memory and
//! sniffs its extension.

use super::{SourceDescriptor, SourceError};
use multer::{Field, Multipart};
use tokio::io::{AsyncRead, AsyncReadExt};

impl SourceDescriptor {
    /// Read a multipart file part to the end
    #[tracing::instrument(
        name = "source.upload_stream",
        skip(field),
        fields(
            multipart.field = ?field.name(),
            multipart.file_name = ?field.file_name(),
            source.bytes = tracing::field::Empty
        ),
        err
    )]
    pub async fn from_upload_stream(field: Field<'_>) -> Result<Self, SourceError> {
        let content = field
            .bytes()
            .await
            .map_err(|e| SourceError::StreamRead(e.to_string()))?;

        let descriptor = Self::sniffed(content);
        tracing::Span::current().record("source.bytes", descriptor.length());
        Ok(descriptor)
    }

    /// Read any async reader to the end
    pub async fn from_reader<R>(mut reader: R) -> Result<Self, SourceError>
    where
        R: AsyncRead + Unpin,
    {
        let mut content = Vec::new();
        reader
            .read_to_end(&mut content)
            .await
            .map_err(|e| SourceError::StreamRead(e.to_string()))?;

        Ok(Self::sniffed(content))
    }
}

/// Open the first file part of a multipart body.
///
/// With `field_name` set, only a part with that form name is accepted;
/// otherwise the first part carrying a file name wins.
pub async fn first_file_part<'r>(
    multipart: &mut Multipart<'r>,
    field_name: Option<&str>,
) -> Result<Field<'r>, SourceError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| SourceError::StreamOpen(e.to_string()))?
    {
        let matches = match field_name {
            Some(wanted) => field.name() == Some(wanted),
            None => field.file_name().is_some(),
        };

        if matches {
            return Ok(field);
        }
    }

    Err(SourceError::MissingPart)
}
