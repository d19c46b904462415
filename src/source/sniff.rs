//! Extension sniffing from leading content bytes

/// Number of leading bytes inspected when sniffing
pub const SNIFF_LEN: usize = 10;

/// Infer a file extension from the first [`SNIFF_LEN`] bytes of `content`.
///
/// Returns an empty string for unknown signatures and for short or empty input.
pub fn sniff_extension(content: &[u8]) -> String {
    let head = &content[..content.len().min(SNIFF_LEN)];
    infer::get(head)
        .map(|kind| kind.extension().to_string())
        .unwrap_or_default()
}

/// Best-effort MIME type for in-memory content
pub fn sniff_mime_type(content: &[u8]) -> Option<&'static str> {
    infer::get(content).map(|kind| kind.mime_type())
}
