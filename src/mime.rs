//! Two-stage Content-Type resolution for the first chunk of a subscriber
//! session: content sniffing first, extension-based lookup on the generic
//! fallback on the generic binary result.

const OCTET_STREAM: &str = "application/octet-stream";

/// Sniff `bytes`, falling back to an extension guess from `path` when the
/// sniffer can't identify the content (or only identifies it as opaque
/// binary).
pub fn resolve_content_type(bytes: &[u8], path: &str) -> String {
    if let Some(kind) = infer::get(bytes) {
        return kind.mime_type().to_string();
    }
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(OCTET_STREAM)
        .to_string()
}
