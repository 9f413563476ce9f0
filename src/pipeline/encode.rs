//! Image encoding: page PNG on disk → base64 text for the JSON request body.
//!
//! The vision endpoint accepts images as base64 data URIs. The URI keeps the
//! `image/jpeg` media type the endpoint has always been sent; the service
//! sniffs the actual format from the bytes.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use tracing::debug;

/// Media type placed in the data URI.
pub const DATA_URI_MEDIA_TYPE: &str = "image/jpeg";

/// Read `path` and return its bytes as standard base64.
pub fn encode_artifact(path: &Path) -> Result<String, std::io::Error> {
    let bytes = std::fs::read(path)?;
    let b64 = STANDARD.encode(&bytes);
    debug!("Encoded {} → {} bytes base64", path.display(), b64.len());
    Ok(b64)
}

/// Wrap a base64 payload as a `data:` URI.
pub fn data_uri(b64: &str) -> String {
    format!("data:{DATA_URI_MEDIA_TYPE};base64,{b64}")
}
