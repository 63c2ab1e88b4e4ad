use base64::{Engine as _, engine::general_purpose};

use crate::{LogoError, LogoResult};

/// Decode a `<mime-prefix>,<base64-payload>` data URI into the raw image bytes.
///
/// Only the segment after the first comma is decoded; the prefix is not validated.
pub fn decode_data_uri(data_uri: &str) -> LogoResult<Vec<u8>> {
    let (_, payload) = data_uri.split_once(',').ok_or_else(|| {
        LogoError::MalformedInput("image must be a data URI with a base64 payload".to_string())
    })?;

    let payload = payload.trim();
    if payload.is_empty() {
        return Err(LogoError::MalformedInput(
            "image data URI has an empty payload".to_string(),
        ));
    }

    general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| LogoError::MalformedInput(format!("invalid base64 payload: {e}")))
}

/// Encode bytes as a `data:<mime>;base64,` URI.
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", general_purpose::STANDARD.encode(bytes))
}
