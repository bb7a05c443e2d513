//! Inline (data URL) encoding for the degraded storage path.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// A data URL that could not be decoded.
#[derive(Debug, Error)]
pub enum InlineDecodeError {
    /// Missing `data:` prefix or `;base64,` separator.
    #[error("not a base64 data URL")]
    Malformed,

    /// Payload is not valid base64.
    #[error("invalid base64 payload: {0}")]
    Payload(#[from] base64::DecodeError),
}

/// Bytes and MIME type recovered from a data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineAsset {
    /// MIME type carried by the URL.
    pub mime_type: String,
    /// Decoded payload.
    pub bytes: Vec<u8>,
}

/// `data:<mime>;base64,<payload>` holding the entire asset.
#[must_use]
pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

/// Reverse of [`encode_data_url`].
///
/// # Errors
///
/// Returns an error if `url` is not a base64 data URL.
pub fn decode_data_url(url: &str) -> Result<InlineAsset, InlineDecodeError> {
    let rest = url.strip_prefix("data:").ok_or(InlineDecodeError::Malformed)?;
    let (mime_type, payload) = rest
        .split_once(";base64,")
        .ok_or(InlineDecodeError::Malformed)?;

    Ok(InlineAsset {
        mime_type: mime_type.to_string(),
        bytes: STANDARD.decode(payload)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_shape() {
        let url = encode_data_url("image/png", b"\x89PNG");
        assert_eq!(url, "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn test_decode_reproduces_input() {
        let bytes: Vec<u8> = (0..=255).collect();
        let decoded = decode_data_url(&encode_data_url("image/jpeg", &bytes)).unwrap();
        assert_eq!(decoded.mime_type, "image/jpeg");
        assert_eq!(decoded.bytes, bytes);
    }

    #[test]
    fn test_decode_rejects_links() {
        assert!(matches!(
            decode_data_url("http://localhost:9000/b/1.jpg"),
            Err(InlineDecodeError::Malformed)
        ));
        assert!(matches!(
            decode_data_url("data:image/png,plain"),
            Err(InlineDecodeError::Malformed)
        ));
        assert!(matches!(
            decode_data_url("data:image/png;base64,@@@"),
            Err(InlineDecodeError::Payload(_))
        ));
    }
}
