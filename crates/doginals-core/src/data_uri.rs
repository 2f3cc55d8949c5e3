//! `data:` URI capture of inscription content.
//!
//! Content is stored as `data:{mime};base64,{payload}` so the MIME type
//! travels with the bytes in a single string.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUri {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    pub fn encode(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    /// Parse a `data:` URI. Both base64 and plain (percent-free) payloads are
    /// accepted; an empty MIME type falls back to `text/plain`.
    pub fn parse(uri: &str) -> Result<Self, CoreError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| CoreError::InvalidData("data URI must start with `data:`".to_owned()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| CoreError::InvalidData("data URI is missing `,`".to_owned()))?;

        let (mime, is_base64) = match header.strip_suffix(";base64") {
            Some(mime) => (mime, true),
            None => (header, false),
        };
        let mime = if mime.is_empty() { "text/plain" } else { mime };

        let bytes = if is_base64 {
            STANDARD
                .decode(payload)
                .map_err(|e| CoreError::InvalidData(format!("invalid base64 payload: {e}")))?
        } else {
            payload.as_bytes().to_vec()
        };

        Ok(Self::new(mime, bytes))
    }

    /// MIME type without parameters, lowercased.
    pub fn essence(&self) -> String {
        self.mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }

    pub fn is_image(&self) -> bool {
        self.essence().starts_with("image/")
    }

    pub fn is_text(&self) -> bool {
        self.essence().starts_with("text")
    }

    /// UTF-8 rendering for text content; `None` for anything else.
    pub fn text(&self) -> Option<String> {
        self.is_text()
            .then(|| String::from_utf8_lossy(&self.bytes).into_owned())
    }
}
