use serde::Deserialize;

use crate::error::ClientError;

/// Fallback text when the upstream rejects a request without a message.
pub const UNSPECIFIED_UPSTREAM_ERROR: &str = "upstream request failed";

/// Uniform response envelope used by every repository endpoint.
///
/// The core never interprets HTTP status codes; success and failure are
/// decided solely by this envelope.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    pub success: bool,

    #[serde(default)]
    pub data: Option<T>,

    #[serde(default)]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// Collapse the envelope into the inner payload or a `ClientError`.
    pub fn into_result(self) -> Result<T, ClientError> {
        if !self.success {
            let message = self
                .message
                .unwrap_or_else(|| UNSPECIFIED_UPSTREAM_ERROR.to_string());
            return Err(ClientError::Upstream(message));
        }

        self.data.ok_or(ClientError::MissingPayload)
    }
}
