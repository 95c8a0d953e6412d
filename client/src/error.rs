use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// The repository answered with a structured `success: false` envelope.
    #[error("upstream rejected the request: {0}")]
    Upstream(String),

    /// Network or protocol-level failure, no structured response available.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// Envelope claimed success but carried no payload.
    #[error("upstream response missing payload")]
    MissingPayload,
}
