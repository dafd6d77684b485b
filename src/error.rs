use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Domain-specific error types for Stitcher
#[derive(Error, Debug)]
pub enum StitchError {
    #[error("Failed to fetch manifest from origin: {0}")]
    OriginFetch(#[from] reqwest::Error),

    #[error("Source is not a multivariant manifest")]
    NotMultivariant,

    #[error("Malformed manifest: {0}")]
    MalformedManifest(String),

    #[error("Failed to write playlist: {0}")]
    PlaylistWrite(String),

    #[error("No bandwidth candidates to match against")]
    EmptyCandidateSet,

    #[error("Missing payload in request")]
    MissingPayload,

    #[error("Failed to decode payload: {0}")]
    PayloadDecode(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StitchError {
    /// Whether a request-level retry can plausibly succeed.
    /// Malformed input will not change between attempts; transient fetch
    /// failures and splice hiccups might.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            StitchError::MalformedManifest(_)
                | StitchError::MissingPayload
                | StitchError::PayloadDecode(_)
        )
    }
}

// No internal detail is exposed to the caller; full context goes to the log.
impl IntoResponse for StitchError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            StitchError::MissingPayload => {
                tracing::error!("Request missing payload");
                (StatusCode::BAD_REQUEST, "Missing payload in request")
            }
            StitchError::PayloadDecode(ref e) => {
                tracing::error!("Payload decode error: {}", e);
                (StatusCode::BAD_REQUEST, "Invalid payload")
            }
            ref e => {
                tracing::error!("Request failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, message).into_response()
    }
}

// Convenience type alias for Results
pub type Result<T> = std::result::Result<T, StitchError>;
