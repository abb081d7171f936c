//! Error types for configuration, verification, and request rejection

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors raised while constructing a [`crate::Verifier`] or overriding
/// guard settings. These are synchronous and fatal to setup; the caller
/// must fix the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The secret key was empty or whitespace-only
    #[error("Invalid secret key: it must be a non-empty string")]
    EmptySecretKey,

    /// The score threshold was outside the [0, 1] range
    #[error("Invalid score threshold: it must be a number between 0 and 1, got {0}")]
    ThresholdOutOfRange(f64),

    /// The underlying HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Errors raised by a single verification call. Terminal for that request
/// only; the middleware maps them to a [`RecaptchaRejection`].
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The token was empty after trimming, no outbound call was made
    #[error("Invalid token: it must be a non-empty string")]
    EmptyToken,

    /// The siteverify endpoint answered with a non-success status
    #[error("reCAPTCHA API returned status {0}")]
    UnexpectedStatus(StatusCode),

    /// Network failure or undecodable response from the siteverify endpoint
    #[error("Failed to reach reCAPTCHA API: {0}")]
    Transport(#[from] reqwest::Error),
}

/// JSON body sent to the client on rejection
#[derive(Debug, Serialize)]
struct ErrorBody {
    /// Human-readable error message
    error: String,
}

/// Rejection response produced when a request fails the reCAPTCHA check.
///
/// Renders as the configured status code with a JSON body
/// `{"error": <message>}`. The message is always the configured one;
/// underlying transport errors are logged server-side and never leak to
/// the client.
#[derive(Debug)]
pub struct RecaptchaRejection {
    status: StatusCode,
    message: String,
}

impl RecaptchaRejection {
    /// Create a rejection with the given status code and message
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// The HTTP status code this rejection renders with
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// The message placed in the JSON error body
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for RecaptchaRejection {
    fn into_response(self) -> Response {
        // Log the rejection based on status code
        match self.status.as_u16() {
            400..=499 => tracing::warn!("reCAPTCHA rejection: {} - {}", self.status, self.message),
            500..=599 => tracing::error!("reCAPTCHA rejection: {} - {}", self.status, self.message),
            _ => {}
        }

        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}
