//! Request gating middleware and the score extractor

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, Request},
    http::{header::CONTENT_TYPE, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Extension,
};

use crate::config::validate_threshold;
use crate::error::{ConfigError, RecaptchaRejection};
use crate::verifier::Verifier;

/// JSON body field the token is read from
pub const RECAPTCHA_TOKEN_FIELD: &str = "recaptchaV3Token";

/// Header the token is read from when the body carries none
pub const RECAPTCHA_TOKEN_HEADER: &str = "recaptcha-v3-token";

/// Cap on how much of a JSON body is buffered for token extraction.
/// Larger JSON bodies are rejected, since the body could not be restored
/// for downstream extractors.
const MAX_BUFFERED_BODY_BYTES: usize = 1024 * 1024;

/// Verification score attached to admitted requests.
///
/// Extract it in downstream handlers to read the score the remote service
/// reported for this request:
/// ```ignore
/// async fn protected_handler(
///     RecaptchaScore(score): RecaptchaScore,
/// ) -> impl IntoResponse {
///     format!("verified with score {score}")
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecaptchaScore(pub f64);

impl<S> FromRequestParts<S> for RecaptchaScore
where
    S: Send + Sync,
{
    type Rejection = RecaptchaRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().copied().ok_or_else(|| {
            RecaptchaRejection::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "reCAPTCHA score requested but the verification middleware did not run",
            )
        })
    }
}

/// Per-route verification settings shared with [`verify_recaptcha`].
///
/// A guard captures a shared [`Verifier`] together with the effective
/// threshold, status code, and message for the routes it protects. The
/// instance defaults can be overridden per guard; thresholds are
/// re-validated with the same error as construction.
#[derive(Debug, Clone)]
pub struct RecaptchaGuard {
    verifier: Arc<Verifier>,
    threshold: f64,
    status_code: StatusCode,
    message: String,
}

impl RecaptchaGuard {
    /// Create a guard using the verifier's configured defaults
    #[must_use]
    pub fn new(verifier: Arc<Verifier>) -> Self {
        let config = verifier.config();
        Self {
            threshold: config.threshold,
            status_code: config.status_code,
            message: config.message.clone(),
            verifier,
        }
    }

    /// Override the score threshold for this guard.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ThresholdOutOfRange`] when the threshold is
    /// outside [0, 1].
    pub fn with_threshold(mut self, threshold: f64) -> Result<Self, ConfigError> {
        self.threshold = validate_threshold(threshold)?;
        Ok(self)
    }

    /// Override the rejection status code for this guard
    #[must_use]
    pub const fn with_status_code(mut self, status_code: StatusCode) -> Self {
        self.status_code = status_code;
        self
    }

    /// Override the rejection message for this guard
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Rejection carrying this guard's effective status and message
    fn reject(&self) -> RecaptchaRejection {
        RecaptchaRejection::new(self.status_code, self.message.clone())
    }
}

/// axum middleware that gates requests on a reCAPTCHA v3 verification.
///
/// Wire it up with [`axum::middleware::from_fn`] and a [`RecaptchaGuard`]
/// extension:
/// ```ignore
/// let verifier = Arc::new(Verifier::new(RecaptchaConfig::new(secret))?);
///
/// let router = Router::new()
///     .route("/signup", post(signup_handler))
///     .layer(middleware::from_fn(verify_recaptcha))
///     .layer(Extension(RecaptchaGuard::new(verifier)));
/// ```
///
/// The token is read from the `recaptchaV3Token` JSON body field, falling
/// back to the `recaptcha-v3-token` header; the body wins when both are
/// present. Admitted requests carry a [`RecaptchaScore`] extension and run
/// downstream exactly once. Everything else short-circuits with the
/// guard's status code and a `{"error": <message>}` body — missing token,
/// remote failure, `success=false`, and a score below the threshold all
/// look the same to the client.
///
/// # Errors
///
/// Returns a [`RecaptchaRejection`] whenever the request is not admitted.
pub async fn verify_recaptcha(
    Extension(guard): Extension<RecaptchaGuard>,
    request: Request,
    next: Next,
) -> Result<Response, RecaptchaRejection> {
    let header_token = token_from_headers(request.headers());

    // Only JSON bodies are inspected; anything else passes through
    // unbuffered and the header is the sole token source.
    let (mut request, token) = if has_json_content_type(request.headers()) {
        let (parts, body) = request.into_parts();
        match axum::body::to_bytes(body, MAX_BUFFERED_BODY_BYTES).await {
            Ok(bytes) => {
                let body_token = token_from_json(&bytes);
                let request = Request::from_parts(parts, Body::from(bytes));
                (request, body_token.or(header_token))
            }
            Err(err) => {
                // The body is gone, so the request cannot be admitted even
                // if a header token would have passed.
                tracing::warn!(error = %err, "Failed to buffer request body for token extraction");
                return Err(guard.reject());
            }
        }
    } else {
        (request, header_token)
    };

    let Some(token) = token else {
        tracing::debug!("No reCAPTCHA token found in request body or headers");
        return Err(guard.reject());
    };

    let result = match guard.verifier.verify(&token).await {
        Ok(result) => result,
        Err(err) => {
            // Logged server-side only; the client gets the generic message
            tracing::warn!(error = %err, "reCAPTCHA verification call failed");
            return Err(guard.reject());
        }
    };

    if !result.success || result.score < guard.threshold {
        tracing::debug!(
            success = result.success,
            score = result.score,
            threshold = guard.threshold,
            "reCAPTCHA check rejected the request"
        );
        return Err(guard.reject());
    }

    request.extensions_mut().insert(RecaptchaScore(result.score));
    Ok(next.run(request).await)
}

/// Read the token from the fallback header
fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(RECAPTCHA_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string)
}

/// Read the token field from a buffered JSON body
fn token_from_json(bytes: &[u8]) -> Option<String> {
    serde_json::from_slice::<serde_json::Value>(bytes)
        .ok()?
        .get(RECAPTCHA_TOKEN_FIELD)?
        .as_str()
        .map(ToString::to_string)
}

/// Whether the request declares a JSON content type
fn has_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}
