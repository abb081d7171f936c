//! Outbound token verification against the siteverify endpoint

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::config::{validate_secret_key, validate_threshold, RecaptchaConfig};
use crate::error::{ConfigError, VerifyError};

/// Timeout for siteverify requests
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of idle connections to maintain per host
const MAX_IDLE_CONNECTIONS_PER_HOST: usize = 10;

/// Outcome of a single token verification, exactly as reported by the
/// remote service. No clamping or reinterpretation is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerificationResult {
    /// Whether the remote service accepted the token
    pub success: bool,
    /// Confidence score in [0, 1]
    pub score: f64,
}

/// Response from the siteverify endpoint.
///
/// Only `success` and `score` feed the admission decision; the remaining
/// fields are logged when verification fails. Google omits `score` for
/// non-v3 tokens, in which case it deserializes as `0.0`.
#[derive(Debug, Deserialize)]
struct SiteverifyResponse {
    success: bool,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    hostname: Option<String>,
    #[serde(rename = "error-codes", default)]
    error_codes: Option<Vec<String>>,
}

/// Verifies reCAPTCHA v3 tokens against the configured siteverify endpoint.
///
/// Construction validates the configuration once (fail-fast); an instance
/// is immutable afterwards and safe to share across concurrent requests.
#[derive(Debug)]
pub struct Verifier {
    config: RecaptchaConfig,
    http: Client,
}

impl Verifier {
    /// Validate the configuration and build a `Verifier` with a pooled
    /// HTTP client.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the secret key is empty, the
    /// threshold is outside [0, 1], or the HTTP client cannot be built.
    pub fn new(mut config: RecaptchaConfig) -> Result<Self, ConfigError> {
        config.secret_key = validate_secret_key(&config.secret_key)?;
        config.threshold = validate_threshold(config.threshold)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .pool_max_idle_per_host(MAX_IDLE_CONNECTIONS_PER_HOST)
            .user_agent(concat!("recaptcha-v3/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { config, http })
    }

    /// The validated configuration backing this verifier
    #[must_use]
    pub const fn config(&self) -> &RecaptchaConfig {
        &self.config
    }

    /// Verify a single token with the remote service.
    ///
    /// Issues exactly one `POST` to the configured endpoint with query
    /// parameters `secret` and `response` and no body. No retries are
    /// performed; a failure is terminal for this call only.
    ///
    /// # Errors
    ///
    /// - [`VerifyError::EmptyToken`] when the token is empty after
    ///   trimming (no outbound call is made)
    /// - [`VerifyError::UnexpectedStatus`] when the endpoint answers with
    ///   a non-success status
    /// - [`VerifyError::Transport`] on network failure or an undecodable
    ///   response body
    pub async fn verify(&self, token: &str) -> Result<VerificationResult, VerifyError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(VerifyError::EmptyToken);
        }

        let response = self
            .http
            .post(&self.config.api_endpoint)
            .query(&[
                ("secret", self.config.secret_key.as_str()),
                ("response", token),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerifyError::UnexpectedStatus(status));
        }

        let body: SiteverifyResponse = response.json().await?;

        if !body.success {
            tracing::debug!(
                hostname = ?body.hostname,
                error_codes = ?body.error_codes,
                "siteverify reported an unsuccessful verification"
            );
        }

        Ok(VerificationResult {
            success: body.success,
            score: body.score,
        })
    }
}
