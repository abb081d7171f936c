//! Configuration for reCAPTCHA verification

use std::env;

use http::StatusCode;

use crate::error::ConfigError;

/// Default score threshold below which requests are rejected
pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.5;

/// Default error message returned to rejected clients
pub const DEFAULT_ERROR_MESSAGE: &str = "reCAPTCHA verification failed";

/// Google reCAPTCHA verification API endpoint
pub const RECAPTCHA_API_ENDPOINT: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Configuration for a [`crate::Verifier`].
///
/// Only the secret key is required; everything else has a default. Values
/// are validated once, at [`crate::Verifier::new`] — an empty secret key or
/// an out-of-range threshold fails construction immediately.
#[derive(Debug, Clone)]
pub struct RecaptchaConfig {
    /// reCAPTCHA secret key issued by Google
    pub secret_key: String,
    /// Score threshold in [0, 1]; requests scoring below it are rejected
    pub threshold: f64,
    /// HTTP status code used for rejection responses
    pub status_code: StatusCode,
    /// Error message placed in rejection response bodies
    pub message: String,
    /// Verification API endpoint URL
    pub api_endpoint: String,
}

impl RecaptchaConfig {
    /// Create a configuration with the given secret key and default values
    /// for everything else
    #[must_use]
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            threshold: DEFAULT_SCORE_THRESHOLD,
            status_code: StatusCode::FORBIDDEN,
            message: DEFAULT_ERROR_MESSAGE.to_string(),
            api_endpoint: RECAPTCHA_API_ENDPOINT.to_string(),
        }
    }

    /// Set the score threshold (validated at [`crate::Verifier::new`])
    #[must_use]
    pub const fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the rejection status code
    #[must_use]
    pub const fn with_status_code(mut self, status_code: StatusCode) -> Self {
        self.status_code = status_code;
        self
    }

    /// Set the rejection error message
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Override the verification API endpoint
    #[must_use]
    pub fn with_api_endpoint(mut self, api_endpoint: impl Into<String>) -> Self {
        self.api_endpoint = api_endpoint.into();
        self
    }

    /// Load the configuration from environment variables.
    ///
    /// Reads `RECAPTCHA_SECRET_KEY`, `RECAPTCHA_SCORE_THRESHOLD`,
    /// `RECAPTCHA_STATUS_CODE`, `RECAPTCHA_ERROR_MESSAGE`, and
    /// `RECAPTCHA_API_ENDPOINT`. Unset or unparseable optional values fall
    /// back to defaults; a missing secret key is left empty and rejected at
    /// [`crate::Verifier::new`].
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::new(env::var("RECAPTCHA_SECRET_KEY").unwrap_or_default());

        if let Some(threshold) = env::var("RECAPTCHA_SCORE_THRESHOLD")
            .ok()
            .and_then(|val| val.parse::<f64>().ok())
        {
            config.threshold = threshold;
        }

        if let Some(status_code) = env::var("RECAPTCHA_STATUS_CODE")
            .ok()
            .and_then(|val| val.parse::<u16>().ok())
            .and_then(|code| StatusCode::from_u16(code).ok())
        {
            config.status_code = status_code;
        }

        if let Ok(message) = env::var("RECAPTCHA_ERROR_MESSAGE") {
            config.message = message;
        }

        if let Ok(api_endpoint) = env::var("RECAPTCHA_API_ENDPOINT") {
            config.api_endpoint = api_endpoint;
        }

        config
    }
}

/// Validate a score threshold against the [0, 1] range. NaN is rejected.
pub(crate) fn validate_threshold(threshold: f64) -> Result<f64, ConfigError> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(ConfigError::ThresholdOutOfRange(threshold))
    }
}

/// Validate and trim a secret key
pub(crate) fn validate_secret_key(secret_key: &str) -> Result<String, ConfigError> {
    let trimmed = secret_key.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptySecretKey);
    }
    Ok(trimmed.to_string())
}
