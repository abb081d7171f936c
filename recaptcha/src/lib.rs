//! Google reCAPTCHA v3 verification middleware for axum.
//!
//! Verifies a client-supplied token against Google's siteverify endpoint
//! and rejects requests whose confidence score falls below a configured
//! threshold. The crate plugs into a caller-owned [`axum::Router`]; it
//! ships no server or routing of its own.
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use axum::{middleware, routing::post, Extension, Router};
//! use recaptcha_v3::{RecaptchaConfig, RecaptchaGuard, Verifier, verify_recaptcha};
//!
//! let verifier = Arc::new(Verifier::new(RecaptchaConfig::from_env())?);
//!
//! let router = Router::new()
//!     .route("/signup", post(signup_handler))
//!     .layer(middleware::from_fn(verify_recaptcha))
//!     .layer(Extension(RecaptchaGuard::new(verifier)));
//! ```

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// Configuration and defaults
pub mod config;

/// Error taxonomy and the JSON rejection response
pub mod error;

/// Request gating middleware
pub mod middleware;

/// Outbound token verification
pub mod verifier;

pub use config::RecaptchaConfig;
pub use error::{ConfigError, RecaptchaRejection, VerifyError};
pub use middleware::{
    verify_recaptcha, RecaptchaGuard, RecaptchaScore, RECAPTCHA_TOKEN_FIELD,
    RECAPTCHA_TOKEN_HEADER,
};
pub use verifier::{VerificationResult, Verifier};
