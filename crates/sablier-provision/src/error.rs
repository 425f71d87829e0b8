//! Provisioning error types for `sablier-provision`.

use sablier_core::OtpError;
use thiserror::Error;

/// Errors produced while encoding secrets, handling `otpauth://` URIs, or
/// persisting profiles.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// OTP engine error (delegated from sablier-core).
    #[error(transparent)]
    Otp(#[from] OtpError),

    /// Secret generation or base32 decoding failure.
    #[error("secret error: {0}")]
    Secret(String),

    /// Malformed or unsupported provisioning URI.
    #[error("invalid provisioning URI: {0}")]
    Uri(String),

    /// Profile file could not be read or written.
    #[error("I/O error: {0}")]
    Io(String),

    /// Profile JSON could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for ProvisionError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ProvisionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
