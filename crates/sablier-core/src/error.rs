//! Error types for `sablier-core`.

use thiserror::Error;

/// Errors produced by OTP generation and verification.
///
/// A code that simply does not match is *not* an error: verification
/// reports it as `Ok(None)` / `Ok(false)`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OtpError {
    /// Invalid configuration (zero period, unsupported parameter).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Caller-supplied verification input out of range (leeway, timestamp).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Timestamp lies before the configured epoch, so no timecode exists.
    #[error("timestamp {timestamp} precedes epoch {epoch}")]
    TimecodeUnderflow {
        /// Offending timestamp (seconds since the Unix epoch).
        timestamp: u64,
        /// Configured time origin (seconds since the Unix epoch).
        epoch: u64,
    },

    /// HOTP/TOTP generation error (empty secret).
    #[error("OTP error: {0}")]
    Otp(String),

    /// The injected time source could not produce a timestamp.
    #[error("clock error: {0}")]
    Clock(String),
}
