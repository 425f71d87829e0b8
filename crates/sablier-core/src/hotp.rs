//! RFC 4226 HOTP generation engine.
//!
//! Produces the raw OTP digits for a counter (or TOTP timecode) using
//! `ring::hmac` for HMAC-SHA1, HMAC-SHA256, and HMAC-SHA512.

use std::fmt;
use std::str::FromStr;

use ring::hmac;
use serde::{Deserialize, Serialize};

use crate::window::CodeGenerator;
use crate::OtpError;

// ── Types ───────────────────────────────────────────────────────────

/// HMAC algorithm used for OTP generation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OtpAlgorithm {
    /// HMAC-SHA1 (default for most authenticator apps).
    #[default]
    Sha1,
    /// HMAC-SHA256.
    Sha256,
    /// HMAC-SHA512.
    Sha512,
}

impl OtpAlgorithm {
    /// Map to the corresponding `ring::hmac::Algorithm`.
    fn to_ring_algorithm(self) -> hmac::Algorithm {
        match self {
            Self::Sha1 => hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY,
            Self::Sha256 => hmac::HMAC_SHA256,
            Self::Sha512 => hmac::HMAC_SHA512,
        }
    }

    /// Name used in `otpauth://` URIs (`SHA1`, `SHA256`, `SHA512`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
        }
    }
}

impl fmt::Display for OtpAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OtpAlgorithm {
    type Err = OtpError;

    /// Case-insensitive; accepts `SHA-256` style names as well.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();
        match normalized.as_str() {
            "SHA1" => Ok(Self::Sha1),
            "SHA256" => Ok(Self::Sha256),
            "SHA512" => Ok(Self::Sha512),
            _ => Err(OtpError::Config(format!("unsupported algorithm: {s}"))),
        }
    }
}

/// Number of digits in an OTP code (6 to 8, RFC 4226 §5.3).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum OtpDigits {
    /// 6-digit code (standard).
    #[default]
    Six,
    /// 7-digit code.
    Seven,
    /// 8-digit code.
    Eight,
}

impl OtpDigits {
    /// Return the numeric digit count.
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
        }
    }

    /// Return the modulus value (10^digits) for truncation.
    #[must_use]
    const fn modulus(self) -> u32 {
        match self {
            Self::Six => 1_000_000,
            Self::Seven => 10_000_000,
            Self::Eight => 100_000_000,
        }
    }
}

impl From<OtpDigits> for u8 {
    fn from(digits: OtpDigits) -> Self {
        digits.value()
    }
}

impl TryFrom<u8> for OtpDigits {
    type Error = OtpError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            6 => Ok(Self::Six),
            7 => Ok(Self::Seven),
            8 => Ok(Self::Eight),
            other => Err(OtpError::Config(format!(
                "digits must be 6, 7 or 8 (got {other})"
            ))),
        }
    }
}

// ── HOTP (RFC 4226) ────────────────────────────────────────────────

/// Generate an HOTP code per RFC 4226.
///
/// # Arguments
/// - `secret`: Shared secret key bytes
/// - `counter`: 8-byte counter value (big-endian per RFC 4226 §5.2)
/// - `digits`: Number of output digits
/// - `algorithm`: HMAC algorithm to use
///
/// # Errors
/// Returns `OtpError::Otp` if the secret is empty.
#[must_use = "OTP code should be used or stored"]
pub fn generate_hotp(
    secret: &[u8],
    counter: u64,
    digits: OtpDigits,
    algorithm: OtpAlgorithm,
) -> Result<String, OtpError> {
    if secret.is_empty() {
        return Err(OtpError::Otp("secret must not be empty".to_owned()));
    }

    let key = hmac::Key::new(algorithm.to_ring_algorithm(), secret);
    let tag = hmac::sign(&key, &counter.to_be_bytes());
    let mac = tag.as_ref();

    // Dynamic Truncation (RFC 4226 §5.3): offset = low nibble of last byte.
    // Every HMAC output is at least 20 bytes, so offset + 3 stays in range.
    let offset = usize::from(mac[mac.len().wrapping_sub(1)] & 0x0F);
    let binary_code = u32::from_be_bytes([
        mac[offset] & 0x7F,
        mac[offset.wrapping_add(1)],
        mac[offset.wrapping_add(2)],
        mac[offset.wrapping_add(3)],
    ]);

    // modulus is a non-zero power of ten.
    #[allow(clippy::arithmetic_side_effects)]
    let code = binary_code % digits.modulus();
    let width = usize::from(digits.value());

    Ok(format!("{code:0>width$}"))
}

/// [`CodeGenerator`] backed by [`generate_hotp`] over a borrowed secret.
pub struct HotpGenerator<'a> {
    secret: &'a [u8],
    digits: OtpDigits,
    algorithm: OtpAlgorithm,
}

impl<'a> HotpGenerator<'a> {
    /// Borrow `secret` for code generation.
    #[must_use]
    pub const fn new(secret: &'a [u8], digits: OtpDigits, algorithm: OtpAlgorithm) -> Self {
        Self {
            secret,
            digits,
            algorithm,
        }
    }
}

impl CodeGenerator for HotpGenerator<'_> {
    fn generate_at(&self, timecode: u64) -> Result<String, OtpError> {
        generate_hotp(self.secret, timecode, self.digits, self.algorithm)
    }
}

impl fmt::Debug for HotpGenerator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotpGenerator")
            .field("secret", &"***")
            .field("digits", &self.digits)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

// ── Tests ───────────────────────────────────────────────────────────
