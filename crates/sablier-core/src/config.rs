//! Validated TOTP configuration.
//!
//! A [`TotpConfig`] can only be built (or deserialized) with a non-zero
//! period, so the timecode resolver and window verifier never have to
//! re-check it.

use serde::{Deserialize, Serialize};

use crate::hotp::{OtpAlgorithm, OtpDigits};
use crate::OtpError;

/// Default TOTP period in seconds (RFC 6238 §4).
pub const DEFAULT_PERIOD: u32 = 30;

/// Default time origin: the Unix epoch itself (RFC 6238 `T0 = 0`).
pub const DEFAULT_EPOCH: u64 = 0;

/// Parameters shared by code generation and verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTotpConfig")]
pub struct TotpConfig {
    period: u32,
    epoch: u64,
    digits: OtpDigits,
    algorithm: OtpAlgorithm,
}

impl Default for TotpConfig {
    fn default() -> Self {
        Self {
            period: DEFAULT_PERIOD,
            epoch: DEFAULT_EPOCH,
            digits: OtpDigits::Six,
            algorithm: OtpAlgorithm::Sha1,
        }
    }
}

impl TotpConfig {
    /// Build a configuration.
    ///
    /// # Errors
    /// Returns `OtpError::Config` if `period` is 0.
    pub fn new(
        period: u32,
        epoch: u64,
        digits: OtpDigits,
        algorithm: OtpAlgorithm,
    ) -> Result<Self, OtpError> {
        if period == 0 {
            return Err(OtpError::Config("period must be > 0".to_owned()));
        }
        Ok(Self {
            period,
            epoch,
            digits,
            algorithm,
        })
    }

    /// Replace the period.
    ///
    /// # Errors
    /// Returns `OtpError::Config` if `period` is 0.
    pub fn with_period(self, period: u32) -> Result<Self, OtpError> {
        Self::new(period, self.epoch, self.digits, self.algorithm)
    }

    /// Replace the time origin.
    #[must_use]
    pub const fn with_epoch(mut self, epoch: u64) -> Self {
        self.epoch = epoch;
        self
    }

    /// Replace the digit count.
    #[must_use]
    pub const fn with_digits(mut self, digits: OtpDigits) -> Self {
        self.digits = digits;
        self
    }

    /// Replace the HMAC algorithm.
    #[must_use]
    pub const fn with_algorithm(mut self, algorithm: OtpAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Seconds per time step. Always non-zero.
    #[must_use]
    pub const fn period(&self) -> u32 {
        self.period
    }

    /// Time origin in seconds since the Unix epoch.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Code length.
    #[must_use]
    pub const fn digits(&self) -> OtpDigits {
        self.digits
    }

    /// HMAC hash function.
    #[must_use]
    pub const fn algorithm(&self) -> OtpAlgorithm {
        self.algorithm
    }

    /// Resolved parameters as `otpauth://` query pairs.
    ///
    /// `epoch` is only emitted when it differs from the Unix epoch, since
    /// authenticator apps assume `T0 = 0`.
    #[must_use]
    pub fn parameters(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("algorithm", self.algorithm.as_str().to_owned()),
            ("digits", self.digits.value().to_string()),
            ("period", self.period.to_string()),
        ];
        if self.epoch != DEFAULT_EPOCH {
            params.push(("epoch", self.epoch.to_string()));
        }
        params
    }
}

/// Unvalidated shadow of [`TotpConfig`] used during deserialization.
#[derive(Deserialize)]
struct RawTotpConfig {
    #[serde(default = "default_period")]
    period: u32,
    #[serde(default)]
    epoch: u64,
    #[serde(default)]
    digits: OtpDigits,
    #[serde(default)]
    algorithm: OtpAlgorithm,
}

const fn default_period() -> u32 {
    DEFAULT_PERIOD
}

impl TryFrom<RawTotpConfig> for TotpConfig {
    type Error = OtpError;

    fn try_from(raw: RawTotpConfig) -> Result<Self, Self::Error> {
        Self::new(raw.period, raw.epoch, raw.digits, raw.algorithm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_rfc_6238() {
        let config = TotpConfig::default();
        assert_eq!(config.period(), 30);
        assert_eq!(config.epoch(), 0);
        assert_eq!(config.digits(), OtpDigits::Six);
        assert_eq!(config.algorithm(), OtpAlgorithm::Sha1);
    }

    #[test]
    fn zero_period_rejected() {
        let result = TotpConfig::new(0, 0, OtpDigits::Six, OtpAlgorithm::Sha1);
        assert!(matches!(result, Err(OtpError::Config(_))), "got {result:?}");
        assert!(TotpConfig::default().with_period(0).is_err());
    }

    #[test]
    fn builders_replace_fields() {
        let config = TotpConfig::default()
            .with_period(60)
            .expect("period")
            .with_epoch(1_000)
            .with_digits(OtpDigits::Eight)
            .with_algorithm(OtpAlgorithm::Sha512);
        assert_eq!(
            config,
            TotpConfig::new(60, 1_000, OtpDigits::Eight, OtpAlgorithm::Sha512).expect("new")
        );
    }

    #[test]
    fn deserialize_applies_defaults() {
        let config: TotpConfig = serde_json::from_str(r#"{"digits":8}"#).expect("deserialize");
        assert_eq!(config, TotpConfig::default().with_digits(OtpDigits::Eight));
    }

    #[test]
    fn deserialize_rejects_zero_period() {
        let result = serde_json::from_str::<TotpConfig>(r#"{"period":0}"#);
        let err = result.expect_err("zero period must not deserialize");
        assert!(err.to_string().contains("period must be > 0"), "{err}");
    }

    #[test]
    fn serialize_roundtrip() {
        let config = TotpConfig::new(45, 100, OtpDigits::Seven, OtpAlgorithm::Sha256).expect("new");
        let json = serde_json::to_string(&config).expect("serialize");
        assert_eq!(
            json,
            r#"{"period":45,"epoch":100,"digits":7,"algorithm":"SHA256"}"#
        );
        let back: TotpConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, config);
    }

    #[test]
    fn parameters_omit_default_epoch() {
        let params = TotpConfig::default().parameters();
        assert_eq!(
            params,
            vec![
                ("algorithm", "SHA1".to_owned()),
                ("digits", "6".to_owned()),
                ("period", "30".to_owned()),
            ]
        );
        let shifted = TotpConfig::default().with_epoch(7).parameters();
        assert_eq!(shifted.last(), Some(&("epoch", "7".to_owned())));
    }
}
