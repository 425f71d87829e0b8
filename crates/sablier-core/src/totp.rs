//! RFC 6238 TOTP: a secret, a validated configuration, and an injected clock.

use std::fmt;

use secrecy::{ExposeSecret, SecretSlice};

use crate::clock::Clock;
use crate::config::TotpConfig;
use crate::hotp::HotpGenerator;
use crate::timecode;
use crate::window::{verify_window, CodeGenerator};
use crate::OtpError;

/// Time-based one-time password generator and verifier.
///
/// Timestamps passed explicitly always take precedence; the clock is only
/// consulted when a method is called without one.
pub struct Totp<C> {
    secret: SecretSlice<u8>,
    config: TotpConfig,
    clock: C,
}

impl<C: Clock> Totp<C> {
    /// Build a TOTP instance.
    ///
    /// # Errors
    /// Returns `OtpError::Otp` if the secret is empty.
    pub fn new(secret: SecretSlice<u8>, config: TotpConfig, clock: C) -> Result<Self, OtpError> {
        if secret.expose_secret().is_empty() {
            return Err(OtpError::Otp("secret must not be empty".to_owned()));
        }
        Ok(Self {
            secret,
            config,
            clock,
        })
    }

    /// Build a TOTP instance from raw secret bytes (copied).
    ///
    /// # Errors
    /// Returns `OtpError::Otp` if the secret is empty.
    pub fn from_bytes(secret: &[u8], config: TotpConfig, clock: C) -> Result<Self, OtpError> {
        Self::new(secret.to_vec().into(), config, clock)
    }

    /// Generation and verification parameters.
    #[must_use]
    pub const fn config(&self) -> &TotpConfig {
        &self.config
    }

    /// Clock used when no timestamp is supplied.
    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    fn generator(&self) -> HotpGenerator<'_> {
        HotpGenerator::new(
            self.secret.expose_secret(),
            self.config.digits(),
            self.config.algorithm(),
        )
    }

    fn timestamp_or_now(&self, timestamp: Option<u64>) -> Result<u64, OtpError> {
        timestamp.map_or_else(|| self.clock.now(), Ok)
    }

    /// Timecode of the window containing `timestamp`.
    ///
    /// # Errors
    /// Returns `OtpError::TimecodeUnderflow` if `timestamp` precedes the epoch.
    pub fn timecode(&self, timestamp: u64) -> Result<u64, OtpError> {
        timecode::resolve(timestamp, self.config.epoch(), self.config.period())
    }

    /// Code for the window containing `timestamp`.
    ///
    /// # Errors
    /// Returns `OtpError::TimecodeUnderflow` if `timestamp` precedes the epoch.
    #[must_use = "OTP code should be used or stored"]
    pub fn at(&self, timestamp: u64) -> Result<String, OtpError> {
        let step = self.timecode(timestamp)?;
        self.generator().generate_at(step)
    }

    /// Code for the window `offset` steps away from the one containing
    /// `timestamp` (negative offsets look back).
    ///
    /// # Errors
    /// Returns `OtpError::InvalidInput` if the shifted timecode is negative
    /// or overflows, and the errors of [`Self::at`].
    #[must_use = "OTP code should be used or stored"]
    pub fn at_offset(&self, timestamp: u64, offset: i64) -> Result<String, OtpError> {
        let step = self
            .timecode(timestamp)?
            .checked_add_signed(offset)
            .ok_or_else(|| {
                OtpError::InvalidInput(format!("offset {offset} leaves the timecode range"))
            })?;
        self.generator().generate_at(step)
    }

    /// Code for the current window according to the clock.
    ///
    /// # Errors
    /// Clock failures and the errors of [`Self::at`].
    #[must_use = "OTP code should be used or stored"]
    pub fn now(&self) -> Result<String, OtpError> {
        self.at(self.clock.now()?)
    }

    /// Seconds until the current code rotates.
    ///
    /// # Errors
    /// Clock failures, or `OtpError::TimecodeUnderflow` before the epoch.
    pub fn expires_in(&self) -> Result<u64, OtpError> {
        timecode::expires_in(
            self.clock.now()?,
            self.config.epoch(),
            self.config.period(),
        )
    }

    /// Strict verification: `otp` must belong to the window containing
    /// `timestamp` (or the clock's current time).
    ///
    /// # Errors
    /// Clock failures, or `OtpError::TimecodeUnderflow` before the epoch.
    #[must_use = "validation result should be checked"]
    pub fn verify(&self, otp: &str, timestamp: Option<u64>) -> Result<bool, OtpError> {
        self.verify_with_leeway(otp, timestamp, None, None)
            .map(|accepted| accepted.is_some())
    }

    /// Verification with a tolerance window and replay watermark.
    ///
    /// Returns the accepted candidate timestamp, or `None` when no probed
    /// window matches. Store the returned timestamp and pass it as
    /// `previous` on the next call to reject reuse of the same window.
    ///
    /// # Errors
    /// Clock failures, and the errors of [`verify_window`].
    #[must_use = "validation result should be checked"]
    pub fn verify_with_leeway(
        &self,
        otp: &str,
        timestamp: Option<u64>,
        leeway: Option<u64>,
        previous: Option<u64>,
    ) -> Result<Option<u64>, OtpError> {
        let timestamp = self.timestamp_or_now(timestamp)?;
        verify_window(
            &self.generator(),
            &self.config,
            otp,
            timestamp,
            leeway,
            previous,
        )
    }
}

impl<C: fmt::Debug> fmt::Debug for Totp<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Totp")
            .field("secret", &"***")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::hotp::{OtpAlgorithm, OtpDigits};

    const SECRET: &[u8] = b"12345678901234567890";

    fn totp_at(now: u64) -> Totp<FixedClock> {
        Totp::from_bytes(SECRET, TotpConfig::default(), FixedClock(now)).expect("totp")
    }

    #[test]
    fn empty_secret_rejected() {
        let result = Totp::from_bytes(&[], TotpConfig::default(), FixedClock(0));
        assert!(matches!(result, Err(OtpError::Otp(_))));
    }

    #[test]
    fn rfc6238_vector_at_59() {
        let config = TotpConfig::default().with_digits(OtpDigits::Eight);
        let totp = Totp::from_bytes(SECRET, config, FixedClock(59)).expect("totp");
        assert_eq!(totp.at(59).as_deref(), Ok("94287082"));
        assert_eq!(totp.now().as_deref(), Ok("94287082"));
    }

    #[test]
    fn same_code_throughout_window() {
        let totp = totp_at(0);
        let code = totp.at(30).expect("code");
        for t in 30..60 {
            assert_eq!(totp.at(t).expect("code"), code, "at {t}");
        }
        assert_ne!(totp.at(60).expect("code"), code);
    }

    #[test]
    fn verify_uses_clock_when_no_timestamp() {
        let totp = totp_at(45);
        let code = totp.at(31).expect("code");
        assert_eq!(totp.verify(&code, None), Ok(true));
        assert_eq!(totp_at(60).verify(&code, None), Ok(false));
    }

    #[test]
    fn explicit_timestamp_overrides_clock() {
        let totp = totp_at(1_000_000);
        let code = totp.at(59).expect("code");
        assert_eq!(totp.verify(&code, Some(30)), Ok(true));
        assert_eq!(totp.verify(&code, None), Ok(false));
    }

    #[test]
    fn at_offset_matches_neighbouring_windows() {
        let totp = totp_at(0);
        assert_eq!(totp.at_offset(45, -1), totp.at(15));
        assert_eq!(totp.at_offset(45, 1), totp.at(75));
        assert_eq!(totp.at_offset(45, 0), totp.at(45));
        assert!(matches!(
            totp.at_offset(10, -1),
            Err(OtpError::InvalidInput(_))
        ));
    }

    #[test]
    fn expires_in_follows_clock() {
        assert_eq!(totp_at(30).expires_in(), Ok(30));
        assert_eq!(totp_at(59).expires_in(), Ok(1));
    }

    #[test]
    fn before_epoch_is_reported() {
        let config = TotpConfig::default().with_epoch(1_000);
        let totp = Totp::from_bytes(SECRET, config, FixedClock(10)).expect("totp");
        assert_eq!(
            totp.now(),
            Err(OtpError::TimecodeUnderflow {
                timestamp: 10,
                epoch: 1_000
            })
        );
    }

    #[test]
    fn replay_rejected_after_acceptance() {
        let totp = totp_at(0);
        let code = totp.at(100).expect("code");
        let accepted = totp
            .verify_with_leeway(&code, Some(100), Some(10), None)
            .expect("verify");
        assert_eq!(accepted, Some(90));
        let replay = totp
            .verify_with_leeway(&code, Some(100), Some(10), accepted)
            .expect("verify");
        assert_eq!(replay, None);
    }

    #[test]
    fn debug_masks_secret() {
        let config = TotpConfig::default().with_algorithm(OtpAlgorithm::Sha256);
        let totp = Totp::from_bytes(SECRET, config, FixedClock(0)).expect("totp");
        let debug = format!("{totp:?}");
        assert!(debug.contains("***"));
        assert!(!debug.contains("1234567890"), "secret leaked: {debug}");
    }
}
