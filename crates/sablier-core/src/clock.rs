//! Time sources for TOTP generation and verification.
//!
//! The engine never reads wall-clock time on its own: every [`crate::Totp`]
//! is constructed with an explicit [`Clock`], so tests and replays can pin
//! time with [`FixedClock`].

use std::time::{SystemTime, UNIX_EPOCH};

use crate::OtpError;

/// Source of the current time as whole seconds since the Unix epoch.
pub trait Clock {
    /// Return the current Unix timestamp in seconds.
    ///
    /// # Errors
    /// Returns `OtpError::Clock` if the time source is unavailable.
    fn now(&self) -> Result<u64, OtpError>;
}

/// Wall-clock time from [`SystemTime`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Result<u64, OtpError> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .map_err(|e| {
                tracing::warn!("system clock is set before the Unix epoch: {e}");
                OtpError::Clock(format!("system time before Unix epoch: {e}"))
            })
    }
}

/// A clock frozen at a single instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now(&self) -> Result<u64, OtpError> {
        Ok(self.0)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Result<u64, OtpError> {
        (**self).now()
    }
}
