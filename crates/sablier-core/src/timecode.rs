//! Timecode resolution (RFC 6238 §4.2).
//!
//! A timecode is the index of the time step containing a timestamp:
//! `T = floor((timestamp - T0) / X)` where `T0` is the configured epoch and
//! `X` the period. Timestamps before `T0` have no timecode and are reported
//! as [`OtpError::TimecodeUnderflow`].

use crate::OtpError;

/// Resolve `timestamp` to its timecode.
///
/// The result is non-decreasing in `timestamp` and identical for every
/// instant of the same window.
///
/// # Errors
/// - `OtpError::Config` if `period` is 0.
/// - `OtpError::TimecodeUnderflow` if `timestamp < epoch`.
pub fn resolve(timestamp: u64, epoch: u64, period: u32) -> Result<u64, OtpError> {
    if period == 0 {
        return Err(OtpError::Config("period must be > 0".to_owned()));
    }
    let elapsed = timestamp
        .checked_sub(epoch)
        .ok_or(OtpError::TimecodeUnderflow { timestamp, epoch })?;
    // period is validated non-zero above.
    #[allow(clippy::arithmetic_side_effects)]
    let timecode = elapsed / u64::from(period);
    Ok(timecode)
}

/// First second of the window identified by `timecode`.
///
/// # Errors
/// Returns `OtpError::InvalidInput` if the window start does not fit in `u64`.
pub fn window_start(timecode: u64, epoch: u64, period: u32) -> Result<u64, OtpError> {
    timecode
        .checked_mul(u64::from(period))
        .and_then(|offset| offset.checked_add(epoch))
        .ok_or_else(|| OtpError::InvalidInput(format!("timecode {timecode} out of range")))
}

/// Seconds remaining before the window containing `timestamp` ends.
///
/// Always in `1..=period`.
///
/// # Errors
/// Same conditions as [`resolve`].
pub fn expires_in(timestamp: u64, epoch: u64, period: u32) -> Result<u64, OtpError> {
    resolve(timestamp, epoch, period)?;
    // timestamp >= epoch and period > 0 were checked by resolve.
    #[allow(clippy::arithmetic_side_effects)]
    let into_window = (timestamp - epoch) % u64::from(period);
    #[allow(clippy::arithmetic_side_effects)]
    let remaining = u64::from(period) - into_window;
    Ok(remaining)
}
