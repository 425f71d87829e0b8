//! Tolerance-window verification with replay prevention.
//!
//! A candidate code is checked against at most three instants:
//! `[timestamp - leeway, timestamp, timestamp + leeway]`, probed in that
//! order. Only those instants are probed, not every second in between;
//! with `leeway < period` they cover the current window and whichever
//! neighbour the drift reaches.
//!
//! Replay prevention compares *timecodes*: a candidate whose timecode is
//! not strictly after the timecode of the last accepted timestamp is
//! skipped without generating a code for it.

use crate::compare::constant_time_eq;
use crate::config::TotpConfig;
use crate::timecode::resolve;
use crate::OtpError;

/// Produces the expected code for a timecode (or HOTP counter).
pub trait CodeGenerator {
    /// Generate the code for step `timecode`.
    ///
    /// # Errors
    /// Implementation-defined generation failure.
    fn generate_at(&self, timecode: u64) -> Result<String, OtpError>;
}

impl<G: CodeGenerator + ?Sized> CodeGenerator for &G {
    fn generate_at(&self, timecode: u64) -> Result<String, OtpError> {
        (**self).generate_at(timecode)
    }
}

/// Maximum number of instants probed by one verification.
pub const MAX_CANDIDATES: usize = 3;

/// Ordered set of instants probed during one verification.
///
/// Neither sorted nor deduplicated: a zero leeway yields the same instant
/// three times.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidates {
    instants: [u64; MAX_CANDIDATES],
    len: usize,
}

impl Candidates {
    /// Build the candidate instants for `timestamp`.
    ///
    /// Without leeway the set is `[timestamp]`. With leeway it is
    /// `[timestamp - leeway, timestamp, timestamp + leeway]`.
    ///
    /// # Errors
    /// Returns `OtpError::InvalidInput` if `leeway >= period`, if
    /// `timestamp < leeway`, or if `timestamp + leeway` overflows.
    pub fn new(timestamp: u64, leeway: Option<u64>, period: u32) -> Result<Self, OtpError> {
        let Some(leeway) = leeway else {
            return Ok(Self {
                instants: [timestamp, 0, 0],
                len: 1,
            });
        };

        if leeway >= u64::from(period) {
            return Err(OtpError::InvalidInput(format!(
                "leeway ({leeway}s) must be lower than the period ({period}s)"
            )));
        }
        let before = timestamp.checked_sub(leeway).ok_or_else(|| {
            OtpError::InvalidInput(format!(
                "timestamp ({timestamp}) must be greater than or equal to leeway ({leeway}s)"
            ))
        })?;
        let after = timestamp.checked_add(leeway).ok_or_else(|| {
            OtpError::InvalidInput(format!("timestamp ({timestamp}) + leeway overflows"))
        })?;

        Ok(Self {
            instants: [before, timestamp, after],
            len: MAX_CANDIDATES,
        })
    }

    /// The instants in probe order.
    #[must_use]
    pub fn as_slice(&self) -> &[u64] {
        &self.instants[..self.len]
    }
}

/// Verify `otp` around `timestamp`.
///
/// Returns the candidate instant whose window produced `otp`, or `None` if
/// no probed window matches. `Some(0)` is a valid accepted timestamp.
///
/// `previous` is the last accepted timestamp for this secret. When it is
/// present and positive, candidates whose timecode is at or before its
/// timecode are rejected as replays. Persisting the returned timestamp and
/// feeding it back as `previous` is the caller's job.
///
/// Every input is validated before the first code is generated.
///
/// # Errors
/// - `OtpError::InvalidInput` for an out-of-range leeway (see [`Candidates::new`]).
/// - `OtpError::TimecodeUnderflow` if a candidate or `previous` precedes the epoch.
/// - Any error returned by `generator`.
pub fn verify_window<G: CodeGenerator + ?Sized>(
    generator: &G,
    config: &TotpConfig,
    otp: &str,
    timestamp: u64,
    leeway: Option<u64>,
    previous: Option<u64>,
) -> Result<Option<u64>, OtpError> {
    let (epoch, period) = (config.epoch(), config.period());
    let candidates = Candidates::new(timestamp, leeway, period)?;

    let watermark = previous
        .filter(|&p| p > 0)
        .map(|p| resolve(p, epoch, period))
        .transpose()?;

    let mut probes = [(0u64, 0u64); MAX_CANDIDATES];
    for (slot, &instant) in probes.iter_mut().zip(candidates.as_slice()) {
        *slot = (instant, resolve(instant, epoch, period)?);
    }

    for &(instant, timecode) in probes.iter().take(candidates.as_slice().len()) {
        if watermark.is_some_and(|w| w >= timecode) {
            tracing::debug!(instant, timecode, "skipping candidate at or before replay watermark");
            continue;
        }
        tracing::trace!(instant, timecode, "probing candidate window");
        let expected = generator.generate_at(timecode)?;
        if constant_time_eq(&expected, otp) {
            tracing::debug!(instant, timecode, "code accepted");
            return Ok(Some(instant));
        }
    }

    Ok(None)
}
