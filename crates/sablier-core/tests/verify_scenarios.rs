#![allow(clippy::arithmetic_side_effects)]

//! Integration tests for window verification.
//!
//! Covers strict single-window checks, leeway probing at window
//! boundaries, replay watermarks, and input validation, using a real
//! HMAC-SHA1 generator and a fixed clock.

use sablier_core::{FixedClock, OtpDigits, OtpError, Totp, TotpConfig};

const SECRET: &[u8] = b"12345678901234567890";

fn totp(now: u64) -> Totp<FixedClock> {
    Totp::from_bytes(SECRET, TotpConfig::default(), FixedClock(now)).expect("totp")
}

/// With period 30, the code of timecode 1 is valid on [30, 59] only.
#[test]
fn strict_window_spans_exactly_one_period() {
    let totp = totp(0);
    assert_eq!(totp.timecode(59), Ok(1));
    let code = totp.at(59).expect("code");

    for t in 30..=59 {
        assert_eq!(totp.verify(&code, Some(t)), Ok(true), "t = {t}");
    }
    assert_eq!(totp.verify(&code, Some(29)), Ok(false));
    assert_eq!(totp.verify(&code, Some(60)), Ok(false));
}

/// The simple entry point falls back to the clock.
#[test]
fn strict_window_with_clock() {
    let code = totp(0).at(1_700_000_000).expect("code");
    assert_eq!(totp(1_700_000_000).verify(&code, None), Ok(true));
    assert_eq!(totp(1_700_000_000 + 30).verify(&code, None), Ok(false));
}

/// Drift of exactly ±leeway hits the code's window; leeway + 1 does not.
#[test]
fn leeway_boundaries() {
    let totp = totp(0);
    // Window [30, 59]; code generated at the last second of it.
    let code = totp.at(59).expect("code");

    // Observed 69, leeway 10: probes 59, 69, 79.
    assert_eq!(
        totp.verify_with_leeway(&code, Some(69), Some(10), None),
        Ok(Some(59))
    );
    // Observed 70, leeway 10: probes 60, 70, 80, all in timecode 2.
    assert_eq!(
        totp.verify_with_leeway(&code, Some(70), Some(10), None),
        Ok(None)
    );

    // Code for window [60, 89]; observed 50, leeway 10: probes 40, 50, 60.
    let next = totp.at(60).expect("code");
    assert_eq!(
        totp.verify_with_leeway(&next, Some(50), Some(10), None),
        Ok(Some(60))
    );
    // Observed 49: probes 39, 49, 59; none reaches timecode 2.
    assert_eq!(
        totp.verify_with_leeway(&next, Some(49), Some(10), None),
        Ok(None)
    );
}

/// Only the three boundary instants are probed, not the range between them.
#[test]
fn leeway_is_not_a_dense_scan() {
    let config = TotpConfig::default()
        .with_period(10)
        .expect("period")
        .with_digits(OtpDigits::Eight);
    let totp = Totp::from_bytes(SECRET, config, FixedClock(0)).expect("totp");
    // Code of window [20, 29]; probes at 15, 24, 33 hit it through 24 only.
    let code = totp.at(20).expect("code");
    assert_eq!(
        totp.verify_with_leeway(&code, Some(24), Some(9), None),
        Ok(Some(24))
    );
    // Probes at 1, 10, 19 skip window [20, 29] entirely although 10 + 9 = 19.
    assert_eq!(
        totp.verify_with_leeway(&code, Some(10), Some(9), None),
        Ok(None)
    );
}

/// Once accepted, the same code with the accepted timestamp as watermark fails.
#[test]
fn replay_is_rejected() {
    let totp = totp(0);
    let code = totp.at(1_234_567_890).expect("code");

    let first = totp
        .verify_with_leeway(&code, Some(1_234_567_890), Some(5), None)
        .expect("verify");
    let accepted = first.expect("first use must be accepted");
    assert_eq!(totp.timecode(accepted), totp.timecode(1_234_567_890));

    assert_eq!(
        totp.verify_with_leeway(&code, Some(1_234_567_890), Some(5), Some(accepted)),
        Ok(None)
    );
    // An earlier watermark does not block the code.
    assert_eq!(
        totp.verify_with_leeway(&code, Some(1_234_567_890), Some(5), Some(accepted - 30)),
        Ok(Some(accepted))
    );
}

/// Watermark 29 (timecode 0) filters timecode 0 but not timecode 1.
#[test]
fn watermark_compares_timecodes() {
    let totp = totp(0);
    let tc0 = totp.at(29).expect("code");
    let tc1 = totp.at(30).expect("code");

    assert_eq!(
        totp.verify_with_leeway(&tc1, Some(30), None, Some(29)),
        Ok(Some(30))
    );
    assert_eq!(
        totp.verify_with_leeway(&tc0, Some(29), None, Some(29)),
        Ok(None)
    );
}

/// The next window's code is still accepted after a replay rejection.
#[test]
fn watermark_then_next_window() {
    let totp = totp(0);
    let accepted = totp
        .verify_with_leeway(&totp.at(45).expect("code"), Some(45), None, None)
        .expect("verify");
    assert_eq!(accepted, Some(45));

    let next = totp.at(75).expect("code");
    assert_eq!(
        totp.verify_with_leeway(&next, Some(75), None, accepted),
        Ok(Some(75))
    );
}

#[test]
fn leeway_of_full_period_rejected() {
    let totp = totp(0);
    for leeway in [30, 31, 3_600] {
        let result = totp.verify_with_leeway("000000", Some(1_000), Some(leeway), None);
        assert!(
            matches!(result, Err(OtpError::InvalidInput(_))),
            "leeway {leeway}: {result:?}"
        );
    }
}

#[test]
fn timestamp_below_leeway_rejected() {
    let result = totp(0).verify_with_leeway("000000", Some(5), Some(10), None);
    assert!(
        matches!(result, Err(OtpError::InvalidInput(_))),
        "got {result:?}"
    );
}

/// Timestamps before a non-zero epoch surface as errors, never as a match.
#[test]
fn timestamp_before_epoch_is_error() {
    let config = TotpConfig::default().with_epoch(1_000_000);
    let totp = Totp::from_bytes(SECRET, config, FixedClock(0)).expect("totp");
    assert_eq!(
        totp.verify("000000", Some(999_999)),
        Err(OtpError::TimecodeUnderflow {
            timestamp: 999_999,
            epoch: 1_000_000
        })
    );
    assert_eq!(
        totp.verify("000000", None),
        Err(OtpError::TimecodeUnderflow {
            timestamp: 0,
            epoch: 1_000_000
        })
    );
}

/// A shifted epoch moves window boundaries.
#[test]
fn epoch_shifts_windows() {
    let config = TotpConfig::default().with_epoch(10);
    let totp = Totp::from_bytes(SECRET, config, FixedClock(0)).expect("totp");
    let code = totp.at(10).expect("code");
    assert_eq!(totp.verify(&code, Some(39)), Ok(true));
    assert_eq!(totp.verify(&code, Some(40)), Ok(false));
    // Counter 0, like timecode 0 under the Unix-epoch configuration.
    assert_eq!(code, self::totp(0).at(0).expect("code"));
}
