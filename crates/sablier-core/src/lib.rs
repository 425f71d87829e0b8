//! `sablier-core`: Time-window TOTP resolution and replay-safe verification.
//!
//! Pure and synchronous: zero network, zero file I/O, zero async. Time is
//! always supplied by the caller or by an injected [`Clock`].

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;

pub mod clock;
pub mod compare;
pub mod config;

pub mod hotp;

pub mod timecode;
pub mod window;

pub mod totp;

pub use clock::{Clock, FixedClock, SystemClock};
pub use compare::constant_time_eq;
pub use config::{TotpConfig, DEFAULT_EPOCH, DEFAULT_PERIOD};
pub use error::OtpError;
pub use hotp::{generate_hotp, HotpGenerator, OtpAlgorithm, OtpDigits};
pub use timecode::{expires_in, resolve, window_start};
pub use totp::Totp;
pub use window::{verify_window, Candidates, CodeGenerator, MAX_CANDIDATES};
