//! `sablier-provision`: Enrollment plumbing around `sablier-core`.
//!
//! Random secret generation, base32 transport encoding, `otpauth://`
//! provisioning URIs, and JSON profiles that carry the replay watermark
//! between verifications.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;

pub mod secret;
pub mod uri;

pub mod profile;

pub use error::ProvisionError;
pub use profile::TotpProfile;
pub use secret::{
    decode_base32, encode_base32, generate_secret, DEFAULT_SECRET_LEN, MIN_SECRET_LEN,
};
pub use uri::ProvisioningUri;
