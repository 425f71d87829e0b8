//! Shared-secret generation and base32 transport encoding (RFC 4648).
//!
//! Authenticator apps exchange secrets as unpadded upper-case base32.
//! Decoding is lenient about the ways humans retype them: lower case,
//! groups separated by spaces or dashes, and trailing `=` padding.

use data_encoding::BASE32_NOPAD;
use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::SecretSlice;
use zeroize::Zeroizing;

use crate::ProvisionError;

/// Minimum shared-secret length in bytes (128 bits, RFC 4226 §4 R6).
pub const MIN_SECRET_LEN: usize = 16;

/// Default shared-secret length in bytes (160 bits, RFC 4226 §4 recommendation).
pub const DEFAULT_SECRET_LEN: usize = 20;

/// Generate a random shared secret of `len` bytes from the OS CSPRNG.
///
/// # Errors
/// Returns `ProvisionError::Secret` if `len < MIN_SECRET_LEN`.
pub fn generate_secret(len: usize) -> Result<SecretSlice<u8>, ProvisionError> {
    if len < MIN_SECRET_LEN {
        return Err(ProvisionError::Secret(format!(
            "secret must be at least {MIN_SECRET_LEN} bytes (got {len})"
        )));
    }
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    Ok(bytes.into())
}

/// Encode secret bytes as unpadded upper-case base32.
#[must_use]
pub fn encode_base32(secret: &[u8]) -> String {
    BASE32_NOPAD.encode(secret)
}

/// Decode a base32 secret as typed or scanned by a user.
///
/// # Errors
/// Returns `ProvisionError::Secret` if the input is empty or not base32.
pub fn decode_base32(encoded: &str) -> Result<SecretSlice<u8>, ProvisionError> {
    let normalized = normalize(encoded);
    if normalized.is_empty() {
        return Err(ProvisionError::Secret("secret must not be empty".to_owned()));
    }
    let bytes = BASE32_NOPAD
        .decode(normalized.as_bytes())
        .map_err(|e| ProvisionError::Secret(format!("invalid base32 secret: {e}")))?;
    Ok(bytes.into())
}

/// Canonical form of a base32 secret: upper case, no separators, no padding.
#[must_use]
pub fn normalize(encoded: &str) -> Zeroizing<String> {
    let mut normalized: String = encoded
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let unpadded_len = normalized.trim_end_matches('=').len();
    normalized.truncate(unpadded_len);
    Zeroizing::new(normalized)
}
