//! Constant-time comparison of OTP code strings.

/// Constant-time comparison of two OTP codes.
///
/// Returns `true` iff both strings have equal length and identical bytes.
/// Differences are accumulated with bitwise OR, so the running time does
/// not depend on the position of the first differing character.
///
/// The early return on length mismatch is acceptable: the expected digit
/// count is public configuration, not secret. The constant-time property
/// protects the *code value*, not its length.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let diff = a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y));
    std::hint::black_box(diff) == 0
}
