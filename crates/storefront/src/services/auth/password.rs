//! Password hashing and verification.
//!
//! Passwords are hashed with scrypt (a deliberately slow, memory-hard KDF)
//! using a per-user random salt. Salt and derived key are stored hex-encoded
//! in separate columns; verification re-derives with the stored salt and
//! compares in constant time.

use rand::RngCore;
use scrypt::Params;

use super::error::AuthError;

/// Salt length in bytes (128 bits minimum per the credential policy).
const SALT_LEN: usize = 16;

/// Derived key length in bytes.
const KEY_LEN: usize = 64;

/// scrypt cost parameters: N = 2^14, r = 8, p = 1.
const SCRYPT_LOG_N: u8 = 14;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;

fn scrypt_params() -> Result<Params, AuthError> {
    Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, KEY_LEN).map_err(|_| AuthError::PasswordHash)
}

/// Hash a password, returning `(salt, hash)` as fixed-length hex strings
/// (32 and 128 characters).
///
/// The KDF runs over the hex-encoded salt string, which is also what gets
/// stored, so verification feeds the stored column straight back in.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if key derivation fails.
pub fn hash_password(password: &str) -> Result<(String, String), AuthError> {
    let mut salt_bytes = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt_bytes);
    let salt = hex::encode(salt_bytes);

    let mut derived = [0u8; KEY_LEN];
    scrypt::scrypt(
        password.as_bytes(),
        salt.as_bytes(),
        &scrypt_params()?,
        &mut derived,
    )
    .map_err(|_| AuthError::PasswordHash)?;

    Ok((salt, hex::encode(derived)))
}

/// Verify a password against stored hex salt and hash.
///
/// Any malformed stored material (bad hex, wrong length) is a plain
/// non-match. The comparison itself is constant-time over the full key
/// length, so timing does not reveal where the candidate diverges.
#[must_use]
pub fn verify_password(password: &str, salt: &str, expected_hash: &str) -> bool {
    let Ok(expected) = hex::decode(expected_hash) else {
        return false;
    };

    let Ok(params) = scrypt_params() else {
        return false;
    };

    let mut derived = [0u8; KEY_LEN];
    if scrypt::scrypt(password.as_bytes(), salt.as_bytes(), &params, &mut derived).is_err() {
        return false;
    }

    constant_time_eq(&derived, &expected)
}

/// Constant-time byte comparison.
///
/// Accumulates the XOR of every byte pair rather than returning on the first
/// difference. A length mismatch is a non-match, decided before any content
/// is inspected.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_produces_fixed_length_hex() {
        let (salt, hash) = hash_password("hunter2hunter2").expect("hashes");
        assert_eq!(salt.len(), SALT_LEN * 2);
        assert_eq!(hash.len(), KEY_LEN * 2);
        assert!(salt.bytes().all(|b| b.is_ascii_hexdigit()));
        assert!(hash.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_round_trip() {
        let (salt, hash) = hash_password("correct horse battery").expect("hashes");
        assert!(verify_password("correct horse battery", &salt, &hash));
        assert!(!verify_password("wrong horse battery", &salt, &hash));
    }

    #[test]
    fn test_same_password_different_salts() {
        let (salt_a, hash_a) = hash_password("password123").expect("hashes");
        let (salt_b, hash_b) = hash_password("password123").expect("hashes");
        assert_ne!(salt_a, salt_b);
        assert_ne!(hash_a, hash_b);
    }

    #[test]
    fn test_malformed_stored_hash_is_nonmatch() {
        let (salt, _) = hash_password("password123").expect("hashes");
        assert!(!verify_password("password123", &salt, "not-hex"));
        assert!(!verify_password("password123", &salt, "abcd"));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"same bytes", b"same bytes"));
        assert!(!constant_time_eq(b"same bytes", b"diff bytes"));
        assert!(!constant_time_eq(b"short", b"longer input"));
        assert!(constant_time_eq(b"", b""));
    }
}
