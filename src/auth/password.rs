/// Password Hashing and Verification
///
/// bcrypt with a per-hash random salt embedded in the `$2b$` output, so a
/// stored hash is all `verify` needs.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::AppError;

/// bcrypt only reads this many bytes of input
pub const MAX_PASSWORD_BYTES: usize = 72;

/// One-way credential hasher
///
/// Inputs longer than [`MAX_PASSWORD_BYTES`] are cut to the longest prefix
/// that fits and still ends on a UTF-8 character boundary. The same cut is
/// applied when hashing and when verifying, so two passwords that share
/// their first 72 bytes are interchangeable.
#[derive(Debug, Clone, Copy)]
pub struct CredentialHasher {
    cost: u32,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

impl CredentialHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// # Errors
    /// Returns error if bcrypt rejects the cost factor
    pub fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        hash(truncate_to_limit(plaintext), self.cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// A malformed stored hash counts as a mismatch.
    pub fn verify(&self, plaintext: &str, hashed: &str) -> bool {
        match verify(truncate_to_limit(plaintext), hashed) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash could not be parsed");
                false
            }
        }
    }

    /// Does the same bcrypt work as `verify` and always fails
    ///
    /// Used when no stored hash exists, so an unknown account costs as much
    /// time as a wrong password.
    pub fn verify_absent(&self, plaintext: &str) -> bool {
        if let Err(e) = hash(truncate_to_limit(plaintext), self.cost) {
            tracing::warn!(error = %e, "Placeholder password hash failed");
        }
        false
    }
}

/// Longest prefix of at most `MAX_PASSWORD_BYTES` bytes on a char boundary
pub fn truncate_to_limit(plaintext: &str) -> &str {
    if plaintext.len() <= MAX_PASSWORD_BYTES {
        return plaintext;
    }
    let mut end = MAX_PASSWORD_BYTES;
    while !plaintext.is_char_boundary(end) {
        end -= 1;
    }
    &plaintext[..end]
}
