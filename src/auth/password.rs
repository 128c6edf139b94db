// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 MinePool Labs

//! Password hashing and verification.

use unicode_normalization::UnicodeNormalization;

use super::AuthError;

/// NFKC-normalize a plaintext before hashing or verifying, so visually
/// identical passwords verify regardless of Unicode composition.
fn normalize(plaintext: &str) -> String {
    plaintext.nfkc().collect()
}

/// Hash a password with bcrypt at the given cost factor.
///
/// Salting is per-call, so hashing the same plaintext twice yields two
/// different digests that both verify.
pub fn hash_password(plaintext: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(normalize(plaintext), cost).map_err(|e| {
        tracing::error!(error = %e, "password hashing failed");
        AuthError::HashingFailure
    })
}

/// Verify a password against a stored digest.
///
/// Never errors to the caller: a malformed digest verifies as `false`, the
/// same as a wrong password.
pub fn verify_password(plaintext: &str, digest: &str) -> bool {
    bcrypt::verify(normalize(plaintext), digest).unwrap_or(false)
}
