// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 MinePool Labs

//! Password strength scoring.
//!
//! Advisory only: the register and change-password handlers run this before
//! hashing, but the hasher itself accepts whatever it is given.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Minimum acceptable password length.
const MIN_LENGTH: usize = 8;

/// Deny-list of passwords seen constantly in credential dumps. Matched
/// case-insensitively against the whole candidate.
const COMMON_PASSWORDS: &[&str] = &[
    "password",
    "password1",
    "12345678",
    "123456789",
    "qwerty123",
    "letmein",
    "iloveyou",
    "admin123",
    "welcome1",
    "sunshine",
    "monkey123",
    "football",
    "baseball",
    "dragon123",
    "trustno1",
];

/// A specific way a candidate password falls short.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StrengthViolation {
    /// Shorter than the minimum length
    TooShort,
    /// No lowercase letter
    MissingLowercase,
    /// No uppercase letter
    MissingUppercase,
    /// No digit
    MissingDigit,
    /// No special character
    MissingSpecial,
    /// Appears on the common-password deny-list
    TooCommon,
}

impl std::fmt::Display for StrengthViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrengthViolation::TooShort => {
                write!(f, "Password must be at least {MIN_LENGTH} characters")
            }
            StrengthViolation::MissingLowercase => {
                write!(f, "Password must contain a lowercase letter")
            }
            StrengthViolation::MissingUppercase => {
                write!(f, "Password must contain an uppercase letter")
            }
            StrengthViolation::MissingDigit => write!(f, "Password must contain a digit"),
            StrengthViolation::MissingSpecial => {
                write!(f, "Password must contain a special character")
            }
            StrengthViolation::TooCommon => write!(f, "Password is too common"),
        }
    }
}

/// Result of scoring a candidate password.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StrengthReport {
    /// True iff there are no violations.
    pub valid: bool,
    /// 0..=4; one point per satisfied check, minus a deny-list penalty.
    pub score: u8,
    /// Every check that failed, independently.
    pub violations: Vec<StrengthViolation>,
}

/// Score a candidate password.
///
/// Length and each character class are checked independently and each
/// satisfied check contributes one point (capped at 4). Deny-list
/// membership subtracts two points (floored at 0) and always records a
/// violation, whatever the other checks said.
pub fn score_password_strength(plaintext: &str) -> StrengthReport {
    let mut violations = Vec::new();
    let mut points: u8 = 0;

    if plaintext.chars().count() >= MIN_LENGTH {
        points += 1;
    } else {
        violations.push(StrengthViolation::TooShort);
    }

    if plaintext.chars().any(|c| c.is_lowercase()) {
        points += 1;
    } else {
        violations.push(StrengthViolation::MissingLowercase);
    }

    if plaintext.chars().any(|c| c.is_uppercase()) {
        points += 1;
    } else {
        violations.push(StrengthViolation::MissingUppercase);
    }

    if plaintext.chars().any(|c| c.is_ascii_digit()) {
        points += 1;
    } else {
        violations.push(StrengthViolation::MissingDigit);
    }

    if plaintext.chars().any(|c| !c.is_alphanumeric()) {
        points += 1;
    } else {
        violations.push(StrengthViolation::MissingSpecial);
    }

    let mut score = points.min(4);

    let lowered = plaintext.to_lowercase();
    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        score = score.saturating_sub(2);
        violations.push(StrengthViolation::TooCommon);
    }

    StrengthReport {
        valid: violations.is_empty(),
        score,
        violations,
    }
}
