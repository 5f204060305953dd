//! Password policy, hashing and access token generation.

use anyhow::{Context, Result};
use base64ct::{Base64, Encoding};
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use std::fmt;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Random bytes behind a passport access token before base64 encoding.
const ACCESS_TOKEN_BYTES: usize = 48;

/// A single rule of the password policy that a candidate did not satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyViolation {
    MatchesUsername,
    TooShort,
    MissingLowercase,
    MissingUppercase,
    MissingDigit,
    MissingSymbol,
}

impl PolicyViolation {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::MatchesUsername => "Password may not match your username",
            Self::TooShort => "Password must be at least 8 characters",
            Self::MissingLowercase => "Password must contain a lowercase letter",
            Self::MissingUppercase => "Password must contain an uppercase letter",
            Self::MissingDigit => "Password must contain a number",
            Self::MissingSymbol => "Password must contain a symbol",
        }
    }
}

impl fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

fn matches(pattern: &str, value: &str) -> bool {
    Regex::new(pattern).is_ok_and(|re| re.is_match(value))
}

/// Portion of a username before the first `@`.
pub(crate) fn local_part(username: &str) -> &str {
    username.split('@').next().unwrap_or_default()
}

/// List every rule the password breaks, in policy order.
#[must_use]
pub fn policy_violations(password: &str, username: &str) -> Vec<PolicyViolation> {
    let mut violations = Vec::new();

    if password.trim().to_lowercase() == local_part(username).trim().to_lowercase() {
        violations.push(PolicyViolation::MatchesUsername);
    }
    // Length is counted in UTF-16 code units, so astral characters count twice.
    if password.encode_utf16().count() < MIN_PASSWORD_LENGTH {
        violations.push(PolicyViolation::TooShort);
    }
    if !matches(r"[a-z]", password) {
        violations.push(PolicyViolation::MissingLowercase);
    }
    if !matches(r"[A-Z]", password) {
        violations.push(PolicyViolation::MissingUppercase);
    }
    if !matches(r"[0-9]", password) {
        violations.push(PolicyViolation::MissingDigit);
    }
    // Word characters are ASCII only, so accented letters count as symbols.
    if !matches(r"[^A-Za-z0-9_\s]", password) {
        violations.push(PolicyViolation::MissingSymbol);
    }

    violations
}

/// Check a candidate password against the strength policy.
///
/// The password must not equal the local part of the username (ignoring case
/// and surrounding whitespace), must be at least 8 UTF-16 code units long and
/// must contain a lowercase letter, an uppercase letter, a digit and a symbol.
#[must_use]
pub fn validate_password(password: &str, username: &str) -> bool {
    policy_violations(password, username).is_empty()
}

/// Hash a password with bcrypt on the blocking pool.
///
/// # Errors
/// Returns an error if hashing fails or the blocking task panics.
pub async fn hash_password(password: &str, cost: u32) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .context("password hashing task failed")?
        .context("failed to hash password")
}

/// Create a random opaque access token for a passport.
///
/// # Errors
/// Returns an error if the OS random source is unavailable.
pub fn generate_access_token() -> Result<String> {
    let mut bytes = [0u8; ACCESS_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate access token")?;
    Ok(Base64::encode_string(&bytes))
}
