use crate::error::AppError;
use bcrypt::{hash, verify};
use lazy_static::lazy_static;
use regex::Regex;

// Cost factor used for every stored credential. Hashes written with a
// different cost still verify, so this can be raised without a migration.
const BCRYPT_COST: u32 = 10;

/// Characters the strength policy accepts as "special".
const SPECIAL_CHARS: &str = "@$!%*?&";

lazy_static! {
    // Whole-password shape: at least 8 characters, drawn only from the
    // letters/digits/specials the policy knows about.
    static ref PASSWORD_CHARSET_REGEX: Regex =
        Regex::new(r"^[A-Za-z0-9@$!%*?&]{8,}$").unwrap();
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, BCRYPT_COST)
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    verify(password, hashed_password)
        .map_err(|e| AppError::InternalServerError(format!("Failed to verify password: {}", e)))
}

/// Checks a candidate password against the reset-flow strength policy:
/// minimum 8 characters, at least one lowercase letter, one uppercase letter,
/// one digit and one special character from `@$!%*?&`, with no characters
/// outside that alphabet.
///
/// The `regex` crate has no lookahead, so the policy is the charset/length
/// pattern plus one scan per required character class.
pub fn is_strong_password(password: &str) -> bool {
    PASSWORD_CHARSET_REGEX.is_match(password)
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| SPECIAL_CHARS.contains(c))
}
