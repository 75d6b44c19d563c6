//! RUT (Chilean tax identifier) normalization and check-digit validation.
//!
//! A RUT is a run of digits followed by one check character (`0`-`9` or `K`).
//! Identifiers are compared in normalized form: uppercase with every `.` and
//! `-` removed, so `"76.086.428-5"` and `"760864285"` are the same tenant.

use regex::Regex;
use std::sync::LazyLock;

static RUT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+[0-9Kk]$").expect("static RUT pattern is valid"));

/// Uppercases the identifier and strips `.` and `-` separators.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '.' && *c != '-')
        .flat_map(char::to_uppercase)
        .collect()
}

/// Computes the expected check character for a digit body.
///
/// The body is weighted right to left with multipliers cycling 2 through 7.
/// A remainder of 0 or 1 maps to `K`. An empty body yields `K`.
pub fn check_digit(body: &str) -> Option<char> {
    let mut sum: u32 = 0;
    let mut multiplier = 2;

    for c in body.chars().rev() {
        sum += c.to_digit(10)? * multiplier;
        multiplier = if multiplier == 7 { 2 } else { multiplier + 1 };
    }

    match sum % 11 {
        0 | 1 => Some('K'),
        remainder => char::from_digit(11 - remainder, 10),
    }
}

/// Returns true when the identifier is well formed and its check character
/// matches the body. Malformed input returns false rather than an error.
pub fn validate(identifier: &str) -> bool {
    let normalized = normalize(identifier);
    if !RUT_PATTERN.is_match(&normalized) {
        return false;
    }

    let (body, check) = normalized.split_at(normalized.len() - 1);
    match (check_digit(body), check.chars().next()) {
        (Some(expected), Some(actual)) => expected == actual,
        _ => false,
    }
}

/// Field validator for `validator` derives on request DTOs.
pub fn validate_rut_field(rut: &str) -> Result<(), validator::ValidationError> {
    if validate(rut) {
        Ok(())
    } else {
        let mut error = validator::ValidationError::new("invalid_rut");
        error.message = Some("RUT inválido".into());
        Err(error)
    }
}
