//! Permissive numeric coercion applied once at the form/engine boundary.

use super::types::FieldValue;

/// Parses user-entered text into a finite number.
///
/// Thousands separators are stripped. Blank text, a lone sign or dot and
/// anything that does not parse to a finite value all become `0.0`.
pub fn parse_number(raw: &str) -> f64 {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    let trimmed = cleaned.trim();
    if matches!(trimmed, "" | "-" | "." | "-.") {
        return 0.0;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|x| x.is_finite())
        .unwrap_or(0.0)
}

pub fn to_number(value: &FieldValue) -> f64 {
    match value {
        FieldValue::Blank => 0.0,
        FieldValue::Number(x) => finite_or_zero(*x),
        FieldValue::Flag(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        FieldValue::Text(s) => parse_number(s),
    }
}

/// Blank means "use the loan model", matching the form default.
pub fn to_flag(value: &FieldValue) -> bool {
    match value {
        FieldValue::Blank => true,
        FieldValue::Flag(b) => *b,
        FieldValue::Number(x) => x.is_finite() && *x != 0.0,
        FieldValue::Text(s) => {
            let s = s.trim();
            s.is_empty()
                || ["1", "true", "yes", "on"]
                    .iter()
                    .any(|t| s.eq_ignore_ascii_case(t))
        }
    }
}

pub fn clamp_pct(pct: f64) -> f64 {
    finite_or_zero(pct).clamp(0.0, 100.0)
}

pub fn clamp01(x: f64) -> f64 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

pub fn non_negative(x: f64) -> f64 {
    finite_or_zero(x).max(0.0)
}

pub fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() { x } else { 0.0 }
}
