//! Cell coercion for the recognized source columns.
//!
//! A cell that fails coercion is absent (`None`), never an error and never zero.

/// Missing value tokens
pub const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "NULL", "NaN", "nan", "None", "<NA>", ".", "-", "--", "#N/A",
];

/// Check if a cell represents a missing value
pub fn is_missing(value: &str) -> bool {
    let trimmed = value.trim();
    MISSING_TOKENS.iter().any(|t| trimmed.eq_ignore_ascii_case(t))
}

/// Parse a beneficiary count.
///
/// Negative and non-finite values are treated as absent so that no negative
/// count ever enters a sum.
pub fn parse_count(value: &str) -> Option<f64> {
    if is_missing(value) {
        return None;
    }
    let num = value.trim().parse::<f64>().ok()?;
    if num.is_finite() && num >= 0.0 {
        Some(num)
    } else {
        None
    }
}

/// Parse a period: an integer, or a float without a fractional part
pub fn parse_period(value: &str) -> Option<i64> {
    if is_missing(value) {
        return None;
    }
    let trimmed = value.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return Some(int);
    }
    let num = trimmed.parse::<f64>().ok()?;
    if num.is_finite() && num.fract() == 0.0 && num.abs() < i64::MAX as f64 {
        Some(num as i64)
    } else {
        None
    }
}

/// Trim a categorical cell
pub fn clean_category(value: &str) -> String {
    value.trim().to_string()
}

/// Render a count the way it is written back to a delimited file
pub fn format_count(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
