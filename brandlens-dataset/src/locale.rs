//! Comma-decimal normalization
//!
//! The external brand metrics arrive with comma decimal separators
//! ("4,5") and the assembled dataset is consumed by spreadsheet software
//! expecting the same, so numbers are parsed on the way in and formatted
//! back on the way out.

/// Parse a decimal that may use a comma separator. Empty or unparseable
/// input yields `None`.
pub fn parse_comma_decimal(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.replace(',', ".").parse::<f64>().ok()
}

/// Lenient numeric coercion: missing or unparseable values become 0.
pub fn coerce_numeric(raw: Option<&str>) -> f64 {
    raw.and_then(parse_comma_decimal).unwrap_or(0.0)
}

/// Format a number with a comma decimal separator. Whole numbers keep one
/// decimal place ("1523,0") to match the float formatting of the upstream
/// metric exports.
pub fn format_comma_decimal(value: f64) -> String {
    let text = if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    };
    text.replace('.', ",")
}

/// Missing values serialize as empty cells.
pub fn format_optional_comma_decimal(value: Option<f64>) -> String {
    value.map(format_comma_decimal).unwrap_or_default()
}
