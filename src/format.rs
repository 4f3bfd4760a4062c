//! Canonical decimal rendering of evaluation results.

/// Formats a finite result in shortest decimal form.
///
/// Rounds to 10 fractional digits, then strips trailing zeros and a dangling
/// decimal point, so `5.0` renders as `5` and `2.5000000000` as `2.5`.
/// Magnitudes of 1e15 and up switch to exponent form.
pub fn format_result(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.abs() >= 1e15 {
        return format!("{:e}", value);
    }
    if value.fract() == 0.0 {
        return format!("{}", value as i64);
    }
    let fixed = format!("{:.10}", value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        // rounding a tiny negative underflows to negative zero
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
