//! Locale-independent decimal parsing for upstream numeric strings

/// Parse a comma-decimal number such as `"1,459"` or `"-3,703790"`
///
/// Only the comma is rewritten; no thousands separators are expected in
/// the upstream payload. Returns `None` for empty input and for anything
/// that does not parse to a finite `f64`.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = trimmed.replace(',', ".");
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_decimals() {
        assert_eq!(parse_decimal("1,459"), Some(1.459));
        assert_eq!(parse_decimal(" 40,416775 "), Some(40.416775));
        assert_eq!(parse_decimal("-3,703790"), Some(-3.703_79));
        assert_eq!(parse_decimal("2"), Some(2.0));
    }

    #[test]
    fn matches_dot_replacement_for_digit_strings() {
        for s in ["0,1", "1,0", "12,345", "999,999999", "0,000001", "7,5"] {
            let expected: f64 = s.replace(',', ".").parse().unwrap();
            assert_eq!(parse_decimal(s), Some(expected), "input {s}");
        }
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("   "), None);
        assert_eq!(parse_decimal("1,2,3"), None);
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal("inf"), None);
        assert_eq!(parse_decimal("NaN"), None);
    }
}
