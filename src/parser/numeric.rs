// ==========================================
// Invoice Ingest - Numeric Cell Parsing
// ==========================================
// Responsibility: currency / percentage / quantity parsing for cells
// produced by the fixed-width-to-CSV conversion. Accounting-style
// negatives "(123.45)" are supported everywhere.
// ==========================================

/// Trim and collapse internal whitespace runs to single spaces.
pub fn clean_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Round a dollar amount to cents.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Strip accounting parentheses, returning the inner text and whether
/// the value was negated.
fn strip_parens(value: &str) -> (&str, bool) {
    let trimmed = value.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('(') && trimmed.ends_with(')') {
        (&trimmed[1..trimmed.len() - 1], true)
    } else {
        (trimmed, false)
    }
}

/// Parse a currency cell: strips `$` and thousands separators, converts
/// `(x)` to `-x`. Blank cells yield None.
pub fn parse_currency(value: &str) -> Option<f64> {
    let (inner, negated) = strip_parens(value);
    let cleaned: String = inner
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned
        .parse::<f64>()
        .ok()
        .map(|v| if negated { -v } else { v })
}

/// Parse a percentage cell: strips `%`, same parenthesis handling.
pub fn parse_percent(value: &str) -> Option<f64> {
    let (inner, negated) = strip_parens(value);
    let cleaned: String = inner
        .chars()
        .filter(|c| !matches!(c, '%' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned
        .parse::<f64>()
        .ok()
        .map(|v| if negated { -v } else { v })
}

/// Parse a quantity cell (plain number, accounting negatives allowed).
pub fn parse_quantity(value: &str) -> Option<f64> {
    parse_currency(value)
}

/// True when the cell is blank or parses as currency. Used by the
/// pattern detector for the money slot group.
pub fn is_currency_or_blank(value: &str) -> bool {
    value.trim().is_empty() || parse_currency(value).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_currency_plain() {
        assert_eq!(parse_currency("10.00"), Some(10.0));
        assert_eq!(parse_currency("  $1,234.56 "), Some(1234.56));
    }

    #[test]
    fn test_parse_currency_accounting_negative() {
        assert_eq!(parse_currency("(123.45)"), Some(-123.45));
        assert_eq!(parse_currency("($12.00)"), Some(-12.0));
    }

    #[test]
    fn test_parse_currency_blank_and_garbage() {
        assert_eq!(parse_currency(""), None);
        assert_eq!(parse_currency("   "), None);
        assert_eq!(parse_currency("Tire 205/55"), None);
        assert_eq!(parse_currency("()"), None);
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_percent("50.00%"), Some(50.0));
        assert_eq!(parse_percent("(12.5%)"), Some(-12.5));
        assert_eq!(parse_percent(""), None);
    }

    #[test]
    fn test_is_currency_or_blank() {
        assert!(is_currency_or_blank(""));
        assert!(is_currency_or_blank("0.00"));
        assert!(is_currency_or_blank("($5.00)"));
        assert!(!is_currency_or_blank("N/A"));
    }

    #[test]
    fn test_clean_text_collapses_runs() {
        assert_eq!(clean_text("  J   DOE  "), "J DOE");
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(10.004), 10.0);
        assert_eq!(round_cents(10.006), 10.01);
        assert_eq!(round_cents(-3.333), -3.33);
    }
}
