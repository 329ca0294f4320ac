use thiserror::Error;

/// How a raw CSV cell is cleaned before parsing. The source mixes two
/// conventions, so the caller picks the one that matches the column block
/// being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanPolicy {
    /// '.' is a thousands separator and nothing else. The total column
    /// blocks never carry decimals.
    ThousandsOnly,
    /// '.' thousands, ',' decimal, scientific notation passed through
    /// untouched.
    DecimalComma,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cell is not a number: {0:?}")]
pub struct ParseNumberError(pub String);

/// Parses one cell. Empty cells count as 0.0; anything else that does not
/// survive the cleaning policy is an error the caller decides how to absorb.
pub fn parse_cell(raw: &str, policy: CleanPolicy) -> Result<f64, ParseNumberError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    let cleaned = match policy {
        // e.g. "4.6572132E7" is already a float literal
        CleanPolicy::DecimalComma if trimmed.contains('E') || trimmed.contains('e') => {
            trimmed.to_string()
        }
        CleanPolicy::DecimalComma => trimmed.replace('.', "").replace(',', "."),
        CleanPolicy::ThousandsOnly => trimmed.replace('.', ""),
    };
    cleaned
        .parse::<f64>()
        .map_err(|_| ParseNumberError(trimmed.to_string()))
}

/// Legacy behavior: anything unparseable degrades to 0.0.
pub fn parse_cell_or_zero(raw: &str, policy: CleanPolicy) -> f64 {
    parse_cell(raw, policy).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_comma_cells() {
        assert_eq!(parse_cell("1.234,56", CleanPolicy::DecimalComma), Ok(1234.56));
        assert_eq!(parse_cell("46.572.132", CleanPolicy::DecimalComma), Ok(46572132.0));
        assert_eq!(parse_cell("-12,5", CleanPolicy::DecimalComma), Ok(-12.5));
    }

    #[test]
    fn scientific_notation_is_passed_through() {
        assert_eq!(parse_cell("4.6572132E7", CleanPolicy::DecimalComma), Ok(46572132.0));
        assert_eq!(parse_cell("1e3", CleanPolicy::DecimalComma), Ok(1000.0));
    }

    #[test]
    fn thousands_only_cells() {
        assert_eq!(parse_cell("46.572.132", CleanPolicy::ThousandsOnly), Ok(46572132.0));
        // this policy does not know about decimal commas
        assert!(parse_cell("1,5", CleanPolicy::ThousandsOnly).is_err());
    }

    #[test]
    fn empty_cells_are_zero() {
        assert_eq!(parse_cell("", CleanPolicy::ThousandsOnly), Ok(0.0));
        assert_eq!(parse_cell("   ", CleanPolicy::DecimalComma), Ok(0.0));
    }

    #[test]
    fn garbage_degrades_without_panicking() {
        assert!(parse_cell("abc", CleanPolicy::DecimalComma).is_err());
        assert_eq!(parse_cell_or_zero("abc", CleanPolicy::DecimalComma), 0.0);
        assert_eq!(parse_cell_or_zero("abc", CleanPolicy::ThousandsOnly), 0.0);
    }
}
