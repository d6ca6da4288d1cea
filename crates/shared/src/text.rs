//! Helpers for loosely typed text coming from spreadsheets and forms.

/// Returns the trimmed value, or `None` when it is blank.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parses the leading integer of a string, spreadsheet style.
///
/// Surrounding whitespace is ignored, an optional sign is accepted, and parsing
/// stops at the first non-digit, so `"2 adults"` and `"3.0"` yield 2 and 3.
/// Returns `None` when no digit leads the value or the number overflows `i64`.
pub fn parse_leading_int(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits: &str = {
        let end = rest
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map_or(rest.len(), |(idx, _)| idx);
        &rest[..end]
    };

    if digits.is_empty() {
        return None;
    }

    let magnitude: i64 = digits.parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
