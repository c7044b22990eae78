//! Date strings near a matched element.
//!
//! Institution pages rarely mark up dates; we look for the first date-like
//! string in the element's own text followed by its parent's text.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

const MONTHS: &str =
    "january|february|march|april|may|june|july|august|september|october|november|december";

/// Tried in order; the first pattern with any match wins.
static DATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(\d{1,2}[/-]\d{1,2}[/-]\d{4})".to_string(),
        r"(\d{4}[/-]\d{1,2}[/-]\d{1,2})".to_string(),
        format!(r"({MONTHS}).*?(\d{{4}})"),
        format!(r"(\d{{1,2}}).*?({MONTHS}).*?(\d{{4}})"),
    ]
    .iter()
    .map(|p| {
        RegexBuilder::new(p)
            .case_insensitive(true)
            .build()
            .expect("date pattern is valid")
    })
    .collect()
});

/// Find the first date-like string in `text`.
///
/// Returns the captured groups of the first matching pattern joined by a
/// single space (`"July 2024"`, `"08/07/2024"`), or `None`.
pub fn find_date(text: &str) -> Option<String> {
    for pattern in DATE_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            let parts: Vec<&str> = caps
                .iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str())
                .collect();
            return Some(parts.join(" "));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_month_year_numeric() {
        assert_eq!(find_date("Published 08/07/2024 by EBA"), Some("08/07/2024".into()));
        assert_eq!(find_date("on 8-7-2024"), Some("8-7-2024".into()));
    }

    #[test]
    fn iso_like_numeric() {
        assert_eq!(find_date("Released 2024-07-08"), Some("2024-07-08".into()));
        assert_eq!(find_date("2025/3/17 update"), Some("2025/3/17".into()));
    }

    #[test]
    fn month_name_keeps_source_case() {
        assert_eq!(
            find_date("OECD Interim Economic Outlook, March 2025"),
            Some("March 2025".into())
        );
        assert_eq!(find_date("SEPTEMBER issue, 2024"), Some("SEPTEMBER 2024".into()));
    }

    #[test]
    fn leading_day_is_shadowed_by_month_pattern() {
        // The month-name pattern comes first and already matches, so the
        // day-first pattern never contributes the day.
        assert_eq!(find_date("17 March 2025"), Some("March 2025".into()));
    }

    #[test]
    fn numeric_forms_take_priority_over_month_names() {
        assert_eq!(
            find_date("March review, published 17/03/2025"),
            Some("17/03/2025".into())
        );
    }

    #[test]
    fn month_and_year_must_share_a_line() {
        assert_eq!(find_date("July\n2024"), None);
    }

    #[test]
    fn no_date() {
        assert_eq!(find_date("Macroeconomic projections for the euro area"), None);
        assert_eq!(find_date(""), None);
    }
}
