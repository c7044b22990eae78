//! Publication extraction: find the announcement of a configured publication
//! on a fetched institution page.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use regex::{Regex, RegexBuilder};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use pubwatch_shared::{ExtractedCandidate, InstitutionConfig, PubwatchError, Result};

use crate::dates::find_date;

/// Elements whose text can carry a publication title.
static TEXT_ELEMENTS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4, a, span").expect("valid selector"));

/// Elements with this many characters or fewer are never considered.
const MIN_TEXT_CHARS: usize = 10;

/// Compile search patterns as case-insensitive regexes, preserving order.
pub fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .map_err(|e| PubwatchError::parse(format!("bad search pattern '{p}': {e}")))
        })
        .collect()
}

/// Scan `html` for the first announcement matching `config`'s patterns.
///
/// Patterns are tried in order; for each, candidate elements are visited in
/// document order and the first one whose text is long enough and matches
/// wins. `Ok(None)` means nothing qualified, which is a normal outcome.
pub fn extract_publication(
    html: &str,
    config: &InstitutionConfig,
    extracted_at: DateTime<FixedOffset>,
) -> Result<Option<ExtractedCandidate>> {
    let patterns = compile_patterns(&config.search_patterns)?;
    let doc = Html::parse_document(html);

    let Some((element, title)) = find_first_match(&doc, &patterns) else {
        return Ok(None);
    };

    let date_text = date_near(&element);
    let url = resolve_link(&element, &config.url);

    debug!(%title, date = ?date_text, %url, "publication matched");

    Ok(Some(ExtractedCandidate {
        title,
        date_text,
        url,
        extracted_at,
    }))
}

/// First element matching any pattern, in pattern order then document order.
fn find_first_match<'a>(doc: &'a Html, patterns: &[Regex]) -> Option<(ElementRef<'a>, String)> {
    for pattern in patterns {
        for el in doc.select(&TEXT_ELEMENTS) {
            let text = element_text(&el);
            if text.chars().count() > MIN_TEXT_CHARS && pattern.is_match(&text) {
                return Some((el, text));
            }
        }
    }
    None
}

/// Element text with surrounding whitespace trimmed and inner runs collapsed.
fn element_text(el: &ElementRef<'_>) -> String {
    let raw: String = el.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Look for a date in the element's text, then in its parent's.
fn date_near(el: &ElementRef<'_>) -> Option<String> {
    let mut text: String = el.text().collect();
    if let Some(parent) = el.parent().and_then(ElementRef::wrap) {
        text.push(' ');
        text.extend(parent.text());
    }
    find_date(&text)
}

/// Link target for a matched element.
///
/// Relative hrefs are appended to `base_url` as-is; no URL joining is done.
fn resolve_link(el: &ElementRef<'_>, base_url: &str) -> String {
    if el.value().name() == "a" {
        if let Some(href) = el.value().attr("href").filter(|h| !h.is_empty()) {
            if href.starts_with("http") {
                return href.to_string();
            }
            return format!("{base_url}{href}");
        }
    }
    base_url.to_string()
}
