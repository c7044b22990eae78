//! Core domain types for monitored publications.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

/// Maximum stored title length, in characters, before truncation.
pub const MAX_TITLE_CHARS: usize = 100;

/// Institutions whose next date comes from the [`RatingSchedule`].
pub const RATING_AGENCIES: [&str; 3] = ["S&P", "Fitch", "Moody's"];

/// Countries recognized in rating-agency publication names, in match priority.
pub const RATING_COUNTRIES: [&str; 4] = ["Spain", "France", "Italy", "Portugal"];

// ---------------------------------------------------------------------------
// InstitutionConfig
// ---------------------------------------------------------------------------

/// A monitored publication: where to look, what to look for, and the
/// static defaults shown until the first successful crawl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionConfig {
    /// Stable numeric identifier (display only).
    pub id: u32,
    /// Issuing institution, e.g. `EBA`.
    pub institution: String,
    /// Publication name, e.g. `EU-wide Stress Test`.
    pub publication: String,
    /// Nominal cadence as displayed (`Annual`, `Quarterly`, ...).
    pub frequency: String,
    /// Page to fetch and scan.
    pub url: String,
    /// Case-insensitive regular expressions, tried in order.
    pub search_patterns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_published: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_title: Option<String>,
    /// Predicted-next string used when no prediction can be made.
    pub predicted_next: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_year_same_period: Option<String>,
}

impl InstitutionConfig {
    /// Key under which this publication's record is stored.
    pub fn key(&self) -> String {
        record_key(&self.institution, &self.publication)
    }

    /// Whether this institution's predictions come from the rating schedule.
    pub fn is_rating_agency(&self) -> bool {
        RATING_AGENCIES.contains(&self.institution.as_str())
    }

    /// Static defaults as a record, for institutions never crawled successfully.
    pub fn fallback_row(&self) -> DisplayRow {
        DisplayRow {
            institution: self.institution.clone(),
            publication: self.publication.clone(),
            frequency: self.frequency.clone(),
            predicted_next: self.predicted_next.clone(),
            last_published: self.last_published.clone().unwrap_or_default(),
            last_title: self.last_title.clone().unwrap_or_default(),
            last_year_same_period: self.last_year_same_period.clone().unwrap_or_default(),
            crawled: false,
        }
    }
}

/// Build the persisted key `"<Institution>_<Publication>"`.
pub fn record_key(institution: &str, publication: &str) -> String {
    format!("{institution}_{publication}")
}

// ---------------------------------------------------------------------------
// ExtractedCandidate
// ---------------------------------------------------------------------------

/// A publication found on a fetched page. Consumed immediately by the crawl
/// cycle to build a [`PublicationRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedCandidate {
    /// Whitespace-normalized text of the matched element.
    pub title: String,
    /// Date string found in or around the element, if any.
    pub date_text: Option<String>,
    /// Link target of the element, or the institution URL.
    pub url: String,
    pub extracted_at: DateTime<FixedOffset>,
}

// ---------------------------------------------------------------------------
// PublicationRecord
// ---------------------------------------------------------------------------

/// Latest known state of one publication, persisted in the historical store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationRecord {
    pub institution: String,
    pub publication: String,
    pub frequency: String,
    /// A literal date or a human-readable estimate.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub predicted_next: String,
    /// Empty when no date was found. Older data files store `null` here.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub last_published: String,
    /// Matched title, truncated to [`MAX_TITLE_CHARS`].
    #[serde(default, deserialize_with = "null_as_empty")]
    pub last_title: String,
    #[serde(default)]
    pub last_year_same_period: Option<String>,
    pub last_crawled: DateTime<FixedOffset>,
    pub source_url: String,
}

impl PublicationRecord {
    /// Key under which this record is stored.
    pub fn key(&self) -> String {
        record_key(&self.institution, &self.publication)
    }

    /// Project onto the columns shown on the dashboard.
    pub fn to_display_row(&self) -> DisplayRow {
        DisplayRow {
            institution: self.institution.clone(),
            publication: self.publication.clone(),
            frequency: self.frequency.clone(),
            predicted_next: self.predicted_next.clone(),
            last_published: self.last_published.clone(),
            last_title: self.last_title.clone(),
            last_year_same_period: self.last_year_same_period.clone().unwrap_or_default(),
            crawled: true,
        }
    }
}

/// Read a JSON `null` string field as `""`.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Truncate a title to [`MAX_TITLE_CHARS`] characters, appending `...` when cut.
pub fn truncate_title(title: &str) -> String {
    if title.chars().count() > MAX_TITLE_CHARS {
        let head: String = title.chars().take(MAX_TITLE_CHARS).collect();
        format!("{head}...")
    } else {
        title.to_string()
    }
}

// ---------------------------------------------------------------------------
// DisplayRow
// ---------------------------------------------------------------------------

/// One dashboard row, from either a stored record or static defaults.
/// Empty strings mean "unknown" and render as a dash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub institution: String,
    pub publication: String,
    pub frequency: String,
    pub predicted_next: String,
    pub last_published: String,
    pub last_title: String,
    pub last_year_same_period: String,
    /// Whether this row comes from a successful crawl.
    pub crawled: bool,
}

// ---------------------------------------------------------------------------
// RatingSchedule
// ---------------------------------------------------------------------------

/// Agency → country → scheduled review date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RatingSchedule(pub BTreeMap<String, BTreeMap<String, String>>);

impl RatingSchedule {
    /// Scheduled date for `agency` reviewing `country`, if listed.
    pub fn lookup(&self, agency: &str, country: &str) -> Option<&str> {
        self.0
            .get(agency)
            .and_then(|countries| countries.get(country))
            .map(String::as_str)
    }
}
