//! HTML dashboard rendering.
//!
//! The dashboard is an existing HTML template with two substitution points:
//! the `{{LAST_UPDATE_TIME}}` token and the `<tbody>...</tbody>` region,
//! which is replaced wholesale with one row per configured institution.
//! Optional summary tokens (`{{TOTAL_COUNT}}` etc.) are filled when present.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::DateTime;
use chrono_tz::Tz;
use regex::{NoExpand, Regex};
use tracing::{info, instrument};

use pubwatch_shared::{DisplayRow, InstitutionConfig, PubwatchError, Result};
use pubwatch_storage::{HistoricalStore, write_atomic};

use crate::predict::IRREGULAR_LABEL;

/// Token replaced with the human-readable update time.
pub const LAST_UPDATE_TOKEN: &str = "{{LAST_UPDATE_TIME}}";

/// Table body region, across newlines.
static TBODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<tbody>.*?</tbody>").expect("valid tbody pattern"));

/// Shown for unknown values.
const PLACEHOLDER: &str = "-";

// ---------------------------------------------------------------------------
// Row resolution
// ---------------------------------------------------------------------------

/// One row per configured institution, in configuration order: the stored
/// record when a crawl has succeeded, otherwise the static defaults.
pub fn effective_rows(
    institutions: &[InstitutionConfig],
    store: &HistoricalStore,
) -> Vec<DisplayRow> {
    institutions
        .iter()
        .map(|inst| match store.get(&inst.key()) {
            Some(record) => record.to_display_row(),
            None => inst.fallback_row(),
        })
        .collect()
}

/// Display order for the dashboard.
///
/// Rows keep configuration order, which is maintained by hand to approximate
/// soonest-predicted-first. Predicted dates are free text, so no parsing is
/// attempted here.
pub fn sort_for_display(rows: Vec<DisplayRow>) -> Vec<DisplayRow> {
    rows
}

// ---------------------------------------------------------------------------
// Summary statistics
// ---------------------------------------------------------------------------

/// Counts shown in the dashboard header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total: usize,
    /// Rows backed by a successful crawl.
    pub crawled: usize,
    /// Rows still showing static defaults.
    pub pending: usize,
    /// Rows with an irregular cadence or the irregular fallback prediction.
    pub irregular: usize,
}

impl DashboardStats {
    pub fn from_rows(rows: &[DisplayRow]) -> Self {
        let crawled = rows.iter().filter(|r| r.crawled).count();
        let irregular = rows
            .iter()
            .filter(|r| {
                r.frequency.to_lowercase().contains("irregular")
                    || r.predicted_next == IRREGULAR_LABEL
            })
            .count();
        Self {
            total: rows.len(),
            crawled,
            pending: rows.len() - crawled,
            irregular,
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Human-readable update time, e.g. `2025-07-01 07:00:12 (Paris time)`.
pub fn format_update_time(at: &DateTime<Tz>) -> String {
    let city = at
        .timezone()
        .name()
        .rsplit('/')
        .next()
        .unwrap_or("local")
        .replace('_', " ");
    format!("{} ({city} time)", at.format("%Y-%m-%d %H:%M:%S"))
}

/// Render `<tr>` rows with a 1-based rank.
pub fn render_rows(rows: &[DisplayRow]) -> String {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            format!(
                r#"                <tr>
                    <td style="text-align: center; font-weight: bold;">{rank}</td>
                    <td class="institution-cell">{institution}</td>
                    <td><strong>{publication}</strong></td>
                    <td>{frequency}</td>
                    <td style="text-align: center;">{predicted_next}</td>
                    <td style="text-align: center;">{last_published}</td>
                    <td>{last_title}</td>
                    <td style="text-align: center;">{last_year}</td>
                </tr>"#,
                rank = i + 1,
                institution = cell(&row.institution),
                publication = cell(&row.publication),
                frequency = cell(&row.frequency),
                predicted_next = cell(&row.predicted_next),
                last_published = cell(&row.last_published),
                last_title = cell(&row.last_title),
                last_year = cell(&row.last_year_same_period),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fill `template` with `rows`, the update time and summary counts.
///
/// Fails if the template has no `<tbody>...</tbody>` region.
pub fn render_document(
    template: &str,
    rows: &[DisplayRow],
    updated_at: &DateTime<Tz>,
) -> Result<String> {
    if !TBODY.is_match(template) {
        return Err(PubwatchError::Render(
            "template has no <tbody>...</tbody> region".into(),
        ));
    }

    let stats = DashboardStats::from_rows(rows);
    let html = template
        .replace(LAST_UPDATE_TOKEN, &format_update_time(updated_at))
        .replace("{{TOTAL_COUNT}}", &stats.total.to_string())
        .replace("{{CRAWLED_COUNT}}", &stats.crawled.to_string())
        .replace("{{PENDING_COUNT}}", &stats.pending.to_string())
        .replace("{{IRREGULAR_COUNT}}", &stats.irregular.to_string());

    let body = format!("<tbody>\n{}\n            </tbody>", render_rows(rows));
    Ok(TBODY.replace_all(&html, NoExpand(&body)).into_owned())
}

/// Render the dashboard from `template_path` to `output_path`.
///
/// A missing template is reported as [`PubwatchError::TemplateMissing`] so
/// callers can skip rendering for this cycle.
#[instrument(
    skip_all,
    fields(template = %template_path.display(), output = %output_path.display())
)]
pub fn render_dashboard(
    template_path: &Path,
    output_path: &Path,
    institutions: &[InstitutionConfig],
    store: &HistoricalStore,
    updated_at: &DateTime<Tz>,
) -> Result<PathBuf> {
    if !template_path.exists() {
        return Err(PubwatchError::TemplateMissing(template_path.to_path_buf()));
    }

    let template = std::fs::read_to_string(template_path)
        .map_err(|e| PubwatchError::io(template_path, e))?;

    let rows = sort_for_display(effective_rows(institutions, store));
    let html = render_document(&template, &rows, updated_at)?;

    write_atomic(output_path, &html)?;

    info!(rows = rows.len(), "dashboard generated");
    Ok(output_path.to_path_buf())
}

/// Cell content: HTML-escaped, or a dash when empty.
fn cell(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        html_escape(value)
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
