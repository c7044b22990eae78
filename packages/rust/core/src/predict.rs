//! Next-publication-date prediction.
//!
//! Rating agencies follow a published review calendar, so their dates come
//! straight from the [`RatingSchedule`]. Everything else gets a fixed label
//! chosen by frequency category. The labels are estimates for display only;
//! no date arithmetic is performed on the extracted date.

use pubwatch_shared::{InstitutionConfig, RATING_COUNTRIES, RatingSchedule};
use tracing::debug;

pub const ANNUAL_LABEL: &str = "same period next year";
pub const SEMI_ANNUAL_LABEL: &str = "6 months later (estimated)";
pub const QUARTERLY_LABEL: &str = "3 months later (estimated)";
pub const IRREGULAR_LABEL: &str = "second half of 2025";

/// Predict the next publication date for `config`.
///
/// Returns `None` when no date was extracted; the caller then keeps the
/// configured `predicted_next` default.
pub fn predict_next(
    date_text: Option<&str>,
    config: &InstitutionConfig,
    schedule: &RatingSchedule,
) -> Option<String> {
    date_text?;

    if config.is_rating_agency() {
        if let Some(date) = rating_country(&config.publication)
            .and_then(|country| schedule.lookup(&config.institution, country))
        {
            debug!(institution = %config.institution, %date, "using rating schedule");
            return Some(date.to_string());
        }
    }

    Some(frequency_label(&config.frequency).to_string())
}

/// First recognized country mentioned in a publication name.
pub fn rating_country(publication: &str) -> Option<&'static str> {
    let lowered = publication.to_lowercase();
    RATING_COUNTRIES
        .into_iter()
        .find(|country| lowered.contains(&country.to_lowercase()))
}

/// Label for a frequency category, by case-insensitive substring.
///
/// "annual" is tested first, so "Semi-Annual" and "Bi-Annual" also take the
/// annual label.
pub fn frequency_label(frequency: &str) -> &'static str {
    let frequency = frequency.to_lowercase();
    if frequency.contains("annual") {
        ANNUAL_LABEL
    } else if frequency.contains("semi-annual") {
        SEMI_ANNUAL_LABEL
    } else if frequency.contains("quarterly") {
        QUARTERLY_LABEL
    } else {
        IRREGULAR_LABEL
    }
}

#[cfg(test)]
mod tests {
    use pubwatch_shared::{builtin_institutions, builtin_rating_schedule};

    use super::*;

    fn find(institution: &str, publication: &str) -> InstitutionConfig {
        builtin_institutions()
            .into_iter()
            .find(|i| i.institution == institution && i.publication == publication)
            .expect("builtin institution")
    }

    #[test]
    fn no_date_means_no_prediction() {
        let config = find("OECD", "Interim Economic Outlook");
        assert_eq!(predict_next(None, &config, &builtin_rating_schedule()), None);
    }

    #[test]
    fn rating_agency_uses_schedule_regardless_of_date() {
        let config = find("S&P", "Portugal Sovereign Rating");
        let schedule = builtin_rating_schedule();
        for date in ["March 2025", "01/01/1999", "anything"] {
            assert_eq!(
                predict_next(Some(date), &config, &schedule).as_deref(),
                Some("2025-08-29")
            );
        }
    }

    #[test]
    fn rating_agency_without_known_country_falls_back_to_frequency() {
        let mut config = find("S&P", "Portugal Sovereign Rating");
        config.publication = "Greece Sovereign Rating".into();
        assert_eq!(
            predict_next(Some("March 2025"), &config, &builtin_rating_schedule()).as_deref(),
            Some(ANNUAL_LABEL)
        );
    }

    #[test]
    fn agency_missing_from_table_falls_back_to_frequency() {
        let mut config = find("S&P", "Portugal Sovereign Rating");
        config.frequency = "Quarterly".into();
        let schedule = RatingSchedule::default();
        assert_eq!(
            predict_next(Some("March 2025"), &config, &schedule).as_deref(),
            Some(QUARTERLY_LABEL)
        );
    }

    #[test]
    fn non_agency_ignores_schedule_even_with_country_name() {
        let mut config = find("Banque de France", "Macroeconomic Projections");
        config.publication = "Macroeconomic Projections for France".into();
        assert_eq!(
            predict_next(Some("June 2025"), &config, &builtin_rating_schedule()).as_deref(),
            Some(QUARTERLY_LABEL)
        );
    }

    #[test]
    fn country_match_is_case_insensitive_and_ordered() {
        assert_eq!(rating_country("PORTUGAL sovereign"), Some("Portugal"));
        assert_eq!(rating_country("Italy and Spain outlook"), Some("Spain"));
        assert_eq!(rating_country("Germany"), None);
    }

    #[test]
    fn frequency_labels_are_constant_placeholders() {
        assert_eq!(frequency_label("Annual"), ANNUAL_LABEL);
        assert_eq!(frequency_label("Quarterly"), QUARTERLY_LABEL);
        assert_eq!(frequency_label("Irregular"), IRREGULAR_LABEL);
        assert_eq!(frequency_label("Monthly"), IRREGULAR_LABEL);
    }

    #[test]
    fn semi_and_bi_annual_take_the_annual_label() {
        assert_eq!(frequency_label("Semi-Annual"), ANNUAL_LABEL);
        assert_eq!(frequency_label("Bi-Annual"), ANNUAL_LABEL);
        assert_eq!(frequency_label("semi-annual"), ANNUAL_LABEL);
    }
}
