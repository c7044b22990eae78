//! Built-in institution list and rating-agency calendar.
//!
//! Used when the config file does not provide `[[institutions]]` or
//! `[rating_schedule]` sections.

use std::collections::BTreeMap;

use crate::types::{InstitutionConfig, RatingSchedule};

/// The default set of monitored publications, in display order.
pub fn builtin_institutions() -> Vec<InstitutionConfig> {
    vec![
        InstitutionConfig {
            id: 1,
            institution: "EBA".into(),
            publication: "ESEP".into(),
            frequency: "Annual".into(),
            url: "https://www.eba.europa.eu/".into(),
            search_patterns: vec![
                r"esep.*report".into(),
                r"supervisory.*review.*evaluation".into(),
            ],
            last_published: Some("2024-07-08".into()),
            last_title: Some("EBA ESEP Report 2024".into()),
            predicted_next: "July 2025".into(),
            last_year_same_period: None,
        },
        InstitutionConfig {
            id: 2,
            institution: "EBA".into(),
            publication: "EU-wide Stress Test".into(),
            frequency: "Bi-Annual".into(),
            url: "https://www.eba.europa.eu/".into(),
            search_patterns: vec![r"stress.*test".into(), r"eu.*wide.*stress".into()],
            last_published: Some("2023-07-28".into()),
            last_title: Some("EU-wide Stress Test Results 2023".into()),
            predicted_next: "second half of 2025".into(),
            last_year_same_period: None,
        },
        InstitutionConfig {
            id: 3,
            institution: "S&P".into(),
            publication: "Portugal Sovereign Rating".into(),
            frequency: "Semi-Annual".into(),
            url: "https://www.spglobal.com/ratings/en/sector/governments/sovereigns".into(),
            search_patterns: vec![r"portugal.*sovereign".into(), r"portugal.*rating".into()],
            last_published: Some("2025-02-28".into()),
            last_title: Some("Portugal Sovereign Rating Review".into()),
            predicted_next: "2025-08-29".into(),
            last_year_same_period: None,
        },
        InstitutionConfig {
            id: 4,
            institution: "Banque de France".into(),
            publication: "Macroeconomic Projections".into(),
            frequency: "Quarterly".into(),
            url: "https://www.banque-france.fr/en/publications-and-statistics/publications".into(),
            search_patterns: vec![
                r"macroeconomic.*projection".into(),
                r"economic.*forecast".into(),
            ],
            last_published: None,
            last_title: None,
            predicted_next: "September 2025".into(),
            last_year_same_period: Some("2024-09-17".into()),
        },
        InstitutionConfig {
            id: 5,
            institution: "Banco de España".into(),
            publication: "Macroeconomic Projections".into(),
            frequency: "Quarterly".into(),
            url: "https://www.bde.es/wbe/en/publicaciones/".into(),
            search_patterns: vec![
                r"macroeconomic.*projection".into(),
                r"economic.*forecast".into(),
            ],
            last_published: None,
            last_title: None,
            predicted_next: "September 2025".into(),
            last_year_same_period: Some("2024-09-17".into()),
        },
        InstitutionConfig {
            id: 6,
            institution: "OECD".into(),
            publication: "Interim Economic Outlook".into(),
            frequency: "Irregular".into(),
            url: "https://www.oecd.org/en/publications/".into(),
            search_patterns: vec![
                r"interim.*economic.*outlook".into(),
                r"economic.*outlook.*interim".into(),
            ],
            last_published: Some("2025-03-17".into()),
            last_title: Some("OECD Interim Economic Outlook, March 2025".into()),
            predicted_next: "September 2025".into(),
            last_year_same_period: None,
        },
    ]
}

/// Published sovereign review calendar for the three rating agencies.
pub fn builtin_rating_schedule() -> RatingSchedule {
    let table: [(&str, [(&str, &str); 4]); 3] = [
        (
            "S&P",
            [
                ("Spain", "2025-09-12"),
                ("France", "2025-11-28"),
                ("Italy", "2025-10-10"),
                ("Portugal", "2025-08-29"),
            ],
        ),
        (
            "Fitch",
            [
                ("France", "2025-09-12"),
                ("Portugal", "2025-09-12"),
                ("Italy", "2025-09-19"),
                ("Spain", "2025-09-26"),
            ],
        ),
        (
            "Moody's",
            [
                ("France", "2025-10-24"),
                ("Portugal", "2025-11-14"),
                ("Italy", "2025-11-21"),
                ("Spain", "November 2025"),
            ],
        ),
    ];

    RatingSchedule(
        table
            .into_iter()
            .map(|(agency, dates)| {
                let countries: BTreeMap<String, String> = dates
                    .into_iter()
                    .map(|(country, date)| (country.to_string(), date.to_string()))
                    .collect();
                (agency.to_string(), countries)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn builtin_keys_are_unique() {
        let institutions = builtin_institutions();
        let keys: HashSet<String> = institutions.iter().map(InstitutionConfig::key).collect();
        assert_eq!(keys.len(), institutions.len());
    }

    #[test]
    fn builtin_patterns_compile() {
        for inst in builtin_institutions() {
            assert!(!inst.search_patterns.is_empty(), "{} has no patterns", inst.key());
            for pattern in &inst.search_patterns {
                assert!(regex::Regex::new(pattern).is_ok(), "bad pattern {pattern}");
            }
        }
    }

    #[test]
    fn rating_schedule_covers_all_agencies_and_countries() {
        let schedule = builtin_rating_schedule();
        assert_eq!(schedule.0.len(), 3);
        for agency in crate::types::RATING_AGENCIES {
            for country in crate::types::RATING_COUNTRIES {
                assert!(
                    schedule.lookup(agency, country).is_some(),
                    "missing {agency}/{country}"
                );
            }
        }
        assert_eq!(schedule.lookup("S&P", "Portugal"), Some("2025-08-29"));
        assert_eq!(schedule.lookup("Moody's", "Spain"), Some("November 2025"));
        assert_eq!(schedule.lookup("DBRS", "Spain"), None);
    }
}
