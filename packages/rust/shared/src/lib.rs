//! Shared types, error model, and configuration for pubwatch.
//!
//! This crate is the foundation depended on by all other pubwatch crates.
//! It provides:
//! - [`PubwatchError`]: the unified error type
//! - Domain types ([`InstitutionConfig`], [`PublicationRecord`], [`ExtractedCandidate`],
//!   [`RatingSchedule`])
//! - Configuration ([`AppConfig`], [`FetchConfig`], config loading)
//! - The built-in institution list and rating calendar

pub mod config;
pub mod error;
pub mod institutions;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CrawlSettings, DEFAULT_USER_AGENT, FetchConfig, PathsConfig, ScheduleConfig,
    config_dir, config_file_path, init_config, init_config_at, load_config, load_config_from,
};
pub use error::{PubwatchError, Result};
pub use institutions::{builtin_institutions, builtin_rating_schedule};
pub use types::{
    DisplayRow, ExtractedCandidate, InstitutionConfig, MAX_TITLE_CHARS, PublicationRecord,
    RATING_AGENCIES, RATING_COUNTRIES, RatingSchedule, record_key, truncate_title,
};
