//! Core monitoring logic for pubwatch.
//!
//! This crate ties together fetching, extraction, prediction, persistence
//! and dashboard rendering into the daily crawl cycle driven by [`Monitor`].

pub mod dashboard;
pub mod pipeline;
pub mod predict;
pub mod schedule;

pub use dashboard::{DashboardStats, effective_rows, render_dashboard, sort_for_display};
pub use pipeline::{
    CrawlOutcome, CycleReport, Monitor, ProgressReporter, SilentProgress, build_record,
};
pub use predict::predict_next;
pub use schedule::DailySchedule;
