//! Page fetching and publication extraction.
//!
//! This crate provides:
//! - [`Fetcher`]: HTTP GET with a fixed user agent and timeout
//! - [`extract_publication`]: pattern-driven title/date/link extraction
//! - [`find_date`]: date-string detection in free text

pub mod dates;
pub mod extract;
pub mod fetch;

pub use dates::find_date;
pub use extract::{compile_patterns, extract_publication};
pub use fetch::Fetcher;
