//! Crawl cycle: institutions → fetch → extract → predict → store → dashboard.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use pubwatch_crawler::{Fetcher, extract_publication};
use pubwatch_shared::{
    AppConfig, ExtractedCandidate, FetchConfig, InstitutionConfig, PublicationRecord,
    PubwatchError, RatingSchedule, Result, truncate_title,
};
use pubwatch_storage::HistoricalStore;

use crate::dashboard;
use crate::predict::predict_next;
use crate::schedule::DailySchedule;

/// What happened to one institution during a cycle.
#[derive(Debug)]
pub enum CrawlOutcome {
    /// A publication was found and its record rebuilt.
    Updated(PublicationRecord),
    /// The page was fetched but nothing matched.
    NotFound,
    /// Fetching or extraction failed.
    Failed(PubwatchError),
}

/// Summary of one crawl cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub total: usize,
    pub succeeded: usize,
    pub not_found: usize,
    pub failed: usize,
    /// Rendered dashboard, if rendering succeeded.
    pub dashboard: Option<PathBuf>,
    pub elapsed: Duration,
}

/// Progress callback for reporting cycle status.
pub trait ProgressReporter: Send + Sync {
    /// Called once before the first institution.
    fn cycle_started(&self, total: usize);
    /// Called before an institution's page is fetched.
    fn institution_started(&self, key: &str, current: usize, total: usize);
    /// Called after an institution has been processed.
    fn institution_finished(&self, key: &str, outcome: &CrawlOutcome);
    /// Called when the cycle completes.
    fn done(&self, report: &CycleReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn cycle_started(&self, _total: usize) {}
    fn institution_started(&self, _key: &str, _current: usize, _total: usize) {}
    fn institution_finished(&self, _key: &str, _outcome: &CrawlOutcome) {}
    fn done(&self, _report: &CycleReport) {}
}

/// Owns the configuration, HTTP client and historical store for the
/// lifetime of the process.
pub struct Monitor {
    config: AppConfig,
    fetcher: Fetcher,
    store: HistoricalStore,
    tz: Tz,
}

impl Monitor {
    /// Validate `config`, build the fetcher and load the historical store.
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;
        let tz = config.schedule.tz()?;
        let fetcher = Fetcher::new(&FetchConfig::from(&config.crawl))?;
        let store = HistoricalStore::load(&config.paths.data_file);

        Ok(Self {
            config,
            fetcher,
            store,
            tz,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &HistoricalStore {
        &self.store
    }

    /// Current time in the reference timezone.
    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz)
    }

    /// Fetch and extract one institution. Never fails the cycle.
    #[instrument(skip_all, fields(key = %inst.key(), url = %inst.url))]
    pub async fn crawl_institution(&self, inst: &InstitutionConfig) -> CrawlOutcome {
        let html = match self.fetcher.fetch(&inst.url).await {
            Ok(html) => html,
            Err(e) => {
                error!(error = %e, "fetch failed, skipping");
                return CrawlOutcome::Failed(e);
            }
        };

        match extract_publication(&html, inst, self.now().fixed_offset()) {
            Ok(Some(candidate)) => {
                let record = build_record(inst, &candidate, &self.config.rating_schedule);
                info!(
                    title = %record.last_title,
                    predicted_next = %record.predicted_next,
                    "publication found"
                );
                CrawlOutcome::Updated(record)
            }
            Ok(None) => {
                warn!("no matching publication found");
                CrawlOutcome::NotFound
            }
            Err(e) => {
                error!(error = %e, "extraction failed, skipping");
                CrawlOutcome::Failed(e)
            }
        }
    }

    /// Run one full cycle over every configured institution, in order.
    ///
    /// Per-institution failures are counted, not returned. Save and render
    /// errors are logged and leave the previous files in place.
    #[instrument(skip_all)]
    pub async fn run_cycle(&mut self, progress: &dyn ProgressReporter) -> CycleReport {
        let start = Instant::now();
        let cycle_id = Uuid::now_v7();
        let total = self.config.institutions.len();
        let delay = Duration::from_millis(self.config.crawl.delay_ms);

        info!(%cycle_id, total, "starting crawl cycle");
        progress.cycle_started(total);

        let mut report = CycleReport {
            cycle_id,
            total,
            succeeded: 0,
            not_found: 0,
            failed: 0,
            dashboard: None,
            elapsed: Duration::ZERO,
        };

        for (i, inst) in self.config.institutions.iter().enumerate() {
            let key = inst.key();
            progress.institution_started(&key, i + 1, total);

            let outcome = self.crawl_institution(inst).await;
            match &outcome {
                CrawlOutcome::Updated(record) => {
                    self.store.update(key.clone(), record.clone());
                    report.succeeded += 1;
                }
                CrawlOutcome::NotFound => report.not_found += 1,
                CrawlOutcome::Failed(_) => report.failed += 1,
            }
            progress.institution_finished(&key, &outcome);

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        if let Err(e) = self.store.save() {
            error!(error = %e, "failed to save historical data");
        }

        match self.render_dashboard() {
            Ok(path) => report.dashboard = Some(path),
            Err(PubwatchError::TemplateMissing(path)) => {
                error!(template = %path.display(), "dashboard template not found, skipping render");
            }
            Err(e) => error!(error = %e, "dashboard generation failed"),
        }

        report.elapsed = start.elapsed();
        info!(
            %cycle_id,
            succeeded = report.succeeded,
            not_found = report.not_found,
            failed = report.failed,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "crawl cycle finished"
        );
        progress.done(&report);
        report
    }

    /// Render the dashboard from the current store without crawling.
    pub fn render_dashboard(&self) -> Result<PathBuf> {
        dashboard::render_dashboard(
            &self.config.paths.template,
            &self.config.paths.output,
            &self.config.institutions,
            &self.store,
            &self.now(),
        )
    }

    /// Run one cycle now, then once a day at the scheduled time. Only
    /// returns on a schedule configuration error.
    pub async fn watch(&mut self, progress: &dyn ProgressReporter) -> Result<()> {
        let schedule = DailySchedule::from_config(&self.config.schedule)?;
        info!(at = %schedule.at, tz = %schedule.tz, "scheduler started");

        self.run_cycle(progress).await;
        loop {
            let next = schedule.next_run_after(Utc::now());
            info!(next_run = %next, "waiting for next scheduled run");
            schedule.wait_until(next).await;
            self.run_cycle(progress).await;
        }
    }
}

/// Build the stored record for a found publication.
///
/// Missing prediction or date fall back to the configured defaults; the
/// crawl time is the candidate's extraction time.
pub fn build_record(
    inst: &InstitutionConfig,
    candidate: &ExtractedCandidate,
    schedule: &RatingSchedule,
) -> PublicationRecord {
    let date_text = candidate.date_text.as_deref();
    PublicationRecord {
        institution: inst.institution.clone(),
        publication: inst.publication.clone(),
        frequency: inst.frequency.clone(),
        predicted_next: predict_next(date_text, inst, schedule)
            .unwrap_or_else(|| inst.predicted_next.clone()),
        last_published: date_text
            .map(str::to_string)
            .or_else(|| inst.last_published.clone())
            .unwrap_or_default(),
        last_title: truncate_title(&candidate.title),
        last_year_same_period: inst.last_year_same_period.clone(),
        last_crawled: candidate.extracted_at,
        source_url: inst.url.clone(),
    }
}
