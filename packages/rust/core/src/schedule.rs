//! Daily run schedule.
//!
//! One crawl cycle per day at a fixed local time in the configured zone. The
//! waiting loop re-checks the clock at a fixed poll interval instead of
//! sleeping for the whole gap, so wall-clock jumps (suspend, NTP) are
//! picked up within one interval.

use std::time::Duration;

use chrono::{DateTime, Days, LocalResult, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{debug, info};

use pubwatch_shared::{Result, ScheduleConfig};

/// Fixed daily trigger time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    pub at: NaiveTime,
    pub tz: Tz,
    pub poll: Duration,
}

impl DailySchedule {
    pub fn from_config(config: &ScheduleConfig) -> Result<Self> {
        Ok(Self {
            at: config.daily_time()?,
            tz: config.tz()?,
            poll: config.poll_interval(),
        })
    }

    /// First trigger instant strictly after `now`.
    ///
    /// On a DST gap the trigger moves to the first valid instant after the
    /// gap; on an overlap the earlier instant is used.
    pub fn next_run_after(&self, now: DateTime<Utc>) -> DateTime<Tz> {
        let local = now.with_timezone(&self.tz);
        let mut day = local.date_naive();
        loop {
            if let Some(candidate) = self.resolve(day.and_time(self.at)) {
                if candidate.with_timezone(&Utc) > now {
                    return candidate;
                }
            }
            day = match day.checked_add_days(Days::new(1)) {
                Some(next) => next,
                None => return local,
            };
        }
    }

    /// Sleep in `poll`-sized steps until `target` has passed.
    pub async fn wait_until(&self, target: DateTime<Tz>) {
        let target = target.with_timezone(&Utc);
        loop {
            let now = Utc::now();
            if now >= target {
                return;
            }
            let remaining = (target - now).to_std().unwrap_or_default();
            debug!(remaining_secs = remaining.as_secs(), "waiting for next run");
            tokio::time::sleep(remaining.min(self.poll)).await;
        }
    }

    fn resolve(&self, naive: chrono::NaiveDateTime) -> Option<DateTime<Tz>> {
        match self.tz.from_local_datetime(&naive) {
            LocalResult::Single(t) => Some(t),
            LocalResult::Ambiguous(earliest, _) => Some(earliest),
            LocalResult::None => {
                // Skipped by a DST jump; step forward a minute at a time.
                let mut probe = naive;
                for _ in 0..180 {
                    probe += chrono::Duration::minutes(1);
                    if let LocalResult::Single(t) = self.tz.from_local_datetime(&probe) {
                        info!(requested = %naive, actual = %t, "trigger time falls in a DST gap");
                        return Some(t);
                    }
                }
                None
            }
        }
    }
}
