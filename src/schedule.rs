// src/schedule.rs
//! Weekly trigger + polling scheduler.
//!
//! The trigger predicate is pure so it can be unit-tested in isolation; the
//! scheduler itself is a plain once-a-minute polling loop over
//! (schedule, job) pairs. Drift within a poll interval is acceptable.

use chrono::{DateTime, Datelike, Duration as ChronoDuration, TimeZone, Utc, Weekday};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

/// A fixed day-of-week + time-of-day trigger (UTC).
#[derive(Debug, Clone, Copy)]
pub struct WeeklySchedule {
    pub weekday: Weekday,
    pub hour: u32,
    pub minute: u32,
}

impl WeeklySchedule {
    pub fn new(weekday: Weekday, hour: u32, minute: u32) -> Self {
        Self {
            weekday,
            hour,
            minute,
        }
    }

    /// Most recent trigger instant at or before `now`.
    pub fn previous_trigger(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let days_back = (now.weekday().num_days_from_monday() + 7
            - self.weekday.num_days_from_monday())
            % 7;
        let date = now.date_naive() - ChronoDuration::days(days_back as i64);
        let at = date
            .and_hms_opt(self.hour, self.minute, 0)
            .expect("valid trigger time");
        let trigger = Utc.from_utc_datetime(&at);
        if trigger > now {
            trigger - ChronoDuration::days(7)
        } else {
            trigger
        }
    }

    /// Due when the last run predates the most recent trigger instant.
    pub fn is_due(&self, last_run: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        last_run < self.previous_trigger(now)
    }
}

pub type JobFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

struct Job {
    schedule: WeeklySchedule,
    last_run: DateTime<Utc>,
    run: Box<dyn Fn() -> JobFuture + Send>,
}

/// Polls registered jobs once per interval and runs the ones that are due.
/// Jobs start with `last_run = registration time`, so nothing fires at
/// startup.
pub struct Scheduler {
    jobs: Vec<Job>,
    poll_interval: Duration,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            jobs: Vec::new(),
            poll_interval: POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn add_job<F>(&mut self, schedule: WeeklySchedule, run: F)
    where
        F: Fn() -> JobFuture + Send + 'static,
    {
        self.jobs.push(Job {
            schedule,
            last_run: Utc::now(),
            run: Box::new(run),
        });
    }

    /// Run the polling loop indefinitely.
    pub async fn run(mut self) {
        loop {
            tokio::time::sleep(self.poll_interval).await;
            self.tick(Utc::now()).await;
        }
    }

    /// One poll pass; separate from the loop so tests can drive it.
    pub async fn tick(&mut self, now: DateTime<Utc>) {
        for job in &mut self.jobs {
            if job.schedule.is_due(job.last_run, now) {
                tracing::info!(weekday = ?job.schedule.weekday, "running scheduled job");
                (job.run)().await;
                job.last_run = now;
            }
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn mondays_at_nine() -> WeeklySchedule {
        WeeklySchedule::new(Weekday::Mon, 9, 0)
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn previous_trigger_lands_on_the_right_monday() {
        let sched = mondays_at_nine();
        // 2024-05-13 is a Monday
        assert_eq!(sched.previous_trigger(at(2024, 5, 15, 12, 0)), at(2024, 5, 13, 9, 0));
        // exactly at trigger time
        assert_eq!(sched.previous_trigger(at(2024, 5, 13, 9, 0)), at(2024, 5, 13, 9, 0));
        // Monday before 09:00 -> previous week's Monday
        assert_eq!(sched.previous_trigger(at(2024, 5, 13, 8, 59)), at(2024, 5, 6, 9, 0));
    }

    #[test]
    fn due_only_after_the_trigger_and_only_once_per_week() {
        let sched = mondays_at_nine();
        let registered = at(2024, 5, 12, 20, 0); // Sunday evening

        // before Monday 09:00 -> not due
        assert!(!sched.is_due(registered, at(2024, 5, 13, 8, 0)));
        // after Monday 09:00 -> due
        assert!(sched.is_due(registered, at(2024, 5, 13, 9, 1)));
        // ran at 09:01 -> not due again the same week
        assert!(!sched.is_due(at(2024, 5, 13, 9, 1), at(2024, 5, 16, 9, 0)));
        // ...but due the next Monday
        assert!(sched.is_due(at(2024, 5, 13, 9, 1), at(2024, 5, 20, 9, 0)));
    }

    #[test]
    fn startup_does_not_fire_immediately() {
        let sched = mondays_at_nine();
        let started = at(2024, 5, 14, 10, 0); // Tuesday, after this week's trigger
        assert!(!sched.is_due(started, at(2024, 5, 14, 10, 1)));
    }

    #[tokio::test]
    async fn tick_runs_due_jobs_and_records_the_run() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counted = runs.clone();

        let mut scheduler = Scheduler::new();
        scheduler.add_job(mondays_at_nine(), move || {
            let counted = counted.clone();
            Box::pin(async move {
                counted.fetch_add(1, Ordering::SeqCst);
            })
        });
        // force the job into the past so the next Monday trigger is due
        scheduler.jobs[0].last_run = at(2024, 5, 12, 0, 0);

        scheduler.tick(at(2024, 5, 13, 9, 30)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // same week: no second run
        scheduler.tick(at(2024, 5, 14, 9, 30)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        // next week: runs again
        scheduler.tick(at(2024, 5, 20, 9, 30)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }
}
