// clock.rs - Time source and local-day helpers.
//
// Every "now" in the tracker comes from a `Clock` so the reconciler, streak
// walk and deadline computation can be driven deterministically in tests.
// Calendar days are always the user's local days.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    /// The local calendar date of `now()`.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Local>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// 23:59:59.999 local time on `date`, as a UTC instant.
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let last_ms = date.and_hms_milli_opt(23, 59, 59, 999);
    let resolved = last_ms.and_then(|naive| Local.from_local_datetime(&naive).latest());
    match resolved {
        Some(local) => local.with_timezone(&Utc),
        // Nonexistent local time: fall back to one millisecond before the next local midnight.
        None => start_of_day(date + Duration::days(1)) - Duration::milliseconds(1),
    }
}

/// First instant of `date` in local time, as a UTC instant.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    match Local.from_local_datetime(&midnight).earliest() {
        Some(local) => local.with_timezone(&Utc),
        // Midnight skipped by a DST jump; the day starts an hour later.
        None => Local
            .from_local_datetime(&(midnight + Duration::hours(1)))
            .earliest()
            .map(|l| l.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&midnight)),
    }
}

/// The local calendar date an instant falls on.
pub fn local_date(at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&Local).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn end_of_day_is_last_millisecond_of_local_day() {
        let date = NaiveDate::from_ymd_opt(2026, 6, 10).unwrap();
        let eod = end_of_day(date).with_timezone(&Local);
        assert_eq!(eod.date_naive(), date);
        assert_eq!((eod.hour(), eod.minute(), eod.second()), (23, 59, 59));
        assert_eq!(eod.timestamp_subsec_millis(), 999);
    }

    #[test]
    fn local_date_matches_construction_date() {
        let at = Local.with_ymd_and_hms(2026, 6, 10, 0, 30, 0).unwrap();
        assert_eq!(
            local_date(at.with_timezone(&Utc)),
            NaiveDate::from_ymd_opt(2026, 6, 10).unwrap()
        );
    }

    #[test]
    fn manual_clock_advances() {
        let start = Local.with_ymd_and_hms(2026, 6, 10, 9, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        clock.advance(Duration::hours(2));
        assert_eq!(clock.now(), start + Duration::hours(2));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 6, 10).unwrap());
    }
}
