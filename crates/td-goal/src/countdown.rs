// countdown.rs - Time remaining until today's goals expire.

use std::fmt;

use chrono::{DateTime, Local, Utc};

use crate::clock::end_of_day;

/// Remaining time until the end of the local day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeLeft {
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub expired: bool,
}

impl TimeLeft {
    pub fn until_end_of_day(now: DateTime<Local>) -> Self {
        Self::until(end_of_day(now.date_naive()), now.with_timezone(&Utc))
    }

    pub fn until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let ms = (deadline - now).num_milliseconds();
        if ms <= 0 {
            return Self {
                hours: 0,
                minutes: 0,
                seconds: 0,
                expired: true,
            };
        }
        let secs = ms / 1000;
        Self {
            hours: secs / 3600,
            minutes: (secs % 3600) / 60,
            seconds: secs % 60,
            expired: false,
        }
    }
}

impl fmt::Display for TimeLeft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.expired {
            return write!(f, "Day Ended");
        }
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds
        )
    }
}
