// streak.rs - Streak, calendar and summary figures derived from goals.
//
// Nothing here is stored. Everything is recomputed from the goal list and
// the local calendar date of each goal's creation.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::clock::local_date;
use crate::goal::{Goal, GoalStatus};

/// How a calendar day looks when all of its goals are taken together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DayStatus {
    /// Every goal created that day was completed.
    Success,
    /// At least one goal created that day failed.
    Failed,
    /// Some goals still open or mixed, but none failed.
    Partial,
    NoGoals,
    Future,
}

impl fmt::Display for DayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayStatus::Success => write!(f, "success"),
            DayStatus::Failed => write!(f, "failed"),
            DayStatus::Partial => write!(f, "partial"),
            DayStatus::NoGoals => write!(f, "no-goals"),
            DayStatus::Future => write!(f, "future"),
        }
    }
}

fn goals_created_on(goals: &[Goal], day: NaiveDate) -> impl Iterator<Item = &Goal> {
    goals
        .iter()
        .filter(move |g| local_date(g.created_at) == day)
}

/// Classify one day relative to `today`.
pub fn day_status(goals: &[Goal], day: NaiveDate, today: NaiveDate) -> DayStatus {
    if day > today {
        return DayStatus::Future;
    }
    let (mut total, mut completed, mut failed) = (0usize, 0usize, 0usize);
    for goal in goals_created_on(goals, day) {
        total += 1;
        match goal.status {
            GoalStatus::Completed => completed += 1,
            GoalStatus::Failed => failed += 1,
            GoalStatus::Pending => {}
        }
    }
    if total == 0 {
        DayStatus::NoGoals
    } else if completed == total {
        DayStatus::Success
    } else if failed > 0 {
        DayStatus::Failed
    } else {
        DayStatus::Partial
    }
}

/// Consecutive fully-completed days ending yesterday.
///
/// Today never counts; the walk stops at the first earlier day that has no
/// goals or has any goal not completed.
pub fn streak(goals: &[Goal], today: NaiveDate) -> u32 {
    let mut count = 0;
    let mut day = today - Duration::days(1);
    loop {
        let mut any = false;
        let all_done = goals_created_on(goals, day).all(|g| {
            any = true;
            g.status == GoalStatus::Completed
        });
        if !any || !all_done {
            return count;
        }
        count += 1;
        day -= Duration::days(1);
    }
}

/// Status for every day of a month, in order.
pub fn month_calendar(
    goals: &[Goal],
    year: i32,
    month: u32,
    today: NaiveDate,
) -> Vec<(NaiveDate, DayStatus)> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    first
        .iter_days()
        .take_while(|d| d.month() == month)
        .map(|d| (d, day_status(goals, d, today)))
        .collect()
}

/// Headline counts for the home view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub failed: usize,
    /// completed / total, as a percentage. Zero when there are no goals.
    pub completion_rate: f64,
}

impl Summary {
    pub fn of(goals: &[Goal]) -> Self {
        let count = |s: GoalStatus| goals.iter().filter(|g| g.status == s).count();
        let total = goals.len();
        let completed = count(GoalStatus::Completed);
        let completion_rate = if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64 * 100.0
        };
        Self {
            total,
            pending: count(GoalStatus::Pending),
            completed,
            failed: count(GoalStatus::Failed),
            completion_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone, Utc};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, d).unwrap()
    }

    fn goal_on(d: u32, status: GoalStatus) -> Goal {
        let at = Local.with_ymd_and_hms(2026, 6, d, 9, 0, 0).unwrap();
        let mut g = Goal::new("Goal", "desc", at).unwrap();
        match status {
            GoalStatus::Completed => g.complete(Utc::now()).unwrap(),
            GoalStatus::Failed => {
                g.expire(g.target_date + Duration::seconds(1));
            }
            GoalStatus::Pending => {}
        }
        g
    }

    #[test]
    fn streak_counts_consecutive_complete_days_ending_yesterday() {
        let goals = vec![
            goal_on(7, GoalStatus::Completed),
            goal_on(8, GoalStatus::Completed),
            goal_on(8, GoalStatus::Completed),
            goal_on(9, GoalStatus::Completed),
            // Today's open goal does not break the streak.
            goal_on(10, GoalStatus::Pending),
        ];
        assert_eq!(streak(&goals, day(10)), 3);
    }

    #[test]
    fn streak_stops_at_gap() {
        let goals = vec![
            goal_on(6, GoalStatus::Completed),
            goal_on(8, GoalStatus::Completed),
            goal_on(9, GoalStatus::Completed),
        ];
        assert_eq!(streak(&goals, day(10)), 2);
    }

    #[test]
    fn one_missed_goal_breaks_the_day() {
        // Two goals on the 9th: one completed, one expired.
        let goals = vec![
            goal_on(9, GoalStatus::Completed),
            goal_on(9, GoalStatus::Failed),
        ];
        assert_eq!(streak(&goals, day(10)), 0);
        assert_eq!(day_status(&goals, day(9), day(10)), DayStatus::Failed);
    }

    #[test]
    fn day_status_classification() {
        let goals = vec![
            goal_on(5, GoalStatus::Completed),
            goal_on(6, GoalStatus::Completed),
            goal_on(6, GoalStatus::Pending),
            goal_on(7, GoalStatus::Failed),
        ];
        let today = day(10);
        assert_eq!(day_status(&goals, day(5), today), DayStatus::Success);
        assert_eq!(day_status(&goals, day(6), today), DayStatus::Partial);
        assert_eq!(day_status(&goals, day(7), today), DayStatus::Failed);
        assert_eq!(day_status(&goals, day(8), today), DayStatus::NoGoals);
        assert_eq!(day_status(&goals, day(11), today), DayStatus::Future);
    }

    #[test]
    fn month_calendar_covers_every_day() {
        let cal = month_calendar(&[], 2026, 2, day(10));
        assert_eq!(cal.len(), 28);
        assert!(cal.iter().all(|(_, s)| *s == DayStatus::NoGoals));
        assert!(month_calendar(&[], 2026, 13, day(10)).is_empty());
    }

    #[test]
    fn summary_rates() {
        assert_eq!(Summary::of(&[]).completion_rate, 0.0);
        let goals = vec![
            goal_on(9, GoalStatus::Completed),
            goal_on(9, GoalStatus::Failed),
            goal_on(10, GoalStatus::Pending),
            goal_on(10, GoalStatus::Completed),
        ];
        let s = Summary::of(&goals);
        assert_eq!((s.total, s.pending, s.completed, s.failed), (4, 1, 2, 1));
        assert_eq!(s.completion_rate, 50.0);
    }
}
