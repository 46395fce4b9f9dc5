// reconciler.rs - Expire pending goals whose deadline has passed.
//
// Reconciliation is a pure pass over the goal store: every pending goal with
// `now > target_date` becomes failed. Running it again changes nothing. The
// local backend applies it to the stored document; the Tracker uses `overdue`
// to decide which stored goals a pass should fail.

use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::store::GoalStore;

/// How often the reconciler runs by default.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Ids of pending goals that are past their deadline at `now`.
pub fn overdue(store: &GoalStore, now: DateTime<Utc>) -> Vec<Uuid> {
    store
        .all()
        .iter()
        .filter(|g| g.is_pending() && g.is_overdue(now))
        .map(|g| g.id)
        .collect()
}

/// Fail every overdue pending goal. Returns the ids that changed.
pub fn reconcile(store: &mut GoalStore, now: DateTime<Utc>) -> Vec<Uuid> {
    store
        .iter_mut()
        .filter_map(|g| g.expire(now).then_some(g.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal::{Goal, GoalStatus};
    use chrono::{Duration as ChronoDuration, Local, TimeZone};

    fn goal_at(h: u32) -> Goal {
        let now = Local.with_ymd_and_hms(2026, 6, 10, h, 0, 0).unwrap();
        Goal::new("Goal", "desc", now).unwrap()
    }

    #[test]
    fn expires_one_millisecond_after_deadline() {
        let mut g = goal_at(9);
        g.set_progress(0).unwrap();
        let deadline = g.target_date;
        let mut store = GoalStore::from_goals(vec![g]);

        assert!(reconcile(&mut store, deadline).is_empty());
        let changed = reconcile(&mut store, deadline + ChronoDuration::milliseconds(1));
        assert_eq!(changed.len(), 1);
        let g = &store.all()[0];
        assert_eq!(g.status, GoalStatus::Failed);
        assert_eq!(g.progress, 0);
    }

    #[test]
    fn reconcile_is_idempotent() {
        let mut store = GoalStore::from_goals(vec![goal_at(9), goal_at(10)]);
        let later = store.all()[0].target_date + ChronoDuration::hours(1);

        let first = reconcile(&mut store, later);
        let after_once: Vec<GoalStatus> = store.all().iter().map(|g| g.status).collect();
        let second = reconcile(&mut store, later);
        let after_twice: Vec<GoalStatus> = store.all().iter().map(|g| g.status).collect();

        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
        assert_eq!(after_once, after_twice);
    }

    #[test]
    fn completed_goal_never_overwritten() {
        let mut done = goal_at(9);
        done.complete(Utc::now()).unwrap();
        let deadline = done.target_date;
        let mut store = GoalStore::from_goals(vec![done]);

        assert!(overdue(&store, deadline + ChronoDuration::days(3)).is_empty());
        assert!(reconcile(&mut store, deadline + ChronoDuration::days(3)).is_empty());
        assert_eq!(store.all()[0].status, GoalStatus::Completed);
    }

    #[test]
    fn overdue_matches_reconcile() {
        let mut store = GoalStore::from_goals(vec![goal_at(9), goal_at(11)]);
        let later = store.all()[0].target_date + ChronoDuration::seconds(5);
        let predicted = overdue(&store, later);
        assert_eq!(reconcile(&mut store, later), predicted);
    }
}
