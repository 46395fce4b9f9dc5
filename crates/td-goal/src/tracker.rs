// tracker.rs - Tracker: the session context every user intent goes through.
//
// A Tracker owns the goal store, the journal store, the persistence backend,
// the clock and the event dispatcher for one signed-in (or local) session.
// It is constructed explicitly and passed to whoever needs it; there is no
// global client.
//
// Every mutation follows the same order:
//   1. validate input (nothing touched on failure)
//   2. compute the new goal/entry on a copy
//   3. write it to the backend (nothing applied in memory on failure)
//   4. apply to the in-memory stores and dispatch an event

use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use uuid::Uuid;

use crate::backend::Backend;
use crate::clock::Clock;
use crate::countdown::TimeLeft;
use crate::error::GoalError;
use crate::events::{EventDispatcher, TrackerEvent};
use crate::export::ExportBundle;
use crate::goal::{validate_progress, Goal, GoalStatus};
use crate::journal::{JournalEntry, JournalPayload, JournalStore};
use crate::reconciler;
use crate::store::GoalStore;
use crate::streak::{self, DayStatus, Summary};

pub struct Tracker {
    goals: GoalStore,
    journal: JournalStore,
    backend: Box<dyn Backend>,
    clock: Arc<dyn Clock>,
    events: EventDispatcher,
}

impl Tracker {
    /// Load state from `backend` and run one reconciliation pass.
    ///
    /// A failed startup reconciliation is logged, not returned: the session
    /// is still usable and the next timer tick will retry.
    pub fn open(
        mut backend: Box<dyn Backend>,
        clock: Arc<dyn Clock>,
        events: EventDispatcher,
    ) -> Result<Self, GoalError> {
        let goals = GoalStore::from_goals(backend.load_goals()?);
        let journal = JournalStore::from_entries(backend.load_journal()?);
        tracing::debug!(goals = goals.len(), entries = journal.len(), "session opened");

        let mut tracker = Self {
            goals,
            journal,
            backend,
            clock,
            events,
        };
        if let Err(e) = tracker.reconcile() {
            tracing::warn!("startup reconciliation failed: {}", e);
        }
        Ok(tracker)
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now().with_timezone(&Utc)
    }

    /// Create a goal due at the end of today.
    pub fn add(&mut self, title: &str, description: &str) -> Result<Goal, GoalError> {
        let goal = Goal::new(title, description, self.clock.now())?;
        self.backend.insert_goal(&goal).inspect_err(|e| {
            tracing::error!("failed to save goal '{}': {}", goal.title, e);
        })?;

        tracing::info!(goal_id = %goal.id, "goal created: {}", goal.title);
        self.events.dispatch(&TrackerEvent::GoalCreated {
            goal_id: goal.id,
            title: goal.title.clone(),
            target_date: goal.target_date,
            timestamp: goal.created_at,
        });
        self.goals.insert(goal.clone());
        Ok(goal)
    }

    /// Set progress on a pending goal.
    ///
    /// Out-of-range progress is an error. An unknown or no-longer-pending
    /// goal is silently left alone and `Ok(false)` is returned.
    pub fn update_progress(&mut self, goal_id: Uuid, progress: i64) -> Result<bool, GoalError> {
        let progress = validate_progress(progress)?;
        let Some(mut updated) = self.goals.get(goal_id).cloned() else {
            return Ok(false);
        };
        if !updated.set_progress(progress.into())? {
            return Ok(false);
        }

        self.write_update(&updated, GoalStatus::Pending)?;
        self.goals.replace(updated);
        self.events.dispatch(&TrackerEvent::ProgressUpdated {
            goal_id,
            progress,
            timestamp: self.now(),
        });
        Ok(true)
    }

    /// Complete a pending goal and record its journal entry.
    ///
    /// Either both the goal change and the entry are persisted and applied,
    /// or neither is.
    pub fn complete(
        &mut self,
        goal_id: Uuid,
        payload: &JournalPayload,
    ) -> Result<JournalEntry, GoalError> {
        let current = self
            .goals
            .get(goal_id)
            .cloned()
            .ok_or(GoalError::NotFound(goal_id))?;
        let now = self.now();
        let entry = JournalEntry::for_goal(&current, payload, now)?;
        let mut updated = current.clone();
        updated.complete(now)?;

        self.write_update(&updated, GoalStatus::Pending)?;
        if let Err(e) = self.backend.insert_journal_entry(&entry) {
            tracing::error!(goal_id = %goal_id, "journal write failed, reverting completion: {}", e);
            if let Err(revert) = self.backend.update_goal(&current, GoalStatus::Completed) {
                tracing::error!(goal_id = %goal_id, "failed to revert completion: {}", revert);
            }
            return Err(e);
        }

        tracing::info!(goal_id = %goal_id, "goal completed: {}", updated.title);
        self.goals.replace(updated);
        self.journal.append(entry.clone());
        self.events.dispatch(&TrackerEvent::GoalCompleted {
            goal_id,
            journal_entry_id: entry.id,
            timestamp: now,
        });
        Ok(entry)
    }

    /// Remove a pending goal. Completed and failed goals are kept for good.
    ///
    /// Returns `Ok(false)` if no goal has this id.
    pub fn remove(&mut self, goal_id: Uuid) -> Result<bool, GoalError> {
        let Some(goal) = self.goals.get(goal_id) else {
            return Ok(false);
        };
        if !goal.is_pending() {
            return Err(GoalError::InvalidTransition {
                goal_id,
                from: goal.status.to_string(),
                to: "removed".to_string(),
            });
        }

        self.backend.delete_goal(goal_id).inspect_err(|e| {
            tracing::error!(goal_id = %goal_id, "failed to delete goal: {}", e);
        })?;
        self.goals.remove(goal_id);
        self.events.dispatch(&TrackerEvent::GoalRemoved {
            goal_id,
            timestamp: self.now(),
        });
        Ok(true)
    }

    /// Remove every pending goal. Returns how many were removed.
    pub fn clear_pending(&mut self) -> Result<usize, GoalError> {
        if self.goals.pending().is_empty() {
            return Ok(0);
        }
        self.backend.delete_pending_goals().inspect_err(|e| {
            tracing::error!("failed to clear pending goals: {}", e);
        })?;
        let count = self.goals.clear_pending();
        tracing::info!("cleared {} pending goal(s)", count);
        self.events.dispatch(&TrackerEvent::PendingCleared {
            count,
            timestamp: self.now(),
        });
        Ok(count)
    }

    /// Fail every pending goal whose deadline has passed.
    ///
    /// Works from stored state, not the in-memory copy: other sessions may
    /// have added or completed goals since this one loaded. Returns the ids
    /// this pass moved from pending to failed.
    pub fn reconcile(&mut self) -> Result<Vec<Uuid>, GoalError> {
        let now = self.now();
        self.refresh()?;
        let overdue = reconciler::overdue(&self.goals, now);
        if overdue.is_empty() {
            return Ok(Vec::new());
        }

        self.backend.mark_expired_failed(now)?;
        self.goals = GoalStore::from_goals(self.backend.load_goals()?);

        let mut failed = Vec::with_capacity(overdue.len());
        for goal_id in overdue {
            // Completed elsewhere between the reload and the bulk update.
            let Some(goal) = self.goals.get(goal_id) else {
                continue;
            };
            if goal.status != GoalStatus::Failed {
                continue;
            }
            tracing::info!(goal_id = %goal_id, "goal expired: {}", goal.title);
            self.events.dispatch(&TrackerEvent::GoalFailed {
                goal_id,
                title: goal.title.clone(),
                timestamp: now,
            });
            failed.push(goal_id);
        }
        Ok(failed)
    }

    /// Re-read goals and journal from the backend.
    pub fn refresh(&mut self) -> Result<(), GoalError> {
        self.goals = GoalStore::from_goals(self.backend.load_goals()?);
        self.journal = JournalStore::from_entries(self.backend.load_journal()?);
        Ok(())
    }

    /// Delete all goals and journal entries.
    pub fn reset(&mut self) -> Result<(), GoalError> {
        self.backend.clear_all()?;
        self.goals = GoalStore::new();
        self.journal = JournalStore::new();
        tracing::info!("all data cleared");
        self.events.dispatch(&TrackerEvent::DataReset {
            timestamp: self.now(),
        });
        Ok(())
    }

    pub fn goals(&self) -> &GoalStore {
        &self.goals
    }

    pub fn journal(&self) -> &JournalStore {
        &self.journal
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn streak(&self) -> u32 {
        streak::streak(self.goals.all(), self.today())
    }

    pub fn summary(&self) -> Summary {
        Summary::of(self.goals.all())
    }

    /// Day statuses for a month; defaults to the current month.
    pub fn calendar(&self, month: Option<(i32, u32)>) -> Vec<(NaiveDate, DayStatus)> {
        let today = self.today();
        let (year, month) = month.unwrap_or((today.year(), today.month()));
        streak::month_calendar(self.goals.all(), year, month, today)
    }

    pub fn time_left(&self) -> TimeLeft {
        TimeLeft::until_end_of_day(self.clock.now())
    }

    /// Snapshot everything for a backup file.
    pub fn export(&self) -> ExportBundle {
        ExportBundle::new(
            self.goals.all().to_vec(),
            self.journal.as_slice().to_vec(),
            self.now(),
        )
    }

    fn write_update(&mut self, goal: &Goal, expected: GoalStatus) -> Result<(), GoalError> {
        match self.backend.update_goal(goal, expected) {
            Ok(()) => Ok(()),
            Err(e @ GoalError::Conflict { .. }) => {
                tracing::warn!("{}; reloading goals", e);
                if let Err(reload) = self.refresh() {
                    tracing::warn!("reload after conflict failed: {}", reload);
                }
                Err(e)
            }
            Err(e) => {
                tracing::error!(goal_id = %goal.id, "failed to update goal: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LocalBackend;
    use crate::clock::ManualClock;
    use crate::journal::MediaType;
    use chrono::{Duration, Local, TimeZone};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::{tempdir, TempDir};

    /// Wraps the local backend and fails selected writes on demand.
    struct FlakyBackend {
        inner: LocalBackend,
        fail_goal_writes: Arc<AtomicBool>,
        fail_journal_writes: Arc<AtomicBool>,
    }

    impl FlakyBackend {
        fn check(flag: &AtomicBool) -> Result<(), GoalError> {
            if flag.load(Ordering::SeqCst) {
                return Err(GoalError::Backend("provider unavailable".to_string()));
            }
            Ok(())
        }
    }

    impl Backend for FlakyBackend {
        fn load_goals(&mut self) -> Result<Vec<Goal>, GoalError> {
            self.inner.load_goals()
        }
        fn load_journal(&mut self) -> Result<Vec<JournalEntry>, GoalError> {
            self.inner.load_journal()
        }
        fn insert_goal(&mut self, goal: &Goal) -> Result<(), GoalError> {
            Self::check(&self.fail_goal_writes)?;
            self.inner.insert_goal(goal)
        }
        fn update_goal(&mut self, goal: &Goal, expected: GoalStatus) -> Result<(), GoalError> {
            Self::check(&self.fail_goal_writes)?;
            self.inner.update_goal(goal, expected)
        }
        fn delete_goal(&mut self, goal_id: Uuid) -> Result<(), GoalError> {
            Self::check(&self.fail_goal_writes)?;
            self.inner.delete_goal(goal_id)
        }
        fn delete_pending_goals(&mut self) -> Result<(), GoalError> {
            Self::check(&self.fail_goal_writes)?;
            self.inner.delete_pending_goals()
        }
        fn mark_expired_failed(&mut self, now: DateTime<Utc>) -> Result<(), GoalError> {
            Self::check(&self.fail_goal_writes)?;
            self.inner.mark_expired_failed(now)
        }
        fn insert_journal_entry(&mut self, entry: &JournalEntry) -> Result<(), GoalError> {
            Self::check(&self.fail_journal_writes)?;
            self.inner.insert_journal_entry(entry)
        }
        fn clear_all(&mut self) -> Result<(), GoalError> {
            self.inner.clear_all()
        }
    }

    struct Harness {
        dir: TempDir,
        clock: Arc<ManualClock>,
        fail_goal_writes: Arc<AtomicBool>,
        fail_journal_writes: Arc<AtomicBool>,
    }

    impl Harness {
        fn new() -> Self {
            let start = Local.with_ymd_and_hms(2026, 6, 10, 9, 0, 0).unwrap();
            Self {
                dir: tempdir().unwrap(),
                clock: Arc::new(ManualClock::new(start)),
                fail_goal_writes: Arc::new(AtomicBool::new(false)),
                fail_journal_writes: Arc::new(AtomicBool::new(false)),
            }
        }

        fn open(&self) -> Tracker {
            self.open_with(EventDispatcher::new())
        }

        fn open_with(&self, events: EventDispatcher) -> Tracker {
            let backend = FlakyBackend {
                inner: LocalBackend::new(self.dir.path()).unwrap(),
                fail_goal_writes: self.fail_goal_writes.clone(),
                fail_journal_writes: self.fail_journal_writes.clone(),
            };
            Tracker::open(Box::new(backend), self.clock.clone(), events).unwrap()
        }
    }

    fn photo(text: &str) -> JournalPayload {
        JournalPayload::new(text, "file:///tmp/proof.jpg", MediaType::Photo)
    }

    #[test]
    fn progress_then_complete_creates_one_linked_entry() {
        let h = Harness::new();
        let mut tracker = h.open();
        let g = tracker.add("Morning Workout", "30 minutes").unwrap();

        assert!(tracker.update_progress(g.id, 100).unwrap());
        let entry = tracker.complete(g.id, &photo("done")).unwrap();

        let stored = tracker.goals().get(g.id).unwrap();
        assert_eq!(stored.status, GoalStatus::Completed);
        assert_eq!(stored.progress, 100);
        assert!(stored.completed_at.is_some());
        assert_eq!(tracker.journal().len(), 1);
        assert_eq!(entry.goal_id, g.id);
        assert_eq!(tracker.journal().for_goal(g.id).len(), 1);
    }

    #[test]
    fn invalid_completion_changes_nothing() {
        let h = Harness::new();
        let mut tracker = h.open();
        let g = tracker.add("Read", "20 pages").unwrap();

        assert!(tracker.complete(g.id, &photo("   ")).is_err());
        let mut no_media = photo("done");
        no_media.media_url = None;
        assert!(matches!(
            tracker.complete(g.id, &no_media),
            Err(GoalError::MissingMedia)
        ));

        assert_eq!(tracker.goals().get(g.id).unwrap().status, GoalStatus::Pending);
        assert!(tracker.journal().is_empty());
        // And nothing reached disk either.
        assert!(h.open().journal().is_empty());
    }

    #[test]
    fn failed_goal_cannot_be_removed_pending_can() {
        let h = Harness::new();
        let mut tracker = h.open();
        let keep = tracker.add("Missed", "x").unwrap();
        let drop_me = tracker.add("Dropped", "y").unwrap();

        assert!(tracker.remove(drop_me.id).unwrap());
        assert!(tracker.goals().get(drop_me.id).is_none());
        assert_eq!(tracker.goals().len(), 1);

        h.clock.advance(Duration::days(1));
        assert_eq!(tracker.reconcile().unwrap(), vec![keep.id]);
        assert!(matches!(
            tracker.remove(keep.id),
            Err(GoalError::InvalidTransition { .. })
        ));
        assert!(!tracker.remove(Uuid::new_v4()).unwrap());
    }

    #[test]
    fn expires_one_millisecond_after_end_of_day() {
        let h = Harness::new();
        let mut tracker = h.open();
        let g = tracker.add("Workout", "cardio").unwrap();

        h.clock.set(g.target_date.with_timezone(&Local));
        assert!(tracker.reconcile().unwrap().is_empty());

        h.clock.advance(Duration::milliseconds(1));
        assert_eq!(tracker.reconcile().unwrap(), vec![g.id]);
        let failed = tracker.goals().get(g.id).unwrap();
        assert_eq!(failed.status, GoalStatus::Failed);
        assert_eq!(failed.progress, 0);

        // Second pass is a no-op.
        assert!(tracker.reconcile().unwrap().is_empty());
    }

    #[test]
    fn opening_a_session_reconciles_immediately() {
        let h = Harness::new();
        let id = h.open().add("Yesterday's goal", "x").unwrap().id;

        h.clock.advance(Duration::days(1));
        let tracker = h.open();
        assert_eq!(tracker.goals().get(id).unwrap().status, GoalStatus::Failed);
    }

    #[test]
    fn completion_wins_over_later_reconciliation() {
        let h = Harness::new();
        let mut tracker = h.open();
        let g = tracker.add("Race", "x").unwrap();
        tracker.complete(g.id, &photo("made it")).unwrap();

        h.clock.advance(Duration::days(1));
        assert!(tracker.reconcile().unwrap().is_empty());
        assert_eq!(
            tracker.goals().get(g.id).unwrap().status,
            GoalStatus::Completed
        );
    }

    #[test]
    fn backend_failure_leaves_store_untouched() {
        let h = Harness::new();
        let mut tracker = h.open();
        let g = tracker.add("Goal", "x").unwrap();

        h.fail_goal_writes.store(true, Ordering::SeqCst);
        assert!(tracker.add("Another", "y").is_err());
        assert!(tracker.update_progress(g.id, 40).is_err());
        assert!(tracker.remove(g.id).is_err());
        assert!(tracker.clear_pending().is_err());

        assert_eq!(tracker.goals().len(), 1);
        assert_eq!(tracker.goals().get(g.id).unwrap().progress, 0);
    }

    #[test]
    fn journal_failure_reverts_completion() {
        let h = Harness::new();
        let mut tracker = h.open();
        let g = tracker.add("Goal", "x").unwrap();

        h.fail_journal_writes.store(true, Ordering::SeqCst);
        assert!(tracker.complete(g.id, &photo("done")).is_err());
        assert_eq!(tracker.goals().get(g.id).unwrap().status, GoalStatus::Pending);

        let reopened = h.open();
        assert_eq!(
            reopened.goals().get(g.id).unwrap().status,
            GoalStatus::Pending
        );
        assert!(reopened.journal().is_empty());
    }

    #[test]
    fn progress_on_unknown_or_terminal_goal_is_noop() {
        let h = Harness::new();
        let mut tracker = h.open();
        assert!(!tracker.update_progress(Uuid::new_v4(), 10).unwrap());

        let g = tracker.add("Goal", "x").unwrap();
        tracker.complete(g.id, &photo("done")).unwrap();
        assert!(!tracker.update_progress(g.id, 10).unwrap());
        assert!(matches!(
            tracker.update_progress(g.id, 150),
            Err(GoalError::ProgressOutOfRange(150))
        ));
    }

    #[test]
    fn clear_pending_only_touches_pending() {
        let h = Harness::new();
        let mut tracker = h.open();
        let done = tracker.add("Done", "x").unwrap();
        tracker.complete(done.id, &photo("ok")).unwrap();
        tracker.add("Open", "y").unwrap();
        tracker.add("Open too", "z").unwrap();

        assert_eq!(tracker.clear_pending().unwrap(), 2);
        assert_eq!(tracker.goals().len(), 1);
        assert_eq!(h.open().goals().len(), 1);
        assert_eq!(tracker.clear_pending().unwrap(), 0);
    }

    #[test]
    fn half_finished_day_breaks_streak() {
        let h = Harness::new();
        let mut tracker = h.open();
        let a = tracker.add("A", "x").unwrap();
        tracker.add("B", "y").unwrap();
        tracker.complete(a.id, &photo("done")).unwrap();

        h.clock.advance(Duration::days(1));
        tracker.reconcile().unwrap();
        assert_eq!(tracker.streak(), 0);
        assert_eq!(tracker.summary().failed, 1);
    }

    #[test]
    fn export_contains_everything() {
        let h = Harness::new();
        let mut tracker = h.open();
        let a = tracker.add("A", "x").unwrap();
        tracker.add("B", "y").unwrap();
        tracker.complete(a.id, &photo("done")).unwrap();

        let bundle = tracker.export();
        let value: serde_json::Value =
            serde_json::from_str(&bundle.to_json().unwrap()).unwrap();
        assert_eq!(value["goals"].as_array().unwrap().len(), 2);
        assert_eq!(value["journal"].as_array().unwrap().len(), 1);
        assert!(DateTime::parse_from_rfc3339(value["exportDate"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn reset_clears_memory_and_disk() {
        let h = Harness::new();
        let mut tracker = h.open();
        tracker.add("A", "x").unwrap();
        tracker.reset().unwrap();
        assert!(tracker.goals().is_empty());
        assert!(h.open().goals().is_empty());
    }

    fn watching(h: &Harness) -> (Tracker, std::sync::mpsc::Receiver<TrackerEvent>) {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut events = EventDispatcher::new();
        events.add_sink(Box::new(crate::events::ChannelSink::new(tx)));
        (h.open_with(events), rx)
    }

    fn failed_events(rx: &std::sync::mpsc::Receiver<TrackerEvent>) -> Vec<Uuid> {
        rx.try_iter()
            .filter_map(|e| match e {
                TrackerEvent::GoalFailed { goal_id, .. } => Some(goal_id),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn reconcile_expires_goals_added_by_another_session() {
        let h = Harness::new();
        let (mut watcher, rx) = watching(&h);
        let g = h.open().add("Added elsewhere", "x").unwrap();

        h.clock.advance(Duration::days(1));
        assert_eq!(watcher.reconcile().unwrap(), vec![g.id]);
        assert_eq!(failed_events(&rx), vec![g.id]);
        assert_eq!(
            h.open().goals().get(g.id).unwrap().status,
            GoalStatus::Failed
        );
    }

    #[test]
    fn reconcile_respects_completion_from_another_session() {
        let h = Harness::new();
        let g = h.open().add("Finish report", "x").unwrap();
        let (mut watcher, rx) = watching(&h);
        assert!(watcher.goals().get(g.id).unwrap().is_pending());

        h.open().complete(g.id, &photo("sent")).unwrap();
        h.clock.advance(Duration::days(1));

        assert!(watcher.reconcile().unwrap().is_empty());
        assert!(failed_events(&rx).is_empty());
        assert_eq!(
            watcher.goals().get(g.id).unwrap().status,
            GoalStatus::Completed
        );
        assert_eq!(watcher.journal().len(), 1);
        assert_eq!(
            h.open().goals().get(g.id).unwrap().status,
            GoalStatus::Completed
        );
    }
}
