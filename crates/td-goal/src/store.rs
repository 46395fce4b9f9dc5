// store.rs - GoalStore: the in-memory goal collection for a session.
//
// The store holds the goals loaded from the backend and answers the queries
// the CLI needs (pending list, failures, goals created on a day). It does not
// write anywhere itself; the Tracker persists a change first and then applies
// it here, so a failed write never leaves the store half-updated.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::clock::local_date;
use crate::goal::{Goal, GoalStatus};

/// Goals for the active user, in insertion order.
#[derive(Debug, Default, Clone)]
pub struct GoalStore {
    goals: Vec<Goal>,
}

impl GoalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_goals(goals: Vec<Goal>) -> Self {
        Self { goals }
    }

    pub fn get(&self, goal_id: Uuid) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == goal_id)
    }

    pub fn insert(&mut self, goal: Goal) {
        self.goals.push(goal);
    }

    /// Replace the stored goal with the same id. Returns false if absent.
    pub fn replace(&mut self, goal: Goal) -> bool {
        match self.goals.iter_mut().find(|g| g.id == goal.id) {
            Some(slot) => {
                *slot = goal;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, goal_id: Uuid) -> Option<Goal> {
        let idx = self.goals.iter().position(|g| g.id == goal_id)?;
        Some(self.goals.remove(idx))
    }

    /// Drop every pending goal; returns how many were removed.
    pub fn clear_pending(&mut self) -> usize {
        let before = self.goals.len();
        self.goals.retain(|g| !g.is_pending());
        before - self.goals.len()
    }

    pub fn all(&self) -> &[Goal] {
        &self.goals
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Goal> {
        self.goals.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    /// Goals with the given status, newest first.
    pub fn with_status(&self, status: GoalStatus) -> Vec<&Goal> {
        let mut goals: Vec<&Goal> = self.goals.iter().filter(|g| g.status == status).collect();
        goals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        goals
    }

    pub fn pending(&self) -> Vec<&Goal> {
        self.with_status(GoalStatus::Pending)
    }

    pub fn completed(&self) -> Vec<&Goal> {
        self.with_status(GoalStatus::Completed)
    }

    /// The permanent record of missed goals.
    pub fn failed(&self) -> Vec<&Goal> {
        self.with_status(GoalStatus::Failed)
    }

    /// Goals whose creation falls on a local calendar day.
    pub fn created_on(&self, day: NaiveDate) -> Vec<&Goal> {
        self.goals
            .iter()
            .filter(|g| local_date(g.created_at) == day)
            .collect()
    }
}
