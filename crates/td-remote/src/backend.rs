// backend.rs - RestBackend: goal and journal tables behind the Backend seam.
//
// Filters use the PostgREST query syntax (`column=eq.value`). All queries
// are scoped to the signed-in user. Goal updates add `status=eq.<expected>`
// to the filter and ask for the updated rows back; an empty result means the
// row moved on in the meantime and is reported as a conflict.

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::blocking::RequestBuilder;
use reqwest::Method;
use serde_json::{json, Value};
use uuid::Uuid;

use td_goal::{Backend, Goal, GoalError, GoalStatus, JournalEntry};

use crate::client::RestClient;
use crate::error::RemoteError;
use crate::rows::{decode_rows, GoalRow, JournalRow, GOALS_TABLE, JOURNAL_TABLE};
use crate::session::Session;

pub struct RestBackend {
    client: RestClient,
    session: Session,
}

impl RestBackend {
    pub fn new(client: RestClient, session: Session) -> Self {
        Self { client, session }
    }

    pub fn user_id(&self) -> Uuid {
        self.session.user.id
    }

    fn table(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, &format!("/rest/v1/{}", table), Some(&self.session.access_token))
            .query(&[("user_id", format!("eq.{}", self.user_id()))])
    }

    fn list(&self, table: &str) -> Result<Vec<Value>, RemoteError> {
        let request = self
            .table(Method::GET, table)
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        self.client.send_json(request)
    }

    fn insert<T: serde::Serialize>(&self, table: &str, row: &T) -> Result<(), RemoteError> {
        let request = self
            .client
            .request(Method::POST, &format!("/rest/v1/{}", table), Some(&self.session.access_token))
            .header("Prefer", "return=minimal")
            .json(row);
        self.client.send(request)
    }
}

fn iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Backend for RestBackend {
    fn load_goals(&mut self) -> Result<Vec<Goal>, GoalError> {
        let rows = self.list(GOALS_TABLE)?;
        let (goals, skipped) = decode_rows::<GoalRow, Goal>(GOALS_TABLE, rows);
        if skipped > 0 {
            tracing::warn!("ignored {} malformed goal row(s)", skipped);
        }
        Ok(goals)
    }

    fn load_journal(&mut self) -> Result<Vec<JournalEntry>, GoalError> {
        let rows = self.list(JOURNAL_TABLE)?;
        let (entries, skipped) = decode_rows::<JournalRow, JournalEntry>(JOURNAL_TABLE, rows);
        if skipped > 0 {
            tracing::warn!("ignored {} malformed journal row(s)", skipped);
        }
        Ok(entries)
    }

    fn insert_goal(&mut self, goal: &Goal) -> Result<(), GoalError> {
        let row = GoalRow::from_goal(goal, self.user_id());
        Ok(self.insert(GOALS_TABLE, &row)?)
    }

    fn update_goal(&mut self, goal: &Goal, expected: GoalStatus) -> Result<(), GoalError> {
        let body = json!({
            "progress": goal.progress,
            "status": goal.status.to_string(),
            "completed_at": goal.completed_at.map(iso),
        });
        let request = self
            .table(Method::PATCH, GOALS_TABLE)
            .query(&[
                ("id", format!("eq.{}", goal.id)),
                ("status", format!("eq.{}", expected)),
            ])
            .header("Prefer", "return=representation")
            .json(&body);
        let updated: Vec<Value> = self.client.send_json(request)?;
        if updated.is_empty() {
            return Err(GoalError::Conflict {
                goal_id: goal.id,
                expected: expected.to_string(),
            });
        }
        Ok(())
    }

    fn delete_goal(&mut self, goal_id: Uuid) -> Result<(), GoalError> {
        let request = self
            .table(Method::DELETE, GOALS_TABLE)
            .query(&[("id", format!("eq.{}", goal_id))]);
        Ok(self.client.send(request)?)
    }

    fn delete_pending_goals(&mut self) -> Result<(), GoalError> {
        let request = self
            .table(Method::DELETE, GOALS_TABLE)
            .query(&[("status", "eq.pending")]);
        Ok(self.client.send(request)?)
    }

    fn mark_expired_failed(&mut self, now: DateTime<Utc>) -> Result<(), GoalError> {
        let request = self
            .table(Method::PATCH, GOALS_TABLE)
            .query(&[
                ("status", "eq.pending".to_string()),
                ("target_date", format!("lt.{}", iso(now))),
            ])
            .json(&json!({ "status": "failed" }));
        Ok(self.client.send(request)?)
    }

    fn insert_journal_entry(&mut self, entry: &JournalEntry) -> Result<(), GoalError> {
        let row = JournalRow::from_entry(entry, self.user_id());
        Ok(self.insert(JOURNAL_TABLE, &row)?)
    }

    fn clear_all(&mut self) -> Result<(), GoalError> {
        for table in [JOURNAL_TABLE, GOALS_TABLE] {
            self.client.send(self.table(Method::DELETE, table))?;
        }
        Ok(())
    }
}
