// mod.rs - Subcommand handlers and the helpers they share.

pub mod auth;
pub mod data;
pub mod goal;
pub mod journal;
pub mod stats;
pub mod watch;

use td_goal::{Goal, Tracker};
use uuid::Uuid;

/// Resolve a goal reference: a full UUID, or a unique prefix of one.
pub fn resolve_goal_id(tracker: &Tracker, reference: &str) -> anyhow::Result<Uuid> {
    let reference = reference.trim();
    if let Ok(id) = Uuid::parse_str(reference) {
        return Ok(id);
    }
    let matches: Vec<&Goal> = tracker
        .goals()
        .all()
        .iter()
        .filter(|g| g.id.to_string().starts_with(reference))
        .collect();
    match matches.as_slice() {
        [] => anyhow::bail!("no goal matches '{}'", reference),
        [goal] => Ok(goal.id),
        _ => anyhow::bail!(
            "'{}' matches {} goals; use more characters",
            reference,
            matches.len()
        ),
    }
}

pub fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a long goal title", 10), "a long ...");
        assert_eq!(truncate("éééééééééééé", 6), "ééé...");
    }

    #[test]
    fn short_id_is_first_block() {
        let id = Uuid::parse_str("7d9f2c1e-8d8a-4a53-9a2a-0d6c1f3b2e11").unwrap();
        assert_eq!(short_id(id), "7d9f2c1e");
    }
}
