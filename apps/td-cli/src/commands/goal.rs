// goal.rs - Goal subcommands: add, list, progress, complete, remove, clear.

use clap::Subcommand;
use td_goal::{GoalStatus, JournalPayload, MediaType, Tracker};

use super::{resolve_goal_id, short_id, truncate};
use crate::context::Context;

#[derive(Subcommand)]
pub enum GoalCommands {
    /// Add a goal for today. It fails automatically at midnight.
    Add {
        /// Goal title (e.g., "Run 5k").
        title: String,
        /// What finishing it looks like.
        #[arg(long, short)]
        description: String,
    },
    /// List goals, newest first.
    List {
        /// Filter by status ("pending", "completed", "failed").
        #[arg(long)]
        status: Option<GoalStatus>,
        /// Only goals created today.
        #[arg(long)]
        today: bool,
    },
    /// Set progress (0-100) on a pending goal.
    Progress {
        /// Goal ID or unique prefix.
        id: String,
        /// New progress value.
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },
    /// Complete a goal with a journal entry and a photo or video.
    Complete {
        /// Goal ID or unique prefix.
        id: String,
        /// What you did and how it went.
        #[arg(long)]
        text: String,
        /// Media URL or local file path.
        #[arg(long)]
        media: String,
        /// Media kind ("photo" or "video").
        #[arg(long = "type", default_value = "photo")]
        media_type: MediaType,
    },
    /// Remove a pending goal.
    Remove {
        /// Goal ID or unique prefix.
        id: String,
    },
    /// Remove every pending goal.
    Clear,
}

pub fn execute(cmd: &GoalCommands, ctx: &Context) -> anyhow::Result<()> {
    let mut tracker = ctx.open_tracker(Vec::new())?;

    match cmd {
        GoalCommands::Add { title, description } => add_goal(&mut tracker, title, description),
        GoalCommands::List { status, today } => list_goals(&tracker, *status, *today),
        GoalCommands::Progress { id, value } => set_progress(&mut tracker, id, *value),
        GoalCommands::Complete {
            id,
            text,
            media,
            media_type,
        } => {
            let media_url = ctx.resolve_media(media, *media_type)?;
            complete_goal(
                &mut tracker,
                id,
                JournalPayload::new(text.as_str(), media_url, *media_type),
            )
        }
        GoalCommands::Remove { id } => remove_goal(&mut tracker, id),
        GoalCommands::Clear => clear_goals(&mut tracker),
    }
}

fn add_goal(tracker: &mut Tracker, title: &str, description: &str) -> anyhow::Result<()> {
    let goal = tracker.add(title, description)?;
    println!("Goal added: {}", goal.id);
    println!("  Title: {}", goal.title);
    println!("  Due:   end of {}", tracker.today());
    Ok(())
}

fn list_goals(tracker: &Tracker, status: Option<GoalStatus>, today: bool) -> anyhow::Result<()> {
    let store = tracker.goals();
    let mut goals = match status {
        Some(status) => store.with_status(status),
        None => {
            let mut all: Vec<_> = store.all().iter().collect();
            all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            all
        }
    };
    if today {
        let day = tracker.today();
        goals.retain(|g| td_goal::clock::local_date(g.created_at) == day);
    }

    if goals.is_empty() {
        println!("No goals found.");
        return Ok(());
    }

    println!(
        "{:<10} {:<32} {:<10} {:>8}  {:<10}",
        "ID", "TITLE", "STATUS", "PROGRESS", "DAY"
    );
    println!("{}", "-".repeat(76));
    for g in &goals {
        println!(
            "{:<10} {:<32} {:<10} {:>7}%  {:<10}",
            short_id(g.id),
            truncate(&g.title, 30),
            g.status.to_string(),
            g.progress,
            td_goal::clock::local_date(g.created_at),
        );
    }
    println!("\n{} goal(s).", goals.len());
    Ok(())
}

fn set_progress(tracker: &mut Tracker, id: &str, value: i64) -> anyhow::Result<()> {
    let goal_id = resolve_goal_id(tracker, id)?;
    if tracker.update_progress(goal_id, value)? {
        println!("Progress set to {}% on {}", value, short_id(goal_id));
    } else {
        println!("Nothing to update: {} is not a pending goal.", short_id(goal_id));
    }
    Ok(())
}

fn complete_goal(tracker: &mut Tracker, id: &str, payload: JournalPayload) -> anyhow::Result<()> {
    let goal_id = resolve_goal_id(tracker, id)?;
    let entry = tracker.complete(goal_id, &payload)?;
    println!("Goal completed: {}", entry.goal_title);
    println!("  Journal entry: {}", entry.id);
    println!("  Media:         {} ({})", entry.media_url, entry.media_type);
    Ok(())
}

fn remove_goal(tracker: &mut Tracker, id: &str) -> anyhow::Result<()> {
    let goal_id = resolve_goal_id(tracker, id)?;
    if tracker.remove(goal_id)? {
        println!("Removed goal {}", short_id(goal_id));
    } else {
        println!("No goal {} to remove.", short_id(goal_id));
    }
    Ok(())
}

fn clear_goals(tracker: &mut Tracker) -> anyhow::Result<()> {
    let count = tracker.clear_pending()?;
    println!("Removed {} pending goal(s).", count);
    Ok(())
}
