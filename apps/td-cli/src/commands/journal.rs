// journal.rs - Read-only views: journal entries and the failure record.

use chrono::NaiveDate;
use td_goal::clock::local_date;
use td_goal::{JournalEntry, Tracker};

use super::{short_id, truncate};
use crate::context::Context;

pub fn list(ctx: &Context, date: Option<NaiveDate>) -> anyhow::Result<()> {
    let tracker = ctx.open_tracker(Vec::new())?;
    print_entries(&entries(&tracker, date));
    Ok(())
}

pub fn failures(ctx: &Context) -> anyhow::Result<()> {
    let tracker = ctx.open_tracker(Vec::new())?;
    let failed = tracker.goals().failed();
    if failed.is_empty() {
        println!("No missed goals. Keep it up.");
        return Ok(());
    }

    println!("{:<10} {:<40} {:<10} {:>8}", "ID", "TITLE", "DAY", "PROGRESS");
    println!("{}", "-".repeat(72));
    for g in &failed {
        println!(
            "{:<10} {:<40} {:<10} {:>7}%",
            short_id(g.id),
            truncate(&g.title, 38),
            local_date(g.target_date),
            g.progress,
        );
    }
    println!("\n{} missed goal(s).", failed.len());
    Ok(())
}

fn entries(tracker: &Tracker, date: Option<NaiveDate>) -> Vec<&JournalEntry> {
    match date {
        Some(day) => tracker.journal().on_day(day),
        None => tracker.journal().entries(),
    }
}

fn print_entries(entries: &[&JournalEntry]) {
    if entries.is_empty() {
        println!("No journal entries.");
        return;
    }
    for e in entries {
        println!(
            "{}  {}",
            e.created_at
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M"),
            e.goal_title
        );
        println!("  {}", e.text);
        println!("  [{}] {}", e.media_type, e.media_url);
        println!();
    }
    println!("{} entr{}.", entries.len(), if entries.len() == 1 { "y" } else { "ies" });
}
