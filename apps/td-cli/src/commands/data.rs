// data.rs - Backup and wipe: export, reset.

use std::path::{Path, PathBuf};

use td_goal::{ExportBundle, Tracker};

use crate::context::Context;

pub fn export(ctx: &Context, out: Option<&Path>) -> anyhow::Result<()> {
    let tracker = ctx.open_tracker(Vec::new())?;
    let written = export_to(&tracker, out)?;
    println!("Exported to {}", written.display());
    Ok(())
}

pub fn reset(ctx: &Context, yes: bool) -> anyhow::Result<()> {
    if !yes {
        anyhow::bail!("this deletes every goal and journal entry; pass --yes to confirm");
    }
    let mut tracker = ctx.open_tracker(Vec::new())?;
    tracker.reset()?;
    println!("All goals and journal entries deleted.");
    Ok(())
}

fn export_to(tracker: &Tracker, out: Option<&Path>) -> anyhow::Result<PathBuf> {
    let bundle = tracker.export();
    let path = match out {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(ExportBundle::default_file_name(chrono::Local::now())),
    };
    let written = bundle.write_to(&path)?;
    tracing::info!(
        goals = bundle.goals.len(),
        entries = bundle.journal.len(),
        "exported to {}",
        written.display()
    );
    Ok(written)
}
