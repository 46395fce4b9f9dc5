//! # td-cli
//!
//! Command-line interface for TrackDaily.
//!
//! - `td goal add/list/progress/complete/remove/clear`: today's goals
//! - `td journal`: reflections written when goals were completed
//! - `td failures`: the permanent record of missed goals
//! - `td streak/calendar/summary`: progress over time
//! - `td export/reset`: backup and wipe
//! - `td watch`: keep expiring overdue goals and show the day's countdown
//! - `td auth signup/signin/signout/whoami/profile`: hosted account and profile

mod commands;
mod context;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::context::Context;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (rev ",
    env!("TD_REVISION"),
    ", ",
    env!("TD_TARGET"),
    ")"
);

/// TrackDaily: set today's goals, finish them, keep the streak.
#[derive(Parser)]
#[command(name = "td", version, long_version = LONG_VERSION, about)]
struct Cli {
    /// Data directory (defaults to the platform data dir).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage today's goals.
    Goal {
        #[command(subcommand)]
        command: commands::goal::GoalCommands,
    },
    /// Show journal entries, newest first.
    Journal {
        /// Only entries written on this day (YYYY-MM-DD).
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
    },
    /// Show missed goals.
    Failures,
    /// Show the current streak of fully completed days.
    Streak,
    /// Show a month of day statuses.
    Calendar {
        /// Month to show (YYYY-MM); defaults to this month.
        #[arg(long)]
        month: Option<String>,
    },
    /// Show goal counts and completion rate.
    Summary,
    /// Write a JSON backup of all goals and journal entries.
    Export {
        /// Output file (defaults to trackdaily-backup-<date>.json in the current directory).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Delete all goals and journal entries.
    Reset {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
    /// Expire overdue goals on a timer and show time left in the day.
    Watch,
    /// Sign in to the hosted backend.
    Auth {
        #[command(subcommand)]
        command: commands::auth::AuthCommands,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they don't mix with command output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("td=info".parse()?)
                .add_directive("td_goal=info".parse()?)
                .add_directive("td_remote=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let data_dir = cli
        .data_dir
        .unwrap_or_else(td_goal::TrackerConfig::default_data_dir);
    let ctx = Context::load(&data_dir);

    match &cli.command {
        Commands::Goal { command } => commands::goal::execute(command, &ctx),
        Commands::Journal { date } => commands::journal::list(&ctx, *date),
        Commands::Failures => commands::journal::failures(&ctx),
        Commands::Streak => commands::stats::streak(&ctx),
        Commands::Calendar { month } => commands::stats::calendar(&ctx, month.as_deref()),
        Commands::Summary => commands::stats::summary(&ctx),
        Commands::Export { out } => commands::data::export(&ctx, out.as_deref()),
        Commands::Reset { yes } => commands::data::reset(&ctx, *yes),
        Commands::Watch => commands::watch::execute(&ctx),
        Commands::Auth { command } => commands::auth::execute(command, &ctx),
    }
}
