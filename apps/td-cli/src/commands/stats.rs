// stats.rs - Streak, calendar and summary views.

use anyhow::Context as _;
use chrono::{Datelike, NaiveDate};
use td_goal::DayStatus;

use crate::context::Context;

pub fn streak(ctx: &Context) -> anyhow::Result<()> {
    let tracker = ctx.open_tracker(Vec::new())?;
    let days = tracker.streak();
    println!(
        "Current streak: {} day{}",
        days,
        if days == 1 { "" } else { "s" }
    );
    Ok(())
}

pub fn calendar(ctx: &Context, month: Option<&str>) -> anyhow::Result<()> {
    let month = month.map(parse_month).transpose()?;
    let tracker = ctx.open_tracker(Vec::new())?;
    let days = tracker.calendar(month);

    if let Some((first, _)) = days.first() {
        println!("{}", first.format("%B %Y"));
    }
    println!(" Mo  Tu  We  Th  Fr  Sa  Su");
    let mut line = String::new();
    if let Some((first, _)) = days.first() {
        line.push_str(&"    ".repeat(first.weekday().num_days_from_monday() as usize));
    }
    for (day, status) in &days {
        line.push_str(&format!("{:>2}{} ", day.day(), status_mark(*status)));
        if day.weekday() == chrono::Weekday::Sun {
            println!("{}", line.trim_end());
            line.clear();
        }
    }
    if !line.is_empty() {
        println!("{}", line.trim_end());
    }
    println!();
    println!("+ success  x failed  ~ partial  . no goals");
    Ok(())
}

pub fn summary(ctx: &Context) -> anyhow::Result<()> {
    let tracker = ctx.open_tracker(Vec::new())?;
    let s = tracker.summary();
    println!("Goals:      {}", s.total);
    println!("Pending:    {}", s.pending);
    println!("Completed:  {}", s.completed);
    println!("Failed:     {}", s.failed);
    println!("Completion: {:.0}%", s.completion_rate);
    println!("Streak:     {}", tracker.streak());
    println!("Time left:  {}", tracker.time_left());
    Ok(())
}

/// Parse `YYYY-MM` into (year, month).
fn parse_month(s: &str) -> anyhow::Result<(i32, u32)> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .with_context(|| format!("invalid month '{}', expected YYYY-MM", s))?;
    Ok((first.year(), first.month()))
}

fn status_mark(status: DayStatus) -> char {
    match status {
        DayStatus::Success => '+',
        DayStatus::Failed => 'x',
        DayStatus::Partial => '~',
        DayStatus::NoGoals => '.',
        DayStatus::Future => ' ',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_year_month() {
        assert_eq!(parse_month("2026-06").unwrap(), (2026, 6));
        assert_eq!(parse_month(" 2025-12 ").unwrap(), (2025, 12));
        assert!(parse_month("2026-13").is_err());
        assert!(parse_month("June").is_err());
    }

    #[test]
    fn future_days_are_blank() {
        assert_eq!(status_mark(DayStatus::Future), ' ');
        assert_eq!(status_mark(DayStatus::Partial), '~');
    }
}
