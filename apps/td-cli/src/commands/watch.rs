// watch.rs - Long-running reconciler with a live end-of-day countdown.
//
// The tracker (and the blocking HTTP client inside a hosted backend) is built
// before the runtime starts and dropped after it stops. Tracker calls run on
// the blocking pool; the async side only drives timers and prints.

use std::io::Write;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use td_goal::{ChannelSink, TimeLeft, Tracker, TrackerEvent};
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use super::short_id;
use crate::context::Context;

pub fn execute(ctx: &Context) -> anyhow::Result<()> {
    let (tx, rx) = mpsc::channel();
    let tracker = ctx.open_tracker(vec![Box::new(ChannelSink::new(tx))])?;
    let tracker = Arc::new(Mutex::new(tracker));

    let every = ctx.config.reconcile_interval();
    let countdown = ctx.config.countdown.enabled;
    println!(
        "Watching goals (reconcile every {}s). Press Ctrl-C to stop.",
        every.as_secs()
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(Arc::clone(&tracker), rx, every, countdown));
    drop(runtime);
    drop(tracker);
    result
}

async fn run(
    tracker: Arc<Mutex<Tracker>>,
    events: Receiver<TrackerEvent>,
    every: Duration,
    countdown: bool,
) -> anyhow::Result<()> {
    // First tick fires immediately, so a stale day is settled at startup.
    let mut reconcile_tick = tokio::time::interval(every);
    reconcile_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut countdown_tick = tokio::time::interval(Duration::from_secs(1));
    countdown_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = reconcile_tick.tick() => {
                match reconcile(Arc::clone(&tracker)).await {
                    Ok(expired) if !expired.is_empty() => {
                        tracing::info!("expired {} overdue goal(s)", expired.len());
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("reconciliation failed, retrying next tick: {}", e),
                }
                for event in events.try_iter() {
                    println!("\r{}", describe(&event));
                }
            }
            _ = countdown_tick.tick(), if countdown => {
                let left = TimeLeft::until_end_of_day(chrono::Local::now());
                print!("\rTime left today: {}   ", left);
                let _ = std::io::stdout().flush();
            }
            _ = &mut shutdown => {
                println!();
                tracing::info!("watch stopped");
                return Ok(());
            }
        }
    }
}

async fn reconcile(tracker: Arc<Mutex<Tracker>>) -> anyhow::Result<Vec<Uuid>> {
    tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<Uuid>> {
        let mut tracker = tracker
            .lock()
            .map_err(|_| anyhow::anyhow!("tracker lock poisoned"))?;
        Ok(tracker.reconcile()?)
    })
    .await
    .map_err(|e| anyhow::anyhow!("reconcile task panicked: {}", e))?
}

fn describe(event: &TrackerEvent) -> String {
    match event {
        TrackerEvent::GoalFailed {
            goal_id,
            title,
            timestamp,
        } => format!(
            "[{}] missed: {} ({})",
            timestamp.with_timezone(&chrono::Local).format("%H:%M:%S"),
            title,
            short_id(*goal_id)
        ),
        other => other.event_type().replace('_', " "),
    }
}
