//! Periodic refresh with a one-second clock.
//!
//! The refresh loop and the clock run side by side; the clock only reads the
//! last published snapshot, so a slow tier never freezes it.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use soxdash_core::view_model::INITIALIZING_LABEL;
use soxdash_core::{assemble, Dashboard, DashboardSnapshot, UtcDateTime};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use crate::cli::{OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::metadata::TraceId;
use crate::output;

use super::CommandResult;

pub async fn run(
    args: &WatchArgs,
    dashboard: &Dashboard,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    let trace_id = TraceId::new();
    tracing::info!(
        trace_id = %trace_id,
        interval_secs = args.interval_secs,
        cycles = ?args.cycles,
        "watch started"
    );

    let receiver = dashboard.subscribe();
    let finished = tokio::select! {
        result = refresh_loop(args, dashboard, format, pretty, &trace_id) => result,
        () = clock_loop(receiver, format) => Ok(()),
        signal = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted");
            signal.map_err(CliError::from)
        }
    };

    if format == OutputFormat::Table {
        eprintln!();
    }
    finished
}

async fn refresh_loop(
    args: &WatchArgs,
    dashboard: &Dashboard,
    format: OutputFormat,
    pretty: bool,
    trace_id: &TraceId,
) -> Result<(), CliError> {
    if args.narrative {
        if let Err(error) = dashboard.refresh_narrative().await {
            tracing::warn!(error = %error, "narrative refresh failed");
        }
    }

    let mut ticker = interval(Duration::from_secs(args.interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut completed = 0_u64;

    loop {
        // First tick fires immediately: the on-start refresh.
        ticker.tick().await;

        match dashboard.refresh_prices().await {
            Ok(outcome) => {
                let view = assemble(&outcome.snapshot);
                let result = CommandResult::from_refresh(&outcome, view)?;
                let (envelope, view) = result.into_envelope(trace_id.clone());
                if format == OutputFormat::Table {
                    eprintln!();
                }
                output::render(&envelope, format, pretty, view.as_ref())?;
            }
            Err(error) => {
                tracing::warn!(error = %error, "price refresh failed; keeping last snapshot");
            }
        }

        completed += 1;
        if args.cycles.is_some_and(|cycles| completed >= cycles) {
            tracing::info!(completed, "watch finished");
            return Ok(());
        }
    }
}

/// Redraws `HH:MM:SS | updated ...` on stderr every second in table mode.
async fn clock_loop(receiver: watch::Receiver<Arc<DashboardSnapshot>>, format: OutputFormat) {
    let mut clock = interval(Duration::from_secs(1));
    clock.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        clock.tick().await;
        if format != OutputFormat::Table {
            continue;
        }
        let line = clock_line(UtcDateTime::now(), &receiver.borrow());
        let mut stderr = io::stderr().lock();
        // Write errors on stderr are ignored.
        let _ = write!(stderr, "\r{line}");
        let _ = stderr.flush();
    }
}

fn clock_line(now: UtcDateTime, snapshot: &DashboardSnapshot) -> String {
    let updated = snapshot
        .last_updated
        .map_or_else(|| INITIALIZING_LABEL.to_owned(), UtcDateTime::clock_label);
    format!(
        "{} UTC | updated {updated} | {}",
        now.clock_label(),
        snapshot.source.map_or("loading", |tier| tier.label())
    )
}
