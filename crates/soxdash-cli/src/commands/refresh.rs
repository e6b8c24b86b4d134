use soxdash_core::{assemble, Dashboard};

use crate::cli::RefreshArgs;
use crate::error::CliError;

use super::CommandResult;

pub async fn run(args: &RefreshArgs, dashboard: &Dashboard) -> Result<CommandResult, CliError> {
    let (prices, narrative) = if args.narrative {
        let (prices, narrative) =
            tokio::join!(dashboard.refresh_prices(), dashboard.refresh_narrative());
        (prices, Some(narrative))
    } else {
        (dashboard.refresh_prices().await, None)
    };

    let outcome = prices?;
    // Narrative may have landed after the price snapshot was taken.
    let view = assemble(&dashboard.snapshot());
    let mut result = CommandResult::from_refresh(&outcome, view)?;

    if let Some(Err(error)) = narrative {
        tracing::warn!(error = %error, "narrative refresh failed");
        result = result.with_warning(format!("narrative not refreshed: {error}"));
    }

    Ok(result)
}
