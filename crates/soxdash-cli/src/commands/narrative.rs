use soxdash_core::Dashboard;

use crate::error::CliError;

use super::CommandResult;

pub async fn run(dashboard: &Dashboard) -> Result<CommandResult, CliError> {
    let started = std::time::Instant::now();
    let snapshot = dashboard.refresh_narrative().await?;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let mut result = CommandResult::ok(serde_json::to_value(&snapshot.narrative)?);
    result.latency_ms = latency_ms;
    if snapshot.narrative.news.iter().all(|item| item.url.is_none()) {
        result = result.with_warning("model returned no source links");
    }
    Ok(result)
}
