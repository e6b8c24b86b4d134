use std::time::Duration;

use serde::Serialize;
use soxdash_core::{Dashboard, SourceTier};

use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct TierStatus {
    position: usize,
    tier: SourceTier,
    label: &'static str,
    live: bool,
    configured: bool,
    timeout_ms: u64,
}

#[derive(Debug, Serialize)]
struct TiersResponseData {
    tiers: Vec<TierStatus>,
    tier_timeout_ms: u64,
    narrative_configured: bool,
}

pub fn run(dashboard: &Dashboard, offline: bool) -> Result<CommandResult, CliError> {
    let ai_configured = dashboard.narrative_configured() && !offline;
    let tiers = dashboard
        .tier_budgets()
        .into_iter()
        .enumerate()
        .map(|(index, (tier, budget))| TierStatus {
            position: index + 1,
            tier,
            label: tier.label(),
            live: tier.is_live(),
            configured: match tier {
                SourceTier::Primary => !offline,
                SourceTier::AiSearch => ai_configured,
                SourceTier::Demo => true,
            },
            timeout_ms: millis(budget),
        })
        .collect::<Vec<_>>();

    let mut result = CommandResult::ok(serde_json::to_value(TiersResponseData {
        tiers,
        tier_timeout_ms: millis(dashboard.tier_timeout()),
        narrative_configured: ai_configured,
    })?);
    result.tier_chain = dashboard.tiers();

    if offline {
        result = result.with_warning("offline mode: live tiers will fail immediately");
    } else if !ai_configured {
        result = result.with_warning(
            "AI search is skipped without SOXDASH_GEMINI_API_KEY or GEMINI_API_KEY",
        );
    }
    Ok(result)
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
