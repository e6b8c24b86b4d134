//! Ordered price tiers; the first one to succeed wins.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::data_source::{SourceError, SourceFuture};
use crate::{ConstituentTicker, RawQuote, SlotMap, SourceTier, ValidationError};

pub const DEFAULT_TIER_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Budget of the AI search tier and its model request.
pub const DEFAULT_AI_TIER_TIMEOUT: Duration = Duration::from_millis(30_000);

/// What a successful tier hands back. `None` slots and a `None`
/// constituent list are filled from the last published snapshot.
#[derive(Debug, Clone, Default)]
pub struct TierOutput {
    pub quotes: SlotMap<Option<RawQuote>>,
    pub constituents: Option<Vec<ConstituentTicker>>,
    pub warnings: Vec<String>,
}

/// One acquisition strategy in the fallback chain.
pub trait PriceTier: Send + Sync {
    fn tier(&self) -> SourceTier;

    fn attempt<'a>(&'a self) -> SourceFuture<'a, TierOutput>;

    /// Own time budget; `None` uses the controller default.
    fn timeout(&self) -> Option<Duration> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierError {
    pub tier: SourceTier,
    pub error: SourceError,
}

/// Successful fallback run.
#[derive(Debug, Clone)]
pub struct TierSuccess {
    pub output: TierOutput,
    pub selected: SourceTier,
    pub tier_chain: Vec<SourceTier>,
    pub errors: Vec<TierError>,
    pub warnings: Vec<String>,
    pub latency_ms: u64,
}

/// Every tier failed. Only possible for chains without the demo tier.
#[derive(Debug, Clone)]
pub struct FallbackFailure {
    pub tier_chain: Vec<SourceTier>,
    pub errors: Vec<TierError>,
    pub latency_ms: u64,
}

impl FallbackFailure {
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.tier.label(), e.error.message()))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

pub type FallbackResult = Result<TierSuccess, FallbackFailure>;

pub struct FallbackController {
    tiers: Vec<Arc<dyn PriceTier>>,
    tier_timeout: Duration,
}

impl FallbackController {
    pub fn new(
        tiers: Vec<Arc<dyn PriceTier>>,
        tier_timeout: Duration,
    ) -> Result<Self, ValidationError> {
        if tiers.is_empty() {
            return Err(ValidationError::EmptyTierChain);
        }
        if tier_timeout.is_zero() {
            return Err(ValidationError::ZeroTierTimeout);
        }
        Ok(Self {
            tiers,
            tier_timeout,
        })
    }

    pub fn tiers(&self) -> Vec<SourceTier> {
        self.tiers.iter().map(|tier| tier.tier()).collect()
    }

    pub const fn tier_timeout(&self) -> Duration {
        self.tier_timeout
    }

    /// Effective budget of every tier, in chain order.
    pub fn budgets(&self) -> Vec<(SourceTier, Duration)> {
        self.tiers
            .iter()
            .map(|tier| (tier.tier(), self.budget_for(tier.as_ref())))
            .collect()
    }

    fn budget_for(&self, tier: &dyn PriceTier) -> Duration {
        tier.timeout()
            .filter(|budget| !budget.is_zero())
            .unwrap_or(self.tier_timeout)
    }

    /// Tries tiers strictly in order with no retries inside a tier.
    pub async fn run(&self) -> FallbackResult {
        let started = Instant::now();
        let mut tier_chain = Vec::with_capacity(self.tiers.len());
        let mut errors = Vec::new();

        for tier in &self.tiers {
            let label = tier.tier();
            tier_chain.push(label);
            let budget = self.budget_for(tier.as_ref());

            let outcome = match tokio::time::timeout(budget, tier.attempt()).await {
                Ok(outcome) => outcome,
                Err(_) => Err(SourceError::timeout(format!(
                    "{} tier exceeded {} ms",
                    label.label(),
                    budget.as_millis()
                ))),
            };

            match outcome {
                Ok(output) => {
                    let mut warnings = Vec::new();
                    if !errors.is_empty() {
                        warnings.push(format!(
                            "fell back to '{}' after {} failed tier(s)",
                            label.label(),
                            errors.len()
                        ));
                    }
                    tracing::info!(
                        tier = label.as_str(),
                        failed = errors.len(),
                        "price tier succeeded"
                    );
                    return Ok(TierSuccess {
                        output,
                        selected: label,
                        tier_chain,
                        errors,
                        warnings,
                        latency_ms: elapsed_ms(started),
                    });
                }
                Err(error) => {
                    tracing::warn!(
                        tier = label.as_str(),
                        code = error.code(),
                        message = error.message(),
                        "price tier failed"
                    );
                    errors.push(TierError { tier: label, error });
                }
            }
        }

        Err(FallbackFailure {
            tier_chain,
            errors,
            latency_ms: elapsed_ms(started),
        })
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}
