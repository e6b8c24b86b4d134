use std::env;
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::{GeminiClient, YahooAdapter, DEFAULT_GEMINI_MODEL};
use crate::aggregator::QuoteAggregator;
use crate::dashboard::Dashboard;
use crate::fallback::{
    FallbackController, PriceTier, DEFAULT_AI_TIER_TIMEOUT, DEFAULT_TIER_TIMEOUT,
};
use crate::http_client::{HttpClient, NoopHttpClient, ReqwestHttpClient};
use crate::narrative::NarrativeService;
use crate::tiers::{AiSearchTier, DemoTier, PrimaryTier};
use crate::ValidationError;

/// Runtime settings, usually read from the environment.
///
/// | Setting | Primary Env Var | Fallback Env Var |
/// |---------|-----------------|------------------|
/// | Gemini key | `SOXDASH_GEMINI_API_KEY` | `GEMINI_API_KEY` |
/// | Gemini model | `SOXDASH_GEMINI_MODEL` | - |
/// | Tier timeout (ms) | `SOXDASH_TIER_TIMEOUT_MS` | - |
/// | AI search tier timeout (ms) | `SOXDASH_AI_TIER_TIMEOUT_MS` | - |
/// | Yahoo cookie | `YAHOO_COOKIE` | - |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub tier_timeout: Duration,
    pub ai_tier_timeout: Duration,
    pub yahoo_cookie: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_owned(),
            tier_timeout: DEFAULT_TIER_TIMEOUT,
            ai_tier_timeout: DEFAULT_AI_TIER_TIMEOUT,
            yahoo_cookie: None,
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads settings through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ValidationError> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let tier_timeout = timeout_setting(
            "SOXDASH_TIER_TIMEOUT_MS",
            get("SOXDASH_TIER_TIMEOUT_MS"),
            DEFAULT_TIER_TIMEOUT,
        )?;
        let ai_tier_timeout = timeout_setting(
            "SOXDASH_AI_TIER_TIMEOUT_MS",
            get("SOXDASH_AI_TIER_TIMEOUT_MS"),
            DEFAULT_AI_TIER_TIMEOUT,
        )?;

        Ok(Self {
            gemini_api_key: get("SOXDASH_GEMINI_API_KEY").or_else(|| get("GEMINI_API_KEY")),
            gemini_model: get("SOXDASH_GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_owned()),
            tier_timeout,
            ai_tier_timeout,
            yahoo_cookie: get("YAHOO_COOKIE"),
        })
    }
}

fn timeout_setting(
    name: &str,
    raw: Option<String>,
    default: Duration,
) -> Result<Duration, ValidationError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ValidationError::ZeroTierTimeout),
        Ok(ms) => Ok(Duration::from_millis(ms)),
        Err(_) => {
            tracing::warn!(setting = name, value = %raw, "ignoring unparsable timeout");
            Ok(default)
        }
    }
}

/// Wires adapters, tiers and the dashboard together.
///
/// ```rust,ignore
/// let dashboard = DashboardBuilder::new().with_env()?.build()?;
/// dashboard.refresh_prices().await?;
/// ```
#[derive(Default)]
pub struct DashboardBuilder {
    config: DashboardConfig,
    offline: bool,
    http_client: Option<Arc<dyn HttpClient>>,
    rng_seed: Option<u64>,
}

impl DashboardBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: DashboardConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_env(mut self) -> Result<Self, ValidationError> {
        self.config = DashboardConfig::from_env()?;
        Ok(self)
    }

    /// No network at all; the chain settles on demo data.
    pub fn with_offline_mode(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn with_gemini_key(mut self, key: impl Into<String>) -> Self {
        self.config.gemini_api_key = Some(key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.config.gemini_model = model.into();
        self
    }

    pub fn with_tier_timeout(mut self, timeout: Duration) -> Self {
        self.config.tier_timeout = timeout;
        self
    }

    /// Budget for the AI search tier and its model request.
    pub fn with_ai_tier_timeout(mut self, timeout: Duration) -> Self {
        self.config.ai_tier_timeout = timeout;
        self
    }

    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// Makes synthetic histories reproducible.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn build(self) -> Result<Dashboard, ValidationError> {
        if self.config.ai_tier_timeout.is_zero() {
            return Err(ValidationError::ZeroTierTimeout);
        }
        let http_client: Arc<dyn HttpClient> = match (self.offline, self.http_client) {
            (true, _) => Arc::new(NoopHttpClient),
            (false, Some(client)) => client,
            (false, None) => Arc::new(ReqwestHttpClient::new()),
        };

        let timeout_ms = u64::try_from(self.config.tier_timeout.as_millis()).unwrap_or(u64::MAX);
        let ai_timeout_ms =
            u64::try_from(self.config.ai_tier_timeout.as_millis()).unwrap_or(u64::MAX);
        let yahoo = YahooAdapter::new(Arc::clone(&http_client))
            .with_cookie_override(self.config.yahoo_cookie.clone())
            .with_request_timeout_ms(timeout_ms);
        let gemini = Arc::new(
            GeminiClient::new(
                Arc::clone(&http_client),
                self.config.gemini_api_key.clone(),
                self.config.gemini_model.clone(),
            )
            .with_timeout_ms(ai_timeout_ms),
        );

        let tiers: Vec<Arc<dyn PriceTier>> = vec![
            Arc::new(PrimaryTier::new(QuoteAggregator::new(Arc::new(yahoo)))),
            Arc::new(
                AiSearchTier::new(Arc::clone(&gemini)).with_timeout(self.config.ai_tier_timeout),
            ),
            Arc::new(DemoTier),
        ];
        let controller = FallbackController::new(tiers, self.config.tier_timeout)?;

        Ok(Dashboard::new(
            controller,
            Some(NarrativeService::new(gemini)),
            self.rng_seed,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect::<HashMap<_, _>>();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = DashboardConfig::from_lookup(lookup(&[])).expect("valid");
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.tier_timeout, Duration::from_millis(5_000));
        assert_eq!(config.ai_tier_timeout, Duration::from_millis(30_000));
        assert_eq!(config.gemini_model, "gemini-2.5-flash");
    }

    #[test]
    fn prefixed_key_wins_over_fallback() {
        let config = DashboardConfig::from_lookup(lookup(&[
            ("SOXDASH_GEMINI_API_KEY", "primary"),
            ("GEMINI_API_KEY", "fallback"),
        ]))
        .expect("valid");
        assert_eq!(config.gemini_api_key.as_deref(), Some("primary"));

        let config =
            DashboardConfig::from_lookup(lookup(&[("SOXDASH_GEMINI_API_KEY", " "), ("GEMINI_API_KEY", "fallback")]))
                .expect("valid");
        assert_eq!(config.gemini_api_key.as_deref(), Some("fallback"));
    }

    #[test]
    fn zero_timeout_is_rejected_and_garbage_is_ignored() {
        assert_eq!(
            DashboardConfig::from_lookup(lookup(&[("SOXDASH_TIER_TIMEOUT_MS", "0")])),
            Err(ValidationError::ZeroTierTimeout)
        );
        let config =
            DashboardConfig::from_lookup(lookup(&[("SOXDASH_TIER_TIMEOUT_MS", "soon")])).expect("valid");
        assert_eq!(config.tier_timeout, DEFAULT_TIER_TIMEOUT);
    }

    #[test]
    fn ai_tier_timeout_is_read_separately() {
        let config = DashboardConfig::from_lookup(lookup(&[
            ("SOXDASH_TIER_TIMEOUT_MS", "800"),
            ("SOXDASH_AI_TIER_TIMEOUT_MS", "45000"),
        ]))
        .expect("valid");
        assert_eq!(config.tier_timeout, Duration::from_millis(800));
        assert_eq!(config.ai_tier_timeout, Duration::from_millis(45_000));

        assert_eq!(
            DashboardConfig::from_lookup(lookup(&[("SOXDASH_AI_TIER_TIMEOUT_MS", "0")])),
            Err(ValidationError::ZeroTierTimeout)
        );
    }

    #[test]
    fn builder_wires_three_tiers_in_order() {
        let dashboard = DashboardBuilder::new()
            .with_offline_mode(true)
            .with_tier_timeout(Duration::from_millis(250))
            .build()
            .expect("builds");
        assert_eq!(
            dashboard.tiers(),
            vec![
                crate::SourceTier::Primary,
                crate::SourceTier::AiSearch,
                crate::SourceTier::Demo
            ]
        );
        assert_eq!(dashboard.tier_timeout(), Duration::from_millis(250));
        assert_eq!(
            dashboard.tier_budgets(),
            vec![
                (crate::SourceTier::Primary, Duration::from_millis(250)),
                (crate::SourceTier::AiSearch, DEFAULT_AI_TIER_TIMEOUT),
                (crate::SourceTier::Demo, Duration::from_millis(250)),
            ]
        );
        assert!(!dashboard.narrative_configured());
    }
}
