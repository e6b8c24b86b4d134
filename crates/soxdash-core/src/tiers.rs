//! The three built-in price tiers.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::adapters::demo::{demo_constituents, demo_quotes};
use crate::adapters::gemini::{parse_json_payload, GeminiClient};
use crate::aggregator::QuoteAggregator;
use crate::data_source::{SourceError, SourceFuture};
use crate::fallback::{PriceTier, TierOutput};
use crate::{RawQuote, Slot, SlotMap, SourceTier};

/// Tier 1: the quotes provider through the concurrent aggregator.
pub struct PrimaryTier {
    aggregator: QuoteAggregator,
}

impl PrimaryTier {
    pub fn new(aggregator: QuoteAggregator) -> Self {
        Self { aggregator }
    }
}

impl PriceTier for PrimaryTier {
    fn tier(&self) -> SourceTier {
        SourceTier::Primary
    }

    fn attempt<'a>(&'a self) -> SourceFuture<'a, TierOutput> {
        Box::pin(async move {
            let (quotes, constituents) = tokio::join!(
                self.aggregator.fetch_all(),
                self.aggregator.fetch_constituents()
            );
            let aggregate = quotes?;
            let mut warnings = aggregate.warnings;

            let constituents = match constituents {
                Ok(cells) => Some(cells),
                Err(error) => {
                    tracing::warn!(code = error.code(), "constituent batch failed");
                    warnings.push(format!("constituents: {}", error.message()));
                    None
                }
            };

            Ok(TierOutput {
                quotes: aggregate.quotes,
                constituents,
                warnings,
            })
        })
    }
}

/// Tier 2: asks the AI model, grounded on web search, for the eight quotes.
pub struct AiSearchTier {
    gemini: Arc<GeminiClient>,
    timeout: Option<Duration>,
}

impl AiSearchTier {
    pub fn new(gemini: Arc<GeminiClient>) -> Self {
        Self {
            gemini,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl PriceTier for AiSearchTier {
    fn tier(&self) -> SourceTier {
        SourceTier::AiSearch
    }

    fn attempt<'a>(&'a self) -> SourceFuture<'a, TierOutput> {
        Box::pin(async move {
            let response = self.gemini.generate(&price_prompt(), true).await?;
            let payload: Value = parse_json_payload(&response.text)?;
            let quotes = decode_price_payload(&payload)?;

            let mut warnings = Vec::new();
            for (slot, quote) in quotes.iter() {
                if quote.is_none() {
                    warnings.push(format!("{}: missing from AI search answer", slot.ticker()));
                }
            }

            Ok(TierOutput {
                quotes,
                constituents: None,
                warnings,
            })
        })
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Tier 3: bundled data. Never fails.
#[derive(Debug, Default)]
pub struct DemoTier;

impl PriceTier for DemoTier {
    fn tier(&self) -> SourceTier {
        SourceTier::Demo
    }

    fn attempt<'a>(&'a self) -> SourceFuture<'a, TierOutput> {
        Box::pin(async move {
            Ok(TierOutput {
                quotes: demo_quotes().map(|_, quote| Some(quote)),
                constituents: Some(demo_constituents()),
                warnings: Vec::new(),
            })
        })
    }
}

fn price_prompt() -> String {
    let listing = Slot::ALL
        .iter()
        .map(|slot| format!("  \"{}\": {} ({})", slot.key(), slot.ticker(), slot.display_name()))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Look up the latest market quotes for these instruments:\n{listing}\n\n\
         Return JSON only (no markdown), one object keyed exactly by the names above:\n\
         {{ \"soxl\": {{ \"price\": number, \"change\": number, \"changePercent\": number }}, ... }}\n\
         Use null for any value you cannot find. Give the 10-year yield in percent."
    )
}

/// Accepts entries keyed by slot name or by ticker. An answer where no slot
/// carries a number is treated as malformed.
fn decode_price_payload(payload: &Value) -> Result<SlotMap<Option<RawQuote>>, SourceError> {
    let Some(map) = payload.as_object() else {
        return Err(SourceError::malformed("AI price answer is not a JSON object"));
    };

    let quotes = SlotMap::from_fn(|slot| {
        map.get(slot.key())
            .or_else(|| map.get(slot.ticker()))
            .and_then(RawQuote::decode)
            .filter(|quote| !quote.is_blank())
    });

    if quotes.iter().all(|(_, quote)| quote.is_none()) {
        return Err(SourceError::malformed("AI price answer contained no quotes"));
    }
    Ok(quotes)
}
