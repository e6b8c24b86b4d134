use std::sync::Arc;

use tokio::task::JoinSet;

use crate::data_source::{QuoteSource, SourceError};
use crate::normalizer::normalize_constituent;
use crate::{heatmap_symbols, ConstituentTicker, RawQuote, Slot, SlotMap, HEATMAP_CONSTITUENTS};

/// Per-slot results of one concurrent fetch. `None` marks a slot whose
/// fetch failed; the reason is in `warnings`.
#[derive(Debug, Clone, Default)]
pub struct AggregateResult {
    pub quotes: SlotMap<Option<RawQuote>>,
    pub warnings: Vec<String>,
}

impl AggregateResult {
    pub fn populated(&self) -> usize {
        self.quotes.iter().filter(|(_, quote)| quote.is_some()).count()
    }
}

/// Fans the eight slot fetches out over one quote source.
#[derive(Clone)]
pub struct QuoteAggregator {
    source: Arc<dyn QuoteSource>,
}

impl QuoteAggregator {
    pub fn new(source: Arc<dyn QuoteSource>) -> Self {
        Self { source }
    }

    /// Fetches every slot concurrently. One failing symbol only blanks its
    /// own slot; the call fails only when nothing came back at all.
    pub async fn fetch_all(&self) -> Result<AggregateResult, SourceError> {
        let mut tasks = JoinSet::new();
        for slot in Slot::ALL {
            let source = Arc::clone(&self.source);
            tasks.spawn(async move {
                let symbol = slot.symbol();
                let result = source.quote(&symbol).await;
                (slot, result)
            });
        }

        let mut result = AggregateResult::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, Ok(raw))) => {
                    *result.quotes.get_mut(slot) = Some(raw);
                }
                Ok((slot, Err(error))) => {
                    tracing::warn!(
                        source = self.source.name(),
                        symbol = slot.ticker(),
                        code = error.code(),
                        "symbol fetch failed"
                    );
                    result
                        .warnings
                        .push(format!("{}: {}", slot.ticker(), error.message()));
                }
                Err(join_error) => {
                    tracing::error!(error = %join_error, "symbol fetch task aborted");
                    result
                        .warnings
                        .push(format!("symbol fetch task aborted: {join_error}"));
                }
            }
        }

        if result.populated() == 0 {
            return Err(SourceError::unavailable(format!(
                "all {} symbol fetches failed via {}",
                Slot::ALL.len(),
                self.source.name()
            )));
        }

        Ok(result)
    }

    /// Heatmap cells from a single batched call. Any failure loses the whole
    /// list; symbols the provider omitted come back zeroed.
    pub async fn fetch_constituents(&self) -> Result<Vec<ConstituentTicker>, SourceError> {
        let symbols = heatmap_symbols();
        let entries = self.source.quote_batch(&symbols).await?;
        if entries.is_empty() {
            return Err(SourceError::malformed(
                "constituent batch returned no entries",
            ));
        }

        let empty = RawQuote::empty();
        Ok(symbols
            .into_iter()
            .zip(HEATMAP_CONSTITUENTS)
            .map(|(symbol, (_, weight))| {
                let raw = entries
                    .iter()
                    .find(|entry| {
                        entry
                            .symbol
                            .as_deref()
                            .is_some_and(|s| s.eq_ignore_ascii_case(symbol.as_str()))
                    })
                    .unwrap_or(&empty);
                normalize_constituent(raw, symbol, weight)
            })
            .collect())
    }
}
