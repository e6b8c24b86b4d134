//! Snapshot store: runs refreshes and publishes immutable snapshots.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

use crate::adapters::demo::{demo_constituents, demo_narrative, demo_quotes};
use crate::fallback::{FallbackController, TierError, TierSuccess};
use crate::narrative::{NarrativeError, NarrativeService};
use crate::normalizer::normalize;
use crate::{
    ConstituentTicker, InstrumentSet, NarrativeBundle, SlotMap, SourceTier, UtcDateTime,
};

pub const DEMO_ADVISORY: &str = "live data unavailable; showing demo data";

/// Everything the dashboard shows at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    /// Id of the price refresh that produced this snapshot; 0 before the first one.
    pub sequence: u64,
    pub narrative_sequence: u64,
    pub instruments: InstrumentSet,
    pub constituents: Vec<ConstituentTicker>,
    pub narrative: NarrativeBundle,
    pub last_updated: Option<UtcDateTime>,
    pub source: Option<SourceTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory: Option<String>,
    pub tier_chain: Vec<SourceTier>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl DashboardSnapshot {
    /// Demo content shown before the first refresh completes. It carries no
    /// source and no timestamp.
    pub fn initial(rng: &mut fastrand::Rng) -> Self {
        let instruments = demo_quotes().map(|slot, raw| normalize(Some(&raw), slot, SourceTier::Demo, rng));
        Self {
            sequence: 0,
            narrative_sequence: 0,
            instruments,
            constituents: demo_constituents(),
            narrative: demo_narrative(),
            last_updated: None,
            source: None,
            advisory: None,
            tier_chain: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Builds the next snapshot from a tier result, filling gaps from `self`.
    ///
    /// A missing slot reuses the previous instrument (marked stale) only when
    /// that instrument came from a live tier; otherwise it is zeroed.
    fn merged(&self, sequence: u64, success: &TierSuccess, rng: &mut fastrand::Rng) -> Self {
        let tier = success.selected;
        let instruments = SlotMap::from_fn(|slot| match success.output.quotes.get(slot) {
            Some(raw) => normalize(Some(raw), slot, tier, rng),
            None => {
                let previous = self.instruments.get(slot);
                if self.source.is_some() && previous.source.is_live() {
                    let mut carried = previous.clone();
                    carried.stale = true;
                    carried
                } else {
                    normalize(None, slot, tier, rng)
                }
            }
        });

        let mut warnings = success.warnings.clone();
        warnings.extend(success.output.warnings.iter().cloned());

        Self {
            sequence,
            narrative_sequence: self.narrative_sequence,
            instruments,
            constituents: success
                .output
                .constituents
                .clone()
                .unwrap_or_else(|| self.constituents.clone()),
            narrative: self.narrative.clone(),
            last_updated: Some(UtcDateTime::now()),
            source: Some(tier),
            advisory: (tier == SourceTier::Demo).then(|| DEMO_ADVISORY.to_owned()),
            tier_chain: success.tier_chain.clone(),
            warnings,
        }
    }
}

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("all price tiers failed: {0}")]
    TiersExhausted(String),
    #[error(transparent)]
    Narrative(#[from] NarrativeError),
}

/// Result of one price refresh.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub sequence: u64,
    /// False when a newer refresh had already published.
    pub published: bool,
    pub selected: SourceTier,
    pub errors: Vec<TierError>,
    pub latency_ms: u64,
    pub snapshot: Arc<DashboardSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BusyState {
    pub prices: bool,
    pub narrative: bool,
}

/// Single writer, many readers. Readers hold `watch::Receiver`s and always
/// see a complete snapshot.
pub struct Dashboard {
    controller: FallbackController,
    narrative: Option<NarrativeService>,
    sender: watch::Sender<Arc<DashboardSnapshot>>,
    price_sequence: AtomicU64,
    narrative_sequence: AtomicU64,
    prices_in_flight: AtomicUsize,
    narrative_in_flight: AtomicUsize,
    rng_seed: Option<u64>,
}

impl Dashboard {
    pub fn new(
        controller: FallbackController,
        narrative: Option<NarrativeService>,
        rng_seed: Option<u64>,
    ) -> Self {
        let mut rng = seeded_rng(rng_seed, 0);
        let (sender, _) = watch::channel(Arc::new(DashboardSnapshot::initial(&mut rng)));
        Self {
            controller,
            narrative,
            sender,
            price_sequence: AtomicU64::new(0),
            narrative_sequence: AtomicU64::new(0),
            prices_in_flight: AtomicUsize::new(0),
            narrative_in_flight: AtomicUsize::new(0),
            rng_seed,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<DashboardSnapshot>> {
        self.sender.subscribe()
    }

    pub fn snapshot(&self) -> Arc<DashboardSnapshot> {
        self.sender.borrow().clone()
    }

    pub fn tiers(&self) -> Vec<SourceTier> {
        self.controller.tiers()
    }

    pub fn tier_timeout(&self) -> std::time::Duration {
        self.controller.tier_timeout()
    }

    pub fn tier_budgets(&self) -> Vec<(SourceTier, std::time::Duration)> {
        self.controller.budgets()
    }

    pub fn narrative_configured(&self) -> bool {
        self.narrative
            .as_ref()
            .is_some_and(NarrativeService::is_configured)
    }

    /// A flag stays up while any refresh of that kind is still running.
    pub fn is_busy(&self) -> BusyState {
        BusyState {
            prices: self.prices_in_flight.load(Ordering::SeqCst) > 0,
            narrative: self.narrative_in_flight.load(Ordering::SeqCst) > 0,
        }
    }

    /// Runs the tier chain and publishes the result unless a refresh that
    /// started later has already published.
    pub async fn refresh_prices(&self) -> Result<RefreshOutcome, DashboardError> {
        let sequence = self.price_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let _busy = BusyGuard::enter(&self.prices_in_flight);
        tracing::debug!(sequence, "price refresh started");

        let success = self
            .controller
            .run()
            .await
            .map_err(|failure| DashboardError::TiersExhausted(failure.summary()))?;

        let mut rng = seeded_rng(self.rng_seed, sequence);
        let published = self.sender.send_if_modified(|current| {
            if current.sequence >= sequence {
                return false;
            }
            *current = Arc::new(current.merged(sequence, &success, &mut rng));
            true
        });

        if published {
            tracing::info!(
                sequence,
                tier = success.selected.as_str(),
                latency_ms = success.latency_ms,
                "snapshot published"
            );
        } else {
            tracing::info!(sequence, "discarding result of superseded refresh");
        }

        Ok(RefreshOutcome {
            sequence,
            published,
            selected: success.selected,
            errors: success.errors,
            latency_ms: success.latency_ms,
            snapshot: self.snapshot(),
        })
    }

    /// Replaces only the narrative. Prices are untouched on success and
    /// everything is untouched on failure.
    pub async fn refresh_narrative(&self) -> Result<Arc<DashboardSnapshot>, DashboardError> {
        let Some(service) = self.narrative.as_ref() else {
            return Err(NarrativeError::NotConfigured(String::from(
                "no AI narrative service registered",
            ))
            .into());
        };

        let sequence = self.narrative_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let _busy = BusyGuard::enter(&self.narrative_in_flight);

        let bundle = service.fetch().await?;
        let published = self.sender.send_if_modified(|current| {
            if current.narrative_sequence >= sequence {
                return false;
            }
            let mut next = DashboardSnapshot::clone(current);
            next.narrative = bundle;
            next.narrative_sequence = sequence;
            *current = Arc::new(next);
            true
        });
        if !published {
            tracing::info!(sequence, "discarding superseded narrative");
        }

        Ok(self.snapshot())
    }
}

fn seeded_rng(seed: Option<u64>, sequence: u64) -> fastrand::Rng {
    match seed {
        Some(seed) => fastrand::Rng::with_seed(seed.wrapping_add(sequence)),
        None => fastrand::Rng::new(),
    }
}

/// Counts one running refresh; the count drops again on any exit path.
struct BusyGuard<'a>(&'a AtomicUsize);

impl<'a> BusyGuard<'a> {
    fn enter(in_flight: &'a AtomicUsize) -> Self {
        in_flight.fetch_add(1, Ordering::SeqCst);
        Self(in_flight)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::TierOutput;
    use crate::{RawQuote, Slot};

    fn success(tier: SourceTier, quotes: SlotMap<Option<RawQuote>>) -> TierSuccess {
        TierSuccess {
            output: TierOutput {
                quotes,
                constituents: None,
                warnings: Vec::new(),
            },
            selected: tier,
            tier_chain: vec![tier],
            errors: Vec::new(),
            warnings: Vec::new(),
            latency_ms: 1,
        }
    }

    #[test]
    fn initial_snapshot_has_no_source_or_timestamp() {
        let snapshot = DashboardSnapshot::initial(&mut fastrand::Rng::with_seed(1));
        assert_eq!(snapshot.source, None);
        assert_eq!(snapshot.last_updated, None);
        assert_eq!(snapshot.sequence, 0);
        assert_eq!(snapshot.constituents.len(), 8);
    }

    #[test]
    fn missing_slot_is_zeroed_when_previous_was_not_live() {
        let mut rng = fastrand::Rng::with_seed(1);
        let initial = DashboardSnapshot::initial(&mut rng);
        let quotes = SlotMap::from_fn(|slot| (slot != Slot::Btc).then(|| RawQuote::priced(10.0, 1.0, 10.0)));

        let next = initial.merged(1, &success(SourceTier::Primary, quotes), &mut rng);
        let btc = next.instruments.get(Slot::Btc);
        assert_eq!((btc.price, btc.change, btc.change_percent), (0.0, 0.0, 0.0));
        assert!(!btc.stale);
        assert_eq!(next.constituents, initial.constituents);
        assert_eq!(next.advisory, None);
    }

    #[test]
    fn missing_slot_carries_previous_live_value_as_stale() {
        let mut rng = fastrand::Rng::with_seed(1);
        let initial = DashboardSnapshot::initial(&mut rng);
        let first = initial.merged(
            1,
            &success(SourceTier::Primary, SlotMap::from_fn(|_| Some(RawQuote::priced(10.0, 1.0, 10.0)))),
            &mut rng,
        );
        let quotes = SlotMap::from_fn(|slot| (slot != Slot::Vix).then(|| RawQuote::priced(11.0, 1.0, 10.0)));
        let second = first.merged(2, &success(SourceTier::AiSearch, quotes), &mut rng);

        let vix = second.instruments.get(Slot::Vix);
        assert_eq!(vix.price, 10.0);
        assert!(vix.stale);
        assert_eq!(vix.source, SourceTier::Primary);
        assert_eq!(second.instruments.get(Slot::Soxl).price, 11.0);
    }

    #[test]
    fn busy_guard_counts_nested_refreshes() {
        let in_flight = AtomicUsize::new(0);
        {
            let _outer = BusyGuard::enter(&in_flight);
            {
                let _inner = BusyGuard::enter(&in_flight);
                assert_eq!(in_flight.load(Ordering::SeqCst), 2);
            }
            assert_eq!(in_flight.load(Ordering::SeqCst), 1);
        }
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }
}
