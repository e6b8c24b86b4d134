//! Raw upstream records to canonical instruments.

use crate::indicators::{compute_rsi, mock_history, DEFAULT_HISTORY_POINTS, NEUTRAL_RSI, RSI_PERIOD};
use crate::{
    ConstituentTicker, HistoryKind, Instrument, RawQuote, Slot, SourceTier, Symbol, Trend,
};

/// Above this the provider is quoting the 10Y yield in tenths of a percent.
const TNX_SCALE_THRESHOLD: f64 = 20.0;

/// Treasury yield correction: `41.5` becomes `4.15`, `4.02` is left alone.
pub fn normalize_tnx(value: Option<f64>) -> Option<f64> {
    value.map(|v| if v > TNX_SCALE_THRESHOLD { v / 10.0 } else { v })
}

/// Builds the canonical instrument for `slot` from whatever the tier returned.
///
/// A missing record behaves like one with every field null. `rng` only feeds
/// the synthetic history used when the provider sent no closes.
pub fn normalize(
    raw: Option<&RawQuote>,
    slot: Slot,
    tier: SourceTier,
    rng: &mut fastrand::Rng,
) -> Instrument {
    let empty = RawQuote::empty();
    let raw = raw.unwrap_or(&empty);

    let price = if slot == Slot::Tnx {
        normalize_tnx(raw.price.value())
    } else {
        raw.price.value()
    }
    .unwrap_or(0.0);
    let change = raw.change.or_zero();
    let change_percent = raw.change_percent.or_zero();

    let (pre_market_price, pre_market_change_percent) = if slot.carries_pre_market() {
        (
            raw.pre_market_price.value(),
            raw.pre_market_change_percent.value(),
        )
    } else {
        (None, None)
    };

    let (history, history_kind, rsi) = if raw.history.is_empty() {
        (
            mock_history(price, change_percent, DEFAULT_HISTORY_POINTS, rng),
            HistoryKind::Synthetic,
            NEUTRAL_RSI,
        )
    } else {
        let closes = if slot == Slot::Tnx {
            raw.history
                .iter()
                .filter_map(|close| normalize_tnx(Some(*close)))
                .collect()
        } else {
            raw.history.clone()
        };
        let rsi = compute_rsi(&closes, RSI_PERIOD);
        (closes, HistoryKind::Provider, rsi)
    };

    Instrument {
        symbol: slot.symbol(),
        name: slot.display_name().to_owned(),
        price,
        change,
        change_percent,
        trend: Trend::from_change(change),
        pre_market_price,
        pre_market_change_percent,
        rsi,
        history,
        history_kind,
        source: tier,
        stale: false,
    }
}

/// Heatmap cell from a batch quote entry. Live cells never carry `FLAT`.
pub fn normalize_constituent(raw: &RawQuote, symbol: Symbol, weight: u32) -> ConstituentTicker {
    let change_percent = raw.change_percent.or_zero();
    ConstituentTicker {
        symbol,
        price: raw.price.or_zero(),
        change_percent,
        weight,
        trend: Trend::from_change(change_percent),
        history: (!raw.history.is_empty()).then(|| raw.history.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rng() -> fastrand::Rng {
        fastrand::Rng::with_seed(11)
    }

    #[test]
    fn tnx_scaling_is_applied_to_price_only() {
        let raw = RawQuote::priced(41.5, 0.4, 1.0);
        let instrument = normalize(Some(&raw), Slot::Tnx, SourceTier::Primary, &mut rng());
        assert!((instrument.price - 4.15).abs() < 1e-12);
        assert_eq!(instrument.change, 0.4);

        let untouched = normalize(Some(&raw), Slot::Ndx, SourceTier::Primary, &mut rng());
        assert_eq!(untouched.price, 41.5);
    }

    #[test]
    fn pre_market_is_dropped_outside_the_etf_slot() {
        let raw = RawQuote::priced(53.95, 4.3, 8.66).with_pre_market(53.8, -0.28);

        let soxl = normalize(Some(&raw), Slot::Soxl, SourceTier::Primary, &mut rng());
        assert_eq!(soxl.pre_market_price, Some(53.8));
        assert_eq!(soxl.pre_market_change_percent, Some(-0.28));

        let sox = normalize(Some(&raw), Slot::Sox, SourceTier::Primary, &mut rng());
        assert_eq!(sox.pre_market_price, None);
        assert_eq!(sox.pre_market_change_percent, None);
    }

    #[test]
    fn provider_closes_drive_rsi_and_history() {
        let closes = (0..20).map(|i| 100.0 + i as f64).collect::<Vec<_>>();
        let raw = RawQuote::priced(119.0, 1.0, 0.85).with_history(closes.clone());

        let instrument = normalize(Some(&raw), Slot::Ndx, SourceTier::Primary, &mut rng());
        assert_eq!(instrument.history, closes);
        assert_eq!(instrument.history_kind, HistoryKind::Provider);
        assert_eq!(instrument.rsi, 100.0);
    }

    #[test]
    fn synthetic_history_keeps_rsi_neutral() {
        let raw = RawQuote::priced(5420.8, 45.4, 0.84);
        let instrument = normalize(Some(&raw), Slot::Sox, SourceTier::AiSearch, &mut rng());
        assert_eq!(instrument.history.len(), DEFAULT_HISTORY_POINTS + 1);
        assert_eq!(instrument.history_kind, HistoryKind::Synthetic);
        assert_eq!(instrument.rsi, NEUTRAL_RSI);
        assert_eq!(instrument.source, SourceTier::AiSearch);
    }

    #[test]
    fn constituent_trend_follows_change_percent() {
        let raw = RawQuote::priced(23.05, -0.18, -0.8);
        let cell = normalize_constituent(&raw, Symbol::from_trusted("INTC"), 5);
        assert_eq!(cell.trend, Trend::Down);
        assert_eq!(cell.weight, 5);
        assert_eq!(cell.history, None);
    }
}
