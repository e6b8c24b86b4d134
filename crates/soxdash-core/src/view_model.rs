//! Pure projection of a snapshot into display strings.

use serde::Serialize;

use crate::dashboard::DashboardSnapshot;
use crate::{HistoryKind, Instrument, NarrativeBundle, Slot, Trend};

pub const INITIALIZING_LABEL: &str = "Initializing...";
const MISSING: &str = "-";
const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiZone {
    Oversold,
    Neutral,
    Overbought,
}

impl RsiZone {
    pub fn from_value(rsi: f64) -> Self {
        if rsi >= 70.0 {
            Self::Overbought
        } else if rsi <= 30.0 {
            Self::Oversold
        } else {
            Self::Neutral
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Oversold => "Oversold",
            Self::Neutral => "Neutral",
            Self::Overbought => "Overbought",
        }
    }
}

pub const fn trend_color(trend: Trend) -> &'static str {
    match trend {
        Trend::Up => "green",
        Trend::Down => "red",
        Trend::Flat => "gray",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub header: HeaderView,
    pub instruments: Vec<InstrumentCard>,
    pub heatmap: Vec<HeatmapCell>,
    pub narrative: NarrativeBundle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderView {
    pub source: String,
    pub last_updated: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory: Option<String>,
    pub sequence: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentCard {
    pub slot: Slot,
    pub ticker: String,
    pub name: String,
    pub price: String,
    pub change: String,
    pub change_percent: String,
    pub trend: Trend,
    pub color: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_market: Option<String>,
    pub rsi: String,
    pub rsi_zone: RsiZone,
    pub sparkline: String,
    pub history_synthetic: bool,
    pub source: String,
    pub stale: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeatmapCell {
    pub ticker: String,
    pub price: String,
    pub change_percent: String,
    pub weight: String,
    pub color: &'static str,
}

pub fn assemble(snapshot: &DashboardSnapshot) -> ViewModel {
    let header = HeaderView {
        source: snapshot
            .source
            .map_or_else(|| String::from("loading"), |tier| tier.label().to_owned()),
        last_updated: snapshot
            .last_updated
            .map_or_else(|| INITIALIZING_LABEL.to_owned(), |at| at.format_rfc3339()),
        advisory: snapshot.advisory.clone(),
        sequence: snapshot.sequence,
    };

    let instruments = snapshot
        .instruments
        .iter()
        .map(|(slot, instrument)| instrument_card(slot, instrument))
        .collect();

    let heatmap = snapshot
        .constituents
        .iter()
        .map(|cell| HeatmapCell {
            ticker: cell.symbol.display_ticker().to_owned(),
            price: format_price(cell.price),
            change_percent: format_percent(cell.change_percent),
            weight: format!("{}%", cell.weight),
            color: trend_color(if cell.change_percent >= 0.0 {
                Trend::Up
            } else {
                Trend::Down
            }),
        })
        .collect();

    ViewModel {
        header,
        instruments,
        heatmap,
        narrative: snapshot.narrative.clone(),
    }
}

fn instrument_card(slot: Slot, instrument: &Instrument) -> InstrumentCard {
    let price = if slot == Slot::Tnx && instrument.price.is_finite() {
        format!("{:.2}%", instrument.price)
    } else {
        format_price(instrument.price)
    };

    let pre_market = instrument.pre_market_price.map(|pre_price| {
        match instrument.pre_market_change_percent {
            Some(pct) => format!("{} ({})", format_price(pre_price), format_percent(pct)),
            None => format_price(pre_price),
        }
    });

    InstrumentCard {
        slot,
        ticker: instrument.symbol.display_ticker().to_owned(),
        name: instrument.name.clone(),
        price,
        change: format_signed(instrument.change),
        change_percent: format_percent(instrument.change_percent),
        trend: instrument.trend,
        color: trend_color(instrument.trend),
        pre_market,
        rsi: if instrument.rsi.is_finite() {
            format!("{:.0}", instrument.rsi)
        } else {
            MISSING.to_owned()
        },
        rsi_zone: RsiZone::from_value(instrument.rsi),
        sparkline: sparkline(&instrument.history),
        history_synthetic: instrument.history_kind == HistoryKind::Synthetic,
        source: instrument.source.label().to_owned(),
        stale: instrument.stale,
    }
}

/// Two decimals with thousands separators; `-` for NaN or infinity.
pub fn format_price(value: f64) -> String {
    if !value.is_finite() {
        return MISSING.to_owned();
    }
    let fixed = format!("{:.2}", value.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}

/// Explicit sign, two decimals.
pub fn format_signed(value: f64) -> String {
    if !value.is_finite() {
        return MISSING.to_owned();
    }
    if value >= 0.0 {
        format!("+{value:.2}")
    } else {
        format!("{value:.2}")
    }
}

pub fn format_percent(value: f64) -> String {
    if !value.is_finite() {
        return MISSING.to_owned();
    }
    format!("{}%", format_signed(value))
}

/// Eight-level block sparkline over the finite points of `history`.
pub fn sparkline(history: &[f64]) -> String {
    let points = history
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .collect::<Vec<_>>();
    let Some(min) = points.iter().copied().reduce(f64::min) else {
        return String::new();
    };
    let max = points.iter().copied().fold(min, f64::max);
    let span = max - min;

    points
        .iter()
        .map(|value| {
            if span <= 0.0 {
                return SPARK_LEVELS[SPARK_LEVELS.len() / 2];
            }
            let scaled = ((value - min) / span * (SPARK_LEVELS.len() - 1) as f64).round();
            SPARK_LEVELS[(scaled as usize).min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}
