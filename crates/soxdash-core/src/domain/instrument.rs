use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{SourceTier, Symbol, ValidationError};

/// One of the eight fixed dashboard positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Soxl,
    Sox,
    Ndx,
    Tnx,
    Krw,
    Vix,
    Btc,
    Kospi,
}

impl Slot {
    pub const ALL: [Self; 8] = [
        Self::Soxl,
        Self::Sox,
        Self::Ndx,
        Self::Tnx,
        Self::Krw,
        Self::Vix,
        Self::Btc,
        Self::Kospi,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::Soxl => "soxl",
            Self::Sox => "sox",
            Self::Ndx => "ndx",
            Self::Tnx => "tnx",
            Self::Krw => "krw",
            Self::Vix => "vix",
            Self::Btc => "btc",
            Self::Kospi => "kospi",
        }
    }

    /// Provider ticker for this slot.
    pub const fn ticker(self) -> &'static str {
        match self {
            Self::Soxl => "SOXL",
            Self::Sox => "^SOX",
            Self::Ndx => "^NDX",
            Self::Tnx => "^TNX",
            Self::Krw => "KRW=X",
            Self::Vix => "^VIX",
            Self::Btc => "BTC-USD",
            Self::Kospi => "^KS11",
        }
    }

    pub fn symbol(self) -> Symbol {
        Symbol::from_trusted(self.ticker())
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Soxl => "Direxion Daily Semiconductor Bull 3X",
            Self::Sox => "PHLX Semiconductor Index",
            Self::Ndx => "Nasdaq 100",
            Self::Tnx => "US 10Y Treasury Yield",
            Self::Krw => "USD/KRW",
            Self::Vix => "CBOE Volatility Index",
            Self::Btc => "Bitcoin",
            Self::Kospi => "KOSPI",
        }
    }

    /// Only the leveraged ETF trades in the pre-market session we show.
    pub const fn carries_pre_market(self) -> bool {
        matches!(self, Self::Soxl)
    }

    pub fn from_ticker(ticker: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|slot| slot.ticker().eq_ignore_ascii_case(ticker.trim()))
    }
}

impl Display for Slot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Slot {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|slot| slot.key() == normalized)
            .ok_or(ValidationError::InvalidSlot { value: normalized })
    }
}

/// Closed mapping from every [`Slot`] to a value. No slot can be missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SlotMap<T> {
    pub soxl: T,
    pub sox: T,
    pub ndx: T,
    pub tnx: T,
    pub krw: T,
    pub vix: T,
    pub btc: T,
    pub kospi: T,
}

impl<T> SlotMap<T> {
    pub fn from_fn(mut f: impl FnMut(Slot) -> T) -> Self {
        Self {
            soxl: f(Slot::Soxl),
            sox: f(Slot::Sox),
            ndx: f(Slot::Ndx),
            tnx: f(Slot::Tnx),
            krw: f(Slot::Krw),
            vix: f(Slot::Vix),
            btc: f(Slot::Btc),
            kospi: f(Slot::Kospi),
        }
    }

    pub fn get(&self, slot: Slot) -> &T {
        match slot {
            Slot::Soxl => &self.soxl,
            Slot::Sox => &self.sox,
            Slot::Ndx => &self.ndx,
            Slot::Tnx => &self.tnx,
            Slot::Krw => &self.krw,
            Slot::Vix => &self.vix,
            Slot::Btc => &self.btc,
            Slot::Kospi => &self.kospi,
        }
    }

    pub fn get_mut(&mut self, slot: Slot) -> &mut T {
        match slot {
            Slot::Soxl => &mut self.soxl,
            Slot::Sox => &mut self.sox,
            Slot::Ndx => &mut self.ndx,
            Slot::Tnx => &mut self.tnx,
            Slot::Krw => &mut self.krw,
            Slot::Vix => &mut self.vix,
            Slot::Btc => &mut self.btc,
            Slot::Kospi => &mut self.kospi,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, &T)> + '_ {
        Slot::ALL.into_iter().map(move |slot| (slot, self.get(slot)))
    }

    pub fn map<U>(self, mut f: impl FnMut(Slot, T) -> U) -> SlotMap<U> {
        SlotMap {
            soxl: f(Slot::Soxl, self.soxl),
            sox: f(Slot::Sox, self.sox),
            ndx: f(Slot::Ndx, self.ndx),
            tnx: f(Slot::Tnx, self.tnx),
            krw: f(Slot::Krw, self.krw),
            vix: f(Slot::Vix, self.vix),
            btc: f(Slot::Btc, self.btc),
            kospi: f(Slot::Kospi, self.kospi),
        }
    }
}

/// Direction of the last move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Up,
    Down,
    /// Only used by hand-authored demo and heatmap data.
    Flat,
}

impl Trend {
    /// Zero change counts as up.
    pub fn from_change(change: f64) -> Self {
        if change >= 0.0 {
            Self::Up
        } else {
            Self::Down
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Flat => "FLAT",
        }
    }
}

/// Where an instrument's history came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKind {
    Provider,
    Synthetic,
}

/// Canonical, display-safe quote for one slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: Symbol,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub trend: Trend,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_market_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_market_change_percent: Option<f64>,
    pub rsi: f64,
    pub history: Vec<f64>,
    pub history_kind: HistoryKind,
    pub source: SourceTier,
    /// Carried over from an earlier snapshot because this refresh had no value.
    #[serde(default)]
    pub stale: bool,
}

pub type InstrumentSet = SlotMap<Instrument>;

/// One cell of the constituent heatmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstituentTicker {
    pub symbol: Symbol,
    pub price: f64,
    pub change_percent: f64,
    /// Display weight in the sector index, percent.
    pub weight: u32,
    pub trend: Trend,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<f64>>,
}

/// Heatmap tickers and their display weights.
pub const HEATMAP_CONSTITUENTS: [(&str, u32); 8] = [
    ("NVDA", 15),
    ("AVGO", 10),
    ("AMD", 8),
    ("TSM", 8),
    ("QCOM", 6),
    ("INTC", 5),
    ("MU", 4),
    ("AMAT", 4),
];

pub fn heatmap_symbols() -> Vec<Symbol> {
    HEATMAP_CONSTITUENTS
        .iter()
        .map(|(ticker, _)| Symbol::from_trusted(ticker))
        .collect()
}
