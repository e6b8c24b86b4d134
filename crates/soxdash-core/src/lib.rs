//! # soxdash core
//!
//! Data acquisition and normalization for a semiconductor market dashboard:
//! eight fixed instruments, a constituent heatmap and an AI narrative.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Yahoo quotes, Gemini and bundled demo data |
//! | [`aggregator`] | Concurrent per-slot fetch with failure isolation |
//! | [`cache`] | Fresh/stale response cache |
//! | [`config`] | Environment settings and the dashboard builder |
//! | [`dashboard`] | Snapshot store with latest-wins publishing |
//! | [`data_source`] | Quote source trait and structured source errors |
//! | [`fallback`] | Ordered price tiers, first success wins |
//! | [`indicators`] | RSI and synthetic history |
//! | [`narrative`] | AI weekly focus, calendar and news |
//! | [`normalizer`] | Raw quote records to canonical instruments |
//! | [`view_model`] | Display-safe projection of a snapshot |
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   refresh   ┌─────────────────────┐
//! │  Dashboard   │────────────▶│ FallbackController  │
//! └──────┬───────┘             └──────────┬──────────┘
//!        │ watch                          │ primary → AI search → demo
//!        ▼                                ▼
//! ┌──────────────┐             ┌─────────────────────┐
//! │  ViewModel   │             │ QuoteAggregator     │──▶ HttpClient
//! └──────────────┘             └─────────────────────┘
//! ```

pub mod adapters;
pub mod aggregator;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod fallback;
pub mod http_client;
pub mod indicators;
pub mod narrative;
pub mod normalizer;
pub mod source;
pub mod throttling;
pub mod tiers;
pub mod view_model;

pub use adapters::{GeminiClient, GeminiResponse, YahooAdapter, YahooAuthManager, DEFAULT_GEMINI_MODEL};
pub use aggregator::{AggregateResult, QuoteAggregator};
pub use cache::{CacheLookup, QuoteCache};
pub use config::{DashboardBuilder, DashboardConfig};
pub use dashboard::{BusyState, Dashboard, DashboardError, DashboardSnapshot, RefreshOutcome, DEMO_ADVISORY};
pub use data_source::{QuoteSource, SourceError, SourceErrorKind, SourceFuture};
pub use domain::{
    heatmap_symbols, ConstituentTicker, DailySchedule, EarningsEvent, EarningsTime, FocusNote,
    HistoryKind, Instrument, InstrumentSet, LooseNumber, NarrativeBundle, NewsCategory, NewsItem,
    RawQuote, Sentiment, Slot, SlotMap, Symbol, Trend, UtcDateTime, WeeklyFocus,
    HEATMAP_CONSTITUENTS,
};
pub use error::ValidationError;
pub use fallback::{
    FallbackController, FallbackFailure, FallbackResult, PriceTier, TierError, TierOutput,
    TierSuccess, DEFAULT_AI_TIER_TIMEOUT, DEFAULT_TIER_TIMEOUT,
};
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, NoopHttpClient,
    ReqwestHttpClient,
};
pub use indicators::{compute_rsi, mock_history, DEFAULT_HISTORY_POINTS, NEUTRAL_RSI, RSI_PERIOD};
pub use narrative::{attach_citation, NarrativeError, NarrativeService};
pub use normalizer::{normalize, normalize_constituent, normalize_tnx};
pub use source::SourceTier;
pub use throttling::ThrottlingQueue;
pub use tiers::{AiSearchTier, DemoTier, PrimaryTier};
pub use view_model::{assemble, format_percent, format_price, format_signed, RsiZone, ViewModel};
