mod instrument;
mod narrative;
mod raw_quote;
mod symbol;
mod timestamp;

pub use instrument::{
    heatmap_symbols, ConstituentTicker, HistoryKind, Instrument, InstrumentSet, Slot, SlotMap,
    Trend, HEATMAP_CONSTITUENTS,
};
pub use narrative::{
    DailySchedule, EarningsEvent, EarningsTime, FocusNote, NarrativeBundle, NewsCategory,
    NewsItem, Sentiment, WeeklyFocus,
};
pub use raw_quote::{LooseNumber, RawQuote};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
