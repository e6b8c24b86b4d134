//! Bundled snapshot served when every live tier fails.

use crate::{
    ConstituentTicker, DailySchedule, EarningsEvent, EarningsTime, FocusNote, NarrativeBundle,
    NewsCategory, NewsItem, RawQuote, Sentiment, Slot, SlotMap, Symbol, Trend, WeeklyFocus,
};

pub fn demo_quotes() -> SlotMap<RawQuote> {
    SlotMap::from_fn(|slot| match slot {
        Slot::Soxl => RawQuote::priced(53.95, 4.30, 8.66).with_pre_market(53.80, -0.28),
        Slot::Sox => RawQuote::priced(5420.80, 45.40, 0.84),
        Slot::Ndx => RawQuote::priced(21650.45, 120.10, 0.55),
        Slot::Tnx => RawQuote::priced(4.02, 0.04, 1.05),
        Slot::Krw => RawQuote::priced(1462.50, 2.10, 0.14),
        Slot::Vix => RawQuote::priced(14.20, 0.29, 2.10),
        Slot::Btc => RawQuote::priced(67250.00, 1180.50, 1.79),
        Slot::Kospi => RawQuote::priced(2580.35, -12.40, -0.48),
    })
}

pub fn demo_constituents() -> Vec<ConstituentTicker> {
    [
        ("NVDA", 152.50, 0.5, 15, Trend::Flat),
        ("AVGO", 182.10, -0.2, 10, Trend::Flat),
        ("AMD", 172.40, 1.2, 8, Trend::Up),
        ("TSM", 201.50, 0.8, 8, Trend::Up),
        ("QCOM", 175.20, -0.5, 6, Trend::Down),
        ("INTC", 23.05, -0.8, 5, Trend::Down),
        ("MU", 110.50, 1.5, 4, Trend::Up),
        ("AMAT", 205.10, 0.2, 4, Trend::Flat),
    ]
    .into_iter()
    .map(|(ticker, price, change_percent, weight, trend)| ConstituentTicker {
        symbol: Symbol::from_trusted(ticker),
        price,
        change_percent,
        weight,
        trend,
        history: None,
    })
    .collect()
}

pub fn demo_narrative() -> NarrativeBundle {
    NarrativeBundle {
        weekly_focus: WeeklyFocus {
            title: String::from("Week ahead: neutral range, waiting for direction"),
            description: String::from(
                "Sentiment has cooled to neutral and the 10Y yield is pressing on 4% again. \
                 Confirm direction before adding exposure.",
            ),
            notes: vec![
                FocusNote::labelled("Sentiment", "Fear & Greed at 51, euphoria has faded."),
                FocusNote::labelled("Rates", "US10Y at 4.02% caps the upside for tech."),
                FocusNote::labelled("Plan", "Hold 30% cash and wait for a test of $50 support."),
            ],
        },
        schedule: vec![
            day("Today", "Tue", &["CPI Watch"], &["US CPI", "Fed speakers"], &[earnings("Oracle", "ORCL", EarningsTime::Amc)]),
            day("Tomorrow", "Wed", &["PPI"], &["US PPI", "Crude inventories"], &[earnings("Adobe", "ADBE", EarningsTime::Amc)]),
            day(
                "D+2",
                "Thu",
                &["SEMI BIG DAY"],
                &["TSMC earnings", "US retail sales"],
                &[
                    earnings("Taiwan Semi", "TSM", EarningsTime::Bmo),
                    earnings("Broadcom", "AVGO", EarningsTime::Amc),
                ],
            ),
            day("D+3", "Fri", &["OpEx"], &["Quad witching", "UMich sentiment"], &[]),
            day("D+4", "Mon", &[], &["Empire State manufacturing"], &[]),
        ],
        news: vec![
            news(1, NewsCategory::Macro, "Reuters", "Fed officials signal patience on further cuts", Sentiment::Neutral),
            news(2, NewsCategory::Macro, "Bloomberg", "10-year yield climbs back above 4%", Sentiment::Negative),
            news(3, NewsCategory::Macro, "CNBC", "Dollar firms against Asian currencies", Sentiment::Neutral),
            news(4, NewsCategory::Sector, "Reuters", "TSMC monthly revenue beats estimates", Sentiment::Positive),
            news(5, NewsCategory::Sector, "Bloomberg", "AI accelerator demand keeps chip orders strong", Sentiment::Positive),
            news(6, NewsCategory::Sector, "WSJ", "Export-control review weighs on equipment makers", Sentiment::Negative),
        ],
    }
}

fn day(
    date: &str,
    weekday: &str,
    tags: &[&str],
    events: &[&str],
    earnings: &[EarningsEvent],
) -> DailySchedule {
    DailySchedule {
        date: date.to_owned(),
        day: weekday.to_owned(),
        tags: tags.iter().map(|tag| (*tag).to_owned()).collect(),
        events: events.iter().map(|event| (*event).to_owned()).collect(),
        earnings: earnings.to_vec(),
    }
}

fn earnings(name: &str, symbol: &str, time: EarningsTime) -> EarningsEvent {
    EarningsEvent {
        name: name.to_owned(),
        symbol: symbol.to_owned(),
        time,
        day_of_week: None,
        comment: None,
    }
}

fn news(id: u32, category: NewsCategory, source: &str, title: &str, sentiment: Sentiment) -> NewsItem {
    NewsItem {
        id,
        category,
        source: source.to_owned(),
        time: String::from("demo"),
        title: title.to_owned(),
        sentiment,
        impact: String::new(),
        url: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_quotes_cover_every_slot_with_prices() {
        let quotes = demo_quotes();
        for (slot, raw) in quotes.iter() {
            assert!(raw.price.value().is_some_and(|p| p > 0.0), "{slot} has no price");
        }
        assert!(quotes.get(Slot::Soxl).pre_market_price.is_present());
    }

    #[test]
    fn demo_narrative_has_five_days_and_balanced_news() {
        let bundle = demo_narrative();
        assert_eq!(bundle.schedule.len(), 5);
        let macro_count = bundle
            .news
            .iter()
            .filter(|item| item.category == NewsCategory::Macro)
            .count();
        assert_eq!((macro_count, bundle.news.len()), (3, 6));
    }

    #[test]
    fn demo_constituents_follow_heatmap_order() {
        let symbols = demo_constituents()
            .into_iter()
            .map(|cell| cell.symbol.as_str().to_owned())
            .collect::<Vec<_>>();
        let expected = crate::HEATMAP_CONSTITUENTS
            .iter()
            .map(|(ticker, _)| (*ticker).to_owned())
            .collect::<Vec<_>>();
        assert_eq!(symbols, expected);
    }
}
