use serde_json::{Map, Value};

/// Numeric field decoded leniently from untyped upstream JSON.
///
/// Accepts a bare number or a `{ "raw": number }` wrapper. Anything else,
/// including numeric strings, decodes to absent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LooseNumber(Option<f64>);

impl LooseNumber {
    pub const fn absent() -> Self {
        Self(None)
    }

    pub fn from_value(value: Option<&Value>) -> Self {
        let number = match value {
            Some(Value::Number(number)) => number.as_f64(),
            Some(Value::Object(map)) => match map.get("raw") {
                Some(Value::Number(number)) => number.as_f64(),
                _ => None,
            },
            _ => None,
        };
        Self(number.filter(|v| v.is_finite()))
    }

    pub const fn value(self) -> Option<f64> {
        self.0
    }

    pub fn or_zero(self) -> f64 {
        self.0.unwrap_or(0.0)
    }

    pub const fn is_present(self) -> bool {
        self.0.is_some()
    }
}

impl From<f64> for LooseNumber {
    fn from(value: f64) -> Self {
        Self(Some(value).filter(|v| v.is_finite()))
    }
}

impl From<Option<f64>> for LooseNumber {
    fn from(value: Option<f64>) -> Self {
        Self(value.filter(|v| v.is_finite()))
    }
}

/// One upstream quote record before normalization.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawQuote {
    pub symbol: Option<String>,
    pub price: LooseNumber,
    pub change: LooseNumber,
    pub change_percent: LooseNumber,
    pub pre_market_price: LooseNumber,
    pub pre_market_change_percent: LooseNumber,
    /// Recent closes, oldest first. Empty when the provider sent none.
    pub history: Vec<f64>,
}

impl RawQuote {
    /// Record for a slot whose fetch failed; normalizes to zeros.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn priced(price: f64, change: f64, change_percent: f64) -> Self {
        Self {
            price: price.into(),
            change: change.into(),
            change_percent: change_percent.into(),
            ..Self::default()
        }
    }

    pub fn with_pre_market(mut self, price: f64, change_percent: f64) -> Self {
        self.pre_market_price = price.into();
        self.pre_market_change_percent = change_percent.into();
        self
    }

    pub fn with_history(mut self, closes: Vec<f64>) -> Self {
        self.history = closes.into_iter().filter(|v| v.is_finite()).collect();
        self
    }

    /// Decodes both the provider's `regularMarket*` spelling and the short
    /// `price`/`change`/`changePercent` spelling used by the AI tier.
    /// Returns `None` only when `value` is not a JSON object.
    pub fn decode(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        Some(Self {
            symbol: map
                .get("symbol")
                .and_then(Value::as_str)
                .map(str::to_owned),
            price: first_number(map, &["price", "regularMarketPrice"]),
            change: first_number(map, &["change", "regularMarketChange"]),
            change_percent: first_number(map, &["changePercent", "regularMarketChangePercent"]),
            pre_market_price: first_number(map, &["preMarketPrice"]),
            pre_market_change_percent: first_number(map, &["preMarketChangePercent"]),
            history: decode_history(map.get("history")),
        })
    }

    pub fn is_blank(&self) -> bool {
        !self.price.is_present() && !self.change.is_present() && !self.change_percent.is_present()
    }
}

fn first_number(map: &Map<String, Value>, keys: &[&str]) -> LooseNumber {
    keys.iter()
        .map(|key| LooseNumber::from_value(map.get(*key)))
        .find(|number| number.is_present())
        .unwrap_or_default()
}

fn decode_history(value: Option<&Value>) -> Vec<f64> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| LooseNumber::from_value(Some(item)).value())
            .collect(),
        _ => Vec::new(),
    }
}
