//! Loosely typed AI narrative payload. Every field defaults, so a response
//! that drops a key still decodes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NarrativeBundle {
    pub weekly_focus: WeeklyFocus,
    pub schedule: Vec<DailySchedule>,
    pub news: Vec<NewsItem>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklyFocus {
    pub title: String,
    pub description: String,
    pub notes: Vec<FocusNote>,
}

/// A weekly-focus note. The model sometimes answers with bare strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FocusNote {
    Labelled {
        #[serde(default)]
        label: String,
        #[serde(default)]
        text: String,
    },
    Plain(String),
}

impl FocusNote {
    pub fn labelled(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Labelled {
            label: label.into(),
            text: text.into(),
        }
    }

    pub fn render(&self) -> String {
        match self {
            Self::Labelled { label, text } if label.is_empty() => text.clone(),
            Self::Labelled { label, text } => format!("{label}: {text}"),
            Self::Plain(text) => text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DailySchedule {
    pub date: String,
    pub day: String,
    pub tags: Vec<String>,
    pub events: Vec<String>,
    pub earnings: Vec<EarningsEvent>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EarningsEvent {
    pub name: String,
    pub symbol: String,
    pub time: EarningsTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Before market open or after market close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EarningsTime {
    Bmo,
    #[default]
    Amc,
}

impl From<String> for EarningsTime {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("bmo") {
            Self::Bmo
        } else {
            Self::Amc
        }
    }
}

impl From<EarningsTime> for String {
    fn from(value: EarningsTime) -> Self {
        match value {
            EarningsTime::Bmo => String::from("BMO"),
            EarningsTime::Amc => String::from("AMC"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewsItem {
    pub id: u32,
    pub category: NewsCategory,
    pub source: String,
    pub time: String,
    pub title: String,
    pub sentiment: Sentiment,
    pub impact: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NewsCategory {
    #[default]
    Macro,
    Sector,
}

impl From<String> for NewsCategory {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("sector") {
            Self::Sector
        } else {
            Self::Macro
        }
    }
}

impl From<NewsCategory> for String {
    fn from(value: NewsCategory) -> Self {
        match value {
            NewsCategory::Macro => String::from("macro"),
            NewsCategory::Sector => String::from("sector"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl From<String> for Sentiment {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "positive" => Self::Positive,
            "negative" => Self::Negative,
            _ => Self::Neutral,
        }
    }
}

impl From<Sentiment> for String {
    fn from(value: Sentiment) -> Self {
        match value {
            Sentiment::Positive => String::from("positive"),
            Sentiment::Negative => String::from("negative"),
            Sentiment::Neutral => String::from("neutral"),
        }
    }
}
