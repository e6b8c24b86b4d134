//! Single-shot AI narrative: weekly focus, five-day calendar, news.

use std::sync::Arc;

use thiserror::Error;

use crate::adapters::gemini::{parse_json_payload, GeminiClient};
use crate::data_source::{SourceError, SourceErrorKind};
use crate::NarrativeBundle;

const NARRATIVE_PROMPT: &str = r#"Role: Wall Street quant analyst covering the SOXL leveraged semiconductor ETF.

Return JSON only (no markdown), with keys:
{
  "weeklyFocus": { "title": string, "description": string, "notes": [{ "label": string, "text": string }] },
  "schedule": [{ "date": string, "day": string, "tags": string[], "events": string[],
                 "earnings": [{ "name": string, "symbol": string, "time": "BMO"|"AMC" }] }],
  "news": [{ "category": "macro"|"sector", "source": string, "time": string, "title": string,
             "impact": string, "sentiment": "positive"|"negative"|"neutral", "url": string }]
}

Task:
1) 6 news items (3 macro, 3 sector)
2) Economic calendar for the next 5 days
3) Weekly strategy for SOXL"#;

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("AI narrative is not configured: {0}")]
    NotConfigured(String),
    #[error("AI narrative request failed: {0}")]
    Upstream(SourceError),
    #[error("AI narrative response could not be read: {0}")]
    Parse(String),
}

impl From<SourceError> for NarrativeError {
    fn from(error: SourceError) -> Self {
        match error.kind() {
            SourceErrorKind::NotConfigured => Self::NotConfigured(error.message().to_owned()),
            SourceErrorKind::MalformedResponse => Self::Parse(error.message().to_owned()),
            _ => Self::Upstream(error),
        }
    }
}

/// Fetches a fresh narrative, grounded on web search so news items can
/// carry a source link. No retries and no fallback tier.
#[derive(Clone)]
pub struct NarrativeService {
    gemini: Arc<GeminiClient>,
}

impl NarrativeService {
    pub fn new(gemini: Arc<GeminiClient>) -> Self {
        Self { gemini }
    }

    pub fn is_configured(&self) -> bool {
        self.gemini.is_configured()
    }

    pub async fn fetch(&self) -> Result<NarrativeBundle, NarrativeError> {
        let response = self.gemini.generate(NARRATIVE_PROMPT, true).await?;
        let mut bundle: NarrativeBundle = parse_json_payload(&response.text)?;

        number_news(&mut bundle);
        attach_citation(&mut bundle, &response.citations);
        tracing::info!(
            news = bundle.news.len(),
            days = bundle.schedule.len(),
            citations = response.citations.len(),
            "narrative refreshed"
        );
        Ok(bundle)
    }
}

/// Gives every news item without a url the first grounding citation.
pub fn attach_citation(bundle: &mut NarrativeBundle, citations: &[String]) {
    let Some(first) = citations.iter().find(|uri| !uri.trim().is_empty()) else {
        return;
    };
    for item in &mut bundle.news {
        let missing = item.url.as_deref().map_or(true, |url| url.trim().is_empty());
        if missing {
            item.url = Some(first.clone());
        }
    }
}

fn number_news(bundle: &mut NarrativeBundle) {
    for (index, item) in bundle.news.iter_mut().enumerate() {
        if item.id == 0 {
            item.id = u32::try_from(index + 1).unwrap_or(u32::MAX);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NewsItem;

    fn item(url: Option<&str>) -> NewsItem {
        NewsItem {
            url: url.map(str::to_owned),
            ..NewsItem::default()
        }
    }

    #[test]
    fn first_citation_fills_only_missing_urls() {
        let mut bundle = NarrativeBundle {
            news: vec![item(None), item(Some("https://kept.example")), item(Some(""))],
            ..NarrativeBundle::default()
        };
        attach_citation(
            &mut bundle,
            &[String::from("https://a.example"), String::from("https://b.example")],
        );

        let urls = bundle
            .news
            .iter()
            .map(|n| n.url.as_deref())
            .collect::<Vec<_>>();
        assert_eq!(
            urls,
            vec![
                Some("https://a.example"),
                Some("https://kept.example"),
                Some("https://a.example")
            ]
        );
    }

    #[test]
    fn no_citation_leaves_urls_absent() {
        let mut bundle = NarrativeBundle {
            news: vec![item(None)],
            ..NarrativeBundle::default()
        };
        attach_citation(&mut bundle, &[]);
        assert_eq!(bundle.news[0].url, None);
    }

    #[test]
    fn source_error_kinds_map_to_narrative_errors() {
        assert!(matches!(
            NarrativeError::from(SourceError::not_configured("no key")),
            NarrativeError::NotConfigured(_)
        ));
        assert!(matches!(
            NarrativeError::from(SourceError::malformed("bad json")),
            NarrativeError::Parse(_)
        ));
        assert!(matches!(
            NarrativeError::from(SourceError::unavailable("503")),
            NarrativeError::Upstream(_)
        ));
    }

    #[test]
    fn prompt_asks_for_the_documented_keys() {
        for key in ["weeklyFocus", "schedule", "news", "3 macro, 3 sector", "next 5 days"] {
            assert!(NARRATIVE_PROMPT.contains(key), "prompt lacks {key}");
        }
    }
}
