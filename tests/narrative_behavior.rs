//! Behavior-driven tests for the AI narrative refresh
//!
//! These tests verify that a narrative refresh replaces only the narrative,
//! tolerates fenced model output, and leaves everything untouched on failure.

mod support;

use std::sync::Arc;

use soxdash_core::{
    Dashboard, DashboardBuilder, DashboardError, DemoTier, FallbackController, NarrativeError,
    NewsCategory, PriceTier, Sentiment,
};
use support::{gemini_body, ScriptedHttpClient};

const NARRATIVE_JSON: &str = r#"{
  "weeklyFocus": {
    "title": "AI capex keeps the bid",
    "description": "Hyperscaler guidance drives the week.",
    "notes": [{"label": "Risk", "text": "Rates reprice on CPI"}, "Watch HBM pricing"]
  },
  "schedule": [
    {"date": "10/19", "day": "Mon", "tags": ["earnings"], "events": ["Empire State index"],
     "earnings": [{"name": "TSMC", "symbol": "TSM", "time": "BMO"}]}
  ],
  "news": [
    {"category": "macro", "source": "Reuters", "time": "1h ago", "title": "Fed holds rates",
     "impact": "Yields ease", "sentiment": "positive"},
    {"category": "sector", "source": "Bloomberg", "time": "2h ago", "title": "HBM supply tightens",
     "impact": "Memory names rally", "sentiment": "Negative", "url": "https://kept.example/hbm"}
  ]
}"#;

fn dashboard_with(http: Arc<ScriptedHttpClient>, key: Option<&str>) -> Dashboard {
    let builder = DashboardBuilder::new()
        .with_http_client(http)
        .with_rng_seed(3);
    let builder = match key {
        Some(key) => builder.with_gemini_key(key),
        None => builder,
    };
    builder.build().expect("builds")
}

// =============================================================================
// Narrative: Successful Refresh
// =============================================================================

#[tokio::test]
async fn when_model_answers_in_fences_narrative_is_replaced() {
    // Given: A model answer wrapped in a json fence with one grounding citation
    let fenced = format!("```json\n{NARRATIVE_JSON}\n```");
    let http = Arc::new(ScriptedHttpClient::new().route(
        "generateContent",
        200,
        gemini_body(&fenced, &["https://grounding.example/source"]),
    ));
    let dashboard = dashboard_with(http, Some("test-key"));
    let before = dashboard.snapshot();

    // When: The narrative refreshes
    let after = dashboard.refresh_narrative().await.expect("narrative parses");

    // Then: Only the narrative changed
    assert_eq!(after.narrative.weekly_focus.title, "AI capex keeps the bid");
    assert_eq!(after.narrative.weekly_focus.notes.len(), 2);
    assert_eq!(after.narrative.schedule.len(), 1);
    assert_eq!(after.narrative_sequence, 1);
    assert_eq!(after.sequence, before.sequence);
    assert_eq!(after.instruments, before.instruments);
    assert_eq!(after.source, before.source);

    // And: News is numbered, classified, and cited where the model gave no url
    let news = &after.narrative.news;
    assert_eq!(news.len(), 2);
    assert_eq!((news[0].id, news[1].id), (1, 2));
    assert_eq!(news[0].category, NewsCategory::Macro);
    assert_eq!(news[1].category, NewsCategory::Sector);
    assert_eq!(news[0].sentiment, Sentiment::Positive);
    assert_eq!(news[1].sentiment, Sentiment::Negative);
    assert_eq!(news[0].url.as_deref(), Some("https://grounding.example/source"));
    assert_eq!(news[1].url.as_deref(), Some("https://kept.example/hbm"));
}

#[tokio::test]
async fn when_model_answers_without_citations_urls_stay_absent() {
    // Given: A bare JSON answer and no grounding metadata
    let http = Arc::new(ScriptedHttpClient::new().route(
        "generateContent",
        200,
        gemini_body(NARRATIVE_JSON, &[]),
    ));
    let dashboard = dashboard_with(http, Some("test-key"));

    // When: The narrative refreshes
    let after = dashboard.refresh_narrative().await.expect("narrative parses");

    // Then: The item without a url keeps none
    assert_eq!(after.narrative.news[0].url, None);
}

// =============================================================================
// Narrative: Failures Leave the Snapshot Untouched
// =============================================================================

#[tokio::test]
async fn when_model_is_unavailable_snapshot_is_unchanged() {
    // Given: A model endpoint returning 503
    let http = Arc::new(ScriptedHttpClient::new().route("generateContent", 503, "overloaded"));
    let dashboard = dashboard_with(http, Some("test-key"));
    let before = dashboard.snapshot();

    // When: The narrative refreshes
    let error = dashboard.refresh_narrative().await.expect_err("upstream fails");

    // Then: The error is upstream and nothing was published
    assert!(matches!(
        error,
        DashboardError::Narrative(NarrativeError::Upstream(_))
    ));
    assert_eq!(*dashboard.snapshot(), *before);
    assert!(!dashboard.is_busy().narrative);
}

#[tokio::test]
async fn when_model_text_is_not_json_a_parse_error_is_reported() {
    // Given: Prose instead of JSON
    let http = Arc::new(ScriptedHttpClient::new().route(
        "generateContent",
        200,
        gemini_body("Markets look mixed this week.", &[]),
    ));
    let dashboard = dashboard_with(http, Some("test-key"));

    // When/Then: The refresh reports a parse failure
    let error = dashboard.refresh_narrative().await.expect_err("not json");
    assert!(matches!(
        error,
        DashboardError::Narrative(NarrativeError::Parse(_))
    ));
    assert_eq!(dashboard.snapshot().narrative_sequence, 0);
}

#[tokio::test]
async fn when_no_key_is_configured_model_is_never_called() {
    // Given: A dashboard without an AI key
    let http = Arc::new(ScriptedHttpClient::new());
    let dashboard = dashboard_with(http.clone(), None);
    assert!(!dashboard.narrative_configured());

    // When: The narrative refreshes
    let error = dashboard.refresh_narrative().await.expect_err("no key");

    // Then: It fails as not configured without any request
    assert!(matches!(
        error,
        DashboardError::Narrative(NarrativeError::NotConfigured(_))
    ));
    assert_eq!(http.requested("generateContent"), 0);
}

#[tokio::test]
async fn when_dashboard_has_no_narrative_service_refresh_is_not_configured() {
    // Given: A dashboard assembled by hand without a narrative service
    let tiers: Vec<Arc<dyn PriceTier>> = vec![Arc::new(DemoTier)];
    let controller =
        FallbackController::new(tiers, std::time::Duration::from_secs(1)).expect("valid chain");
    let dashboard = Dashboard::new(controller, None, Some(1));

    // When/Then: The refresh reports the missing service
    let error = dashboard.refresh_narrative().await.expect_err("no service");
    assert!(matches!(
        error,
        DashboardError::Narrative(NarrativeError::NotConfigured(_))
    ));
}
