//! Scripted collaborators shared by the behavior suites.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use soxdash_core::{
    HttpClient, HttpError, HttpRequest, HttpResponse, PriceTier, QuoteSource, RawQuote,
    SourceError, SourceFuture, SourceTier, Symbol, TierOutput,
};

/// Answers requests from a list of `(url fragment, status, body)` routes.
/// The first route whose fragment appears in the url wins; anything else is a 404.
pub struct ScriptedHttpClient {
    routes: Vec<(String, u16, String)>,
    delays: Vec<(String, Duration)>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedHttpClient {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            delays: Vec::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn route(mut self, fragment: &str, status: u16, body: impl Into<String>) -> Self {
        self.routes.push((fragment.to_owned(), status, body.into()));
        self
    }

    /// Holds every response whose url contains `fragment` for `delay`.
    pub fn delay(mut self, fragment: &str, delay: Duration) -> Self {
        self.delays.push((fragment.to_owned(), delay));
        self
    }

    pub fn requested(&self, fragment: &str) -> usize {
        self.requests
            .lock()
            .expect("request log lock")
            .iter()
            .filter(|url| url.contains(fragment))
            .count()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            self.requests
                .lock()
                .expect("request log lock")
                .push(request.url.clone());

            let delay = self
                .delays
                .iter()
                .find(|(fragment, _)| request.url.contains(fragment.as_str()))
                .map(|(_, delay)| *delay);
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let response = self
                .routes
                .iter()
                .find(|(fragment, _, _)| request.url.contains(fragment.as_str()))
                .map(|(_, status, body)| HttpResponse::with_status(*status, body.clone()))
                .unwrap_or_else(|| HttpResponse::with_status(404, "not found"));
            Ok(response)
        })
    }
}

/// Yahoo session routes: a crumb and an empty cookie page.
pub fn yahoo_session(client: ScriptedHttpClient) -> ScriptedHttpClient {
    client
        .route("fc.yahoo.com", 200, "")
        .route("getcrumb", 200, "testcrumb")
}

/// `v7/finance/quote` body with one entry.
pub fn yahoo_quote_body(symbol: &str, price: f64, change: f64, change_percent: f64) -> String {
    format!(
        r#"{{"quoteResponse":{{"result":[{{"symbol":"{symbol}","regularMarketPrice":{price},"regularMarketChange":{change},"regularMarketChangePercent":{change_percent}}}]}}}}"#
    )
}

/// Gemini `generateContent` body carrying `text` and optional citations.
pub fn gemini_body(text: &str, citations: &[&str]) -> String {
    let chunks = citations
        .iter()
        .map(|uri| serde_json::json!({ "web": { "uri": uri } }))
        .collect::<Vec<_>>();
    serde_json::json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }] },
            "groundingMetadata": { "groundingChunks": chunks }
        }]
    })
    .to_string()
}

/// Quote source answering from a fixed per-symbol table.
pub struct ScriptedSource {
    quotes: HashMap<String, Result<RawQuote, SourceError>>,
    batch: Result<Vec<RawQuote>, SourceError>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            quotes: HashMap::new(),
            batch: Ok(Vec::new()),
        }
    }

    pub fn quote(mut self, ticker: &str, quote: Result<RawQuote, SourceError>) -> Self {
        self.quotes.insert(ticker.to_owned(), quote);
        self
    }

    pub fn batch(mut self, batch: Result<Vec<RawQuote>, SourceError>) -> Self {
        self.batch = batch;
        self
    }
}

impl QuoteSource for ScriptedSource {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn quote<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, RawQuote> {
        Box::pin(async move {
            self.quotes
                .get(symbol.as_str())
                .cloned()
                .unwrap_or_else(|| Err(SourceError::unavailable(format!("no script for {symbol}"))))
        })
    }

    fn quote_batch<'a>(&'a self, _symbols: &'a [Symbol]) -> SourceFuture<'a, Vec<RawQuote>> {
        Box::pin(async move { self.batch.clone() })
    }
}

/// Price tier with a scripted answer per attempt. The last script repeats.
pub struct ScriptedTier {
    tier: SourceTier,
    script: Vec<(Duration, Result<TierOutput, SourceError>)>,
    attempts: AtomicUsize,
}

impl ScriptedTier {
    pub fn new(tier: SourceTier) -> Self {
        Self {
            tier,
            script: Vec::new(),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn then(mut self, delay: Duration, outcome: Result<TierOutput, SourceError>) -> Self {
        self.script.push((delay, outcome));
        self
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl PriceTier for ScriptedTier {
    fn tier(&self) -> SourceTier {
        self.tier
    }

    fn attempt<'a>(&'a self) -> SourceFuture<'a, TierOutput> {
        Box::pin(async move {
            let index = self.attempts.fetch_add(1, Ordering::SeqCst);
            let Some((delay, outcome)) = self.script.get(index).or_else(|| self.script.last())
            else {
                return Err(SourceError::internal("scripted tier has no script"));
            };
            if !delay.is_zero() {
                tokio::time::sleep(*delay).await;
            }
            outcome.clone()
        })
    }
}

/// Tier output where every slot carries the same quote.
pub fn uniform_output(price: f64) -> TierOutput {
    TierOutput {
        quotes: soxdash_core::SlotMap::from_fn(|_| Some(RawQuote::priced(price, 1.0, 1.0))),
        constituents: None,
        warnings: Vec::new(),
    }
}
