use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::cache::{CacheLookup, QuoteCache};
use crate::data_source::{QuoteSource, SourceError, SourceFuture};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, NoopHttpClient};
use crate::throttling::ThrottlingQueue;
use crate::{RawQuote, Symbol};

const QUOTE_URL: &str = "https://query1.finance.yahoo.com/v7/finance/quote";
const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const SESSION_URL: &str = "https://fc.yahoo.com";
const CRUMB_URLS: [&str; 2] = [
    "https://query1.finance.yahoo.com/v1/test/getcrumb",
    "https://query2.finance.yahoo.com/v1/test/getcrumb",
];
const REFERER: &str = "https://finance.yahoo.com/";

// ============================================================================
// Yahoo Auth Manager - cookie/crumb session
// ============================================================================

#[derive(Debug, Clone)]
struct CrumbSession {
    crumb: String,
    fetched_at: Instant,
}

/// Manages the Yahoo cookie/crumb pair required by the quote endpoint.
///
/// The session cookie lives in the transport's cookie jar (or in the
/// `YAHOO_COOKIE` override); only the crumb is cached here.
#[derive(Debug)]
pub struct YahooAuthManager {
    session: Mutex<Option<CrumbSession>>,
    crumb_ttl: Duration,
    cookie_override: Option<String>,
}

impl Default for YahooAuthManager {
    fn default() -> Self {
        Self::new(None)
    }
}

impl YahooAuthManager {
    pub fn new(cookie_override: Option<String>) -> Self {
        Self {
            session: Mutex::new(None),
            crumb_ttl: Duration::from_secs(3600),
            cookie_override: cookie_override.filter(|cookie| !cookie.trim().is_empty()),
        }
    }

    pub fn auth(&self) -> HttpAuth {
        self.cookie_override
            .clone()
            .map_or(HttpAuth::None, HttpAuth::Cookie)
    }

    /// Cached crumb, refreshed when missing or older than the TTL. The lock
    /// is held across the refresh so concurrent callers share one fetch.
    pub async fn crumb(&self, http_client: &dyn HttpClient) -> Result<String, SourceError> {
        let mut session = self.session.lock().await;
        if let Some(current) = session.as_ref() {
            if current.fetched_at.elapsed() < self.crumb_ttl {
                return Ok(current.crumb.clone());
            }
        }

        let crumb = self.fetch_crumb(http_client).await?;
        *session = Some(CrumbSession {
            crumb: crumb.clone(),
            fetched_at: Instant::now(),
        });
        Ok(crumb)
    }

    pub async fn invalidate(&self) {
        *self.session.lock().await = None;
    }

    async fn fetch_crumb(&self, http_client: &dyn HttpClient) -> Result<String, SourceError> {
        let auth = self.auth();
        if matches!(auth, HttpAuth::None) {
            // Only needed to seed the cookie jar; the body is irrelevant.
            let session_request = HttpRequest::get(SESSION_URL)
                .with_header("referer", REFERER)
                .with_timeout_ms(10_000);
            if let Err(error) = http_client.execute(session_request).await {
                tracing::debug!(error = %error, "yahoo session cookie request failed");
            }
        }

        for endpoint in CRUMB_URLS {
            let request = HttpRequest::get(endpoint)
                .with_auth(&auth)
                .with_header("referer", REFERER)
                .with_timeout_ms(10_000);

            let response = match http_client.execute(request).await {
                Ok(response) => response,
                Err(error) => {
                    tracing::debug!(endpoint, error = %error, "yahoo crumb request failed");
                    continue;
                }
            };

            if response.is_rate_limited() {
                return Err(SourceError::rate_limited(
                    "yahoo rate limited while fetching crumb",
                ));
            }
            if !response.is_success() {
                continue;
            }

            let body = response.body.trim();
            if body.contains("<html") || body.contains("<!DOCTYPE") {
                continue;
            }
            if body.to_ascii_lowercase().contains("too many requests") {
                return Err(SourceError::rate_limited(
                    "yahoo rate limited while fetching crumb",
                ));
            }
            if !body.is_empty() && body.len() < 100 && !body.contains(' ') {
                return Ok(body.to_owned());
            }
        }

        Err(SourceError::unavailable(
            "failed to fetch yahoo crumb from all endpoints",
        ))
    }
}

// ============================================================================
// Yahoo Adapter
// ============================================================================

/// Primary quotes provider: `v7/finance/quote` for prices and
/// `v8/finance/chart` for recent daily closes.
#[derive(Clone)]
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    auth_manager: Arc<YahooAuthManager>,
    throttling: ThrottlingQueue,
    cache: QuoteCache,
    request_timeout_ms: u64,
}

impl Default for YahooAdapter {
    fn default() -> Self {
        Self::new(Arc::new(NoopHttpClient))
    }
}

impl YahooAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            auth_manager: Arc::new(YahooAuthManager::default()),
            throttling: ThrottlingQueue::yahoo_default(),
            cache: QuoteCache::with_default_windows(),
            request_timeout_ms: 5_000,
        }
    }

    pub fn with_cookie_override(mut self, cookie: Option<String>) -> Self {
        self.auth_manager = Arc::new(YahooAuthManager::new(cookie));
        self
    }

    pub fn with_cache(mut self, cache: QuoteCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    /// GET with the fresh/stale cache in front. `cache_key` excludes the
    /// crumb so a new session does not invalidate cached bodies.
    async fn fetch_body(&self, url: &str, cache_key: &str) -> Result<String, SourceError> {
        let stale = match self.cache.lookup(cache_key).await {
            CacheLookup::Fresh(body) => {
                tracing::trace!(cache_key, "yahoo cache hit");
                return Ok(body);
            }
            CacheLookup::Stale(body) => Some(body),
            CacheLookup::Miss => None,
        };

        self.throttling.acquire().await;

        let request = HttpRequest::get(url)
            .with_auth(&self.auth_manager.auth())
            .with_header("referer", REFERER)
            .with_timeout_ms(self.request_timeout_ms);

        let response = self.http_client.execute(request).await.map_err(|error| {
            if error.is_timeout() {
                SourceError::timeout(format!("yahoo request timed out: {}", error.message()))
            } else {
                SourceError::unavailable(format!("yahoo transport error: {}", error.message()))
            }
        })?;

        if response.is_rate_limited() {
            if let Some(body) = stale {
                tracing::warn!(cache_key, "yahoo rate limited; serving stale cached response");
                return Ok(body);
            }
            return Err(SourceError::rate_limited("yahoo upstream returned status 429"));
        }

        if matches!(response.status, 401 | 403) {
            self.auth_manager.invalidate().await;
        }

        if !response.is_success() {
            return Err(SourceError::unavailable(format!(
                "yahoo upstream returned status {}",
                response.status
            )));
        }

        self.cache
            .put(cache_key.to_owned(), response.body.clone())
            .await;
        Ok(response.body)
    }

    async fn fetch_quote_entries(&self, symbols: &[Symbol]) -> Result<Vec<RawQuote>, SourceError> {
        if symbols.is_empty() {
            return Err(SourceError::invalid_request(
                "yahoo quote request requires at least one symbol",
            ));
        }

        let joined = symbols
            .iter()
            .map(Symbol::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let cache_key = format!("{QUOTE_URL}?symbols={}", urlencoding::encode(&joined));
        let crumb = self.auth_manager.crumb(self.http_client.as_ref()).await?;
        let url = format!("{cache_key}&crumb={}", urlencoding::encode(&crumb));

        let body = self.fetch_body(&url, &cache_key).await?;
        parse_quote_response(&body)
    }

    /// Daily closes for the last month. Failures only cost the sparkline.
    async fn fetch_closes(&self, symbol: &Symbol) -> Vec<f64> {
        let url = format!(
            "{CHART_URL}/{}?range=1mo&interval=1d",
            urlencoding::encode(symbol.as_str())
        );
        match self.fetch_body(&url, &url).await.and_then(|body| parse_chart_closes(&body)) {
            Ok(closes) => closes,
            Err(error) => {
                tracing::debug!(symbol = %symbol, error = %error, "yahoo chart unavailable");
                Vec::new()
            }
        }
    }
}

impl QuoteSource for YahooAdapter {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    fn quote<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, RawQuote> {
        Box::pin(async move {
            let entries = self.fetch_quote_entries(std::slice::from_ref(symbol)).await?;
            let quote = entries
                .into_iter()
                .find(|entry| {
                    entry
                        .symbol
                        .as_deref()
                        .map_or(true, |s| s.eq_ignore_ascii_case(symbol.as_str()))
                })
                .ok_or_else(|| {
                    SourceError::unavailable(format!("yahoo returned no quote for '{symbol}'"))
                })?;

            let closes = self.fetch_closes(symbol).await;
            Ok(quote.with_history(closes))
        })
    }

    fn quote_batch<'a>(&'a self, symbols: &'a [Symbol]) -> SourceFuture<'a, Vec<RawQuote>> {
        Box::pin(async move { self.fetch_quote_entries(symbols).await })
    }
}

// ============================================================================
// Yahoo API response structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct YahooQuoteResponse {
    #[serde(rename = "quoteResponse")]
    quote_response: YahooQuoteResponseData,
}

#[derive(Debug, Deserialize)]
struct YahooQuoteResponseData {
    #[serde(default)]
    result: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    indicators: YahooChartIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

fn parse_quote_response(body: &str) -> Result<Vec<RawQuote>, SourceError> {
    let response: YahooQuoteResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(format!("failed to parse yahoo quote response: {e}")))?;
    Ok(response
        .quote_response
        .result
        .iter()
        .filter_map(RawQuote::decode)
        .collect())
}

fn parse_chart_closes(body: &str) -> Result<Vec<f64>, SourceError> {
    let response: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(format!("failed to parse yahoo chart response: {e}")))?;
    let closes = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .and_then(|result| result.indicators.quote.into_iter().next())
        .map(|quote| quote.close.into_iter().flatten().collect())
        .unwrap_or_default();
    Ok(closes)
}
