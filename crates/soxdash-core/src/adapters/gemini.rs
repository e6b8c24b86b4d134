use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::data_source::SourceError;
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Text plus any web citations the model grounded its answer on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiResponse {
    pub text: String,
    pub citations: Vec<String>,
}

/// Minimal `generateContent` client.
#[derive(Clone)]
pub struct GeminiClient {
    http_client: Arc<dyn HttpClient>,
    api_key: Option<String>,
    model: String,
    timeout_ms: u64,
}

impl GeminiClient {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model: model.into(),
            timeout_ms: 30_000,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// One prompt, one answer. `grounded` enables the Google Search tool;
    /// JSON mode is only requested without it since the API rejects both.
    pub async fn generate(&self, prompt: &str, grounded: bool) -> Result<GeminiResponse, SourceError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(SourceError::not_configured(
                "gemini api key is not set (SOXDASH_GEMINI_API_KEY or GEMINI_API_KEY)",
            ));
        };

        let mut body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });
        if grounded {
            body["tools"] = json!([{ "google_search": {} }]);
        } else {
            body["generationConfig"] = json!({ "responseMimeType": "application/json" });
        }

        let url = format!("{GEMINI_BASE_URL}/{}:generateContent", self.model);
        let request = HttpRequest::post_json(url, body.to_string())
            .with_auth(&HttpAuth::Header {
                name: String::from("x-goog-api-key"),
                value: api_key.to_owned(),
            })
            .with_timeout_ms(self.timeout_ms);

        let response = self.http_client.execute(request).await.map_err(|error| {
            if error.is_timeout() {
                SourceError::timeout(format!("gemini request timed out: {}", error.message()))
            } else {
                SourceError::unavailable(format!("gemini transport error: {}", error.message()))
            }
        })?;

        if response.is_rate_limited() {
            return Err(SourceError::rate_limited("gemini returned status 429"));
        }
        if !response.is_success() {
            return Err(SourceError::unavailable(format!(
                "gemini returned status {}",
                response.status
            )));
        }

        parse_generate_response(&response.body)
    }
}

/// Removes a surrounding markdown code fence, with or without a language tag.
pub fn strip_json_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    let rest = match rest.find('\n') {
        Some(newline) if rest[..newline].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
            &rest[newline + 1..]
        }
        _ => rest,
    };
    rest.trim()
}

/// Decodes model text as JSON after fence stripping.
pub fn parse_json_payload<T: DeserializeOwned>(text: &str) -> Result<T, SourceError> {
    serde_json::from_str(strip_json_fences(text))
        .map_err(|e| SourceError::malformed(format!("model output is not valid JSON: {e}")))
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(rename = "groundingMetadata", default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroundingMetadata {
    #[serde(rename = "groundingChunks", default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    #[serde(default)]
    uri: Option<String>,
}

fn parse_generate_response(body: &str) -> Result<GeminiResponse, SourceError> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(format!("failed to parse gemini response: {e}")))?;

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(SourceError::malformed("gemini response has no candidates"));
    };

    let text = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(SourceError::malformed("gemini response has no text"));
    }

    let citations = candidate
        .grounding_metadata
        .map(|metadata| {
            metadata
                .grounding_chunks
                .into_iter()
                .filter_map(|chunk| chunk.web.and_then(|web| web.uri))
                .filter(|uri| !uri.is_empty())
                .collect()
        })
        .unwrap_or_default();

    Ok(GeminiResponse { text, citations })
}
