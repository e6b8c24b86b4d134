use std::fmt::{Display, Formatter};

use serde::Serialize;
use soxdash_core::{SourceTier, TierError, UtcDateTime};
use uuid::Uuid;

/// Request identifier (UUID v4), one per command or watch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// 16-byte hex trace id shared by every request of one process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TraceId(String);

impl TraceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for TraceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub request_id: RequestId,
    pub trace_id: TraceId,
    pub generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceTier>,
    pub tier_chain: Vec<SourceTier>,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Metadata {
    pub fn new(trace_id: TraceId) -> Self {
        Self {
            request_id: RequestId::new_v4(),
            trace_id,
            generated_at: UtcDateTime::now().format_rfc3339(),
            source: None,
            tier_chain: Vec::new(),
            latency_ms: 0,
            advisory: None,
            warnings: Vec::new(),
        }
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// One failed tier or side request, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvelopeError {
    pub code: String,
    pub message: String,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<SourceTier>,
}

impl From<&TierError> for EnvelopeError {
    fn from(value: &TierError) -> Self {
        Self {
            code: value.error.code().to_owned(),
            message: value.error.message().to_owned(),
            retryable: value.error.retryable(),
            tier: Some(value.tier),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub meta: Metadata,
    pub data: T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<EnvelopeError>,
}
