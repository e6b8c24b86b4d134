//! Quote source contract and the structured error shared by every tier.
//!
//! Adapters implement [`QuoteSource`]; the fallback chain consumes
//! [`SourceError`] values to decide whether to move on to the next tier.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{RawQuote, Symbol};

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    MalformedResponse,
    Timeout,
    NotConfigured,
    InvalidRequest,
    Internal,
}

/// Structured source error used by tier fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::MalformedResponse,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Timeout,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn not_configured(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::NotConfigured,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::MalformedResponse => "source.malformed_response",
            SourceErrorKind::Timeout => "source.timeout",
            SourceErrorKind::NotConfigured => "source.not_configured",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Upstream quote provider contract.
pub trait QuoteSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Single-symbol quote, including recent closes when the provider has them.
    fn quote<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, RawQuote>;

    /// One upstream call for many symbols. Entries come back in provider
    /// order and may omit symbols the provider does not know.
    fn quote_batch<'a>(&'a self, symbols: &'a [Symbol]) -> SourceFuture<'a, Vec<RawQuote>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_per_kind() {
        assert_eq!(SourceError::timeout("slow").code(), "source.timeout");
        assert_eq!(
            SourceError::not_configured("no key").code(),
            "source.not_configured"
        );
        assert_eq!(
            SourceError::malformed("bad json").code(),
            "source.malformed_response"
        );
    }

    #[test]
    fn display_includes_message_and_code() {
        let error = SourceError::unavailable("yahoo upstream returned status 503");
        assert_eq!(
            error.to_string(),
            "yahoo upstream returned status 503 (source.unavailable)"
        );
        assert!(error.retryable());
    }
}
