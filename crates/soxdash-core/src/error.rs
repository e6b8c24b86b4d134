use thiserror::Error;

/// Validation and contract errors exposed by `soxdash-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter or '^': '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid tier '{value}', expected one of primary, ai_search, demo")]
    InvalidTier { value: String },
    #[error("invalid slot '{value}', expected one of soxl, sox, ndx, tnx, krw, vix, btc, kospi")]
    InvalidSlot { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },

    #[error("tier timeout must be greater than zero")]
    ZeroTierTimeout,
    #[error("fallback chain must contain at least one tier")]
    EmptyTierChain,
}
