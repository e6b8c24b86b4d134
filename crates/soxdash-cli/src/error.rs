use soxdash_core::{DashboardError, NarrativeError, ValidationError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Dashboard(#[from] DashboardError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Dashboard(DashboardError::Narrative(NarrativeError::NotConfigured(_))) => 2,
            Self::Dashboard(DashboardError::Narrative(NarrativeError::Parse(_))) => 4,
            Self::Dashboard(_) => 3,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use soxdash_core::SourceError;

    use super::*;

    #[test]
    fn narrative_errors_map_to_distinct_codes() {
        let missing = CliError::from(DashboardError::from(NarrativeError::NotConfigured(
            String::from("no key"),
        )));
        let upstream = CliError::from(DashboardError::from(NarrativeError::Upstream(
            SourceError::unavailable("503"),
        )));
        let parse = CliError::from(DashboardError::from(NarrativeError::Parse(String::from(
            "bad json",
        ))));

        assert_eq!(missing.exit_code(), 2);
        assert_eq!(upstream.exit_code(), 3);
        assert_eq!(parse.exit_code(), 4);
        assert_eq!(CliError::from(ValidationError::ZeroTierTimeout).exit_code(), 2);
    }
}
