use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Acquisition tier that produced a snapshot. Doubles as the provenance
/// label shown next to every price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTier {
    Primary,
    AiSearch,
    Demo,
}

impl SourceTier {
    /// Tiers in the order the fallback chain tries them.
    pub const ALL: [Self; 3] = [Self::Primary, Self::AiSearch, Self::Demo];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::AiSearch => "ai_search",
            Self::Demo => "demo",
        }
    }

    /// User-facing provenance label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Primary => "primary API",
            Self::AiSearch => "AI search",
            Self::Demo => "demo",
        }
    }

    /// Whether the tier serves live (non-bundled) data.
    pub const fn is_live(self) -> bool {
        !matches!(self, Self::Demo)
    }
}

impl Display for SourceTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SourceTier {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "primary" | "primary api" => Ok(Self::Primary),
            "ai_search" | "ai search" => Ok(Self::AiSearch),
            "demo" => Ok(Self::Demo),
            other => Err(ValidationError::InvalidTier {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_user_facing_provenance() {
        assert_eq!(SourceTier::Primary.label(), "primary API");
        assert_eq!(SourceTier::AiSearch.label(), "AI search");
        assert_eq!(SourceTier::Demo.label(), "demo");
    }

    #[test]
    fn parses_identifier_and_label_forms() {
        assert_eq!("AI search".parse::<SourceTier>(), Ok(SourceTier::AiSearch));
        assert_eq!("ai_search".parse::<SourceTier>(), Ok(SourceTier::AiSearch));
        assert!(matches!(
            "yahoo".parse::<SourceTier>(),
            Err(ValidationError::InvalidTier { .. })
        ));
    }
}
