//! The scenario tag carried through every analysis request.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScenarioError;

/// User-declared intent for an analysis.
///
/// The scenario shapes the tone of the final message, the action keyboard,
/// and the persisted analytics tag. The enum is closed: no other values are
/// admitted anywhere in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Adult blackmail evidence analysis (clinical/legal register).
    AdultBlackmail,
    /// Teenager distress support (reassuring register).
    TeenagerSos,
    /// General verification (educational register).
    General,
}

impl Scenario {
    /// Stable string form used in the database and job payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AdultBlackmail => "adult_blackmail",
            Self::TeenagerSos => "teenager_sos",
            Self::General => "general",
        }
    }

    /// Decode a possibly-absent legacy tag.
    ///
    /// Historic job records carried a nullable scenario; `None` (and the
    /// literal string "none") are coerced to [`Scenario::General`] at read
    /// time. New writes never produce a missing scenario.
    pub fn from_legacy(tag: Option<&str>) -> Result<Self, ScenarioError> {
        match tag {
            None | Some("") | Some("none") | Some("null") => Ok(Self::General),
            Some(other) => other.parse(),
        }
    }
}

impl FromStr for Scenario {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "adult_blackmail" => Ok(Self::AdultBlackmail),
            "teenager_sos" => Ok(Self::TeenagerSos),
            "general" => Ok(Self::General),
            other => Err(ScenarioError::UnknownScenario(other.to_string())),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for s in [Scenario::AdultBlackmail, Scenario::TeenagerSos, Scenario::General] {
            assert_eq!(s.as_str().parse::<Scenario>().unwrap(), s);
        }
    }

    #[test]
    fn test_legacy_none_coerces_to_general() {
        assert_eq!(Scenario::from_legacy(None).unwrap(), Scenario::General);
        assert_eq!(Scenario::from_legacy(Some("none")).unwrap(), Scenario::General);
        assert_eq!(Scenario::from_legacy(Some("")).unwrap(), Scenario::General);
    }

    #[test]
    fn test_legacy_known_tag() {
        assert_eq!(
            Scenario::from_legacy(Some("teenager_sos")).unwrap(),
            Scenario::TeenagerSos
        );
    }

    #[test]
    fn test_unknown_tag_rejected() {
        assert!("casino".parse::<Scenario>().is_err());
        assert!(Scenario::from_legacy(Some("casino")).is_err());
    }
}
