//! Logical fallacies detected in a participant's argument

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

/// A label that does not belong to a closed enumeration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Closed set of fallacy categories the detector may report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FallacyType {
    AdHominem,
    Strawman,
    FalseDilemma,
    SlipperySlope,
    AppealToAuthority,
    HastyGeneralization,
    None,
}

impl FallacyType {
    pub const ALL: [FallacyType; 7] = [
        FallacyType::AdHominem,
        FallacyType::Strawman,
        FallacyType::FalseDilemma,
        FallacyType::SlipperySlope,
        FallacyType::AppealToAuthority,
        FallacyType::HastyGeneralization,
        FallacyType::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FallacyType::AdHominem => "ad_hominem",
            FallacyType::Strawman => "strawman",
            FallacyType::FalseDilemma => "false_dilemma",
            FallacyType::SlipperySlope => "slippery_slope",
            FallacyType::AppealToAuthority => "appeal_to_authority",
            FallacyType::HastyGeneralization => "hasty_generalization",
            FallacyType::None => "none",
        }
    }
}

impl fmt::Display for FallacyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FallacyType {
    type Err = UnknownVariant;

    /// Accepts `ad_hominem`, `Ad Hominem` and `ad-hominem` alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        FallacyType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| UnknownVariant {
                kind: "fallacy type",
                value: s.to_string(),
            })
    }
}

/// How badly a fallacy undermines the argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl FromStr for Severity {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            _ => Err(UnknownVariant {
                kind: "severity",
                value: s.to_string(),
            }),
        }
    }
}

/// A fallacy found in a user utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Fallacy {
    #[serde(rename = "type")]
    pub kind: FallacyType,
    pub explanation: String,
    pub severity: Severity,
}

impl Fallacy {
    pub fn new(kind: FallacyType, explanation: impl Into<String>, severity: Severity) -> Self {
        Self {
            kind,
            explanation: explanation.into(),
            severity,
        }
    }

    /// True for the placeholder `none` entry some detectors emit
    pub fn is_none(&self) -> bool {
        self.kind == FallacyType::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallacy_type_parsing_is_lenient_on_format() {
        assert_eq!("ad_hominem".parse::<FallacyType>(), Ok(FallacyType::AdHominem));
        assert_eq!("Slippery Slope".parse::<FallacyType>(), Ok(FallacyType::SlipperySlope));
        assert_eq!(" false-dilemma ".parse::<FallacyType>(), Ok(FallacyType::FalseDilemma));
        assert_eq!("NONE".parse::<FallacyType>(), Ok(FallacyType::None));
    }

    #[test]
    fn test_unknown_fallacy_type_rejected() {
        let err = "red_herring".parse::<FallacyType>().unwrap_err();
        assert_eq!(err.value, "red_herring");
    }

    #[test]
    fn test_fallacy_serializes_type_field() {
        let fallacy = Fallacy::new(FallacyType::Strawman, "misrepresents", Severity::High);
        let json = serde_json::to_value(&fallacy).unwrap();
        assert_eq!(json["type"], "strawman");
        assert_eq!(json["severity"], "high");
    }
}
