use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskCategory {
    #[serde(rename = "Severe Risk")]
    SevereRisk,
    #[serde(rename = "High Stress")]
    HighStress,
    #[serde(rename = "Moderate")]
    Moderate,
}

impl RiskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::SevereRisk => "Severe Risk",
            RiskCategory::HighStress => "High Stress",
            RiskCategory::Moderate => "Moderate",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "Severe Risk" => Some(RiskCategory::SevereRisk),
            "High Stress" => Some(RiskCategory::HighStress),
            "Moderate" => Some(RiskCategory::Moderate),
            _ => None,
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Converts a rental stress rate (percent of income) into a risk tier.
///
/// | Range       | Category    |
/// |-------------|-------------|
/// | >= 35       | Severe Risk |
/// | >= 30       | High Stress |
/// | < 30        | Moderate    |
pub fn risk_category(stress_rate: f64) -> RiskCategory {
    match stress_rate {
        s if s >= 35.0 => RiskCategory::SevereRisk,
        s if s >= 30.0 => RiskCategory::HighStress,
        _ => RiskCategory::Moderate,
    }
}
