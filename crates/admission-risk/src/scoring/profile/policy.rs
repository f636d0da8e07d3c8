use serde::{Deserialize, Serialize};

/// Three-band view of the approval probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTier {
    High,
    Medium,
    Low,
}

impl RiskTier {
    pub fn label(self) -> &'static str {
        match self {
            RiskTier::High => "high",
            RiskTier::Medium => "medium",
            RiskTier::Low => "low",
        }
    }
}

/// `< high_below` is High, `>= low_from` is Low, Medium in between.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThreeTierRiskPolicy {
    pub high_below: f64,
    pub low_from: f64,
}

impl Default for ThreeTierRiskPolicy {
    fn default() -> Self {
        Self {
            high_below: 0.30,
            low_from: 0.60,
        }
    }
}

impl ThreeTierRiskPolicy {
    pub fn classify(&self, probability: f64) -> RiskTier {
        if probability < self.high_below {
            RiskTier::High
        } else if probability < self.low_from {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }
}

/// Two-band view used on the applicant summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskStatus {
    AtRisk,
    OutOfRisk,
}

impl RiskStatus {
    pub fn label(self) -> &'static str {
        match self {
            RiskStatus::AtRisk => "EN RIESGO",
            RiskStatus::OutOfRisk => "FUERA DE RIESGO",
        }
    }
}

/// At or above `threshold` is out of risk (the approved side).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TwoTierRiskPolicy {
    pub threshold: f64,
}

impl Default for TwoTierRiskPolicy {
    fn default() -> Self {
        Self { threshold: 0.50 }
    }
}

impl TwoTierRiskPolicy {
    pub fn classify(&self, probability: f64) -> RiskStatus {
        if probability < self.threshold {
            RiskStatus::AtRisk
        } else {
            RiskStatus::OutOfRisk
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_tier_boundaries() {
        let policy = ThreeTierRiskPolicy::default();
        assert_eq!(policy.classify(0.0), RiskTier::High);
        assert_eq!(policy.classify(0.29999), RiskTier::High);
        assert_eq!(policy.classify(0.30000), RiskTier::Medium);
        assert_eq!(policy.classify(0.59999), RiskTier::Medium);
        assert_eq!(policy.classify(0.60000), RiskTier::Low);
        assert_eq!(policy.classify(1.0), RiskTier::Low);
    }

    #[test]
    fn two_tier_boundary_sits_on_the_approved_side() {
        let policy = TwoTierRiskPolicy::default();
        assert_eq!(policy.classify(0.5), RiskStatus::OutOfRisk);
        assert_eq!(policy.classify(0.49999), RiskStatus::AtRisk);
        assert_eq!(RiskStatus::OutOfRisk.label(), "FUERA DE RIESGO");
    }
}
