//! Magnitude-based unit inference for severance-cap figures
//!
//! The tax-data endpoint does not say whether a figure is monthly or annual,
//! so the unit is guessed from its size.

use serde::{Deserialize, Serialize};

/// Inferred unit of a raw cap figure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitInference {
    Annual,
    Monthly,
    /// Below the monthly floor; accepted as monthly but flagged
    MonthlyLowConfidence,
}

impl UnitInference {
    pub fn is_low_confidence(&self) -> bool {
        matches!(self, UnitInference::MonthlyLowConfidence)
    }
}

/// Magnitude thresholds for unit inference
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UnitThresholds {
    /// Values at or above this are annual figures
    pub annual_min: f64,
    /// Values at or above this (and below `annual_min`) are monthly figures
    pub monthly_min: f64,
}

impl Default for UnitThresholds {
    fn default() -> Self {
        Self {
            annual_min: 100_000.0,
            monthly_min: 1_000.0,
        }
    }
}

impl UnitThresholds {
    pub fn classify(&self, value: f64) -> UnitInference {
        if value >= self.annual_min {
            UnitInference::Annual
        } else if value >= self.monthly_min {
            UnitInference::Monthly
        } else {
            UnitInference::MonthlyLowConfidence
        }
    }
}

/// Expand a raw figure into a `(monthly, annual)` pair
pub fn normalize_caps(value: f64, unit: UnitInference) -> (f64, f64) {
    match unit {
        UnitInference::Annual => (value / 12.0, value),
        UnitInference::Monthly | UnitInference::MonthlyLowConfidence => (value, value * 12.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundaries() {
        let t = UnitThresholds::default();
        assert_eq!(t.classify(165_000.0), UnitInference::Annual);
        assert_eq!(t.classify(100_000.0), UnitInference::Annual);
        assert_eq!(t.classify(99_999.99), UnitInference::Monthly);
        assert_eq!(t.classify(13_750.0), UnitInference::Monthly);
        assert_eq!(t.classify(1_000.0), UnitInference::Monthly);
        assert_eq!(t.classify(999.0), UnitInference::MonthlyLowConfidence);
        assert!(t.classify(12.5).is_low_confidence());
    }

    #[test]
    fn test_custom_thresholds() {
        let t = UnitThresholds { annual_min: 50_000.0, monthly_min: 500.0 };
        assert_eq!(t.classify(60_000.0), UnitInference::Annual);
        assert_eq!(t.classify(600.0), UnitInference::Monthly);
    }

    #[test]
    fn test_normalize_caps() {
        assert_eq!(normalize_caps(165_000.0, UnitInference::Annual), (13_750.0, 165_000.0));
        assert_eq!(normalize_caps(13_750.0, UnitInference::Monthly), (13_750.0, 165_000.0));
        assert_eq!(normalize_caps(500.0, UnitInference::MonthlyLowConfidence), (500.0, 6_000.0));
    }
}
