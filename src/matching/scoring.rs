use serde::{Deserialize, Serialize};

use crate::core::error::DiffError;
use crate::core::types::Severity;

/// Default lower bound (inclusive) of a minor change
pub const DEFAULT_MINOR_THRESHOLD: f64 = 0.80;

/// Default lower bound (inclusive) of a moderate change
pub const DEFAULT_MODERATE_THRESHOLD: f64 = 0.50;

/// Similarity cut-offs used to classify a changed value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Scores at or above this are minor
    pub minor: f64,
    /// Scores at or above this (and below `minor`) are moderate; anything lower is major
    pub moderate: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            minor: DEFAULT_MINOR_THRESHOLD,
            moderate: DEFAULT_MODERATE_THRESHOLD,
        }
    }
}

impl Thresholds {
    /// Check `0 <= moderate <= minor <= 1`
    ///
    /// # Errors
    ///
    /// Returns `DiffError::InvalidConfig` describing the violated bound.
    pub fn validate(&self) -> Result<(), DiffError> {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if !in_unit(self.minor) || !in_unit(self.moderate) {
            return Err(DiffError::InvalidConfig(format!(
                "thresholds must lie in [0, 1] (minor={}, moderate={})",
                self.minor, self.moderate
            )));
        }
        if self.moderate > self.minor {
            return Err(DiffError::InvalidConfig(format!(
                "moderate threshold {} exceeds minor threshold {}",
                self.moderate, self.minor
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn classify(&self, score: f64) -> Severity {
        Severity::from_score(score, self.minor, self.moderate)
    }
}

/// Count of modified entries bucketed by their worst field change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityBreakdown {
    pub minor: usize,
    pub moderate: usize,
    pub major: usize,
    /// Entries whose changes carry no severity (exact comparison, or only added/removed values)
    pub unscored: usize,
}

impl SeverityBreakdown {
    pub fn record(&mut self, worst: Option<Severity>) {
        match worst {
            Some(Severity::Minor) => self.minor += 1,
            Some(Severity::Moderate) => self.moderate += 1,
            Some(Severity::Major) => self.major += 1,
            None => self.unscored += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.minor + self.moderate + self.major + self.unscored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let t = Thresholds::default();
        assert_eq!(t.classify(0.8), Severity::Minor);
        assert_eq!(t.classify(0.5), Severity::Moderate);
        assert_eq!(t.classify(0.4999), Severity::Major);
        assert!(t.validate().is_ok());
    }

    #[test]
    fn test_custom_thresholds() {
        let t = Thresholds {
            minor: 0.9,
            moderate: 0.3,
        };
        assert_eq!(t.classify(0.85), Severity::Moderate);
        assert_eq!(t.classify(0.3), Severity::Moderate);
        assert_eq!(t.classify(0.29), Severity::Major);
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let t = Thresholds {
            minor: 0.4,
            moderate: 0.6,
        };
        assert!(matches!(t.validate(), Err(DiffError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let t = Thresholds {
            minor: 1.5,
            moderate: 0.5,
        };
        assert!(t.validate().is_err());
        let t = Thresholds {
            minor: 0.8,
            moderate: f64::NAN,
        };
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_breakdown_records_worst() {
        let mut b = SeverityBreakdown::default();
        b.record(Some(Severity::Major));
        b.record(Some(Severity::Minor));
        b.record(None);
        assert_eq!(b.major, 1);
        assert_eq!(b.minor, 1);
        assert_eq!(b.unscored, 1);
        assert_eq!(b.total(), 3);
    }
}
