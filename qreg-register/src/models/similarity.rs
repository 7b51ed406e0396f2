//! Similarity tier classification
//!
//! Presentation-only grouping of backend-computed similarity percentages.
//! The workflow never branches on tiers; whether matches exist at all is
//! decided solely by the candidate list being empty or not.

/// Presentation tier for a candidate's similarity percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    /// similarity >= 95: near-certain match
    Confirmed,
    /// 70 <= similarity < 95: likely match, needs a look
    Probable,
    /// similarity < 70: shown for completeness only
    Weak,
}

impl MatchTier {
    /// Classify a backend similarity percentage (0-100)
    pub fn classify(similarity: f64) -> Self {
        if similarity >= 95.0 {
            MatchTier::Confirmed
        } else if similarity >= 70.0 {
            MatchTier::Probable
        } else {
            MatchTier::Weak
        }
    }

    /// Display label for the tier
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTier::Confirmed => "confirmed",
            MatchTier::Probable => "probable",
            MatchTier::Weak => "weak",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(MatchTier::classify(100.0), MatchTier::Confirmed);
        assert_eq!(MatchTier::classify(97.0), MatchTier::Confirmed);
        assert_eq!(MatchTier::classify(80.0), MatchTier::Probable);
        assert_eq!(MatchTier::classify(50.0), MatchTier::Weak);
        assert_eq!(MatchTier::classify(0.0), MatchTier::Weak);
    }

    #[test]
    fn test_tier_boundaries() {
        // Thresholds are inclusive on the lower bound
        assert_eq!(MatchTier::classify(95.0), MatchTier::Confirmed);
        assert_eq!(MatchTier::classify(94.999), MatchTier::Probable);
        assert_eq!(MatchTier::classify(70.0), MatchTier::Probable);
        assert_eq!(MatchTier::classify(69.999), MatchTier::Weak);
    }

    #[test]
    fn test_tier_labels() {
        assert_eq!(MatchTier::Confirmed.as_str(), "confirmed");
        assert_eq!(MatchTier::Probable.as_str(), "probable");
        assert_eq!(MatchTier::Weak.as_str(), "weak");
    }
}
