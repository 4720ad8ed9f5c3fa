//! Scoring policy for the match ranking engine

use crate::network::Degree;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_EMBEDDING_WEIGHT: f32 = 0.8;
pub const DEFAULT_NETWORK_WEIGHT: f32 = 0.2;
pub const DEFAULT_FIRST_DEGREE_BOOST: f32 = 0.5;
pub const DEFAULT_SECOND_DEGREE_BOOST: f32 = 0.2;
pub const DEFAULT_TOP_K: usize = 5;

/// Errors produced by policy validation
#[derive(Error, Debug, PartialEq)]
pub enum PolicyError {
    #[error("weights must be in (0, 1], got embedding={embedding}, network={network}")]
    WeightOutOfRange { embedding: f32, network: f32 },

    #[error("embedding weight ({embedding}) must be at least the network weight ({network})")]
    NetworkDominant { embedding: f32, network: f32 },

    #[error("degree boosts must satisfy 0 < second < first <= 1, got first={first}, second={second}")]
    BoostOrdering { first: f32, second: f32 },

    #[error("top_k must be at least 1")]
    EmptyTopK,
}

/// Tunable scoring constants.
///
/// The magnitudes are policy, not structure: they may be reconfigured
/// freely as long as `validate` passes. The ordering constraints it
/// enforces are invariants of the ranking contract: embedding weight >=
/// network weight, and first-degree boost > second-degree boost > 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchPolicy {
    /// Weight applied to the externally supplied embedding score
    pub embedding_weight: f32,

    /// Weight applied to the network proximity score
    pub network_weight: f32,

    /// Network score granted to first-degree candidates
    pub first_degree_boost: f32,

    /// Network score granted to second-degree candidates
    pub second_degree_boost: f32,

    /// Maximum number of matches kept per opportunity
    pub top_k: usize,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        MatchPolicy {
            embedding_weight: DEFAULT_EMBEDDING_WEIGHT,
            network_weight: DEFAULT_NETWORK_WEIGHT,
            first_degree_boost: DEFAULT_FIRST_DEGREE_BOOST,
            second_degree_boost: DEFAULT_SECOND_DEGREE_BOOST,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl MatchPolicy {
    /// Validate the policy constants.
    pub fn validate(&self) -> Result<(), PolicyError> {
        let in_range = |w: f32| w > 0.0 && w <= 1.0;
        if !in_range(self.embedding_weight) || !in_range(self.network_weight) {
            return Err(PolicyError::WeightOutOfRange {
                embedding: self.embedding_weight,
                network: self.network_weight,
            });
        }
        if self.embedding_weight < self.network_weight {
            return Err(PolicyError::NetworkDominant {
                embedding: self.embedding_weight,
                network: self.network_weight,
            });
        }
        if !(self.second_degree_boost > 0.0
            && self.first_degree_boost > self.second_degree_boost
            && self.first_degree_boost <= 1.0)
        {
            return Err(PolicyError::BoostOrdering {
                first: self.first_degree_boost,
                second: self.second_degree_boost,
            });
        }
        if self.top_k == 0 {
            return Err(PolicyError::EmptyTopK);
        }
        Ok(())
    }

    /// Proximity score for a candidate at the given network distance.
    ///
    /// Strictly monotonic: first > second > unconnected (0).
    pub fn network_score(&self, degree: Degree) -> f32 {
        match degree {
            Degree::First => self.first_degree_boost,
            Degree::Second => self.second_degree_boost,
            Degree::Other => 0.0,
        }
    }

    /// Blend the two signals into the final score, clamped to [0, 1].
    pub fn combined_score(&self, embedding_score: f32, network_score: f32) -> f32 {
        clamp01(embedding_score * self.embedding_weight + network_score * self.network_weight)
    }
}

/// Clamp a score into [0, 1].
pub fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_valid() {
        assert_eq!(MatchPolicy::default().validate(), Ok(()));
    }

    #[test]
    fn test_network_dominant_weights_rejected() {
        let policy = MatchPolicy {
            embedding_weight: 0.3,
            network_weight: 0.7,
            ..MatchPolicy::default()
        };
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::NetworkDominant { .. })
        ));
    }

    #[test]
    fn test_boost_ordering_rejected_when_inverted() {
        let policy = MatchPolicy {
            first_degree_boost: 0.1,
            second_degree_boost: 0.4,
            ..MatchPolicy::default()
        };
        assert!(matches!(
            policy.validate(),
            Err(PolicyError::BoostOrdering { .. })
        ));

        let zero_second = MatchPolicy {
            second_degree_boost: 0.0,
            ..MatchPolicy::default()
        };
        assert!(zero_second.validate().is_err());
    }

    #[test]
    fn test_network_score_is_monotonic() {
        let policy = MatchPolicy::default();
        let first = policy.network_score(Degree::First);
        let second = policy.network_score(Degree::Second);
        let other = policy.network_score(Degree::Other);
        assert!(first > second);
        assert!(second > other);
        assert_eq!(other, 0.0);
    }

    #[test]
    fn test_combined_score_clamps() {
        let policy = MatchPolicy {
            embedding_weight: 1.0,
            network_weight: 1.0,
            first_degree_boost: 1.0,
            second_degree_boost: 0.5,
            top_k: 5,
        };
        assert_eq!(policy.combined_score(1.0, 1.0), 1.0);
        assert_eq!(policy.combined_score(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_combined_score_default_weights() {
        let policy = MatchPolicy::default();
        // 0.9 * 0.8 + 0.0 * 0.2
        assert!((policy.combined_score(0.9, 0.0) - 0.72).abs() < 1e-6);
        // 0.6 * 0.8 + 0.5 * 0.2
        assert!((policy.combined_score(0.6, 0.5) - 0.58).abs() < 1e-6);
    }
}
