//! Boundary to the external embedding provider

use rustc_hash::FxHashSet;

/// Source of semantic similarity scores.
///
/// The real provider embeds profile and opportunity text out of process;
/// this engine only ever sees the resulting number, which it clamps into
/// [0, 1] before use. Implementations hold no engine state.
pub trait SimilarityProvider: Send + Sync {
    /// Semantic similarity between an opportunity's text and a user's
    /// profile text, expected in [0, 1].
    fn similarity(&self, opportunity_text: &str, profile_text: &str) -> f32;
}

/// Deterministic lexical fallback: Jaccard overlap of lowercase word sets.
///
/// Used by tests and the demo binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokenOverlapSimilarity;

fn tokens(text: &str) -> FxHashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

impl SimilarityProvider for TokenOverlapSimilarity {
    fn similarity(&self, opportunity_text: &str, profile_text: &str) -> f32 {
        let a = tokens(opportunity_text);
        let b = tokens(profile_text);
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        let intersection = a.intersection(&b).count();
        let union = a.len() + b.len() - intersection;
        intersection as f32 / union as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_text_scores_one() {
        let provider = TokenOverlapSimilarity;
        assert_eq!(provider.similarity("rust graph engine", "rust graph engine"), 1.0);
    }

    #[test]
    fn test_disjoint_text_scores_zero() {
        let provider = TokenOverlapSimilarity;
        assert_eq!(provider.similarity("pottery workshop", "kubernetes cluster"), 0.0);
        assert_eq!(provider.similarity("", "anything"), 0.0);
    }

    #[test]
    fn test_overlap_is_symmetric_and_case_insensitive() {
        let provider = TokenOverlapSimilarity;
        let a = provider.similarity("Design a Mobile App", "mobile design portfolio");
        let b = provider.similarity("mobile design portfolio", "Design a Mobile App");
        assert_eq!(a, b);
        assert!(a > 0.0 && a < 1.0);
    }
}
