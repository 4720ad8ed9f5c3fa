//! Candidate scoring, ranking and explanations

use super::opportunity::Opportunity;
use super::policy::{clamp01, MatchPolicy};
use super::similarity::SimilarityProvider;
use crate::graph::{MatchId, OpportunityId, SocialGraph, UserId};
use crate::network::layers::{classify, first_degree_ids, second_degree_map, Degree};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// One row of a ranked match snapshot.
///
/// Matches are immutable once computed; re-running matching for an
/// opportunity replaces the whole set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub opportunity_id: OpportunityId,
    pub user_id: UserId,
    /// Externally supplied semantic similarity, clamped to [0, 1]
    pub embedding_score: f32,
    /// Network proximity boost in [0, 1]
    pub network_score: f32,
    /// Blended score in [0, 1]
    pub score: f32,
    /// Human-readable justification, derived from the scoring signals
    pub explanation: String,
    /// 1-based position, unique and contiguous per opportunity
    pub rank: u32,
    pub created_at: i64,
}

/// Compute the ranked match set for an opportunity.
///
/// The candidate pool is every stored user except the poster, users not
/// open to the opportunity's category, and the ids in `excluded` (users
/// already connected to the poster through this exact opportunity).
/// Ordering is score desc, then embedding score desc, then candidate id,
/// so the output is fully deterministic for fixed inputs.
pub fn rank_candidates(
    graph: &SocialGraph,
    opportunity: &Opportunity,
    policy: &MatchPolicy,
    provider: &dyn SimilarityProvider,
    excluded: &FxHashSet<UserId>,
) -> Vec<Match> {
    let opportunity_text = opportunity.text();
    let opportunity_text_lower = opportunity_text.to_lowercase();

    let poster = opportunity.posted_by;
    let first = first_degree_ids(graph, poster);
    let second = second_degree_map(graph, poster);

    struct Scored {
        user_id: UserId,
        embedding_score: f32,
        network_score: f32,
        score: f32,
        explanation: String,
    }

    let mut scored: Vec<Scored> = graph
        .all_users()
        .filter(|u| u.id != poster)
        .filter(|u| u.is_open_to(opportunity.kind))
        .filter(|u| !excluded.contains(&u.id))
        .map(|user| {
            let embedding_score =
                clamp01(provider.similarity(&opportunity_text, &user.profile_text()));
            let degree = classify(user.id, &first, &second);
            let network_score = policy.network_score(degree);
            let score = policy.combined_score(embedding_score, network_score);

            let bridges: Vec<String> = second
                .get(&user.id)
                .map(|names| names.iter().cloned().collect())
                .unwrap_or_default();
            let explanation = build_explanation(
                user,
                &opportunity_text_lower,
                embedding_score,
                network_score,
                degree,
                &bridges,
                policy,
            );

            Scored {
                user_id: user.id,
                embedding_score,
                network_score,
                score,
                explanation,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(b.embedding_score.total_cmp(&a.embedding_score))
            .then(a.user_id.cmp(&b.user_id))
    });
    scored.truncate(policy.top_k);

    let created_at = chrono::Utc::now().timestamp_millis();
    scored
        .into_iter()
        .enumerate()
        .map(|(i, s)| Match {
            id: MatchId::new(),
            opportunity_id: opportunity.id,
            user_id: s.user_id,
            embedding_score: s.embedding_score,
            network_score: s.network_score,
            score: s.score,
            explanation: s.explanation,
            rank: (i + 1) as u32,
            created_at,
        })
        .collect()
}

/// Render the justification from exactly the signals that were scored.
///
/// The dominant contribution (embedding vs. network, after weighting)
/// leads; skill and interest overlap with the opportunity text are listed
/// only when present, and the network path only when it contributed.
fn build_explanation(
    user: &crate::graph::User,
    opportunity_text_lower: &str,
    embedding_score: f32,
    network_score: f32,
    degree: Degree,
    bridges: &[String],
    policy: &MatchPolicy,
) -> String {
    let fit_level = if embedding_score >= 0.75 {
        "strong"
    } else if embedding_score >= 0.4 {
        "good"
    } else {
        "modest"
    };
    let fit = format!("{fit_level} profile fit ({embedding_score:.2} similarity)");

    let network_path = match degree {
        Degree::First => Some("a direct connection of the poster".to_string()),
        Degree::Second => {
            if bridges.is_empty() {
                Some("in the poster's extended network".to_string())
            } else {
                Some(format!("connected through {}", bridges.join(" and ")))
            }
        }
        Degree::Other => None,
    };

    let mut parts = Vec::new();
    let embedding_part = embedding_score * policy.embedding_weight;
    let network_part = network_score * policy.network_weight;
    match network_path {
        Some(path) if network_part > embedding_part => {
            parts.push(path);
            parts.push(fit);
        }
        Some(path) => {
            parts.push(fit);
            parts.push(path);
        }
        None => parts.push(fit),
    }

    let matched_skills: Vec<&str> = user
        .skills
        .iter()
        .filter(|s| opportunity_text_lower.contains(&s.to_lowercase()))
        .map(String::as_str)
        .collect();
    if !matched_skills.is_empty() {
        parts.push(format!("relevant skills: {}", matched_skills.join(", ")));
    }

    let matched_interests: Vec<&str> = user
        .interests
        .iter()
        .filter(|s| opportunity_text_lower.contains(&s.to_lowercase()))
        .map(String::as_str)
        .collect();
    if !matched_interests.is_empty() {
        parts.push(format!("shared interests: {}", matched_interests.join(", ")));
    }

    let mut text = parts.join("; ");
    if let Some(first_char) = text.get(..1) {
        let upper = first_char.to_uppercase();
        text.replace_range(..1, &upper);
    }
    text.push('.');
    text
}

/// Snapshot store for ranked match sets, keyed by opportunity.
///
/// `replace` swaps the whole set for an opportunity in one step; readers
/// holding the store never observe a partial mix of two runs.
#[derive(Debug, Default)]
pub struct MatchStore {
    by_opportunity: FxHashMap<OpportunityId, Vec<Match>>,
}

impl MatchStore {
    pub fn new() -> Self {
        MatchStore {
            by_opportunity: FxHashMap::default(),
        }
    }

    /// Replace the match set for an opportunity wholesale.
    pub fn replace(&mut self, opportunity_id: OpportunityId, matches: Vec<Match>) {
        self.by_opportunity.insert(opportunity_id, matches);
    }

    /// The current match set, in rank order.
    pub fn get(&self, opportunity_id: OpportunityId) -> &[Match] {
        self.by_opportunity
            .get(&opportunity_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
