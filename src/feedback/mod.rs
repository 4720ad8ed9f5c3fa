//! Anonymous feedback and impression aggregation
//!
//! Feedback is gated on completed interactions (accepted connection
//! requests) and stored without the submitter's id: the only link back is
//! a pseudonymous interaction digest used for the once-per-interaction
//! uniqueness check. Impressions are pure read-time projections over the
//! stored feedback set, cached per user and invalidated on write.

use crate::graph::{FeedbackId, OpportunityId, OpportunityType, UserId};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors produced by feedback submission
#[derive(Error, Debug, PartialEq)]
pub enum FeedbackError {
    #[error("feedback text is empty")]
    EmptyText,

    #[error("feedback for this interaction was already submitted")]
    AlreadySubmitted,
}

pub type FeedbackResult<T> = Result<T, FeedbackError>;

/// Pseudonymous key tying one feedback record to one completed interaction.
pub type InteractionDigest = [u8; 32];

/// Digest over (submitter, target, opportunity). Stored in place of the
/// submitter id: readers of the feedback set cannot recover who wrote
/// what, but a repeat submission for the same interaction is detectable.
pub fn interaction_digest(
    from: UserId,
    to: UserId,
    opportunity: OpportunityId,
) -> InteractionDigest {
    let mut hasher = Sha256::new();
    hasher.update(from.as_u64().to_be_bytes());
    hasher.update(to.as_u64().to_be_bytes());
    hasher.update(opportunity.as_u64().to_be_bytes());
    hasher.finalize().into()
}

/// An anonymous feedback record.
#[derive(Debug, Clone, Serialize)]
pub struct Feedback {
    pub id: FeedbackId,
    pub to_user_id: UserId,
    pub opportunity_type: OpportunityType,
    pub text: String,
    pub created_at: i64,
    /// Never serialized; only the uniqueness check reads it.
    #[serde(skip)]
    pub(crate) interaction_digest: InteractionDigest,
}

/// A completed interaction still eligible for feedback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Experience {
    pub opportunity_id: OpportunityId,
    pub opportunity_type: OpportunityType,
    pub opportunity_title: String,
}

/// Aggregated, anonymized reputation summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Impression {
    /// Overall one-line summary; empty when there is no feedback, so
    /// callers can render an explicit "no feedback yet" state.
    pub summary: String,
    pub by_context: BTreeMap<OpportunityType, String>,
    pub feedback_count: usize,
}

impl Impression {
    fn empty() -> Self {
        Impression {
            summary: String::new(),
            by_context: BTreeMap::new(),
            feedback_count: 0,
        }
    }
}

/// Store for feedback records plus the impression cache.
#[derive(Debug, Default)]
pub struct FeedbackStore {
    feedback: Vec<Feedback>,
    used_digests: FxHashSet<InteractionDigest>,
    impression_cache: FxHashMap<UserId, Impression>,
}

impl FeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether feedback for this interaction was already submitted.
    pub fn has_feedback_for(&self, digest: &InteractionDigest) -> bool {
        self.used_digests.contains(digest)
    }

    /// Store one feedback record. The caller (the engine) has already
    /// resolved eligibility to a concrete interaction digest; this method
    /// still rejects blank text and digest reuse so the store never goes
    /// inconsistent.
    pub fn record(
        &mut self,
        to_user: UserId,
        opportunity_type: OpportunityType,
        text: &str,
        digest: InteractionDigest,
    ) -> FeedbackResult<FeedbackId> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(FeedbackError::EmptyText);
        }
        if !self.used_digests.insert(digest) {
            return Err(FeedbackError::AlreadySubmitted);
        }

        let id = FeedbackId::new();
        self.feedback.push(Feedback {
            id,
            to_user_id: to_user,
            opportunity_type,
            text: trimmed.to_string(),
            created_at: chrono::Utc::now().timestamp_millis(),
            interaction_digest: digest,
        });
        self.impression_cache.remove(&to_user);
        Ok(id)
    }

    /// All feedback left for a user, oldest first.
    pub fn for_user(&self, user: UserId) -> Vec<&Feedback> {
        self.feedback
            .iter()
            .filter(|f| f.to_user_id == user)
            .collect()
    }

    pub fn count(&self) -> usize {
        self.feedback.len()
    }

    /// The impression for a user, served read-through from the cache.
    pub fn impression(&mut self, user: UserId) -> Impression {
        if let Some(cached) = self.impression_cache.get(&user) {
            return cached.clone();
        }
        let computed = compute_impression(&self.for_user(user));
        self.impression_cache.insert(user, computed.clone());
        computed
    }
}

/// Aggregate an impression from a feedback set.
///
/// Pure: the same feedback set always produces the same output, which is
/// what makes the cache above safe.
pub fn compute_impression(feedback: &[&Feedback]) -> Impression {
    if feedback.is_empty() {
        return Impression::empty();
    }

    let mut grouped: BTreeMap<OpportunityType, usize> = BTreeMap::new();
    for f in feedback {
        *grouped.entry(f.opportunity_type).or_insert(0) += 1;
    }

    let by_context: BTreeMap<OpportunityType, String> = grouped
        .iter()
        .map(|(ty, n)| {
            let noun = if *n == 1 { "entry" } else { "entries" };
            (*ty, format!("{n} feedback {noun} from {ty} interactions"))
        })
        .collect();

    let total = feedback.len();
    let contexts: Vec<&str> = grouped.keys().map(|t| t.as_str()).collect();
    let plural = if total == 1 { "" } else { "s" };
    let summary = format!(
        "Based on {} community interaction{}; feedback spans {}.",
        total,
        plural,
        contexts.join(", ")
    );

    Impression {
        summary,
        by_context,
        feedback_count: total,
    }
}
