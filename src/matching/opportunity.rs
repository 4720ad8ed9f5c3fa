//! Opportunity records and their arena store

use crate::graph::{OpportunityId, OpportunityType, UserId};
use serde::{Deserialize, Serialize};

/// A posted opportunity. Immutable once created; there is no edit flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
    /// Unique identifier
    pub id: OpportunityId,

    /// Opportunity category
    #[serde(rename = "type")]
    pub kind: OpportunityType,

    /// Short title
    pub title: String,

    /// Longer free-text description
    pub description: String,

    /// The user who posted it
    pub posted_by: UserId,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
}

impl Opportunity {
    /// The text handed to the embedding provider for candidate scoring.
    pub fn text(&self) -> String {
        format!("{}. {}", self.title, self.description)
    }
}

/// Arena store for opportunities.
#[derive(Debug)]
pub struct OpportunityStore {
    opportunities: Vec<Option<Opportunity>>,
    next_id: u64,
}

impl Default for OpportunityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OpportunityStore {
    pub fn new() -> Self {
        OpportunityStore {
            opportunities: Vec::new(),
            next_id: 1,
        }
    }

    /// Create an opportunity with an auto-generated id
    pub fn create(
        &mut self,
        kind: OpportunityType,
        title: impl Into<String>,
        description: impl Into<String>,
        posted_by: UserId,
    ) -> OpportunityId {
        let id = OpportunityId::new(self.next_id);
        self.next_id += 1;
        let idx = id.as_u64() as usize;

        if idx >= self.opportunities.len() {
            self.opportunities.resize(idx + 1, None);
        }
        self.opportunities[idx] = Some(Opportunity {
            id,
            kind,
            title: title.into(),
            description: description.into(),
            posted_by,
            created_at: chrono::Utc::now().timestamp_millis(),
        });
        id
    }

    pub fn get(&self, id: OpportunityId) -> Option<&Opportunity> {
        self.opportunities
            .get(id.as_u64() as usize)
            .and_then(Option::as_ref)
    }

    pub fn has(&self, id: OpportunityId) -> bool {
        self.get(id).is_some()
    }

    /// All opportunities, in id order
    pub fn all(&self) -> impl Iterator<Item = &Opportunity> {
        self.opportunities.iter().flatten()
    }

    pub fn count(&self) -> usize {
        self.opportunities.iter().flatten().count()
    }
}
