//! Serendip matching & social-graph engine
//!
//! Pairs people with posted opportunities by blending semantic fit with
//! social proximity, and maintains the social graph used for discovery,
//! connection requests and reputation.
//!
//! # Architecture
//!
//! - `graph`: canonical store — user arena, undirected connection edges,
//!   one edge per unordered pair, idempotent insertion
//! - `network`: degree-of-separation layering and discovery search
//! - `matching`: opportunity records, scoring policy and the ranked,
//!   explained match snapshots
//! - `requests`: the pending → accepted/declined state machine that is the
//!   only source of request-created edges
//! - `feedback`: anonymous feedback gated on completed interactions,
//!   aggregated into per-user impressions
//! - `engine`: the facade the presentation layer calls, with per-store
//!   `tokio::sync::RwLock` guards and an explicit actor on every mutation
//!
//! ## Example Usage
//!
//! ```rust
//! use serendip::graph::{ConnectionSource, SocialGraph};
//! use serendip::network::layered_network;
//! use std::collections::BTreeSet;
//!
//! let mut graph = SocialGraph::new();
//! let ana = graph.create_user("Ana", "designer", BTreeSet::new(), BTreeSet::new(), BTreeSet::new());
//! let ben = graph.create_user("Ben", "engineer", BTreeSet::new(), BTreeSet::new(), BTreeSet::new());
//! let eva = graph.create_user("Eva", "writer", BTreeSet::new(), BTreeSet::new(), BTreeSet::new());
//!
//! graph.connect(ana, ben, ConnectionSource::Request).unwrap();
//! graph.connect(ben, eva, ConnectionSource::Request).unwrap();
//!
//! let network = layered_network(&graph, ana, 0).unwrap();
//! assert_eq!(network.first_degree.len(), 1);
//! assert_eq!(network.second_degree.len(), 1);
//! assert_eq!(network.second_degree[0].shared_connections, vec!["Ben"]);
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod feedback;
pub mod graph;
pub mod matching;
pub mod network;
pub mod requests;

// Re-export main types for convenience
pub use graph::{
    Connection, ConnectionSource, EdgeId, FeedbackId, GraphError, GraphResult, MatchId,
    OpportunityId, OpportunityType, RequestId, RequestStatus, SocialGraph, User, UserId,
};

pub use network::{
    degree_between, layered_network, search, Degree, LayeredNetwork, NetworkMember, SearchResult,
};

pub use matching::{
    rank_candidates, Match, MatchPolicy, MatchStore, Opportunity, OpportunityStore, PolicyError,
    SimilarityProvider, TokenOverlapSimilarity,
};

pub use requests::{ConnectionRequest, RequestError, RequestResult, RequestStore};

pub use feedback::{
    compute_impression, interaction_digest, Experience, Feedback, FeedbackError, FeedbackResult,
    FeedbackStore, Impression,
};

pub use config::{ConfigError, EngineConfig};

pub use engine::{Engine, EngineError, EngineResult, ErrorKind};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let ver = version();
        assert!(!ver.is_empty());
        assert_eq!(ver, "0.1.0");
    }
}
