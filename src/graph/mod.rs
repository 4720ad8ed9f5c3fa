//! Core social graph implementation
//!
//! This module implements the canonical data model:
//! - User profiles stored in an id-indexed arena
//! - Undirected connection edges with at most one edge per unordered pair
//! - Idempotent edge insertion backed by a normalized pair index

pub mod edge;
pub mod store;
pub mod types;
pub mod user;

// Re-export main types
pub use edge::Connection;
pub use store::{GraphError, GraphResult, SocialGraph};
pub use types::{
    ConnectionSource, EdgeId, FeedbackId, MatchId, OpportunityId, OpportunityType, RequestId,
    RequestStatus, UserId,
};
pub use user::User;
