//! Social graph index: degree layering and discovery search
//!
//! Answers "who is directly or indirectly connected to whom" and "through
//! whom" as read-time projections over the canonical connection records,
//! without a full-graph traversal per request.

pub mod layers;
pub mod search;

pub use layers::{
    degree_between, first_degree_ids, layered_network, second_degree_map, Degree, LayeredNetwork,
    NetworkMember,
};
pub use search::{search, SearchResult};
