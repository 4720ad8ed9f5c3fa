//! Degree-of-separation layering over the social graph

use crate::graph::{ConnectionSource, GraphError, GraphResult, SocialGraph, UserId};
use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::fmt;

/// Network distance between two users, as exposed to discovery search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Degree {
    #[serde(rename = "1st")]
    First,
    #[serde(rename = "2nd")]
    Second,
    #[serde(rename = "other")]
    Other,
}

impl Degree {
    pub fn as_str(&self) -> &'static str {
        match self {
            Degree::First => "1st",
            Degree::Second => "2nd",
            Degree::Other => "other",
        }
    }

    /// Sort rank: closer degrees order first.
    pub(crate) fn rank(&self) -> u8 {
        match self {
            Degree::First => 0,
            Degree::Second => 1,
            Degree::Other => 2,
        }
    }
}

impl fmt::Display for Degree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One member of a user's layered network.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkMember {
    pub user_id: UserId,
    pub name: String,
    pub connection_count: usize,
    /// How the direct edge was created; only set for first-degree members.
    pub source: Option<ConnectionSource>,
    /// First-degree names bridging to this member; only non-empty for
    /// second-degree members, ordered by first encounter.
    pub shared_connections: Vec<String>,
}

/// A user's network, split into first- and second-degree layers.
#[derive(Debug, Clone, Serialize)]
pub struct LayeredNetwork {
    pub first_degree: Vec<NetworkMember>,
    pub second_degree: Vec<NetworkMember>,
    pub pending_incoming: usize,
}

/// Direct neighbor ids of `user` as a lookup set.
pub fn first_degree_ids(graph: &SocialGraph, user: UserId) -> FxHashSet<UserId> {
    graph.neighbors(user).into_iter().collect()
}

/// Users reachable in exactly two hops, each mapped to the deduplicated,
/// first-encounter-ordered names of the first-degree members bridging to
/// them. Never contains `user` or any first-degree member.
///
/// Cost is O(|first_degree| * avg_degree); the rest of the graph is never
/// touched.
pub fn second_degree_map(graph: &SocialGraph, user: UserId) -> IndexMap<UserId, IndexSet<String>> {
    let first = graph.neighbors(user);
    let first_set: FxHashSet<UserId> = first.iter().copied().collect();

    let mut second: IndexMap<UserId, IndexSet<String>> = IndexMap::new();
    for &bridge in &first {
        let bridge_name = match graph.get_user(bridge) {
            Some(u) => u.name.clone(),
            None => continue,
        };
        for candidate in graph.neighbors(bridge) {
            if candidate == user || first_set.contains(&candidate) {
                continue;
            }
            second
                .entry(candidate)
                .or_default()
                .insert(bridge_name.clone());
        }
    }
    second
}

/// Classify `other` relative to `viewer` using precomputed layers.
pub(crate) fn classify(
    other: UserId,
    first: &FxHashSet<UserId>,
    second: &IndexMap<UserId, IndexSet<String>>,
) -> Degree {
    if first.contains(&other) {
        Degree::First
    } else if second.contains_key(&other) {
        Degree::Second
    } else {
        Degree::Other
    }
}

/// Network distance between two users.
pub fn degree_between(graph: &SocialGraph, viewer: UserId, other: UserId) -> Degree {
    let first = first_degree_ids(graph, viewer);
    let second = second_degree_map(graph, viewer);
    classify(other, &first, &second)
}

/// Compute the layered network for `user`.
///
/// `pending_incoming` is supplied by the caller (the request workflow owns
/// that count); the layers themselves are a pure projection of the graph.
pub fn layered_network(
    graph: &SocialGraph,
    user: UserId,
    pending_incoming: usize,
) -> GraphResult<LayeredNetwork> {
    if !graph.has_user(user) {
        return Err(GraphError::UserNotFound(user));
    }

    let mut first_degree = Vec::new();
    for conn in graph.connections_of(user) {
        let other_id = match conn.other(user) {
            Some(id) => id,
            None => continue,
        };
        if let Some(other) = graph.get_user(other_id) {
            first_degree.push(NetworkMember {
                user_id: other_id,
                name: other.name.clone(),
                connection_count: graph.connection_count(other_id),
                source: Some(conn.source),
                shared_connections: Vec::new(),
            });
        }
    }

    let mut second_degree = Vec::new();
    for (member_id, bridges) in second_degree_map(graph, user) {
        if let Some(member) = graph.get_user(member_id) {
            second_degree.push(NetworkMember {
                user_id: member_id,
                name: member.name.clone(),
                connection_count: graph.connection_count(member_id),
                source: None,
                shared_connections: bridges.into_iter().collect(),
            });
        }
    }

    Ok(LayeredNetwork {
        first_degree,
        second_degree,
        pending_incoming,
    })
}
