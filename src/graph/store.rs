//! In-memory social graph storage

use super::edge::{pair_key, Connection};
use super::types::{ConnectionSource, EdgeId, OpportunityType, UserId};
use super::user::User;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("user {0} not found")]
    UserNotFound(UserId),

    #[error("edge {0} not found")]
    EdgeNotFound(EdgeId),

    #[error("cannot connect user {0} to themselves")]
    SelfConnection(UserId),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// In-memory social graph: the arena of users plus their connection edges.
///
/// Uses index-based adjacency rather than pointer-linked nodes, so cycles
/// in the connection graph carry no ownership implications:
/// - users: UserId -> User (arena, id is the slot index)
/// - edges: EdgeId -> Connection (arena)
/// - adjacency: UserId -> Vec<EdgeId>
/// - pair_index: normalized (UserId, UserId) -> EdgeId, backing the
///   one-edge-per-unordered-pair invariant and idempotent insertion
#[derive(Debug)]
pub struct SocialGraph {
    users: Vec<Option<User>>,
    edges: Vec<Option<Connection>>,
    adjacency: Vec<Vec<EdgeId>>,
    pair_index: FxHashMap<(UserId, UserId), EdgeId>,
    next_user_id: u64,
    next_edge_id: u64,
}

impl SocialGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        SocialGraph {
            users: Vec::with_capacity(1024),
            edges: Vec::with_capacity(4096),
            adjacency: Vec::with_capacity(1024),
            pair_index: FxHashMap::default(),
            next_user_id: 1,
            next_edge_id: 1,
        }
    }

    /// Register a user with an auto-generated id
    pub fn create_user(
        &mut self,
        name: impl Into<String>,
        bio: impl Into<String>,
        skills: BTreeSet<String>,
        interests: BTreeSet<String>,
        open_to: BTreeSet<OpportunityType>,
    ) -> UserId {
        let id = UserId::new(self.next_user_id);
        self.next_user_id += 1;
        let idx = id.as_u64() as usize;

        // Ensure storage capacity
        if idx >= self.users.len() {
            self.users.resize(idx + 1, None);
            self.adjacency.resize(idx + 1, Vec::new());
        }

        self.users[idx] = Some(User::new(id, name, bio, skills, interests, open_to));
        id
    }

    /// Get a user by id
    pub fn get_user(&self, id: UserId) -> Option<&User> {
        self.users.get(id.as_u64() as usize).and_then(Option::as_ref)
    }

    /// Get a mutable user by id
    pub fn get_user_mut(&mut self, id: UserId) -> Option<&mut User> {
        self.users
            .get_mut(id.as_u64() as usize)
            .and_then(Option::as_mut)
    }

    /// Check if a user exists
    pub fn has_user(&self, id: UserId) -> bool {
        self.get_user(id).is_some()
    }

    /// Total number of users
    pub fn user_count(&self) -> usize {
        self.users.iter().flatten().count()
    }

    /// All users, in id order
    pub fn all_users(&self) -> impl Iterator<Item = &User> {
        self.users.iter().flatten()
    }

    /// Insert a connection between two users.
    ///
    /// Idempotent: if an edge for the pair already exists (in either
    /// orientation) the existing edge id is returned and nothing changes.
    pub fn connect(
        &mut self,
        a: UserId,
        b: UserId,
        source: ConnectionSource,
    ) -> GraphResult<EdgeId> {
        if a == b {
            return Err(GraphError::SelfConnection(a));
        }
        if !self.has_user(a) {
            return Err(GraphError::UserNotFound(a));
        }
        if !self.has_user(b) {
            return Err(GraphError::UserNotFound(b));
        }

        let key = pair_key(a, b);
        if let Some(&existing) = self.pair_index.get(&key) {
            return Ok(existing);
        }

        let edge_id = EdgeId::new(self.next_edge_id);
        self.next_edge_id += 1;
        let idx = edge_id.as_u64() as usize;

        if idx >= self.edges.len() {
            self.edges.resize(idx + 1, None);
        }

        self.edges[idx] = Some(Connection::new(edge_id, a, b, source));
        self.adjacency[a.as_u64() as usize].push(edge_id);
        self.adjacency[b.as_u64() as usize].push(edge_id);
        self.pair_index.insert(key, edge_id);

        Ok(edge_id)
    }

    /// Get an edge by id
    pub fn get_connection(&self, id: EdgeId) -> Option<&Connection> {
        self.edges.get(id.as_u64() as usize).and_then(Option::as_ref)
    }

    /// The edge between two users, if any (orientation-free)
    pub fn connection_between(&self, a: UserId, b: UserId) -> Option<&Connection> {
        self.pair_index
            .get(&pair_key(a, b))
            .and_then(|&id| self.get_connection(id))
    }

    /// Whether a direct edge exists between two users
    pub fn are_connected(&self, a: UserId, b: UserId) -> bool {
        self.pair_index.contains_key(&pair_key(a, b))
    }

    /// All edges touching a user, in insertion order
    pub fn connections_of(&self, user: UserId) -> Vec<&Connection> {
        self.adjacency
            .get(user.as_u64() as usize)
            .map(|edge_ids| {
                edge_ids
                    .iter()
                    .filter_map(|&id| self.get_connection(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Direct neighbors of a user, in edge insertion order
    pub fn neighbors(&self, user: UserId) -> Vec<UserId> {
        self.connections_of(user)
            .into_iter()
            .filter_map(|c| c.other(user))
            .collect()
    }

    /// Number of direct connections a user has
    pub fn connection_count(&self, user: UserId) -> usize {
        self.adjacency
            .get(user.as_u64() as usize)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Total number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.iter().flatten().count()
    }
}

impl Default for SocialGraph {
    fn default() -> Self {
        Self::new()
    }
}
