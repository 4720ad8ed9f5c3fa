//! Undirected connection edges between users

use super::types::{ConnectionSource, EdgeId, UserId};
use serde::{Deserialize, Serialize};

/// An undirected connection between two users.
///
/// At most one edge exists per unordered user pair; the store enforces
/// this and treats repeated inserts (in either orientation) as no-ops.
/// Connections are never deleted in normal operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    /// Unique identifier for this edge
    pub id: EdgeId,

    /// One endpoint
    pub user_a: UserId,

    /// The other endpoint
    pub user_b: UserId,

    /// How the edge came to exist
    pub source: ConnectionSource,

    /// Relationship strength in [0, 1]
    pub strength: f32,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
}

impl Connection {
    /// Create a new connection with the default strength.
    pub fn new(id: EdgeId, user_a: UserId, user_b: UserId, source: ConnectionSource) -> Self {
        Connection {
            id,
            user_a,
            user_b,
            source,
            strength: 1.0,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Check if this edge connects two specific users (in either direction)
    pub fn connects(&self, u1: UserId, u2: UserId) -> bool {
        (self.user_a == u1 && self.user_b == u2) || (self.user_a == u2 && self.user_b == u1)
    }

    /// The endpoint opposite `user`, if `user` is an endpoint at all.
    pub fn other(&self, user: UserId) -> Option<UserId> {
        if self.user_a == user {
            Some(self.user_b)
        } else if self.user_b == user {
            Some(self.user_a)
        } else {
            None
        }
    }
}

/// Normalized key for the unordered pair, used by the uniqueness index.
pub(crate) fn pair_key(a: UserId, b: UserId) -> (UserId, UserId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connects_either_direction() {
        let edge = Connection::new(
            EdgeId::new(1),
            UserId::new(1),
            UserId::new(2),
            ConnectionSource::Request,
        );
        assert!(edge.connects(UserId::new(1), UserId::new(2)));
        assert!(edge.connects(UserId::new(2), UserId::new(1)));
        assert!(!edge.connects(UserId::new(1), UserId::new(3)));
        assert_eq!(edge.strength, 1.0);
    }

    #[test]
    fn test_other_endpoint() {
        let edge = Connection::new(
            EdgeId::new(2),
            UserId::new(4),
            UserId::new(7),
            ConnectionSource::Discovery,
        );
        assert_eq!(edge.other(UserId::new(4)), Some(UserId::new(7)));
        assert_eq!(edge.other(UserId::new(7)), Some(UserId::new(4)));
        assert_eq!(edge.other(UserId::new(9)), None);
    }

    #[test]
    fn test_pair_key_is_orientation_free() {
        let a = UserId::new(3);
        let b = UserId::new(11);
        assert_eq!(pair_key(a, b), pair_key(b, a));
        assert_eq!(pair_key(a, b), (a, b));
    }
}
