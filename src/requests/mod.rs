//! Connection request workflow
//!
//! A small state machine: requests are created `pending` and move exactly
//! once to `accepted` or `declined`. At most one pending request exists
//! per (from, to, opportunity) triple; the pending-key index makes the
//! duplicate probe and the insert a single step under the store's write
//! guard.

use crate::graph::{MatchId, OpportunityId, RequestId, RequestStatus, UserId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by the request workflow
#[derive(Error, Debug, PartialEq)]
pub enum RequestError {
    #[error("request {0} not found")]
    NotFound(RequestId),

    #[error("request {request} is {status}, not pending")]
    InvalidState {
        request: RequestId,
        status: RequestStatus,
    },

    #[error("a pending request from {from} to {to} for {opportunity} already exists")]
    DuplicatePending {
        from: UserId,
        to: UserId,
        opportunity: OpportunityId,
    },

    #[error("user {user} is not the recipient of request {request}")]
    NotRecipient { request: RequestId, user: UserId },
}

pub type RequestResult<T> = Result<T, RequestError>;

/// A connection request between two users in an opportunity context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRequest {
    pub id: RequestId,
    pub from_user_id: UserId,
    pub to_user_id: UserId,
    pub opportunity_id: OpportunityId,
    pub match_id: Option<MatchId>,
    pub status: RequestStatus,
    pub created_at: i64,
}

/// Store and state machine for connection requests.
///
/// - requests: RequestId -> ConnectionRequest
/// - order: insertion order, for deterministic newest-first listings
/// - pending_index: (from, to, opportunity) -> RequestId, one entry per
///   live pending request; terminal requests leave the index, so a decline
///   never blocks resubmission
#[derive(Debug, Default)]
pub struct RequestStore {
    requests: FxHashMap<RequestId, ConnectionRequest>,
    order: Vec<RequestId>,
    pending_index: FxHashMap<(UserId, UserId, OpportunityId), RequestId>,
}

impl RequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pending request.
    ///
    /// The duplicate probe and the insert happen in one `&mut self` call,
    /// so under the store's write guard the check-and-insert is atomic.
    pub fn create(
        &mut self,
        from: UserId,
        to: UserId,
        opportunity: OpportunityId,
        match_id: Option<MatchId>,
    ) -> RequestResult<ConnectionRequest> {
        let key = (from, to, opportunity);
        if self.pending_index.contains_key(&key) {
            return Err(RequestError::DuplicatePending {
                from,
                to,
                opportunity,
            });
        }

        let request = ConnectionRequest {
            id: RequestId::new(),
            from_user_id: from,
            to_user_id: to,
            opportunity_id: opportunity,
            match_id,
            status: RequestStatus::Pending,
            created_at: chrono::Utc::now().timestamp_millis(),
        };
        self.pending_index.insert(key, request.id);
        self.order.push(request.id);
        self.requests.insert(request.id, request.clone());
        Ok(request)
    }

    /// Accept a pending request. Only the recipient may accept; the status
    /// check and the transition are one guarded step, so concurrent
    /// accept/decline calls resolve to exactly one winner.
    pub fn accept(&mut self, actor: UserId, id: RequestId) -> RequestResult<ConnectionRequest> {
        self.transition(actor, id, RequestStatus::Accepted)
    }

    /// Decline a pending request; no edge is ever created on this path.
    pub fn decline(&mut self, actor: UserId, id: RequestId) -> RequestResult<ConnectionRequest> {
        self.transition(actor, id, RequestStatus::Declined)
    }

    fn transition(
        &mut self,
        actor: UserId,
        id: RequestId,
        to_status: RequestStatus,
    ) -> RequestResult<ConnectionRequest> {
        let request = self
            .requests
            .get_mut(&id)
            .ok_or(RequestError::NotFound(id))?;
        if request.to_user_id != actor {
            return Err(RequestError::NotRecipient { request: id, user: actor });
        }
        if request.status != RequestStatus::Pending {
            return Err(RequestError::InvalidState {
                request: id,
                status: request.status,
            });
        }

        request.status = to_status;
        let key = (
            request.from_user_id,
            request.to_user_id,
            request.opportunity_id,
        );
        let snapshot = request.clone();
        self.pending_index.remove(&key);
        Ok(snapshot)
    }

    pub fn get(&self, id: RequestId) -> Option<&ConnectionRequest> {
        self.requests.get(&id)
    }

    /// Read-only idempotency probe: does a *pending* request exist for the
    /// triple? Mirrors the uniqueness rule `create` enforces.
    pub fn pending_exists(&self, from: UserId, to: UserId, opportunity: OpportunityId) -> bool {
        self.pending_index.contains_key(&(from, to, opportunity))
    }

    /// Pending requests addressed to `user`, newest first.
    pub fn incoming(&self, user: UserId) -> Vec<ConnectionRequest> {
        self.order
            .iter()
            .rev()
            .filter_map(|id| self.requests.get(id))
            .filter(|r| r.to_user_id == user && r.status == RequestStatus::Pending)
            .cloned()
            .collect()
    }

    /// All requests sent by `user`, newest first.
    pub fn outgoing(&self, user: UserId) -> Vec<ConnectionRequest> {
        self.order
            .iter()
            .rev()
            .filter_map(|id| self.requests.get(id))
            .filter(|r| r.from_user_id == user)
            .cloned()
            .collect()
    }

    /// All requests in an opportunity's context, newest first.
    pub fn for_opportunity(&self, opportunity: OpportunityId) -> Vec<ConnectionRequest> {
        self.order
            .iter()
            .rev()
            .filter_map(|id| self.requests.get(id))
            .filter(|r| r.opportunity_id == opportunity)
            .cloned()
            .collect()
    }

    /// Accepted requests between two users (either direction), oldest
    /// first. These are the completed interactions feedback eligibility is
    /// derived from.
    pub fn accepted_between(&self, a: UserId, b: UserId) -> Vec<&ConnectionRequest> {
        self.order
            .iter()
            .filter_map(|id| self.requests.get(id))
            .filter(|r| r.status == RequestStatus::Accepted)
            .filter(|r| {
                (r.from_user_id == a && r.to_user_id == b)
                    || (r.from_user_id == b && r.to_user_id == a)
            })
            .collect()
    }

    pub fn count(&self) -> usize {
        self.requests.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending_index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPP: OpportunityId = OpportunityId(1);

    fn users() -> (UserId, UserId) {
        (UserId::new(1), UserId::new(2))
    }

    #[test]
    fn test_create_starts_pending() {
        let mut store = RequestStore::new();
        let (a, b) = users();

        let req = store.create(a, b, OPP, None).unwrap();
        assert_eq!(req.status, RequestStatus::Pending);
        assert_eq!(req.from_user_id, a);
        assert!(store.pending_exists(a, b, OPP));
        assert_eq!(store.incoming(b).len(), 1);
        assert_eq!(store.outgoing(a).len(), 1);
    }

    #[test]
    fn test_duplicate_pending_rejected() {
        let mut store = RequestStore::new();
        let (a, b) = users();

        store.create(a, b, OPP, None).unwrap();
        let err = store.create(a, b, OPP, None).unwrap_err();
        assert!(matches!(err, RequestError::DuplicatePending { .. }));
        assert_eq!(store.count(), 1);

        // A different opportunity or direction is a different triple.
        store.create(a, b, OpportunityId(2), None).unwrap();
        store.create(b, a, OPP, None).unwrap();
        assert_eq!(store.count(), 3);
    }

    #[test]
    fn test_accept_transitions_and_is_terminal() {
        let mut store = RequestStore::new();
        let (a, b) = users();
        let req = store.create(a, b, OPP, None).unwrap();

        let accepted = store.accept(b, req.id).unwrap();
        assert_eq!(accepted.status, RequestStatus::Accepted);
        assert!(!store.pending_exists(a, b, OPP));

        // No transition out of a terminal state.
        let err = store.decline(b, req.id).unwrap_err();
        assert_eq!(
            err,
            RequestError::InvalidState {
                request: req.id,
                status: RequestStatus::Accepted,
            }
        );
        let err = store.accept(b, req.id).unwrap_err();
        assert!(matches!(err, RequestError::InvalidState { .. }));
    }

    #[test]
    fn test_only_recipient_may_resolve() {
        let mut store = RequestStore::new();
        let (a, b) = users();
        let req = store.create(a, b, OPP, None).unwrap();

        let err = store.accept(a, req.id).unwrap_err();
        assert_eq!(err, RequestError::NotRecipient { request: req.id, user: a });
        let err = store.decline(UserId::new(9), req.id).unwrap_err();
        assert!(matches!(err, RequestError::NotRecipient { .. }));

        // Still pending afterwards.
        assert_eq!(store.get(req.id).unwrap().status, RequestStatus::Pending);
    }

    #[test]
    fn test_decline_unblocks_resubmission() {
        let mut store = RequestStore::new();
        let (a, b) = users();
        let req = store.create(a, b, OPP, None).unwrap();

        store.decline(b, req.id).unwrap();
        assert!(!store.pending_exists(a, b, OPP));

        // The declined record stays, a fresh pending one is allowed.
        let second = store.create(a, b, OPP, None).unwrap();
        assert_ne!(second.id, req.id);
        assert_eq!(store.count(), 2);
        assert_eq!(store.pending_count(), 1);
    }

    #[test]
    fn test_missing_request_is_not_found() {
        let mut store = RequestStore::new();
        let ghost = RequestId::new();
        assert_eq!(
            store.accept(UserId::new(1), ghost).unwrap_err(),
            RequestError::NotFound(ghost)
        );
    }

    #[test]
    fn test_listings_are_newest_first() {
        let mut store = RequestStore::new();
        let (a, b) = users();
        let first = store.create(a, b, OpportunityId(1), None).unwrap();
        let second = store.create(a, b, OpportunityId(2), None).unwrap();

        let incoming = store.incoming(b);
        assert_eq!(incoming[0].id, second.id);
        assert_eq!(incoming[1].id, first.id);

        // Resolved requests leave the incoming (pending) listing only.
        store.accept(b, first.id).unwrap();
        assert_eq!(store.incoming(b).len(), 1);
        assert_eq!(store.outgoing(a).len(), 2);
    }

    #[test]
    fn test_accepted_between_is_direction_free() {
        let mut store = RequestStore::new();
        let (a, b) = users();
        let r1 = store.create(a, b, OpportunityId(1), None).unwrap();
        let r2 = store.create(b, a, OpportunityId(2), None).unwrap();
        store.create(a, b, OpportunityId(3), None).unwrap(); // stays pending

        store.accept(b, r1.id).unwrap();
        store.accept(a, r2.id).unwrap();

        let accepted = store.accepted_between(a, b);
        assert_eq!(accepted.len(), 2);
        assert_eq!(accepted[0].id, r1.id);
        assert_eq!(accepted[1].id, r2.id);
        assert_eq!(store.accepted_between(a, UserId::new(42)).len(), 0);
    }
}
