//! Engine facade
//!
//! Ties the stores together behind `tokio::sync::RwLock` guards and
//! exposes the operations the presentation layer calls. Every mutating
//! operation takes the authenticated actor as an explicit parameter;
//! there is no ambient "current user" state.
//!
//! Atomicity contracts all reduce to "check and mutate inside one write
//! guard": duplicate-request suppression, the pending-status
//! compare-and-swap on accept/decline, idempotent edge insertion and
//! wholesale match-set replacement. Where a transition spans two stores
//! (accept inserts a graph edge) the locks are taken in a fixed order:
//! requests before graph.

use crate::config::{ConfigError, EngineConfig};
use crate::feedback::{interaction_digest, Experience, FeedbackError, FeedbackStore, Impression};
use crate::graph::{
    ConnectionSource, EdgeId, GraphError, MatchId, OpportunityId, OpportunityType, RequestId,
    RequestStatus, SocialGraph, User, UserId,
};
use crate::matching::{
    rank_candidates, Match, MatchStore, Opportunity, OpportunityStore, SimilarityProvider,
};
use crate::network::{self, LayeredNetwork, SearchResult};
use crate::requests::{ConnectionRequest, RequestError, RequestStore};
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Stable error classification exposed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    DuplicateRequest,
    NotEligible,
    Validation,
    Forbidden,
}

/// Errors surfaced by engine operations. All are recoverable at the
/// caller; every mutating call either fully succeeds or fails leaving
/// state unchanged.
#[derive(Error, Debug, PartialEq)]
pub enum EngineError {
    #[error("user {0} not found")]
    UserNotFound(UserId),

    #[error("opportunity {0} not found")]
    OpportunityNotFound(OpportunityId),

    #[error("request {0} not found")]
    RequestNotFound(RequestId),

    #[error("request {request} is {status}, not pending")]
    InvalidState {
        request: RequestId,
        status: RequestStatus,
    },

    /// Deliberately non-fatal: the caller renders "already sent".
    #[error("a pending request for this user and opportunity already exists")]
    DuplicateRequest,

    #[error("no completed interaction is eligible for feedback")]
    NotEligible,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Forbidden(String),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::UserNotFound(_)
            | EngineError::OpportunityNotFound(_)
            | EngineError::RequestNotFound(_) => ErrorKind::NotFound,
            EngineError::InvalidState { .. } => ErrorKind::InvalidState,
            EngineError::DuplicateRequest => ErrorKind::DuplicateRequest,
            EngineError::NotEligible => ErrorKind::NotEligible,
            EngineError::Validation(_) => ErrorKind::Validation,
            EngineError::Forbidden(_) => ErrorKind::Forbidden,
        }
    }
}

impl From<GraphError> for EngineError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::UserNotFound(id) => EngineError::UserNotFound(id),
            GraphError::SelfConnection(_) => {
                EngineError::Validation("cannot connect a user to themselves".to_string())
            }
            GraphError::EdgeNotFound(id) => {
                EngineError::Validation(format!("connection {id} not found"))
            }
        }
    }
}

impl From<RequestError> for EngineError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::NotFound(id) => EngineError::RequestNotFound(id),
            RequestError::InvalidState { request, status } => {
                EngineError::InvalidState { request, status }
            }
            RequestError::DuplicatePending { .. } => EngineError::DuplicateRequest,
            RequestError::NotRecipient { .. } => EngineError::Forbidden(
                "only the recipient may accept or decline a request".to_string(),
            ),
        }
    }
}

impl From<FeedbackError> for EngineError {
    fn from(err: FeedbackError) -> Self {
        match err {
            FeedbackError::EmptyText => {
                EngineError::Validation("feedback text is empty".to_string())
            }
            FeedbackError::AlreadySubmitted => EngineError::NotEligible,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// The matching & social-graph engine.
pub struct Engine {
    graph: Arc<RwLock<SocialGraph>>,
    opportunities: Arc<RwLock<OpportunityStore>>,
    matches: Arc<RwLock<MatchStore>>,
    requests: Arc<RwLock<RequestStore>>,
    feedback: Arc<RwLock<FeedbackStore>>,
    similarity: Arc<dyn SimilarityProvider>,
    config: EngineConfig,
}

impl Engine {
    /// Create an engine with a validated configuration and a similarity
    /// provider.
    pub fn new(
        config: EngineConfig,
        similarity: Arc<dyn SimilarityProvider>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Engine {
            graph: Arc::new(RwLock::new(SocialGraph::new())),
            opportunities: Arc::new(RwLock::new(OpportunityStore::new())),
            matches: Arc::new(RwLock::new(MatchStore::new())),
            requests: Arc::new(RwLock::new(RequestStore::new())),
            feedback: Arc::new(RwLock::new(FeedbackStore::new())),
            similarity,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ============================================================
    // Users & profiles
    // ============================================================

    /// Register a new user.
    pub async fn register_user(
        &self,
        name: impl Into<String>,
        bio: impl Into<String>,
        skills: BTreeSet<String>,
        interests: BTreeSet<String>,
        open_to: BTreeSet<OpportunityType>,
    ) -> EngineResult<User> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(EngineError::Validation("name must not be empty".to_string()));
        }

        let mut graph = self.graph.write().await;
        let id = graph.create_user(name, bio, skills, interests, open_to);
        info!(user = %id, "registered user");
        Ok(graph.get_user(id).cloned().expect("just created"))
    }

    pub async fn user(&self, id: UserId) -> EngineResult<User> {
        self.graph
            .read()
            .await
            .get_user(id)
            .cloned()
            .ok_or(EngineError::UserNotFound(id))
    }

    /// Derived connection count for a user.
    pub async fn connection_count(&self, id: UserId) -> EngineResult<usize> {
        let graph = self.graph.read().await;
        if !graph.has_user(id) {
            return Err(EngineError::UserNotFound(id));
        }
        Ok(graph.connection_count(id))
    }

    /// Replace a user's skills. Only the profile owner may do this.
    pub async fn update_skills(
        &self,
        actor: UserId,
        user: UserId,
        skills: BTreeSet<String>,
    ) -> EngineResult<()> {
        self.update_profile(actor, user, |u| u.skills = skills).await
    }

    /// Replace a user's interests. Only the profile owner may do this.
    pub async fn update_interests(
        &self,
        actor: UserId,
        user: UserId,
        interests: BTreeSet<String>,
    ) -> EngineResult<()> {
        self.update_profile(actor, user, |u| u.interests = interests)
            .await
    }

    /// Replace the categories a user is open to. Owner only.
    pub async fn update_open_to(
        &self,
        actor: UserId,
        user: UserId,
        open_to: BTreeSet<OpportunityType>,
    ) -> EngineResult<()> {
        self.update_profile(actor, user, |u| u.open_to = open_to).await
    }

    async fn update_profile(
        &self,
        actor: UserId,
        user: UserId,
        apply: impl FnOnce(&mut User),
    ) -> EngineResult<()> {
        if actor != user {
            return Err(EngineError::Forbidden(
                "only the profile owner may edit it".to_string(),
            ));
        }
        let mut graph = self.graph.write().await;
        let record = graph
            .get_user_mut(user)
            .ok_or(EngineError::UserNotFound(user))?;
        apply(record);
        Ok(())
    }

    // ============================================================
    // Network & discovery
    // ============================================================

    /// Create a direct connection from a discovery flow. Idempotent.
    pub async fn connect_discovered(&self, actor: UserId, other: UserId) -> EngineResult<EdgeId> {
        let mut graph = self.graph.write().await;
        let edge = graph.connect(actor, other, ConnectionSource::Discovery)?;
        debug!(from = %actor, to = %other, edge = %edge, "discovery connection");
        Ok(edge)
    }

    /// The layered network for a user, including the pending-incoming
    /// request count.
    pub async fn layered_network(&self, user: UserId) -> EngineResult<LayeredNetwork> {
        let pending_incoming = self.requests.read().await.incoming(user).len();
        let graph = self.graph.read().await;
        Ok(network::layered_network(&graph, user, pending_incoming)?)
    }

    /// Free-text discovery search over all profiles except the viewer's.
    pub async fn search(&self, actor: UserId, query: &str) -> EngineResult<Vec<SearchResult>> {
        let graph = self.graph.read().await;
        Ok(network::search(&graph, query, actor, self.config.search_limit)?)
    }

    // ============================================================
    // Opportunities & matching
    // ============================================================

    /// Post an opportunity and compute its initial match set.
    pub async fn post_opportunity(
        &self,
        actor: UserId,
        kind: OpportunityType,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> EngineResult<(Opportunity, Vec<Match>)> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(EngineError::Validation("title must not be empty".to_string()));
        }
        if !self.graph.read().await.has_user(actor) {
            return Err(EngineError::UserNotFound(actor));
        }

        let opportunity = {
            let mut opportunities = self.opportunities.write().await;
            let id = opportunities.create(kind, title, description.into(), actor);
            opportunities.get(id).cloned().expect("just created")
        };
        info!(opportunity = %opportunity.id, poster = %actor, "posted opportunity");

        let matches = self.run_matching(&opportunity).await;
        Ok((opportunity, matches))
    }

    /// Re-run matching for an opportunity, replacing its match set
    /// atomically. Only the poster may trigger a re-run.
    pub async fn rematch(&self, actor: UserId, id: OpportunityId) -> EngineResult<Vec<Match>> {
        let opportunity = self.opportunity(id).await?;
        if opportunity.posted_by != actor {
            return Err(EngineError::Forbidden(
                "only the poster may re-run matching".to_string(),
            ));
        }
        Ok(self.run_matching(&opportunity).await)
    }

    async fn run_matching(&self, opportunity: &Opportunity) -> Vec<Match> {
        // Users already connected to the poster through this exact
        // opportunity leave the pool; pending requests do not.
        let excluded: FxHashSet<UserId> = {
            let requests = self.requests.read().await;
            requests
                .for_opportunity(opportunity.id)
                .into_iter()
                .filter(|r| r.status == RequestStatus::Accepted)
                .filter_map(|r| {
                    if r.from_user_id == opportunity.posted_by {
                        Some(r.to_user_id)
                    } else if r.to_user_id == opportunity.posted_by {
                        Some(r.from_user_id)
                    } else {
                        None
                    }
                })
                .collect()
        };

        let computed = {
            let graph = self.graph.read().await;
            rank_candidates(
                &graph,
                opportunity,
                &self.config.matching,
                self.similarity.as_ref(),
                &excluded,
            )
        };

        debug!(
            opportunity = %opportunity.id,
            matches = computed.len(),
            "match set computed"
        );
        self.matches
            .write()
            .await
            .replace(opportunity.id, computed.clone());
        computed
    }

    pub async fn opportunity(&self, id: OpportunityId) -> EngineResult<Opportunity> {
        self.opportunities
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(EngineError::OpportunityNotFound(id))
    }

    pub async fn opportunities(&self) -> Vec<Opportunity> {
        self.opportunities.read().await.all().cloned().collect()
    }

    /// The stored match set for an opportunity, in rank order.
    pub async fn matches(&self, id: OpportunityId) -> EngineResult<Vec<Match>> {
        if !self.opportunities.read().await.has(id) {
            return Err(EngineError::OpportunityNotFound(id));
        }
        Ok(self.matches.read().await.get(id).to_vec())
    }

    // ============================================================
    // Connection requests
    // ============================================================

    /// Send a connection request in an opportunity context.
    pub async fn send_request(
        &self,
        actor: UserId,
        to: UserId,
        opportunity: OpportunityId,
        match_id: Option<MatchId>,
    ) -> EngineResult<ConnectionRequest> {
        if actor == to {
            return Err(EngineError::Validation(
                "cannot send a request to yourself".to_string(),
            ));
        }
        {
            let graph = self.graph.read().await;
            if !graph.has_user(actor) {
                return Err(EngineError::UserNotFound(actor));
            }
            if !graph.has_user(to) {
                return Err(EngineError::UserNotFound(to));
            }
        }
        if !self.opportunities.read().await.has(opportunity) {
            return Err(EngineError::OpportunityNotFound(opportunity));
        }

        let request = self
            .requests
            .write()
            .await
            .create(actor, to, opportunity, match_id)?;
        info!(request = %request.id, from = %actor, to = %to, "connection request sent");
        Ok(request)
    }

    /// Read-only idempotency probe mirroring `send_request`'s uniqueness
    /// rule: only a *pending* request counts.
    pub async fn request_exists(
        &self,
        actor: UserId,
        to: UserId,
        opportunity: OpportunityId,
    ) -> bool {
        self.requests
            .read()
            .await
            .pending_exists(actor, to, opportunity)
    }

    /// Accept a pending request and create the connection edge. This is
    /// the only path by which request edges enter the graph.
    pub async fn accept_request(
        &self,
        actor: UserId,
        id: RequestId,
    ) -> EngineResult<ConnectionRequest> {
        // Lock order: requests before graph.
        let mut requests = self.requests.write().await;
        let mut graph = self.graph.write().await;

        let accepted = requests.accept(actor, id)?;
        graph.connect(
            accepted.from_user_id,
            accepted.to_user_id,
            ConnectionSource::Request,
        )?;
        info!(request = %id, "request accepted, edge created");
        Ok(accepted)
    }

    /// Decline a pending request. No edge is created.
    pub async fn decline_request(
        &self,
        actor: UserId,
        id: RequestId,
    ) -> EngineResult<ConnectionRequest> {
        let declined = self.requests.write().await.decline(actor, id)?;
        info!(request = %id, "request declined");
        Ok(declined)
    }

    /// Pending requests addressed to the actor, newest first.
    pub async fn incoming_requests(&self, actor: UserId) -> Vec<ConnectionRequest> {
        self.requests.read().await.incoming(actor)
    }

    /// Requests the actor has sent, newest first.
    pub async fn outgoing_requests(&self, actor: UserId) -> Vec<ConnectionRequest> {
        self.requests.read().await.outgoing(actor)
    }

    /// All requests in an opportunity's context. Poster only.
    pub async fn requests_for_opportunity(
        &self,
        actor: UserId,
        opportunity: OpportunityId,
    ) -> EngineResult<Vec<ConnectionRequest>> {
        let record = self.opportunity(opportunity).await?;
        if record.posted_by != actor {
            return Err(EngineError::Forbidden(
                "only the poster may view an opportunity's requests".to_string(),
            ));
        }
        Ok(self.requests.read().await.for_opportunity(opportunity))
    }

    // ============================================================
    // Feedback & impressions
    // ============================================================

    /// The completed interactions between the actor and `to_user` still
    /// eligible for feedback, one per opportunity.
    pub async fn list_experiences(
        &self,
        actor: UserId,
        to_user: UserId,
    ) -> EngineResult<Vec<Experience>> {
        if actor == to_user {
            return Ok(Vec::new());
        }
        {
            let graph = self.graph.read().await;
            if !graph.has_user(actor) {
                return Err(EngineError::UserNotFound(actor));
            }
            if !graph.has_user(to_user) {
                return Err(EngineError::UserNotFound(to_user));
            }
        }

        let mut seen = FxHashSet::default();
        let opportunity_ids: Vec<OpportunityId> = {
            let requests = self.requests.read().await;
            requests
                .accepted_between(actor, to_user)
                .into_iter()
                .map(|r| r.opportunity_id)
                .filter(|id| seen.insert(*id))
                .collect()
        };

        let candidates: Vec<Experience> = {
            let opportunities = self.opportunities.read().await;
            opportunity_ids
                .into_iter()
                .filter_map(|id| opportunities.get(id))
                .map(|o| Experience {
                    opportunity_id: o.id,
                    opportunity_type: o.kind,
                    opportunity_title: o.title.clone(),
                })
                .collect()
        };

        let feedback = self.feedback.read().await;
        Ok(candidates
            .into_iter()
            .filter(|e| {
                !feedback.has_feedback_for(&interaction_digest(actor, to_user, e.opportunity_id))
            })
            .collect())
    }

    /// Submit anonymous feedback for a completed interaction of the given
    /// type. Consumes the eligible interaction with the lowest
    /// opportunity id.
    pub async fn submit_feedback(
        &self,
        actor: UserId,
        to_user: UserId,
        opportunity_type: OpportunityType,
        text: &str,
    ) -> EngineResult<crate::graph::FeedbackId> {
        if actor == to_user {
            return Err(EngineError::Validation(
                "cannot leave feedback for yourself".to_string(),
            ));
        }
        if text.trim().is_empty() {
            return Err(EngineError::Validation("feedback text is empty".to_string()));
        }
        if !self.graph.read().await.has_user(to_user) {
            return Err(EngineError::UserNotFound(to_user));
        }

        let mut eligible: Vec<OpportunityId> = {
            let requests = self.requests.read().await;
            let opportunities = self.opportunities.read().await;
            let mut seen = FxHashSet::default();
            requests
                .accepted_between(actor, to_user)
                .into_iter()
                .map(|r| r.opportunity_id)
                .filter(|id| seen.insert(*id))
                .filter(|id| {
                    opportunities
                        .get(*id)
                        .map(|o| o.kind == opportunity_type)
                        .unwrap_or(false)
                })
                .collect()
        };
        eligible.sort();

        // The write guard spans the digest probe and the insert, so a
        // racing duplicate submit resolves to exactly one stored record.
        let mut feedback = self.feedback.write().await;
        for opportunity in eligible {
            let digest = interaction_digest(actor, to_user, opportunity);
            if feedback.has_feedback_for(&digest) {
                continue;
            }
            let id = feedback.record(to_user, opportunity_type, text, digest)?;
            info!(feedback = %id, to = %to_user, context = %opportunity_type, "feedback stored");
            return Ok(id);
        }
        Err(EngineError::NotEligible)
    }

    /// The aggregated impression for a user.
    pub async fn impression(&self, user: UserId) -> EngineResult<Impression> {
        if !self.graph.read().await.has_user(user) {
            return Err(EngineError::UserNotFound(user));
        }
        Ok(self.feedback.write().await.impression(user))
    }
}
