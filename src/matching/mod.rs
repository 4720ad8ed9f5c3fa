//! Match ranking engine
//!
//! Turns a new opportunity plus externally supplied similarity scores into
//! a ranked, explained match snapshot, blending semantic fit with a
//! network-proximity boost from the social graph index.

pub mod opportunity;
pub mod policy;
pub mod ranker;
pub mod similarity;

pub use opportunity::{Opportunity, OpportunityStore};
pub use policy::{clamp01, MatchPolicy, PolicyError};
pub use ranker::{rank_candidates, Match, MatchStore};
pub use similarity::{SimilarityProvider, TokenOverlapSimilarity};
