//! Free-text discovery search with network-degree tagging

use super::layers::{classify, first_degree_ids, second_degree_map, Degree};
use crate::graph::{GraphError, GraphResult, SocialGraph, User, UserId};
use serde::Serialize;

/// A discovery search hit.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub user_id: UserId,
    pub name: String,
    pub degree: Degree,
    pub shared_connections: Vec<String>,
    /// Number of profile fields the query matched (name, bio, skills,
    /// interests); higher sorts first.
    pub relevance: usize,
}

/// Number of profile fields containing every lowercase query token as a
/// substring of at least one of them. 0 means no match.
///
/// Tokenization is plain whitespace splitting of the lowercased query;
/// every token must appear in at least one field for the user to match.
fn relevance(user: &User, tokens: &[String]) -> usize {
    let fields = [
        user.name.to_lowercase(),
        user.bio.to_lowercase(),
        user.skills
            .iter()
            .map(|s| s.to_lowercase())
            .collect::<Vec<_>>()
            .join(" "),
        user.interests
            .iter()
            .map(|s| s.to_lowercase())
            .collect::<Vec<_>>()
            .join(" "),
    ];

    let all_tokens_match = tokens
        .iter()
        .all(|t| fields.iter().any(|f| f.contains(t.as_str())));
    if !all_tokens_match {
        return 0;
    }

    fields
        .iter()
        .filter(|f| tokens.iter().any(|t| f.contains(t.as_str())))
        .count()
}

/// Search all profiles other than the viewer's.
///
/// Results are ordered by relevance, then degree (1st > 2nd > other), then
/// name, then id, so output is fully deterministic for a fixed store.
pub fn search(
    graph: &SocialGraph,
    query: &str,
    viewer: UserId,
    limit: usize,
) -> GraphResult<Vec<SearchResult>> {
    if !graph.has_user(viewer) {
        return Err(GraphError::UserNotFound(viewer));
    }

    let tokens: Vec<String> = query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let first = first_degree_ids(graph, viewer);
    let second = second_degree_map(graph, viewer);

    let mut results: Vec<SearchResult> = graph
        .all_users()
        .filter(|u| u.id != viewer)
        .filter_map(|u| {
            let relevance = relevance(u, &tokens);
            if relevance == 0 {
                return None;
            }
            let degree = classify(u.id, &first, &second);
            let shared_connections = match degree {
                Degree::Second => second
                    .get(&u.id)
                    .map(|names| names.iter().cloned().collect())
                    .unwrap_or_default(),
                _ => Vec::new(),
            };
            Some(SearchResult {
                user_id: u.id,
                name: u.name.clone(),
                degree,
                shared_connections,
                relevance,
            })
        })
        .collect();

    results.sort_by(|a, b| {
        b.relevance
            .cmp(&a.relevance)
            .then(a.degree.rank().cmp(&b.degree.rank()))
            .then(a.name.cmp(&b.name))
            .then(a.user_id.cmp(&b.user_id))
    });
    results.truncate(limit);
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ConnectionSource;
    use std::collections::BTreeSet;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sample_graph() -> (SocialGraph, UserId, UserId, UserId, UserId) {
        let mut graph = SocialGraph::new();
        let me = graph.create_user("Me", "", set(&[]), set(&[]), BTreeSet::new());
        let ana = graph.create_user(
            "Ana",
            "Product designer",
            set(&["design systems", "Figma"]),
            set(&["sustainability"]),
            BTreeSet::new(),
        );
        let bruno = graph.create_user(
            "Bruno",
            "Backend engineer who likes design",
            set(&["Go", "PostgreSQL"]),
            set(&["chess"]),
            BTreeSet::new(),
        );
        let clara = graph.create_user(
            "Clara",
            "Illustrator",
            set(&["graphic design", "branding"]),
            set(&["art", "design"]),
            BTreeSet::new(),
        );
        graph.connect(me, ana, ConnectionSource::Request).unwrap();
        graph.connect(ana, clara, ConnectionSource::Request).unwrap();
        (graph, me, ana, bruno, clara)
    }

    #[test]
    fn test_search_matches_and_excludes_viewer() {
        let (graph, me, ana, bruno, clara) = sample_graph();
        let results = search(&graph, "design", me, 20).unwrap();

        let ids: Vec<UserId> = results.iter().map(|r| r.user_id).collect();
        assert!(ids.contains(&ana));
        assert!(ids.contains(&bruno));
        assert!(ids.contains(&clara));
        assert!(!ids.contains(&me));
    }

    #[test]
    fn test_search_orders_by_relevance_then_degree_then_name() {
        let (graph, me, ana, bruno, clara) = sample_graph();
        let results = search(&graph, "design", me, 20).unwrap();

        // Clara matches two fields (skills + interests); Ana and Bruno one
        // each. Ana is 1st degree, Bruno is unconnected.
        assert_eq!(results[0].user_id, clara);
        assert_eq!(results[1].user_id, ana);
        assert_eq!(results[2].user_id, bruno);
        assert_eq!(results[1].degree, Degree::First);
        assert_eq!(results[2].degree, Degree::Other);
    }

    #[test]
    fn test_second_degree_results_carry_shared_connections() {
        let (graph, me, _ana, _bruno, clara) = sample_graph();
        let results = search(&graph, "illustrator", me, 20).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].user_id, clara);
        assert_eq!(results[0].degree, Degree::Second);
        assert_eq!(results[0].shared_connections, vec!["Ana"]);
    }

    #[test]
    fn test_all_tokens_must_match() {
        let (graph, me, ana, _bruno, _clara) = sample_graph();
        let results = search(&graph, "designer product", me, 20).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].user_id, ana);

        assert!(search(&graph, "designer spaceship", me, 20)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive_and_respects_limit() {
        let (graph, me, _ana, _bruno, _clara) = sample_graph();
        let all = search(&graph, "DESIGN", me, 20).unwrap();
        assert_eq!(all.len(), 3);
        let capped = search(&graph, "DESIGN", me, 2).unwrap();
        assert_eq!(capped.len(), 2);
        // Capping keeps the best-ranked results.
        assert_eq!(capped[0].user_id, all[0].user_id);
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let (graph, me, _ana, _bruno, _clara) = sample_graph();
        assert!(search(&graph, "   ", me, 20).unwrap().is_empty());
    }
}
