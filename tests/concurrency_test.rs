//! Race-condition coverage for the engine's atomicity contracts.

use serendip::{
    ConnectionSource, Engine, EngineConfig, ErrorKind, OpportunityType, SocialGraph,
    TokenOverlapSimilarity, UserId,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::RwLock;

fn open_to_all() -> BTreeSet<OpportunityType> {
    OpportunityType::ALL.into_iter().collect()
}

async fn register(engine: &Engine, name: &str) -> UserId {
    engine
        .register_user(name, "", BTreeSet::new(), BTreeSet::new(), open_to_all())
        .await
        .unwrap()
        .id
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_yield_one_pending_request() {
    let engine = Arc::new(
        Engine::new(EngineConfig::default(), Arc::new(TokenOverlapSimilarity)).unwrap(),
    );
    let ana = register(&engine, "Ana").await;
    let ben = register(&engine, "Ben").await;
    let (opportunity, _) = engine
        .post_opportunity(ana, OpportunityType::Project, "Race", "")
        .await
        .unwrap();
    let opportunity_id = opportunity.id;

    let mut handles = Vec::new();
    for _ in 0..16 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine.send_request(ana, ben, opportunity_id, None).await
        }));
    }

    let mut successes = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(e) => {
                assert_eq!(e.kind(), ErrorKind::DuplicateRequest);
                duplicates += 1;
            }
        }
    }

    assert_eq!(successes, 1, "exactly one create wins");
    assert_eq!(duplicates, 15);
    assert_eq!(engine.incoming_requests(ben).await.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_accept_and_decline_have_one_winner() {
    let engine = Arc::new(
        Engine::new(EngineConfig::default(), Arc::new(TokenOverlapSimilarity)).unwrap(),
    );
    let ana = register(&engine, "Ana").await;
    let ben = register(&engine, "Ben").await;
    let (opportunity, _) = engine
        .post_opportunity(ana, OpportunityType::Collab, "Race", "")
        .await
        .unwrap();
    let request = engine
        .send_request(ana, ben, opportunity.id, None)
        .await
        .unwrap();
    let request_id = request.id;

    let mut handles = Vec::new();
    for i in 0..8 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                engine.accept_request(ben, request_id).await
            } else {
                engine.decline_request(ben, request_id).await
            }
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(resolved) => {
                winners += 1;
                assert!(resolved.status.is_terminal());
            }
            Err(e) => assert_eq!(e.kind(), ErrorKind::InvalidState),
        }
    }
    assert_eq!(winners, 1, "the losers observe InvalidState");

    // However the race resolved, at most one edge exists for the pair.
    let edges = engine.connection_count(ana).await.unwrap();
    assert!(edges <= 1);
    assert_eq!(edges, engine.connection_count(ben).await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_edge_inserts_create_one_edge() {
    let graph = Arc::new(RwLock::new(SocialGraph::new()));
    let (a, b) = {
        let mut g = graph.write().await;
        let a = g.create_user("A", "", BTreeSet::new(), BTreeSet::new(), BTreeSet::new());
        let b = g.create_user("B", "", BTreeSet::new(), BTreeSet::new(), BTreeSet::new());
        (a, b)
    };

    let mut handles = Vec::new();
    for i in 0..16 {
        let graph = Arc::clone(&graph);
        handles.push(tokio::spawn(async move {
            let mut g = graph.write().await;
            // Half the writers race in the reverse direction.
            if i % 2 == 0 {
                g.connect(a, b, ConnectionSource::Request)
            } else {
                g.connect(b, a, ConnectionSource::Discovery)
            }
        }));
    }

    let mut edge_ids = Vec::new();
    for handle in handles {
        edge_ids.push(handle.await.unwrap().unwrap());
    }

    let g = graph.read().await;
    assert_eq!(g.edge_count(), 1);
    assert!(edge_ids.iter().all(|&id| id == edge_ids[0]));
    assert_eq!(g.connection_count(a), 1);
    assert_eq!(g.connection_count(b), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_never_observe_partial_match_sets() {
    let engine = Arc::new(
        Engine::new(EngineConfig::default(), Arc::new(TokenOverlapSimilarity)).unwrap(),
    );
    let poster = register(&engine, "Poster").await;
    for i in 0..6 {
        let _ = engine
            .register_user(
                format!("candidate-{i}"),
                "building things together",
                BTreeSet::new(),
                BTreeSet::new(),
                open_to_all(),
            )
            .await
            .unwrap();
    }
    let (opportunity, first) = engine
        .post_opportunity(poster, OpportunityType::Help, "Swap test", "building things")
        .await
        .unwrap();
    let opportunity_id = opportunity.id;
    let expected = first.len();
    assert!(expected > 0);

    let mut handles = Vec::new();
    for i in 0..12 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            if i % 3 == 0 {
                engine.rematch(poster, opportunity_id).await.map(|_| ())
            } else {
                let snapshot = engine.matches(opportunity_id).await?;
                // A reader sees a complete snapshot: contiguous ranks over
                // the full set, never a mix of two runs.
                assert_eq!(snapshot.len(), expected);
                for (idx, m) in snapshot.iter().enumerate() {
                    assert_eq!(m.rank, (idx + 1) as u32);
                }
                let created: Vec<i64> = snapshot.iter().map(|m| m.created_at).collect();
                assert!(created.iter().all(|&t| t == created[0]));
                Ok(())
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_feedback_submit_races_store_once() {
    let engine = Arc::new(
        Engine::new(EngineConfig::default(), Arc::new(TokenOverlapSimilarity)).unwrap(),
    );
    let ana = register(&engine, "Ana").await;
    let ben = register(&engine, "Ben").await;
    let (opportunity, _) = engine
        .post_opportunity(ana, OpportunityType::Fun, "Game night", "")
        .await
        .unwrap();
    let request = engine
        .send_request(ben, ana, opportunity.id, None)
        .await
        .unwrap();
    engine.accept_request(ana, request.id).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine
                .submit_feedback(ben, ana, OpportunityType::Fun, "good fun")
                .await
        }));
    }

    let mut stored = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => stored += 1,
            Err(e) => assert_eq!(e.kind(), ErrorKind::NotEligible),
        }
    }
    assert_eq!(stored, 1);
    assert_eq!(engine.impression(ana).await.unwrap().feedback_count, 1);
}
