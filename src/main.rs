use serendip::{
    Engine, EngineConfig, OpportunityType, TokenOverlapSimilarity, UserId,
};
use std::collections::BTreeSet;
use std::sync::Arc;

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn open_to(items: &[OpportunityType]) -> BTreeSet<OpportunityType> {
    items.iter().copied().collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("Serendip Engine v{}", serendip::version());
    println!("==========================================");
    println!();

    let engine = Engine::new(EngineConfig::default(), Arc::new(TokenOverlapSimilarity))?;

    let sofia = seed_network(&engine).await?;
    demo_matching(&engine, sofia).await?;
    demo_requests_and_feedback(&engine, sofia).await?;

    Ok(())
}

/// Seed a small demo network and return Sofia's id.
async fn seed_network(engine: &Engine) -> anyhow::Result<UserId> {
    println!("=== Demo 1: Social Graph ===");

    let sofia = engine
        .register_user(
            "Sofia Herrera",
            "UX designer passionate about sustainability and social impact",
            set(&["UX design", "user research", "Figma", "accessibility"]),
            set(&["sustainability", "social impact", "community building"]),
            open_to(&[
                OpportunityType::Project,
                OpportunityType::Collab,
                OpportunityType::Job,
            ]),
        )
        .await?;

    let diego = engine
        .register_user(
            "Diego Morales",
            "Fullstack developer focused on climate tech dashboards",
            set(&["TypeScript", "Python", "React", "PostgreSQL"]),
            set(&["climate tech", "renewable energy", "open source"]),
            open_to(&[
                OpportunityType::Project,
                OpportunityType::Collab,
                OpportunityType::Help,
            ]),
        )
        .await?;

    let camila = engine
        .register_user(
            "Camila Vega",
            "Data scientist specializing in NLP and recommendation systems",
            set(&["Python", "machine learning", "NLP", "data analysis"]),
            set(&["AI ethics", "education", "music"]),
            open_to(&[OpportunityType::Project, OpportunityType::Collab]),
        )
        .await?;

    let isabella = engine
        .register_user(
            "Isabella Rojas",
            "Graphic designer and illustrator for conscious businesses",
            set(&["graphic design", "illustration", "branding", "typography"]),
            set(&["art", "sustainability", "teaching"]),
            open_to(&[OpportunityType::Project, OpportunityType::Help]),
        )
        .await?;

    let mateo = engine
        .register_user(
            "Mateo Rios",
            "Product manager with a background in social entrepreneurship",
            set(&["product management", "strategy", "fundraising"]),
            set(&["social impact", "startups", "mentoring"]),
            open_to(&[OpportunityType::Collab, OpportunityType::Project]),
        )
        .await?;

    // Sofia knows Diego and Mateo; Diego knows Camila; Mateo knows Isabella.
    engine.connect_discovered(sofia.id, diego.id).await?;
    engine.connect_discovered(sofia.id, mateo.id).await?;
    engine.connect_discovered(diego.id, camila.id).await?;
    engine.connect_discovered(mateo.id, isabella.id).await?;

    let network = engine.layered_network(sofia.id).await?;
    println!(
        "Sofia's network: {} direct, {} second-degree",
        network.first_degree.len(),
        network.second_degree.len()
    );
    for member in &network.second_degree {
        println!(
            "  {} via {}",
            member.name,
            member.shared_connections.join(", ")
        );
    }

    let hits = engine.search(sofia.id, "design").await?;
    println!("Search 'design' from Sofia's viewpoint:");
    for hit in &hits {
        println!("  {} [{}]", hit.name, hit.degree);
    }
    println!();

    Ok(sofia.id)
}

async fn demo_matching(engine: &Engine, sofia: UserId) -> anyhow::Result<()> {
    println!("=== Demo 2: Opportunity Matching ===");

    let (opportunity, matches) = engine
        .post_opportunity(
            sofia,
            OpportunityType::Project,
            "Sustainability dashboard prototype",
            "Looking for help with data analysis, React and graphic design \
             for a climate tech community project",
        )
        .await?;

    println!(
        "Posted \"{}\" ({}) -> {} matches",
        opportunity.title, opportunity.kind, matches.len()
    );
    println!("{}", serde_json::to_string_pretty(&matches)?);
    println!();

    Ok(())
}

async fn demo_requests_and_feedback(engine: &Engine, sofia: UserId) -> anyhow::Result<()> {
    println!("=== Demo 3: Requests & Feedback ===");

    let opportunity = engine
        .opportunities()
        .await
        .first()
        .cloned()
        .expect("demo 2 posted one");
    let top_match = engine.matches(opportunity.id).await?[0].clone();

    let request = engine
        .send_request(sofia, top_match.user_id, opportunity.id, Some(top_match.id))
        .await?;
    println!("Sofia -> {} : request {}", top_match.user_id, request.status);

    // A second attempt while pending reports "already sent".
    let duplicate = engine
        .send_request(sofia, top_match.user_id, opportunity.id, None)
        .await;
    println!("Duplicate attempt: {:?}", duplicate.err().map(|e| e.kind()));

    let accepted = engine.accept_request(top_match.user_id, request.id).await?;
    println!("Recipient accepted: status={}", accepted.status);

    let experiences = engine.list_experiences(top_match.user_id, sofia).await?;
    println!("Experiences eligible for feedback: {}", experiences.len());

    engine
        .submit_feedback(
            top_match.user_id,
            sofia,
            opportunity.kind,
            "Thoughtful collaborator with a clear design eye",
        )
        .await?;

    let impression = engine.impression(sofia).await?;
    println!(
        "Sofia's impression ({} entries): {}",
        impression.feedback_count, impression.summary
    );

    Ok(())
}
