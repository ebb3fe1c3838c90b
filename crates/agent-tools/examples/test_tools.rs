//! Exercise every built-in tool.
//!
//! Run with: cargo run -p agent-tools --example test_tools
//!
//! Set REVIEW_DB_URL to point at a built index to try recommend_albums;
//! otherwise it is registered as disabled.

use agent_tools::{default_registry, RecommendAlbums, ToolRegistry};
use review_index::{IndexConfig, ReviewIndex};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("agent_tools=debug".parse()?),
        )
        .init();

    let _ = dotenvy::dotenv();

    println!("=== Agent Tools Test ===\n");

    let config = IndexConfig::from_env();
    let music = match ReviewIndex::open(&config).await {
        Ok(index) => Some(RecommendAlbums::new(index, config.max_results)),
        Err(e) => {
            println!("Review index unavailable: {}\n", e);
            None
        }
    };
    let registry = default_registry(music);

    println!("Registered tools:");
    for spec in registry.specs() {
        println!("  - {}: {}", spec.name, spec.description);
    }
    println!();

    let calls = [
        ("risk_calculator", r#"{"loss": 100, "probability": 0.2}"#),
        ("get_cat_facts", r#"{"count": 2}"#),
        ("get_dog_facts", r#"{}"#),
        ("get_horoscope", r#"{"sign": "Pisces"}"#),
        ("recommend_albums", r#"{"query": "ambient textures", "n_results": 2}"#),
    ];

    for (name, args) in calls {
        run(&registry, name, args).await;
    }

    println!("\n=== All tests completed ===");
    Ok(())
}

async fn run(registry: &ToolRegistry, name: &str, args: &str) {
    println!("--- {} {} ---", name, args);
    match registry.execute_json(name, args).await {
        Ok(output) => println!("success={} {}\n", output.success, output.content),
        Err(e) => println!("error: {}\n", e),
    }
}
