use std::fmt::Write as _;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use review_index::{
    build_embedder, collection, load_documents, EmbedderKind, IndexConfig, ReviewIndex,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ingester")]
#[command(about = "Create, rebuild and inspect album review collections")]
struct Args {
    /// SQLite URL. Falls back to REVIEW_DB_URL.
    #[arg(long, global = true)]
    db_url: Option<String>,

    /// Embedder: hashing, hashing:<dim> or openai. Falls back to REVIEW_EMBEDDER.
    #[arg(long, global = true)]
    embedder: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a collection if it does not exist
    Init {
        #[arg(long)]
        collection: Option<String>,
    },
    /// Validate a JSON file of reviews and rebuild a collection from it
    Build {
        /// Path to a JSON array of review records
        #[arg(long, default_value = "crates/review-index/data/music_docs.json")]
        data: PathBuf,

        #[arg(long)]
        collection: Option<String>,
    },
    /// List collections
    List,
    /// Show the nearest reviews for a free-text query
    Query {
        /// Free-text description
        text: String,

        /// Number of results
        #[arg(short, long, default_value_t = 3)]
        n: usize,

        #[arg(long)]
        collection: Option<String>,
    },
    /// Delete a collection and its reviews
    Drop {
        #[arg(long)]
        collection: String,
    },
}

impl Command {
    fn collection(&self) -> Option<&str> {
        match self {
            Command::Init { collection }
            | Command::Build { collection, .. }
            | Command::Query { collection, .. } => collection.as_deref(),
            Command::Drop { collection } => Some(collection),
            Command::List => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let _ = dotenvy::from_filename(".secrets");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = resolve_config(&args)?;

    let embedder = build_embedder(config.embedder)?;
    let index = ReviewIndex::connect(&config.db_url, config.collection.clone(), embedder).await?;
    index.migrate().await?;

    let output = run_command(&index, &args.command).await;
    index.close().await;

    print!("{}", output?);
    Ok(())
}

/// Environment config with command-line overrides applied.
fn resolve_config(args: &Args) -> Result<IndexConfig, String> {
    let mut config = IndexConfig::from_env();

    if let Some(url) = &args.db_url {
        config.db_url = url.clone();
    }
    if let Some(kind) = &args.embedder {
        config.embedder =
            EmbedderKind::parse(kind).ok_or_else(|| format!("unknown embedder '{}'", kind))?;
    }
    if let Some(name) = args.command.collection() {
        config.collection = name.to_string();
    }

    Ok(config)
}

/// Execute `command` against `index`, which is already bound to the
/// command's collection. Returns the text to print.
async fn run_command(index: &ReviewIndex, command: &Command) -> review_index::Result<String> {
    let mut out = String::new();

    match command {
        Command::Init { .. } => {
            if index.ensure_collection().await? {
                let _ = writeln!(out, "Created collection '{}'", index.collection());
            } else {
                let _ = writeln!(out, "Collection '{}' already exists", index.collection());
            }
        }
        Command::Build { data, .. } => {
            let records = load_documents(data)?;
            info!(
                file = %data.display(),
                records = records.len(),
                "Loaded review records"
            );
            let count = index.rebuild(&records).await?;
            let _ = writeln!(
                out,
                "Indexed {} reviews into '{}' ({})",
                count,
                index.collection(),
                index.embedder().model_id()
            );
        }
        Command::List => {
            let collections = index.list_collections().await?;
            if collections.is_empty() {
                let _ = writeln!(out, "No collections");
            }
            for info in collections {
                let count = collection::count_reviews(index.pool(), &info.name).await?;
                let _ = writeln!(
                    out,
                    "{}\t{} reviews\t{} (dim {})\t{}",
                    info.name, count, info.embedding_model, info.dimension, info.created_at
                );
            }
        }
        Command::Query { text, n, .. } => {
            let results = index.recommend(text, *n).await;
            if results.is_empty() {
                let _ = writeln!(out, "No matches");
            }
            for (rank, hit) in results.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{}. {} - {} ({:.1}/10, similarity {:.3})",
                    rank + 1,
                    hit.artist,
                    hit.title,
                    hit.score,
                    hit.similarity
                );
            }
        }
        Command::Drop { collection: name } => {
            if collection::delete_collection(index.pool(), name).await? {
                let _ = writeln!(out, "Deleted collection '{}'", name);
            } else {
                let _ = writeln!(out, "Collection '{}' not found", name);
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use review_index::HashingEmbedder;
    use std::sync::Arc;

    fn data_path() -> PathBuf {
        PathBuf::from(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../review-index/data/music_docs.json"
        ))
    }

    async fn index(collection: &str) -> ReviewIndex {
        let index = ReviewIndex::connect_with_pool_size(
            "sqlite::memory:",
            1,
            collection,
            Arc::new(HashingEmbedder::new(512)),
        )
        .await
        .unwrap();
        index.migrate().await.unwrap();
        index
    }

    #[test]
    fn test_parse_build() {
        let args = Args::try_parse_from([
            "ingester",
            "--db-url",
            "sqlite::memory:",
            "build",
            "--data",
            "reviews.json",
            "--collection",
            "jazz",
        ])
        .unwrap();

        assert_eq!(args.db_url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(args.command.collection(), Some("jazz"));
        match args.command {
            Command::Build { data, .. } => assert_eq!(data, PathBuf::from("reviews.json")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_embedder_rejected() {
        let args = Args::try_parse_from(["ingester", "--embedder", "word2vec", "list"]).unwrap();
        assert!(resolve_config(&args).is_err());
    }

    #[test]
    fn test_drop_requires_collection() {
        assert!(Args::try_parse_from(["ingester", "drop"]).is_err());
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let index = index("music_reviews").await;
        let init = Command::Init { collection: None };

        let first = run_command(&index, &init).await.unwrap();
        let second = run_command(&index, &init).await.unwrap();
        assert!(first.starts_with("Created"));
        assert!(second.contains("already exists"));
    }

    #[tokio::test]
    async fn test_build_list_query_drop() {
        let index = index("music_reviews").await;

        let built = run_command(
            &index,
            &Command::Build {
                data: data_path(),
                collection: None,
            },
        )
        .await
        .unwrap();
        assert!(built.starts_with("Indexed 10 reviews"));

        let listed = run_command(&index, &Command::List).await.unwrap();
        assert!(listed.contains("music_reviews\t10 reviews"));

        let found = run_command(
            &index,
            &Command::Query {
                text: "ambient textures".to_string(),
                n: 2,
                collection: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(found.lines().count(), 2);
        assert!(found.starts_with("1. "));

        let dropped = run_command(
            &index,
            &Command::Drop {
                collection: "music_reviews".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(dropped.starts_with("Deleted"));
        assert_eq!(run_command(&index, &Command::List).await.unwrap(), "No collections\n");
    }

    #[tokio::test]
    async fn test_build_rejects_missing_file() {
        let index = index("music_reviews").await;
        let result = run_command(
            &index,
            &Command::Build {
                data: PathBuf::from("/no/such/file.json"),
                collection: None,
            },
        )
        .await;
        assert!(result.is_err());
    }
}
