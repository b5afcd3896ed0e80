use clap::{Parser, Subcommand};
use sift_ai_content::{ContentSource, WordPressClient};
use sift_ai_embed::{EmbedConfig, HttpEmbeddingClient};
use sift_ai_engine::config::SiftConfig;
use sift_ai_engine::search::SearchEngine;
use sift_ai_engine::storage::http::HttpVectorStore;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

/// Hybrid search over ingested site content.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the service configuration file
    #[arg(short, long, default_value = "sift.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch all content from the source and rebuild the index
    Index,
    /// Query the index
    Search {
        /// Query text
        query: String,
        /// Maximum number of results
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
        /// Fetch and reindex before querying
        #[arg(long)]
        reindex: bool,
        /// Output format
        #[arg(short, long, default_value = "summary")]
        format: OutputFormat,
    },
    /// Show corpus and store statistics
    Stats,
    /// Delete the vector-store collection
    DropCollection,
}

#[derive(Debug, Clone, PartialEq)]
enum OutputFormat {
    Summary,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "summary" => Ok(OutputFormat::Summary),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid format: {s}")),
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = if args.config.exists() {
        SiftConfig::load(&args.config)?
    } else {
        tracing::info!(
            "no config file at {}, using defaults",
            args.config.display()
        );
        SiftConfig::default()
    };

    let mut embed_config = EmbedConfig::new(
        &config.embedding.api_base,
        &config.embedding.model,
        config.embedding.dimension,
    );
    if let Some(api_key) = &config.embedding.api_key {
        embed_config = embed_config.with_api_key(api_key);
    }
    let dense = Arc::new(HttpEmbeddingClient::new(embed_config)?);

    let mut store = HttpVectorStore::new(
        &config.store.url,
        &config.store.collection,
        config.embedding.dimension,
    )?;
    if let Some(api_key) = &config.store.api_key {
        store = store.with_api_key(api_key);
    }
    let store = Arc::new(store);

    let engine = SearchEngine::new(dense, store.clone(), config.engine.clone());

    match args.command {
        Commands::Index => {
            let documents = fetch_documents(&config).await?;
            println!("Fetched {} documents", documents.len());
            let report = engine.reindex(documents).await;
            println!(
                "Indexed generation {} ({} documents, dense published: {})",
                report.generation,
                report.documents,
                if report.dense_published { "yes" } else { "no" }
            );
        }
        Commands::Search {
            query,
            limit,
            reindex,
            format,
        } => {
            if reindex {
                let documents = fetch_documents(&config).await?;
                let report = engine.reindex(documents).await;
                tracing::info!(generation = report.generation, "reindexed before search");
            }

            let retrieval = engine.retrieve(&query, limit).await?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&retrieval)?);
                }
                OutputFormat::Summary => {
                    println!(
                        "Tier: {:?} | Generation: {} | {} results",
                        retrieval.tier,
                        retrieval.generation,
                        retrieval.results.len()
                    );
                    for (rank, result) in retrieval.results.iter().enumerate() {
                        println!(
                            "{:>2}. {:.3} [{}] {} ({})",
                            rank + 1,
                            result.score,
                            result.relevance.as_str(),
                            result.title,
                            result.url
                        );
                    }
                }
            }
        }
        Commands::Stats => {
            let stats = engine.stats().await;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::DropCollection => {
            store.delete_collection().await?;
            println!("Deleted collection '{}'", config.store.collection);
        }
    }

    Ok(())
}

async fn fetch_documents(
    config: &SiftConfig,
) -> anyhow::Result<Vec<sift_ai_content::Document>> {
    let mut source = WordPressClient::new(&config.source.api_url)?;
    if let (Some(username), Some(password)) = (&config.source.username, &config.source.password) {
        source = source.with_basic_auth(username, password);
    }
    Ok(source.fetch_all().await?)
}
